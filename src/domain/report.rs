//! Human-readable rendering of discrepancies.

use std::fmt;

use crate::domain::compare::Discrepancy;

pub const SUCCESS_SUMMARY: &str =
    "Congratulations! Your submission is correctly formatted and ready for submission!";
pub const FAILURE_HEADER: &str =
    "There is at least one formatting error in your submission, please correct:";
pub const FAILURE_FOOTER: &str =
    "Keep returning to this precheck process until there are no formatting errors before submitting!";

impl fmt::Display for Discrepancy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Discrepancy::FileNamingMismatch { file_name } => write!(
                f,
                "Your uploaded file name {file_name} does not follow the instructions, please rename it."
            ),
            Discrepancy::TextGridNotFound { textgrid } => {
                write!(f, "TextGrid file named {textgrid} not found!")
            }
            Discrepancy::IntervalTierNotFound { tier, textgrid } => write!(
                f,
                "Interval Tier named {tier} not found in TextGrid file named {textgrid}!"
            ),
            Discrepancy::IntervalCountMismatch {
                expected,
                actual,
                tier,
                textgrid,
            } => write!(
                f,
                "There are {actual} intervals detected; {expected} are expected in Interval Tier named {tier} in TextGrid file named {textgrid}"
            ),
            Discrepancy::IntervalNameMismatch { tier, textgrid } => write!(
                f,
                "The name of the Interval Tier does not follow instructions (mismatched) in Interval Tier named {tier} of TextGrid file named {textgrid}"
            ),
            Discrepancy::PointTierNotFound { tier, textgrid } => write!(
                f,
                "Point Tier named {tier} is not found in TextGrid file named {textgrid}!"
            ),
            Discrepancy::PointCountMismatch {
                expected,
                actual,
                tier,
                textgrid,
            } => write!(
                f,
                "There are {actual} points detected; {expected} are expected in Point Tier named {tier} in TextGrid file named {textgrid}"
            ),
            Discrepancy::PointNameMismatch { tier, textgrid } => write!(
                f,
                "The name of the Point Tier does not follow instructions (mismatched) in Point Tier named {tier} of TextGrid file named {textgrid}"
            ),
        }
    }
}

/// Outcome of a precheck: clean, or every message in reference order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Clean,
    Discrepancies(Vec<String>),
}

impl Verdict {
    pub fn from_discrepancies(found: &[Discrepancy]) -> Self {
        if found.is_empty() {
            Verdict::Clean
        } else {
            Verdict::Discrepancies(found.iter().map(ToString::to_string).collect())
        }
    }

    pub fn is_clean(&self) -> bool {
        matches!(self, Verdict::Clean)
    }

    pub fn messages(&self) -> &[String] {
        match self {
            Verdict::Clean => &[],
            Verdict::Discrepancies(messages) => messages,
        }
    }
}

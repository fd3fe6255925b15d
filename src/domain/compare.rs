//! Structural comparison of a submission tree against a reference tree.
//!
//! Content mismatches are never errors: every difference becomes a
//! [`Discrepancy`] and the pass always runs to the end.

use itertools::Itertools;
use rayon::prelude::*;
use tracing::{debug, instrument};

use crate::domain::entities::{
    Collection, IntervalTier, TextGrid, TextTier, Tier, ERROR_BOUND_SUFFIX,
};

/// A structural difference between reference and submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Discrepancy {
    FileNamingMismatch {
        file_name: String,
    },
    TextGridNotFound {
        textgrid: String,
    },
    IntervalTierNotFound {
        tier: String,
        textgrid: String,
    },
    IntervalCountMismatch {
        expected: usize,
        actual: usize,
        tier: String,
        textgrid: String,
    },
    IntervalNameMismatch {
        tier: String,
        textgrid: String,
    },
    PointTierNotFound {
        tier: String,
        textgrid: String,
    },
    PointCountMismatch {
        expected: usize,
        actual: usize,
        tier: String,
        textgrid: String,
    },
    PointNameMismatch {
        tier: String,
        textgrid: String,
    },
}

/// File name a submission must carry: `{student_id}_{reference_file_name}`.
pub fn expected_file_name(student_id: &str, reference_file_name: &str) -> String {
    format!("{student_id}_{reference_file_name}")
}

/// Naming check run before the structural comparison.
pub fn check_file_name(
    student_id: &str,
    reference_file_name: &str,
    submitted_file_name: &str,
) -> Option<Discrepancy> {
    (submitted_file_name != expected_file_name(student_id, reference_file_name)).then(|| {
        Discrepancy::FileNamingMismatch {
            file_name: submitted_file_name.to_string(),
        }
    })
}

/// Walks reference and submission trees by name.
#[derive(Debug, Clone)]
pub struct Comparator {
    error_bound_suffix: String,
}

impl Default for Comparator {
    fn default() -> Self {
        Self::new(ERROR_BOUND_SUFFIX)
    }
}

impl Comparator {
    pub fn new(error_bound_suffix: impl Into<String>) -> Self {
        Self {
            error_bound_suffix: error_bound_suffix.into(),
        }
    }

    /// All discrepancies of `actual` against `expected`, in reference order.
    ///
    /// TextGrids are compared independently and in parallel; the result is
    /// reassembled in reference order.
    #[instrument(level = "debug", skip_all)]
    pub fn compare(&self, expected: &Collection, actual: &Collection) -> Vec<Discrepancy> {
        let reference: Vec<&TextGrid> = expected.textgrids().collect();
        let found: Vec<Discrepancy> = reference
            .par_iter()
            .map(|tg| self.compare_textgrid(tg, actual))
            .collect::<Vec<_>>()
            .into_iter()
            .flatten()
            .collect();
        debug!(
            textgrids = reference.len(),
            discrepancies = found.len(),
            "comparison done"
        );
        found
    }

    fn compare_textgrid(&self, expected: &TextGrid, actual: &Collection) -> Vec<Discrepancy> {
        let Some(matched) = actual.textgrid(&expected.name) else {
            return vec![Discrepancy::TextGridNotFound {
                textgrid: expected.name.clone(),
            }];
        };

        expected
            .tiers
            .iter()
            .flat_map(|tier| match tier {
                Tier::Interval(it) => compare_interval_tier(it, matched),
                Tier::Text(tt) if tt.name.ends_with(&self.error_bound_suffix) => Vec::new(),
                Tier::Text(tt) => compare_text_tier(tt, matched),
            })
            .collect()
    }
}

/// Number of sorted positions whose labels differ.
fn mismatched_positions<T, E, A>(expected: E, actual: A) -> usize
where
    T: Ord,
    E: Iterator<Item = T>,
    A: Iterator<Item = T>,
{
    expected
        .sorted()
        .zip(actual.sorted())
        .filter(|(e, a)| e != a)
        .count()
}

fn compare_interval_tier(expected: &IntervalTier, textgrid: &TextGrid) -> Vec<Discrepancy> {
    let tier = expected.name.clone();
    let tg = textgrid.name.clone();

    let Some(actual) = textgrid.interval_tier(&expected.name) else {
        return vec![Discrepancy::IntervalTierNotFound { tier, textgrid: tg }];
    };
    if expected.labels.len() != actual.labels.len() {
        return vec![Discrepancy::IntervalCountMismatch {
            expected: expected.labels.len(),
            actual: actual.labels.len(),
            tier,
            textgrid: tg,
        }];
    }
    // Multiset of texts only: order and timing are not graded here.
    let differing = mismatched_positions(expected.texts(), actual.texts());
    vec![Discrepancy::IntervalNameMismatch { tier, textgrid: tg }; differing]
}

fn compare_text_tier(expected: &TextTier, textgrid: &TextGrid) -> Vec<Discrepancy> {
    let tier = expected.name.clone();
    let tg = textgrid.name.clone();

    let Some(actual) = textgrid.text_tier(&expected.name) else {
        return vec![Discrepancy::PointTierNotFound { tier, textgrid: tg }];
    };
    if expected.labels.len() != actual.labels.len() {
        return vec![Discrepancy::PointCountMismatch {
            expected: expected.labels.len(),
            actual: actual.labels.len(),
            tier,
            textgrid: tg,
        }];
    }
    let differing = mismatched_positions(expected.prefixes(), actual.prefixes());
    vec![Discrepancy::PointNameMismatch { tier, textgrid: tg }; differing]
}

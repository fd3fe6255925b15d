//! Review grouping for instructors
//!
//! Puts one reference tier next to the same tier from many submissions,
//! split into groups small enough to inspect side by side. Writing the groups
//! out as files is left to the caller.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::application::services::precheck::{file_name, load_collection};
use crate::application::{ApplicationError, ApplicationResult, ArchiveRole};
use crate::domain::{Collection, Tier};
use crate::infrastructure::traits::FileSystem;

/// Owner label of the reference entry heading every group.
pub const REFERENCE_OWNER: &str = "answer";

#[derive(Debug, Clone, PartialEq)]
pub struct ReviewEntry {
    /// `REFERENCE_OWNER` or the student id
    pub owner: String,
    pub tier: Tier,
}

/// One side-by-side set: the reference tier followed by submitted tiers.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewGroup {
    /// 1-based position among all groups
    pub index: usize,
    pub total: usize,
    pub entries: Vec<ReviewEntry>,
}

impl ReviewGroup {
    /// `{textgrid}_{tier}_{index}({total})`, the stem used for output files.
    pub fn file_stem(&self, textgrid: &str, tier: &str) -> String {
        format!("{textgrid}_{tier}_{}({})", self.index, self.total)
    }

    pub fn submissions(&self) -> impl Iterator<Item = &ReviewEntry> {
        self.entries.iter().skip(1)
    }
}

/// Group `submissions` behind `reference`, at most `max_group_size`
/// submitted tiers per group, keeping submission order.
///
/// Submitted tiers are renamed to their student id. Without submissions a
/// single group holding only the reference is returned. Submissions that
/// divide evenly by `max_group_size` produce no trailing reference-only group.
pub fn group_for_review(
    reference: &Tier,
    submissions: &[(String, Tier)],
    max_group_size: usize,
) -> ApplicationResult<Vec<ReviewGroup>> {
    if max_group_size == 0 {
        return Err(ApplicationError::InvalidInput(
            "max group size must be at least 1".to_string(),
        ));
    }

    let head = ReviewEntry {
        owner: REFERENCE_OWNER.to_string(),
        tier: reference.clone(),
    };
    let chunks: Vec<&[(String, Tier)]> = if submissions.is_empty() {
        vec![&[]]
    } else {
        submissions.chunks(max_group_size).collect()
    };
    let total = chunks.len();

    Ok(chunks
        .into_iter()
        .enumerate()
        .map(|(i, chunk)| {
            let mut entries = Vec::with_capacity(chunk.len() + 1);
            entries.push(head.clone());
            entries.extend(chunk.iter().map(|(student, tier)| ReviewEntry {
                owner: student.clone(),
                tier: tier.renamed(student.as_str()),
            }));
            ReviewGroup {
                index: i + 1,
                total,
                entries,
            }
        })
        .collect())
}

/// Student id encoded in a submission file name (`{id}_{reference}`).
pub fn student_id_from_file_name(name: &str) -> Option<&str> {
    name.split_once('_')
        .map(|(id, _)| id)
        .filter(|id| !id.is_empty())
}

/// Service collecting one tier across many submission files.
pub struct ReviewService {
    fs: Arc<dyn FileSystem>,
}

impl ReviewService {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }

    /// Load the reference and every submission, pick the tier
    /// `textgrid`/`tier` from each, and group them for review.
    ///
    /// Submissions that fail to parse or lack the tier are skipped with a
    /// warning; a reference without the tier is an error.
    pub fn review(
        &self,
        reference: &Path,
        submissions: &[PathBuf],
        textgrid: &str,
        tier: &str,
        max_group_size: usize,
    ) -> ApplicationResult<Vec<ReviewGroup>> {
        let answer = load_collection(self.fs.as_ref(), reference, ArchiveRole::Reference)?;
        let reference_tier = find_tier(&answer, textgrid, tier).ok_or_else(|| {
            ApplicationError::InvalidInput(format!(
                "tier {tier} of TextGrid {textgrid} not found in reference {}",
                reference.display()
            ))
        })?;

        let mut collected = Vec::new();
        for path in submissions {
            let name = file_name(path);
            let student = student_id_from_file_name(&name).unwrap_or(&name).to_string();
            let collection =
                match load_collection(self.fs.as_ref(), path, ArchiveRole::Submission) {
                    Ok(c) => c,
                    Err(e) => {
                        warn!("skipping {}: {}", path.display(), e);
                        continue;
                    }
                };
            match find_tier(&collection, textgrid, tier) {
                Some(t) => collected.push((student, t.clone())),
                None => warn!(
                    "skipping {}: tier {tier} of TextGrid {textgrid} missing",
                    path.display()
                ),
            }
        }
        debug!(submissions = collected.len(), "collected tiers for review");

        group_for_review(reference_tier, &collected, max_group_size)
    }
}

fn find_tier<'c>(collection: &'c Collection, textgrid: &str, tier: &str) -> Option<&'c Tier> {
    collection.textgrid(textgrid)?.tier(tier)
}

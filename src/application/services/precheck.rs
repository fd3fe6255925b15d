//! Precheck service
//!
//! Entry point for validating one submitted archive against its reference.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::application::{ApplicationError, ApplicationResult, ArchiveRole, IoResultExt};
use crate::domain::{
    check_file_name, parse_collection, Collection, Comparator, Discrepancy, Verdict,
};
use crate::infrastructure::traits::FileSystem;

/// Everything a precheck needs, already read into memory.
#[derive(Debug, Clone)]
pub struct PrecheckRequest<'a> {
    pub student_id: &'a str,
    pub submitted_file_name: &'a str,
    pub submitted_text: &'a str,
    pub reference_file_name: &'a str,
    pub reference_text: &'a str,
}

/// Service comparing submissions with reference archives.
pub struct PrecheckService {
    fs: Arc<dyn FileSystem>,
    comparator: Comparator,
}

impl PrecheckService {
    pub fn new(fs: Arc<dyn FileSystem>, comparator: Comparator) -> Self {
        Self { fs, comparator }
    }

    /// Run the precheck and render the verdict.
    pub fn check(&self, request: &PrecheckRequest<'_>) -> ApplicationResult<Verdict> {
        let found = self.discrepancies(request)?;
        Ok(Verdict::from_discrepancies(&found))
    }

    /// Naming discrepancy first, then all structural discrepancies in
    /// reference order.
    ///
    /// Fails only when either archive cannot be parsed.
    #[instrument(level = "debug", skip_all, fields(student = request.student_id))]
    pub fn discrepancies(
        &self,
        request: &PrecheckRequest<'_>,
    ) -> ApplicationResult<Vec<Discrepancy>> {
        let mut found: Vec<Discrepancy> = check_file_name(
            request.student_id,
            request.reference_file_name,
            request.submitted_file_name,
        )
        .into_iter()
        .collect();

        let submission = parse_collection(request.submitted_text).map_err(|e| {
            ApplicationError::parse(ArchiveRole::Submission, request.submitted_file_name, e)
        })?;
        let reference = parse_collection(request.reference_text).map_err(|e| {
            ApplicationError::parse(ArchiveRole::Reference, request.reference_file_name, e)
        })?;

        found.extend(self.comparator.compare(&reference, &submission));
        info!(discrepancies = found.len(), "precheck finished");
        Ok(found)
    }

    /// Precheck from files on disk. File names are taken from the paths.
    pub fn check_files(
        &self,
        student_id: &str,
        submission: &Path,
        reference: &Path,
    ) -> ApplicationResult<Verdict> {
        debug!(
            "check_files: submission={} reference={}",
            submission.display(),
            reference.display()
        );
        if !self.fs.is_file(reference) {
            return Err(ApplicationError::ReferenceNotFound(reference.to_path_buf()));
        }
        let submitted_text = self.read_archive(submission)?;
        let reference_text = self.read_archive(reference)?;

        self.check(&PrecheckRequest {
            student_id,
            submitted_file_name: &file_name(submission),
            submitted_text: &submitted_text,
            reference_file_name: &file_name(reference),
            reference_text: &reference_text,
        })
    }

    /// Parse a single archive file into its entity tree.
    pub fn parse_file(&self, path: &Path, role: ArchiveRole) -> ApplicationResult<Collection> {
        load_collection(self.fs.as_ref(), path, role)
    }

    fn read_archive(&self, path: &Path) -> ApplicationResult<String> {
        read_archive(self.fs.as_ref(), path)
    }
}

pub(crate) fn read_archive(fs: &dyn FileSystem, path: &Path) -> ApplicationResult<String> {
    if !fs.is_file(path) {
        return Err(ApplicationError::InputNotFound(path.to_path_buf()));
    }
    fs.read_to_string(path).with_path_context("read archive", path)
}

pub(crate) fn load_collection(
    fs: &dyn FileSystem,
    path: &Path,
    role: ArchiveRole,
) -> ApplicationResult<Collection> {
    let text = read_archive(fs, path)?;
    parse_collection(&text).map_err(|e| ApplicationError::parse(role, file_name(path), e))
}

/// Last path component, lossily converted.
pub(crate) fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

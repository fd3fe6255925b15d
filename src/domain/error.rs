//! Domain-level errors (no external dependencies)

use std::fmt;

use thiserror::Error;

/// Inclusive 1-based line range of a text block in the archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "line {}", self.start)
        } else {
            write!(f, "lines {}-{}", self.start, self.end)
        }
    }
}

/// Parse errors: the archive text cannot be trusted as a tree.
///
/// Every variant aborts the build of the tree it was raised for.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("malformed block at {span}: expected {expected}\n{text}")]
    MalformedBlock {
        expected: String,
        span: Span,
        text: String,
    },

    #[error("declared size {declared} of {entity} does not match the {actual} found")]
    CountMismatch {
        entity: String,
        declared: usize,
        actual: usize,
    },

    #[error("unsupported file type: {0} (only ooTextFile Collection archives can be processed)")]
    UnsupportedFileType(String),

    #[error("line {line}: unsupported item type \"{tag}\" (only TextGrid and Sound 2 are supported)")]
    UnsupportedItemType { tag: String, line: usize },

    #[error("line {line}: unsupported tier type \"{tag}\"")]
    UnsupportedTierType { tag: String, line: usize },

    #[error("line {line}: sample z [{row}] [{col}] lies outside the {rows}x{cols} matrix")]
    IndexOutOfRange {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
        line: usize,
    },

    #[error("line {line}: invalid value for {field}: {value}")]
    InvalidValue {
        field: String,
        value: String,
        line: usize,
    },
}

/// Result type for parsing and building entity trees.
pub type DomainResult<T> = Result<T, DomainError>;

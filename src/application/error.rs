//! Application-level errors (wraps domain errors)

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::domain::DomainError;

/// Which side of a precheck an archive belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveRole {
    Submission,
    Reference,
}

impl fmt::Display for ArchiveRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArchiveRole::Submission => write!(f, "submission"),
            ArchiveRole::Reference => write!(f, "reference"),
        }
    }
}

/// Application errors wrap domain errors with the archive they came from.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("cannot parse {role} archive {name}: {source}")]
    Parse {
        role: ArchiveRole,
        name: String,
        #[source]
        source: DomainError,
    },

    #[error("file not found: {0}")]
    InputNotFound(PathBuf),

    #[error("reference archive not found: {0}")]
    ReferenceNotFound(PathBuf),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("config error: {message}")]
    Config { message: String },

    #[error("operation failed: {context}")]
    OperationFailed {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl ApplicationError {
    pub fn parse(role: ArchiveRole, name: impl Into<String>, source: DomainError) -> Self {
        Self::Parse {
            role,
            name: name.into(),
            source,
        }
    }

    /// True when the input text could not be trusted as an archive.
    pub fn is_parse_failure(&self) -> bool {
        matches!(self, Self::Parse { .. })
    }
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;

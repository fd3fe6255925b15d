//! Domain layer: entity tree, archive grammar, comparison and reporting
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod builder;
pub mod compare;
pub mod entities;
pub mod error;
pub mod grammar;
pub mod report;

pub use builder::{parse_collection, CollectionBuilder};
pub use compare::{check_file_name, expected_file_name, Comparator, Discrepancy};
pub use entities::*;
pub use error::{DomainError, DomainResult, Span};
pub use report::Verdict;

//! gridcheck: formatting precheck for Praat TextGrid collections.
//!
//! Parses ooTextFile `Collection` archives into an entity tree and reports
//! structural discrepancies between a student submission and a reference.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;

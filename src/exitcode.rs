//! Standard exit codes (BSD sysexits.h compatible)

/// Successful termination, submission clean
pub const OK: i32 = 0;

/// Precheck ran and found formatting discrepancies
pub const FAILED: i32 = 1;

/// Command line usage error
pub const USAGE: i32 = 64;

/// Data format error (archive cannot be parsed)
pub const DATAERR: i32 = 65;

/// Cannot open input
pub const NOINPUT: i32 = 66;

/// Input/output error
pub const IOERR: i32 = 74;

/// Configuration error
pub const CONFIG: i32 = 78;

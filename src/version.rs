//! qitest version information.
//!
//! The value is taken from Cargo metadata (`CARGO_PKG_VERSION`) at compile time, so the `qitest` and `qitest-bench`
//! binaries and the JSON report agree on the same value.

/// The qitest version string (for example, `0.1.0`).
pub const QITEST_VERSION: &str = env!("CARGO_PKG_VERSION");

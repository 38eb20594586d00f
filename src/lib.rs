#![forbid(unsafe_code)]
//! qitest: conformance test runner for the qi interpreter
//!
//! qitest discovers `.qi` test scripts, reads the expectations embedded in their comments, runs each script under
//! the interpreter being tested and compares stdout, stderr and the exit code against those expectations.
//!
//! The expectation parser and the validator live in the `qitest_expect` crate (re-exported here as [`expect`]). This
//! crate adds the I/O around them: discovery, process execution, reporting, the CLI and the benchmark loop.
//!
//! ## Panic Policy
//!
//! - **Production code**: Use `Result` or `Option` with `?` / `ok_or` / `map_err`. The `cli` module enforces
//!   `#![deny(clippy::unwrap_used)]`.
//!
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.
//!
//! - **True invariants**: If a panic represents a bug (for example a literal regex failing to compile), use
//!   `.expect("INVARIANT: reason")` with a clear explanation.

pub mod cli;
pub mod version;

pub use qitest_expect as expect;

/// Initialize structured logging with an env-based filter, defaulting to `warn`.
///
/// Logs go to stderr so they never interleave with the progress line and report on stdout.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

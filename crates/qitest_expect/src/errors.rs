//! Errors raised while reading test scripts.
//!
//! Validation failures are not errors: they are ordinary values ([`crate::Failure`]). The types here cover the two
//! cases where a script cannot be validated at all.

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// A test script could not be read.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to read test file '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A test script whose markers contradict each other.
///
/// The script is rejected before execution and counts as neither a pass nor a failure.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
#[error("Cannot expect both compile and runtime errors.")]
#[diagnostic(
    code(qitest::conflicting_expectations),
    help("split the compile-error and runtime-error cases into separate test files")
)]
pub struct DefinitionError {
    /// Source line of the runtime-error marker that was kept.
    pub runtime_error_line: usize,
    /// Compile errors declared alongside it, formatted as `[line] message`.
    pub compile_errors: Vec<String>,
}

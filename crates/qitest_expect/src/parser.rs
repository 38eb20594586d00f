//! Annotation parser: turns a test script's comment markers into an [`Expectation`].
//!
//! Parsing is a single pass over the script's lines (1-indexed). Each line is run through the ordered marker table in
//! [`crate::markers`]; lines without a marker, including malformed ones, are ignored.

use std::fs;
use std::path::Path;

use crate::errors::{DefinitionError, ParseError};
use crate::expectation::Expectation;
use crate::markers::{self, Flow};

/// Result of parsing one test script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
    /// The script is a test; validate its run against this expectation.
    Accepted(Expectation),
    /// The script carries a `// nontest` marker.
    Excluded,
    /// The script's markers contradict each other.
    Invalid(DefinitionError),
}

impl ParseOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, ParseOutcome::Accepted(_))
    }

    pub fn accepted(self) -> Option<Expectation> {
        match self {
            ParseOutcome::Accepted(expectation) => Some(expectation),
            _ => None,
        }
    }
}

/// Parse the markers in `source`.
#[tracing::instrument(skip_all, fields(source_len = source.len()))]
pub fn parse_source(source: &str) -> ParseOutcome {
    let mut expectation = Expectation::new();

    for (index, line) in source.lines().enumerate() {
        if let Some((_, Flow::Exclude)) = markers::apply_markers(&mut expectation, index + 1, line) {
            tracing::debug!(line = index + 1, "script marked as nontest");
            return ParseOutcome::Excluded;
        }
    }

    if expectation.has_conflicting_errors() {
        let runtime_error_line = expectation.expected_runtime_error.as_ref().map_or(0, |runtime| runtime.line);
        return ParseOutcome::Invalid(DefinitionError {
            runtime_error_line,
            compile_errors: expectation.expected_errors,
        });
    }

    tracing::debug!(expectations = expectation.expectation_count, "parsed expectations");
    ParseOutcome::Accepted(expectation)
}

/// Read and parse the script at `path`.
///
/// Invalid UTF-8 is replaced rather than rejected, so a script with stray bytes is still parsed.
///
/// ## Errors
///
/// Returns [`ParseError::Io`] when the file cannot be read. Callers treat this as fatal.
pub fn parse_file(path: &Path) -> Result<ParseOutcome, ParseError> {
    let bytes = fs::read(path).map_err(|source| ParseError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_source(&String::from_utf8_lossy(&bytes)))
}

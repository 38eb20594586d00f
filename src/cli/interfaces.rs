//! Suite I/O boundary interfaces
//!
//! This module defines trait-based abstractions for the two operations the suite driver cannot do in memory:
//! - Test discovery (filesystem walk)
//! - Script execution (interpreter process invocation + output capture)
//!
//! The driver only talks to these traits, so tests can substitute scripted implementations and the default ones
//! stay small.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use qitest_expect::{ExecutionResult, ParseError};
use thiserror::Error;

use super::config::SuiteConfig;

/// Errors that abort a suite run
#[derive(Debug, Error)]
pub enum SuiteError {
    #[error("failed to discover tests under '{}': {source}", path.display())]
    Discovery {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Runner(#[from] RunnerError),

    #[error("failed to write report: {0}")]
    Report(#[source] io::Error),
}

/// Errors raised while launching the interpreter
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("failed to launch interpreter '{}': {source}", interpreter.display())]
    Launch {
        interpreter: PathBuf,
        #[source]
        source: io::Error,
    },
}

// ============================================================================
// Test Discovery Interface
// ============================================================================

/// Find the test scripts that make up a suite.
pub trait TestDiscovery {
    /// Return every test script under `root`, in the order they should run.
    fn discover(&self, root: &Path) -> Result<Vec<PathBuf>, SuiteError>;
}

/// Recursive filesystem walk filtered by extension.
#[derive(Debug, Clone)]
pub struct FsDiscovery {
    extension: String,
    exclude_segment: String,
}

impl FsDiscovery {
    pub fn new(extension: impl Into<String>, exclude_segment: impl Into<String>) -> Self {
        Self {
            extension: extension.into(),
            exclude_segment: exclude_segment.into(),
        }
    }

    pub fn from_config(config: &SuiteConfig) -> Self {
        Self::new(config.extension.clone(), config.exclude_segment.clone())
    }

    fn is_excluded(&self, name: &str) -> bool {
        !self.exclude_segment.is_empty() && name.contains(&self.exclude_segment)
    }

    fn is_test_file(&self, path: &Path) -> bool {
        path.extension().is_some_and(|ext| ext == self.extension.as_str())
    }

    fn walk(&self, dir: &Path, files: &mut Vec<PathBuf>) -> Result<(), SuiteError> {
        let discovery_error = |source: io::Error| SuiteError::Discovery {
            path: dir.to_path_buf(),
            source,
        };

        for entry in fs::read_dir(dir).map_err(discovery_error)? {
            let entry = entry.map_err(discovery_error)?;
            if self.is_excluded(&entry.file_name().to_string_lossy()) {
                tracing::debug!(path = %entry.path().display(), "excluded from suite");
                continue;
            }

            let path = entry.path();
            // Symlinked directories are not followed
            if entry.file_type().map_err(discovery_error)?.is_dir() {
                self.walk(&path, files)?;
            } else if self.is_test_file(&path) {
                files.push(path);
            }
        }

        Ok(())
    }
}

impl TestDiscovery for FsDiscovery {
    fn discover(&self, root: &Path) -> Result<Vec<PathBuf>, SuiteError> {
        if root.is_file() {
            return Ok(vec![root.to_path_buf()]);
        }

        let mut files = Vec::new();
        self.walk(root, &mut files)?;
        files.sort();
        Ok(files)
    }
}

// ============================================================================
// Process Runner Interface
// ============================================================================

/// Run a script under an interpreter and capture everything it produced.
pub trait ProcessRunner {
    /// Execute `interpreter script`, blocking until the process exits.
    fn execute(&self, interpreter: &Path, script: &Path) -> Result<ExecutionResult, RunnerError>;
}

/// Spawns the interpreter as a child process with no stdin.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandRunner;

impl ProcessRunner for CommandRunner {
    fn execute(&self, interpreter: &Path, script: &Path) -> Result<ExecutionResult, RunnerError> {
        let output = Command::new(interpreter)
            .arg(script)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| RunnerError::Launch {
                interpreter: interpreter.to_path_buf(),
                source,
            })?;

        Ok(ExecutionResult::new(
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
            output.status.code().unwrap_or(-1),
        ))
    }
}

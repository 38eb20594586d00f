//! Data model shared by the parser and the validator.

use std::fmt;

/// Exit code of a clean run.
pub const EXIT_OK: i32 = 0;
/// Exit code the interpreter uses after reporting compile errors.
pub const EXIT_COMPILE_ERROR: i32 = 65;
/// Exit code the interpreter uses after a runtime error.
pub const EXIT_RUNTIME_ERROR: i32 = 70;

/// One line the script must print, tagged with the source line that declared it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectedOutput {
    pub line: usize,
    pub text: String,
}

/// The single runtime error a script may declare.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeErrorExpectation {
    /// Exact first line of stderr.
    pub message: String,
    /// Line the stack trace must point at.
    pub line: usize,
}

/// Everything a test script declares about its own execution.
///
/// Built once per file by [`crate::parser::parse_source`] and consumed by a single validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expectation {
    /// Stdout lines, in the order they must appear.
    pub expected_output: Vec<ExpectedOutput>,
    /// Compile diagnostics formatted as `[line] message`. Matched as a set, reported in declared order.
    pub expected_errors: Vec<String>,
    pub expected_runtime_error: Option<RuntimeErrorExpectation>,
    pub expected_exit_code: i32,
    /// Number of markers recognised, for the suite summary.
    pub expectation_count: usize,
}

impl Default for Expectation {
    fn default() -> Self {
        Self {
            expected_output: Vec::new(),
            expected_errors: Vec::new(),
            expected_runtime_error: None,
            expected_exit_code: EXIT_OK,
            expectation_count: 0,
        }
    }
}

impl Expectation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Expect `text` as the next stdout line.
    pub fn push_output(&mut self, line: usize, text: impl Into<String>) {
        self.expected_output.push(ExpectedOutput {
            line,
            text: text.into(),
        });
        self.expectation_count += 1;
    }

    /// Expect a compile diagnostic reported against `line`.
    ///
    /// `line` is whatever the marker names; for line-annotated markers it is kept as written.
    pub fn push_compile_error(&mut self, line: impl fmt::Display, message: &str) {
        self.expected_errors.push(format!("[{}] {}", line, message));
        self.expected_exit_code = EXIT_COMPILE_ERROR;
        self.expectation_count += 1;
    }

    /// Expect a runtime error, returning the expectation it replaced, if any.
    pub fn set_runtime_error(&mut self, line: usize, message: impl Into<String>) -> Option<RuntimeErrorExpectation> {
        self.expected_exit_code = EXIT_RUNTIME_ERROR;
        self.expectation_count += 1;
        self.expected_runtime_error.replace(RuntimeErrorExpectation {
            message: message.into(),
            line,
        })
    }

    /// Whether the script declares both compile errors and a runtime error.
    pub fn has_conflicting_errors(&self) -> bool {
        !self.expected_errors.is_empty() && self.expected_runtime_error.is_some()
    }
}

/// Captured result of one interpreter run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    pub stdout: String,
    pub stderr: String,
    /// Process exit code; `-1` when the process was terminated by a signal.
    pub exit_code: i32,
}

impl ExecutionResult {
    pub fn new(stdout: impl Into<String>, stderr: impl Into<String>, exit_code: i32) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: stderr.into(),
            exit_code,
        }
    }

    /// Stdout split on `'\n'`. A trailing newline yields a final empty line.
    pub fn stdout_lines(&self) -> Vec<&str> {
        self.stdout.split('\n').collect()
    }

    /// Stderr split on `'\n'`. An empty stream is one empty line.
    pub fn stderr_lines(&self) -> Vec<&str> {
        self.stderr.split('\n').collect()
    }
}

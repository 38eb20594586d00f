//! Result validator: compares one interpreter run against a script's [`Expectation`].
//!
//! Three checks run in a fixed order and never short-circuit:
//!
//! 1. error path: the runtime-error check when a runtime error is expected, the compile-error check otherwise
//! 2. exit code
//! 3. stdout
//!
//! Every check appends to the same failure list. An empty list means the test passed.

use std::collections::HashSet;
use std::fmt;

use crate::expectation::{ExecutionResult, Expectation, ExpectedOutput, RuntimeErrorExpectation};
use crate::markers;

/// Maximum number of unexpected stderr lines reported individually.
pub const DEFAULT_TRUNCATION_CAP: usize = 10;

/// How the stdout check treats expected lines the run never printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputLengthPolicy {
    /// Only extra actual lines are reported.
    #[default]
    Lenient,
    /// Expected lines beyond the actual output are reported too.
    Strict,
}

/// Validator configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidatorConfig {
    pub truncation_cap: usize,
    pub output_length: OutputLengthPolicy,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            truncation_cap: DEFAULT_TRUNCATION_CAP,
            output_length: OutputLengthPolicy::Lenient,
        }
    }
}

impl ValidatorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_truncation_cap(mut self, cap: usize) -> Self {
        self.truncation_cap = cap;
        self
    }

    pub fn with_output_length(mut self, policy: OutputLengthPolicy) -> Self {
        self.output_length = policy;
        self
    }
}

/// One human-readable validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub message: String,
    /// Context lines (stderr excerpts) printed under the message.
    pub details: Vec<String>,
}

impl Failure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            details: Vec::new(),
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.details.push(detail.into());
        self
    }

    pub fn with_details<I, S>(mut self, details: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.details.extend(details.into_iter().map(Into::into));
        self
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        for detail in &self.details {
            write!(f, "\n{}", detail)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct Validator {
    config: ValidatorConfig,
}

impl Validator {
    pub fn new(config: ValidatorConfig) -> Self {
        Self { config }
    }

    /// Check `result` against `expectation`, returning every failure found.
    #[tracing::instrument(skip_all, fields(expectations = expectation.expectation_count))]
    pub fn validate(&self, expectation: &Expectation, result: &ExecutionResult) -> Vec<Failure> {
        let stderr = result.stderr_lines();
        let stdout = result.stdout_lines();
        let mut failures = Vec::new();

        match &expectation.expected_runtime_error {
            Some(runtime) => self.check_runtime_error(runtime, &stderr, &mut failures),
            None => self.check_compile_errors(&expectation.expected_errors, &stderr, &mut failures),
        }
        self.check_exit_code(expectation.expected_exit_code, result.exit_code, &stderr, &mut failures);
        self.check_output(&expectation.expected_output, &stdout, &mut failures);

        tracing::debug!(failures = failures.len(), "validation complete");
        failures
    }

    fn check_runtime_error(&self, expected: &RuntimeErrorExpectation, stderr: &[&str], failures: &mut Vec<Failure>) {
        if stderr.len() < 2 {
            failures.push(Failure::new(format!(
                "Expected runtime error '{}' and got none.",
                expected.message
            )));
            return;
        }

        let (first, stack) = (stderr[0], &stderr[1..]);
        if first != expected.message {
            failures.push(
                Failure::new(format!("Expected runtime error '{}' and got:", expected.message)).with_detail(first),
            );
        }

        // A number too large to parse is still a wrong line, not a missing trace
        match stack.iter().find_map(|&line| markers::stack_trace_line(line)) {
            None => failures.push(Failure::new("Expected stack trace and got:").with_details(stack.iter().copied())),
            Some(actual) if actual.parse::<usize>().ok() != Some(expected.line) => {
                failures.push(Failure::new(format!(
                    "Expected runtime error on line {} but was on line {}.",
                    expected.line, actual
                )));
            }
            Some(_) => {}
        }
    }

    fn check_compile_errors(&self, expected_errors: &[String], stderr: &[&str], failures: &mut Vec<Failure>) {
        let cap = self.config.truncation_cap;
        let expected: HashSet<&str> = expected_errors.iter().map(String::as_str).collect();
        let mut found: HashSet<&str> = HashSet::new();
        let mut unexpected = 0;

        for &line in stderr {
            let failure = match markers::diagnostic_location(line) {
                Some(diagnostic) => {
                    if let Some(&hit) = expected.get(diagnostic.as_str()) {
                        found.insert(hit);
                        continue;
                    }
                    Failure::new("Unexpected error:").with_detail(line)
                }
                None if line.is_empty() => continue,
                None => Failure::new("Unexpected output on stderr:").with_detail(line),
            };

            if unexpected < cap {
                failures.push(failure);
            }
            unexpected += 1;
        }

        if unexpected > cap {
            failures.push(Failure::new(format!("(truncated {} more...)", unexpected - cap)));
        }

        for error in expected_errors {
            if !found.contains(error.as_str()) {
                failures.push(Failure::new(format!("Missing expected error: {}", error)));
            }
        }
    }

    fn check_exit_code(&self, expected: i32, actual: i32, stderr: &[&str], failures: &mut Vec<Failure>) {
        if expected == actual {
            return;
        }

        let cap = self.config.truncation_cap;
        let mut context: Vec<String> = stderr.iter().take(cap).map(|line| line.to_string()).collect();
        if stderr.len() > cap {
            context.push("(truncated...)".to_string());
        }

        failures.push(
            Failure::new(format!("Expected return code {} and got {}. Stderr:", expected, actual)).with_details(context),
        );
    }

    fn check_output(&self, expected: &[ExpectedOutput], stdout: &[&str], failures: &mut Vec<Failure>) {
        let actual = match stdout.split_last() {
            Some((&"", rest)) => rest,
            _ => stdout,
        };

        for (index, &line) in actual.iter().enumerate() {
            match expected.get(index) {
                None => failures.push(Failure::new(format!("Got output '{}' when none was expected.", line))),
                Some(output) if output.text != line => failures.push(Failure::new(format!(
                    "Expected output '{}' on line {} and got '{}'.",
                    output.text, output.line, line
                ))),
                Some(_) => {}
            }
        }

        if self.config.output_length == OutputLengthPolicy::Strict {
            for output in expected.iter().skip(actual.len()) {
                failures.push(Failure::new(format!(
                    "Missing expected output '{}' on line {}.",
                    output.text, output.line
                )));
            }
        }
    }
}

/// Validate with the default configuration.
pub fn validate(expectation: &Expectation, result: &ExecutionResult) -> Vec<Failure> {
    Validator::default().validate(expectation, result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expectation::{EXIT_COMPILE_ERROR, EXIT_RUNTIME_ERROR};

    fn runtime_expectation(message: &str, line: usize) -> Expectation {
        let mut expectation = Expectation::new();
        expectation.set_runtime_error(line, message);
        expectation
    }

    fn compile_expectation(errors: &[(usize, &str)]) -> Expectation {
        let mut expectation = Expectation::new();
        for (line, message) in errors {
            expectation.push_compile_error(line, message);
        }
        expectation
    }

    fn messages(failures: &[Failure]) -> Vec<&str> {
        failures.iter().map(|f| f.message.as_str()).collect()
    }

    // ========================================
    // Clean runs
    // ========================================

    #[test]
    fn test_no_markers_clean_run_passes() {
        let failures = validate(&Expectation::new(), &ExecutionResult::new("", "", 0));
        assert!(failures.is_empty(), "{:?}", failures);
    }

    // ========================================
    // Runtime errors
    // ========================================

    #[test]
    fn test_runtime_error_matches() {
        let expectation = runtime_expectation("Undefined variable 'x'.", 3);
        let run = ExecutionResult::new("", "Undefined variable 'x'.\n[line 3]", EXIT_RUNTIME_ERROR);
        assert!(validate(&expectation, &run).is_empty());
    }

    #[test]
    fn test_runtime_error_line_mismatch() {
        let expectation = runtime_expectation("Undefined variable 'x'.", 5);
        let run = ExecutionResult::new("", "Undefined variable 'x'.\n[line 3]", EXIT_RUNTIME_ERROR);
        let failures = validate(&expectation, &run);

        assert_eq!(
            messages(&failures),
            vec!["Expected runtime error on line 5 but was on line 3."]
        );
    }

    #[test]
    fn test_runtime_error_line_out_of_range() {
        let expectation = runtime_expectation("Undefined variable 'x'.", 5);
        let stderr = "Undefined variable 'x'.\n[line 99999999999999999999999] in script";
        let failures = validate(&expectation, &ExecutionResult::new("", stderr, EXIT_RUNTIME_ERROR));

        assert_eq!(
            messages(&failures),
            vec!["Expected runtime error on line 5 but was on line 99999999999999999999999."]
        );
    }

    #[test]
    fn test_runtime_error_missing() {
        let expectation = runtime_expectation("boom", 1);
        let failures = validate(&expectation, &ExecutionResult::new("", "", 0));

        assert_eq!(
            messages(&failures),
            vec![
                "Expected runtime error 'boom' and got none.",
                "Expected return code 70 and got 0. Stderr:",
            ]
        );
    }

    #[test]
    fn test_runtime_error_wrong_message() {
        let expectation = runtime_expectation("boom", 1);
        let run = ExecutionResult::new("", "bang\n[line 1] in script\n", EXIT_RUNTIME_ERROR);
        let failures = validate(&expectation, &run);

        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].message, "Expected runtime error 'boom' and got:");
        assert_eq!(failures[0].details, vec!["bang"]);
    }

    #[test]
    fn test_runtime_error_without_stack_trace() {
        let expectation = runtime_expectation("boom", 1);
        let run = ExecutionResult::new("", "boom\nno trace here\n", EXIT_RUNTIME_ERROR);
        let failures = validate(&expectation, &run);

        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].message, "Expected stack trace and got:");
        assert_eq!(failures[0].details, vec!["no trace here", ""]);
    }

    #[test]
    fn test_runtime_error_uses_first_stack_frame() {
        let expectation = runtime_expectation("boom", 2);
        let run = ExecutionResult::new("", "boom\n[line 2] in f()\n[line 9] in script\n", EXIT_RUNTIME_ERROR);
        assert!(validate(&expectation, &run).is_empty());
    }

    // ========================================
    // Compile errors
    // ========================================

    #[test]
    fn test_compile_errors_order_independent() {
        let expectation = compile_expectation(&[(2, "错误 A"), (4, "错误 B")]);
        let run = ExecutionResult::new("", "【行 4】错误 B\n【行 2】错误 A\n", EXIT_COMPILE_ERROR);
        assert!(validate(&expectation, &run).is_empty());
    }

    #[test]
    fn test_missing_expected_error() {
        let expectation = compile_expectation(&[(2, "错误 A")]);
        let run = ExecutionResult::new("", "", EXIT_COMPILE_ERROR);
        let failures = validate(&expectation, &run);

        assert_eq!(messages(&failures), vec!["Missing expected error: [2] 错误 A"]);
    }

    #[test]
    fn test_unexpected_error_and_stderr_output() {
        let run = ExecutionResult::new("", "【行 1】错误 surprise\nwarning: odd\n", EXIT_COMPILE_ERROR);
        let mut expectation = Expectation::new();
        expectation.expected_exit_code = EXIT_COMPILE_ERROR;
        let failures = validate(&expectation, &run);

        assert_eq!(
            messages(&failures),
            vec!["Unexpected error:", "Unexpected output on stderr:"]
        );
        assert_eq!(failures[0].details, vec!["【行 1】错误 surprise"]);
        assert_eq!(failures[1].details, vec!["warning: odd"]);
    }

    #[test]
    fn test_unexpected_lines_truncated() {
        let stderr: Vec<String> = (1..=13).map(|n| format!("【行 {}】错误 unexpected", n)).collect();
        let run = ExecutionResult::new("", stderr.join("\n"), 0);
        let failures = validate(&Expectation::new(), &run);

        assert_eq!(failures.len(), 11);
        assert!(failures[..10].iter().all(|f| f.message == "Unexpected error:"));
        assert_eq!(failures[10].message, "(truncated 3 more...)");
    }

    #[test]
    fn test_truncation_counter_shared_between_categories() {
        let mut lines: Vec<String> = (1..=6).map(|n| format!("【行 {}】错误 x", n)).collect();
        lines.extend((1..=6).map(|n| format!("noise {}", n)));
        let run = ExecutionResult::new("", lines.join("\n"), 0);
        let failures = validate(&Expectation::new(), &run);

        assert_eq!(failures.len(), 11);
        assert_eq!(failures.iter().filter(|f| f.message == "Unexpected error:").count(), 6);
        assert_eq!(
            failures.iter().filter(|f| f.message == "Unexpected output on stderr:").count(),
            4
        );
        assert_eq!(failures[10].message, "(truncated 2 more...)");
    }

    #[test]
    fn test_custom_truncation_cap() {
        let run = ExecutionResult::new("", "a\nb\nc", 0);
        let validator = Validator::new(ValidatorConfig::new().with_truncation_cap(1));
        let failures = validator.validate(&Expectation::new(), &run);

        assert_eq!(
            messages(&failures),
            vec!["Unexpected output on stderr:", "(truncated 2 more...)"]
        );
    }

    // ========================================
    // Exit code
    // ========================================

    #[test]
    fn test_exit_code_mismatch_reports_both_codes() {
        let failures = validate(&Expectation::new(), &ExecutionResult::new("", "", 70));

        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].message, "Expected return code 0 and got 70. Stderr:");
        assert_eq!(failures[0].details, vec![""]);
    }

    #[test]
    fn test_exit_code_context_bounded() {
        let expectation = runtime_expectation("boom", 1);
        let stderr: Vec<String> = std::iter::once("boom".to_string())
            .chain((0..14).map(|n| format!("[line 1] frame {}", n)))
            .collect();
        let run = ExecutionResult::new("", stderr.join("\n"), 1);
        let failures = validate(&expectation, &run);

        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].details.len(), 11);
        assert_eq!(failures[0].details[0], "boom");
        assert_eq!(failures[0].details[10], "(truncated...)");
    }

    // ========================================
    // Stdout
    // ========================================

    fn output_expectation(lines: &[&str]) -> Expectation {
        let mut expectation = Expectation::new();
        for (index, text) in lines.iter().enumerate() {
            expectation.push_output(index + 1, *text);
        }
        expectation
    }

    #[test]
    fn test_output_matches() {
        let expectation = output_expectation(&["1", "2"]);
        assert!(validate(&expectation, &ExecutionResult::new("1\n2\n", "", 0)).is_empty());
    }

    #[test]
    fn test_output_mismatch() {
        let expectation = output_expectation(&["1", "2"]);
        let failures = validate(&expectation, &ExecutionResult::new("1\n3\n", "", 0));

        assert_eq!(messages(&failures), vec!["Expected output '2' on line 2 and got '3'."]);
    }

    #[test]
    fn test_unexpected_output() {
        let expectation = output_expectation(&["1"]);
        let failures = validate(&expectation, &ExecutionResult::new("1\nextra\n", "", 0));

        assert_eq!(messages(&failures), vec!["Got output 'extra' when none was expected."]);
    }

    #[test]
    fn test_only_one_trailing_empty_line_trimmed() {
        let expectation = output_expectation(&["1"]);
        let failures = validate(&expectation, &ExecutionResult::new("1\n\n", "", 0));

        assert_eq!(messages(&failures), vec!["Got output '' when none was expected."]);
    }

    #[test]
    fn test_short_output_lenient() {
        let expectation = output_expectation(&["1", "2"]);
        assert!(validate(&expectation, &ExecutionResult::new("1\n", "", 0)).is_empty());
    }

    #[test]
    fn test_short_output_strict() {
        let expectation = output_expectation(&["1", "2", "3"]);
        let validator = Validator::new(ValidatorConfig::new().with_output_length(OutputLengthPolicy::Strict));
        let failures = validator.validate(&expectation, &ExecutionResult::new("1\n", "", 0));

        assert_eq!(
            messages(&failures),
            vec![
                "Missing expected output '2' on line 2.",
                "Missing expected output '3' on line 3.",
            ]
        );
    }

    // ========================================
    // Accumulation
    // ========================================

    #[test]
    fn test_checks_accumulate_in_order() {
        let mut expectation = output_expectation(&["ok"]);
        expectation.push_compile_error(3, "错误 A");
        let run = ExecutionResult::new("bad\n", "", 0);
        let failures = validate(&expectation, &run);

        assert_eq!(
            messages(&failures),
            vec![
                "Missing expected error: [3] 错误 A",
                "Expected return code 65 and got 0. Stderr:",
                "Expected output 'ok' on line 1 and got 'bad'.",
            ]
        );
    }

    #[test]
    fn test_failure_display() {
        let failure = Failure::new("Unexpected error:").with_detail("【行 1】错误 x");
        assert_eq!(failure.to_string(), "Unexpected error:\n【行 1】错误 x");
    }
}

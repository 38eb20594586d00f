//! CLI module for the qi conformance test runner
//!
//! ## Binaries
//!
//! - `qitest --interpreter <PATH>` - Run the conformance suite against an interpreter
//! - `qitest-bench [INTERPRETERS...] <BENCHMARK>` - Repeatedly time a benchmark script
//!
//! ## Modules
//!
//! - `config` - Suite and benchmark configuration
//! - `interfaces` - Test discovery and process execution boundaries
//! - `suite` - Suite driver (parse, run, validate per file)
//! - `reporter` - Console and JSON reporters
//! - `bench` - Benchmark loop
//!
//! ## Design
//!
//! The CLI uses clap for argument parsing with derive macros.
//! Command functions return `CliResult<T>` instead of calling `process::exit`.
//! Only the top-level entry points handle errors and exit.

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod bench;
pub mod config;
pub mod interfaces;
pub mod reporter;
pub mod suite;

use std::fmt;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use qitest_expect::{OutputLengthPolicy, ValidatorConfig};

use config::{DEFAULT_TEST_ROOT, ReportFormat, SuiteConfig};

// ============================================================================
// CLI Error handling
// ============================================================================

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    pub const FAILURE: ExitCode = ExitCode(1);
}

/// Error type for CLI operations.
///
/// Contains a user-facing message and an exit code. The CLI entry point
/// catches these errors, prints the message, and exits with the code.
#[derive(Debug)]
pub struct CliError {
    /// User-facing error message (already formatted for display)
    pub message: String,
    /// Exit code to return to the shell
    pub exit_code: ExitCode,
}

impl CliError {
    /// Create a new CLI error with a message and exit code.
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }

    /// Create a failure error (exit code 1).
    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::FAILURE)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

const VERSION: &str = crate::version::QITEST_VERSION;

// ============================================================================
// Clap CLI definition
// ============================================================================

/// Conformance test runner for the qi interpreter
#[derive(Parser, Debug)]
#[command(name = "qitest")]
#[command(version = VERSION)]
#[command(about = "Conformance test runner for the qi interpreter", long_about = None)]
pub struct Cli {
    /// Path to the interpreter under test
    #[arg(short, long, value_name = "PATH")]
    pub interpreter: PathBuf,

    /// Test tree root (or a single test script)
    #[arg(long, value_name = "DIR", default_value = DEFAULT_TEST_ROOT)]
    pub root: PathBuf,

    /// Also fail when the interpreter prints fewer lines than expected
    #[arg(long)]
    pub strict_output: bool,

    /// Report format
    #[arg(long, value_enum, default_value_t = ReportFormat::Console)]
    pub format: ReportFormat,
}

impl Cli {
    /// Build the suite configuration these flags describe.
    pub fn suite_config(&self) -> SuiteConfig {
        let output_length = if self.strict_output {
            OutputLengthPolicy::Strict
        } else {
            OutputLengthPolicy::Lenient
        };

        SuiteConfig::new(self.interpreter.clone())
            .with_root(self.root.clone())
            .with_validator(ValidatorConfig::new().with_output_length(output_length))
            .with_format(self.format)
    }
}

// ============================================================================
// CLI entry point
// ============================================================================

/// Main CLI entry point for `qitest`.
pub fn run() {
    let cli = Cli::parse();
    exit_with(execute(cli));
}

/// Execute the parsed CLI and return result.
fn execute(cli: Cli) -> CliResult<ExitCode> {
    suite::run_suite(cli.suite_config())
}

/// Print any error message and exit with the result's code.
///
/// This is the only place where `process::exit` is called.
pub(crate) fn exit_with(result: CliResult<ExitCode>) {
    match result {
        Ok(exit_code) => {
            if exit_code.0 != 0 {
                process::exit(exit_code.0);
            }
        }
        Err(e) => {
            if !e.message.is_empty() {
                eprintln!("{}", e.message);
            }
            process::exit(e.exit_code.0);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_requires_interpreter() {
        assert!(Cli::try_parse_from(["qitest"]).is_err());
    }

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["qitest", "--interpreter", "build/qi"]).unwrap();
        let config = cli.suite_config();

        assert_eq!(config.interpreter, PathBuf::from("build/qi"));
        assert_eq!(config.root, PathBuf::from("test"));
        assert_eq!(config.validator.output_length, OutputLengthPolicy::Lenient);
        assert_eq!(config.validator.truncation_cap, 10);
        assert_eq!(config.format, ReportFormat::Console);
    }

    #[test]
    fn test_cli_all_flags() {
        let cli = Cli::try_parse_from([
            "qitest",
            "-i",
            "qi",
            "--root",
            "suite",
            "--strict-output",
            "--format",
            "json",
        ])
        .unwrap();
        let config = cli.suite_config();

        assert_eq!(config.root, PathBuf::from("suite"));
        assert_eq!(config.validator.output_length, OutputLengthPolicy::Strict);
        assert_eq!(config.format, ReportFormat::Json);
    }

    #[test]
    fn test_cli_error_failure() {
        let err = CliError::failure("boom");
        assert_eq!(err.exit_code, ExitCode::FAILURE);
        assert_eq!(err.to_string(), "boom");
    }
}

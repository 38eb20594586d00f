//! Conformance suite driver
//!
//! Walks the test tree and, one file at a time, parses the script's expectations, runs it under the interpreter and
//! validates the result. Counts live in a [`SuiteTally`] owned by the driver loop and threaded through each file.
//!
//! ## Error handling
//!
//! - Validation failures are per-file values; the suite always moves on to the next file.
//! - Scripts with contradictory markers are reported as invalid and count as neither pass nor fail.
//! - Unreadable files, unreadable directories and interpreter launch failures abort the whole run.

use std::path::Path;
use std::time::Instant;

use qitest_expect::{DefinitionError, Failure, ParseOutcome, Validator, parse_file};

use super::config::{ReportFormat, SuiteConfig};
use super::interfaces::{CommandRunner, FsDiscovery, ProcessRunner, SuiteError, TestDiscovery};
use super::reporter::{ConsoleReporter, JsonReporter, TestReporter};
use super::{CliError, CliResult, ExitCode};

/// Running totals for a suite
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SuiteTally {
    pub passed: usize,
    pub failed: usize,
    /// Files marked `// nontest`
    pub skipped: usize,
    /// Files rejected for contradictory markers
    pub invalid: usize,
    /// Markers recognised across all accepted files
    pub expectations: usize,
}

impl SuiteTally {
    /// Whether every counted test passed
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }

    pub fn record(&mut self, outcome: &FileOutcome) {
        match outcome {
            FileOutcome::Passed => self.passed += 1,
            FileOutcome::Failed(_) => self.failed += 1,
            FileOutcome::Skipped => self.skipped += 1,
            FileOutcome::Invalid(_) => self.invalid += 1,
        }
    }
}

/// Result of processing one test file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    Passed,
    Failed(Vec<Failure>),
    Skipped,
    Invalid(DefinitionError),
}

impl FileOutcome {
    pub fn status(&self) -> &'static str {
        match self {
            FileOutcome::Passed => "passed",
            FileOutcome::Failed(_) => "failed",
            FileOutcome::Skipped => "skipped",
            FileOutcome::Invalid(_) => "invalid",
        }
    }
}

/// A conformance suite over some discovery strategy and process runner.
pub struct Suite<D, R> {
    config: SuiteConfig,
    discovery: D,
    runner: R,
    validator: Validator,
}

impl Suite<FsDiscovery, CommandRunner> {
    /// Suite over the filesystem, running the real interpreter.
    pub fn from_config(config: SuiteConfig) -> Self {
        let discovery = FsDiscovery::from_config(&config);
        Self::new(config, discovery, CommandRunner)
    }
}

impl<D: TestDiscovery, R: ProcessRunner> Suite<D, R> {
    pub fn new(config: SuiteConfig, discovery: D, runner: R) -> Self {
        let validator = Validator::new(config.validator);
        Self {
            config,
            discovery,
            runner,
            validator,
        }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Run every discovered test file in order, reporting as it goes.
    pub fn run(&self, reporter: &mut dyn TestReporter) -> Result<SuiteTally, SuiteError> {
        let start = Instant::now();
        let files = self.discovery.discover(&self.config.root)?;
        if files.is_empty() {
            tracing::warn!(root = %self.config.root.display(), "no test files found");
        }

        tracing::debug!(count = files.len(), root = %self.config.root.display(), "discovered test files");
        reporter.on_suite_start(files.len()).map_err(SuiteError::Report)?;

        let mut tally = SuiteTally::default();
        for path in &files {
            reporter.on_file_start(path, &tally).map_err(SuiteError::Report)?;
            let outcome = self.run_file(path, &mut tally)?;
            reporter
                .on_file_complete(path, &outcome, &tally)
                .map_err(SuiteError::Report)?;
        }

        reporter
            .on_suite_complete(&tally, start.elapsed())
            .map_err(SuiteError::Report)?;
        Ok(tally)
    }

    /// Parse, execute and validate a single file, recording the outcome in `tally`.
    pub fn run_file(&self, path: &Path, tally: &mut SuiteTally) -> Result<FileOutcome, SuiteError> {
        let outcome = match parse_file(path)? {
            ParseOutcome::Excluded => FileOutcome::Skipped,
            ParseOutcome::Invalid(err) => {
                tracing::debug!(path = %path.display(), "rejected test definition");
                FileOutcome::Invalid(err)
            }
            ParseOutcome::Accepted(expectation) => {
                tally.expectations += expectation.expectation_count;
                let result = self.runner.execute(&self.config.interpreter, path)?;
                tracing::debug!(path = %path.display(), exit_code = result.exit_code, "script finished");

                let failures = self.validator.validate(&expectation, &result);
                if failures.is_empty() {
                    FileOutcome::Passed
                } else {
                    FileOutcome::Failed(failures)
                }
            }
        };

        tally.record(&outcome);
        Ok(outcome)
    }
}

/// Run the suite described by `config` with the real interpreter, reporting in the configured format.
pub fn run_suite(config: SuiteConfig) -> CliResult<ExitCode> {
    let format = config.format;
    let suite = Suite::from_config(config);

    let tally = match format {
        ReportFormat::Console => suite.run(&mut ConsoleReporter::stdout()),
        ReportFormat::Json => suite.run(&mut JsonReporter::stdout()),
    }
    .map_err(|e| CliError::failure(format!("Error: {}", e)))?;

    if tally.all_passed() {
        Ok(ExitCode::SUCCESS)
    } else {
        // Failures were already printed by the reporter
        Err(CliError::new("", ExitCode::FAILURE))
    }
}

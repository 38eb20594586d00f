//! Suite reporters
//!
//! The suite driver calls a [`TestReporter`] at each step, which keeps presentation out of the driver. Two
//! implementations ship: a console reporter with a transient progress line, and a JSON lines reporter for tooling.

use std::fmt::Display;
use std::io::{self, Write};
use std::iter;
use std::path::Path;
use std::time::Duration;

use miette::Diagnostic;
use serde_json::json;

use super::suite::{FileOutcome, SuiteTally};
use crate::version::QITEST_VERSION;

const GREEN: &str = "\x1b[32m";
const MAGENTA: &str = "\x1b[35m";
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const GRAY: &str = "\x1b[1;30m";
const RESET: &str = "\x1b[0m";
const CLEAR_LINE: &str = "\r\x1b[K";

/// Trait for reporting suite progress and results.
///
/// Implement this trait to customize the output format.
pub trait TestReporter {
    /// Called once the test files are known
    fn on_suite_start(&mut self, _file_count: usize) -> io::Result<()> {
        Ok(())
    }

    /// Called before a file is parsed
    fn on_file_start(&mut self, _path: &Path, _tally: &SuiteTally) -> io::Result<()> {
        Ok(())
    }

    /// Called after a file has been processed; `tally` already includes it
    fn on_file_complete(&mut self, path: &Path, outcome: &FileOutcome, tally: &SuiteTally) -> io::Result<()>;

    /// Called when all files have been processed
    fn on_suite_complete(&mut self, tally: &SuiteTally, duration: Duration) -> io::Result<()>;
}

/// Console reporter.
///
/// With `progress` on, a one-line tally is redrawn in place for every file and cleared before anything permanent is
/// printed.
pub struct ConsoleReporter<W: Write> {
    out: W,
    color: bool,
    progress: bool,
}

impl ConsoleReporter<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout(), true, true)
    }
}

impl<W: Write> ConsoleReporter<W> {
    pub fn new(out: W, color: bool, progress: bool) -> Self {
        Self { out, color, progress }
    }

    /// No colours, no progress line
    pub fn plain(out: W) -> Self {
        Self::new(out, false, false)
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn paint(&self, color: &str, text: impl Display) -> String {
        if self.color {
            format!("{}{}{}", color, text, RESET)
        } else {
            text.to_string()
        }
    }

    fn clear_line(&mut self) -> io::Result<()> {
        if self.progress {
            write!(self.out, "{}", CLEAR_LINE)?;
        }
        Ok(())
    }
}

impl<W: Write> TestReporter for ConsoleReporter<W> {
    fn on_file_start(&mut self, path: &Path, tally: &SuiteTally) -> io::Result<()> {
        if !self.progress {
            return Ok(());
        }

        let line = format!(
            "Passed: {} Failed: {} Skipped: {} {}",
            self.paint(GREEN, tally.passed),
            self.paint(RED, tally.failed),
            self.paint(YELLOW, tally.skipped),
            self.paint(GRAY, path.display())
        );
        write!(self.out, "{}", line)?;
        self.out.flush()
    }

    fn on_file_complete(&mut self, path: &Path, outcome: &FileOutcome, _tally: &SuiteTally) -> io::Result<()> {
        self.clear_line()?;

        match outcome {
            FileOutcome::Failed(failures) => {
                let header = self.paint(RED, "FAIL");
                writeln!(self.out, "{} {}", header, path.display())?;
                for failure in failures {
                    for line in iter::once(&failure.message).chain(&failure.details) {
                        let line = self.paint(RED, line);
                        writeln!(self.out, "     {}", line)?;
                    }
                }
            }
            FileOutcome::Invalid(err) => {
                let header = self.paint(MAGENTA, "TEST_ERROR");
                writeln!(self.out, "{} {}", header, path.display())?;
                writeln!(self.out, "     {}", err)?;
                if let Some(help) = err.help() {
                    writeln!(self.out, "     help: {}", help)?;
                }
                writeln!(self.out)?;
            }
            FileOutcome::Passed | FileOutcome::Skipped => {}
        }

        self.out.flush()
    }

    fn on_suite_complete(&mut self, tally: &SuiteTally, _duration: Duration) -> io::Result<()> {
        let passed = self.paint(GREEN, tally.passed);
        if tally.all_passed() {
            writeln!(
                self.out,
                "All {} tests passed ({} expectations).",
                passed, tally.expectations
            )?;
        } else {
            let failed = self.paint(RED, tally.failed);
            writeln!(
                self.out,
                "{} tests passed. {} tests failed ({} expectations).",
                passed, failed, tally.expectations
            )?;
        }
        self.out.flush()
    }
}

/// JSON lines reporter: one object per file, then a summary object.
pub struct JsonReporter<W: Write> {
    out: W,
}

impl JsonReporter<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> JsonReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> TestReporter for JsonReporter<W> {
    fn on_file_complete(&mut self, path: &Path, outcome: &FileOutcome, _tally: &SuiteTally) -> io::Result<()> {
        let mut record = json!({
            "path": path.display().to_string(),
            "status": outcome.status(),
        });

        match outcome {
            FileOutcome::Failed(failures) => {
                record["failures"] = failures
                    .iter()
                    .map(|f| json!({ "message": f.message, "details": f.details }))
                    .collect();
            }
            FileOutcome::Invalid(err) => {
                record["error"] = json!(err.to_string());
            }
            FileOutcome::Passed | FileOutcome::Skipped => {}
        }

        writeln!(self.out, "{}", record)
    }

    fn on_suite_complete(&mut self, tally: &SuiteTally, duration: Duration) -> io::Result<()> {
        let summary = json!({
            "summary": {
                "passed": tally.passed,
                "failed": tally.failed,
                "skipped": tally.skipped,
                "invalid": tally.invalid,
                "expectations": tally.expectations,
            },
            "duration_secs": duration.as_secs_f64(),
            "version": QITEST_VERSION,
        });
        writeln!(self.out, "{}", summary)?;
        self.out.flush()
    }
}

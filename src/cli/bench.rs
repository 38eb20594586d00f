//! Benchmark loop
//!
//! Runs one benchmark script over and over and tracks the best time seen for each interpreter. A benchmark script
//! reports its own elapsed time in seconds as the last line of stdout.
//!
//! With one interpreter each trial prints the best time so far. With several, each trial prints a comparison: the
//! fastest interpreter shows how much more work per second it does than the slowest, the others show their time as
//! a multiple of the fastest.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::Parser;
use thiserror::Error;

use super::config::{BenchConfig, DEFAULT_BENCH_ROOT};
use super::interfaces::{CommandRunner, ProcessRunner, RunnerError};
use super::{CliError, CliResult, ExitCode};

/// Errors that stop the benchmark loop
#[derive(Debug, Error)]
pub enum BenchError {
    #[error(transparent)]
    Runner(#[from] RunnerError),

    #[error("'{}' exited with code {exit_code}:\n{stderr}", interpreter.display())]
    Failed {
        interpreter: PathBuf,
        exit_code: i32,
        stderr: String,
    },

    #[error("could not read an elapsed time from the output of '{}': {output:?}", interpreter.display())]
    Elapsed { interpreter: PathBuf, output: String },

    #[error("failed to write results: {0}")]
    Io(#[from] io::Error),
}

/// Repeatedly time a qi benchmark script
#[derive(Parser, Debug)]
#[command(name = "qitest-bench")]
#[command(version = super::VERSION)]
#[command(about = "Repeatedly time a qi benchmark script", long_about = None)]
pub struct BenchCli {
    /// Interpreters to compare, followed by the benchmark name
    #[arg(value_name = "INTERPRETER... BENCHMARK", required = true, num_args = 1..)]
    pub args: Vec<String>,

    /// Directory holding the benchmark scripts
    #[arg(long, value_name = "DIR", default_value = DEFAULT_BENCH_ROOT)]
    pub root: PathBuf,

    /// Stop after this many trials (default: run until interrupted)
    #[arg(long, value_name = "N")]
    pub trials: Option<u64>,
}

impl BenchCli {
    pub fn into_config(self) -> CliResult<BenchConfig> {
        let Some((benchmark, interpreters)) = self.args.split_last() else {
            return Err(CliError::failure("Usage: qitest-bench [interpreters...] <benchmark>"));
        };

        Ok(BenchConfig::new(benchmark.clone())
            .with_interpreters(interpreters.iter().map(PathBuf::from))
            .with_root(self.root)
            .with_trials(self.trials))
    }
}

/// How one interpreter compares with the others after a trial
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    /// Fastest interpreter: extra work per second over the slowest, in percent
    Faster(f64),
    /// Best time as a multiple of the fastest interpreter's
    TimeOfBest(f64),
}

/// Best time per interpreter, in configuration order
#[derive(Debug, Clone)]
pub struct BestTimes {
    entries: Vec<(PathBuf, f64)>,
}

impl BestTimes {
    pub fn new(interpreters: &[PathBuf]) -> Self {
        Self {
            entries: interpreters.iter().map(|i| (i.clone(), f64::INFINITY)).collect(),
        }
    }

    pub fn record(&mut self, index: usize, elapsed: f64) {
        if let Some((_, best)) = self.entries.get_mut(index) {
            if elapsed < *best {
                *best = elapsed;
            }
        }
    }

    pub fn best(&self, index: usize) -> Option<f64> {
        self.entries.get(index).map(|(_, best)| *best)
    }

    /// Rank every interpreter against the fastest and slowest best times.
    pub fn compare(&self) -> Vec<(&Path, f64, Verdict)> {
        let mut fastest: Option<usize> = None;
        let mut worst_time = f64::MIN_POSITIVE;
        for (index, (_, best)) in self.entries.iter().enumerate() {
            if fastest.is_none_or(|f| *best < self.entries[f].1) {
                fastest = Some(index);
            }
            if *best > worst_time {
                worst_time = *best;
            }
        }

        let Some(fastest) = fastest else {
            return Vec::new();
        };
        let best_time = self.entries[fastest].1;

        self.entries
            .iter()
            .enumerate()
            .map(|(index, (interpreter, best))| {
                let verdict = if index == fastest {
                    Verdict::Faster(100.0 * (worst_time / best_time - 1.0))
                } else {
                    Verdict::TimeOfBest(best / best_time)
                };
                (interpreter.as_path(), *best, verdict)
            })
            .collect()
    }
}

/// Read the elapsed seconds from the last non-empty line of a benchmark's stdout.
pub fn parse_elapsed(stdout: &str) -> Option<f64> {
    stdout
        .lines()
        .rev()
        .find(|line| !line.trim().is_empty())?
        .trim()
        .parse()
        .ok()
}

/// Run the benchmark once under `interpreter` and return its self-reported elapsed time.
pub fn run_trial(runner: &dyn ProcessRunner, interpreter: &Path, script: &Path) -> Result<f64, BenchError> {
    let result = runner.execute(interpreter, script)?;
    if result.exit_code != 0 {
        return Err(BenchError::Failed {
            interpreter: interpreter.to_path_buf(),
            exit_code: result.exit_code,
            stderr: result.stderr,
        });
    }

    parse_elapsed(&result.stdout).ok_or_else(|| BenchError::Elapsed {
        interpreter: interpreter.to_path_buf(),
        output: result.stdout.clone(),
    })
}

/// Run trials until the configured limit (or forever), writing progress to `out`.
pub fn run_benchmark(config: &BenchConfig, runner: &dyn ProcessRunner, out: &mut dyn Write) -> Result<(), BenchError> {
    let script = config.script_path();
    let mut best = BestTimes::new(&config.interpreters);
    tracing::debug!(script = %script.display(), interpreters = config.interpreters.len(), "starting benchmark");

    let mut trial: u64 = 1;
    while config.trials.is_none_or(|limit| trial <= limit) {
        for (index, interpreter) in config.interpreters.iter().enumerate() {
            let elapsed = run_trial(runner, interpreter, &script)?;
            best.record(index, elapsed);
        }

        if config.is_comparison() {
            writeln!(out, "trial #{}", trial)?;
            for (interpreter, time, verdict) in best.compare() {
                let suffix = match verdict {
                    Verdict::Faster(percent) => format!("{:.4}% faster", percent),
                    Verdict::TimeOfBest(ratio) => format!("{:.4}x time of best", ratio),
                };
                writeln!(out, "  {:>30}  best {:.4}s {}", interpreter.display(), time, suffix)?;
            }
        } else if let Some(interpreter) = config.interpreters.first() {
            let time = best.best(0).unwrap_or(f64::INFINITY);
            writeln!(out, "trial #{} {}  best {:.2}s", trial, interpreter.display(), time)?;
        }
        out.flush()?;

        trial += 1;
    }

    Ok(())
}

/// Entry point for the `qitest-bench` binary.
pub fn run() {
    let cli = BenchCli::parse();
    let result = cli.into_config().and_then(|config| {
        let mut stdout = io::stdout();
        run_benchmark(&config, &CommandRunner, &mut stdout)
            .map(|()| ExitCode::SUCCESS)
            .map_err(|e| CliError::failure(format!("Error: {}", e)))
    });

    super::exit_with(result);
}

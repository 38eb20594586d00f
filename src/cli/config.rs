//! Suite and benchmark configuration
//!
//! Both structs are plain builders filled in from CLI flags. Defaults mirror the layout of the qi repository: tests
//! under `test/`, benchmarks under `test/benchmark/`, the release interpreter under `src/cmake-build-release/`.

use std::path::PathBuf;

use qitest_expect::ValidatorConfig;

/// Default root of the test tree
pub const DEFAULT_TEST_ROOT: &str = "test";
/// Extension of qi test scripts
pub const DEFAULT_EXTENSION: &str = "qi";
/// Any path containing this segment is left out of the suite
pub const DEFAULT_EXCLUDE_SEGMENT: &str = "benchmark";
/// Directory holding benchmark scripts
pub const DEFAULT_BENCH_ROOT: &str = "test/benchmark";
/// Interpreter benchmarked when none is given
pub const DEFAULT_BENCH_INTERPRETER: &str = "src/cmake-build-release/qi";

/// How suite results are reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ReportFormat {
    /// Coloured progress line and failure listing
    #[default]
    Console,
    /// One JSON object per test file, then a summary object
    Json,
}

/// Conformance suite configuration
#[derive(Debug, Clone)]
pub struct SuiteConfig {
    /// Interpreter executable under test
    pub interpreter: PathBuf,
    /// Directory (or single script) to collect tests from
    pub root: PathBuf,
    pub extension: String,
    /// Paths with a component containing this string are skipped. Empty disables exclusion.
    pub exclude_segment: String,
    pub validator: ValidatorConfig,
    pub format: ReportFormat,
}

impl SuiteConfig {
    pub fn new(interpreter: impl Into<PathBuf>) -> Self {
        Self {
            interpreter: interpreter.into(),
            root: PathBuf::from(DEFAULT_TEST_ROOT),
            extension: DEFAULT_EXTENSION.to_string(),
            exclude_segment: DEFAULT_EXCLUDE_SEGMENT.to_string(),
            validator: ValidatorConfig::default(),
            format: ReportFormat::default(),
        }
    }

    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    pub fn with_exclude_segment(mut self, segment: impl Into<String>) -> Self {
        self.exclude_segment = segment.into();
        self
    }

    pub fn with_validator(mut self, validator: ValidatorConfig) -> Self {
        self.validator = validator;
        self
    }

    pub fn with_format(mut self, format: ReportFormat) -> Self {
        self.format = format;
        self
    }
}

/// Benchmark loop configuration
#[derive(Debug, Clone)]
pub struct BenchConfig {
    pub interpreters: Vec<PathBuf>,
    /// Benchmark name, without directory or extension
    pub benchmark: String,
    pub root: PathBuf,
    pub extension: String,
    /// Stop after this many trials; `None` runs until interrupted
    pub trials: Option<u64>,
}

impl BenchConfig {
    pub fn new(benchmark: impl Into<String>) -> Self {
        Self {
            interpreters: vec![PathBuf::from(DEFAULT_BENCH_INTERPRETER)],
            benchmark: benchmark.into(),
            root: PathBuf::from(DEFAULT_BENCH_ROOT),
            extension: DEFAULT_EXTENSION.to_string(),
            trials: None,
        }
    }

    /// Replace the interpreter list. An empty list keeps the default interpreter.
    pub fn with_interpreters<I, P>(mut self, interpreters: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let interpreters: Vec<PathBuf> = interpreters.into_iter().map(Into::into).collect();
        if !interpreters.is_empty() {
            self.interpreters = interpreters;
        }
        self
    }

    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    pub fn with_trials(mut self, trials: Option<u64>) -> Self {
        self.trials = trials;
        self
    }

    /// Path of the benchmark script
    pub fn script_path(&self) -> PathBuf {
        self.root.join(format!("{}.{}", self.benchmark, self.extension))
    }

    pub fn is_comparison(&self) -> bool {
        self.interpreters.len() > 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qitest_expect::OutputLengthPolicy;

    #[test]
    fn test_suite_defaults() {
        let config = SuiteConfig::new("qi");
        assert_eq!(config.interpreter, PathBuf::from("qi"));
        assert_eq!(config.root, PathBuf::from("test"));
        assert_eq!(config.extension, "qi");
        assert_eq!(config.exclude_segment, "benchmark");
        assert_eq!(config.validator, ValidatorConfig::default());
        assert_eq!(config.format, ReportFormat::Console);
    }

    #[test]
    fn test_suite_builder_chain() {
        let config = SuiteConfig::new("qi")
            .with_root("suite")
            .with_extension("lox")
            .with_exclude_segment("")
            .with_validator(ValidatorConfig::new().with_output_length(OutputLengthPolicy::Strict))
            .with_format(ReportFormat::Json);

        assert_eq!(config.root, PathBuf::from("suite"));
        assert_eq!(config.extension, "lox");
        assert!(config.exclude_segment.is_empty());
        assert_eq!(config.validator.output_length, OutputLengthPolicy::Strict);
        assert_eq!(config.format, ReportFormat::Json);
    }

    #[test]
    fn test_bench_defaults() {
        let config = BenchConfig::new("fib");
        assert_eq!(config.interpreters, vec![PathBuf::from("src/cmake-build-release/qi")]);
        assert_eq!(config.script_path(), PathBuf::from("test/benchmark/fib.qi"));
        assert!(!config.is_comparison());
        assert_eq!(config.trials, None);
    }

    #[test]
    fn test_bench_empty_interpreters_keep_default() {
        let config = BenchConfig::new("fib").with_interpreters(Vec::<PathBuf>::new());
        assert_eq!(config.interpreters.len(), 1);
    }

    #[test]
    fn test_bench_comparison() {
        let config = BenchConfig::new("zoo").with_interpreters(["a/qi", "b/qi"]).with_root("bench");
        assert!(config.is_comparison());
        assert_eq!(config.script_path(), PathBuf::from("bench/zoo.qi"));
    }
}

//! qitest-bench binary entry point
//!
//! Run with: qitest-bench [INTERPRETERS...] <BENCHMARK>
//!
//! Loops until interrupted unless `--trials` is given.

fn main() {
    qitest::init_tracing();
    qitest::cli::bench::run();
}

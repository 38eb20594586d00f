//! qitest CLI entry point

fn main() {
    qitest::init_tracing();
    qitest::cli::run();
}

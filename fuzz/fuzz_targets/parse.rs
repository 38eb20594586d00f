#![no_main]

use libfuzzer_sys::fuzz_target;
use qitest_expect::{ExecutionResult, ParseOutcome, parse_source, validate};

fuzz_target!(|data: &[u8]| {
    // First byte picks the exit code, the rest is "script\0stderr"
    let Some((&code, rest)) = data.split_first() else {
        return;
    };
    let Ok(text) = std::str::from_utf8(rest) else {
        return;
    };
    let (script, stderr) = text.split_once('\0').unwrap_or((text, ""));

    if let ParseOutcome::Accepted(expectation) = parse_source(script) {
        let _ = validate(&expectation, &ExecutionResult::new(script, stderr, i32::from(code)));
    }
});

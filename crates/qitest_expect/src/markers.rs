//! Comment markers recognised in test scripts, and the patterns used to read interpreter diagnostics.
//!
//! ## Marker grammar
//!
//! | Marker                             | Effect                                 |
//! |------------------------------------|----------------------------------------|
//! | `// nontest`                       | exclude the file from the suite        |
//! | `// expect: <text>`                | expect `<text>` as the next stdout line |
//! | `// 错误<message>`                 | compile error on this line             |
//! | `//【行 <N>】错误<message>`        | compile error reported against line N  |
//! | `// expect runtime error: <text>`  | runtime error raised on this line      |
//!
//! Rules are tried top to bottom and the first match wins, so a line carries at most one marker.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::expectation::Expectation;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    NonTest,
    Output,
    CompileError,
    CompileErrorAtLine,
    RuntimeError,
}

/// What the parser should do after a marker has been applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exclude,
}

type Handler = fn(&mut Expectation, usize, &Captures<'_>) -> Flow;

/// One row of the marker table.
pub struct MarkerRule {
    pub kind: MarkerKind,
    pattern: Regex,
    handler: Handler,
}

impl MarkerRule {
    fn new(kind: MarkerKind, pattern: &str, handler: Handler) -> Self {
        Self {
            kind,
            // INVARIANT: the patterns below are literals covered by unit tests.
            pattern: Regex::new(pattern).expect("INVARIANT: marker pattern must compile"),
            handler,
        }
    }

    /// Apply this rule to `line` if it matches, returning the resulting flow.
    pub fn apply(&self, expectation: &mut Expectation, line_number: usize, line: &str) -> Option<Flow> {
        let captures = self.pattern.captures(line)?;
        Some((self.handler)(expectation, line_number, &captures))
    }
}

/// The marker table, in match order.
pub static MARKERS: LazyLock<Vec<MarkerRule>> = LazyLock::new(|| {
    vec![
        MarkerRule::new(MarkerKind::NonTest, r"// nontest", |_, _, _| Flow::Exclude),
        MarkerRule::new(MarkerKind::Output, r"// expect: ?(.*)", |expectation, line, caps| {
            expectation.push_output(line, group(caps, 1));
            Flow::Continue
        }),
        MarkerRule::new(MarkerKind::CompileError, r"// (错误.*)", |expectation, line, caps| {
            expectation.push_compile_error(line, group(caps, 1));
            Flow::Continue
        }),
        MarkerRule::new(MarkerKind::CompileErrorAtLine, r"//【行 (\d+)】(错误.*)", |expectation, _, caps| {
            expectation.push_compile_error(group(caps, 1), group(caps, 2));
            Flow::Continue
        }),
        MarkerRule::new(
            MarkerKind::RuntimeError,
            r"// expect runtime error: (.+)",
            |expectation, line, caps| {
                if let Some(previous) = expectation.set_runtime_error(line, group(caps, 1)) {
                    tracing::warn!(
                        previous_line = previous.line,
                        line,
                        "second runtime error marker replaces the first"
                    );
                }
                Flow::Continue
            },
        ),
    ]
});

// INVARIANT: both patterns are literals covered by unit tests.
static SYNTAX_ERROR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"【.*行 (\d+)】(错误.+)").expect("INVARIANT: syntax error pattern must compile"));

static STACK_TRACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[line (\d+)]").expect("INVARIANT: stack trace pattern must compile"));

fn group<'h>(caps: &Captures<'h>, index: usize) -> &'h str {
    caps.get(index).map_or("", |m| m.as_str())
}

/// Run `line` through the marker table. Returns `None` when no marker matched.
pub fn apply_markers(expectation: &mut Expectation, line_number: usize, line: &str) -> Option<(MarkerKind, Flow)> {
    MARKERS
        .iter()
        .find_map(|rule| rule.apply(expectation, line_number, line).map(|flow| (rule.kind, flow)))
}

/// Read a compile diagnostic from a stderr line, formatted as `[line] message`.
pub fn diagnostic_location(line: &str) -> Option<String> {
    let caps = SYNTAX_ERROR.captures(line)?;
    Some(format!("[{}] {}", group(&caps, 1), group(&caps, 2)))
}

/// Find the line number in a stack-trace line such as `[line 3] in script`.
///
/// Returns the digits as written; the caller decides whether they name the expected line.
pub fn stack_trace_line(line: &str) -> Option<&str> {
    Some(STACK_TRACE.captures(line)?.get(1)?.as_str())
}

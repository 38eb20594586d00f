#![forbid(unsafe_code)]
//! Expectation extraction and result validation for the qi conformance test runner.
//!
//! A qi test script declares what it expects from its own execution through comment markers
//! (`// expect: 3`, `// expect runtime error: ...`, compile-error markers). This crate turns those markers into an
//! [`Expectation`] and checks a finished interpreter run against it.
//!
//! ## Notes
//! - This crate is intentionally I/O-light: apart from [`parser::parse_file`] it never touches the filesystem, and it
//!   never spawns processes. Running the interpreter is the caller's job.
//! - Validation never short-circuits. A single run can report a wrong exit code, a missing diagnostic and a bad
//!   output line at the same time.
//!
//! ## Examples
//! ```rust
//! use qitest_expect::{ExecutionResult, parser, validator};
//!
//! let outcome = parser::parse_source("print 1; // expect: 1\nprint 2; // expect: 2\n");
//! let expectation = outcome.accepted().unwrap();
//!
//! let run = ExecutionResult::new("1\n2\n", "", 0);
//! assert!(validator::validate(&expectation, &run).is_empty());
//! ```

pub mod errors;
pub mod expectation;
pub mod markers;
pub mod parser;
pub mod validator;

pub use errors::{DefinitionError, ParseError};
pub use expectation::{
    EXIT_COMPILE_ERROR, EXIT_OK, EXIT_RUNTIME_ERROR, ExecutionResult, Expectation, ExpectedOutput,
    RuntimeErrorExpectation,
};
pub use parser::{ParseOutcome, parse_file, parse_source};
pub use validator::{Failure, OutputLengthPolicy, Validator, ValidatorConfig, validate};

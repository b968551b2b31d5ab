// ABOUTME: Host-level error type for everything that is not an in-language Fatal
//
// Per SPEC_FULL.md §10/§7: runtime failures inside the evaluator (arity
// mismatch, type mismatch, division by zero, unbound symbol, `throw`, ...)
// are exclusively `Value::Fatal` (see value.rs), never `Result::Err`. This
// type only covers what happens *before* a program starts evaluating, or
// outside the evaluator entirely: lexing, parsing, and sandboxed I/O.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum HostError {
    #[error("parse error at {line}:{column}: {message}")]
    Parse {
        line: usize,
        column: usize,
        message: String,
    },

    #[error("sandbox error: {0}")]
    Sandbox(#[from] crate::sandbox::SandboxError),

    #[error("I/O error: {0}")]
    Io(String),
}

impl HostError {
    pub fn parse(line: usize, column: usize, message: impl Into<String>) -> Self {
        HostError::Parse {
            line,
            column,
            message: message.into(),
        }
    }
}

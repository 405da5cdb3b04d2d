use std::io;

use thiserror::Error;

/// Errors surfaced by the engine and by the pattern front end.
#[derive(Debug, Error)]
pub enum Error {
    /// A deep traversal needed a fresh stack segment and none could be spawned.
    #[error("out of stack: could not continue on a fresh stack segment")]
    StackExhausted(#[source] io::Error),

    #[error("parse error at offset {offset}: {message}")]
    Parse { offset: usize, message: String },

    /// Syntax that parses but has no node in the algebra (backreferences, lookarounds).
    #[error("unsupported construct: {0}")]
    Unsupported(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

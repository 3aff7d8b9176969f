//! The crate-level error type.
//!
//! Each parser keeps its own error enum close to the format it serves;
//! everything converts into [`Error`] at the public boundary so callers
//! handle one type regardless of input format.

use thiserror::Error;

/// Any failure surfaced by the public API.
#[derive(Error, Debug)]
pub enum Error {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// A structure inside the file could not be decoded.
    #[error("parse error: {0}")]
    ParseError(String),

    /// The file violates its format's layout rules.
    #[error("invalid format: {0}")]
    InvalidFormat(String),

    /// The input is not one of the recognized Office formats.
    #[error("not a recognized Office file")]
    NotOfficeFile,

    /// Structurally damaged beyond recovery.
    #[error("corrupted file: {0}")]
    CorruptedFile(String),

    /// A named stream, worksheet or part is absent.
    #[error("component not found: {0}")]
    ComponentNotFound(String),

    /// The file uses a dialect or version this crate does not read.
    #[error("unsupported: {0}")]
    Unsupported(String),
}

pub type Result<T> = std::result::Result<T, Error>;

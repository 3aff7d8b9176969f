//! Failures raised by the RTF tokenizer and tree builder.

use std::io;

use thiserror::Error;

/// Result alias used throughout the RTF parser.
pub type RtfResult<T> = Result<T, RtfError>;

#[derive(Debug, Error)]
pub enum RtfError {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
    /// Input does not start with the `{\rtf` signature.
    #[error("not an RTF document")]
    NotRtf,
    /// More group closes than opens, or groups left open at EOF.
    #[error("unbalanced group: {0}")]
    UnbalancedGroup(String),
    #[error("malformed control word: {0}")]
    InvalidControlWord(String),
    /// Undecodable escape sequence or unknown code page.
    #[error("encoding error: {0}")]
    Encoding(String),
}

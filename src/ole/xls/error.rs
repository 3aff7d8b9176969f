//! Error types for workbook stream parsing.

use std::io;

use thiserror::Error;

use crate::common::binary::BinaryError;
use crate::ole::OleError;

/// Result alias used throughout the workbook parser.
pub type XlsResult<T> = Result<T, XlsError>;

/// Errors raised while reading a binary workbook stream.
#[derive(Debug, Error)]
pub enum XlsError {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
    /// Compound file layer failure.
    #[error("compound file error: {0}")]
    Cfb(#[from] OleError),
    /// A record payload did not match its declared layout.
    #[error("invalid record 0x{record_type:04X}: {message}")]
    InvalidRecord { record_type: u16, message: String },
    /// Stream opened with a BOF version this parser does not handle.
    #[error("unsupported BIFF version 0x{0:04X}")]
    UnsupportedBiffVersion(u16),
    /// Payload shorter than the structure requires.
    #[error("invalid length: expected {expected} bytes, found {found}")]
    InvalidLength { expected: usize, found: usize },
    #[error("worksheet not found: {0}")]
    WorksheetNotFound(String),
    /// Text that could not be decoded with the workbook codepage.
    #[error("encoding error: {0}")]
    Encoding(String),
    /// Structurally valid record carrying nonsensical values.
    #[error("invalid data: {0}")]
    InvalidData(String),
}

impl From<BinaryError> for XlsError {
    fn from(e: BinaryError) -> Self {
        match e {
            BinaryError::InsufficientData {
                expected,
                available,
            } => XlsError::InvalidLength {
                expected,
                found: available,
            },
            BinaryError::ParseError(message) => XlsError::InvalidData(message),
        }
    }
}

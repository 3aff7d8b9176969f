//! Conversions from the per-format error types into [`Error`].
//!
//! Container failures keep their category (signature, corruption, missing
//! component); anything record-shaped collapses into `ParseError` with the
//! original message.

#[cfg(any(feature = "ole", feature = "rtf"))]
use super::types::Error;
#[cfg(feature = "ole")]
use crate::ole::OleError;
#[cfg(feature = "ole")]
use crate::ole::doc::package::DocError;
#[cfg(feature = "ole")]
use crate::ole::ppt::package::PptError;
#[cfg(feature = "ole")]
use crate::ole::xls::XlsError;
#[cfg(feature = "rtf")]
use crate::rtf::RtfError;

#[cfg(feature = "ole")]
impl From<OleError> for Error {
    fn from(err: OleError) -> Self {
        match err {
            OleError::Io(e) => Error::Io(e),
            OleError::InvalidFormat(s) | OleError::InvalidData(s) => Error::InvalidFormat(s),
            OleError::NotOleFile => Error::NotOfficeFile,
            OleError::CorruptedFile(s) => Error::CorruptedFile(s),
            OleError::StreamNotFound => Error::ComponentNotFound("stream".to_string()),
        }
    }
}

#[cfg(feature = "ole")]
impl From<DocError> for Error {
    fn from(err: DocError) -> Self {
        match err {
            DocError::Io(e) => Error::Io(e),
            DocError::Ole(inner) => inner.into(),
            DocError::InvalidFormat(s) => Error::InvalidFormat(s),
            DocError::StreamNotFound(s) => Error::ComponentNotFound(s),
            DocError::Corrupted(s) => Error::CorruptedFile(s),
        }
    }
}

#[cfg(feature = "ole")]
impl From<PptError> for Error {
    fn from(err: PptError) -> Self {
        match err {
            PptError::Io(e) => Error::Io(e),
            PptError::Ole(inner) => inner.into(),
            PptError::InvalidFormat(s) => Error::InvalidFormat(s),
            PptError::StreamNotFound(s) => Error::ComponentNotFound(s),
            PptError::Corrupted(s) => Error::CorruptedFile(s),
        }
    }
}

#[cfg(feature = "ole")]
impl From<XlsError> for Error {
    fn from(err: XlsError) -> Self {
        match err {
            XlsError::Io(e) => Error::Io(e),
            XlsError::Cfb(inner) => inner.into(),
            XlsError::WorksheetNotFound(s) => Error::ComponentNotFound(s),
            XlsError::UnsupportedBiffVersion(version) => {
                Error::Unsupported(format!("BIFF version 0x{version:04X}"))
            }
            other => Error::ParseError(other.to_string()),
        }
    }
}

#[cfg(feature = "rtf")]
impl From<RtfError> for Error {
    fn from(err: RtfError) -> Self {
        match err {
            RtfError::Io(e) => Error::Io(e),
            RtfError::NotRtf => Error::NotOfficeFile,
            RtfError::UnbalancedGroup(s) => Error::CorruptedFile(s),
            other => Error::ParseError(other.to_string()),
        }
    }
}

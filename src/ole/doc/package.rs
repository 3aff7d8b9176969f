//! Entry point for legacy Word documents (.doc).

use std::fs::File;
use std::io::{self, Read, Seek};
use std::path::Path;

use tracing::debug;

use super::document::WordDocument;
use crate::common::Metadata;
use crate::ole::{OleError, OleFile};

/// Failures specific to the Word package layer.
#[derive(Debug)]
pub enum DocError {
    Io(io::Error),
    /// The underlying compound file could not be read.
    Ole(OleError),
    InvalidFormat(String),
    StreamNotFound(String),
    Corrupted(String),
}

impl From<io::Error> for DocError {
    fn from(err: io::Error) -> Self {
        DocError::Io(err)
    }
}

impl From<OleError> for DocError {
    fn from(err: OleError) -> Self {
        DocError::Ole(err)
    }
}

impl std::fmt::Display for DocError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocError::Io(e) => write!(f, "i/o error: {e}"),
            DocError::Ole(e) => write!(f, "compound file error: {e}"),
            DocError::InvalidFormat(s) => write!(f, "invalid format: {s}"),
            DocError::StreamNotFound(s) => write!(f, "stream not found: {s}"),
            DocError::Corrupted(s) => write!(f, "corrupted document: {s}"),
        }
    }
}

impl std::error::Error for DocError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DocError::Io(e) => Some(e),
            DocError::Ole(e) => Some(e),
            _ => None,
        }
    }
}

/// Shorthand for results carrying a [`DocError`].
pub type Result<T> = std::result::Result<T, DocError>;

/// A legacy Word file, opened as an OLE container.
///
/// Opening only verifies the container holds a document; the text and
/// formatting streams are parsed lazily in [`Package::document`].
///
/// # Examples
///
/// ```rust,no_run
/// use longan::ole::doc::Package;
///
/// let mut pkg = Package::open("report.doc")?;
/// let doc = pkg.document()?;
/// for paragraph in &doc.paragraphs {
///     println!("{}", paragraph.text());
/// }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct Package<R: Read + Seek = File> {
    ole: OleFile<R>,
}

impl Package<File> {
    /// Open a document from a path on disk.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Package::from_reader(File::open(path)?)
    }
}

impl<R: Read + Seek> Package<R> {
    /// Create a package from any reader that implements `Read + Seek`.
    pub fn from_reader(reader: R) -> Result<Self> {
        Package::from_ole_file(OleFile::open(reader)?)
    }

    /// Create a package from an already-parsed OLE container.
    ///
    /// Useful when the container was already opened during format
    /// detection, avoiding a second header parse.
    pub fn from_ole_file(ole: OleFile<R>) -> Result<Self> {
        if !ole.exists(&["WordDocument"]) {
            return Err(DocError::InvalidFormat(
                "missing WordDocument stream".to_string(),
            ));
        }
        debug!(size = ole.file_size(), "opened Word package");
        Ok(Self { ole })
    }

    /// Parse the main document: text pieces, paragraphs, the font table
    /// and the style sheet.
    pub fn document(&mut self) -> Result<WordDocument> {
        WordDocument::from_ole(&mut self.ole)
    }

    /// Document properties from the OLE property streams.
    pub fn metadata(&mut self) -> Result<Metadata> {
        Ok(self.ole.metadata()?.into())
    }

    /// Access the underlying OLE container.
    #[inline]
    pub fn ole_file(&mut self) -> &mut OleFile<R> {
        &mut self.ole
    }
}

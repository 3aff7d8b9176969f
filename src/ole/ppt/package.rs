//! Entry point for legacy PowerPoint presentations (.ppt).

use std::fs::File;
use std::io::{self, Read, Seek};
use std::path::Path;

use tracing::debug;

use super::presentation::Presentation;
use crate::common::Metadata;
use crate::ole::{OleError, OleFile};

/// Failures specific to the PowerPoint package layer.
#[derive(Debug)]
pub enum PptError {
    Io(io::Error),
    /// The underlying compound file could not be read.
    Ole(OleError),
    InvalidFormat(String),
    StreamNotFound(String),
    Corrupted(String),
}

impl From<io::Error> for PptError {
    fn from(err: io::Error) -> Self {
        PptError::Io(err)
    }
}

impl From<OleError> for PptError {
    fn from(err: OleError) -> Self {
        PptError::Ole(err)
    }
}

impl std::fmt::Display for PptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PptError::Io(e) => write!(f, "i/o error: {e}"),
            PptError::Ole(e) => write!(f, "compound file error: {e}"),
            PptError::InvalidFormat(s) => write!(f, "invalid format: {s}"),
            PptError::StreamNotFound(s) => write!(f, "stream not found: {s}"),
            PptError::Corrupted(s) => write!(f, "corrupted presentation: {s}"),
        }
    }
}

impl std::error::Error for PptError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PptError::Io(e) => Some(e),
            PptError::Ole(e) => Some(e),
            _ => None,
        }
    }
}

/// Shorthand for results carrying a [`PptError`].
pub type Result<T> = std::result::Result<T, PptError>;

/// A legacy PowerPoint file, opened as an OLE container.
///
/// The package layer only verifies the container holds a presentation;
/// record parsing happens lazily in [`Package::presentation`].
///
/// # Examples
///
/// ```rust,no_run
/// use longan::ole::ppt::Package;
///
/// let mut pkg = Package::open("deck.ppt")?;
/// let deck = pkg.presentation()?;
/// for slide in deck.slides() {
///     println!("{}", slide.text());
/// }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct Package<R: Read + Seek = File> {
    ole: OleFile<R>,
}

impl Package<File> {
    /// Open a presentation from a path on disk.
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
    pub fn from_ole_file(ole: OleFile<R>) -> Result<Self> {
        if !ole.exists(&["PowerPoint Document"]) {
            return Err(PptError::InvalidFormat(
                "missing PowerPoint Document stream".to_string(),
            ));
        }
        debug!(size = ole.file_size(), "opened PowerPoint package");
        Ok(Self { ole })
    }

    /// Parse the presentation: slides, outline text, fonts and shapes.
    pub fn presentation(&mut self) -> Result<Presentation> {
        Presentation::from_ole(&mut self.ole)
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ole::fixtures::CompoundFileBuilder;

    #[test]
    fn test_rejects_container_without_document_stream() {
        let cursor = CompoundFileBuilder::new()
            .stream("WordDocument", b"not a deck")
            .build_cursor();
        assert!(matches!(
            Package::from_reader(cursor),
            Err(PptError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_rejects_non_ole_input() {
        let cursor = std::io::Cursor::new(b"Not a PPT file".to_vec());
        assert!(matches!(
            Package::from_reader(cursor),
            Err(PptError::Ole(OleError::NotOleFile))
        ));
    }
}

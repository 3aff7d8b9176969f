/// Constants for the compound file binary format
pub mod consts;

/// Compound file (OLE2) container parsing
mod file;

/// Metadata extraction from OLE property streams
mod metadata;

/// Record stream parsing shared by the binary Office formats
///
/// PowerPoint documents, Escher drawings and BIFF workbook streams all
/// serialize as typed records; this module turns such streams into
/// navigable trees.
pub mod record;

/// Escher (Office Drawing) shape trees
pub mod escher;

/// Legacy Word document (.doc) reader
///
/// Parses Microsoft Word documents in the legacy binary format, which
/// are OLE2-based files.
pub mod doc;

/// Legacy Excel workbook (.xls) reader
///
/// Parses Microsoft Excel workbooks in the legacy BIFF8 binary format,
/// which are OLE2-based files.
pub mod xls;

/// Legacy PowerPoint presentation (.ppt) reader
///
/// Parses Microsoft PowerPoint presentations in the legacy binary
/// format, which are OLE2-based files.
pub mod ppt;

/// Compound file builder for in-memory test fixtures
#[cfg(test)]
pub(crate) mod fixtures;

// Re-export public types for convenient access
pub use file::{DirectoryEntry, OleError, OleFile, is_ole_file};
pub use metadata::{OleMetadata, PropertyValue};

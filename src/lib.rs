//! Longan parses the legacy Microsoft Office binary formats.
//!
//! The OLE2 (Object Linking and Embedding) compound file container is the
//! outer shell of .doc, .xls and .ppt; this library walks the container
//! and decodes the record streams inside it, plus standalone RTF text.
//!
//! - **OLE2 container**: FAT, directory tree and mini stream traversal,
//!   opening any stream by path
//! - **Word (.doc)**: piece table text, fonts, styles and run formatting
//! - **Excel (.xls)**: BIFF8 records, cells, shared strings and chart
//!   substreams
//! - **PowerPoint (.ppt)**: slide text, fonts and Escher drawing shapes
//! - **RTF**: tokenizer and document tree with full escape and code page
//!   handling
//! - **Plain text rendering** and **document properties** for all four
//!
//! Damaged files degrade instead of failing: unrecognized records are
//! skipped, truncated payloads are clamped, and diagnostics go through
//! [`tracing`].
//!
//! # Feature flags
//!
//! Both flags are on by default.
//!
//! - `ole`: the compound file parser and the .doc/.xls/.ppt readers
//! - `rtf`: the standalone RTF parser
//!
//! # Reading a Word document
//!
//! ```no_run
//! use longan::ole::doc::Package;
//!
//! let mut pkg = Package::open("report.doc")?;
//! let doc = pkg.document()?;
//!
//! println!("{}", doc.text());
//! for para in &doc.paragraphs {
//!     println!("{}", para.text());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Reading a workbook
//!
//! ```no_run
//! use longan::ole::xls::Workbook;
//!
//! let workbook = Workbook::open("figures.xls")?;
//! for sheet in workbook.worksheets() {
//!     println!("{} has {} cells", sheet.name, sheet.cells.len());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Reading a presentation
//!
//! ```no_run
//! use longan::ole::ppt::Package;
//!
//! let mut pkg = Package::open("deck.ppt")?;
//! let pres = pkg.presentation()?;
//!
//! println!("{}", pres.text());
//! for slide in pres.slides() {
//!     println!("slide {}: {}", slide.index, slide.text());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Parsing RTF
//!
//! ```
//! use longan::rtf::RtfDocument;
//!
//! let doc = RtfDocument::parse(r"{\rtf1\ansi Hello, world!}")?;
//! assert_eq!(doc.text(), "Hello, world!\n");
//! # Ok::<(), longan::rtf::RtfError>(())
//! ```
//!
//! # Walking an OLE container
//!
//! ```no_run
//! use std::fs::File;
//! use longan::ole::OleFile;
//!
//! let mut ole = OleFile::open(File::open("report.doc")?)?;
//! for stream in ole.list_streams() {
//!     println!("{}", stream.join("/"));
//! }
//!
//! let data = ole.open_stream(&["WordDocument"])?;
//! println!("{} bytes", data.len());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

/// Shared infrastructure: the unified error type, binary readers,
/// codepage decoding and the metadata container.
pub mod common;

/// Rendering parsed documents to other representations through the
/// mapping layer.
#[cfg(feature = "ole")]
pub mod convert;

/// OLE2 (Object Linking and Embedding) compound file parser and the
/// legacy Office formats stored in it (.doc, .xls, .ppt).
#[cfg(feature = "ole")]
pub mod ole;

/// RTF (Rich Text Format) document parsing.
#[cfg(feature = "rtf")]
pub mod rtf;

pub use common::{Error, Metadata, Result};

#[cfg(feature = "ole")]
pub use ole::{doc, ppt, xls};

#[cfg(feature = "rtf")]
pub use rtf::RtfDocument;

//! RTF (Rich Text Format) document parsing.
//!
//! RTF stores a document as nested `{...}` groups of control words and
//! text. The pipeline here has two stages: a lazy byte-level lexer that
//! resolves all escaping (code page bytes, `\uN` with `\uc` fallback
//! skipping, exact-length `\binN` payloads), and a tree builder that
//! folds the token stream into paragraphs of formatted runs plus the
//! header side tables (fonts, colors, styles) and `\info` metadata.
//!
//! Damaged input is handled by degrading, not failing: an unbalanced
//! group ends the document early, unknown control words are ignored,
//! and groups left open at end of input are closed implicitly.
//!
//! # Quick Start
//!
//! ```
//! use longan::rtf::RtfDocument;
//!
//! # fn main() -> longan::rtf::RtfResult<()> {
//! let doc = RtfDocument::parse(r"{\rtf1\ansi Hello, world!}")?;
//! assert_eq!(doc.text(), "Hello, world!\n");
//! # Ok(())
//! # }
//! ```

/// Document assembly and the public parse entry points.
mod document;
/// Error types for RTF parsing.
mod error;
/// Byte-level tokenizer.
mod lexer;
/// Parsed tree nodes and the visitor over them.
mod node;
/// Token stream to document tree folding.
mod tree;
/// Fonts, colors, styles and character formatting.
mod types;

// Re-export public types for convenient access
pub use document::{RtfDocument, is_rtf};
pub use error::{RtfError, RtfResult};
pub use lexer::{ControlWord, Lexer, Token};
pub use node::{Node, NodeVisitor, Paragraph, Run};
pub use types::{
    Alignment, CharFormat, Color, ColorRef, ColorTable, Font, FontFamily, FontRef, FontTable,
    StyleDef, StyleKind,
};

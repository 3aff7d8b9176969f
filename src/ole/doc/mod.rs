//! Word binary document (.doc) parsing.
//!
//! [`Package`] opens the compound file and exposes [`WordDocument`],
//! the parsed model of text, fonts and styles, plus document metadata
//! from the property streams.

mod document;
mod fib;
pub mod package;
mod piece_table;

pub use document::{
    FontEntry, FontTable, Paragraph, Run, RunProperties, Style, StyleKind, StyleSheet,
    WordDocument,
};
pub use fib::{Fib, FibFlags};
pub use package::{DocError, Package, Result};
pub use piece_table::{PieceTable, TextPiece};

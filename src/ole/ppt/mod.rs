//! PowerPoint binary presentation (.ppt) parsing.
//!
//! [`Package`] opens the compound file and exposes [`Presentation`]:
//! slides with outline text, drawing shapes and textbox text, master
//! references and the font collection.

pub mod package;
mod presentation;

pub use package::{Package, PptError, Result};
pub use presentation::{FontEntity, Presentation, Slide};

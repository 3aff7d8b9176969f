//! Common utilities shared across format parsers.
//!
//! This module contains the unified error type, binary parsing helpers,
//! codepage decoding, and the unified metadata container.

// Submodule declarations
pub mod binary;
#[cfg(any(feature = "ole", feature = "rtf"))]
pub mod encoding;
pub mod error;
pub mod metadata;

// Re-exports
pub use error::{Error, Result};
pub use metadata::Metadata;

//! The unified error type and the conversions into it.

pub mod conversions;
pub mod types;

pub use types::{Error, Result};

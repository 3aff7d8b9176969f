//! Generic record model shared by the presentation, drawing and chart
//! extractors.
//!
//! Binary Office streams are sequences of type-tagged, length-prefixed
//! records; containers nest child records inside their payload. This
//! module parses such streams into owned trees, classifying codes
//! through a per-family registry so that one descent serves every
//! format.

pub mod families;
mod header;
mod node;
mod parser;
mod registry;

pub use header::{RECORD_HEADER_SIZE, RecordHeader};
pub use node::RecordNode;
pub use parser::{ParseOptions, parse_record, parse_stream};
pub use registry::{RecordFamily, RecordKind, Registry, registry};

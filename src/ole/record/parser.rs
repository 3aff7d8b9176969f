//! Recursive descent over type-tagged record streams.
//!
//! Every record is bounded by the smaller of its declared length and the
//! enclosing scope, so a corrupt length can clip one subtree but never
//! desynchronize its siblings. Unknown codes become opaque atoms with
//! their payload preserved verbatim.

use bytes::Bytes;
use tracing::{debug, warn};

use super::header::{RECORD_HEADER_SIZE, RecordHeader};
use super::node::RecordNode;
use super::registry::{RecordFamily, RecordKind, Registry, registry};

/// Parsing limits and retention switches, passed down the descent.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Maximum container nesting depth. Containers at the limit keep
    /// their payload as raw bytes instead of recursing.
    pub max_depth: usize,
    /// Whether unknown records keep their payload bytes. Disabling this
    /// saves memory when only registered records matter.
    pub retain_unknown_payloads: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_depth: 64,
            retain_unknown_payloads: true,
        }
    }
}

/// Parse a whole stream into a forest of top-level records.
///
/// Trailing bytes too short to hold a record header are ignored, which
/// is how real streams pad out their last sector.
pub fn parse_stream(data: Bytes, family: RecordFamily, options: &ParseOptions) -> Vec<RecordNode> {
    let end = data.len();
    parse_siblings(&data, 0, end, family, registry(), options, 0)
}

/// Parse one record at `offset`, bounded by `end`.
///
/// Returns the node and the number of bytes consumed, which is always
/// the header size plus the clipped body length. `None` when fewer than
/// eight bytes remain.
pub fn parse_record(
    data: &Bytes,
    offset: usize,
    end: usize,
    family: RecordFamily,
    registry: &Registry,
    options: &ParseOptions,
    depth: usize,
) -> Option<(RecordNode, usize)> {
    let end = end.min(data.len());
    if offset + RECORD_HEADER_SIZE > end {
        return None;
    }
    let header = RecordHeader::parse(data, offset).ok()?;

    let body_start = offset + RECORD_HEADER_SIZE;
    let declared_end = body_start.saturating_add(header.length as usize);
    let body_end = declared_end.min(end);
    let truncated = declared_end > end;
    if truncated {
        warn!(
            "record 0x{:04X} ({}) declares {} bytes but only {} remain in scope",
            header.code,
            registry.name(family, header.code).unwrap_or("unknown"),
            header.length,
            body_end - body_start,
        );
    }

    let kind = registry.classify(family, header.code);
    let node = match kind {
        RecordKind::Container if depth < options.max_depth => RecordNode {
            header,
            kind,
            data: Bytes::new(),
            children: parse_siblings(data, body_start, body_end, family, registry, options, depth + 1),
            truncated,
        },
        RecordKind::Container => {
            warn!(
                "record 0x{:04X} exceeds nesting depth {}; keeping payload opaque",
                header.code, options.max_depth,
            );
            RecordNode {
                header,
                kind,
                data: data.slice(body_start..body_end),
                children: Vec::new(),
                truncated,
            }
        }
        RecordKind::Atom => RecordNode {
            header,
            kind,
            data: data.slice(body_start..body_end),
            children: Vec::new(),
            truncated,
        },
        RecordKind::Unknown => {
            debug!("unregistered record 0x{:04X} kept as opaque atom", header.code);
            let payload = if options.retain_unknown_payloads {
                data.slice(body_start..body_end)
            } else {
                Bytes::new()
            };
            RecordNode {
                header,
                kind,
                data: payload,
                children: Vec::new(),
                truncated,
            }
        }
    };

    Some((node, RECORD_HEADER_SIZE + (body_end - body_start)))
}

fn parse_siblings(
    data: &Bytes,
    mut offset: usize,
    end: usize,
    family: RecordFamily,
    registry: &Registry,
    options: &ParseOptions,
    depth: usize,
) -> Vec<RecordNode> {
    let mut nodes = Vec::new();
    while let Some((node, consumed)) = parse_record(data, offset, end, family, registry, options, depth)
    {
        offset += consumed;
        nodes.push(node);
    }
    nodes
}

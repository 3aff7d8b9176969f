use bytes::Bytes;

use super::header::RecordHeader;
use super::registry::RecordKind;

/// A parsed record: header plus either a leaf payload or child records.
///
/// The tree is fully owned, parent to children, with payload bytes shared
/// out of the original stream buffer instead of copied per node.
#[derive(Debug, Clone)]
pub struct RecordNode {
    /// The 8-byte header as read from the stream
    pub header: RecordHeader,
    /// Registry classification at parse time
    pub kind: RecordKind,
    /// Leaf payload. Empty for containers; raw bytes for atoms and
    /// unknown records (unless payload retention was disabled).
    pub data: Bytes,
    /// Child records, in stream order. Empty for atoms.
    pub children: Vec<RecordNode>,
    /// Set when the declared length overran the enclosing scope and the
    /// body was clipped.
    pub truncated: bool,
}

impl RecordNode {
    /// Record type code.
    #[inline]
    pub fn code(&self) -> u16 {
        self.header.code
    }

    /// Whether this node was classified as a container.
    #[inline]
    pub fn is_container(&self) -> bool {
        self.kind == RecordKind::Container
    }

    /// First direct child with the given code.
    pub fn find_child(&self, code: u16) -> Option<&RecordNode> {
        self.children.iter().find(|child| child.code() == code)
    }

    /// All direct children with the given code, in stream order.
    pub fn find_children(&self, code: u16) -> Vec<&RecordNode> {
        self.children
            .iter()
            .filter(|child| child.code() == code)
            .collect()
    }

    /// Depth-first search for the first descendant with the given code,
    /// not including this node.
    pub fn find_descendant(&self, code: u16) -> Option<&RecordNode> {
        for child in &self.children {
            if child.code() == code {
                return Some(child);
            }
            if let Some(found) = child.find_descendant(code) {
                return Some(found);
            }
        }
        None
    }

    /// Visit this node and every descendant in depth-first stream order.
    pub fn walk(&self, visit: &mut impl FnMut(&RecordNode)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn atom(code: u16, payload: &[u8]) -> RecordNode {
        RecordNode {
            header: RecordHeader {
                code,
                version: 0,
                instance: 0,
                length: payload.len() as u32,
            },
            kind: RecordKind::Atom,
            data: Bytes::copy_from_slice(payload),
            children: Vec::new(),
            truncated: false,
        }
    }

    fn container(code: u16, children: Vec<RecordNode>) -> RecordNode {
        RecordNode {
            header: RecordHeader {
                code,
                version: 0x0F,
                instance: 0,
                length: 0,
            },
            kind: RecordKind::Container,
            data: Bytes::new(),
            children,
            truncated: false,
        }
    }

    #[test]
    fn test_find_child_returns_first_match() {
        let tree = container(
            1000,
            vec![atom(4000, b"one"), atom(4000, b"two"), atom(4008, b"x")],
        );
        assert_eq!(tree.find_child(4000).unwrap().data.as_ref(), b"one");
        assert_eq!(tree.find_children(4000).len(), 2);
        assert!(tree.find_child(9999).is_none());
    }

    #[test]
    fn test_find_descendant_searches_depth_first() {
        let tree = container(
            1000,
            vec![
                container(4080, vec![atom(1011, b"persist")]),
                atom(1011, b"top-level"),
            ],
        );
        // The nested one comes first in depth-first order
        assert_eq!(tree.find_descendant(1011).unwrap().data.as_ref(), b"persist");
    }

    #[test]
    fn test_walk_visits_every_node() {
        let tree = container(
            1000,
            vec![container(1006, vec![atom(4000, b""), atom(4008, b"")]), atom(1002, b"")],
        );
        let mut codes = Vec::new();
        tree.walk(&mut |node| codes.push(node.code()));
        assert_eq!(codes, vec![1000, 1006, 4000, 4008, 1002]);
    }
}

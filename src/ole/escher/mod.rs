//! Escher (Office Drawing) shape trees.
//!
//! Drawing data is a record stream of nested containers: DgContainer
//! holds one drawing, its patriarch SpgrContainer wraps every shape,
//! and each SpContainer describes one shape. [`ShapeTree::parse`] turns
//! such a stream into owned [`Shape`]s with anchors, properties and raw
//! textbox payloads. Host records inside a shape (client textbox,
//! client data) stay opaque here; the host extractor interprets them.

mod properties;

pub use properties::{Anchor, PropertyValue, ShapeProperties, prop};

use bytes::Bytes;
use tracing::debug;

use super::record::families::drawing;
use super::record::{ParseOptions, RecordFamily, RecordNode, parse_stream};

/// Sp atom flag: the shape is a group.
const SP_FLAG_GROUP: u32 = 0x0001;

/// Sp atom flag: the shape is deleted.
const SP_FLAG_DELETED: u32 = 0x0008;

/// What kind of shape an Sp atom declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShapeKind {
    Group,
    Rectangle,
    Ellipse,
    Line,
    TextBox,
    Picture,
    AutoShape,
    #[default]
    Unknown,
}

impl ShapeKind {
    /// Classify from the Sp record instance, the MSOSPT shape type.
    fn classify(shape_type: u16, properties: &ShapeProperties, has_textbox: bool) -> Self {
        match shape_type {
            0 => ShapeKind::Group,
            1 => ShapeKind::Rectangle,
            3 => ShapeKind::Ellipse,
            20 => ShapeKind::Line,
            75 if properties.has(prop::BLIP_ID) => ShapeKind::Picture,
            75 | 202 => ShapeKind::TextBox,
            _ if has_textbox => ShapeKind::TextBox,
            _ if shape_type < 203 => ShapeKind::AutoShape,
            _ => ShapeKind::Unknown,
        }
    }
}

/// One drawing shape.
#[derive(Debug, Clone, Default)]
pub struct Shape {
    /// Shape identifier from the Sp atom.
    pub shape_id: Option<u32>,
    pub kind: ShapeKind,
    /// Raw Sp flags (group, patriarch, deleted, flip bits).
    pub flags: u32,
    pub anchor: Option<Anchor>,
    pub properties: ShapeProperties,
    /// Raw client textbox payload for the host extractor.
    pub textbox: Option<Bytes>,
    /// Member shapes, for groups.
    pub children: Vec<Shape>,
}

impl Shape {
    pub fn is_group(&self) -> bool {
        matches!(self.kind, ShapeKind::Group)
    }

    pub fn is_deleted(&self) -> bool {
        self.flags & SP_FLAG_DELETED != 0
    }

    /// Name from the shape properties, when one is set.
    pub fn name(&self) -> Option<String> {
        self.properties.name()
    }

    fn from_sp_container(node: &RecordNode) -> Self {
        let mut shape_id = None;
        let mut flags = 0u32;
        let mut shape_type = 0u16;
        if let Some(sp) = node.find_child(drawing::SP) {
            shape_type = sp.header.instance;
            if sp.data.len() >= 8 {
                shape_id = Some(u32::from_le_bytes([
                    sp.data[0], sp.data[1], sp.data[2], sp.data[3],
                ]));
                flags = u32::from_le_bytes([sp.data[4], sp.data[5], sp.data[6], sp.data[7]]);
            }
        }
        let properties = node
            .find_child(drawing::OPT)
            .map(ShapeProperties::parse)
            .unwrap_or_default();
        let anchor = node
            .find_child(drawing::CHILD_ANCHOR)
            .and_then(Anchor::parse)
            .or_else(|| {
                node.find_child(drawing::CLIENT_ANCHOR)
                    .and_then(Anchor::parse)
            });
        let textbox = node
            .find_child(drawing::CLIENT_TEXTBOX)
            .map(|textbox| textbox.data.clone());
        let kind = if flags & SP_FLAG_GROUP != 0 {
            ShapeKind::Group
        } else {
            ShapeKind::classify(shape_type, &properties, textbox.is_some())
        };
        Self {
            shape_id,
            kind,
            flags,
            anchor,
            properties,
            textbox,
            children: Vec::new(),
        }
    }

    /// Build a group from an SpgrContainer: the first SpContainer
    /// describes the group itself, the rest are members.
    fn from_spgr_container(node: &RecordNode) -> Self {
        let mut group = Shape {
            kind: ShapeKind::Group,
            ..Shape::default()
        };
        let mut first_sp = true;
        for child in &node.children {
            match child.code() {
                drawing::SP_CONTAINER if first_sp => {
                    first_sp = false;
                    let own = Shape::from_sp_container(child);
                    group.shape_id = own.shape_id;
                    group.flags = own.flags;
                    group.anchor = own.anchor;
                    group.properties = own.properties;
                }
                drawing::SP_CONTAINER => group.children.push(Shape::from_sp_container(child)),
                drawing::SPGR_CONTAINER => group.children.push(Shape::from_spgr_container(child)),
                _ => {}
            }
        }
        group
    }

    /// Depth-first walk over this shape and its members.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Shape)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }
}

/// The top-level shapes of one drawing.
#[derive(Debug, Clone, Default)]
pub struct ShapeTree {
    shapes: Vec<Shape>,
}

impl ShapeTree {
    /// Parse a drawing record stream (a PPDrawing payload, or any byte
    /// range holding Escher containers).
    pub fn parse(data: Bytes, options: &ParseOptions) -> Self {
        let nodes = parse_stream(data, RecordFamily::Drawing, options);
        Self::from_nodes(&nodes)
    }

    /// Build the tree out of already-parsed drawing records.
    pub fn from_nodes(nodes: &[RecordNode]) -> Self {
        let mut shapes = Vec::new();
        collect_shapes(nodes, &mut shapes);
        if shapes.is_empty() {
            debug!("drawing stream held no shape containers");
        }
        Self { shapes }
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Depth-first walk over every shape in the tree.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Shape)) {
        for shape in &self.shapes {
            shape.walk(visit);
        }
    }

    /// Client textbox payloads in document order.
    pub fn textboxes(&self) -> Vec<Bytes> {
        let mut out = Vec::new();
        self.walk(&mut |shape| {
            if let Some(textbox) = &shape.textbox {
                out.push(textbox.clone());
            }
        });
        out
    }
}

/// Shapes sit under DgContainer. The patriarch SpgrContainer wraps the
/// whole drawing and is not itself a shape, so its members surface as
/// the tree's top level; deeper SpgrContainers are real groups.
fn collect_shapes(nodes: &[RecordNode], out: &mut Vec<Shape>) {
    for node in nodes {
        match node.code() {
            drawing::DG_CONTAINER => collect_shapes(&node.children, out),
            drawing::SPGR_CONTAINER => {
                let mut first_sp = true;
                for child in &node.children {
                    match child.code() {
                        drawing::SP_CONTAINER if first_sp => first_sp = false,
                        drawing::SP_CONTAINER => out.push(Shape::from_sp_container(child)),
                        drawing::SPGR_CONTAINER => out.push(Shape::from_spgr_container(child)),
                        _ => {}
                    }
                }
            }
            drawing::SP_CONTAINER => out.push(Shape::from_sp_container(node)),
            _ => {}
        }
    }
}

//! Shape property (Opt record) parsing and shape anchors.
//!
//! An Opt record holds `instance` six-byte property headers followed by
//! the complex payloads, in header order, for every header with the
//! complex bit set.

use std::collections::HashMap;

use bytes::Bytes;

use crate::common::binary::{parse_utf16le_string, read_i16_le, read_i32_le};
use crate::ole::record::RecordNode;

/// Property id bit 15: the value is the byte length of complex data.
const IS_COMPLEX: u16 = 0x8000;

/// Lower 14 bits carry the property number.
const PROPERTY_ID_MASK: u16 = 0x3FFF;

/// Property numbers the extractors read.
pub mod prop {
    /// Rotation angle, 16.16 fixed-point degrees.
    pub const ROTATION: u16 = 0x0004;
    /// Blip reference of a picture shape.
    pub const BLIP_ID: u16 = 0x0104;
    /// Fill color, BGR.
    pub const FILL_COLOR: u16 = 0x0181;
    /// Line color, BGR.
    pub const LINE_COLOR: u16 = 0x01C0;
    /// Shape name, UTF-16LE complex data.
    pub const SHAPE_NAME: u16 = 0x0380;
}

/// A single property value.
#[derive(Debug, Clone)]
pub enum PropertyValue {
    /// 32-bit inline value
    Simple(i32),
    /// Variable-length payload following the headers
    Complex(Bytes),
}

/// Properties of one shape, keyed by property number.
#[derive(Debug, Clone, Default)]
pub struct ShapeProperties {
    entries: HashMap<u16, PropertyValue>,
}

impl ShapeProperties {
    /// Parse an Opt record. Truncated header tables parse to an empty
    /// collection; a complex payload running past the record ends the
    /// walk at the last whole property.
    pub fn parse(opt: &RecordNode) -> Self {
        let count = opt.header.instance as usize;
        let data = &opt.data;
        let header_bytes = count * 6;
        if data.len() < header_bytes {
            return Self::default();
        }

        let mut headers = Vec::with_capacity(count);
        for i in 0..count {
            let at = i * 6;
            let id_raw = u16::from_le_bytes([data[at], data[at + 1]]);
            let value = i32::from_le_bytes([
                data[at + 2],
                data[at + 3],
                data[at + 4],
                data[at + 5],
            ]);
            headers.push((id_raw, value));
        }

        let mut entries = HashMap::with_capacity(count);
        let mut complex_at = header_bytes;
        for (id_raw, value) in headers {
            let id = id_raw & PROPERTY_ID_MASK;
            if id_raw & IS_COMPLEX != 0 {
                let end = complex_at + value.max(0) as usize;
                if end > data.len() {
                    break;
                }
                entries.insert(id, PropertyValue::Complex(data.slice(complex_at..end)));
                complex_at = end;
            } else {
                entries.insert(id, PropertyValue::Simple(value));
            }
        }
        Self { entries }
    }

    pub fn get(&self, id: u16) -> Option<&PropertyValue> {
        self.entries.get(&id)
    }

    /// Inline 32-bit value of a property.
    pub fn int(&self, id: u16) -> Option<i32> {
        match self.entries.get(&id) {
            Some(PropertyValue::Simple(value)) => Some(*value),
            _ => None,
        }
    }

    /// Complex payload of a property.
    pub fn complex(&self, id: u16) -> Option<&Bytes> {
        match self.entries.get(&id) {
            Some(PropertyValue::Complex(data)) => Some(data),
            _ => None,
        }
    }

    /// Shape name from the name property.
    pub fn name(&self) -> Option<String> {
        let raw = self.complex(prop::SHAPE_NAME)?;
        let text = parse_utf16le_string(raw);
        (!text.is_empty()).then_some(text)
    }

    pub fn has(&self, id: u16) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Shape position and extent, top-left origin, host units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Anchor {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Anchor {
    pub const fn width(&self) -> i32 {
        self.right - self.left
    }

    pub const fn height(&self) -> i32 {
        self.bottom - self.top
    }

    /// Parse an anchor record payload. Child anchors and sheet client
    /// anchors carry four 32-bit edges in left, top, right, bottom
    /// order; presentation client anchors carry four 16-bit edges in
    /// top, left, right, bottom order.
    pub fn parse(node: &RecordNode) -> Option<Self> {
        let data = &node.data;
        if data.len() >= 16 {
            Some(Self {
                left: read_i32_le(data, 0).ok()?,
                top: read_i32_le(data, 4).ok()?,
                right: read_i32_le(data, 8).ok()?,
                bottom: read_i32_le(data, 12).ok()?,
            })
        } else if data.len() >= 8 {
            let top = read_i16_le(data, 0).ok()? as i32;
            let left = read_i16_le(data, 2).ok()? as i32;
            let right = read_i16_le(data, 4).ok()? as i32;
            let bottom = read_i16_le(data, 6).ok()? as i32;
            Some(Self {
                left,
                top,
                right,
                bottom,
            })
        } else {
            None
        }
    }
}

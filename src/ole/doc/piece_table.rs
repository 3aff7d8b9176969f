//! Piece table (CLX) parser.
//!
//! The piece table maps character positions (CPs) to file character
//! positions (FCs) in the WordDocument stream. Fast saves append text
//! out of order, so document text is the concatenation of pieces, each
//! of which may independently be 8-bit (Windows-1252) or UTF-16LE.

use bytes::Bytes;
use encoding_rs::WINDOWS_1252;

use crate::common::binary::{read_u16_le, read_u32_le};

/// Size of a piece descriptor (Pcd) in bytes.
const PIECE_DESCRIPTOR_SIZE: usize = 8;

/// One contiguous run of document text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextPiece {
    /// Start character position
    pub cp_start: u32,
    /// End character position (exclusive)
    pub cp_end: u32,
    /// Byte offset of the text in the WordDocument stream
    pub fc: u32,
    /// UTF-16LE when true, Windows-1252 otherwise
    pub is_unicode: bool,
}

impl TextPiece {
    /// Length in characters.
    #[inline]
    pub fn char_len(&self) -> u32 {
        self.cp_end.saturating_sub(self.cp_start)
    }

    /// Length in bytes within the WordDocument stream.
    #[inline]
    pub fn byte_len(&self) -> u32 {
        if self.is_unicode {
            self.char_len() * 2
        } else {
            self.char_len()
        }
    }

    /// Decode this piece's text out of the WordDocument stream.
    ///
    /// A piece reaching past the end of the stream is clamped to what is
    /// actually there.
    pub fn text(&self, word_stream: &[u8]) -> Option<String> {
        let start = self.fc as usize;
        if start >= word_stream.len() {
            return None;
        }
        let end = (start + self.byte_len() as usize).min(word_stream.len());
        let bytes = &word_stream[start..end];

        if self.is_unicode {
            let units: Vec<u16> = bytes
                .chunks_exact(2)
                .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
                .collect();
            Some(String::from_utf16_lossy(&units))
        } else {
            Some(WINDOWS_1252.decode(bytes).0.into_owned())
        }
    }
}

/// Plex structure: n+1 positions followed by n fixed-size elements.
pub(super) struct Plex {
    positions: Vec<u32>,
    elements: Bytes,
    element_size: usize,
}

impl Plex {
    pub(super) fn parse(data: &[u8], element_size: usize) -> Option<Self> {
        if data.len() < 4 || element_size == 0 {
            return None;
        }
        let count = (data.len() - 4) / (4 + element_size);
        let mut positions = Vec::with_capacity(count + 1);
        for i in 0..=count {
            positions.push(read_u32_le(data, i * 4).ok()?);
        }
        let elements_start = (count + 1) * 4;
        let elements_end = elements_start + count * element_size;
        if elements_end > data.len() {
            return None;
        }
        Some(Self {
            positions,
            elements: Bytes::copy_from_slice(&data[elements_start..elements_end]),
            element_size,
        })
    }

    pub(super) fn len(&self) -> usize {
        self.elements.len() / self.element_size
    }

    pub(super) fn range(&self, index: usize) -> Option<(u32, u32)> {
        Some((
            *self.positions.get(index)?,
            *self.positions.get(index + 1)?,
        ))
    }

    pub(super) fn element(&self, index: usize) -> Option<&[u8]> {
        let start = index * self.element_size;
        self.elements.get(start..start + self.element_size)
    }
}

/// The parsed piece table, pieces ordered by character position.
#[derive(Debug, Clone, Default)]
pub struct PieceTable {
    pieces: Vec<TextPiece>,
}

impl PieceTable {
    /// Parse a piece table out of CLX data from the table stream.
    ///
    /// The CLX is a sequence of property-modifier sections (type 0x01,
    /// skipped) followed by the piece descriptor table (type 0x02).
    pub fn parse(clx_data: &[u8]) -> Option<Self> {
        let mut offset = 0;

        // Skip Prc sections from fast saves
        while offset < clx_data.len() && clx_data[offset] == 0x01 {
            offset += 1;
            let size = read_u16_le(clx_data, offset).ok()? as usize;
            offset = offset.checked_add(2 + size)?;
        }

        if offset >= clx_data.len() || clx_data[offset] != 0x02 {
            return None;
        }
        offset += 1;

        let table_len = read_u32_le(clx_data, offset).ok()? as usize;
        offset += 4;
        let table = clx_data.get(offset..offset + table_len)?;

        let plex = Plex::parse(table, PIECE_DESCRIPTOR_SIZE)?;
        let mut pieces = Vec::with_capacity(plex.len());
        for i in 0..plex.len() {
            let (cp_start, cp_end) = plex.range(i)?;
            let descriptor = plex.element(i)?;

            // Pcd: 2 bytes of flags, 4-byte fc, 2-byte property modifier.
            // Bit 30 of fc set means 8-bit text at half the stored offset.
            let fc_raw = read_u32_le(descriptor, 2).ok()?;
            let is_unicode = fc_raw & 0x4000_0000 == 0;
            let mut fc = fc_raw & 0x3FFF_FFFF;
            if !is_unicode {
                fc /= 2;
            }

            pieces.push(TextPiece {
                cp_start,
                cp_end,
                fc,
                is_unicode,
            });
        }

        pieces.sort_by_key(|piece| piece.cp_start);
        Some(Self { pieces })
    }

    /// A single-piece table for documents without a CLX, covering the
    /// legacy fcMin..fcMac text range.
    pub fn from_legacy_range(fc_min: u32, fc_mac: u32, is_unicode: bool) -> Self {
        let byte_len = fc_mac.saturating_sub(fc_min);
        let char_len = if is_unicode { byte_len / 2 } else { byte_len };
        Self {
            pieces: vec![TextPiece {
                cp_start: 0,
                cp_end: char_len,
                fc: fc_min,
                is_unicode,
            }],
        }
    }

    #[inline]
    pub fn pieces(&self) -> &[TextPiece] {
        &self.pieces
    }

    /// Total number of characters addressed by the table.
    pub fn total_cps(&self) -> u32 {
        self.pieces.last().map(|piece| piece.cp_end).unwrap_or(0)
    }

    /// Decode and concatenate all pieces in CP order.
    pub fn text(&self, word_stream: &[u8]) -> String {
        let mut out = String::new();
        for piece in &self.pieces {
            if let Some(text) = piece.text(word_stream) {
                out.push_str(&text);
            }
        }
        out
    }
}

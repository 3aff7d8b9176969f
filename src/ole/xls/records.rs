//! Record-level reader for the binary workbook stream.
//!
//! A workbook stream is a flat sequence of records, each introduced by a
//! four byte header (type code, payload length). Substreams (workbook
//! globals, one per sheet) are delimited by `BOF`/`EOF` pairs and located
//! through absolute offsets carried in the `BoundSheet` directory.

use std::io::{Read, Seek, SeekFrom};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::error::{XlsError, XlsResult};
use crate::common::binary::{parse_utf16le_string_len, read_f64_le, read_u16_le, read_u32_le};
use crate::common::encoding::decode_bytes;

/// Size of a record header: type code plus payload length.
pub const RECORD_HEADER_SIZE: usize = 4;

/// Maximum payload a single record may declare.
pub const MAX_RECORD_LEN: usize = 8224;

/// One raw record: type code and payload bytes.
#[derive(Debug, Clone)]
pub struct BiffRecord {
    /// Record type code.
    pub code: u16,
    /// Payload bytes. May be shorter than declared when the stream was
    /// truncated; the iterator warns when it clamps.
    pub data: Vec<u8>,
}

/// Sequential reader over the records of a workbook stream.
///
/// Tracks its absolute position so sheet substreams can be entered via
/// [`RecordIter::seek`] using the offsets from the `BoundSheet` directory.
pub struct RecordIter<R: Read + Seek> {
    reader: R,
    stream_len: u64,
    position: u64,
}

impl<R: Read + Seek> RecordIter<R> {
    /// Wraps a stream, measuring its length and rewinding to the start.
    pub fn new(mut reader: R) -> XlsResult<Self> {
        let stream_len = reader.seek(SeekFrom::End(0))?;
        reader.seek(SeekFrom::Start(0))?;
        Ok(Self {
            reader,
            stream_len,
            position: 0,
        })
    }

    /// Absolute offset of the next record header.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Total length of the underlying stream.
    pub fn stream_len(&self) -> u64 {
        self.stream_len
    }

    /// Moves the cursor to an absolute offset.
    pub fn seek(&mut self, position: u64) -> XlsResult<()> {
        if position > self.stream_len {
            return Err(XlsError::InvalidData(format!(
                "substream offset {position} past end of stream ({} bytes)",
                self.stream_len
            )));
        }
        self.reader.seek(SeekFrom::Start(position))?;
        self.position = position;
        Ok(())
    }
}

impl<R: Read + Seek> Iterator for RecordIter<R> {
    type Item = XlsResult<BiffRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        // Trailing bytes too short for a header are ignored.
        if self.position + RECORD_HEADER_SIZE as u64 > self.stream_len {
            return None;
        }
        let mut header = [0u8; RECORD_HEADER_SIZE];
        if let Err(e) = self.reader.read_exact(&mut header) {
            self.position = self.stream_len;
            return Some(Err(e.into()));
        }
        let code = u16::from_le_bytes([header[0], header[1]]);
        let declared = u16::from_le_bytes([header[2], header[3]]) as u64;
        let available = self.stream_len - self.position - RECORD_HEADER_SIZE as u64;
        let take = declared.min(available);
        if take < declared {
            warn!(
                "record 0x{code:04X} at offset {} truncated: declares {declared} bytes, {available} available",
                self.position
            );
        }
        let mut data = vec![0u8; take as usize];
        if let Err(e) = self.reader.read_exact(&mut data) {
            self.position = self.stream_len;
            return Some(Err(e.into()));
        }
        self.position += RECORD_HEADER_SIZE as u64 + take;
        Some(Ok(BiffRecord { code, data }))
    }
}

/// Stream format version taken from the `BOF` record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BiffVersion {
    Biff2,
    Biff3,
    Biff4,
    Biff5,
    Biff8,
}

impl BiffVersion {
    /// Maps the version field of a `BOF` payload.
    pub fn from_bof(version: u16) -> Option<Self> {
        match version {
            0x0200 => Some(BiffVersion::Biff2),
            0x0300 => Some(BiffVersion::Biff3),
            0x0400 => Some(BiffVersion::Biff4),
            // BIFF5 and BIFF7 share the 0x0500 marker.
            0x0500 => Some(BiffVersion::Biff5),
            0x0600 => Some(BiffVersion::Biff8),
            _ => None,
        }
    }
}

/// Substream kind declared by a `BOF` record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Substream {
    /// Workbook globals: directory, shared strings, formats.
    Globals,
    /// Sheet cell data.
    Worksheet,
    /// Chart definition.
    Chart,
    /// Macro sheet.
    Macro,
    /// Anything else.
    Other(u16),
}

/// Parsed `BOF` record.
#[derive(Debug, Clone, Copy)]
pub struct Bof {
    /// Raw version field, kept for diagnostics.
    pub raw_version: u16,
    /// Recognised version, if any.
    pub version: Option<BiffVersion>,
    /// Kind of substream this `BOF` opens.
    pub substream: Substream,
}

impl Bof {
    pub fn parse(data: &[u8]) -> XlsResult<Self> {
        let raw_version = read_u16_le(data, 0)?;
        let dt = read_u16_le(data, 2)?;
        let substream = match dt {
            0x0005 => Substream::Globals,
            0x0010 => Substream::Worksheet,
            0x0020 => Substream::Chart,
            0x0040 => Substream::Macro,
            other => Substream::Other(other),
        };
        Ok(Self {
            raw_version,
            version: BiffVersion::from_bof(raw_version),
            substream,
        })
    }
}

/// Sheet visibility from the `BoundSheet` directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SheetVisibility {
    #[default]
    Visible,
    Hidden,
    /// Hidden and not listed in the unhide dialog.
    VeryHidden,
}

/// Sheet kind from the `BoundSheet` directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetKind {
    Worksheet,
    Chart,
    Other(u8),
}

/// One entry of the sheet directory in the workbook globals.
#[derive(Debug, Clone)]
pub struct BoundSheet {
    /// Absolute offset of the sheet's `BOF` record in the stream.
    pub position: u32,
    pub visibility: SheetVisibility,
    pub kind: SheetKind,
    pub name: String,
}

impl BoundSheet {
    pub fn parse(data: &[u8], codepage: u16) -> XlsResult<Self> {
        let position = read_u32_le(data, 0)?;
        if data.len() < 6 {
            return Err(XlsError::InvalidLength {
                expected: 6,
                found: data.len(),
            });
        }
        let visibility = match data[4] & 0x03 {
            0 => SheetVisibility::Visible,
            1 => SheetVisibility::Hidden,
            _ => SheetVisibility::VeryHidden,
        };
        let kind = match data[5] {
            0x00 => SheetKind::Worksheet,
            0x02 => SheetKind::Chart,
            other => SheetKind::Other(other),
        };
        let (name, _) = read_unicode_string(data, 6, CchWidth::Byte, codepage)?;
        Ok(Self {
            position,
            visibility,
            kind,
            name,
        })
    }
}

/// Used cell range of a sheet. Last row and column are exclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub first_row: u32,
    pub last_row: u32,
    pub first_col: u16,
    pub last_col: u16,
}

impl Dimensions {
    /// Accepts both the 14 byte layout (32-bit rows) and the older
    /// 10 byte layout (16-bit rows).
    pub fn parse(data: &[u8]) -> XlsResult<Self> {
        if data.len() >= 14 {
            Ok(Self {
                first_row: read_u32_le(data, 0)?,
                last_row: read_u32_le(data, 4)?,
                first_col: read_u16_le(data, 8)?,
                last_col: read_u16_le(data, 10)?,
            })
        } else if data.len() >= 10 {
            Ok(Self {
                first_row: read_u16_le(data, 0)? as u32,
                last_row: read_u16_le(data, 2)? as u32,
                first_col: read_u16_le(data, 4)?,
                last_col: read_u16_le(data, 6)?,
            })
        } else {
            Err(XlsError::InvalidLength {
                expected: 10,
                found: data.len(),
            })
        }
    }

    pub fn row_count(&self) -> u32 {
        self.last_row.saturating_sub(self.first_row)
    }

    pub fn col_count(&self) -> u16 {
        self.last_col.saturating_sub(self.first_col)
    }
}

/// Font description from the workbook globals.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FontRecord {
    /// Height in twips (1/20 point).
    pub height: u16,
    pub bold: bool,
    pub italic: bool,
    pub name: String,
}

impl FontRecord {
    pub fn parse(data: &[u8], codepage: u16) -> XlsResult<Self> {
        let height = read_u16_le(data, 0)?;
        let grbit = read_u16_le(data, 2)?;
        // Weight of 700 or more renders bold.
        let weight = read_u16_le(data, 6)?;
        let (name, _) = read_unicode_string(data, 14, CchWidth::Byte, codepage)?;
        Ok(Self {
            height,
            bold: weight >= 0x02BC,
            italic: grbit & 0x0002 != 0,
            name,
        })
    }
}

/// Extended format entry. Cells reference these by index; the entry in
/// turn references a font and a number format.
#[derive(Debug, Clone, Copy, Default)]
pub struct Xf {
    pub font_index: u16,
    pub format_index: u16,
}

impl Xf {
    pub fn parse(data: &[u8]) -> XlsResult<Self> {
        Ok(Self {
            font_index: read_u16_le(data, 0)?,
            format_index: read_u16_le(data, 2)?,
        })
    }
}

/// Cached result stored inline in a formula record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FormulaValue {
    Number(f64),
    Bool(bool),
    Error(u8),
    Empty,
    /// String results follow in a separate `STRING` record.
    PendingText,
}

impl FormulaValue {
    /// Decodes the eight byte cached-value field of a formula record.
    pub fn parse(data: &[u8]) -> XlsResult<Self> {
        if data.len() < 8 {
            return Err(XlsError::InvalidLength {
                expected: 8,
                found: data.len(),
            });
        }
        if data[6] == 0xFF && data[7] == 0xFF {
            match data[0] {
                0x00 => Ok(FormulaValue::PendingText),
                0x01 => Ok(FormulaValue::Bool(data[2] != 0)),
                0x02 => Ok(FormulaValue::Error(data[2])),
                0x03 => Ok(FormulaValue::Empty),
                other => Err(XlsError::InvalidData(format!(
                    "unknown cached formula value type 0x{other:02X}"
                ))),
            }
        } else {
            Ok(FormulaValue::Number(read_f64_le(data, 0)?))
        }
    }
}

/// Decodes an RK-encoded number.
///
/// Bit 0 requests division by 100, bit 1 selects a 30-bit integer; the
/// remaining bits are otherwise the high half of an IEEE double.
pub fn rk_to_f64(rk: u32) -> f64 {
    let mut value = if rk & 0x02 != 0 {
        ((rk as i32) >> 2) as f64
    } else {
        f64::from_bits(((rk & 0xFFFF_FFFC) as u64) << 32)
    };
    if rk & 0x01 != 0 {
        value /= 100.0;
    }
    value
}

/// Width of the character-count prefix of a string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CchWidth {
    Byte,
    Word,
}

/// Reads a unicode string at `offset`, returning the text and the number
/// of bytes consumed.
///
/// Strings carry a flags byte after the character count: bit 0 selects
/// 16-bit characters, bit 3 prefixes a formatting-run table and bit 2 a
/// phonetic block, both of which are skipped. 8-bit characters are the
/// low bytes of UTF-16 code units; they decode through the workbook
/// codepage, falling back to Latin-1.
pub fn read_unicode_string(
    data: &[u8],
    offset: usize,
    width: CchWidth,
    codepage: u16,
) -> XlsResult<(String, usize)> {
    let (cch, mut pos) = match width {
        CchWidth::Byte => {
            let b = *data.get(offset).ok_or(XlsError::InvalidLength {
                expected: offset + 1,
                found: data.len(),
            })?;
            (b as usize, offset + 1)
        }
        CchWidth::Word => (read_u16_le(data, offset)? as usize, offset + 2),
    };
    let flags = *data.get(pos).ok_or(XlsError::InvalidLength {
        expected: pos + 1,
        found: data.len(),
    })?;
    pos += 1;
    let wide = flags & 0x01 != 0;
    let phonetic = flags & 0x04 != 0;
    let rich = flags & 0x08 != 0;
    let run_count = if rich {
        let n = read_u16_le(data, pos)? as usize;
        pos += 2;
        n
    } else {
        0
    };
    let ext_len = if phonetic {
        let n = read_u32_le(data, pos)? as usize;
        pos += 4;
        n
    } else {
        0
    };
    let byte_len = if wide { cch * 2 } else { cch };
    if pos + byte_len > data.len() {
        return Err(XlsError::InvalidLength {
            expected: pos + byte_len,
            found: data.len(),
        });
    }
    let text = if wide {
        parse_utf16le_string_len(data, pos, cch)
    } else {
        decode_low_bytes(&data[pos..pos + byte_len], codepage)
    };
    pos += byte_len;
    // Formatting runs and the phonetic block follow the characters.
    let tail = run_count * 4 + ext_len;
    if pos + tail > data.len() {
        debug!("string trailer runs past record end, clamping");
        pos = data.len();
    } else {
        pos += tail;
    }
    Ok((text, pos - offset))
}

fn decode_low_bytes(bytes: &[u8], codepage: u16) -> String {
    decode_bytes(bytes, Some(codepage as u32))
        .unwrap_or_else(|| bytes.iter().map(|&b| b as char).collect())
}

/// Shared string table from the workbook globals.
///
/// The table frequently spans `CONTINUE` records; callers concatenate
/// those payloads before parsing. A truncated table yields the strings
/// read so far; cells referencing lost entries degrade to empty values.
#[derive(Debug, Clone, Default)]
pub struct SharedStrings {
    strings: Vec<String>,
}

impl SharedStrings {
    pub fn parse(data: &[u8], codepage: u16) -> XlsResult<Self> {
        let unique = read_u32_le(data, 4)? as usize;
        let mut strings = Vec::with_capacity(unique.min(0x1_0000));
        let mut pos = 8usize;
        while strings.len() < unique && pos < data.len() {
            match read_unicode_string(data, pos, CchWidth::Word, codepage) {
                Ok((text, consumed)) => {
                    strings.push(text);
                    pos += consumed;
                }
                Err(e) => {
                    warn!(
                        "shared string table truncated after {} of {unique} entries: {e}",
                        strings.len()
                    );
                    break;
                }
            }
        }
        if strings.len() < unique {
            debug!(
                "shared string table declares {unique} entries, decoded {}",
                strings.len()
            );
        }
        Ok(Self { strings })
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.strings.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

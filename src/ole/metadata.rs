//! Document properties from OLE property-set streams.
//!
//! Standard properties live in the `\x05SummaryInformation` and
//! `\x05DocumentSummaryInformation` streams as typed (id, value) pairs.
//! Both streams are optional and both degrade: a malformed stream is
//! logged and skipped rather than failing the whole file.

use std::collections::HashMap;
use std::io::{Read, Seek};

use chrono::{DateTime, TimeZone, Utc};
use tracing::debug;

use super::consts::{
    VT_BLOB, VT_BOOL, VT_BSTR, VT_EMPTY, VT_ERROR, VT_FILETIME, VT_I2, VT_I4, VT_INT, VT_LPSTR,
    VT_LPWSTR, VT_NULL, VT_UI2, VT_UI4, VT_UINT,
};
use super::file::{OleError, OleFile};
use crate::common::binary::{
    parse_utf16le_string, read_i16_le, read_i32_le, read_u16_le, read_u32_le, read_u64_le,
};
use crate::common::encoding::{decode_bytes, strip_null_terminators};

/// Property IDs used by the two standard property sets.
///
/// The `DSI_*` constants belong to DocumentSummaryInformation, which has
/// its own numbering that overlaps the SummaryInformation one.
mod pid {
    pub const CODEPAGE: u32 = 1;
    pub const TITLE: u32 = 2;
    pub const SUBJECT: u32 = 3;
    pub const AUTHOR: u32 = 4;
    pub const KEYWORDS: u32 = 5;
    pub const COMMENTS: u32 = 6;
    pub const TEMPLATE: u32 = 7;
    pub const LAST_SAVED_BY: u32 = 8;
    pub const REVISION: u32 = 9;
    pub const CREATE_TIME: u32 = 12;
    pub const LAST_SAVED_TIME: u32 = 13;
    pub const PAGES: u32 = 14;
    pub const WORDS: u32 = 15;
    pub const CHARS: u32 = 16;
    pub const APPLICATION: u32 = 18;
    pub const SECURITY: u32 = 19;

    pub const DSI_CATEGORY: u32 = 2;
    pub const DSI_MANAGER: u32 = 14;
    pub const DSI_COMPANY: u32 = 15;
}

/// Properties gathered from both standard streams.
#[derive(Debug, Clone, Default)]
pub struct OleMetadata {
    pub codepage: Option<u32>,
    pub title: Option<String>,
    pub subject: Option<String>,
    pub author: Option<String>,
    pub keywords: Option<String>,
    pub comments: Option<String>,
    pub template: Option<String>,
    pub last_saved_by: Option<String>,
    pub revision_number: Option<String>,
    pub create_time: Option<DateTime<Utc>>,
    pub last_saved_time: Option<DateTime<Utc>>,
    pub num_pages: Option<u32>,
    pub num_words: Option<u32>,
    pub num_chars: Option<u32>,
    pub creating_application: Option<String>,
    pub security: Option<u32>,
    /// From DocumentSummaryInformation.
    pub category: Option<String>,
    pub manager: Option<String>,
    pub company: Option<String>,
}

/// One decoded property value.
#[derive(Debug, Clone)]
pub enum PropertyValue {
    I2(i16),
    I4(i32),
    UI2(u16),
    UI4(u32),
    Bool(bool),
    /// Codepage string, already decoded to UTF-8.
    Lpstr(String),
    Lpwstr(String),
    /// Raw FILETIME ticks.
    Filetime(u64),
    Blob(Vec<u8>),
    Empty,
}

impl<R: Read + Seek> OleFile<R> {
    /// Parse the standard property streams.
    ///
    /// Missing or malformed streams are skipped, so the result may be
    /// partially (or entirely) empty but the call itself only fails on
    /// I/O errors.
    pub fn metadata(&mut self) -> Result<OleMetadata, OleError> {
        let mut metadata = OleMetadata::default();

        if let Ok(data) = self.open_stream(&["\u{0005}SummaryInformation"]) {
            match parse_property_stream(&data) {
                Ok(props) => apply_summary(&mut metadata, &props),
                Err(err) => debug!("skipping malformed SummaryInformation stream: {err}"),
            }
        }

        if let Ok(data) = self.open_stream(&["\u{0005}DocumentSummaryInformation"]) {
            match parse_property_stream(&data) {
                Ok(props) => apply_document_summary(&mut metadata, &props),
                Err(err) => debug!("skipping malformed DocumentSummaryInformation stream: {err}"),
            }
        }

        Ok(metadata)
    }
}

/// Parse a property stream into an id-to-value map.
///
/// Only the first property set section is read, which is where all the
/// standard document properties live.
fn parse_property_stream(data: &[u8]) -> Result<HashMap<u32, PropertyValue>, OleError> {
    if data.len() < 48 {
        return Err(OleError::InvalidFormat(
            "property stream too short".to_string(),
        ));
    }

    // Skip header (28 bytes) and format ID (20 bytes)
    let section_offset = read_u32_le(data, 44)? as usize;

    if section_offset + 8 > data.len() {
        return Err(OleError::InvalidFormat(
            "section offset past stream end".to_string(),
        ));
    }

    // Read property count (the section size at offset 0 is not used).
    // Capped so a corrupt count cannot make us loop over gigabytes.
    let num_props = read_u32_le(data, section_offset + 4)?.min(1000);

    // The codepage property determines how 8-bit strings in the same
    // section are decoded, so it has to be found before everything else.
    let codepage = find_codepage(data, section_offset, num_props);

    let mut properties = HashMap::new();
    for i in 0..num_props {
        let pair_offset = section_offset + 8 + (i as usize) * 8;
        let Ok(prop_id) = read_u32_le(data, pair_offset) else {
            break;
        };
        let Ok(relative) = read_u32_le(data, pair_offset + 4) else {
            break;
        };
        let value_offset = section_offset + relative as usize;

        let Ok(prop_type) = read_u16_le(data, value_offset) else {
            continue;
        };

        if let Ok(value) = parse_property_value(data, value_offset + 4, prop_type, codepage) {
            properties.insert(prop_id, value);
        }
    }

    Ok(properties)
}

/// Locate the codepage property within a section.
fn find_codepage(data: &[u8], section_offset: usize, num_props: u32) -> Option<u32> {
    for i in 0..num_props as usize {
        let pair_offset = section_offset + 8 + i * 8;
        let Ok(prop_id) = read_u32_le(data, pair_offset) else {
            break;
        };
        if prop_id != pid::CODEPAGE {
            continue;
        }
        let value_offset = section_offset + read_u32_le(data, pair_offset + 4).ok()? as usize;
        // Writers store the codepage as VT_I2 even for values above
        // 0x7FFF (65001 for UTF-8), so reinterpret the bits unsigned.
        return match read_u16_le(data, value_offset).ok()? {
            VT_I2 => read_i16_le(data, value_offset + 4)
                .ok()
                .map(|v| v as u16 as u32),
            VT_UI2 => read_u16_le(data, value_offset + 4).ok().map(u32::from),
            _ => None,
        };
    }
    None
}

/// Parse a single property value based on its type.
fn parse_property_value(
    data: &[u8],
    offset: usize,
    prop_type: u16,
    codepage: Option<u32>,
) -> Result<PropertyValue, OleError> {
    match prop_type {
        VT_I2 => Ok(PropertyValue::I2(read_i16_le(data, offset)?)),
        VT_I4 | VT_INT | VT_ERROR => Ok(PropertyValue::I4(read_i32_le(data, offset)?)),
        VT_UI2 => Ok(PropertyValue::UI2(read_u16_le(data, offset)?)),
        VT_UI4 | VT_UINT => Ok(PropertyValue::UI4(read_u32_le(data, offset)?)),
        VT_BOOL => Ok(PropertyValue::Bool(read_u16_le(data, offset)? != 0)),
        VT_LPSTR | VT_BSTR => {
            // Length-prefixed string in the section codepage
            let str_len = read_u32_le(data, offset)? as usize;
            let end = offset
                .checked_add(4 + str_len)
                .filter(|&end| end <= data.len())
                .ok_or_else(|| OleError::InvalidFormat("string overflow".to_string()))?;
            let str_bytes = &data[offset + 4..end];
            let text = decode_bytes(str_bytes, codepage).unwrap_or_else(|| {
                String::from_utf8_lossy(strip_null_terminators(str_bytes)).into_owned()
            });
            Ok(PropertyValue::Lpstr(text))
        }
        VT_LPWSTR => {
            // Length is in UTF-16 code units, including the terminator
            let char_count = read_u32_le(data, offset)? as usize;
            let byte_len = char_count
                .checked_mul(2)
                .ok_or_else(|| OleError::InvalidFormat("string overflow".to_string()))?;
            let end = offset
                .checked_add(4 + byte_len)
                .filter(|&end| end <= data.len())
                .ok_or_else(|| OleError::InvalidFormat("string overflow".to_string()))?;
            Ok(PropertyValue::Lpwstr(parse_utf16le_string(
                &data[offset + 4..end],
            )))
        }
        VT_FILETIME => Ok(PropertyValue::Filetime(read_u64_le(data, offset)?)),
        VT_BLOB => {
            let blob_len = read_u32_le(data, offset)? as usize;
            let end = offset
                .checked_add(4 + blob_len)
                .filter(|&end| end <= data.len())
                .ok_or_else(|| OleError::InvalidFormat("blob overflow".to_string()))?;
            Ok(PropertyValue::Blob(data[offset + 4..end].to_vec()))
        }
        VT_EMPTY | VT_NULL => Ok(PropertyValue::Empty),
        // Vectors and anything else exotic are not document properties
        _ => Ok(PropertyValue::Empty),
    }
}

fn apply_summary(metadata: &mut OleMetadata, props: &HashMap<u32, PropertyValue>) {
    let text = |id: u32| props.get(&id).and_then(text_value);
    let count = |id: u32| props.get(&id).and_then(count_value);
    let time = |id: u32| props.get(&id).and_then(time_value);

    metadata.codepage = props.get(&pid::CODEPAGE).and_then(codepage_value);
    metadata.title = text(pid::TITLE);
    metadata.subject = text(pid::SUBJECT);
    metadata.author = text(pid::AUTHOR);
    metadata.keywords = text(pid::KEYWORDS);
    metadata.comments = text(pid::COMMENTS);
    metadata.template = text(pid::TEMPLATE);
    metadata.last_saved_by = text(pid::LAST_SAVED_BY);
    metadata.revision_number = text(pid::REVISION);
    metadata.create_time = time(pid::CREATE_TIME);
    metadata.last_saved_time = time(pid::LAST_SAVED_TIME);
    metadata.num_pages = count(pid::PAGES);
    metadata.num_words = count(pid::WORDS);
    metadata.num_chars = count(pid::CHARS);
    metadata.creating_application = text(pid::APPLICATION);
    metadata.security = count(pid::SECURITY);
}

fn apply_document_summary(metadata: &mut OleMetadata, props: &HashMap<u32, PropertyValue>) {
    let text = |id: u32| props.get(&id).and_then(text_value);

    metadata.category = text(pid::DSI_CATEGORY);
    metadata.manager = text(pid::DSI_MANAGER);
    metadata.company = text(pid::DSI_COMPANY);
}

fn text_value(value: &PropertyValue) -> Option<String> {
    match value {
        PropertyValue::Lpstr(s) | PropertyValue::Lpwstr(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

fn count_value(value: &PropertyValue) -> Option<u32> {
    match value {
        PropertyValue::I4(v) => Some(*v as u32),
        PropertyValue::UI4(v) => Some(*v),
        _ => None,
    }
}

fn time_value(value: &PropertyValue) -> Option<DateTime<Utc>> {
    match value {
        PropertyValue::Filetime(ticks) => filetime_to_datetime(*ticks),
        _ => None,
    }
}

fn codepage_value(value: &PropertyValue) -> Option<u32> {
    match value {
        PropertyValue::UI2(v) => Some(u32::from(*v)),
        PropertyValue::I2(v) => Some(*v as u16 as u32),
        _ => None,
    }
}

/// Convert a Windows FILETIME (100ns ticks since 1601-01-01) to a UTC
/// timestamp. Zero is the conventional "not set" value.
fn filetime_to_datetime(filetime: u64) -> Option<DateTime<Utc>> {
    if filetime == 0 {
        return None;
    }
    // Seconds between 1601-01-01 and the Unix epoch
    const EPOCH_DELTA_SECS: i64 = 11_644_473_600;
    let secs = (filetime / 10_000_000) as i64 - EPOCH_DELTA_SECS;
    let nanos = ((filetime % 10_000_000) * 100) as u32;
    Utc.timestamp_opt(secs, nanos).single()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ole::consts::{VT_FILETIME, VT_I2, VT_I4, VT_LPSTR, VT_LPWSTR};
    use crate::ole::fixtures::CompoundFileBuilder;

    /// Build a single-section property stream from (id, typed value) pairs
    fn property_stream(props: &[(u32, Vec<u8>)]) -> Vec<u8> {
        let mut stream = vec![0u8; 48];
        stream[0] = 0xFE;
        stream[1] = 0xFF; // byte order mark
        stream[24..28].copy_from_slice(&1u32.to_le_bytes()); // one section
        stream[44..48].copy_from_slice(&48u32.to_le_bytes()); // section offset

        let table_len = 8 + props.len() * 8;
        let mut values: Vec<u8> = Vec::new();
        let mut pairs: Vec<(u32, u32)> = Vec::new();
        for (id, value) in props {
            pairs.push((*id, (table_len + values.len()) as u32));
            values.extend_from_slice(value);
            while values.len() % 4 != 0 {
                values.push(0);
            }
        }

        stream.extend_from_slice(&((table_len + values.len()) as u32).to_le_bytes());
        stream.extend_from_slice(&(props.len() as u32).to_le_bytes());
        for (id, offset) in pairs {
            stream.extend_from_slice(&id.to_le_bytes());
            stream.extend_from_slice(&offset.to_le_bytes());
        }
        stream.extend_from_slice(&values);
        stream
    }

    fn typed(prop_type: u16, payload: &[u8]) -> Vec<u8> {
        let mut v = (prop_type as u32).to_le_bytes().to_vec();
        v.extend_from_slice(payload);
        v
    }

    fn lpstr(text: &[u8]) -> Vec<u8> {
        let mut payload = ((text.len() + 1) as u32).to_le_bytes().to_vec();
        payload.extend_from_slice(text);
        payload.push(0);
        typed(VT_LPSTR, &payload)
    }

    fn lpwstr(text: &str) -> Vec<u8> {
        let units: Vec<u16> = text.encode_utf16().chain(std::iter::once(0)).collect();
        let mut payload = (units.len() as u32).to_le_bytes().to_vec();
        for unit in units {
            payload.extend_from_slice(&unit.to_le_bytes());
        }
        typed(VT_LPWSTR, &payload)
    }

    fn i2(value: i16) -> Vec<u8> {
        typed(VT_I2, &value.to_le_bytes())
    }

    fn i4(value: i32) -> Vec<u8> {
        typed(VT_I4, &value.to_le_bytes())
    }

    fn filetime(value: u64) -> Vec<u8> {
        typed(VT_FILETIME, &value.to_le_bytes())
    }

    #[test]
    fn test_summary_information_with_codepage_strings() {
        // 0xE9 is LATIN SMALL LETTER E WITH ACUTE in Windows-1252
        let stream = property_stream(&[
            (1, i2(1252)),
            (2, lpstr(b"R\xE9sum\xE9")),
            (4, lpwstr("Jos\u{00E9}")),
            (14, i4(7)),
        ]);
        let cursor = CompoundFileBuilder::new()
            .stream("\u{0005}SummaryInformation", &stream)
            .build_cursor();

        let mut ole = OleFile::open(cursor).unwrap();
        let meta = ole.metadata().unwrap();
        assert_eq!(meta.codepage, Some(1252));
        assert_eq!(meta.title.as_deref(), Some("R\u{00E9}sum\u{00E9}"));
        assert_eq!(meta.author.as_deref(), Some("Jos\u{00E9}"));
        assert_eq!(meta.num_pages, Some(7));
    }

    #[test]
    fn test_filetime_properties_become_timestamps() {
        // 2020-01-01T00:00:00Z in FILETIME ticks
        let ticks = (11_644_473_600u64 + 1_577_836_800) * 10_000_000;
        let stream = property_stream(&[(12, filetime(ticks)), (13, filetime(0))]);
        let cursor = CompoundFileBuilder::new()
            .stream("\u{0005}SummaryInformation", &stream)
            .build_cursor();

        let mut ole = OleFile::open(cursor).unwrap();
        let meta = ole.metadata().unwrap();
        assert_eq!(
            meta.create_time,
            Some(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap())
        );
        // A zero FILETIME means "not set"
        assert_eq!(meta.last_saved_time, None);
    }

    #[test]
    fn test_document_summary_company() {
        let stream = property_stream(&[(15, lpstr(b"Acme Corp"))]);
        let cursor = CompoundFileBuilder::new()
            .stream("\u{0005}DocumentSummaryInformation", &stream)
            .build_cursor();

        let mut ole = OleFile::open(cursor).unwrap();
        let meta = ole.metadata().unwrap();
        assert_eq!(meta.company.as_deref(), Some("Acme Corp"));
        assert_eq!(meta.title, None);
    }

    #[test]
    fn test_malformed_property_stream_is_skipped() {
        let cursor = CompoundFileBuilder::new()
            .stream("\u{0005}SummaryInformation", &[0u8; 10])
            .build_cursor();

        let mut ole = OleFile::open(cursor).unwrap();
        let meta = ole.metadata().unwrap();
        assert_eq!(meta.title, None);
        assert_eq!(meta.author, None);
    }

    #[test]
    fn test_filetime_epoch_conversion() {
        assert_eq!(filetime_to_datetime(0), None);
        let unix_epoch = filetime_to_datetime(116_444_736_000_000_000).unwrap();
        assert_eq!(unix_epoch, Utc.with_ymd_and_hms(1970, 1, 1, 0, 0, 0).unwrap());
    }
}

//! Little-endian field readers shared by every binary parser in the crate.
//!
//! All legacy Office structures are little-endian, so the readers here take a
//! byte slice plus an offset and return the decoded value or a
//! [`BinaryError`] when the slice is too short. UTF-16LE string helpers live
//! here as well; single-byte codepage decoding is in
//! [`crate::common::encoding`].

use zerocopy::{F64, FromBytes, I16, I32, LE, U16, U32, U64};

/// Failure while decoding a fixed-size field.
#[derive(Debug, Clone)]
pub enum BinaryError {
    /// The slice ends before the requested field.
    InsufficientData { expected: usize, available: usize },
    /// The bytes were present but did not form a valid value.
    ParseError(String),
}

impl std::fmt::Display for BinaryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BinaryError::InsufficientData {
                expected,
                available,
            } => write!(f, "need {expected} bytes, have {available}"),
            BinaryError::ParseError(message) => write!(f, "malformed value: {message}"),
        }
    }
}

impl std::error::Error for BinaryError {}

pub type BinaryResult<T> = Result<T, BinaryError>;

/// Copy one unaligned little-endian field out of `data`.
#[inline]
fn read_le<T: FromBytes>(data: &[u8], offset: usize) -> BinaryResult<T> {
    let end = offset.saturating_add(size_of::<T>());
    let bytes = data.get(offset..end).ok_or(BinaryError::InsufficientData {
        expected: end,
        available: data.len(),
    })?;
    T::read_from_bytes(bytes)
        .map_err(|_| BinaryError::ParseError(format!("{} byte field", size_of::<T>())))
}

/// Read a `u16` at `offset`.
///
/// ```
/// use longan::common::binary::read_u16_le;
///
/// let data = [0x0B, 0x02, 0xFF];
/// assert_eq!(read_u16_le(&data, 0).unwrap(), 0x020B);
/// assert!(read_u16_le(&data, 2).is_err());
/// ```
#[inline]
pub fn read_u16_le(data: &[u8], offset: usize) -> BinaryResult<u16> {
    read_le::<U16<LE>>(data, offset).map(|v| v.get())
}

/// Read an `i16` at `offset`.
#[inline]
pub fn read_i16_le(data: &[u8], offset: usize) -> BinaryResult<i16> {
    read_le::<I16<LE>>(data, offset).map(|v| v.get())
}

/// Read a `u32` at `offset`.
///
/// ```
/// use longan::common::binary::read_u32_le;
///
/// let data = [0x10, 0x27, 0x00, 0x00];
/// assert_eq!(read_u32_le(&data, 0).unwrap(), 10_000);
/// ```
#[inline]
pub fn read_u32_le(data: &[u8], offset: usize) -> BinaryResult<u32> {
    read_le::<U32<LE>>(data, offset).map(|v| v.get())
}

/// Read an `i32` at `offset`.
#[inline]
pub fn read_i32_le(data: &[u8], offset: usize) -> BinaryResult<i32> {
    read_le::<I32<LE>>(data, offset).map(|v| v.get())
}

/// Read a `u64` at `offset`.
#[inline]
pub fn read_u64_le(data: &[u8], offset: usize) -> BinaryResult<u64> {
    read_le::<U64<LE>>(data, offset).map(|v| v.get())
}

/// Read an IEEE 754 double at `offset`.
#[inline]
pub fn read_f64_le(data: &[u8], offset: usize) -> BinaryResult<f64> {
    read_le::<F64<LE>>(data, offset).map(|v| v.get())
}

#[inline]
fn utf16_units(bytes: &[u8]) -> impl Iterator<Item = u16> + '_ {
    bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
}

/// Decode UTF-16LE text up to the first NUL code unit.
///
/// A trailing odd byte is ignored and unpaired surrogates become U+FFFD.
/// Fixed-width name fields padded with NULs decode to just the name.
pub fn parse_utf16le_string(data: &[u8]) -> String {
    let units: Vec<u16> = utf16_units(data).take_while(|&unit| unit != 0).collect();
    String::from_utf16_lossy(&units)
}

/// Decode exactly `char_count` UTF-16 code units starting at `offset`.
///
/// The window is clamped to the slice, so an overstated count in a damaged
/// length field yields a short string rather than an error. NULs inside the
/// window are kept; the count is authoritative here.
pub fn parse_utf16le_string_len(data: &[u8], offset: usize, char_count: usize) -> String {
    let end = char_count
        .checked_mul(2)
        .and_then(|len| offset.checked_add(len))
        .map_or(data.len(), |end| end.min(data.len()));
    match data.get(offset..end) {
        Some(window) => {
            let units: Vec<u16> = utf16_units(window).collect();
            String::from_utf16_lossy(&units)
        }
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_reads_honor_offsets() {
        let data = [0x01, 0x00, 0xFE, 0xFF, 0x40, 0xE2, 0x01, 0x00];
        assert_eq!(read_u16_le(&data, 0).unwrap(), 1);
        assert_eq!(read_i16_le(&data, 2).unwrap(), -2);
        assert_eq!(read_u32_le(&data, 4).unwrap(), 123_456);
        assert_eq!(read_i32_le(&data, 2).unwrap(), 0xE240_FFFE_u32 as i32);
        assert_eq!(read_u64_le(&data, 0).unwrap(), 0x0001_E240_FFFE_0001);
    }

    #[test]
    fn short_slice_reports_requirements() {
        let err = read_u32_le(&[0xAA, 0xBB], 1).unwrap_err();
        match err {
            BinaryError::InsufficientData {
                expected,
                available,
            } => {
                assert_eq!(expected, 5);
                assert_eq!(available, 2);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn double_round_trips() {
        let data = 1234.5f64.to_le_bytes();
        assert_eq!(read_f64_le(&data, 0).unwrap(), 1234.5);
        assert!(read_f64_le(&data, 1).is_err());
    }

    #[test]
    fn utf16_stops_at_nul_padding() {
        let mut field = Vec::new();
        for ch in "Arial".encode_utf16() {
            field.extend_from_slice(&ch.to_le_bytes());
        }
        field.resize(64, 0);
        assert_eq!(parse_utf16le_string(&field), "Arial");
    }

    #[test]
    fn utf16_odd_tail_is_dropped() {
        let data = [b'A', 0x00, b'B', 0x00, 0xD8];
        assert_eq!(parse_utf16le_string(&data), "AB");
    }

    #[test]
    fn counted_utf16_clamps_to_slice() {
        let mut data = Vec::new();
        for ch in "Sheet1".encode_utf16() {
            data.extend_from_slice(&ch.to_le_bytes());
        }
        assert_eq!(parse_utf16le_string_len(&data, 0, 6), "Sheet1");
        assert_eq!(parse_utf16le_string_len(&data, 0, 100), "Sheet1");
        assert_eq!(parse_utf16le_string_len(&data, 4, 4), "eet1");
        assert_eq!(parse_utf16le_string_len(&data, 64, 4), "");
        assert_eq!(parse_utf16le_string_len(&data, 0, usize::MAX), "Sheet1");
    }

    #[test]
    fn unpaired_surrogate_is_replaced() {
        let data = [0x00, 0xD8, b'x', 0x00];
        assert_eq!(parse_utf16le_string(&data), "\u{FFFD}x");
    }
}

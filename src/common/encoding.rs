//! Codepage text decoding for legacy streams.
//!
//! Strings in OLE property sets, BIFF records and RTF bodies are stored in
//! whatever ANSI codepage the authoring machine used. This module resolves
//! Windows codepage identifiers to [`encoding_rs`] decoders and decodes
//! NUL-terminated byte runs with them. UTF-16LE fields do not need a codepage
//! and are handled by [`crate::common::binary`] instead.

use encoding_rs::Encoding;
use memchr::memchr;

/// Resolve a Windows codepage identifier to an `encoding_rs` decoder.
///
/// Covers the ANSI, East Asian, ISO 8859, KOI8 and Macintosh codepages that
/// show up in practice. Unknown identifiers return `None` so callers can pick
/// their own fallback.
///
/// ```
/// use longan::common::encoding::codepage_to_encoding;
///
/// assert_eq!(codepage_to_encoding(932).unwrap().name(), "Shift_JIS");
/// assert!(codepage_to_encoding(12345).is_none());
/// ```
pub fn codepage_to_encoding(codepage: u32) -> Option<&'static Encoding> {
    match codepage {
        874 => Some(encoding_rs::WINDOWS_874),
        932 => Some(encoding_rs::SHIFT_JIS),
        936 | 20936 => Some(encoding_rs::GBK),
        949 => Some(encoding_rs::EUC_KR),
        950 => Some(encoding_rs::BIG5),
        1200 => Some(encoding_rs::UTF_16LE),
        1201 => Some(encoding_rs::UTF_16BE),
        1250 => Some(encoding_rs::WINDOWS_1250),
        1251 => Some(encoding_rs::WINDOWS_1251),
        1252 => Some(encoding_rs::WINDOWS_1252),
        1253 => Some(encoding_rs::WINDOWS_1253),
        1254 => Some(encoding_rs::WINDOWS_1254),
        1255 => Some(encoding_rs::WINDOWS_1255),
        1256 => Some(encoding_rs::WINDOWS_1256),
        1257 => Some(encoding_rs::WINDOWS_1257),
        1258 => Some(encoding_rs::WINDOWS_1258),
        10000 => Some(encoding_rs::MACINTOSH),
        20866 => Some(encoding_rs::KOI8_R),
        20932 => Some(encoding_rs::EUC_JP),
        21866 => Some(encoding_rs::KOI8_U),
        // Latin-1 decodes as windows-1252 per the WHATWG encoding standard.
        28591 => Some(encoding_rs::WINDOWS_1252),
        28592 => Some(encoding_rs::ISO_8859_2),
        28593 => Some(encoding_rs::ISO_8859_3),
        28594 => Some(encoding_rs::ISO_8859_4),
        28595 => Some(encoding_rs::ISO_8859_5),
        28596 => Some(encoding_rs::ISO_8859_6),
        28597 => Some(encoding_rs::ISO_8859_7),
        28598 => Some(encoding_rs::ISO_8859_8),
        28603 => Some(encoding_rs::ISO_8859_13),
        28605 => Some(encoding_rs::ISO_8859_15),
        54936 => Some(encoding_rs::GB18030),
        65001 => Some(encoding_rs::UTF_8),
        _ => None,
    }
}

/// View of `bytes` up to the first NUL, or the whole slice if none.
///
/// Property-set strings carry a declared length that includes the terminator
/// and often padding, so decoding always trims at the first NUL.
#[inline]
pub fn strip_null_terminators(bytes: &[u8]) -> &[u8] {
    match memchr(0, bytes) {
        Some(end) => &bytes[..end],
        None => bytes,
    }
}

/// Decode a NUL-terminated byte run with the given codepage.
///
/// Returns `None` when no codepage is given or the identifier is not in the
/// supported table; callers fall back to lossy UTF-8 or raw bytes as suits
/// their format.
///
/// ```
/// use longan::common::encoding::decode_bytes;
///
/// // Cyrillic text in windows-1251.
/// assert_eq!(
///     decode_bytes(&[0xC4, 0xE0, 0x00], Some(1251)),
///     Some("\u{414}\u{430}".to_string()),
/// );
/// assert_eq!(decode_bytes(b"plain", None), None);
/// ```
pub fn decode_bytes(bytes: &[u8], codepage: Option<u32>) -> Option<String> {
    let encoding = codepage_to_encoding(codepage?)?;
    let trimmed = strip_null_terminators(bytes);
    if trimmed.is_empty() {
        return Some(String::new());
    }
    let (text, _, _) = encoding.decode(trimmed);
    Some(text.into_owned())
}

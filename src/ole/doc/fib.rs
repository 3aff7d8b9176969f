//! File Information Block (FIB) parser.
//!
//! The FIB sits at offset 0 of the WordDocument stream and anchors the
//! whole file: which table stream holds the auxiliary structures, where
//! the piece table and style sheet live, and whether the document is
//! encrypted.

use bitflags::bitflags;
use bytes::Bytes;

use super::package::{DocError, Result};
use crate::common::binary::{read_u16_le, read_u32_le};

/// Minimum FIB size in bytes (the fixed FibBase structure)
const FIB_BASE_SIZE: usize = 32;

/// Start of the FibRgFcLcb (offset, length) pair array for Word 97+.
const FC_LCB_BASE: usize = 154;

/// Index of the style sheet pointer (fcStshf/lcbStshf).
const FC_LCB_STSHF: usize = 1;

/// Index of the piece table pointer (fcClx/lcbClx).
const FC_LCB_CLX: usize = 33;

/// Index of the font table pointer (fcSttbfFfn/lcbSttbfFfn).
const FC_LCB_STTBF_FFN: usize = 15;

/// Index of the character formatting bin table (fcPlcfBteChpx).
const FC_LCB_PLCF_BTE_CHPX: usize = 12;

bitflags! {
    /// Single-bit flags from the FibBase flags word at offset 0x0A.
    ///
    /// Bits 4-7 hold the quick-save counter and are not part of this
    /// set; see [`Fib::quick_saves`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct FibFlags: u16 {
        /// Document is a template
        const DOT = 0x0001;
        /// Document contains only autotext entries
        const GLOSSARY = 0x0002;
        /// Document was fast-saved (piece table is non-trivial)
        const COMPLEX = 0x0004;
        /// Document has pictures
        const HAS_PICTURES = 0x0008;
        /// Document is encrypted
        const ENCRYPTED = 0x0100;
        /// Auxiliary structures live in "1Table" rather than "0Table"
        const WHICH_TABLE_STREAM = 0x0200;
        /// Author recommends read-only opening
        const READ_ONLY_RECOMMENDED = 0x0400;
        /// Document has a write reservation password
        const WRITE_RESERVATION = 0x0800;
        /// Text uses extended character encoding
        const EXT_CHAR = 0x1000;
        /// Override language information
        const LOAD_OVERRIDE = 0x2000;
        /// Document was last saved by a Far East version of Word
        const FAR_EAST = 0x4000;
        /// Encryption is XOR obfuscation rather than a real cipher
        const OBFUSCATED = 0x8000;
    }
}

/// File Information Block.
///
/// # Structure
///
/// - Bytes 0-1: wIdent (magic, 0xA5EC for Word 97+, 0xA5DC for Word 6/95)
/// - Bytes 2-3: nFib (format version)
/// - Bytes 6-7: lid (language ID)
/// - Bytes 10-11: flags (see [`FibFlags`])
/// - Bytes 24-27 / 28-31: fcMin / fcMac (legacy text range)
/// - Bytes 154+: FibRgFcLcb, pairs of (offset, length) into the table stream
#[derive(Debug, Clone)]
pub struct Fib {
    version: u16,
    lid: u16,
    flags: FibFlags,
    quick_saves: u8,
    /// Complete FIB bytes, kept for the variable-length pointer array
    data: Bytes,
}

impl Fib {
    /// Parse the FIB from the front of the WordDocument stream.
    pub fn parse(word_stream: &Bytes) -> Result<Self> {
        if word_stream.len() < FIB_BASE_SIZE {
            return Err(DocError::Corrupted(
                "WordDocument stream too short for FIB".to_string(),
            ));
        }

        let magic = read_u16_le(word_stream, 0).unwrap_or(0);
        if magic != 0xA5EC && magic != 0xA5DC {
            return Err(DocError::InvalidFormat(format!(
                "Invalid FIB magic number: 0x{:04X}",
                magic
            )));
        }

        let version = read_u16_le(word_stream, 2).unwrap_or(0);
        let lid = read_u16_le(word_stream, 6).unwrap_or(0);
        let raw_flags = read_u16_le(word_stream, 10).unwrap_or(0);

        Ok(Self {
            version,
            lid,
            flags: FibFlags::from_bits_truncate(raw_flags),
            quick_saves: ((raw_flags >> 4) & 0x0F) as u8,
            data: word_stream.clone(),
        })
    }

    /// File format version (nFib). 0x00C1 is Word 97 through 2003.
    #[inline]
    pub fn version(&self) -> u16 {
        self.version
    }

    /// Language ID of the saving installation.
    #[inline]
    pub fn language_id(&self) -> u16 {
        self.lid
    }

    #[inline]
    pub fn flags(&self) -> FibFlags {
        self.flags
    }

    /// Number of consecutive fast saves, 0-15.
    #[inline]
    pub fn quick_saves(&self) -> u8 {
        self.quick_saves
    }

    #[inline]
    pub fn is_encrypted(&self) -> bool {
        self.flags.contains(FibFlags::ENCRYPTED)
    }

    /// Name of the table stream the FIB points at.
    #[inline]
    pub fn table_stream_name(&self) -> &'static str {
        if self.flags.contains(FibFlags::WHICH_TABLE_STREAM) {
            "1Table"
        } else {
            "0Table"
        }
    }

    /// An (offset, length) pair from the FibRgFcLcb array, addressing a
    /// structure in the table stream.
    pub fn table_pointer(&self, index: usize) -> Option<(u32, u32)> {
        let entry_offset = FC_LCB_BASE + index * 8;
        let offset = read_u32_le(&self.data, entry_offset).ok()?;
        let length = read_u32_le(&self.data, entry_offset + 4).ok()?;
        Some((offset, length))
    }

    /// Piece table (CLX) location in the table stream.
    #[inline]
    pub fn clx_pointer(&self) -> Option<(u32, u32)> {
        self.table_pointer(FC_LCB_CLX)
    }

    /// Style sheet (STSH) location in the table stream.
    #[inline]
    pub fn stylesheet_pointer(&self) -> Option<(u32, u32)> {
        self.table_pointer(FC_LCB_STSHF)
    }

    /// Font table (SttbfFfn) location in the table stream.
    #[inline]
    pub fn font_table_pointer(&self) -> Option<(u32, u32)> {
        self.table_pointer(FC_LCB_STTBF_FFN)
    }

    /// Character formatting bin table (PlcfBteChpx) location in the
    /// table stream.
    #[inline]
    pub fn char_bin_table_pointer(&self) -> Option<(u32, u32)> {
        self.table_pointer(FC_LCB_PLCF_BTE_CHPX)
    }

    /// Legacy text range (fcMin, fcMac) from the FibBase, used when no
    /// piece table exists.
    pub fn legacy_text_range(&self) -> Option<(u32, u32)> {
        let fc_min = read_u32_le(&self.data, 24).ok()?;
        let fc_mac = read_u32_le(&self.data, 28).ok()?;
        (fc_min < fc_mac).then_some((fc_min, fc_mac))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_fib(len: usize) -> Vec<u8> {
        let mut data = vec![0u8; len];
        data[0] = 0xEC;
        data[1] = 0xA5;
        data[2] = 0xC1; // nFib Word 97
        data
    }

    #[test]
    fn test_fib_too_short() {
        assert!(Fib::parse(&Bytes::from(vec![0u8; 16])).is_err());
    }

    #[test]
    fn test_fib_magic_validation() {
        let mut data = base_fib(512);
        data[0] = 0xFF;
        data[1] = 0xFF;
        assert!(matches!(
            Fib::parse(&Bytes::from(data)),
            Err(DocError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_fib_flags_and_quick_saves() {
        let mut data = base_fib(512);
        // fComplex + fWhichTblStm + cQuickSaves=5
        let flags: u16 = 0x0004 | 0x0200 | (5 << 4);
        data[10..12].copy_from_slice(&flags.to_le_bytes());

        let fib = Fib::parse(&Bytes::from(data)).unwrap();
        assert!(fib.flags().contains(FibFlags::COMPLEX));
        assert_eq!(fib.table_stream_name(), "1Table");
        assert_eq!(fib.quick_saves(), 5);
        assert!(!fib.is_encrypted());
    }

    #[test]
    fn test_fib_default_table_stream() {
        let fib = Fib::parse(&Bytes::from(base_fib(512))).unwrap();
        assert_eq!(fib.table_stream_name(), "0Table");
    }

    #[test]
    fn test_fib_table_pointer() {
        let mut data = base_fib(512);
        // CLX pointer at pair index 33
        let entry = 154 + 33 * 8;
        data[entry..entry + 4].copy_from_slice(&0x100u32.to_le_bytes());
        data[entry + 4..entry + 8].copy_from_slice(&0x40u32.to_le_bytes());

        let fib = Fib::parse(&Bytes::from(data)).unwrap();
        assert_eq!(fib.clx_pointer(), Some((0x100, 0x40)));
    }

    #[test]
    fn test_fib_pointer_out_of_bounds() {
        let fib = Fib::parse(&Bytes::from(base_fib(64))).unwrap();
        assert_eq!(fib.clx_pointer(), None);
    }

    #[test]
    fn test_legacy_text_range() {
        let mut data = base_fib(512);
        data[24..28].copy_from_slice(&0x400u32.to_le_bytes());
        data[28..32].copy_from_slice(&0x500u32.to_le_bytes());
        let fib = Fib::parse(&Bytes::from(data)).unwrap();
        assert_eq!(fib.legacy_text_range(), Some((0x400, 0x500)));
    }
}

use crate::common::binary::{BinaryResult, read_u16_le, read_u32_le};

/// Size of the record header in bytes.
pub const RECORD_HEADER_SIZE: usize = 8;

/// An 8-byte record header shared by the PowerPoint and Office Drawing
/// binary formats.
///
/// # Format
///
/// - Bytes 0-1: Version (low 4 bits) and Instance (high 12 bits), packed
/// - Bytes 2-3: Record type code
/// - Bytes 4-7: Declared payload length (excluding the header)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    /// Record type code
    pub code: u16,
    /// Version field (4 bits)
    pub version: u8,
    /// Instance field (12 bits)
    pub instance: u16,
    /// Declared payload length in bytes
    pub length: u32,
}

impl RecordHeader {
    /// Parse a record header at the given offset.
    pub fn parse(data: &[u8], offset: usize) -> BinaryResult<Self> {
        let ver_inst = read_u16_le(data, offset)?;
        let code = read_u16_le(data, offset + 2)?;
        let length = read_u32_le(data, offset + 4)?;

        Ok(Self {
            code,
            version: (ver_inst & 0x000F) as u8,
            instance: (ver_inst >> 4) & 0x0FFF,
            length,
        })
    }

    /// Whether the version field carries the conventional container
    /// marker (0xF). Classification goes through the registry; this is
    /// only a diagnostic hint for unregistered codes.
    #[inline]
    pub const fn has_container_version(&self) -> bool {
        self.version == 0x0F
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_header_fields() {
        // version=0xF, instance=0x123, code=0xF004, length=16
        let ver_inst: u16 = (0x123 << 4) | 0x000F;
        let mut data = ver_inst.to_le_bytes().to_vec();
        data.extend_from_slice(&0xF004u16.to_le_bytes());
        data.extend_from_slice(&16u32.to_le_bytes());

        let header = RecordHeader::parse(&data, 0).unwrap();
        assert_eq!(header.version, 0x0F);
        assert_eq!(header.instance, 0x123);
        assert_eq!(header.code, 0xF004);
        assert_eq!(header.length, 16);
        assert!(header.has_container_version());
    }

    #[test]
    fn test_parse_header_atom_version() {
        let data = [0x02, 0x00, 0x0A, 0xF0, 0x04, 0x00, 0x00, 0x00];
        let header = RecordHeader::parse(&data, 0).unwrap();
        assert_eq!(header.version, 2);
        assert_eq!(header.instance, 0);
        assert_eq!(header.code, 0xF00A);
        assert_eq!(header.length, 4);
        assert!(!header.has_container_version());
    }

    #[test]
    fn test_parse_header_short_input() {
        assert!(RecordHeader::parse(&[0u8; 7], 0).is_err());
        assert!(RecordHeader::parse(&[0u8; 16], 9).is_err());
    }
}

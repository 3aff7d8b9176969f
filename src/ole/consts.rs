//! Constants shared by the compound file reader and the property-set parser.
//!
//! Sector and directory sentinels follow the Microsoft OLE2 specification;
//! the `VT_*` codes are the subset of property types that legacy Office
//! writes into SummaryInformation streams.

/// Signature bytes at offset 0 of every compound file.
pub const MAGIC: &[u8; 8] = b"\xD0\xCF\x11\xE0\xA1\xB1\x1A\xE1";

/// Size of the compound file header block.
pub const HEADER_SIZE: usize = 512;

/// Smallest well-formed container: header, one FAT sector, one directory sector.
pub const MINIMAL_OLEFILE_SIZE: usize = 1536;

/// Sector size implied by major version 3.
pub const SECTOR_SIZE_V3: usize = 512;

/// Sector size implied by major version 4.
pub const SECTOR_SIZE_V4: usize = 4096;

/// Bytes per directory entry.
pub const DIRENTRY_SIZE: usize = 128;

// FAT sentinels. Values below FATSECT are ordinary sector numbers.

/// Sector holds FAT entries.
pub const FATSECT: u32 = 0xFFFF_FFFD;

/// Terminates a sector chain.
pub const ENDOFCHAIN: u32 = 0xFFFF_FFFE;

/// Sector is unallocated.
pub const FREESECT: u32 = 0xFFFF_FFFF;

/// Absent sibling or child link in a directory entry.
pub const NOSTREAM: u32 = 0xFFFF_FFFF;

// Directory entry object types.

/// Storage entry, the container analogue of a folder.
pub const STGTY_STORAGE: u8 = 1;

/// Stream entry carrying byte content.
pub const STGTY_STREAM: u8 = 2;

/// Root storage entry, always at SID 0.
pub const STGTY_ROOT: u8 = 5;

// Property value types found in SummaryInformation property sets.

pub const VT_EMPTY: u16 = 0;
pub const VT_NULL: u16 = 1;
pub const VT_I2: u16 = 2;
pub const VT_I4: u16 = 3;
pub const VT_BSTR: u16 = 8;
pub const VT_ERROR: u16 = 10;
pub const VT_BOOL: u16 = 11;
pub const VT_UI2: u16 = 18;
pub const VT_UI4: u16 = 19;
pub const VT_INT: u16 = 22;
pub const VT_UINT: u16 = 23;
pub const VT_LPSTR: u16 = 30;
pub const VT_LPWSTR: u16 = 31;
pub const VT_FILETIME: u16 = 64;
pub const VT_BLOB: u16 = 65;

//! Compound file binary format (OLE2 structured storage) reader.
//!
//! A compound file is a miniature filesystem: a fixed header, a sector
//! allocation table (FAT), a directory of named entries arranged as a
//! red-black tree, and a MiniFAT for streams below the cutoff size. Opening
//! a file loads the header, FAT and directory eagerly; stream bodies are
//! read on demand by chasing the chain that owns them.

use std::io::{self, Read, Seek, SeekFrom};

use tracing::{debug, warn};
use zerocopy::{FromBytes, LE, U16, U32, U64};
use zerocopy_derive::FromBytes as DeriveFromBytes;

use super::consts::*;
use crate::common::binary::{BinaryError, parse_utf16le_string, read_u32_le};

/// On-disk header block, 512 bytes at offset 0.
///
/// Field layout follows the Microsoft OLE2 specification. The first 109
/// FAT sector numbers are embedded directly in the header; larger files
/// continue the list in DIFAT sectors.
#[derive(DeriveFromBytes)]
#[repr(C)]
struct RawHeader {
    magic: [u8; 8],
    _clsid: [u8; 16],
    _minor_version: U16<LE>,
    major_version: U16<LE>,
    byte_order: U16<LE>,
    sector_shift: U16<LE>,
    mini_sector_shift: U16<LE>,
    _reserved: [u8; 6],
    _num_dir_sectors: U32<LE>,
    num_fat_sectors: U32<LE>,
    first_dir_sector: U32<LE>,
    _transaction_signature: U32<LE>,
    mini_stream_cutoff: U32<LE>,
    first_minifat_sector: U32<LE>,
    num_minifat_sectors: U32<LE>,
    first_difat_sector: U32<LE>,
    num_difat_sectors: U32<LE>,
    difat: [U32<LE>; 109],
}

/// On-disk directory entry, 128 bytes.
#[derive(DeriveFromBytes)]
#[repr(C)]
struct RawDirectoryEntry {
    /// UTF-16LE name, NUL-padded.
    name: [u8; 64],
    /// Name length in bytes including the terminator.
    name_len: U16<LE>,
    entry_type: u8,
    _node_color: u8,
    sid_left: U32<LE>,
    sid_right: U32<LE>,
    sid_child: U32<LE>,
    clsid: [u8; 16],
    _state_bits: U32<LE>,
    _creation_time: U64<LE>,
    _modified_time: U64<LE>,
    start_sector: U32<LE>,
    stream_size: U64<LE>,
}

/// A parsed compound file over any seekable byte source.
#[derive(Debug)]
pub struct OleFile<R: Read + Seek> {
    reader: R,
    file_size: u64,
    /// 512 for version 3, 4096 for version 4.
    sector_size: usize,
    mini_sector_size: usize,
    /// Streams strictly below this size live in the ministream.
    mini_stream_cutoff: u32,
    fat: Vec<u32>,
    minifat: Vec<u32>,
    /// Entries indexed by SID; unreachable slots stay `None`.
    directory: Vec<Option<DirectoryEntry>>,
    root: Option<DirectoryEntry>,
    /// Backing bytes for mini streams, loaded on first use.
    ministream: Option<Vec<u8>>,
}

/// A named stream or storage inside the container.
#[derive(Debug, Clone)]
pub struct DirectoryEntry {
    /// Index of this entry in the directory.
    pub sid: u32,
    pub name: String,
    /// One of the `STGTY_*` object types.
    pub entry_type: u8,
    pub sid_left: u32,
    pub sid_right: u32,
    pub sid_child: u32,
    /// CLSID in registry form, empty when all zero.
    pub clsid: String,
    pub start_sector: u32,
    pub size: u64,
    /// Whether the content lives in the ministream.
    pub is_minifat: bool,
}

/// Container-level failures.
#[derive(Debug)]
pub enum OleError {
    Io(io::Error),
    /// The header contradicts the format rules.
    InvalidFormat(String),
    /// A field inside a structure could not be decoded.
    InvalidData(String),
    /// The signature bytes are missing.
    NotOleFile,
    /// The allocation tables or directory are damaged.
    CorruptedFile(String),
    StreamNotFound,
}

impl From<io::Error> for OleError {
    fn from(err: io::Error) -> Self {
        OleError::Io(err)
    }
}

impl From<BinaryError> for OleError {
    fn from(err: BinaryError) -> Self {
        OleError::InvalidData(err.to_string())
    }
}

impl std::fmt::Display for OleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OleError::Io(e) => write!(f, "i/o error: {e}"),
            OleError::InvalidFormat(s) => write!(f, "invalid format: {s}"),
            OleError::InvalidData(s) => write!(f, "invalid data: {s}"),
            OleError::NotOleFile => write!(f, "not an OLE compound file"),
            OleError::CorruptedFile(s) => write!(f, "corrupted container: {s}"),
            OleError::StreamNotFound => write!(f, "stream not found"),
        }
    }
}

impl std::error::Error for OleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            OleError::Io(e) => Some(e),
            _ => None,
        }
    }
}

/// Iterate the 32-bit sector numbers packed into a block.
fn sector_links(block: &[u8]) -> impl Iterator<Item = u32> + '_ {
    block
        .chunks_exact(4)
        .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
}

impl<R: Read + Seek> OleFile<R> {
    /// Parse the container structure from a seekable reader.
    ///
    /// Validates the signature, byte order and version, then loads the FAT,
    /// the directory tree and the MiniFAT. Damaged subtrees are skipped with
    /// a warning; a missing root directory is fatal.
    pub fn open(mut reader: R) -> Result<Self, OleError> {
        let file_size = reader.seek(SeekFrom::End(0))?;
        if file_size < MINIMAL_OLEFILE_SIZE as u64 {
            return Err(OleError::NotOleFile);
        }

        reader.seek(SeekFrom::Start(0))?;
        let mut block = [0u8; HEADER_SIZE];
        reader.read_exact(&mut block)?;
        let raw = RawHeader::read_from_bytes(&block)
            .map_err(|_| OleError::InvalidFormat("short header".to_string()))?;

        if raw.magic != *MAGIC {
            return Err(OleError::NotOleFile);
        }
        if raw.byte_order.get() != 0xFFFE {
            return Err(OleError::InvalidFormat(
                "unexpected byte-order mark".to_string(),
            ));
        }

        let sector_size = match raw.major_version.get() {
            3 => SECTOR_SIZE_V3,
            4 => SECTOR_SIZE_V4,
            other => {
                return Err(OleError::InvalidFormat(format!(
                    "unsupported major version {other}"
                )));
            }
        };
        if 1usize << raw.sector_shift.get().min(16) != sector_size {
            return Err(OleError::InvalidFormat(
                "sector shift disagrees with version".to_string(),
            ));
        }
        let mini_sector_size = 1usize << raw.mini_sector_shift.get().min(15);

        let mut file = OleFile {
            reader,
            file_size,
            sector_size,
            mini_sector_size,
            mini_stream_cutoff: raw.mini_stream_cutoff.get(),
            fat: Vec::new(),
            minifat: Vec::new(),
            directory: Vec::new(),
            root: None,
            ministream: None,
        };

        file.load_fat(&raw)?;
        file.load_directory(raw.first_dir_sector.get())?;
        if raw.num_minifat_sectors.get() > 0 {
            file.load_minifat(raw.first_minifat_sector.get())?;
        }

        debug!(
            size = file.file_size,
            sector_size = file.sector_size,
            entries = file.directory.len(),
            "opened compound file"
        );
        Ok(file)
    }

    /// Total length of the underlying byte source.
    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    /// Collect the FAT from the header DIFAT and any chained DIFAT sectors,
    /// then read every FAT sector into one table.
    fn load_fat(&mut self, raw: &RawHeader) -> Result<(), OleError> {
        let mut fat_sectors: Vec<u32> = raw
            .difat
            .iter()
            .map(|s| s.get())
            .take_while(|&s| s != FREESECT && s != ENDOFCHAIN)
            .collect();

        // The last slot of each DIFAT sector links to the next one.
        let link_offset = self.sector_size - 4;
        let mut next = raw.first_difat_sector.get();
        for _ in 0..raw.num_difat_sectors.get() {
            if next == ENDOFCHAIN || next == FREESECT {
                break;
            }
            let block = self.read_sector(next)?;
            for sector in sector_links(&block[..link_offset]) {
                if sector == FREESECT || sector == ENDOFCHAIN {
                    break;
                }
                fat_sectors.push(sector);
            }
            next = read_u32_le(&block, link_offset)?;
        }

        if fat_sectors.len() != raw.num_fat_sectors.get() as usize {
            warn!(
                declared = raw.num_fat_sectors.get(),
                found = fat_sectors.len(),
                "FAT sector count disagrees with the header"
            );
        }

        self.fat.reserve(fat_sectors.len() * (self.sector_size / 4));
        for &sid in &fat_sectors {
            let block = self.read_sector(sid)?;
            let entries: Vec<u32> = sector_links(&block).collect();
            self.fat.extend(entries);
        }
        Ok(())
    }

    fn load_minifat(&mut self, first_sector: u32) -> Result<(), OleError> {
        let table = self.read_chain(first_sector)?;
        self.minifat = sector_links(&table).collect();
        Ok(())
    }

    /// Read the directory stream and adopt every entry reachable from the
    /// root. SID 0 must hold the root storage.
    fn load_directory(&mut self, first_sector: u32) -> Result<(), OleError> {
        let dir_data = self.read_chain(first_sector)?;
        let count = dir_data.len() / DIRENTRY_SIZE;
        if count == 0 {
            return Err(OleError::CorruptedFile("empty directory".to_string()));
        }

        let root = self.parse_entry(&dir_data[..DIRENTRY_SIZE], 0)?;
        if root.entry_type != STGTY_ROOT {
            return Err(OleError::CorruptedFile(
                "first directory entry is not the root storage".to_string(),
            ));
        }

        self.directory = vec![None; count];
        let first_child = root.sid_child;
        self.root = Some(root);
        self.adopt_subtree(first_child, &dir_data);
        Ok(())
    }

    /// Walk sibling and child links from `first`, parsing each entry once.
    ///
    /// Out-of-range links and unparseable entries drop their subtree with a
    /// warning instead of failing the whole directory. The visited check
    /// doubles as the cycle guard.
    fn adopt_subtree(&mut self, first: u32, dir_data: &[u8]) {
        let capacity = self.directory.len();
        let mut pending = vec![first];
        while let Some(sid) = pending.pop() {
            if sid == NOSTREAM {
                continue;
            }
            let index = sid as usize;
            if index >= capacity {
                warn!(sid, "directory link out of range, skipping subtree");
                continue;
            }
            if self.directory[index].is_some() {
                continue;
            }
            let offset = index * DIRENTRY_SIZE;
            let entry = match self.parse_entry(&dir_data[offset..offset + DIRENTRY_SIZE], sid) {
                Ok(entry) => entry,
                Err(error) => {
                    warn!(sid, %error, "unreadable directory entry, skipping subtree");
                    continue;
                }
            };
            pending.push(entry.sid_left);
            pending.push(entry.sid_right);
            pending.push(entry.sid_child);
            self.directory[index] = Some(entry);
        }
    }

    fn parse_entry(&self, data: &[u8], sid: u32) -> Result<DirectoryEntry, OleError> {
        let raw = RawDirectoryEntry::read_from_bytes(data)
            .map_err(|_| OleError::InvalidFormat("directory entry too short".to_string()))?;

        // name_len counts bytes including the NUL terminator.
        let name_len = (raw.name_len.get() as usize)
            .saturating_sub(2)
            .min(raw.name.len());
        let name = parse_utf16le_string(&raw.name[..name_len]);

        // Version 3 writers may leave garbage in the high half of the size.
        let size = if self.sector_size == SECTOR_SIZE_V3 {
            raw.stream_size.get() & 0xFFFF_FFFF
        } else {
            raw.stream_size.get()
        };
        let in_ministream =
            raw.entry_type == STGTY_STREAM && size < u64::from(self.mini_stream_cutoff);

        Ok(DirectoryEntry {
            sid,
            name,
            entry_type: raw.entry_type,
            sid_left: raw.sid_left.get(),
            sid_right: raw.sid_right.get(),
            sid_child: raw.sid_child.get(),
            clsid: format_clsid(&raw.clsid),
            start_sector: raw.start_sector.get(),
            size,
            is_minifat: in_ministream,
        })
    }

    fn read_sector(&mut self, sector: u32) -> Result<Vec<u8>, OleError> {
        // Sector 0 starts right after the header.
        let position = (u64::from(sector) + 1) * self.sector_size as u64;
        self.reader.seek(SeekFrom::Start(position))?;
        let mut block = vec![0u8; self.sector_size];
        self.reader.read_exact(&mut block)?;
        Ok(block)
    }

    /// Concatenate a FAT chain starting at `start`.
    fn read_chain(&mut self, start: u32) -> Result<Vec<u8>, OleError> {
        let mut data = Vec::new();
        let mut sector = start;
        let mut hops = 0usize;
        while sector != ENDOFCHAIN {
            if sector as usize >= self.fat.len() {
                return Err(OleError::CorruptedFile(format!(
                    "sector {sector} outside the FAT"
                )));
            }
            hops += 1;
            if hops > self.fat.len() {
                return Err(OleError::CorruptedFile("cycle in FAT chain".to_string()));
            }
            let block = self.read_sector(sector)?;
            data.extend_from_slice(&block);
            sector = self.fat[sector as usize];
        }
        Ok(data)
    }

    /// Concatenate a MiniFAT chain and trim it to the declared size.
    fn read_mini_chain(&mut self, start: u32, size: u64) -> Result<Vec<u8>, OleError> {
        self.ensure_ministream()?;
        let Some(ministream) = self.ministream.as_ref() else {
            return Err(OleError::CorruptedFile("ministream unavailable".to_string()));
        };

        let mut data = Vec::new();
        let mut sector = start;
        let mut hops = 0usize;
        while sector != ENDOFCHAIN {
            if sector as usize >= self.minifat.len() {
                return Err(OleError::CorruptedFile(format!(
                    "mini sector {sector} outside the MiniFAT"
                )));
            }
            hops += 1;
            if hops > self.minifat.len() {
                return Err(OleError::CorruptedFile(
                    "cycle in MiniFAT chain".to_string(),
                ));
            }
            let offset = sector as usize * self.mini_sector_size;
            let Some(block) = ministream.get(offset..offset + self.mini_sector_size) else {
                return Err(OleError::CorruptedFile(
                    "mini sector past the end of the ministream".to_string(),
                ));
            };
            data.extend_from_slice(block);
            sector = self.minifat[sector as usize];
        }
        data.truncate(size as usize);
        Ok(data)
    }

    /// The ministream is the root entry's own stream, read through the FAT.
    fn ensure_ministream(&mut self) -> Result<(), OleError> {
        if self.ministream.is_some() {
            return Ok(());
        }
        let Some(root) = self.root.as_ref() else {
            return Err(OleError::CorruptedFile(
                "no root entry for the ministream".to_string(),
            ));
        };
        let start = root.start_sector;
        let data = self.read_chain(start)?;
        self.ministream = Some(data);
        Ok(())
    }

    /// Paths of every stream, in directory tree order.
    pub fn list_streams(&self) -> Vec<Vec<String>> {
        let mut found = Vec::new();
        if let Some(root) = self.root.as_ref() {
            let mut budget = self.directory.len();
            self.walk_streams(root.sid_child, &[], &mut found, &mut budget);
        }
        found
    }

    /// In-order traversal of one sibling tree, descending into storages.
    ///
    /// `budget` caps the total number of visits at the directory size so a
    /// link cycle that survived adoption cannot recurse forever.
    fn walk_streams(
        &self,
        sid: u32,
        prefix: &[String],
        found: &mut Vec<Vec<String>>,
        budget: &mut usize,
    ) {
        let Some(entry) = self.entry(sid) else {
            return;
        };
        if *budget == 0 {
            warn!("directory traversal budget exhausted, tree may be cyclic");
            return;
        }
        *budget -= 1;

        self.walk_streams(entry.sid_left, prefix, found, budget);
        let mut path = prefix.to_owned();
        path.push(entry.name.clone());
        match entry.entry_type {
            STGTY_STREAM => found.push(path),
            STGTY_STORAGE => self.walk_streams(entry.sid_child, &path, found, budget),
            _ => {}
        }
        self.walk_streams(entry.sid_right, prefix, found, budget);
    }

    /// Read a stream's bytes by its path of storage names.
    ///
    /// Names match exactly (case- and form-sensitive); callers that need to
    /// probe historical aliases do so explicitly, e.g. "Workbook" then
    /// "Book" for Excel.
    pub fn open_stream(&mut self, path: &[&str]) -> Result<Vec<u8>, OleError> {
        let (entry_type, in_ministream, start, size) = {
            let entry = self.find_entry(path)?;
            (
                entry.entry_type,
                entry.is_minifat,
                entry.start_sector,
                entry.size,
            )
        };
        if entry_type != STGTY_STREAM {
            return Err(OleError::InvalidFormat("not a stream".to_string()));
        }
        if in_ministream {
            self.read_mini_chain(start, size)
        } else {
            let mut data = self.read_chain(start)?;
            data.truncate(size as usize);
            Ok(data)
        }
    }

    /// Whether a stream or storage exists at `path`.
    pub fn exists(&self, path: &[&str]) -> bool {
        self.find_entry(path).is_ok()
    }

    /// Name of the root storage, e.g. "Root Entry".
    pub fn root_name(&self) -> Option<&str> {
        self.root.as_ref().map(|root| root.name.as_str())
    }

    /// Resolve a path component by component; an empty path is the root.
    fn find_entry(&self, path: &[&str]) -> Result<&DirectoryEntry, OleError> {
        let root = self.root.as_ref().ok_or(OleError::StreamNotFound)?;
        let mut cursor = root.sid_child;
        let mut found = None;
        for &component in path {
            let entry = self
                .locate(cursor, component)
                .ok_or(OleError::StreamNotFound)?;
            cursor = entry.sid_child;
            found = Some(entry);
        }
        Ok(found.unwrap_or(root))
    }

    /// Search one sibling tree for `name`.
    ///
    /// The whole tree is scanned rather than trusting the red-black
    /// ordering, which real-world writers do not always respect.
    fn locate(&self, first: u32, name: &str) -> Option<&DirectoryEntry> {
        let mut pending = vec![first];
        let mut budget = self.directory.len();
        while let Some(sid) = pending.pop() {
            let Some(entry) = self.entry(sid) else {
                continue;
            };
            if budget == 0 {
                warn!(name, "sibling search budget exhausted, directory may be cyclic");
                return None;
            }
            budget -= 1;
            if entry.name == name {
                return Some(entry);
            }
            pending.push(entry.sid_left);
            pending.push(entry.sid_right);
        }
        None
    }

    fn entry(&self, sid: u32) -> Option<&DirectoryEntry> {
        if sid == NOSTREAM {
            return None;
        }
        self.directory.get(sid as usize)?.as_ref()
    }
}

/// Render a CLSID in registry form, or empty for the null CLSID.
fn format_clsid(bytes: &[u8; 16]) -> String {
    if bytes.iter().all(|&b| b == 0) {
        return String::new();
    }
    let d1 = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    let d2 = u16::from_le_bytes([bytes[4], bytes[5]]);
    let d3 = u16::from_le_bytes([bytes[6], bytes[7]]);
    format!(
        "{d1:08X}-{d2:04X}-{d3:04X}-{:02X}{:02X}-{:02X}{:02X}{:02X}{:02X}{:02X}{:02X}",
        bytes[8], bytes[9], bytes[10], bytes[11], bytes[12], bytes[13], bytes[14], bytes[15],
    )
}

/// Cheap signature probe for format sniffing.
pub fn is_ole_file(data: &[u8]) -> bool {
    data.len() >= MINIMAL_OLEFILE_SIZE && data[..8] == *MAGIC
}

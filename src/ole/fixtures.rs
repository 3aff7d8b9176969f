//! In-memory compound file builder for tests.
//!
//! Produces minimal but structurally valid OLE2 containers (512-byte
//! sectors, FAT plus ministream) so that reader and extractor tests can
//! run without binary test files on disk. Streams below the mini stream
//! cutoff land in the ministream, larger ones in regular FAT sectors,
//! which matches what real writers produce.

use super::consts::{DIRENTRY_SIZE, ENDOFCHAIN, FATSECT, FREESECT, MAGIC, NOSTREAM};
use super::consts::{STGTY_ROOT, STGTY_STREAM};

const SECTOR: usize = 512;
const MINI_SECTOR: usize = 64;
const MINI_CUTOFF: usize = 4096;

/// Install the diagnostic subscriber for a test run.
///
/// Parsers report recoverable damage through `tracing` events rather
/// than errors, so tests exercising degraded inputs call this to make
/// those events visible under `RUST_LOG`. Repeat calls are no-ops.
pub fn init_tracing() {
    use tracing_subscriber::prelude::*;

    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_test_writer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// Builder for an in-memory OLE2 compound file with root-level streams.
pub struct CompoundFileBuilder {
    streams: Vec<(String, Vec<u8>)>,
}

impl CompoundFileBuilder {
    pub fn new() -> Self {
        Self {
            streams: Vec::new(),
        }
    }

    /// Add a root-level stream. Names are limited to 31 UTF-16 code units
    /// per the directory entry layout.
    pub fn stream(mut self, name: &str, data: &[u8]) -> Self {
        assert!(
            name.encode_utf16().count() <= 31,
            "stream name too long for a directory entry"
        );
        self.streams.push((name.to_string(), data.to_vec()));
        self
    }

    /// Assemble the compound file bytes.
    pub fn build(self) -> Vec<u8> {
        // Ministream assembly: small streams are packed into 64-byte mini
        // sectors, chained through the MiniFAT.
        let mut ministream: Vec<u8> = Vec::new();
        let mut minifat: Vec<u32> = Vec::new();
        // Per stream: start sector (mini index or, later, FAT sector) and
        // whether it lives in the ministream.
        let mut placement: Vec<(u32, bool)> = Vec::with_capacity(self.streams.len());

        for (_, data) in &self.streams {
            if data.len() < MINI_CUTOFF {
                if data.is_empty() {
                    placement.push((ENDOFCHAIN, true));
                    continue;
                }
                let first_mini = (ministream.len() / MINI_SECTOR) as u32;
                let n_minis = data.len().div_ceil(MINI_SECTOR);
                ministream.extend_from_slice(data);
                ministream.resize(ministream.len() + n_minis * MINI_SECTOR - data.len(), 0);
                for i in 0..n_minis {
                    if i + 1 == n_minis {
                        minifat.push(ENDOFCHAIN);
                    } else {
                        minifat.push(first_mini + i as u32 + 1);
                    }
                }
                placement.push((first_mini, true));
            } else {
                // FAT sector assigned after the layout is known
                placement.push((0, false));
            }
        }

        // Sector layout: FAT sectors, directory, MiniFAT, ministream,
        // then each large stream in declaration order.
        let n_entries = 1 + self.streams.len();
        let dir_sectors = (n_entries * DIRENTRY_SIZE).div_ceil(SECTOR);
        let minifat_sectors = if minifat.is_empty() {
            0
        } else {
            (minifat.len() * 4).div_ceil(SECTOR)
        };
        let ministream_sectors = ministream.len().div_ceil(SECTOR);
        let large_sector_counts: Vec<usize> = self
            .streams
            .iter()
            .filter(|(_, data)| data.len() >= MINI_CUTOFF)
            .map(|(_, data)| data.len().div_ceil(SECTOR))
            .collect();
        let data_sectors = dir_sectors
            + minifat_sectors
            + ministream_sectors
            + large_sector_counts.iter().sum::<usize>();

        let mut fat_sectors = 1usize;
        loop {
            let needed = ((fat_sectors + data_sectors) * 4).div_ceil(SECTOR);
            if needed == fat_sectors {
                break;
            }
            fat_sectors = needed;
        }
        assert!(fat_sectors <= 109, "fixture too large for header DIFAT");

        let dir_start = fat_sectors as u32;
        let minifat_start = dir_start + dir_sectors as u32;
        let ministream_start = minifat_start + minifat_sectors as u32;
        let mut next_large = ministream_start + ministream_sectors as u32;

        // Resolve FAT sectors for large streams
        let mut large_iter = large_sector_counts.iter();
        for (slot, (_, data)) in placement.iter_mut().zip(self.streams.iter()) {
            if !slot.1 && data.len() >= MINI_CUTOFF {
                slot.0 = next_large;
                next_large += *large_iter.next().unwrap() as u32;
            }
        }

        // FAT table
        let mut fat = vec![FREESECT; fat_sectors * (SECTOR / 4)];
        for entry in fat.iter_mut().take(fat_sectors) {
            *entry = FATSECT;
        }
        chain(&mut fat, dir_start, dir_sectors);
        chain(&mut fat, minifat_start, minifat_sectors);
        chain(&mut fat, ministream_start, ministream_sectors);
        {
            let mut sector = ministream_start + ministream_sectors as u32;
            for &count in &large_sector_counts {
                chain(&mut fat, sector, count);
                sector += count as u32;
            }
        }

        // Directory stream
        let mut dir = Vec::with_capacity(dir_sectors * SECTOR);
        let root_child = if self.streams.is_empty() {
            NOSTREAM
        } else {
            1
        };
        let root_start = if ministream.is_empty() {
            ENDOFCHAIN
        } else {
            ministream_start
        };
        write_dir_entry(
            &mut dir,
            "Root Entry",
            STGTY_ROOT,
            NOSTREAM,
            NOSTREAM,
            root_child,
            root_start,
            ministream.len() as u64,
        );
        for (i, ((name, data), &(start, _))) in
            self.streams.iter().zip(placement.iter()).enumerate()
        {
            let sid_right = if i + 1 == self.streams.len() {
                NOSTREAM
            } else {
                (i + 2) as u32
            };
            write_dir_entry(
                &mut dir,
                name,
                STGTY_STREAM,
                NOSTREAM,
                sid_right,
                NOSTREAM,
                start,
                data.len() as u64,
            );
        }
        dir.resize(dir_sectors * SECTOR, 0);

        // Header
        let mut header = [0u8; SECTOR];
        header[0..8].copy_from_slice(MAGIC);
        put_u16(&mut header, 0x18, 0x003E); // minor version
        put_u16(&mut header, 0x1A, 3); // DLL version (512-byte sectors)
        put_u16(&mut header, 0x1C, 0xFFFE); // byte order
        put_u16(&mut header, 0x1E, 9); // sector shift
        put_u16(&mut header, 0x20, 6); // mini sector shift
        put_u32(&mut header, 0x2C, fat_sectors as u32);
        put_u32(&mut header, 0x30, dir_start);
        put_u32(&mut header, 0x38, MINI_CUTOFF as u32);
        let (first_minifat, num_minifat) = if minifat_sectors > 0 {
            (minifat_start, minifat_sectors as u32)
        } else {
            (ENDOFCHAIN, 0)
        };
        put_u32(&mut header, 0x3C, first_minifat);
        put_u32(&mut header, 0x40, num_minifat);
        put_u32(&mut header, 0x44, ENDOFCHAIN); // first DIFAT sector
        put_u32(&mut header, 0x48, 0); // DIFAT sector count
        for i in 0..109 {
            let value = if i < fat_sectors {
                i as u32
            } else {
                FREESECT
            };
            put_u32(&mut header, 0x4C + i * 4, value);
        }

        // Assemble: header, FAT, directory, MiniFAT, ministream, large data
        let mut out = Vec::with_capacity(SECTOR * (1 + fat_sectors + data_sectors));
        out.extend_from_slice(&header);
        for entry in &fat {
            out.extend_from_slice(&entry.to_le_bytes());
        }
        out.extend_from_slice(&dir);
        if minifat_sectors > 0 {
            for entry in &minifat {
                out.extend_from_slice(&entry.to_le_bytes());
            }
            out.resize(
                SECTOR + (minifat_start as usize + minifat_sectors) * SECTOR,
                // Unused MiniFAT slots are free
                0xFF,
            );
        }
        out.extend_from_slice(&ministream);
        out.resize(
            SECTOR + (ministream_start as usize + ministream_sectors) * SECTOR,
            0,
        );
        for (_, data) in self.streams.iter().filter(|(_, d)| d.len() >= MINI_CUTOFF) {
            let padded = data.len().div_ceil(SECTOR) * SECTOR;
            out.extend_from_slice(data);
            out.resize(out.len() + padded - data.len(), 0);
        }
        out
    }

    /// Build and wrap in a cursor, ready for `OleFile::open`.
    pub fn build_cursor(self) -> std::io::Cursor<Vec<u8>> {
        std::io::Cursor::new(self.build())
    }
}

impl Default for CompoundFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn chain(fat: &mut [u32], start: u32, count: usize) {
    for i in 0..count {
        let sector = start as usize + i;
        fat[sector] = if i + 1 == count {
            ENDOFCHAIN
        } else {
            start + i as u32 + 1
        };
    }
}

fn put_u16(buf: &mut [u8], offset: usize, value: u16) {
    buf[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
}

fn put_u32(buf: &mut [u8], offset: usize, value: u32) {
    buf[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

#[allow(clippy::too_many_arguments)]
fn write_dir_entry(
    buf: &mut Vec<u8>,
    name: &str,
    entry_type: u8,
    sid_left: u32,
    sid_right: u32,
    sid_child: u32,
    start_sector: u32,
    size: u64,
) {
    let start = buf.len();
    buf.resize(start + DIRENTRY_SIZE, 0);
    let entry = &mut buf[start..start + DIRENTRY_SIZE];

    let units: Vec<u16> = name.encode_utf16().collect();
    for (i, unit) in units.iter().enumerate() {
        entry[i * 2..i * 2 + 2].copy_from_slice(&unit.to_le_bytes());
    }
    put_u16(entry, 64, ((units.len() + 1) * 2) as u16);
    entry[66] = entry_type;
    entry[67] = 1; // black
    put_u32(entry, 68, sid_left);
    put_u32(entry, 72, sid_right);
    put_u32(entry, 76, sid_child);
    put_u32(entry, 116, start_sector);
    entry[120..128].copy_from_slice(&size.to_le_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ole::{OleError, OleFile, is_ole_file};

    #[test]
    fn test_empty_container_opens() {
        let bytes = CompoundFileBuilder::new().build();
        assert!(is_ole_file(&bytes));
        let ole = OleFile::open(std::io::Cursor::new(bytes)).unwrap();
        assert!(ole.list_streams().is_empty());
        assert_eq!(ole.root_name(), Some("Root Entry"));
    }

    #[test]
    fn test_small_stream_round_trips_through_ministream() {
        let cursor = CompoundFileBuilder::new()
            .stream("Data", b"hello world")
            .build_cursor();
        let mut ole = OleFile::open(cursor).unwrap();
        assert_eq!(ole.list_streams(), vec![vec!["Data".to_string()]]);
        assert!(ole.exists(&["Data"]));
        assert_eq!(ole.open_stream(&["Data"]).unwrap(), b"hello world");
    }

    #[test]
    fn test_large_stream_uses_fat_chain() {
        let big: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();
        let cursor = CompoundFileBuilder::new()
            .stream("Big", &big)
            .stream("Tiny", b"x")
            .build_cursor();
        let mut ole = OleFile::open(cursor).unwrap();
        assert_eq!(ole.open_stream(&["Big"]).unwrap(), big);
        assert_eq!(ole.open_stream(&["Tiny"]).unwrap(), b"x");
    }

    #[test]
    fn test_multiple_small_streams() {
        let cursor = CompoundFileBuilder::new()
            .stream("First", b"alpha")
            .stream("Second", b"beta")
            .stream("Third", &[0u8; 200])
            .build_cursor();
        let mut ole = OleFile::open(cursor).unwrap();
        assert_eq!(ole.list_streams().len(), 3);
        assert_eq!(ole.open_stream(&["First"]).unwrap(), b"alpha");
        assert_eq!(ole.open_stream(&["Second"]).unwrap(), b"beta");
        assert_eq!(ole.open_stream(&["Third"]).unwrap().len(), 200);
    }

    #[test]
    fn test_missing_stream_is_not_found() {
        let cursor = CompoundFileBuilder::new()
            .stream("Present", b"data")
            .build_cursor();
        let mut ole = OleFile::open(cursor).unwrap();
        assert!(!ole.exists(&["Absent"]));
        assert!(matches!(
            ole.open_stream(&["Absent"]),
            Err(OleError::StreamNotFound)
        ));
    }

    #[test]
    fn test_stream_names_match_exactly() {
        let cursor = CompoundFileBuilder::new()
            .stream("Workbook", b"data")
            .build_cursor();
        let mut ole = OleFile::open(cursor).unwrap();
        assert!(ole.open_stream(&["workbook"]).is_err());
        assert!(ole.open_stream(&["Workbook"]).is_ok());
    }

    #[test]
    fn test_bad_magic_is_rejected() {
        let mut bytes = CompoundFileBuilder::new().stream("Data", b"x").build();
        bytes[0] = 0x00;
        assert!(matches!(
            OleFile::open(std::io::Cursor::new(bytes)),
            Err(OleError::NotOleFile)
        ));
    }

    #[test]
    fn test_truncated_input_is_rejected() {
        let bytes = vec![0u8; 100];
        assert!(matches!(
            OleFile::open(std::io::Cursor::new(bytes)),
            Err(OleError::NotOleFile)
        ));
    }
}

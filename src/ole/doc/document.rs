//! Word document model: paragraphs of character runs, the font table
//! and the style sheet, assembled from the WordDocument and table
//! streams.
//!
//! Text lives in the WordDocument stream at the positions the piece
//! table gives. Character formatting lives in CHPX formatting pages
//! (FKPs) addressed through a bin table in the table stream; each page
//! covers a range of file positions and carries SPRM-encoded property
//! deltas. Auxiliary structures that fail to parse degrade to their
//! defaults rather than failing the whole document.

use std::io::{Read, Seek};

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::fib::{Fib, FibFlags};
use super::package::{DocError, Result};
use super::piece_table::{PieceTable, Plex};
use crate::common::binary::{parse_utf16le_string, read_u16_le, read_u32_le};
use crate::ole::{OleError, OleFile};

/// Size of a CHPX formatting page.
const FKP_PAGE_SIZE: usize = 512;

/// Most runs a 512-byte page can describe: (512 - 1) / (4 + 1) - 1.
const FKP_MAX_RUNS: usize = 101;

// SPRM opcodes for the character properties surfaced on runs.
const SPRM_CF_BOLD: u16 = 0x0835;
const SPRM_CF_ITALIC: u16 = 0x0836;
const SPRM_C_HPS: u16 = 0x4A43;
const SPRM_C_RG_FTC0: u16 = 0x4A4F;

/// Character formatting carried by a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunProperties {
    pub bold: bool,
    pub italic: bool,
    /// Index into the font table, when the run sets one.
    pub font_index: Option<u16>,
    /// Font size in half-points, when the run sets one.
    pub font_size: Option<u16>,
}

/// A stretch of identically formatted text within a paragraph.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Run {
    pub text: String,
    pub properties: RunProperties,
}

/// A paragraph of runs. Table cell ends and page breaks also terminate
/// paragraphs in this model.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Paragraph {
    pub runs: Vec<Run>,
}

impl Paragraph {
    /// Plain text of the paragraph, runs concatenated.
    pub fn text(&self) -> String {
        self.runs.iter().map(|run| run.text.as_str()).collect()
    }
}

/// One font definition from the SttbfFfn table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FontEntry {
    pub name: String,
    /// Alternative name, when the definition carries one.
    pub alt_name: Option<String>,
    /// Windows character set identifier.
    pub charset: u8,
}

/// The document font table. Runs reference fonts by index; lookups
/// outside the table resolve to `None`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FontTable {
    fonts: Vec<FontEntry>,
}

impl FontTable {
    /// Parse an SttbfFfn block: count, extra-data size, then
    /// length-prefixed FFN records.
    pub fn parse(data: &[u8]) -> Option<Self> {
        let count = read_u16_le(data, 0).ok()? as usize;
        let extra = read_u16_le(data, 2).ok()? as usize;
        let mut fonts = Vec::with_capacity(count);
        let mut pos = 4usize;

        for _ in 0..count {
            let cb = *data.get(pos)? as usize;
            let ffn = data.get(pos + 1..pos + 1 + cb)?;
            if ffn.len() < 40 {
                return None;
            }
            let charset = ffn[3];
            let ixch_alt = ffn[4] as usize;
            let name_units = &ffn[39..];
            let name = parse_utf16le_string(name_units);
            let alt_name = (ixch_alt > 0)
                .then(|| name_units.get(ixch_alt * 2..).map(parse_utf16le_string))
                .flatten()
                .filter(|alt| !alt.is_empty());
            fonts.push(FontEntry {
                name,
                alt_name,
                charset,
            });
            pos += 1 + cb + extra;
        }
        Some(Self { fonts })
    }

    /// Font at the given index, `None` when out of range.
    pub fn get(&self, index: u16) -> Option<&FontEntry> {
        self.fonts.get(index as usize)
    }

    pub fn fonts(&self) -> &[FontEntry] {
        &self.fonts
    }

    pub fn len(&self) -> usize {
        self.fonts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }
}

/// What a style applies to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StyleKind {
    Paragraph,
    Character,
    Table,
    Numbering,
    #[default]
    Other,
}

impl StyleKind {
    fn from_sgc(sgc: u16) -> Self {
        match sgc {
            1 => StyleKind::Paragraph,
            2 => StyleKind::Character,
            3 => StyleKind::Table,
            4 => StyleKind::Numbering,
            _ => StyleKind::Other,
        }
    }
}

/// One style definition from the STSH block.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Style {
    pub name: String,
    pub kind: StyleKind,
    /// Built-in style identifier (sti).
    pub sti: u16,
    /// Index of the style this one is based on, `None` for the null
    /// istd (0xFFF). The referenced slot may not exist; `base_of`
    /// resolves that to `None`.
    pub base: Option<u16>,
}

/// The document style sheet. Slots line up with istd indices, and
/// empty slots stay in place so indices keep their meaning.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StyleSheet {
    styles: Vec<Option<Style>>,
}

impl StyleSheet {
    /// Parse an STSH block: the STSHI header followed by cstd
    /// length-prefixed style definitions, each 2-byte aligned.
    pub fn parse(data: &[u8]) -> Option<Self> {
        let cb_stshi = read_u16_le(data, 0).ok()? as usize;
        let stshi = data.get(2..2 + cb_stshi)?;
        let cstd = read_u16_le(stshi, 0).ok()? as usize;
        let cb_std_base = read_u16_le(stshi, 2).ok()? as usize;
        if cb_std_base < 4 {
            return None;
        }

        let mut styles = Vec::with_capacity(cstd);
        let mut pos = 2 + cb_stshi;
        for _ in 0..cstd {
            let cb_std = read_u16_le(data, pos).ok()? as usize;
            pos += 2;
            if cb_std == 0 {
                styles.push(None);
                continue;
            }
            let std_bytes = data.get(pos..pos + cb_std)?;
            styles.push(Self::parse_std(std_bytes, cb_std_base));
            pos += cb_std + (cb_std & 1);
        }
        Some(Self { styles })
    }

    fn parse_std(std_bytes: &[u8], cb_std_base: usize) -> Option<Style> {
        let w1 = read_u16_le(std_bytes, 0).ok()?;
        let w2 = read_u16_le(std_bytes, 2).ok()?;
        let sti = w1 & 0x0FFF;
        let kind = StyleKind::from_sgc(w2 & 0xF);
        let istd_base = (w2 >> 4) & 0xFFF;
        let base = (istd_base != 0xFFF).then_some(istd_base);

        // The name follows the fixed fields as a counted UTF-16 string.
        let cch = read_u16_le(std_bytes, cb_std_base).ok()? as usize;
        let name_bytes = std_bytes.get(cb_std_base + 2..cb_std_base + 2 + cch * 2)?;
        let name = parse_utf16le_string(name_bytes);

        Some(Style {
            name,
            kind,
            sti,
            base,
        })
    }

    /// Style at the given istd, `None` for out-of-range or empty slots.
    pub fn style(&self, istd: u16) -> Option<&Style> {
        self.styles.get(istd as usize)?.as_ref()
    }

    /// The style a given style is based on, tolerating dangling
    /// references.
    pub fn base_of(&self, style: &Style) -> Option<&Style> {
        self.style(style.base?)
    }

    /// Number of slots, counting empty ones.
    pub fn len(&self) -> usize {
        self.styles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }
}

/// A parsed Word binary document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WordDocument {
    pub paragraphs: Vec<Paragraph>,
    pub font_table: FontTable,
    pub style_sheet: StyleSheet,
}

impl WordDocument {
    /// Read and assemble the document out of an open compound file.
    pub(crate) fn from_ole<R: Read + Seek>(ole: &mut OleFile<R>) -> Result<Self> {
        let word = Bytes::from(ole.open_stream(&["WordDocument"]).map_err(|err| match err {
            OleError::StreamNotFound => DocError::StreamNotFound("WordDocument".to_string()),
            other => other.into(),
        })?);
        let fib = Fib::parse(&word)?;
        if fib.is_encrypted() {
            return Err(DocError::InvalidFormat(
                "encrypted documents are not supported".to_string(),
            ));
        }

        let table = open_table_stream(ole, &fib)?;
        let piece_table = build_piece_table(&fib, &table);
        let char_runs = parse_character_runs(&fib, &word, &table, &piece_table);
        let paragraphs = assemble_paragraphs(&piece_table, &word, char_runs.as_deref());

        let font_table = fib
            .font_table_pointer()
            .and_then(|(offset, length)| slice_table(&table, offset, length))
            .and_then(|sttbf| {
                FontTable::parse(sttbf).or_else(|| {
                    warn!("font table did not parse; continuing without fonts");
                    None
                })
            })
            .unwrap_or_default();

        let style_sheet = fib
            .stylesheet_pointer()
            .and_then(|(offset, length)| slice_table(&table, offset, length))
            .and_then(|stsh| {
                StyleSheet::parse(stsh).or_else(|| {
                    warn!("style sheet did not parse; continuing without styles");
                    None
                })
            })
            .unwrap_or_default();

        Ok(Self {
            paragraphs,
            font_table,
            style_sheet,
        })
    }

    /// Plain text of the whole document, paragraphs joined by newlines.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for (i, paragraph) in self.paragraphs.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            out.push_str(&paragraph.text());
        }
        out
    }

    /// Name of the font a run references, `None` when the index does
    /// not resolve.
    pub fn font_name(&self, index: u16) -> Option<&str> {
        self.font_table.get(index).map(|entry| entry.name.as_str())
    }
}

/// Open the table stream the FIB names, probing the other one when it
/// is missing. Some minimal writers emit no table stream at all; the
/// document then parses from the FIB alone.
fn open_table_stream<R: Read + Seek>(ole: &mut OleFile<R>, fib: &Fib) -> Result<Bytes> {
    let name = fib.table_stream_name();
    match ole.open_stream(&[name]) {
        Ok(data) => Ok(Bytes::from(data)),
        Err(OleError::StreamNotFound) => {
            let fallback = if name == "1Table" { "0Table" } else { "1Table" };
            warn!("table stream {name} missing, probing {fallback}");
            match ole.open_stream(&[fallback]) {
                Ok(data) => Ok(Bytes::from(data)),
                Err(OleError::StreamNotFound) => {
                    warn!("no table stream present, continuing without auxiliary tables");
                    Ok(Bytes::new())
                }
                Err(err) => Err(err.into()),
            }
        }
        Err(err) => Err(err.into()),
    }
}

/// Bounds-checked slice of a table-stream structure.
fn slice_table(table: &[u8], offset: u32, length: u32) -> Option<&[u8]> {
    if length == 0 {
        return None;
    }
    let start = offset as usize;
    table.get(start..start.checked_add(length as usize)?)
}

/// The piece table from the CLX, or a single legacy piece when the FIB
/// predates piece tables or the CLX is unusable.
fn build_piece_table(fib: &Fib, table: &[u8]) -> PieceTable {
    if let Some((offset, length)) = fib.clx_pointer()
        && length > 0
    {
        match slice_table(table, offset, length) {
            Some(clx) => {
                if let Some(pieces) = PieceTable::parse(clx) {
                    return pieces;
                }
                warn!("piece table did not parse, falling back to the legacy text range");
            }
            None => {
                warn!("piece table pointer outside the table stream, falling back to the legacy text range");
            }
        }
    }
    match fib.legacy_text_range() {
        Some((fc_min, fc_mac)) => PieceTable::from_legacy_range(
            fc_min,
            fc_mac,
            fib.flags().contains(FibFlags::EXT_CHAR),
        ),
        None => PieceTable::default(),
    }
}

/// A formatting run in character-position space.
struct CpRun {
    cp_start: u32,
    cp_end: u32,
    properties: RunProperties,
}

/// Walk the CHPX bin table and formatting pages into CP-space runs.
///
/// File positions map to character positions affinely only when the
/// text is a single piece; fast-saved documents with scattered pieces
/// keep default formatting and split runs at piece boundaries instead.
fn parse_character_runs(
    fib: &Fib,
    word: &[u8],
    table: &[u8],
    pieces: &PieceTable,
) -> Option<Vec<CpRun>> {
    if pieces.pieces().len() != 1 {
        if pieces.pieces().len() > 1 {
            debug!("fast-saved piece layout, runs follow piece boundaries");
        }
        return None;
    }
    let piece = &pieces.pieces()[0];
    let width: u32 = if piece.is_unicode { 2 } else { 1 };
    let piece_fc_end = piece.fc + piece.byte_len();

    let (offset, length) = fib.char_bin_table_pointer()?;
    let bin_table = slice_table(table, offset, length)?;
    let plex = Plex::parse(bin_table, 4)?;

    let mut runs = Vec::new();
    for i in 0..plex.len() {
        let pn = read_u32_le(plex.element(i)?, 0).ok()? & 0x003F_FFFF;
        let page_start = (pn as usize).checked_mul(FKP_PAGE_SIZE)?;
        let Some(page) = word.get(page_start..page_start + FKP_PAGE_SIZE) else {
            warn!("formatting page {pn} outside the document stream");
            return None;
        };
        let crun = page[FKP_PAGE_SIZE - 1] as usize;
        if crun == 0 || crun > FKP_MAX_RUNS {
            continue;
        }
        for j in 0..crun {
            let fc_start = read_u32_le(page, j * 4).ok()?;
            let fc_end = read_u32_le(page, (j + 1) * 4).ok()?;
            let properties = match page.get((crun + 1) * 4 + j) {
                Some(&0) | None => RunProperties::default(),
                Some(&b) => {
                    let chpx_offset = b as usize * 2;
                    let cb = *page.get(chpx_offset)? as usize;
                    let grpprl = page.get(chpx_offset + 1..chpx_offset + 1 + cb)?;
                    run_properties_from_grpprl(grpprl)
                }
            };
            // Clamp the FC range to the piece before converting to CPs.
            let fc_start = fc_start.clamp(piece.fc, piece_fc_end);
            let fc_end = fc_end.clamp(piece.fc, piece_fc_end);
            if fc_end <= fc_start {
                continue;
            }
            runs.push(CpRun {
                cp_start: piece.cp_start + (fc_start - piece.fc) / width,
                cp_end: piece.cp_start + (fc_end - piece.fc) / width,
                properties,
            });
        }
    }
    runs.sort_by_key(|run| run.cp_start);
    (!runs.is_empty()).then_some(runs)
}

/// Apply the character SPRMs we surface; everything else is skipped by
/// its encoded operand size.
fn run_properties_from_grpprl(grpprl: &[u8]) -> RunProperties {
    let mut properties = RunProperties::default();
    let mut pos = 0usize;
    while pos + 2 <= grpprl.len() {
        let sprm = u16::from_le_bytes([grpprl[pos], grpprl[pos + 1]]);
        pos += 2;
        let operand = &grpprl[pos..];
        let size = sprm_operand_size(sprm, operand);
        if size == 0 || size > operand.len() {
            break;
        }
        match sprm {
            SPRM_CF_BOLD => properties.bold = operand[0] & 1 != 0,
            SPRM_CF_ITALIC => properties.italic = operand[0] & 1 != 0,
            SPRM_C_RG_FTC0 => {
                properties.font_index = Some(u16::from_le_bytes([operand[0], operand[1]]));
            }
            SPRM_C_HPS => {
                properties.font_size = Some(u16::from_le_bytes([operand[0], operand[1]]));
            }
            _ => {}
        }
        pos += size;
    }
    properties
}

/// Operand size from the spra field (top three bits of the opcode).
fn sprm_operand_size(sprm: u16, operand: &[u8]) -> usize {
    match (sprm >> 13) & 0x7 {
        0 | 1 => 1,
        2 | 4 | 5 => 2,
        3 => 4,
        7 => 3,
        // spra 6: length byte followed by that many bytes
        _ => operand
            .first()
            .map(|&len| len as usize + 1)
            .unwrap_or(0),
    }
}

/// Streaming paragraph builder. Characters arrive in CP order; runs
/// flush when formatting changes and paragraphs close on paragraph,
/// cell and page-break marks.
struct ParagraphAssembler<'a> {
    runs: Option<&'a [CpRun]>,
    run_idx: usize,
    paragraphs: Vec<Paragraph>,
    current: Vec<Run>,
    text: String,
    properties: RunProperties,
    in_field_instruction: bool,
}

impl<'a> ParagraphAssembler<'a> {
    fn new(runs: Option<&'a [CpRun]>) -> Self {
        Self {
            runs,
            run_idx: 0,
            paragraphs: Vec::new(),
            current: Vec::new(),
            text: String::new(),
            properties: RunProperties::default(),
            in_field_instruction: false,
        }
    }

    fn properties_at(&mut self, cp: u32) -> RunProperties {
        let Some(runs) = self.runs else {
            return RunProperties::default();
        };
        while self.run_idx < runs.len() && cp >= runs[self.run_idx].cp_end {
            self.run_idx += 1;
        }
        match runs.get(self.run_idx) {
            Some(run) if cp >= run.cp_start => run.properties,
            _ => RunProperties::default(),
        }
    }

    fn flush_run(&mut self) {
        if !self.text.is_empty() {
            self.current.push(Run {
                text: std::mem::take(&mut self.text),
                properties: self.properties,
            });
        }
    }

    fn end_paragraph(&mut self) {
        self.flush_run();
        self.paragraphs.push(Paragraph {
            runs: std::mem::take(&mut self.current),
        });
    }

    fn push_char(&mut self, c: char, cp: u32) {
        let active = self.properties_at(cp);
        if active != self.properties {
            self.flush_run();
            self.properties = active;
        }
        match c {
            // Paragraph mark, cell mark, page break.
            '\r' | '\u{0007}' | '\u{000C}' => self.end_paragraph(),
            // Vertical tab is a line break within the paragraph.
            '\u{000B}' => self.text.push('\n'),
            // Field instruction text is hidden, field result text kept.
            '\u{0013}' => self.in_field_instruction = true,
            '\u{0014}' => self.in_field_instruction = false,
            '\u{0015}' => {}
            _ if self.in_field_instruction => {}
            c if c.is_control() && c != '\t' => {}
            c => self.text.push(c),
        }
    }

    fn finish(mut self) -> Vec<Paragraph> {
        self.flush_run();
        if !self.current.is_empty() {
            self.paragraphs.push(Paragraph { runs: self.current });
        }
        self.paragraphs
    }
}

fn assemble_paragraphs(
    pieces: &PieceTable,
    word: &[u8],
    runs: Option<&[CpRun]>,
) -> Vec<Paragraph> {
    let mut assembler = ParagraphAssembler::new(runs);
    for piece in pieces.pieces() {
        let Some(text) = piece.text(word) else {
            warn!(
                "text piece at offset {} outside the document stream, skipped",
                piece.fc
            );
            continue;
        };
        let mut cp = piece.cp_start;
        for c in text.chars() {
            assembler.push_char(c, cp);
            cp += c.len_utf16() as u32;
        }
    }
    assembler.finish()
}

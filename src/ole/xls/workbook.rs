//! Workbook parsing: globals pass, sheet directory, per-sheet cell pass.

use std::fs::File;
use std::io::{Cursor, Read, Seek};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::cell::{self, Cell, CellContext, CellValue};
use super::chart::ChartGroup;
use super::error::{XlsError, XlsResult};
use super::records::{
    BiffVersion, Bof, BoundSheet, Dimensions, FontRecord, RecordIter, SharedStrings, SheetKind,
    SheetVisibility, Xf,
};
use crate::common::binary::read_u16_le;
use crate::ole::record::families::biff;
use crate::ole::{OleError, OleFile};

const DEFAULT_CODEPAGE: u16 = 1252;

/// A parsed legacy workbook (.xls).
///
/// Parsing happens eagerly in two passes. The globals substream supplies
/// the codepage, fonts, cell formats, shared strings and the sheet
/// directory; each directory entry then locates a sheet substream whose
/// cell records are decoded against those tables. A sheet that cannot be
/// read keeps its directory entry and stays empty rather than failing
/// the workbook.
///
/// # Examples
///
/// ```rust,no_run
/// use longan::ole::xls::Workbook;
///
/// let workbook = Workbook::open("report.xls")?;
/// for sheet in workbook.worksheets() {
///     println!("{}: {} cells", sheet.name, sheet.cells.len());
/// }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workbook {
    codepage: u16,
    date_1904: bool,
    fonts: Vec<FontRecord>,
    sheets: Vec<Worksheet>,
    charts: Vec<ChartGroup>,
}

/// One worksheet: directory metadata plus its decoded cells.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Worksheet {
    pub name: String,
    pub visibility: SheetVisibility,
    /// Used range declared by the sheet, when present.
    pub dimensions: Option<Dimensions>,
    /// Populated cells in row-major order.
    pub cells: Vec<Cell>,
}

impl Worksheet {
    /// Looks up a cell by position.
    pub fn cell(&self, row: u32, col: u16) -> Option<&Cell> {
        self.cells
            .binary_search_by_key(&(row, col), |c| (c.row, c.col))
            .ok()
            .map(|i| &self.cells[i])
    }

    /// Groups cells into runs sharing a row.
    pub fn rows(&self) -> impl Iterator<Item = (u32, &[Cell])> {
        self.cells
            .chunk_by(|a, b| a.row == b.row)
            .map(|run| (run[0].row, run))
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl Workbook {
    /// Opens a workbook from a file path.
    pub fn open<P: AsRef<Path>>(path: P) -> XlsResult<Self> {
        let file = File::open(path)?;
        Self::from_reader(file)
    }

    /// Opens a workbook from any reader.
    pub fn from_reader<R: Read + Seek>(reader: R) -> XlsResult<Self> {
        let mut ole = OleFile::open(reader)?;
        Self::from_ole_file(&mut ole)
    }

    /// Parses the workbook stream out of an already-open container.
    ///
    /// Probes the BIFF8 stream name first, then the BIFF5 one.
    pub fn from_ole_file<R: Read + Seek>(ole: &mut OleFile<R>) -> XlsResult<Self> {
        let data = match ole.open_stream(&["Workbook"]) {
            Ok(data) => data,
            Err(OleError::StreamNotFound) => ole.open_stream(&["Book"])?,
            Err(e) => return Err(e.into()),
        };
        Self::from_stream(&data)
    }

    /// Parses a raw workbook stream.
    pub fn from_stream(data: &[u8]) -> XlsResult<Self> {
        let mut iter = RecordIter::new(Cursor::new(data))?;

        let first = iter
            .next()
            .ok_or_else(|| XlsError::InvalidData("empty workbook stream".to_string()))??;
        if first.code != biff::BOF {
            return Err(XlsError::InvalidRecord {
                record_type: first.code,
                message: "stream does not begin with BOF".to_string(),
            });
        }
        let bof = Bof::parse(&first.data)?;
        if bof.version != Some(BiffVersion::Biff8) {
            return Err(XlsError::UnsupportedBiffVersion(bof.raw_version));
        }

        let mut codepage = DEFAULT_CODEPAGE;
        let mut date_1904 = false;
        let mut fonts = Vec::new();
        let mut xf_table = Vec::new();
        let mut bound_sheets = Vec::new();
        let mut sst_data: Option<Vec<u8>> = None;
        let mut sst_open = false;

        for record in iter.by_ref() {
            let record = record?;
            match record.code {
                biff::EOF => break,
                biff::CODEPAGE => {
                    match read_u16_le(&record.data, 0) {
                        Ok(cp) => codepage = cp,
                        Err(_) => warn!("codepage record too short, keeping {codepage}"),
                    }
                    sst_open = false;
                }
                biff::DATE_MODE => {
                    date_1904 = record.data.first().is_some_and(|&b| b & 1 == 1);
                    sst_open = false;
                }
                biff::FONT => {
                    // A broken entry keeps its slot so later indices hold.
                    fonts.push(FontRecord::parse(&record.data, codepage).unwrap_or_else(|e| {
                        warn!("unreadable font record {}: {e}", fonts.len());
                        FontRecord::default()
                    }));
                    sst_open = false;
                }
                biff::XF => {
                    xf_table.push(Xf::parse(&record.data).unwrap_or_else(|e| {
                        warn!("unreadable XF record {}: {e}", xf_table.len());
                        Xf::default()
                    }));
                    sst_open = false;
                }
                biff::BOUND_SHEET => {
                    match BoundSheet::parse(&record.data, codepage) {
                        Ok(bound) => bound_sheets.push(bound),
                        Err(e) => warn!("unreadable sheet directory entry: {e}"),
                    }
                    sst_open = false;
                }
                biff::SST => {
                    sst_data = Some(record.data);
                    sst_open = true;
                }
                biff::CONTINUE => {
                    if sst_open && let Some(buf) = sst_data.as_mut() {
                        buf.extend_from_slice(&record.data);
                    }
                }
                _ => sst_open = false,
            }
        }

        let strings = match sst_data {
            Some(data) => SharedStrings::parse(&data, codepage).unwrap_or_else(|e| {
                warn!("shared string table unreadable: {e}");
                SharedStrings::default()
            }),
            None => SharedStrings::default(),
        };

        let mut sheets = Vec::new();
        let mut charts = Vec::new();
        let ctx = CellContext {
            codepage,
            strings: &strings,
            xf_table: &xf_table,
        };
        for bound in &bound_sheets {
            match bound.kind {
                SheetKind::Chart => match enter_substream(&mut iter, bound) {
                    Ok(()) => match ChartGroup::parse(&mut iter, bound.name.clone(), codepage) {
                        Ok(chart) => charts.push(chart),
                        Err(e) => warn!("chart sheet '{}' unreadable, skipping: {e}", bound.name),
                    },
                    Err(e) => warn!("chart sheet '{}' unreadable, skipping: {e}", bound.name),
                },
                _ => sheets.push(parse_sheet_substream(&mut iter, bound, &ctx, &mut charts)),
            }
        }

        Ok(Self {
            codepage,
            date_1904,
            fonts,
            sheets,
            charts,
        })
    }

    pub fn worksheets(&self) -> &[Worksheet] {
        &self.sheets
    }

    /// Finds a worksheet by name.
    pub fn worksheet(&self, name: &str) -> XlsResult<&Worksheet> {
        self.sheets
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| XlsError::WorksheetNotFound(name.to_string()))
    }

    /// Chart groups from chart sheets and embedded chart objects.
    pub fn charts(&self) -> &[ChartGroup] {
        &self.charts
    }

    /// Looks up a font by the index cells carry in their format.
    ///
    /// Index 4 is reserved in the file format and never written; higher
    /// indices are shifted down by one.
    pub fn font(&self, index: u16) -> Option<&FontRecord> {
        match index {
            4 => None,
            i if i > 4 => self.fonts.get(i as usize - 1),
            i => self.fonts.get(i as usize),
        }
    }

    pub fn fonts(&self) -> &[FontRecord] {
        &self.fonts
    }

    pub fn codepage(&self) -> u16 {
        self.codepage
    }

    /// Whether serial dates count from 1904 instead of 1900.
    pub fn uses_1904_dates(&self) -> bool {
        self.date_1904
    }
}

/// Seeks to a directory entry's substream and consumes its `BOF`.
fn enter_substream<R: Read + Seek>(
    iter: &mut RecordIter<R>,
    bound: &BoundSheet,
) -> XlsResult<()> {
    iter.seek(bound.position as u64)?;
    let record = iter.next().ok_or_else(|| {
        XlsError::InvalidData(format!("substream for '{}' is empty", bound.name))
    })??;
    if record.code != biff::BOF {
        return Err(XlsError::InvalidRecord {
            record_type: record.code,
            message: "substream does not begin with BOF".to_string(),
        });
    }
    Bof::parse(&record.data)?;
    Ok(())
}

fn push_cell(cells: &mut Vec<Cell>, sheet_name: &str, res: XlsResult<Cell>) {
    match res {
        Ok(cell) => cells.push(cell),
        Err(e) => warn!("sheet '{sheet_name}': skipping cell record: {e}"),
    }
}

fn push_cells(cells: &mut Vec<Cell>, sheet_name: &str, res: XlsResult<Vec<Cell>>) {
    match res {
        Ok(mut batch) => cells.append(&mut batch),
        Err(e) => warn!("sheet '{sheet_name}': skipping cell record: {e}"),
    }
}

/// Decodes one worksheet substream. Damage is absorbed: the sheet keeps
/// whatever cells were read before the problem.
fn parse_sheet_substream<R: Read + Seek>(
    iter: &mut RecordIter<R>,
    bound: &BoundSheet,
    ctx: &CellContext<'_>,
    charts: &mut Vec<ChartGroup>,
) -> Worksheet {
    let mut sheet = Worksheet {
        name: bound.name.clone(),
        visibility: bound.visibility,
        dimensions: None,
        cells: Vec::new(),
    };
    if let Err(e) = enter_substream(iter, bound) {
        warn!("sheet '{}' unreadable, keeping it empty: {e}", bound.name);
        return sheet;
    }

    // Index of a formula cell whose string result is still to come.
    let mut pending_string: Option<usize> = None;
    while let Some(record) = iter.next() {
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                warn!("sheet '{}' cut short: {e}", bound.name);
                break;
            }
        };
        match record.code {
            biff::EOF => break,
            biff::BOF => {
                // Embedded chart objects open a nested substream.
                match ChartGroup::parse(iter, bound.name.clone(), ctx.codepage) {
                    Ok(chart) => charts.push(chart),
                    Err(e) => {
                        warn!("embedded chart in '{}' unreadable: {e}", bound.name);
                        break;
                    }
                }
            }
            biff::DIMENSION => match Dimensions::parse(&record.data) {
                Ok(d) => sheet.dimensions = Some(d),
                Err(e) => debug!("sheet '{}': bad dimensions record: {e}", bound.name),
            },
            biff::BLANK => {
                push_cell(&mut sheet.cells, &bound.name, cell::parse_blank(&record.data, ctx));
            }
            biff::MUL_BLANK => {
                push_cells(
                    &mut sheet.cells,
                    &bound.name,
                    cell::parse_mul_blank(&record.data, ctx),
                );
            }
            biff::NUMBER => {
                push_cell(&mut sheet.cells, &bound.name, cell::parse_number(&record.data, ctx));
            }
            biff::RK => {
                push_cell(&mut sheet.cells, &bound.name, cell::parse_rk(&record.data, ctx));
            }
            biff::MUL_RK => {
                push_cells(&mut sheet.cells, &bound.name, cell::parse_mul_rk(&record.data, ctx));
            }
            biff::LABEL => {
                push_cell(&mut sheet.cells, &bound.name, cell::parse_label(&record.data, ctx));
            }
            biff::LABEL_SST => {
                push_cell(
                    &mut sheet.cells,
                    &bound.name,
                    cell::parse_label_sst(&record.data, ctx),
                );
            }
            biff::BOOL_ERR => {
                push_cell(
                    &mut sheet.cells,
                    &bound.name,
                    cell::parse_bool_err(&record.data, ctx),
                );
            }
            biff::FORMULA => match cell::parse_formula(&record.data, ctx) {
                Ok((cell, pending)) => {
                    sheet.cells.push(cell);
                    if pending {
                        pending_string = Some(sheet.cells.len() - 1);
                    }
                }
                Err(e) => warn!("sheet '{}': skipping formula record: {e}", bound.name),
            },
            biff::STRING => {
                if let Some(index) = pending_string.take() {
                    match cell::parse_formula_string(&record.data, ctx.codepage) {
                        Ok(text) => sheet.cells[index].value = CellValue::Text(text),
                        Err(e) => warn!("sheet '{}': bad formula string: {e}", bound.name),
                    }
                }
            }
            _ => {}
        }
    }
    sheet.cells.sort_by_key(|c| (c.row, c.col));
    sheet
}

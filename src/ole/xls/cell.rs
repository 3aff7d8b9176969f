//! Cell model and decoders for the per-sheet cell records.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::error::{XlsError, XlsResult};
use super::records::{
    CchWidth, FormulaValue, SharedStrings, Xf, read_unicode_string, rk_to_f64,
};
use crate::common::binary::{read_f64_le, read_u16_le, read_u32_le};

/// Value held by a cell.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    #[default]
    Empty,
    Number(f64),
    Text(String),
    Bool(bool),
    /// Error code as stored in the file, e.g. 0x07 for `#DIV/0!`.
    Error(u8),
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Number(n) => {
                // Whole numbers print without a trailing ".0".
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{n}")
                }
            }
            CellValue::Text(s) => f.write_str(s),
            CellValue::Bool(true) => f.write_str("TRUE"),
            CellValue::Bool(false) => f.write_str("FALSE"),
            CellValue::Error(code) => f.write_str(error_text(*code)),
        }
    }
}

/// Display text for a cell error code.
pub fn error_text(code: u8) -> &'static str {
    match code {
        0x00 => "#NULL!",
        0x07 => "#DIV/0!",
        0x0F => "#VALUE!",
        0x17 => "#REF!",
        0x1D => "#NAME?",
        0x24 => "#NUM!",
        0x2A => "#N/A",
        _ => "#UNKNOWN!",
    }
}

/// Formatting references resolved from a cell's XF index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellFormat {
    /// Index into the workbook font table.
    pub font_index: u16,
    /// Index into the workbook number-format table.
    pub format_index: u16,
}

/// One populated cell.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cell {
    pub row: u32,
    pub col: u16,
    pub value: CellValue,
    /// `None` when the cell's XF index was out of range.
    pub format: Option<CellFormat>,
}

/// Lookup tables a sheet pass needs to resolve cell records.
pub(super) struct CellContext<'a> {
    pub codepage: u16,
    pub strings: &'a SharedStrings,
    pub xf_table: &'a [Xf],
}

impl CellContext<'_> {
    fn format(&self, xf_index: u16) -> Option<CellFormat> {
        match self.xf_table.get(xf_index as usize) {
            Some(xf) => Some(CellFormat {
                font_index: xf.font_index,
                format_index: xf.format_index,
            }),
            None => {
                if !self.xf_table.is_empty() {
                    debug!(
                        "XF index {xf_index} out of range ({} entries)",
                        self.xf_table.len()
                    );
                }
                None
            }
        }
    }

    fn shared_string(&self, index: u32) -> CellValue {
        match self.strings.get(index as usize) {
            Some(s) => CellValue::Text(s.to_string()),
            None => {
                warn!(
                    "shared string index {index} out of range ({} entries), cell left empty",
                    self.strings.len()
                );
                CellValue::Empty
            }
        }
    }
}

fn cell_head(data: &[u8]) -> XlsResult<(u32, u16, u16)> {
    Ok((
        read_u16_le(data, 0)? as u32,
        read_u16_le(data, 2)?,
        read_u16_le(data, 4)?,
    ))
}

pub(super) fn parse_blank(data: &[u8], ctx: &CellContext<'_>) -> XlsResult<Cell> {
    let (row, col, xf) = cell_head(data)?;
    Ok(Cell {
        row,
        col,
        value: CellValue::Empty,
        format: ctx.format(xf),
    })
}

pub(super) fn parse_number(data: &[u8], ctx: &CellContext<'_>) -> XlsResult<Cell> {
    let (row, col, xf) = cell_head(data)?;
    Ok(Cell {
        row,
        col,
        value: CellValue::Number(read_f64_le(data, 6)?),
        format: ctx.format(xf),
    })
}

pub(super) fn parse_rk(data: &[u8], ctx: &CellContext<'_>) -> XlsResult<Cell> {
    let (row, col, xf) = cell_head(data)?;
    Ok(Cell {
        row,
        col,
        value: CellValue::Number(rk_to_f64(read_u32_le(data, 6)?)),
        format: ctx.format(xf),
    })
}

/// Inline label record, used by pre-BIFF8 writers.
pub(super) fn parse_label(data: &[u8], ctx: &CellContext<'_>) -> XlsResult<Cell> {
    let (row, col, xf) = cell_head(data)?;
    let (text, _) = read_unicode_string(data, 6, CchWidth::Word, ctx.codepage)?;
    Ok(Cell {
        row,
        col,
        value: CellValue::Text(text),
        format: ctx.format(xf),
    })
}

pub(super) fn parse_label_sst(data: &[u8], ctx: &CellContext<'_>) -> XlsResult<Cell> {
    let (row, col, xf) = cell_head(data)?;
    let index = read_u32_le(data, 6)?;
    Ok(Cell {
        row,
        col,
        value: ctx.shared_string(index),
        format: ctx.format(xf),
    })
}

pub(super) fn parse_bool_err(data: &[u8], ctx: &CellContext<'_>) -> XlsResult<Cell> {
    let (row, col, xf) = cell_head(data)?;
    if data.len() < 8 {
        return Err(XlsError::InvalidLength {
            expected: 8,
            found: data.len(),
        });
    }
    let value = if data[7] == 0 {
        CellValue::Bool(data[6] != 0)
    } else {
        CellValue::Error(data[6])
    };
    Ok(Cell {
        row,
        col,
        value,
        format: ctx.format(xf),
    })
}

/// Decodes a formula record into a cell carrying its cached result.
///
/// Returns the cell and whether the true value is a string that arrives
/// in the following `STRING` record.
pub(super) fn parse_formula(data: &[u8], ctx: &CellContext<'_>) -> XlsResult<(Cell, bool)> {
    let (row, col, xf) = cell_head(data)?;
    if data.len() < 14 {
        return Err(XlsError::InvalidLength {
            expected: 14,
            found: data.len(),
        });
    }
    let cached = FormulaValue::parse(&data[6..14])?;
    let (value, pending) = match cached {
        FormulaValue::Number(n) => (CellValue::Number(n), false),
        FormulaValue::Bool(b) => (CellValue::Bool(b), false),
        FormulaValue::Error(code) => (CellValue::Error(code), false),
        FormulaValue::Empty => (CellValue::Empty, false),
        FormulaValue::PendingText => (CellValue::Empty, true),
    };
    Ok((
        Cell {
            row,
            col,
            value,
            format: ctx.format(xf),
        },
        pending,
    ))
}

/// Decodes the `STRING` record that follows a formula with a string result.
pub(super) fn parse_formula_string(data: &[u8], codepage: u16) -> XlsResult<String> {
    let (text, _) = read_unicode_string(data, 0, CchWidth::Word, codepage)?;
    Ok(text)
}

/// A run of RK numbers sharing one row.
pub(super) fn parse_mul_rk(data: &[u8], ctx: &CellContext<'_>) -> XlsResult<Vec<Cell>> {
    let row = read_u16_le(data, 0)? as u32;
    let col_first = read_u16_le(data, 2)?;
    if data.len() < 10 {
        return Err(XlsError::InvalidLength {
            expected: 10,
            found: data.len(),
        });
    }
    let count = (data.len() - 6) / 6;
    let mut cells = Vec::with_capacity(count);
    for i in 0..count {
        let base = 4 + i * 6;
        let xf = read_u16_le(data, base)?;
        let rk = read_u32_le(data, base + 2)?;
        cells.push(Cell {
            row,
            col: col_first.wrapping_add(i as u16),
            value: CellValue::Number(rk_to_f64(rk)),
            format: ctx.format(xf),
        });
    }
    Ok(cells)
}

/// A run of blank formatted cells sharing one row.
pub(super) fn parse_mul_blank(data: &[u8], ctx: &CellContext<'_>) -> XlsResult<Vec<Cell>> {
    let row = read_u16_le(data, 0)? as u32;
    let col_first = read_u16_le(data, 2)?;
    if data.len() < 8 {
        return Err(XlsError::InvalidLength {
            expected: 8,
            found: data.len(),
        });
    }
    let count = (data.len() - 6) / 2;
    let mut cells = Vec::with_capacity(count);
    for i in 0..count {
        let xf = read_u16_le(data, 4 + i * 2)?;
        cells.push(Cell {
            row,
            col: col_first.wrapping_add(i as u16),
            value: CellValue::Empty,
            format: ctx.format(xf),
        });
    }
    Ok(cells)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context<'a>(strings: &'a SharedStrings, xf_table: &'a [Xf]) -> CellContext<'a> {
        CellContext {
            codepage: 1252,
            strings,
            xf_table,
        }
    }

    fn sst(entries: &[&str]) -> SharedStrings {
        let mut data = Vec::new();
        data.extend_from_slice(&(entries.len() as u32).to_le_bytes());
        data.extend_from_slice(&(entries.len() as u32).to_le_bytes());
        for s in entries {
            data.extend_from_slice(&(s.len() as u16).to_le_bytes());
            data.push(0);
            data.extend_from_slice(s.as_bytes());
        }
        SharedStrings::parse(&data, 1252).unwrap()
    }

    fn head(row: u16, col: u16, xf: u16) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&row.to_le_bytes());
        out.extend_from_slice(&col.to_le_bytes());
        out.extend_from_slice(&xf.to_le_bytes());
        out
    }

    #[test]
    fn number_cell_resolves_format() {
        let strings = sst(&[]);
        let xf_table = [
            Xf {
                font_index: 0,
                format_index: 0,
            },
            Xf {
                font_index: 3,
                format_index: 7,
            },
        ];
        let ctx = context(&strings, &xf_table);
        let mut data = head(4, 2, 1);
        data.extend_from_slice(&1.5f64.to_le_bytes());
        let cell = parse_number(&data, &ctx).unwrap();
        assert_eq!(cell.row, 4);
        assert_eq!(cell.col, 2);
        assert_eq!(cell.value, CellValue::Number(1.5));
        assert_eq!(
            cell.format,
            Some(CellFormat {
                font_index: 3,
                format_index: 7
            })
        );
    }

    #[test]
    fn out_of_range_xf_degrades_to_no_format() {
        let strings = sst(&[]);
        let xf_table = [Xf::default()];
        let ctx = context(&strings, &xf_table);
        let cell = parse_blank(&head(0, 0, 99), &ctx).unwrap();
        assert!(cell.format.is_none());
        assert!(cell.value.is_empty());
    }

    #[test]
    fn label_sst_resolves_and_clamps() {
        let strings = sst(&["alpha"]);
        let ctx = context(&strings, &[]);
        let mut data = head(0, 0, 0);
        data.extend_from_slice(&0u32.to_le_bytes());
        let cell = parse_label_sst(&data, &ctx).unwrap();
        assert_eq!(cell.value, CellValue::Text("alpha".to_string()));

        let mut data = head(0, 1, 0);
        data.extend_from_slice(&9u32.to_le_bytes());
        let cell = parse_label_sst(&data, &ctx).unwrap();
        assert_eq!(cell.value, CellValue::Empty);
    }

    #[test]
    fn bool_err_discriminates_on_trailing_byte() {
        let strings = sst(&[]);
        let ctx = context(&strings, &[]);
        let mut data = head(1, 1, 0);
        data.extend_from_slice(&[0x01, 0x00]);
        assert_eq!(
            parse_bool_err(&data, &ctx).unwrap().value,
            CellValue::Bool(true)
        );

        let mut data = head(1, 2, 0);
        data.extend_from_slice(&[0x07, 0x01]);
        assert_eq!(
            parse_bool_err(&data, &ctx).unwrap().value,
            CellValue::Error(0x07)
        );
    }

    #[test]
    fn mul_rk_expands_to_consecutive_columns() {
        let strings = sst(&[]);
        let ctx = context(&strings, &[]);
        let mut data = Vec::new();
        data.extend_from_slice(&3u16.to_le_bytes()); // row
        data.extend_from_slice(&2u16.to_le_bytes()); // first col
        for v in [100i32, 200, 300] {
            data.extend_from_slice(&0u16.to_le_bytes());
            data.extend_from_slice(&(((v << 2) | 0x02) as u32).to_le_bytes());
        }
        data.extend_from_slice(&4u16.to_le_bytes()); // last col
        let cells = parse_mul_rk(&data, &ctx).unwrap();
        assert_eq!(cells.len(), 3);
        assert_eq!(cells[0].col, 2);
        assert_eq!(cells[2].col, 4);
        assert_eq!(cells[1].value, CellValue::Number(200.0));
    }

    #[test]
    fn formula_signals_pending_string() {
        let strings = sst(&[]);
        let ctx = context(&strings, &[]);
        let mut data = head(0, 0, 0);
        data.extend_from_slice(&[0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xFF, 0xFF]);
        let (cell, pending) = parse_formula(&data, &ctx).unwrap();
        assert!(pending);
        assert!(cell.value.is_empty());

        let mut data = head(0, 1, 0);
        data.extend_from_slice(&9.0f64.to_le_bytes());
        let (cell, pending) = parse_formula(&data, &ctx).unwrap();
        assert!(!pending);
        assert_eq!(cell.value, CellValue::Number(9.0));
    }

    #[test]
    fn display_formats_values() {
        assert_eq!(CellValue::Number(3.0).to_string(), "3");
        assert_eq!(CellValue::Number(2.5).to_string(), "2.5");
        assert_eq!(CellValue::Bool(true).to_string(), "TRUE");
        assert_eq!(CellValue::Error(0x2A).to_string(), "#N/A");
        assert_eq!(CellValue::Empty.to_string(), "");
    }
}

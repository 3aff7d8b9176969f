//! Legacy workbook (.xls) parsing.
//!
//! Reads the BIFF8 record stream out of a compound file: workbook
//! globals (codepage, fonts, cell formats, shared strings), the sheet
//! directory, per-sheet cell records and chart substreams. Start with
//! [`Workbook`].

mod cell;
mod chart;
mod error;
mod records;
mod workbook;

pub use cell::{Cell, CellFormat, CellValue, error_text};
pub use chart::{ChartGroup, Series};
pub use error::{XlsError, XlsResult};
pub use records::{
    BiffRecord, BiffVersion, Bof, BoundSheet, CchWidth, Dimensions, FontRecord, RecordIter,
    SharedStrings, SheetKind, SheetVisibility, Substream, Xf, read_unicode_string, rk_to_f64,
};
pub use workbook::{Workbook, Worksheet};

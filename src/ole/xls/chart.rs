//! Chart substream parsing.
//!
//! Chart definitions are nested record groups: each container record is
//! followed by a `Begin`/`End` pair bracketing its children. Only the
//! series structure is decoded here; rendering properties are skipped.

use std::io::{Read, Seek};

use serde::{Deserialize, Serialize};

use super::error::{XlsError, XlsResult};
use super::records::{CchWidth, RecordIter, read_unicode_string};
use crate::common::binary::read_u16_le;
use crate::ole::record::families::{biff, chart};

/// One data series of a chart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Series {
    /// Cached series name, when the file stores one.
    pub name: Option<String>,
    /// Number of data points in the value range.
    pub point_count: u16,
}

/// A chart and the series it plots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartGroup {
    /// Name of the sheet the chart came from.
    pub name: String,
    /// Chart title, when the file stores one.
    pub title: Option<String>,
    pub series: Vec<Series>,
}

impl ChartGroup {
    /// Consumes a chart substream up to its terminating `EOF`.
    ///
    /// The iterator must be positioned just past the substream's `BOF`
    /// record. Cached text is bound by scope: text inside a series
    /// group names that series, text outside any series group names
    /// the chart.
    pub(super) fn parse<R: Read + Seek>(
        iter: &mut RecordIter<R>,
        name: String,
        codepage: u16,
    ) -> XlsResult<Self> {
        let mut group = ChartGroup {
            name,
            title: None,
            series: Vec::new(),
        };
        let mut depth = 0usize;
        // Series index and the depth its group opened at.
        let mut scope: Vec<(usize, usize)> = Vec::new();
        let mut last_series: Option<usize> = None;
        let mut terminated = false;

        for record in iter.by_ref() {
            let record = record?;
            match record.code {
                biff::EOF => {
                    terminated = true;
                    break;
                }
                chart::BEGIN => {
                    depth += 1;
                    if let Some(index) = last_series.take() {
                        scope.push((index, depth));
                    }
                }
                chart::END => {
                    if let Some(&(_, opened_at)) = scope.last()
                        && opened_at == depth
                    {
                        scope.pop();
                    }
                    depth = depth.saturating_sub(1);
                    last_series = None;
                }
                chart::SERIES => {
                    let point_count = read_u16_le(&record.data, 6).unwrap_or(0);
                    group.series.push(Series {
                        name: None,
                        point_count,
                    });
                    last_series = Some(group.series.len() - 1);
                }
                chart::SERIES_TEXT => {
                    let (text, _) = read_unicode_string(&record.data, 2, CchWidth::Byte, codepage)?;
                    match scope.last() {
                        Some(&(index, _)) => {
                            let series = &mut group.series[index];
                            if series.name.is_none() {
                                series.name = Some(text);
                            }
                        }
                        None => {
                            if group.title.is_none() {
                                group.title = Some(text);
                            }
                        }
                    }
                }
                _ => last_series = None,
            }
        }
        if !terminated {
            return Err(XlsError::InvalidData(
                "chart substream missing EOF".to_string(),
            ));
        }
        Ok(group)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn rec(code: u16, payload: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(4 + payload.len());
        out.extend_from_slice(&code.to_le_bytes());
        out.extend_from_slice(&(payload.len() as u16).to_le_bytes());
        out.extend_from_slice(payload);
        out
    }

    fn series_payload(points: u16) -> Vec<u8> {
        let mut out = vec![1, 0, 1, 0, 0, 0];
        out.extend_from_slice(&points.to_le_bytes());
        out.extend_from_slice(&[0u8; 4]);
        out
    }

    fn series_text(text: &str) -> Vec<u8> {
        let mut out = vec![0, 0];
        out.push(text.len() as u8);
        out.push(0);
        out.extend_from_slice(text.as_bytes());
        out
    }

    fn parse(stream: Vec<u8>) -> XlsResult<ChartGroup> {
        let mut iter = RecordIter::new(Cursor::new(stream)).unwrap();
        ChartGroup::parse(&mut iter, "Chart".to_string(), 1252)
    }

    #[test]
    fn binds_names_to_their_series() {
        let mut stream = Vec::new();
        for name in ["Revenue", "Cost"] {
            stream.extend_from_slice(&rec(chart::SERIES, &series_payload(12)));
            stream.extend_from_slice(&rec(chart::BEGIN, &[]));
            stream.extend_from_slice(&rec(chart::SERIES_TEXT, &series_text(name)));
            stream.extend_from_slice(&rec(chart::END, &[]));
        }
        stream.extend_from_slice(&rec(biff::EOF, &[]));

        let group = parse(stream).unwrap();
        assert_eq!(group.series.len(), 2);
        assert_eq!(group.series[0].name.as_deref(), Some("Revenue"));
        assert_eq!(group.series[0].point_count, 12);
        assert_eq!(group.series[1].name.as_deref(), Some("Cost"));
        assert!(group.title.is_none());
    }

    #[test]
    fn text_outside_series_scope_becomes_title() {
        let mut stream = Vec::new();
        // Title text group, not attached to any series.
        stream.extend_from_slice(&rec(chart::BEGIN, &[]));
        stream.extend_from_slice(&rec(chart::SERIES_TEXT, &series_text("Annual Report")));
        stream.extend_from_slice(&rec(chart::END, &[]));
        stream.extend_from_slice(&rec(chart::SERIES, &series_payload(3)));
        stream.extend_from_slice(&rec(chart::BEGIN, &[]));
        stream.extend_from_slice(&rec(chart::SERIES_TEXT, &series_text("Revenue")));
        stream.extend_from_slice(&rec(chart::END, &[]));
        stream.extend_from_slice(&rec(biff::EOF, &[]));

        let group = parse(stream).unwrap();
        assert_eq!(group.title.as_deref(), Some("Annual Report"));
        assert_eq!(group.series.len(), 1);
        assert_eq!(group.series[0].name.as_deref(), Some("Revenue"));
    }

    #[test]
    fn nested_groups_keep_series_scope() {
        let mut stream = Vec::new();
        stream.extend_from_slice(&rec(chart::SERIES, &series_payload(5)));
        stream.extend_from_slice(&rec(chart::BEGIN, &[]));
        // A nested group inside the series, e.g. data format settings.
        stream.extend_from_slice(&rec(0x1006, &[0u8; 8]));
        stream.extend_from_slice(&rec(chart::BEGIN, &[]));
        stream.extend_from_slice(&rec(0x1007, &[0u8; 4]));
        stream.extend_from_slice(&rec(chart::END, &[]));
        stream.extend_from_slice(&rec(chart::SERIES_TEXT, &series_text("Deep")));
        stream.extend_from_slice(&rec(chart::END, &[]));
        stream.extend_from_slice(&rec(biff::EOF, &[]));

        let group = parse(stream).unwrap();
        assert_eq!(group.series[0].name.as_deref(), Some("Deep"));
    }

    #[test]
    fn missing_eof_is_an_error() {
        let stream = rec(chart::SERIES, &series_payload(1));
        assert!(matches!(parse(stream), Err(XlsError::InvalidData(_))));
    }
}

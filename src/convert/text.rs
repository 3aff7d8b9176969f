//! Plain-text rendering of parsed containers.

use super::{Mapping, Visitable};
use crate::common::Metadata;
use crate::ole::doc::Paragraph;
use crate::ole::ppt::Slide;
use crate::ole::xls::{CellValue, ChartGroup, Worksheet, error_text};

/// Renders any container as plain text.
///
/// Paragraphs become lines, worksheet rows become tab-separated lines
/// under the sheet name, slides keep their text blocks, and metadata
/// contributes title/author header lines. Everything else is ignored.
#[derive(Debug, Default)]
pub struct TextMapping {
    buffer: String,
}

impl TextMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Renders one container and returns the accumulated text.
    pub fn render<V: Visitable>(container: &V) -> String {
        let mut mapping = Self::new();
        container.convert(&mut mapping);
        mapping.into_string()
    }

    pub fn into_string(self) -> String {
        self.buffer
    }

    /// One blank line between sections, none at the start.
    fn separate(&mut self) {
        if !self.buffer.is_empty() && !self.buffer.ends_with("\n\n") {
            self.buffer.push('\n');
        }
    }

    fn push_value(&mut self, value: &CellValue) {
        match value {
            CellValue::Empty => {}
            CellValue::Number(n) => self.push_number(*n),
            CellValue::Text(text) => self.buffer.push_str(text),
            CellValue::Bool(true) => self.buffer.push_str("TRUE"),
            CellValue::Bool(false) => self.buffer.push_str("FALSE"),
            CellValue::Error(code) => self.buffer.push_str(error_text(*code)),
        }
    }

    /// Whole numbers print without a fraction, like the cell display.
    fn push_number(&mut self, value: f64) {
        if value.fract() == 0.0 && value.abs() < 1e15 {
            let mut buf = itoa::Buffer::new();
            self.buffer.push_str(buf.format(value as i64));
        } else {
            let mut buf = ryu::Buffer::new();
            self.buffer.push_str(buf.format(value));
        }
    }
}

impl Mapping for TextMapping {
    fn paragraph(&mut self, paragraph: &Paragraph) {
        self.buffer.push_str(&paragraph.text());
        self.buffer.push('\n');
    }

    fn worksheet(&mut self, sheet: &Worksheet) {
        self.separate();
        self.buffer.push_str(&sheet.name);
        self.buffer.push('\n');
        for (_, cells) in sheet.rows() {
            let mut first = true;
            for cell in cells {
                if !first {
                    self.buffer.push('\t');
                }
                first = false;
                self.push_value(&cell.value);
            }
            self.buffer.push('\n');
        }
    }

    fn chart_group(&mut self, chart: &ChartGroup) {
        self.separate();
        self.buffer.push_str(&chart.name);
        self.buffer.push('\n');
        if let Some(title) = &chart.title {
            self.buffer.push_str(title);
            self.buffer.push('\n');
        }
        for series in &chart.series {
            if let Some(name) = &series.name {
                self.buffer.push_str(name);
                self.buffer.push('\n');
            }
        }
    }

    fn slide(&mut self, slide: &Slide) {
        let text = slide.text();
        if !text.is_empty() {
            self.separate();
            self.buffer.push_str(&text);
            self.buffer.push('\n');
        }
    }

    fn metadata(&mut self, metadata: &Metadata) {
        for (label, value) in [
            ("Title", &metadata.title),
            ("Author", &metadata.author),
            ("Subject", &metadata.subject),
        ] {
            if let Some(value) = value {
                self.buffer.push_str(label);
                self.buffer.push_str(": ");
                self.buffer.push_str(value);
                self.buffer.push('\n');
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ole::doc::{Run, RunProperties, WordDocument};
    use crate::ole::xls::{Cell, Series, SheetVisibility};

    fn cell(row: u32, col: u16, value: CellValue) -> Cell {
        Cell {
            row,
            col,
            value,
            format: None,
        }
    }

    #[test]
    fn test_paragraphs_render_one_line_each() {
        let doc = WordDocument {
            paragraphs: vec![
                Paragraph {
                    runs: vec![Run {
                        text: "First line".to_string(),
                        properties: RunProperties::default(),
                    }],
                },
                Paragraph {
                    runs: vec![Run {
                        text: "Second line".to_string(),
                        properties: RunProperties::default(),
                    }],
                },
            ],
            ..WordDocument::default()
        };
        assert_eq!(TextMapping::render(&doc), "First line\nSecond line\n");
    }

    #[test]
    fn test_worksheet_rows_are_tab_separated() {
        let sheet = Worksheet {
            name: "Totals".to_string(),
            visibility: SheetVisibility::Visible,
            dimensions: None,
            cells: vec![
                cell(0, 0, CellValue::Text("Item".to_string())),
                cell(0, 1, CellValue::Number(42.0)),
                cell(1, 0, CellValue::Number(2.5)),
                cell(1, 1, CellValue::Bool(true)),
            ],
        };
        assert_eq!(
            TextMapping::render(&sheet),
            "Totals\nItem\t42\n2.5\tTRUE\n"
        );
    }

    #[test]
    fn test_error_cells_render_display_text() {
        let sheet = Worksheet {
            name: "Errors".to_string(),
            visibility: SheetVisibility::Visible,
            dimensions: None,
            cells: vec![cell(0, 0, CellValue::Error(0x07))],
        };
        assert_eq!(TextMapping::render(&sheet), "Errors\n#DIV/0!\n");
    }

    #[test]
    fn test_chart_group_lists_title_and_series() {
        let chart = ChartGroup {
            name: "Chart1".to_string(),
            title: Some("Revenue".to_string()),
            series: vec![
                Series {
                    name: Some("North".to_string()),
                    point_count: 4,
                },
                Series {
                    name: None,
                    point_count: 4,
                },
            ],
        };
        assert_eq!(TextMapping::render(&chart), "Chart1\nRevenue\nNorth\n");
    }

    #[test]
    fn test_slide_text_with_separator_between_slides() {
        let first = Slide {
            outline_text: vec!["Title".to_string()],
            ..Slide::default()
        };
        let second = Slide {
            outline_text: vec!["Body".to_string()],
            ..Slide::default()
        };
        let mut mapping = TextMapping::new();
        first.convert(&mut mapping);
        second.convert(&mut mapping);
        assert_eq!(mapping.into_string(), "Title\n\nBody\n");
    }

    #[test]
    fn test_metadata_header_lines() {
        let metadata = Metadata {
            title: Some("Quarterly".to_string()),
            author: Some("R. Zhu".to_string()),
            ..Metadata::default()
        };
        assert_eq!(
            TextMapping::render(&metadata),
            "Title: Quarterly\nAuthor: R. Zhu\n"
        );
    }

    #[test]
    fn test_empty_slide_adds_nothing() {
        let slide = Slide::default();
        assert_eq!(TextMapping::render(&slide), "");
    }
}

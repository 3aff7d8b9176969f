//! Conversion of parsed containers through a visitor/mapping protocol.
//!
//! Parsed containers know nothing about output formats. A [`Mapping`]
//! carries one method per container kind, every one a default no-op,
//! and an output format overrides just the kinds it renders. Calling
//! [`Visitable::convert`] on a container dispatches it to its own
//! method, then walks its parts; the container is never mutated.
//!
//! [`TextMapping`] is the reference consumer: a plain-text rendering
//! of any container.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use longan::convert::TextMapping;
//! use longan::ole::doc::Package;
//!
//! let mut pkg = Package::open("report.doc")?;
//! let doc = pkg.document()?;
//! println!("{}", TextMapping::render(&doc));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod text;

pub use text::TextMapping;

use crate::common::Metadata;
use crate::ole::doc::{FontTable, Paragraph, StyleSheet, WordDocument};
use crate::ole::escher::ShapeTree;
use crate::ole::ppt::{Presentation, Slide};
use crate::ole::xls::{ChartGroup, Workbook, Worksheet};

/// An output format: one method per container kind, all defaulted to
/// no-ops. Implementations override what they support and ignore the
/// rest.
pub trait Mapping {
    fn word_document(&mut self, _document: &WordDocument) {}

    fn font_table(&mut self, _fonts: &FontTable) {}

    fn style_sheet(&mut self, _styles: &StyleSheet) {}

    fn paragraph(&mut self, _paragraph: &Paragraph) {}

    fn workbook(&mut self, _workbook: &Workbook) {}

    fn worksheet(&mut self, _sheet: &Worksheet) {}

    fn chart_group(&mut self, _chart: &ChartGroup) {}

    fn presentation(&mut self, _presentation: &Presentation) {}

    fn slide(&mut self, _slide: &Slide) {}

    fn shape_tree(&mut self, _shapes: &ShapeTree) {}

    fn metadata(&mut self, _metadata: &Metadata) {}
}

/// A container that can hand itself to a [`Mapping`].
///
/// Composite containers dispatch themselves first, then their parts in
/// document order.
pub trait Visitable {
    fn convert<M: Mapping>(&self, mapping: &mut M);
}

impl Visitable for WordDocument {
    fn convert<M: Mapping>(&self, mapping: &mut M) {
        mapping.word_document(self);
        self.font_table.convert(mapping);
        self.style_sheet.convert(mapping);
        for paragraph in &self.paragraphs {
            paragraph.convert(mapping);
        }
    }
}

impl Visitable for FontTable {
    fn convert<M: Mapping>(&self, mapping: &mut M) {
        mapping.font_table(self);
    }
}

impl Visitable for StyleSheet {
    fn convert<M: Mapping>(&self, mapping: &mut M) {
        mapping.style_sheet(self);
    }
}

impl Visitable for Paragraph {
    fn convert<M: Mapping>(&self, mapping: &mut M) {
        mapping.paragraph(self);
    }
}

impl Visitable for Workbook {
    fn convert<M: Mapping>(&self, mapping: &mut M) {
        mapping.workbook(self);
        for sheet in self.worksheets() {
            sheet.convert(mapping);
        }
        for chart in self.charts() {
            chart.convert(mapping);
        }
    }
}

impl Visitable for Worksheet {
    fn convert<M: Mapping>(&self, mapping: &mut M) {
        mapping.worksheet(self);
    }
}

impl Visitable for ChartGroup {
    fn convert<M: Mapping>(&self, mapping: &mut M) {
        mapping.chart_group(self);
    }
}

impl Visitable for Presentation {
    fn convert<M: Mapping>(&self, mapping: &mut M) {
        mapping.presentation(self);
        for slide in self.slides() {
            slide.convert(mapping);
        }
    }
}

impl Visitable for Slide {
    fn convert<M: Mapping>(&self, mapping: &mut M) {
        mapping.slide(self);
        self.shapes.convert(mapping);
    }
}

impl Visitable for ShapeTree {
    fn convert<M: Mapping>(&self, mapping: &mut M) {
        mapping.shape_tree(self);
    }
}

impl Visitable for Metadata {
    fn convert<M: Mapping>(&self, mapping: &mut M) {
        mapping.metadata(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ole::doc::{Run, RunProperties};

    /// Counts dispatches per kind to check traversal order and
    /// coverage.
    #[derive(Default)]
    struct Recorder {
        calls: Vec<&'static str>,
    }

    impl Mapping for Recorder {
        fn word_document(&mut self, _document: &WordDocument) {
            self.calls.push("word_document");
        }

        fn font_table(&mut self, _fonts: &FontTable) {
            self.calls.push("font_table");
        }

        fn style_sheet(&mut self, _styles: &StyleSheet) {
            self.calls.push("style_sheet");
        }

        fn paragraph(&mut self, _paragraph: &Paragraph) {
            self.calls.push("paragraph");
        }

        fn presentation(&mut self, _presentation: &Presentation) {
            self.calls.push("presentation");
        }

        fn slide(&mut self, _slide: &Slide) {
            self.calls.push("slide");
        }

        fn shape_tree(&mut self, _shapes: &ShapeTree) {
            self.calls.push("shape_tree");
        }
    }

    fn paragraph(text: &str) -> Paragraph {
        Paragraph {
            runs: vec![Run {
                text: text.to_string(),
                properties: RunProperties::default(),
            }],
        }
    }

    #[test]
    fn test_document_dispatches_itself_then_parts() {
        let doc = WordDocument {
            paragraphs: vec![paragraph("one"), paragraph("two")],
            ..WordDocument::default()
        };
        let mut recorder = Recorder::default();
        doc.convert(&mut recorder);
        assert_eq!(
            recorder.calls,
            vec![
                "word_document",
                "font_table",
                "style_sheet",
                "paragraph",
                "paragraph"
            ]
        );
    }

    #[test]
    fn test_default_methods_ignore_unhandled_kinds() {
        struct Nothing;
        impl Mapping for Nothing {}

        let doc = WordDocument {
            paragraphs: vec![paragraph("ignored")],
            ..WordDocument::default()
        };
        let mut nothing = Nothing;
        doc.convert(&mut nothing);
        Metadata::default().convert(&mut nothing);
    }

    #[test]
    fn test_presentation_dispatches_slides_and_shapes() {
        use bytes::Bytes;

        let pres = Presentation::from_document_stream(Bytes::new());
        let mut recorder = Recorder::default();
        pres.convert(&mut recorder);
        assert_eq!(recorder.calls, vec!["presentation"]);

        let slide = Slide::default();
        recorder.calls.clear();
        slide.convert(&mut recorder);
        assert_eq!(recorder.calls, vec!["slide", "shape_tree"]);
    }
}

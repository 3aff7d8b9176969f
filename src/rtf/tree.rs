//! Tree builder: folds the token stream into paragraphs, side tables
//! and document metadata.
//!
//! The builder keeps one [`GroupScope`] per open group. Opening a group
//! saves the current scope; closing one restores it, finalizing any
//! destination the group had entered (a font table entry, an `\info`
//! field). Text is routed by the scope's destination, so `\fonttbl`
//! names never leak into the body and skipped destinations vanish
//! entirely.

use phf::phf_map;
use smallvec::SmallVec;
use tracing::{debug, warn};

use super::error::{RtfError, RtfResult};
use super::lexer::{ControlWord, Lexer, Token};
use super::node::{Node, Paragraph, Run};
use super::types::{
    Alignment, CharFormat, Color, ColorTable, Font, FontFamily, FontRef, FontTable, StyleDef,
    StyleKind,
};
use crate::common::Metadata;

/// Where text currently lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Destination {
    Body,
    FontTable,
    ColorTable,
    StyleSheet,
    Info,
    InfoField(InfoField),
    Skip,
}

/// `\info` entries that map onto [`Metadata`] fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InfoField {
    Title,
    Author,
    Subject,
    Keywords,
    Comment,
    Operator,
    Company,
    Manager,
    Category,
}

/// Formatting state of one open group.
#[derive(Debug, Clone, Copy)]
struct GroupScope {
    format: CharFormat,
    alignment: Alignment,
    destination: Destination,
}

impl Default for GroupScope {
    fn default() -> Self {
        Self {
            format: CharFormat::default(),
            alignment: Alignment::default(),
            destination: Destination::Body,
        }
    }
}

/// What a recognized control word means to the builder.
#[derive(Debug, Clone, Copy)]
enum WordKind {
    Rtf,
    /// Recognized but fully handled elsewhere or carrying no state.
    Ignored,
    DefaultFont,
    FontTableDest,
    ColorTableDest,
    StyleSheetDest,
    InfoDest,
    SkipDest,
    /// `\field` and `\fldrslt` groups are transparent wrappers.
    Transparent,
    InfoEntry(InfoField),
    FontNumber,
    FontSize,
    FontCharset,
    Family(FontFamily),
    Red,
    Green,
    Blue,
    Foreground,
    Bold,
    Italic,
    Underline,
    UnderlineNone,
    Strike,
    Superscript,
    Subscript,
    Plain,
    Par,
    ParDefault,
    Line,
    Tab,
    Page,
    Cell,
    Row,
    Align(Alignment),
    Style(StyleKind),
    Literal(char),
}

static CONTROL_WORDS: phf::Map<&'static str, WordKind> = phf_map! {
    "rtf" => WordKind::Rtf,
    "ansi" => WordKind::Ignored,
    "mac" => WordKind::Ignored,
    "pc" => WordKind::Ignored,
    "pca" => WordKind::Ignored,
    "ansicpg" => WordKind::Ignored,
    "uc" => WordKind::Ignored,
    "deflang" => WordKind::Ignored,
    "deff" => WordKind::DefaultFont,
    "fonttbl" => WordKind::FontTableDest,
    "colortbl" => WordKind::ColorTableDest,
    "stylesheet" => WordKind::StyleSheetDest,
    "info" => WordKind::InfoDest,
    "pict" => WordKind::SkipDest,
    "object" => WordKind::SkipDest,
    "header" => WordKind::SkipDest,
    "footer" => WordKind::SkipDest,
    "footnote" => WordKind::SkipDest,
    "fldinst" => WordKind::SkipDest,
    "field" => WordKind::Transparent,
    "fldrslt" => WordKind::Transparent,
    "title" => WordKind::InfoEntry(InfoField::Title),
    "author" => WordKind::InfoEntry(InfoField::Author),
    "subject" => WordKind::InfoEntry(InfoField::Subject),
    "keywords" => WordKind::InfoEntry(InfoField::Keywords),
    "doccomm" => WordKind::InfoEntry(InfoField::Comment),
    "operator" => WordKind::InfoEntry(InfoField::Operator),
    "company" => WordKind::InfoEntry(InfoField::Company),
    "manager" => WordKind::InfoEntry(InfoField::Manager),
    "category" => WordKind::InfoEntry(InfoField::Category),
    "f" => WordKind::FontNumber,
    "fs" => WordKind::FontSize,
    "fcharset" => WordKind::FontCharset,
    "fnil" => WordKind::Family(FontFamily::Nil),
    "froman" => WordKind::Family(FontFamily::Roman),
    "fswiss" => WordKind::Family(FontFamily::Swiss),
    "fmodern" => WordKind::Family(FontFamily::Modern),
    "fscript" => WordKind::Family(FontFamily::Script),
    "fdecor" => WordKind::Family(FontFamily::Decor),
    "ftech" => WordKind::Family(FontFamily::Tech),
    "red" => WordKind::Red,
    "green" => WordKind::Green,
    "blue" => WordKind::Blue,
    "cf" => WordKind::Foreground,
    "b" => WordKind::Bold,
    "i" => WordKind::Italic,
    "ul" => WordKind::Underline,
    "ulnone" => WordKind::UnderlineNone,
    "strike" => WordKind::Strike,
    "super" => WordKind::Superscript,
    "sub" => WordKind::Subscript,
    "plain" => WordKind::Plain,
    "par" => WordKind::Par,
    "pard" => WordKind::ParDefault,
    "line" => WordKind::Line,
    "tab" => WordKind::Tab,
    "page" => WordKind::Page,
    "cell" => WordKind::Cell,
    "row" => WordKind::Row,
    "ql" => WordKind::Align(Alignment::Left),
    "qc" => WordKind::Align(Alignment::Center),
    "qr" => WordKind::Align(Alignment::Right),
    "qj" => WordKind::Align(Alignment::Justify),
    "s" => WordKind::Style(StyleKind::Paragraph),
    "cs" => WordKind::Style(StyleKind::Character),
    "ds" => WordKind::Style(StyleKind::Section),
    "emdash" => WordKind::Literal('\u{2014}'),
    "endash" => WordKind::Literal('\u{2013}'),
    "lquote" => WordKind::Literal('\u{2018}'),
    "rquote" => WordKind::Literal('\u{2019}'),
    "ldblquote" => WordKind::Literal('\u{201c}'),
    "rdblquote" => WordKind::Literal('\u{201d}'),
    "bullet" => WordKind::Literal('\u{2022}'),
    "emspace" => WordKind::Literal('\u{2003}'),
    "enspace" => WordKind::Literal('\u{2002}'),
    "qmspace" => WordKind::Literal('\u{2005}'),
};

/// Font table entry under construction.
#[derive(Debug, Default)]
struct PendingFont {
    index: FontRef,
    family: FontFamily,
    charset: u8,
    name: String,
}

/// Color table entry under construction. `seen` distinguishes a real
/// entry from the table's implicit auto color.
#[derive(Debug, Default)]
struct PendingColor {
    color: Color,
    seen: bool,
}

/// Style sheet entry under construction.
#[derive(Debug, Default)]
struct PendingStyle {
    id: u16,
    kind: StyleKind,
    name: String,
}

/// Everything the builder produces from one token stream.
#[derive(Debug)]
pub(super) struct BuiltDocument {
    pub nodes: Vec<Node>,
    pub fonts: FontTable,
    pub colors: ColorTable,
    pub styles: Vec<StyleDef>,
    pub metadata: Metadata,
}

/// Single-pass builder over the lexer's token stream.
pub(super) struct TreeBuilder {
    current: GroupScope,
    stack: SmallVec<[GroupScope; 8]>,
    nodes: Vec<Node>,
    runs: Vec<Run>,
    pending_text: String,
    pending_format: CharFormat,
    fonts: FontTable,
    colors: ColorTable,
    styles: Vec<StyleDef>,
    metadata: Metadata,
    default_font: FontRef,
    pending_font: Option<PendingFont>,
    pending_color: PendingColor,
    pending_style: Option<PendingStyle>,
    info_text: String,
    ignorable: bool,
}

impl TreeBuilder {
    pub(super) fn new() -> Self {
        Self {
            current: GroupScope::default(),
            stack: SmallVec::new(),
            nodes: Vec::new(),
            runs: Vec::new(),
            pending_text: String::new(),
            pending_format: CharFormat::default(),
            fonts: FontTable::default(),
            colors: ColorTable::default(),
            styles: Vec::new(),
            metadata: Metadata::default(),
            default_font: 0,
            pending_font: None,
            pending_color: PendingColor::default(),
            pending_style: None,
            info_text: String::new(),
            ignorable: false,
        }
    }

    /// Consumes the token stream. An unbalanced group end is treated as
    /// the end of the document rather than a fatal error; groups still
    /// open at that point are closed implicitly.
    pub(super) fn build(mut self, lexer: Lexer<'_>) -> RtfResult<BuiltDocument> {
        for item in lexer {
            match item {
                Ok(token) => self.token(token),
                Err(RtfError::UnbalancedGroup(detail)) => {
                    warn!("unbalanced group, treating as document end: {detail}");
                    break;
                }
                Err(err) => return Err(err),
            }
        }
        Ok(self.finish())
    }

    fn token(&mut self, token: Token<'_>) {
        let ignorable = std::mem::take(&mut self.ignorable);
        match token {
            Token::GroupStart => self.stack.push(self.current),
            Token::GroupEnd => match self.stack.pop() {
                Some(parent) => self.leave_scope(parent),
                None => debug!("group end with no saved scope"),
            },
            Token::Control(word) => self.control(word, ignorable),
            Token::Symbol(b'*') => self.ignorable = true,
            Token::Symbol(symbol) => debug!("unhandled control symbol 0x{symbol:02x}"),
            Token::Text(text) if !text.is_empty() => self.append_text(text),
            Token::Text(_) => {}
            Token::Binary(data) => debug!("dropping {} bytes of inline binary data", data.len()),
        }
    }

    fn leave_scope(&mut self, parent: GroupScope) {
        if self.current.destination != parent.destination {
            self.close_destination(self.current.destination);
        }
        self.current = parent;
    }

    /// Finalizes whatever the destination was accumulating.
    fn close_destination(&mut self, destination: Destination) {
        match destination {
            Destination::FontTable => self.flush_font(),
            Destination::ColorTable => {
                let pending = std::mem::take(&mut self.pending_color);
                if pending.seen {
                    self.colors.push(pending.color);
                }
            }
            Destination::StyleSheet => self.flush_style(),
            Destination::InfoField(field) => {
                let text = std::mem::take(&mut self.info_text);
                self.set_info_field(field, text);
            }
            Destination::Body | Destination::Info | Destination::Skip => {}
        }
    }

    fn set_destination(&mut self, destination: Destination) {
        // Sibling info fields can share one group; finalize the old
        // field before switching so its text is not misattributed.
        if let Destination::InfoField(field) = self.current.destination
            && self.current.destination != destination
        {
            let text = std::mem::take(&mut self.info_text);
            self.set_info_field(field, text);
        }
        self.current.destination = destination;
    }

    fn control(&mut self, word: ControlWord<'_>, ignorable: bool) {
        let Some(&kind) = CONTROL_WORDS.get(word.name) else {
            if ignorable {
                // \* skips the whole group when its destination word
                // is not understood.
                self.set_destination(Destination::Skip);
            }
            return;
        };
        if self.current.destination == Destination::Skip {
            return;
        }
        match kind {
            WordKind::Rtf | WordKind::Ignored | WordKind::Transparent => {}
            WordKind::DefaultFont => {
                let index = clamp_u16(word.param.unwrap_or(0));
                self.default_font = index;
                self.current.format.font = index;
            }
            WordKind::FontTableDest => self.set_destination(Destination::FontTable),
            WordKind::ColorTableDest => {
                self.pending_color = PendingColor::default();
                self.set_destination(Destination::ColorTable);
            }
            WordKind::StyleSheetDest => self.set_destination(Destination::StyleSheet),
            WordKind::InfoDest => self.set_destination(Destination::Info),
            WordKind::SkipDest => self.set_destination(Destination::Skip),
            WordKind::InfoEntry(field) => self.set_destination(Destination::InfoField(field)),
            WordKind::FontNumber => {
                if self.current.destination == Destination::FontTable {
                    self.flush_font();
                    self.pending_font = Some(PendingFont {
                        index: clamp_u16(word.param.unwrap_or(0)),
                        ..PendingFont::default()
                    });
                } else {
                    self.current.format.font = clamp_u16(word.param.unwrap_or(0));
                }
            }
            WordKind::FontSize => {
                self.current.format.size = clamp_u16(word.param.unwrap_or(24));
            }
            WordKind::FontCharset => {
                if self.current.destination == Destination::FontTable
                    && let Some(font) = self.pending_font.as_mut()
                {
                    font.charset = clamp_u8(word.param);
                }
            }
            WordKind::Family(family) => {
                if self.current.destination == Destination::FontTable
                    && let Some(font) = self.pending_font.as_mut()
                {
                    font.family = family;
                }
            }
            WordKind::Red => {
                if self.current.destination == Destination::ColorTable {
                    self.pending_color.color.red = clamp_u8(word.param);
                    self.pending_color.seen = true;
                }
            }
            WordKind::Green => {
                if self.current.destination == Destination::ColorTable {
                    self.pending_color.color.green = clamp_u8(word.param);
                    self.pending_color.seen = true;
                }
            }
            WordKind::Blue => {
                if self.current.destination == Destination::ColorTable {
                    self.pending_color.color.blue = clamp_u8(word.param);
                    self.pending_color.seen = true;
                }
            }
            WordKind::Foreground => {
                self.current.format.color = Some(clamp_u16(word.param.unwrap_or(0)));
            }
            WordKind::Bold => self.current.format.bold = word.flag(),
            WordKind::Italic => self.current.format.italic = word.flag(),
            WordKind::Underline => self.current.format.underline = word.flag(),
            WordKind::UnderlineNone => self.current.format.underline = false,
            WordKind::Strike => self.current.format.strike = word.flag(),
            WordKind::Superscript => {
                self.current.format.superscript = word.flag();
                if self.current.format.superscript {
                    self.current.format.subscript = false;
                }
            }
            WordKind::Subscript => {
                self.current.format.subscript = word.flag();
                if self.current.format.subscript {
                    self.current.format.superscript = false;
                }
            }
            WordKind::Plain => {
                self.current.format = CharFormat {
                    font: self.default_font,
                    ..CharFormat::default()
                };
            }
            WordKind::Par => self.end_paragraph(),
            WordKind::ParDefault => self.current.alignment = Alignment::default(),
            WordKind::Line => self.append_text("\n"),
            WordKind::Tab | WordKind::Cell => self.append_text("\t"),
            WordKind::Row => self.end_paragraph(),
            WordKind::Page => self.page_break(),
            WordKind::Align(alignment) => self.current.alignment = alignment,
            WordKind::Style(style_kind) => {
                if self.current.destination == Destination::StyleSheet {
                    self.flush_style();
                    self.pending_style = Some(PendingStyle {
                        id: clamp_u16(word.param.unwrap_or(0)),
                        kind: style_kind,
                        name: String::new(),
                    });
                }
            }
            WordKind::Literal(c) => {
                let mut buffer = [0u8; 4];
                self.append_text(c.encode_utf8(&mut buffer));
            }
        }
    }

    fn append_text(&mut self, text: &str) {
        match self.current.destination {
            Destination::Body => self.body_text(text),
            Destination::FontTable => self.font_text(text),
            Destination::ColorTable => self.color_text(text),
            Destination::StyleSheet => self.style_text(text),
            Destination::InfoField(_) => self.info_text.push_str(text),
            Destination::Info | Destination::Skip => {}
        }
    }

    /// Body text starts or extends the pending run; a formatting change
    /// since the run began splits it.
    fn body_text(&mut self, text: &str) {
        if self.pending_text.is_empty() {
            self.pending_format = self.current.format;
        } else if self.pending_format != self.current.format {
            self.flush_run();
            self.pending_format = self.current.format;
        }
        self.pending_text.push_str(text);
    }

    fn flush_run(&mut self) {
        if self.pending_text.is_empty() {
            return;
        }
        self.runs.push(Run {
            text: std::mem::take(&mut self.pending_text),
            format: self.pending_format,
        });
    }

    /// Empty paragraphs are kept: each stands for a `\par` in the
    /// source.
    fn end_paragraph(&mut self) {
        self.flush_run();
        self.nodes.push(Node::Paragraph(Paragraph {
            alignment: self.current.alignment,
            runs: std::mem::take(&mut self.runs),
        }));
    }

    fn page_break(&mut self) {
        self.flush_run();
        if !self.runs.is_empty() {
            self.nodes.push(Node::Paragraph(Paragraph {
                alignment: self.current.alignment,
                runs: std::mem::take(&mut self.runs),
            }));
        }
        self.nodes.push(Node::PageBreak);
    }

    fn font_text(&mut self, text: &str) {
        for c in text.chars() {
            if c == ';' {
                self.flush_font();
            } else if let Some(font) = self.pending_font.as_mut() {
                font.name.push(c);
            }
        }
    }

    fn flush_font(&mut self) {
        let Some(pending) = self.pending_font.take() else {
            return;
        };
        let name = pending.name.trim().to_string();
        if name.is_empty() {
            debug!("font {} has no name, dropping the entry", pending.index);
            return;
        }
        self.fonts.insert(
            pending.index,
            Font {
                name,
                family: pending.family,
                charset: pending.charset,
            },
        );
    }

    fn color_text(&mut self, text: &str) {
        for c in text.chars() {
            if c == ';' {
                // Every separator closes an entry; one with no
                // components is the implicit auto color.
                let pending = std::mem::take(&mut self.pending_color);
                self.colors.push(pending.color);
            }
        }
    }

    fn style_text(&mut self, text: &str) {
        for c in text.chars() {
            if c == ';' {
                self.flush_style();
            } else if let Some(style) = self.pending_style.as_mut() {
                style.name.push(c);
            } else if !c.is_whitespace() {
                // The default style entry carries no style word.
                self.pending_style = Some(PendingStyle {
                    name: c.to_string(),
                    ..PendingStyle::default()
                });
            }
        }
    }

    fn flush_style(&mut self) {
        let Some(pending) = self.pending_style.take() else {
            return;
        };
        let name = pending.name.trim().to_string();
        if name.is_empty() {
            return;
        }
        self.styles.push(StyleDef {
            id: pending.id,
            kind: pending.kind,
            name,
        });
    }

    fn set_info_field(&mut self, field: InfoField, text: String) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        let slot = match field {
            InfoField::Title => &mut self.metadata.title,
            InfoField::Author => &mut self.metadata.author,
            InfoField::Subject => &mut self.metadata.subject,
            InfoField::Keywords => &mut self.metadata.keywords,
            InfoField::Comment => &mut self.metadata.description,
            InfoField::Operator => &mut self.metadata.last_modified_by,
            InfoField::Company => &mut self.metadata.company,
            InfoField::Manager => &mut self.metadata.manager,
            InfoField::Category => &mut self.metadata.category,
        };
        *slot = Some(text.to_string());
    }

    fn finish(mut self) -> BuiltDocument {
        // Trailing text without \par still forms a final paragraph.
        self.flush_run();
        if !self.runs.is_empty() {
            self.nodes.push(Node::Paragraph(Paragraph {
                alignment: self.current.alignment,
                runs: std::mem::take(&mut self.runs),
            }));
        }
        // Implicit close of groups left open at end of input.
        while let Some(parent) = self.stack.pop() {
            self.leave_scope(parent);
        }
        BuiltDocument {
            nodes: self.nodes,
            fonts: self.fonts,
            colors: self.colors,
            styles: self.styles,
            metadata: self.metadata,
        }
    }
}

fn clamp_u16(value: i32) -> u16 {
    value.clamp(0, i32::from(u16::MAX)) as u16
}

fn clamp_u8(param: Option<i32>) -> u8 {
    param.unwrap_or(0).clamp(0, 255) as u8
}

#[cfg(test)]
mod tests {
    use bumpalo::Bump;

    use super::*;

    fn build(input: &[u8]) -> BuiltDocument {
        let arena = Bump::new();
        let lexer = Lexer::new(input, &arena);
        TreeBuilder::new().build(lexer).unwrap()
    }

    fn paragraph(node: &Node) -> &Paragraph {
        match node {
            Node::Paragraph(paragraph) => paragraph,
            Node::PageBreak => panic!("expected a paragraph, got a page break"),
        }
    }

    #[test]
    fn test_runs_split_on_format_change() {
        let built = build(br"{\rtf1 plain {\b bold}tail}");

        assert_eq!(built.nodes.len(), 1);
        let runs = &paragraph(&built.nodes[0]).runs;
        assert_eq!(runs.len(), 3);
        assert_eq!(runs[0].text, "plain ");
        assert!(!runs[0].format.bold);
        assert_eq!(runs[1].text, "bold");
        assert!(runs[1].format.bold);
        assert_eq!(runs[2].text, "tail");
        assert!(!runs[2].format.bold);
    }

    #[test]
    fn test_paragraph_alignment_and_pard_reset() {
        let built = build(br"{\rtf1\qc centered\par\pard left\par}");

        assert_eq!(built.nodes.len(), 2);
        let first = paragraph(&built.nodes[0]);
        assert_eq!(first.alignment, Alignment::Center);
        assert_eq!(first.text(), "centered");
        let second = paragraph(&built.nodes[1]);
        assert_eq!(second.alignment, Alignment::Left);
        assert_eq!(second.text(), "left");
    }

    #[test]
    fn test_empty_paragraphs_are_kept() {
        let built = build(br"{\rtf1\par\par}");

        assert_eq!(built.nodes.len(), 2);
        assert!(paragraph(&built.nodes[0]).runs.is_empty());
        assert!(paragraph(&built.nodes[1]).runs.is_empty());
    }

    #[test]
    fn test_font_table_entries() {
        let built = build(
            br"{\rtf1{\fonttbl{\f0\fswiss\fcharset0 Arial;}{\f1\fmodern Courier New;}}body}",
        );

        assert_eq!(built.fonts.len(), 2);
        let arial = built.fonts.get(0).unwrap();
        assert_eq!(arial.name, "Arial");
        assert_eq!(arial.family, FontFamily::Swiss);
        assert_eq!(arial.charset, 0);
        let courier = built.fonts.get(1).unwrap();
        assert_eq!(courier.name, "Courier New");
        assert_eq!(courier.family, FontFamily::Modern);

        assert_eq!(paragraph(&built.nodes[0]).text(), "body");
    }

    #[test]
    fn test_font_entry_without_terminator_flushes_on_close() {
        let built = build(br"{\rtf1{\fonttbl{\f2 Symbol}}}");

        assert_eq!(built.fonts.len(), 1);
        assert_eq!(built.fonts.get(2).unwrap().name, "Symbol");
    }

    #[test]
    fn test_color_table_with_leading_auto_entry() {
        let built = build(br"{\rtf1{\colortbl;\red255\green0\blue0;\red0\green0\blue255;}}");

        assert_eq!(built.colors.len(), 3);
        assert_eq!(built.colors.get(0), Some(&Color::default()));
        assert_eq!(built.colors.get(1), Some(&Color::new(255, 0, 0)));
        assert_eq!(built.colors.get(2), Some(&Color::new(0, 0, 255)));
    }

    #[test]
    fn test_stylesheet_entries() {
        let built = build(br"{\rtf1{\stylesheet{\s0 Normal;}{\cs15 Emphasis;}}}");

        assert_eq!(built.styles.len(), 2);
        assert_eq!(built.styles[0].id, 0);
        assert_eq!(built.styles[0].kind, StyleKind::Paragraph);
        assert_eq!(built.styles[0].name, "Normal");
        assert_eq!(built.styles[1].id, 15);
        assert_eq!(built.styles[1].kind, StyleKind::Character);
        assert_eq!(built.styles[1].name, "Emphasis");
    }

    #[test]
    fn test_info_fields_populate_metadata() {
        let built = build(
            br"{\rtf1{\info{\title Quarterly Report}{\author R. Zhu}{\operator M. Chen}}}",
        );

        assert_eq!(built.metadata.title.as_deref(), Some("Quarterly Report"));
        assert_eq!(built.metadata.author.as_deref(), Some("R. Zhu"));
        assert_eq!(built.metadata.last_modified_by.as_deref(), Some("M. Chen"));
        assert!(built.metadata.subject.is_none());
    }

    #[test]
    fn test_unknown_ignorable_destination_is_skipped() {
        let built = build(br"{\rtf1 keep{\*\generator Writer 7.1;}\par}");

        assert_eq!(built.nodes.len(), 1);
        assert_eq!(paragraph(&built.nodes[0]).text(), "keep");
        assert!(built.colors.is_empty());
    }

    #[test]
    fn test_field_result_kept_instruction_dropped() {
        let built =
            build(br#"{\rtf1{\field{\*\fldinst HYPERLINK "http://x"}{\fldrslt shown}}\par}"#);

        assert_eq!(built.nodes.len(), 1);
        assert_eq!(paragraph(&built.nodes[0]).text(), "shown");
    }

    #[test]
    fn test_special_character_words() {
        let built = build(br"{\rtf1 a\emdash b\tab c\par}");

        assert_eq!(paragraph(&built.nodes[0]).text(), "a\u{2014}b\tc");
    }

    #[test]
    fn test_page_break_between_paragraphs() {
        let built = build(br"{\rtf1 one\page two\par}");

        assert_eq!(built.nodes.len(), 3);
        assert_eq!(paragraph(&built.nodes[0]).text(), "one");
        assert_eq!(built.nodes[1], Node::PageBreak);
        assert_eq!(paragraph(&built.nodes[2]).text(), "two");
    }

    #[test]
    fn test_table_row_flattens_to_tabs() {
        let built = build(br"{\rtf1\trowd A\cell B\cell\row}");

        assert_eq!(built.nodes.len(), 1);
        assert_eq!(paragraph(&built.nodes[0]).text(), "A\tB\t");
    }

    #[test]
    fn test_plain_resets_to_document_default_font() {
        let built = build(br"{\rtf1\deff1\b\i styled\plain after\par}");

        let runs = &paragraph(&built.nodes[0]).runs;
        assert_eq!(runs.len(), 2);
        assert!(runs[0].format.bold);
        assert!(runs[0].format.italic);
        assert_eq!(runs[0].format.font, 1);
        assert!(!runs[1].format.bold);
        assert_eq!(runs[1].format.font, 1);
    }

    #[test]
    fn test_truncated_info_group_still_finalizes() {
        let built = build(br"{\rtf1{\info{\title Cut Off");

        assert_eq!(built.metadata.title.as_deref(), Some("Cut Off"));
    }

    #[test]
    fn test_unbalanced_group_end_finishes_document() {
        let built = build(br"{\rtf1 before}}after\par");

        assert_eq!(built.nodes.len(), 1);
        assert_eq!(paragraph(&built.nodes[0]).text(), "before");
    }
}

//! Presentation structure: slides, outline text, fonts and shapes.
//!
//! The "PowerPoint Document" stream is one record tree. Slide text lives
//! in two places: the outline (`SlideListWithText` groups under the
//! `Document` container) and the per-slide drawing (`PPDrawing` payloads
//! holding Escher shapes whose textboxes carry text atoms). Both are
//! collected here. Cross-references (slide to master) are resolved in a
//! second pass once every container has been parsed.

use std::io::{Read, Seek};

use bytes::Bytes;
use tracing::{debug, warn};

use super::package::{PptError, Result};
use crate::common::binary::{parse_utf16le_string, read_i32_le};
use crate::common::encoding::decode_bytes;
use crate::ole::escher::ShapeTree;
use crate::ole::record::families::presentation as pres;
use crate::ole::record::{ParseOptions, RecordFamily, RecordNode, parse_stream};
use crate::ole::{OleError, OleFile};

/// A font registered in the presentation's font collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontEntity {
    /// Collection index, referenced by text formatting.
    pub index: u16,
    pub name: String,
}

/// One slide: outline text, drawing text and the shape tree.
#[derive(Debug, Clone, Default)]
pub struct Slide {
    /// Zero-based position in the presentation.
    pub index: usize,
    /// Identifier from the slide's persist entry.
    pub slide_id: Option<i32>,
    /// Identifier of the master this slide references.
    pub master_id: Option<i32>,
    /// Position of the referenced master in [`Presentation::masters`],
    /// resolved after all containers are parsed.
    pub master_index: Option<usize>,
    /// Text blocks from the outline, in order.
    pub outline_text: Vec<String>,
    /// Text found in the slide's drawing textboxes.
    pub shape_text: Vec<String>,
    /// Shapes from the slide's drawing container.
    pub shapes: ShapeTree,
}

impl Slide {
    /// All text of the slide. Outline text first, then drawing text
    /// that the outline does not carry.
    pub fn text(&self) -> String {
        let mut parts: Vec<&str> = self.outline_text.iter().map(String::as_str).collect();
        for text in &self.shape_text {
            if !self.outline_text.contains(text) {
                parts.push(text);
            }
        }
        parts.join("\n")
    }
}

/// A parsed presentation.
///
/// # Examples
///
/// ```rust,no_run
/// use longan::ole::ppt::Package;
///
/// let mut pkg = Package::open("deck.ppt")?;
/// let pres = pkg.presentation()?;
/// println!("{} slides", pres.slide_count());
/// println!("{}", pres.text());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Presentation {
    slides: Vec<Slide>,
    masters: Vec<Slide>,
    fonts: Vec<FontEntity>,
}

impl Presentation {
    pub(crate) fn from_ole<R: Read + Seek>(ole: &mut OleFile<R>) -> Result<Self> {
        let data = ole
            .open_stream(&["PowerPoint Document"])
            .map_err(|err| match err {
                OleError::StreamNotFound => {
                    PptError::StreamNotFound("PowerPoint Document".to_string())
                }
                other => PptError::Ole(other),
            })?;
        Ok(Self::from_document_stream(Bytes::from(data)))
    }

    /// Parses a raw "PowerPoint Document" stream.
    ///
    /// An empty or unrecognizable stream yields an empty presentation;
    /// damage never loses the slides that did parse.
    pub fn from_document_stream(data: Bytes) -> Self {
        let options = ParseOptions::default();
        let nodes = parse_stream(data, RecordFamily::Presentation, &options);

        // Incremental saves append whole Document containers; the last
        // one reflects the most recent edit.
        let document = nodes.iter().filter(|n| n.code() == pres::DOCUMENT).next_back();

        let mut fonts = Vec::new();
        let mut slide_groups = Vec::new();
        let mut master_groups = Vec::new();
        if let Some(doc) = document {
            if let Some(collection) = doc.find_descendant(pres::FONT_COLLECTION) {
                for entity in collection.find_children(pres::FONT_ENTITY_ATOM) {
                    let zone = &entity.data[..entity.data.len().min(64)];
                    let name = parse_utf16le_string(zone);
                    if name.is_empty() {
                        debug!("font entity {} has no name", entity.header.instance);
                        continue;
                    }
                    fonts.push(FontEntity {
                        index: entity.header.instance,
                        name,
                    });
                }
            }
            for list in doc.find_children(pres::SLIDE_LIST_WITH_TEXT) {
                match list.header.instance {
                    0 => slide_groups.extend(collect_text_groups(list)),
                    1 => master_groups.extend(collect_text_groups(list)),
                    // Notes lists are not extracted.
                    _ => {}
                }
            }
        }

        let slide_containers: Vec<&RecordNode> =
            nodes.iter().filter(|n| n.code() == pres::SLIDE).collect();
        let master_containers: Vec<&RecordNode> =
            nodes.iter().filter(|n| n.code() == pres::MAIN_MASTER).collect();

        let mut slides = build_slides(slide_groups, &slide_containers, &options);
        let masters = build_slides(master_groups, &master_containers, &options);

        // Second pass: bind each slide to its master, leaving the
        // reference unresolved when the master is missing.
        for slide in &mut slides {
            slide.master_index = slide.master_id.and_then(|id| {
                let found = masters.iter().position(|m| m.slide_id == Some(id));
                if found.is_none() && id != 0 {
                    debug!("slide {} references unknown master {id}", slide.index);
                }
                found
            });
        }

        Self {
            slides,
            masters,
            fonts,
        }
    }

    pub fn slides(&self) -> &[Slide] {
        &self.slides
    }

    pub fn masters(&self) -> &[Slide] {
        &self.masters
    }

    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }

    /// Fonts from the presentation's font collection.
    pub fn fonts(&self) -> &[FontEntity] {
        &self.fonts
    }

    /// Looks up a font by collection index.
    pub fn font(&self, index: u16) -> Option<&FontEntity> {
        self.fonts.iter().find(|f| f.index == index)
    }

    /// All slide text, slides separated by blank lines.
    pub fn text(&self) -> String {
        let parts: Vec<String> = self
            .slides
            .iter()
            .map(Slide::text)
            .filter(|t| !t.is_empty())
            .collect();
        parts.join("\n\n")
    }
}

/// Outline text grouped per slide persist entry.
struct TextGroup {
    slide_id: Option<i32>,
    texts: Vec<String>,
}

fn collect_text_groups(list: &RecordNode) -> Vec<TextGroup> {
    let mut groups: Vec<TextGroup> = Vec::new();
    for child in &list.children {
        if child.code() == pres::SLIDE_PERSIST_ATOM {
            groups.push(TextGroup {
                slide_id: read_i32_le(&child.data, 12).ok(),
                texts: Vec::new(),
            });
        } else if let Some(text) = decode_text_atom(child) {
            match groups.last_mut() {
                Some(group) => group.texts.push(text),
                None => debug!("text atom before any persist entry in slide list"),
            }
        }
    }
    groups
}

/// Pairs outline groups with slide containers by position.
///
/// The two sequences are written in the same order; a count mismatch
/// means the file lost one side, so the longer side still produces
/// slides with the other side's fields defaulted.
fn build_slides(
    groups: Vec<TextGroup>,
    containers: &[&RecordNode],
    options: &ParseOptions,
) -> Vec<Slide> {
    if !containers.is_empty() && !groups.is_empty() && groups.len() != containers.len() {
        warn!(
            "slide list holds {} entries but {} slide containers exist",
            groups.len(),
            containers.len()
        );
    }
    let count = groups.len().max(containers.len());
    let mut groups = groups.into_iter();
    (0..count)
        .map(|index| {
            let mut slide = Slide {
                index,
                ..Slide::default()
            };
            if let Some(group) = groups.next() {
                slide.slide_id = group.slide_id;
                slide.outline_text = group.texts;
            }
            if let Some(node) = containers.get(index) {
                if let Some(atom) = node.find_child(pres::SLIDE_ATOM) {
                    slide.master_id = read_i32_le(&atom.data, 12).ok();
                }
                if let Some(pp_drawing) = node.find_child(pres::PP_DRAWING) {
                    slide.shapes = ShapeTree::parse(pp_drawing.data.clone(), options);
                    slide.shape_text = extract_shape_text(&slide.shapes, options);
                }
            }
            slide
        })
        .collect()
}

/// Decodes the text atoms inside a drawing's client textboxes.
fn extract_shape_text(shapes: &ShapeTree, options: &ParseOptions) -> Vec<String> {
    let mut texts = Vec::new();
    for payload in shapes.textboxes() {
        for node in parse_stream(payload, RecordFamily::Presentation, options) {
            node.walk(&mut |record| {
                if let Some(text) = decode_text_atom(record) {
                    texts.push(text);
                }
            });
        }
    }
    texts
}

/// Text content of a single atom, normalized: trailing terminators are
/// stripped and paragraph separators become newlines.
fn decode_text_atom(node: &RecordNode) -> Option<String> {
    let raw = match node.code() {
        pres::TEXT_CHARS_ATOM | pres::CSTRING => parse_utf16le_string(&node.data),
        pres::TEXT_BYTES_ATOM => decode_bytes(&node.data, Some(1252)).unwrap_or_default(),
        _ => return None,
    };
    let text = raw
        .trim_end_matches(['\r', '\u{0}'])
        .replace(['\r', '\u{b}'], "\n");
    (!text.is_empty()).then_some(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ole::record::families::drawing;

    fn rec(version: u16, instance: u16, code: u16, payload: &[u8]) -> Vec<u8> {
        let ver_inst = (instance << 4) | (version & 0x0F);
        let mut out = ver_inst.to_le_bytes().to_vec();
        out.extend_from_slice(&code.to_le_bytes());
        out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        out.extend_from_slice(payload);
        out
    }

    fn container(code: u16, children: &[Vec<u8>]) -> Vec<u8> {
        let body: Vec<u8> = children.concat();
        rec(0xF, 0, code, &body)
    }

    fn utf16(text: &str) -> Vec<u8> {
        text.encode_utf16().flat_map(u16::to_le_bytes).collect()
    }

    fn persist_atom(slide_id: i32) -> Vec<u8> {
        let mut payload = vec![0u8; 20];
        payload[12..16].copy_from_slice(&slide_id.to_le_bytes());
        rec(0, 0, pres::SLIDE_PERSIST_ATOM, &payload)
    }

    fn slide_atom(master_id: i32) -> Vec<u8> {
        let mut payload = vec![0u8; 24];
        payload[12..16].copy_from_slice(&master_id.to_le_bytes());
        rec(0, 0, pres::SLIDE_ATOM, &payload)
    }

    fn font_entity(index: u16, name: &str) -> Vec<u8> {
        let mut payload = vec![0u8; 68];
        let encoded = utf16(name);
        payload[..encoded.len()].copy_from_slice(&encoded);
        rec(0, index, pres::FONT_ENTITY_ATOM, &payload)
    }

    fn textbox_drawing(text: &str) -> Vec<u8> {
        // Sp atom: version 2, instance = shape type 202 (textbox).
        let mut sp_payload = 1u32.to_le_bytes().to_vec();
        sp_payload.extend_from_slice(&0u32.to_le_bytes());
        let sp = rec(2, 202, drawing::SP, &sp_payload);
        let client_textbox = rec(
            0xF,
            0,
            drawing::CLIENT_TEXTBOX,
            &rec(0, 0, pres::TEXT_BYTES_ATOM, text.as_bytes()),
        );
        let shape = container(drawing::SP_CONTAINER, &[sp, client_textbox]);

        // Patriarch group wrapper around the drawing's shapes.
        let mut group_sp_payload = 0u32.to_le_bytes().to_vec();
        group_sp_payload.extend_from_slice(&1u32.to_le_bytes());
        let group_shape = container(
            drawing::SP_CONTAINER,
            &[
                rec(1, 0, drawing::SPGR, &[0u8; 16]),
                rec(2, 0, drawing::SP, &group_sp_payload),
            ],
        );
        let patriarch = container(drawing::SPGR_CONTAINER, &[group_shape, shape]);
        container(drawing::DG_CONTAINER, &[patriarch])
    }

    fn document(children: &[Vec<u8>]) -> Vec<u8> {
        container(pres::DOCUMENT, children)
    }

    fn parse(stream: Vec<u8>) -> Presentation {
        Presentation::from_document_stream(Bytes::from(stream))
    }

    #[test]
    fn test_empty_stream_is_empty_presentation() {
        let pres = parse(Vec::new());
        assert_eq!(pres.slide_count(), 0);
        assert!(pres.fonts().is_empty());
        assert_eq!(pres.text(), "");
    }

    #[test]
    fn test_outline_text_groups_by_persist_atom() {
        let slwt = container(
            pres::SLIDE_LIST_WITH_TEXT,
            &[
                persist_atom(256),
                rec(0, 0, pres::TEXT_CHARS_ATOM, &utf16("Hello Title\r")),
                rec(0, 0, pres::TEXT_BYTES_ATOM, b"Body text"),
                persist_atom(257),
                rec(0, 0, pres::TEXT_BYTES_ATOM, b"Second slide"),
            ],
        );
        let mut stream = document(&[slwt]);
        stream.extend_from_slice(&rec(0, 0, pres::END_DOCUMENT, &[]));

        let pres = parse(stream);
        assert_eq!(pres.slide_count(), 2);
        let first = &pres.slides()[0];
        assert_eq!(first.slide_id, Some(256));
        assert_eq!(first.outline_text, vec!["Hello Title", "Body text"]);
        let second = &pres.slides()[1];
        assert_eq!(second.slide_id, Some(257));
        assert_eq!(pres.text(), "Hello Title\nBody text\n\nSecond slide");
    }

    #[test]
    fn test_fonts_come_from_the_collection() {
        let collection = container(
            pres::FONT_COLLECTION,
            &[font_entity(0, "Arial"), font_entity(1, "Courier New")],
        );
        let environment = container(pres::ENVIRONMENT, &[collection]);
        let stream = document(&[environment]);

        let pres = parse(stream);
        assert_eq!(pres.fonts().len(), 2);
        assert_eq!(pres.font(1).unwrap().name, "Courier New");
        assert!(pres.font(9).is_none());
    }

    #[test]
    fn test_last_document_container_wins() {
        let old = document(&[container(
            pres::ENVIRONMENT,
            &[container(pres::FONT_COLLECTION, &[font_entity(0, "Old Face")])],
        )]);
        let new = document(&[container(
            pres::ENVIRONMENT,
            &[container(pres::FONT_COLLECTION, &[font_entity(0, "Arial")])],
        )]);
        let mut stream = old;
        stream.extend_from_slice(&new);

        let pres = parse(stream);
        assert_eq!(pres.fonts().len(), 1);
        assert_eq!(pres.fonts()[0].name, "Arial");
    }

    #[test]
    fn test_shape_text_extracted_from_drawing() {
        let slwt = container(pres::SLIDE_LIST_WITH_TEXT, &[persist_atom(256)]);
        let slide = container(
            pres::SLIDE,
            &[
                slide_atom(0),
                rec(0, 0, pres::PP_DRAWING, &textbox_drawing("From shape\r")),
            ],
        );
        let mut stream = document(&[slwt]);
        stream.extend_from_slice(&slide);

        let pres = parse(stream);
        assert_eq!(pres.slide_count(), 1);
        let slide = &pres.slides()[0];
        assert_eq!(slide.shape_text, vec!["From shape"]);
        assert_eq!(slide.shapes.len(), 1);
        assert_eq!(slide.text(), "From shape");
    }

    #[test]
    fn test_master_reference_resolves_by_identifier() {
        let slide_list = container(pres::SLIDE_LIST_WITH_TEXT, &[persist_atom(256)]);
        let master_list = rec(
            0xF,
            1,
            pres::SLIDE_LIST_WITH_TEXT,
            &persist_atom(1000),
        );
        let slide = container(pres::SLIDE, &[slide_atom(1000)]);
        let master = container(pres::MAIN_MASTER, &[slide_atom(0)]);
        let mut stream = document(&[slide_list, master_list]);
        stream.extend_from_slice(&master);
        stream.extend_from_slice(&slide);

        let pres = parse(stream);
        assert_eq!(pres.masters().len(), 1);
        assert_eq!(pres.slides()[0].master_id, Some(1000));
        assert_eq!(pres.slides()[0].master_index, Some(0));
    }

    #[test]
    fn test_unknown_master_stays_unresolved() {
        let slide_list = container(pres::SLIDE_LIST_WITH_TEXT, &[persist_atom(256)]);
        let slide = container(pres::SLIDE, &[slide_atom(777)]);
        let mut stream = document(&[slide_list]);
        stream.extend_from_slice(&slide);

        let pres = parse(stream);
        assert_eq!(pres.slides()[0].master_id, Some(777));
        assert_eq!(pres.slides()[0].master_index, None);
    }

    #[test]
    fn test_more_groups_than_containers_still_yields_slides() {
        let slwt = container(
            pres::SLIDE_LIST_WITH_TEXT,
            &[
                persist_atom(256),
                rec(0, 0, pres::TEXT_BYTES_ATOM, b"One"),
                persist_atom(257),
                rec(0, 0, pres::TEXT_BYTES_ATOM, b"Two"),
            ],
        );
        let slide = container(pres::SLIDE, &[slide_atom(0)]);
        let mut stream = document(&[slwt]);
        stream.extend_from_slice(&slide);

        let pres = parse(stream);
        assert_eq!(pres.slide_count(), 2);
        assert_eq!(pres.slides()[1].outline_text, vec!["Two"]);
        assert!(pres.slides()[1].shapes.is_empty());
    }
}

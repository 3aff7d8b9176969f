//! Parsed RTF document and its entry points.

use std::fs;
use std::path::Path;

use bumpalo::Bump;
use serde::{Deserialize, Serialize};

use super::error::{RtfError, RtfResult};
use super::lexer::Lexer;
use super::node::{Node, NodeVisitor};
use super::tree::TreeBuilder;
use super::types::{ColorTable, FontTable, StyleDef};
use crate::common::Metadata;

/// Returns true when the data looks like an RTF file. Leading
/// whitespace before the `{\rtf` signature is tolerated.
pub fn is_rtf(data: &[u8]) -> bool {
    let start = data
        .iter()
        .position(|&b| !b.is_ascii_whitespace())
        .unwrap_or(data.len());
    data[start..].starts_with(b"{\\rtf")
}

/// A fully parsed RTF document: body nodes plus the side tables the
/// header declared.
///
/// Parsing is tolerant by design. Damaged input degrades to a shorter
/// document rather than an error; the only fatal conditions are I/O
/// failures and input that is not RTF at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RtfDocument {
    nodes: Vec<Node>,
    fonts: FontTable,
    colors: ColorTable,
    styles: Vec<StyleDef>,
    metadata: Metadata,
}

impl RtfDocument {
    /// Reads and parses an RTF file from disk.
    pub fn open(path: impl AsRef<Path>) -> RtfResult<Self> {
        let data = fs::read(path)?;
        Self::parse_bytes(&data)
    }

    /// Parses RTF source held in a string.
    pub fn parse(input: &str) -> RtfResult<Self> {
        Self::parse_bytes(input.as_bytes())
    }

    /// Parses raw RTF bytes.
    ///
    /// The lexer and builder borrow a temporary arena for decoded text;
    /// the returned document owns all of its data.
    pub fn parse_bytes(input: &[u8]) -> RtfResult<Self> {
        if !is_rtf(input) {
            return Err(RtfError::NotRtf);
        }
        let arena = Bump::new();
        let lexer = Lexer::new(input, &arena);
        let built = TreeBuilder::new().build(lexer)?;
        Ok(Self {
            nodes: built.nodes,
            fonts: built.fonts,
            colors: built.colors,
            styles: built.styles,
            metadata: built.metadata,
        })
    }

    /// Body nodes in document order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Fonts declared by `\fonttbl`.
    pub fn fonts(&self) -> &FontTable {
        &self.fonts
    }

    /// Colors declared by `\colortbl`.
    pub fn colors(&self) -> &ColorTable {
        &self.colors
    }

    /// Style sheet entries in declaration order.
    pub fn styles(&self) -> &[StyleDef] {
        &self.styles
    }

    /// Document properties collected from the `\info` destination.
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Walks every node in document order.
    pub fn visit<V: NodeVisitor + ?Sized>(&self, visitor: &mut V) {
        for node in &self.nodes {
            node.visit(visitor);
        }
    }

    /// Plain text of the document, one line per paragraph.
    pub fn text(&self) -> String {
        let mut text = String::new();
        for node in &self.nodes {
            if let Node::Paragraph(paragraph) = node {
                for run in &paragraph.runs {
                    text.push_str(&run.text);
                }
                text.push('\n');
            }
        }
        text
    }
}

//! Value types shared across the RTF parser: fonts, colors, styles and
//! character formatting.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Index into the font table (`\fN`).
pub type FontRef = u16;

/// Index into the color table (`\cfN`).
pub type ColorRef = u16;

/// An RGB color from `\colortbl`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Color {
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }
}

/// Font family hint from the `\fnil`..`\ftech` control words.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FontFamily {
    #[default]
    Nil,
    Roman,
    Swiss,
    Modern,
    Script,
    Decor,
    Tech,
}

/// One entry of the font table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Font {
    pub name: String,
    pub family: FontFamily,
    pub charset: u8,
}

/// Fonts declared by `\fonttbl`, keyed by their `\fN` index.
///
/// Indices are author-assigned and need not be contiguous, so entries
/// live in an ordered map rather than a vector.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontTable {
    entries: BTreeMap<FontRef, Font>,
}

impl FontTable {
    pub fn insert(&mut self, index: FontRef, font: Font) {
        self.entries.insert(index, font);
    }

    pub fn get(&self, index: FontRef) -> Option<&Font> {
        self.entries.get(&index)
    }

    /// Entries in index order.
    pub fn fonts(&self) -> impl Iterator<Item = (FontRef, &Font)> {
        self.entries.iter().map(|(&index, font)| (index, font))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Colors declared by `\colortbl`, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorTable {
    colors: Vec<Color>,
}

impl ColorTable {
    pub fn push(&mut self, color: Color) {
        self.colors.push(color);
    }

    pub fn get(&self, index: ColorRef) -> Option<&Color> {
        self.colors.get(usize::from(index))
    }

    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}

/// What a style sheet entry applies to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StyleKind {
    #[default]
    Paragraph,
    Character,
    Section,
}

/// One entry of `\stylesheet`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleDef {
    pub id: u16,
    pub kind: StyleKind,
    pub name: String,
}

/// Character formatting carried by a text run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharFormat {
    pub font: FontRef,
    /// Font size in half-points (`\fsN`).
    pub size: u16,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strike: bool,
    pub superscript: bool,
    pub subscript: bool,
    pub color: Option<ColorRef>,
}

impl Default for CharFormat {
    fn default() -> Self {
        // 24 half-points is the RTF default of 12pt.
        Self {
            font: 0,
            size: 24,
            bold: false,
            italic: false,
            underline: false,
            strike: false,
            superscript: false,
            subscript: false,
            color: None,
        }
    }
}

/// Paragraph alignment from `\ql`, `\qc`, `\qr`, `\qj`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

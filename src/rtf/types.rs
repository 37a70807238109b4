//! RTF decoder value types and output alphabet.

use serde::Serialize;
use smallvec::SmallVec;
use std::collections::BTreeMap;

/// Font reference (index into font table).
pub type FontRef = i32;

/// Color reference (index into color table).
pub type ColorRef = i32;

/// RTF color representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Color {
    /// Red component (0-255)
    pub red: u8,
    /// Green component (0-255)
    pub green: u8,
    /// Blue component (0-255)
    pub blue: u8,
}

impl Color {
    /// Create a new color.
    #[inline]
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Black color.
    #[inline]
    pub const fn black() -> Self {
        Self::new(0, 0, 0)
    }

    /// White color.
    #[inline]
    pub const fn white() -> Self {
        Self::new(255, 255, 255)
    }
}

/// Color table containing document colors.
///
/// An entry of `None` is the RTF "auto" color, usually found at index 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ColorTable {
    colors: Vec<Option<Color>>,
}

impl ColorTable {
    /// Create a color table from its entries.
    #[inline]
    pub fn new(colors: Vec<Option<Color>>) -> Self {
        Self { colors }
    }

    /// Get a color by reference. Auto and out-of-range entries yield `None`.
    #[inline]
    pub fn get(&self, color_ref: ColorRef) -> Option<Color> {
        usize::try_from(color_ref)
            .ok()
            .and_then(|index| self.colors.get(index))
            .copied()
            .flatten()
    }

    /// Get all entries in the table.
    #[inline]
    pub fn colors(&self) -> &[Option<Color>] {
        &self.colors
    }

    /// Number of entries, including auto entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Whether the table has no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}

/// Font family categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum FontFamily {
    /// Nil (unknown or default)
    #[default]
    Nil,
    /// Roman (serif) fonts
    Roman,
    /// Swiss (sans-serif) fonts
    Swiss,
    /// Modern (monospace) fonts
    Modern,
    /// Script fonts
    Script,
    /// Decorative fonts
    Decor,
    /// Technical, symbol, and mathematical fonts
    Tech,
    /// Arabic, Hebrew, or other bidirectional fonts
    Bidi,
}

impl FontFamily {
    /// Map a font table family keyword (`fswiss`, `froman`, ...) to a family.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        let family = match keyword {
            "fnil" => FontFamily::Nil,
            "froman" => FontFamily::Roman,
            "fswiss" => FontFamily::Swiss,
            "fmodern" => FontFamily::Modern,
            "fscript" => FontFamily::Script,
            "fdecor" => FontFamily::Decor,
            "ftech" => FontFamily::Tech,
            "fbidi" => FontFamily::Bidi,
            _ => return None,
        };
        Some(family)
    }
}

/// Font definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Font {
    /// Font name
    pub name: String,
    /// Font family category
    pub family: FontFamily,
    /// Character set (Windows charset identifier)
    pub charset: Option<i32>,
}

/// Font table containing document fonts.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FontTable {
    fonts: BTreeMap<FontRef, Font>,
}

impl FontTable {
    /// Create a new font table.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a font by reference.
    #[inline]
    pub fn get(&self, font_ref: FontRef) -> Option<&Font> {
        self.fonts.get(&font_ref)
    }

    /// Get or create the entry at `font_ref`.
    #[inline]
    pub(crate) fn entry(&mut self, font_ref: FontRef) -> &mut Font {
        self.fonts.entry(font_ref).or_default()
    }

    /// Iterate over all fonts in index order.
    #[inline]
    pub fn fonts(&self) -> impl Iterator<Item = (FontRef, &Font)> {
        self.fonts.iter().map(|(index, font)| (*index, font))
    }

    /// Number of fonts.
    #[inline]
    pub fn len(&self) -> usize {
        self.fonts.len()
    }

    /// Whether the table is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }
}

/// Text alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Alignment {
    /// Left-aligned
    #[default]
    Left,
    /// Right-aligned
    Right,
    /// Centered
    Center,
    /// Justified
    Justify,
}

/// Tab stop alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum TabAlignment {
    #[default]
    Left,
    Right,
    Center,
    Decimal,
    Bar,
}

/// Tab leader fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum TabLeader {
    #[default]
    None,
    Dots,
    Hyphens,
    Underline,
    ThickLine,
    Equals,
}

/// A tab stop, position in points.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct TabStop {
    pub position: f64,
    pub alignment: TabAlignment,
    pub leader: TabLeader,
}

/// Tab stops of a paragraph, in declaration order.
pub type TabStops = SmallVec<[TabStop; 8]>;

/// Resolved character attributes of a text run.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct TextAttributes {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikethrough: bool,
    pub superscript: bool,
    pub subscript: bool,
    pub hidden: bool,
    /// Font family name from the font table
    pub font_family: Option<String>,
    /// Font size in points
    pub font_size: Option<f64>,
    pub text_color: Option<Color>,
    pub background: Option<Color>,
}

/// Resolved paragraph attributes.
///
/// Computed when a paragraph ends; not part of the segment output.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ParagraphAttributes {
    pub alignment: Alignment,
    /// Indents and spacing in points
    pub left_indent: f64,
    pub right_indent: f64,
    pub first_line_indent: f64,
    pub space_before: f64,
    pub space_after: f64,
    pub widow_control: Option<bool>,
    pub tab_stops: Vec<TabStop>,
}

/// Document-wide attributes, lengths in points.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentAttributes {
    pub paper_width: f64,
    pub paper_height: f64,
    pub margin_left: f64,
    pub margin_right: f64,
    pub margin_top: f64,
    pub margin_bottom: f64,
    pub gutter: f64,
    pub landscape: bool,
    pub widow_control: bool,
    /// Default font (`\deff`)
    pub default_font: Option<FontRef>,
}

impl Default for DocumentAttributes {
    fn default() -> Self {
        // US Letter with 1.25" side and 1" top/bottom margins
        Self {
            paper_width: 612.0,
            paper_height: 792.0,
            margin_left: 90.0,
            margin_right: 90.0,
            margin_top: 72.0,
            margin_bottom: 72.0,
            gutter: 0.0,
            landscape: false,
            widow_control: false,
            default_font: None,
        }
    }
}

/// A contiguous run of text with its resolved attributes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StyledSegment {
    pub text: String,
    pub attributes: TextAttributes,
}

impl StyledSegment {
    /// Create a new segment.
    #[inline]
    pub fn new(text: impl Into<String>, attributes: TextAttributes) -> Self {
        Self {
            text: text.into(),
            attributes,
        }
    }

    /// Get the text content.
    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// One element of the decoded output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Segment {
    /// Styled text
    Text(StyledSegment),
    /// End of a paragraph
    LineBreak,
}

impl Segment {
    /// The styled segment, if this is text.
    #[inline]
    pub fn as_text(&self) -> Option<&StyledSegment> {
        match self {
            Segment::Text(segment) => Some(segment),
            Segment::LineBreak => None,
        }
    }

    /// Whether this is a paragraph break.
    #[inline]
    pub fn is_line_break(&self) -> bool {
        matches!(self, Segment::LineBreak)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_table_lookup() {
        let table = ColorTable::new(vec![None, Some(Color::new(255, 0, 0))]);
        assert_eq!(table.get(0), None);
        assert_eq!(table.get(1), Some(Color::new(255, 0, 0)));
        assert_eq!(table.get(2), None);
        assert_eq!(table.get(-1), None);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_font_family_keywords() {
        assert_eq!(FontFamily::from_keyword("fswiss"), Some(FontFamily::Swiss));
        assert_eq!(FontFamily::from_keyword("fcharset"), None);
    }
}

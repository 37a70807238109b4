//! RTF destinations.
//!
//! A destination receives the events of the group it was installed in. The
//! reader keeps every destination of a decode in one arena and switches
//! between them by [`DestinationId`].

use super::attr::{AttrArena, AttrSetId};
use super::document::DocumentDestination;
use super::state::ParserState;
use super::stylesheet::{StyleDefiningDestination, StyleSheetDestination, StyleTable};
use super::types::{Color, ColorTable, FontFamily, FontRef, FontTable, Segment};

/// Index of a destination in its arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DestinationId(usize);

impl DestinationId {
    /// The discard destination every decode starts in.
    pub const DISCARD: DestinationId = DestinationId(0);

    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Everything destinations share during one decode.
#[derive(Debug)]
pub struct DecodeContext {
    pub state: ParserState,
    pub attrs: AttrArena,
    pub fonts: FontTable,
    /// `None` until a `\colortbl` group closes
    pub colors: Option<ColorTable>,
    pub styles: StyleTable,
    /// Document-wide attributes (`\paperw`, `\deff`, ...)
    pub document: AttrSetId,
    pub output: Vec<Segment>,
}

impl DecodeContext {
    pub fn new(unicode_skip: usize) -> Self {
        let mut attrs = AttrArena::new();
        let styles = StyleTable::new(&mut attrs);
        let document = attrs.alloc(None);
        Self {
            state: ParserState::new(DestinationId::DISCARD, unicode_skip),
            attrs,
            fonts: FontTable::new(),
            colors: None,
            styles,
            document,
            output: Vec::new(),
        }
    }
}

/// A destination and its private state.
#[derive(Debug, Default)]
pub enum Destination {
    /// Drops everything
    #[default]
    Discard,
    FontTable(FontTableDestination),
    ColorTable(ColorTableDestination),
    StyleSheet(StyleSheetDestination),
    StyleDefining(StyleDefiningDestination),
    Document(DocumentDestination),
}

impl Destination {
    /// A `{` was read while this destination was current. Returns a
    /// destination to install for the new group, if any.
    pub fn begin_group(&mut self, ctx: &mut DecodeContext) -> Option<Destination> {
        match self {
            Destination::StyleSheet(sheet) => sheet.begin_group(ctx),
            Destination::StyleDefining(style) => {
                style.begin_group(ctx);
                None
            },
            Destination::Document(document) => {
                document.begin_group(ctx);
                None
            },
            Destination::Discard | Destination::FontTable(_) | Destination::ColorTable(_) => None,
        }
    }

    pub fn handle_keyword(&mut self, ctx: &mut DecodeContext, keyword: &str) -> bool {
        match self {
            Destination::Discard => true,
            Destination::FontTable(fonts) => fonts.handle_keyword(ctx, keyword),
            Destination::StyleDefining(style) => style.handle_keyword(ctx, keyword),
            Destination::Document(document) => document.handle_keyword(ctx, keyword),
            Destination::ColorTable(_) | Destination::StyleSheet(_) => false,
        }
    }

    pub fn handle_keyword_param(
        &mut self,
        ctx: &mut DecodeContext,
        keyword: &str,
        parameter: i32,
    ) -> bool {
        match self {
            Destination::Discard => true,
            Destination::FontTable(fonts) => fonts.handle_keyword_param(ctx, keyword, parameter),
            Destination::ColorTable(colors) => colors.handle_keyword_param(keyword, parameter),
            Destination::StyleDefining(style) => {
                style.handle_keyword_param(ctx, keyword, parameter)
            },
            Destination::Document(document) => {
                document.handle_keyword_param(ctx, keyword, parameter)
            },
            Destination::StyleSheet(_) => false,
        }
    }

    pub fn handle_text(&mut self, ctx: &mut DecodeContext, text: &str) {
        match self {
            Destination::FontTable(fonts) => fonts.handle_text(ctx, text),
            Destination::ColorTable(colors) => colors.handle_text(text),
            Destination::StyleDefining(style) => style.handle_text(text),
            Destination::Document(document) => document.handle_text(ctx, text),
            Destination::Discard | Destination::StyleSheet(_) => {},
        }
    }

    /// Binary payloads are never part of the decoded text.
    pub fn handle_binary_blob(&mut self, data: &[u8]) {
        tracing::trace!(len = data.len(), "binary data dropped");
    }

    /// Finish this destination. `destinations` holds every other
    /// destination of the decode.
    pub fn close(self, ctx: &mut DecodeContext, destinations: &mut [Destination]) {
        match self {
            Destination::Discard => {},
            Destination::FontTable(fonts) => fonts.close(ctx),
            Destination::ColorTable(colors) => colors.close(ctx),
            Destination::StyleSheet(sheet) => sheet.close(ctx),
            Destination::StyleDefining(style) => style.close(ctx, destinations),
            Destination::Document(document) => document.close(ctx),
        }
    }

    /// Short name for log output.
    pub fn name(&self) -> &'static str {
        match self {
            Destination::Discard => "discard",
            Destination::FontTable(_) => "fonttbl",
            Destination::ColorTable(_) => "colortbl",
            Destination::StyleSheet(_) => "stylesheet",
            Destination::StyleDefining(_) => "style",
            Destination::Document(_) => "rtf",
        }
    }
}

/// Arena of the destinations of one decode.
#[derive(Debug)]
pub struct Destinations {
    items: Vec<Destination>,
}

impl Destinations {
    /// Create an arena holding the initial discard destination.
    pub fn new() -> Self {
        Self {
            items: vec![Destination::Discard],
        }
    }

    pub fn alloc(&mut self, destination: Destination) -> DestinationId {
        self.items.push(destination);
        DestinationId(self.items.len() - 1)
    }

    #[inline]
    pub fn get_mut(&mut self, id: DestinationId) -> &mut Destination {
        &mut self.items[id.0]
    }

    /// Take a destination out for closing. Its slot becomes a discard
    /// destination, so a second close is a no-op.
    pub fn take(&mut self, id: DestinationId) -> Destination {
        std::mem::take(&mut self.items[id.0])
    }

    /// All destinations, for closing hooks that reach other destinations.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [Destination] {
        &mut self.items
    }
}

impl Default for Destinations {
    fn default() -> Self {
        Self::new()
    }
}

/// The `\fonttbl` destination.
///
/// `\fN` opens entry N. Text up to the first `;` is the font name and may
/// arrive in several pieces; text after the `;` is ignored until the next
/// `\f`.
#[derive(Debug, Default)]
pub struct FontTableDestination {
    current: Option<FontRef>,
    terminated: bool,
}

impl FontTableDestination {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle_keyword(&mut self, ctx: &mut DecodeContext, keyword: &str) -> bool {
        let Some(family) = FontFamily::from_keyword(keyword) else {
            return false;
        };
        if let Some(font) = self.current {
            ctx.fonts.entry(font).family = family;
        }
        true
    }

    pub fn handle_keyword_param(
        &mut self,
        ctx: &mut DecodeContext,
        keyword: &str,
        parameter: i32,
    ) -> bool {
        match keyword {
            "f" => {
                ctx.fonts.entry(parameter);
                self.current = Some(parameter);
                self.terminated = false;
            },
            "fcharset" => {
                if let Some(font) = self.current {
                    ctx.fonts.entry(font).charset = Some(parameter);
                }
            },
            _ => return false,
        }
        true
    }

    pub fn handle_text(&mut self, ctx: &mut DecodeContext, text: &str) {
        let Some(font) = self.current else {
            return;
        };
        if self.terminated {
            return;
        }

        let name = match text.find(';') {
            Some(semicolon) => {
                self.terminated = true;
                &text[..semicolon]
            },
            None => text,
        };
        ctx.fonts.entry(font).name.push_str(name);
    }

    pub fn close(self, ctx: &mut DecodeContext) {
        tracing::debug!(fonts = ctx.fonts.len(), "font table read");
    }
}

/// The `\colortbl` destination.
#[derive(Debug, Default)]
pub struct ColorTableDestination {
    red: u8,
    green: u8,
    blue: u8,
    /// Some component keyword has been seen
    touched: bool,
    colors: Vec<Option<Color>>,
}

impl ColorTableDestination {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle_keyword_param(&mut self, keyword: &str, parameter: i32) -> bool {
        let component = parameter.clamp(0, 255) as u8;
        match keyword {
            "red" => self.red = component,
            "green" => self.green = component,
            "blue" => self.blue = component,
            _ => return false,
        }
        self.touched = true;
        true
    }

    /// Every `;` ends one entry. Components carry over to the next entry;
    /// entries before the first component keyword are the automatic color.
    pub fn handle_text(&mut self, text: &str) {
        for _ in text.matches(';') {
            let color = self
                .touched
                .then(|| Color::new(self.red, self.green, self.blue));
            self.colors.push(color);
        }
    }

    pub fn close(self, ctx: &mut DecodeContext) {
        tracing::debug!(colors = self.colors.len(), "color table read");
        ctx.colors = Some(ColorTable::new(self.colors));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn read_fonts(events: &[(&str, Option<i32>, Option<&str>)]) -> FontTable {
        let mut ctx = DecodeContext::new(1);
        let mut fonts = FontTableDestination::new();
        for (keyword, parameter, text) in events {
            match (parameter, text) {
                (_, Some(text)) => fonts.handle_text(&mut ctx, text),
                (Some(parameter), None) => {
                    fonts.handle_keyword_param(&mut ctx, keyword, *parameter);
                },
                (None, None) => {
                    fonts.handle_keyword(&mut ctx, keyword);
                },
            }
        }
        ctx.fonts
    }

    #[test]
    fn test_font_table_entries() {
        let fonts = read_fonts(&[
            ("f", Some(0), None),
            ("fswiss", None, None),
            ("fcharset", Some(0), None),
            ("", None, Some("Helvetica;")),
            ("f", Some(1), None),
            ("froman", None, None),
            ("", None, Some("Times New Roman;")),
        ]);

        assert_eq!(fonts.len(), 2);
        let helvetica = fonts.get(0).unwrap();
        assert_eq!(helvetica.name, "Helvetica");
        assert_eq!(helvetica.family, FontFamily::Swiss);
        assert_eq!(helvetica.charset, Some(0));
        assert_eq!(fonts.get(1).unwrap().name, "Times New Roman");
    }

    #[test]
    fn test_text_after_semicolon_ignored() {
        let fonts = read_fonts(&[
            ("f", Some(2), None),
            ("", None, Some("Courier;trailing")),
            ("", None, Some("more")),
        ]);
        assert_eq!(fonts.get(2).unwrap().name, "Courier");
    }

    #[test]
    fn test_text_before_font_number_ignored() {
        let fonts = read_fonts(&[("", None, Some("Orphan;"))]);
        assert!(fonts.is_empty());
    }

    proptest! {
        #[test]
        fn prop_split_font_name(name in "[A-Za-z ]{1,24}", split in 0usize..24) {
            let split = split.min(name.len());
            let whole = format!("{};", name);
            let (head, tail) = whole.split_at(split);

            let joined = read_fonts(&[("f", Some(0), None), ("", None, Some(whole.as_str()))]);
            let pieces = read_fonts(&[
                ("f", Some(0), None),
                ("", None, Some(head)),
                ("", None, Some(tail)),
            ]);
            prop_assert_eq!(joined.get(0), pieces.get(0));
            prop_assert_eq!(&pieces.get(0).unwrap().name, &name);
        }
    }

    #[test]
    fn test_color_table() {
        let mut ctx = DecodeContext::new(1);
        let mut colors = ColorTableDestination::new();
        colors.handle_text(";");
        colors.handle_keyword_param("red", 255);
        colors.handle_keyword_param("green", 0);
        colors.handle_keyword_param("blue", 0);
        colors.handle_text(";");
        colors.handle_keyword_param("red", -4);
        colors.handle_keyword_param("blue", 300);
        colors.handle_text(";");
        colors.close(&mut ctx);

        let table = ctx.colors.unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.get(0), None);
        assert_eq!(table.get(1), Some(Color::new(255, 0, 0)));
        assert_eq!(table.get(2), Some(Color::new(0, 0, 255)));
    }

    #[test]
    fn test_color_components_carry_over() {
        let mut ctx = DecodeContext::new(1);
        let mut colors = ColorTableDestination::new();
        colors.handle_text(";");
        colors.handle_keyword_param("red", 255);
        colors.handle_text(";");
        colors.handle_keyword_param("green", 128);
        colors.handle_text(";;");
        colors.close(&mut ctx);

        let table = ctx.colors.unwrap();
        assert_eq!(table.get(0), None);
        assert_eq!(table.get(1), Some(Color::new(255, 0, 0)));
        assert_eq!(table.get(2), Some(Color::new(255, 128, 0)));
        assert_eq!(table.get(3), Some(Color::new(255, 128, 0)));
    }

    #[test]
    fn test_discard_accepts_everything() {
        let mut ctx = DecodeContext::new(1);
        let mut discard = Destination::Discard;
        assert!(discard.handle_keyword(&mut ctx, "b"));
        assert!(discard.handle_keyword_param(&mut ctx, "fs", 20));
        discard.handle_text(&mut ctx, "dropped");
        assert!(discard.begin_group(&mut ctx).is_none());
        assert!(ctx.output.is_empty());
    }

    #[test]
    fn test_take_leaves_discard() {
        let mut destinations = Destinations::new();
        let id = destinations.alloc(Destination::ColorTable(ColorTableDestination::new()));
        assert_eq!(destinations.take(id).name(), "colortbl");
        assert_eq!(destinations.get_mut(id).name(), "discard");
    }
}

//! RTF reader.
//!
//! [`RtfReader`] receives tokenizer events, handles the keywords that are
//! independent of the current destination (character sets, destination
//! switches, `\*`, Unicode escapes, special characters) and forwards
//! everything else to the current destination.

use super::attr::{AttrKey, AttrValue};
use super::charset::{ANSI, CharacterSet, character_set, codepage_name};
use super::config::DecodeOptions;
use super::destination::{
    ColorTableDestination, DecodeContext, Destination, DestinationId, Destinations,
    FontTableDestination,
};
use super::document::DocumentDestination;
use super::error::{DecodeError, DecodeResult};
use super::lexer::{Lexer, RtfSink};
use super::state::GroupStack;
use super::stylesheet::StyleSheetDestination;
use super::types::{ColorTable, DocumentAttributes, FontTable, Segment};
use phf::{phf_map, phf_set};
use serde::Serialize;
use std::sync::Arc;

/// Keywords that stand for a piece of text.
static TEXT_KEYWORDS: phf::Map<&'static str, &'static str> = phf_map! {
    "\\" => "\\",
    "{" => "{",
    "}" => "}",
    " " => "\u{00A0}",
    "~" => "\u{00A0}",
    "_" => "\u{2011}",
    // U+00AD soft hyphen, not the U+2027 hyphenation point
    "-" => "\u{00AD}",
    "bullet" => "\u{2022}",
    "emdash" => "\u{2014}",
    "emspace" => "\u{2003}",
    "endash" => "\u{2013}",
    "enspace" => "\u{2002}",
    "ldblquote" => "\u{201C}",
    "lquote" => "\u{2018}",
    "ltrmark" => "\u{200E}",
    "rdblquote" => "\u{201D}",
    "rquote" => "\u{2019}",
    "rtlmark" => "\u{200F}",
    "tab" => "\t",
    "zwj" => "\u{200D}",
    "zwnj" => "\u{200C}",
};

/// Destinations that are recognized but not decoded.
static UNSUPPORTED_DESTINATIONS: phf::Set<&'static str> = phf_set! {
    "aftncn", "aftnsep", "aftnsepc", "annotation", "atnauthor", "atnicn",
    "atnid", "atnref", "atntime", "atrfend", "atrfstart", "bkmkend",
    "bkmkstart", "datafield", "do", "dptxbxtext", "falt", "field", "file",
    "filetbl", "fname", "fontemb", "fontfile", "footer", "footerf",
    "footerl", "footerr", "footnote", "ftncn", "ftnsep", "ftnsepc",
    "header", "headerf", "headerl", "headerr", "keycode", "nextfile",
    "object", "pict", "pn", "pnseclvl", "pntxtb", "pntxta", "revtbl", "rxe",
    "tc", "template", "txe", "xe",
};

/// Result of decoding one RTF document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodedDocument {
    segments: Vec<Segment>,
    fonts: FontTable,
    colors: ColorTable,
    attributes: DocumentAttributes,
}

impl DecodedDocument {
    /// Styled segments and paragraph breaks in document order.
    #[inline]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    #[inline]
    pub fn into_segments(self) -> Vec<Segment> {
        self.segments
    }

    #[inline]
    pub fn fonts(&self) -> &FontTable {
        &self.fonts
    }

    /// The color table; empty if the document had none.
    #[inline]
    pub fn colors(&self) -> &ColorTable {
        &self.colors
    }

    /// Page setup and other document-wide settings.
    #[inline]
    pub fn attributes(&self) -> &DocumentAttributes {
        &self.attributes
    }

    /// Plain text, one line per paragraph.
    pub fn text(&self) -> String {
        let mut text = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(styled) => text.push_str(styled.text()),
                Segment::LineBreak => text.push('\n'),
            }
        }
        text
    }
}

/// Event-driven RTF decoder.
///
/// # Examples
///
/// ```rust
/// use rtf_segments::rtf::RtfReader;
///
/// let mut reader = RtfReader::new()?;
/// reader.read(r"{\rtf1\ansi{\fonttbl\f0\fswiss Helvetica;}\f0\pard Hello\par}")?;
/// let document = reader.finish()?;
/// assert_eq!(document.text(), "Hello\n");
/// # Ok::<(), rtf_segments::rtf::DecodeError>(())
/// ```
#[derive(Debug)]
pub struct RtfReader {
    ctx: DecodeContext,
    destinations: Destinations,
    stack: GroupStack,
    /// Table used for `\'hh` escapes
    charset: Arc<CharacterSet>,
    /// Fallback units still to be skipped after a `\u`
    skipping: usize,
    /// The previous keyword was `\*`
    ignore_group_if_unknown: bool,
    /// High half of a surrogate pair waiting for its low half
    pending_high_surrogate: Option<u32>,
    closed: bool,
}

impl RtfReader {
    /// Create a reader with default options.
    pub fn new() -> DecodeResult<Self> {
        Self::with_options(DecodeOptions::default())
    }

    pub fn with_options(options: DecodeOptions) -> DecodeResult<Self> {
        let charset = match character_set(&options.default_character_set) {
            Ok(set) => set,
            Err(e) => {
                tracing::warn!(error = %e, "default character set unavailable, using ansi");
                character_set(ANSI).map_err(DecodeError::MissingCharacterSet)?
            },
        };

        Ok(Self {
            ctx: DecodeContext::new(options.default_unicode_skip),
            destinations: Destinations::new(),
            stack: GroupStack::new(options.max_group_depth),
            charset,
            skipping: 0,
            ignore_group_if_unknown: false,
            pending_high_surrogate: None,
            closed: false,
        })
    }

    /// Decode a complete RTF document.
    pub fn read(&mut self, input: &str) -> DecodeResult<()> {
        Lexer::new(input).run(self)
    }

    /// Close any open destination and return the decoded document.
    pub fn finish(mut self) -> DecodeResult<DecodedDocument> {
        if !self.closed {
            RtfSink::close(&mut self)?;
        }

        let attributes = self.document_attributes();
        let ctx = self.ctx;
        Ok(DecodedDocument {
            segments: ctx.output,
            fonts: ctx.fonts,
            colors: ctx.colors.unwrap_or_default(),
            attributes,
        })
    }

    fn document_attributes(&self) -> DocumentAttributes {
        let defaults = DocumentAttributes::default();
        let value = |key| self.ctx.attrs.get(self.ctx.document, key);
        let length = |key, default| value(key).and_then(AttrValue::as_number).unwrap_or(default);
        let flag = |key| value(key).and_then(AttrValue::as_bool).unwrap_or(false);

        DocumentAttributes {
            paper_width: length(AttrKey::PaperWidth, defaults.paper_width),
            paper_height: length(AttrKey::PaperHeight, defaults.paper_height),
            margin_left: length(AttrKey::MarginLeft, defaults.margin_left),
            margin_right: length(AttrKey::MarginRight, defaults.margin_right),
            margin_top: length(AttrKey::MarginTop, defaults.margin_top),
            margin_bottom: length(AttrKey::MarginBottom, defaults.margin_bottom),
            gutter: length(AttrKey::Gutter, defaults.gutter),
            landscape: flag(AttrKey::Landscape),
            widow_control: flag(AttrKey::DocumentWidowControl),
            default_font: value(AttrKey::DefaultFont).and_then(AttrValue::as_int),
        }
    }

    /// Switch the hex escape table, falling back to `ansi`.
    fn set_character_set(&mut self, name: &str) -> DecodeResult<()> {
        match character_set(name) {
            Ok(set) => self.charset = set,
            Err(e) if name != ANSI => {
                tracing::debug!(error = %e, "falling back to the ansi character set");
                self.charset = character_set(ANSI).map_err(DecodeError::MissingCharacterSet)?;
            },
            Err(e) => return Err(DecodeError::MissingCharacterSet(e)),
        }
        Ok(())
    }

    /// Replace the current destination for the rest of the group.
    ///
    /// If the current destination was itself installed inside this group it
    /// is closed first.
    fn set_destination(&mut self, make: impl FnOnce(&mut DecodeContext) -> Destination) {
        let current = self.ctx.state.destination;
        let overridden = self
            .stack
            .top()
            .is_some_and(|saved| saved.destination != current);
        if overridden {
            tracing::debug!("destination overridden within one group");
            self.close_destination(current);
        }

        let destination = make(&mut self.ctx);
        self.install(destination);
    }

    fn install(&mut self, destination: Destination) {
        tracing::trace!(destination = destination.name(), "entering destination");
        self.ctx.state.destination = self.destinations.alloc(destination);
    }

    fn close_destination(&mut self, id: DestinationId) {
        let destination = self.destinations.take(id);
        tracing::trace!(destination = destination.name(), "closing destination");
        destination.close(&mut self.ctx, self.destinations.as_mut_slice());
    }

    /// Deliver text, first flushing an unpaired high surrogate.
    fn deliver_text(&mut self, text: &str) {
        self.flush_high_surrogate();
        self.dispatch_text(text);
    }

    /// A high surrogate followed by anything but `\u` is unpaired.
    fn flush_high_surrogate(&mut self) {
        if self.pending_high_surrogate.take().is_some() {
            self.dispatch_text(char::REPLACEMENT_CHARACTER.encode_utf8(&mut [0; 4]));
        }
    }

    fn dispatch_text(&mut self, text: &str) {
        let current = self.ctx.state.destination;
        self.destinations
            .get_mut(current)
            .handle_text(&mut self.ctx, text);
    }

    /// `\uN`: one UTF-16 code unit, negative values wrapping around.
    fn unicode_character(&mut self, parameter: i32) {
        let unit = parameter.rem_euclid(0x1_0000) as u32;
        match unit {
            0xD800..=0xDBFF => {
                if self.pending_high_surrogate.replace(unit).is_some() {
                    self.dispatch_text(char::REPLACEMENT_CHARACTER.encode_utf8(&mut [0; 4]));
                }
            },
            0xDC00..=0xDFFF => {
                let character = self
                    .pending_high_surrogate
                    .take()
                    .and_then(|high| {
                        char::from_u32(0x1_0000 + ((high - 0xD800) << 10) + (unit - 0xDC00))
                    })
                    .unwrap_or(char::REPLACEMENT_CHARACTER);
                self.dispatch_text(character.encode_utf8(&mut [0; 4]));
            },
            _ => {
                let character = char::from_u32(unit).unwrap_or(char::REPLACEMENT_CHARACTER);
                self.deliver_text(character.encode_utf8(&mut [0; 4]));
            },
        }
    }

    fn discard_group(&mut self, keyword: &str) {
        tracing::debug!(keyword, "discarding group");
        self.set_destination(|_| Destination::Discard);
    }
}

impl RtfSink for RtfReader {
    fn begin_group(&mut self) -> DecodeResult<()> {
        if self.skipping > 0 {
            tracing::debug!(
                remaining = self.skipping,
                "group opened while skipping unicode fallback"
            );
            self.skipping = 0;
        }
        self.flush_high_surrogate();

        self.stack.push(self.ctx.state.clone())?;
        let current = self.ctx.state.destination;
        if let Some(destination) = self.destinations.get_mut(current).begin_group(&mut self.ctx) {
            self.install(destination);
        }
        Ok(())
    }

    fn end_group(&mut self) -> DecodeResult<()> {
        if self.skipping > 0 {
            tracing::debug!(
                remaining = self.skipping,
                "group closed while skipping unicode fallback"
            );
            self.skipping = 0;
        }
        self.flush_high_surrogate();

        // The lexer fills in the offset.
        let restored = self
            .stack
            .pop()
            .ok_or(DecodeError::UnbalancedGroup { offset: 0 })?;
        let current = self.ctx.state.destination;
        if restored.destination != current {
            self.close_destination(current);
        }
        self.ctx.state = restored;
        Ok(())
    }

    fn handle_keyword(&mut self, keyword: &str) -> DecodeResult<bool> {
        if self.skipping > 0 {
            self.skipping -= 1;
            return Ok(true);
        }
        let ignore_if_unknown = std::mem::take(&mut self.ignore_group_if_unknown);
        self.flush_high_surrogate();

        if let Some(text) = TEXT_KEYWORDS.get(keyword) {
            self.deliver_text(text);
            return Ok(true);
        }

        match keyword {
            "fonttbl" => {
                self.set_destination(|_| Destination::FontTable(FontTableDestination::new()))
            },
            "colortbl" => {
                self.set_destination(|_| Destination::ColorTable(ColorTableDestination::new()))
            },
            "stylesheet" => {
                self.set_destination(|_| Destination::StyleSheet(StyleSheetDestination::new()))
            },
            "info" => {
                self.discard_group(keyword);
                return Ok(false);
            },
            "ansi" => self.set_character_set(ANSI)?,
            "mac" => self.set_character_set("mac")?,
            "next" => self.set_character_set("NeXT")?,
            "pc" => self.set_character_set("cpg437")?,
            "pca" => self.set_character_set("cpg850")?,
            "*" => self.ignore_group_if_unknown = true,
            _ => {
                let current = self.ctx.state.destination;
                if self
                    .destinations
                    .get_mut(current)
                    .handle_keyword(&mut self.ctx, keyword)
                {
                    return Ok(true);
                }
                if ignore_if_unknown || UNSUPPORTED_DESTINATIONS.contains(keyword) {
                    self.discard_group(keyword);
                } else {
                    tracing::trace!(keyword, "unhandled keyword");
                }
                return Ok(false);
            },
        }
        Ok(true)
    }

    fn handle_keyword_param(&mut self, keyword: &str, parameter: i32) -> DecodeResult<bool> {
        if self.skipping > 0 {
            self.skipping -= 1;
            return Ok(true);
        }
        let ignore_if_unknown = std::mem::take(&mut self.ignore_group_if_unknown);
        if keyword != "u" {
            self.flush_high_surrogate();
        }

        match keyword {
            "uc" => {
                self.ctx.state.unicode_skip = parameter.max(0) as usize;
                return Ok(true);
            },
            "u" => {
                self.unicode_character(parameter);
                self.skipping = self.ctx.state.unicode_skip;
                return Ok(true);
            },
            "rtf" => {
                self.set_destination(|ctx| Destination::Document(DocumentDestination::new(ctx)));
                return Ok(true);
            },
            "ansicpg" => {
                self.set_character_set(&codepage_name(parameter))?;
                return Ok(true);
            },
            _ => {},
        }

        let current = self.ctx.state.destination;
        if self
            .destinations
            .get_mut(current)
            .handle_keyword_param(&mut self.ctx, keyword, parameter)
        {
            return Ok(true);
        }

        if ignore_if_unknown || keyword.starts_with("NeXT") || keyword == "private" {
            self.discard_group(keyword);
        } else {
            tracing::trace!(keyword, parameter, "unhandled keyword");
        }
        Ok(false)
    }

    fn handle_text(&mut self, text: &str) {
        let text = if self.skipping > 0 {
            match text.char_indices().nth(self.skipping) {
                Some((offset, _)) => {
                    self.skipping = 0;
                    &text[offset..]
                },
                None => {
                    self.skipping -= text.chars().count();
                    return;
                },
            }
        } else {
            text
        };
        self.deliver_text(text);
    }

    fn handle_binary_blob(&mut self, data: &[u8]) {
        // A blob counts as a single fallback unit.
        if self.skipping > 0 {
            self.skipping -= 1;
            return;
        }
        let current = self.ctx.state.destination;
        self.destinations.get_mut(current).handle_binary_blob(data);
    }

    fn translation_table(&self) -> &CharacterSet {
        &self.charset
    }

    fn close(&mut self) -> DecodeResult<()> {
        if self.stack.depth() > 0 {
            tracing::warn!(open = self.stack.depth(), "input ended inside a group");
            while self.stack.depth() > 0 {
                self.end_group()?;
            }
        }
        self.flush_high_surrogate();

        let current = self.ctx.state.destination;
        self.close_destination(current);
        self.closed = true;
        Ok(())
    }
}

/// Decode an RTF document into styled segments.
///
/// # Examples
///
/// ```rust
/// use rtf_segments::rtf::decode;
///
/// let segments = decode(r"{\rtf1 {\b bold} plain\par}")?;
/// assert!(segments[0].as_text().unwrap().attributes.bold);
/// assert!(segments.last().unwrap().is_line_break());
/// # Ok::<(), rtf_segments::rtf::DecodeError>(())
/// ```
pub fn decode(input: &str) -> DecodeResult<Vec<Segment>> {
    decode_with_options(input, &DecodeOptions::default())
}

/// Decode with explicit options.
pub fn decode_with_options(input: &str, options: &DecodeOptions) -> DecodeResult<Vec<Segment>> {
    let mut reader = RtfReader::with_options(options.clone())?;
    reader.read(input)?;
    Ok(reader.finish()?.into_segments())
}

//! Attribute tracking shared by the document and style definitions.
//!
//! A tracker owns one root set per domain holding the defaults. The working
//! sets it writes to live in the [`ParserState`](super::state::ParserState),
//! so they are saved and restored with every group.

use super::attr::{AttrKey, AttrSetId, AttrValue};
use super::attributes::{ArenaTarget, AttrDescriptor, Domain, descriptor, descriptors_for};
use super::destination::DecodeContext;
use super::stylesheet::{StyleId, StyleType};
use super::types::{
    Alignment, Color, ParagraphAttributes, TabAlignment, TabStop, TextAttributes,
};
use std::collections::HashMap;

/// Parameters of attribute keywords are limited to the RTF integer range.
const PARAMETER_LIMIT: i32 = 32767;

/// Root attribute sets of one attribute-tracking destination.
#[derive(Debug, Clone, Copy)]
pub struct AttributeTracking {
    character_root: AttrSetId,
    paragraph_root: AttrSetId,
    section_root: AttrSetId,
}

impl AttributeTracking {
    /// Allocate the roots and store fresh working sets in the parser state.
    pub fn install(ctx: &mut DecodeContext) -> Self {
        let arena = &mut ctx.attrs;

        let character_root = arena.alloc(None);
        arena.set(character_root, AttrKey::Bold, AttrValue::Bool(false));
        arena.set(character_root, AttrKey::Italic, AttrValue::Bool(false));
        arena.set(character_root, AttrKey::Underline, AttrValue::Bool(false));
        arena.set(character_root, AttrKey::TextColor, AttrValue::Color(Color::black()));
        arena.set(character_root, AttrKey::FontSize, AttrValue::Number(12.0));

        let paragraph_root = arena.alloc(Some(ctx.styles.default_style().attributes));
        arena.set(paragraph_root, AttrKey::LeftIndent, AttrValue::Number(0.0));
        arena.set(paragraph_root, AttrKey::RightIndent, AttrValue::Number(0.0));
        arena.set(paragraph_root, AttrKey::FirstLineIndent, AttrValue::Number(0.0));
        arena.set(paragraph_root, AttrKey::Alignment, AttrValue::Alignment(Alignment::Left));

        let section_root = arena.alloc(None);

        ctx.state.character = Some(arena.alloc(Some(character_root)));
        ctx.state.paragraph = Some(arena.alloc(Some(paragraph_root)));
        ctx.state.section = Some(arena.alloc(Some(section_root)));

        Self {
            character_root,
            paragraph_root,
            section_root,
        }
    }

    /// Derive new working sets from the current ones.
    pub fn begin_group(&self, ctx: &mut DecodeContext) {
        let character = self.working(ctx, Domain::Character);
        let paragraph = self.working(ctx, Domain::Paragraph);
        let section = self.working(ctx, Domain::Section);

        ctx.state.character = Some(ctx.attrs.alloc(Some(character)));
        ctx.state.paragraph = Some(ctx.attrs.alloc(Some(paragraph)));
        ctx.state.section = Some(ctx.attrs.alloc(Some(section)));
    }

    fn root(&self, domain: Domain) -> Option<AttrSetId> {
        match domain {
            Domain::Character => Some(self.character_root),
            Domain::Paragraph => Some(self.paragraph_root),
            Domain::Section => Some(self.section_root),
            Domain::Document | Domain::Meta => None,
        }
    }

    /// Set written by descriptors of `domain`.
    fn working(&self, ctx: &DecodeContext, domain: Domain) -> AttrSetId {
        let (working, root) = match domain {
            Domain::Character => (ctx.state.character, self.character_root),
            Domain::Paragraph => (ctx.state.paragraph, self.paragraph_root),
            Domain::Section => (ctx.state.section, self.section_root),
            Domain::Document | Domain::Meta => (Some(ctx.document), ctx.document),
        };
        working.unwrap_or(root)
    }

    fn apply(
        &self,
        ctx: &mut DecodeContext,
        descriptor: &AttrDescriptor,
        parameter: Option<i32>,
    ) -> bool {
        if descriptor.domain == Domain::Meta {
            return match parameter {
                Some(parameter) => descriptor.apply_param(&mut ctx.state, parameter),
                None => descriptor.apply_flag(&mut ctx.state),
            };
        }

        let id = self.working(ctx, descriptor.domain);
        let mut target = ArenaTarget {
            arena: &mut ctx.attrs,
            id,
        };
        match parameter {
            Some(parameter) => descriptor.apply_param(&mut target, parameter),
            None => descriptor.apply_flag(&mut target),
        }
    }

    fn apply_defaults(&self, ctx: &mut DecodeContext, domain: Domain) {
        let id = self.working(ctx, domain);
        for descriptor in descriptors_for(domain) {
            descriptor.apply_default(&mut ArenaTarget {
                arena: &mut ctx.attrs,
                id,
            });
        }
    }

    pub fn handle_keyword(&self, ctx: &mut DecodeContext, keyword: &str) -> bool {
        if keyword == "ulnone" {
            return self.handle_keyword_param(ctx, "ul", 0);
        }

        if let Some(descriptor) = descriptor(keyword)
            && self.apply(ctx, descriptor, None)
        {
            return true;
        }

        match keyword {
            "plain" => self.reset_character(ctx),
            "pard" => self.reset_paragraph(ctx),
            "sectd" => self.reset_section(ctx),
            _ => return false,
        }
        true
    }

    pub fn handle_keyword_param(
        &self,
        ctx: &mut DecodeContext,
        keyword: &str,
        parameter: i32,
    ) -> bool {
        let keyword = if keyword == "fc" { "cf" } else { keyword };
        let parameter = parameter.clamp(-PARAMETER_LIMIT, PARAMETER_LIMIT);

        match keyword {
            "f" => ctx.state.font = Some(parameter),
            "cf" => ctx.state.foreground = Some(parameter),
            "cb" => ctx.state.background = Some(parameter),
            _ => {
                if let Some(descriptor) = descriptor(keyword)
                    && self.apply(ctx, descriptor, Some(parameter))
                {
                    return true;
                }
                return self.handle_other_param(ctx, keyword, parameter);
            },
        }
        true
    }

    fn handle_other_param(&self, ctx: &mut DecodeContext, keyword: &str, parameter: i32) -> bool {
        let style_type = match keyword {
            "tx" | "tb" => {
                let state = &mut ctx.state;
                let alignment = if keyword == "tb" {
                    TabAlignment::Bar
                } else {
                    state.tab_alignment.unwrap_or_default()
                };
                let leader = state.tab_leader.unwrap_or_default();
                state.tab_alignment = None;
                state.tab_leader = None;
                state.tabs.push(TabStop {
                    position: f64::from(parameter) / 20.0,
                    alignment,
                    leader,
                });
                return true;
            },
            "s" => StyleType::Paragraph,
            "cs" => StyleType::Character,
            "ds" => StyleType::Section,
            _ => return false,
        };

        // Style selection needs a stylesheet that defined this style type.
        let Some(table) = ctx.styles.indexed(style_type) else {
            return false;
        };
        let style = table.get(&parameter).copied();
        match style_type {
            StyleType::Paragraph => ctx.state.paragraph_style = style,
            StyleType::Character => ctx.state.character_style = style,
            StyleType::Section => ctx.state.section_style = style,
        }
        true
    }

    /// `\plain`
    fn reset_character(&self, ctx: &mut DecodeContext) {
        self.handle_keyword_param(ctx, "f", 0);
        self.handle_keyword_param(ctx, "cf", 0);
        self.handle_keyword_param(ctx, "fs", 24);
        self.apply_defaults(ctx, Domain::Character);
        ctx.state.character_style = None;
    }

    /// `\pard`
    fn reset_paragraph(&self, ctx: &mut DecodeContext) {
        ctx.state.tabs.clear();
        ctx.state.tab_alignment = None;
        ctx.state.tab_leader = None;
        ctx.state.paragraph_style = None;
        self.apply_defaults(ctx, Domain::Paragraph);
    }

    /// `\sectd`
    fn reset_section(&self, ctx: &mut DecodeContext) {
        self.apply_defaults(ctx, Domain::Section);
        ctx.state.section_style = None;
    }

    /// Effective value of `key`: working sets above the root, then the
    /// pending style, then the root defaults.
    fn lookup<'c>(
        &self,
        ctx: &'c DecodeContext,
        domain: Domain,
        key: AttrKey,
    ) -> Option<&'c AttrValue> {
        let root = self.root(domain)?;
        let style = match domain {
            Domain::Character => ctx.state.character_style,
            Domain::Paragraph => ctx.state.paragraph_style,
            Domain::Section => ctx.state.section_style,
            Domain::Document | Domain::Meta => None,
        };
        let style_set = |style: StyleId| ctx.styles.get(style).attributes;

        ctx.attrs
            .get_until(self.working(ctx, domain), key, Some(root))
            .or_else(|| style.and_then(|s| ctx.attrs.get(style_set(s), key)))
            .or_else(|| ctx.attrs.get(root, key))
    }

    /// Attributes for text delivered now.
    pub fn text_attributes(&self, ctx: &DecodeContext) -> TextAttributes {
        let lookup = |key| self.lookup(ctx, Domain::Character, key);
        let flag = |key| lookup(key).and_then(AttrValue::as_bool).unwrap_or(false);
        let font_name = |font| {
            ctx.fonts
                .get(font)
                .map(|f| f.name.as_str())
                .filter(|name| !name.is_empty())
        };
        let table_color = |index: Option<i32>| index.and_then(|i| ctx.colors.as_ref()?.get(i));

        let default_font = ctx
            .attrs
            .local(ctx.document, AttrKey::DefaultFont)
            .and_then(AttrValue::as_int);
        let font_family = ctx
            .state
            .font
            .and_then(font_name)
            .or_else(|| lookup(AttrKey::FontFamily).and_then(AttrValue::as_text))
            .or_else(|| default_font.and_then(font_name))
            .map(str::to_owned);

        TextAttributes {
            bold: flag(AttrKey::Bold),
            italic: flag(AttrKey::Italic),
            underline: flag(AttrKey::Underline),
            strikethrough: flag(AttrKey::Strikethrough),
            superscript: flag(AttrKey::Superscript),
            subscript: flag(AttrKey::Subscript),
            hidden: flag(AttrKey::Hidden),
            font_family,
            font_size: lookup(AttrKey::FontSize).and_then(AttrValue::as_number),
            text_color: table_color(ctx.state.foreground)
                .or_else(|| lookup(AttrKey::TextColor).and_then(AttrValue::as_color)),
            background: table_color(ctx.state.background)
                .or_else(|| lookup(AttrKey::Background).and_then(AttrValue::as_color)),
        }
    }

    /// Attributes of the paragraph being finished.
    pub fn paragraph_attributes(&self, ctx: &DecodeContext) -> ParagraphAttributes {
        let lookup = |key| self.lookup(ctx, Domain::Paragraph, key);
        let length = |key| lookup(key).and_then(AttrValue::as_number).unwrap_or(0.0);

        ParagraphAttributes {
            alignment: lookup(AttrKey::Alignment)
                .and_then(AttrValue::as_alignment)
                .unwrap_or_default(),
            left_indent: length(AttrKey::LeftIndent),
            right_indent: length(AttrKey::RightIndent),
            first_line_indent: length(AttrKey::FirstLineIndent),
            space_before: length(AttrKey::SpaceBefore),
            space_after: length(AttrKey::SpaceAfter),
            widow_control: lookup(AttrKey::WidowControl).and_then(AttrValue::as_bool),
            tab_stops: ctx.state.tabs.to_vec(),
        }
    }

    /// Entries set explicitly in the working sets of one style type.
    pub fn explicit(
        &self,
        ctx: &DecodeContext,
        style_type: StyleType,
    ) -> HashMap<AttrKey, AttrValue> {
        let domain = match style_type {
            StyleType::Character => Domain::Character,
            StyleType::Paragraph => Domain::Paragraph,
            StyleType::Section => Domain::Section,
        };
        ctx.attrs
            .flatten_until(self.working(ctx, domain), self.root(domain))
    }
}

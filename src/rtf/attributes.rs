//! Keyword → attribute descriptor table.
//!
//! Each descriptor knows which domain it belongs to and how to apply itself
//! to a target: as a bare flag (`\b`), with an integer parameter (`\b0`,
//! `\li720`), or by restoring the domain default (`\plain`, `\pard`,
//! `\sectd`).

use super::attr::{AttrArena, AttrKey, AttrSetId, AttrValue};
use super::types::{Alignment, TabAlignment, TabLeader};
use phf::phf_map;

/// Which attribute set a descriptor writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Domain {
    Character,
    Paragraph,
    Section,
    Document,
    /// Parser bookkeeping kept in the parser state
    Meta,
}

/// How a descriptor turns a keyword into a value.
#[derive(Debug, Clone, PartialEq)]
pub enum DescriptorKind {
    /// `\kw` sets true, `\kwN` sets `N != 0`
    Boolean { default: bool },
    /// `\kw` asserts a fixed value; parameters are not accepted
    Assertive {
        value: AttrValue,
        default: Option<AttrValue>,
    },
    /// `\kwN` stores `N / scale`; `default` is in keyword units
    Numeric { scale: f64, default: Option<i32> },
    /// `\kwN` stores `N` unchanged
    Integer,
}

/// Something a descriptor can read and write.
pub trait AttrTarget {
    fn get_attr(&self, key: AttrKey) -> Option<AttrValue>;
    fn set_attr(&mut self, key: AttrKey, value: AttrValue);
}

/// A single set in an arena, as a descriptor target.
pub struct ArenaTarget<'a> {
    pub arena: &'a mut AttrArena,
    pub id: AttrSetId,
}

impl AttrTarget for ArenaTarget<'_> {
    fn get_attr(&self, key: AttrKey) -> Option<AttrValue> {
        self.arena.get(self.id, key).cloned()
    }

    fn set_attr(&mut self, key: AttrKey, value: AttrValue) {
        self.arena.set(self.id, key, value);
    }
}

/// An RTF keyword bound to a semantic attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct AttrDescriptor {
    pub domain: Domain,
    pub key: AttrKey,
    pub keyword: &'static str,
    pub kind: DescriptorKind,
}

impl AttrDescriptor {
    const fn boolean(domain: Domain, key: AttrKey, keyword: &'static str) -> Self {
        Self {
            domain,
            key,
            keyword,
            kind: DescriptorKind::Boolean { default: false },
        }
    }

    const fn assertive(
        domain: Domain,
        key: AttrKey,
        keyword: &'static str,
        value: AttrValue,
        default: Option<AttrValue>,
    ) -> Self {
        Self {
            domain,
            key,
            keyword,
            kind: DescriptorKind::Assertive { value, default },
        }
    }

    const fn numeric(
        domain: Domain,
        key: AttrKey,
        keyword: &'static str,
        scale: f64,
        default: i32,
    ) -> Self {
        Self {
            domain,
            key,
            keyword,
            kind: DescriptorKind::Numeric {
                scale,
                default: Some(default),
            },
        }
    }

    const fn twips(domain: Domain, key: AttrKey, keyword: &'static str, default: i32) -> Self {
        Self::numeric(domain, key, keyword, 20.0, default)
    }

    /// Apply the parameterless form. Returns `false` if not accepted.
    pub fn apply_flag(&self, target: &mut dyn AttrTarget) -> bool {
        match &self.kind {
            DescriptorKind::Boolean { .. } => {
                target.set_attr(self.key, AttrValue::Bool(true));
                true
            },
            DescriptorKind::Assertive { value, .. } => {
                target.set_attr(self.key, value.clone());
                true
            },
            DescriptorKind::Numeric { .. } | DescriptorKind::Integer => false,
        }
    }

    /// Apply the parameterised form. Returns `false` if not accepted.
    pub fn apply_param(&self, target: &mut dyn AttrTarget, parameter: i32) -> bool {
        match &self.kind {
            DescriptorKind::Boolean { .. } => {
                target.set_attr(self.key, AttrValue::Bool(parameter != 0));
                true
            },
            DescriptorKind::Assertive { .. } => false,
            DescriptorKind::Numeric { scale, .. } => {
                target.set_attr(self.key, AttrValue::Number(f64::from(parameter) / scale));
                true
            },
            DescriptorKind::Integer => {
                target.set_attr(self.key, AttrValue::Int(parameter));
                true
            },
        }
    }

    /// Restore the domain default, writing only if the live value differs.
    /// Returns `false` if this descriptor has no default.
    pub fn apply_default(&self, target: &mut dyn AttrTarget) -> bool {
        let default = match &self.kind {
            DescriptorKind::Boolean { default } => AttrValue::Bool(*default),
            DescriptorKind::Assertive {
                default: Some(default),
                ..
            } => default.clone(),
            DescriptorKind::Numeric {
                scale,
                default: Some(default),
            } => AttrValue::Number(f64::from(*default) / scale),
            _ => return false,
        };

        if target.get_attr(self.key).as_ref() != Some(&default) {
            target.set_attr(self.key, default);
        }
        true
    }
}

use AttrKey as K;
use Domain::{Character as C, Document as D, Meta as M, Paragraph as P, Section as S};

static DESCRIPTORS: phf::Map<&'static str, AttrDescriptor> = phf_map! {
    // Character
    "b" => AttrDescriptor::boolean(C, K::Bold, "b"),
    "i" => AttrDescriptor::boolean(C, K::Italic, "i"),
    "ul" => AttrDescriptor::boolean(C, K::Underline, "ul"),
    "uld" => AttrDescriptor::assertive(C, K::Underline, "uld", AttrValue::Bool(true), None),
    "uldb" => AttrDescriptor::assertive(C, K::Underline, "uldb", AttrValue::Bool(true), None),
    "uldash" => AttrDescriptor::assertive(C, K::Underline, "uldash", AttrValue::Bool(true), None),
    "ulth" => AttrDescriptor::assertive(C, K::Underline, "ulth", AttrValue::Bool(true), None),
    "ulw" => AttrDescriptor::assertive(C, K::Underline, "ulw", AttrValue::Bool(true), None),
    "ulwave" => AttrDescriptor::assertive(C, K::Underline, "ulwave", AttrValue::Bool(true), None),
    "strike" => AttrDescriptor::boolean(C, K::Strikethrough, "strike"),
    "striked" => AttrDescriptor::boolean(C, K::Strikethrough, "striked"),
    "super" => AttrDescriptor::boolean(C, K::Superscript, "super"),
    "sub" => AttrDescriptor::boolean(C, K::Subscript, "sub"),
    "v" => AttrDescriptor::boolean(C, K::Hidden, "v"),
    "caps" => AttrDescriptor::boolean(C, K::Caps, "caps"),
    "scaps" => AttrDescriptor::boolean(C, K::SmallCaps, "scaps"),
    "outl" => AttrDescriptor::boolean(C, K::Outline, "outl"),
    "shad" => AttrDescriptor::boolean(C, K::Shadow, "shad"),
    "fs" => AttrDescriptor::numeric(C, K::FontSize, "fs", 2.0, 24),

    // Paragraph
    "ql" => AttrDescriptor::assertive(P, K::Alignment, "ql",
        AttrValue::Alignment(Alignment::Left), Some(AttrValue::Alignment(Alignment::Left))),
    "qr" => AttrDescriptor::assertive(P, K::Alignment, "qr",
        AttrValue::Alignment(Alignment::Right), Some(AttrValue::Alignment(Alignment::Left))),
    "qc" => AttrDescriptor::assertive(P, K::Alignment, "qc",
        AttrValue::Alignment(Alignment::Center), Some(AttrValue::Alignment(Alignment::Left))),
    "qj" => AttrDescriptor::assertive(P, K::Alignment, "qj",
        AttrValue::Alignment(Alignment::Justify), Some(AttrValue::Alignment(Alignment::Left))),
    "li" => AttrDescriptor::twips(P, K::LeftIndent, "li", 0),
    "ri" => AttrDescriptor::twips(P, K::RightIndent, "ri", 0),
    "fi" => AttrDescriptor::twips(P, K::FirstLineIndent, "fi", 0),
    "sb" => AttrDescriptor::twips(P, K::SpaceBefore, "sb", 0),
    "sa" => AttrDescriptor::twips(P, K::SpaceAfter, "sa", 0),
    "widctlpar" => AttrDescriptor::assertive(P, K::WidowControl, "widctlpar",
        AttrValue::Bool(true), None),
    "nowidctlpar" => AttrDescriptor::assertive(P, K::WidowControl, "nowidctlpar",
        AttrValue::Bool(false), None),

    // Section
    "cols" => AttrDescriptor::numeric(S, K::Columns, "cols", 1.0, 1),
    "colsx" => AttrDescriptor::twips(S, K::ColumnSpacing, "colsx", 720),
    "titlepg" => AttrDescriptor::boolean(S, K::TitlePage, "titlepg"),

    // Document
    "paperw" => AttrDescriptor::twips(D, K::PaperWidth, "paperw", 12240),
    "paperh" => AttrDescriptor::twips(D, K::PaperHeight, "paperh", 15840),
    "margl" => AttrDescriptor::twips(D, K::MarginLeft, "margl", 1800),
    "margr" => AttrDescriptor::twips(D, K::MarginRight, "margr", 1800),
    "margt" => AttrDescriptor::twips(D, K::MarginTop, "margt", 1440),
    "margb" => AttrDescriptor::twips(D, K::MarginBottom, "margb", 1440),
    "gutter" => AttrDescriptor::twips(D, K::Gutter, "gutter", 0),
    "landscape" => AttrDescriptor::assertive(D, K::Landscape, "landscape",
        AttrValue::Bool(true), None),
    "widowctrl" => AttrDescriptor::assertive(D, K::DocumentWidowControl, "widowctrl",
        AttrValue::Bool(true), None),
    "deff" => AttrDescriptor {
        domain: D,
        key: K::DefaultFont,
        keyword: "deff",
        kind: DescriptorKind::Integer,
    },

    // Meta: pending tab stop properties, consumed by the next \tx or \tb
    "tqr" => AttrDescriptor::assertive(M, K::TabAlignment, "tqr",
        AttrValue::TabAlignment(TabAlignment::Right), None),
    "tqc" => AttrDescriptor::assertive(M, K::TabAlignment, "tqc",
        AttrValue::TabAlignment(TabAlignment::Center), None),
    "tqdec" => AttrDescriptor::assertive(M, K::TabAlignment, "tqdec",
        AttrValue::TabAlignment(TabAlignment::Decimal), None),
    "tldot" => AttrDescriptor::assertive(M, K::TabLeader, "tldot",
        AttrValue::TabLeader(TabLeader::Dots), None),
    "tlhyph" => AttrDescriptor::assertive(M, K::TabLeader, "tlhyph",
        AttrValue::TabLeader(TabLeader::Hyphens), None),
    "tlul" => AttrDescriptor::assertive(M, K::TabLeader, "tlul",
        AttrValue::TabLeader(TabLeader::Underline), None),
    "tlth" => AttrDescriptor::assertive(M, K::TabLeader, "tlth",
        AttrValue::TabLeader(TabLeader::ThickLine), None),
    "tleq" => AttrDescriptor::assertive(M, K::TabLeader, "tleq",
        AttrValue::TabLeader(TabLeader::Equals), None),
};

/// Look up the descriptor for `keyword`.
#[inline]
pub fn descriptor(keyword: &str) -> Option<&'static AttrDescriptor> {
    DESCRIPTORS.get(keyword)
}

/// All descriptors of one domain.
pub fn descriptors_for(domain: Domain) -> impl Iterator<Item = &'static AttrDescriptor> {
    DESCRIPTORS.values().filter(move |d| d.domain == domain)
}

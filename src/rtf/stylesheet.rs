//! RTF stylesheet support.
//!
//! Style definitions are collected while the `\stylesheet` group is read and
//! realized into [`Style`]s when it closes. Realization follows `\sbasedon`
//! links with a visited set, so cyclic definitions still terminate.

use super::attr::{AttrArena, AttrKey, AttrSetId, AttrValue};
use super::destination::{DecodeContext, Destination, DestinationId};
use super::tracking::AttributeTracking;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Style number Word writes for "no style".
const NO_STYLE: i32 = 222;

/// Name of the style every paragraph root resolves through.
pub const DEFAULT_STYLE: &str = "default";

/// Index of a realized style in its [`StyleTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StyleId(usize);

/// Style type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StyleType {
    /// Paragraph style (`\s`)
    #[default]
    Paragraph,
    /// Character style (`\cs`)
    Character,
    /// Section style (`\ds`)
    Section,
}

/// A realized style.
#[derive(Debug, Clone)]
pub struct Style {
    /// Style name
    pub name: Option<String>,
    /// Style type
    pub style_type: StyleType,
    /// Attributes, resolving through the based-on style
    pub attributes: AttrSetId,
    /// Style for the next paragraph
    pub next_style: Option<StyleId>,
    pub additive: bool,
    pub hidden: bool,
}

/// Per-decode style registry.
#[derive(Debug)]
pub struct StyleTable {
    styles: Vec<Style>,
    by_name: HashMap<String, StyleId>,
    character: Option<BTreeMap<i32, StyleId>>,
    paragraph: Option<BTreeMap<i32, StyleId>>,
    section: Option<BTreeMap<i32, StyleId>>,
}

impl StyleTable {
    /// Create a table holding only the default style.
    pub fn new(arena: &mut AttrArena) -> Self {
        let mut table = Self {
            styles: Vec::new(),
            by_name: HashMap::new(),
            character: None,
            paragraph: None,
            section: None,
        };
        table.add(Some(DEFAULT_STYLE.to_string()), StyleType::Paragraph, arena.alloc(None));
        table
    }

    fn add(
        &mut self,
        name: Option<String>,
        style_type: StyleType,
        attributes: AttrSetId,
    ) -> StyleId {
        let id = StyleId(self.styles.len());
        if let Some(name) = &name {
            // A later style with the same name shadows the earlier one.
            self.by_name.insert(name.clone(), id);
        }
        self.styles.push(Style {
            name,
            style_type,
            attributes,
            next_style: None,
            additive: false,
            hidden: false,
        });
        id
    }

    #[inline]
    pub fn get(&self, id: StyleId) -> &Style {
        &self.styles[id.0]
    }

    #[inline]
    fn get_mut(&mut self, id: StyleId) -> &mut Style {
        &mut self.styles[id.0]
    }

    /// Look up a style by name.
    pub fn by_name(&self, name: &str) -> Option<&Style> {
        self.by_name.get(name).map(|id| self.get(*id))
    }

    /// The style always present under [`DEFAULT_STYLE`].
    pub fn default_style(&self) -> &Style {
        &self.styles[0]
    }

    /// Number of realized styles, including the default style.
    #[inline]
    pub fn len(&self) -> usize {
        self.styles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }

    /// Index table for one style type, once a stylesheet has defined it.
    pub fn indexed(&self, style_type: StyleType) -> Option<&BTreeMap<i32, StyleId>> {
        match style_type {
            StyleType::Character => self.character.as_ref(),
            StyleType::Paragraph => self.paragraph.as_ref(),
            StyleType::Section => self.section.as_ref(),
        }
    }

    /// Replace the index table of one style type.
    fn set_indexed(&mut self, style_type: StyleType, table: BTreeMap<i32, StyleId>) {
        let slot = match style_type {
            StyleType::Character => &mut self.character,
            StyleType::Paragraph => &mut self.paragraph,
            StyleType::Section => &mut self.section,
        };
        *slot = Some(table);
    }
}

/// A style as read from the stylesheet, before realization.
#[derive(Debug, Clone, Default)]
pub struct StyleDefinition {
    pub name: Option<String>,
    pub number: i32,
    pub style_type: StyleType,
    pub based_on: Option<i32>,
    pub next_style: Option<i32>,
    pub additive: bool,
    pub hidden: bool,
    /// Attributes set explicitly inside the definition
    pub attributes: HashMap<AttrKey, AttrValue>,
    realized: Option<StyleId>,
}

/// Turn `\sbasedon` / `\snext` parameters into style numbers.
fn style_number(parameter: i32) -> Option<i32> {
    (parameter != NO_STYLE).then_some(parameter)
}

struct Realizer<'a> {
    definitions: &'a mut BTreeMap<i32, StyleDefinition>,
    styles: &'a mut StyleTable,
    arena: &'a mut AttrArena,
}

impl Realizer<'_> {
    fn realize(&mut self, number: i32, visited: &mut HashSet<i32>) -> Option<StyleId> {
        let definition = self.definitions.get(&number)?;
        if let Some(id) = definition.realized {
            return Some(id);
        }

        let based_on = definition.based_on;
        let basis = match based_on {
            Some(based_on) if visited.insert(based_on) => self.realize(based_on, visited),
            Some(based_on) => {
                tracing::debug!(number, based_on, "ignoring cyclic \\sbasedon");
                None
            },
            None => None,
        };

        let definition = self.definitions.get_mut(&number)?;
        // The basis may have reached this style through its `\snext`.
        if let Some(id) = definition.realized {
            return Some(id);
        }
        let parent = basis.map(|id| self.styles.get(id).attributes);
        let attributes = self.arena.alloc_with(definition.attributes.clone(), parent);
        let id = self.styles.add(definition.name.clone(), definition.style_type, attributes);
        {
            let style = self.styles.get_mut(id);
            style.additive = definition.additive;
            style.hidden = definition.hidden;
        }
        definition.realized = Some(id);
        let next_style = definition.next_style;

        if let Some(next) = next_style {
            let next_style = self.realize(next, &mut HashSet::from([next]));
            self.styles.get_mut(id).next_style = next_style;
        }

        Some(id)
    }
}

/// Realize every definition and install the per-type index tables.
///
/// Definitions are realized in ascending number order. A type's index table
/// is only replaced if this stylesheet defined at least one style of it.
pub fn realize_styles(
    definitions: &mut BTreeMap<i32, StyleDefinition>,
    styles: &mut StyleTable,
    arena: &mut AttrArena,
) {
    let numbers: Vec<i32> = definitions.keys().copied().collect();
    let mut partitioned: [BTreeMap<i32, StyleId>; 3] = Default::default();

    let mut realizer = Realizer {
        definitions,
        styles,
        arena,
    };
    for number in numbers {
        let Some(id) = realizer.realize(number, &mut HashSet::from([number])) else {
            continue;
        };
        let slot = match realizer.styles.get(id).style_type {
            StyleType::Character => 0,
            StyleType::Paragraph => 1,
            StyleType::Section => 2,
        };
        partitioned[slot].insert(number, id);
    }

    let [character, paragraph, section] = partitioned;
    for (style_type, table) in [
        (StyleType::Character, character),
        (StyleType::Paragraph, paragraph),
        (StyleType::Section, section),
    ] {
        if !table.is_empty() {
            styles.set_indexed(style_type, table);
        }
    }
}

/// The `\stylesheet` destination.
#[derive(Debug, Default)]
pub struct StyleSheetDestination {
    definitions: BTreeMap<i32, StyleDefinition>,
}

impl StyleSheetDestination {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every group inside the stylesheet defines one style.
    pub fn begin_group(&mut self, ctx: &mut DecodeContext) -> Option<Destination> {
        let sheet = ctx.state.destination;
        Some(Destination::StyleDefining(StyleDefiningDestination::new(ctx, sheet)))
    }

    pub fn define(&mut self, definition: StyleDefinition) {
        self.definitions.insert(definition.number, definition);
    }

    pub fn close(mut self, ctx: &mut DecodeContext) {
        tracing::debug!(count = self.definitions.len(), "realizing stylesheet");
        realize_styles(&mut self.definitions, &mut ctx.styles, &mut ctx.attrs);
    }
}

/// One `{\s1 ...;}` style definition group.
#[derive(Debug)]
pub struct StyleDefiningDestination {
    tracking: AttributeTracking,
    sheet: DestinationId,
    definition: StyleDefinition,
    font: Option<i32>,
    foreground: Option<i32>,
    background: Option<i32>,
}

impl StyleDefiningDestination {
    pub fn new(ctx: &mut DecodeContext, sheet: DestinationId) -> Self {
        Self {
            tracking: AttributeTracking::install(ctx),
            sheet,
            definition: StyleDefinition::default(),
            font: None,
            foreground: None,
            background: None,
        }
    }

    pub fn begin_group(&mut self, ctx: &mut DecodeContext) {
        self.tracking.begin_group(ctx);
    }

    pub fn handle_text(&mut self, text: &str) {
        self.definition
            .name
            .get_or_insert_with(String::new)
            .push_str(text);
    }

    pub fn handle_keyword(&mut self, ctx: &mut DecodeContext, keyword: &str) -> bool {
        match keyword {
            "additive" => self.definition.additive = true,
            "shidden" => self.definition.hidden = true,
            _ => return self.tracking.handle_keyword(ctx, keyword),
        }
        true
    }

    pub fn handle_keyword_param(
        &mut self,
        ctx: &mut DecodeContext,
        keyword: &str,
        parameter: i32,
    ) -> bool {
        let parameter = parameter.clamp(-32767, 32767);
        let definition = &mut self.definition;
        match keyword {
            "s" => {
                definition.style_type = StyleType::Paragraph;
                definition.number = parameter;
            },
            "cs" => {
                definition.style_type = StyleType::Character;
                definition.number = parameter;
            },
            "ds" => {
                definition.style_type = StyleType::Section;
                definition.number = parameter;
            },
            "sbasedon" => definition.based_on = style_number(parameter),
            "snext" => definition.next_style = style_number(parameter),
            _ => {
                let handled = self.tracking.handle_keyword_param(ctx, keyword, parameter);
                // Record selections made inside this definition so they can
                // be captured as explicit attributes.
                match keyword {
                    "f" => self.font = ctx.state.font,
                    "cf" | "fc" => self.foreground = ctx.state.foreground,
                    "cb" => self.background = ctx.state.background,
                    _ => {},
                }
                return handled;
            },
        }
        true
    }

    /// Capture the explicit attributes and hand the definition to the sheet.
    pub fn close(mut self, ctx: &mut DecodeContext, destinations: &mut [Destination]) {
        if let Some(name) = &mut self.definition.name
            && let Some(semicolon) = name.find(';')
        {
            name.truncate(semicolon);
        }

        let mut attributes = self.tracking.explicit(ctx, self.definition.style_type);
        if self.definition.style_type == StyleType::Character {
            if let Some(font) = self.font.and_then(|f| ctx.fonts.get(f)) {
                attributes.insert(AttrKey::FontFamily, AttrValue::Text(font.name.clone()));
            }
            let colors = ctx.colors.as_ref();
            if let Some(color) = self.foreground.and_then(|c| colors?.get(c)) {
                attributes.insert(AttrKey::TextColor, AttrValue::Color(color));
            }
            if let Some(color) = self.background.and_then(|c| colors?.get(c)) {
                attributes.insert(AttrKey::Background, AttrValue::Color(color));
            }
        }
        self.definition.attributes = attributes;

        tracing::trace!(
            number = self.definition.number,
            name = ?self.definition.name,
            "style defined"
        );
        match destinations.get_mut(self.sheet.index()) {
            Some(Destination::StyleSheet(sheet)) => sheet.define(self.definition),
            _ => tracing::debug!("style definition outside of a stylesheet dropped"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn definition(number: i32, style_type: StyleType, based_on: Option<i32>) -> StyleDefinition {
        StyleDefinition {
            name: Some(format!("style {}", number)),
            number,
            style_type,
            based_on,
            ..Default::default()
        }
    }

    #[test]
    fn test_default_style_exists() {
        let mut arena = AttrArena::new();
        let styles = StyleTable::new(&mut arena);
        assert!(!styles.is_empty());
        assert_eq!(styles.default_style().name.as_deref(), Some(DEFAULT_STYLE));
        assert!(styles.by_name(DEFAULT_STYLE).is_some());
        assert!(styles.indexed(StyleType::Paragraph).is_none());
    }

    #[test]
    fn test_based_on_chain_resolves() {
        let mut arena = AttrArena::new();
        let mut styles = StyleTable::new(&mut arena);
        let mut definitions = BTreeMap::new();

        let mut base = definition(1, StyleType::Paragraph, None);
        base.attributes.insert(AttrKey::LeftIndent, AttrValue::Number(36.0));
        let mut derived = definition(2, StyleType::Paragraph, Some(1));
        derived.attributes.insert(AttrKey::RightIndent, AttrValue::Number(18.0));
        definitions.insert(1, base);
        definitions.insert(2, derived);

        realize_styles(&mut definitions, &mut styles, &mut arena);

        let table = styles.indexed(StyleType::Paragraph).unwrap();
        let derived = styles.get(table[&2]);
        assert_eq!(
            arena.get(derived.attributes, AttrKey::LeftIndent),
            Some(&AttrValue::Number(36.0))
        );
        assert_eq!(
            arena.get(derived.attributes, AttrKey::RightIndent),
            Some(&AttrValue::Number(18.0))
        );
    }

    #[test]
    fn test_cyclic_based_on_terminates() {
        let mut arena = AttrArena::new();
        let mut styles = StyleTable::new(&mut arena);
        let mut definitions = BTreeMap::new();
        definitions.insert(1, definition(1, StyleType::Paragraph, Some(2)));
        definitions.insert(2, definition(2, StyleType::Paragraph, Some(1)));
        definitions.insert(3, definition(3, StyleType::Paragraph, Some(3)));

        realize_styles(&mut definitions, &mut styles, &mut arena);

        let table = styles.indexed(StyleType::Paragraph).unwrap();
        assert_eq!(table.len(), 3);
        // default + one realization per definition
        assert_eq!(styles.len(), 4);
        let first = styles.get(table[&1]);
        assert!(arena.chain(first.attributes).count() <= 3);
    }

    #[test]
    fn test_next_style_cycle_realizes_once() {
        let mut arena = AttrArena::new();
        let mut styles = StyleTable::new(&mut arena);
        let mut definitions = BTreeMap::new();
        let mut first = definition(1, StyleType::Paragraph, Some(2));
        first.attributes.insert(AttrKey::Bold, AttrValue::Bool(true));
        let mut second = definition(2, StyleType::Paragraph, None);
        second.next_style = Some(1);
        second.attributes.insert(AttrKey::Italic, AttrValue::Bool(true));
        definitions.insert(1, first);
        definitions.insert(2, second);

        realize_styles(&mut definitions, &mut styles, &mut arena);

        assert_eq!(styles.len(), 3);
        let table = styles.indexed(StyleType::Paragraph).unwrap();
        assert_eq!(styles.get(table[&2]).next_style, Some(table[&1]));
        assert_eq!(
            arena.get(styles.get(table[&1]).attributes, AttrKey::Italic),
            Some(&AttrValue::Bool(true))
        );
    }

    #[test]
    fn test_next_style_and_flags() {
        let mut arena = AttrArena::new();
        let mut styles = StyleTable::new(&mut arena);
        let mut definitions = BTreeMap::new();
        let mut heading = definition(1, StyleType::Paragraph, None);
        heading.next_style = Some(0);
        heading.hidden = true;
        definitions.insert(0, definition(0, StyleType::Paragraph, None));
        definitions.insert(1, heading);

        realize_styles(&mut definitions, &mut styles, &mut arena);

        let table = styles.indexed(StyleType::Paragraph).unwrap();
        let heading = styles.get(table[&1]);
        assert!(heading.hidden);
        assert_eq!(heading.next_style, Some(table[&0]));
    }

    #[test]
    fn test_partition_by_type() {
        let mut arena = AttrArena::new();
        let mut styles = StyleTable::new(&mut arena);
        let mut definitions = BTreeMap::new();
        definitions.insert(10, definition(10, StyleType::Character, None));
        realize_styles(&mut definitions, &mut styles, &mut arena);

        assert!(styles.indexed(StyleType::Character).is_some());
        assert!(styles.indexed(StyleType::Paragraph).is_none());
        assert!(styles.indexed(StyleType::Section).is_none());
        assert_eq!(
            styles.by_name("style 10").map(|s| s.style_type),
            Some(StyleType::Character)
        );
    }

    #[test]
    fn test_no_style_marker() {
        assert_eq!(style_number(NO_STYLE), None);
        assert_eq!(style_number(3), Some(3));
    }
}

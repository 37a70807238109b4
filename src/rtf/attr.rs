//! Scoped attribute sets.
//!
//! Every attribute set of a decode lives in one [`AttrArena`] and names its
//! resolve parent by index. Lookups that miss locally continue through the
//! parent chain. Chains are walked with an explicit loop; a chain that turns
//! out to be longer than a few dozen links is tracked in a visited bitset so
//! a cycle ends the walk instead of looping forever.

use super::types::{Alignment, Color, TabAlignment, TabLeader};
use fixedbitset::FixedBitSet;
use std::collections::HashMap;

/// Number of links walked before visited tracking kicks in.
const SHALLOW_CHAIN: usize = 32;

/// Semantic attribute identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttrKey {
    // Character
    Bold,
    Italic,
    Underline,
    Strikethrough,
    Superscript,
    Subscript,
    Hidden,
    Caps,
    SmallCaps,
    Outline,
    Shadow,
    FontSize,
    FontFamily,
    TextColor,
    Background,

    // Paragraph
    Alignment,
    LeftIndent,
    RightIndent,
    FirstLineIndent,
    SpaceBefore,
    SpaceAfter,
    WidowControl,

    // Section
    Columns,
    ColumnSpacing,
    TitlePage,

    // Document
    PaperWidth,
    PaperHeight,
    MarginLeft,
    MarginRight,
    MarginTop,
    MarginBottom,
    Gutter,
    Landscape,
    DocumentWidowControl,
    DefaultFont,

    // Meta
    TabAlignment,
    TabLeader,
}

/// Attribute values.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Bool(bool),
    Number(f64),
    Int(i32),
    Text(String),
    Color(Color),
    Alignment(Alignment),
    TabAlignment(TabAlignment),
    TabLeader(TabLeader),
}

impl AttrValue {
    #[inline]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttrValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    #[inline]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            AttrValue::Number(value) => Some(*value),
            AttrValue::Int(value) => Some(f64::from(*value)),
            _ => None,
        }
    }

    #[inline]
    pub fn as_int(&self) -> Option<i32> {
        match self {
            AttrValue::Int(value) => Some(*value),
            _ => None,
        }
    }

    #[inline]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttrValue::Text(value) => Some(value),
            _ => None,
        }
    }

    #[inline]
    pub fn as_color(&self) -> Option<Color> {
        match self {
            AttrValue::Color(value) => Some(*value),
            _ => None,
        }
    }

    #[inline]
    pub fn as_alignment(&self) -> Option<Alignment> {
        match self {
            AttrValue::Alignment(value) => Some(*value),
            _ => None,
        }
    }
}

/// Index of an attribute set in its arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttrSetId(usize);

/// Local entries plus an optional resolve parent.
#[derive(Debug, Clone, Default)]
pub struct AttrSet {
    values: HashMap<AttrKey, AttrValue>,
    parent: Option<AttrSetId>,
}

/// Owner of all attribute sets created during one decode.
#[derive(Debug, Default)]
pub struct AttrArena {
    sets: Vec<AttrSet>,
}

impl AttrArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty set delegating to `parent`.
    pub fn alloc(&mut self, parent: Option<AttrSetId>) -> AttrSetId {
        self.sets.push(AttrSet {
            values: HashMap::new(),
            parent,
        });
        AttrSetId(self.sets.len() - 1)
    }

    /// Create a set holding `values`, delegating to `parent`.
    pub fn alloc_with(
        &mut self,
        values: HashMap<AttrKey, AttrValue>,
        parent: Option<AttrSetId>,
    ) -> AttrSetId {
        self.sets.push(AttrSet { values, parent });
        AttrSetId(self.sets.len() - 1)
    }

    #[inline]
    pub fn parent(&self, id: AttrSetId) -> Option<AttrSetId> {
        self.sets[id.0].parent
    }

    /// Replace the delegate of `id`. Does not copy anything from `parent`.
    #[inline]
    pub fn set_parent(&mut self, id: AttrSetId, parent: Option<AttrSetId>) {
        self.sets[id.0].parent = parent;
    }

    /// Local entry of `id`, ignoring parents.
    #[inline]
    pub fn local(&self, id: AttrSetId, key: AttrKey) -> Option<&AttrValue> {
        self.sets[id.0].values.get(&key)
    }

    #[inline]
    pub fn set(&mut self, id: AttrSetId, key: AttrKey, value: AttrValue) {
        self.sets[id.0].values.insert(key, value);
    }

    /// Effective value of `key`: local entry, else the parent chain.
    pub fn get(&self, id: AttrSetId, key: AttrKey) -> Option<&AttrValue> {
        self.get_until(id, key, None)
    }

    /// Like [`get`](Self::get), but stops before reaching `stop`.
    pub fn get_until(
        &self,
        id: AttrSetId,
        key: AttrKey,
        stop: Option<AttrSetId>,
    ) -> Option<&AttrValue> {
        self.chain(id)
            .take_while(|link| Some(*link) != stop)
            .find_map(|link| self.local(link, key))
    }

    /// Merge the chain from `id` up to (excluding) `stop` into one map.
    /// Entries closer to `id` win.
    pub fn flatten_until(
        &self,
        id: AttrSetId,
        stop: Option<AttrSetId>,
    ) -> HashMap<AttrKey, AttrValue> {
        let mut merged = HashMap::new();
        for link in self.chain(id).take_while(|link| Some(*link) != stop) {
            for (key, value) in &self.sets[link.0].values {
                merged.entry(*key).or_insert_with(|| value.clone());
            }
        }
        merged
    }

    /// Iterate over `id` and its ancestors.
    pub fn chain(&self, id: AttrSetId) -> Chain<'_> {
        Chain {
            arena: self,
            next: Some(id),
            steps: 0,
            visited: None,
        }
    }
}

/// Iterator over a resolve-parent chain.
pub struct Chain<'a> {
    arena: &'a AttrArena,
    next: Option<AttrSetId>,
    steps: usize,
    visited: Option<FixedBitSet>,
}

impl Iterator for Chain<'_> {
    type Item = AttrSetId;

    fn next(&mut self) -> Option<AttrSetId> {
        let current = self.next?;

        self.steps += 1;
        if self.steps > SHALLOW_CHAIN {
            // Parents precede their children in the arena, so the first
            // tracked link normally fixes the size.
            let visited = self.visited.get_or_insert_with(FixedBitSet::new);
            if current.0 >= visited.len() {
                visited.grow(current.0 + 1);
            }
            if visited.put(current.0) {
                tracing::warn!(set = current.0, "attribute resolve chain contains a cycle");
                self.next = None;
                return None;
            }
        }

        self.next = self.arena.parent(current);
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_walks_parents() {
        let mut arena = AttrArena::new();
        let root = arena.alloc(None);
        arena.set(root, AttrKey::Bold, AttrValue::Bool(false));
        arena.set(root, AttrKey::Italic, AttrValue::Bool(true));

        let child = arena.alloc(Some(root));
        arena.set(child, AttrKey::Bold, AttrValue::Bool(true));

        assert_eq!(arena.get(child, AttrKey::Bold), Some(&AttrValue::Bool(true)));
        assert_eq!(arena.get(child, AttrKey::Italic), Some(&AttrValue::Bool(true)));
        assert_eq!(arena.get(child, AttrKey::Underline), None);
        assert_eq!(arena.get(root, AttrKey::Bold), Some(&AttrValue::Bool(false)));
    }

    #[test]
    fn test_get_until_stops_before_root() {
        let mut arena = AttrArena::new();
        let root = arena.alloc(None);
        arena.set(root, AttrKey::Bold, AttrValue::Bool(false));
        let child = arena.alloc(Some(root));

        assert_eq!(arena.get_until(child, AttrKey::Bold, Some(root)), None);
        assert!(arena.get_until(child, AttrKey::Bold, None).is_some());
    }

    #[test]
    fn test_set_parent_does_not_copy() {
        let mut arena = AttrArena::new();
        let a = arena.alloc(None);
        arena.set(a, AttrKey::FontSize, AttrValue::Number(10.0));
        let b = arena.alloc(None);
        arena.set_parent(b, Some(a));

        assert!(arena.local(b, AttrKey::FontSize).is_none());
        assert_eq!(arena.get(b, AttrKey::FontSize), Some(&AttrValue::Number(10.0)));

        arena.set(a, AttrKey::FontSize, AttrValue::Number(14.0));
        assert_eq!(arena.get(b, AttrKey::FontSize), Some(&AttrValue::Number(14.0)));
    }

    #[test]
    fn test_flatten_prefers_nearest() {
        let mut arena = AttrArena::new();
        let root = arena.alloc(None);
        arena.set(root, AttrKey::Bold, AttrValue::Bool(false));
        let mid = arena.alloc(Some(root));
        arena.set(mid, AttrKey::Bold, AttrValue::Bool(true));
        arena.set(mid, AttrKey::Italic, AttrValue::Bool(true));
        let leaf = arena.alloc(Some(mid));
        arena.set(leaf, AttrKey::Italic, AttrValue::Bool(false));

        let flat = arena.flatten_until(leaf, Some(root));
        assert_eq!(flat.get(&AttrKey::Bold), Some(&AttrValue::Bool(true)));
        assert_eq!(flat.get(&AttrKey::Italic), Some(&AttrValue::Bool(false)));
        assert_eq!(flat.len(), 2);
    }

    #[test]
    fn test_deep_chain_resolves() {
        let mut arena = AttrArena::new();
        let root = arena.alloc(None);
        arena.set(root, AttrKey::FontSize, AttrValue::Number(9.0));
        let leaf = (0..100).fold(root, |parent, _| arena.alloc(Some(parent)));

        assert_eq!(arena.get(leaf, AttrKey::FontSize), Some(&AttrValue::Number(9.0)));
        assert_eq!(arena.chain(leaf).count(), 101);

        let mut chain = arena.chain(leaf);
        chain.by_ref().take(SHALLOW_CHAIN + 1).for_each(drop);
        let tracked = chain.visited.as_ref().map_or(0, FixedBitSet::len);
        assert!(tracked <= leaf.0 - SHALLOW_CHAIN + 1);
    }

    #[test]
    fn test_cycle_terminates() {
        let mut arena = AttrArena::new();
        let a = arena.alloc(None);
        let b = arena.alloc(Some(a));
        arena.set_parent(a, Some(b));

        assert_eq!(arena.get(a, AttrKey::Bold), None);
        assert!(arena.chain(a).count() <= SHALLOW_CHAIN + 2);
    }
}

//! Per-group parser state and the stack of saved states.
//!
//! Every `{` pushes a copy of the live [`ParserState`]; the matching `}` pops
//! it and replaces the live state wholesale, so nothing set inside a group
//! leaks out of it.

use super::attr::{AttrKey, AttrSetId, AttrValue};
use super::attributes::AttrTarget;
use super::destination::DestinationId;
use super::error::{DecodeError, DecodeResult};
use super::stylesheet::StyleId;
use super::types::{ColorRef, FontRef, TabAlignment, TabLeader, TabStops};

/// Scoped decoder state.
#[derive(Debug, Clone)]
pub struct ParserState {
    /// Destination receiving events
    pub destination: DestinationId,
    /// `\f`
    pub font: Option<FontRef>,
    /// `\cf`
    pub foreground: Option<ColorRef>,
    /// `\cb`
    pub background: Option<ColorRef>,
    /// `\uc`: fallback units to skip after each `\u`
    pub unicode_skip: usize,
    /// Working attribute sets of an attribute-tracking destination
    pub character: Option<AttrSetId>,
    pub paragraph: Option<AttrSetId>,
    pub section: Option<AttrSetId>,
    /// Styles selected with `\cs`, `\s` and `\ds`
    pub character_style: Option<StyleId>,
    pub paragraph_style: Option<StyleId>,
    pub section_style: Option<StyleId>,
    /// Properties of the next tab stop
    pub tab_alignment: Option<TabAlignment>,
    pub tab_leader: Option<TabLeader>,
    pub tabs: TabStops,
}

impl ParserState {
    pub fn new(destination: DestinationId, unicode_skip: usize) -> Self {
        Self {
            destination,
            font: None,
            foreground: None,
            background: None,
            unicode_skip,
            character: None,
            paragraph: None,
            section: None,
            character_style: None,
            paragraph_style: None,
            section_style: None,
            tab_alignment: None,
            tab_leader: None,
            tabs: TabStops::new(),
        }
    }
}

// Meta-domain descriptors write the pending tab stop properties.
impl AttrTarget for ParserState {
    fn get_attr(&self, key: AttrKey) -> Option<AttrValue> {
        match key {
            AttrKey::TabAlignment => self.tab_alignment.map(AttrValue::TabAlignment),
            AttrKey::TabLeader => self.tab_leader.map(AttrValue::TabLeader),
            _ => None,
        }
    }

    fn set_attr(&mut self, key: AttrKey, value: AttrValue) {
        match (key, value) {
            (AttrKey::TabAlignment, AttrValue::TabAlignment(alignment)) => {
                self.tab_alignment = Some(alignment)
            },
            (AttrKey::TabLeader, AttrValue::TabLeader(leader)) => self.tab_leader = Some(leader),
            (key, value) => {
                tracing::trace!(?key, ?value, "ignoring non-meta attribute on parser state")
            },
        }
    }
}

/// Saved states of the enclosing groups, innermost last.
#[derive(Debug)]
pub struct GroupStack {
    saved: Vec<ParserState>,
    limit: usize,
}

impl GroupStack {
    pub fn new(limit: usize) -> Self {
        Self {
            saved: Vec::new(),
            limit,
        }
    }

    /// Save `state` on group open.
    pub fn push(&mut self, state: ParserState) -> DecodeResult<()> {
        if self.saved.len() >= self.limit {
            return Err(DecodeError::NestingTooDeep { limit: self.limit });
        }
        self.saved.push(state);
        Ok(())
    }

    /// Restore the state saved by the matching group open.
    #[inline]
    pub fn pop(&mut self) -> Option<ParserState> {
        self.saved.pop()
    }

    /// The state that will be restored by the next `pop`.
    #[inline]
    pub fn top(&self) -> Option<&ParserState> {
        self.saved.last()
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.saved.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rtf::attributes::descriptor;

    #[test]
    fn test_push_pop_restores_copy() {
        let mut stack = GroupStack::new(4);
        let mut state = ParserState::new(DestinationId::DISCARD, 1);
        state.font = Some(2);

        stack.push(state.clone()).unwrap();
        state.font = Some(5);
        state.unicode_skip = 0;

        let restored = stack.pop().unwrap();
        assert_eq!(restored.font, Some(2));
        assert_eq!(restored.unicode_skip, 1);
        assert!(stack.pop().is_none());
    }

    #[test]
    fn test_depth_limit() {
        let mut stack = GroupStack::new(2);
        let state = ParserState::new(DestinationId::DISCARD, 1);
        stack.push(state.clone()).unwrap();
        stack.push(state.clone()).unwrap();
        assert_eq!(
            stack.push(state).unwrap_err(),
            DecodeError::NestingTooDeep { limit: 2 }
        );
        assert_eq!(stack.depth(), 2);
    }

    #[test]
    fn test_meta_descriptors_write_tab_properties() {
        let mut state = ParserState::new(DestinationId::DISCARD, 1);
        assert!(descriptor("tqc").unwrap().apply_flag(&mut state));
        assert!(descriptor("tldot").unwrap().apply_flag(&mut state));
        assert_eq!(state.tab_alignment, Some(TabAlignment::Center));
        assert_eq!(state.tab_leader, Some(TabLeader::Dots));
    }
}

//! The `\rtf` body destination.
//!
//! Turns text events into [`StyledSegment`]s carrying the attributes in
//! effect when the text arrived, and paragraph ends into
//! [`Segment::LineBreak`].

use super::destination::DecodeContext;
use super::tracking::AttributeTracking;
use super::types::{Segment, StyledSegment};

#[derive(Debug)]
pub struct DocumentDestination {
    tracking: AttributeTracking,
    /// Text was delivered since the last paragraph end
    in_paragraph: bool,
}

impl DocumentDestination {
    pub fn new(ctx: &mut DecodeContext) -> Self {
        Self {
            tracking: AttributeTracking::install(ctx),
            in_paragraph: false,
        }
    }

    pub fn begin_group(&mut self, ctx: &mut DecodeContext) {
        self.tracking.begin_group(ctx);
    }

    pub fn handle_text(&mut self, ctx: &mut DecodeContext, text: &str) {
        if text.is_empty() {
            return;
        }
        self.in_paragraph = true;

        let attributes = self.tracking.text_attributes(ctx);
        ctx.output
            .push(Segment::Text(StyledSegment::new(text, attributes)));
    }

    pub fn handle_keyword(&mut self, ctx: &mut DecodeContext, keyword: &str) -> bool {
        match keyword {
            "par" | "\r" | "\n" => self.end_paragraph(ctx),
            "sect" => self.end_section(ctx),
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
        self.tracking.handle_keyword_param(ctx, keyword, parameter)
    }

    /// Flush a trailing paragraph.
    pub fn close(mut self, ctx: &mut DecodeContext) {
        if self.in_paragraph {
            self.end_paragraph(ctx);
        }
    }

    fn end_paragraph(&mut self, ctx: &mut DecodeContext) {
        // Paragraph formatting is resolved but not part of the output.
        let paragraph = self.tracking.paragraph_attributes(ctx);
        tracing::trace!(?paragraph, "paragraph finished");

        ctx.output.push(Segment::LineBreak);
        self.in_paragraph = false;
    }

    fn end_section(&mut self, _ctx: &mut DecodeContext) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document() -> (DecodeContext, DocumentDestination) {
        let mut ctx = DecodeContext::new(1);
        let document = DocumentDestination::new(&mut ctx);
        (ctx, document)
    }

    #[test]
    fn test_text_and_paragraphs() {
        let (mut ctx, mut document) = document();
        document.handle_keyword(&mut ctx, "b");
        document.handle_text(&mut ctx, "bold");
        document.handle_keyword_param(&mut ctx, "b", 0);
        document.handle_text(&mut ctx, "plain");
        assert!(document.handle_keyword(&mut ctx, "par"));

        assert_eq!(ctx.output.len(), 3);
        assert!(ctx.output[0].as_text().unwrap().attributes.bold);
        assert!(!ctx.output[1].as_text().unwrap().attributes.bold);
        assert!(ctx.output[2].is_line_break());
    }

    #[test]
    fn test_empty_paragraph_still_breaks() {
        let (mut ctx, mut document) = document();
        document.handle_keyword(&mut ctx, "par");
        document.handle_keyword(&mut ctx, "\n");
        assert_eq!(ctx.output, vec![Segment::LineBreak, Segment::LineBreak]);
    }

    #[test]
    fn test_close_flushes_open_paragraph() {
        let (mut ctx, mut document) = document();
        document.handle_text(&mut ctx, "tail");
        document.close(&mut ctx);
        assert_eq!(ctx.output.len(), 2);
        assert!(ctx.output[1].is_line_break());
    }

    #[test]
    fn test_close_after_par_adds_nothing() {
        let (mut ctx, mut document) = document();
        document.handle_text(&mut ctx, "line");
        document.handle_keyword(&mut ctx, "par");
        document.close(&mut ctx);
        assert_eq!(ctx.output.len(), 2);
    }

    #[test]
    fn test_empty_text_ignored() {
        let (mut ctx, mut document) = document();
        document.handle_text(&mut ctx, "");
        document.close(&mut ctx);
        assert!(ctx.output.is_empty());
    }

    #[test]
    fn test_sect_is_accepted() {
        let (mut ctx, mut document) = document();
        assert!(document.handle_keyword(&mut ctx, "sect"));
        assert!(ctx.output.is_empty());
    }
}

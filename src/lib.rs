//! rtf-segments - decode Rich Text Format documents into styled text
//!
//! The decoder turns an RTF document into a flat sequence of
//! [`Segment`](rtf::Segment)s: runs of text carrying their resolved
//! character attributes (font, size, color, bold, italic, underline and
//! friends), separated by paragraph breaks.
//!
//! # Features
//!
//! - **Streaming tokenizer**: a single pass over the input with no token buffer
//! - **Scoped formatting**: group nesting saves and restores all state
//! - **Style sheets**: paragraph and character styles with `\sbasedon` inheritance
//! - **Character sets**: `ansi`, `mac`, `pc`, `pca` and Windows code pages for `\'hh` escapes
//! - **Unicode**: `\u` escapes with `\uc` fallback skipping and surrogate pairs
//!
//! # Example
//!
//! ```rust
//! use rtf_segments::rtf::{RtfReader, Segment};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut reader = RtfReader::new()?;
//! reader.read(r"{\rtf1\ansi{\colortbl;\red255\green0\blue0;}\cf1 Red\cf0  text\par}")?;
//! let document = reader.finish()?;
//!
//! for segment in document.segments() {
//!     match segment {
//!         Segment::Text(run) => println!("{:?}: {}", run.attributes.text_color, run.text()),
//!         Segment::LineBreak => println!("<br>"),
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod common;
pub mod rtf;

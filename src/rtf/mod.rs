//! RTF (Rich Text Format) decoder.
//!
//! Decodes an RTF document into a flat list of styled text segments
//! separated by paragraph breaks.
//!
//! # Architecture
//!
//! The decoder is organized into several components:
//! - **Lexer**: Tokenizes RTF input into groups, control words and text
//! - **Reader**: Keeps the group stack and routes events to destinations
//! - **Destinations**: Font table, color table, style sheet and document body
//! - **Attributes**: Inheriting attribute sets, keyword descriptors and styles
//!
//! # Example
//!
//! ```rust
//! use rtf_segments::rtf::decode;
//!
//! let rtf_text = r#"{\rtf1\ansi{\fonttbl\f0\fswiss Helvetica;}\f0\pard Hello {\b World}!\par}"#;
//! let segments = decode(rtf_text)?;
//! assert_eq!(segments.len(), 4);
//! # Ok::<(), rtf_segments::rtf::DecodeError>(())
//! ```

mod attr;
mod attributes;
mod charset;
mod config;
mod destination;
mod document;
mod error;
mod lexer;
mod reader;
mod state;
mod stylesheet;
mod tracking;
mod types;

// Re-exports
pub use charset::{ANSI, CharacterSet, character_set, define_character_set, read_charset};
pub use config::DecodeOptions;
pub use error::{CharsetError, CharsetResult, DecodeError, DecodeResult};
pub use lexer::{Lexer, RtfSink};
pub use reader::{DecodedDocument, RtfReader, decode, decode_with_options};
pub use types::{
    Alignment, Color, ColorRef, ColorTable, DocumentAttributes, Font, FontFamily, FontRef,
    FontTable, ParagraphAttributes, Segment, StyledSegment, TabAlignment, TabLeader, TabStop,
    TabStops, TextAttributes,
};

//! Error types for RTF decoding.
//!
//! Only structural corruption is surfaced to the caller. Unknown keywords,
//! style cycles and out-of-range parameters are absorbed by the reader.

use thiserror::Error;

/// Result type for RTF decoding.
pub type DecodeResult<T> = Result<T, DecodeError>;

/// Result type for character set lookups.
pub type CharsetResult<T> = Result<T, CharsetError>;

/// Fatal decoding errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// A group was closed that was never opened
    #[error("Unbalanced group: '}}' without matching '{{' at byte {offset}")]
    UnbalancedGroup { offset: usize },

    /// Groups nested deeper than the configured limit
    #[error("Group nesting exceeds the limit of {limit}")]
    NestingTooDeep { limit: usize },

    /// The mandatory "ansi" character set could not be loaded
    #[error("Unable to load the ansi character set: {0}")]
    MissingCharacterSet(#[source] CharsetError),

    /// Tokenizer error
    #[error("RTF lexer error at byte {offset}: {message}")]
    Lexer { offset: usize, message: String },
}

/// Character set resource errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CharsetError {
    /// No resource is registered under this name
    #[error("Unknown character set \"{0}\"")]
    Unknown(String),

    /// The resource exists but could not be parsed
    #[error("Malformed character set \"{name}\": {message}")]
    Malformed { name: String, message: String },

    /// A table supplied by the caller does not have 256 entries
    #[error("Translation table must have 256 entries, got {0}")]
    InvalidLength(usize),
}

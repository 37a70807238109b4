/// Configuration options for RTF decoding.
///
/// # Examples
///
/// ```rust
/// use rtf_segments::rtf::DecodeOptions;
///
/// // Create with defaults
/// let options = DecodeOptions::default();
///
/// // Or customize
/// let options = DecodeOptions::new()
///     .with_max_group_depth(64)
///     .with_default_character_set("mac");
/// ```
#[derive(Debug, Clone)]
pub struct DecodeOptions {
    /// Deepest group nesting accepted before decoding fails
    pub max_group_depth: usize,
    /// Character set in effect before any `\ansi`, `\mac`, `\pc` keyword
    pub default_character_set: String,
    /// Fallback characters skipped after `\u` until a `\uc` says otherwise
    pub default_unicode_skip: usize,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            max_group_depth: 1024,
            default_character_set: super::charset::ANSI.to_string(),
            default_unicode_skip: 1,
        }
    }
}

impl DecodeOptions {
    /// Create a new `DecodeOptions` with default values.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum group nesting depth.
    ///
    /// Input nesting deeper than this fails with
    /// [`DecodeError::NestingTooDeep`](super::DecodeError::NestingTooDeep).
    #[inline]
    pub fn with_max_group_depth(mut self, depth: usize) -> Self {
        self.max_group_depth = depth;
        self
    }

    /// Set the character set used for hex escapes until the document
    /// names one. Unknown names fall back to `ansi`.
    #[inline]
    pub fn with_default_character_set(mut self, name: impl Into<String>) -> Self {
        self.default_character_set = name.into();
        self
    }

    #[inline]
    pub fn with_default_unicode_skip(mut self, skip: usize) -> Self {
        self.default_unicode_skip = skip;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = DecodeOptions::default();
        assert_eq!(options.max_group_depth, 1024);
        assert_eq!(options.default_character_set, "ansi");
        assert_eq!(options.default_unicode_skip, 1);
    }

    #[test]
    fn test_builder() {
        let options = DecodeOptions::new()
            .with_max_group_depth(8)
            .with_default_character_set("cpg437")
            .with_default_unicode_skip(0);
        assert_eq!(options.max_group_depth, 8);
        assert_eq!(options.default_character_set, "cpg437");
        assert_eq!(options.default_unicode_skip, 0);
    }
}

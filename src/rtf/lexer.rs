//! RTF tokenizer.
//!
//! Splits RTF source into group delimiters, control words, control symbols,
//! text runs and binary blobs, and pushes them into an [`RtfSink`] as they
//! are found. Hex escapes (`\'hh`) are translated with the sink's current
//! character set and merged into the surrounding text run.

use super::charset::CharacterSet;
use super::error::{DecodeError, DecodeResult};
use memchr::memchr3;

/// Callback surface fed by the tokenizer.
///
/// Keyword handlers report whether the keyword was recognized; the
/// tokenizer itself ignores that answer.
pub trait RtfSink {
    /// A `{` was read.
    fn begin_group(&mut self) -> DecodeResult<()>;

    /// A `}` was read.
    fn end_group(&mut self) -> DecodeResult<()>;

    /// A control word without parameter, or a control symbol.
    fn handle_keyword(&mut self, keyword: &str) -> DecodeResult<bool>;

    /// A control word with an integer parameter.
    fn handle_keyword_param(&mut self, keyword: &str, parameter: i32) -> DecodeResult<bool>;

    /// A run of literal text. Runs may be split at arbitrary points.
    fn handle_text(&mut self, text: &str);

    /// The payload of a `\binN` control word.
    fn handle_binary_blob(&mut self, data: &[u8]);

    /// Table used to translate hex escapes.
    fn translation_table(&self) -> &CharacterSet;

    /// End of input.
    fn close(&mut self) -> DecodeResult<()>;
}

/// RTF tokenizer over a UTF-8 source string.
pub struct Lexer<'a> {
    /// Source input
    input: &'a str,
    /// Current position in bytes
    pos: usize,
    /// Text accumulated since the last non-text token
    pending: String,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer.
    #[inline]
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            pending: String::new(),
        }
    }

    /// Current position in bytes.
    #[inline]
    pub fn offset(&self) -> usize {
        self.pos
    }

    /// Tokenize the entire input into `sink`, then close it.
    pub fn run<S: RtfSink + ?Sized>(mut self, sink: &mut S) -> DecodeResult<()> {
        let bytes = self.input.as_bytes();

        while self.pos < bytes.len() {
            match bytes[self.pos] {
                b'{' => {
                    self.flush(sink);
                    self.pos += 1;
                    sink.begin_group()?;
                },
                b'}' => {
                    self.flush(sink);
                    let offset = self.pos;
                    self.pos += 1;
                    sink.end_group().map_err(|e| match e {
                        DecodeError::UnbalancedGroup { .. } => {
                            DecodeError::UnbalancedGroup { offset }
                        },
                        other => other,
                    })?;
                },
                b'\\' => self.control(sink)?,
                _ => self.text_run(),
            }
        }

        self.flush(sink);
        sink.close()
    }

    /// Accumulate literal text up to the next special character.
    fn text_run(&mut self) {
        let bytes = &self.input.as_bytes()[self.pos..];
        let end = memchr3(b'\\', b'{', b'}', bytes).unwrap_or(bytes.len());
        // Delimiters are ASCII, so `end` is always a char boundary.
        let run = &self.input[self.pos..self.pos + end];
        if run.contains(['\r', '\n']) {
            self.pending
                .extend(run.chars().filter(|&c| c != '\r' && c != '\n'));
        } else {
            self.pending.push_str(run);
        }
        self.pos += end;
    }

    /// Parse a control word or control symbol starting at a backslash.
    fn control<S: RtfSink + ?Sized>(&mut self, sink: &mut S) -> DecodeResult<()> {
        let bytes = self.input.as_bytes();
        self.pos += 1; // Skip '\'

        let Some(&first) = bytes.get(self.pos) else {
            // Dangling backslash at end of input
            return Ok(());
        };

        if first == b'\'' {
            self.pos += 1;
            self.hex_escape(sink);
            return Ok(());
        }

        if !first.is_ascii_alphabetic() {
            // Control symbol: the keyword is the single character
            let symbol_len = self.input[self.pos..]
                .chars()
                .next()
                .map_or(1, char::len_utf8);
            let symbol = &self.input[self.pos..self.pos + symbol_len];
            self.pos += symbol_len;
            self.flush(sink);
            sink.handle_keyword(symbol)?;
            return Ok(());
        }

        let start = self.pos;
        while self.pos < bytes.len() && bytes[self.pos].is_ascii_alphabetic() {
            self.pos += 1;
        }
        let word = &self.input[start..self.pos];
        let param = self.numeric_parameter();

        // A single space delimits the control word and belongs to it
        if bytes.get(self.pos) == Some(&b' ') {
            self.pos += 1;
        }

        self.flush(sink);
        match param {
            Some(length) if word == "bin" => self.binary(sink, length),
            Some(value) => sink.handle_keyword_param(word, value).map(drop),
            None => sink.handle_keyword(word).map(drop),
        }
    }

    /// Parse an optional signed decimal parameter, saturating at `i32` bounds.
    fn numeric_parameter(&mut self) -> Option<i32> {
        let bytes = self.input.as_bytes();
        let negative = bytes.get(self.pos) == Some(&b'-');
        let digits_start = if negative { self.pos + 1 } else { self.pos };

        let mut end = digits_start;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
        if end == digits_start {
            return None;
        }

        let magnitude = bytes[digits_start..end]
            .iter()
            .fold(0i64, |acc, &b| (acc * 10 + i64::from(b - b'0')).min(i64::from(u32::MAX)));
        let value = if negative { -magnitude } else { magnitude };
        self.pos = end;
        Some(value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32)
    }

    /// Translate `\'hh` into the pending text run.
    fn hex_escape<S: RtfSink + ?Sized>(&mut self, sink: &S) {
        let bytes = self.input.as_bytes();
        let hex_value = |b: u8| (b as char).to_digit(16);

        let high = bytes.get(self.pos).copied().and_then(hex_value);
        let low = bytes.get(self.pos + 1).copied().and_then(hex_value);
        match (high, low) {
            (Some(high), Some(low)) => {
                self.pos += 2;
                let byte = (high * 16 + low) as u8;
                self.pending.push(sink.translation_table().translate(byte));
            },
            _ => {
                tracing::trace!(offset = self.pos, "ignoring malformed hex escape");
            },
        }
    }

    /// Hand the next `length` raw bytes to the sink.
    fn binary<S: RtfSink + ?Sized>(&mut self, sink: &mut S, length: i32) -> DecodeResult<()> {
        let length = length.max(0) as usize;
        let end = self.pos + length;
        if end > self.input.len() {
            return Err(DecodeError::Lexer {
                offset: self.pos,
                message: format!("\\bin{} runs past the end of input", length),
            });
        }

        sink.handle_binary_blob(&self.input.as_bytes()[self.pos..end]);
        self.pos = end;
        while !self.input.is_char_boundary(self.pos) {
            self.pos += 1;
        }
        Ok(())
    }

    /// Deliver accumulated text, if any.
    fn flush<S: RtfSink + ?Sized>(&mut self, sink: &mut S) {
        if !self.pending.is_empty() {
            sink.handle_text(&self.pending);
            self.pending.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rtf::charset::{ANSI, character_set};
    use std::sync::Arc;

    #[derive(Debug, PartialEq)]
    enum Event {
        Begin,
        End,
        Word(String),
        Param(String, i32),
        Text(String),
        Blob(Vec<u8>),
        Close,
    }

    struct Recorder {
        events: Vec<Event>,
        table: Arc<CharacterSet>,
    }

    impl Recorder {
        fn new() -> Self {
            Self {
                events: Vec::new(),
                table: character_set(ANSI).unwrap(),
            }
        }
    }

    impl RtfSink for Recorder {
        fn begin_group(&mut self) -> DecodeResult<()> {
            self.events.push(Event::Begin);
            Ok(())
        }

        fn end_group(&mut self) -> DecodeResult<()> {
            self.events.push(Event::End);
            Ok(())
        }

        fn handle_keyword(&mut self, keyword: &str) -> DecodeResult<bool> {
            self.events.push(Event::Word(keyword.to_string()));
            Ok(true)
        }

        fn handle_keyword_param(&mut self, keyword: &str, parameter: i32) -> DecodeResult<bool> {
            self.events.push(Event::Param(keyword.to_string(), parameter));
            Ok(true)
        }

        fn handle_text(&mut self, text: &str) {
            self.events.push(Event::Text(text.to_string()));
        }

        fn handle_binary_blob(&mut self, data: &[u8]) {
            self.events.push(Event::Blob(data.to_vec()));
        }

        fn translation_table(&self) -> &CharacterSet {
            &self.table
        }

        fn close(&mut self) -> DecodeResult<()> {
            self.events.push(Event::Close);
            Ok(())
        }
    }

    fn tokenize(input: &str) -> Vec<Event> {
        let mut recorder = Recorder::new();
        Lexer::new(input).run(&mut recorder).unwrap();
        recorder.events
    }

    #[test]
    fn test_simple_tokenization() {
        let events = tokenize(r"{\rtf1\ansi Hello}");
        assert_eq!(
            events,
            vec![
                Event::Begin,
                Event::Param("rtf".into(), 1),
                Event::Word("ansi".into()),
                Event::Text("Hello".into()),
                Event::End,
                Event::Close,
            ]
        );
    }

    #[test]
    fn test_parameters_and_delimiters() {
        let events = tokenize(r"\fs-24\b0  x\i;");
        assert_eq!(
            events,
            vec![
                Event::Param("fs".into(), -24),
                Event::Param("b".into(), 0),
                Event::Text(" x".into()),
                Event::Word("i".into()),
                Event::Text(";".into()),
                Event::Close,
            ]
        );
    }

    #[test]
    fn test_control_symbols() {
        let events = tokenize("\\{\\*\\~\\\n");
        assert_eq!(
            events,
            vec![
                Event::Word("{".into()),
                Event::Word("*".into()),
                Event::Word("~".into()),
                Event::Word("\n".into()),
                Event::Close,
            ]
        );
    }

    #[test]
    fn test_hex_escapes_join_text() {
        let events = tokenize(r"caf\'e9 \'93q\'94");
        assert_eq!(
            events,
            vec![Event::Text("café \u{201C}q\u{201D}".into()), Event::Close]
        );
    }

    #[test]
    fn test_raw_line_breaks_ignored() {
        let events = tokenize("one\r\ntwo");
        assert_eq!(events, vec![Event::Text("onetwo".into()), Event::Close]);
    }

    #[test]
    fn test_binary_blob() {
        let events = tokenize("\\bin3 \u{1}{}rest");
        assert_eq!(
            events,
            vec![
                Event::Blob(vec![1, b'{', b'}']),
                Event::Text("rest".into()),
                Event::Close,
            ]
        );
    }

    #[test]
    fn test_truncated_binary_is_an_error() {
        let mut recorder = Recorder::new();
        let err = Lexer::new(r"\bin10 abc").run(&mut recorder).unwrap_err();
        assert!(matches!(err, DecodeError::Lexer { .. }));
    }

    #[test]
    fn test_parameter_saturates() {
        let events = tokenize(r"\li99999999999");
        assert_eq!(
            events,
            vec![Event::Param("li".into(), i32::MAX), Event::Close]
        );
    }
}

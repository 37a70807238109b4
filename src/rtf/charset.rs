//! Byte → character translation tables for RTF hex escapes.
//!
//! Tables are looked up by name (`ansi`, `mac`, `cpg437`, `cpg850`, or
//! `cpN` for a single-byte Windows code page) and cached process-wide the
//! first time they are loaded. A cached table is never replaced.

use super::error::{CharsetError, CharsetResult};
use crate::common::encoding::{codepage_to_encoding, single_byte_table};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use phf::phf_map;
use std::collections::HashMap;
use std::io::BufRead;
use std::sync::Arc;

/// Name of the character set every RTF reader falls back to.
pub const ANSI: &str = "ansi";

/// Embedded character set resources, one decimal code point per byte value.
static RESOURCES: phf::Map<&'static str, &'static str> = phf_map! {
    "ansi" => include_str!("charsets/ansi.txt"),
    "mac" => include_str!("charsets/mac.txt"),
    "cpg437" => include_str!("charsets/cpg437.txt"),
    "cpg850" => include_str!("charsets/cpg850.txt"),
};

static CACHE: Lazy<RwLock<HashMap<String, Arc<CharacterSet>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// A 256-entry table mapping byte values to characters.
#[derive(Clone, PartialEq, Eq)]
pub struct CharacterSet {
    name: String,
    table: [char; 256],
}

impl CharacterSet {
    /// Build a character set from a table of at least 256 entries.
    ///
    /// Entries past the 256th are ignored.
    pub fn new(name: impl Into<String>, table: &[char]) -> CharsetResult<Self> {
        if table.len() < 256 {
            return Err(CharsetError::InvalidLength(table.len()));
        }
        let mut values = ['\0'; 256];
        values.copy_from_slice(&table[..256]);
        Ok(Self {
            name: name.into(),
            table: values,
        })
    }

    /// Name this table was registered under.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Translate one byte.
    #[inline]
    pub fn translate(&self, byte: u8) -> char {
        self.table[byte as usize]
    }
}

impl std::fmt::Debug for CharacterSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CharacterSet")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Look up a named character set, loading and caching it if necessary.
///
/// # Examples
/// ```
/// use rtf_segments::rtf::character_set;
///
/// let mac = character_set("mac").unwrap();
/// assert_eq!(mac.translate(0x80), 'Ä');
/// assert!(character_set("no-such-set").is_err());
/// ```
pub fn character_set(name: &str) -> CharsetResult<Arc<CharacterSet>> {
    if let Some(set) = CACHE.read().get(name) {
        return Ok(Arc::clone(set));
    }

    let loaded = Arc::new(load(name)?);
    let mut cache = CACHE.write();
    // Another thread may have won the race; keep whichever landed first.
    Ok(Arc::clone(cache.entry(name.to_owned()).or_insert(loaded)))
}

/// Register a custom character set under `name`.
///
/// If a table is already cached under that name it is kept and returned.
pub fn define_character_set(name: &str, table: &[char]) -> CharsetResult<Arc<CharacterSet>> {
    let set = Arc::new(CharacterSet::new(name, table)?);
    let mut cache = CACHE.write();
    Ok(Arc::clone(cache.entry(name.to_owned()).or_insert(set)))
}

/// Name under which the table for a Windows code page is cached.
pub fn codepage_name(codepage: i32) -> String {
    format!("cp{}", codepage)
}

fn load(name: &str) -> CharsetResult<CharacterSet> {
    if let Some(source) = RESOURCES.get(name) {
        // &[u8] is itself a BufRead; it is fully consumed and dropped here.
        return read_charset(name, source.as_bytes());
    }

    if let Some(codepage) = name.strip_prefix("cp").and_then(|n| n.parse::<u32>().ok())
        && let Some(table) = codepage_to_encoding(codepage).and_then(single_byte_table)
    {
        return CharacterSet::new(name, &table);
    }

    Err(CharsetError::Unknown(name.to_owned()))
}

/// Parse a character set resource.
///
/// The resource holds 256 decimal integers separated by whitespace.
/// `#` and `//` comments run to the end of the line; `/* */` comments may
/// span lines. Anything after the 256th value is ignored.
pub fn read_charset<R: BufRead>(name: &str, mut reader: R) -> CharsetResult<CharacterSet> {
    let malformed = |message: String| CharsetError::Malformed {
        name: name.to_owned(),
        message,
    };

    let mut source = String::new();
    reader
        .read_to_string(&mut source)
        .map_err(|e| malformed(format!("unable to read resource ({})", e)))?;

    let mut values = ['\0'; 256];
    let mut count = 0;
    let mut rest = source.as_str();

    while count < 256 {
        rest = rest.trim_start();
        if rest.is_empty() {
            return Err(malformed(format!("expected 256 entries, found {}", count)));
        }

        if rest.starts_with('#') || rest.starts_with("//") {
            rest = rest.find('\n').map_or("", |end| &rest[end..]);
            continue;
        }
        if let Some(body) = rest.strip_prefix("/*") {
            let end = body
                .find("*/")
                .ok_or_else(|| malformed("unterminated comment".to_string()))?;
            rest = &body[end + 2..];
            continue;
        }

        let end = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        if end == 0 {
            let token: String = rest.chars().take_while(|c| !c.is_whitespace()).collect();
            return Err(malformed(format!("unexpected token \"{}\"", token)));
        }

        let value = rest[..end]
            .parse::<u32>()
            .ok()
            .and_then(char::from_u32)
            .ok_or_else(|| malformed(format!("invalid code point \"{}\"", &rest[..end])))?;
        values[count] = value;
        count += 1;
        rest = &rest[end..];
    }

    Ok(CharacterSet {
        name: name.to_owned(),
        table: values,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ansi_table() {
        let ansi = character_set(ANSI).unwrap();
        assert_eq!(ansi.name(), "ansi");
        assert_eq!(ansi.translate(b'A'), 'A');
        assert_eq!(ansi.translate(0x80), '€');
        assert_eq!(ansi.translate(0x93), '\u{201C}');
        assert_eq!(ansi.translate(0xE9), 'é');
    }

    #[test]
    fn test_dos_tables() {
        assert_eq!(character_set("cpg437").unwrap().translate(0x80), 'Ç');
        assert_eq!(character_set("cpg850").unwrap().translate(0x9B), 'ø');
    }

    #[test]
    fn test_cache_returns_same_table() {
        let first = character_set("mac").unwrap();
        let second = character_set("mac").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_unknown_name() {
        assert_eq!(
            character_set("NeXT").unwrap_err(),
            CharsetError::Unknown("NeXT".to_string())
        );
    }

    #[test]
    fn test_codepage_table() {
        let cyrillic = character_set(&codepage_name(1251)).unwrap();
        assert_eq!(cyrillic.translate(0xC0), 'А');
        assert!(matches!(
            character_set(&codepage_name(932)),
            Err(CharsetError::Unknown(_))
        ));
    }

    #[test]
    fn test_read_charset_with_comments() {
        let mut source = String::from("# header\n/* block\n comment */\n");
        for i in 0..256 {
            source.push_str(&format!("{} // entry\n", i));
        }
        let set = read_charset("identity", source.as_bytes()).unwrap();
        assert_eq!(set.translate(0x41), 'A');
        assert_eq!(set.translate(0xFF), 'ÿ');
    }

    #[test]
    fn test_read_charset_rejects_short_table() {
        let err = read_charset("short", "1 2 3".as_bytes()).unwrap_err();
        assert!(matches!(err, CharsetError::Malformed { .. }));
    }

    #[test]
    fn test_read_charset_rejects_garbage() {
        let err = read_charset("bad", "1 2 x".as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            CharsetError::Malformed { ref message, .. } if message.contains("x")
        ));
    }

    #[test]
    fn test_define_character_set() {
        let table: Vec<char> = (0..256u32).map(|i| char::from_u32(0x400 + i).unwrap()).collect();
        let defined = define_character_set("test-custom", &table).unwrap();
        assert_eq!(defined.translate(1), '\u{401}');
        assert!(matches!(
            define_character_set("too-short", &table[..10]),
            Err(CharsetError::InvalidLength(10))
        ));
    }
}

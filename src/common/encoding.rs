//! Code page utilities shared by the RTF character set machinery.
//!
//! RTF documents announce their code page with `\ansicpgN`. Single-byte code
//! pages are expanded into 256-entry translation tables; multi-byte code
//! pages cannot be expressed that way and are reported as unsupported.

use encoding_rs::Encoding;

/// Map a Windows code page identifier to an `encoding_rs` encoding.
///
/// # Examples
/// ```
/// use rtf_segments::common::encoding::codepage_to_encoding;
///
/// let encoding = codepage_to_encoding(1251).unwrap();
/// assert_eq!(encoding.name(), "windows-1251");
/// ```
#[inline]
pub fn codepage_to_encoding(codepage: u32) -> Option<&'static Encoding> {
    match codepage {
        // DOS codepages
        866 => Some(encoding_rs::IBM866),

        // Windows codepages (Western scripts)
        874 => Some(encoding_rs::WINDOWS_874),   // Thai
        1250 => Some(encoding_rs::WINDOWS_1250), // Central European
        1251 => Some(encoding_rs::WINDOWS_1251), // Cyrillic
        1252 => Some(encoding_rs::WINDOWS_1252), // Western European
        1253 => Some(encoding_rs::WINDOWS_1253), // Greek
        1254 => Some(encoding_rs::WINDOWS_1254), // Turkish
        1255 => Some(encoding_rs::WINDOWS_1255), // Hebrew
        1256 => Some(encoding_rs::WINDOWS_1256), // Arabic
        1257 => Some(encoding_rs::WINDOWS_1257), // Baltic
        1258 => Some(encoding_rs::WINDOWS_1258), // Vietnamese

        // East Asian codepages
        932 => Some(encoding_rs::SHIFT_JIS),
        936 => Some(encoding_rs::GBK),
        949 => Some(encoding_rs::EUC_KR),
        950 => Some(encoding_rs::BIG5),
        54936 => Some(encoding_rs::GB18030),

        // ISO 8859 series
        28591 => Some(encoding_rs::WINDOWS_1252), // ISO-8859-1 approximation
        28592 => Some(encoding_rs::ISO_8859_2),
        28593 => Some(encoding_rs::ISO_8859_3),
        28594 => Some(encoding_rs::ISO_8859_4),
        28595 => Some(encoding_rs::ISO_8859_5),
        28596 => Some(encoding_rs::ISO_8859_6),
        28597 => Some(encoding_rs::ISO_8859_7),
        28598 => Some(encoding_rs::ISO_8859_8),
        28603 => Some(encoding_rs::ISO_8859_13),
        28605 => Some(encoding_rs::ISO_8859_15),

        // KOI8 series
        20866 => Some(encoding_rs::KOI8_R),
        21866 => Some(encoding_rs::KOI8_U),

        // Macintosh
        10000 => Some(encoding_rs::MACINTOSH),
        10007 => Some(encoding_rs::X_MAC_CYRILLIC),

        65001 => Some(encoding_rs::UTF_8),

        _ => None,
    }
}

/// Expand a single-byte encoding into a byte → character table.
///
/// Returns `None` for multi-byte encodings. Bytes the encoding leaves
/// undefined map to U+FFFD.
pub fn single_byte_table(encoding: &'static Encoding) -> Option<[char; 256]> {
    if !encoding.is_single_byte() {
        return None;
    }

    let mut table = ['\u{FFFD}'; 256];
    for (byte, slot) in table.iter_mut().enumerate() {
        let bytes = [byte as u8];
        let (decoded, _) = encoding.decode_without_bom_handling(&bytes);
        if let Some(ch) = decoded.chars().next() {
            *slot = ch;
        }
    }
    Some(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codepage_lookup() {
        assert_eq!(codepage_to_encoding(1252), Some(encoding_rs::WINDOWS_1252));
        assert_eq!(codepage_to_encoding(936), Some(encoding_rs::GBK));
        assert_eq!(codepage_to_encoding(99999), None);
    }

    #[test]
    fn test_single_byte_table() {
        let table = single_byte_table(encoding_rs::WINDOWS_1251).unwrap();
        assert_eq!(table[b'A' as usize], 'A');
        assert_eq!(table[0xC0], 'А'); // Cyrillic capital A
    }

    #[test]
    fn test_multi_byte_has_no_table() {
        assert!(single_byte_table(encoding_rs::SHIFT_JIS).is_none());
        assert!(single_byte_table(encoding_rs::UTF_8).is_none());
    }
}

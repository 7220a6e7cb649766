//! Entry name decoding.
//!
//! Names are stored as raw bytes. Their encoding is resolved in this order:
//!
//! 1. General purpose bit 11 set: UTF-8.
//! 2. An Info-ZIP Unicode path extra field whose CRC matches the raw name.
//! 3. Raw bytes that happen to be valid UTF-8.
//! 4. IBM code page 437, the historical default.

use super::extra::UnicodePathExtraField;
use super::flags;
use crate::checksum::Crc32;

/// Code page 437 for bytes 0x80..=0xFF.
const CP437_HIGH: [char; 128] = [
    'Ç', 'ü', 'é', 'â', 'ä', 'à', 'å', 'ç', 'ê', 'ë', 'è', 'ï', 'î', 'ì', 'Ä', 'Å', //
    'É', 'æ', 'Æ', 'ô', 'ö', 'ò', 'û', 'ù', 'ÿ', 'Ö', 'Ü', '¢', '£', '¥', '₧', 'ƒ', //
    'á', 'í', 'ó', 'ú', 'ñ', 'Ñ', 'ª', 'º', '¿', '⌐', '¬', '½', '¼', '¡', '«', '»', //
    '░', '▒', '▓', '│', '┤', '╡', '╢', '╖', '╕', '╣', '║', '╗', '╝', '╜', '╛', '┐', //
    '└', '┴', '┬', '├', '─', '┼', '╞', '╟', '╚', '╔', '╩', '╦', '╠', '═', '╬', '╧', //
    '╨', '╤', '╥', '╙', '╘', '╒', '╓', '╫', '╪', '┘', '┌', '█', '▄', '▌', '▐', '▀', //
    'α', 'ß', 'Γ', 'π', 'Σ', 'σ', 'µ', 'τ', 'Φ', 'Θ', 'Ω', 'δ', '∞', 'φ', 'ε', '∩', //
    '≡', '±', '≥', '≤', '⌠', '⌡', '÷', '≈', '°', '∙', '·', '√', 'ⁿ', '²', '■', '\u{a0}',
];

/// Decodes bytes as code page 437.
pub fn decode_cp437(raw: &[u8]) -> String {
    raw.iter()
        .map(|&b| {
            if b < 0x80 {
                b as char
            } else {
                CP437_HIGH[(b - 0x80) as usize]
            }
        })
        .collect()
}

/// Decodes a stored name or comment.
pub fn decode_name(
    raw: &[u8],
    general_flags: u16,
    unicode_path: Option<&UnicodePathExtraField>,
) -> String {
    if general_flags & flags::UTF8 != 0 {
        return String::from_utf8_lossy(raw).into_owned();
    }

    if let Some(unicode) = unicode_path {
        if unicode.name_crc32 == Crc32::compute(raw) {
            return unicode.name.clone();
        }
        log::warn!(
            "ignoring unicode path extra field for '{}': CRC does not match the stored name",
            unicode.name
        );
    }

    match std::str::from_utf8(raw) {
        Ok(name) => name.to_string(),
        Err(_) => {
            let name = decode_cp437(raw);
            log::warn!("decoded entry name '{}' as code page 437", name);
            name
        }
    }
}

/// Returns true if `name` can be stored without the UTF-8 flag.
pub fn needs_utf8_flag(name: &str) -> bool {
    !name.is_ascii()
}

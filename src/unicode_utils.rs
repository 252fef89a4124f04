//! Unicode utilities for PDF text rendering
//!
//! Standard PDF fonts are written with WinAnsiEncoding, so strings are
//! transcoded from Unicode before they are shown.

/// Convert Unicode string to WinAnsiEncoding bytes for PDF text rendering
///
/// Latin-1 maps onto itself; the 0x80-0x9F block holds the typographic
/// extras of code page 1252. Characters outside the encoding become '?'.
pub fn unicode_to_winansi(text: &str) -> Vec<u8> {
    text.chars().map(winansi_byte).collect()
}

fn winansi_byte(ch: char) -> u8 {
    match ch as u32 {
        code @ (0x00..=0x7F | 0xA0..=0xFF) => code as u8,
        _ => match ch {
            '€' => 0x80,
            '‚' => 0x82,
            'ƒ' => 0x83,
            '„' => 0x84,
            '…' => 0x85,
            '†' => 0x86,
            '‡' => 0x87,
            'ˆ' => 0x88,
            '‰' => 0x89,
            'Š' => 0x8A,
            '‹' => 0x8B,
            'Œ' => 0x8C,
            'Ž' => 0x8E,
            '\u{2018}' => 0x91,
            '\u{2019}' => 0x92,
            '\u{201C}' => 0x93,
            '\u{201D}' => 0x94,
            '•' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            '˜' => 0x98,
            '™' => 0x99,
            'š' => 0x9A,
            '›' => 0x9B,
            'œ' => 0x9C,
            'ž' => 0x9E,
            'Ÿ' => 0x9F,
            _ => b'?',
        },
    }
}

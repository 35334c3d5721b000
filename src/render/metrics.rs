//! Text measurement for the built-in Helvetica stamp font.

/// Glyph widths for Helvetica, WinAnsi codes 32..=126, in 1/1000 em.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // '0'..'?'
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // '@'..'O'
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // 'P'..'_'
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // '`'..'o'
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // 'p'..'~'
];

/// WinAnsi codes 0x80..=0x9F, their Unicode characters and Helvetica widths.
/// Codes 0x81, 0x8D, 0x8F, 0x90 and 0x9D are unassigned.
const WIN_ANSI_HIGH: [(u8, char, u16); 27] = [
    (0x80, '\u{20AC}', 556),  // €
    (0x82, '\u{201A}', 222),  // ‚
    (0x83, '\u{0192}', 556),  // ƒ
    (0x84, '\u{201E}', 333),  // „
    (0x85, '\u{2026}', 1000), // …
    (0x86, '\u{2020}', 556),  // †
    (0x87, '\u{2021}', 556),  // ‡
    (0x88, '\u{02C6}', 333),  // ˆ
    (0x89, '\u{2030}', 1000), // ‰
    (0x8A, '\u{0160}', 667),  // Š
    (0x8B, '\u{2039}', 333),  // ‹
    (0x8C, '\u{0152}', 1000), // Œ
    (0x8E, '\u{017D}', 611),  // Ž
    (0x91, '\u{2018}', 222),  // ‘
    (0x92, '\u{2019}', 222),  // ’
    (0x93, '\u{201C}', 333),  // “
    (0x94, '\u{201D}', 333),  // ”
    (0x95, '\u{2022}', 350),  // •
    (0x96, '\u{2013}', 556),  // –
    (0x97, '\u{2014}', 1000), // —
    (0x98, '\u{02DC}', 333),  // ˜
    (0x99, '\u{2122}', 1000), // ™
    (0x9A, '\u{0161}', 500),  // š
    (0x9B, '\u{203A}', 333),  // ›
    (0x9C, '\u{0153}', 944),  // œ
    (0x9E, '\u{017E}', 500),  // ž
    (0x9F, '\u{0178}', 667),  // Ÿ
];

/// Width used for characters outside printable ASCII.
const FALLBACK_WIDTH: u16 = 556;

/// Helvetica cap height (1/1000 em).
const CAP_HEIGHT: f64 = 718.0;

/// Helvetica descender depth (1/1000 em, positive).
const DESCENT: f64 = 207.0;

/// Base font name written into the overlay's font resource.
pub const STAMP_FONT: &str = "Helvetica";

/// Measured extent of a single line of stamp text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextMetrics {
    /// Advance width of the whole string
    pub width: f64,
    /// Descender depth below the baseline
    pub descent: f64,
    /// Height of the box from the lowest descender to the cap line
    pub height: f64,
}

fn win_ansi_high(c: char) -> Option<&'static (u8, char, u16)> {
    WIN_ANSI_HIGH.iter().find(|(_, ch, _)| *ch == c)
}

fn glyph_width(c: char) -> u16 {
    match c as u32 {
        code @ 32..=126 => HELVETICA_WIDTHS[(code - 32) as usize],
        _ => win_ansi_high(c).map_or(FALLBACK_WIDTH, |(_, _, width)| *width),
    }
}

/// Advance width of `text` at `font_size` points.
pub fn text_width(text: &str, font_size: f64) -> f64 {
    let units: u32 = text.chars().map(|c| u32::from(glyph_width(c))).sum();
    f64::from(units) * font_size / 1000.0
}

/// Measure `text` set in Helvetica at `font_size`.
pub fn measure(text: &str, font_size: f64) -> TextMetrics {
    TextMetrics {
        width: text_width(text, font_size),
        descent: DESCENT * font_size / 1000.0,
        height: (CAP_HEIGHT + DESCENT) * font_size / 1000.0,
    }
}

/// Encode text for a WinAnsi simple font; unmappable characters become `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c as u32 {
            code @ (0x20..=0x7E | 0xA0..=0xFF) => code as u8,
            _ => win_ansi_high(c).map_or(b'?', |(code, _, _)| *code),
        })
        .collect()
}

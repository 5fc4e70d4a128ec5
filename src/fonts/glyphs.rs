//! Glyph coverage classification for Vietnamese text.
//!
//! Standard PDF fonts only cover ASCII reliably. Vietnamese uses 134
//! precomposed letters (every vowel/tone combination in both cases plus
//! `đ`/`Đ`) that need an extended-coverage font. This module detects them
//! and produces the ASCII transliteration used by the last-resort fallback.

use lazy_static::lazy_static;
use std::collections::HashMap;

/// Precomposed Vietnamese letters grouped by their base Latin letter.
const VIETNAMESE_LETTERS: &[(char, &str)] = &[
    ('a', "àáảãạăằắẳẵặâầấẩẫậ"),
    ('e', "èéẻẽẹêềếểễệ"),
    ('i', "ìíỉĩị"),
    ('o', "òóỏõọôồốổỗộơờớởỡợ"),
    ('u', "ùúủũụưừứửữự"),
    ('y', "ỳýỷỹỵ"),
    ('d', "đ"),
    ('A', "ÀÁẢÃẠĂẰẮẲẴẶÂẦẤẨẪẬ"),
    ('E', "ÈÉẺẼẸÊỀẾỂỄỆ"),
    ('I', "ÌÍỈĨỊ"),
    ('O', "ÒÓỎÕỌÔỒỐỔỖỘƠỜỚỞỠỢ"),
    ('U', "ÙÚỦŨỤƯỪỨỬỮỰ"),
    ('Y', "ỲÝỶỸỴ"),
    ('D', "Đ"),
];

lazy_static! {
    /// Extended letter -> base ASCII letter.
    static ref BASE_LETTER: HashMap<char, char> = VIETNAMESE_LETTERS
        .iter()
        .flat_map(|(base, letters)| letters.chars().map(move |ch| (ch, *base)))
        .collect();
}

/// Whether `ch` is one of the precomposed extended-alphabet letters.
#[inline]
pub fn is_extended_char(ch: char) -> bool {
    !ch.is_ascii() && BASE_LETTER.contains_key(&ch)
}

/// Whether the text needs a font with extended (Vietnamese) glyph coverage.
///
/// Returns `false` for ASCII-only text and `true` as soon as one extended
/// letter appears anywhere in the string.
pub fn requires_extended_glyphs(text: &str) -> bool {
    text.chars().any(is_extended_char)
}

/// Number of distinct extended letters recognised by the classifier.
pub fn extended_alphabet_size() -> usize {
    BASE_LETTER.len()
}

/// Whether `ch` is printable ASCII (space through tilde).
#[inline]
pub fn is_printable_ascii(ch: char) -> bool {
    (' '..='~').contains(&ch)
}

/// Convert text to its closest printable-ASCII form.
///
/// Extended letters map to their base letter, combining diacritics
/// (U+0300..U+036F) are stripped, and every other character outside
/// printable ASCII is dropped. Never fails.
pub fn to_ascii_transliteration(text: &str) -> String {
    text.chars()
        .filter_map(|ch| {
            if is_printable_ascii(ch) {
                Some(ch)
            } else {
                BASE_LETTER.get(&ch).copied()
            }
        })
        .collect()
}

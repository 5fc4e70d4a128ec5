//! Used-glyph tracking for embedded fonts.
//!
//! The full font program is embedded; what is tracked here is the set of
//! characters actually drawn, which drives the CIDFont `W` array and the
//! ToUnicode CMap.

use crate::object::Object;
use std::collections::{BTreeSet, HashMap};
use std::fmt::Write;

/// Tracks which Unicode characters and glyphs a document uses.
#[derive(Debug, Default, Clone)]
pub struct FontSubsetter {
    /// Used Unicode codepoints mapped to their glyph IDs
    used_chars: HashMap<u32, u16>,
    /// Used glyph IDs in ascending order
    used_glyphs: BTreeSet<u16>,
}

impl FontSubsetter {
    /// Create an empty subsetter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a character as used.
    pub fn use_char(&mut self, codepoint: u32, glyph_id: u16) {
        self.used_chars.insert(codepoint, glyph_id);
        self.used_glyphs.insert(glyph_id);
    }

    /// Record every character of `text` that `glyph_lookup` can map.
    pub fn use_string(&mut self, text: &str, glyph_lookup: impl Fn(u32) -> Option<u16>) {
        for ch in text.chars() {
            let codepoint = ch as u32;
            if let Some(glyph_id) = glyph_lookup(codepoint) {
                self.use_char(codepoint, glyph_id);
            }
        }
    }

    /// Used glyph IDs.
    pub fn used_glyphs(&self) -> &BTreeSet<u16> {
        &self.used_glyphs
    }

    /// Used character to glyph mapping.
    pub fn used_chars(&self) -> &HashMap<u32, u16> {
        &self.used_chars
    }

    /// Number of used glyphs.
    pub fn glyph_count(&self) -> usize {
        self.used_glyphs.len()
    }

    /// Number of used characters.
    pub fn char_count(&self) -> usize {
        self.used_chars.len()
    }

    /// Check if nothing has been drawn yet.
    pub fn is_empty(&self) -> bool {
        self.used_chars.is_empty()
    }

    /// CIDFont `W` array for the used glyphs.
    ///
    /// Consecutive glyph IDs share one run: `[start [w1 w2 ...] ...]`.
    /// With Identity-H the CID equals the glyph ID.
    pub fn widths_array(&self, glyph_width: impl Fn(u16) -> u16) -> Object {
        let glyphs: Vec<u16> = self.used_glyphs.iter().copied().collect();
        let mut runs = Vec::new();

        let mut i = 0;
        while i < glyphs.len() {
            let start = glyphs[i];
            let mut widths = vec![Object::Integer(i64::from(glyph_width(start)))];
            while i + 1 < glyphs.len() && glyphs[i + 1] == glyphs[i] + 1 {
                i += 1;
                widths.push(Object::Integer(i64::from(glyph_width(glyphs[i]))));
            }
            runs.push(Object::Integer(i64::from(start)));
            runs.push(Object::Array(widths));
            i += 1;
        }

        Object::Array(runs)
    }

    /// ToUnicode CMap mapping used glyph IDs back to Unicode.
    pub fn tounicode_cmap(&self) -> String {
        let mut cmap = String::new();
        cmap.push_str("/CIDInit /ProcSet findresource begin\n");
        cmap.push_str("12 dict begin\n");
        cmap.push_str("begincmap\n");
        cmap.push_str("/CIDSystemInfo <<\n");
        cmap.push_str("  /Registry (Adobe)\n");
        cmap.push_str("  /Ordering (UCS)\n");
        cmap.push_str("  /Supplement 0\n");
        cmap.push_str(">> def\n");
        cmap.push_str("/CMapName /Adobe-Identity-UCS def\n");
        cmap.push_str("/CMapType 2 def\n");
        cmap.push_str("1 begincodespacerange\n");
        cmap.push_str("<0000> <FFFF>\n");
        cmap.push_str("endcodespacerange\n");

        let mut mappings: Vec<(u16, u32)> = self
            .used_chars
            .iter()
            .map(|(&unicode, &gid)| (gid, unicode))
            .collect();
        mappings.sort_unstable();

        // at most 100 entries per bfchar block
        for chunk in mappings.chunks(100) {
            let _ = writeln!(cmap, "{} beginbfchar", chunk.len());
            for &(gid, unicode) in chunk {
                if unicode <= 0xFFFF {
                    let _ = writeln!(cmap, "<{:04X}> <{:04X}>", gid, unicode);
                } else {
                    let high = ((unicode - 0x10000) >> 10) + 0xD800;
                    let low = ((unicode - 0x10000) & 0x3FF) + 0xDC00;
                    let _ = writeln!(cmap, "<{:04X}> <{:04X}{:04X}>", gid, high, low);
                }
            }
            cmap.push_str("endbfchar\n");
        }

        cmap.push_str("endcmap\n");
        cmap.push_str("CMapName currentdict /CMap defineresource pop\n");
        cmap.push_str("end\n");
        cmap.push_str("end\n");
        cmap
    }
}

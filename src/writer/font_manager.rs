//! Fonts as they live inside a generated PDF.
//!
//! Two kinds of font end up in a document:
//!
//! - [`StandardFont`]: one of the built-in Type1 fonts. Nothing is embedded;
//!   widths come from the Adobe font metrics and only printable ASCII can be
//!   encoded reliably.
//! - [`EmbeddedFont`]: a TrueType/OpenType program embedded as a Type0
//!   composite font with Identity-H encoding (ISO 32000-1 Sections 9.7-9.10),
//!   so any character the font has a glyph for can be drawn.
//!
//! Drawing a character a font cannot encode is an
//! [`Error::UnsupportedGlyph`]; the renderer reacts by falling back.

use crate::error::{Error, Result};
use crate::fonts::glyphs::is_printable_ascii;
use crate::fonts::registry::StandardFontKind;
use crate::fonts::{FontMetrics, FontSubsetter, TrueTypeFont};
use crate::object::Object;
use std::collections::HashMap;
use std::sync::Arc;

/// Helvetica advance widths for U+0020..=U+007E (1/1000 em).
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // 0..9
    278, 278, 584, 584, 584, 556, 1015, // :..@
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // A..M
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // N..Z
    278, 278, 278, 469, 556, 333, // [..`
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // a..m
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // n..z
    334, 260, 334, 584, // {..~
];

/// Helvetica-Bold advance widths for U+0020..=U+007E.
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    333, 333, 584, 584, 584, 611, 975,
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833,
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    333, 278, 333, 584, 556, 333,
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889,
    611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500,
    389, 280, 389, 584,
];

/// Times-Roman advance widths for U+0020..=U+007E.
const TIMES_ROMAN_WIDTHS: [u16; 95] = [
    250, 333, 408, 500, 500, 833, 778, 180, 333, 333, 500, 564, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500,
    278, 278, 564, 564, 564, 444, 921,
    722, 667, 667, 722, 611, 556, 722, 722, 333, 389, 722, 611, 889,
    722, 722, 556, 722, 667, 556, 611, 722, 722, 944, 722, 722, 611,
    333, 278, 333, 469, 500, 333,
    444, 500, 444, 500, 444, 333, 500, 500, 278, 278, 500, 278, 778,
    500, 500, 500, 500, 333, 389, 278, 500, 500, 722, 500, 500, 444,
    480, 200, 480, 541,
];

/// Courier is monospaced.
const COURIER_WIDTH: u16 = 600;

/// A built-in Type1 font.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StandardFont {
    kind: StandardFontKind,
}

impl StandardFont {
    /// Standard font of the given kind.
    pub fn new(kind: StandardFontKind) -> Self {
        Self { kind }
    }

    /// Font kind.
    pub fn kind(&self) -> StandardFontKind {
        self.kind
    }

    /// PostScript name.
    pub fn base_font(&self) -> &'static str {
        self.kind.base_font()
    }

    /// Width of a printable ASCII character in 1/1000 em.
    pub fn char_width(&self, ch: char) -> Option<u16> {
        if !is_printable_ascii(ch) {
            return None;
        }
        let index = ch as usize - 0x20;
        Some(match self.kind {
            StandardFontKind::Helvetica => HELVETICA_WIDTHS[index],
            StandardFontKind::HelveticaBold => HELVETICA_BOLD_WIDTHS[index],
            StandardFontKind::TimesRoman => TIMES_ROMAN_WIDTHS[index],
            StandardFontKind::Courier => COURIER_WIDTH,
        })
    }

    /// (ascender, descender) in 1/1000 em.
    pub fn vertical_metrics(&self) -> (i32, i32) {
        match self.kind {
            StandardFontKind::Helvetica | StandardFontKind::HelveticaBold => (718, -207),
            StandardFontKind::TimesRoman => (683, -217),
            StandardFontKind::Courier => (629, -157),
        }
    }
}

/// TrueType/OpenType font embedded with Identity-H encoding.
#[derive(Debug, Clone)]
pub struct EmbeddedFont {
    /// Registry name the font was loaded under
    label: String,
    /// PostScript name from the font's name table
    base_name: String,
    font_data: Arc<Vec<u8>>,
    subsetter: FontSubsetter,
    /// Unicode -> glyph ID
    glyph_lookup: HashMap<u32, u16>,
    /// Glyph ID -> width in 1/1000 em
    glyph_widths: HashMap<u16, u16>,
    metrics: FontMetrics,
}

impl EmbeddedFont {
    /// Parse raw TTF/OTF bytes.
    pub fn from_data(label: impl Into<String>, data: Vec<u8>) -> Result<Self> {
        let (base_name, glyph_lookup, glyph_widths, metrics) = {
            let font = TrueTypeFont::parse(&data)?;
            let metrics = FontMetrics::from_font(&font);

            let mut glyph_lookup = HashMap::new();
            let mut glyph_widths = HashMap::new();
            for codepoint in font.supported_codepoints() {
                if let Some(gid) = font.glyph_id(codepoint) {
                    glyph_lookup.insert(codepoint, gid);
                    glyph_widths.insert(gid, font.glyph_width(gid));
                }
            }
            // PostScript names may not contain spaces
            let base_name: String = metrics.name.chars().filter(|c| !c.is_whitespace()).collect();
            (base_name, glyph_lookup, glyph_widths, metrics)
        };

        Ok(Self {
            label: label.into(),
            base_name,
            font_data: Arc::new(data),
            subsetter: FontSubsetter::new(),
            glyph_lookup,
            glyph_widths,
            metrics,
        })
    }

    /// Registry name.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// PostScript name.
    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    /// Descriptor metrics.
    pub fn metrics(&self) -> &FontMetrics {
        &self.metrics
    }

    /// Glyph ID for a character.
    pub fn glyph_id(&self, ch: char) -> Option<u16> {
        self.glyph_lookup.get(&(ch as u32)).copied()
    }

    /// Width of a glyph in 1/1000 em.
    pub fn glyph_width(&self, gid: u16) -> u16 {
        self.glyph_widths.get(&gid).copied().unwrap_or(500)
    }

    /// Width of a character in 1/1000 em, if the font has a glyph for it.
    pub fn char_width(&self, ch: char) -> Option<u16> {
        self.glyph_id(ch).map(|gid| self.glyph_width(gid))
    }

    /// Encode text as an Identity-H hex string (`<XXXX...>`, one glyph ID per
    /// character) and record the characters as used.
    pub fn encode_string(&mut self, text: &str) -> Result<String> {
        let mut hex = String::with_capacity(text.len() * 4 + 2);
        hex.push('<');
        for ch in text.chars() {
            let gid = self.glyph_id(ch).ok_or_else(|| Error::UnsupportedGlyph {
                font: self.label.clone(),
                ch,
            })?;
            hex.push_str(&format!("{:04X}", gid));
        }
        hex.push('>');

        let lookup = &self.glyph_lookup;
        self.subsetter.use_string(text, |cp| lookup.get(&cp).copied());
        Ok(hex)
    }

    /// Raw font program for `FontFile2`.
    pub fn font_data(&self) -> &[u8] {
        &self.font_data
    }

    /// Used glyph tracking.
    pub fn subsetter(&self) -> &FontSubsetter {
        &self.subsetter
    }

    /// CIDFont `W` array for the used glyphs.
    pub fn widths_array(&self) -> Object {
        self.subsetter.widths_array(|gid| self.glyph_width(gid))
    }
}

/// Text encoded for a `Tj` operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodedText {
    /// Literal string for a standard font
    Literal(String),
    /// Hex glyph string for an Identity-H font
    Hex(String),
}

/// A font registered in a document.
#[derive(Debug, Clone)]
pub enum PdfFont {
    /// Built-in font, referenced by name
    Standard(StandardFont),
    /// Embedded font program
    Embedded(EmbeddedFont),
}

impl PdfFont {
    /// Name used in error messages.
    pub fn label(&self) -> &str {
        match self {
            PdfFont::Standard(font) => font.base_font(),
            PdfFont::Embedded(font) => font.label(),
        }
    }

    /// Width of each character of `text` in points at `font_size`.
    ///
    /// Fails with [`Error::UnsupportedGlyph`] on the first character the
    /// font cannot draw.
    pub fn char_widths(&self, text: &str, font_size: f32) -> Result<Vec<f32>> {
        text.chars()
            .map(|ch| {
                let units = match self {
                    PdfFont::Standard(font) => font.char_width(ch),
                    PdfFont::Embedded(font) => font.char_width(ch),
                };
                units
                    .map(|w| f32::from(w) * font_size / 1000.0)
                    .ok_or_else(|| Error::UnsupportedGlyph {
                        font: self.label().to_string(),
                        ch,
                    })
            })
            .collect()
    }

    /// Encode text for drawing.
    pub fn encode(&mut self, text: &str) -> Result<EncodedText> {
        match self {
            PdfFont::Standard(font) => match text.chars().find(|c| !is_printable_ascii(*c)) {
                Some(ch) => Err(Error::UnsupportedGlyph {
                    font: font.base_font().to_string(),
                    ch,
                }),
                None => Ok(EncodedText::Literal(text.to_string())),
            },
            PdfFont::Embedded(font) => font.encode_string(text).map(EncodedText::Hex),
        }
    }

    /// Whether the font can draw every character of `text`.
    pub fn covers(&self, text: &str) -> bool {
        text.chars().all(|ch| match self {
            PdfFont::Standard(font) => font.char_width(ch).is_some(),
            PdfFont::Embedded(font) => font.glyph_id(ch).is_some(),
        })
    }
}

//! TrueType/OpenType font parsing for PDF embedding.
//!
//! Wraps the `ttf-parser` crate to extract what an Identity-H composite
//! font needs: the Unicode to glyph mapping of the Basic Multilingual
//! Plane, advance widths in 1/1000 em and the descriptor metrics.

use std::collections::HashMap;
use std::io;

use ttf_parser::{Face, GlyphId};

/// Error types for TrueType font parsing.
#[derive(Debug, thiserror::Error)]
pub enum TrueTypeError {
    /// Failed to parse font file
    #[error("Failed to parse font file: {0}")]
    ParseError(String),

    /// Font file is empty or invalid
    #[error("Font file is empty or invalid")]
    EmptyFont,

    /// Required table is missing
    #[error("Required font table is missing: {0}")]
    MissingTable(String),

    /// IO error during font operations
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
}

/// Result type for TrueType operations.
pub type TrueTypeResult<T> = Result<T, TrueTypeError>;

/// Parsed TrueType font data.
#[derive(Debug)]
pub struct TrueTypeFont<'a> {
    face: Face<'a>,
    /// Unicode codepoint -> glyph ID
    unicode_to_glyph: HashMap<u32, u16>,
    /// Glyph ID -> advance width in 1/1000 em
    glyph_widths: HashMap<u16, u16>,
}

impl<'a> TrueTypeFont<'a> {
    /// Parse a TrueType/OpenType font from raw TTF or OTF bytes.
    pub fn parse(data: &'a [u8]) -> TrueTypeResult<Self> {
        if data.is_empty() {
            return Err(TrueTypeError::EmptyFont);
        }

        let face = Face::parse(data, 0).map_err(|e| TrueTypeError::ParseError(e.to_string()))?;
        if face.tables().cmap.is_none() {
            return Err(TrueTypeError::MissingTable("cmap".to_string()));
        }

        let mut font = Self {
            face,
            unicode_to_glyph: HashMap::new(),
            glyph_widths: HashMap::new(),
        };
        font.build_unicode_map();
        font.build_width_table();
        Ok(font)
    }

    fn build_unicode_map(&mut self) {
        for codepoint in 0..=0xFFFF_u32 {
            if let Some(ch) = char::from_u32(codepoint) {
                if let Some(glyph_id) = self.face.glyph_index(ch) {
                    self.unicode_to_glyph.insert(codepoint, glyph_id.0);
                }
            }
        }
    }

    fn build_width_table(&mut self) {
        let units_per_em = u32::from(self.face.units_per_em().max(1));
        for glyph_id in 0..self.face.number_of_glyphs() {
            let advance = self.face.glyph_hor_advance(GlyphId(glyph_id)).unwrap_or(0);
            let width_1000 = (u32::from(advance) * 1000 / units_per_em) as u16;
            self.glyph_widths.insert(glyph_id, width_1000);
        }
    }

    /// Get the font's PostScript name.
    pub fn postscript_name(&self) -> Option<String> {
        self.face
            .names()
            .into_iter()
            .find(|name| name.name_id == ttf_parser::name_id::POST_SCRIPT_NAME)
            .and_then(|name| name.to_string())
    }

    /// Get the font family name.
    pub fn family_name(&self) -> Option<String> {
        self.face
            .names()
            .into_iter()
            .find(|name| name.name_id == ttf_parser::name_id::FAMILY)
            .and_then(|name| name.to_string())
    }

    /// Units per em for this font.
    pub fn units_per_em(&self) -> u16 {
        self.face.units_per_em()
    }

    /// Ascender in font units.
    pub fn ascender(&self) -> i16 {
        self.face.ascender()
    }

    /// Descender in font units (negative value).
    pub fn descender(&self) -> i16 {
        self.face.descender()
    }

    /// Cap height in font units.
    pub fn cap_height(&self) -> Option<i16> {
        self.face.capital_height()
    }

    /// Check if the font is bold.
    pub fn is_bold(&self) -> bool {
        self.face.is_bold()
    }

    /// Check if the font is italic.
    pub fn is_italic(&self) -> bool {
        self.face.is_italic()
    }

    /// Font bounding box (x_min, y_min, x_max, y_max) in font units.
    pub fn bbox(&self) -> (i16, i16, i16, i16) {
        let bbox = self.face.global_bounding_box();
        (bbox.x_min, bbox.y_min, bbox.x_max, bbox.y_max)
    }

    /// Glyph ID for a Unicode codepoint.
    pub fn glyph_id(&self, codepoint: u32) -> Option<u16> {
        self.unicode_to_glyph.get(&codepoint).copied()
    }

    /// Glyph width in 1/1000 em units.
    pub fn glyph_width(&self, glyph_id: u16) -> u16 {
        self.glyph_widths.get(&glyph_id).copied().unwrap_or(500)
    }

    /// All codepoints with a glyph, in ascending order.
    pub fn supported_codepoints(&self) -> Vec<u32> {
        let mut codepoints: Vec<_> = self.unicode_to_glyph.keys().copied().collect();
        codepoints.sort_unstable();
        codepoints
    }

    /// Vertical stem width estimate. TrueType does not store StemV.
    pub fn stem_v(&self) -> i16 {
        if self.is_bold() {
            140
        } else {
            80
        }
    }

    /// Flags for the PDF FontDescriptor (ISO 32000-1 Table 123).
    ///
    /// FixedPitch (bit 1) for monospaced faces, Nonsymbolic (bit 6) always,
    /// Italic (bit 7) for italic faces.
    pub fn font_flags(&self) -> u32 {
        let mut flags = 1 << 5;
        if self.face.is_monospaced() {
            flags |= 1 << 0;
        }
        if self.is_italic() {
            flags |= 1 << 6;
        }
        flags
    }
}

/// Font metrics extracted for the PDF FontDescriptor.
#[derive(Debug, Clone)]
pub struct FontMetrics {
    /// PostScript name
    pub name: String,
    /// Family name
    pub family: String,
    /// Units per em
    pub units_per_em: u16,
    /// Ascender (positive)
    pub ascender: i16,
    /// Descender (negative)
    pub descender: i16,
    /// Cap height
    pub cap_height: i16,
    /// Bounding box (llx, lly, urx, ury)
    pub bbox: (i16, i16, i16, i16),
    /// Stem V
    pub stem_v: i16,
    /// Descriptor flags
    pub flags: u32,
    /// Italic angle in degrees
    pub italic_angle: f32,
}

impl FontMetrics {
    /// Extract metrics from a parsed font.
    pub fn from_font(font: &TrueTypeFont) -> Self {
        Self {
            name: font
                .postscript_name()
                .unwrap_or_else(|| "Unknown".to_string()),
            family: font.family_name().unwrap_or_else(|| "Unknown".to_string()),
            units_per_em: font.units_per_em(),
            ascender: font.ascender(),
            descender: font.descender(),
            cap_height: font.cap_height().unwrap_or(font.ascender()),
            bbox: font.bbox(),
            stem_v: font.stem_v(),
            flags: font.font_flags(),
            italic_angle: if font.is_italic() { -12.0 } else { 0.0 },
        }
    }

    /// Convert a value from font units to PDF glyph space (1/1000 em).
    pub fn to_pdf_units(&self, value: i16) -> i32 {
        (i32::from(value) * 1000) / i32::from(self.units_per_em.max(1))
    }

    /// Ascender in PDF units.
    pub fn pdf_ascender(&self) -> i32 {
        self.to_pdf_units(self.ascender)
    }

    /// Descender in PDF units.
    pub fn pdf_descender(&self) -> i32 {
        self.to_pdf_units(self.descender)
    }

    /// Cap height in PDF units.
    pub fn pdf_cap_height(&self) -> i32 {
        self.to_pdf_units(self.cap_height)
    }

    /// Bounding box in PDF units.
    pub fn pdf_bbox(&self) -> (i32, i32, i32, i32) {
        (
            self.to_pdf_units(self.bbox.0),
            self.to_pdf_units(self.bbox.1),
            self.to_pdf_units(self.bbox.2),
            self.to_pdf_units(self.bbox.3),
        )
    }
}

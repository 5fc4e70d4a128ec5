//! Text layout: alignment, truncation with an ellipsis, multi-line drawing
//! and greedy word wrapping, all driven by font metrics.
//!
//! [`TextRenderer::render_text`] never fails. If drawing with the resolved
//! font goes wrong at any point the text is transliterated to ASCII and drawn
//! with the built-in fallback font instead.

use super::embedder::FontEmbedder;
use crate::config::LayoutConfig;
use crate::error::Result;
use crate::fonts::glyphs::to_ascii_transliteration;
use crate::writer::{Color, ContentStreamBuilder, EmbeddedFontHandle, EncodedText, PdfDocument};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Horizontal alignment relative to the anchor x coordinate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    /// Text starts at the anchor
    #[default]
    Left,
    /// Text is centered on the anchor
    Center,
    /// Text ends at the anchor
    Right,
}

impl TextAlign {
    /// Draw position for text of `width` anchored at `x`.
    pub fn start_x(&self, x: f32, width: f32) -> f32 {
        match self {
            TextAlign::Left => x,
            TextAlign::Center => x - width / 2.0,
            TextAlign::Right => x - width,
        }
    }
}

/// What to draw and where.
#[derive(Debug, Clone, PartialEq)]
pub struct TextOptions {
    /// Text to draw (a single line for [`TextRenderer::render_text`])
    pub text: String,
    /// Font size in points
    pub font_size: f32,
    /// Fill color
    pub color: Color,
    /// Anchor x in points
    pub x: f32,
    /// Baseline y in points
    pub y: f32,
    /// Truncate with the ellipsis beyond this width
    pub max_width: Option<f32>,
    /// Alignment relative to `x`
    pub align: TextAlign,
    /// Preferred registry font
    pub font_name: Option<String>,
}

impl TextOptions {
    /// Left-aligned black 12pt text at `(x, y)`.
    pub fn new(text: impl Into<String>, x: f32, y: f32) -> Self {
        Self {
            text: text.into(),
            font_size: 12.0,
            color: Color::black(),
            x,
            y,
            max_width: None,
            align: TextAlign::Left,
            font_name: None,
        }
    }

    /// Set font size.
    pub fn with_font_size(mut self, size: f32) -> Self {
        self.font_size = size;
        self
    }

    /// Set fill color.
    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    /// Set maximum width.
    pub fn with_max_width(mut self, width: f32) -> Self {
        self.max_width = Some(width);
        self
    }

    /// Set alignment.
    pub fn with_align(mut self, align: TextAlign) -> Self {
        self.align = align;
        self
    }

    /// Set preferred font.
    pub fn with_font(mut self, name: impl Into<String>) -> Self {
        self.font_name = Some(name.into());
        self
    }
}

/// Report of one drawn line.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawnText {
    /// Text as drawn, after truncation or transliteration
    pub text: String,
    /// Registry name of the font that drew it
    pub font_name: String,
    /// Actual start x after alignment
    pub x: f32,
    /// Width of the drawn text in points
    pub width: f32,
    /// Whether the text was shortened to fit `max_width`
    pub truncated: bool,
    /// Whether a fallback font or transliteration was used
    pub used_fallback: bool,
}

/// Metrics-driven text drawing.
#[derive(Debug, Clone)]
pub struct TextRenderer {
    embedder: Arc<FontEmbedder>,
    ellipsis: String,
    line_height_multiplier: f32,
}

impl TextRenderer {
    /// Create a renderer using the ellipsis and line height of `layout`.
    pub fn new(embedder: Arc<FontEmbedder>, layout: &LayoutConfig) -> Self {
        Self {
            embedder,
            ellipsis: layout.ellipsis.clone(),
            line_height_multiplier: layout.line_height_multiplier,
        }
    }

    /// Font embedder used for resolution.
    pub fn embedder(&self) -> &FontEmbedder {
        &self.embedder
    }

    /// Vertical advance between lines at `font_size`.
    pub fn line_height(&self, font_size: f32) -> f32 {
        font_size * self.line_height_multiplier
    }

    /// Draw one line of text.
    pub fn render_text(
        &self,
        surface: &mut ContentStreamBuilder,
        doc: &PdfDocument,
        options: &TextOptions,
    ) -> DrawnText {
        let name = self
            .embedder
            .resolve_font_name(&options.text, options.font_name.as_deref());
        let handle = self.embedder.embed(doc, &name);

        match self.draw(surface, doc, &handle, &options.text, options) {
            Ok(drawn) => drawn,
            Err(e) => {
                log::warn!("Drawing {:?} with '{}' failed, using ASCII fallback: {}", options.text, name, e);
                self.render_fallback(surface, doc, options)
            },
        }
    }

    /// Draw text containing line breaks, one call per line.
    ///
    /// Each line keeps the anchor and alignment and moves down by
    /// `font_size * line_height_multiplier`.
    pub fn render_multi_line(
        &self,
        surface: &mut ContentStreamBuilder,
        doc: &PdfDocument,
        options: &TextOptions,
    ) -> Vec<DrawnText> {
        let advance = self.line_height(options.font_size);
        options
            .text
            .lines()
            .enumerate()
            .map(|(i, line)| {
                let line_options = TextOptions {
                    text: line.to_string(),
                    y: options.y - i as f32 * advance,
                    ..options.clone()
                };
                self.render_text(surface, doc, &line_options)
            })
            .collect()
    }

    /// Width of `text` in points with the given font.
    pub fn measure(
        &self,
        doc: &PdfDocument,
        handle: &EmbeddedFontHandle,
        text: &str,
        font_size: f32,
    ) -> Result<f32> {
        doc.text_width(handle, text, font_size)
    }

    /// Greedy word wrap of every paragraph of `text` to `max_width`.
    ///
    /// A word wider than `max_width` gets a line of its own (truncation
    /// handles it when drawn). Empty paragraphs are kept as empty lines.
    pub fn wrap_lines(
        &self,
        doc: &PdfDocument,
        handle: &EmbeddedFontHandle,
        text: &str,
        font_size: f32,
        max_width: f32,
    ) -> Result<Vec<String>> {
        let mut lines = Vec::new();
        for paragraph in text.lines() {
            let mut current = String::new();
            for word in paragraph.split_whitespace() {
                let candidate = if current.is_empty() {
                    word.to_string()
                } else {
                    format!("{} {}", current, word)
                };
                if current.is_empty() || self.measure(doc, handle, &candidate, font_size)? <= max_width {
                    current = candidate;
                } else {
                    lines.push(std::mem::replace(&mut current, word.to_string()));
                }
            }
            lines.push(current);
        }
        Ok(lines)
    }

    fn draw(
        &self,
        surface: &mut ContentStreamBuilder,
        doc: &PdfDocument,
        handle: &EmbeddedFontHandle,
        text: &str,
        options: &TextOptions,
    ) -> Result<DrawnText> {
        let widths = doc.char_widths(handle, text, options.font_size)?;
        let (drawn, width, truncated) = match options.max_width {
            Some(max_width) => self.truncate(doc, handle, text, &widths, max_width, options.font_size)?,
            None => (text.to_string(), widths.iter().sum(), false),
        };
        // shift by the width actually drawn
        let x = options.align.start_x(options.x, width);

        // encode before touching the surface so a failure draws nothing
        let encoded = doc.encode_text(handle, &drawn)?;
        surface
            .fill_color(options.color)
            .set_font(&handle.resource_id, options.font_size);
        match &encoded {
            EncodedText::Literal(s) => surface.text(s, x, options.y),
            EncodedText::Hex(h) => surface.hex_text(h, x, options.y),
        };

        Ok(DrawnText {
            text: drawn,
            font_name: handle.font_name.clone(),
            x,
            width,
            truncated,
            used_fallback: handle.is_substitute(),
        })
    }

    /// Longest prefix that fits together with the ellipsis.
    ///
    /// Returns the text unchanged when its full width is within `max_width`,
    /// and the bare ellipsis when no prefix fits.
    fn truncate(
        &self,
        doc: &PdfDocument,
        handle: &EmbeddedFontHandle,
        text: &str,
        widths: &[f32],
        max_width: f32,
        font_size: f32,
    ) -> Result<(String, f32, bool)> {
        let full: f32 = widths.iter().sum();
        if full <= max_width {
            return Ok((text.to_string(), full, false));
        }

        let ellipsis_width = doc.text_width(handle, &self.ellipsis, font_size)?;
        let mut kept = 0;
        let mut kept_width = 0.0;
        for width in widths {
            if kept_width + width + ellipsis_width > max_width {
                break;
            }
            kept_width += width;
            kept += 1;
        }

        let mut truncated: String = text.chars().take(kept).collect();
        truncated.push_str(&self.ellipsis);
        Ok((truncated, kept_width + ellipsis_width, true))
    }

    fn render_fallback(
        &self,
        surface: &mut ContentStreamBuilder,
        doc: &PdfDocument,
        options: &TextOptions,
    ) -> DrawnText {
        let handle = self.embedder.builtin_fallback(doc);
        let ascii = to_ascii_transliteration(&options.text);

        match self.draw(surface, doc, &handle, &ascii, options) {
            Ok(drawn) => DrawnText {
                used_fallback: true,
                ..drawn
            },
            Err(e) => {
                // only reachable with a non-ASCII ellipsis
                log::warn!("ASCII fallback for {:?} failed, nothing drawn: {}", options.text, e);
                DrawnText {
                    text: String::new(),
                    font_name: handle.font_name,
                    x: options.x,
                    width: 0.0,
                    truncated: false,
                    used_fallback: true,
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FontConfig;
    use crate::fonts::registry::{FontDescriptor, FontLoader, FontRegistry};
    use crate::fonts::source::MemoryFontSource;
    use crate::writer::{ContentStreamOp, PdfWriterConfig};
    use crate::Error;

    fn renderer() -> TextRenderer {
        let registry = FontRegistry::with_defaults(Arc::new(MemoryFontSource::new()));
        let embedder = FontEmbedder::new(Arc::new(registry), FontConfig::default());
        TextRenderer::new(Arc::new(embedder), &LayoutConfig::default())
    }

    fn doc() -> PdfDocument {
        PdfDocument::new(PdfWriterConfig::default())
    }

    fn shown_text(surface: &ContentStreamBuilder) -> Vec<String> {
        surface
            .operations()
            .iter()
            .filter_map(|op| match op {
                ContentStreamOp::ShowText(s) => Some(s.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_left_aligned_text() {
        let r = renderer();
        let doc = doc();
        let mut surface = ContentStreamBuilder::new();
        let drawn = r.render_text(&mut surface, &doc, &TextOptions::new("Hello", 72.0, 700.0));

        assert_eq!(drawn.text, "Hello");
        assert_eq!(drawn.font_name, "helvetica");
        assert_eq!(drawn.x, 72.0);
        assert!((drawn.width - 27.336).abs() < 0.001);
        assert!(!drawn.used_fallback);
        assert_eq!(shown_text(&surface), vec!["Hello"]);
    }

    #[test]
    fn test_alignment_shifts_anchor() {
        let r = renderer();
        let doc = doc();
        let mut surface = ContentStreamBuilder::new();
        let centered = r.render_text(
            &mut surface,
            &doc,
            &TextOptions::new("Hello", 100.0, 700.0).with_align(TextAlign::Center),
        );
        let right = r.render_text(
            &mut surface,
            &doc,
            &TextOptions::new("Hello", 100.0, 700.0).with_align(TextAlign::Right),
        );
        assert!((centered.x - (100.0 - centered.width / 2.0)).abs() < 1e-4);
        assert!((right.x - (100.0 - right.width)).abs() < 1e-4);
    }

    #[test]
    fn test_truncation_boundary() {
        let r = renderer();
        let doc = doc();
        let handle = r.embedder().embed(&doc, "helvetica");
        let text = "Answer all questions";
        let full = r.measure(&doc, &handle, text, 12.0).unwrap();

        let mut surface = ContentStreamBuilder::new();
        let exact = r.render_text(&mut surface, &doc, &TextOptions::new(text, 0.0, 0.0).with_max_width(full));
        assert_eq!(exact.text, text);
        assert!(!exact.truncated);

        let short = r.render_text(
            &mut surface,
            &doc,
            &TextOptions::new(text, 0.0, 0.0).with_max_width(full - 1.0),
        );
        assert!(short.truncated);
        assert!(short.text.ends_with("..."));
        assert!(short.width <= full - 1.0);
    }

    #[test]
    fn test_truncation_degrades_to_bare_ellipsis() {
        let r = renderer();
        let doc = doc();
        let mut surface = ContentStreamBuilder::new();
        let drawn = r.render_text(&mut surface, &doc, &TextOptions::new("Wide", 0.0, 0.0).with_max_width(1.0));
        assert_eq!(drawn.text, "...");
        assert!(drawn.truncated);
    }

    #[test]
    fn test_right_aligned_truncated_text_uses_drawn_width() {
        let r = renderer();
        let doc = doc();
        let mut surface = ContentStreamBuilder::new();
        let drawn = r.render_text(
            &mut surface,
            &doc,
            &TextOptions::new("A fairly long line of text", 200.0, 0.0)
                .with_max_width(50.0)
                .with_align(TextAlign::Right),
        );
        assert!(drawn.truncated);
        assert!(drawn.x >= 150.0);
        assert!((drawn.x + drawn.width - 200.0).abs() < 1e-3);
    }

    #[test]
    fn test_failed_font_transliterates() {
        let loader: Arc<dyn FontLoader> = Arc::new(|| -> Result<Vec<u8>> {
            Err(Error::FontLoad {
                font: "noto-sans".to_string(),
                reason: "offline".to_string(),
            })
        });
        let mut registry = FontRegistry::with_defaults(Arc::new(MemoryFontSource::new()));
        registry.register(FontDescriptor::loadable("noto-sans", "Noto Sans", loader));
        let embedder = FontEmbedder::new(Arc::new(registry), FontConfig::default());
        let r = TextRenderer::new(Arc::new(embedder), &LayoutConfig::default());
        let doc = doc();

        let mut surface = ContentStreamBuilder::new();
        let drawn = r.render_text(&mut surface, &doc, &TextOptions::new("Xin chào", 10.0, 10.0));
        assert_eq!(drawn.text, "Xin chao");
        assert_eq!(drawn.font_name, "helvetica");
        assert!(drawn.used_fallback);
        assert_eq!(shown_text(&surface), vec!["Xin chao"]);
    }

    #[test]
    fn test_multi_line_offsets() {
        let r = renderer();
        let doc = doc();
        let mut surface = ContentStreamBuilder::new();
        let lines = r.render_multi_line(
            &mut surface,
            &doc,
            &TextOptions::new("one\ntwo\nthree", 50.0, 500.0).with_font_size(10.0),
        );
        assert_eq!(lines.len(), 3);
        let matrices: Vec<f32> = surface
            .operations()
            .iter()
            .filter_map(|op| match op {
                ContentStreamOp::SetTextMatrix(_, _, _, _, _, y) => Some(*y),
                _ => None,
            })
            .collect();
        assert_eq!(matrices.len(), 3);
        assert!((matrices[0] - 500.0).abs() < 1e-4);
        assert!((matrices[1] - 488.0).abs() < 1e-4);
        assert!((matrices[2] - 476.0).abs() < 1e-4);
    }

    #[test]
    fn test_wrap_lines() {
        let r = renderer();
        let doc = doc();
        let handle = r.embedder().embed(&doc, "courier");
        // courier: 6pt per char at 10pt
        let lines = r
            .wrap_lines(&doc, &handle, "aaa bbb ccc\n\nddd", 10.0, 42.0)
            .unwrap();
        assert_eq!(lines, vec!["aaa bbb", "ccc", "", "ddd"]);
    }

    #[test]
    fn test_wrap_rejects_unencodable_text() {
        let r = renderer();
        let doc = doc();
        let handle = r.embedder().embed(&doc, "helvetica");
        assert!(r.wrap_lines(&doc, &handle, "Đề thi học kỳ", 12.0, 100.0).is_err());
    }
}

//! PDF content stream builder.
//!
//! Builds page content streams from text and graphics operators
//! (ISO 32000-1:2008 Sections 8-9).

use crate::error::{Error, Result};
use std::io::Write;

/// RGB color with channels in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    /// Red channel
    pub r: f32,
    /// Green channel
    pub g: f32,
    /// Blue channel
    pub b: f32,
}

impl Color {
    /// Create a new color.
    pub fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Black.
    pub fn black() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// Mid grey used for frames and captions.
    pub fn grey() -> Self {
        Self::new(0.5, 0.5, 0.5)
    }

    /// Parse `#rrggbb` or `#rgb` (the leading `#` is optional).
    pub fn from_hex(hex: &str) -> Result<Self> {
        let digits = hex.trim().trim_start_matches('#');
        if !digits.is_ascii() {
            return Err(Error::InvalidTemplate(format!("invalid color '{}'", hex)));
        }
        let expanded: String = match digits.len() {
            3 => digits.chars().flat_map(|c| [c, c]).collect(),
            6 => digits.to_string(),
            _ => return Err(Error::InvalidTemplate(format!("invalid color '{}'", hex))),
        };
        let channel = |i: usize| {
            u8::from_str_radix(&expanded[i..i + 2], 16)
                .map(|v| f32::from(v) / 255.0)
                .map_err(|_| Error::InvalidTemplate(format!("invalid color '{}'", hex)))
        };
        Ok(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::black()
    }
}

/// Operations that can be added to a content stream.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentStreamOp {
    /// Save graphics state (q)
    SaveState,
    /// Restore graphics state (Q)
    RestoreState,
    /// Begin text object (BT)
    BeginText,
    /// End text object (ET)
    EndText,
    /// Set font and size (Tf)
    SetFont(String, f32),
    /// Set text matrix (Tm)
    SetTextMatrix(f32, f32, f32, f32, f32, f32),
    /// Show a literal string (Tj)
    ShowText(String),
    /// Show a hex string already formatted as `<XXXX...>` (Tj)
    ShowHexText(String),
    /// Set RGB fill color (rg)
    SetFillColorRGB(f32, f32, f32),
    /// Set RGB stroke color (RG)
    SetStrokeColorRGB(f32, f32, f32),
    /// Set line width (w)
    SetLineWidth(f32),
    /// Move to (m)
    MoveTo(f32, f32),
    /// Line to (l)
    LineTo(f32, f32),
    /// Rectangle (re)
    Rectangle(f32, f32, f32, f32),
    /// Stroke path (S)
    Stroke,
}

/// Builder for PDF content streams.
#[derive(Debug, Default, Clone)]
pub struct ContentStreamBuilder {
    operations: Vec<ContentStreamOp>,
    current_font: Option<(String, f32)>,
    in_text_object: bool,
}

impl ContentStreamBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an operation to the stream.
    pub fn op(&mut self, op: ContentStreamOp) -> &mut Self {
        self.operations.push(op);
        self
    }

    /// Operations recorded so far.
    pub fn operations(&self) -> &[ContentStreamOp] {
        &self.operations
    }

    /// Whether nothing has been drawn.
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Begin a text object.
    pub fn begin_text(&mut self) -> &mut Self {
        if !self.in_text_object {
            self.op(ContentStreamOp::BeginText);
            self.in_text_object = true;
        }
        self
    }

    /// End a text object.
    pub fn end_text(&mut self) -> &mut Self {
        if self.in_text_object {
            self.op(ContentStreamOp::EndText);
            self.in_text_object = false;
        }
        self
    }

    /// Select a font resource and size. Repeated selections are elided.
    pub fn set_font(&mut self, resource_id: &str, size: f32) -> &mut Self {
        let unchanged = matches!(&self.current_font, Some((id, s)) if id == resource_id && *s == size);
        if !unchanged {
            self.op(ContentStreamOp::SetFont(resource_id.to_string(), size));
            self.current_font = Some((resource_id.to_string(), size));
        }
        self
    }

    /// Show a literal string at a position (standard fonts).
    pub fn text(&mut self, text: &str, x: f32, y: f32) -> &mut Self {
        self.begin_text();
        self.op(ContentStreamOp::SetTextMatrix(1.0, 0.0, 0.0, 1.0, x, y));
        self.op(ContentStreamOp::ShowText(text.to_string()))
    }

    /// Show a hex-encoded glyph string at a position (Identity-H fonts).
    pub fn hex_text(&mut self, hex_string: &str, x: f32, y: f32) -> &mut Self {
        self.begin_text();
        self.op(ContentStreamOp::SetTextMatrix(1.0, 0.0, 0.0, 1.0, x, y));
        self.op(ContentStreamOp::ShowHexText(hex_string.to_string()))
    }

    /// Set fill color.
    pub fn fill_color(&mut self, color: Color) -> &mut Self {
        self.op(ContentStreamOp::SetFillColorRGB(color.r, color.g, color.b))
    }

    /// Set stroke color.
    pub fn stroke_color(&mut self, color: Color) -> &mut Self {
        self.op(ContentStreamOp::SetStrokeColorRGB(color.r, color.g, color.b))
    }

    /// Stroke a rectangle outline.
    pub fn stroke_rect(&mut self, x: f32, y: f32, width: f32, height: f32) -> &mut Self {
        self.op(ContentStreamOp::Rectangle(x, y, width, height));
        self.op(ContentStreamOp::Stroke)
    }

    /// Stroke a straight line.
    pub fn line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32) -> &mut Self {
        self.op(ContentStreamOp::MoveTo(x1, y1));
        self.op(ContentStreamOp::LineTo(x2, y2));
        self.op(ContentStreamOp::Stroke)
    }

    /// Append everything drawn into `other`.
    ///
    /// An open text object in `self` is closed first, and the font state is
    /// reset so the next text selects its font again.
    pub fn append(&mut self, mut other: ContentStreamBuilder) -> &mut Self {
        self.end_text();
        other.end_text();
        self.operations.append(&mut other.operations);
        self.current_font = None;
        self
    }

    /// Serialize the operations to content stream bytes.
    pub fn build(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        for op in &self.operations {
            write_op(&mut buf, op)?;
            writeln!(buf)?;
        }
        if self.in_text_object {
            writeln!(buf, "ET")?;
        }
        Ok(buf)
    }
}

fn write_op<W: Write>(w: &mut W, op: &ContentStreamOp) -> std::io::Result<()> {
    match op {
        ContentStreamOp::SaveState => write!(w, "q"),
        ContentStreamOp::RestoreState => write!(w, "Q"),
        ContentStreamOp::BeginText => write!(w, "BT"),
        ContentStreamOp::EndText => write!(w, "ET"),
        ContentStreamOp::SetFont(name, size) => write!(w, "/{} {} Tf", name, size),
        ContentStreamOp::SetTextMatrix(a, b, c, d, e, f) => {
            write!(w, "{} {} {} {} {} {} Tm", a, b, c, d, e, f)
        },
        ContentStreamOp::ShowText(text) => {
            write!(w, "(")?;
            write_escaped_string(w, text)?;
            write!(w, ") Tj")
        },
        ContentStreamOp::ShowHexText(hex) => write!(w, "{} Tj", hex),
        ContentStreamOp::SetFillColorRGB(r, g, b) => write!(w, "{} {} {} rg", r, g, b),
        ContentStreamOp::SetStrokeColorRGB(r, g, b) => write!(w, "{} {} {} RG", r, g, b),
        ContentStreamOp::SetLineWidth(width) => write!(w, "{} w", width),
        ContentStreamOp::MoveTo(x, y) => write!(w, "{} {} m", x, y),
        ContentStreamOp::LineTo(x, y) => write!(w, "{} {} l", x, y),
        ContentStreamOp::Rectangle(x, y, width, height) => {
            write!(w, "{} {} {} {} re", x, y, width, height)
        },
        ContentStreamOp::Stroke => write!(w, "S"),
    }
}

fn write_escaped_string<W: Write>(w: &mut W, text: &str) -> std::io::Result<()> {
    for byte in text.bytes() {
        match byte {
            b'(' => write!(w, "\\(")?,
            b')' => write!(w, "\\)")?,
            b'\\' => write!(w, "\\\\")?,
            _ => w.write_all(&[byte])?,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(builder: &ContentStreamBuilder) -> String {
        String::from_utf8(builder.build().unwrap()).unwrap()
    }

    #[test]
    fn test_simple_text() {
        let mut builder = ContentStreamBuilder::new();
        builder
            .begin_text()
            .set_font("F1", 12.0)
            .text("Hello (World)", 72.0, 720.0)
            .end_text();

        let content = render(&builder);
        assert!(content.contains("BT\n/F1 12 Tf\n1 0 0 1 72 720 Tm\n(Hello \\(World\\)) Tj\nET"));
    }

    #[test]
    fn test_hex_text() {
        let mut builder = ContentStreamBuilder::new();
        builder.set_font("F2", 10.0).hex_text("<00240025>", 10.0, 20.5);
        let content = render(&builder);
        assert!(content.contains("<00240025> Tj"));
        // unterminated text objects are closed on build
        assert!(content.ends_with("ET\n"));
    }

    #[test]
    fn test_set_font_elides_repeats() {
        let mut builder = ContentStreamBuilder::new();
        builder.set_font("F1", 12.0).set_font("F1", 12.0).set_font("F1", 14.0);
        let fonts = builder
            .operations()
            .iter()
            .filter(|op| matches!(op, ContentStreamOp::SetFont(..)))
            .count();
        assert_eq!(fonts, 2);
    }

    #[test]
    fn test_append_resets_font_state() {
        let mut page = ContentStreamBuilder::new();
        page.set_font("F1", 12.0).text("a", 0.0, 0.0);

        let mut scratch = ContentStreamBuilder::new();
        scratch.set_font("F2", 12.0).text("b", 0.0, 0.0);
        page.append(scratch);
        page.set_font("F1", 12.0);

        let content = render(&page);
        assert_eq!(content.matches("/F1 12 Tf").count(), 2);
        assert_eq!(content.matches("BT").count(), 2);
        assert_eq!(content.matches("ET").count(), 2);
    }

    #[test]
    fn test_graphics() {
        let mut builder = ContentStreamBuilder::new();
        builder
            .stroke_color(Color::grey())
            .op(ContentStreamOp::SetLineWidth(0.5))
            .stroke_rect(10.0, 10.0, 100.0, 50.0)
            .line(0.0, 0.0, 5.0, 5.0);
        let content = render(&builder);
        assert!(content.contains("0.5 0.5 0.5 RG"));
        assert!(content.contains("10 10 100 50 re\nS"));
        assert!(content.contains("0 0 m\n5 5 l\nS"));
    }

    #[test]
    fn test_color_from_hex() {
        assert_eq!(Color::from_hex("#ff0000").unwrap(), Color::new(1.0, 0.0, 0.0));
        assert_eq!(Color::from_hex("000").unwrap(), Color::black());
        assert!(Color::from_hex("#12").is_err());
        assert!(Color::from_hex("#gg0000").is_err());
    }
}

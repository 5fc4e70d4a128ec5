//! Template rendering.
//!
//! [`TemplateRenderer`] draws every schema item of a template, bound against
//! a data object, onto A4 pages. Rendering is not transactional: each item
//! is drawn into its own scratch content stream and merged only when it
//! succeeds, so a failing item leaves the rest of the page intact and is
//! reported as an [`ItemFailure`].

use super::embedder::FontEmbedder;
use super::text::{TextAlign, TextOptions, TextRenderer};
use crate::config::{mm_to_pt, LayoutConfig};
use crate::error::{Error, Result};
use crate::fonts::glyphs::to_ascii_transliteration;
use crate::template::binding;
use crate::template::builder::question_display_text;
use crate::template::{FieldType, SchemaItem, Template};
use crate::writer::{Color, ContentStreamBuilder, ContentStreamOp, PdfDocument, PdfWriterConfig};
use serde_json::Value;
use std::sync::Arc;

/// Font size of image/table captions relative to the item font size.
const CAPTION_SCALE: f32 = 0.8;

/// An item that could not be drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemFailure {
    /// Page index
    pub page: usize,
    /// Item index within the page
    pub item: usize,
    /// Item name, if it has one
    pub name: String,
    /// Error message
    pub message: String,
}

/// Rendered PDF plus the items that failed.
#[derive(Debug, Clone)]
pub struct RenderOutput {
    /// Complete PDF file
    pub pdf: Vec<u8>,
    /// Number of pages written
    pub page_count: usize,
    /// Items left out of the output
    pub failures: Vec<ItemFailure>,
}

impl RenderOutput {
    /// Whether every item was drawn.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Item geometry in PDF points, y measured from the page bottom.
#[derive(Debug, Clone, Copy)]
struct ItemBox {
    left: f32,
    top: f32,
    width: f32,
    height: f32,
}

/// Renders templates to PDF.
#[derive(Debug, Clone)]
pub struct TemplateRenderer {
    text: TextRenderer,
    layout: LayoutConfig,
    writer_config: PdfWriterConfig,
}

impl TemplateRenderer {
    /// Renderer for the given page layout.
    pub fn new(embedder: Arc<FontEmbedder>, layout: LayoutConfig) -> Self {
        Self {
            text: TextRenderer::new(embedder, &layout),
            layout,
            writer_config: PdfWriterConfig::default(),
        }
    }

    /// Override the PDF writer settings.
    pub fn with_writer_config(mut self, config: PdfWriterConfig) -> Self {
        self.writer_config = config;
        self
    }

    /// Text renderer used for every item.
    pub fn text_renderer(&self) -> &TextRenderer {
        &self.text
    }

    /// Render `template` bound against `data`.
    ///
    /// Fails only for templates without pages and for errors assembling the
    /// file; item-level problems end up in [`RenderOutput::failures`].
    pub fn render(&self, template: &Template, data: &Value) -> Result<RenderOutput> {
        if template.schemas.is_empty() {
            return Err(Error::InvalidTemplate(format!("template '{}' has no pages", template.name)));
        }

        let mut config = self.writer_config.clone();
        if config.title.is_none() {
            config.title = Some(template.name.clone());
        }
        if config.author.is_none() {
            config.author = Some(template.metadata.author.clone());
        }
        let doc = PdfDocument::new(config);
        let (page_width, page_height) = self.layout.page_size_pt();

        let mut failures = Vec::new();
        for (page_index, items) in template.schemas.iter().enumerate() {
            let page = doc.add_page(page_width, page_height);
            for (item_index, item) in items.iter().enumerate() {
                let mut scratch = ContentStreamBuilder::new();
                match self.render_item(&mut scratch, &doc, page_height, item, data) {
                    Ok(()) => doc.append_to_page(page, scratch)?,
                    Err(e) => {
                        log::warn!("Page {}, item {} not drawn: {}", page_index, item_index, e);
                        failures.push(ItemFailure {
                            page: page_index,
                            item: item_index,
                            name: item.name_or_default().to_string(),
                            message: e.to_string(),
                        });
                    },
                }
            }
        }

        let pdf = doc.finish()?;
        log::info!(
            "Rendered template '{}': {} page(s), {} failed item(s), {} bytes",
            template.name,
            doc.page_count(),
            failures.len(),
            pdf.len()
        );
        Ok(RenderOutput {
            pdf,
            page_count: doc.page_count(),
            failures,
        })
    }

    /// Draw one item into `surface`.
    pub fn render_item(
        &self,
        surface: &mut ContentStreamBuilder,
        doc: &PdfDocument,
        page_height: f32,
        item: &SchemaItem,
        data: &Value,
    ) -> Result<()> {
        let frame = item_box(item, page_height)?;
        let field_type = item
            .field_type
            .as_ref()
            .ok_or_else(|| Error::Render("item has no type".to_string()))?;
        let color = match item.font_color.as_deref() {
            Some(hex) => Color::from_hex(hex)?,
            None => Color::black(),
        };
        let font_size = item.font_size.unwrap_or(self.layout.default_font_size);
        let text = binding::item_text(item, data)?;
        log::debug!("Drawing {} item '{}'", field_type, item.name_or_default());

        if field_type.is_placeholder() {
            self.draw_frame(surface, doc, frame, item, &text, font_size * CAPTION_SCALE);
            return Ok(());
        }

        let display = if field_type.is_question() {
            question_display_text(&text, &item.options)
        } else {
            text
        };
        let align = item.alignment.unwrap_or_default();
        let anchor_x = match align {
            TextAlign::Left => frame.left,
            TextAlign::Center => frame.left + frame.width / 2.0,
            TextAlign::Right => frame.left + frame.width,
        };
        let (lines, font_name) = self.layout_lines(doc, &display, item.font_name.as_deref(), font_size, frame.width);
        let options = TextOptions {
            text: lines.join("\n"),
            font_size,
            color,
            x: anchor_x,
            y: frame.top - font_size,
            max_width: Some(frame.width),
            align,
            font_name: Some(font_name),
        };
        self.text.render_multi_line(surface, doc, &options);
        Ok(())
    }

    /// Wrap `text` to `width` with the font that will draw it.
    ///
    /// Returns the lines and that font's name. Text the resolved font cannot
    /// draw is transliterated paragraph by paragraph first and wrapped with
    /// the font the ASCII text resolves to, so every line is drawn in full.
    fn layout_lines(
        &self,
        doc: &PdfDocument,
        text: &str,
        preferred: Option<&str>,
        font_size: f32,
        width: f32,
    ) -> (Vec<String>, String) {
        let embedder = self.text.embedder();
        let font = embedder.resolve_font_name(text, preferred);
        let handle = embedder.embed(doc, &font);
        if text.lines().all(|line| doc.covers(&handle, line).unwrap_or(false)) {
            match self.text.wrap_lines(doc, &handle, text, font_size, width) {
                Ok(lines) => return (lines, font),
                Err(e) => log::debug!("Not wrapping with '{}': {}", handle.font_name, e),
            }
        }

        log::debug!("'{}' cannot draw {:?}, wrapping its transliteration", handle.font_name, text);
        let ascii = text
            .lines()
            .map(to_ascii_transliteration)
            .collect::<Vec<_>>()
            .join("\n");
        let font = embedder.resolve_font_name(&ascii, preferred);
        let handle = embedder.embed(doc, &font);
        match self.text.wrap_lines(doc, &handle, &ascii, font_size, width) {
            Ok(lines) => (lines, font),
            Err(e) => {
                log::debug!("Not wrapping with '{}': {}", handle.font_name, e);
                (ascii.lines().map(str::to_string).collect(), font)
            },
        }
    }

    /// Image and table items: a grey frame with the content as caption.
    fn draw_frame(
        &self,
        surface: &mut ContentStreamBuilder,
        doc: &PdfDocument,
        frame: ItemBox,
        item: &SchemaItem,
        caption: &str,
        caption_size: f32,
    ) {
        surface
            .op(ContentStreamOp::SaveState)
            .stroke_color(Color::grey())
            .op(ContentStreamOp::SetLineWidth(0.5))
            .stroke_rect(frame.left, frame.top - frame.height, frame.width, frame.height)
            .op(ContentStreamOp::RestoreState);

        let caption = if caption.trim().is_empty() {
            item.name_or_default()
        } else {
            caption
        };
        if caption.is_empty() {
            return;
        }
        let padding = caption_size / 2.0;
        let options = TextOptions::new(caption.lines().next().unwrap_or_default(), frame.left + padding, frame.top - padding - caption_size)
            .with_font_size(caption_size)
            .with_color(Color::grey())
            .with_max_width((frame.width - 2.0 * padding).max(0.0));
        let options = TextOptions {
            font_name: item.font_name.clone(),
            ..options
        };
        self.text.render_text(surface, doc, &options);
    }
}

fn item_box(item: &SchemaItem, page_height: f32) -> Result<ItemBox> {
    let position = item
        .position
        .ok_or_else(|| Error::Render("item has no position".to_string()))?;
    let width = item
        .width
        .filter(|w| w.is_finite() && *w > 0.0)
        .ok_or_else(|| Error::Render("item has no usable width".to_string()))?;
    let height = item
        .height
        .filter(|h| h.is_finite() && *h > 0.0)
        .ok_or_else(|| Error::Render("item has no usable height".to_string()))?;

    Ok(ItemBox {
        left: mm_to_pt(position.x),
        top: page_height - mm_to_pt(position.y),
        width: mm_to_pt(width),
        height: mm_to_pt(height),
    })
}

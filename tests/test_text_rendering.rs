//! Integration tests for text rendering and the font fallback chain.
//!
//! These tests verify:
//! - Loader failures degrade to the built-in font with transliteration
//! - Truncation at the exact width boundary
//! - Alignment of drawn text
//! - Full template rendering to a PDF file

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde_json::json;
use template_oxide::config::{FontConfig, LayoutConfig};
use template_oxide::fonts::{FontDescriptor, FontLoader, FontRegistry, MemoryFontSource};
use template_oxide::render::{FontEmbedder, TemplateRenderer, TextAlign, TextOptions, TextRenderer};
use template_oxide::template::TemplateAssembler;
use template_oxide::writer::{ContentStreamBuilder, PdfDocument, PdfWriterConfig};
use template_oxide::Error;

fn embedder_with(registry: FontRegistry) -> Arc<FontEmbedder> {
    Arc::new(FontEmbedder::new(Arc::new(registry), FontConfig::default()))
}

fn default_embedder() -> Arc<FontEmbedder> {
    embedder_with(FontRegistry::with_defaults(Arc::new(MemoryFontSource::new())))
}

fn uncompressed_doc() -> PdfDocument {
    PdfDocument::new(PdfWriterConfig::default().with_compress(false))
}

fn content(surface: &ContentStreamBuilder) -> String {
    String::from_utf8(surface.build().unwrap()).unwrap()
}

/// A throwing loader for `noto-sans` must not stop "Xin chào" from being drawn.
#[test]
fn test_loader_failure_draws_transliteration() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let loader: Arc<dyn FontLoader> = Arc::new(move || -> template_oxide::Result<Vec<u8>> {
        counter.fetch_add(1, Ordering::SeqCst);
        Err(Error::FontLoad {
            font: "noto-sans".to_string(),
            reason: "network unreachable".to_string(),
        })
    });
    let mut registry = FontRegistry::with_defaults(Arc::new(MemoryFontSource::new()));
    registry.register(FontDescriptor::loadable("noto-sans", "Noto Sans", loader));

    let renderer = TextRenderer::new(embedder_with(registry), &LayoutConfig::default());
    let doc = uncompressed_doc();
    let mut surface = ContentStreamBuilder::new();

    let drawn = renderer.render_text(&mut surface, &doc, &TextOptions::new("Xin chào", 72.0, 700.0));
    assert_eq!(drawn.text, "Xin chao");
    assert_eq!(drawn.font_name, "helvetica");
    assert!(drawn.used_fallback);
    assert!(content(&surface).contains("(Xin chao) Tj"));

    // the failed load is remembered for the document
    renderer.render_text(&mut surface, &doc, &TextOptions::new("Tiếng Việt", 72.0, 680.0));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(doc.embedded_font_count(), 0);
}

#[test]
fn test_truncation_boundary() {
    let embedder = default_embedder();
    let renderer = TextRenderer::new(Arc::clone(&embedder), &LayoutConfig::default());
    let doc = uncompressed_doc();
    let handle = embedder.embed(&doc, "helvetica");
    let text = "Answer all questions on this page";
    let width = renderer.measure(&doc, &handle, text, 12.0).unwrap();

    let mut surface = ContentStreamBuilder::new();
    let exact = renderer.render_text(
        &mut surface,
        &doc,
        &TextOptions::new(text, 72.0, 700.0).with_max_width(width),
    );
    assert!(!exact.truncated);
    assert_eq!(exact.text, text);

    let narrower = renderer.render_text(
        &mut surface,
        &doc,
        &TextOptions::new(text, 72.0, 680.0).with_max_width(width - 1.0),
    );
    assert!(narrower.truncated);
    assert!(narrower.text.ends_with("..."));
    assert!(narrower.width <= width - 1.0);
}

#[test]
fn test_truncation_keeps_bare_ellipsis_when_nothing_fits() {
    let renderer = TextRenderer::new(default_embedder(), &LayoutConfig::default());
    let doc = uncompressed_doc();
    let mut surface = ContentStreamBuilder::new();
    let drawn = renderer.render_text(
        &mut surface,
        &doc,
        &TextOptions::new("Wide", 0.0, 0.0).with_max_width(1.0),
    );
    assert_eq!(drawn.text, "...");
}

#[test]
fn test_right_alignment_uses_drawn_width() {
    let renderer = TextRenderer::new(default_embedder(), &LayoutConfig::default());
    let doc = uncompressed_doc();
    let mut surface = ContentStreamBuilder::new();
    let drawn = renderer.render_text(
        &mut surface,
        &doc,
        &TextOptions::new("A rather long heading that will not fit", 300.0, 700.0)
            .with_max_width(100.0)
            .with_align(TextAlign::Right),
    );
    assert!(drawn.truncated);
    assert!((drawn.x + drawn.width - 300.0).abs() < 1e-3);
    assert!(drawn.x >= 200.0 - 1e-3);
}

#[test]
fn test_multi_line_spacing() {
    let layout = LayoutConfig::default().with_line_height_multiplier(1.5);
    let renderer = TextRenderer::new(default_embedder(), &layout);
    let doc = uncompressed_doc();
    let mut surface = ContentStreamBuilder::new();
    let lines = renderer.render_multi_line(
        &mut surface,
        &doc,
        &TextOptions::new("Name:\nClass:\nDate:", 72.0, 700.0).with_font_size(10.0),
    );
    assert_eq!(lines.len(), 3);
    let stream = content(&surface);
    assert!(stream.contains("1 0 0 1 72 700 Tm"));
    assert!(stream.contains("1 0 0 1 72 685 Tm"));
    assert!(stream.contains("1 0 0 1 72 670 Tm"));
}

#[test]
fn test_render_assembled_template_to_file() {
    let analysis = json!({
        "documentStructure": {
            "type": "worksheet",
            "subject": "Tiếng Việt",
            "sections": [
                {"role": "title", "content": "Phiếu bài tập"},
                {"role": "content", "content": "Điền vào chỗ trống"}
            ]
        },
        "extractedQuestions": [
            {"number": "1", "content": "Con mèo ___ trên mái nhà", "type": "fill_blank"},
            {"number": "2", "content": "2 + 3 = ?", "type": "multiple_choice", "options": ["4", "5"]}
        ],
        "extractedContent": {"title": "Phiếu bài tập"}
    });
    let template = TemplateAssembler::default()
        .create_from_value(&analysis)
        .unwrap()
        .template
        .unwrap();

    let renderer = TemplateRenderer::new(default_embedder(), LayoutConfig::default());
    let output = renderer.render(&template, &template.sample_data).unwrap();
    assert!(output.is_complete(), "{:?}", output.failures);
    assert_eq!(output.page_count, 1);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("worksheet.pdf");
    std::fs::write(&path, &output.pdf).unwrap();
    let bytes = std::fs::read(&path).unwrap();
    assert!(bytes.starts_with(b"%PDF-1.7"));
    assert!(bytes.ends_with(b"%%EOF"));
}

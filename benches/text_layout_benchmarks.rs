//! Benchmarks for text layout and template rendering.
//!
//! Run with: cargo bench --bench text_layout_benchmarks

use std::hint::black_box;
use std::sync::Arc;

use criterion::{criterion_group, criterion_main, Criterion};
use serde_json::json;

use template_oxide::config::{FontConfig, LayoutConfig};
use template_oxide::fonts::{requires_extended_glyphs, to_ascii_transliteration, FontRegistry, MemoryFontSource};
use template_oxide::render::{FontEmbedder, TemplateRenderer, TextOptions, TextRenderer};
use template_oxide::template::{Template, TemplateAssembler};
use template_oxide::writer::{ContentStreamBuilder, PdfDocument, PdfWriterConfig};

const PARAGRAPH: &str = "Read each question carefully and write your answer in the space provided. \
    Show all of your working, partial credit is given for correct methods even when the final \
    answer is wrong. Calculators are not permitted in this section of the examination.";

const VIETNAMESE: &str = "Đọc kỹ từng câu hỏi và viết câu trả lời vào chỗ trống. \
    Trình bày đầy đủ các bước giải, bài làm đúng phương pháp vẫn được tính điểm.";

fn embedder() -> Arc<FontEmbedder> {
    let registry = FontRegistry::with_defaults(Arc::new(MemoryFontSource::new()));
    Arc::new(FontEmbedder::new(Arc::new(registry), FontConfig::default()))
}

fn worksheet(questions: usize) -> Template {
    let questions: Vec<_> = (1..=questions)
        .map(|n| {
            json!({
                "number": n,
                "content": format!("Question {}: {}", n, PARAGRAPH),
                "type": "multiple_choice",
                "options": ["First option", "Second option", "Third option", "Fourth option"]
            })
        })
        .collect();
    let analysis = json!({
        "documentStructure": {
            "type": "exam",
            "sections": [
                {"role": "header", "content": "Final Examination"},
                {"role": "content", "content": PARAGRAPH}
            ]
        },
        "extractedQuestions": questions,
        "extractedContent": {"title": "Final Examination"}
    });
    TemplateAssembler::default()
        .create_from_value(&analysis)
        .unwrap()
        .template
        .unwrap()
}

// ============================================================================
// Glyph classification
// ============================================================================

fn bench_classification(c: &mut Criterion) {
    c.bench_function("requires_extended_ascii", |b| {
        b.iter(|| requires_extended_glyphs(black_box(PARAGRAPH)))
    });
    c.bench_function("transliterate_vietnamese", |b| {
        b.iter(|| to_ascii_transliteration(black_box(VIETNAMESE)))
    });
}

// ============================================================================
// Text layout
// ============================================================================

fn bench_layout(c: &mut Criterion) {
    let embedder = embedder();
    let renderer = TextRenderer::new(Arc::clone(&embedder), &LayoutConfig::default());
    let doc = PdfDocument::new(PdfWriterConfig::default());
    let handle = embedder.embed(&doc, "helvetica");

    c.bench_function("measure_paragraph", |b| {
        b.iter(|| renderer.measure(&doc, &handle, black_box(PARAGRAPH), 12.0).unwrap())
    });

    c.bench_function("wrap_paragraph", |b| {
        b.iter(|| {
            renderer
                .wrap_lines(&doc, &handle, black_box(PARAGRAPH), 12.0, 480.0)
                .unwrap()
        })
    });

    c.bench_function("render_text_truncated", |b| {
        let options = TextOptions::new(PARAGRAPH, 72.0, 700.0).with_max_width(300.0);
        b.iter(|| {
            let mut surface = ContentStreamBuilder::new();
            renderer.render_text(&mut surface, &doc, black_box(&options))
        })
    });

    c.bench_function("render_text_fallback", |b| {
        let options = TextOptions::new(VIETNAMESE, 72.0, 700.0).with_max_width(400.0);
        b.iter(|| {
            let mut surface = ContentStreamBuilder::new();
            renderer.render_text(&mut surface, &doc, black_box(&options))
        })
    });
}

// ============================================================================
// Template rendering
// ============================================================================

fn bench_render_template(c: &mut Criterion) {
    let template = worksheet(30);
    let renderer = TemplateRenderer::new(embedder(), LayoutConfig::default());

    c.bench_function("render_worksheet_30_questions", |b| {
        b.iter(|| renderer.render(black_box(&template), &template.sample_data).unwrap())
    });
}

criterion_group!(benches, bench_classification, bench_layout, bench_render_template);
criterion_main!(benches);

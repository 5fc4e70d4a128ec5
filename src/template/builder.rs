//! Schema builder: analysis result -> pages of schema items.
//!
//! Sections are grouped strictly in order. A header or title opens a group,
//! following `content` sections are appended to it, and anything else closes
//! the group and is emitted on its own. A group that never received content
//! is dropped. Questions follow the section blocks, one item each.
//!
//! Items are stacked top to bottom inside the page margins; an item that
//! would cross the bottom margin starts a new page. Names are slugs of the
//! item label, made unique per page with `_2`, `_3`, ... suffixes.

use super::types::{EducationalMeta, FieldType, Position, SchemaItem};
use crate::analysis::{AnalysisResult, ExtractedQuestion, Section, SectionRole};
use crate::config::{pt_to_mm, LayoutConfig};
use crate::fonts::glyphs::to_ascii_transliteration;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;

lazy_static! {
    static ref NON_SLUG: Regex = Regex::new(r"[^a-z0-9]+").unwrap();
}

/// Longest generated name, before a uniqueness suffix.
const MAX_SLUG_LEN: usize = 32;

/// Vertical padding added to every estimated item height, in mm.
const ITEM_PADDING_MM: f32 = 2.0;

/// Average glyph advance as a fraction of the font size, for height estimates.
const AVG_CHAR_WIDTH_EM: f32 = 0.55;

/// A text block produced by section grouping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextBlock {
    /// Label the item name is derived from
    pub label: String,
    /// Text content (header and body joined by line breaks)
    pub content: String,
}

/// Group sections into text blocks.
pub fn group_sections(sections: &[Section]) -> Vec<TextBlock> {
    let mut blocks = Vec::new();
    // (header text, body lines)
    let mut open: Option<(String, Vec<String>)> = None;

    let close = |open: &mut Option<(String, Vec<String>)>, blocks: &mut Vec<TextBlock>| {
        if let Some((header, body)) = open.take() {
            if body.is_empty() {
                log::debug!("Dropping group '{}' without content", header);
            } else {
                let mut content = header.clone();
                for line in body {
                    content.push('\n');
                    content.push_str(&line);
                }
                blocks.push(TextBlock { label: header, content });
            }
        }
    };

    for section in sections {
        let role = section.effective_role();
        match role {
            SectionRole::Header | SectionRole::Title => {
                close(&mut open, &mut blocks);
                open = Some((section.content.clone(), Vec::new()));
            },
            SectionRole::Content if open.is_some() => {
                if let Some((_, body)) = open.as_mut() {
                    body.push(section.content.clone());
                }
            },
            other => {
                close(&mut open, &mut blocks);
                blocks.push(TextBlock {
                    label: other.to_string(),
                    content: section.content.clone(),
                });
            },
        }
    }
    close(&mut open, &mut blocks);
    blocks
}

/// Identifier-safe slug of a label.
pub fn slugify(label: &str) -> String {
    let ascii = to_ascii_transliteration(label).to_ascii_lowercase();
    let slug = NON_SLUG.replace_all(&ascii, "_");
    let slug: String = slug.trim_matches('_').chars().take(MAX_SLUG_LEN).collect();
    let slug = slug.trim_end_matches('_');
    if slug.is_empty() {
        "field".to_string()
    } else {
        slug.to_string()
    }
}

/// Text drawn for a question: the question followed by lettered options.
pub fn question_display_text(content: &str, options: &[String]) -> String {
    let mut text = content.to_string();
    for (i, option) in options.iter().enumerate() {
        text.push('\n');
        text.push_str(&format!("{}. {}", option_letter(i), option));
    }
    text
}

/// `A`, `B`, ... `Z`, then `AA`, `AB`, ...
fn option_letter(index: usize) -> String {
    let mut n = index;
    let mut letters = Vec::new();
    loop {
        letters.push((b'A' + (n % 26) as u8) as char);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    letters.iter().rev().collect()
}

/// Builds page schemas from an analysis result.
#[derive(Debug, Clone, Default)]
pub struct SchemaBuilder {
    layout: LayoutConfig,
}

impl SchemaBuilder {
    /// Builder for the given page layout.
    pub fn new(layout: LayoutConfig) -> Self {
        Self { layout }
    }

    /// Page layout.
    pub fn layout(&self) -> &LayoutConfig {
        &self.layout
    }

    /// Build the ordered pages of schema items.
    pub fn build_schemas(&self, analysis: &AnalysisResult) -> Vec<Vec<SchemaItem>> {
        let mut stacker = PageStacker::new(&self.layout);

        for block in group_sections(&analysis.document_structure.sections) {
            let height = self.estimate_height(&block.content);
            let item = SchemaItem {
                field_type: Some(FieldType::Text),
                content: block.content,
                ..SchemaItem::default()
            };
            stacker.place(&block.label, item, height);
        }

        let difficulty = Some(analysis.document_structure.difficulty.clone()).filter(|d| !d.is_empty());
        for (index, question) in analysis.extracted_questions.iter().enumerate() {
            let label = if question.number.trim().is_empty() {
                format!("question_{}", index + 1)
            } else {
                format!("question_{}", question.number.trim())
            };
            let item = question_item(question, difficulty.clone());
            let height = self.estimate_height(&question_display_text(&item.content, &item.options));
            stacker.place(&label, item, height);
        }

        let pages = stacker.finish();
        log::debug!(
            "Built {} page(s) with {} item(s)",
            pages.len(),
            pages.iter().map(Vec::len).sum::<usize>()
        );
        pages
    }

    /// Height in mm for `text` at the default font size, wrapped to the
    /// content width with an average glyph width.
    pub fn estimate_height(&self, text: &str) -> f32 {
        let size_mm = pt_to_mm(self.layout.default_font_size);
        let char_mm = (size_mm * AVG_CHAR_WIDTH_EM).max(f32::EPSILON);
        let per_line = ((self.layout.content_width_mm() / char_mm).floor() as usize).max(1);

        let lines: usize = text
            .lines()
            .map(|line| line.chars().count().max(1).div_ceil(per_line))
            .sum::<usize>()
            .max(1);
        lines as f32 * size_mm * self.layout.line_height_multiplier + ITEM_PADDING_MM
    }
}

fn question_item(question: &ExtractedQuestion, difficulty: Option<String>) -> SchemaItem {
    SchemaItem {
        field_type: Some(FieldType::from_question_type(&question.question_type)),
        content: question.content.clone(),
        question: Some(question.content.clone()),
        options: question.options.clone(),
        educational: Some(EducationalMeta {
            question_type: Some(question.question_type.clone()).filter(|t| !t.is_empty()),
            correct_answer: question.correct_answer.clone(),
            points: question.points,
            difficulty,
        }),
        ..SchemaItem::default()
    }
}

/// Places items top to bottom and breaks pages.
struct PageStacker<'a> {
    layout: &'a LayoutConfig,
    pages: Vec<Vec<SchemaItem>>,
    cursor_mm: f32,
    used_names: HashSet<String>,
}

impl<'a> PageStacker<'a> {
    fn new(layout: &'a LayoutConfig) -> Self {
        Self {
            layout,
            pages: vec![Vec::new()],
            cursor_mm: layout.margin_mm,
            used_names: HashSet::new(),
        }
    }

    fn place(&mut self, label: &str, mut item: SchemaItem, height: f32) {
        let bottom = self.layout.page_height_mm - self.layout.margin_mm;
        let page_has_items = self.pages.last().is_some_and(|page| !page.is_empty());
        if page_has_items && self.cursor_mm + height > bottom {
            self.pages.push(Vec::new());
            self.cursor_mm = self.layout.margin_mm;
            self.used_names.clear();
        }

        item.name = Some(self.unique_name(label));
        item.position = Some(Position::new(self.layout.margin_mm, self.cursor_mm));
        item.width = Some(self.layout.content_width_mm());
        item.height = Some(height);
        self.cursor_mm += height + self.layout.item_gap_mm;

        if let Some(page) = self.pages.last_mut() {
            page.push(item);
        }
    }

    fn unique_name(&mut self, label: &str) -> String {
        let base = slugify(label);
        let mut candidate = base.clone();
        let mut n = 1;
        while self.used_names.contains(&candidate) {
            n += 1;
            candidate = format!("{}_{}", base, n);
        }
        self.used_names.insert(candidate.clone());
        candidate
    }

    fn finish(mut self) -> Vec<Vec<SchemaItem>> {
        self.pages.retain(|page| !page.is_empty());
        self.pages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::DocumentStructure;

    fn analysis(sections: Vec<Section>, questions: Vec<ExtractedQuestion>) -> AnalysisResult {
        AnalysisResult {
            document_structure: DocumentStructure {
                sections,
                ..DocumentStructure::default()
            },
            extracted_questions: questions,
            ..AnalysisResult::default()
        }
    }

    #[test]
    fn test_header_absorbs_following_content() {
        let blocks = group_sections(&[
            Section::new("header", "Math Quiz"),
            Section::new("content", "Answer all questions"),
            Section::new("content", "No calculators"),
        ]);
        assert_eq!(
            blocks,
            vec![TextBlock {
                label: "Math Quiz".to_string(),
                content: "Math Quiz\nAnswer all questions\nNo calculators".to_string(),
            }]
        );
    }

    #[test]
    fn test_other_roles_break_groups() {
        let blocks = group_sections(&[
            Section::new("header", "Part I"),
            Section::new("content", "Read carefully"),
            Section::new("instruction", "Use a pen"),
            Section::new("content", "Orphan paragraph"),
        ]);
        let labels: Vec<_> = blocks.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["Part I", "instruction", "content"]);
        assert_eq!(blocks[2].content, "Orphan paragraph");
    }

    #[test]
    fn test_empty_groups_are_dropped() {
        let blocks = group_sections(&[
            Section::new("header", "First"),
            Section::new("title", "Second"),
            Section::new("content", "Body"),
            Section::new("header", "Trailing"),
        ]);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].content, "Second\nBody");
    }

    #[test]
    fn test_type_used_when_role_missing() {
        let section = Section {
            section_type: Some("footer".to_string()),
            content: "Page 1".to_string(),
            ..Section::default()
        };
        let blocks = group_sections(&[section]);
        assert_eq!(blocks[0].label, "footer");
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Math Quiz"), "math_quiz");
        assert_eq!(slugify("Phần I: Trắc nghiệm"), "phan_i_trac_nghiem");
        assert_eq!(slugify("***"), "field");
        assert!(slugify(&"x".repeat(100)).len() <= MAX_SLUG_LEN);
    }

    #[test]
    fn test_option_letters() {
        assert_eq!(option_letter(0), "A");
        assert_eq!(option_letter(25), "Z");
        assert_eq!(option_letter(26), "AA");
        assert_eq!(
            question_display_text("2 + 2 = ?", &["3".to_string(), "4".to_string()]),
            "2 + 2 = ?\nA. 3\nB. 4"
        );
    }

    #[test]
    fn test_question_items_mirror_content() {
        let question = ExtractedQuestion {
            number: "1".to_string(),
            content: "2 + 2 = ?".to_string(),
            question_type: "multiple_choice".to_string(),
            options: vec!["3".to_string(), "4".to_string()],
            correct_answer: Some("4".to_string()),
            ..ExtractedQuestion::default()
        };
        let pages = SchemaBuilder::default().build_schemas(&analysis(vec![], vec![question]));
        let item = &pages[0][0];
        assert_eq!(item.name.as_deref(), Some("question_1"));
        assert_eq!(item.field_type, Some(FieldType::MultipleChoice));
        assert_eq!(item.question.as_deref(), Some("2 + 2 = ?"));
        assert_eq!(item.options.len(), 2);
        assert_eq!(
            item.educational.as_ref().and_then(|e| e.correct_answer.as_deref()),
            Some("4")
        );
    }

    #[test]
    fn test_duplicate_labels_get_suffixes() {
        let sections = vec![
            Section::new("instruction", "a"),
            Section::new("instruction", "b"),
            Section::new("instruction", "c"),
        ];
        let pages = SchemaBuilder::default().build_schemas(&analysis(sections, vec![]));
        let names: Vec<_> = pages[0].iter().map(|i| i.name.clone().unwrap()).collect();
        assert_eq!(names, vec!["instruction", "instruction_2", "instruction_3"]);
    }

    #[test]
    fn test_pagination_preserves_order() {
        let sections: Vec<_> = (0..60)
            .map(|i| Section::new("instruction", format!("Line {}", i)))
            .collect();
        let builder = SchemaBuilder::default();
        let pages = builder.build_schemas(&analysis(sections, vec![]));
        assert!(pages.len() > 1);

        let layout = builder.layout();
        let contents: Vec<_> = pages.iter().flatten().map(|i| i.content.clone()).collect();
        let expected: Vec<_> = (0..60).map(|i| format!("Line {}", i)).collect();
        assert_eq!(contents, expected);

        for page in &pages {
            assert_eq!(page[0].position.unwrap().y, layout.margin_mm);
            for item in page {
                let bottom = item.position.unwrap().y + item.height.unwrap();
                assert!(bottom <= layout.page_height_mm - layout.margin_mm + 1e-3);
            }
        }
    }

    #[test]
    fn test_empty_analysis_has_no_pages() {
        assert!(SchemaBuilder::default().build_schemas(&analysis(vec![], vec![])).is_empty());
    }
}

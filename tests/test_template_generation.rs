//! Integration tests for template generation and validation.
//!
//! Covers the full path from an analysis result to a validated template:
//! - Section grouping and question items
//! - Pagination order across pages
//! - Structural validation errors
//! - JSON round trips

use serde_json::{json, Value};
use template_oxide::analysis::AnalysisResult;
use template_oxide::config::EngineConfig;
use template_oxide::template::{
    FieldType, Position, SchemaBuilder, SchemaItem, SchemaValidator, Template, TemplateAssembler,
};

fn math_quiz() -> Value {
    json!({
        "documentStructure": {
            "type": "quiz",
            "subject": "Math",
            "difficulty": "easy",
            "sections": [
                {"id": "s1", "type": "text", "role": "header", "content": "Math Quiz", "confidence": 0.98},
                {"id": "s2", "type": "text", "role": "content", "content": "Answer all questions", "confidence": 0.95}
            ]
        },
        "extractedQuestions": [
            {
                "id": "q1",
                "number": 1,
                "content": "What is 7 x 8?",
                "type": "multiple_choice",
                "options": ["54", "56", "58", "64"],
                "correctAnswer": "56",
                "points": 2
            }
        ],
        "extractedContent": {"title": "Math Quiz"}
    })
}

fn item(name: &str, y: f32) -> SchemaItem {
    SchemaItem::new(name, FieldType::Text, Position::new(20.0, y), 100.0, 10.0).with_content(name)
}

fn template_with(items: Vec<SchemaItem>) -> Template {
    let mut template = TemplateAssembler::default()
        .create_from_value(&math_quiz())
        .unwrap()
        .template
        .unwrap();
    template.schemas = vec![items];
    template
}

#[test]
fn test_math_quiz_scenario() {
    let assembler = TemplateAssembler::new(&EngineConfig::default());
    let outcome = assembler.create_from_value(&math_quiz()).unwrap();
    assert!(outcome.success);
    assert!(outcome.errors.is_empty());

    let template = outcome.template.unwrap();
    assert_eq!(template.schemas.len(), 1);
    let page = &template.schemas[0];
    assert_eq!(page.len(), 2);

    let text_items: Vec<_> = page
        .iter()
        .filter(|i| i.field_type == Some(FieldType::Text))
        .collect();
    assert_eq!(text_items.len(), 1);
    assert_eq!(text_items[0].content, "Math Quiz\nAnswer all questions");

    let question = &page[1];
    assert!(question.field_type.as_ref().unwrap().is_question());
    assert_eq!(question.name.as_deref(), Some("question_1"));
    assert_eq!(question.options, vec!["54", "56", "58", "64"]);
    let meta = question.educational.as_ref().unwrap();
    assert_eq!(meta.correct_answer.as_deref(), Some("56"));

    let validation = assembler.validator().validate_template_structure(&template);
    assert!(validation.valid);
    assert!(validation.errors.is_empty());
}

#[test]
fn test_round_trip_stays_valid() {
    let template = TemplateAssembler::default()
        .create_from_value(&math_quiz())
        .unwrap()
        .template
        .unwrap();

    let json = template.to_json().unwrap();
    let restored = Template::from_json(&json).unwrap();
    assert_eq!(restored, template);

    let validation = SchemaValidator::default().validate_template_structure(&restored);
    assert!(validation.errors.is_empty(), "{:?}", validation.errors);
}

#[test]
fn test_wire_format_uses_camel_case() {
    let template = TemplateAssembler::default()
        .create_from_value(&math_quiz())
        .unwrap()
        .template
        .unwrap();
    let value: Value = serde_json::from_str(&template.to_json().unwrap()).unwrap();

    assert_eq!(value["basePdf"], "blank");
    assert_eq!(value["schemas"][0][1]["type"], "multiple_choice");
    assert!(value["metadata"]["createdAt"].is_string());
    assert_eq!(value["dataSchema"]["type"], "object");
    assert_eq!(value["sampleData"]["title"], "Math Quiz");
}

#[test]
fn test_missing_height_is_reported() {
    let mut broken = item("answer", 40.0);
    broken.height = None;
    let template = template_with(vec![item("title", 20.0), broken]);

    let result = SchemaValidator::default().validate_template_structure(&template);
    assert!(!result.valid);
    assert_eq!(result.errors, vec!["Page 0, item 1: missing required field 'height'"]);
}

#[test]
fn test_duplicate_names_report_each_item() {
    let template = template_with(vec![item("a", 20.0), item("b", 40.0), item("a", 60.0)]);

    let result = SchemaValidator::default().validate_template_structure(&template);
    assert!(!result.valid);
    assert_eq!(
        result.errors,
        vec![
            "Page 0, item 0: duplicate name 'a'",
            "Page 0, item 2: duplicate name 'a'",
        ]
    );
}

#[test]
fn test_same_name_on_different_pages_is_allowed() {
    let mut template = template_with(vec![item("a", 20.0)]);
    template.schemas.push(vec![item("a", 20.0)]);
    assert!(SchemaValidator::default().validate_template_structure(&template).valid);
}

#[test]
fn test_validation_is_idempotent() {
    let mut broken = item("a", 20.0);
    broken.width = Some(-5.0);
    broken.position = None;
    let template = template_with(vec![broken, item("a", 300.0)]);

    let validator = SchemaValidator::default();
    let first = validator.validate_template_structure(&template);
    let second = validator.validate_template_structure(&template);
    assert_eq!(first, second);
    assert!(!first.warnings.is_empty());
}

#[test]
fn test_data_validation() {
    let template = TemplateAssembler::default()
        .create_from_value(&math_quiz())
        .unwrap()
        .template
        .unwrap();
    let validator = SchemaValidator::default();

    assert!(validator.validate_data(&template, &json!({"title": "Quiz 2"})).valid);

    let wrong_type = validator.validate_data(&template, &json!({"title": 12}));
    assert!(!wrong_type.valid);
    assert_eq!(wrong_type.errors, vec!["Field 'title' should be string, got integer"]);

    let not_object = validator.validate_data(&template, &json!(["Quiz"]));
    assert_eq!(not_object.errors, vec!["Data must be of type object, got array"]);

    let extra = validator.validate_data(&template, &json!({"title": "x", "class": "5A"}));
    assert!(extra.valid);
    assert_eq!(extra.warnings.len(), 1);
}

#[test]
fn test_long_documents_paginate_in_order() {
    let questions: Vec<Value> = (1..=40)
        .map(|n| {
            json!({
                "id": format!("q{}", n),
                "number": n,
                "content": format!("Question number {} asks something fairly long", n),
                "type": "short_answer"
            })
        })
        .collect();
    let analysis = AnalysisResult::from_value(&json!({
        "documentStructure": {"sections": []},
        "extractedQuestions": questions
    }))
    .unwrap();

    let pages = SchemaBuilder::default().build_schemas(&analysis);
    assert!(pages.len() > 1);
    assert!(pages.iter().all(|page| !page.is_empty()));

    let names: Vec<String> = pages
        .iter()
        .flatten()
        .map(|i| i.name.clone().unwrap())
        .collect();
    let expected: Vec<String> = (1..=40).map(|n| format!("question_{}", n)).collect();
    assert_eq!(names, expected);

    let config = EngineConfig::default();
    for page in &pages {
        for item in page {
            let bottom = item.position.unwrap().y + item.height.unwrap();
            assert!(bottom <= config.layout.page_height_mm - config.layout.margin_mm + 0.01);
        }
    }
}

#[test]
fn test_malformed_analysis_is_rejected() {
    let assembler = TemplateAssembler::default();
    for input in [
        json!([]),
        json!({"extractedQuestions": []}),
        json!({"documentStructure": {}, "extractedQuestions": {}}),
        json!({"documentStructure": "exam", "extractedQuestions": []}),
    ] {
        assert!(assembler.create_from_value(&input).is_err(), "{}", input);
    }
}

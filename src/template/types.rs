//! Template data model.
//!
//! A [`Template`] is an ordered list of pages, each an ordered list of
//! [`SchemaItem`]s (insertion order is draw order), plus metadata,
//! internationalization settings, a declared data shape and sample data.
//!
//! The five geometric/identity attributes of a schema item are `Option`s on
//! purpose: hand-authored templates may omit them, and the validator reports
//! every absence instead of the decoder silently defaulting it.

use crate::render::TextAlign;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Position of an item's top-left corner in millimetres from the page's
/// top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    /// Distance from the left edge
    pub x: f32,
    /// Distance from the top edge
    pub y: f32,
}

impl Position {
    /// Create a position.
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Kind of a schema item.
///
/// Serialized as its snake_case tag; unrecognised tags are kept verbatim in
/// [`FieldType::Other`] so templates from newer producers still load.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldType {
    /// Plain text block
    Text,
    /// Image placeholder
    Image,
    /// Table placeholder
    Table,
    /// Generic question
    Question,
    /// Answer area
    Answer,
    /// Multiple-choice question
    MultipleChoice,
    /// True/false question
    TrueFalse,
    /// Fill-in-the-blank question
    FillBlank,
    /// Short-answer question
    ShortAnswer,
    /// Essay question
    Essay,
    /// Student name field
    StudentName,
    /// Student ID field
    StudentId,
    /// Score box
    Score,
    /// Any other tag
    Other(String),
}

impl FieldType {
    /// Serialized tag.
    pub fn as_str(&self) -> &str {
        match self {
            FieldType::Text => "text",
            FieldType::Image => "image",
            FieldType::Table => "table",
            FieldType::Question => "question",
            FieldType::Answer => "answer",
            FieldType::MultipleChoice => "multiple_choice",
            FieldType::TrueFalse => "true_false",
            FieldType::FillBlank => "fill_blank",
            FieldType::ShortAnswer => "short_answer",
            FieldType::Essay => "essay",
            FieldType::StudentName => "student_name",
            FieldType::StudentId => "student_id",
            FieldType::Score => "score",
            FieldType::Other(tag) => tag,
        }
    }

    /// Whether this is one of the question kinds.
    pub fn is_question(&self) -> bool {
        matches!(
            self,
            FieldType::Question
                | FieldType::MultipleChoice
                | FieldType::TrueFalse
                | FieldType::FillBlank
                | FieldType::ShortAnswer
                | FieldType::Essay
        )
    }

    /// Whether items of this kind are drawn as a frame with a caption.
    pub fn is_placeholder(&self) -> bool {
        matches!(self, FieldType::Image | FieldType::Table)
    }

    /// Field type for a question-type tag from analysis output.
    ///
    /// Accepts `multiple_choice`, `multiple-choice` and `multipleChoice`.
    pub fn from_question_type(tag: &str) -> Self {
        let normalized: String = tag
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "multiplechoice" => FieldType::MultipleChoice,
            "truefalse" => FieldType::TrueFalse,
            "fillblank" | "fillintheblank" => FieldType::FillBlank,
            "shortanswer" => FieldType::ShortAnswer,
            "essay" => FieldType::Essay,
            _ => FieldType::Question,
        }
    }
}

impl From<String> for FieldType {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "text" => FieldType::Text,
            "image" => FieldType::Image,
            "table" => FieldType::Table,
            "question" => FieldType::Question,
            "answer" => FieldType::Answer,
            "multiple_choice" => FieldType::MultipleChoice,
            "true_false" => FieldType::TrueFalse,
            "fill_blank" => FieldType::FillBlank,
            "short_answer" => FieldType::ShortAnswer,
            "essay" => FieldType::Essay,
            "student_name" => FieldType::StudentName,
            "student_id" => FieldType::StudentId,
            "score" => FieldType::Score,
            _ => FieldType::Other(tag),
        }
    }
}

impl From<FieldType> for String {
    fn from(field_type: FieldType) -> Self {
        match field_type {
            FieldType::Other(tag) => tag,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Educational metadata attached to question items.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EducationalMeta {
    /// Question type as reported by the analysis
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question_type: Option<String>,
    /// Expected answer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<String>,
    /// Points awarded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points: Option<f32>,
    /// Difficulty label
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
}

/// Rules checked against the value bound to an item.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ValidationRules {
    /// The bound value must be present and non-empty
    pub required: bool,
    /// Minimum length in characters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    /// Maximum length in characters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    /// Regular expression the value must match
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

/// One positioned, typed field on a page.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SchemaItem {
    /// Name, unique within its page
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Item kind
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub field_type: Option<FieldType>,
    /// Top-left corner in mm
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    /// Width in mm
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f32>,
    /// Height in mm
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f32>,
    /// Static text content
    pub content: String,
    /// Copy of `content` on question items
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    /// Answer options of a multiple-choice question
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    /// Dot path into the render data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub binding: Option<String>,
    /// Font size in points
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f32>,
    /// Text color as `#rrggbb`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_color: Option<String>,
    /// Preferred registry font
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_name: Option<String>,
    /// Text alignment
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alignment: Option<TextAlign>,
    /// Educational metadata
    #[serde(skip_serializing_if = "Option::is_none")]
    pub educational: Option<EducationalMeta>,
    /// Rules for the bound value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationRules>,
}

impl SchemaItem {
    /// Item with the five required attributes set.
    pub fn new(name: impl Into<String>, field_type: FieldType, position: Position, width: f32, height: f32) -> Self {
        Self {
            name: Some(name.into()),
            field_type: Some(field_type),
            position: Some(position),
            width: Some(width),
            height: Some(height),
            ..Self::default()
        }
    }

    /// Set static content.
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    /// Set the data binding path.
    pub fn with_binding(mut self, path: impl Into<String>) -> Self {
        self.binding = Some(path.into());
        self
    }

    /// Name or an empty string.
    pub fn name_or_default(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }
}

/// Template metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateMetadata {
    /// Author
    pub author: String,
    /// Version string
    pub version: String,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last update time
    pub updated_at: DateTime<Utc>,
}

impl TemplateMetadata {
    /// Metadata stamped with the current time.
    pub fn now(author: impl Into<String>, version: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            author: author.into(),
            version: version.into(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Font files for one language.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageFont {
    /// Font family name
    pub family: String,
    /// Regular-weight file path
    pub regular: String,
    /// Bold-weight file path
    pub bold: String,
    /// Unicode coverage (CSS unicode-range syntax)
    pub unicode_range: String,
}

/// Internationalization settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct I18nConfig {
    /// Supported language codes
    pub supported_languages: Vec<String>,
    /// Default language
    pub default_language: String,
    /// Language used for unsupported requests
    pub fallback_language: String,
    /// Per-language fonts
    pub fonts: IndexMap<String, LanguageFont>,
}

/// Primitive kinds of the declared data shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    /// JSON string
    String,
    /// Any JSON number
    Number,
    /// Number without fractional part
    Integer,
    /// JSON boolean
    Boolean,
    /// JSON array
    Array,
    /// JSON object
    Object,
    /// Anything, including null
    Any,
}

impl ShapeKind {
    /// Kind describing a JSON value.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::String(_) => ShapeKind::String,
            Value::Number(n) if n.is_i64() || n.is_u64() => ShapeKind::Integer,
            Value::Number(_) => ShapeKind::Number,
            Value::Bool(_) => ShapeKind::Boolean,
            Value::Array(_) => ShapeKind::Array,
            Value::Object(_) => ShapeKind::Object,
            Value::Null => ShapeKind::Any,
        }
    }

    /// Whether `value` agrees with this kind.
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            ShapeKind::String => value.is_string(),
            ShapeKind::Number => value.is_number(),
            ShapeKind::Integer => value.as_f64().is_some_and(|n| n.fract() == 0.0),
            ShapeKind::Boolean => value.is_boolean(),
            ShapeKind::Array => value.is_array(),
            ShapeKind::Object => value.is_object(),
            ShapeKind::Any => true,
        }
    }

    /// Lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ShapeKind::String => "string",
            ShapeKind::Number => "number",
            ShapeKind::Integer => "integer",
            ShapeKind::Boolean => "boolean",
            ShapeKind::Array => "array",
            ShapeKind::Object => "object",
            ShapeKind::Any => "any",
        }
    }
}

/// Declared shape of one property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyShape {
    /// Expected kind
    #[serde(rename = "type")]
    pub kind: ShapeKind,
    /// Free-form description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Nested properties of an object property (kept, not validated)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<IndexMap<String, PropertyShape>>,
}

impl PropertyShape {
    /// Property of the given kind.
    pub fn new(kind: ShapeKind) -> Self {
        Self {
            kind,
            description: None,
            properties: None,
        }
    }
}

/// JSON-Schema-like description of the render data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataShape {
    /// Always `object` for template data
    #[serde(rename = "type")]
    pub kind: ShapeKind,
    /// Declared top-level properties
    pub properties: IndexMap<String, PropertyShape>,
    /// Keys that must be present
    pub required: Vec<String>,
}

impl Default for DataShape {
    fn default() -> Self {
        Self {
            kind: ShapeKind::Object,
            properties: IndexMap::new(),
            required: Vec::new(),
        }
    }
}

impl DataShape {
    /// Shape inferred from a sample object: one property per top-level key,
    /// typed after the sample value. Null samples declare `any`.
    ///
    /// Typed properties rather than all-string ones, so `validate_data` can
    /// reject a number where the sample held text.
    pub fn infer(sample: &Value) -> Self {
        let properties = sample
            .as_object()
            .map(|object| {
                object
                    .iter()
                    .map(|(key, value)| (key.clone(), PropertyShape::new(ShapeKind::of(value))))
                    .collect()
            })
            .unwrap_or_default();
        Self {
            kind: ShapeKind::Object,
            properties,
            required: Vec::new(),
        }
    }
}

/// A renderable page layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    /// Unique identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Description
    #[serde(default)]
    pub description: String,
    /// Category (usually the analysed document type)
    #[serde(default)]
    pub category: String,
    /// Search tags
    #[serde(default)]
    pub tags: Vec<String>,
    /// Reference to the base document the schemas are drawn on
    #[serde(default = "default_base_pdf")]
    pub base_pdf: String,
    /// Pages of schema items
    #[serde(default)]
    pub schemas: Vec<Vec<SchemaItem>>,
    /// Metadata
    pub metadata: TemplateMetadata,
    /// Internationalization settings
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub i18n: Option<I18nConfig>,
    /// Declared data shape
    #[serde(default)]
    pub data_schema: DataShape,
    /// Sample data conforming to `data_schema`
    #[serde(default)]
    pub sample_data: Value,
}

/// Base document of generated templates: a blank page.
pub const BLANK_BASE_PDF: &str = "blank";

fn default_base_pdf() -> String {
    BLANK_BASE_PDF.to_string()
}

impl Template {
    /// Number of pages.
    pub fn page_count(&self) -> usize {
        self.schemas.len()
    }

    /// Number of schema items over all pages.
    pub fn item_count(&self) -> usize {
        self.schemas.iter().map(Vec::len).sum()
    }

    /// Decode a template from JSON text.
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Encode as pretty-printed JSON.
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_type_tags() {
        assert_eq!(FieldType::from("multiple_choice".to_string()), FieldType::MultipleChoice);
        assert_eq!(String::from(FieldType::StudentName), "student_name");
        assert_eq!(FieldType::from("signature".to_string()), FieldType::Other("signature".to_string()));
        assert_eq!(FieldType::from_question_type("multiple-choice"), FieldType::MultipleChoice);
        assert_eq!(FieldType::from_question_type("multipleChoice"), FieldType::MultipleChoice);
        assert_eq!(FieldType::from_question_type("matching"), FieldType::Question);
        assert!(FieldType::Essay.is_question());
        assert!(!FieldType::Text.is_question());
    }

    #[test]
    fn test_schema_item_missing_fields_decode_as_none() {
        let item: SchemaItem = serde_json::from_value(json!({
            "name": "title",
            "type": "text",
            "position": {"x": 20.0, "y": 20.0},
            "width": 170.0,
            "content": "Math Quiz"
        }))
        .unwrap();
        assert_eq!(item.height, None);
        assert_eq!(item.field_type, Some(FieldType::Text));
        assert_eq!(item.content, "Math Quiz");
    }

    #[test]
    fn test_schema_item_serializes_camel_case() {
        let mut item = SchemaItem::new("q1", FieldType::MultipleChoice, Position::new(1.0, 2.0), 3.0, 4.0);
        item.font_size = Some(12.0);
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["type"], "multiple_choice");
        assert_eq!(value["fontSize"], 12.0);
        assert!(value.get("binding").is_none());
        assert!(value.get("options").is_none());
    }

    #[test]
    fn test_shape_kinds() {
        assert!(ShapeKind::Integer.accepts(&json!(3)));
        assert!(ShapeKind::Integer.accepts(&json!(3.0)));
        assert!(!ShapeKind::Integer.accepts(&json!(3.5)));
        assert!(ShapeKind::Number.accepts(&json!(3.5)));
        assert!(!ShapeKind::String.accepts(&Value::Null));
        assert!(ShapeKind::Any.accepts(&Value::Null));
    }

    #[test]
    fn test_infer_data_shape() {
        let shape = DataShape::infer(&json!({"title": "Quiz", "author": null, "pages": 2}));
        let kinds: Vec<_> = shape.properties.iter().map(|(k, p)| (k.as_str(), p.kind)).collect();
        assert_eq!(
            kinds,
            vec![
                ("author", ShapeKind::Any),
                ("pages", ShapeKind::Integer),
                ("title", ShapeKind::String)
            ]
        );
    }
}

//! Document analysis input.
//!
//! The analysis collaborator returns a fixed-shape JSON object
//! (camelCase keys). [`AnalysisResult::from_value`] checks the two
//! properties everything downstream relies on before decoding:
//! `documentStructure` must be an object and `extractedQuestions` an array.

use crate::error::{Error, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// Semantic role of a section.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SectionRole {
    /// Section heading
    Header,
    /// Document title
    Title,
    /// Body text
    Content,
    /// Instructions to the reader
    Instruction,
    /// Any other role
    Other(String),
}

impl SectionRole {
    /// Role tag.
    pub fn as_str(&self) -> &str {
        match self {
            SectionRole::Header => "header",
            SectionRole::Title => "title",
            SectionRole::Content => "content",
            SectionRole::Instruction => "instruction",
            SectionRole::Other(tag) => tag,
        }
    }

    /// Whether a section with this role starts a group.
    pub fn starts_group(&self) -> bool {
        matches!(self, SectionRole::Header | SectionRole::Title)
    }
}

impl From<String> for SectionRole {
    fn from(tag: String) -> Self {
        match tag.to_ascii_lowercase().as_str() {
            "header" | "heading" => SectionRole::Header,
            "title" => SectionRole::Title,
            "content" => SectionRole::Content,
            "instruction" | "instructions" => SectionRole::Instruction,
            _ => SectionRole::Other(tag),
        }
    }
}

impl From<SectionRole> for String {
    fn from(role: SectionRole) -> Self {
        match role {
            SectionRole::Other(tag) => tag,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for SectionRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a section was found in the source document.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcePosition {
    /// Source page (1-based)
    pub page: u32,
    /// Left edge
    pub x: f32,
    /// Top edge
    pub y: f32,
    /// Width
    pub width: f32,
    /// Height
    pub height: f32,
}

/// One section of the analysed document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Section {
    /// Identifier
    pub id: String,
    /// Layout type reported by the analysis
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub section_type: Option<String>,
    /// Semantic role
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<SectionRole>,
    /// Text content
    pub content: String,
    /// Source position
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<SourcePosition>,
    /// Confidence in `0.0..=1.0`
    pub confidence: f32,
}

impl Section {
    /// Section with a role and content (tests and manual input).
    pub fn new(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: Some(SectionRole::from(role.to_string())),
            content: content.into(),
            ..Self::default()
        }
    }

    /// Role used for grouping: the semantic role, else the layout type.
    pub fn effective_role(&self) -> SectionRole {
        match (&self.role, &self.section_type) {
            (Some(role), _) => role.clone(),
            (None, Some(section_type)) => SectionRole::from(section_type.clone()),
            (None, None) => SectionRole::Other("section".to_string()),
        }
    }
}

/// Overall structure of the analysed document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DocumentStructure {
    /// Document type (`exam`, `worksheet`, ...)
    #[serde(rename = "type")]
    pub document_type: String,
    /// Subject
    pub subject: String,
    /// Difficulty
    pub difficulty: String,
    /// Sections in reading order
    pub sections: Vec<Section>,
}

/// A question found by the analysis.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExtractedQuestion {
    /// Identifier
    pub id: String,
    /// Display number (`1`, `2a`, ...)
    #[serde(deserialize_with = "string_or_number")]
    pub number: String,
    /// Question text
    pub content: String,
    /// Question type (`multiple_choice`, `short_answer`, ...)
    #[serde(rename = "type")]
    pub question_type: String,
    /// Answer options
    pub options: Vec<String>,
    /// Expected answer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<String>,
    /// Points awarded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points: Option<f32>,
    /// Confidence in `0.0..=1.0`
    pub confidence: f32,
}

/// Accept `"3"` as well as `3` for display numbers.
fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

/// Document-level content pulled out by the analysis.
///
/// Keys beyond the four known ones are preserved in order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractedContent {
    /// Title
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Subtitle
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    /// Author
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Instructions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    /// Other extracted values
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

/// Output of the document analysis collaborator.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// Document structure
    pub document_structure: DocumentStructure,
    /// Questions
    #[serde(default)]
    pub extracted_questions: Vec<ExtractedQuestion>,
    /// Document-level content
    #[serde(default)]
    pub extracted_content: ExtractedContent,
}

impl AnalysisResult {
    /// Check the input shape and decode.
    pub fn from_value(value: &Value) -> Result<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| Error::InvalidAnalysis("analysis result must be a JSON object".to_string()))?;

        match object.get("documentStructure") {
            Some(Value::Object(_)) => {},
            Some(_) => {
                return Err(Error::InvalidAnalysis("documentStructure must be an object".to_string()));
            },
            None => return Err(Error::InvalidAnalysis("missing documentStructure".to_string())),
        }
        if !object.get("extractedQuestions").is_some_and(Value::is_array) {
            return Err(Error::InvalidAnalysis("extractedQuestions must be an array".to_string()));
        }

        serde_json::from_value(value.clone()).map_err(|e| Error::InvalidAnalysis(e.to_string()))
    }

    /// Parse and check JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(&value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_analysis() {
        let analysis = AnalysisResult::from_value(&json!({
            "documentStructure": {
                "type": "exam",
                "subject": "math",
                "sections": [
                    {"id": "s1", "role": "header", "content": "Math Quiz", "confidence": 0.9},
                    {"id": "s2", "type": "paragraph", "content": "Body"}
                ]
            },
            "extractedQuestions": [
                {"id": "q1", "number": 1, "content": "2 + 2 = ?", "type": "multiple_choice",
                 "options": ["3", "4"], "correctAnswer": "4"}
            ],
            "extractedContent": {"title": "Math Quiz", "school": "THPT"}
        }))
        .unwrap();

        let sections = &analysis.document_structure.sections;
        assert_eq!(sections[0].effective_role(), SectionRole::Header);
        assert_eq!(sections[1].effective_role(), SectionRole::Other("paragraph".to_string()));
        assert_eq!(analysis.extracted_questions[0].number, "1");
        assert_eq!(analysis.extracted_questions[0].correct_answer.as_deref(), Some("4"));
        assert_eq!(analysis.extracted_content.extra["school"], "THPT");
    }

    #[test]
    fn test_missing_document_structure() {
        let err = AnalysisResult::from_value(&json!({"extractedQuestions": []})).unwrap_err();
        assert!(matches!(err, Error::InvalidAnalysis(msg) if msg.contains("documentStructure")));
    }

    #[test]
    fn test_non_array_questions() {
        for questions in [json!({}), json!("q"), Value::Null] {
            let err = AnalysisResult::from_value(&json!({
                "documentStructure": {"sections": []},
                "extractedQuestions": questions
            }))
            .unwrap_err();
            assert!(matches!(err, Error::InvalidAnalysis(msg) if msg.contains("extractedQuestions")));
        }
        assert!(AnalysisResult::from_value(&json!({"documentStructure": {}})).is_err());
    }

    #[test]
    fn test_role_aliases() {
        assert_eq!(SectionRole::from("Heading".to_string()), SectionRole::Header);
        assert!(SectionRole::Title.starts_group());
        assert!(!SectionRole::Content.starts_group());
        assert_eq!(String::from(SectionRole::Other("footer".to_string())), "footer");
    }
}

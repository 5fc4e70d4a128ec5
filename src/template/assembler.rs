//! Template assembler.
//!
//! Turns an analysis result into a complete [`Template`]: schemas from the
//! [`SchemaBuilder`], a fresh identifier, default metadata and i18n settings,
//! a data shape inferred from the extracted content and that content as
//! sample data. The result is self-validated before it is handed out; a
//! structurally invalid template is never reported as a success.

use super::builder::SchemaBuilder;
use super::types::{DataShape, I18nConfig, LanguageFont, Template, TemplateMetadata, BLANK_BASE_PDF};
use super::validator::SchemaValidator;
use crate::analysis::AnalysisResult;
use crate::config::{EngineConfig, TemplateDefaults};
use crate::error::Result;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Counts reported with an assembled template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateStats {
    /// Number of pages
    pub total_pages: usize,
    /// Number of schema items
    pub total_items: usize,
    /// Number of questions in the analysis
    pub total_questions: usize,
}

/// Result of assembling a template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssemblyOutcome {
    /// Whether a valid template was produced
    pub success: bool,
    /// The template, on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<Template>,
    /// Counts, on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<TemplateStats>,
    /// Structural errors, on failure
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub errors: Vec<String>,
    /// Structural warnings
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub warnings: Vec<String>,
}

/// Builds validated templates from analysis results.
#[derive(Debug, Clone, Default)]
pub struct TemplateAssembler {
    builder: SchemaBuilder,
    validator: SchemaValidator,
    defaults: TemplateDefaults,
}

impl TemplateAssembler {
    /// Assembler using the layout and template defaults of `config`.
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            builder: SchemaBuilder::new(config.layout.clone()),
            validator: SchemaValidator::new(config.layout.clone()),
            defaults: config.template.clone(),
        }
    }

    /// Validator used for the self-check.
    pub fn validator(&self) -> &SchemaValidator {
        &self.validator
    }

    /// Check the raw input shape, then assemble.
    ///
    /// Malformed input is an [`Error::InvalidAnalysis`](crate::Error::InvalidAnalysis);
    /// no template is built.
    pub fn create_from_value(&self, value: &Value) -> Result<AssemblyOutcome> {
        let analysis = AnalysisResult::from_value(value)?;
        Ok(self.create_from_analysis(&analysis))
    }

    /// Assemble and self-validate a template.
    pub fn create_from_analysis(&self, analysis: &AnalysisResult) -> AssemblyOutcome {
        let schemas = self.builder.build_schemas(analysis);
        let structure = &analysis.document_structure;
        let content = &analysis.extracted_content;

        let sample_data = serde_json::to_value(content).unwrap_or_else(|e| {
            log::warn!("Extracted content is not representable as JSON: {}", e);
            Value::Object(Default::default())
        });

        let name = [content.title.as_deref(), Some(structure.subject.as_str())]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|s| !s.is_empty())
            .unwrap_or("Untitled template")
            .to_string();
        let description = [content.subtitle.as_deref(), content.instructions.as_deref()]
            .into_iter()
            .flatten()
            .find(|s| !s.trim().is_empty())
            .unwrap_or_default()
            .to_string();
        let tags = [&structure.document_type, &structure.subject, &structure.difficulty]
            .into_iter()
            .filter(|t| !t.trim().is_empty())
            .cloned()
            .collect();

        let template = Template {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            description,
            category: structure.document_type.clone(),
            tags,
            base_pdf: BLANK_BASE_PDF.to_string(),
            schemas,
            metadata: TemplateMetadata::now(&self.defaults.author, &self.defaults.version),
            i18n: Some(self.default_i18n()),
            data_schema: DataShape::infer(&sample_data),
            sample_data,
        };

        let validation = self.validator.validate_template_structure(&template);
        if !validation.valid {
            log::warn!(
                "Assembled template '{}' failed validation with {} error(s)",
                template.name,
                validation.errors.len()
            );
            return AssemblyOutcome {
                success: false,
                template: None,
                stats: None,
                errors: validation.errors,
                warnings: validation.warnings,
            };
        }

        let stats = TemplateStats {
            total_pages: template.page_count(),
            total_items: template.item_count(),
            total_questions: analysis.extracted_questions.len(),
        };
        log::info!(
            "Assembled template '{}' ({}): {} page(s), {} item(s), {} question(s)",
            template.name,
            template.id,
            stats.total_pages,
            stats.total_items,
            stats.total_questions
        );

        AssemblyOutcome {
            success: true,
            template: Some(template),
            stats: Some(stats),
            errors: Vec::new(),
            warnings: validation.warnings,
        }
    }

    fn default_i18n(&self) -> I18nConfig {
        let d = &self.defaults;
        let mut fonts = IndexMap::new();
        fonts.insert(
            d.language.clone(),
            LanguageFont {
                family: d.font_family.clone(),
                regular: d.regular_font_path.clone(),
                bold: d.bold_font_path.clone(),
                unicode_range: d.unicode_range.clone(),
            },
        );
        I18nConfig {
            supported_languages: vec![d.language.clone()],
            default_language: d.language.clone(),
            fallback_language: d.fallback_language.clone(),
            fonts,
        }
    }
}

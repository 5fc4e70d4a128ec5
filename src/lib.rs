// Allow some clippy lints that are too pedantic for this project
#![allow(clippy::too_many_arguments)]
#![allow(clippy::enum_variant_names)]
#![allow(clippy::should_implement_trait)]
// Allow unused for tests
#![cfg_attr(test, allow(dead_code))]
#![cfg_attr(test, allow(unused_variables))]

//! # Template Oxide
//!
//! Layout templates from document analysis, rendered to PDF with
//! Unicode-aware font selection.
//!
//! ## Core Features
//!
//! ### Templates
//! - **Schema Generation**: groups analysed sections into labelled text blocks,
//!   turns extracted questions into question items, paginates onto A4 pages
//! - **Validation**: structural checks (required fields, geometry, unique
//!   names) and data checks against the template's declared data shape
//! - **Assembly**: complete templates with identifier, metadata, i18n settings
//!   and sample data, self-validated before they are returned
//! - **Persistence**: interchangeable stores (in-memory, JSON files)
//!
//! ### Rendering
//! - **Glyph Classification**: detects text needing extended (Vietnamese) glyphs
//! - **Font Resolution**: picks a registered font that covers the text
//! - **Font Embedding**: TrueType fonts embedded once per document as
//!   Identity-H Type0 fonts, with a bounded load time
//! - **Fallback Chain**: embedding failures fall back to a built-in font,
//!   drawing failures fall back to ASCII transliteration; drawing never fails
//! - **Text Layout**: alignment, ellipsis truncation and word wrapping from
//!   real font metrics
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use template_oxide::config::EngineConfig;
//! use template_oxide::fonts::{default_source, FontRegistry};
//! use template_oxide::render::{FontEmbedder, TemplateRenderer};
//! use template_oxide::template::TemplateAssembler;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = EngineConfig::default();
//! let analysis: serde_json::Value = serde_json::from_str(&std::fs::read_to_string("analysis.json")?)?;
//!
//! let outcome = TemplateAssembler::new(&config).create_from_value(&analysis)?;
//! let template = outcome.template.ok_or("template failed validation")?;
//!
//! let source = default_source(&config.fonts);
//! let registry = Arc::new(FontRegistry::with_defaults(source));
//! let embedder = Arc::new(FontEmbedder::new(registry, config.fonts.clone()));
//! let renderer = TemplateRenderer::new(embedder, config.layout.clone());
//!
//! let output = renderer.render(&template, &template.sample_data)?;
//! std::fs::write("template.pdf", &output.pdf)?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// Error handling
pub mod error;

// Configuration
pub mod config;

// Analysis input
pub mod analysis;

// Fonts
pub mod fonts;

// PDF objects and writing
pub mod object;
pub mod writer;

// Text layout and template rendering
pub mod render;

// Templates
pub mod template;

// Persistence
pub mod storage;

// Re-exports
pub use analysis::AnalysisResult;
pub use config::EngineConfig;
pub use error::{Error, Result};
pub use render::{FontEmbedder, TemplateRenderer, TextRenderer};
pub use storage::{FileTemplateStore, InMemoryTemplateStore, TemplateStore};
pub use template::{SchemaItem, Template, TemplateAssembler, ValidationResult};

// Version info
/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

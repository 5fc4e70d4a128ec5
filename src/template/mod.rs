//! Templates: data model, schema generation, validation and assembly.
//!
//! ```text
//! AnalysisResult
//!     ↓
//! [SchemaBuilder] (grouping, naming, pagination)
//!     ↓
//! [SchemaValidator] (self-check)
//!     ↓
//! [TemplateAssembler] → Template
//! ```

pub mod assembler;
pub mod binding;
pub mod builder;
pub mod types;
pub mod validator;

pub use assembler::{AssemblyOutcome, TemplateAssembler, TemplateStats};
pub use builder::{group_sections, slugify, SchemaBuilder, TextBlock};
pub use types::{
    DataShape, EducationalMeta, FieldType, I18nConfig, LanguageFont, Position, PropertyShape,
    SchemaItem, ShapeKind, Template, TemplateMetadata, ValidationRules,
};
pub use validator::{SchemaValidator, ValidationResult};

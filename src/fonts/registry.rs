//! Font registry.
//!
//! A fixed catalog of named font descriptors, built once by the process
//! entry point and shared read-only (usually behind an `Arc`). Standard
//! fonts are built into every PDF viewer and cover ASCII only; loadable
//! fonts carry full Vietnamese coverage and must be fetched and embedded.

use crate::error::Result;
use crate::fonts::source::{FontSource, SourceLoader};
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

/// Capability to produce the bytes of one font program.
pub trait FontLoader: Send + Sync {
    /// Load the raw TTF/OTF bytes.
    fn load(&self) -> Result<Vec<u8>>;
}

impl<F> FontLoader for F
where
    F: Fn() -> Result<Vec<u8>> + Send + Sync,
{
    fn load(&self) -> Result<Vec<u8>> {
        self()
    }
}

/// Built-in PDF standard fonts usable without embedding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StandardFontKind {
    /// Helvetica
    Helvetica,
    /// Helvetica-Bold
    HelveticaBold,
    /// Times-Roman
    TimesRoman,
    /// Courier
    Courier,
}

impl StandardFontKind {
    /// PostScript name used as `BaseFont`.
    pub fn base_font(&self) -> &'static str {
        match self {
            StandardFontKind::Helvetica => "Helvetica",
            StandardFontKind::HelveticaBold => "Helvetica-Bold",
            StandardFontKind::TimesRoman => "Times-Roman",
            StandardFontKind::Courier => "Courier",
        }
    }
}

/// How a registered font gets into a document.
#[derive(Clone)]
pub enum FontProgram {
    /// One of the standard 14 fonts, referenced by name only
    Standard(StandardFontKind),
    /// Font program fetched by a loader and embedded
    Loadable(Arc<dyn FontLoader>),
}

impl fmt::Debug for FontProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FontProgram::Standard(kind) => f.debug_tuple("Standard").field(kind).finish(),
            FontProgram::Loadable(_) => f.write_str("Loadable(..)"),
        }
    }
}

/// A named font in the registry.
#[derive(Debug, Clone)]
pub struct FontDescriptor {
    /// Registry key, e.g. `noto-sans`
    pub name: String,
    /// Human readable name, e.g. `Noto Sans`
    pub display_name: String,
    /// Whether the font covers the extended (Vietnamese) alphabet
    pub supports_extended: bool,
    /// Loader capability
    pub program: FontProgram,
    /// Whether the font is always embeddable and safe as a last resort
    pub is_safe_fallback: bool,
}

impl FontDescriptor {
    /// Descriptor for a built-in standard font (ASCII only, safe fallback).
    pub fn standard(name: &str, display_name: &str, kind: StandardFontKind) -> Self {
        Self {
            name: name.to_string(),
            display_name: display_name.to_string(),
            supports_extended: false,
            program: FontProgram::Standard(kind),
            is_safe_fallback: true,
        }
    }

    /// Descriptor for a loadable font with extended coverage.
    pub fn loadable(name: &str, display_name: &str, loader: Arc<dyn FontLoader>) -> Self {
        Self {
            name: name.to_string(),
            display_name: display_name.to_string(),
            supports_extended: true,
            program: FontProgram::Loadable(loader),
            is_safe_fallback: false,
        }
    }

    /// Standard font kind, if this is a built-in font.
    pub fn standard_kind(&self) -> Option<StandardFontKind> {
        match self.program {
            FontProgram::Standard(kind) => Some(kind),
            FontProgram::Loadable(_) => None,
        }
    }
}

/// Built-in fonts: (name, display name, kind).
const STANDARD_FONTS: &[(&str, &str, StandardFontKind)] = &[
    ("helvetica", "Helvetica", StandardFontKind::Helvetica),
    ("helvetica-bold", "Helvetica Bold", StandardFontKind::HelveticaBold),
    ("times-roman", "Times Roman", StandardFontKind::TimesRoman),
    ("courier", "Courier", StandardFontKind::Courier),
];

/// Extended-coverage families: (name, family).
const EXTENDED_FONTS: &[(&str, &str)] = &[
    ("noto-sans", "Noto Sans"),
    ("roboto", "Roboto"),
    ("open-sans", "Open Sans"),
    ("be-vietnam-pro", "Be Vietnam Pro"),
    ("noto-serif", "Noto Serif"),
];

/// Ordered catalog of font descriptors.
#[derive(Debug, Clone, Default)]
pub struct FontRegistry {
    fonts: IndexMap<String, FontDescriptor>,
}

impl FontRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The default catalog: four standard fonts and five extended-coverage
    /// families loaded from `source`.
    pub fn with_defaults(source: Arc<dyn FontSource>) -> Self {
        let mut registry = Self::new();
        for (name, display, kind) in STANDARD_FONTS {
            registry.register(FontDescriptor::standard(name, display, *kind));
        }
        for (name, family) in EXTENDED_FONTS {
            let loader = Arc::new(SourceLoader::new(Arc::clone(&source), *family));
            registry.register(FontDescriptor::loadable(name, family, loader));
        }
        registry
    }

    /// Add a descriptor. A descriptor with the same name is replaced in place.
    pub fn register(&mut self, descriptor: FontDescriptor) {
        self.fonts.insert(descriptor.name.clone(), descriptor);
    }

    /// Look up a descriptor by name.
    pub fn get(&self, name: &str) -> Option<&FontDescriptor> {
        self.fonts.get(name)
    }

    /// All descriptors in registration order.
    pub fn list_all(&self) -> Vec<&FontDescriptor> {
        self.fonts.values().collect()
    }

    /// Descriptors with extended coverage, in registration order.
    pub fn list_extended_coverage(&self) -> Vec<&FontDescriptor> {
        self.fonts.values().filter(|d| d.supports_extended).collect()
    }

    /// Number of registered fonts.
    pub fn len(&self) -> usize {
        self.fonts.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }
}

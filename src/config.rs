//! Engine configuration.
//!
//! All sections deserialize from JSON with every field defaulted, so a
//! config file only needs to name the values it overrides.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration for template generation and rendering.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Font sources, timeouts and fallback choices.
    pub fonts: FontConfig,
    /// Page geometry and text layout parameters.
    pub layout: LayoutConfig,
    /// Defaults stamped onto generated templates.
    pub template: TemplateDefaults,
}

impl EngineConfig {
    /// Create new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config = serde_json::from_str(&text)?;
        log::debug!("Loaded engine config from {}", path.as_ref().display());
        Ok(config)
    }

    /// Replace the font section.
    pub fn with_fonts(mut self, fonts: FontConfig) -> Self {
        self.fonts = fonts;
        self
    }

    /// Replace the layout section.
    pub fn with_layout(mut self, layout: LayoutConfig) -> Self {
        self.layout = layout;
        self
    }

    /// Replace the template defaults.
    pub fn with_template(mut self, template: TemplateDefaults) -> Self {
        self.template = template;
        self
    }
}

/// Font loading configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontConfig {
    /// Directory holding bundled TTF/OTF files
    pub font_dir: PathBuf,
    /// Base URL of a remote font mirror (used with the `remote-fonts` feature)
    pub remote_base_url: Option<String>,
    /// Upper bound for a single font load; `None` or 0 disables the bound
    pub load_timeout_ms: Option<u64>,
    /// Extended-coverage font used when the preferred font cannot draw the text
    pub default_extended_font: String,
    /// Built-in ASCII font used when everything else fails
    pub fallback_font: String,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            font_dir: PathBuf::from("fonts"),
            remote_base_url: None,
            load_timeout_ms: Some(5_000),
            default_extended_font: "noto-sans".to_string(),
            fallback_font: "helvetica".to_string(),
        }
    }
}

impl FontConfig {
    /// Set the bundled font directory.
    pub fn with_font_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.font_dir = dir.into();
        self
    }

    /// Set the remote font mirror.
    pub fn with_remote_base_url(mut self, url: impl Into<String>) -> Self {
        self.remote_base_url = Some(url.into());
        self
    }

    /// Set the font load timeout in milliseconds (0 disables it).
    pub fn with_load_timeout_ms(mut self, millis: u64) -> Self {
        self.load_timeout_ms = Some(millis);
        self
    }

    /// Timeout as a [`Duration`], if one is configured.
    pub fn load_timeout(&self) -> Option<Duration> {
        match self.load_timeout_ms {
            Some(0) | None => None,
            Some(ms) => Some(Duration::from_millis(ms)),
        }
    }
}

/// Page geometry and text layout parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Page width in millimetres
    pub page_width_mm: f32,
    /// Page height in millimetres
    pub page_height_mm: f32,
    /// Margin on every side in millimetres
    pub margin_mm: f32,
    /// Vertical gap between stacked schema items in millimetres
    pub item_gap_mm: f32,
    /// Font size used when an item carries none, in points
    pub default_font_size: f32,
    /// Multiplier applied to the font size to get the line advance
    pub line_height_multiplier: f32,
    /// Marker appended to truncated text
    pub ellipsis: String,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            page_width_mm: 210.0,
            page_height_mm: 297.0,
            margin_mm: 20.0,
            item_gap_mm: 4.0,
            default_font_size: 12.0,
            line_height_multiplier: 1.2,
            ellipsis: "...".to_string(),
        }
    }
}

/// Points per millimetre.
pub const PT_PER_MM: f32 = 72.0 / 25.4;

/// Convert millimetres to PDF points.
#[inline]
pub fn mm_to_pt(mm: f32) -> f32 {
    mm * PT_PER_MM
}

/// Convert PDF points to millimetres.
#[inline]
pub fn pt_to_mm(pt: f32) -> f32 {
    pt / PT_PER_MM
}

impl LayoutConfig {
    /// Page size in points.
    pub fn page_size_pt(&self) -> (f32, f32) {
        (mm_to_pt(self.page_width_mm), mm_to_pt(self.page_height_mm))
    }

    /// Usable width between the left and right margins.
    pub fn content_width_mm(&self) -> f32 {
        (self.page_width_mm - 2.0 * self.margin_mm).max(0.0)
    }

    /// Set the line height multiplier.
    pub fn with_line_height_multiplier(mut self, multiplier: f32) -> Self {
        self.line_height_multiplier = multiplier;
        self
    }

    /// Set the truncation marker.
    pub fn with_ellipsis(mut self, ellipsis: impl Into<String>) -> Self {
        self.ellipsis = ellipsis.into();
        self
    }
}

/// Defaults written into templates produced by the assembler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateDefaults {
    /// Author recorded in template metadata
    pub author: String,
    /// Template version string
    pub version: String,
    /// Default (and only generated) language code
    pub language: String,
    /// Language used when a requested language is unsupported
    pub fallback_language: String,
    /// Font family for the default language
    pub font_family: String,
    /// Regular-weight font file path
    pub regular_font_path: String,
    /// Bold-weight font file path
    pub bold_font_path: String,
    /// Unicode coverage of the language font (CSS unicode-range syntax)
    pub unicode_range: String,
}

impl Default for TemplateDefaults {
    fn default() -> Self {
        Self {
            author: "AI Template Generator".to_string(),
            version: "1.0.0".to_string(),
            language: "vi".to_string(),
            fallback_language: "en".to_string(),
            font_family: "Noto Sans".to_string(),
            regular_font_path: "fonts/NotoSans-Regular.ttf".to_string(),
            bold_font_path: "fonts/NotoSans-Bold.ttf".to_string(),
            unicode_range: "U+0000-00FF, U+0102-0103, U+0110-0111, U+0128-0129, U+0168-0169, \
                            U+01A0-01A1, U+01AF-01B0, U+1EA0-1EF9, U+20AB"
                .to_string(),
        }
    }
}

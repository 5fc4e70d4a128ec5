//! Error types for the template engine.
//!
//! This module defines the errors that can occur while ingesting analysis
//! results, resolving fonts, rendering templates and persisting them.
//! Validation problems are *not* errors: they are collected into a
//! [`ValidationResult`](crate::template::ValidationResult).

use crate::fonts::TrueTypeError;

/// Result type alias for template engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur in the template engine.
#[derive(Debug, thiserror::Error)]
#[allow(clippy::enum_variant_names)]
pub enum Error {
    /// The analysis result does not have the expected shape
    #[error("Invalid analysis result: {0}")]
    InvalidAnalysis(String),

    /// A template could not be decoded or is unusable for the requested operation
    #[error("Invalid template: {0}")]
    InvalidTemplate(String),

    /// Font name is not present in the registry
    #[error("Font not found: {0}")]
    FontNotFound(String),

    /// Font bytes could not be obtained or parsed
    #[error("Failed to load font '{font}': {reason}")]
    FontLoad {
        /// Registry name of the font
        font: String,
        /// Reason for the failure
        reason: String,
    },

    /// Font loading exceeded the configured timeout
    #[error("Loading font '{font}' timed out after {millis} ms")]
    FontTimeout {
        /// Registry name of the font
        font: String,
        /// Timeout that expired, in milliseconds
        millis: u64,
    },

    /// The font cannot draw a character of the requested text
    #[error("Font '{font}' has no glyph for {ch:?}")]
    UnsupportedGlyph {
        /// Name of the font used for drawing
        font: String,
        /// Offending character
        ch: char,
    },

    /// A data binding could not be resolved to drawable text
    #[error("Binding error: {0}")]
    Binding(String),

    /// Rendering of a schema item failed
    #[error("Render error: {0}")]
    Render(String),

    /// Template storage failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TrueType parsing error
    #[error("TrueType error: {0}")]
    TrueType(#[from] TrueTypeError),
}

impl Error {
    /// Whether this error belongs to the font fallback chain.
    ///
    /// Font errors are recovered locally by the renderer and only logged.
    pub fn is_font_error(&self) -> bool {
        matches!(
            self,
            Error::FontNotFound(_)
                | Error::FontLoad { .. }
                | Error::FontTimeout { .. }
                | Error::UnsupportedGlyph { .. }
                | Error::TrueType(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_analysis_error() {
        let err = Error::InvalidAnalysis("missing documentStructure".to_string());
        let msg = format!("{}", err);
        assert!(msg.contains("Invalid analysis result"));
        assert!(msg.contains("documentStructure"));
    }

    #[test]
    fn test_font_load_error() {
        let err = Error::FontLoad {
            font: "noto-sans".to_string(),
            reason: "connection refused".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("noto-sans"));
        assert!(msg.contains("connection refused"));
        assert!(err.is_font_error());
    }

    #[test]
    fn test_unsupported_glyph_error() {
        let err = Error::UnsupportedGlyph {
            font: "helvetica".to_string(),
            ch: 'à',
        };
        assert_eq!(format!("{}", err), "Font 'helvetica' has no glyph for 'à'");
    }

    #[test]
    fn test_storage_error_is_not_font_error() {
        assert!(!Error::Storage("disk full".to_string()).is_font_error());
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
    }
}

//! Font resolution and embedding.
//!
//! [`FontEmbedder`] answers two questions for the text renderer:
//!
//! 1. Which registry font should draw this text? ([`FontEmbedder::resolve_font_name`])
//! 2. Which resource in this document is that font? ([`FontEmbedder::embed`])
//!
//! Embedding is memoized per document and font name. The first request for a
//! name runs the descriptor's loader; concurrent requests for the same name
//! wait on that single load. A failed or timed-out load is logged and the
//! built-in fallback font is cached under the original name, so a broken font
//! is attempted at most once per document.

use crate::config::FontConfig;
use crate::error::{Error, Result};
use crate::fonts::glyphs::requires_extended_glyphs;
use crate::fonts::registry::{FontLoader, FontProgram, FontRegistry, StandardFontKind};
use crate::writer::{EmbeddedFont, EmbeddedFontHandle, PdfDocument};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Chooses fonts for text and embeds them into documents.
#[derive(Debug, Clone)]
pub struct FontEmbedder {
    registry: Arc<FontRegistry>,
    config: FontConfig,
}

impl FontEmbedder {
    /// Create an embedder over a shared registry.
    pub fn new(registry: Arc<FontRegistry>, config: FontConfig) -> Self {
        Self { registry, config }
    }

    /// The font registry.
    pub fn registry(&self) -> &FontRegistry {
        &self.registry
    }

    /// Font configuration.
    pub fn config(&self) -> &FontConfig {
        &self.config
    }

    /// Pick the registry font that should draw `text`.
    ///
    /// Text with extended letters gets `preferred` only when that font covers
    /// the extended alphabet, otherwise the default extended-coverage font.
    /// Plain ASCII text gets `preferred` when it is registered, otherwise the
    /// safe fallback font.
    pub fn resolve_font_name(&self, text: &str, preferred: Option<&str>) -> String {
        let preferred = preferred.and_then(|name| self.registry.get(name));

        if requires_extended_glyphs(text) {
            match preferred {
                Some(descriptor) if descriptor.supports_extended => descriptor.name.clone(),
                _ => self.default_extended_font(),
            }
        } else {
            match preferred {
                Some(descriptor) => descriptor.name.clone(),
                None => self.config.fallback_font.clone(),
            }
        }
    }

    /// The configured extended-coverage default, or the first registered
    /// extended font when the configured one is missing or ASCII-only.
    fn default_extended_font(&self) -> String {
        let configured = &self.config.default_extended_font;
        match self.registry.get(configured) {
            Some(descriptor) if descriptor.supports_extended => configured.clone(),
            _ => self
                .registry
                .list_extended_coverage()
                .first()
                .map(|d| d.name.clone())
                .unwrap_or_else(|| configured.clone()),
        }
    }

    /// Embed a font into `doc`, loading it on first use.
    ///
    /// Never fails: when the font cannot be loaded the handle of the built-in
    /// fallback font is returned (marked as a substitute) and remembered
    /// for the rest of the document's life.
    pub fn embed(&self, doc: &PdfDocument, font_name: &str) -> EmbeddedFontHandle {
        let cell = doc.font_cell(font_name);
        if let Some(handle) = cell.get() {
            log::debug!("Font cache hit: {} -> {}", font_name, handle.resource_id);
            return handle.clone();
        }

        cell.get_or_init(|| match self.try_embed(doc, font_name) {
            Ok(handle) => handle,
            Err(e) => {
                let fallback = self.builtin_fallback(doc);
                log::warn!(
                    "Font '{}' unavailable, substituting '{}': {}",
                    font_name,
                    fallback.font_name,
                    e
                );
                fallback.substitute_for(font_name)
            },
        })
        .clone()
    }

    /// Register the safe built-in fallback font in `doc`.
    ///
    /// Uses the configured fallback when it names a built-in font and
    /// Helvetica otherwise, so this never needs a loader.
    pub fn builtin_fallback(&self, doc: &PdfDocument) -> EmbeddedFontHandle {
        let name = &self.config.fallback_font;
        match self.registry.get(name).and_then(|d| d.standard_kind()) {
            Some(kind) => doc.add_standard_font(name, kind),
            None => doc.add_standard_font("helvetica", StandardFontKind::Helvetica),
        }
    }

    fn try_embed(&self, doc: &PdfDocument, font_name: &str) -> Result<EmbeddedFontHandle> {
        let descriptor = self
            .registry
            .get(font_name)
            .ok_or_else(|| Error::FontNotFound(font_name.to_string()))?;

        match &descriptor.program {
            FontProgram::Standard(kind) => Ok(doc.add_standard_font(font_name, *kind)),
            FontProgram::Loadable(loader) => {
                let data = self.load(font_name, Arc::clone(loader))?;
                let size = data.len();
                let font = EmbeddedFont::from_data(font_name, data)?;
                log::info!("Embedded font '{}' ({}, {} bytes)", font_name, font.base_name(), size);
                Ok(doc.add_embedded_font(font))
            },
        }
    }

    /// Run a loader, bounded by the configured timeout.
    fn load(&self, font_name: &str, loader: Arc<dyn FontLoader>) -> Result<Vec<u8>> {
        match self.config.load_timeout() {
            Some(timeout) => load_with_timeout(font_name, loader, timeout),
            None => loader.load(),
        }
    }
}

/// The loader runs on a helper thread. If it outlives the timeout the thread
/// is left to finish on its own and its result is discarded.
fn load_with_timeout(
    font_name: &str,
    loader: Arc<dyn FontLoader>,
    timeout: Duration,
) -> Result<Vec<u8>> {
    let (tx, rx) = mpsc::channel();
    thread::Builder::new()
        .name(format!("font-load-{}", font_name))
        .spawn(move || {
            // receiver may be gone after a timeout
            let _ = tx.send(loader.load());
        })
        .map_err(|e| Error::FontLoad {
            font: font_name.to_string(),
            reason: format!("cannot start loader thread: {}", e),
        })?;

    match rx.recv_timeout(timeout) {
        Ok(result) => result,
        Err(RecvTimeoutError::Timeout) => Err(Error::FontTimeout {
            font: font_name.to_string(),
            millis: timeout.as_millis() as u64,
        }),
        Err(RecvTimeoutError::Disconnected) => Err(Error::FontLoad {
            font: font_name.to_string(),
            reason: "loader exited without a result".to_string(),
        }),
    }
}

//! Font byte sources.
//!
//! A [`FontSource`] turns a font family name ("Noto Sans") into raw
//! embeddable TTF/OTF bytes, or reports that the family is unavailable.
//! Sources are interchangeable: a bundled directory, an in-memory table
//! (tests, preloaded assets) or, with the `remote-fonts` feature, an HTTP
//! mirror.

use crate::error::{Error, Result};
use crate::fonts::registry::FontLoader;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Provider of raw font program bytes by family name.
pub trait FontSource: Send + Sync {
    /// Fetch the regular-weight program of `family`.
    fn fetch(&self, family: &str) -> Result<Vec<u8>>;

    /// Short description used in log messages.
    fn describe(&self) -> String;
}

/// File stem conventionally used for a family: `"Be Vietnam Pro"` -> `BeVietnamPro`.
pub fn family_file_stem(family: &str) -> String {
    family.split_whitespace().collect()
}

/// Reads fonts from a directory of `<Family>-Regular.ttf` style files.
#[derive(Debug, Clone)]
pub struct DirectoryFontSource {
    root: PathBuf,
}

impl DirectoryFontSource {
    /// Create a source rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory this source reads from.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn candidates(&self, family: &str) -> Vec<PathBuf> {
        let stem = family_file_stem(family);
        ["-Regular.ttf", "-Regular.otf", ".ttf", ".otf"]
            .iter()
            .map(|suffix| self.root.join(format!("{}{}", stem, suffix)))
            .collect()
    }
}

impl FontSource for DirectoryFontSource {
    fn fetch(&self, family: &str) -> Result<Vec<u8>> {
        for path in self.candidates(family) {
            if path.is_file() {
                log::debug!("Reading font '{}' from {}", family, path.display());
                return Ok(std::fs::read(&path)?);
            }
        }
        Err(Error::FontLoad {
            font: family.to_string(),
            reason: format!("no font file in {}", self.root.display()),
        })
    }

    fn describe(&self) -> String {
        format!("directory {}", self.root.display())
    }
}

/// Font bytes held in memory, keyed by family name.
#[derive(Debug, Clone, Default)]
pub struct MemoryFontSource {
    fonts: HashMap<String, Arc<Vec<u8>>>,
}

impl MemoryFontSource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add font bytes for a family.
    pub fn with_font(mut self, family: impl Into<String>, data: Vec<u8>) -> Self {
        self.fonts.insert(family.into(), Arc::new(data));
        self
    }

    /// Whether the family is available.
    pub fn contains(&self, family: &str) -> bool {
        self.fonts.contains_key(family)
    }
}

impl FontSource for MemoryFontSource {
    fn fetch(&self, family: &str) -> Result<Vec<u8>> {
        self.fonts
            .get(family)
            .map(|data| data.as_ref().clone())
            .ok_or_else(|| Error::FontLoad {
                font: family.to_string(),
                reason: "not present in memory source".to_string(),
            })
    }

    fn describe(&self) -> String {
        format!("memory ({} fonts)", self.fonts.len())
    }
}

/// Tries each source in order and returns the first success.
pub struct ChainedFontSource {
    sources: Vec<Arc<dyn FontSource>>,
}

impl ChainedFontSource {
    /// Create a chain from sources in priority order.
    pub fn new(sources: Vec<Arc<dyn FontSource>>) -> Self {
        Self { sources }
    }
}

impl FontSource for ChainedFontSource {
    fn fetch(&self, family: &str) -> Result<Vec<u8>> {
        let mut reasons = Vec::new();
        for source in &self.sources {
            match source.fetch(family) {
                Ok(data) => return Ok(data),
                Err(e) => reasons.push(format!("{}: {}", source.describe(), e)),
            }
        }
        Err(Error::FontLoad {
            font: family.to_string(),
            reason: if reasons.is_empty() {
                "no font sources configured".to_string()
            } else {
                reasons.join("; ")
            },
        })
    }

    fn describe(&self) -> String {
        let parts: Vec<String> = self.sources.iter().map(|s| s.describe()).collect();
        format!("chain [{}]", parts.join(", "))
    }
}

/// Downloads fonts from an HTTP mirror laid out as `<base>/<Family>-Regular.ttf`.
#[cfg(feature = "remote-fonts")]
#[derive(Debug, Clone)]
pub struct RemoteFontSource {
    base_url: String,
    client: reqwest::blocking::Client,
}

#[cfg(feature = "remote-fonts")]
impl RemoteFontSource {
    /// Create a source for `base_url` with a per-request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Option<std::time::Duration>) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let mut builder = reqwest::blocking::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| Error::FontLoad {
            font: base_url.clone(),
            reason: format!("failed to create HTTP client: {}", e),
        })?;
        Ok(Self { base_url, client })
    }

    /// URL a family is fetched from.
    pub fn font_url(&self, family: &str) -> String {
        format!("{}/{}-Regular.ttf", self.base_url, family_file_stem(family))
    }
}

#[cfg(feature = "remote-fonts")]
impl FontSource for RemoteFontSource {
    fn fetch(&self, family: &str) -> Result<Vec<u8>> {
        let url = self.font_url(family);
        let load_error = |reason: String| Error::FontLoad {
            font: family.to_string(),
            reason,
        };

        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| load_error(format!("GET {}: {}", url, e)))?;
        let status = response.status();
        if !status.is_success() {
            return Err(load_error(format!("GET {} returned {}", url, status.as_u16())));
        }
        let bytes = response
            .bytes()
            .map_err(|e| load_error(format!("reading body of {}: {}", url, e)))?;
        Ok(bytes.to_vec())
    }

    fn describe(&self) -> String {
        format!("remote {}", self.base_url)
    }
}

/// [`FontLoader`] that fetches one family from a shared source.
pub struct SourceLoader {
    source: Arc<dyn FontSource>,
    family: String,
}

impl SourceLoader {
    /// Loader for `family` backed by `source`.
    pub fn new(source: Arc<dyn FontSource>, family: impl Into<String>) -> Self {
        Self {
            source,
            family: family.into(),
        }
    }
}

impl FontLoader for SourceLoader {
    fn load(&self) -> Result<Vec<u8>> {
        self.source.fetch(&self.family)
    }
}

/// Build the default source for a configuration: the bundled directory,
/// followed by the remote mirror when one is configured and the
/// `remote-fonts` feature is enabled.
pub fn default_source(config: &crate::config::FontConfig) -> Arc<dyn FontSource> {
    let mut sources: Vec<Arc<dyn FontSource>> =
        vec![Arc::new(DirectoryFontSource::new(config.font_dir.clone()))];
    sources.extend(remote_source(config));
    Arc::new(ChainedFontSource::new(sources))
}

#[cfg(feature = "remote-fonts")]
fn remote_source(config: &crate::config::FontConfig) -> Option<Arc<dyn FontSource>> {
    let url = config.remote_base_url.as_ref()?;
    match RemoteFontSource::new(url.clone(), config.load_timeout()) {
        Ok(remote) => Some(Arc::new(remote)),
        Err(e) => {
            log::warn!("Remote font source disabled: {}", e);
            None
        },
    }
}

#[cfg(not(feature = "remote-fonts"))]
fn remote_source(config: &crate::config::FontConfig) -> Option<Arc<dyn FontSource>> {
    if config.remote_base_url.is_some() {
        log::warn!("remote_base_url is set but the remote-fonts feature is disabled");
    }
    None
}

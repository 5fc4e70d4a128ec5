//! JSON file template store.
//!
//! Each template lives in `<dir>/<id>.json`. Writes go to a temporary file
//! that is then renamed over the target, and the in-memory index is only
//! updated once the file is in place: a failed write leaves both the file
//! and the index as they were.

use super::{lock, TemplateStore, TemplateSummary};
use crate::error::{Error, Result};
use crate::template::Template;
use indexmap::IndexMap;
use lazy_static::lazy_static;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

lazy_static! {
    static ref TEMPLATE_ID: Regex = Regex::new(r"^[A-Za-z0-9_-]+$").unwrap();
}

const EXTENSION: &str = "json";

/// Templates stored as JSON files in one directory.
#[derive(Debug)]
pub struct FileTemplateStore {
    dir: PathBuf,
    cache: Mutex<IndexMap<String, Template>>,
}

impl FileTemplateStore {
    /// Open (creating if needed) a store directory and index its templates.
    ///
    /// Files that do not decode as templates are skipped with a warning.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;

        let mut paths = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) == Some(EXTENSION) {
                paths.push(path);
            }
        }
        paths.sort();

        let mut cache = IndexMap::new();
        for path in paths {
            match read_template(&path) {
                Ok(template) => {
                    cache.insert(template.id.clone(), template);
                },
                Err(e) => log::warn!("Skipping {}: {}", path.display(), e),
            }
        }
        log::info!("Opened template store {} with {} template(s)", dir.display(), cache.len());

        Ok(Self {
            dir,
            cache: Mutex::new(cache),
        })
    }

    /// Store directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &str) -> Result<PathBuf> {
        if !TEMPLATE_ID.is_match(id) {
            return Err(Error::Storage(format!("invalid template id '{}'", id)));
        }
        Ok(self.dir.join(format!("{}.{}", id, EXTENSION)))
    }
}

fn read_template(path: &Path) -> Result<Template> {
    let json = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}

impl TemplateStore for FileTemplateStore {
    fn save(&self, template: &Template) -> Result<()> {
        let path = self.path_for(&template.id)?;
        let tmp = path.with_extension(format!("{}.tmp", EXTENSION));
        let json = serde_json::to_string_pretty(template)?;

        let mut cache = lock(&self.cache);
        if let Err(e) = fs::write(&tmp, json).and_then(|_| fs::rename(&tmp, &path)) {
            let _ = fs::remove_file(&tmp);
            return Err(Error::Storage(format!("failed to write {}: {}", path.display(), e)));
        }
        cache.insert(template.id.clone(), template.clone());
        log::info!("Saved template '{}' to {}", template.id, path.display());
        Ok(())
    }

    fn load(&self, id: &str) -> Result<Option<Template>> {
        Ok(lock(&self.cache).get(id).cloned())
    }

    fn list(&self) -> Result<Vec<TemplateSummary>> {
        Ok(lock(&self.cache).values().map(TemplateSummary::from).collect())
    }

    fn delete(&self, id: &str) -> Result<bool> {
        let path = self.path_for(id)?;
        let mut cache = lock(&self.cache);
        if !cache.contains_key(id) && !path.exists() {
            return Ok(false);
        }
        match fs::remove_file(&path) {
            Ok(()) => {},
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {},
            Err(e) => return Err(Error::Storage(format!("failed to delete {}: {}", path.display(), e))),
        }
        cache.shift_remove(id);
        log::info!("Deleted template '{}'", id);
        Ok(true)
    }
}

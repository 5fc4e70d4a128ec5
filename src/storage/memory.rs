//! In-memory template store.

use super::{lock, TemplateStore, TemplateSummary};
use crate::error::Result;
use crate::template::Template;
use indexmap::IndexMap;
use std::sync::Mutex;

/// Templates kept in a process-local map.
#[derive(Debug, Default)]
pub struct InMemoryTemplateStore {
    templates: Mutex<IndexMap<String, Template>>,
}

impl InMemoryTemplateStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored templates.
    pub fn len(&self) -> usize {
        lock(&self.templates).len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TemplateStore for InMemoryTemplateStore {
    fn save(&self, template: &Template) -> Result<()> {
        lock(&self.templates).insert(template.id.clone(), template.clone());
        log::info!("Stored template '{}' in memory", template.id);
        Ok(())
    }

    fn load(&self, id: &str) -> Result<Option<Template>> {
        Ok(lock(&self.templates).get(id).cloned())
    }

    fn list(&self) -> Result<Vec<TemplateSummary>> {
        Ok(lock(&self.templates).values().map(TemplateSummary::from).collect())
    }

    fn delete(&self, id: &str) -> Result<bool> {
        let removed = lock(&self.templates).shift_remove(id).is_some();
        if removed {
            log::info!("Deleted template '{}' from memory", id);
        }
        Ok(removed)
    }
}

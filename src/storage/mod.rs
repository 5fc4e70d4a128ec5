//! Template persistence.
//!
//! The engine only needs the five operations of [`TemplateStore`]; stores
//! are interchangeable. Two implementations ship with the crate:
//!
//! - [`InMemoryTemplateStore`]: process-local, for tests and short-lived tools
//! - [`FileTemplateStore`]: one pretty-printed JSON file per template

mod file;
mod memory;

pub use file::FileTemplateStore;
pub use memory::InMemoryTemplateStore;

use crate::error::Result;
use crate::template::Template;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Listing entry for a stored template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateSummary {
    /// Template identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Description
    pub description: String,
    /// Category
    pub category: String,
    /// Search tags
    pub tags: Vec<String>,
    /// Last update time
    pub updated_at: DateTime<Utc>,
    /// Number of pages
    pub pages: usize,
}

impl From<&Template> for TemplateSummary {
    fn from(template: &Template) -> Self {
        Self {
            id: template.id.clone(),
            name: template.name.clone(),
            description: template.description.clone(),
            category: template.category.clone(),
            tags: template.tags.clone(),
            updated_at: template.metadata.updated_at,
            pages: template.page_count(),
        }
    }
}

/// Persistence collaborator for templates.
///
/// `save` replaces any stored template with the same id.
pub trait TemplateStore: Send + Sync {
    /// Store a template.
    fn save(&self, template: &Template) -> Result<()>;

    /// Template with the given id, if stored.
    fn load(&self, id: &str) -> Result<Option<Template>>;

    /// Summaries of all stored templates, in insertion order.
    fn list(&self) -> Result<Vec<TemplateSummary>>;

    /// Remove a template. Returns whether it existed.
    fn delete(&self, id: &str) -> Result<bool>;

    /// Templates whose name, description, category or a tag contains
    /// `query`, ignoring case. An empty query matches everything.
    fn search(&self, query: &str) -> Result<Vec<TemplateSummary>> {
        Ok(self
            .list()?
            .into_iter()
            .filter(|summary| matches_query(summary, query))
            .collect())
    }
}

/// Case-insensitive substring match over the searchable fields.
pub fn matches_query(summary: &TemplateSummary, query: &str) -> bool {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return true;
    }
    [&summary.name, &summary.description, &summary.category]
        .into_iter()
        .chain(summary.tags.iter())
        .any(|field| field.to_lowercase().contains(&query))
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary() -> TemplateSummary {
        TemplateSummary {
            id: "a".to_string(),
            name: "Kiểm tra Toán".to_string(),
            description: "Weekly quiz".to_string(),
            category: "exam".to_string(),
            tags: vec!["grade-5".to_string()],
            updated_at: Utc::now(),
            pages: 1,
        }
    }

    #[test]
    fn test_matches_query() {
        let s = summary();
        assert!(matches_query(&s, "toán"));
        assert!(matches_query(&s, "WEEKLY"));
        assert!(matches_query(&s, "Exam"));
        assert!(matches_query(&s, "grade"));
        assert!(matches_query(&s, "  "));
        assert!(!matches_query(&s, "history"));
    }
}

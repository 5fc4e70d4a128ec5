//! Template and data validation.
//!
//! Validation never fails: every problem is collected into a
//! [`ValidationResult`] so all of them can be fixed in one pass. Errors make
//! the result invalid; warnings do not.

use super::binding;
use super::types::{SchemaItem, ShapeKind, Template};
use crate::config::LayoutConfig;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Outcome of a validation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// `true` when `errors` is empty
    pub valid: bool,
    /// Problems that make the input unusable, in discovery order
    pub errors: Vec<String>,
    /// Suspicious but acceptable findings
    pub warnings: Vec<String>,
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

impl ValidationResult {
    /// Empty, valid result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error.
    pub fn error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
        self.valid = false;
    }

    /// Record a warning.
    pub fn warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    /// Whether no errors were recorded.
    pub fn is_valid(&self) -> bool {
        self.valid
    }
}

/// Validates template structure and render data.
#[derive(Debug, Clone, Default)]
pub struct SchemaValidator {
    layout: LayoutConfig,
}

impl SchemaValidator {
    /// Validator that checks item bounds against `layout`'s page size.
    pub fn new(layout: LayoutConfig) -> Self {
        Self { layout }
    }

    /// Check the required attributes of every item and name uniqueness per
    /// page.
    ///
    /// Each missing attribute is one error naming the page index, item index
    /// and field. Every item whose name is shared with another item on the
    /// same page is one error.
    pub fn validate_template_structure(&self, template: &Template) -> ValidationResult {
        let mut result = ValidationResult::new();

        if template.schemas.is_empty() {
            result.warning("Template has no pages");
        }

        for (page_index, page) in template.schemas.iter().enumerate() {
            if page.is_empty() {
                result.warning(format!("Page {} has no items", page_index));
            }

            for (item_index, item) in page.iter().enumerate() {
                self.check_required(&mut result, page_index, item_index, item);
                self.check_bounds(&mut result, page_index, item_index, item);
            }

            let mut counts: HashMap<&str, usize> = HashMap::new();
            for item in page {
                if let Some(name) = item.name.as_deref().filter(|n| !n.trim().is_empty()) {
                    *counts.entry(name).or_default() += 1;
                }
            }
            for (item_index, item) in page.iter().enumerate() {
                if let Some(name) = item.name.as_deref() {
                    if counts.get(name).copied().unwrap_or(0) > 1 {
                        result.error(format!(
                            "Page {}, item {}: duplicate name '{}'",
                            page_index, item_index, name
                        ));
                    }
                }
            }
        }

        result
    }

    fn check_required(
        &self,
        result: &mut ValidationResult,
        page: usize,
        index: usize,
        item: &SchemaItem,
    ) {
        let missing = |result: &mut ValidationResult, field: &str| {
            result.error(format!("Page {}, item {}: missing required field '{}'", page, index, field));
        };

        if item.name.as_deref().map_or(true, |n| n.trim().is_empty()) {
            missing(result, "name");
        }
        if item.field_type.as_ref().map_or(true, |t| t.as_str().trim().is_empty()) {
            missing(result, "type");
        }
        match item.position {
            Some(p) if p.x.is_finite() && p.y.is_finite() => {},
            _ => missing(result, "position"),
        }
        for (field, value) in [("width", item.width), ("height", item.height)] {
            match value {
                None => missing(result, field),
                Some(v) if !(v.is_finite() && v > 0.0) => result.error(format!(
                    "Page {}, item {}: field '{}' must be a positive number, got {}",
                    page, index, field, v
                )),
                Some(_) => {},
            }
        }
    }

    fn check_bounds(&self, result: &mut ValidationResult, page: usize, index: usize, item: &SchemaItem) {
        let (Some(position), Some(width), Some(height)) = (item.position, item.width, item.height) else {
            return;
        };
        let outside = position.x < 0.0
            || position.y < 0.0
            || position.x + width > self.layout.page_width_mm
            || position.y + height > self.layout.page_height_mm;
        if outside {
            result.warning(format!(
                "Page {}, item {} ('{}') extends beyond the {}x{} mm page",
                page,
                index,
                item.name_or_default(),
                self.layout.page_width_mm,
                self.layout.page_height_mm
            ));
        }
    }

    /// Check render data against the template's declared data shape and
    /// the validation rules of bound items.
    ///
    /// Declared required keys must be present and declared properties must
    /// agree in primitive type. Extra keys are allowed (reported as
    /// warnings). Object properties are only checked to be objects; their
    /// own properties are not validated.
    pub fn validate_data(&self, template: &Template, data: &Value) -> ValidationResult {
        let mut result = ValidationResult::new();
        let shape = &template.data_schema;

        if !shape.kind.accepts(data) {
            result.error(format!(
                "Data must be of type {}, got {}",
                shape.kind.as_str(),
                describe(data)
            ));
            return result;
        }
        let Some(object) = data.as_object() else {
            return result;
        };

        for key in &shape.required {
            if !object.contains_key(key) {
                result.error(format!("Missing required field '{}'", key));
            }
        }

        for (key, property) in &shape.properties {
            if let Some(value) = object.get(key) {
                if !property.kind.accepts(value) {
                    result.error(format!(
                        "Field '{}' should be {}, got {}",
                        key,
                        property.kind.as_str(),
                        describe(value)
                    ));
                }
            }
        }

        for key in object.keys() {
            if !shape.properties.contains_key(key) {
                result.warning(format!("Field '{}' is not declared in the data schema", key));
            }
        }

        for (page_index, page) in template.schemas.iter().enumerate() {
            for (item_index, item) in page.iter().enumerate() {
                check_rules(&mut result, page_index, item_index, item, data);
            }
        }

        result
    }
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        other => ShapeKind::of(other).as_str(),
    }
}

/// Apply an item's validation rules to its bound value.
fn check_rules(result: &mut ValidationResult, page: usize, index: usize, item: &SchemaItem, data: &Value) {
    let (Some(rules), Some(path)) = (item.validation.as_ref(), item.binding.as_deref()) else {
        return;
    };
    let label = format!("Page {}, item {} ('{}')", page, index, item.name_or_default());

    let text = match binding::resolve(path, data).map(binding::value_to_text) {
        Some(Ok(text)) => text.unwrap_or_default(),
        Some(Err(e)) => {
            result.error(format!("{}: {}", label, e));
            return;
        },
        None => String::new(),
    };

    if text.is_empty() {
        if rules.required {
            result.error(format!("{}: value for '{}' is required", label, path));
        }
        return;
    }

    let length = text.chars().count();
    if let Some(min) = rules.min_length.filter(|min| length < *min) {
        result.error(format!("{}: value shorter than {} characters", label, min));
    }
    if let Some(max) = rules.max_length.filter(|max| length > *max) {
        result.error(format!("{}: value longer than {} characters", label, max));
    }
    if let Some(pattern) = rules.pattern.as_deref() {
        match Regex::new(pattern) {
            Ok(re) if !re.is_match(&text) => {
                result.error(format!("{}: value does not match pattern '{}'", label, pattern));
            },
            Ok(_) => {},
            Err(e) => result.error(format!("{}: invalid pattern '{}': {}", label, pattern, e)),
        }
    }
}

//! Data binding: dot paths into the render data.
//!
//! `student.name` walks object keys, `answers.0` indexes arrays. Scalars
//! bind as text; objects and arrays cannot be drawn and are a binding error.

use super::types::SchemaItem;
use crate::error::{Error, Result};
use serde_json::Value;

/// Follow a dot path through `data`.
///
/// Returns `None` for an empty path, a missing key, an out-of-range index
/// or a path that runs into a scalar.
pub fn resolve<'a>(path: &str, data: &'a Value) -> Option<&'a Value> {
    let path = path.trim();
    if path.is_empty() {
        return None;
    }
    path.split('.').try_fold(data, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Text form of a bound value. `Ok(None)` for null.
pub fn value_to_text(value: &Value) -> Result<Option<String>> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s.clone())),
        Value::Bool(b) => Ok(Some(b.to_string())),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Array(_) | Value::Object(_) => Err(Error::Binding(format!(
            "bound value is {} and cannot be drawn as text",
            if value.is_array() { "an array" } else { "an object" }
        ))),
    }
}

/// Text an item draws against `data`: the bound value when the binding
/// resolves to a non-null scalar, the static content otherwise.
pub fn item_text(item: &SchemaItem, data: &Value) -> Result<String> {
    let Some(path) = item.binding.as_deref() else {
        return Ok(item.content.clone());
    };
    match resolve(path, data) {
        Some(value) => {
            let text = value_to_text(value).map_err(|e| match e {
                Error::Binding(msg) => Error::Binding(format!("'{}': {}", path, msg)),
                other => other,
            })?;
            Ok(text.unwrap_or_else(|| item.content.clone()))
        },
        None => {
            log::debug!("Binding '{}' unresolved, using static content", path);
            Ok(item.content.clone())
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::types::{FieldType, Position};
    use serde_json::json;

    fn data() -> Value {
        json!({
            "student": {"name": "Nguyễn Văn A", "class": 10},
            "answers": ["B", "D"],
            "passed": true,
            "note": null
        })
    }

    #[test]
    fn test_resolve_paths() {
        let data = data();
        assert_eq!(resolve("student.name", &data), Some(&json!("Nguyễn Văn A")));
        assert_eq!(resolve("answers.1", &data), Some(&json!("D")));
        assert_eq!(resolve("answers.5", &data), None);
        assert_eq!(resolve("answers.x", &data), None);
        assert_eq!(resolve("student.name.first", &data), None);
        assert_eq!(resolve("", &data), None);
    }

    #[test]
    fn test_value_to_text() {
        assert_eq!(value_to_text(&json!(10)).unwrap().as_deref(), Some("10"));
        assert_eq!(value_to_text(&json!(true)).unwrap().as_deref(), Some("true"));
        assert_eq!(value_to_text(&Value::Null).unwrap(), None);
        assert!(value_to_text(&json!({"a": 1})).is_err());
    }

    #[test]
    fn test_item_text() {
        let item = SchemaItem::new("name", FieldType::StudentName, Position::default(), 50.0, 8.0)
            .with_content("Họ tên: ........");
        let data = data();

        assert_eq!(item_text(&item, &data).unwrap(), "Họ tên: ........");
        assert_eq!(item_text(&item.clone().with_binding("student.name"), &data).unwrap(), "Nguyễn Văn A");
        assert_eq!(item_text(&item.clone().with_binding("missing"), &data).unwrap(), "Họ tên: ........");
        assert_eq!(item_text(&item.clone().with_binding("note"), &data).unwrap(), "Họ tên: ........");

        let err = item_text(&item.with_binding("student"), &data).unwrap_err();
        assert!(err.to_string().contains("'student'"));
    }
}

//! Key-path flattening for the legacy generation contract.
//!
//! Nested objects are joined with `.` (`personal.fullName`); arrays and
//! scalars are kept as values.

use serde_json::{Map, Value};

use crate::models::resume::CanonicalResumeDocument;

pub type FlatDocument = Map<String, Value>;

pub fn flatten_value(value: &Value) -> FlatDocument {
    let mut out = Map::new();
    if let Value::Object(map) = value {
        flatten_into(&mut out, "", map);
    }
    out
}

fn flatten_into(out: &mut FlatDocument, prefix: &str, map: &Map<String, Value>) {
    for (key, value) in map {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match value {
            Value::Object(inner) => flatten_into(out, &path, inner),
            other => {
                out.insert(path, other.clone());
            }
        }
    }
}

/// Flattens the document and adds the `full_name` key the legacy service
/// uses to title its output.
pub fn flatten_document(doc: &CanonicalResumeDocument) -> FlatDocument {
    let value = serde_json::to_value(doc).unwrap_or_default();
    let mut flat = flatten_value(&value);
    flat.insert(
        "full_name".to_string(),
        Value::String(doc.display_name().to_string()),
    );
    flat
}

//! Schemaless JSON documents.

use entikv_core::{Collection, CollectionConfig, CoreError, CoreResult, KeyValueStore, Record};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

/// A JSON object with a string `"id"` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Primary key.
    pub id: String,
    /// Every other field.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Record for Document {
    type Id = String;
    const ID_FIELD: &'static str = "id";

    fn id(&self) -> &String {
        &self.id
    }
}

impl Document {
    /// Parses a document from JSON text.
    pub fn parse(json: &str) -> CoreResult<Self> {
        serde_json::from_str(json).map_err(|e| {
            CoreError::invalid_record(format!("expected a JSON object with a string \"id\": {e}"))
        })
    }
}

/// Renders a scalar field value as an index value.
///
/// Objects, arrays and nulls are not indexed.
pub fn index_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Opens a document collection with an index on each of `index_fields`.
pub fn open(
    store: Arc<dyn KeyValueStore>,
    config: CollectionConfig,
    index_fields: &[String],
) -> CoreResult<Collection<Document>> {
    let collection = Collection::new(store, config)?;
    for field in index_fields {
        let name = field.clone();
        collection.add_index(field.as_str(), move |doc: &Document| {
            doc.fields.get(&name).and_then(index_value)
        })?;
    }
    Ok(collection)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_splits_id_from_fields() {
        let doc = Document::parse(r#"{"id":"c1","plan":"pro","seats":3}"#).unwrap();
        assert_eq!(doc.id, "c1");
        assert_eq!(doc.fields["plan"], "pro");
        assert_eq!(
            serde_json::to_value(&doc).unwrap(),
            json!({"id": "c1", "plan": "pro", "seats": 3})
        );
    }

    #[test]
    fn parse_requires_string_id() {
        assert!(Document::parse(r#"{"plan":"pro"}"#).is_err());
        assert!(Document::parse(r#"{"id":7}"#).is_err());
        assert!(Document::parse("[1]").is_err());
    }

    #[test]
    fn only_scalars_are_indexed() {
        assert_eq!(index_value(&json!("s1")).as_deref(), Some("s1"));
        assert_eq!(index_value(&json!(42)).as_deref(), Some("42"));
        assert_eq!(index_value(&json!(true)).as_deref(), Some("true"));
        assert_eq!(index_value(&json!(null)), None);
        assert_eq!(index_value(&json!({"a": 1})), None);
    }
}

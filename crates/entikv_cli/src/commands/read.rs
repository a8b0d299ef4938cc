//! Read commands: `get` and `lookup`.

use crate::document::Document;
use entikv_core::{Collection, CoreError, CoreResult};
use serde_json::{json, Value};

/// Runs the get command.
///
/// Prints the document, or `null` if there is none.
pub async fn get(collection: &Collection<Document>, id: &str) -> CoreResult<Value> {
    let doc = collection.get(id).await?;
    serde_json::to_value(doc).map_err(|e| CoreError::invalid_record(e.to_string()))
}

/// Runs the lookup command.
pub async fn lookup(collection: &Collection<Document>, field: &str, value: &str) -> CoreResult<Value> {
    let index = collection.index_on(field).ok_or_else(|| {
        CoreError::invalid_config(format!("{field} is not indexed; pass --index {field}"))
    })?;

    let ids = index.get_ids(value).await?;
    let items = index.get_items(value).await?;
    Ok(json!({
        "field": field,
        "value": value,
        "ids": ids,
        "items": items,
    }))
}

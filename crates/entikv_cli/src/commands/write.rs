//! Write commands: `set`, `update`, `delete` and `persist`.

use crate::document::Document;
use entikv_core::{Collection, CoreError, CoreResult, Patch};
use serde_json::{json, Value};

fn to_json(doc: &Document) -> CoreResult<Value> {
    serde_json::to_value(doc).map_err(|e| CoreError::invalid_record(e.to_string()))
}

/// Runs the set command, with an expiry when `ex` is given.
pub async fn set(collection: &Collection<Document>, json: &str, ex: Option<u64>) -> CoreResult<Value> {
    let doc = Document::parse(json)?;
    match ex {
        Some(seconds) => to_json(collection.setex(&doc, seconds).await?),
        None => {
            collection.set(&doc).await?;
            to_json(&doc)
        }
    }
}

/// Runs the update command. `json` is an object of fields to overwrite.
pub async fn update(collection: &Collection<Document>, id: &str, json: &str) -> CoreResult<Value> {
    let fields: Value = serde_json::from_str(json)
        .map_err(|e| CoreError::invalid_record(format!("patch is not JSON: {e}")))?;
    let updated = collection.update(id, Patch::from_value(fields)?).await?;
    to_json(&updated)
}

/// Runs the delete command. `purge` also removes index entries.
pub async fn delete(collection: &Collection<Document>, id: &str, purge: bool) -> CoreResult<Value> {
    let deleted = if purge {
        collection.purge(id).await?
    } else {
        collection.delete(id).await?
    };
    Ok(json!({ "id": id, "deleted": deleted }))
}

/// Runs the persist command.
pub async fn persist(collection: &Collection<Document>, id: &str) -> CoreResult<Value> {
    let persisted = collection.persist(id).await?;
    Ok(json!({ "id": id, "persisted": persisted }))
}

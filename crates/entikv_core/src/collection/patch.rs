//! Partial record updates.

use crate::collection::Record;
use crate::error::{CoreError, CoreResult};
use serde::Serialize;
use serde_json::{Map, Value};

/// A set of top-level field overwrites.
///
/// Applying a patch is a shallow merge over the record's serialized form:
/// each named field is replaced wholesale, everything else is kept. The
/// primary key field is never overwritten.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Patch {
    fields: Map<String, Value>,
}

impl Patch {
    /// Creates an empty patch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field overwrite.
    #[must_use]
    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    /// Builds a patch from any value that serializes to a JSON object.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidRecord`] if the value is not an object.
    pub fn from_value(value: impl Serialize) -> CoreResult<Self> {
        match serde_json::to_value(value) {
            Ok(Value::Object(fields)) => Ok(Self { fields }),
            Ok(other) => Err(CoreError::invalid_record(format!(
                "patch must be an object, got {}",
                json_kind(&other)
            ))),
            Err(e) => Err(CoreError::invalid_record(e.to_string())),
        }
    }

    /// Returns true if the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns the number of fields in the patch.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns the overwrites.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Merges the patch into `current` and returns the result.
    pub(crate) fn apply<T: Record>(&self, current: &T) -> CoreResult<T> {
        let value =
            serde_json::to_value(current).map_err(|e| CoreError::invalid_record(e.to_string()))?;
        let mut record = match value {
            Value::Object(record) => record,
            other => {
                return Err(CoreError::invalid_record(format!(
                    "record must serialize to an object, got {}",
                    json_kind(&other)
                )))
            }
        };

        for (field, new_value) in &self.fields {
            if field == T::ID_FIELD {
                continue;
            }
            record.insert(field.clone(), new_value.clone());
        }

        serde_json::from_value(Value::Object(record))
            .map_err(|e| CoreError::invalid_record(format!("patched record is invalid: {e}")))
    }
}

impl From<Map<String, Value>> for Patch {
    fn from(fields: Map<String, Value>) -> Self {
        Self { fields }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

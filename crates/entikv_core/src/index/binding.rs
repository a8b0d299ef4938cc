//! Registered index definitions.

use crate::index::KeyPart;
use std::fmt;
use std::sync::Arc;

type Extractor<T> = dyn Fn(&T) -> Option<String> + Send + Sync;

/// An index registered on a collection: a field name plus the function that
/// reads that field's current value from a record.
pub(crate) struct IndexBinding<T> {
    field: String,
    extract: Arc<Extractor<T>>,
}

impl<T> IndexBinding<T> {
    pub(crate) fn new<K, F>(field: impl Into<String>, extract: F) -> Self
    where
        K: KeyPart,
        F: Fn(&T) -> Option<K> + Send + Sync + 'static,
    {
        Self {
            field: field.into(),
            extract: Arc::new(move |record: &T| extract(record).map(|v| v.to_key_part())),
        }
    }

    pub(crate) fn field(&self) -> &str {
        &self.field
    }

    /// Rendered index value for `record`, or `None` if the field is unset.
    pub(crate) fn value_of(&self, record: &T) -> Option<String> {
        (self.extract)(record)
    }
}

impl<T> Clone for IndexBinding<T> {
    fn clone(&self) -> Self {
        Self {
            field: self.field.clone(),
            extract: Arc::clone(&self.extract),
        }
    }
}

impl<T> fmt::Debug for IndexBinding<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexBinding")
            .field("field", &self.field)
            .finish_non_exhaustive()
    }
}

//! Secondary index lookups.

use crate::collection::{Collection, Record};
use crate::error::CoreResult;
use crate::index::KeyPart;
use std::fmt;
use tracing::debug;

/// Read-only handle to one indexed field of a collection.
///
/// Obtained from [`Collection::add_index`] or [`Collection::index_on`]. The
/// index is maintained by the collection's writes; this handle only reads
/// it.
pub struct SecondaryIndex<T: Record> {
    collection: Collection<T>,
    field: String,
}

impl<T: Record> Clone for SecondaryIndex<T> {
    fn clone(&self) -> Self {
        Self {
            collection: self.collection.clone(),
            field: self.field.clone(),
        }
    }
}

impl<T: Record> fmt::Debug for SecondaryIndex<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecondaryIndex")
            .field("prefix", &self.collection.prefix())
            .field("field", &self.field)
            .finish()
    }
}

impl<T: Record> SecondaryIndex<T> {
    pub(crate) fn new(collection: Collection<T>, field: String) -> Self {
        Self { collection, field }
    }

    /// Returns the indexed field name.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Returns the storage key of the set holding ids for `value`.
    pub fn set_key<V: KeyPart + ?Sized>(&self, value: &V) -> String {
        self.collection.index_key(&self.field, &value.to_key_part())
    }

    /// Returns the primary keys indexed under `value`, sorted.
    ///
    /// May include ids whose record has since been deleted.
    pub async fn get_ids<V: KeyPart + ?Sized>(&self, value: &V) -> CoreResult<Vec<String>> {
        let mut ids = self
            .collection
            .store()
            .smembers(&self.set_key(value))
            .await?;
        ids.sort_unstable();
        Ok(ids)
    }

    /// Returns the records indexed under `value`.
    ///
    /// Ids whose record no longer exists are skipped.
    ///
    /// # Errors
    ///
    /// Fails if any stored record cannot be decoded.
    pub async fn get_items<V: KeyPart + ?Sized>(&self, value: &V) -> CoreResult<Vec<T>> {
        let ids = self.get_ids(value).await?;
        let records = self.collection.get_many(&ids).await?;

        let found = records.len();
        let items: Vec<T> = records.into_iter().flatten().collect();
        if items.len() < found {
            debug!(
                field = %self.field,
                stale = found - items.len(),
                "index lists ids with no record"
            );
        }
        Ok(items)
    }
}

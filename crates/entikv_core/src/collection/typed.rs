//! Typed collection implementation.

use crate::collection::{Patch, Record};
use crate::config::CollectionConfig;
use crate::error::{CoreError, CoreResult};
use crate::index::{IndexBinding, KeyPart, SecondaryIndex};
use entikv_codec::{CipherCodec, CodecError, TokenCodec};
use entikv_storage::{KeyValueStore, Pipeline, SetOptions};
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// A typed collection of records stored in a key-value store.
///
/// Every record lives at `<prefix><id>` as a stored token: the record's JSON
/// text, or an encrypted token when the collection has key material. Indexes
/// are kept as sets of primary keys at `<prefix>idx_<field>:<value>`.
///
/// `Collection<T>` is a cheap handle: clones share the same store, codec and
/// index registrations, and may be used from many tasks at once.
///
/// # Consistency
///
/// The primary write and the index maintenance that follows it are separate
/// store round trips. A reader may observe the new record before the index
/// reflects it, and a failed pipeline leaves index drift behind. Index reads
/// tolerate drift by filtering ids whose record is gone.
///
/// # Example
///
/// ```rust
/// use entikv_core::{Collection, CollectionConfig, InMemoryStore, Patch, Record};
/// use serde::{Deserialize, Serialize};
/// use std::sync::Arc;
///
/// #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// #[serde(rename_all = "camelCase")]
/// struct Customer {
///     id: String,
///     stripe_customer_id: String,
/// }
///
/// impl Record for Customer {
///     type Id = String;
///     const ID_FIELD: &'static str = "id";
///     fn id(&self) -> &String {
///         &self.id
///     }
/// }
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let store = Arc::new(InMemoryStore::new());
/// let customers: Collection<Customer> =
///     Collection::new(store, CollectionConfig::new().prefix("customers")).unwrap();
/// let by_stripe = customers
///     .add_index("stripeCustomerId", |c: &Customer| Some(c.stripe_customer_id.clone()))
///     .unwrap();
///
/// let c1 = Customer { id: "c1".into(), stripe_customer_id: "s1".into() };
/// customers.set(&c1).await.unwrap();
/// assert_eq!(by_stripe.get_items("s1").await.unwrap(), vec![c1]);
///
/// customers.update("c1", Patch::new().set("stripeCustomerId", "s2")).await.unwrap();
/// assert!(by_stripe.get_items("s1").await.unwrap().is_empty());
/// # });
/// ```
pub struct Collection<T: Record> {
    inner: Arc<Inner<T>>,
}

struct Inner<T> {
    store: Arc<dyn KeyValueStore>,
    config: CollectionConfig,
    codec: TokenCodec,
    /// Registration lock. Writes clone the bindings out before awaiting.
    indexes: RwLock<Vec<IndexBinding<T>>>,
}

impl<T: Record> Clone for Collection<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Record> fmt::Debug for Collection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection")
            .field("prefix", &self.inner.config.prefix)
            .field("default_ttl", &self.inner.config.default_ttl)
            .field("encrypted", &self.inner.codec.is_encrypted())
            .field("indexes", &self.indexes())
            .finish()
    }
}

impl<T: Record> Collection<T> {
    /// Creates a collection over `store`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the default TTL is zero.
    pub fn new(store: Arc<dyn KeyValueStore>, config: CollectionConfig) -> CoreResult<Self> {
        if config.default_ttl == Some(0) {
            return Err(CoreError::invalid_config("default TTL must be at least one second"));
        }

        let codec = match &config.encryption {
            Some(secret) => TokenCodec::from(CipherCodec::new(secret.clone())),
            None => TokenCodec::Plain,
        };

        Ok(Self {
            inner: Arc::new(Inner {
                store,
                config,
                codec,
                indexes: RwLock::new(Vec::new()),
            }),
        })
    }

    /// Returns the key prefix.
    pub fn prefix(&self) -> &str {
        &self.inner.config.prefix
    }

    /// Returns the collection configuration.
    pub fn config(&self) -> &CollectionConfig {
        &self.inner.config
    }

    /// Returns the indexed field names in registration order.
    pub fn indexes(&self) -> Vec<String> {
        self.inner
            .indexes
            .read()
            .iter()
            .map(|binding| binding.field().to_owned())
            .collect()
    }

    /// Returns the storage key of the record with primary key `id`.
    pub fn key_for<I: KeyPart + ?Sized>(&self, id: &I) -> String {
        format!("{}{}", self.inner.config.prefix, id.to_key_part())
    }

    pub(crate) fn store(&self) -> &dyn KeyValueStore {
        self.inner.store.as_ref()
    }

    pub(crate) fn index_key(&self, field: &str, value: &str) -> String {
        format!("{}idx_{}:{}", self.inner.config.prefix, field, value)
    }

    /// Gets a record by primary key.
    ///
    /// Returns `None` if no record is stored under `id`.
    pub async fn get<I: KeyPart + ?Sized>(&self, id: &I) -> CoreResult<Option<T>> {
        let key = self.key_for(id);
        match self.inner.store.get(&key).await? {
            Some(token) => Ok(Some(self.inner.codec.decode(&token)?)),
            None => Ok(None),
        }
    }

    /// Gets many records in one round trip.
    ///
    /// The result is aligned with `ids`. Every position is decoded; if any
    /// token fails to decode, the first such error is returned.
    pub async fn get_many<I: KeyPart>(&self, ids: &[I]) -> CoreResult<Vec<Option<T>>> {
        let mut first_error = None;
        let records = self
            .try_get_many(ids)
            .await?
            .into_iter()
            .map(|outcome| {
                outcome.unwrap_or_else(|err| {
                    first_error.get_or_insert(err);
                    None
                })
            })
            .collect();

        match first_error {
            Some(err) => Err(err),
            None => Ok(records),
        }
    }

    /// Gets many records in one round trip, reporting decode failures per
    /// record.
    ///
    /// Store failures still fail the whole call.
    pub async fn try_get_many<I: KeyPart>(
        &self,
        ids: &[I],
    ) -> CoreResult<Vec<CoreResult<Option<T>>>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let keys: Vec<String> = ids.iter().map(|id| self.key_for(id)).collect();
        let tokens = self.inner.store.mget(&keys).await?;
        debug!(prefix = %self.prefix(), requested = keys.len(), "mget");

        Ok(tokens
            .into_iter()
            .map(|token| match token {
                Some(token) => self.inner.codec.decode(&token).map(Some).map_err(Into::into),
                None => Ok(None),
            })
            .collect())
    }

    /// Writes a record, keeping any TTL already on its key, and maintains
    /// its index memberships.
    ///
    /// On a collection with a default TTL this is [`setex`](Self::setex)
    /// with that TTL.
    pub async fn set(&self, record: &T) -> CoreResult<()> {
        self.write(record, None).await
    }

    /// Writes a record and checks that the value it replaced equals
    /// `expected`.
    ///
    /// The comparison is structural, over the records' serialized form.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ConcurrentUpdate`] if the replaced value differs
    /// from `expected` or was absent. The new record has been written by
    /// then, but index maintenance is skipped.
    pub async fn compare_and_set(&self, record: &T, expected: &T) -> CoreResult<()> {
        self.write(record, Some(expected)).await
    }

    async fn write(&self, record: &T, expected: Option<&T>) -> CoreResult<()> {
        if let Some(ttl) = self.inner.config.default_ttl {
            return self.setex(record, ttl).await.map(|_| ());
        }

        let key = self.key_for(record.id());
        let token = self.inner.codec.encode(record)?;
        let replaced = self
            .inner
            .store
            .set(&key, token, SetOptions::new().keep_ttl().get_previous())
            .await?;
        debug!(key = %key, replaced = replaced.is_some(), "record written");

        if let Some(expected) = expected {
            self.check_replaced(&key, replaced.as_deref(), expected)?;
        }

        let bindings = self.inner.indexes.read().clone();
        if bindings.is_empty() {
            return Ok(());
        }

        // A verified snapshot is the replaced record.
        let decoded;
        let previous = match expected {
            Some(expected) => Some(expected),
            None => {
                decoded = replaced.and_then(|token| self.decode_previous(&key, &token));
                decoded.as_ref()
            }
        };

        let id = record.id().to_key_part();
        let mut pipeline = Pipeline::new();
        for binding in &bindings {
            let new_value = binding.value_of(record);
            if let Some(value) = &new_value {
                pipeline.sadd(self.index_key(binding.field(), value), id.as_str());
            }
            if let Some(old_value) = previous.and_then(|prev| binding.value_of(prev)) {
                if new_value.as_ref() != Some(&old_value) {
                    pipeline.srem(self.index_key(binding.field(), &old_value), id.as_str());
                }
            }
        }

        if !pipeline.is_empty() {
            debug!(key = %key, commands = pipeline.len(), "index maintenance");
            self.inner.store.exec(pipeline).await?;
        }
        Ok(())
    }

    fn check_replaced(&self, key: &str, replaced: Option<&str>, expected: &T) -> CoreResult<()> {
        let Some(token) = replaced else {
            warn!(key = %key, "checked write replaced nothing");
            return Err(CoreError::ConcurrentUpdate { key: key.to_owned() });
        };

        let actual = self.inner.codec.decode_value(token)?;
        let expected = serde_json::to_value(expected)
            .map_err(|e| CoreError::from(CodecError::encode(e.to_string())))?;
        if actual != expected {
            warn!(key = %key, "checked write replaced an unexpected value");
            return Err(CoreError::ConcurrentUpdate { key: key.to_owned() });
        }
        Ok(())
    }

    fn decode_previous(&self, key: &str, token: &str) -> Option<T> {
        match self.inner.codec.decode(token) {
            Ok(previous) => Some(previous),
            Err(err) => {
                warn!(key = %key, error = %err, "previous value undecodable, skipping index removals");
                None
            }
        }
    }

    /// Writes a record that expires after `ttl_secs` seconds.
    ///
    /// The previous value is not inspected and no index maintenance runs.
    /// Returns `record` as given.
    ///
    /// # Errors
    ///
    /// Returns a configuration error, before writing anything, if the
    /// collection has indexes or `ttl_secs` is zero.
    pub async fn setex<'a>(&self, record: &'a T, ttl_secs: u64) -> CoreResult<&'a T> {
        if !self.inner.indexes.read().is_empty() {
            return Err(CoreError::invalid_config(
                "TTL writes are not allowed on a collection with indexes",
            ));
        }
        if ttl_secs == 0 {
            return Err(CoreError::invalid_config("TTL must be at least one second"));
        }

        let key = self.key_for(record.id());
        let token = self.inner.codec.encode(record)?;
        self.inner
            .store
            .set(&key, token, SetOptions::new().expire_in(ttl_secs))
            .await?;
        debug!(key = %key, ttl = ttl_secs, "record written with expiry");
        Ok(record)
    }

    /// Applies `patch` to the stored record and writes the result.
    ///
    /// See [`update_with`](Self::update_with).
    pub async fn update<I: KeyPart + ?Sized>(&self, id: &I, patch: Patch) -> CoreResult<T> {
        self.update_with(id, move |_| patch.clone()).await
    }

    /// Read-merge-write with optimistic concurrency.
    ///
    /// Reads the record, builds a patch from it with `patch`, merges the
    /// patch over the record (the primary key is kept) and writes the result
    /// with [`compare_and_set`](Self::compare_and_set) against the value
    /// read. A lost race restarts the whole cycle, so `patch` may be called
    /// more than once.
    ///
    /// Returns the record as written.
    ///
    /// # Errors
    ///
    /// - [`CoreError::NotFound`] if no record is stored under `id`
    /// - [`CoreError::UpdateConflict`] once the configured retries are spent
    pub async fn update_with<I, F>(&self, id: &I, mut patch: F) -> CoreResult<T>
    where
        I: KeyPart + ?Sized,
        F: FnMut(&T) -> Patch + Send,
    {
        let key = self.key_for(id);
        let attempts = self.inner.config.update_retries.saturating_add(1);

        for attempt in 1..=attempts {
            let current = self
                .get(id)
                .await?
                .ok_or_else(|| CoreError::NotFound { key: key.clone() })?;
            let next = patch(&current).apply(&current)?;

            match self.compare_and_set(&next, &current).await {
                Ok(()) => return Ok(next),
                Err(err) if err.is_concurrent_update() => {
                    if attempt < attempts {
                        debug!(key = %key, attempt, "update lost a race, retrying");
                        tokio::time::sleep(self.inner.config.update_backoff).await;
                    }
                }
                Err(err) => return Err(err),
            }
        }

        warn!(key = %key, attempts, "update abandoned");
        Err(CoreError::UpdateConflict { key, attempts })
    }

    /// Removes the TTL from a record. Returns true if one was removed.
    pub async fn persist<I: KeyPart + ?Sized>(&self, id: &I) -> CoreResult<bool> {
        Ok(self.inner.store.persist(&self.key_for(id)).await?)
    }

    /// Sets a TTL on an existing record. Returns false if it is missing.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the collection has indexes or
    /// `seconds` is zero.
    pub async fn expire<I: KeyPart + ?Sized>(&self, id: &I, seconds: u64) -> CoreResult<bool> {
        if !self.inner.indexes.read().is_empty() {
            return Err(CoreError::invalid_config(
                "TTL writes are not allowed on a collection with indexes",
            ));
        }
        if seconds == 0 {
            return Err(CoreError::invalid_config("TTL must be at least one second"));
        }
        Ok(self.inner.store.expire(&self.key_for(id), seconds).await?)
    }

    /// Returns the remaining TTL of a record in seconds.
    pub async fn ttl<I: KeyPart + ?Sized>(&self, id: &I) -> CoreResult<Option<u64>> {
        Ok(self.inner.store.ttl(&self.key_for(id)).await?)
    }

    /// Returns true if a record is stored under `id`.
    pub async fn exists<I: KeyPart + ?Sized>(&self, id: &I) -> CoreResult<bool> {
        Ok(self.inner.store.exists(&self.key_for(id)).await?)
    }

    /// Deletes a record. Returns true if it existed.
    ///
    /// Index memberships are left in place; index reads skip ids whose
    /// record is gone. Use [`purge`](Self::purge) to clean them up.
    pub async fn delete<I: KeyPart + ?Sized>(&self, id: &I) -> CoreResult<bool> {
        let key = self.key_for(id);
        let existed = self.inner.store.del(&key).await?;
        debug!(key = %key, existed, "record deleted");
        Ok(existed)
    }

    /// Deletes a record together with its index memberships.
    ///
    /// Returns true if the record existed. A stored value that no longer
    /// decodes is still deleted, but its index memberships are left behind.
    pub async fn purge<I: KeyPart + ?Sized>(&self, id: &I) -> CoreResult<bool> {
        let key = self.key_for(id);
        let Some(token) = self.inner.store.get(&key).await? else {
            return Ok(false);
        };
        self.inner.store.del(&key).await?;

        let bindings = self.inner.indexes.read().clone();
        if bindings.is_empty() {
            debug!(key = %key, "record purged");
            return Ok(true);
        }
        let Some(record) = self.decode_previous(&key, &token) else {
            return Ok(true);
        };

        let member = record.id().to_key_part();
        let mut pipeline = Pipeline::new();
        for binding in &bindings {
            if let Some(value) = binding.value_of(&record) {
                pipeline.srem(self.index_key(binding.field(), &value), member.as_str());
            }
        }
        if !pipeline.is_empty() {
            self.inner.store.exec(pipeline).await?;
        }

        debug!(key = %key, "record purged");
        Ok(true)
    }

    /// Registers an index on `field` and returns a handle to query it.
    ///
    /// `extract` reads the field's value from a record; `None` leaves the
    /// record out of the index. Records already stored are not backfilled,
    /// so register indexes before writing.
    ///
    /// # Errors
    ///
    /// Returns a configuration error, without registering anything, if the
    /// collection has a default TTL or `field` is already indexed.
    pub fn add_index<K, F>(&self, field: impl Into<String>, extract: F) -> CoreResult<SecondaryIndex<T>>
    where
        K: KeyPart,
        F: Fn(&T) -> Option<K> + Send + Sync + 'static,
    {
        let field = field.into();
        if self.inner.config.default_ttl.is_some() {
            return Err(CoreError::invalid_config(format!(
                "cannot index {field}: collection has a default TTL"
            )));
        }

        let mut indexes = self.inner.indexes.write();
        if indexes.iter().any(|binding| binding.field() == field) {
            return Err(CoreError::invalid_config(format!("{field} is already indexed")));
        }
        indexes.push(IndexBinding::new(field.clone(), extract));
        drop(indexes);

        debug!(prefix = %self.prefix(), field = %field, "index registered");
        Ok(SecondaryIndex::new(self.clone(), field))
    }

    /// Returns a handle to an already registered index.
    pub fn index_on(&self, field: &str) -> Option<SecondaryIndex<T>> {
        let registered = self
            .inner
            .indexes
            .read()
            .iter()
            .any(|binding| binding.field() == field);
        registered.then(|| SecondaryIndex::new(self.clone(), field.to_owned()))
    }
}

//! Test fixtures and store helpers.
//!
//! Provides record types, ready-made collections and a fault-injecting
//! store for exercising EntiKV against failure modes.

use async_trait::async_trait;
use entikv_core::{Collection, CollectionConfig, Record, SecondaryIndex};
use entikv_storage::{
    InMemoryStore, KeyValueStore, Pipeline, SetOptions, StorageError, StorageResult,
};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Key prefix of the customers fixture collection.
pub const CUSTOMERS_PREFIX: &str = "customers";

/// Indexed field of the customers fixture collection.
pub const STRIPE_FIELD: &str = "stripeCustomerId";

/// A customer record keyed by `id` and indexed by its Stripe id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    /// Primary key.
    pub id: String,
    /// External billing id.
    pub stripe_customer_id: String,
    /// Contact address, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Record for Customer {
    type Id = String;
    const ID_FIELD: &'static str = "id";

    fn id(&self) -> &String {
        &self.id
    }
}

/// Creates a customer without an email.
pub fn customer(id: &str, stripe_customer_id: &str) -> Customer {
    Customer {
        id: id.to_owned(),
        stripe_customer_id: stripe_customer_id.to_owned(),
        email: None,
    }
}

/// A numeric counter, used for concurrent update tests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counter {
    /// Primary key.
    pub id: u64,
    /// Current count.
    pub hits: i64,
}

impl Record for Counter {
    type Id = u64;
    const ID_FIELD: &'static str = "id";

    fn id(&self) -> &u64 {
        &self.id
    }
}

/// Builds the customers collection over `store` with its Stripe index.
pub fn customers(
    store: Arc<dyn KeyValueStore>,
    config: CollectionConfig,
) -> (Collection<Customer>, SecondaryIndex<Customer>) {
    let collection = Collection::new(store, config.prefix(CUSTOMERS_PREFIX))
        .expect("Failed to create customers collection");
    let index = collection
        .add_index(STRIPE_FIELD, |c: &Customer| Some(c.stripe_customer_id.clone()))
        .expect("Failed to register stripe index");
    (collection, index)
}

/// Builds the customers collection over a fresh in-memory store.
pub fn memory_customers() -> (
    Arc<InMemoryStore>,
    Collection<Customer>,
    SecondaryIndex<Customer>,
) {
    let store = Arc::new(InMemoryStore::new());
    let (collection, index) = customers(store.clone(), CollectionConfig::new());
    (store, collection, index)
}

/// Builds a counters collection with a short update backoff.
pub fn counters(store: Arc<dyn KeyValueStore>, retries: u32) -> Collection<Counter> {
    Collection::new(
        store,
        CollectionConfig::new()
            .prefix("counters:")
            .update_retries(retries)
            .update_backoff(Duration::from_millis(1)),
    )
    .expect("Failed to create counters collection")
}

/// A store that can be told to fail, and counts round trips.
///
/// Every trait call is one round trip. Injected failures surface as
/// [`StorageError::Connection`].
#[derive(Debug, Default)]
pub struct FaultyStore {
    inner: InMemoryStore,
    fail_pipelines: AtomicBool,
    fail_writes: AtomicBool,
    fail_reads: AtomicBool,
    round_trips: AtomicUsize,
}

impl FaultyStore {
    /// Creates a store that does not fail yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the wrapped store.
    pub fn inner(&self) -> &InMemoryStore {
        &self.inner
    }

    /// Makes pipeline execution fail (or succeed again).
    pub fn fail_pipelines(&self, fail: bool) {
        self.fail_pipelines.store(fail, Ordering::SeqCst);
    }

    /// Makes `set` fail (or succeed again).
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Makes `get`, `mget` and `smembers` fail (or succeed again).
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Returns the number of calls made so far.
    pub fn round_trips(&self) -> usize {
        self.round_trips.load(Ordering::SeqCst)
    }

    fn call(&self, fault: &AtomicBool) -> StorageResult<()> {
        self.round_trips.fetch_add(1, Ordering::SeqCst);
        if fault.load(Ordering::SeqCst) {
            Err(StorageError::Connection("injected fault".into()))
        } else {
            Ok(())
        }
    }

    fn count(&self) {
        self.round_trips.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl KeyValueStore for FaultyStore {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        self.call(&self.fail_reads)?;
        self.inner.get(key).await
    }

    async fn mget(&self, keys: &[String]) -> StorageResult<Vec<Option<String>>> {
        self.call(&self.fail_reads)?;
        self.inner.mget(keys).await
    }

    async fn set(
        &self,
        key: &str,
        value: String,
        options: SetOptions,
    ) -> StorageResult<Option<String>> {
        self.call(&self.fail_writes)?;
        self.inner.set(key, value, options).await
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        self.call(&self.fail_reads)?;
        self.inner.exists(key).await
    }

    async fn del(&self, key: &str) -> StorageResult<bool> {
        self.count();
        self.inner.del(key).await
    }

    async fn persist(&self, key: &str) -> StorageResult<bool> {
        self.count();
        self.inner.persist(key).await
    }

    async fn expire(&self, key: &str, seconds: u64) -> StorageResult<bool> {
        self.count();
        self.inner.expire(key, seconds).await
    }

    async fn ttl(&self, key: &str) -> StorageResult<Option<u64>> {
        self.count();
        self.inner.ttl(key).await
    }

    async fn smembers(&self, key: &str) -> StorageResult<Vec<String>> {
        self.call(&self.fail_reads)?;
        self.inner.smembers(key).await
    }

    async fn exec(&self, pipeline: Pipeline) -> StorageResult<()> {
        self.call(&self.fail_pipelines)?;
        self.inner.exec(pipeline).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn customer_serializes_camel_case() {
        let json = serde_json::to_string(&customer("c1", "s1")).unwrap();
        assert_eq!(json, r#"{"id":"c1","stripeCustomerId":"s1"}"#);
    }

    #[tokio::test]
    async fn faulty_store_counts_and_fails() {
        let store = FaultyStore::new();
        store.set("k", "v".into(), SetOptions::new()).await.unwrap();
        assert_eq!(store.round_trips(), 1);

        store.fail_reads(true);
        assert!(matches!(
            store.get("k").await,
            Err(StorageError::Connection(_))
        ));
        store.fail_reads(false);
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));
        assert_eq!(store.round_trips(), 3);
    }
}

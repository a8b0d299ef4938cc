//! In-memory key-value store for testing.

use crate::backend::{Expiry, KeyValueStore, SetOptions};
use crate::error::{StorageError, StorageResult};
use crate::pipeline::{Pipeline, PipelineCommand};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeSet, HashMap};
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone)]
enum StoredValue {
    Text(String),
    Set(BTreeSet<String>),
}

#[derive(Debug, Clone)]
struct Entry {
    value: StoredValue,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// An in-memory key-value store.
///
/// Mirrors the Redis semantics EntiKV depends on: string values, sets,
/// per-key TTLs with lazy expiry, get-and-set and ordered (non-atomic)
/// pipelines.
///
/// Expiry is measured with [`tokio::time::Instant`], so tests running with a
/// paused clock can advance time deterministically.
///
/// # Thread Safety
///
/// Every command takes the store lock once, which makes each command atomic.
///
/// # Example
///
/// ```rust
/// use entikv_storage::{InMemoryStore, KeyValueStore, SetOptions};
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let store = InMemoryStore::new();
/// store.set("greeting", "hello".into(), SetOptions::new()).await.unwrap();
/// assert_eq!(store.get("greeting").await.unwrap().as_deref(), Some("hello"));
/// # });
/// ```
#[derive(Debug, Default)]
pub struct InMemoryStore {
    entries: Mutex<HashMap<String, Entry>>,
}

impl InMemoryStore {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of live keys.
    #[must_use]
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .lock()
            .values()
            .filter(|entry| !entry.is_expired(now))
            .count()
    }

    /// Returns true if the store holds no live keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the raw string at `key`, bypassing type checks.
    ///
    /// Useful for asserting on stored tokens in tests.
    #[must_use]
    pub fn raw(&self, key: &str) -> Option<String> {
        let now = Instant::now();
        match self.entries.lock().get(key) {
            Some(entry) if !entry.is_expired(now) => match &entry.value {
                StoredValue::Text(text) => Some(text.clone()),
                StoredValue::Set(_) => None,
            },
            _ => None,
        }
    }

    /// Returns all live keys starting with `prefix`, sorted.
    #[must_use]
    pub fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        let now = Instant::now();
        let mut keys: Vec<String> = self
            .entries
            .lock()
            .iter()
            .filter(|(key, entry)| key.starts_with(prefix) && !entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        keys
    }

    /// Removes all keys.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    fn live<'a>(
        entries: &'a mut HashMap<String, Entry>,
        key: &str,
        now: Instant,
    ) -> Option<&'a mut Entry> {
        if entries.get(key).is_some_and(|entry| entry.is_expired(now)) {
            entries.remove(key);
        }
        entries.get_mut(key)
    }

    fn deadline(command: &'static str, now: Instant, seconds: u64) -> StorageResult<Instant> {
        now.checked_add(Duration::from_secs(seconds))
            .ok_or_else(|| StorageError::command(command, "invalid expire time"))
    }

    fn text_of(key: &str, entry: Option<&Entry>) -> StorageResult<Option<String>> {
        match entry.map(|entry| &entry.value) {
            None => Ok(None),
            Some(StoredValue::Text(text)) => Ok(Some(text.clone())),
            Some(StoredValue::Set(_)) => Err(StorageError::wrong_type(key, "string")),
        }
    }

    fn apply(
        entries: &mut HashMap<String, Entry>,
        command: PipelineCommand,
        now: Instant,
    ) -> StorageResult<()> {
        match command {
            PipelineCommand::SAdd { key, member } => {
                match Self::live(entries, &key, now) {
                    Some(Entry {
                        value: StoredValue::Set(members),
                        ..
                    }) => {
                        members.insert(member);
                    }
                    Some(_) => return Err(StorageError::wrong_type(key, "set")),
                    None => {
                        entries.insert(
                            key,
                            Entry {
                                value: StoredValue::Set(BTreeSet::from([member])),
                                expires_at: None,
                            },
                        );
                    }
                }
                Ok(())
            }
            PipelineCommand::SRem { key, member } => {
                let emptied = match Self::live(entries, &key, now) {
                    Some(Entry {
                        value: StoredValue::Set(members),
                        ..
                    }) => {
                        members.remove(&member);
                        members.is_empty()
                    }
                    Some(_) => return Err(StorageError::wrong_type(key, "set")),
                    None => false,
                };
                // Redis drops a set once its last member is removed.
                if emptied {
                    entries.remove(&key);
                }
                Ok(())
            }
        }
    }
}

#[async_trait]
impl KeyValueStore for InMemoryStore {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let mut entries = self.entries.lock();
        let entry = Self::live(&mut entries, key, Instant::now());
        Self::text_of(key, entry.as_deref())
    }

    async fn mget(&self, keys: &[String]) -> StorageResult<Vec<Option<String>>> {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        let mut values = Vec::with_capacity(keys.len());
        for key in keys {
            // MGET reports non-string keys as missing rather than failing.
            let value = match Self::live(&mut entries, key, now).map(|entry| &entry.value) {
                Some(StoredValue::Text(text)) => Some(text.clone()),
                _ => None,
            };
            values.push(value);
        }
        Ok(values)
    }

    async fn set(
        &self,
        key: &str,
        value: String,
        options: SetOptions,
    ) -> StorageResult<Option<String>> {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        let existing = Self::live(&mut entries, key, now).map(|entry| entry.clone());

        let previous = if options.get {
            Self::text_of(key, existing.as_ref())?
        } else {
            None
        };

        let expires_at = match options.expiry {
            Expiry::Default => None,
            Expiry::KeepTtl => existing.and_then(|entry| entry.expires_at),
            Expiry::Seconds(seconds) => Some(Self::deadline("SET", now, seconds)?),
        };

        entries.insert(
            key.to_string(),
            Entry {
                value: StoredValue::Text(value),
                expires_at,
            },
        );
        Ok(previous)
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        let mut entries = self.entries.lock();
        Ok(Self::live(&mut entries, key, Instant::now()).is_some())
    }

    async fn del(&self, key: &str) -> StorageResult<bool> {
        let mut entries = self.entries.lock();
        let existed = Self::live(&mut entries, key, Instant::now()).is_some();
        entries.remove(key);
        Ok(existed)
    }

    async fn persist(&self, key: &str) -> StorageResult<bool> {
        let mut entries = self.entries.lock();
        match Self::live(&mut entries, key, Instant::now()) {
            Some(entry) => Ok(entry.expires_at.take().is_some()),
            None => Ok(false),
        }
    }

    async fn expire(&self, key: &str, seconds: u64) -> StorageResult<bool> {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        match Self::live(&mut entries, key, now) {
            Some(entry) => {
                entry.expires_at = Some(Self::deadline("EXPIRE", now, seconds)?);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn ttl(&self, key: &str) -> StorageResult<Option<u64>> {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        Ok(Self::live(&mut entries, key, now)
            .and_then(|entry| entry.expires_at)
            .map(|at| {
                let remaining = at.saturating_duration_since(now).as_millis();
                // Round like Redis' TTL reply.
                ((remaining + 500) / 1000) as u64
            }))
    }

    async fn smembers(&self, key: &str) -> StorageResult<Vec<String>> {
        let mut entries = self.entries.lock();
        match Self::live(&mut entries, key, Instant::now()).map(|entry| &entry.value) {
            None => Ok(Vec::new()),
            Some(StoredValue::Set(members)) => Ok(members.iter().cloned().collect()),
            Some(StoredValue::Text(_)) => Err(StorageError::wrong_type(key, "set")),
        }
    }

    async fn exec(&self, pipeline: Pipeline) -> StorageResult<()> {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        let mut first_error = None;
        // Like a Redis pipeline, a failing command does not stop the rest.
        for command in pipeline.into_commands() {
            if let Err(err) = Self::apply(&mut entries, command, now) {
                first_error.get_or_insert(err);
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(value: &str) -> String {
        value.to_string()
    }

    #[tokio::test]
    async fn memory_new_is_empty() {
        let store = InMemoryStore::new();
        assert!(store.is_empty());
        assert_eq!(store.get("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn memory_set_returns_previous() {
        let store = InMemoryStore::new();
        let previous = store
            .set("k", text("v1"), SetOptions::new().get_previous())
            .await
            .unwrap();
        assert_eq!(previous, None);

        let previous = store
            .set("k", text("v2"), SetOptions::new().get_previous())
            .await
            .unwrap();
        assert_eq!(previous.as_deref(), Some("v1"));
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v2"));
    }

    #[tokio::test]
    async fn memory_set_without_get_returns_none() {
        let store = InMemoryStore::new();
        store.set("k", text("v1"), SetOptions::new()).await.unwrap();
        let previous = store.set("k", text("v2"), SetOptions::new()).await.unwrap();
        assert_eq!(previous, None);
    }

    #[tokio::test]
    async fn memory_mget_is_aligned() {
        let store = InMemoryStore::new();
        store.set("a", text("1"), SetOptions::new()).await.unwrap();
        store.set("c", text("3"), SetOptions::new()).await.unwrap();

        let keys = vec![text("a"), text("b"), text("c")];
        let values = store.mget(&keys).await.unwrap();
        assert_eq!(values, vec![Some(text("1")), None, Some(text("3"))]);

        assert!(store.mget(&[]).await.unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn memory_keep_ttl_preserves_expiry() {
        let store = InMemoryStore::new();
        store
            .set("k", text("v1"), SetOptions::new().expire_in(10))
            .await
            .unwrap();
        store
            .set("k", text("v2"), SetOptions::new().keep_ttl())
            .await
            .unwrap();
        assert_eq!(store.ttl("k").await.unwrap(), Some(10));

        tokio::time::advance(Duration::from_secs(11)).await;
        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn memory_plain_set_clears_expiry() {
        let store = InMemoryStore::new();
        store
            .set("k", text("v1"), SetOptions::new().expire_in(10))
            .await
            .unwrap();
        store.set("k", text("v2"), SetOptions::new()).await.unwrap();
        assert_eq!(store.ttl("k").await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn memory_persist_and_expire() {
        let store = InMemoryStore::new();
        store.set("k", text("v"), SetOptions::new()).await.unwrap();
        assert!(!store.persist("k").await.unwrap());

        assert!(store.expire("k", 5).await.unwrap());
        assert_eq!(store.ttl("k").await.unwrap(), Some(5));

        assert!(store.persist("k").await.unwrap());
        tokio::time::advance(Duration::from_secs(6)).await;
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));

        assert!(!store.expire("missing", 5).await.unwrap());
    }

    #[tokio::test]
    async fn memory_rejects_unrepresentable_expiry() {
        let store = InMemoryStore::new();
        let result = store
            .set("k", text("v"), SetOptions::new().expire_in(u64::MAX))
            .await;
        assert!(matches!(result, Err(StorageError::Command { command: "SET", .. })));
        assert!(store.is_empty());

        store.set("k", text("v"), SetOptions::new()).await.unwrap();
        let result = store.expire("k", u64::MAX).await;
        assert!(matches!(result, Err(StorageError::Command { command: "EXPIRE", .. })));
        assert_eq!(store.ttl("k").await.unwrap(), None);
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn memory_exists() {
        let store = InMemoryStore::new();
        assert!(!store.exists("k").await.unwrap());
        store.set("k", text("v"), SetOptions::new()).await.unwrap();
        assert!(store.exists("k").await.unwrap());

        let mut pipeline = Pipeline::new();
        pipeline.sadd("s", "m");
        store.exec(pipeline).await.unwrap();
        assert!(store.exists("s").await.unwrap());
    }

    #[tokio::test]
    async fn memory_del() {
        let store = InMemoryStore::new();
        store.set("k", text("v"), SetOptions::new()).await.unwrap();
        assert!(store.del("k").await.unwrap());
        assert!(!store.del("k").await.unwrap());
        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn memory_pipeline_sets() {
        let store = InMemoryStore::new();
        let mut pipeline = Pipeline::new();
        pipeline.sadd("s", "a").sadd("s", "b").sadd("s", "a");
        store.exec(pipeline).await.unwrap();
        assert_eq!(store.smembers("s").await.unwrap(), vec![text("a"), text("b")]);

        let mut pipeline = Pipeline::new();
        pipeline.srem("s", "a").srem("s", "b");
        store.exec(pipeline).await.unwrap();
        assert!(store.smembers("s").await.unwrap().is_empty());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn memory_wrong_type_is_reported() {
        let store = InMemoryStore::new();
        store.set("k", text("v"), SetOptions::new()).await.unwrap();

        let result = store.smembers("k").await;
        assert!(matches!(result, Err(StorageError::WrongType { .. })));

        let mut pipeline = Pipeline::new();
        pipeline.sadd("k", "m").sadd("other", "m");
        let result = store.exec(pipeline).await;
        assert!(matches!(result, Err(StorageError::WrongType { .. })));
        // Later commands still ran.
        assert_eq!(store.smembers("other").await.unwrap(), vec![text("m")]);
    }

    #[tokio::test]
    async fn memory_raw_and_prefix_listing() {
        let store = InMemoryStore::new();
        let id = uuid::Uuid::new_v4().to_string();
        store
            .set(&format!("users:{id}"), text("v"), SetOptions::new())
            .await
            .unwrap();
        store.set("other", text("x"), SetOptions::new()).await.unwrap();

        assert_eq!(store.raw(&format!("users:{id}")).as_deref(), Some("v"));
        assert_eq!(store.keys_with_prefix("users:"), vec![format!("users:{id}")]);

        store.clear();
        assert!(store.is_empty());
    }
}

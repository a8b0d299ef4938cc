//! Key-value store trait definition.

use crate::error::StorageResult;
use crate::pipeline::Pipeline;
use async_trait::async_trait;

/// Expiry handling for a `SET`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Expiry {
    /// Plain write: any existing TTL on the key is discarded.
    #[default]
    Default,
    /// Keep whatever TTL the key already has.
    KeepTtl,
    /// Expire the key after the given number of seconds.
    Seconds(u64),
}

/// Options for [`KeyValueStore::set`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SetOptions {
    /// How the write treats the key's time-to-live.
    pub expiry: Expiry,
    /// Whether to atomically return the value held before the write.
    pub get: bool,
}

impl SetOptions {
    /// Creates options for a plain write.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps the existing TTL of the key.
    #[must_use]
    pub const fn keep_ttl(mut self) -> Self {
        self.expiry = Expiry::KeepTtl;
        self
    }

    /// Sets an expiry in seconds.
    #[must_use]
    pub const fn expire_in(mut self, seconds: u64) -> Self {
        self.expiry = Expiry::Seconds(seconds);
        self
    }

    /// Requests the previous value (get-and-set).
    #[must_use]
    pub const fn get_previous(mut self) -> Self {
        self.get = true;
        self
    }
}

/// A remote key-value store with string values, sets and TTLs.
///
/// The store is the only holder of mutable state. EntiKV relies on:
///
/// - every individual command being atomic
/// - `set` with [`SetOptions::get`] returning the value held immediately
///   before the write, with no other writer interleaving
/// - [`exec`](Self::exec) running pipeline commands in enqueue order, with no
///   atomicity across keys or with surrounding commands
///
/// # Implementors
///
/// - [`super::InMemoryStore`] - For tests and single-process use
/// - `RedisStore` - Redis via a multiplexed connection (feature `redis`)
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Reads the string value at `key`.
    async fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Reads many keys at once.
    ///
    /// The result is aligned with `keys`; missing keys map to `None`.
    async fn mget(&self, keys: &[String]) -> StorageResult<Vec<Option<String>>>;

    /// Writes `value` at `key`.
    ///
    /// Returns the previous value when `options.get` is set, otherwise `None`.
    async fn set(
        &self,
        key: &str,
        value: String,
        options: SetOptions,
    ) -> StorageResult<Option<String>>;

    /// Returns true if `key` holds a value of any kind.
    async fn exists(&self, key: &str) -> StorageResult<bool>;

    /// Deletes `key`. Returns true if the key existed.
    async fn del(&self, key: &str) -> StorageResult<bool>;

    /// Removes the TTL from `key`. Returns true if a TTL was removed.
    async fn persist(&self, key: &str) -> StorageResult<bool>;

    /// Sets a TTL on `key`. Returns true if the key exists.
    async fn expire(&self, key: &str, seconds: u64) -> StorageResult<bool>;

    /// Returns the remaining TTL of `key` in seconds.
    ///
    /// `None` if the key is missing or has no expiry.
    async fn ttl(&self, key: &str) -> StorageResult<Option<u64>>;

    /// Returns all members of the set at `key` (empty if missing).
    async fn smembers(&self, key: &str) -> StorageResult<Vec<String>>;

    /// Executes a batch of set commands in order.
    async fn exec(&self, pipeline: Pipeline) -> StorageResult<()>;
}

//! Redis-backed key-value store.
//!
//! Uses a [`redis::aio::ConnectionManager`], which multiplexes commands over
//! one connection and reconnects transparently. Retry and timeout policy are
//! left to the client.

use crate::backend::{Expiry, KeyValueStore, SetOptions};
use crate::error::{StorageError, StorageResult};
use crate::pipeline::{Pipeline, PipelineCommand};
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::debug;

/// A [`KeyValueStore`] backed by a Redis server (6.2 or newer, for
/// `SET .. KEEPTTL GET`).
///
/// # Example
///
/// ```ignore
/// use entikv_storage::RedisStore;
///
/// let store = RedisStore::connect("redis://localhost:6379").await?;
/// ```
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    /// Connects to the Redis server at `url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the server is unreachable.
    pub async fn connect(url: &str) -> StorageResult<Self> {
        let client = redis::Client::open(url)
            .map_err(|e| StorageError::Connection(format!("invalid Redis URL: {e}")))?;
        let conn = ConnectionManager::new(client)
            .await
            .map_err(|e| StorageError::Connection(format!("failed to connect to Redis: {e}")))?;

        debug!(url = %url, "Redis store connected");
        Ok(Self { conn })
    }

    /// Wraps an existing connection manager.
    #[must_use]
    pub fn from_connection(conn: ConnectionManager) -> Self {
        Self { conn }
    }

    fn conn(&self) -> ConnectionManager {
        self.conn.clone()
    }
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore").finish_non_exhaustive()
    }
}

fn command_error(command: &'static str) -> impl FnOnce(redis::RedisError) -> StorageError {
    move |e| {
        if e.kind() == redis::ErrorKind::TypeError || e.code() == Some("WRONGTYPE") {
            StorageError::command(command, format!("wrong value type: {e}"))
        } else if e.is_connection_dropped() || e.is_io_error() {
            StorageError::Connection(e.to_string())
        } else {
            StorageError::command(command, e.to_string())
        }
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let mut conn = self.conn();
        conn.get(key).await.map_err(command_error("GET"))
    }

    async fn mget(&self, keys: &[String]) -> StorageResult<Vec<Option<String>>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        // Issued explicitly: `AsyncCommands::mget` downgrades a single key to GET.
        let mut conn = self.conn();
        redis::cmd("MGET")
            .arg(keys)
            .query_async(&mut conn)
            .await
            .map_err(command_error("MGET"))
    }

    async fn set(
        &self,
        key: &str,
        value: String,
        options: SetOptions,
    ) -> StorageResult<Option<String>> {
        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(value);
        match options.expiry {
            Expiry::Default => {}
            Expiry::KeepTtl => {
                cmd.arg("KEEPTTL");
            }
            Expiry::Seconds(seconds) => {
                cmd.arg("EX").arg(seconds);
            }
        }

        let mut conn = self.conn();
        if options.get {
            cmd.arg("GET");
            cmd.query_async(&mut conn).await.map_err(command_error("SET"))
        } else {
            let _: () = cmd.query_async(&mut conn).await.map_err(command_error("SET"))?;
            Ok(None)
        }
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        let mut conn = self.conn();
        conn.exists(key).await.map_err(command_error("EXISTS"))
    }

    async fn del(&self, key: &str) -> StorageResult<bool> {
        let mut conn = self.conn();
        let removed: u64 = conn.del(key).await.map_err(command_error("DEL"))?;
        Ok(removed > 0)
    }

    async fn persist(&self, key: &str) -> StorageResult<bool> {
        let mut conn = self.conn();
        conn.persist(key).await.map_err(command_error("PERSIST"))
    }

    async fn expire(&self, key: &str, seconds: u64) -> StorageResult<bool> {
        let seconds = i64::try_from(seconds)
            .map_err(|_| StorageError::command("EXPIRE", "TTL out of range"))?;
        let mut conn = self.conn();
        conn.expire(key, seconds)
            .await
            .map_err(command_error("EXPIRE"))
    }

    async fn ttl(&self, key: &str) -> StorageResult<Option<u64>> {
        let mut conn = self.conn();
        let ttl: i64 = conn.ttl(key).await.map_err(command_error("TTL"))?;
        // -2: missing key, -1: no expiry.
        Ok(u64::try_from(ttl).ok())
    }

    async fn smembers(&self, key: &str) -> StorageResult<Vec<String>> {
        let mut conn = self.conn();
        conn.smembers(key).await.map_err(command_error("SMEMBERS"))
    }

    async fn exec(&self, pipeline: Pipeline) -> StorageResult<()> {
        if pipeline.is_empty() {
            return Ok(());
        }

        let count = pipeline.len();
        let mut pipe = redis::pipe();
        for command in pipeline.into_commands() {
            match command {
                PipelineCommand::SAdd { key, member } => {
                    pipe.sadd(key, member).ignore();
                }
                PipelineCommand::SRem { key, member } => {
                    pipe.srem(key, member).ignore();
                }
            }
        }

        let mut conn = self.conn();
        let _: () = pipe
            .query_async(&mut conn)
            .await
            .map_err(command_error("PIPELINE"))?;
        debug!(commands = count, "pipeline executed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // These tests require a running Redis instance and are skipped unless
    // REDIS_URL is set.

    fn redis_url() -> Option<String> {
        std::env::var("REDIS_URL").ok()
    }

    fn unique_key(name: &str) -> String {
        format!("entikv-test:{}:{name}", uuid::Uuid::new_v4())
    }

    #[tokio::test]
    async fn redis_get_and_set_returns_previous() {
        let Some(url) = redis_url() else {
            eprintln!("Skipping Redis test: REDIS_URL not set");
            return;
        };
        let store = RedisStore::connect(&url).await.unwrap();
        let key = unique_key("gs");

        let previous = store
            .set(&key, "v1".into(), SetOptions::new().get_previous())
            .await
            .unwrap();
        assert_eq!(previous, None);

        let previous = store
            .set(&key, "v2".into(), SetOptions::new().keep_ttl().get_previous())
            .await
            .unwrap();
        assert_eq!(previous.as_deref(), Some("v1"));

        let values = store.mget(&[key.clone()]).await.unwrap();
        assert_eq!(values, vec![Some("v2".to_string())]);

        assert!(store.exists(&key).await.unwrap());
        assert!(store.del(&key).await.unwrap());
        assert!(!store.exists(&key).await.unwrap());
    }

    #[tokio::test]
    async fn redis_ttl_roundtrip() {
        let Some(url) = redis_url() else {
            eprintln!("Skipping Redis test: REDIS_URL not set");
            return;
        };
        let store = RedisStore::connect(&url).await.unwrap();
        let key = unique_key("ttl");

        store
            .set(&key, "v".into(), SetOptions::new().expire_in(60))
            .await
            .unwrap();
        assert!(store.ttl(&key).await.unwrap().is_some());
        assert!(store.persist(&key).await.unwrap());
        assert_eq!(store.ttl(&key).await.unwrap(), None);

        store.del(&key).await.unwrap();
    }

    #[tokio::test]
    async fn redis_pipeline() {
        let Some(url) = redis_url() else {
            eprintln!("Skipping Redis test: REDIS_URL not set");
            return;
        };
        let store = RedisStore::connect(&url).await.unwrap();
        let key = unique_key("set");

        let mut pipeline = Pipeline::new();
        pipeline.sadd(key.as_str(), "a").sadd(key.as_str(), "b").srem(key.as_str(), "a");
        store.exec(pipeline).await.unwrap();

        assert_eq!(store.smembers(&key).await.unwrap(), vec!["b".to_string()]);
        store.del(&key).await.unwrap();
    }
}

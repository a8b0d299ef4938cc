//! # EntiKV Storage
//!
//! Key-value store abstraction for EntiKV.
//!
//! This crate provides the lowest layer EntiKV talks to: a remote store with
//! string values, sets, TTLs and pipelines. Stores are **opaque** - they do
//! not interpret the tokens they hold.
//!
//! ## Design Principles
//!
//! - Stores expose a small Redis-shaped command set
//! - Each command is atomic on its own; pipelines are ordered but not atomic
//! - Must be `Send + Sync` and object-safe (`Arc<dyn KeyValueStore>`)
//! - EntiKV owns all key layout and token interpretation
//!
//! ## Available Stores
//!
//! - [`InMemoryStore`] - For testing and single-process use
//! - `RedisStore` - Redis via `redis::aio::ConnectionManager` (feature `redis`)
//!
//! ## Example
//!
//! ```rust
//! use entikv_storage::{InMemoryStore, KeyValueStore, Pipeline, SetOptions};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let store = InMemoryStore::new();
//! let previous = store
//!     .set("users:1", "alice".into(), SetOptions::new().keep_ttl().get_previous())
//!     .await
//!     .unwrap();
//! assert_eq!(previous, None);
//!
//! let mut pipeline = Pipeline::new();
//! pipeline.sadd("users:idx_name:alice", "1");
//! store.exec(pipeline).await.unwrap();
//! assert_eq!(store.smembers("users:idx_name:alice").await.unwrap(), vec!["1"]);
//! # });
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod memory;
mod pipeline;
#[cfg(feature = "redis")]
mod redis_store;

pub use backend::{Expiry, KeyValueStore, SetOptions};
pub use error::{StorageError, StorageResult};
pub use memory::InMemoryStore;
pub use pipeline::{Pipeline, PipelineCommand};
#[cfg(feature = "redis")]
pub use redis_store::RedisStore;

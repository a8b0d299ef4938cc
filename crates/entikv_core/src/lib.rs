//! # EntiKV Core
//!
//! Typed record collections over a remote key-value store.
//!
//! This crate provides:
//! - [`Collection`]: CRUD for one record type under a key prefix, with
//!   TTL handling and optional transparent encryption
//! - Optimistic concurrency: [`Collection::compare_and_set`] and the
//!   retrying [`Collection::update`]
//! - [`SecondaryIndex`]: lookups by field value, maintained on write
//!
//! The store itself is any [`KeyValueStore`]; [`InMemoryStore`] is
//! re-exported for tests and single-process use.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod collection;
mod config;
mod error;
mod index;

pub use collection::{Collection, Patch, Record};
pub use config::{CollectionConfig, DEFAULT_UPDATE_BACKOFF, DEFAULT_UPDATE_RETRIES};
pub use error::{CoreError, CoreResult};
pub use index::{KeyPart, SecondaryIndex};

pub use entikv_codec::CipherSecret;
pub use entikv_storage::{InMemoryStore, KeyValueStore};

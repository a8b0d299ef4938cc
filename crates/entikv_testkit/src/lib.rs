//! # EntiKV Testkit
//!
//! Test utilities for EntiKV.
//!
//! This crate provides:
//! - Record fixtures and ready-made collections
//! - A fault-injecting store that also counts round trips
//! - Property-based test generators using proptest
//! - Known-answer vectors for the cipher codec
//! - Concurrent update stress helpers
//!
//! ## Usage
//!
//! ```rust
//! use entikv_testkit::prelude::*;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let (_store, customers, by_stripe) = memory_customers();
//! customers.set(&customer("c1", "s1")).await.unwrap();
//! assert_eq!(by_stripe.get_ids("s1").await.unwrap(), vec!["c1"]);
//! # });
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod stress;
pub mod vectors;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::stress::*;
    pub use crate::vectors::*;
}

pub use fixtures::*;
pub use generators::*;
pub use stress::*;
pub use vectors::*;

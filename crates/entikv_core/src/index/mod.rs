//! Secondary indexes.
//!
//! An index maps each value of one record field to the set of primary keys
//! whose record currently holds that value. Indexes are:
//! - Registered on a collection via [`Collection::add_index`](crate::Collection::add_index)
//! - Maintained by the collection's `set`/`update` writes, after the primary write
//! - Never backfilled
//!
//! # Drift
//!
//! `delete` does not touch index sets, and a failed maintenance pipeline
//! leaves them behind the records. Lookups filter ids whose record is gone.

mod binding;
mod key;
mod secondary;

pub(crate) use binding::IndexBinding;
pub use key::KeyPart;
pub use secondary::SecondaryIndex;

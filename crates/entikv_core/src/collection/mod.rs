//! Typed collection API.
//!
//! Provides `Collection<T>` for type-safe record storage with JSON (and
//! optionally encrypted) stored tokens via the `Record` trait.

mod patch;
mod record;
mod typed;

pub use patch::Patch;
pub use record::Record;
pub use typed::Collection;

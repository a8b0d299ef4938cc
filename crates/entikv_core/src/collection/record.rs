//! Record trait for typed collections.

use crate::index::KeyPart;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Trait for types that can be stored in a [`Collection`](crate::Collection).
///
/// Implementors must provide:
/// - `ID_FIELD`: the name of the serialized field holding the primary key
/// - `id()`: the primary key, which must never change over the record's
///   lifetime
///
/// The whole record, primary key included, is serialized with `serde`. The
/// primary key is also rendered verbatim into the storage key, so it stays
/// addressable when the stored token is encrypted.
///
/// # Example
///
/// ```rust
/// use entikv_core::Record;
/// use serde::{Deserialize, Serialize};
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
///
///     fn id(&self) -> &String {
///         &self.id
///     }
/// }
/// ```
pub trait Record: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Primary key type (string or integer).
    type Id: KeyPart;

    /// Serialized name of the primary key field.
    const ID_FIELD: &'static str;

    /// Returns the record's primary key.
    fn id(&self) -> &Self::Id;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Counter {
        #[serde(rename = "counterId")]
        counter_id: u64,
        hits: i64,
    }

    impl Record for Counter {
        type Id = u64;
        const ID_FIELD: &'static str = "counterId";

        fn id(&self) -> &u64 {
            &self.counter_id
        }
    }

    #[test]
    fn id_field_matches_serialized_name() {
        let counter = Counter {
            counter_id: 9,
            hits: 1,
        };
        let value = serde_json::to_value(&counter).unwrap();
        assert_eq!(value[Counter::ID_FIELD], 9);
        assert_eq!(counter.id().to_key_part(), "9");
    }
}

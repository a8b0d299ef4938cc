//! Property-based test generators using proptest.
//!
//! Provides strategies for generating records, patches and key material.

use crate::fixtures::{Counter, Customer};
use entikv_codec::CipherSecret;
use entikv_core::Patch;
use proptest::prelude::*;
use serde_json::{Map, Value};

/// Strategy for generating primary keys that are safe in storage keys.
pub fn record_id_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z0-9]{1,12}").expect("Invalid regex")
}

/// Strategy for generating Stripe-like customer ids.
pub fn stripe_id_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("cus_[A-Za-z0-9]{4,14}").expect("Invalid regex")
}

/// Strategy for generating email addresses.
pub fn email_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z]{1,8}@[a-z]{1,8}\\.(com|org|io)").expect("Invalid regex")
}

/// Strategy for generating customers.
pub fn customer_strategy() -> impl Strategy<Value = Customer> {
    (
        record_id_strategy(),
        stripe_id_strategy(),
        prop::option::of(email_strategy()),
    )
        .prop_map(|(id, stripe_customer_id, email)| Customer {
            id,
            stripe_customer_id,
            email,
        })
}

/// Strategy for generating counters.
pub fn counter_strategy() -> impl Strategy<Value = Counter> {
    (any::<u64>(), -1_000_000i64..1_000_000).prop_map(|(id, hits)| Counter { id, hits })
}

/// Strategy for generating a sequence of Stripe ids a customer moves
/// through.
pub fn stripe_history_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(stripe_id_strategy(), 1..6)
}

/// Strategy for generating scalar JSON values.
pub fn json_scalar_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        ".{0,24}".prop_map(Value::String),
    ]
}

/// Strategy for generating JSON documents (objects up to two levels deep).
pub fn json_document_strategy() -> impl Strategy<Value = Value> {
    let nested = prop::collection::btree_map("[a-z]{1,6}", json_scalar_strategy(), 0..4)
        .prop_map(|fields| Value::Object(fields.into_iter().collect()));
    let field = prop_oneof![json_scalar_strategy(), nested];
    prop::collection::btree_map("[a-zA-Z_]{1,10}", field, 0..8)
        .prop_map(|fields| Value::Object(fields.into_iter().collect::<Map<_, _>>()))
}

/// Strategy for generating customer patches that leave the Stripe id alone.
pub fn email_patch_strategy() -> impl Strategy<Value = Patch> {
    prop::option::of(email_strategy()).prop_map(|email| Patch::new().set("email", email))
}

/// Strategy for generating random key material.
pub fn cipher_secret_strategy() -> impl Strategy<Value = CipherSecret> {
    (
        prop::array::uniform32(any::<u8>()),
        prop::array::uniform16(any::<u8>()),
    )
        .prop_map(|(key, iv)| {
            CipherSecret::from_bytes(&key, &iv).expect("Fixed-size key material")
        })
}

//! Cipher codec known-answer tests.

use entikv_codec::{CipherCodec, CipherSecret, CodecError, TokenCodec};
use entikv_core::{CollectionConfig, InMemoryStore};
use entikv_testkit::prelude::*;
use proptest::prelude::*;
use serde_json::Value;
use std::sync::Arc;

fn vector_codec() -> CipherCodec {
    CipherCodec::new(CipherSecret::parse(VECTOR_KEY_HEX, VECTOR_IV_HEX).unwrap())
}

#[test]
fn vectors_encrypt_to_known_tokens() {
    for vector in cipher_vectors() {
        let codec = CipherCodec::new(CipherSecret::parse(vector.key, vector.iv).unwrap());
        let token = codec.encrypt(vector.plaintext.as_bytes()).unwrap();
        assert_eq!(token, vector.token, "vector {}", vector.id);
    }
}

#[test]
fn vectors_decode_to_known_values() {
    for vector in cipher_vectors() {
        let codec = CipherCodec::new(CipherSecret::parse(vector.key, vector.iv).unwrap());
        let decoded: Value = codec.decode(vector.token).unwrap();
        let expected: Value = serde_json::from_str(vector.plaintext).unwrap();
        assert_eq!(decoded, expected, "vector {}", vector.id);
    }
}

#[test]
fn hex_key_material_is_decoded() {
    let secret = CipherSecret::parse(VECTOR_KEY_HEX, VECTOR_IV_HEX).unwrap();
    assert_eq!(hex::encode(secret.key()), VECTOR_KEY_HEX);
    assert_eq!(hex::encode(secret.iv()), VECTOR_IV_HEX);
}

#[test]
fn invalid_tokens_fail_cleanly() {
    let codec = vector_codec();
    for (reason, token) in invalid_tokens() {
        let err = codec.decode::<Value>(token).unwrap_err();
        assert!(
            matches!(err, CodecError::Decode { .. }),
            "{reason}: unexpected {err:?}"
        );
    }
}

#[test]
fn missing_key_material_fails_at_construction() {
    assert!(matches!(
        CipherCodec::from_parts(None, Some(VECTOR_IV_HEX)),
        Err(CodecError::MissingKeyMaterial { what: "key" })
    ));
    assert!(matches!(
        CipherCodec::from_parts(Some(VECTOR_KEY_HEX), Some("")),
        Err(CodecError::MissingKeyMaterial { .. })
    ));
    assert!(matches!(
        CipherCodec::from_parts(Some("too short"), Some(VECTOR_IV_HEX)),
        Err(CodecError::InvalidKeyMaterial { .. })
    ));
}

#[tokio::test]
async fn encrypted_collection_stores_known_token() {
    let store = Arc::new(InMemoryStore::new());
    let secret = CipherSecret::parse(VECTOR_KEY_HEX, VECTOR_IV_HEX).unwrap();
    let (coll, by_stripe) = customers(store.clone(), CollectionConfig::new().encryption(secret));

    coll.set(&customer("c1", "s1")).await.unwrap();

    let vector = cipher_vectors()
        .into_iter()
        .find(|v| v.id == "customer_c1")
        .unwrap();
    assert_eq!(store.raw("customersc1").as_deref(), Some(vector.token));
    // primary key stays addressable, the index value is in clear
    assert_eq!(by_stripe.get_ids("s1").await.unwrap(), vec!["c1"]);
}

#[tokio::test]
async fn wrong_key_surfaces_decode_error() {
    let store = Arc::new(InMemoryStore::new());
    let (writer, _) = customers(
        store.clone(),
        CollectionConfig::new().encryption(CipherSecret::generate()),
    );
    writer.set(&customer("c1", "s1")).await.unwrap();

    let (reader, by_stripe) = customers(
        store,
        CollectionConfig::new().encryption(CipherSecret::generate()),
    );
    assert!(reader.get("c1").await.unwrap_err().is_decode());
    assert!(by_stripe.get_items("s1").await.unwrap_err().is_decode());
}

proptest! {
    #[test]
    fn plain_and_encrypted_agree(doc in json_document_strategy(), secret in cipher_secret_strategy()) {
        let plain = TokenCodec::Plain;
        let encrypted = TokenCodec::from(CipherCodec::new(secret));

        let from_plain = plain.decode_value(&plain.encode(&doc).unwrap()).unwrap();
        let from_cipher = encrypted.decode_value(&encrypted.encode(&doc).unwrap()).unwrap();
        prop_assert_eq!(&from_plain, &doc);
        prop_assert_eq!(from_cipher, from_plain);
    }

    #[test]
    fn encoding_is_deterministic(doc in json_document_strategy()) {
        let codec = vector_codec();
        prop_assert_eq!(codec.encode(&doc).unwrap(), codec.encode(&doc).unwrap());
    }
}

//! # EntiKV Codec
//!
//! Stored-token encoding for EntiKV.
//!
//! Records are serialized to JSON. When encryption is enabled the JSON text
//! is encrypted as a whole with AES-256 in CBC mode (PKCS7 padding) under a
//! fixed key and IV and stored as base64.
//!
//! ## Guarantees
//!
//! - Encoding is deterministic for a given key and IV
//! - Decoding never returns partial data: bad base64, bad ciphertext and bad
//!   JSON all surface as [`CodecError::Decode`]
//! - Missing or malformed key material fails at construction
//!
//! ## Usage
//!
//! ```
//! use entikv_codec::{CipherCodec, CipherSecret, TokenCodec};
//! use serde_json::{json, Value};
//!
//! let secret = CipherSecret::parse(
//!     "000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f",
//!     "f0f1f2f3f4f5f6f7f8f9fafbfcfdfeff",
//! )
//! .unwrap();
//! let codec = TokenCodec::from(CipherCodec::new(secret));
//!
//! let token = codec.encode(&json!({"id": "c1"})).unwrap();
//! let decoded: Value = codec.decode(&token).unwrap();
//! assert_eq!(decoded, json!({"id": "c1"}));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod cipher;
mod error;
mod secret;
mod token;

pub use cipher::CipherCodec;
pub use error::{CodecError, CodecResult};
pub use secret::{CipherSecret, IV_SIZE, KEY_SIZE};
pub use token::TokenCodec;

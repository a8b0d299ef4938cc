//! Stored token encoding.

use crate::cipher::CipherCodec;
use crate::error::{CodecError, CodecResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// Decides how a record is represented in the store.
///
/// - `Plain`: the record's JSON text
/// - `Encrypted`: an opaque [`CipherCodec`] token
#[derive(Clone, Debug, Default)]
pub enum TokenCodec {
    /// Records are stored as JSON text.
    #[default]
    Plain,
    /// Records are stored as encrypted tokens.
    Encrypted(CipherCodec),
}

impl TokenCodec {
    /// Returns true if tokens are encrypted.
    #[must_use]
    pub fn is_encrypted(&self) -> bool {
        matches!(self, Self::Encrypted(_))
    }

    /// Encodes a record into a stored token.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be serialized.
    pub fn encode<T: Serialize + ?Sized>(&self, value: &T) -> CodecResult<String> {
        match self {
            Self::Plain => {
                serde_json::to_string(value).map_err(|e| CodecError::encode(e.to_string()))
            }
            Self::Encrypted(cipher) => cipher.encode(value),
        }
    }

    /// Decodes a stored token into a record.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Decode`] if the token cannot be decrypted or
    /// parsed.
    pub fn decode<T: DeserializeOwned>(&self, token: &str) -> CodecResult<T> {
        match self {
            Self::Plain => serde_json::from_str(token)
                .map_err(|e| CodecError::decode(format!("stored value is not valid JSON: {e}"))),
            Self::Encrypted(cipher) => cipher.decode(token),
        }
    }

    /// Decodes a stored token into an untyped JSON value.
    pub fn decode_value(&self, token: &str) -> CodecResult<Value> {
        self.decode(token)
    }
}

impl From<CipherCodec> for TokenCodec {
    fn from(cipher: CipherCodec) -> Self {
        Self::Encrypted(cipher)
    }
}

//! AES-256-CBC token cipher.

use crate::error::{CodecError, CodecResult};
use crate::secret::CipherSecret;
use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::de::DeserializeOwned;
use serde::Serialize;

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// Turns structured values into opaque text tokens and back.
///
/// A value is serialized to JSON, encrypted with AES-256 in CBC mode with
/// PKCS7 padding under a fixed key and IV, and base64-encoded. Both
/// directions are pure functions of the configured [`CipherSecret`]: the same
/// value always yields the same token.
///
/// Encryption is all-or-nothing. Fields the caller needs in clear (such as a
/// primary key used for addressing) must be carried alongside the token.
///
/// # Example
///
/// ```rust
/// use entikv_codec::{CipherCodec, CipherSecret};
/// use serde_json::json;
///
/// let codec = CipherCodec::new(CipherSecret::generate());
/// let token = codec.encode(&json!({"id": "c1", "plan": "pro"})).unwrap();
/// let value: serde_json::Value = codec.decode(&token).unwrap();
/// assert_eq!(value["plan"], "pro");
/// ```
#[derive(Clone, Debug)]
pub struct CipherCodec {
    secret: CipherSecret,
}

impl CipherCodec {
    /// Creates a codec from an already validated secret.
    #[must_use]
    pub fn new(secret: CipherSecret) -> Self {
        Self { secret }
    }

    /// Creates a codec from text-encoded key material.
    ///
    /// # Errors
    ///
    /// Fails if the key or IV is missing, empty or malformed.
    pub fn from_parts(key: Option<&str>, iv: Option<&str>) -> CodecResult<Self> {
        let key = key.ok_or(CodecError::MissingKeyMaterial { what: "key" })?;
        let iv = iv.ok_or(CodecError::MissingKeyMaterial { what: "iv" })?;
        Ok(Self::new(CipherSecret::parse(key, iv)?))
    }

    /// Serializes and encrypts `value` into a token.
    ///
    /// # Errors
    ///
    /// Returns an error if `value` cannot be serialized to JSON.
    pub fn encode<T: Serialize + ?Sized>(&self, value: &T) -> CodecResult<String> {
        let plaintext = serde_json::to_vec(value).map_err(|e| CodecError::encode(e.to_string()))?;
        self.encrypt(&plaintext)
    }

    /// Decrypts and deserializes a token.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Decode`] if the token is not valid base64, not
    /// valid ciphertext for this key and IV, or not valid JSON for `T`.
    pub fn decode<T: DeserializeOwned>(&self, token: &str) -> CodecResult<T> {
        let plaintext = self.decrypt(token)?;
        serde_json::from_slice(&plaintext)
            .map_err(|e| CodecError::decode(format!("decrypted token is not valid JSON: {e}")))
    }

    /// Encrypts raw bytes into a base64 token.
    pub fn encrypt(&self, plaintext: &[u8]) -> CodecResult<String> {
        let cipher = Aes256CbcEnc::new_from_slices(self.secret.key(), self.secret.iv())
            .map_err(|e| CodecError::encode(e.to_string()))?;
        let ciphertext = cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext);
        Ok(STANDARD.encode(ciphertext))
    }

    /// Decrypts a base64 token into raw bytes.
    pub fn decrypt(&self, token: &str) -> CodecResult<Vec<u8>> {
        let ciphertext = STANDARD
            .decode(token.trim())
            .map_err(|e| CodecError::decode(format!("token is not base64: {e}")))?;
        let cipher = Aes256CbcDec::new_from_slices(self.secret.key(), self.secret.iv())
            .map_err(|e| CodecError::decode(e.to_string()))?;
        cipher
            .decrypt_padded_vec_mut::<Pkcs7>(&ciphertext)
            .map_err(|_| CodecError::decode("ciphertext does not match key or is corrupted"))
    }
}

//! Cipher key material.

use crate::error::{CodecError, CodecResult};
use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// Size of the AES-256 key in bytes.
pub const KEY_SIZE: usize = 32;
/// Size of the CBC initialization vector in bytes.
pub const IV_SIZE: usize = 16;

/// A 256-bit key and 128-bit initialization vector.
///
/// The bytes are zeroized when dropped and never printed by `Debug`.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct CipherSecret {
    key: [u8; KEY_SIZE],
    iv: [u8; IV_SIZE],
}

impl CipherSecret {
    /// Generates a random key and IV.
    #[must_use]
    pub fn generate() -> Self {
        let mut key = [0u8; KEY_SIZE];
        let mut iv = [0u8; IV_SIZE];
        let mut rng = rand::thread_rng();
        rng.fill_bytes(&mut key);
        rng.fill_bytes(&mut iv);
        Self { key, iv }
    }

    /// Creates a secret from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if either slice is empty or has the wrong length.
    pub fn from_bytes(key: &[u8], iv: &[u8]) -> CodecResult<Self> {
        let key = fixed::<KEY_SIZE>(key, "key")?;
        let iv = fixed::<IV_SIZE>(iv, "iv")?;
        Ok(Self { key, iv })
    }

    /// Parses a key and IV given as text.
    ///
    /// Each part is accepted either hex-encoded (64 hex digits for the key,
    /// 32 for the IV) or as raw text of exactly 32 and 16 bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::MissingKeyMaterial`] if a part is empty and
    /// [`CodecError::InvalidKeyMaterial`] if it matches neither form.
    pub fn parse(key: &str, iv: &str) -> CodecResult<Self> {
        let key = decode_text(key, KEY_SIZE, "key")?;
        let iv = decode_text(iv, IV_SIZE, "iv")?;
        Self::from_bytes(&key, &iv)
    }

    /// Returns the key bytes.
    ///
    /// # Security
    ///
    /// Don't log or serialize the result.
    #[must_use]
    pub fn key(&self) -> &[u8; KEY_SIZE] {
        &self.key
    }

    /// Returns the initialization vector bytes.
    #[must_use]
    pub fn iv(&self) -> &[u8; IV_SIZE] {
        &self.iv
    }
}

impl std::fmt::Debug for CipherSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CipherSecret")
            .field("key", &"[REDACTED]")
            .field("iv", &"[REDACTED]")
            .finish()
    }
}

fn fixed<const N: usize>(bytes: &[u8], what: &'static str) -> CodecResult<[u8; N]> {
    if bytes.is_empty() {
        return Err(CodecError::MissingKeyMaterial { what });
    }
    bytes
        .try_into()
        .map_err(|_| CodecError::InvalidKeyMaterial {
            what,
            expected: N,
            actual: bytes.len(),
        })
}

fn decode_text(text: &str, size: usize, what: &'static str) -> CodecResult<Zeroizing<Vec<u8>>> {
    if text.is_empty() {
        return Err(CodecError::MissingKeyMaterial { what });
    }
    if text.len() == size * 2 && text.bytes().all(|b| b.is_ascii_hexdigit()) {
        return hex::decode(text)
            .map(Zeroizing::new)
            .map_err(|_| CodecError::InvalidKeyMaterial {
                what,
                expected: size,
                actual: text.len() / 2,
            });
    }
    if text.len() == size {
        return Ok(Zeroizing::new(text.as_bytes().to_vec()));
    }
    Err(CodecError::InvalidKeyMaterial {
        what,
        expected: size,
        actual: text.len(),
    })
}

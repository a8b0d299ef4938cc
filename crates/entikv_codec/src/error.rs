//! Error types for the codec crate.

use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur while encoding or decoding stored tokens.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Key or initialization vector was not supplied.
    #[error("missing cipher {what}")]
    MissingKeyMaterial {
        /// Which part is missing (`"key"` or `"iv"`).
        what: &'static str,
    },

    /// Key or initialization vector has the wrong size or encoding.
    #[error("invalid cipher {what}: expected {expected} bytes, got {actual}")]
    InvalidKeyMaterial {
        /// Which part is invalid (`"key"` or `"iv"`).
        what: &'static str,
        /// Expected size in bytes.
        expected: usize,
        /// Size that was supplied.
        actual: usize,
    },

    /// A record could not be serialized or encrypted.
    #[error("encoding failed: {message}")]
    Encode {
        /// Description of the encoding error.
        message: String,
    },

    /// A stored token could not be decrypted or parsed.
    #[error("decoding failed: {message}")]
    Decode {
        /// Description of the decoding error.
        message: String,
    },
}

impl CodecError {
    /// Creates an encoding error.
    pub fn encode(message: impl Into<String>) -> Self {
        Self::Encode {
            message: message.into(),
        }
    }

    /// Creates a decoding error.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Returns true if a stored token failed to decode.
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode { .. })
    }

    /// Returns true if this is a construction-time key material error.
    pub fn is_key_material(&self) -> bool {
        matches!(
            self,
            Self::MissingKeyMaterial { .. } | Self::InvalidKeyMaterial { .. }
        )
    }
}

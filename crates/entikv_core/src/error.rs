//! Error types for EntiKV core.

use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in EntiKV core operations.
///
/// A missing record is not an error for reads: `get` and friends return
/// `Ok(None)`. Only [`Collection::update`](crate::Collection::update)
/// reports [`CoreError::NotFound`].
#[derive(Debug, Error)]
pub enum CoreError {
    /// Store error.
    #[error("storage error: {0}")]
    Storage(#[from] entikv_storage::StorageError),

    /// Token encoding or decoding error.
    #[error("codec error: {0}")]
    Codec(#[from] entikv_codec::CodecError),

    /// The collection is configured in a way that forbids the operation.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the conflict.
        message: String,
    },

    /// The record to update does not exist.
    #[error("record not found: {key}")]
    NotFound {
        /// Storage key of the missing record.
        key: String,
    },

    /// The value replaced by a write was not the expected snapshot.
    ///
    /// The new value has already been written when this is returned.
    #[error("concurrent update detected on {key}")]
    ConcurrentUpdate {
        /// Storage key of the contended record.
        key: String,
    },

    /// `update` ran out of retries while racing other writers.
    #[error("update of {key} abandoned after {attempts} conflicting attempts")]
    UpdateConflict {
        /// Storage key of the contended record.
        key: String,
        /// Number of read-merge-write attempts made.
        attempts: u32,
    },

    /// A record or patch does not have the shape the collection needs.
    #[error("invalid record: {message}")]
    InvalidRecord {
        /// Description of the problem.
        message: String,
    },
}

impl CoreError {
    /// Creates an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Creates an invalid record error.
    pub fn invalid_record(message: impl Into<String>) -> Self {
        Self::InvalidRecord {
            message: message.into(),
        }
    }

    /// Returns true for a lost-update race reported by a checked write.
    pub fn is_concurrent_update(&self) -> bool {
        matches!(self, Self::ConcurrentUpdate { .. })
    }

    /// Returns true if a stored token could not be decoded.
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Codec(err) if err.is_decode())
    }

    /// Returns true for configuration errors, including bad key material.
    pub fn is_config(&self) -> bool {
        match self {
            Self::InvalidConfig { .. } => true,
            Self::Codec(err) => err.is_key_material(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use entikv_codec::CodecError;

    #[test]
    fn classification() {
        assert!(CoreError::ConcurrentUpdate { key: "k".into() }.is_concurrent_update());
        assert!(CoreError::from(CodecError::decode("bad")).is_decode());
        assert!(CoreError::invalid_config("ttl and indexes").is_config());
        assert!(CoreError::from(CodecError::MissingKeyMaterial { what: "key" }).is_config());
        assert!(!CoreError::NotFound { key: "k".into() }.is_config());
    }

    #[test]
    fn error_display() {
        let err = CoreError::UpdateConflict {
            key: "customers:c1".into(),
            attempts: 4,
        };
        assert_eq!(
            err.to_string(),
            "update of customers:c1 abandoned after 4 conflicting attempts"
        );
    }
}

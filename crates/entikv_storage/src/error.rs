//! Error types for store operations.

use thiserror::Error;

/// Result type for store operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur while talking to a key-value store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The store could not be reached or the connection dropped.
    #[error("connection error: {0}")]
    Connection(String),

    /// The store rejected or failed to execute a command.
    #[error("command `{command}` failed: {message}")]
    Command {
        /// Name of the failing command.
        command: &'static str,
        /// Error reported by the store.
        message: String,
    },

    /// A command was issued against a key holding a different kind of value.
    #[error("wrong type for key {key}: expected {expected}")]
    WrongType {
        /// The offending key.
        key: String,
        /// The value kind the command expected.
        expected: &'static str,
    },

    /// The store is closed.
    #[error("store is closed")]
    Closed,
}

impl StorageError {
    /// Creates a command error.
    pub fn command(command: &'static str, message: impl Into<String>) -> Self {
        Self::Command {
            command,
            message: message.into(),
        }
    }

    /// Creates a wrong-type error.
    pub fn wrong_type(key: impl Into<String>, expected: &'static str) -> Self {
        Self::WrongType {
            key: key.into(),
            expected,
        }
    }
}

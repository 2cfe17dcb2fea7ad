//! Error types for transaction construction and execution.

use thiserror::Error;

/// Error type for wire operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WireError {
    /// The connected schema predates the column being written.
    #[error("{table}.{column} requires schema {required}, connected schema is {actual}")]
    SchemaVersionMismatch {
        table: &'static str,
        column: &'static str,
        required: String,
        actual: String,
    },

    /// A temporary name does not match `[a-zA-Z_][a-zA-Z0-9_]*`.
    #[error("Invalid named-uuid: {0}")]
    InvalidNamedUuid(String),

    /// A temporary name was already used by another insert in the batch.
    #[error("Duplicate named-uuid: {0}")]
    DuplicateNamedUuid(String),

    /// Invalid schema version string.
    #[error("Invalid schema version: {0}")]
    InvalidVersion(String),

    /// The server reply could not be decoded.
    #[error("Decode error: {message}")]
    Decode { message: String },

    /// The transport failed to deliver the batch or receive a reply.
    #[error("Transport error: {message}")]
    Transport { message: String },
}

impl WireError {
    /// Creates a decode error.
    pub fn decode(message: impl Into<String>) -> Self {
        WireError::Decode {
            message: message.into(),
        }
    }

    /// Creates a transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        WireError::Transport {
            message: message.into(),
        }
    }
}

/// Result alias for wire operations.
pub type WireResult<T> = std::result::Result<T, WireError>;

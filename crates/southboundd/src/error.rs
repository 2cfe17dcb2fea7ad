//! Error types for southboundd.

use ovsdb_wire::WireError;
use thiserror::Error;

/// Errors raised while building or submitting a reconciliation batch.
#[derive(Debug, Error)]
pub enum TransactError {
    /// The batch references temporary names that no insert defines.
    #[error("Unresolved named-uuid references: {}", .0.join(", "))]
    UnresolvedNamedRefs(Vec<String>),

    /// The transport failed or the reply could not be decoded.
    #[error("Transport error: {0}")]
    Wire(#[from] WireError),

    /// The server returned fewer results than operations submitted.
    #[error("Result count mismatch: submitted {submitted} operations, got {received} results")]
    ResultCountMismatch { submitted: usize, received: usize },

    /// The reconcile worker for a connection is gone.
    #[error("Reconcile worker for {0} has stopped")]
    WorkerStopped(String),

    /// No reconcile worker is registered for the connection.
    #[error("No reconcile worker registered for {0}")]
    UnknownConnection(String),

    /// The reconcile queue for a connection is full.
    #[error("Reconcile queue for {0} is full")]
    QueueFull(String),
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: String, message: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for transaction operations.
pub type Result<T> = std::result::Result<T, TransactError>;

//! Error types for the storage layer.

use lattica_crdt::CrdtError;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur in storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The envelope does not match the state it carries.
    #[error("schema error: {0}")]
    Schema(String),

    /// The decoded state violates a structural invariant.
    #[error("invalid state: {0}")]
    InvalidState(#[from] CrdtError),

    /// The snapshot was written by an unknown format version.
    #[error("unsupported snapshot format {0}")]
    UnsupportedFormat(u32),

    /// IO error (file system).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A store lock was poisoned by a panicking writer.
    #[error("store lock poisoned")]
    Poisoned,
}

//! Error types for cells and replicas.

use lattica_crdt::CrdtError;
use lattica_storage::StorageError;
use lattica_types::ReplicaId;
use thiserror::Error;

/// Result type for cell and replica operations.
pub type CellResult<T> = Result<T, CellError>;

/// Errors surfaced by cells and replicas.
#[derive(Debug, Error)]
pub enum CellError {
    /// The CRDT rejected the operation; state is unchanged.
    #[error("crdt error: {0}")]
    Crdt(#[from] CrdtError),

    /// Loading, decoding or saving a snapshot failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// The cell could not commit or its lock was poisoned.
    #[error("state corruption: {0}")]
    StateCorruption(String),

    /// A snapshot handed to a replica is owned by a different replica.
    #[error("snapshot belongs to replica {found}, expected {expected}")]
    ReplicaMismatch {
        expected: ReplicaId,
        found: ReplicaId,
    },
}

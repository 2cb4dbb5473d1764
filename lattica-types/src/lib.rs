//! Core type definitions for lattica.
//!
//! This crate defines the small, dependency-light types shared by every
//! other crate in the workspace:
//! - Replica identifiers (opaque, lexicographically ordered strings)
//! - Hybrid Logical Clock timestamps used for last-writer-wins ordering
//!
//! CRDT state types live in `lattica-crdt`.

mod ids;
mod timestamp;

pub use ids::ReplicaId;
pub use timestamp::HybridTimestamp;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("invalid replica id: {0:?}")]
    InvalidReplicaId(String),
}

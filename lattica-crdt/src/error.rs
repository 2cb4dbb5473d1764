//! Error types for CRDT operations.

use crate::CrdtKind;
use thiserror::Error;

/// Result type for CRDT operations.
pub type CrdtResult<T> = Result<T, CrdtError>;

/// Errors that can occur in local CRDT operations.
///
/// Every failing operation leaves the state it was called on unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CrdtError {
    /// A counter was asked to move by a negative amount.
    #[error("invalid amount {0}: counters only accept non-negative amounts")]
    InvalidAmount(i64),

    /// A counter slot would exceed `u64::MAX`.
    #[error("counter overflow")]
    Overflow,

    /// Merge was attempted between states of different types.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: CrdtKind, found: CrdtKind },

    /// A state violates a structural invariant.
    #[error("invalid state: {0}")]
    Invalid(String),
}

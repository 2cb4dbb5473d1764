//! Versioned JSON snapshot codec.

use lattica_crdt::{CrdtKind, Replicated};
use lattica_types::ReplicaId;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::{StorageError, StorageResult};

/// Current snapshot format version.
pub const FORMAT_VERSION: u32 = 1;

/// The serialized form of a replica's state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotEnvelope<C> {
    /// Format version of this envelope.
    pub format: u32,
    /// Type tag of `state`.
    pub kind: CrdtKind,
    /// Replica that owns `state`.
    pub replica_id: ReplicaId,
    /// The state itself.
    pub state: C,
}

/// Envelope fields readable without knowing the state type.
#[derive(Deserialize)]
struct EnvelopeHeader {
    format: u32,
}

/// Encodes and decodes snapshot envelopes as JSON.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JsonCodec {
    pretty: bool,
}

impl JsonCodec {
    /// Creates a compact JSON codec.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a codec that writes indented JSON.
    #[must_use]
    pub fn pretty() -> Self {
        Self { pretty: true }
    }

    /// Encodes `state` in an envelope.
    pub fn encode<C>(&self, state: &C) -> StorageResult<Vec<u8>>
    where
        C: Replicated + Serialize,
    {
        let envelope = SnapshotEnvelope {
            format: FORMAT_VERSION,
            kind: state.kind(),
            replica_id: state.replica_id().clone(),
            state,
        };
        let bytes = if self.pretty {
            serde_json::to_vec_pretty(&envelope)?
        } else {
            serde_json::to_vec(&envelope)?
        };
        Ok(bytes)
    }

    /// Decodes and validates an envelope produced by [`encode`](Self::encode).
    ///
    /// Never substitutes a default: any malformed or inconsistent input is an
    /// error.
    pub fn decode<C>(&self, bytes: &[u8]) -> StorageResult<C>
    where
        C: Replicated + DeserializeOwned,
    {
        let header: EnvelopeHeader = serde_json::from_slice(bytes)?;
        if header.format != FORMAT_VERSION {
            return Err(StorageError::UnsupportedFormat(header.format));
        }

        let envelope: SnapshotEnvelope<C> = serde_json::from_slice(bytes)?;
        let state = envelope.state;
        if state.kind() != envelope.kind {
            return Err(StorageError::Schema(format!(
                "envelope tagged {} carries a {}",
                envelope.kind,
                state.kind()
            )));
        }
        if state.replica_id() != &envelope.replica_id {
            return Err(StorageError::Schema(format!(
                "envelope for replica {} carries state of replica {}",
                envelope.replica_id,
                state.replica_id()
            )));
        }
        state.validate()?;
        Ok(state)
    }
}

//! Construction-time configuration.

use lattica_storage::{JsonCodec, MemoryStore, StateStore};
use lattica_types::ReplicaId;
use std::fmt;
use std::sync::Arc;

/// Commit attempts a transaction may retry before giving up.
pub const DEFAULT_MAX_RETRIES: u32 = 1024;

/// Configuration for a [`TransactionalCell`](crate::TransactionalCell).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellConfig {
    /// Conflicting commits tolerated per transaction. Exceeding this is
    /// reported as state corruption.
    pub max_retries: u32,
}

impl Default for CellConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

impl CellConfig {
    /// Sets the retry bound.
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }
}

/// Everything a [`Replica`](crate::Replica) needs, passed once at construction.
#[derive(Clone)]
pub struct ReplicaConfig {
    /// The replica that owns the state.
    pub replica_id: ReplicaId,
    /// Where snapshots are loaded from and persisted to.
    pub store: Arc<dyn StateStore>,
    /// How snapshots are encoded.
    pub codec: JsonCodec,
    /// Transaction settings for the replica's cell.
    pub cell: CellConfig,
}

impl ReplicaConfig {
    /// Creates a config backed by `store` with the default codec and cell settings.
    pub fn new(replica_id: ReplicaId, store: Arc<dyn StateStore>) -> Self {
        Self {
            replica_id,
            store,
            codec: JsonCodec::default(),
            cell: CellConfig::default(),
        }
    }

    /// Creates a config backed by a fresh [`MemoryStore`].
    pub fn in_memory(replica_id: ReplicaId) -> Self {
        Self::new(replica_id, Arc::new(MemoryStore::new()))
    }

    /// Replaces the codec.
    #[must_use]
    pub fn with_codec(mut self, codec: JsonCodec) -> Self {
        self.codec = codec;
        self
    }

    /// Replaces the cell settings.
    #[must_use]
    pub fn with_cell_config(mut self, cell: CellConfig) -> Self {
        self.cell = cell;
        self
    }
}

impl fmt::Debug for ReplicaConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReplicaConfig")
            .field("replica_id", &self.replica_id)
            .field("codec", &self.codec)
            .field("cell", &self.cell)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ReplicaConfig::in_memory(ReplicaId::from("a"));
        assert_eq!(config.cell.max_retries, DEFAULT_MAX_RETRIES);
        assert_eq!(config.codec, JsonCodec::new());
    }

    #[test]
    fn builders_override() {
        let config = ReplicaConfig::in_memory(ReplicaId::from("a"))
            .with_codec(JsonCodec::pretty())
            .with_cell_config(CellConfig::default().with_max_retries(3));
        assert_eq!(config.codec, JsonCodec::pretty());
        assert_eq!(config.cell.max_retries, 3);
        assert!(format!("{config:?}").contains("ReplicaConfig"));
    }
}

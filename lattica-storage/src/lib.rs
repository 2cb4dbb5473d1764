//! Persistence for lattica replicas.
//!
//! Snapshots are stored as opaque bytes keyed by replica id. The bytes are a
//! versioned JSON envelope carrying the state's type tag, its owning replica
//! and the state itself; decoding validates the envelope and the state's
//! structural invariants before anything reaches a replica.
//!
//! # Architecture
//!
//! - [`JsonCodec`] turns a [`Replicated`](lattica_crdt::Replicated) state into
//!   bytes and back
//! - [`StateStore`] is the byte-level store contract
//! - [`MemoryStore`] keeps snapshots in process, [`FileStore`] writes one JSON
//!   file per replica

mod codec;
mod error;
mod store;

pub use codec::{FORMAT_VERSION, JsonCodec, SnapshotEnvelope};
pub use error::{StorageError, StorageResult};
pub use store::{FileStore, MemoryStore, StateStore};

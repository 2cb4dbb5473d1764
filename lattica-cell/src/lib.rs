//! Concurrency wrapper and replica handles for lattica CRDTs.
//!
//! A [`TransactionalCell`] holds one state value and runs every read and
//! write against it as an atomic transaction: writers copy the current
//! snapshot, mutate the copy and commit only if nothing else committed in
//! between, retrying otherwise. Readers get an immutable `Arc` snapshot and
//! never block on a writer's closure.
//!
//! A [`Replica`] pairs a cell with a [`ReplicaConfig`] naming the owning
//! replica, the snapshot store and the codec. It exposes the per-type
//! operations (`increment`, `set`, `add`, ...) plus `query`, `merge` and
//! `persist`, each as exactly one transaction.
//!
//! ```
//! use lattica_cell::{Replica, ReplicaConfig};
//! use lattica_crdt::{PNCounter, ReplicaId};
//!
//! let a = Replica::<PNCounter>::open(ReplicaConfig::in_memory(ReplicaId::from("replica-1")))?;
//! let b = Replica::<PNCounter>::open(ReplicaConfig::in_memory(ReplicaId::from("replica-2")))?;
//! a.increment(10)?;
//! b.decrement(3)?;
//! a.merge(&b.query()?)?;
//! assert_eq!(a.value()?, 7);
//! # Ok::<(), lattica_cell::CellError>(())
//! ```

mod cell;
mod config;
mod error;
mod replica;

pub use cell::TransactionalCell;
pub use config::{CellConfig, DEFAULT_MAX_RETRIES, ReplicaConfig};
pub use error::{CellError, CellResult};
pub use replica::Replica;

//! State-based CRDT implementations for lattica.
//!
//! This crate provides Conflict-free Replicated Data Types that synchronize
//! by exchanging full state snapshots:
//!
//! - [`GCounter`]: increment-only counter, one slot per replica
//! - [`PNCounter`]: signed counter built from two `GCounter`s
//! - [`LWWRegister<V>`]: Last-Writer-Wins register with tombstones
//! - [`LWWMap<K, V>`]: map of keys to LWW registers
//! - [`ORMap<K, V>`]: observed-remove map whose removals cannot be undone
//!   by clock skew
//!
//! Every type implements [`Lattice`], whose `merge` satisfies:
//! - **Commutative**: merge(a, b) == merge(b, a)
//! - **Associative**: merge(merge(a, b), c) == merge(a, merge(b, c))
//! - **Idempotent**: merge(a, a) == a
//!
//! These properties ensure that replicas converge to the same state
//! regardless of the order, duplication, or loss of the snapshots they exchange.

mod error;
mod g_counter;
mod lattice;
mod lww_map;
mod lww_register;
pub mod merge_utils;
mod or_map;
mod pn_counter;
mod state;

pub use error::{CrdtError, CrdtResult};
pub use g_counter::GCounter;
pub use lattice::Lattice;
pub use lww_map::LWWMap;
pub use lww_register::LWWRegister;
pub use or_map::{Dot, ORMap};
pub use pn_counter::PNCounter;
pub use state::{CrdtKind, CrdtState, Init, Replicated};

pub use lattica_types::{HybridTimestamp, ReplicaId};

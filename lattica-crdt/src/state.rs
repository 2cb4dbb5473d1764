//! Tagged state union and the traits the replica layer builds on.

use lattica_types::ReplicaId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;

use crate::{CrdtError, CrdtResult, GCounter, LWWMap, Lattice, ORMap, PNCounter};

/// Discriminant of a persisted CRDT state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CrdtKind {
    GCounter,
    PNCounter,
    LWWMap,
    ORMap,
}

impl fmt::Display for CrdtKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::GCounter => "GCounter",
            Self::PNCounter => "PNCounter",
            Self::LWWMap => "LWWMap",
            Self::ORMap => "ORMap",
        };
        f.write_str(name)
    }
}

/// A CRDT state owned by one replica.
///
/// Implemented by every state type that can live in a replica and be
/// persisted. `try_merge` is infallible for the concrete types; only
/// [`CrdtState`] can fail, when the two tags differ.
pub trait Replicated: Clone + Send + Sync + 'static {
    /// The discriminant of this state.
    fn kind(&self) -> CrdtKind;

    /// The replica that owns this state.
    fn replica_id(&self) -> &ReplicaId;

    /// Merges a snapshot from another replica into this state.
    fn try_merge(&mut self, other: &Self) -> CrdtResult<()>;

    /// Checks structural invariants of a state decoded from untrusted bytes.
    fn validate(&self) -> CrdtResult<()> {
        Ok(())
    }
}

/// Fresh-state constructor for a replica.
pub trait Init {
    fn init(replica_id: ReplicaId) -> Self;
}

/// Any persisted CRDT state, tagged by type.
///
/// Maps default to string keys and JSON values, which is what a schemaless
/// store holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CrdtState<K = String, V = serde_json::Value>
where
    K: Eq + Hash,
{
    GCounter(GCounter),
    PNCounter(PNCounter),
    LWWMap(LWWMap<K, V>),
    ORMap(ORMap<K, V>),
}

impl<K, V> CrdtState<K, V>
where
    K: Eq + Hash,
{
    /// Returns the discriminant of this state.
    #[must_use]
    pub fn kind(&self) -> CrdtKind {
        match self {
            Self::GCounter(_) => CrdtKind::GCounter,
            Self::PNCounter(_) => CrdtKind::PNCounter,
            Self::LWWMap(_) => CrdtKind::LWWMap,
            Self::ORMap(_) => CrdtKind::ORMap,
        }
    }

    /// Returns the owning replica.
    #[must_use]
    pub fn replica_id(&self) -> &ReplicaId {
        match self {
            Self::GCounter(c) => c.replica_id(),
            Self::PNCounter(c) => c.replica_id(),
            Self::LWWMap(m) => m.replica_id(),
            Self::ORMap(m) => m.replica_id(),
        }
    }
}

impl<K, V> Replicated for CrdtState<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn kind(&self) -> CrdtKind {
        CrdtState::kind(self)
    }

    fn replica_id(&self) -> &ReplicaId {
        CrdtState::replica_id(self)
    }

    fn try_merge(&mut self, other: &Self) -> CrdtResult<()> {
        let expected = CrdtState::kind(self);
        match (self, other) {
            (Self::GCounter(a), Self::GCounter(b)) => a.merge(b),
            (Self::PNCounter(a), Self::PNCounter(b)) => a.merge(b),
            (Self::LWWMap(a), Self::LWWMap(b)) => a.merge(b),
            (Self::ORMap(a), Self::ORMap(b)) => a.merge(b),
            (_, other) => {
                return Err(CrdtError::TypeMismatch {
                    expected,
                    found: other.kind(),
                });
            }
        }
        Ok(())
    }

    fn validate(&self) -> CrdtResult<()> {
        match self {
            Self::GCounter(c) => c.validate(),
            Self::PNCounter(c) => c.validate(),
            Self::LWWMap(m) => m.validate(),
            Self::ORMap(m) => m.validate(),
        }
    }
}

impl<K: Eq + Hash, V> From<GCounter> for CrdtState<K, V> {
    fn from(counter: GCounter) -> Self {
        Self::GCounter(counter)
    }
}

impl<K: Eq + Hash, V> From<PNCounter> for CrdtState<K, V> {
    fn from(counter: PNCounter) -> Self {
        Self::PNCounter(counter)
    }
}

impl<K: Eq + Hash, V> From<LWWMap<K, V>> for CrdtState<K, V> {
    fn from(map: LWWMap<K, V>) -> Self {
        Self::LWWMap(map)
    }
}

impl<K: Eq + Hash, V> From<ORMap<K, V>> for CrdtState<K, V> {
    fn from(map: ORMap<K, V>) -> Self {
        Self::ORMap(map)
    }
}

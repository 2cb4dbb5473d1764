//! Last-Writer-Wins Register (LWW-Register).
//!
//! A CRDT that stores a single value or a tombstone. Concurrent writes are
//! resolved by comparing `(timestamp, replica_id)` stamps; the greater stamp
//! wins. Stamps are totally ordered, so merge is a semilattice join.
//!
//! Use cases:
//! - Single-value properties
//! - The per-key cells of [`LWWMap`](crate::LWWMap) and [`ORMap`](crate::ORMap)

use lattica_types::{HybridTimestamp, ReplicaId};
use serde::{Deserialize, Serialize};

use crate::Lattice;

/// A Last-Writer-Wins Register.
///
/// Stores an optional value of type `V` along with metadata for conflict
/// resolution; `None` is a tombstone. When two replicas hold different
/// states, the one with the higher timestamp wins. If timestamps are equal,
/// the greater replica id breaks the tie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LWWRegister<V> {
    /// The current value, `None` once removed.
    value: Option<V>,
    /// Timestamp of the last write.
    timestamp: HybridTimestamp,
    /// Replica that performed the last write.
    replica_id: ReplicaId,
}

impl<V> LWWRegister<V> {
    /// Creates a new register with the given initial value.
    #[must_use]
    pub fn new(value: V, replica_id: ReplicaId) -> Self {
        Self::with_timestamp(value, HybridTimestamp::now(), replica_id)
    }

    /// Creates a register with explicit timestamp (for testing or replay).
    #[must_use]
    pub fn with_timestamp(value: V, timestamp: HybridTimestamp, replica_id: ReplicaId) -> Self {
        Self {
            value: Some(value),
            timestamp,
            replica_id,
        }
    }

    /// Creates a tombstone register.
    #[must_use]
    pub fn tombstone(timestamp: HybridTimestamp, replica_id: ReplicaId) -> Self {
        Self {
            value: None,
            timestamp,
            replica_id,
        }
    }

    /// Returns the current value, or `None` for a tombstone.
    #[must_use]
    pub fn value(&self) -> Option<&V> {
        self.value.as_ref()
    }

    /// Consumes the register and returns its value.
    #[must_use]
    pub fn into_value(self) -> Option<V> {
        self.value
    }

    /// Returns true if the register holds a tombstone.
    #[must_use]
    pub fn is_tombstone(&self) -> bool {
        self.value.is_none()
    }

    /// Returns the timestamp of the last write.
    #[must_use]
    pub fn timestamp(&self) -> HybridTimestamp {
        self.timestamp
    }

    /// Returns the replica that performed the last write.
    #[must_use]
    pub fn replica_id(&self) -> &ReplicaId {
        &self.replica_id
    }

    /// Returns the `(timestamp, replica_id)` stamp that orders writes.
    #[must_use]
    pub fn stamp(&self) -> (HybridTimestamp, &ReplicaId) {
        (self.timestamp, &self.replica_id)
    }

    /// Sets a new value, updating the timestamp.
    ///
    /// The timestamp is ticked from the current one, so the write wins over
    /// everything this register has seen even if the system clock hasn't
    /// advanced.
    pub fn set(&mut self, value: V, replica_id: ReplicaId) {
        self.write(Some(value), replica_id);
    }

    /// Replaces the value with a tombstone, updating the timestamp.
    pub fn remove(&mut self, replica_id: ReplicaId) {
        self.write(None, replica_id);
    }

    /// Sets a new value with an explicit timestamp.
    ///
    /// Only updates if the new stamp is greater than the current one.
    /// Returns true if the value was updated.
    pub fn set_with_timestamp(
        &mut self,
        value: V,
        timestamp: HybridTimestamp,
        replica_id: ReplicaId,
    ) -> bool {
        self.write_with_timestamp(Some(value), timestamp, replica_id)
    }

    /// Writes a tombstone with an explicit timestamp.
    ///
    /// Returns true if the tombstone won.
    pub fn remove_with_timestamp(
        &mut self,
        timestamp: HybridTimestamp,
        replica_id: ReplicaId,
    ) -> bool {
        self.write_with_timestamp(None, timestamp, replica_id)
    }

    fn write(&mut self, value: Option<V>, replica_id: ReplicaId) {
        self.value = value;
        self.timestamp = self.timestamp.tick();
        self.replica_id = replica_id;
    }

    fn write_with_timestamp(
        &mut self,
        value: Option<V>,
        timestamp: HybridTimestamp,
        replica_id: ReplicaId,
    ) -> bool {
        if self.should_update(timestamp, &replica_id) {
            self.value = value;
            self.timestamp = timestamp;
            self.replica_id = replica_id;
            true
        } else {
            false
        }
    }

    /// Determines if an incoming write should win over the current state.
    fn should_update(&self, timestamp: HybridTimestamp, replica_id: &ReplicaId) -> bool {
        (timestamp, replica_id) > (self.timestamp, &self.replica_id)
    }
}

impl<V: Clone> Lattice for LWWRegister<V> {
    /// Keeps the state with the greater `(timestamp, replica_id)` stamp.
    ///
    /// An exact tie only happens when the same write is delivered twice, in
    /// which case both sides are identical and the local one is kept.
    fn merge(&mut self, other: &Self) {
        if self.should_update(other.timestamp, &other.replica_id) {
            self.value = other.value.clone();
            self.timestamp = other.timestamp;
            self.replica_id = other.replica_id.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tombstone_has_no_value() {
        let reg: LWWRegister<u8> =
            LWWRegister::tombstone(HybridTimestamp::new(1, 0), ReplicaId::from("a"));
        assert!(reg.is_tombstone());
        assert_eq!(reg.value(), None);
    }

    #[test]
    fn remove_ticks_past_current_stamp() {
        let a = ReplicaId::from("a");
        let mut reg = LWWRegister::with_timestamp(1, HybridTimestamp::new(u64::MAX / 2, 0), a.clone());
        reg.remove(a);
        assert!(reg.is_tombstone());
        assert_eq!(reg.timestamp(), HybridTimestamp::new(u64::MAX / 2, 1));
    }

    #[test]
    fn newer_tombstone_beats_value() {
        let a = ReplicaId::from("a");
        let b = ReplicaId::from("b");
        let value = LWWRegister::with_timestamp("x", HybridTimestamp::new(1, 0), a);
        let tomb = LWWRegister::tombstone(HybridTimestamp::new(2, 0), b);

        assert!(value.merged(&tomb).is_tombstone());
        assert!(tomb.merged(&value).is_tombstone());
    }

    #[test]
    fn stamp_tie_breaks_on_replica_id() {
        let ts = HybridTimestamp::new(5, 0);
        let a = LWWRegister::with_timestamp("x", ts, ReplicaId::from("replica-a"));
        let b = LWWRegister::with_timestamp("y", ts, ReplicaId::from("replica-b"));
        assert_eq!(a.merged(&b).value(), Some(&"y"));
        assert_eq!(b.merged(&a).value(), Some(&"y"));
    }
}

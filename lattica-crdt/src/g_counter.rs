//! Grow-only Counter CRDT.
//!
//! Each replica owns one slot and only ever raises it. The counter value is
//! the sum of all slots; merge takes the per-replica maximum, so no merge can
//! ever lose an increment.

use lattica_types::ReplicaId;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::merge_utils::merge_maps_into;
use crate::{CrdtError, CrdtKind, CrdtResult, Init, Lattice, Replicated};

/// A Grow-only Counter CRDT.
///
/// The owning replica id decides which slot local increments land in; it is
/// not part of the replicated value, so two counters compare equal when their
/// slots do.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GCounter {
    replica_id: ReplicaId,
    counts: HashMap<ReplicaId, u64>,
}

impl GCounter {
    /// Creates a new counter with value 0, owned by `replica_id`.
    #[must_use]
    pub fn new(replica_id: ReplicaId) -> Self {
        Self {
            replica_id,
            counts: HashMap::new(),
        }
    }

    /// Returns the owning replica.
    #[must_use]
    pub fn replica_id(&self) -> &ReplicaId {
        &self.replica_id
    }

    /// Returns all per-replica slots.
    #[must_use]
    pub fn counts(&self) -> &HashMap<ReplicaId, u64> {
        &self.counts
    }

    /// Returns the slot for one replica (0 if absent).
    #[must_use]
    pub fn count_for(&self, replica_id: &ReplicaId) -> u64 {
        self.counts.get(replica_id).copied().unwrap_or(0)
    }

    /// Increments this replica's slot by `amount`.
    ///
    /// Fails with [`CrdtError::InvalidAmount`] for negative input and
    /// [`CrdtError::Overflow`] when the slot would exceed `u64::MAX`; the
    /// counter is unchanged on failure.
    pub fn increment(&mut self, amount: i64) -> CrdtResult<()> {
        let amount = u64::try_from(amount).map_err(|_| CrdtError::InvalidAmount(amount))?;
        let next = self
            .count_for(&self.replica_id)
            .checked_add(amount)
            .ok_or(CrdtError::Overflow)?;
        self.counts.insert(self.replica_id.clone(), next);
        Ok(())
    }

    /// Returns the counter value (sum of all slots, saturating).
    #[must_use]
    pub fn value(&self) -> u64 {
        self.counts
            .values()
            .fold(0u64, |acc, &count| acc.saturating_add(count))
    }
}

impl Lattice for GCounter {
    fn merge(&mut self, other: &Self) {
        merge_maps_into(&mut self.counts, &other.counts);
    }
}

impl Init for GCounter {
    fn init(replica_id: ReplicaId) -> Self {
        Self::new(replica_id)
    }
}

impl Replicated for GCounter {
    fn kind(&self) -> CrdtKind {
        CrdtKind::GCounter
    }

    fn replica_id(&self) -> &ReplicaId {
        &self.replica_id
    }

    fn try_merge(&mut self, other: &Self) -> CrdtResult<()> {
        self.merge(other);
        Ok(())
    }

    fn validate(&self) -> CrdtResult<()> {
        if self.replica_id.is_blank() || self.counts.keys().any(ReplicaId::is_blank) {
            return Err(CrdtError::Invalid("blank replica id in g-counter".into()));
        }
        Ok(())
    }
}

impl PartialEq for GCounter {
    fn eq(&self, other: &Self) -> bool {
        // Missing slots count as zero
        let all_replicas: HashSet<_> = self.counts.keys().chain(other.counts.keys()).collect();
        all_replicas
            .into_iter()
            .all(|replica| self.count_for(replica) == other.count_for(replica))
    }
}

impl Eq for GCounter {}

#[cfg(test)]
mod tests {
    use super::*;

    fn replica(name: &str) -> ReplicaId {
        ReplicaId::from(name)
    }

    #[test]
    fn new_counter_is_zero() {
        let c = GCounter::new(replica("r1"));
        assert_eq!(c.value(), 0);
        assert_eq!(c.count_for(&replica("r1")), 0);
    }

    #[test]
    fn increment_only_touches_own_slot() {
        let mut c = GCounter::new(replica("r1"));
        c.increment(5).unwrap();
        c.increment(3).unwrap();
        assert_eq!(c.value(), 8);
        assert_eq!(c.counts().len(), 1);
        assert_eq!(c.count_for(&replica("r1")), 8);
    }

    #[test]
    fn negative_increment_is_rejected() {
        let mut c = GCounter::new(replica("r1"));
        c.increment(4).unwrap();
        assert_eq!(c.increment(-1), Err(CrdtError::InvalidAmount(-1)));
        assert_eq!(c.value(), 4);
    }

    #[test]
    fn overflow_is_rejected_without_change() {
        let mut c = GCounter::new(replica("r1"));
        c.increment(i64::MAX).unwrap();
        c.increment(i64::MAX).unwrap();
        c.increment(1).unwrap();
        let before = c.clone();
        assert_eq!(c.increment(1), Err(CrdtError::Overflow));
        assert_eq!(c, before);
    }

    #[test]
    fn merge_takes_max_per_replica() {
        let mut a = GCounter::new(replica("r1"));
        a.increment(5).unwrap();
        let mut b = a.clone();
        b.increment(2).unwrap();

        let mut stale = GCounter::new(replica("r2"));
        stale.merge(&a);
        stale.merge(&b);
        stale.merge(&a);
        assert_eq!(stale.value(), 7);
    }

    #[test]
    fn equality_ignores_owner_and_zero_slots() {
        let mut a = GCounter::new(replica("r1"));
        a.increment(0).unwrap();
        let b = GCounter::new(replica("r2"));
        assert_eq!(a, b);
    }
}

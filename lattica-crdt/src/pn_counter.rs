//! Positive-Negative Counter CRDT.
//!
//! A PN-Counter supports both increment and decrement operations across
//! distributed replicas. It is two [`GCounter`]s, one for increments and one
//! for decrements. The value is `sum(increments) - sum(decrements)`.
//!
//! Satisfies commutativity, associativity, and idempotency for merge.

use lattica_types::ReplicaId;
use serde::{Deserialize, Serialize};

use crate::{CrdtError, CrdtKind, CrdtResult, GCounter, Init, Lattice, Replicated};

/// A Positive-Negative Counter CRDT.
///
/// Each replica tracks its own increments and decrements independently.
/// The counter value is the difference between all increments and all decrements.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PNCounter {
    replica_id: ReplicaId,
    increments: GCounter,
    decrements: GCounter,
}

impl PNCounter {
    /// Creates a new counter with value 0.
    #[must_use]
    pub fn new(replica_id: ReplicaId) -> Self {
        Self {
            increments: GCounter::new(replica_id.clone()),
            decrements: GCounter::new(replica_id.clone()),
            replica_id,
        }
    }

    /// Returns the owning replica.
    #[must_use]
    pub fn replica_id(&self) -> &ReplicaId {
        &self.replica_id
    }

    /// Increments the counter by `amount`.
    pub fn increment(&mut self, amount: i64) -> CrdtResult<()> {
        self.increments.increment(amount)
    }

    /// Decrements the counter by `amount`.
    pub fn decrement(&mut self, amount: i64) -> CrdtResult<()> {
        self.decrements.increment(amount)
    }

    /// Returns the current counter value (may be negative).
    #[must_use]
    pub fn value(&self) -> i64 {
        let pos = i128::from(self.increments.value());
        let neg = i128::from(self.decrements.value());
        let diff = pos - neg;
        i64::try_from(diff).unwrap_or(if diff > 0 { i64::MAX } else { i64::MIN })
    }

    /// Returns the increment half.
    #[must_use]
    pub fn increments(&self) -> &GCounter {
        &self.increments
    }

    /// Returns the decrement half.
    #[must_use]
    pub fn decrements(&self) -> &GCounter {
        &self.decrements
    }
}

impl Lattice for PNCounter {
    /// Merges both halves; callers holding the counter behind a cell see
    /// either none or both of them merged.
    fn merge(&mut self, other: &Self) {
        self.increments.merge(&other.increments);
        self.decrements.merge(&other.decrements);
    }
}

impl Init for PNCounter {
    fn init(replica_id: ReplicaId) -> Self {
        Self::new(replica_id)
    }
}

impl Replicated for PNCounter {
    fn kind(&self) -> CrdtKind {
        CrdtKind::PNCounter
    }

    fn replica_id(&self) -> &ReplicaId {
        &self.replica_id
    }

    fn try_merge(&mut self, other: &Self) -> CrdtResult<()> {
        self.merge(other);
        Ok(())
    }

    fn validate(&self) -> CrdtResult<()> {
        if self.increments.replica_id() != &self.replica_id
            || self.decrements.replica_id() != &self.replica_id
        {
            return Err(CrdtError::Invalid(format!(
                "pn-counter halves are not owned by {}",
                self.replica_id
            )));
        }
        self.increments.validate()?;
        self.decrements.validate()
    }
}

impl PartialEq for PNCounter {
    fn eq(&self, other: &Self) -> bool {
        self.increments == other.increments && self.decrements == other.decrements
    }
}

impl Eq for PNCounter {}

//! Last-Writer-Wins Map.
//!
//! A map from keys to [`LWWRegister`]s. Removing a key writes a tombstone
//! register instead of deleting the entry, so a removal can win over an
//! older concurrent write during merge.
//!
//! Known limitation: a remove racing a concurrent set that carries an equal
//! or greater stamp on another replica loses, even if the remove was issued
//! later in real time. [`ORMap`](crate::ORMap) avoids this.

use lattica_types::{HybridTimestamp, ReplicaId};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;

use crate::merge_utils::merge_maps_into;
use crate::{CrdtError, CrdtKind, CrdtResult, Init, LWWRegister, Lattice, Replicated};

/// A Last-Writer-Wins Map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LWWMap<K, V>
where
    K: Eq + Hash,
{
    replica_id: ReplicaId,
    entries: HashMap<K, LWWRegister<V>>,
}

impl<K, V> LWWMap<K, V>
where
    K: Eq + Hash,
{
    /// Creates an empty map owned by `replica_id`.
    #[must_use]
    pub fn new(replica_id: ReplicaId) -> Self {
        Self {
            replica_id,
            entries: HashMap::new(),
        }
    }

    /// Returns the owning replica.
    #[must_use]
    pub fn replica_id(&self) -> &ReplicaId {
        &self.replica_id
    }

    /// Sets `key` to `value`, stamped after anything this map has seen for `key`.
    pub fn set(&mut self, key: K, value: V) {
        let timestamp = self.next_timestamp(&key);
        self.entries.insert(
            key,
            LWWRegister::with_timestamp(value, timestamp, self.replica_id.clone()),
        );
    }

    /// Sets `key` to `value` at an explicit timestamp.
    ///
    /// Returns false if the current register for `key` carries a greater stamp.
    pub fn set_with_timestamp(&mut self, key: K, value: V, timestamp: HybridTimestamp) -> bool {
        let replica_id = self.replica_id.clone();
        match self.entries.get_mut(&key) {
            Some(register) => register.set_with_timestamp(value, timestamp, replica_id),
            None => {
                self.entries
                    .insert(key, LWWRegister::with_timestamp(value, timestamp, replica_id));
                true
            }
        }
    }

    /// Removes `key` by writing a tombstone.
    ///
    /// The tombstone is written even when the key is absent, so it also
    /// supersedes older writes this replica has not received yet.
    pub fn remove(&mut self, key: K) {
        let timestamp = self.next_timestamp(&key);
        self.entries.insert(
            key,
            LWWRegister::tombstone(timestamp, self.replica_id.clone()),
        );
    }

    /// Writes a tombstone for `key` at an explicit timestamp.
    ///
    /// Returns false if the current register for `key` carries a greater stamp.
    pub fn remove_with_timestamp(&mut self, key: K, timestamp: HybridTimestamp) -> bool {
        let replica_id = self.replica_id.clone();
        match self.entries.get_mut(&key) {
            Some(register) => register.remove_with_timestamp(timestamp, replica_id),
            None => {
                self.entries
                    .insert(key, LWWRegister::tombstone(timestamp, replica_id));
                true
            }
        }
    }

    /// Returns the live value for `key`.
    #[must_use]
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.get(key).and_then(LWWRegister::value)
    }

    /// Returns true if `key` holds a live value.
    #[must_use]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get(key).is_some()
    }

    /// Returns the register for `key`, including tombstones.
    #[must_use]
    pub fn register<Q>(&self, key: &Q) -> Option<&LWWRegister<V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.get(key)
    }

    /// Returns every register, including tombstones.
    #[must_use]
    pub fn registers(&self) -> &HashMap<K, LWWRegister<V>> {
        &self.entries
    }

    /// Returns the number of live keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Returns true if no key is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterates over live `(key, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.entries
            .iter()
            .filter_map(|(key, register)| register.value().map(|value| (key, value)))
    }

    /// Iterates over live keys.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.iter().map(|(key, _)| key)
    }

    fn next_timestamp(&self, key: &K) -> HybridTimestamp {
        self.entries
            .get(key)
            .map(|register| register.timestamp().tick())
            .unwrap_or_else(HybridTimestamp::now)
    }
}

impl<K, V> Lattice for LWWMap<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn merge(&mut self, other: &Self) {
        merge_maps_into(&mut self.entries, &other.entries);
    }
}

impl<K, V> Init for LWWMap<K, V>
where
    K: Eq + Hash,
{
    fn init(replica_id: ReplicaId) -> Self {
        Self::new(replica_id)
    }
}

impl<K, V> Replicated for LWWMap<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn kind(&self) -> CrdtKind {
        CrdtKind::LWWMap
    }

    fn replica_id(&self) -> &ReplicaId {
        &self.replica_id
    }

    fn try_merge(&mut self, other: &Self) -> CrdtResult<()> {
        self.merge(other);
        Ok(())
    }

    fn validate(&self) -> CrdtResult<()> {
        if self.replica_id.is_blank() {
            return Err(CrdtError::Invalid("blank replica id in lww-map".into()));
        }
        if self
            .entries
            .values()
            .any(|register| register.replica_id().is_blank())
        {
            return Err(CrdtError::Invalid("lww-map register without a writer".into()));
        }
        Ok(())
    }
}

impl<K, V> PartialEq for LWWMap<K, V>
where
    K: Eq + Hash,
    V: PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl<K, V> Eq for LWWMap<K, V>
where
    K: Eq + Hash,
    V: Eq,
{
}

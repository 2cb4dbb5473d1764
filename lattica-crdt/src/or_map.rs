//! Observed-Remove Map (OR-Map).
//!
//! A map that supports add, remove and re-add without letting a remove
//! resurrect or suppress the wrong writes because of clock skew.
//!
//! Each add creates a unique [`Dot`] `(replica_id, version)` and records the
//! written value under it. A remove records every dot it observed for the key
//! in the key's causal context (the tombstone set). A key is live while at
//! least one of its dots is not covered by the causal context; its value is
//! the last-writer-wins pick among the uncovered adds. Adds the remover never
//! saw carry dots outside the tombstone set and survive the merge.

use lattica_types::{HybridTimestamp, ReplicaId};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Borrow;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::Hash;
use std::str::FromStr;

use crate::merge_utils::merge_maps_into;
use crate::{CrdtError, CrdtKind, CrdtResult, Init, LWWRegister, Lattice, Replicated};

/// Dot versions reserved for each millisecond of add timestamp.
const VERSIONS_PER_MILLI: u64 = 1 << 16;

/// Identifies a single add operation: the adding replica and its version.
///
/// Serialized as `"<replica_id>:<version>"` so dots can key JSON objects.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Dot {
    pub replica_id: ReplicaId,
    pub version: u64,
}

impl Dot {
    #[must_use]
    pub fn new(replica_id: ReplicaId, version: u64) -> Self {
        Self {
            replica_id,
            version,
        }
    }
}

impl fmt::Display for Dot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.replica_id, self.version)
    }
}

impl FromStr for Dot {
    type Err = CrdtError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (replica, version) = s
            .rsplit_once(':')
            .ok_or_else(|| CrdtError::Invalid(format!("malformed dot {s:?}")))?;
        let version = version
            .parse()
            .map_err(|_| CrdtError::Invalid(format!("malformed dot version in {s:?}")))?;
        let replica_id =
            ReplicaId::parse(replica).map_err(|e| CrdtError::Invalid(e.to_string()))?;
        Ok(Self::new(replica_id, version))
    }
}

impl Serialize for Dot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Dot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// An Observed-Remove Map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ORMap<K, V>
where
    K: Eq + Hash,
{
    replica_id: ReplicaId,
    /// Uncovered add observations per key.
    entries: HashMap<K, HashMap<Dot, LWWRegister<V>>>,
    /// Dots superseded by removals, per key. Only ever grows.
    causal_context: HashMap<K, HashSet<Dot>>,
}

impl<K, V> ORMap<K, V>
where
    K: Eq + Hash,
{
    /// Creates an empty map owned by `replica_id`.
    #[must_use]
    pub fn new(replica_id: ReplicaId) -> Self {
        Self {
            replica_id,
            entries: HashMap::new(),
            causal_context: HashMap::new(),
        }
    }

    /// Returns the owning replica.
    #[must_use]
    pub fn replica_id(&self) -> &ReplicaId {
        &self.replica_id
    }

    /// Adds `key -> value` and returns the dot that identifies this add.
    pub fn add(&mut self, key: K, value: V) -> Dot {
        let timestamp = self.next_timestamp(&key);
        let dot = Dot::new(self.replica_id.clone(), self.next_version(&key, timestamp));
        let register = LWWRegister::with_timestamp(value, timestamp, self.replica_id.clone());
        self.entries
            .entry(key)
            .or_default()
            .insert(dot.clone(), register);
        dot
    }

    /// Removes `key`, tombstoning every add observed for it.
    ///
    /// Returns the dots that were superseded, sorted. Removing a key that is
    /// not live records nothing.
    pub fn remove<Q>(&mut self, key: &Q) -> Vec<Dot>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let Some((key, adds)) = self.entries.remove_entry(key) else {
            return Vec::new();
        };
        let mut removed: Vec<Dot> = adds.into_keys().collect();
        removed.sort();
        self.causal_context
            .entry(key)
            .or_default()
            .extend(removed.iter().cloned());
        removed
    }

    /// Returns the live value for `key`.
    #[must_use]
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.live_register(key).and_then(LWWRegister::value)
    }

    /// Returns true if `key` is live.
    #[must_use]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.live_register(key).is_some()
    }

    /// Returns the winning register among the uncovered adds for `key`.
    #[must_use]
    pub fn live_register<Q>(&self, key: &Q) -> Option<&LWWRegister<V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let adds = self.entries.get(key)?;
        let context = self.causal_context.get(key);
        adds.iter()
            .filter(|(dot, _)| !context.is_some_and(|tombstones| tombstones.contains(*dot)))
            .max_by(|(dot_a, a), (dot_b, b)| {
                a.stamp().cmp(&b.stamp()).then_with(|| dot_a.cmp(dot_b))
            })
            .map(|(_, register)| register)
    }

    /// Returns the dots of the uncovered adds for `key`.
    #[must_use]
    pub fn observed<Q>(&self, key: &Q) -> HashSet<Dot>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries
            .get(key)
            .map(|adds| adds.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Returns the tombstone set recorded for `key`.
    #[must_use]
    pub fn causal_context<Q>(&self, key: &Q) -> Option<&HashSet<Dot>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.causal_context.get(key)
    }

    /// Returns the number of live keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys().count()
    }

    /// Returns true if no key is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterates over live `(key, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.entries
            .keys()
            .filter_map(|key| self.get(key).map(|value| (key, value)))
    }

    /// Iterates over live keys.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.iter().map(|(key, _)| key)
    }

    /// Above every version recorded for `key` by any replica, and no lower
    /// than the add's clock reading. The clock floor keeps a replica that
    /// restarted from an older snapshot from reissuing a dot its peers
    /// already hold.
    fn next_version(&self, key: &K, timestamp: HybridTimestamp) -> u64 {
        let live = self.entries.get(key).into_iter().flat_map(|adds| adds.keys());
        let removed = self.causal_context.get(key).into_iter().flatten();
        let recorded = live.chain(removed).map(|dot| dot.version).max().unwrap_or(0);
        recorded.saturating_add(1).max(clock_version(timestamp))
    }

    fn next_timestamp(&self, key: &K) -> HybridTimestamp {
        self.entries
            .get(key)
            .and_then(|adds| adds.values().map(LWWRegister::timestamp).max())
            .map(|latest| latest.tick())
            .unwrap_or_else(HybridTimestamp::now)
    }

    /// Drops adds covered by the causal context and keys left without adds.
    fn prune(&mut self) {
        for (key, adds) in &mut self.entries {
            if let Some(tombstones) = self.causal_context.get(key) {
                adds.retain(|dot, _| !tombstones.contains(dot));
            }
        }
        self.entries.retain(|_, adds| !adds.is_empty());
    }
}

fn clock_version(timestamp: HybridTimestamp) -> u64 {
    let logical = u64::from(timestamp.logical()).min(VERSIONS_PER_MILLI - 1);
    timestamp
        .wall_time()
        .saturating_mul(VERSIONS_PER_MILLI)
        .saturating_add(logical)
}

impl<K, V> Lattice for ORMap<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Unions the causal contexts, merges the add observations register by
    /// register, then recomputes liveness from the merged context.
    fn merge(&mut self, other: &Self) {
        merge_maps_into(&mut self.causal_context, &other.causal_context);
        merge_maps_into(&mut self.entries, &other.entries);
        self.prune();
    }
}

impl<K, V> Init for ORMap<K, V>
where
    K: Eq + Hash,
{
    fn init(replica_id: ReplicaId) -> Self {
        Self::new(replica_id)
    }
}

impl<K, V> Replicated for ORMap<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn kind(&self) -> CrdtKind {
        CrdtKind::ORMap
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
            return Err(CrdtError::Invalid("blank replica id in or-map".into()));
        }
        for (key, adds) in &self.entries {
            if adds.is_empty() {
                return Err(CrdtError::Invalid("or-map key without adds".into()));
            }
            let tombstones = self.causal_context.get(key);
            for (dot, register) in adds {
                if register.replica_id() != &dot.replica_id {
                    return Err(CrdtError::Invalid(format!(
                        "add {dot} was written by {}",
                        register.replica_id()
                    )));
                }
                if register.is_tombstone() {
                    return Err(CrdtError::Invalid(format!("add {dot} holds a tombstone")));
                }
                if tombstones.is_some_and(|t| t.contains(dot)) {
                    return Err(CrdtError::Invalid(format!("add {dot} is already removed")));
                }
            }
        }
        if self.causal_context.values().any(HashSet::is_empty) {
            return Err(CrdtError::Invalid("or-map empty causal context".into()));
        }
        Ok(())
    }
}

impl<K, V> PartialEq for ORMap<K, V>
where
    K: Eq + Hash,
    V: PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries && self.causal_context == other.causal_context
    }
}

impl<K, V> Eq for ORMap<K, V>
where
    K: Eq + Hash,
    V: Eq,
{
}

//! Replica handles: a cell plus the config that names its owner and store.

use lattica_crdt::{
    CrdtKind, CrdtState, Dot, GCounter, HybridTimestamp, Init, LWWMap, ORMap, PNCounter, Replicated,
};
use lattica_types::ReplicaId;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::borrow::Borrow;
use std::hash::Hash;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::{CellError, CellResult, ReplicaConfig, TransactionalCell};

/// One replica's copy of a CRDT, safe to share between threads.
///
/// Every operation is a single transaction on the underlying cell, so
/// composite merges (both halves of a PN-counter, the context and entries of
/// an OR-map) are never observed half applied.
#[derive(Debug)]
pub struct Replica<C> {
    config: ReplicaConfig,
    cell: TransactionalCell<C>,
}

impl<C> Replica<C>
where
    C: Replicated + Serialize + DeserializeOwned,
{
    /// Loads the persisted state for the configured replica, or starts fresh.
    ///
    /// A snapshot that fails to decode is an error; it is never replaced by
    /// a fresh state.
    pub fn open(config: ReplicaConfig) -> CellResult<Self>
    where
        C: Init,
    {
        Self::open_with(config, C::init)
    }

    /// Like [`open`](Self::open), building the fresh state with `init`.
    pub fn open_with(
        config: ReplicaConfig,
        init: impl FnOnce(ReplicaId) -> C,
    ) -> CellResult<Self> {
        match load_state(&config)? {
            Some(state) => Ok(Self::wrap(config, state)),
            None => {
                debug!("No snapshot for {}, starting fresh", config.replica_id);
                let state = init(config.replica_id.clone());
                Self::from_state(config, state)
            }
        }
    }

    /// Loads the persisted state for the configured replica, if any.
    pub fn load(config: ReplicaConfig) -> CellResult<Option<Self>> {
        Ok(load_state(&config)?.map(|state| Self::wrap(config, state)))
    }

    /// Wraps an existing state, which must be owned by the configured replica.
    pub fn from_state(config: ReplicaConfig, state: C) -> CellResult<Self> {
        ensure_owner(&config.replica_id, &state)?;
        state.validate()?;
        Ok(Self::wrap(config, state))
    }

    fn wrap(config: ReplicaConfig, state: C) -> Self {
        let cell = TransactionalCell::with_config(state, config.cell);
        Self { config, cell }
    }

    /// Returns the owning replica.
    pub fn replica_id(&self) -> &ReplicaId {
        &self.config.replica_id
    }

    /// Returns the construction config.
    pub fn config(&self) -> &ReplicaConfig {
        &self.config
    }

    /// Returns a copy of the full state, suitable for sending to peers.
    pub fn query(&self) -> CellResult<C> {
        self.cell.get()
    }

    /// Returns the committed state without copying it.
    pub fn snapshot(&self) -> CellResult<Arc<C>> {
        self.cell.snapshot()
    }

    /// Merges a peer's snapshot into this replica in one transaction.
    pub fn merge(&self, other: &C) -> CellResult<()> {
        other.validate()?;
        self.cell.transact(|state| Ok(state.try_merge(other)?))?;
        debug!("Merged {} snapshot from {}", other.kind(), other.replica_id());
        Ok(())
    }

    /// Runs an arbitrary transaction against the state.
    pub fn transact<R>(&self, f: impl FnMut(&mut C) -> CellResult<R>) -> CellResult<R> {
        self.cell.transact(f)
    }

    /// Saves the committed state to the configured store.
    pub fn persist(&self) -> CellResult<()> {
        let snapshot = self.cell.snapshot()?;
        let bytes = self.config.codec.encode(&*snapshot)?;
        self.config.store.save(&self.config.replica_id, &bytes)?;
        debug!(
            "Persisted {} for {} ({} bytes)",
            snapshot.kind(),
            self.config.replica_id,
            bytes.len()
        );
        Ok(())
    }

    /// Returns the number of commits since this handle was created.
    pub fn version(&self) -> CellResult<u64> {
        self.cell.version()
    }
}

fn load_state<C>(config: &ReplicaConfig) -> CellResult<Option<C>>
where
    C: Replicated + DeserializeOwned,
{
    let Some(bytes) = config.store.load(&config.replica_id)? else {
        return Ok(None);
    };
    let state: C = config.codec.decode(&bytes).inspect_err(|e| {
        warn!("Snapshot for {} failed to decode: {}", config.replica_id, e);
    })?;
    ensure_owner(&config.replica_id, &state)?;
    debug!("Loaded {} for {}", state.kind(), config.replica_id);
    Ok(Some(state))
}

fn ensure_owner<C: Replicated>(expected: &ReplicaId, state: &C) -> CellResult<()> {
    if state.replica_id() == expected {
        Ok(())
    } else {
        Err(CellError::ReplicaMismatch {
            expected: expected.clone(),
            found: state.replica_id().clone(),
        })
    }
}

// ── Counters ─────────────────────────────────────────────────────

impl Replica<GCounter> {
    /// Adds `amount` to this replica's slot. Negative amounts fail with
    /// `InvalidAmount` and leave the counter unchanged.
    pub fn increment(&self, amount: i64) -> CellResult<()> {
        self.cell.transact(|c| Ok(c.increment(amount)?))
    }

    /// Returns the sum over all replicas.
    pub fn value(&self) -> CellResult<u64> {
        self.cell.read(GCounter::value)
    }
}

impl Replica<PNCounter> {
    /// Adds `amount` to the increment half. Negative amounts fail with
    /// `InvalidAmount`.
    pub fn increment(&self, amount: i64) -> CellResult<()> {
        self.cell.transact(|c| Ok(c.increment(amount)?))
    }

    /// Adds `amount` to the decrement half. Negative amounts fail with
    /// `InvalidAmount`.
    pub fn decrement(&self, amount: i64) -> CellResult<()> {
        self.cell.transact(|c| Ok(c.decrement(amount)?))
    }

    /// Returns increments minus decrements, saturating at the `i64` range.
    pub fn value(&self) -> CellResult<i64> {
        self.cell.read(PNCounter::value)
    }
}

// ── Maps ─────────────────────────────────────────────────────────

impl<K, V> Replica<LWWMap<K, V>>
where
    K: Eq + Hash + Clone + Send + Sync + Serialize + DeserializeOwned + 'static,
    V: Clone + Send + Sync + Serialize + DeserializeOwned + 'static,
{
    /// Writes `key -> value`, stamped after the key's current write.
    pub fn set(&self, key: K, value: V) -> CellResult<()> {
        self.cell.transact(|m| {
            m.set(key.clone(), value.clone());
            Ok(())
        })
    }

    /// Writes `key -> value` at `timestamp`. Returns false if a newer write
    /// already holds the key.
    pub fn set_at(&self, key: K, value: V, timestamp: HybridTimestamp) -> CellResult<bool> {
        self.cell
            .transact(|m| Ok(m.set_with_timestamp(key.clone(), value.clone(), timestamp)))
    }

    /// Tombstones `key`.
    pub fn remove(&self, key: K) -> CellResult<()> {
        self.cell.transact(|m| {
            m.remove(key.clone());
            Ok(())
        })
    }

    /// Tombstones `key` at `timestamp`. Returns false if a newer write
    /// already holds the key.
    pub fn remove_at(&self, key: K, timestamp: HybridTimestamp) -> CellResult<bool> {
        self.cell
            .transact(|m| Ok(m.remove_with_timestamp(key.clone(), timestamp)))
    }

    /// Returns the live value for `key`.
    pub fn get<Q>(&self, key: &Q) -> CellResult<Option<V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.cell.read(|m| m.get(key).cloned())
    }
}

impl<K, V> Replica<ORMap<K, V>>
where
    K: Eq + Hash + Clone + Send + Sync + Serialize + DeserializeOwned + 'static,
    V: Clone + Send + Sync + Serialize + DeserializeOwned + 'static,
{
    /// Adds `key -> value` and returns the dot identifying the add.
    pub fn add(&self, key: K, value: V) -> CellResult<Dot> {
        self.cell.transact(|m| Ok(m.add(key.clone(), value.clone())))
    }

    /// Removes every add of `key` this replica has observed. Returns the
    /// superseded dots.
    pub fn remove<Q>(&self, key: &Q) -> CellResult<Vec<Dot>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.cell.transact(|m| Ok(m.remove(key)))
    }

    /// Returns the live value for `key`.
    pub fn get<Q>(&self, key: &Q) -> CellResult<Option<V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.cell.read(|m| m.get(key).cloned())
    }
}

// ── Dynamic state ────────────────────────────────────────────────

impl<K, V> Replica<CrdtState<K, V>>
where
    K: Eq + Hash + Clone + Send + Sync + Serialize + DeserializeOwned + 'static,
    V: Clone + Send + Sync + Serialize + DeserializeOwned + 'static,
{
    /// Returns the type tag of the held state.
    pub fn kind(&self) -> CellResult<CrdtKind> {
        self.cell.read(CrdtState::kind)
    }
}

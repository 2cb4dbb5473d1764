//! Optimistic copy-on-write cell.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{trace, warn};

use crate::{CellConfig, CellError, CellResult};

#[derive(Debug)]
struct Versioned<S> {
    /// Bumped on every commit.
    version: u64,
    state: Arc<S>,
}

/// Holds one state value and serializes transactions against it.
///
/// The lock is only held to read or swap the `Arc`; closures passed to
/// [`transact`](Self::transact) run on a private copy with no lock held, so
/// they may take as long as they like (or touch other cells) without blocking
/// readers.
#[derive(Debug)]
pub struct TransactionalCell<S> {
    inner: RwLock<Versioned<S>>,
    config: CellConfig,
}

impl<S> TransactionalCell<S> {
    /// Creates a cell with the default configuration.
    pub fn new(state: S) -> Self {
        Self::with_config(state, CellConfig::default())
    }

    /// Creates a cell with `config`.
    pub fn with_config(state: S, config: CellConfig) -> Self {
        Self {
            inner: RwLock::new(Versioned {
                version: 0,
                state: Arc::new(state),
            }),
            config,
        }
    }

    /// Returns the cell configuration.
    pub fn config(&self) -> &CellConfig {
        &self.config
    }

    /// Returns the committed state. Later commits never alter it.
    pub fn snapshot(&self) -> CellResult<Arc<S>> {
        Ok(Arc::clone(&self.read_guard()?.state))
    }

    /// Runs `f` against the committed state.
    pub fn read<R>(&self, f: impl FnOnce(&S) -> R) -> CellResult<R> {
        let snapshot = self.snapshot()?;
        Ok(f(&snapshot))
    }

    /// Returns the number of commits since the cell was created.
    pub fn version(&self) -> CellResult<u64> {
        Ok(self.read_guard()?.version)
    }

    /// Unconditionally installs `state` as a new commit.
    pub fn replace(&self, state: S) -> CellResult<()> {
        let mut guard = self.write_guard()?;
        guard.version = guard.version.wrapping_add(1);
        guard.state = Arc::new(state);
        trace!("Replaced cell state at version {}", guard.version);
        Ok(())
    }

    fn read_guard(&self) -> CellResult<RwLockReadGuard<'_, Versioned<S>>> {
        self.inner
            .read()
            .map_err(|_| CellError::StateCorruption("cell lock poisoned".into()))
    }

    fn write_guard(&self) -> CellResult<RwLockWriteGuard<'_, Versioned<S>>> {
        self.inner
            .write()
            .map_err(|_| CellError::StateCorruption("cell lock poisoned".into()))
    }
}

impl<S: Clone> TransactionalCell<S> {
    /// Returns an owned copy of the committed state.
    pub fn get(&self) -> CellResult<S> {
        let snapshot = self.snapshot()?;
        Ok(S::clone(&snapshot))
    }

    /// Runs `f` as one atomic transaction.
    ///
    /// `f` mutates a copy of the committed state. The copy is committed only
    /// if no other transaction committed since it was taken; otherwise `f`
    /// runs again on a fresh copy, so it may be called more than once and
    /// should have no side effects beyond the state it is given. An error
    /// from `f` aborts the transaction and leaves the state untouched.
    pub fn transact<R, F>(&self, mut f: F) -> CellResult<R>
    where
        F: FnMut(&mut S) -> CellResult<R>,
    {
        let mut conflicts = 0u32;
        loop {
            let (base, mut working) = {
                let guard = self.read_guard()?;
                (guard.version, S::clone(&guard.state))
            };

            let out = f(&mut working)?;

            {
                let mut guard = self.write_guard()?;
                if guard.version == base {
                    guard.version = base.wrapping_add(1);
                    guard.state = Arc::new(working);
                    trace!(
                        "Committed version {} after {} conflicts",
                        guard.version, conflicts
                    );
                    return Ok(out);
                }
            }

            conflicts += 1;
            if conflicts > self.config.max_retries {
                warn!("Transaction gave up after {} conflicting commits", conflicts);
                return Err(CellError::StateCorruption(format!(
                    "transaction could not commit after {conflicts} attempts"
                )));
            }
            trace!("Commit conflict at version {}, retrying", base);
        }
    }
}

impl<S: Default> Default for TransactionalCell<S> {
    fn default() -> Self {
        Self::new(S::default())
    }
}

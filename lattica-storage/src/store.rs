//! Byte-level snapshot stores.

use lattica_types::ReplicaId;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::fs;
use std::io::{ErrorKind, Write as _};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::NamedTempFile;
use tracing::{debug, trace};

use crate::{StorageError, StorageResult};

/// Durable storage for encoded replica snapshots.
///
/// Writes are not transactional with in-memory mutation: a crash between a
/// committed mutation and the next `save` loses that mutation locally, and a
/// later merge from any peer that saw it restores it.
pub trait StateStore: Send + Sync {
    /// Loads the last snapshot saved for `replica_id`.
    fn load(&self, replica_id: &ReplicaId) -> StorageResult<Option<Vec<u8>>>;

    /// Saves `bytes` as the snapshot for `replica_id`, replacing any previous one.
    fn save(&self, replica_id: &ReplicaId, bytes: &[u8]) -> StorageResult<()>;

    /// Deletes the snapshot for `replica_id`. Returns false if none existed.
    fn delete(&self, replica_id: &ReplicaId) -> StorageResult<bool>;
}

/// In-process store, mainly for tests and ephemeral replicas.
#[derive(Debug, Default)]
pub struct MemoryStore {
    snapshots: Mutex<HashMap<ReplicaId, Vec<u8>>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored snapshots.
    pub fn len(&self) -> StorageResult<usize> {
        Ok(self.lock()?.len())
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> StorageResult<bool> {
        Ok(self.lock()?.is_empty())
    }

    fn lock(&self) -> StorageResult<std::sync::MutexGuard<'_, HashMap<ReplicaId, Vec<u8>>>> {
        self.snapshots.lock().map_err(|_| StorageError::Poisoned)
    }
}

impl StateStore for MemoryStore {
    fn load(&self, replica_id: &ReplicaId) -> StorageResult<Option<Vec<u8>>> {
        Ok(self.lock()?.get(replica_id).cloned())
    }

    fn save(&self, replica_id: &ReplicaId, bytes: &[u8]) -> StorageResult<()> {
        self.lock()?.insert(replica_id.clone(), bytes.to_vec());
        Ok(())
    }

    fn delete(&self, replica_id: &ReplicaId) -> StorageResult<bool> {
        Ok(self.lock()?.remove(replica_id).is_some())
    }
}

/// Directory-backed store writing one `<replica>.json` file per replica.
///
/// Each save writes its own temporary file in the store directory and
/// renames it over the snapshot, so a crash mid-write leaves the previous
/// snapshot intact and concurrent saves for one replica never share a file.
/// The last rename wins.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Opens (or creates) a store rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> StorageResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        debug!("Opened file store at {}", dir.display());
        Ok(Self { dir })
    }

    /// Returns the store directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the snapshot path for `replica_id`.
    #[must_use]
    pub fn path_for(&self, replica_id: &ReplicaId) -> PathBuf {
        self.dir.join(format!("{}.json", file_stem(replica_id)))
    }
}

impl StateStore for FileStore {
    fn load(&self, replica_id: &ReplicaId) -> StorageResult<Option<Vec<u8>>> {
        let path = self.path_for(replica_id);
        match fs::read(&path) {
            Ok(bytes) => {
                trace!("Loaded {} bytes from {}", bytes.len(), path.display());
                Ok(Some(bytes))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, replica_id: &ReplicaId, bytes: &[u8]) -> StorageResult<()> {
        let path = self.path_for(replica_id);
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| e.error)?;
        debug!("Saved snapshot for {} to {}", replica_id, path.display());
        Ok(())
    }

    fn delete(&self, replica_id: &ReplicaId) -> StorageResult<bool> {
        match fs::remove_file(self.path_for(replica_id)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

/// Maps a replica id to a file name, escaping everything outside
/// `[A-Za-z0-9_-]` so distinct ids never share a file.
fn file_stem(replica_id: &ReplicaId) -> String {
    let mut stem = String::with_capacity(replica_id.as_str().len());
    for byte in replica_id.as_str().bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
            stem.push(char::from(byte));
        } else {
            let _ = write!(stem, "%{byte:02X}");
        }
    }
    stem
}

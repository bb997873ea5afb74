//! Single-entry store for the catalog snapshot.
//!
//! # Responsibility
//! - Hold exactly one live snapshot under [`SNAPSHOT_KEY`].
//!
//! # Invariants
//! - `save` replaces the previous snapshot wholesale; no history is kept.
//! - `load` returns `None` on first run.

use super::{create_store_dir, read_optional, write_atomically};
use super::{StoreError, StoreResult};
use log::error;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Well-known key of the one live snapshot.
pub const SNAPSHOT_KEY: &str = "sqlite";

/// Store holding the serialized catalog.
pub trait SnapshotStore {
    fn save(&self, snapshot: &[u8]) -> StoreResult<()>;
    fn load(&self) -> StoreResult<Option<Vec<u8>>>;
}

/// Directory-backed snapshot store writing `dir/sqlite`.
#[derive(Debug, Clone)]
pub struct FsSnapshotStore {
    dir: PathBuf,
}

impl FsSnapshotStore {
    /// Opens the store rooted at `dir`, creating it when missing.
    pub fn open(dir: impl AsRef<Path>) -> StoreResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        create_store_dir(&dir)?;
        Ok(Self { dir })
    }

    /// Path of the snapshot file.
    pub fn snapshot_path(&self) -> PathBuf {
        self.dir.join(SNAPSHOT_KEY)
    }
}

impl SnapshotStore for FsSnapshotStore {
    fn save(&self, snapshot: &[u8]) -> StoreResult<()> {
        write_atomically(&self.snapshot_path(), SNAPSHOT_KEY, snapshot).inspect_err(|err| {
            error!(
                "event=snapshot_save module=store status=error bytes={} error={}",
                snapshot.len(),
                err
            );
        })
    }

    fn load(&self) -> StoreResult<Option<Vec<u8>>> {
        read_optional(&self.snapshot_path(), SNAPSHOT_KEY)
    }
}

/// In-process snapshot store that also counts saves.
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    state: Mutex<MemorySnapshotState>,
}

#[derive(Debug, Default)]
struct MemorySnapshotState {
    snapshot: Option<Vec<u8>>,
    saves: usize,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts with a previously saved snapshot.
    pub fn with_snapshot(snapshot: Vec<u8>) -> Self {
        Self {
            state: Mutex::new(MemorySnapshotState {
                snapshot: Some(snapshot),
                saves: 0,
            }),
        }
    }

    /// Number of successful `save` calls.
    pub fn save_count(&self) -> usize {
        self.state.lock().map(|state| state.saves).unwrap_or(0)
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn save(&self, snapshot: &[u8]) -> StoreResult<()> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| StoreError::Unavailable("snapshot store lock poisoned".to_string()))?;
        state.snapshot = Some(snapshot.to_vec());
        state.saves += 1;
        Ok(())
    }

    fn load(&self) -> StoreResult<Option<Vec<u8>>> {
        let state = self
            .state
            .lock()
            .map_err(|_| StoreError::Unavailable("snapshot store lock poisoned".to_string()))?;
        Ok(state.snapshot.clone())
    }
}

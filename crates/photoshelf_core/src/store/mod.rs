//! Local key/value stores for image blobs and catalog snapshots.
//!
//! # Responsibility
//! - Persist opaque binary values under flat string keys.
//! - Keep image bytes and the catalog snapshot in independent namespaces.
//!
//! # Invariants
//! - Writes are durable when they return; there is no buffering or retry.
//! - Stores enforce no cross-references; referential integrity belongs to
//!   the catalog service.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::Write;
use std::path::Path;

pub mod blob_store;
pub mod snapshot_store;

pub use blob_store::{BlobStore, FsBlobStore, MemoryBlobStore};
pub use snapshot_store::{FsSnapshotStore, MemorySnapshotStore, SnapshotStore, SNAPSHOT_KEY};

pub type StoreResult<T> = Result<T, StoreError>;

/// Storage-unavailable failures surfaced to callers.
#[derive(Debug)]
pub enum StoreError {
    Io { key: String, source: std::io::Error },
    /// Key cannot be mapped into the store namespace (the empty key).
    InvalidKey(String),
    /// Store directories overlap or escape the library root.
    InvalidLayout(String),
    /// Store state is unusable (for example a poisoned in-memory store).
    Unavailable(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { key, source } => write!(f, "storage I/O failed for key `{key}`: {source}"),
            Self::InvalidKey(key) => write!(f, "invalid storage key `{key}`"),
            Self::InvalidLayout(message) => write!(f, "invalid library layout: {message}"),
            Self::Unavailable(message) => write!(f, "storage unavailable: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::InvalidKey(_) => None,
            Self::InvalidLayout(_) => None,
            Self::Unavailable(_) => None,
        }
    }
}

/// Writes `bytes` to `target` through a synced sibling `.tmp` file and rename.
///
/// Missing parent directories are created.
pub(crate) fn write_atomically(target: &Path, key: &str, bytes: &[u8]) -> StoreResult<()> {
    let io_err = |source| StoreError::Io {
        key: key.to_string(),
        source,
    };
    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    let staging = target.with_extension("tmp");

    let mut file = std::fs::File::create(&staging).map_err(io_err)?;
    file.write_all(bytes).map_err(io_err)?;
    file.sync_all().map_err(io_err)?;
    drop(file);

    std::fs::rename(&staging, target).map_err(io_err)
}

/// Reads `path`, mapping a missing file to `None`.
pub(crate) fn read_optional(path: &Path, key: &str) -> StoreResult<Option<Vec<u8>>> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(StoreError::Io {
            key: key.to_string(),
            source,
        }),
    }
}

pub(crate) fn create_store_dir(dir: &Path) -> StoreResult<()> {
    std::fs::create_dir_all(dir).map_err(|source| StoreError::Io {
        key: dir.display().to_string(),
        source,
    })
}

/// Deletes a store directory and everything in it; a missing one is fine.
pub(crate) fn remove_store_dir(dir: &Path) -> StoreResult<()> {
    match std::fs::remove_dir_all(dir) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(StoreError::Io {
            key: dir.display().to_string(),
            source,
        }),
    }
}

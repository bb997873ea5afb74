//! Image blob store.
//!
//! # Responsibility
//! - Keep one raw image payload per photo id.
//!
//! # Invariants
//! - Any non-empty string is a valid key; distinct keys never share a value.
//! - `put` overwrites any previous value for the key.
//! - There is no delete or eviction API; the store only grows.

use super::{create_store_dir, read_optional, write_atomically};
use super::{StoreError, StoreResult};
use log::{debug, error};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Longest hex run kept in one path segment, below common file name limits.
const MAX_SEGMENT_HEX: usize = 240;
const NESTED_DIR_SUFFIX: &str = ".d";

/// Key/value store for opaque image bytes.
pub trait BlobStore {
    fn put(&self, key: &str, blob: &[u8]) -> StoreResult<()>;
    /// Returns `None` when nothing is stored under `key`.
    fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>>;
}

/// Directory-backed blob store: one file per key.
///
/// File names are the lowercase hex of the key's UTF-8 bytes, so keys with
/// separators, spaces or non-ASCII text map to plain names and keys differing
/// only in case stay apart on case-insensitive filesystems.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    dir: PathBuf,
}

impl FsBlobStore {
    /// Opens the store rooted at `dir`, creating it when missing.
    pub fn open(dir: impl AsRef<Path>) -> StoreResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        create_store_dir(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File that holds (or would hold) the blob stored under `key`.
    pub fn blob_path(&self, key: &str) -> StoreResult<PathBuf> {
        Ok(self.dir.join(encode_key(key)?))
    }
}

impl BlobStore for FsBlobStore {
    fn put(&self, key: &str, blob: &[u8]) -> StoreResult<()> {
        let path = self.blob_path(key)?;
        match write_atomically(&path, key, blob) {
            Ok(()) => {
                debug!(
                    "event=blob_put module=store status=ok key={} bytes={}",
                    key,
                    blob.len()
                );
                Ok(())
            }
            Err(err) => {
                error!(
                    "event=blob_put module=store status=error key={} error={}",
                    key, err
                );
                Err(err)
            }
        }
    }

    fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        read_optional(&self.blob_path(key)?, key)
    }
}

/// Maps a key to a relative path. Long keys nest into `<hex>.d` directories;
/// blob file names never contain a dot, so files and directories cannot clash.
fn encode_key(key: &str) -> StoreResult<PathBuf> {
    if key.is_empty() {
        return Err(StoreError::InvalidKey(key.to_string()));
    }

    let encoded = hex::encode(key.as_bytes());
    let mut path = PathBuf::new();
    let mut rest = encoded.as_str();
    while rest.len() > MAX_SEGMENT_HEX {
        let (head, tail) = rest.split_at(MAX_SEGMENT_HEX);
        path.push(format!("{head}{NESTED_DIR_SUFFIX}"));
        rest = tail;
    }
    path.push(rest);
    Ok(path)
}

/// In-process blob store for tests and ephemeral libraries.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored blobs.
    pub fn len(&self) -> usize {
        self.blobs.lock().map(|blobs| blobs.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl BlobStore for MemoryBlobStore {
    fn put(&self, key: &str, blob: &[u8]) -> StoreResult<()> {
        let mut blobs = self
            .blobs
            .lock()
            .map_err(|_| StoreError::Unavailable("blob store lock poisoned".to_string()))?;
        blobs.insert(key.to_string(), blob.to_vec());
        Ok(())
    }

    fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        let blobs = self
            .blobs
            .lock()
            .map_err(|_| StoreError::Unavailable("blob store lock poisoned".to_string()))?;
        Ok(blobs.get(key).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::{encode_key, MAX_SEGMENT_HEX};
    use crate::store::StoreError;
    use std::path::PathBuf;

    #[test]
    fn keys_encode_to_plain_hex_names() {
        assert_eq!(encode_key("p1").unwrap(), PathBuf::from("7031"));
        assert_eq!(encode_key("P1").unwrap(), PathBuf::from("5031"));
        assert_eq!(encode_key("a/b").unwrap(), PathBuf::from("612f62"));
        assert_eq!(encode_key("é").unwrap(), PathBuf::from("c3a9"));
    }

    #[test]
    fn long_keys_nest_into_directories() {
        let key = "x".repeat(MAX_SEGMENT_HEX);
        let path = encode_key(&key).unwrap();

        let segments = path
            .iter()
            .map(|segment| segment.to_str().unwrap().to_string())
            .collect::<Vec<_>>();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0], format!("{}.d", "78".repeat(MAX_SEGMENT_HEX / 2)));
        assert_eq!(segments[1], "78".repeat(MAX_SEGMENT_HEX / 2));
    }

    #[test]
    fn empty_key_is_rejected() {
        assert!(matches!(encode_key(""), Err(StoreError::InvalidKey(_))));
    }
}

//! # Todoflow Storage
//!
//! Key-value blob storage for todoflow.
//!
//! This crate provides the persistence seam of the architecture: an opaque
//! blob stored under a string key, in the spirit of browser local storage.
//! Operations are synchronous and unbuffered; concurrent writers on the
//! same key resolve as last write wins, nothing more.
//!
//! Two implementations are provided:
//!
//! - [`FileStore`]: one file per key beneath a root directory
//! - [`MemoryStore`]: in-memory map, for tests
//!
//! # Example
//!
//! ```no_run
//! use todoflow_storage::{BlobStore, FileStore};
//!
//! # fn example() -> Result<(), todoflow_storage::StorageError> {
//! let store = FileStore::new(".todoflow")?;
//! store.save("_$_todo", b"[]")?;
//! let blob = store.load("_$_todo")?;
//! assert_eq!(blob.as_deref(), Some(&b"[]"[..]));
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// Errors that can occur during blob storage operations
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Underlying I/O failure while reading or writing a blob
    #[error("storage I/O failed for key {key:?}: {source}")]
    Io {
        /// The key being accessed
        key: String,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The storage root could not be created
    #[error("could not create storage root {root:?}: {source}")]
    RootUnavailable {
        /// The configured root directory
        root: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

/// Synchronous key-value blob storage
///
/// The single persistence abstraction of the system. Keys are plain
/// strings; values are opaque byte blobs. A missing key is not an error.
///
/// Writes are atomic per call but carry no cross-call coordination: when
/// two writers race on the same key, the last write wins.
pub trait BlobStore: Send + Sync {
    /// Read the blob stored under `key`, or `None` if absent
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if the blob exists but cannot be read.
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// Write `blob` under `key`, replacing any previous value
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if the blob cannot be written.
    fn save(&self, key: &str, blob: &[u8]) -> Result<(), StorageError>;
}

/// File-backed blob store: one file per key beneath a root directory
///
/// Keys are used as file names verbatim, so callers should stick to
/// filesystem-safe keys. The root directory is created on construction.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Creates a file store rooted at `root`, creating the directory if
    /// needed
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::RootUnavailable`] if the directory cannot
    /// be created.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|source| StorageError::RootUnavailable {
            root: root.clone(),
            source,
        })?;
        Ok(Self { root })
    }

    /// Returns the root directory of this store
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}

impl BlobStore for FileStore {
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let path = self.path_for(key);
        match std::fs::read(&path) {
            Ok(blob) => {
                tracing::trace!(key, bytes = blob.len(), "Loaded blob");
                Ok(Some(blob))
            }
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }

    fn save(&self, key: &str, blob: &[u8]) -> Result<(), StorageError> {
        let path = self.path_for(key);
        std::fs::write(&path, blob).map_err(|source| StorageError::Io {
            key: key.to_string(),
            source,
        })?;
        tracing::trace!(key, bytes = blob.len(), "Saved blob");
        Ok(())
    }
}

/// In-memory blob store for tests
///
/// Behaves like [`FileStore`] without touching the filesystem.
#[derive(Debug, Default)]
pub struct MemoryStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    /// Creates an empty in-memory store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with a single entry
    #[must_use]
    pub fn with_entry(key: impl Into<String>, blob: impl Into<Vec<u8>>) -> Self {
        let store = Self::new();
        {
            let mut blobs = store.blobs.lock().unwrap_or_else(PoisonError::into_inner);
            blobs.insert(key.into(), blob.into());
        }
        store
    }
}

impl BlobStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let blobs = self.blobs.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(blobs.get(key).cloned())
    }

    fn save(&self, key: &str, blob: &[u8]) -> Result<(), StorageError> {
        let mut blobs = self.blobs.lock().unwrap_or_else(PoisonError::into_inner);
        blobs.insert(key.to_string(), blob.to_vec());
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code can panic
mod tests {
    use super::*;

    #[test]
    fn file_store_missing_key_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path()).unwrap();

        assert!(store.load("absent").unwrap().is_none());
    }

    #[test]
    fn file_store_round_trips_blob() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path()).unwrap();

        store.save("_$_todo", b"[1,2,3]").unwrap();
        assert_eq!(store.load("_$_todo").unwrap().as_deref(), Some(&b"[1,2,3]"[..]));
    }

    #[test]
    fn file_store_overwrites_previous_value() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path()).unwrap();

        store.save("key", b"old").unwrap();
        store.save("key", b"new").unwrap();
        assert_eq!(store.load("key").unwrap().as_deref(), Some(&b"new"[..]));
    }

    #[test]
    fn memory_store_round_trips_blob() {
        let store = MemoryStore::new();

        assert!(store.load("key").unwrap().is_none());
        store.save("key", b"blob").unwrap();
        assert_eq!(store.load("key").unwrap().as_deref(), Some(&b"blob"[..]));
    }

    #[test]
    fn memory_store_with_entry_seeds_data() {
        let store = MemoryStore::with_entry("_$_todo", &b"[]"[..]);
        assert_eq!(store.load("_$_todo").unwrap().as_deref(), Some(&b"[]"[..]));
    }
}

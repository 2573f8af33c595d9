//! Byte-oriented key-value storage backends.
//!
//! The persistence layer only needs "read blob by key" and "overwrite blob by
//! key". Two backends implement that:
//!
//! - [`FileStore`]: one file per key inside a data directory, written with
//!   locked atomic renames.
//! - [`MemoryStore`]: a shared in-process map with an optional byte quota.
//!   Clones share the same map, which makes it handy for tests and for
//!   modelling two sessions over one store.
//!
//! # Directory Structure
//!
//! ```text
//! <data dir>/
//!   smart-task-manager-tasks.json        # task collection blob
//!   smart-task-manager-tasks.json.lock   # advisory write lock
//! ```

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::{Error, Result};
use crate::lock::{self, DEFAULT_LOCK_TIMEOUT_MS};

/// Flat blob storage addressed by string keys.
pub trait KeyValueStore: Send + Sync {
    /// `Ok(None)` when nothing is stored under `key`.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Overwrite whatever is stored under `key`.
    fn set(&self, key: &str, value: &[u8]) -> Result<()>;
}

/// Keys become file names, so keep them to a safe alphabet.
pub fn validate_key(key: &str) -> Result<()> {
    let valid = !key.is_empty()
        && key != "."
        && key != ".."
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(())
    } else {
        Err(Error::InvalidArgument(format!(
            "storage key '{key}' must be non-empty and use only [A-Za-z0-9._-]"
        )))
    }
}

/// File-backed store rooted at a data directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
    lock_timeout_ms: u64,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            lock_timeout_ms: DEFAULT_LOCK_TIMEOUT_MS,
        }
    }

    pub fn with_lock_timeout(mut self, timeout_ms: u64) -> Self {
        self.lock_timeout_ms = timeout_ms;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the blob stored under `key`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        validate_key(key)?;
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        lock::read_locked(&path, self.lock_timeout_ms)
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        validate_key(key)?;
        lock::write_atomic_locked(self.path_for(key), value, self.lock_timeout_ms)
    }
}

/// In-process store. Clones share the same entries.
#[derive(Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    quota_bytes: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject writes that would push the total stored size past `bytes`.
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            entries: Arc::default(),
            quota_bytes: Some(bytes),
        }
    }

    /// Raw contents under `key`, bypassing the trait.
    pub fn raw(&self, key: &str) -> Option<Vec<u8>> {
        self.entries().get(key).cloned()
    }

    /// Store raw bytes without quota checks, e.g. to plant corrupt data.
    pub fn put_raw(&self, key: &str, value: impl Into<Vec<u8>>) {
        self.entries().insert(key.to_string(), value.into());
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, Vec<u8>>> {
        self.entries
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
    }
}

impl fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryStore")
            .field("keys", &self.entries().len())
            .field("quota_bytes", &self.quota_bytes)
            .finish()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        validate_key(key)?;
        Ok(self.entries().get(key).cloned())
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        validate_key(key)?;
        let mut entries = self.entries();
        if let Some(quota) = self.quota_bytes {
            let others: usize = entries
                .iter()
                .filter(|(existing, _)| existing.as_str() != key)
                .map(|(existing, bytes)| existing.len() + bytes.len())
                .sum();
            let needed = others + key.len() + value.len();
            if needed > quota {
                return Err(Error::OperationFailed(format!(
                    "storage quota exceeded ({needed} > {quota} bytes)"
                )));
            }
        }
        entries.insert(key.to_string(), value.to_vec());
        Ok(())
    }
}

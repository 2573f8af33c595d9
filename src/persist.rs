//! Task collection persistence.
//!
//! The whole collection is one JSON array stored under a single key. Loading
//! never fails: missing, unreadable or malformed data all yield an empty
//! collection. Save errors are returned to the task store, which logs them and
//! keeps the in-memory collection authoritative for the session.

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::error::Result;
use crate::storage::KeyValueStore;
use crate::task::Task;

/// Storage key of the task collection blob.
pub const DEFAULT_STORAGE_KEY: &str = "smart-task-manager-tasks";

/// Reads and writes the task collection through a [`KeyValueStore`].
#[derive(Debug, Clone)]
pub struct Persistence<S> {
    backend: S,
    key: String,
}

impl<S: KeyValueStore> Persistence<S> {
    pub fn new(backend: S) -> Self {
        Self::with_key(backend, DEFAULT_STORAGE_KEY)
    }

    pub fn with_key(backend: S, key: impl Into<String>) -> Self {
        Self {
            backend,
            key: key.into(),
        }
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Load the stored collection, or an empty one if nothing usable is stored.
    pub fn load(&self) -> Vec<Task> {
        match self.try_load() {
            Ok(tasks) => {
                debug!(key = %self.key, count = tasks.len(), "loaded tasks");
                tasks
            }
            Err(err) => {
                warn!(key = %self.key, error = %err, "discarding unreadable task data");
                Vec::new()
            }
        }
    }

    /// Strict variant of [`Persistence::load`] that surfaces the failure.
    ///
    /// Records repeating an earlier id are dropped; the first one wins.
    pub fn try_load(&self) -> Result<Vec<Task>> {
        let Some(bytes) = self.backend.get(&self.key)? else {
            return Ok(Vec::new());
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }
        let mut tasks: Vec<Task> = serde_json::from_slice(&bytes)?;
        let mut seen = HashSet::with_capacity(tasks.len());
        tasks.retain(|task| {
            let first = seen.insert(task.id.clone());
            if !first {
                warn!(key = %self.key, id = %task.id, "dropping task with duplicate id");
            }
            first
        });
        Ok(tasks)
    }

    /// Overwrite the stored collection.
    pub fn save(&self, tasks: &[Task]) -> Result<()> {
        let bytes = serde_json::to_vec(tasks)?;
        self.backend.set(&self.key, &bytes)?;
        debug!(key = %self.key, count = tasks.len(), bytes = bytes.len(), "saved tasks");
        Ok(())
    }
}

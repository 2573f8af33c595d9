//! The task store: sole writer of the task collection.
//!
//! Every mutation updates the in-memory collection first and then writes the
//! whole collection through [`Persistence`]. The write is fire-and-forget: a
//! failed save is logged and the in-memory state stays authoritative.

use std::sync::Arc;

use tracing::{error, info};

use crate::clock::{Clock, SystemClock};
use crate::error::{Error, Result};
use crate::persist::Persistence;
use crate::storage::KeyValueStore;
use crate::task::{NewTask, Status, Task, TaskId, TaskPatch};
use crate::views::{self, ProgressStats};

pub struct TaskStore<S> {
    tasks: Vec<Task>,
    persistence: Persistence<S>,
    clock: Arc<dyn Clock>,
    revision: u64,
    last_save_error: Option<String>,
}

impl<S: KeyValueStore> TaskStore<S> {
    /// Open the store, loading whatever the persistence layer has.
    pub fn open(persistence: Persistence<S>) -> Self {
        Self::open_with_clock(persistence, Arc::new(SystemClock))
    }

    pub fn open_with_clock(persistence: Persistence<S>, clock: Arc<dyn Clock>) -> Self {
        let tasks = persistence.load();
        Self::with_tasks(persistence, tasks, clock)
    }

    /// Wrap a collection the caller already loaded from `persistence`.
    pub fn with_tasks(persistence: Persistence<S>, tasks: Vec<Task>, clock: Arc<dyn Clock>) -> Self {
        Self {
            tasks,
            persistence,
            clock,
            revision: 0,
            last_save_error: None,
        }
    }

    pub fn persistence(&self) -> &Persistence<S> {
        &self.persistence
    }

    /// Bumped on every successful mutation; lets observers detect a new collection.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Why the most recent write did not reach storage, if it did not.
    pub fn last_save_error(&self) -> Option<&str> {
        self.last_save_error.as_deref()
    }

    /// Read-only view in insertion order.
    pub fn list(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| &task.id == id)
    }

    /// Fresh statistics over the current collection.
    pub fn stats(&self) -> ProgressStats {
        views::compute_stats(&self.tasks)
    }

    /// Resolve a full id or a unique id prefix.
    pub fn resolve(&self, id_or_prefix: &str) -> Result<TaskId> {
        let needle = id_or_prefix.trim().to_lowercase();
        if needle.is_empty() {
            return Err(Error::InvalidArgument("task id cannot be empty".to_string()));
        }
        if let Some(task) = self.tasks.iter().find(|task| task.id.as_str() == needle) {
            return Ok(task.id.clone());
        }
        let matches: Vec<&TaskId> = self
            .tasks
            .iter()
            .map(|task| &task.id)
            .filter(|id| id.as_str().starts_with(&needle))
            .collect();
        match matches.as_slice() {
            [] => Err(Error::TaskNotFound(id_or_prefix.trim().to_string())),
            [only] => Ok((*only).clone()),
            many => Err(Error::AmbiguousTaskId {
                prefix: id_or_prefix.trim().to_string(),
                matches: many.iter().map(|id| id.to_string()).collect(),
            }),
        }
    }

    /// Create a task with status `Todo`. No validation happens here.
    pub fn create(&mut self, data: NewTask) -> Task {
        let now = self.clock.now();
        let task = Task {
            id: self.fresh_id(),
            title: data.title,
            description: data.description,
            priority: data.priority,
            status: Status::Todo,
            deadline: data.deadline,
            created_at: now,
            updated_at: now,
        };
        self.tasks.push(task.clone());
        info!(id = %task.id, "created task");
        self.commit();
        task
    }

    /// Merge `patch` into the task and refresh `updated_at`.
    ///
    /// An unknown id leaves the collection and storage untouched.
    pub fn update(&mut self, id: &TaskId, patch: TaskPatch) -> Result<Task> {
        patch.validate()?;
        let now = self.clock.now();
        let task = self
            .tasks
            .iter_mut()
            .find(|task| &task.id == id)
            .ok_or_else(|| Error::TaskNotFound(id.to_string()))?;
        patch.apply(task);
        task.updated_at = now.max(task.created_at);
        let updated = task.clone();
        info!(id = %updated.id, status = %updated.status, "updated task");
        self.commit();
        Ok(updated)
    }

    /// Move a task to `status`, as a board drag-and-drop does.
    pub fn set_status(&mut self, id: &TaskId, status: Status) -> Result<Task> {
        self.update(id, TaskPatch::status(status))
    }

    pub fn complete(&mut self, id: &TaskId) -> Result<Task> {
        self.set_status(id, Status::Done)
    }

    /// Remove a task for good. An unknown id changes nothing.
    pub fn delete(&mut self, id: &TaskId) -> Result<Task> {
        let idx = self
            .tasks
            .iter()
            .position(|task| &task.id == id)
            .ok_or_else(|| Error::TaskNotFound(id.to_string()))?;
        let removed = self.tasks.remove(idx);
        info!(id = %removed.id, "deleted task");
        self.commit();
        Ok(removed)
    }

    fn fresh_id(&self) -> TaskId {
        loop {
            let id = TaskId::generate();
            if self.get(&id).is_none() {
                return id;
            }
        }
    }

    fn commit(&mut self) {
        self.revision += 1;
        self.last_save_error = match self.persistence.save(&self.tasks) {
            Ok(()) => None,
            Err(err) => {
                error!(key = %self.persistence.key(), error = %err, "failed to save tasks");
                Some(err.to_string())
            }
        };
    }
}

//! # Append-only task list awaiting submission.
//!
//! During application setup containers and the network layer append their
//! tasks to a [`TaskList`]. At execution start the list is **sealed** and
//! handed to a shared pool in one batch; later appends fail instead of racing
//! the drain.

use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::{error::ExecutorError, tasks::TaskRef};

/// Tasks registered during setup, submitted in bulk at execution start.
pub struct TaskList {
    name: &'static str,
    tasks: RwLock<Vec<TaskRef>>,
    sealed: AtomicBool,
}

impl TaskList {
    /// Creates an empty, unsealed list.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            tasks: RwLock::new(Vec::new()),
            sealed: AtomicBool::new(false),
        }
    }

    /// Returns the list name (`network` or `processing`).
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Appends a task.
    ///
    /// ### Errors
    /// [`ExecutorError::Sealed`] once the list was handed to a pool.
    pub fn push(&self, task: TaskRef) -> Result<(), ExecutorError> {
        let mut tasks = self
            .tasks
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if self.sealed.load(Ordering::Acquire) {
            return Err(ExecutorError::Sealed {
                list: self.name.to_string(),
            });
        }
        tasks.push(task);
        Ok(())
    }

    /// Returns a copy of the registered handles, in registration order.
    pub fn snapshot(&self) -> Vec<TaskRef> {
        self.tasks
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    /// Seals the list and returns its content. Idempotent.
    pub fn seal(&self) -> Vec<TaskRef> {
        let tasks = self
            .tasks
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        self.sealed.store(true, Ordering::Release);
        tasks.clone()
    }

    /// Returns `true` once sealed.
    pub fn is_sealed(&self) -> bool {
        self.sealed.load(Ordering::Acquire)
    }

    /// Returns the number of registered tasks.
    pub fn len(&self) -> usize {
        self.tasks
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    /// Returns `true` if no task is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for TaskList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskList")
            .field("name", &self.name)
            .field("len", &self.len())
            .field("sealed", &self.is_sealed())
            .finish()
    }
}

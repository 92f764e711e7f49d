//! # Cooperative task abstraction.
//!
//! This module defines the [`Task`] trait: a unit of work polled repeatedly by
//! an [`Executor`](crate::Executor) worker. One call to [`Task::execute`]
//! performs a bounded slice of work and reports its [`Progress`].
//!
//! The common handle type is [`TaskRef`], an `Arc<dyn Task>` suitable for
//! sharing between task lists, workers and orchestration code.
//!
//! Interruption is a cooperative signal: [`Task::interrupt`] only records the
//! cause, the task reacts at its next `execute`.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::TaskError;

/// Result of one `execute` slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// Nothing to do right now; the worker may idle.
    Idle,
    /// Work was done (or more is pending); poll again soon.
    Busy,
    /// The task finished; the worker drops it.
    Completed,
}

impl Progress {
    /// Returns `true` for [`Progress::Busy`].
    #[inline]
    pub fn did_work(self) -> bool {
        matches!(self, Progress::Busy)
    }
}

/// # Cooperative unit of work.
///
/// # Example
/// ```
/// use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
/// use async_trait::async_trait;
/// use dagvisor::{Progress, Task, TaskError};
///
/// struct Countdown {
///     left: AtomicU32,
///     stop: AtomicBool,
/// }
///
/// #[async_trait]
/// impl Task for Countdown {
///     fn name(&self) -> &str { "countdown" }
///
///     async fn execute(&self) -> Result<Progress, TaskError> {
///         if self.stop.load(Ordering::Acquire) {
///             return Ok(Progress::Completed);
///         }
///         match self.left.fetch_sub(1, Ordering::AcqRel) {
///             0 => Ok(Progress::Completed),
///             _ => Ok(Progress::Busy),
///         }
///     }
///
///     fn interrupt(&self, _cause: &(dyn std::error::Error + Send + Sync)) -> Result<(), TaskError> {
///         self.stop.store(true, Ordering::Release);
///         Ok(())
///     }
///
///     fn destroy(&self) -> Result<(), TaskError> {
///         self.stop.store(true, Ordering::Release);
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Task: Send + Sync + 'static {
    /// Returns a stable, human-readable task name.
    fn name(&self) -> &str;

    /// Performs one bounded slice of work.
    ///
    /// Must not block the worker for long: every task assigned to the same
    /// worker waits for this call to return.
    async fn execute(&self) -> Result<Progress, TaskError>;

    /// Signals the task to stop because of `cause`.
    ///
    /// Cooperative: the task observes it on its next `execute`.
    fn interrupt(&self, cause: &(dyn std::error::Error + Send + Sync)) -> Result<(), TaskError>;

    /// Releases the task's resources. Must be safe to call more than once.
    fn destroy(&self) -> Result<(), TaskError>;
}

/// Shared handle to a task.
pub type TaskRef = Arc<dyn Task>;

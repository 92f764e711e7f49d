//! # Cooperative task abstractions.
//!
//! This module provides the task-related types:
//! - [`Task`] - trait for cooperative, interruptible units of work
//! - [`Progress`] - outcome of one `execute` slice
//! - [`TaskRef`] - shared reference to a task (`Arc<dyn Task>`)
//! - [`TaskFn`] - closure-backed task implementation

mod task;
mod task_fn;

pub use task::{Progress, Task, TaskRef};
pub use task_fn::TaskFn;

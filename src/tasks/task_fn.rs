//! # Function-backed task (`TaskFn`)
//!
//! [`TaskFn`] wraps a closure `F: Fn() -> Fut` producing one `execute` slice
//! per call, and implements the interrupt/destroy bookkeeping itself: once
//! interrupted or destroyed the closure is no longer called. An interrupted
//! task fails its next slice with [`TaskError::Interrupted`] (so the pool
//! reports it as failed); a destroyed one reports [`Progress::Completed`].
//!
//! ## Example
//! ```rust
//! use dagvisor::{Progress, TaskError, TaskFn, TaskRef};
//!
//! let t: TaskRef = TaskFn::arc("reader", || async {
//!     // read one chunk...
//!     Ok::<_, TaskError>(Progress::Idle)
//! });
//!
//! assert_eq!(t.name(), "reader");
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::sync::{Arc, OnceLock};
use std::sync::atomic::{AtomicU8, Ordering};

use async_trait::async_trait;

use crate::error::TaskError;
use crate::tasks::task::{Progress, Task};

const RUNNING: u8 = 0;
const INTERRUPTED: u8 = 1;
const DESTROYED: u8 = 2;

/// Function-backed task implementation.
#[derive(Debug)]
pub struct TaskFn<F> {
    name: Cow<'static, str>,
    f: F,
    status: AtomicU8,
    cause: OnceLock<String>,
}

impl<F> TaskFn<F> {
    /// Creates a new function-backed task.
    ///
    /// Prefer [`TaskFn::arc`] when you immediately need a [`TaskRef`](crate::TaskRef).
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
            status: AtomicU8::new(RUNNING),
            cause: OnceLock::new(),
        }
    }

    /// Creates the task and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }

    /// Returns `true` once `interrupt` was called (and `destroy` was not).
    pub fn is_interrupted(&self) -> bool {
        self.status.load(Ordering::Acquire) == INTERRUPTED
    }

    /// Returns `true` once `destroy` was called.
    pub fn is_destroyed(&self) -> bool {
        self.status.load(Ordering::Acquire) == DESTROYED
    }
}

#[async_trait]
impl<F, Fut> Task for TaskFn<F>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Progress, TaskError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self) -> Result<Progress, TaskError> {
        match self.status.load(Ordering::Acquire) {
            RUNNING => (self.f)().await,
            INTERRUPTED => Err(TaskError::Interrupted {
                cause: self.cause.get().cloned().unwrap_or_default(),
            }),
            _ => Ok(Progress::Completed),
        }
    }

    fn interrupt(&self, cause: &(dyn std::error::Error + Send + Sync)) -> Result<(), TaskError> {
        let _ = self.cause.set(cause.to_string());
        // destroyed wins over interrupted
        let _ = self.status.compare_exchange(
            RUNNING,
            INTERRUPTED,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
        Ok(())
    }

    fn destroy(&self) -> Result<(), TaskError> {
        self.status.store(DESTROYED, Ordering::Release);
        Ok(())
    }
}

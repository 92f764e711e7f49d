//! # Worker loop of a cooperative executor.
//!
//! Each worker owns a slot holding the tasks assigned to it. One **sweep**
//! polls every assigned task once:
//!
//! ```text
//! loop {
//!   ├─► snapshot assigned tasks (short lock)
//!   ├─► for each task: execute()
//!   │       ├─ Busy       → sweep did work
//!   │       ├─ Idle       → nothing
//!   │       ├─ Completed  → drop task, publish TaskCompleted
//!   │       └─ Err/panic  → drop task, publish TaskFailed
//!   ├─► did work?  → yield, sweep again
//!   └─► otherwise  → sleep idle.delay(n) | wake() | cancel
//! }
//! ```
//!
//! ## Rules
//! - The slot lock is never held across `.await`
//! - Tasks assigned during a sweep are picked up by the next sweep
//! - A wake-up resets the idle backoff

use std::sync::{Arc, Mutex};

use futures::FutureExt;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use crate::{
    error::TaskError,
    events::{Bus, Event, EventKind},
    policies::IdlePolicy,
    tasks::{Progress, TaskRef},
};

/// Tasks assigned to one worker, plus its wake-up signal.
pub(crate) struct Slot {
    pub(crate) tasks: Mutex<Vec<TaskRef>>,
    pub(crate) wake: Notify,
}

impl Slot {
    pub(crate) fn new() -> Self {
        Self {
            tasks: Mutex::new(Vec::new()),
            wake: Notify::new(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        crate::lock(&self.tasks).len()
    }

    fn snapshot(&self) -> Vec<TaskRef> {
        crate::lock(&self.tasks).clone()
    }

    fn remove(&self, finished: &[TaskRef]) {
        crate::lock(&self.tasks).retain(|t| !finished.iter().any(|f| same_task(t, f)));
    }
}

/// Pointer identity of two task handles (ignores vtables).
pub(crate) fn same_task(a: &TaskRef, b: &TaskRef) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

/// Runs one worker until `token` is cancelled.
pub(crate) async fn run(
    executor: Arc<str>,
    slot: Arc<Slot>,
    idle: IdlePolicy,
    bus: Bus,
    token: CancellationToken,
) {
    let mut empty_sweeps: u32 = 0;

    loop {
        if token.is_cancelled() {
            break;
        }

        let tasks = slot.snapshot();
        let mut did_work = false;
        let mut finished = Vec::new();

        for task in &tasks {
            match poll_task(task).await {
                Ok(Progress::Busy) => did_work = true,
                Ok(Progress::Idle) => {}
                Ok(Progress::Completed) => {
                    bus.publish(
                        Event::new(EventKind::TaskCompleted)
                            .with_source(task.name())
                            .with_reason(executor.as_ref()),
                    );
                    finished.push(Arc::clone(task));
                }
                Err(e) => {
                    tracing::debug!(executor = %executor, task = task.name(), error = %e, "task left worker");
                    bus.publish(
                        Event::new(EventKind::TaskFailed)
                            .with_source(task.name())
                            .with_reason(e.to_string()),
                    );
                    finished.push(Arc::clone(task));
                }
            }
        }

        if !finished.is_empty() {
            slot.remove(&finished);
        }

        if did_work {
            empty_sweeps = 0;
            tokio::task::yield_now().await;
            continue;
        }

        let delay = idle.delay(empty_sweeps);
        empty_sweeps = empty_sweeps.saturating_add(1);
        tokio::select! {
            _ = token.cancelled() => break,
            _ = slot.wake.notified() => empty_sweeps = 0,
            _ = tokio::time::sleep(delay) => {}
        }
    }
}

/// Executes one slice, converting a panic into [`TaskError::Panicked`].
async fn poll_task(task: &TaskRef) -> Result<Progress, TaskError> {
    match std::panic::AssertUnwindSafe(task.execute())
        .catch_unwind()
        .await
    {
        Ok(res) => res,
        Err(panic) => Err(TaskError::Panicked {
            info: crate::panic_message(panic.as_ref()),
        }),
    }
}

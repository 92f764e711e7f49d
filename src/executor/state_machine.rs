//! # Single-consumer executor for state machine mailboxes.
//!
//! [`StateMachineExecutor`] is an [`Executor`] with exactly one worker. Every
//! mailbox registered on it is drained by that one worker, so a mailbox never
//! has two consumers and its state needs no further synchronization.
//!
//! Each application gets its own instances (container, application,
//! application-master), which keeps a slow machine from starving the shared
//! network/processing pools or the machines of other applications.

use std::sync::Arc;

use crate::{
    error::ExecutorError, events::Bus, executor::Executor, policies::IdlePolicy, tasks::TaskRef,
};

/// One-worker executor driving state machine mailboxes.
#[derive(Clone, Debug)]
pub struct StateMachineExecutor {
    inner: Arc<Executor>,
}

impl StateMachineExecutor {
    /// Creates the executor and spawns its single worker.
    pub fn new(name: impl Into<Arc<str>>, idle: IdlePolicy, bus: Bus) -> Self {
        Self {
            inner: Executor::new(name, 1, idle, bus),
        }
    }

    /// Returns the executor name.
    pub fn name(&self) -> &str {
        self.inner.name()
    }

    /// Registers a mailbox task on the single worker.
    pub fn register(&self, mailbox: TaskRef) -> Result<(), ExecutorError> {
        self.inner.submit(mailbox)
    }

    /// Wakes the worker (new request queued).
    pub fn wake(&self) {
        self.inner.wake();
    }

    /// Returns the number of mailboxes still registered.
    pub fn mailbox_count(&self) -> usize {
        self.inner.task_count()
    }

    /// Stops the worker. Queued requests that were not yet processed resolve
    /// as `MachineError::Dropped`.
    pub async fn shutdown(&self) {
        self.inner.shutdown().await;
    }

    /// Returns `true` once shutdown began.
    pub fn is_shutting_down(&self) -> bool {
        self.inner.is_shutting_down()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::error::TaskError;
    use crate::tasks::{Progress, TaskFn};

    #[tokio::test]
    async fn drops_finished_mailboxes_and_refuses_after_shutdown() {
        let exec = StateMachineExecutor::new("app-container-state_machine", IdlePolicy::default(), Bus::default());
        assert_eq!(exec.name(), "app-container-state_machine");

        exec.register(TaskFn::arc("done", || async { Ok::<_, TaskError>(Progress::Completed) }))
            .unwrap();
        exec.register(TaskFn::arc("idle", || async { Ok::<_, TaskError>(Progress::Idle) }))
            .unwrap();
        exec.wake();

        tokio::time::timeout(Duration::from_secs(5), async {
            while exec.mailbox_count() != 1 {
                tokio::time::sleep(Duration::from_millis(2)).await;
            }
        })
        .await
        .expect("finished mailbox should leave the worker");

        exec.shutdown().await;
        assert!(exec.is_shutting_down());
        let err = exec
            .register(TaskFn::arc("late", || async { Ok::<_, TaskError>(Progress::Idle) }))
            .unwrap_err();
        assert_eq!(err.as_label(), "executor_shutting_down");
    }
}

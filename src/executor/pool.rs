//! # Cooperative executor pool.
//!
//! [`Executor`] owns a fixed set of workers (Tokio tasks). Tasks are assigned
//! to workers at submission time and polled cooperatively until they
//! complete, fail, or are destroyed.
//!
//! ## Architecture
//! ```text
//! submit_batch([t1..tn])
//!     │  (least-loaded worker, ties → lowest index)
//!     ├──► Slot 0 [t1, t4] ──► worker 0 ──► sweep: t1.execute(), t4.execute()
//!     ├──► Slot 1 [t2, t5] ──► worker 1 ──► sweep: ...
//!     └──► Slot 2 [t3]     ──► worker 2 ──► sweep: ...
//!
//! interrupt_all(cause) / destroy_all(): every task, best effort
//! remove(tasks): unassign the given tasks
//! shutdown(): stop accepting → cancel workers → join
//! ```
//!
//! ## Rules
//! - A batch is enrolled **entirely or not at all**
//! - `interrupt_all`/`destroy_all` attempt every task even if some fail
//! - Assignment changes are safe while workers sweep
//! - Dropping the executor cancels its workers

use std::sync::{Arc, Mutex, RwLock};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::{
    error::{ExecutorError, TaskError},
    events::{Bus, Event, EventKind},
    executor::worker::{self, Slot, same_task},
    policies::IdlePolicy,
    tasks::TaskRef,
};

/// Fixed-size pool of cooperative workers.
pub struct Executor {
    name: Arc<str>,
    slots: Vec<Arc<Slot>>,
    /// `true` while batches are accepted. Held for reading during enrollment.
    accepting: RwLock<bool>,
    token: CancellationToken,
    joins: Mutex<Vec<JoinHandle<()>>>,
    bus: Bus,
}

impl Executor {
    /// Creates the pool and spawns `workers` workers (minimum 1).
    ///
    /// Must be called inside a Tokio runtime.
    pub fn new(name: impl Into<Arc<str>>, workers: usize, idle: IdlePolicy, bus: Bus) -> Arc<Self> {
        let name: Arc<str> = name.into();
        let token = CancellationToken::new();
        let slots: Vec<Arc<Slot>> = (0..workers.max(1)).map(|_| Arc::new(Slot::new())).collect();

        let joins = slots
            .iter()
            .map(|slot| {
                tokio::spawn(worker::run(
                    Arc::clone(&name),
                    Arc::clone(slot),
                    idle,
                    bus.clone(),
                    token.child_token(),
                ))
            })
            .collect();

        tracing::debug!(executor = %name, workers = slots.len(), "executor started");
        Arc::new(Self {
            name,
            slots,
            accepting: RwLock::new(true),
            token,
            joins: Mutex::new(joins),
            bus,
        })
    }

    /// Returns the executor name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the number of workers.
    pub fn workers(&self) -> usize {
        self.slots.len()
    }

    /// Returns the number of tasks currently assigned across all workers.
    pub fn task_count(&self) -> usize {
        self.slots.iter().map(|s| s.len()).sum()
    }

    /// Returns the number of tasks assigned to each worker, by worker index.
    pub fn loads(&self) -> Vec<usize> {
        self.slots.iter().map(|s| s.len()).collect()
    }

    /// Returns `true` once [`shutdown`](Self::shutdown) began.
    pub fn is_shutting_down(&self) -> bool {
        !*self.accepting.read().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Distributes `tasks` across workers and starts draining them.
    ///
    /// Each task goes to the least-loaded worker; ties go to the lowest index.
    ///
    /// ### Errors
    /// [`ExecutorError::ShuttingDown`] if the pool stopped accepting work; in
    /// that case none of the tasks was enrolled.
    pub fn submit_batch(&self, tasks: &[TaskRef]) -> Result<(), ExecutorError> {
        let accepting = self
            .accepting
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if !*accepting {
            self.bus.publish(
                Event::new(EventKind::BatchRejected)
                    .with_source(self.name.as_ref())
                    .with_count(tasks.len())
                    .with_reason("shutting down"),
            );
            return Err(ExecutorError::ShuttingDown {
                executor: self.name.to_string(),
            });
        }

        {
            let mut guards: Vec<_> = self.slots.iter().map(|s| crate::lock(&s.tasks)).collect();
            for task in tasks {
                let target = guards
                    .iter()
                    .enumerate()
                    .min_by_key(|(idx, g)| (g.len(), *idx))
                    .map(|(idx, _)| idx)
                    .unwrap_or(0);
                guards[target].push(Arc::clone(task));
            }
        }
        drop(accepting);

        self.wake();
        self.bus.publish(
            Event::new(EventKind::BatchSubmitted)
                .with_source(self.name.as_ref())
                .with_count(tasks.len()),
        );
        Ok(())
    }

    /// Enrolls a single task. Shorthand for a batch of one.
    pub fn submit(&self, task: TaskRef) -> Result<(), ExecutorError> {
        self.submit_batch(std::slice::from_ref(&task))
    }

    /// Wakes every idle worker so the next sweep starts immediately.
    pub fn wake(&self) {
        for slot in &self.slots {
            slot.wake.notify_one();
        }
    }

    /// Delivers `interrupt(cause)` to every assigned task.
    ///
    /// Every task is attempted; the last failure (if any) is returned.
    pub fn interrupt_all(&self, cause: &(dyn std::error::Error + Send + Sync)) -> Result<(), TaskError> {
        let result = attempt_all(&self.assigned(), &self.bus, |t| t.interrupt(cause));
        self.wake();
        result
    }

    /// Calls `destroy()` on every assigned task and unassigns them.
    ///
    /// Every task is attempted; the last failure (if any) is returned.
    pub fn destroy_all(&self) -> Result<(), TaskError> {
        let tasks = self.assigned();
        let result = attempt_all(&tasks, &self.bus, |t| t.destroy());
        self.remove(&tasks);
        result
    }

    /// Unassigns `tasks` (matched by identity) without calling into them.
    ///
    /// Returns how many were assigned. A worker already sweeping may poll a
    /// removed task one last time.
    pub fn remove(&self, tasks: &[TaskRef]) -> usize {
        if tasks.is_empty() {
            return 0;
        }
        let mut removed = 0;
        for slot in &self.slots {
            let mut assigned = crate::lock(&slot.tasks);
            let before = assigned.len();
            assigned.retain(|t| !tasks.iter().any(|d| same_task(t, d)));
            removed += before - assigned.len();
        }
        removed
    }

    /// Stops accepting batches, cancels the workers and waits for them.
    ///
    /// Assigned tasks are unassigned (dropped by the pool) but neither
    /// interrupted nor destroyed; call [`destroy_all`](Self::destroy_all)
    /// first if needed. Idempotent.
    pub async fn shutdown(&self) {
        {
            let mut accepting = self
                .accepting
                .write()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            *accepting = false;
        }
        self.token.cancel();

        let joins: Vec<JoinHandle<()>> = crate::lock(&self.joins).drain(..).collect();
        if joins.is_empty() {
            return;
        }
        for join in joins {
            if let Err(e) = join.await {
                tracing::warn!(executor = %self.name, error = %e, "worker ended abnormally");
            }
        }
        for slot in &self.slots {
            crate::lock(&slot.tasks).clear();
        }
        self.bus
            .publish(Event::new(EventKind::ExecutorShutdown).with_source(self.name.as_ref()));
    }

    fn assigned(&self) -> Vec<TaskRef> {
        self.slots
            .iter()
            .flat_map(|s| crate::lock(&s.tasks).clone())
            .collect()
    }
}

impl Drop for Executor {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

impl std::fmt::Debug for Executor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executor")
            .field("name", &self.name)
            .field("workers", &self.slots.len())
            .finish_non_exhaustive()
    }
}

/// Runs `op` on every task, publishing each failure; returns the last one.
pub(crate) fn attempt_all<F>(tasks: &[TaskRef], bus: &Bus, op: F) -> Result<(), TaskError>
where
    F: Fn(&TaskRef) -> Result<(), TaskError>,
{
    let mut last = None;
    for task in tasks {
        if let Err(e) = op(task) {
            bus.publish(
                Event::new(EventKind::TaskCleanupFailed)
                    .with_source(task.name())
                    .with_reason(e.to_string()),
            );
            last = Some(e);
        }
    }
    match last {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

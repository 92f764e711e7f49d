//! # Runtime events emitted by state machines, executors and orchestration.
//!
//! The [`EventKind`] enum classifies events across four categories:
//! - **Machine events**: transitions applied or rejected by a state machine
//! - **Executor events**: task batches, task completion/failure, shutdown
//! - **Orchestration events**: container startup and application teardown
//! - **Subscriber events**: overflow and panics inside subscribers
//!
//! The [`Event`] struct carries metadata such as the emitting component
//! (`source`), states, reasons and counters.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//!
//! ## Example
//! ```rust
//! use dagvisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::TransitionRejected)
//!     .with_source("app-master")
//!     .with_state("Finalized")
//!     .with_reason("illegal event");
//!
//! assert_eq!(ev.kind, EventKind::TransitionRejected);
//! assert_eq!(ev.source.as_deref(), Some("app-master"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Machine events ===
    /// A state machine committed a transition.
    ///
    /// Sets: `source` (machine), `state` (new state), `event`.
    TransitionApplied,

    /// A state machine rejected an event (no matrix entry).
    ///
    /// Sets: `source` (machine), `state` (unchanged state), `event`, `reason`.
    TransitionRejected,

    /// A side-effect hook failed; the transition was not committed.
    ///
    /// Sets: `source` (machine), `state`, `event`, `reason`.
    SideEffectFailed,

    // === Executor events ===
    /// A pool accepted a task batch.
    ///
    /// Sets: `source` (executor), `count`.
    BatchSubmitted,

    /// A pool rejected a task batch.
    ///
    /// Sets: `source` (executor), `count`, `reason`.
    BatchRejected,

    /// A task reported completion and left its worker.
    ///
    /// Sets: `source` (task), `reason` (executor name).
    TaskCompleted,

    /// A task failed or panicked and left its worker.
    ///
    /// Sets: `source` (task), `reason`.
    TaskFailed,

    /// An `interrupt` or `destroy` call on a task failed.
    ///
    /// Sets: `source` (task), `reason`.
    TaskCleanupFailed,

    /// An executor stopped its workers.
    ///
    /// Sets: `source` (executor).
    ExecutorShutdown,

    // === Orchestration events ===
    /// A container is being asked to start.
    ///
    /// Sets: `source` (vertex), `timeout_ms` (if bounded).
    ContainerStarting,

    /// A container accepted its start request.
    ///
    /// Sets: `source` (vertex).
    ContainerStarted,

    /// Container startup aborted.
    ///
    /// Sets: `source` (vertex), `reason`.
    StartupFailed,

    /// Every container started and both task batches were submitted.
    ///
    /// Sets: `source` (application), `count` (containers started).
    ApplicationExecuting,

    /// A container failed to destroy (teardown continues).
    ///
    /// Sets: `source` (container), `reason`.
    ContainerDestroyFailed,

    /// Teardown attempted every container and network task.
    ///
    /// Sets: `source` (application), `reason` (last failure, if any).
    ApplicationDestroyed,

    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets: `source` (subscriber), `reason` (panic info).
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets: `source` (subscriber), `reason` (`full` or `closed`).
    SubscriberOverflow,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Emitting component (machine, executor, task, vertex, application...).
    pub source: Option<Arc<str>>,
    /// State involved, debug-rendered.
    pub state: Option<Arc<str>>,
    /// State machine event involved, debug-rendered.
    pub event: Option<Arc<str>>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
    /// Counter (batch size, containers started...).
    pub count: Option<u32>,
    /// Timeout in milliseconds (compact).
    pub timeout_ms: Option<u32>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            source: None,
            state: None,
            event: None,
            reason: None,
            count: None,
            timeout_ms: None,
        }
    }

    /// Attaches the emitting component.
    #[inline]
    pub fn with_source(mut self, source: impl Into<Arc<str>>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Attaches a state.
    #[inline]
    pub fn with_state(mut self, state: impl Into<Arc<str>>) -> Self {
        self.state = Some(state.into());
        self
    }

    /// Attaches a state machine event.
    #[inline]
    pub fn with_event(mut self, event: impl Into<Arc<str>>) -> Self {
        self.event = Some(event.into());
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a counter (saturating at `u32::MAX`).
    #[inline]
    pub fn with_count(mut self, n: usize) -> Self {
        self.count = Some(n.min(u32::MAX as usize) as u32);
        self
    }

    /// Attaches a timeout duration (stored as milliseconds).
    #[inline]
    pub fn with_timeout(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.timeout_ms = Some(ms);
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_source(subscriber)
            .with_reason(reason)
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_source(subscriber)
            .with_reason(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_is_monotonic() {
        let a = Event::new(EventKind::BatchSubmitted);
        let b = Event::new(EventKind::BatchSubmitted);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn count_and_timeout_saturate() {
        let ev = Event::new(EventKind::ContainerStarting)
            .with_count(usize::MAX)
            .with_timeout(Duration::from_secs(u64::MAX));
        assert_eq!(ev.count, Some(u32::MAX));
        assert_eq!(ev.timeout_ms, Some(u32::MAX));
    }
}

//! # LogWriter: forwards runtime events to `tracing`
//!
//! A minimal subscriber that turns every [`Event`] into one `tracing` record.
//! Failures are logged at `warn`, lifecycle milestones at `info`, and
//! per-transition chatter at `debug`.
//!
//! ## Example output (with `tracing_subscriber::fmt`)
//! ```text
//! INFO  dagvisor: container starting vertex="sink" timeout_ms=30000
//! DEBUG dagvisor: transition applied machine="sink" event="Execute" state="Executing"
//! WARN  dagvisor: batch rejected executor="processing" count=3 reason="executor processing is shutting down"
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let source = e.source.as_deref().unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("-");
        match e.kind {
            EventKind::TransitionApplied => tracing::debug!(
                machine = source,
                event = e.event.as_deref(),
                state = e.state.as_deref(),
                "transition applied"
            ),
            EventKind::TransitionRejected => tracing::warn!(
                machine = source,
                event = e.event.as_deref(),
                state = e.state.as_deref(),
                reason,
                "transition rejected"
            ),
            EventKind::SideEffectFailed => tracing::warn!(
                machine = source,
                event = e.event.as_deref(),
                state = e.state.as_deref(),
                reason,
                "side effect failed"
            ),
            EventKind::BatchSubmitted => {
                tracing::info!(executor = source, count = e.count, "batch submitted")
            }
            EventKind::BatchRejected => tracing::warn!(
                executor = source,
                count = e.count,
                reason,
                "batch rejected"
            ),
            EventKind::TaskCompleted => tracing::debug!(task = source, reason, "task completed"),
            EventKind::TaskFailed => tracing::warn!(task = source, reason, "task failed"),
            EventKind::TaskCleanupFailed => {
                tracing::warn!(task = source, reason, "task cleanup failed")
            }
            EventKind::ExecutorShutdown => tracing::info!(executor = source, "executor shut down"),
            EventKind::ContainerStarting => tracing::info!(
                vertex = source,
                timeout_ms = e.timeout_ms,
                "container starting"
            ),
            EventKind::ContainerStarted => tracing::info!(vertex = source, "container started"),
            EventKind::StartupFailed => tracing::warn!(vertex = source, reason, "startup failed"),
            EventKind::ApplicationExecuting => tracing::info!(
                application = source,
                containers = e.count,
                "application executing"
            ),
            EventKind::ContainerDestroyFailed => {
                tracing::warn!(container = source, reason, "container destroy failed")
            }
            EventKind::ApplicationDestroyed => {
                tracing::info!(application = source, reason, "application destroyed")
            }
            EventKind::SubscriberOverflow => {
                tracing::warn!(subscriber = source, reason, "subscriber overflow")
            }
            EventKind::SubscriberPanicked => {
                tracing::error!(subscriber = source, reason, "subscriber panicked")
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}

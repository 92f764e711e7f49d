//! Error types used by the dagvisor runtime, its executors and state machines.
//!
//! This module defines four error enums:
//!
//! - [`TaskError`]: errors raised by individual cooperative tasks.
//! - [`ExecutorError`]: errors raised by executor pools and task lists.
//! - [`MachineError`]: errors delivered by state machine requests.
//! - [`OrchestrationError`]: errors raised by the startup/teardown handlers.
//!
//! Every enum provides `as_label` (stable snake_case label for logs/metrics).

use std::time::Duration;

use thiserror::Error;

/// Boxed error used at hook boundaries (side effects, container destroy).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// # Errors produced by task execution.
///
/// Returned by [`Task`](crate::Task) methods. A task that fails during
/// `execute` is removed from its worker.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum TaskError {
    /// Task execution failed.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// Task was interrupted and refuses further work.
    #[error("interrupted: {cause}")]
    Interrupted {
        /// Interruption cause, rendered.
        cause: String,
    },

    /// Task panicked while being polled.
    #[error("task panicked: {info}")]
    Panicked {
        /// Panic payload, rendered.
        info: String,
    },
}

impl TaskError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use dagvisor::TaskError;
    ///
    /// let err = TaskError::Fail { error: "boom".into() };
    /// assert_eq!(err.as_label(), "task_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Fail { .. } => "task_failed",
            TaskError::Interrupted { .. } => "task_interrupted",
            TaskError::Panicked { .. } => "task_panicked",
        }
    }
}

/// # Errors produced by executor pools and task lists.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecutorError {
    /// The executor stopped accepting work.
    #[error("executor {executor} is shutting down")]
    ShuttingDown {
        /// Executor name.
        executor: String,
    },

    /// The task list was already handed to a pool.
    #[error("task list {list} is sealed")]
    Sealed {
        /// Task list name.
        list: String,
    },
}

impl ExecutorError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ExecutorError::ShuttingDown { .. } => "executor_shutting_down",
            ExecutorError::Sealed { .. } => "task_list_sealed",
        }
    }
}

/// # Errors delivered by state machine requests.
///
/// `Rejected` is returned synchronously by `request`; every other variant is
/// delivered through the request's [`Response`](crate::Response).
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum MachineError {
    /// No transition exists for the current state and event.
    #[error("machine {machine}: illegal event {event} in state {state}")]
    IllegalTransition {
        /// Machine name.
        machine: String,
        /// State at the time of the request (debug-rendered).
        state: String,
        /// Rejected event (debug-rendered).
        event: String,
    },

    /// The mailbox refused the request (full or closed).
    #[error("machine {machine}: can't accept request ({reason})")]
    Rejected {
        /// Machine name.
        machine: String,
        /// `full` or `closed`.
        reason: &'static str,
    },

    /// The side-effect hook failed; the transition was not committed.
    #[error("machine {machine}: side effect failed on {event}: {source}")]
    SideEffect {
        /// Machine name.
        machine: String,
        /// Event being processed (debug-rendered).
        event: String,
        /// Hook error.
        #[source]
        source: BoxError,
    },

    /// The worker went away before answering.
    #[error("machine {machine}: request dropped without response")]
    Dropped {
        /// Machine name.
        machine: String,
    },

    /// The caller stopped waiting for the response.
    #[error("machine {machine}: no response within {timeout:?}")]
    Timeout {
        /// Machine name.
        machine: String,
        /// Waited duration.
        timeout: Duration,
    },
}

impl MachineError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use dagvisor::MachineError;
    ///
    /// let err = MachineError::Rejected { machine: "m".into(), reason: "closed" };
    /// assert_eq!(err.as_label(), "machine_rejected");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            MachineError::IllegalTransition { .. } => "machine_illegal_transition",
            MachineError::Rejected { .. } => "machine_rejected",
            MachineError::SideEffect { .. } => "machine_side_effect",
            MachineError::Dropped { .. } => "machine_dropped",
            MachineError::Timeout { .. } => "machine_timeout",
        }
    }

    /// Returns the side-effect error if this is a [`MachineError::SideEffect`].
    pub fn side_effect(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self {
            MachineError::SideEffect { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

/// # Errors produced by application startup and teardown.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum OrchestrationError {
    /// A container refused or failed its start request.
    #[error("container {vertex} failed to start: {source}")]
    StartupFailed {
        /// Vertex owning the container.
        vertex: String,
        /// Failure reported by the container's state machine.
        #[source]
        source: MachineError,
    },

    /// A container did not start within the awaiting timeout.
    #[error("container {vertex} did not start within {timeout:?}")]
    StartupTimeout {
        /// Vertex owning the container.
        vertex: String,
        /// Configured awaiting timeout.
        timeout: Duration,
    },

    /// The DAG references a vertex without a container.
    #[error("no container registered for vertex {vertex}")]
    UnknownVertex {
        /// Unresolved vertex.
        vertex: String,
    },

    /// A shared pool rejected a task batch.
    #[error("task batch rejected: {source}")]
    BatchRejected {
        /// Pool error.
        #[source]
        source: ExecutorError,
    },

    /// A container failed to destroy.
    #[error("container {container} failed to destroy: {source}")]
    ContainerDestroy {
        /// Container id.
        container: String,
        /// Destroy error.
        #[source]
        source: BoxError,
    },

    /// An application-level state machine request failed.
    #[error(transparent)]
    Machine(#[from] MachineError),

    /// A dedicated executor refused to register a state machine.
    #[error(transparent)]
    Executor(#[from] ExecutorError),

    /// The application has no master yet (DAG not submitted).
    #[error("application {application} has no submitted DAG")]
    NotSubmitted {
        /// Application name.
        application: String,
    },
}

impl OrchestrationError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            OrchestrationError::StartupFailed { .. } => "startup_failed",
            OrchestrationError::StartupTimeout { .. } => "startup_timeout",
            OrchestrationError::UnknownVertex { .. } => "unknown_vertex",
            OrchestrationError::BatchRejected { .. } => "batch_rejected",
            OrchestrationError::ContainerDestroy { .. } => "container_destroy_failed",
            OrchestrationError::Machine(e) => e.as_label(),
            OrchestrationError::Executor(e) => e.as_label(),
            OrchestrationError::NotSubmitted { .. } => "application_not_submitted",
        }
    }
}

//! # Processing containers.
//!
//! A container runs one DAG vertex. Orchestration only needs two things from
//! it: a way to send it container events, and a way to destroy it. The
//! [`Container`] trait captures exactly that so tests and other runtimes can
//! plug in their own.
//!
//! [`ProcessingContainer`] is the built-in implementation: its lifecycle is a
//! container state machine on the application's container executor, and its
//! processing tasks are appended to the application's processing task list
//! when it is created. Destroying it destroys those tasks and drives the
//! machine to `Finalized` before closing it.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use super::states::{ContainerEvent, ContainerState, Outcome, container_matrix, outcome};
use crate::{
    error::{BoxError, ExecutorError, MachineError},
    events::Bus,
    executor::{ExecutorContext, attempt_all},
    fsm::{Response, StateMachine},
    tasks::TaskRef,
};

/// A vertex runtime driven by startup and teardown orchestration.
#[async_trait]
pub trait Container: Send + Sync + 'static {
    /// Returns the container id.
    fn id(&self) -> &str;

    /// Sends `event` to the container's state machine.
    fn request(&self, event: ContainerEvent) -> Result<Response<Outcome>, MachineError>;

    /// Releases every resource of the container. Idempotent.
    async fn destroy(&self) -> Result<(), BoxError>;
}

/// Container state machine handle.
pub type ContainerMachine = StateMachine<ContainerState, ContainerEvent, Outcome>;

/// Built-in container owning the processing tasks of one vertex.
pub struct ProcessingContainer {
    id: Arc<str>,
    machine: ContainerMachine,
    tasks: Vec<TaskRef>,
    destroyed: AtomicBool,
    await_timeout: Option<Duration>,
    bus: Bus,
}

impl ProcessingContainer {
    /// Spawns the container state machine and registers `tasks` on the
    /// application's processing list.
    ///
    /// ### Errors
    /// - [`ExecutorError::ShuttingDown`] if the container executor stopped;
    /// - [`ExecutorError::Sealed`] if the application already started executing.
    pub fn new(
        id: impl Into<Arc<str>>,
        context: &ExecutorContext,
        tasks: Vec<TaskRef>,
    ) -> Result<Arc<Self>, ExecutorError> {
        let id: Arc<str> = id.into();
        let machine = ContainerMachine::builder(
            format!("{}/container/{id}", context.name()),
            ContainerState::New,
            container_matrix(),
            outcome,
        )
        .with_capacity(context.mailbox_capacity())
        .with_bus(context.bus().clone())
        .spawn(context.container_executor())?;

        for task in &tasks {
            context.processing_tasks().push(Arc::clone(task))?;
        }

        Ok(Arc::new(Self {
            id,
            machine,
            tasks,
            destroyed: AtomicBool::new(false),
            await_timeout: context.await_timeout(),
            bus: context.bus().clone(),
        }))
    }

    /// Returns the current container state.
    pub fn state(&self) -> ContainerState {
        self.machine.current_state()
    }

    /// Returns the processing tasks owned by this container.
    pub fn tasks(&self) -> &[TaskRef] {
        &self.tasks
    }

    /// Returns `true` once [`destroy`](Container::destroy) ran.
    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::Acquire)
    }
}

#[async_trait]
impl Container for ProcessingContainer {
    fn id(&self) -> &str {
        &self.id
    }

    fn request(&self, event: ContainerEvent) -> Result<Response<Outcome>, MachineError> {
        self.machine.request(event, ())
    }

    async fn destroy(&self) -> Result<(), BoxError> {
        if self.destroyed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        let result = attempt_all(&self.tasks, &self.bus, |t| t.destroy());

        let finalized = match self.machine.request(ContainerEvent::Finalize, ()) {
            Ok(response) => response.wait(self.await_timeout).await.map(|_| ()),
            Err(e) => Err(e),
        };
        if let Err(e) = finalized {
            tracing::debug!(container = %self.id, error = %e, "container not finalized");
        }
        self.machine.close();
        tracing::debug!(container = %self.id, ok = result.is_ok(), "container destroyed");
        result.map_err(Into::into)
    }
}

impl std::fmt::Debug for ProcessingContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessingContainer")
            .field("id", &self.id)
            .field("state", &self.state())
            .field("tasks", &self.tasks.len())
            .finish_non_exhaustive()
    }
}

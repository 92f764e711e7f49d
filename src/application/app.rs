//! # Application facade.
//!
//! [`Application`] ties one application's pieces together: its
//! [`ExecutorContext`], its application state machine and, once a DAG was
//! submitted, its [`ApplicationMaster`] and master state machine.
//!
//! ```text
//! submit(dag, containers)  : app Submit     → master SubmitDag
//! execute()                : app Execute    → master ExecuteApplication (startup)
//!                                               └─ Err → app Fail
//! destroy()                : master DestroyApplication (teardown)
//!                          → app Finalize → dedicated executors shut down
//! ```
//!
//! Orchestration failures travel through the master machine as side-effect
//! errors; the facade unwraps them so callers get the
//! [`OrchestrationError`] the handler returned.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use super::{
    container::Container,
    dag::{Dag, VertexId},
    master::{ApplicationMaster, MasterMachine},
    states::{ApplicationEvent, ApplicationState, MasterEvent, MasterState, Outcome, application_matrix, outcome},
};
use crate::{
    error::{ExecutorError, MachineError, OrchestrationError},
    executor::ExecutorContext,
    fsm::StateMachine,
    tasks::TaskRef,
};

/// Application state machine handle.
pub type ApplicationMachine = StateMachine<ApplicationState, ApplicationEvent, Outcome>;

/// One DAG job and everything it runs on.
pub struct Application {
    context: Arc<ExecutorContext>,
    machine: ApplicationMachine,
    master: Mutex<Option<(Arc<ApplicationMaster>, MasterMachine)>>,
    destroyed: AtomicBool,
}

impl Application {
    /// Creates the application and spawns its state machine.
    ///
    /// ### Errors
    /// [`ExecutorError::ShuttingDown`] if the application executor stopped.
    pub fn new(context: Arc<ExecutorContext>) -> Result<Self, ExecutorError> {
        let machine = ApplicationMachine::builder(
            format!("{}/application", context.name()),
            ApplicationState::New,
            application_matrix(),
            outcome,
        )
        .with_capacity(context.mailbox_capacity())
        .with_bus(context.bus().clone())
        .spawn(context.application_executor())?;

        Ok(Self {
            context,
            machine,
            master: Mutex::new(None),
            destroyed: AtomicBool::new(false),
        })
    }

    /// Returns the application name.
    pub fn name(&self) -> &str {
        self.context.name()
    }

    /// Returns the executor registry.
    pub fn context(&self) -> &Arc<ExecutorContext> {
        &self.context
    }

    /// Returns the application state.
    pub fn state(&self) -> ApplicationState {
        self.machine.current_state()
    }

    /// Returns the master state, once a DAG was submitted.
    pub fn master_state(&self) -> Option<MasterState> {
        crate::lock(&self.master).as_ref().map(|(_, m)| m.current_state())
    }

    /// Returns the master, once a DAG was submitted.
    pub fn master(&self) -> Option<Arc<ApplicationMaster>> {
        crate::lock(&self.master).as_ref().map(|(master, _)| Arc::clone(master))
    }

    /// Appends a network task. Only possible before [`execute`](Self::execute).
    pub fn add_network_task(&self, task: TaskRef) -> Result<(), ExecutorError> {
        self.context.network_tasks().push(task)
    }

    /// Submits the DAG and one container per vertex.
    ///
    /// ### Errors
    /// [`OrchestrationError::Machine`] if the application was already submitted
    /// or one of its machines refused the request.
    pub async fn submit(
        &self,
        dag: impl Dag,
        containers: impl IntoIterator<Item = (VertexId, Arc<dyn Container>)>,
    ) -> Result<(), OrchestrationError> {
        self.machine.request(ApplicationEvent::Submit, ())?.await?;

        let master = ApplicationMaster::new(Arc::clone(&self.context), Arc::new(dag), containers);
        let machine = master.spawn_machine()?;
        machine.request(MasterEvent::SubmitDag, ())?.await?;

        *crate::lock(&self.master) = Some((master, machine));
        tracing::debug!(application = self.name(), "dag submitted");
        Ok(())
    }

    /// Starts every container and submits the task lists to the shared pools.
    ///
    /// On failure the application moves to `Failed`; containers that already
    /// started keep running until [`destroy`](Self::destroy).
    pub async fn execute(&self) -> Result<(), OrchestrationError> {
        let master = self.master_machine()?;
        self.machine.request(ApplicationEvent::Execute, ())?.await?;

        let result = match master.request(MasterEvent::ExecuteApplication, ()) {
            Ok(response) => response.await.map_err(unwrap_handler_error),
            Err(e) => Err(e.into()),
        };
        if let Err(e) = &result {
            tracing::warn!(application = self.name(), error = %e, "application failed to start");
            if let Ok(response) = self.machine.request(ApplicationEvent::Fail, ()) {
                let _ = response.await;
            }
        }
        result.map(|_| ())
    }

    /// Tears the application down and stops its dedicated executors.
    ///
    /// Every container and network task is attempted even if some fail; the
    /// last failure is returned. Later calls are no-ops.
    pub async fn destroy(&self) -> Result<(), OrchestrationError> {
        if self.destroyed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        let mut failure = None;

        let master = crate::lock(&self.master).as_ref().map(|(_, m)| m.clone());
        if let Some(master) = master {
            let destroyed = match master.request(MasterEvent::DestroyApplication, ()) {
                Ok(response) => response.await.map_err(unwrap_handler_error),
                Err(e) => Err(e.into()),
            };
            if let Err(e) = destroyed {
                failure = Some(e);
            }
            master.close();
        }

        let finalized = match self.machine.request(ApplicationEvent::Finalize, ()) {
            Ok(response) => response.await,
            Err(e) => Err(e),
        };
        if let Err(e) = finalized {
            failure.get_or_insert(e.into());
        }
        self.machine.close();

        self.context.shutdown().await;
        tracing::debug!(application = self.name(), ok = failure.is_none(), "application destroyed");
        match failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn master_machine(&self) -> Result<MasterMachine, OrchestrationError> {
        crate::lock(&self.master)
            .as_ref()
            .map(|(_, m)| m.clone())
            .ok_or_else(|| OrchestrationError::NotSubmitted {
                application: self.name().to_string(),
            })
    }
}

impl std::fmt::Debug for Application {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Application")
            .field("name", &self.name())
            .field("state", &self.state())
            .field("master", &self.master_state())
            .finish_non_exhaustive()
    }
}

/// Recovers the handler's error from a master side-effect failure.
fn unwrap_handler_error(err: MachineError) -> OrchestrationError {
    match err {
        MachineError::SideEffect {
            machine,
            event,
            source,
        } => match source.downcast::<OrchestrationError>() {
            Ok(inner) => *inner,
            Err(source) => MachineError::SideEffect {
                machine,
                event,
                source,
            }
            .into(),
        },
        other => other.into(),
    }
}

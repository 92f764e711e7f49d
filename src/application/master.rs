//! # Application master.
//!
//! [`ApplicationMaster`] holds what orchestration works on: the DAG, the
//! container of every vertex and the application's [`ExecutorContext`]. Its
//! state machine runs on the application-master executor; the
//! `ExecuteApplication` and `DestroyApplication` transitions run the startup
//! and teardown handlers as their side effect, so a failed startup or
//! teardown leaves the master in its previous state.
//!
//! ```text
//! master.request(ExecuteApplication) ──► MasterProcessor::apply ──► execute_application(master)
//! master.request(DestroyApplication) ──► MasterProcessor::apply ──► destroy_application(master)
//! other events                       ──► no effect
//! ```

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Weak};

use async_trait::async_trait;

use super::{
    container::Container,
    dag::{Dag, VertexId},
    startup::execute_application,
    states::{MasterEvent, MasterState, Outcome, master_matrix, outcome},
    teardown::destroy_application,
};
use crate::{
    error::{BoxError, ExecutorError},
    executor::ExecutorContext,
    fsm::{SideEffect, StateMachine},
};

/// Application-master state machine handle.
pub type MasterMachine = StateMachine<MasterState, MasterEvent, Outcome>;

/// DAG, containers and executors of one submitted application.
pub struct ApplicationMaster {
    context: Arc<ExecutorContext>,
    dag: Arc<dyn Dag>,
    containers: BTreeMap<VertexId, Arc<dyn Container>>,
    executions: AtomicU32,
}

impl ApplicationMaster {
    /// Creates a master for `dag` with one container per vertex.
    pub fn new(
        context: Arc<ExecutorContext>,
        dag: Arc<dyn Dag>,
        containers: impl IntoIterator<Item = (VertexId, Arc<dyn Container>)>,
    ) -> Arc<Self> {
        Arc::new(Self {
            context,
            dag,
            containers: containers.into_iter().collect(),
            executions: AtomicU32::new(0),
        })
    }

    /// Spawns the master state machine on the application-master executor,
    /// wired to the orchestration handlers.
    ///
    /// The machine only keeps a weak reference: once every `Arc` of the
    /// master is gone, further orchestration events fail.
    pub fn spawn_machine(self: &Arc<Self>) -> Result<MasterMachine, ExecutorError> {
        let ctx = &self.context;
        MasterMachine::builder(
            format!("{}/application-master", ctx.name()),
            MasterState::New,
            master_matrix(),
            outcome,
        )
        .with_side_effect(Arc::new(MasterProcessor {
            master: Arc::downgrade(self),
        }))
        .with_capacity(ctx.mailbox_capacity())
        .with_bus(ctx.bus().clone())
        .spawn(ctx.application_master_executor())
    }

    /// Returns the application's executor registry.
    pub fn context(&self) -> &ExecutorContext {
        &self.context
    }

    /// Returns the DAG.
    pub fn dag(&self) -> &dyn Dag {
        self.dag.as_ref()
    }

    /// Returns the container of `vertex`.
    pub fn container(&self, vertex: &VertexId) -> Option<&Arc<dyn Container>> {
        self.containers.get(vertex)
    }

    /// Iterates over the containers, ordered by vertex id.
    pub fn containers(&self) -> impl Iterator<Item = (&VertexId, &Arc<dyn Container>)> {
        self.containers.iter()
    }

    /// Records that an execution began.
    pub fn register_execution(&self) -> u32 {
        self.executions.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Returns how many executions began.
    pub fn executions(&self) -> u32 {
        self.executions.load(Ordering::Acquire)
    }
}

impl std::fmt::Debug for ApplicationMaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApplicationMaster")
            .field("application", &self.context.name())
            .field("vertices", &self.containers.keys().collect::<Vec<_>>())
            .field("executions", &self.executions())
            .finish_non_exhaustive()
    }
}

/// Side effect of the master machine: dispatches to the orchestration handlers.
struct MasterProcessor {
    master: Weak<ApplicationMaster>,
}

#[async_trait]
impl SideEffect<MasterEvent, ()> for MasterProcessor {
    async fn apply(&self, event: &MasterEvent, _payload: ()) -> Result<(), BoxError> {
        let run = matches!(
            event,
            MasterEvent::ExecuteApplication | MasterEvent::DestroyApplication
        );
        if !run {
            return Ok(());
        }
        let Some(master) = self.master.upgrade() else {
            return Err("application master is gone".into());
        };
        match event {
            MasterEvent::ExecuteApplication => execute_application(&master).await?,
            _ => destroy_application(&master).await?,
        }
        Ok(())
    }
}

//! # Per-application executor registry.
//!
//! [`ExecutorContext`] holds every executor an application uses:
//!
//! ```text
//! ExecutorContext("wordcount")
//!   ├─ owns   container executor          "wordcount-container-state_machine"          (1 worker)
//!   ├─ owns   application executor        "wordcount-application-state_machine"        (1 worker)
//!   ├─ owns   application-master executor "wordcount-application-master-state_machine" (1 worker)
//!   ├─ shares network pool     (process-wide, Arc)
//!   ├─ shares processing pool  (process-wide, Arc)
//!   ├─ network task list       (appended during setup, sealed at execution)
//!   └─ processing task list    (appended during setup, sealed at execution)
//! ```
//!
//! ## Rules
//! - Built once per application; the dedicated executors die with it
//! - The shared pools are never shut down from here

use std::sync::Arc;
use std::time::Duration;

use crate::{
    config::Config,
    events::Bus,
    executor::{Executor, StateMachineExecutor, TaskList},
};

/// All executors and pending task lists of one application.
#[derive(Debug)]
pub struct ExecutorContext {
    name: Arc<str>,
    await_timeout: Option<Duration>,
    mailbox_capacity: usize,
    bus: Bus,

    container_executor: StateMachineExecutor,
    application_executor: StateMachineExecutor,
    application_master_executor: StateMachineExecutor,

    network_executor: Arc<Executor>,
    processing_executor: Arc<Executor>,

    network_tasks: TaskList,
    processing_tasks: TaskList,
}

impl ExecutorContext {
    /// Builds the registry and spawns the three dedicated executors.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn new(
        name: impl Into<Arc<str>>,
        cfg: &Config,
        network_executor: Arc<Executor>,
        processing_executor: Arc<Executor>,
        bus: Bus,
    ) -> Self {
        let name: Arc<str> = name.into();
        let dedicated = |kind: &str| {
            StateMachineExecutor::new(format!("{name}-{kind}-state_machine"), cfg.idle, bus.clone())
        };

        Self {
            container_executor: dedicated("container"),
            application_executor: dedicated("application"),
            application_master_executor: dedicated("application-master"),
            network_executor,
            processing_executor,
            network_tasks: TaskList::new("network"),
            processing_tasks: TaskList::new("processing"),
            await_timeout: cfg.await_limit(),
            mailbox_capacity: cfg.mailbox_capacity_clamped(),
            bus: bus.clone(),
            name,
        }
    }

    /// Returns the application name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the bound on each container start (`None` = unbounded).
    pub fn await_timeout(&self) -> Option<Duration> {
        self.await_timeout
    }

    /// Returns the mailbox capacity for this application's state machines.
    pub fn mailbox_capacity(&self) -> usize {
        self.mailbox_capacity
    }

    /// Returns the event bus.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Executor for processing container state machines.
    pub fn container_executor(&self) -> &StateMachineExecutor {
        &self.container_executor
    }

    /// Executor for the application state machine.
    pub fn application_executor(&self) -> &StateMachineExecutor {
        &self.application_executor
    }

    /// Executor for the application-master state machine.
    pub fn application_master_executor(&self) -> &StateMachineExecutor {
        &self.application_master_executor
    }

    /// Shared executor for network tasks.
    pub fn network_executor(&self) -> &Arc<Executor> {
        &self.network_executor
    }

    /// Shared executor for processing tasks.
    pub fn processing_executor(&self) -> &Arc<Executor> {
        &self.processing_executor
    }

    /// Network tasks awaiting submission.
    pub fn network_tasks(&self) -> &TaskList {
        &self.network_tasks
    }

    /// Processing tasks awaiting submission.
    pub fn processing_tasks(&self) -> &TaskList {
        &self.processing_tasks
    }

    /// Stops the three dedicated executors. The shared pools keep running.
    pub async fn shutdown(&self) {
        self.container_executor.shutdown().await;
        self.application_executor.shutdown().await;
        self.application_master_executor.shutdown().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policies::IdlePolicy;

    #[tokio::test]
    async fn names_dedicated_executors_after_application() {
        let bus = Bus::default();
        let network = Executor::new("network", 2, IdlePolicy::default(), bus.clone());
        let processing = Executor::new("processing", 2, IdlePolicy::default(), bus.clone());

        let ctx = ExecutorContext::new(
            "wordcount",
            &Config::default(),
            Arc::clone(&network),
            Arc::clone(&processing),
            bus,
        );

        assert_eq!(ctx.container_executor().name(), "wordcount-container-state_machine");
        assert_eq!(ctx.application_executor().name(), "wordcount-application-state_machine");
        assert_eq!(
            ctx.application_master_executor().name(),
            "wordcount-application-master-state_machine"
        );
        assert!(Arc::ptr_eq(ctx.network_executor(), &network));
        assert!(ctx.network_tasks().is_empty());
        assert!(ctx.processing_tasks().is_empty());

        ctx.shutdown().await;
        assert!(ctx.container_executor().is_shutting_down());
        assert!(!network.is_shutting_down());
    }
}

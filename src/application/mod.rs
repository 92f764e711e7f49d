//! # Applications: DAG jobs and their orchestration.
//!
//! - [`Dag`] / [`VertexId`]: the job graph as seen by the runtime;
//! - [`Container`] / [`ProcessingContainer`]: one vertex's runtime;
//! - [`ApplicationMaster`]: DAG + containers + executors, driven by the
//!   master state machine;
//! - [`execute_application`] / [`destroy_application`]: startup and teardown
//!   handlers run by the master's transitions;
//! - [`Application`]: facade tying it all to an application state machine.

mod app;
mod container;
mod dag;
mod master;
mod startup;
mod states;
mod teardown;
#[cfg(test)]
mod testing;

pub use app::{Application, ApplicationMachine};
pub use container::{Container, ContainerMachine, ProcessingContainer};
pub use dag::{Dag, VertexId};
pub use master::{ApplicationMaster, MasterMachine};
pub use startup::execute_application;
pub use states::{
    ApplicationEvent, ApplicationState, ContainerEvent, ContainerState, MasterEvent, MasterState,
    Outcome, application_matrix, container_matrix, master_matrix, outcome,
};
pub use teardown::destroy_application;

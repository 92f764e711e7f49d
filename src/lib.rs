//! # dagvisor
//!
//! **Dagvisor** is the orchestration core of a DAG job runtime.
//!
//! Every application is a DAG of processing containers. Container, application
//! and application-master lifecycles are driven by finite state machines whose
//! transitions are serialized behind an async request/response API, while the
//! actual work units ("tasks") are polled by shared cooperative executor pools.
//!
//! ## Architecture
//! ### Overview
//! ```text
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Runtime (one per process)                                        │
//! │  - Bus (broadcast events) ──► listener ──► SubscriberSet          │
//! │  - network pool    (Executor, N workers)                          │
//! │  - processing pool (Executor, M workers)                          │
//! └──────┬─────────────────────────────────────────────┬──────────────┘
//!        ▼ Runtime::application(name)                  │ shared
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Application                                                      │
//! │  ExecutorContext                                                  │
//! │   ├─ container executor          (1 worker) ◄─ container mailboxes│
//! │   ├─ application executor        (1 worker) ◄─ application mailbox│
//! │   ├─ application-master executor (1 worker) ◄─ master mailbox     │
//! │   ├─ network task list    ──── sealed + submitted at execution ───┤
//! │   └─ processing task list ──── sealed + submitted at execution ───┘
//! └───────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ### Lifecycle
//! ```text
//! submit(dag, containers)
//!   └─► app: New ──Submit──► Submitted, master: New ──SubmitDag──► DagSubmitted
//! execute()
//!   └─► master ExecuteApplication ─ side effect ─► execute_application()
//!         ├─► containers started sinks first, each bounded by await_timeout
//!         └─► task lists submitted to the shared pools
//! destroy()
//!   └─► master DestroyApplication ─ side effect ─► destroy_application()
//!         ├─► every container destroyed (failures collected)
//!         └─► every network task destroyed
//! ```
//!
//! ## Features
//! | Area                | Description                                              | Key types / traits                                   |
//! |---------------------|----------------------------------------------------------|------------------------------------------------------|
//! | **State machines**  | Generic FSM with injected matrix, side effect and output | [`StateMachine`], [`TransitionMatrix`], [`SideEffect`] |
//! | **Executors**       | Cooperative pools and single-consumer FSM executors      | [`Executor`], [`StateMachineExecutor`]               |
//! | **Tasks**           | Cooperative, interruptible units of work                 | [`Task`], [`TaskFn`], [`TaskRef`]                    |
//! | **Applications**    | DAG startup/teardown orchestration                       | [`Application`], [`Container`], [`Dag`]              |
//! | **Subscriber API**  | Hook into runtime events (logging, metrics, custom)      | [`Subscribe`]                                        |
//! | **Errors**          | Typed errors for tasks, executors, machines, startup     | [`TaskError`], [`MachineError`], [`OrchestrationError`] |
//! | **Configuration**   | Centralized runtime settings                             | [`Config`], [`IdlePolicy`]                           |
//!
//! ## Optional features
//! - `logging` (default): exports the built-in [`LogWriter`] subscriber.
//!
//! ## Example
//! ```rust,no_run
//! use std::sync::Arc;
//! use dagvisor::{Config, Container, ProcessingContainer, Progress, Runtime, TaskError, TaskFn, TaskRef, VertexId};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let rt = Runtime::builder(Config::default()).build();
//!     let app = rt.application("wordcount")?;
//!
//!     let tokenize: TaskRef = TaskFn::arc("tokenize", || async { Ok::<_, TaskError>(Progress::Completed) });
//!     let source = ProcessingContainer::new("source", app.context(), vec![tokenize])?;
//!     let sink = ProcessingContainer::new("sink", app.context(), Vec::new())?;
//!
//!     // Sinks first: "sink" consumes what "source" produces.
//!     let order = vec![VertexId::from("sink"), VertexId::from("source")];
//!     app.submit(
//!         order,
//!         [
//!             (VertexId::from("source"), source as Arc<dyn Container>),
//!             (VertexId::from("sink"), sink as Arc<dyn Container>),
//!         ],
//!     )
//!     .await?;
//!
//!     app.execute().await?;
//!     app.destroy().await?;
//!     rt.shutdown().await;
//!     Ok(())
//! }
//! ```

mod application;
mod config;
mod error;
mod events;
mod executor;
mod fsm;
mod policies;
mod runtime;
mod subscribers;
mod tasks;

// ---- Public re-exports ----

pub use application::{
    Application, ApplicationEvent, ApplicationMachine, ApplicationMaster, ApplicationState,
    Container, ContainerEvent, ContainerMachine, ContainerState, Dag, MasterEvent, MasterMachine,
    MasterState, Outcome, ProcessingContainer, VertexId, application_matrix, container_matrix,
    destroy_application, execute_application, master_matrix, outcome,
};
pub use config::Config;
pub use error::{BoxError, ExecutorError, MachineError, OrchestrationError, TaskError};
pub use events::{Bus, Event, EventKind};
pub use executor::{Executor, ExecutorContext, StateMachineExecutor, TaskList};
pub use fsm::{
    Label, Responder, Response, SideEffect, StateMachine, StateMachineBuilder, TransitionMatrix,
    channel as response_channel,
};
pub use policies::{IdlePolicy, JitterPolicy};
pub use runtime::{Runtime, RuntimeBuilder};
pub use subscribers::{Subscribe, SubscriberSet};
pub use tasks::{Progress, Task, TaskFn, TaskRef};

// Optional: expose a simple built-in logger subscriber.
// Enable with: `--features logging` (on by default)
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;

use std::any::Any;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Locks `m`, recovering the guard if a previous holder panicked.
pub(crate) fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Renders a panic payload (`&str` / `String`) for events and errors.
pub(crate) fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

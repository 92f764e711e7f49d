//! Executors: cooperative worker pools and the per-application registry.
//!
//! - [`Executor`]: fixed-size pool polling [`Task`](crate::Task)s cooperatively
//!   (shared network and processing pools);
//! - [`StateMachineExecutor`]: one-worker executor draining state machine mailboxes;
//! - [`TaskList`]: append-only list of tasks awaiting bulk submission;
//! - [`ExecutorContext`]: everything one application runs on.

mod context;
mod pool;
mod state_machine;
mod task_list;
mod worker;

pub use context::ExecutorContext;
pub use pool::Executor;
pub(crate) use pool::attempt_all;
pub use state_machine::StateMachineExecutor;
pub use task_list::TaskList;

//! # Generic finite-state-machine engine.
//!
//! A machine is generic over its state `S`, event `E`, output `O` and
//! side-effect payload `P`, with three injected pieces:
//! - a shared [`TransitionMatrix`];
//! - an optional [`SideEffect`] run before a transition is committed;
//! - an output function `Fn(&E, Option<S>) -> O`.
//!
//! ```text
//! caller ── request(e, p) ──► [bounded mailbox] ──► mailbox task (1 consumer)
//!   ▲                                                     │ side_effect(e, p)
//!   └──────────── Response<O> ◄───── resolve ◄────────────┘ state = next
//! ```

mod machine;
mod mailbox;
mod matrix;
mod response;

use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::BoxError;

pub use machine::{StateMachine, StateMachineBuilder};
pub use matrix::TransitionMatrix;
pub use response::{Responder, Response, channel};

/// Bound shared by states and events: small, copyable, hashable enums.
pub trait Label: Copy + Eq + Hash + Debug + Send + Sync + 'static {}

impl<T> Label for T where T: Copy + Eq + Hash + Debug + Send + Sync + 'static {}

/// Hook run by the mailbox before committing a legal transition.
///
/// An `Err` (or a panic) leaves the state unchanged and is delivered to the
/// caller as [`MachineError::SideEffect`](crate::MachineError::SideEffect).
#[async_trait]
pub trait SideEffect<E: Label, P: Send + 'static>: Send + Sync + 'static {
    /// Applies the effect of `event` with its `payload`.
    async fn apply(&self, event: &E, payload: P) -> Result<(), BoxError>;
}

/// Output function: `(event, next state or None if illegal) -> output`.
pub(crate) type OutputFn<S, E, O> = Arc<dyn Fn(&E, Option<S>) -> O + Send + Sync>;

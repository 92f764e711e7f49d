//! # Generic state machine handle.
//!
//! [`StateMachine`] is the caller side of one machine instance: it enqueues
//! requests into the bounded mailbox and reads the published state. The
//! mailbox itself runs on a [`StateMachineExecutor`].
//!
//! ## Rules
//! - Requests of one machine are processed FIFO, one at a time
//! - Every accepted request gets exactly one result
//! - A full or closed mailbox rejects synchronously with [`MachineError::Rejected`]
//! - Dropping every handle (or calling [`close`](StateMachine::close)) lets the
//!   mailbox drain what is queued, then leave its executor
//!
//! ## Example
//! ```rust,no_run
//! use std::sync::Arc;
//! use dagvisor::{Bus, IdlePolicy, StateMachine, StateMachineExecutor, TransitionMatrix};
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
//! enum Light { Off, On }
//! #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
//! enum Switch { Flip }
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let executor = StateMachineExecutor::new("lights", IdlePolicy::default(), Bus::default());
//! let matrix = TransitionMatrix::new()
//!     .with(Light::Off, Switch::Flip, Light::On)
//!     .with(Light::On, Switch::Flip, Light::Off);
//!
//! let machine = StateMachine::<_, _, bool, ()>::builder("hall", Light::Off, matrix, |_, next| {
//!     next == Some(Light::On)
//! })
//! .spawn(&executor)?;
//!
//! assert!(machine.request(Switch::Flip, ())?.await?);
//! assert_eq!(machine.current_state(), Light::On);
//! # Ok(())
//! # }
//! ```

use std::sync::{Arc, Mutex};

use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

use super::{
    Label, OutputFn, SideEffect, TransitionMatrix,
    mailbox::{Mailbox, Request},
    response::{self, Response},
};
use crate::{
    error::{ExecutorError, MachineError},
    events::Bus,
    executor::StateMachineExecutor,
    tasks::TaskRef,
};

const DEFAULT_CAPACITY: usize = 1024;

/// Handle to one running state machine.
///
/// `S` state, `E` event, `O` output, `P` side-effect payload.
pub struct StateMachine<S: Label, E: Label, O, P = ()> {
    name: Arc<str>,
    tx: mpsc::Sender<Request<E, P, O>>,
    state: watch::Receiver<S>,
    last_output: watch::Receiver<Option<O>>,
    closing: CancellationToken,
    executor: StateMachineExecutor,
}

impl<S, E, O, P> StateMachine<S, E, O, P>
where
    S: Label,
    E: Label,
    O: Clone + std::fmt::Debug + Send + Sync + 'static,
    P: Send + 'static,
{
    /// Starts building a machine named `name`.
    pub fn builder<F>(
        name: impl Into<Arc<str>>,
        initial: S,
        matrix: impl Into<Arc<TransitionMatrix<S, E>>>,
        output: F,
    ) -> StateMachineBuilder<S, E, O, P>
    where
        F: Fn(&E, Option<S>) -> O + Send + Sync + 'static,
    {
        StateMachineBuilder {
            name: name.into(),
            initial,
            matrix: matrix.into(),
            output: Arc::new(output),
            side_effect: None,
            capacity: DEFAULT_CAPACITY,
            bus: None,
        }
    }

    /// Returns the machine name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Enqueues `event` with its side-effect `payload`.
    ///
    /// ### Errors
    /// [`MachineError::Rejected`] if the mailbox is full, closed, or its
    /// executor is shutting down. Nothing is enqueued in that case.
    pub fn request(&self, event: E, payload: P) -> Result<Response<O>, MachineError> {
        if self.closing.is_cancelled() || self.executor.is_shutting_down() {
            return Err(self.rejected("closed"));
        }

        let (responder, response) = response::channel(Arc::clone(&self.name));
        let req = Request {
            event,
            payload,
            responder,
        };
        match self.tx.try_send(req) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => return Err(self.rejected("full")),
            Err(mpsc::error::TrySendError::Closed(_)) => return Err(self.rejected("closed")),
        }

        self.executor.wake();
        Ok(response)
    }

    /// Returns the current state.
    pub fn current_state(&self) -> S {
        *self.state.borrow()
    }

    /// Returns the output of the last processed request.
    ///
    /// After a committed transition this is `output(event, Some(next))`; after
    /// an event the current state has no transition for, it is
    /// `output(event, None)`. A snapshot: a queued request may already have
    /// replaced it by the time the caller looks.
    pub fn last_output(&self) -> Option<O> {
        self.last_output.borrow().clone()
    }

    /// Returns a receiver that observes every committed state.
    pub fn watch_state(&self) -> watch::Receiver<S> {
        self.state.clone()
    }

    /// Stops accepting requests. Queued requests are still processed.
    pub fn close(&self) {
        self.closing.cancel();
        self.executor.wake();
    }

    /// Returns `true` once [`close`](Self::close) was called.
    pub fn is_closed(&self) -> bool {
        self.closing.is_cancelled()
    }

    fn rejected(&self, reason: &'static str) -> MachineError {
        MachineError::Rejected {
            machine: self.name.to_string(),
            reason,
        }
    }
}

impl<S: Label, E: Label, O, P> Clone for StateMachine<S, E, O, P> {
    fn clone(&self) -> Self {
        Self {
            name: Arc::clone(&self.name),
            tx: self.tx.clone(),
            state: self.state.clone(),
            last_output: self.last_output.clone(),
            closing: self.closing.clone(),
            executor: self.executor.clone(),
        }
    }
}

impl<S: Label, E: Label, O, P> std::fmt::Debug for StateMachine<S, E, O, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateMachine")
            .field("name", &self.name)
            .field("state", &*self.state.borrow())
            .field("executor", &self.executor.name())
            .finish_non_exhaustive()
    }
}

/// Builder for [`StateMachine`].
pub struct StateMachineBuilder<S: Label, E: Label, O, P> {
    name: Arc<str>,
    initial: S,
    matrix: Arc<TransitionMatrix<S, E>>,
    output: OutputFn<S, E, O>,
    side_effect: Option<Arc<dyn SideEffect<E, P>>>,
    capacity: usize,
    bus: Option<Bus>,
}

impl<S, E, O, P> StateMachineBuilder<S, E, O, P>
where
    S: Label,
    E: Label,
    O: Clone + std::fmt::Debug + Send + Sync + 'static,
    P: Send + 'static,
{
    /// Runs `hook` before committing each legal transition.
    pub fn with_side_effect(mut self, hook: Arc<dyn SideEffect<E, P>>) -> Self {
        self.side_effect = Some(hook);
        self
    }

    /// Sets the mailbox capacity (minimum 1).
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    /// Publishes transitions on `bus`.
    pub fn with_bus(mut self, bus: Bus) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Registers the mailbox on `executor` and returns the handle.
    ///
    /// ### Errors
    /// [`ExecutorError::ShuttingDown`] if the executor stopped.
    pub fn spawn(self, executor: &StateMachineExecutor) -> Result<StateMachine<S, E, O, P>, ExecutorError> {
        let (tx, rx) = mpsc::channel(self.capacity);
        let (state_tx, state_rx) = watch::channel(self.initial);
        let (output_tx, output_rx) = watch::channel(None);
        let closing = CancellationToken::new();

        let mailbox: TaskRef = Arc::new(Mailbox {
            name: Arc::clone(&self.name),
            rx: Mutex::new(rx),
            matrix: self.matrix,
            side_effect: self.side_effect,
            output: self.output,
            state: state_tx,
            last_output: output_tx,
            closing: closing.clone(),
            bus: self.bus.unwrap_or_default(),
        });
        executor.register(mailbox)?;

        tracing::debug!(machine = %self.name, executor = executor.name(), "state machine spawned");
        Ok(StateMachine {
            name: self.name,
            tx,
            state: state_rx,
            last_output: output_rx,
            closing,
            executor: executor.clone(),
        })
    }
}

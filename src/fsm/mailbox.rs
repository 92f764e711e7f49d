//! # Mailbox task of one state machine.
//!
//! The mailbox is the only place where a machine's state is written. It is
//! registered as a [`Task`] on a one-worker executor; each `execute` call
//! processes at most one request:
//!
//! ```text
//! execute():
//!   ├─► try_recv()            empty → Idle, closed+drained → Completed
//!   ├─► row = matrix[state]   none  → IllegalTransition
//!   ├─► next = row[event]     none  → last_output = output(event, None), IllegalTransition
//!   ├─► side_effect(event, payload)
//!   │       ├─ Err / panic → SideEffect error, state unchanged
//!   │       └─ Ok          → state = next, out = output(event, Some(next)),
//!   │                        last_output = out, resolve Ok(out)
//!   └─► Busy if more requests are queued, else Idle
//! ```

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::FutureExt;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

use super::{Label, OutputFn, SideEffect, TransitionMatrix, response::Responder};
use crate::{
    error::{BoxError, MachineError, TaskError},
    events::{Bus, Event, EventKind},
    tasks::{Progress, Task},
};

/// One queued request.
pub(crate) struct Request<E, P, O> {
    pub(crate) event: E,
    pub(crate) payload: P,
    pub(crate) responder: Responder<O>,
}

pub(crate) struct Mailbox<S: Label, E: Label, O, P> {
    pub(crate) name: Arc<str>,
    pub(crate) rx: Mutex<mpsc::Receiver<Request<E, P, O>>>,
    pub(crate) matrix: Arc<TransitionMatrix<S, E>>,
    pub(crate) side_effect: Option<Arc<dyn SideEffect<E, P>>>,
    pub(crate) output: OutputFn<S, E, O>,
    pub(crate) state: watch::Sender<S>,
    pub(crate) last_output: watch::Sender<Option<O>>,
    pub(crate) closing: CancellationToken,
    pub(crate) bus: Bus,
}

enum Next<E, P, O> {
    Request(Request<E, P, O>),
    Empty,
    Drained,
}

impl<S, E, O, P> Mailbox<S, E, O, P>
where
    S: Label,
    E: Label,
    O: Clone + std::fmt::Debug + Send + Sync + 'static,
    P: Send + 'static,
{
    fn next_request(&self) -> Next<E, P, O> {
        let mut rx = crate::lock(&self.rx);
        if self.closing.is_cancelled() {
            rx.close();
        }
        match rx.try_recv() {
            Ok(req) => Next::Request(req),
            Err(mpsc::error::TryRecvError::Empty) => Next::Empty,
            Err(mpsc::error::TryRecvError::Disconnected) => Next::Drained,
        }
    }

    fn has_pending(&self) -> bool {
        !crate::lock(&self.rx).is_empty()
    }

    async fn process(&self, req: Request<E, P, O>) {
        let Request {
            event,
            payload,
            responder,
        } = req;
        let state = *self.state.borrow();

        let Some(next) = self.matrix.next(&state, &event) else {
            if self.matrix.transitions(&state).is_some() {
                let diagnostic = (self.output)(&event, None);
                tracing::warn!(machine = %self.name, ?state, ?event, output = ?diagnostic, "no transition for event");
                self.last_output.send_replace(Some(diagnostic));
            }
            self.reject(state, event, responder);
            return;
        };

        if let Err(source) = self.apply_side_effect(&event, payload).await {
            self.bus.publish(
                Event::new(EventKind::SideEffectFailed)
                    .with_source(self.name.as_ref())
                    .with_state(format!("{state:?}"))
                    .with_event(format!("{event:?}"))
                    .with_reason(source.to_string()),
            );
            responder.resolve(Err(MachineError::SideEffect {
                machine: self.name.to_string(),
                event: format!("{event:?}"),
                source,
            }));
            return;
        }

        self.state.send_replace(next);
        let out = (self.output)(&event, Some(next));
        self.last_output.send_replace(Some(out.clone()));

        tracing::debug!(machine = %self.name, from = ?state, to = ?next, ?event, "transition applied");
        self.bus.publish(
            Event::new(EventKind::TransitionApplied)
                .with_source(self.name.as_ref())
                .with_state(format!("{next:?}"))
                .with_event(format!("{event:?}")),
        );
        responder.resolve(Ok(out));
    }

    async fn apply_side_effect(&self, event: &E, payload: P) -> Result<(), BoxError> {
        let Some(hook) = &self.side_effect else {
            return Ok(());
        };
        match std::panic::AssertUnwindSafe(hook.apply(event, payload))
            .catch_unwind()
            .await
        {
            Ok(res) => res,
            Err(panic) => Err(format!("side effect panicked: {}", crate::panic_message(panic.as_ref())).into()),
        }
    }

    fn reject(&self, state: S, event: E, responder: Responder<O>) {
        self.bus.publish(
            Event::new(EventKind::TransitionRejected)
                .with_source(self.name.as_ref())
                .with_state(format!("{state:?}"))
                .with_event(format!("{event:?}"))
                .with_reason("illegal event"),
        );
        responder.resolve(Err(MachineError::IllegalTransition {
            machine: self.name.to_string(),
            state: format!("{state:?}"),
            event: format!("{event:?}"),
        }));
    }
}

#[async_trait]
impl<S, E, O, P> Task for Mailbox<S, E, O, P>
where
    S: Label,
    E: Label,
    O: Clone + std::fmt::Debug + Send + Sync + 'static,
    P: Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self) -> Result<Progress, TaskError> {
        let req = match self.next_request() {
            Next::Request(req) => req,
            Next::Empty => return Ok(Progress::Idle),
            Next::Drained => return Ok(Progress::Completed),
        };
        self.process(req).await;

        if self.has_pending() {
            Ok(Progress::Busy)
        } else {
            Ok(Progress::Idle)
        }
    }

    fn interrupt(&self, _cause: &(dyn std::error::Error + Send + Sync)) -> Result<(), TaskError> {
        self.closing.cancel();
        Ok(())
    }

    fn destroy(&self) -> Result<(), TaskError> {
        self.closing.cancel();
        Ok(())
    }
}

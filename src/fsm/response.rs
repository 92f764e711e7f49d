//! # Single-assignment request result.
//!
//! [`channel`] returns a [`Responder`] (kept by whoever processes the request)
//! and a [`Response`] (handed to the caller). `Responder::resolve` consumes
//! the responder, so a result is delivered at most once; dropping it
//! unresolved makes the response fail with [`MachineError::Dropped`].
//!
//! ```text
//! caller ── request(event) ──► Response ◄─────── oneshot ──────── Responder ◄── worker
//!   │                              │                                  │
//!   └── .await / wait(timeout) ────┘                   resolve(Ok(out) | Err(e))
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use tokio::sync::oneshot;

use crate::error::MachineError;

/// Creates a connected responder/response pair for machine `machine`.
pub fn channel<O>(machine: impl Into<Arc<str>>) -> (Responder<O>, Response<O>) {
    let (tx, rx) = oneshot::channel();
    let machine = machine.into();
    (
        Responder { tx },
        Response { machine, rx },
    )
}

/// Write side of a request result.
#[derive(Debug)]
pub struct Responder<O> {
    tx: oneshot::Sender<Result<O, MachineError>>,
}

impl<O> Responder<O> {
    /// Delivers the result. Returns `false` if the caller stopped listening.
    pub fn resolve(self, result: Result<O, MachineError>) -> bool {
        self.tx.send(result).is_ok()
    }
}

/// Eventual result of a state machine request.
///
/// Implements [`Future`]; use [`wait`](Self::wait) for a bounded wait.
#[derive(Debug)]
pub struct Response<O> {
    machine: Arc<str>,
    rx: oneshot::Receiver<Result<O, MachineError>>,
}

impl<O> Response<O> {
    /// Returns the name of the machine that owes this response.
    pub fn machine(&self) -> &str {
        &self.machine
    }

    /// Waits for the result, at most `timeout` (`None` = forever).
    ///
    /// ### Errors
    /// [`MachineError::Timeout`] when the bound elapses, otherwise whatever
    /// the machine resolved.
    pub async fn wait(self, timeout: Option<Duration>) -> Result<O, MachineError> {
        let Some(limit) = timeout else {
            return self.await;
        };
        let machine = Arc::clone(&self.machine);
        match tokio::time::timeout(limit, self).await {
            Ok(res) => res,
            Err(_) => Err(MachineError::Timeout {
                machine: machine.to_string(),
                timeout: limit,
            }),
        }
    }
}

impl<O> Future for Response<O> {
    type Output = Result<O, MachineError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match Pin::new(&mut this.rx).poll(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Ok(res)) => Poll::Ready(res),
            Poll::Ready(Err(_)) => Poll::Ready(Err(MachineError::Dropped {
                machine: this.machine.to_string(),
            })),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn resolves_once_with_value() {
        let (tx, rx) = channel::<u8>("m");
        assert!(tx.resolve(Ok(7)));
        assert_eq!(rx.await.unwrap(), 7);
    }

    #[tokio::test]
    async fn dropped_responder_fails_the_response() {
        let (tx, rx) = channel::<u8>("m");
        drop(tx);
        assert!(matches!(rx.await, Err(MachineError::Dropped { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn bounded_wait_times_out() {
        let (_tx, rx) = channel::<u8>("slow");
        let err = rx.wait(Some(Duration::from_millis(50))).await.unwrap_err();
        match err {
            MachineError::Timeout { machine, timeout } => {
                assert_eq!(machine, "slow");
                assert_eq!(timeout, Duration::from_millis(50));
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}

//! Test doubles for orchestration tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use super::{Container, ContainerEvent, Outcome};
use crate::{
    config::Config,
    error::{BoxError, MachineError, TaskError},
    events::Bus,
    executor::{Executor, ExecutorContext},
    fsm::{Responder, Response, channel},
    policies::IdlePolicy,
    tasks::{Progress, Task},
};

/// Shared journal of container calls, in call order.
pub(crate) type Journal = Arc<Mutex<Vec<String>>>;

pub(crate) fn journal() -> Journal {
    Arc::new(Mutex::new(Vec::new()))
}

pub(crate) fn entries(journal: &Journal) -> Vec<String> {
    crate::lock(journal).clone()
}

/// How a mock container answers `Execute`.
#[derive(Clone, Copy)]
pub(crate) enum Start {
    Ok,
    Fail,
    Hang,
}

pub(crate) struct MockContainer {
    id: &'static str,
    start: Start,
    destroy_fails: bool,
    journal: Journal,
    hung: Mutex<Vec<Responder<Outcome>>>,
    pub(crate) destroys: AtomicUsize,
}

impl MockContainer {
    pub(crate) fn new(id: &'static str, start: Start, destroy_fails: bool, journal: &Journal) -> Arc<Self> {
        Arc::new(Self {
            id,
            start,
            destroy_fails,
            journal: Arc::clone(journal),
            hung: Mutex::new(Vec::new()),
            destroys: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl Container for MockContainer {
    fn id(&self) -> &str {
        self.id
    }

    fn request(&self, event: ContainerEvent) -> Result<Response<Outcome>, MachineError> {
        crate::lock(&self.journal).push(format!("{event:?}:{}", self.id));
        let (tx, rx) = channel(self.id);
        match self.start {
            Start::Ok => {
                tx.resolve(Ok(Outcome::Success));
            }
            Start::Fail => {
                tx.resolve(Err(MachineError::IllegalTransition {
                    machine: self.id.to_string(),
                    state: "Finalized".into(),
                    event: format!("{event:?}"),
                }));
            }
            Start::Hang => crate::lock(&self.hung).push(tx),
        }
        Ok(rx)
    }

    async fn destroy(&self) -> Result<(), BoxError> {
        crate::lock(&self.journal).push(format!("Destroy:{}", self.id));
        self.destroys.fetch_add(1, Ordering::SeqCst);
        if self.destroy_fails {
            return Err(format!("{} refused to die", self.id).into());
        }
        Ok(())
    }
}

/// Always idle; counts cleanup calls.
pub(crate) struct Probe {
    name: &'static str,
    pub(crate) interrupts: AtomicUsize,
    pub(crate) destroys: AtomicUsize,
}

impl Probe {
    pub(crate) fn new(name: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            interrupts: AtomicUsize::new(0),
            destroys: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl Task for Probe {
    fn name(&self) -> &str {
        self.name
    }

    async fn execute(&self) -> Result<Progress, TaskError> {
        Ok(Progress::Idle)
    }

    fn interrupt(&self, _cause: &(dyn std::error::Error + Send + Sync)) -> Result<(), TaskError> {
        self.interrupts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn destroy(&self) -> Result<(), TaskError> {
        self.destroys.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Context with one-worker shared pools and the given start timeout.
pub(crate) fn context(name: &str, await_timeout: Duration) -> Arc<ExecutorContext> {
    let bus = Bus::default();
    let cfg = Config {
        await_timeout,
        ..Config::default()
    };
    let network = Executor::new("network", 1, IdlePolicy::default(), bus.clone());
    let processing = Executor::new("processing", 1, IdlePolicy::default(), bus.clone());
    Arc::new(ExecutorContext::new(name, &cfg, network, processing, bus))
}

/// Stops the dedicated executors and both shared pools.
pub(crate) async fn teardown(ctx: &ExecutorContext) {
    ctx.shutdown().await;
    ctx.network_executor().shutdown().await;
    ctx.processing_executor().shutdown().await;
}

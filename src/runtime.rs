//! # Process-wide runtime.
//!
//! [`Runtime`] owns what every application on this process shares:
//!
//! ```text
//! Runtime::builder(cfg).with_subscribers(subs).build()
//!   ├─► Bus (broadcast, bus_capacity)
//!   ├─► SubscriberSet (one worker per subscriber)
//!   ├─► listener: Bus.subscribe() ─► SubscriberSet::emit(&Event)
//!   ├─► network pool    (network_workers)
//!   └─► processing pool (processing_workers)
//!
//! Runtime::application(name)
//!   └─► ExecutorContext(name, cfg, network, processing, bus) ─► Application
//!
//! Runtime::shutdown()
//!   └─► stop both pools ─► stop listener ─► drain subscribers
//! ```
//!
//! ## Rules
//! - Applications never shut the shared pools down; only the runtime does
//! - Subscribers see every event published after `build()`

use std::sync::{Arc, Mutex};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::{
    application::Application,
    config::Config,
    error::ExecutorError,
    events::Bus,
    executor::{Executor, ExecutorContext},
    subscribers::{Subscribe, SubscriberSet},
};

/// Builder for [`Runtime`].
pub struct RuntimeBuilder {
    cfg: Config,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl RuntimeBuilder {
    /// Creates a builder with the given configuration.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
        }
    }

    /// Sets event subscribers.
    ///
    /// Each subscriber gets a dedicated worker with a bounded queue.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Spawns the shared pools, the subscriber workers and the bus listener.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn build(self) -> Arc<Runtime> {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let subs = Arc::new(SubscriberSet::new(self.subscribers, bus.clone()));
        let token = CancellationToken::new();
        let listener = spawn_listener(&bus, Arc::clone(&subs), token.clone());

        let network = Executor::new(
            "network",
            self.cfg.network_workers_clamped(),
            self.cfg.idle,
            bus.clone(),
        );
        let processing = Executor::new(
            "processing",
            self.cfg.processing_workers_clamped(),
            self.cfg.idle,
            bus.clone(),
        );

        tracing::debug!(
            network_workers = network.workers(),
            processing_workers = processing.workers(),
            "runtime started"
        );
        Arc::new(Runtime {
            cfg: self.cfg,
            bus,
            network,
            processing,
            subs: Mutex::new(Some(subs)),
            listener: Mutex::new(Some(listener)),
            token,
        })
    }
}

/// Forwards bus events to the subscriber set until cancelled or the bus closes.
fn spawn_listener(bus: &Bus, subs: Arc<SubscriberSet>, token: CancellationToken) -> JoinHandle<()> {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                ev = rx.recv() => match ev {
                    Ok(ev) => subs.emit(&ev),
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(skipped = n, "event listener lagged");
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                },
            }
        }
    })
}

/// Shared pools, event bus and subscribers of one process.
pub struct Runtime {
    cfg: Config,
    bus: Bus,
    network: Arc<Executor>,
    processing: Arc<Executor>,
    subs: Mutex<Option<Arc<SubscriberSet>>>,
    listener: Mutex<Option<JoinHandle<()>>>,
    token: CancellationToken,
}

impl Runtime {
    /// Starts building a runtime.
    pub fn builder(cfg: Config) -> RuntimeBuilder {
        RuntimeBuilder::new(cfg)
    }

    /// Returns the configuration.
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Returns the event bus.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Returns the shared network pool.
    pub fn network_executor(&self) -> &Arc<Executor> {
        &self.network
    }

    /// Returns the shared processing pool.
    pub fn processing_executor(&self) -> &Arc<Executor> {
        &self.processing
    }

    /// Creates an application with its own executor registry on the shared pools.
    ///
    /// ### Errors
    /// [`ExecutorError::ShuttingDown`] if the runtime is shutting down.
    pub fn application(&self, name: impl Into<Arc<str>>) -> Result<Application, ExecutorError> {
        if self.token.is_cancelled() {
            return Err(ExecutorError::ShuttingDown {
                executor: "runtime".into(),
            });
        }
        let ctx = ExecutorContext::new(
            name,
            &self.cfg,
            Arc::clone(&self.network),
            Arc::clone(&self.processing),
            self.bus.clone(),
        );
        Application::new(Arc::new(ctx))
    }

    /// Stops both pools, then the listener and the subscriber workers.
    ///
    /// Applications should be destroyed first. Idempotent.
    pub async fn shutdown(&self) {
        self.network.shutdown().await;
        self.processing.shutdown().await;

        self.token.cancel();
        let listener = crate::lock(&self.listener).take();
        if let Some(listener) = listener {
            let _ = listener.await;
        }

        let subs = crate::lock(&self.subs).take();
        if let Some(subs) = subs.and_then(|s| Arc::try_unwrap(s).ok()) {
            subs.shutdown().await;
        }
        tracing::debug!("runtime stopped");
    }
}

impl Drop for Runtime {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("network", &self.network)
            .field("processing", &self.processing)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{Event, EventKind};
    use async_trait::async_trait;
    use std::time::Duration;

    struct Counter {
        seen: Mutex<Vec<EventKind>>,
    }

    #[async_trait]
    impl Subscribe for Counter {
        async fn on_event(&self, event: &Event) {
            crate::lock(&self.seen).push(event.kind);
        }

        fn name(&self) -> &'static str {
            "counter"
        }
    }

    #[tokio::test]
    async fn forwards_events_and_stops_cleanly() {
        let counter = Arc::new(Counter {
            seen: Mutex::new(Vec::new()),
        });
        let rt = Runtime::builder(Config {
            network_workers: 2,
            processing_workers: 3,
            ..Config::default()
        })
        .with_subscribers(vec![counter.clone() as Arc<dyn Subscribe>])
        .build();

        assert_eq!(rt.network_executor().workers(), 2);
        assert_eq!(rt.processing_executor().workers(), 3);

        rt.bus().publish(Event::new(EventKind::ApplicationExecuting).with_source("probe"));
        tokio::time::timeout(Duration::from_secs(5), async {
            while !crate::lock(&counter.seen).contains(&EventKind::ApplicationExecuting) {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("subscriber should see the event");

        rt.shutdown().await;
        rt.shutdown().await;
        assert!(rt.network_executor().is_shutting_down());
        assert!(rt.application("late").is_err());
    }
}

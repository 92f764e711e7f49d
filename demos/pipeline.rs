//! # Example: pipeline
//!
//! Runs a three-vertex word-count DAG end to end.
//!
//! Shows how to:
//! - Build a [`Runtime`] with the built-in [`LogWriter`] and a custom subscriber.
//! - Wrap closures into tasks with [`TaskFn`].
//! - Submit, execute and destroy an [`Application`](dagvisor::Application).
//!
//! ## Flow
//! ```text
//! source ──► split ──► count        (data flow)
//! count, split, source              (startup order, sinks first)
//!
//! app.submit(order, containers)
//! app.execute()
//!   ├─► Execute sent to each container, awaited with await_timeout
//!   └─► network + processing lists submitted to the shared pools
//! app.destroy()
//!   └─► containers destroyed, network tasks destroyed, executors stopped
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=dagvisor=debug cargo run --example pipeline
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use dagvisor::{
    Config, Container, Event, EventKind, LogWriter, ProcessingContainer, Progress, Runtime,
    Subscribe, TaskError, TaskFn, TaskRef, VertexId,
};
use tracing_subscriber::EnvFilter;

/// Prints startup milestones to stdout.
struct Milestones;

#[async_trait::async_trait]
impl Subscribe for Milestones {
    async fn on_event(&self, ev: &Event) {
        match ev.kind {
            EventKind::ContainerStarted => {
                println!("[sub] started:   {}", ev.source.as_deref().unwrap_or("?"));
            }
            EventKind::ApplicationExecuting => {
                println!("[sub] executing: {} containers", ev.count.unwrap_or(0));
            }
            EventKind::ApplicationDestroyed => {
                println!("[sub] destroyed: {}", ev.source.as_deref().unwrap_or("?"));
            }
            _ => {}
        }
    }

    fn name(&self) -> &'static str {
        "milestones"
    }
}

/// Task that processes `budget` chunks, then completes.
fn stage(name: &'static str, budget: u32, done: &Arc<AtomicU32>) -> TaskRef {
    let done = Arc::clone(done);
    TaskFn::arc(name, move || {
        let done = Arc::clone(&done);
        async move {
            let n = done.fetch_add(1, Ordering::SeqCst) + 1;
            if n >= budget {
                Ok::<_, TaskError>(Progress::Completed)
            } else {
                Ok(Progress::Busy)
            }
        }
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cfg = Config {
        await_timeout: Duration::from_secs(5),
        ..Config::default()
    };
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new()), Arc::new(Milestones)];
    let rt = Runtime::builder(cfg).with_subscribers(subs).build();
    let app = rt.application("wordcount")?;

    let (read, split, count) = (
        Arc::new(AtomicU32::new(0)),
        Arc::new(AtomicU32::new(0)),
        Arc::new(AtomicU32::new(0)),
    );
    let containers: [(VertexId, Arc<dyn Container>); 3] = [
        (
            VertexId::from("source"),
            ProcessingContainer::new("source", app.context(), vec![stage("read", 10, &read)])?,
        ),
        (
            VertexId::from("split"),
            ProcessingContainer::new("split", app.context(), vec![stage("split", 20, &split)])?,
        ),
        (
            VertexId::from("count"),
            ProcessingContainer::new("count", app.context(), vec![stage("count", 20, &count)])?,
        ),
    ];
    app.add_network_task(stage("inbound", 5, &Arc::new(AtomicU32::new(0))))?;

    let order = vec![
        VertexId::from("count"),
        VertexId::from("split"),
        VertexId::from("source"),
    ];
    app.submit(order, containers).await?;
    app.execute().await?;

    tokio::time::sleep(Duration::from_millis(200)).await;
    println!(
        "[main] read={} split={} count={}",
        read.load(Ordering::SeqCst),
        split.load(Ordering::SeqCst),
        count.load(Ordering::SeqCst)
    );

    app.destroy().await?;
    rt.shutdown().await;
    Ok(())
}

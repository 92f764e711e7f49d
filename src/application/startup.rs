//! # Startup orchestration.
//!
//! Runs as the side effect of the master's `ExecuteApplication` transition.
//!
//! ```text
//! execute_application(master)
//!   ├─► register_execution()
//!   ├─► for vertex in dag.reverse_topological():
//!   │       container(vertex).request(Execute).wait(await_timeout)
//!   │         ├─ Ok          → next vertex
//!   │         └─ Err/timeout → abort, remaining vertices never started
//!   ├─► seal + submit network list    → network pool
//!   ├─► seal + submit processing list → processing pool
//!   └─► on rejection: interrupt every network task, then every
//!       processing task (best effort), return the rejection
//! ```
//!
//! ## Rules
//! - Containers that already started keep running when a later one fails;
//!   tearing them down is the caller's job (`DestroyApplication`)
//! - A start timeout is fatal; there is no retry

use super::{master::ApplicationMaster, states::ContainerEvent};
use crate::{
    error::{MachineError, OrchestrationError},
    events::{Event, EventKind},
    executor::attempt_all,
};

/// Starts every container in dependency order, then hands both task lists to
/// the shared pools.
///
/// ### Errors
/// - [`OrchestrationError::UnknownVertex`] if a vertex has no container;
/// - [`OrchestrationError::StartupFailed`] / [`OrchestrationError::StartupTimeout`]
///   for the first container that did not start;
/// - [`OrchestrationError::BatchRejected`] if a pool refused its batch.
pub async fn execute_application(master: &ApplicationMaster) -> Result<(), OrchestrationError> {
    let execution = master.register_execution();
    let ctx = master.context();
    tracing::debug!(application = ctx.name(), execution, "starting application");

    let started = start_containers(master).await?;

    let network = ctx.network_tasks().seal();
    let processing = ctx.processing_tasks().seal();

    let submitted = ctx
        .network_executor()
        .submit_batch(&network)
        .and_then(|()| ctx.processing_executor().submit_batch(&processing));

    if let Err(source) = submitted {
        let cause = OrchestrationError::BatchRejected { source };
        tracing::warn!(application = ctx.name(), error = %cause, "task submission failed, interrupting tasks");
        let _ = attempt_all(&network, ctx.bus(), |t| t.interrupt(&cause));
        let _ = attempt_all(&processing, ctx.bus(), |t| t.interrupt(&cause));
        return Err(cause);
    }

    ctx.bus().publish(
        Event::new(EventKind::ApplicationExecuting)
            .with_source(ctx.name())
            .with_count(started),
    );
    Ok(())
}

async fn start_containers(master: &ApplicationMaster) -> Result<usize, OrchestrationError> {
    let ctx = master.context();
    let timeout = ctx.await_timeout();
    let order = master.dag().reverse_topological();

    for vertex in &order {
        let Some(container) = master.container(vertex) else {
            return Err(OrchestrationError::UnknownVertex {
                vertex: vertex.to_string(),
            });
        };

        let mut starting = Event::new(EventKind::ContainerStarting).with_source(vertex.as_str());
        if let Some(t) = timeout {
            starting = starting.with_timeout(t);
        }
        ctx.bus().publish(starting);

        let started = match container.request(ContainerEvent::Execute) {
            Ok(response) => response.wait(timeout).await,
            Err(e) => Err(e),
        };

        if let Err(e) = started {
            ctx.bus().publish(
                Event::new(EventKind::StartupFailed)
                    .with_source(vertex.as_str())
                    .with_reason(e.to_string()),
            );
            return Err(match e {
                MachineError::Timeout { timeout, .. } => OrchestrationError::StartupTimeout {
                    vertex: vertex.to_string(),
                    timeout,
                },
                source => OrchestrationError::StartupFailed {
                    vertex: vertex.to_string(),
                    source,
                },
            });
        }

        tracing::debug!(container = container.id(), %vertex, "container started");
        ctx.bus()
            .publish(Event::new(EventKind::ContainerStarted).with_source(vertex.as_str()));
    }
    Ok(order.len())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    use super::*;
    use crate::application::testing::{MockContainer, Probe, Start, context, entries, journal, teardown};
    use crate::application::{ApplicationMaster, Container, VertexId};
    use crate::error::ExecutorError;
    use crate::tasks::TaskRef;

    fn order(ids: &[&str]) -> Arc<Vec<VertexId>> {
        Arc::new(ids.iter().map(|id| VertexId::from(*id)).collect())
    }

    fn entry(id: &'static str, c: &Arc<MockContainer>) -> (VertexId, Arc<dyn Container>) {
        (VertexId::from(id), Arc::clone(c) as Arc<dyn Container>)
    }

    #[tokio::test]
    async fn starts_containers_sinks_first_then_submits_tasks() {
        let ctx = context("wordcount", Duration::from_secs(5));
        let log = journal();
        let sink = MockContainer::new("sink", Start::Ok, false, &log);
        let map = MockContainer::new("map", Start::Ok, false, &log);
        let source = MockContainer::new("source", Start::Ok, false, &log);
        ctx.network_tasks().push(Probe::new("n1")).unwrap();
        ctx.processing_tasks().push(Probe::new("p1")).unwrap();

        let master = ApplicationMaster::new(
            Arc::clone(&ctx),
            order(&["sink", "map", "source"]),
            [entry("source", &source), entry("map", &map), entry("sink", &sink)],
        );

        execute_application(&master).await.unwrap();

        assert_eq!(entries(&log), ["Execute:sink", "Execute:map", "Execute:source"]);
        assert_eq!(master.executions(), 1);
        assert!(ctx.network_tasks().is_sealed());
        assert!(ctx.processing_tasks().is_sealed());
        assert_eq!(ctx.network_executor().task_count(), 1);
        assert_eq!(ctx.processing_executor().task_count(), 1);
        teardown(&ctx).await;
    }

    #[tokio::test]
    async fn failed_dependency_is_never_followed_by_dependents() {
        let ctx = context("app", Duration::from_secs(5));
        let log = journal();
        let b = MockContainer::new("b", Start::Fail, false, &log);
        let a = MockContainer::new("a", Start::Ok, false, &log);

        let master = ApplicationMaster::new(Arc::clone(&ctx), order(&["b", "a"]), [entry("a", &a), entry("b", &b)]);
        let err = execute_application(&master).await.unwrap_err();

        match err {
            OrchestrationError::StartupFailed { vertex, source } => {
                assert_eq!(vertex, "b");
                assert!(matches!(source, MachineError::IllegalTransition { .. }));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(entries(&log), ["Execute:b"]);
        assert!(!ctx.network_tasks().is_sealed());
        teardown(&ctx).await;
    }

    #[tokio::test]
    async fn start_timeout_aborts_startup() {
        let ctx = context("app", Duration::from_millis(50));
        let log = journal();
        let b = MockContainer::new("b", Start::Hang, false, &log);
        let a = MockContainer::new("a", Start::Ok, false, &log);

        let master = ApplicationMaster::new(Arc::clone(&ctx), order(&["b", "a"]), [entry("a", &a), entry("b", &b)]);
        let err = execute_application(&master).await.unwrap_err();

        match err {
            OrchestrationError::StartupTimeout { vertex, timeout } => {
                assert_eq!(vertex, "b");
                assert_eq!(timeout, Duration::from_millis(50));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(entries(&log), ["Execute:b"]);
        teardown(&ctx).await;
    }

    #[tokio::test]
    async fn vertex_without_container_is_reported() {
        let ctx = context("app", Duration::from_secs(5));
        let master = ApplicationMaster::new(Arc::clone(&ctx), order(&["ghost"]), []);

        let err = execute_application(&master).await.unwrap_err();
        assert_eq!(err.as_label(), "unknown_vertex");
        teardown(&ctx).await;
    }

    #[tokio::test]
    async fn rejected_batch_interrupts_every_task_and_returns_cause() {
        let ctx = context("app", Duration::from_secs(5));
        let (n1, n2, p1) = (Probe::new("n1"), Probe::new("n2"), Probe::new("p1"));
        ctx.network_tasks().push(n1.clone() as TaskRef).unwrap();
        ctx.network_tasks().push(n2.clone() as TaskRef).unwrap();
        ctx.processing_tasks().push(p1.clone() as TaskRef).unwrap();
        ctx.processing_executor().shutdown().await;

        let master = ApplicationMaster::new(Arc::clone(&ctx), order(&[]), []);
        let err = execute_application(&master).await.unwrap_err();

        match err {
            OrchestrationError::BatchRejected { source } => {
                assert_eq!(source, ExecutorError::ShuttingDown { executor: "processing".into() });
            }
            other => panic!("unexpected {other:?}"),
        }
        for probe in [&n1, &n2, &p1] {
            assert_eq!(probe.interrupts.load(Ordering::SeqCst), 1);
        }
        let _ = ctx.network_executor().destroy_all();
        teardown(&ctx).await;
    }
}

//! # Teardown orchestration.
//!
//! Runs as the side effect of the master's `DestroyApplication` transition.
//! Every container and every network task is attempted, whatever fails:
//!
//! ```text
//! destroy_application(master)
//!   ├─► for container in containers (by vertex id): destroy()
//!   │       └─ Err/panic → remember as last failure, continue
//!   ├─► destroy every network task (always)
//!   ├─► unassign the network and processing lists from the shared pools
//!   └─► return last container failure, if any
//! ```

use futures::FutureExt;

use super::{container::Container, master::ApplicationMaster};
use crate::{
    error::{BoxError, OrchestrationError},
    events::{Event, EventKind},
    executor::attempt_all,
};

/// Destroys every container, then every network task, and releases the
/// application's tasks from the shared pools.
///
/// ### Errors
/// [`OrchestrationError::ContainerDestroy`] for the last container that failed,
/// returned only after all network tasks were destroyed.
pub async fn destroy_application(master: &ApplicationMaster) -> Result<(), OrchestrationError> {
    let ctx = master.context();
    let mut failure = None;

    for (_, container) in master.containers() {
        if let Err(source) = destroy_container(container.as_ref()).await {
            tracing::warn!(container = container.id(), error = %source, "container destroy failed");
            ctx.bus().publish(
                Event::new(EventKind::ContainerDestroyFailed)
                    .with_source(container.id())
                    .with_reason(source.to_string()),
            );
            failure = Some(OrchestrationError::ContainerDestroy {
                container: container.id().to_string(),
                source,
            });
        }
    }

    let network = ctx.network_tasks().snapshot();
    if let Err(e) = attempt_all(&network, ctx.bus(), |t| t.destroy()) {
        tracing::debug!(application = ctx.name(), error = %e, "network task destroy failed");
    }

    // The pools are shared with other applications: only our tasks leave them.
    let released = ctx.network_executor().remove(&network)
        + ctx.processing_executor().remove(&ctx.processing_tasks().snapshot());
    tracing::debug!(application = ctx.name(), released, "tasks released from shared pools");

    let mut done = Event::new(EventKind::ApplicationDestroyed).with_source(ctx.name());
    if let Some(e) = &failure {
        done = done.with_reason(e.to_string());
    }
    ctx.bus().publish(done);

    match failure {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

async fn destroy_container(container: &dyn Container) -> Result<(), BoxError> {
    match std::panic::AssertUnwindSafe(container.destroy())
        .catch_unwind()
        .await
    {
        Ok(res) => res,
        Err(panic) => Err(format!("destroy panicked: {}", crate::panic_message(panic.as_ref())).into()),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::application::testing::{MockContainer, Probe, Start, context, entries, journal, teardown};
    use crate::application::{ApplicationMaster, ContainerEvent, Outcome, VertexId};
    use crate::error::MachineError;
    use crate::fsm::Response;
    use crate::tasks::TaskRef;

    fn entry(id: &'static str, c: Arc<dyn Container>) -> (VertexId, Arc<dyn Container>) {
        (VertexId::from(id), c)
    }

    #[tokio::test]
    async fn failing_container_does_not_stop_teardown() {
        let ctx = context("app", Duration::from_secs(5));
        let log = journal();
        let c1 = MockContainer::new("c1", Start::Ok, false, &log);
        let c2 = MockContainer::new("c2", Start::Ok, true, &log);
        let c3 = MockContainer::new("c3", Start::Ok, false, &log);
        let (n1, n2) = (Probe::new("n1"), Probe::new("n2"));
        ctx.network_tasks().push(n1.clone() as TaskRef).unwrap();
        ctx.network_tasks().push(n2.clone() as TaskRef).unwrap();

        let master = ApplicationMaster::new(
            Arc::clone(&ctx),
            Arc::new(Vec::<VertexId>::new()),
            [entry("c3", c3.clone()), entry("c1", c1.clone()), entry("c2", c2.clone())],
        );
        let err = destroy_application(&master).await.unwrap_err();

        match &err {
            OrchestrationError::ContainerDestroy { container, source } => {
                assert_eq!(container, "c2");
                assert_eq!(source.to_string(), "c2 refused to die");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(entries(&log), ["Destroy:c1", "Destroy:c2", "Destroy:c3"]);
        for c in [&c1, &c2, &c3] {
            assert_eq!(c.destroys.load(Ordering::SeqCst), 1);
        }
        for n in [&n1, &n2] {
            assert_eq!(n.destroys.load(Ordering::SeqCst), 1);
        }
        teardown(&ctx).await;
    }

    #[tokio::test]
    async fn panicking_container_is_reported_and_skipped() {
        struct Doomed;

        #[async_trait]
        impl Container for Doomed {
            fn id(&self) -> &str {
                "doomed"
            }

            fn request(&self, _event: ContainerEvent) -> Result<Response<Outcome>, MachineError> {
                Err(MachineError::Rejected {
                    machine: "doomed".into(),
                    reason: "closed",
                })
            }

            async fn destroy(&self) -> Result<(), BoxError> {
                panic!("destroy exploded");
            }
        }

        let ctx = context("app", Duration::from_secs(5));
        let log = journal();
        let healthy = MockContainer::new("healthy", Start::Ok, false, &log);
        let master = ApplicationMaster::new(
            Arc::clone(&ctx),
            Arc::new(Vec::<VertexId>::new()),
            [entry("a-doomed", Arc::new(Doomed)), entry("b-healthy", healthy.clone())],
        );

        let err = destroy_application(&master).await.unwrap_err();
        assert!(err.to_string().contains("destroy exploded"), "{err}");
        assert_eq!(healthy.destroys.load(Ordering::SeqCst), 1);
        teardown(&ctx).await;
    }

    #[tokio::test]
    async fn tasks_leave_the_shared_pools() {
        let ctx = context("app", Duration::from_secs(5));
        let log = journal();
        let (n1, p1) = (Probe::new("n1"), Probe::new("p1"));
        let neighbour = Probe::new("other-app");
        ctx.network_tasks().push(n1.clone() as TaskRef).unwrap();
        ctx.processing_tasks().push(p1.clone() as TaskRef).unwrap();
        ctx.network_executor().submit_batch(&ctx.network_tasks().seal()).unwrap();
        ctx.processing_executor().submit_batch(&ctx.processing_tasks().seal()).unwrap();
        ctx.network_executor().submit(neighbour.clone() as TaskRef).unwrap();

        let only = MockContainer::new("only", Start::Ok, false, &log);
        let master = ApplicationMaster::new(
            Arc::clone(&ctx),
            Arc::new(vec![VertexId::from("only")]),
            [entry("only", only.clone())],
        );
        destroy_application(&master).await.unwrap();

        assert_eq!(ctx.network_executor().task_count(), 1);
        assert_eq!(ctx.processing_executor().task_count(), 0);
        assert_eq!(n1.destroys.load(Ordering::SeqCst), 1);
        assert_eq!(neighbour.destroys.load(Ordering::SeqCst), 0);
        teardown(&ctx).await;
    }

    #[tokio::test]
    async fn clean_teardown_succeeds() {
        let ctx = context("app", Duration::from_secs(5));
        let log = journal();
        let only = MockContainer::new("only", Start::Ok, false, &log);
        let master = ApplicationMaster::new(
            Arc::clone(&ctx),
            Arc::new(vec![VertexId::from("only")]),
            [entry("only", only.clone())],
        );

        destroy_application(&master).await.unwrap();
        assert_eq!(entries(&log), ["Destroy:only"]);
        teardown(&ctx).await;
    }
}

//! End-to-end application lifecycle on a real runtime.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use dagvisor::{
    ApplicationState, Config, Container, ContainerEvent, ContainerState, MachineError, MasterState,
    OrchestrationError, ProcessingContainer, Progress, Runtime, Task, TaskError, TaskFn, TaskRef,
    VertexId,
};

fn config() -> Config {
    Config {
        await_timeout: Duration::from_secs(5),
        network_workers: 2,
        processing_workers: 2,
        ..Config::default()
    }
}

/// Task that counts its slices and stays alive until destroyed.
fn counting(name: &'static str, calls: &Arc<AtomicU32>) -> TaskRef {
    let calls = Arc::clone(calls);
    TaskFn::arc(name, move || {
        let calls = Arc::clone(&calls);
        async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, TaskError>(Progress::Idle)
        }
    })
}

/// Never completes on its own, even once destroyed.
#[derive(Default)]
struct Socket {
    polls: AtomicU32,
    destroys: AtomicU32,
}

#[async_trait]
impl Task for Socket {
    fn name(&self) -> &str {
        "socket"
    }

    async fn execute(&self) -> Result<Progress, TaskError> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        Ok(Progress::Idle)
    }

    fn interrupt(&self, _cause: &(dyn std::error::Error + Send + Sync)) -> Result<(), TaskError> {
        Ok(())
    }

    fn destroy(&self) -> Result<(), TaskError> {
        self.destroys.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

async fn eventually(what: &str, mut check: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !check() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap_or_else(|_| panic!("timed out waiting for {what}"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn submit_execute_destroy() {
    let rt = Runtime::builder(config()).build();
    let app = rt.application("wordcount").unwrap();

    let processed = Arc::new(AtomicU32::new(0));
    let received = Arc::new(AtomicU32::new(0));
    let split = counting("split", &processed);
    let count = counting("count", &processed);
    let inbound = counting("inbound", &received);

    let source = ProcessingContainer::new("source", app.context(), vec![split]).unwrap();
    let sink = ProcessingContainer::new("sink", app.context(), vec![count]).unwrap();
    app.add_network_task(inbound).unwrap();

    app.submit(
        vec![VertexId::from("sink"), VertexId::from("source")],
        [
            (VertexId::from("source"), source.clone() as Arc<dyn Container>),
            (VertexId::from("sink"), sink.clone() as Arc<dyn Container>),
        ],
    )
    .await
    .unwrap();
    assert_eq!(app.state(), ApplicationState::Submitted);
    assert_eq!(app.master_state(), Some(MasterState::DagSubmitted));

    app.execute().await.unwrap();
    assert_eq!(app.state(), ApplicationState::Executing);
    assert_eq!(app.master_state(), Some(MasterState::Executing));
    assert_eq!(source.state(), ContainerState::Executing);
    assert_eq!(sink.state(), ContainerState::Executing);

    eventually("processing tasks", || processed.load(Ordering::SeqCst) >= 2).await;
    eventually("network task", || received.load(Ordering::SeqCst) >= 1).await;

    // Task lists are sealed once handed to the pools.
    assert!(app.add_network_task(counting("late", &received)).is_err());

    app.destroy().await.unwrap();
    assert_eq!(app.state(), ApplicationState::Finalized);
    assert_eq!(app.master_state(), Some(MasterState::Finalized));
    assert!(source.is_destroyed() && sink.is_destroyed());
    assert_eq!(source.state(), ContainerState::Finalized);
    assert_eq!(sink.state(), ContainerState::Finalized);
    assert!(app.context().container_executor().is_shutting_down());

    eventually("pools to drop destroyed tasks", || {
        rt.network_executor().task_count() == 0 && rt.processing_executor().task_count() == 0
    })
    .await;

    app.destroy().await.unwrap();
    rt.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn destroyed_application_leaves_nothing_in_shared_pools() {
    let rt = Runtime::builder(config()).build();
    let app = rt.application("streaming").unwrap();

    let inbound = Arc::new(Socket::default());
    let worker = Arc::new(Socket::default());
    let stage = ProcessingContainer::new("stage", app.context(), vec![worker.clone() as TaskRef]).unwrap();
    app.add_network_task(inbound.clone()).unwrap();

    app.submit(
        vec![VertexId::from("stage")],
        [(VertexId::from("stage"), stage as Arc<dyn Container>)],
    )
    .await
    .unwrap();
    app.execute().await.unwrap();
    eventually("tasks to be polled", || {
        inbound.polls.load(Ordering::SeqCst) > 0 && worker.polls.load(Ordering::SeqCst) > 0
    })
    .await;

    app.destroy().await.unwrap();
    assert_eq!(inbound.destroys.load(Ordering::SeqCst), 1);
    assert_eq!(worker.destroys.load(Ordering::SeqCst), 1);
    assert_eq!(rt.network_executor().task_count(), 0);
    assert_eq!(rt.processing_executor().task_count(), 0);

    tokio::time::sleep(Duration::from_millis(20)).await;
    let settled = (
        inbound.polls.load(Ordering::SeqCst),
        worker.polls.load(Ordering::SeqCst),
    );
    rt.network_executor().wake();
    rt.processing_executor().wake();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(
        (inbound.polls.load(Ordering::SeqCst), worker.polls.load(Ordering::SeqCst)),
        settled
    );
    rt.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn failed_startup_marks_application_failed() {
    let rt = Runtime::builder(config()).build();
    let app = rt.application("broken").unwrap();

    let a = ProcessingContainer::new("a", app.context(), Vec::new()).unwrap();
    let b = ProcessingContainer::new("b", app.context(), Vec::new()).unwrap();

    // "b" is already executing, so the startup's Execute is illegal for it.
    b.request(ContainerEvent::Execute).unwrap().await.unwrap();

    app.submit(
        vec![VertexId::from("b"), VertexId::from("a")],
        [
            (VertexId::from("a"), a.clone() as Arc<dyn Container>),
            (VertexId::from("b"), b.clone() as Arc<dyn Container>),
        ],
    )
    .await
    .unwrap();

    let err = app.execute().await.unwrap_err();
    match err {
        OrchestrationError::StartupFailed { vertex, source } => {
            assert_eq!(vertex, "b");
            assert!(matches!(source, MachineError::IllegalTransition { .. }));
        }
        other => panic!("unexpected {other:?}"),
    }

    assert_eq!(app.state(), ApplicationState::Failed);
    assert_eq!(app.master_state(), Some(MasterState::DagSubmitted));
    assert_eq!(a.state(), ContainerState::New);

    app.destroy().await.unwrap();
    assert_eq!(app.state(), ApplicationState::Finalized);
    assert_eq!(a.state(), ContainerState::Finalized);
    assert_eq!(b.state(), ContainerState::Finalized);
    rt.shutdown().await;
}

#[tokio::test]
async fn execute_requires_a_submitted_dag() {
    let rt = Runtime::builder(config()).build();
    let app = rt.application("empty").unwrap();

    let err = app.execute().await.unwrap_err();
    assert_eq!(err.as_label(), "application_not_submitted");
    assert_eq!(app.state(), ApplicationState::New);

    app.destroy().await.unwrap();
    rt.shutdown().await;
}

#[tokio::test]
async fn second_submit_is_illegal() {
    let rt = Runtime::builder(config()).build();
    let app = rt.application("twice").unwrap();

    app.submit(Vec::<VertexId>::new(), []).await.unwrap();
    let err = app.submit(Vec::<VertexId>::new(), []).await.unwrap_err();

    assert!(matches!(
        err,
        OrchestrationError::Machine(MachineError::IllegalTransition { .. })
    ));
    assert_eq!(app.state(), ApplicationState::Submitted);

    app.destroy().await.unwrap();
    rt.shutdown().await;
}

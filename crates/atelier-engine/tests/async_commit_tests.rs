//! Suspended commits: ordering, exclusivity and cancellation

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use async_trait::async_trait;
use atelier_core::{
    AtelierError, Content, Document, EditScope, EntityId, Layer, Mutation, Point2, RequestKind,
    RequestParams, RequestResult, Result,
};
use atelier_engine::command::MoveSlabVertexCommand;
use atelier_engine::{CommandManager, CompositeRequest, SessionOptions, TransactionManager};
use serde_json::json;

/// Pending exactly once, like a sub-document load that completes on the next tick
struct YieldOnce(bool);

impl Future for YieldOnce {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.0 {
            Poll::Ready(())
        } else {
            self.0 = true;
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    }
}

/// Appends its tag to a shared "log" parameter after a suspension
#[derive(Debug)]
struct SlowAppend {
    tag: f64,
}

#[async_trait(?Send)]
impl Mutation for SlowAppend {
    fn kind(&self) -> RequestKind {
        RequestKind::SetParameter
    }

    async fn apply(&mut self, scope: &mut EditScope<'_>) -> Result<RequestResult> {
        // read before suspending so a lost update would show
        let count = scope
            .document()
            .content(&EntityId::from("log"))?
            .params
            .len();
        YieldOnce(false).await;
        scope
            .content_mut(&EntityId::from("log"))?
            .params
            .insert(format!("{:02}", count), self.tag);
        Ok(RequestResult::None)
    }

    fn description(&self) -> String {
        format!("Append {}", self.tag)
    }

    fn category(&self) -> &'static str {
        "test"
    }
}

fn slow_manager() -> TransactionManager {
    let mut doc = Document::new();
    doc.insert(Content::new(Point2::new(0.0, 0.0)).with_id("log"));
    let tm = TransactionManager::builder().document(doc).build();
    tm.register(RequestKind::SetParameter, |params| match params {
        RequestParams::SetParameter { value, .. } => {
            Ok(Box::new(SlowAppend { tag: value }) as Box<dyn Mutation>)
        }
        other => Err(AtelierError::InvalidParams {
            kind: other.kind().to_string(),
            reason: "unexpected params".to_string(),
        }),
    });
    tm
}

fn append_request(tm: &TransactionManager, tag: f64) -> atelier_engine::Request {
    tm.create_request(RequestParams::SetParameter {
        entity_id: EntityId::from("log"),
        name: "unused".to_string(),
        value: tag,
    })
    .unwrap()
}

fn log_values(tm: &TransactionManager) -> Vec<f64> {
    tm.with_document(|doc| {
        doc.content(&EntityId::from("log"))
            .unwrap()
            .params
            .values()
            .copied()
            .collect()
    })
    .unwrap()
}

fn slow_manager_with_slab() -> TransactionManager {
    let tm = slow_manager();
    tm.document_mut().unwrap().insert(
        Layer::new("Ground")
            .with_id("l1")
            .with_slab_profile(vec![Point2::new(1000.0, 0.0)]),
    );
    tm
}

fn slab_vertex(tm: &TransactionManager) -> Point2 {
    tm.with_document(|doc| doc.layer(&EntityId::from("l1")).unwrap().slab_profile[0])
        .unwrap()
}

#[tokio::test]
async fn test_composite_sub_commits_run_in_order() {
    // GIVEN a composite of three suspending sub-requests
    let tm = slow_manager();
    let mut composite = CompositeRequest::new("Append three", "test");
    for tag in [1.0, 2.0, 3.0] {
        composite.append(append_request(&tm, tag)).unwrap();
    }

    // WHEN committed asynchronously
    tm.commit_async(composite).await.unwrap();

    // THEN each sub-request saw the writes of the previous one
    assert_eq!(log_values(&tm), vec![1.0, 2.0, 3.0]);

    tm.undo().unwrap();
    assert!(log_values(&tm).is_empty());
}

#[tokio::test]
async fn test_tracker_reports_active_sub_request_while_suspended() {
    let tm = slow_manager();
    let mut composite = CompositeRequest::new("Append two", "test");
    composite.append(append_request(&tm, 1.0)).unwrap();
    composite.append(append_request(&tm, 2.0)).unwrap();
    let tracker = composite.active_tracker();

    let observed = std::cell::RefCell::new(Vec::new());
    let poll_tracker = async {
        for _ in 0..4 {
            observed.borrow_mut().push(tracker.get());
            YieldOnce(false).await;
        }
    };
    let (result, ()) = futures::join!(tm.commit_async(composite), poll_tracker);
    result.unwrap();

    let observed = observed.into_inner();
    assert!(observed.contains(&Some(0)));
    assert!(observed.contains(&Some(1)));
    assert_eq!(tracker.get(), None);
}

#[tokio::test]
async fn test_operations_fail_while_commit_is_suspended() {
    // GIVEN one recorded entry so undo has a target
    let tm = slow_manager();
    tm.commit_async(append_request(&tm, 1.0)).await.unwrap();

    // WHEN other operations run while a second commit is suspended
    let probe = async {
        let undo = tm.undo();
        let read = tm.document().map(|doc| doc.len());
        let second = tm.commit_async(append_request(&tm, 9.0)).await;
        (undo, read, second)
    };
    let (first, (undo, read, second)) =
        futures::join!(tm.commit_async(append_request(&tm, 2.0)), probe);

    // THEN they are refused instead of interleaving
    first.unwrap();
    assert!(matches!(undo, Err(AtelierError::TransactionInProgress { .. })));
    assert!(matches!(read, Err(AtelierError::TransactionInProgress { .. })));
    assert!(matches!(
        second,
        Err(AtelierError::TransactionInProgress { .. })
    ));
    assert_eq!(log_values(&tm), vec![1.0, 2.0]);
    assert_eq!(tm.history_len(), 2);
}

#[tokio::test]
async fn test_session_dropped_mid_commit_rolls_back_after_commit() {
    // GIVEN an open session with one captured commit
    let tm = slow_manager();
    let session = tm.start_session(SessionOptions::new("Batch")).unwrap();
    tm.commit_async(append_request(&tm, 1.0)).await.unwrap();

    // WHEN the session is dropped while a second commit is suspended
    let cancel = async move {
        drop(session);
    };
    let (result, ()) = futures::join!(tm.commit_async(append_request(&tm, 2.0)), cancel);

    // THEN the in-flight commit finishes and then everything is rolled back
    result.unwrap();
    assert!(log_values(&tm).is_empty());
    assert!(!tm.has_open_session());
    assert_eq!(tm.history_len(), 0);
}

#[tokio::test]
async fn test_refused_commit_reverts_its_previews() {
    // GIVEN a drag request with a preview applied
    let tm = slow_manager_with_slab();
    let mut drag = tm
        .create_request(RequestParams::MoveSlabProfileVertex {
            layer_id: EntityId::from("l1"),
            vertex_index: 0,
            offset: None,
        })
        .unwrap();
    tm.receive(&mut drag, "move", &json!({ "offset": { "x": 50.0, "y": 0.0 } }))
        .unwrap();
    assert_eq!(slab_vertex(&tm), Point2::new(1050.0, 0.0));

    // WHEN it is committed while another commit is suspended
    let (first, second) = futures::join!(
        tm.commit_async(append_request(&tm, 1.0)),
        tm.commit_async(drag)
    );

    // THEN it is refused and its preview is reverted once the document is back
    first.unwrap();
    assert!(matches!(
        second,
        Err(AtelierError::TransactionInProgress { .. })
    ));
    assert_eq!(slab_vertex(&tm), Point2::new(1000.0, 0.0));
    assert_eq!(tm.history_len(), 1);
}

#[tokio::test]
async fn test_drag_completed_mid_commit_leaves_no_preview() {
    // GIVEN a drag command with a preview applied
    let tm = slow_manager_with_slab();
    let mut commands = CommandManager::new(tm.clone());
    commands
        .execute(Box::new(MoveSlabVertexCommand::new(EntityId::from("l1"), 0)), None)
        .unwrap();
    commands
        .receive("move", &json!({ "offset": { "x": 50.0, "y": 0.0 } }))
        .unwrap();

    // WHEN the drag ends while another commit is suspended
    let finish = async { commands.complete() };
    let (first, completed) = futures::join!(tm.commit_async(append_request(&tm, 1.0)), finish);

    // THEN completion fails without running on_cancel, and the preview is still reverted
    first.unwrap();
    assert!(matches!(
        completed,
        Err(AtelierError::TransactionInProgress { .. })
    ));
    assert!(!commands.is_active());
    assert_eq!(slab_vertex(&tm), Point2::new(1000.0, 0.0));
    assert_eq!(tm.history_len(), 1);
}

#[test]
fn test_blocking_commit_drives_suspending_mutation() {
    let tm = slow_manager();

    tm.commit(append_request(&tm, 4.0)).unwrap();

    assert_eq!(log_values(&tm), vec![4.0]);
}

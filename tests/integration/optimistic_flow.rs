//! End-to-end tests for the optimistic engine over the real HTTP stack.
//!
//! These run the full path: engine mutation, REST call against an
//! in-process server, and refetch reconciliation. Unit tests in the
//! engine cover failure injection; here the interesting failures are the
//! ones a real server produces (validation rejections).

#![allow(clippy::expect_used, clippy::unwrap_used)]

use taskdeck::api::{ApiConfig, AuthClient, HttpTaskStore, SessionHandle};
use taskdeck::tasks::{TaskEvent, TaskListEngine};
use taskdeck_proto::auth::RegisterRequest;
use taskdeck_proto::task::TaskStatus;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Helper functions
// ---------------------------------------------------------------------------

/// Starts a server, registers a fresh account, and returns an engine
/// wired to it plus its event receiver and the shared session.
async fn make_engine() -> (
    TaskListEngine<HttpTaskStore>,
    tokio::sync::mpsc::Receiver<TaskEvent>,
    SessionHandle,
    String,
) {
    let (addr, _handle) = taskdeck_server::server::start_server("127.0.0.1:0")
        .await
        .expect("failed to start test server");
    let base_url = format!("http://{addr}");

    let session = SessionHandle::new();
    let config = ApiConfig::new(&base_url);
    let auth = AuthClient::new(&config, session.clone()).unwrap();
    auth.register(&RegisterRequest {
        username: "ada".to_string(),
        email: format!("{}@example.com", Uuid::new_v4().as_simple()),
        password: "hunter2".to_string(),
    })
    .await
    .expect("registration failed");

    let store = HttpTaskStore::new(&config, session.clone()).unwrap();
    let (engine, events) = TaskListEngine::new(store, 16);
    (engine, events, session, base_url)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn compose_commit_and_refetch_round_trip() {
    let (engine, _events, _session, _base) = make_engine().await;

    // Compose the first task; committing it with insert_below spawns the
    // next draft, chaining composition down the list.
    let first = engine.begin_task();
    let second = engine
        .create(&first, "write report", true)
        .await
        .unwrap()
        .expect("sibling draft");
    engine.create(&second, "review report", false).await.unwrap();

    // A fresh fetch agrees with the optimistic list.
    engine.refresh().await.unwrap();
    let list = engine.snapshot();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0].content, "write report");
    assert_eq!(list[1].content, "review report");
    assert!(list[0].position < list[1].position);
    assert!(!list[0].editing);
}

#[tokio::test]
async fn toggle_persists_across_refetch() {
    let (engine, _events, _session, _base) = make_engine().await;
    let id = engine.begin_task();
    engine.create(&id, "flip me", false).await.unwrap();

    engine.toggle_status(&id).await.unwrap();
    engine.refresh().await.unwrap();
    assert_eq!(engine.snapshot()[0].status, TaskStatus::Done);

    engine.toggle_status(&id).await.unwrap();
    engine.refresh().await.unwrap();
    assert_eq!(engine.snapshot()[0].status, TaskStatus::Todo);
}

#[tokio::test]
async fn duplicate_lands_between_neighbors_remotely() {
    let (engine, _events, _session, _base) = make_engine().await;
    let first = engine.begin_task();
    let second = engine
        .create(&first, "alpha", true)
        .await
        .unwrap()
        .expect("sibling draft");
    engine.create(&second, "omega", false).await.unwrap();

    engine.duplicate_below(&first).await.unwrap().expect("duplicate id");

    engine.refresh().await.unwrap();
    let list = engine.snapshot();
    assert_eq!(list.len(), 3);
    assert_eq!(list[0].content, "alpha");
    assert_eq!(list[1].content, "alpha");
    assert_eq!(list[2].content, "omega");
    assert!(list[0].position < list[1].position);
    assert!(list[1].position < list[2].position);
}

#[tokio::test]
async fn delete_and_undo_round_trip() {
    let (engine, mut events, _session, _base) = make_engine().await;
    let id = engine.begin_task();
    engine.create(&id, "doomed", false).await.unwrap();

    engine.delete(&id).await.unwrap();
    assert!(engine.snapshot().is_empty());
    assert_eq!(events.recv().await, Some(TaskEvent::Deleted { id: id.clone() }));

    // Still gone after a refetch (the server soft-deleted it).
    engine.refresh().await.unwrap();
    assert!(engine.snapshot().is_empty());

    engine.undo_delete(&id).await.unwrap();
    let list = engine.snapshot();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].content, "doomed");
}

#[tokio::test]
async fn abandoned_draft_never_reaches_the_server() {
    let (engine, _events, _session, _base) = make_engine().await;
    let id = engine.begin_task();
    engine.create(&id, "real task", false).await.unwrap();

    // Start composing below, then abandon without typing anything.
    let draft = engine.insert_below(&id).expect("draft id");
    assert!(engine.remove_if_empty(&draft));

    engine.refresh().await.unwrap();
    assert_eq!(engine.snapshot().len(), 1);
}

#[tokio::test]
async fn server_rejection_rolls_the_list_back() {
    let (engine, mut events, _session, _base) = make_engine().await;
    let id = engine.begin_task();
    let before = engine.snapshot();

    // Over the server's content limit; rejected with 400.
    let err = engine.create(&id, &"x".repeat(2000), true).await;
    assert!(err.is_err());

    assert_eq!(engine.snapshot(), before);
    assert!(matches!(
        events.recv().await,
        Some(TaskEvent::MutationFailed { .. })
    ));

    // The server never saw the task.
    engine.refresh().await.unwrap();
    assert!(engine.snapshot().is_empty());
}

#[tokio::test]
async fn second_client_sees_committed_tasks() {
    let (engine, _events, session, base_url) = make_engine().await;
    let id = engine.begin_task();
    engine.create(&id, "shared", false).await.unwrap();

    // Another engine on the same account (e.g. a second window).
    let store = HttpTaskStore::new(&ApiConfig::new(&base_url), session).unwrap();
    let (other, _other_events) = TaskListEngine::new(store, 16);
    other.refresh().await.unwrap();

    let list = other.snapshot();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].content, "shared");
    assert_eq!(list[0].id, id);
}

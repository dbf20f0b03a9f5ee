//! Integration tests for the HTTP collaborators against a live server.
//!
//! Each test starts an in-process server on an OS-assigned port and
//! exercises the auth client and REST task store end to end: account
//! lifecycle, task CRUD with position ordering, soft-delete/undo, and
//! the 401-clears-session contract.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use taskdeck::api::{ApiConfig, ApiError, AuthClient, HttpTaskStore, Session, SessionHandle, TaskStore};
use taskdeck_proto::auth::{LoginRequest, RegisterRequest, User};
use taskdeck_proto::position::Position;
use taskdeck_proto::task::{CreateTaskRequest, TaskId, TaskStatus, UpdateTaskRequest};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Helper functions
// ---------------------------------------------------------------------------

/// Starts an in-process server and returns its base URL.
async fn start_server() -> String {
    let (addr, _handle) = taskdeck_server::server::start_server("127.0.0.1:0")
        .await
        .expect("failed to start test server");
    format!("http://{addr}")
}

/// A registration request with a unique email.
fn unique_registration() -> RegisterRequest {
    RegisterRequest {
        username: "ada".to_string(),
        email: format!("{}@example.com", Uuid::new_v4().as_simple()),
        password: "hunter2".to_string(),
    }
}

/// Registers a fresh account and returns a ready-to-use task store.
async fn logged_in_store(base_url: &str) -> (HttpTaskStore, SessionHandle, RegisterRequest) {
    let session = SessionHandle::new();
    let config = ApiConfig::new(base_url);
    let auth = AuthClient::new(&config, session.clone()).unwrap();
    let registration = unique_registration();
    auth.register(&registration).await.expect("registration failed");

    let store = HttpTaskStore::new(&config, session.clone()).unwrap();
    (store, session, registration)
}

/// A create request for a task at the given position.
fn create_request(content: &str, position: f64) -> CreateTaskRequest {
    CreateTaskRequest {
        id: TaskId::new(),
        content: content.to_string(),
        position: Position::new(position).unwrap(),
    }
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

#[tokio::test]
async fn register_establishes_session() {
    let base = start_server().await;
    let session = SessionHandle::new();
    let auth = AuthClient::new(&ApiConfig::new(&base), session.clone()).unwrap();

    let registration = unique_registration();
    let established = auth.register(&registration).await.unwrap();

    assert!(!established.token.is_empty());
    assert_eq!(established.user.email, registration.email);
    assert_eq!(established.user.username, "ada");
    assert!(session.is_authenticated());
}

#[tokio::test]
async fn duplicate_email_registration_conflicts() {
    let base = start_server().await;
    let auth = AuthClient::new(&ApiConfig::new(&base), SessionHandle::new()).unwrap();

    let registration = unique_registration();
    auth.register(&registration).await.unwrap();
    let err = auth.register(&registration).await.unwrap_err();
    assert!(matches!(err, ApiError::Conflict(_)), "got {err:?}");
}

#[tokio::test]
async fn login_round_trips_credentials() {
    let base = start_server().await;
    let registration = unique_registration();
    AuthClient::new(&ApiConfig::new(&base), SessionHandle::new())
        .unwrap()
        .register(&registration)
        .await
        .unwrap();

    // Fresh session, as if a new process logged in.
    let session = SessionHandle::new();
    let auth = AuthClient::new(&ApiConfig::new(&base), session.clone()).unwrap();
    let established = auth
        .login(&LoginRequest {
            email: registration.email.clone(),
            password: registration.password.clone(),
        })
        .await
        .unwrap();

    assert_eq!(established.user.email, registration.email);
    assert!(session.is_authenticated());
}

#[tokio::test]
async fn login_unknown_email_is_not_found() {
    let base = start_server().await;
    let auth = AuthClient::new(&ApiConfig::new(&base), SessionHandle::new()).unwrap();

    let err = auth
        .login(&LoginRequest {
            email: "nobody@example.com".to_string(),
            password: "whatever".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)), "got {err:?}");
}

#[tokio::test]
async fn login_wrong_password_is_unauthorized() {
    let base = start_server().await;
    let registration = unique_registration();
    AuthClient::new(&ApiConfig::new(&base), SessionHandle::new())
        .unwrap()
        .register(&registration)
        .await
        .unwrap();

    let session = SessionHandle::new();
    let auth = AuthClient::new(&ApiConfig::new(&base), session.clone()).unwrap();
    let err = auth
        .login(&LoginRequest {
            email: registration.email.clone(),
            password: "wrong".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized), "got {err:?}");
    assert!(!session.is_authenticated());
}

#[tokio::test]
async fn logout_clears_session() {
    let base = start_server().await;
    let session = SessionHandle::new();
    let auth = AuthClient::new(&ApiConfig::new(&base), session.clone()).unwrap();
    auth.register(&unique_registration()).await.unwrap();

    auth.logout();
    assert!(!session.is_authenticated());
}

// ---------------------------------------------------------------------------
// Task CRUD
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fetch_returns_tasks_sorted_by_position() {
    let base = start_server().await;
    let (store, _session, _) = logged_in_store(&base).await;

    store.create(&create_request("second", 2.0)).await.unwrap();
    store.create(&create_request("first", 1.0)).await.unwrap();
    store.create(&create_request("between", 1.5)).await.unwrap();

    let contents: Vec<String> = store
        .fetch()
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.content)
        .collect();
    assert_eq!(contents, vec!["first", "between", "second"]);
}

#[tokio::test]
async fn created_task_echoes_client_id_and_position() {
    let base = start_server().await;
    let (store, _session, _) = logged_in_store(&base).await;

    let request = create_request("buy milk", 1.5);
    let record = store.create(&request).await.unwrap();
    assert_eq!(record.id, request.id);
    assert_eq!(record.content, "buy milk");
    assert_eq!(record.status, TaskStatus::Todo);
    assert_eq!(record.position, request.position);
}

#[tokio::test]
async fn patch_updates_only_given_fields() {
    let base = start_server().await;
    let (store, _session, _) = logged_in_store(&base).await;

    let request = create_request("original", 1.0);
    store.create(&request).await.unwrap();

    let updated = store
        .update(&request.id, &UpdateTaskRequest::status(TaskStatus::Done))
        .await
        .unwrap();
    assert_eq!(updated.status, TaskStatus::Done);
    assert_eq!(updated.content, "original");

    let updated = store
        .update(&request.id, &UpdateTaskRequest::content("edited"))
        .await
        .unwrap();
    assert_eq!(updated.content, "edited");
    assert_eq!(updated.status, TaskStatus::Done);
}

#[tokio::test]
async fn patch_unknown_task_is_not_found() {
    let base = start_server().await;
    let (store, _session, _) = logged_in_store(&base).await;

    let err = store
        .update(&TaskId::new(), &UpdateTaskRequest::content("ghost"))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)), "got {err:?}");
}

#[tokio::test]
async fn delete_hides_task_and_undo_restores_it() {
    let base = start_server().await;
    let (store, _session, _) = logged_in_store(&base).await;

    let request = create_request("ephemeral", 1.0);
    store.create(&request).await.unwrap();
    store.delete(&request.id).await.unwrap();
    assert!(store.fetch().await.unwrap().is_empty());

    let restored = store.undo_delete(&request.id).await.unwrap();
    assert_eq!(restored.content, "ephemeral");
    assert_eq!(restored.position, request.position);

    let list = store.fetch().await.unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].id, request.id);
}

#[tokio::test]
async fn overlong_content_is_rejected() {
    let base = start_server().await;
    let (store, _session, _) = logged_in_store(&base).await;

    let request = create_request(&"x".repeat(2000), 1.0);
    let err = store.create(&request).await.unwrap_err();
    assert!(
        matches!(err, ApiError::Server { status: 400, .. }),
        "got {err:?}"
    );
}

// ---------------------------------------------------------------------------
// Auth enforcement
// ---------------------------------------------------------------------------

#[tokio::test]
async fn logged_out_store_fails_without_network() {
    let base = start_server().await;
    let store = HttpTaskStore::new(&ApiConfig::new(&base), SessionHandle::new()).unwrap();
    let err = store.fetch().await.unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized));
}

#[tokio::test]
async fn forged_token_gets_401_and_clears_session() {
    let base = start_server().await;
    let session = SessionHandle::new();
    session.set(Session {
        token: "forged".to_string(),
        user: User {
            id: Uuid::new_v4(),
            username: "mallory".to_string(),
            email: "mallory@example.com".to_string(),
        },
    });

    let store = HttpTaskStore::new(&ApiConfig::new(&base), session.clone()).unwrap();
    let err = store.fetch().await.unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized));
    // The 401 logged the whole process out.
    assert!(!session.is_authenticated());
}

#[tokio::test]
async fn accounts_see_only_their_own_tasks() {
    let base = start_server().await;
    let (alice, _s1, _) = logged_in_store(&base).await;
    let (bob, _s2, _) = logged_in_store(&base).await;

    let request = create_request("alice's task", 1.0);
    alice.create(&request).await.unwrap();

    assert!(bob.fetch().await.unwrap().is_empty());
    let err = bob.delete(&request.id).await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)), "got {err:?}");
    assert_eq!(alice.fetch().await.unwrap().len(), 1);
}

//! REST server core: shared state, routes, and request handlers.
//!
//! Routes:
//!
//! - `POST /auth/register` -- create an account (409 if the email is taken)
//! - `POST /auth/login` -- authenticate (404 unknown email, 401 bad password)
//! - `GET /tasks` -- the caller's live tasks, ascending by position
//! - `POST /tasks` -- create a task with a client-chosen id and position
//! - `PATCH /tasks/{id}` -- partial update
//! - `DELETE /tasks/{id}` -- soft-delete
//! - `PATCH /tasks/{id}/undo` -- clear the soft-delete marker
//!
//! All task routes require a bearer token from one of the auth routes.
//! Errors are JSON bodies with a single `message` field.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post};
use uuid::Uuid;

use taskdeck_proto::auth::{AuthResponse, ErrorBody, LoginRequest, RegisterRequest, User};
use taskdeck_proto::task::{
    CreateTaskRequest, MAX_TASK_CONTENT_LENGTH, TaskId, TaskRecord, TaskStatus, UpdateTaskRequest,
};

use crate::auth::{self, TokenStore};
use crate::store::{StoredUser, TaskStore, TaskStoreError, UserStore};

/// Shared server state holding the stores and limits.
pub struct AppState {
    /// Registered accounts.
    pub users: UserStore,
    /// Per-owner task persistence.
    pub tasks: TaskStore,
    /// Issued bearer tokens.
    pub tokens: TokenStore,
    /// Maximum accepted task content length in characters.
    max_content_length: usize,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    /// Creates empty state with the default content length limit.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(MAX_TASK_CONTENT_LENGTH)
    }

    /// Creates empty state with a custom content length limit.
    #[must_use]
    pub fn with_config(max_content_length: usize) -> Self {
        Self {
            users: UserStore::new(),
            tasks: TaskStore::new(),
            tokens: TokenStore::new(),
            max_content_length,
        }
    }
}

/// A request failure, rendered as a status code plus JSON error body.
#[derive(Debug, thiserror::Error)]
enum ApiFailure {
    /// Missing, malformed, or unknown bearer token.
    #[error("invalid or missing bearer token")]
    Unauthorized,
    /// Login with a correct email but wrong password.
    #[error("invalid password")]
    BadPassword,
    /// Registration with an email that is already taken.
    #[error("email already registered")]
    EmailTaken,
    /// Login with an email no account uses.
    #[error("no account with that email")]
    UnknownEmail,
    /// The caller has no live task with the requested id.
    #[error("task not found")]
    TaskNotFound,
    /// Creation with an id the caller already used.
    #[error("a task with that id already exists")]
    DuplicateTask,
    /// Task content over the configured limit.
    #[error("content exceeds {0} characters")]
    ContentTooLong(usize),
}

impl From<TaskStoreError> for ApiFailure {
    fn from(e: TaskStoreError) -> Self {
        match e {
            TaskStoreError::NotFound => Self::TaskNotFound,
            TaskStoreError::DuplicateId => Self::DuplicateTask,
        }
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        let status = match self {
            Self::Unauthorized | Self::BadPassword => StatusCode::UNAUTHORIZED,
            Self::EmailTaken | Self::DuplicateTask => StatusCode::CONFLICT,
            Self::UnknownEmail | Self::TaskNotFound => StatusCode::NOT_FOUND,
            Self::ContentTooLong(_) => StatusCode::BAD_REQUEST,
        };
        (status, Json(ErrorBody::new(self.to_string()))).into_response()
    }
}

/// Builds the application router over shared state.
fn router(state: Arc<AppState>) -> axum::Router {
    axum::Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/tasks", get(list_tasks).post(create_task))
        .route("/tasks/{id}", patch(update_task).delete(delete_task))
        .route("/tasks/{id}/undo", patch(undo_delete_task))
        .with_state(state)
}

async fn register(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiFailure> {
    let salt = auth::generate_salt();
    let stored = StoredUser {
        id: Uuid::new_v4(),
        username: body.username,
        email: body.email,
        password_hash: auth::hash_password(&body.password, &salt),
        salt,
    };
    state
        .users
        .insert(stored.clone())
        .await
        .map_err(|_| ApiFailure::EmailTaken)?;

    let token = state.tokens.issue(stored.id).await;
    tracing::info!(email = %stored.email, "account registered");
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: User {
                id: stored.id,
                username: stored.username,
                email: stored.email,
            },
        }),
    ))
}

async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiFailure> {
    let stored = state
        .users
        .find_by_email(&body.email)
        .await
        .ok_or(ApiFailure::UnknownEmail)?;
    if !auth::verify_password(&body.password, &stored.salt, &stored.password_hash) {
        tracing::warn!(email = %stored.email, "failed login attempt");
        return Err(ApiFailure::BadPassword);
    }

    let token = state.tokens.issue(stored.id).await;
    tracing::debug!(email = %stored.email, "login succeeded");
    Ok(Json(AuthResponse {
        token,
        user: User {
            id: stored.id,
            username: stored.username,
            email: stored.email,
        },
    }))
}

/// Resolves the request's bearer token to a user id.
async fn authorize(state: &AppState, headers: &HeaderMap) -> Result<Uuid, ApiFailure> {
    let token = auth::bearer_token(headers).ok_or(ApiFailure::Unauthorized)?;
    state
        .tokens
        .resolve(token)
        .await
        .ok_or(ApiFailure::Unauthorized)
}

/// Rejects content over the configured limit.
fn check_content(state: &AppState, content: &str) -> Result<(), ApiFailure> {
    if content.chars().count() > state.max_content_length {
        Err(ApiFailure::ContentTooLong(state.max_content_length))
    } else {
        Ok(())
    }
}

async fn list_tasks(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<TaskRecord>>, ApiFailure> {
    let owner = authorize(&state, &headers).await?;
    Ok(Json(state.tasks.list(owner).await))
}

async fn create_task(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<CreateTaskRequest>,
) -> Result<impl IntoResponse, ApiFailure> {
    let owner = authorize(&state, &headers).await?;
    check_content(&state, &body.content)?;

    let record = TaskRecord {
        id: body.id,
        content: body.content,
        status: TaskStatus::Todo,
        position: body.position,
    };
    state.tasks.insert(owner, record.clone()).await?;
    tracing::debug!(task = %record.id, "task created");
    Ok((StatusCode::CREATED, Json(record)))
}

async fn update_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(body): Json<UpdateTaskRequest>,
) -> Result<Json<TaskRecord>, ApiFailure> {
    let owner = authorize(&state, &headers).await?;
    if let Some(content) = &body.content {
        check_content(&state, content)?;
    }

    let record = state
        .tasks
        .update(owner, &TaskId::from_uuid(id), &body)
        .await?;
    Ok(Json(record))
}

async fn delete_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiFailure> {
    let owner = authorize(&state, &headers).await?;
    state
        .tasks
        .soft_delete(owner, &TaskId::from_uuid(id))
        .await?;
    tracing::debug!(task = %id, "task soft-deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn undo_delete_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Json<TaskRecord>, ApiFailure> {
    let owner = authorize(&state, &headers).await?;
    let record = state
        .tasks
        .undo_delete(owner, &TaskId::from_uuid(id))
        .await?;
    tracing::debug!(task = %id, "task resurrected");
    Ok(Json(record))
}

/// Starts the server with default state.
///
/// # Errors
///
/// Returns an error if the TCP listener cannot bind to the given address.
pub async fn start_server(
    addr: &str,
) -> Result<
    (std::net::SocketAddr, tokio::task::JoinHandle<()>),
    Box<dyn std::error::Error + Send + Sync>,
> {
    start_server_with_state(addr, Arc::new(AppState::new())).await
}

/// Starts the server with pre-configured [`AppState`].
///
/// Returns the bound address (useful with a `:0` port) and the join
/// handle of the serving task.
///
/// # Errors
///
/// Returns an error if the TCP listener cannot bind to the given address.
pub async fn start_server_with_state(
    addr: &str,
    state: Arc<AppState>,
) -> Result<
    (std::net::SocketAddr, tokio::task::JoinHandle<()>),
    Box<dyn std::error::Error + Send + Sync>,
> {
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let bound_addr = listener.local_addr()?;

    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(error = %e, "server error");
        }
    });

    Ok((bound_addr, handle))
}

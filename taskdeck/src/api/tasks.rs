//! Task store collaborator: trait and REST implementation.
//!
//! The reconciler is generic over [`TaskStore`] so the optimistic
//! mutation logic can be exercised against an in-memory double in unit
//! tests. [`HttpTaskStore`] is the production implementation speaking
//! the REST contract:
//!
//! - `GET /tasks` -- live tasks, ascending by position
//! - `POST /tasks` -- create
//! - `PATCH /tasks/{id}` -- partial update
//! - `DELETE /tasks/{id}` -- soft-delete
//! - `PATCH /tasks/{id}/undo` -- clear the soft-delete marker

use std::future::Future;

use taskdeck_proto::task::{CreateTaskRequest, TaskId, TaskRecord, UpdateTaskRequest};

use super::session::SessionHandle;
use super::{ApiConfig, ApiError, error_from_response};

/// Remote task persistence as seen by the mutation engine.
///
/// Every method is a complete request/response exchange; the engine has
/// already applied the corresponding local mutation before awaiting it.
pub trait TaskStore: Send + Sync {
    /// Fetches all live tasks, sorted ascending by position.
    fn fetch(&self) -> impl Future<Output = Result<Vec<TaskRecord>, ApiError>> + Send;

    /// Creates a task with a client-chosen id and position.
    fn create(
        &self,
        request: &CreateTaskRequest,
    ) -> impl Future<Output = Result<TaskRecord, ApiError>> + Send;

    /// Partially updates a task.
    fn update(
        &self,
        id: &TaskId,
        request: &UpdateTaskRequest,
    ) -> impl Future<Output = Result<TaskRecord, ApiError>> + Send;

    /// Soft-deletes a task.
    fn delete(&self, id: &TaskId) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// Clears a task's soft-delete marker.
    fn undo_delete(&self, id: &TaskId)
    -> impl Future<Output = Result<TaskRecord, ApiError>> + Send;
}

/// REST implementation of [`TaskStore`].
///
/// Attaches the shared session's bearer token to every request. Any 401
/// response clears the session (process-wide logout) before the error is
/// returned.
#[derive(Debug, Clone)]
pub struct HttpTaskStore {
    http: reqwest::Client,
    base_url: String,
    session: SessionHandle,
}

impl HttpTaskStore {
    /// Creates a task store sharing the given session handle.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Http`] if the HTTP client cannot be built.
    pub fn new(config: &ApiConfig, session: SessionHandle) -> Result<Self, ApiError> {
        Ok(Self {
            http: config.build_client()?,
            base_url: config.base_url.clone(),
            session,
        })
    }

    /// Bearer token for the current session, or `Unauthorized` if logged
    /// out (no point issuing a request that is guaranteed to 401).
    fn token(&self) -> Result<String, ApiError> {
        self.session.token().ok_or(ApiError::Unauthorized)
    }

    /// Checks a response, translating 401 into a process-wide logout.
    async fn accept(&self, resp: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if resp.status().is_success() {
            return Ok(resp);
        }
        let err = error_from_response(resp).await;
        if matches!(err, ApiError::Unauthorized) {
            tracing::warn!("task store returned 401, clearing session");
            self.session.clear();
        }
        Err(err)
    }
}

impl TaskStore for HttpTaskStore {
    async fn fetch(&self) -> Result<Vec<TaskRecord>, ApiError> {
        let token = self.token()?;
        let resp = self
            .http
            .get(format!("{}/tasks", self.base_url))
            .bearer_auth(token)
            .send()
            .await?;
        Ok(self.accept(resp).await?.json().await?)
    }

    async fn create(&self, request: &CreateTaskRequest) -> Result<TaskRecord, ApiError> {
        let token = self.token()?;
        let resp = self
            .http
            .post(format!("{}/tasks", self.base_url))
            .bearer_auth(token)
            .json(request)
            .send()
            .await?;
        Ok(self.accept(resp).await?.json().await?)
    }

    async fn update(&self, id: &TaskId, request: &UpdateTaskRequest) -> Result<TaskRecord, ApiError> {
        let token = self.token()?;
        let resp = self
            .http
            .patch(format!("{}/tasks/{id}", self.base_url))
            .bearer_auth(token)
            .json(request)
            .send()
            .await?;
        Ok(self.accept(resp).await?.json().await?)
    }

    async fn delete(&self, id: &TaskId) -> Result<(), ApiError> {
        let token = self.token()?;
        let resp = self
            .http
            .delete(format!("{}/tasks/{id}", self.base_url))
            .bearer_auth(token)
            .send()
            .await?;
        self.accept(resp).await?;
        Ok(())
    }

    async fn undo_delete(&self, id: &TaskId) -> Result<TaskRecord, ApiError> {
        let token = self.token()?;
        let resp = self
            .http
            .patch(format!("{}/tasks/{id}/undo", self.base_url))
            .bearer_auth(token)
            .send()
            .await?;
        Ok(self.accept(resp).await?.json().await?)
    }
}

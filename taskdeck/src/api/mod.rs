//! HTTP collaborators consumed by the reconciler.
//!
//! The reconciler never talks to the network directly; it goes through
//! the [`tasks::TaskStore`] trait. This module holds the concrete HTTP
//! implementations: the auth client ([`auth::AuthClient`]), the shared
//! session state with its on-disk cache ([`session`]), and the REST task
//! store ([`tasks::HttpTaskStore`]).
//!
//! Error contract: a 401 from any call clears the shared session
//! (process-wide logout) before the error reaches the caller.

pub mod auth;
pub mod session;
pub mod tasks;

use std::time::Duration;

use reqwest::StatusCode;
use taskdeck_proto::auth::ErrorBody;

pub use auth::AuthClient;
pub use session::{Session, SessionHandle};
pub use tasks::{HttpTaskStore, TaskStore};

/// Errors returned by the HTTP collaborators.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Transport-level failure (connection refused, timeout, bad body).
    #[error("http transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// 401: missing, expired, or invalid credentials.
    #[error("unauthorized")]
    Unauthorized,

    /// 409: the request conflicts with existing state (e.g. email taken).
    #[error("conflict: {0}")]
    Conflict(String),

    /// 404: the resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Any other non-2xx response.
    #[error("server error ({status}): {message}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Message from the server's error body, if any.
        message: String,
    },
}

/// Configuration for the HTTP collaborators.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL of the Taskdeck server (e.g. `http://127.0.0.1:3333`).
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:3333".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

impl ApiConfig {
    /// Creates a config for the given base URL with the default timeout.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Builds a reqwest client honoring the configured timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Http`] if the client cannot be constructed.
    pub fn build_client(&self) -> Result<reqwest::Client, ApiError> {
        Ok(reqwest::Client::builder().timeout(self.timeout).build()?)
    }
}

/// Maps a non-2xx response to an [`ApiError`], decoding the JSON error
/// body when present.
pub(crate) async fn error_from_response(resp: reqwest::Response) -> ApiError {
    let status = resp.status();
    let message = match resp.json::<ErrorBody>().await {
        Ok(body) => body.message,
        Err(_) => status.to_string(),
    };
    match status {
        StatusCode::UNAUTHORIZED => ApiError::Unauthorized,
        StatusCode::CONFLICT => ApiError::Conflict(message),
        StatusCode::NOT_FOUND => ApiError::NotFound(message),
        _ => ApiError::Server {
            status: status.as_u16(),
            message,
        },
    }
}

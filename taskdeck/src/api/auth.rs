//! Auth service client.
//!
//! Thin wrapper over `POST /auth/register` and `POST /auth/login` that
//! stores the returned bearer token in the shared [`SessionHandle`] so
//! the task store picks it up on subsequent calls.

use taskdeck_proto::auth::{AuthResponse, LoginRequest, RegisterRequest};

use super::session::{Session, SessionHandle};
use super::{ApiConfig, ApiError, error_from_response};

/// Client for the auth service collaborator.
#[derive(Debug, Clone)]
pub struct AuthClient {
    http: reqwest::Client,
    base_url: String,
    session: SessionHandle,
}

impl AuthClient {
    /// Creates an auth client sharing the given session handle.
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

    /// Registers a new account and logs the session in.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Conflict`] if the email is already registered,
    /// or [`ApiError::Http`] / [`ApiError::Server`] on transport or
    /// server failure.
    pub async fn register(&self, request: &RegisterRequest) -> Result<Session, ApiError> {
        let resp = self
            .http
            .post(format!("{}/auth/register", self.base_url))
            .json(request)
            .send()
            .await?;
        self.accept(resp).await
    }

    /// Logs in with existing credentials.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] for an unknown email,
    /// [`ApiError::Unauthorized`] for a bad password, or
    /// [`ApiError::Http`] / [`ApiError::Server`] on transport or server
    /// failure.
    pub async fn login(&self, request: &LoginRequest) -> Result<Session, ApiError> {
        let resp = self
            .http
            .post(format!("{}/auth/login", self.base_url))
            .json(request)
            .send()
            .await?;
        self.accept(resp).await
    }

    /// Clears the shared session.
    pub fn logout(&self) {
        self.session.clear();
        tracing::info!("session cleared (logout)");
    }

    /// Returns the shared session handle.
    #[must_use]
    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    /// Turns a successful auth response into a stored session.
    async fn accept(&self, resp: reqwest::Response) -> Result<Session, ApiError> {
        if !resp.status().is_success() {
            return Err(error_from_response(resp).await);
        }
        let body: AuthResponse = resp.json().await?;
        let session = Session {
            token: body.token,
            user: body.user,
        };
        self.session.set(session.clone());
        tracing::debug!(user = %session.user.email, "session established");
        Ok(session)
    }
}

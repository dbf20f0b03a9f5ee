//! Auth service request/response types.
//!
//! `POST /auth/register` fails with 409 if the email is already taken;
//! `POST /auth/login` fails with 404 for an unknown user and 401 for bad
//! credentials. Both return an [`AuthResponse`] whose token is attached
//! to all task-store calls as a bearer credential.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered user, as returned inside [`AuthResponse`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique user id.
    pub id: Uuid,
    /// Display name.
    pub username: String,
    /// Login email (unique).
    pub email: String,
}

/// Body of `POST /auth/register`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    /// Display name.
    pub username: String,
    /// Login email (must be unused).
    pub email: String,
    /// Plaintext password (hashed server-side, never stored).
    pub password: String,
}

/// Body of `POST /auth/login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    /// Login email.
    pub email: String,
    /// Plaintext password.
    pub password: String,
}

/// Successful auth response carrying the bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResponse {
    /// Opaque bearer token for subsequent task-store calls.
    pub token: String,
    /// The authenticated user.
    pub user: User,
}

/// JSON error body returned by the server on any non-2xx response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human-readable error description.
    pub message: String,
}

impl ErrorBody {
    /// Creates an error body from any displayable message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

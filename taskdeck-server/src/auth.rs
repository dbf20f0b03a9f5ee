//! Password hashing and bearer-token management.
//!
//! Passwords are stored as salted SHA-256 digests; the plaintext never
//! leaves the register/login handlers. Tokens are opaque random strings
//! mapped to a user id for the lifetime of the process.

use std::collections::HashMap;

use axum::http::HeaderMap;
use rand::Rng;
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Generates a fresh per-user salt.
#[must_use]
pub fn generate_salt() -> [u8; 16] {
    let mut salt = [0u8; 16];
    rand::rng().fill(&mut salt);
    salt
}

/// Salted SHA-256 of a password.
#[must_use]
pub fn hash_password(password: &str, salt: &[u8]) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    hasher.finalize().to_vec()
}

/// Checks a password attempt against a stored salt and digest.
#[must_use]
pub fn verify_password(password: &str, salt: &[u8], stored_hash: &[u8]) -> bool {
    hash_password(password, salt) == stored_hash
}

/// In-memory map of issued bearer tokens to user ids.
#[derive(Default)]
pub struct TokenStore {
    tokens: RwLock<HashMap<String, Uuid>>,
}

impl TokenStore {
    /// Creates an empty token store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues a fresh opaque token for a user.
    pub async fn issue(&self, user_id: Uuid) -> String {
        let token = format!(
            "{}{}",
            Uuid::new_v4().as_simple(),
            Uuid::new_v4().as_simple()
        );
        self.tokens.write().await.insert(token.clone(), user_id);
        token
    }

    /// Resolves a token to its user id, if the token was issued here.
    pub async fn resolve(&self, token: &str) -> Option<Uuid> {
        self.tokens.read().await.get(token).copied()
    }
}

/// Extracts the bearer token from an `Authorization` header, if present
/// and well-formed.
#[must_use]
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

//! Shared auth session state and its on-disk cache.
//!
//! The session (bearer token + user) is process-wide: the auth client
//! writes it on login/register, the task store reads the token on every
//! call, and any 401 clears it for everyone. The cache file under the
//! user config dir is the only client-side persistence besides the
//! in-memory task list.

use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use taskdeck_proto::auth::User;

/// An authenticated session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Bearer token attached to task-store calls.
    pub token: String,
    /// The authenticated user.
    pub user: User,
}

/// Process-wide handle to the current session.
///
/// Cheap to clone; all clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct SessionHandle {
    inner: Arc<RwLock<Option<Session>>>,
}

impl SessionHandle {
    /// Creates an empty (logged-out) handle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the current session.
    pub fn set(&self, session: Session) {
        *self.inner.write() = Some(session);
    }

    /// Clears the session (process-wide logout).
    pub fn clear(&self) {
        *self.inner.write() = None;
    }

    /// Returns the current bearer token, if logged in.
    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.inner.read().as_ref().map(|s| s.token.clone())
    }

    /// Returns a copy of the current session, if logged in.
    #[must_use]
    pub fn current(&self) -> Option<Session> {
        self.inner.read().clone()
    }

    /// True if a session is present.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.inner.read().is_some()
    }
}

/// Errors from reading or writing the session cache file.
#[derive(Debug, thiserror::Error)]
pub enum SessionCacheError {
    /// Filesystem read/write failed.
    #[error("session cache I/O error at {path}: {source}")]
    Io {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The cache file exists but is not valid TOML.
    #[error("failed to parse session cache: {0}")]
    ParseToml(#[from] toml::de::Error),

    /// The session could not be encoded (should not happen in practice).
    #[error("failed to encode session cache: {0}")]
    EncodeToml(#[from] toml::ser::Error),

    /// Could not determine the user's config directory.
    #[error("could not determine config directory (no HOME or XDG_CONFIG_HOME)")]
    NoConfigDir,
}

/// Default path of the session cache: `<config dir>/taskdeck/session.toml`.
fn cache_path() -> Result<PathBuf, SessionCacheError> {
    let dir = dirs::config_dir().ok_or(SessionCacheError::NoConfigDir)?;
    Ok(dir.join("taskdeck").join("session.toml"))
}

/// Persists the session to the cache file, creating parent directories.
///
/// Returns the path written.
///
/// # Errors
///
/// Returns [`SessionCacheError`] on encoding or filesystem failure.
pub fn save_session(session: &Session) -> Result<PathBuf, SessionCacheError> {
    let path = cache_path()?;
    save_session_to(session, &path)?;
    Ok(path)
}

/// Persists the session to an explicit path (used by tests).
///
/// # Errors
///
/// Returns [`SessionCacheError`] on encoding or filesystem failure.
pub fn save_session_to(session: &Session, path: &std::path::Path) -> Result<(), SessionCacheError> {
    let contents = toml::to_string(session)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| SessionCacheError::Io {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }
    std::fs::write(path, contents).map_err(|e| SessionCacheError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Loads a cached session, if one exists.
///
/// A missing cache file is not an error (returns `None`).
///
/// # Errors
///
/// Returns [`SessionCacheError`] if the file exists but cannot be read
/// or parsed.
pub fn load_session() -> Result<Option<Session>, SessionCacheError> {
    load_session_from(&cache_path()?)
}

/// Loads a cached session from an explicit path (used by tests).
///
/// # Errors
///
/// Returns [`SessionCacheError`] if the file exists but cannot be read
/// or parsed.
pub fn load_session_from(path: &std::path::Path) -> Result<Option<Session>, SessionCacheError> {
    match std::fs::read_to_string(path) {
        Ok(contents) => Ok(Some(toml::from_str(&contents)?)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(SessionCacheError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

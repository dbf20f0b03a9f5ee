//! Task model and task-store request/response types.
//!
//! [`TaskRecord`] is the persisted shape of a task as the server returns
//! it from `GET /tasks`. The transient client-side editing flag is not
//! part of the wire model. Ids are client-generated UUID v7 so a task can
//! be inserted into the local list before the server has seen it.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::position::Position;

/// Maximum allowed task content length in characters.
pub const MAX_TASK_CONTENT_LENGTH: usize = 1024;

/// Unique identifier for a task, based on UUID v7 for time-ordering.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(Uuid);

impl TaskId {
    /// Creates a new time-ordered task identifier (UUID v7).
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Creates a `TaskId` from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID value.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Status of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    /// Task is open.
    Todo,
    /// Task has been completed.
    Done,
}

impl TaskStatus {
    /// Returns the opposite status.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Todo => Self::Done,
            Self::Done => Self::Todo,
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Todo => write!(f, "TODO"),
            Self::Done => write!(f, "DONE"),
        }
    }
}

/// A persisted task as returned by the server.
///
/// Soft-deleted tasks are excluded from `GET /tasks` responses, so a
/// record in hand is always live. The list order is the ascending sort
/// by `position`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    /// Unique task identifier (client-generated).
    pub id: TaskId,
    /// Text body.
    pub content: String,
    /// Current status.
    pub status: TaskStatus,
    /// Fractional ordering key.
    pub position: Position,
}

/// Body of `POST /tasks`.
///
/// The id and position are chosen by the client, which has already
/// applied the task to its local list optimistically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateTaskRequest {
    /// Client-generated task id.
    pub id: TaskId,
    /// Text body.
    pub content: String,
    /// Fractional ordering key.
    pub position: Position,
}

/// Body of `PATCH /tasks/{id}`. All fields optional (partial update).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateTaskRequest {
    /// New text body, if changing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// New status, if changing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    /// New ordering key, if changing (used by list renumbering).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

impl UpdateTaskRequest {
    /// A patch that only changes the content.
    #[must_use]
    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    /// A patch that only changes the status.
    #[must_use]
    pub fn status(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// A patch that only changes the position.
    #[must_use]
    pub fn position(position: Position) -> Self {
        Self {
            position: Some(position),
            ..Self::default()
        }
    }
}

//! Per-task lifecycle state.
//!
//! A [`Task`] is the client-side shape of a task: the persisted fields of
//! a [`TaskRecord`] plus the transient `editing` flag, which exists only
//! in memory and is never sent to the server. Each task owns its own
//! state record; mutating one task never touches its siblings.

use taskdeck_proto::position::Position;
use taskdeck_proto::task::{TaskId, TaskRecord, TaskStatus};

/// A task in the client list.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    /// Unique id, client-generated at creation time.
    pub id: TaskId,
    /// Text body.
    pub content: String,
    /// Current status.
    pub status: TaskStatus,
    /// Fractional ordering key.
    pub position: Position,
    /// True while the content is being actively composed in place.
    /// Client-only; a task with `editing = true` is exempt from
    /// list-level shortcuts aimed at other tasks.
    pub editing: bool,
}

impl Task {
    /// A brand-new empty task in editing mode at the given position.
    #[must_use]
    pub fn draft(position: Position) -> Self {
        Self {
            id: TaskId::new(),
            content: String::new(),
            status: TaskStatus::Todo,
            position,
            editing: true,
        }
    }

    /// Replaces the text body.
    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
    }

    /// Enters or leaves in-place editing.
    pub const fn set_editing(&mut self, editing: bool) {
        self.editing = editing;
    }

    /// Sets the status.
    pub const fn set_status(&mut self, status: TaskStatus) {
        self.status = status;
    }

    /// True if the task has no committed or composed content.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Generates a brand-new empty sibling positioned immediately below
    /// this task in `list`.
    ///
    /// The sibling gets a fresh id, empty content, `TODO` status, and
    /// `editing = true`. Its position is this task's position stepped
    /// below the immediately following task (midpoint), or `self + 1`
    /// when this task is last. Returns `None` if this task is not in
    /// `list` (the caller's view is stale).
    #[must_use]
    pub fn generate_sibling_below(&self, list: &[Self]) -> Option<Self> {
        let position = self.position_below(list)?;
        Some(Self::draft(position))
    }

    /// Generates a duplicate of this task positioned immediately below it.
    ///
    /// The duplicate copies content and status, gets a fresh id, and is
    /// not in editing mode. Returns `None` if this task is not in `list`.
    #[must_use]
    pub fn duplicate_below(&self, list: &[Self]) -> Option<Self> {
        let position = self.position_below(list)?;
        Some(Self {
            id: TaskId::new(),
            content: self.content.clone(),
            status: self.status,
            position,
            editing: false,
        })
    }

    /// Position strictly between this task and its successor in `list`.
    fn position_below(&self, list: &[Self]) -> Option<Position> {
        let index = list.iter().position(|t| t.id == self.id)?;
        let next = list.get(index + 1).map(|t| t.position);
        Some(self.position.below(next))
    }
}

impl From<TaskRecord> for Task {
    fn from(record: TaskRecord) -> Self {
        Self {
            id: record.id,
            content: record.content,
            status: record.status,
            position: record.position,
            editing: false,
        }
    }
}

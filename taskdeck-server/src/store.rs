//! In-memory persistence for users and tasks.
//!
//! Both stores are thread-safe via [`RwLock`] and scoped the way the
//! REST routes need them: users are unique by email, and every task
//! operation is scoped to its owner so one account can never observe
//! another's tasks. Deletes are soft: the task keeps its position and
//! can be resurrected by `undo` until the process exits.

use std::collections::HashMap;

use tokio::sync::RwLock;
use uuid::Uuid;

use taskdeck_proto::task::{TaskId, TaskRecord, UpdateTaskRequest};

/// A registered account with its password verifier.
#[derive(Debug, Clone)]
pub struct StoredUser {
    /// Unique user id.
    pub id: Uuid,
    /// Display name.
    pub username: String,
    /// Login email (unique across the store).
    pub email: String,
    /// Salted SHA-256 of the password.
    pub password_hash: Vec<u8>,
    /// Per-user random salt.
    pub salt: [u8; 16],
}

/// Errors from user-store operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum UserStoreError {
    /// An account with this email already exists.
    #[error("email already registered")]
    EmailTaken,
}

/// In-memory user registry keyed by email.
#[derive(Default)]
pub struct UserStore {
    users: RwLock<HashMap<String, StoredUser>>,
}

impl UserStore {
    /// Creates an empty user store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a new account.
    ///
    /// # Errors
    ///
    /// Returns [`UserStoreError::EmailTaken`] if the email is already
    /// registered.
    pub async fn insert(&self, user: StoredUser) -> Result<(), UserStoreError> {
        let mut users = self.users.write().await;
        if users.contains_key(&user.email) {
            return Err(UserStoreError::EmailTaken);
        }
        users.insert(user.email.clone(), user);
        Ok(())
    }

    /// Looks up an account by email.
    pub async fn find_by_email(&self, email: &str) -> Option<StoredUser> {
        self.users.read().await.get(email).cloned()
    }
}

/// A persisted task plus its ownership and soft-delete marker.
#[derive(Debug, Clone)]
struct StoredTask {
    record: TaskRecord,
    deleted: bool,
}

/// Errors from task-store operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TaskStoreError {
    /// No live task with this id belongs to the caller.
    #[error("task not found")]
    NotFound,
    /// A task with this id already exists for the caller.
    #[error("a task with that id already exists")]
    DuplicateId,
}

/// In-memory task store, scoped per owner.
#[derive(Default)]
pub struct TaskStore {
    tasks: RwLock<HashMap<Uuid, HashMap<TaskId, StoredTask>>>,
}

impl TaskStore {
    /// Creates an empty task store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the owner's live tasks sorted ascending by position.
    pub async fn list(&self, owner: Uuid) -> Vec<TaskRecord> {
        let tasks = self.tasks.read().await;
        let mut records: Vec<TaskRecord> = tasks
            .get(&owner)
            .map(|owned| {
                owned
                    .values()
                    .filter(|t| !t.deleted)
                    .map(|t| t.record.clone())
                    .collect()
            })
            .unwrap_or_default();
        drop(tasks);
        records.sort_by(|a, b| a.position.total_cmp(&b.position));
        records
    }

    /// Inserts a task with its client-chosen id and position.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::DuplicateId`] if the owner already has
    /// a task with this id (live or soft-deleted).
    pub async fn insert(&self, owner: Uuid, record: TaskRecord) -> Result<(), TaskStoreError> {
        let mut tasks = self.tasks.write().await;
        let owned = tasks.entry(owner).or_default();
        if owned.contains_key(&record.id) {
            return Err(TaskStoreError::DuplicateId);
        }
        owned.insert(
            record.id.clone(),
            StoredTask {
                record,
                deleted: false,
            },
        );
        Ok(())
    }

    /// Applies a partial update to a live task, returning the updated
    /// record.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::NotFound`] if the owner has no live
    /// task with this id.
    pub async fn update(
        &self,
        owner: Uuid,
        id: &TaskId,
        patch: &UpdateTaskRequest,
    ) -> Result<TaskRecord, TaskStoreError> {
        let mut tasks = self.tasks.write().await;
        let task = tasks
            .get_mut(&owner)
            .and_then(|owned| owned.get_mut(id))
            .filter(|t| !t.deleted)
            .ok_or(TaskStoreError::NotFound)?;
        if let Some(content) = &patch.content {
            task.record.content.clone_from(content);
        }
        if let Some(status) = patch.status {
            task.record.status = status;
        }
        if let Some(position) = patch.position {
            task.record.position = position;
        }
        Ok(task.record.clone())
    }

    /// Marks a live task as deleted without discarding it.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::NotFound`] if the owner has no live
    /// task with this id.
    pub async fn soft_delete(&self, owner: Uuid, id: &TaskId) -> Result<(), TaskStoreError> {
        let mut tasks = self.tasks.write().await;
        let task = tasks
            .get_mut(&owner)
            .and_then(|owned| owned.get_mut(id))
            .filter(|t| !t.deleted)
            .ok_or(TaskStoreError::NotFound)?;
        task.deleted = true;
        Ok(())
    }

    /// Clears a task's soft-delete marker, returning the resurrected
    /// record.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::NotFound`] if the owner has no task
    /// with this id at all.
    pub async fn undo_delete(&self, owner: Uuid, id: &TaskId) -> Result<TaskRecord, TaskStoreError> {
        let mut tasks = self.tasks.write().await;
        let task = tasks
            .get_mut(&owner)
            .and_then(|owned| owned.get_mut(id))
            .ok_or(TaskStoreError::NotFound)?;
        task.deleted = false;
        Ok(task.record.clone())
    }
}

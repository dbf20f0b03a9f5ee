//! Optimistic mutation engine for the task list.
//!
//! [`TaskListEngine`] is the only component that talks to the task-store
//! collaborator, and the only writer of the shared list. Every mutating
//! operation follows the same discipline:
//!
//! 1. cancel any in-flight list refetch (epoch bump);
//! 2. apply the edit to the local list synchronously, capturing the
//!    pre-mutation snapshot first;
//! 3. await the matching remote call;
//! 4. on failure, restore the captured snapshot verbatim and surface the
//!    error; on success the optimistic state is already correct (status
//!    toggles additionally reconcile from the confirmed response).
//!
//! The user-visible list therefore never waits on the network for a
//! locally-knowable outcome. A mutation whose target id is not in the
//! list is a silent no-op (the caller's view was stale).
//!
//! When the fractional position scheme runs out of precision between two
//! neighbors, the engine renumbers the local list to consecutive
//! integers and persists the changed positions best-effort before the
//! next remote call.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tokio::sync::mpsc;

use taskdeck_proto::position::Position;
use taskdeck_proto::task::{CreateTaskRequest, TaskId, UpdateTaskRequest};

use crate::api::{ApiError, TaskStore};

use super::lifecycle::Task;

/// Errors surfaced by engine operations.
///
/// By the time a caller sees this, the local list has already been
/// rolled back to its pre-operation snapshot.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The remote call failed after the optimistic local apply.
    #[error("task store error: {0}")]
    Store(#[from] ApiError),
}

/// Which mutating operation an event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    /// `POST /tasks` for a newly committed task.
    Create,
    /// `PATCH /tasks/{id}` for edited content.
    Update,
    /// `PATCH /tasks/{id}` for a status flip.
    ToggleStatus,
    /// `DELETE /tasks/{id}` (soft-delete).
    Delete,
    /// `PATCH /tasks/{id}/undo`.
    UndoDelete,
}

impl std::fmt::Display for MutationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Create => write!(f, "create"),
            Self::Update => write!(f, "update"),
            Self::ToggleStatus => write!(f, "toggle_status"),
            Self::Delete => write!(f, "delete"),
            Self::UndoDelete => write!(f, "undo_delete"),
        }
    }
}

/// Events emitted by the engine for UI notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskEvent {
    /// A delete was confirmed remotely; show the undo affordance.
    Deleted {
        /// The soft-deleted task.
        id: TaskId,
    },
    /// A remote call failed and the local list was rolled back.
    MutationFailed {
        /// The task the operation targeted.
        id: TaskId,
        /// Which operation failed.
        kind: MutationKind,
    },
    /// The list was renumbered after position-precision exhaustion.
    Rebalanced {
        /// How many tasks received a new position.
        count: usize,
    },
}

/// Owns the ordered task list and reconciles it with the task store.
pub struct TaskListEngine<S: TaskStore> {
    /// The remote collaborator.
    store: S,
    /// The shared, ordered list. Locked only for synchronous mutation;
    /// never held across an await point.
    list: Mutex<Vec<Task>>,
    /// Bumped before every optimistic mutation; a refetch that started
    /// under an older epoch discards its result instead of clobbering
    /// the newer local state.
    refetch_epoch: AtomicU64,
    /// Renumbered positions awaiting best-effort persistence.
    pending_positions: Mutex<Vec<(TaskId, Position)>>,
    /// Channel for emitting events to the UI layer.
    event_tx: mpsc::Sender<TaskEvent>,
}

impl<S: TaskStore> TaskListEngine<S> {
    /// Creates an engine with an empty list.
    ///
    /// Returns the engine and a receiver for [`TaskEvent`]s that the UI
    /// layer should consume.
    pub fn new(store: S, event_buffer: usize) -> (Self, mpsc::Receiver<TaskEvent>) {
        let (event_tx, event_rx) = mpsc::channel(event_buffer);
        let engine = Self {
            store,
            list: Mutex::new(Vec::new()),
            refetch_epoch: AtomicU64::new(0),
            pending_positions: Mutex::new(Vec::new()),
            event_tx,
        };
        (engine, event_rx)
    }

    /// Returns a copy of the current list in display order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Task> {
        self.list.lock().clone()
    }

    /// Refetches the list from the store and installs it, unless a local
    /// mutation started after this refetch began (in which case the
    /// stale result is discarded).
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Store`] if the fetch fails.
    pub async fn refresh(&self) -> Result<(), EngineError> {
        let epoch = self.refetch_epoch.load(Ordering::Acquire);
        let records = self.store.fetch().await?;

        let mut tasks: Vec<Task> = records.into_iter().map(Task::from).collect();
        tasks.sort_by(|a, b| a.position.total_cmp(&b.position));

        let mut list = self.list.lock();
        if self.refetch_epoch.load(Ordering::Acquire) == epoch {
            *list = tasks;
        } else {
            tracing::debug!("refetch superseded by a local mutation, discarding");
        }
        Ok(())
    }

    /// Appends a brand-new empty task in editing mode at the end of the
    /// list and returns its id. Local only; the task reaches the server
    /// when its content is committed via [`create`](Self::create).
    pub fn begin_task(&self) -> TaskId {
        self.cancel_refetches();
        let mut list = self.list.lock();
        let position = list
            .last()
            .map_or(Position::FIRST, |last| last.position.below(None));
        let draft = Task::draft(position);
        let id = draft.id.clone();
        list.push(draft);
        id
    }

    /// Splices a brand-new empty editing sibling immediately below the
    /// given task. Local only, exactly like [`begin_task`](Self::begin_task).
    ///
    /// Returns the new sibling's id, or `None` if the target task is not
    /// in the list.
    pub fn insert_below(&self, id: &TaskId) -> Option<TaskId> {
        self.cancel_refetches();
        let mut list = self.list.lock();
        let index = index_of(&list, id)?;
        self.splice_draft_locked(&mut list, index)
    }

    /// Replaces a task's content. Local only.
    pub fn set_content(&self, id: &TaskId, content: &str) -> bool {
        self.cancel_refetches();
        let mut list = self.list.lock();
        let Some(index) = index_of(&list, id) else {
            return false;
        };
        list[index].set_content(content);
        true
    }

    /// Enters or leaves in-place editing for a task. Local only.
    pub fn set_editing(&self, id: &TaskId, editing: bool) -> bool {
        self.cancel_refetches();
        let mut list = self.list.lock();
        let Some(index) = index_of(&list, id) else {
            return false;
        };
        list[index].set_editing(editing);
        true
    }

    /// Discards a never-committed task whose content is empty.
    ///
    /// Removes the task from the local list and issues no remote call
    /// (the task was never persisted). Returns `false` if the task is
    /// missing or has content.
    pub fn remove_if_empty(&self, id: &TaskId) -> bool {
        self.cancel_refetches();
        let mut list = self.list.lock();
        let Some(index) = index_of(&list, id) else {
            return false;
        };
        if list[index].is_empty() {
            list.remove(index);
            true
        } else {
            false
        }
    }

    /// Commits a task's content as a remote create.
    ///
    /// Locally (synchronous, before the remote call): sets the content,
    /// leaves editing mode, and, when `insert_below` is set, splices a
    /// new empty editing sibling immediately after. Returns the spliced
    /// sibling's id.
    ///
    /// A missing target id aborts without mutating anything.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Store`] if the remote create fails; the
    /// list is rolled back to its pre-operation snapshot first.
    pub async fn create(
        &self,
        id: &TaskId,
        content: &str,
        insert_below: bool,
    ) -> Result<Option<TaskId>, EngineError> {
        let Some((previous, request, sibling)) = self.commit_locked(id, content, insert_below)
        else {
            return Ok(None);
        };

        // The create itself carries the renumbered position; a queued
        // patch for an id the server has not seen yet would 404.
        self.pending_positions.lock().retain(|(queued, _)| queued != id);

        self.persist_rebalanced().await;
        match self.store.create(&request).await {
            Ok(_) => Ok(sibling),
            Err(e) => {
                self.rollback(previous, id, MutationKind::Create).await;
                Err(e.into())
            }
        }
    }

    /// Commits edited content of a previously persisted task as a remote
    /// update. Same local behavior as [`create`](Self::create).
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Store`] if the remote update fails; the
    /// list is rolled back first.
    pub async fn update(
        &self,
        id: &TaskId,
        content: &str,
        insert_below: bool,
    ) -> Result<Option<TaskId>, EngineError> {
        let Some((previous, _, sibling)) = self.commit_locked(id, content, insert_below) else {
            return Ok(None);
        };

        self.persist_rebalanced().await;
        match self
            .store
            .update(id, &UpdateTaskRequest::content(content))
            .await
        {
            Ok(_) => Ok(sibling),
            Err(e) => {
                self.rollback(previous, id, MutationKind::Update).await;
                Err(e.into())
            }
        }
    }

    /// Duplicates a task immediately below itself: same content and
    /// status, fresh id, not editing. The splice happens locally before
    /// the remote create is issued for the duplicate.
    ///
    /// Returns the duplicate's id, or `None` if the source is missing.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Store`] if the remote create fails; the
    /// list is rolled back first.
    pub async fn duplicate_below(&self, id: &TaskId) -> Result<Option<TaskId>, EngineError> {
        self.cancel_refetches();
        let previous;
        let request;
        let dup_id;
        {
            let mut list = self.list.lock();
            let Some(index) = index_of(&list, id) else {
                tracing::debug!(task = %id, "duplicate target missing, aborting");
                return Ok(None);
            };
            previous = list.clone();
            self.renumber_if_exhausted_locked(&mut list, index);
            let source = list[index].clone();
            let Some(dup) = source.duplicate_below(&list) else {
                return Ok(None);
            };
            request = CreateTaskRequest {
                id: dup.id.clone(),
                content: dup.content.clone(),
                position: dup.position,
            };
            dup_id = dup.id.clone();
            list.insert(index + 1, dup);
        }

        self.persist_rebalanced().await;
        match self.store.create(&request).await {
            Ok(_) => Ok(Some(dup_id)),
            Err(e) => {
                self.rollback(previous, id, MutationKind::Create).await;
                Err(e.into())
            }
        }
    }

    /// Flips a task between TODO and DONE, locally first, then syncs the
    /// new status remotely and reconciles from the confirmed response.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Store`] if the remote update fails; the
    /// list is rolled back first.
    pub async fn toggle_status(&self, id: &TaskId) -> Result<(), EngineError> {
        self.cancel_refetches();
        let previous;
        let new_status;
        {
            let mut list = self.list.lock();
            let Some(index) = index_of(&list, id) else {
                tracing::debug!(task = %id, "toggle target missing, aborting");
                return Ok(());
            };
            previous = list.clone();
            new_status = list[index].status.toggled();
            list[index].set_status(new_status);
        }

        self.persist_rebalanced().await;
        match self
            .store
            .update(id, &UpdateTaskRequest::status(new_status))
            .await
        {
            Ok(record) => {
                // Server-confirmed status wins over the optimistic flip.
                let mut list = self.list.lock();
                if let Some(index) = index_of(&list, id) {
                    list[index].set_status(record.status);
                }
                Ok(())
            }
            Err(e) => {
                self.rollback(previous, id, MutationKind::ToggleStatus).await;
                Err(e.into())
            }
        }
    }

    /// Soft-deletes a task: removed from the local list immediately,
    /// then deleted remotely. On success a [`TaskEvent::Deleted`] event
    /// enables the undo affordance; on failure the captured snapshot is
    /// restored verbatim and the task silently reappears.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Store`] if the remote delete fails.
    pub async fn delete(&self, id: &TaskId) -> Result<(), EngineError> {
        self.cancel_refetches();
        let previous;
        {
            let mut list = self.list.lock();
            if index_of(&list, id).is_none() {
                tracing::debug!(task = %id, "delete target missing, aborting");
                return Ok(());
            }
            previous = list.clone();
            list.retain(|t| t.id != *id);
        }

        match self.store.delete(id).await {
            Ok(()) => {
                let _ = self.event_tx.send(TaskEvent::Deleted { id: id.clone() }).await;
                Ok(())
            }
            Err(e) => {
                self.rollback(previous, id, MutationKind::Delete).await;
                Err(e.into())
            }
        }
    }

    /// Resurrects a soft-deleted task and refetches the list so it
    /// reappears at its persisted position.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Store`] if the undo or the refetch fails.
    pub async fn undo_delete(&self, id: &TaskId) -> Result<(), EngineError> {
        if let Err(e) = self.store.undo_delete(id).await {
            let _ = self
                .event_tx
                .send(TaskEvent::MutationFailed {
                    id: id.clone(),
                    kind: MutationKind::UndoDelete,
                })
                .await;
            return Err(e.into());
        }
        self.refresh().await
    }

    // -- internals ----------------------------------------------------

    /// Invalidates any in-flight refetch so its (now stale) result is
    /// discarded rather than installed over the upcoming local mutation.
    fn cancel_refetches(&self) {
        self.refetch_epoch.fetch_add(1, Ordering::AcqRel);
    }

    /// Shared local phase of create/update: set content, leave editing,
    /// optionally splice a sibling. Returns the pre-mutation snapshot,
    /// the create request for the committed task, and the sibling id.
    fn commit_locked(
        &self,
        id: &TaskId,
        content: &str,
        insert_below: bool,
    ) -> Option<(Vec<Task>, CreateTaskRequest, Option<TaskId>)> {
        self.cancel_refetches();
        let mut list = self.list.lock();
        let Some(index) = index_of(&list, id) else {
            tracing::debug!(task = %id, "commit target missing, aborting");
            return None;
        };
        let previous = list.clone();
        list[index].set_content(content);
        list[index].set_editing(false);
        let sibling = if insert_below {
            self.splice_draft_locked(&mut list, index)
        } else {
            None
        };
        // Read the position after the splice: if the splice renumbered
        // the list, the committed task must reach the server at its new
        // position, not the one it held before.
        let request = CreateTaskRequest {
            id: id.clone(),
            content: content.to_string(),
            position: list[index].position,
        };
        Some((previous, request, sibling))
    }

    /// Splices a fresh draft below `index`, renumbering first if the gap
    /// to the successor is exhausted.
    fn splice_draft_locked(&self, list: &mut Vec<Task>, index: usize) -> Option<TaskId> {
        self.renumber_if_exhausted_locked(list, index);
        let current = list[index].clone();
        let sibling = current.generate_sibling_below(list)?;
        let id = sibling.id.clone();
        list.insert(index + 1, sibling);
        Some(id)
    }

    /// Renumbers the whole list to consecutive integer positions when no
    /// representable position exists between `index` and its successor.
    ///
    /// The changed positions are queued and persisted best-effort before
    /// the next remote call ([`Self::persist_rebalanced`]).
    fn renumber_if_exhausted_locked(&self, list: &mut [Task], index: usize) {
        let current = list[index].position;
        let Some(next) = list.get(index + 1).map(|t| t.position) else {
            return;
        };
        if !current.gap_exhausted(next) {
            return;
        }

        let mut pending = self.pending_positions.lock();
        let mut count = 0;
        for (i, task) in list.iter_mut().enumerate() {
            let renumbered = Position::from_index(i);
            if task.position != renumbered {
                task.position = renumbered;
                pending.push((task.id.clone(), renumbered));
                count += 1;
            }
        }
        drop(pending);
        tracing::warn!(count, "position precision exhausted, renumbered list");
        let _ = self.event_tx.try_send(TaskEvent::Rebalanced { count });
    }

    /// Persists queued renumbered positions, logging (not propagating)
    /// failures. The local order is already correct either way.
    async fn persist_rebalanced(&self) {
        let pending: Vec<(TaskId, Position)> = std::mem::take(&mut *self.pending_positions.lock());
        for (id, position) in pending {
            if let Err(e) = self
                .store
                .update(&id, &UpdateTaskRequest::position(position))
                .await
            {
                tracing::warn!(task = %id, error = %e, "failed to persist renumbered position");
            }
        }
    }

    /// Restores the pre-operation snapshot and reports the failure.
    async fn rollback(&self, previous: Vec<Task>, id: &TaskId, kind: MutationKind) {
        tracing::warn!(task = %id, operation = %kind, "remote call failed, rolling back");
        *self.list.lock() = previous;
        let _ = self
            .event_tx
            .send(TaskEvent::MutationFailed {
                id: id.clone(),
                kind,
            })
            .await;
    }
}

/// Index of a task by id, or `None` if absent.
fn index_of(list: &[Task], id: &TaskId) -> Option<usize> {
    list.iter().position(|t| t.id == *id)
}

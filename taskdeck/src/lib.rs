//! Taskdeck -- optimistic task-list client.
//!
//! The heart of this crate is the task-list reconciler in [`tasks`]: an
//! ordered list of tasks keyed by fractional positions, mutated locally
//! before the server acknowledges anything, with snapshot rollback when a
//! remote call fails. The [`api`] module holds the HTTP collaborators the
//! reconciler talks to (task store and auth service).

pub mod api;
pub mod tasks;

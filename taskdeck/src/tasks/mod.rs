//! Task-list reconciliation.
//!
//! Three layers, leaves first:
//! - the position scheme ([`taskdeck_proto::position`]) assigns fractional
//!   ordering keys so inserts never renumber unrelated tasks;
//! - the per-task lifecycle state ([`lifecycle::Task`]) carries the
//!   transient editing flag alongside the persisted fields;
//! - the optimistic mutation engine ([`engine::TaskListEngine`]) owns the
//!   list, applies every edit locally before the matching remote call, and
//!   rolls back to the captured snapshot when that call fails.

pub mod engine;
pub mod lifecycle;

pub use engine::{EngineError, MutationKind, TaskEvent, TaskListEngine};
pub use lifecycle::Task;

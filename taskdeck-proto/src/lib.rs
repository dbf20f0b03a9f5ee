//! Shared wire types for Taskdeck.
//!
//! Defines the task data model, the fractional position scheme, and the
//! auth DTOs exchanged between the client and the Taskdeck server. All
//! types serialize as JSON; this crate performs no I/O.

pub mod auth;
pub mod position;
pub mod task;

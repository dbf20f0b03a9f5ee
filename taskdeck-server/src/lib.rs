//! Taskdeck server library.
//!
//! Exposes the REST server for use in tests and embedding. The server
//! keeps users and tasks in memory, authenticates requests with bearer
//! tokens, and speaks JSON over the routes the Taskdeck client expects.

pub mod auth;
pub mod config;
pub mod server;
pub mod store;

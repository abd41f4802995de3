//! Core domain types for the Study Planner client.
//!
//! This crate has no I/O of its own. It defines the classified error
//! taxonomy, the identity and resource models, the configuration model, and
//! the traits the other layers implement (`KeyValueStore`, `AuthApi`,
//! `UnauthorizedHandler`).

pub mod config;
pub mod error;
pub mod models;
pub mod session;
pub mod storage;
pub mod user;

// Re-export common error type
pub use error::{ApiError, ErrorKind};

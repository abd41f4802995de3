//! Application layer for the study planner client.
//!
//! Coordinates the gateway and durable storage into an authenticated
//! session, and wires everything together at startup.

pub mod bootstrap;
pub mod session;

pub use bootstrap::{AppContext, Overrides};
pub use session::{SessionState, SessionStore};

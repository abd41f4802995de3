//! Session domain model.
//!
//! The session is the client's view of "who is logged in". It is owned by the
//! application's session store; everything here is plain data plus the hook
//! the gateway uses to report an expired credential.

use crate::user::User;
use serde::{Deserialize, Serialize};

/// Lifecycle of the session store.
///
/// ```text
/// Uninitialized -> Loading -> Anonymous | Authenticated
/// Anonymous  --login/register-->  Authenticated
/// Authenticated --logout/401-->   Anonymous
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SessionStatus {
    /// Constructed, durable storage not read yet.
    #[default]
    Uninitialized,
    /// Reading durable storage.
    Loading,
    /// No identity.
    Anonymous,
    /// An identity and credential are held.
    Authenticated,
}

/// A point-in-time copy of the session.
///
/// The credential is never serialized, so a snapshot can be printed or
/// logged as it is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub status: SessionStatus,
    pub user: Option<User>,
    #[serde(skip_serializing, default)]
    pub token: Option<String>,
    pub is_loading: bool,
}

impl SessionSnapshot {
    /// True when an identity is present.
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

/// Receives notice that the server rejected the stored credential.
///
/// The gateway calls this after it has already removed the credential and
/// identity from durable storage. It runs synchronously on the calling task.
pub trait UnauthorizedHandler: Send + Sync {
    fn on_unauthorized(&self);
}

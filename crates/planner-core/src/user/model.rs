//! User identity and authentication form models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The signed-in principal as returned by the API.
///
/// Fields the client does not know about are kept in `extra` so that a
/// stored identity round-trips without loss.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl User {
    /// Merges every field set in `patch` into this identity.
    pub fn apply(&mut self, patch: UserPatch) {
        if let Some(id) = patch.id {
            self.id = id;
        }
        if let Some(email) = patch.email {
            self.email = email;
        }
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(created_at) = patch.created_at {
            self.created_at = Some(created_at);
        }
        if let Some(updated_at) = patch.updated_at {
            self.updated_at = Some(updated_at);
        }
        self.extra.extend(patch.extra);
    }
}

/// A partial identity update. Unset fields are left untouched.
///
/// Entries in `extra` are merged into [`User::extra`] key by key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserPatch {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Body of `POST /auth/login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Body of `POST /auth/register`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

/// Response of the login and register endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: User,
    pub token: String,
}

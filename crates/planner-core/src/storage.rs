//! Durable key-value storage abstraction.
//!
//! The session store is the only writer of the credential and identity keys;
//! the request gateway only reads the credential (and clears both on a 401).

use thiserror::Error;

/// Keys used in durable storage.
pub struct StorageKeys;

impl StorageKeys {
    /// Opaque bearer credential.
    pub const AUTH_TOKEN: &'static str = "iu-study-planner-token";
    /// JSON-serialized identity record.
    pub const USER_DATA: &'static str = "iu-study-planner-user";
}

/// Errors that can occur during storage operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backing file is not a valid JSON object.
    #[error("Corrupt storage data: {0}")]
    Corrupt(#[from] serde_json::Error),

    /// File locking error.
    #[error("Lock error: {0}")]
    Lock(String),
}

/// A string-valued key-value store that survives process restarts.
///
/// Implementations must be safe to share between the session store and the
/// gateway.
pub trait KeyValueStore: Send + Sync {
    /// Returns the value for `key`, or `None` if it is not set.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Sets `key` to `value`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removes `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Removes the credential and the identity.
///
/// Both removals are attempted even if the first fails; the first error is
/// returned.
pub fn clear_credentials(store: &dyn KeyValueStore) -> Result<(), StorageError> {
    let token = store.remove(StorageKeys::AUTH_TOKEN);
    let user = store.remove(StorageKeys::USER_DATA);
    token.and(user)
}

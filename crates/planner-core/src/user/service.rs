//! Authentication API trait.

use super::model::{AuthResponse, LoginForm, RegisterForm, User};
use crate::error::ApiError;

/// Remote authentication endpoints used by the session store.
///
/// This trait abstracts the transport so the session store can be driven by
/// the HTTP gateway in production and by an in-process fake in tests.
///
/// Implementations make exactly one attempt per call and return the
/// gateway's classified error unchanged.
#[async_trait::async_trait]
pub trait AuthApi: Send + Sync {
    /// Exchanges credentials for an identity and a bearer token.
    async fn login(&self, form: &LoginForm) -> Result<AuthResponse, ApiError>;

    /// Creates an account and returns its identity and a bearer token.
    async fn register(&self, form: &RegisterForm) -> Result<AuthResponse, ApiError>;

    /// Checks the stored token with the server and returns the current identity.
    async fn verify(&self) -> Result<User, ApiError>;
}

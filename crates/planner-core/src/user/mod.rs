//! User domain module.
//!
//! # Module Structure
//!
//! - `model`: identity, partial update and auth form models
//! - `service`: the authentication API trait implemented by transports

mod model;
mod service;

// Re-export public API
pub use model::{AuthResponse, LoginForm, RegisterForm, User, UserPatch};
pub use service::AuthApi;

//! Error types for the Study Planner client.
//!
//! [`ApiError`] is the classified error produced by the request gateway. Its
//! `Display` output is exactly the human-readable message, so front ends can
//! render it without further formatting.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default user-facing messages, one per error kind.
pub mod messages {
    pub const NETWORK_ERROR: &str = "Network error. Please check your connection and try again.";
    pub const UNAUTHORIZED: &str = "You are not authorized to perform this action.";
    pub const FORBIDDEN: &str = "Access denied. Please check your permissions.";
    pub const NOT_FOUND: &str = "The requested resource was not found.";
    pub const VALIDATION_ERROR: &str = "Please check your input and try again.";
    pub const SERVER_ERROR: &str = "An unexpected error occurred. Please try again later.";
    pub const REQUEST_TIMEOUT: &str = "Request timeout. Please try again.";
    pub const UPLOAD_TIMEOUT: &str = "Upload timeout. Please try again.";
}

/// The fixed taxonomy of classified errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    ValidationError,
    UnauthorizedError,
    ForbiddenError,
    NotFoundError,
    ServerError,
    TimeoutError,
    NetworkError,
    ParseError,
    /// Anything outside the HTTP taxonomy (bad URL, storage failure, ...).
    Other,
}

/// A classified error produced by the request gateway or the session store.
///
/// Each variant carries the message to show to the user. HTTP variants carry
/// either the status-derived default or the server-supplied `message` field.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApiError {
    /// HTTP 400
    #[error("{message}")]
    Validation { message: String },

    /// HTTP 401
    #[error("{message}")]
    Unauthorized { message: String },

    /// HTTP 403
    #[error("{message}")]
    Forbidden { message: String },

    /// HTTP 404
    #[error("{message}")]
    NotFound { message: String },

    /// HTTP 500 and every other non-success status
    #[error("{message}")]
    Server { status: u16, message: String },

    /// The call did not settle before the configured timeout.
    #[error("{message}")]
    Timeout { message: String },

    /// Connection-level failure (DNS, refused, reset).
    #[error("{message}")]
    Network { message: String },

    /// A success response whose body was not the expected JSON.
    #[error("{message}")]
    Parse { message: String },

    /// The request could not be built; the underlying message is kept as is.
    #[error("{message}")]
    Request { message: String },

    /// Durable storage failed while persisting session data.
    #[error("{message}")]
    Storage { message: String },
}

impl ApiError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Classifies a non-success HTTP status.
    ///
    /// `body_message` is the `message` field of the response body, if any; it
    /// supersedes the status-derived default.
    pub fn from_status(status: u16, body_message: Option<String>) -> Self {
        let pick = |default: &str| body_message.clone().unwrap_or_else(|| default.to_string());

        match status {
            400 => Self::Validation {
                message: pick(messages::VALIDATION_ERROR),
            },
            401 => Self::Unauthorized {
                message: pick(messages::UNAUTHORIZED),
            },
            403 => Self::Forbidden {
                message: pick(messages::FORBIDDEN),
            },
            404 => Self::NotFound {
                message: pick(messages::NOT_FOUND),
            },
            _ => Self::Server {
                status,
                message: pick(messages::SERVER_ERROR),
            },
        }
    }

    /// Creates a Timeout error with the generic request message
    pub fn timeout() -> Self {
        Self::Timeout {
            message: messages::REQUEST_TIMEOUT.to_string(),
        }
    }

    /// Creates a Timeout error with the upload message
    pub fn upload_timeout() -> Self {
        Self::Timeout {
            message: messages::UPLOAD_TIMEOUT.to_string(),
        }
    }

    /// Creates a Network error with the generic connectivity message
    pub fn network() -> Self {
        Self::Network {
            message: messages::NETWORK_ERROR.to_string(),
        }
    }

    /// Creates a Parse error
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    /// Creates a Request error
    pub fn request(message: impl Into<String>) -> Self {
        Self::Request {
            message: message.into(),
        }
    }

    /// Creates a Storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    // ============================================================================
    // Accessors
    // ============================================================================

    /// Returns the taxonomy kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::ValidationError,
            Self::Unauthorized { .. } => ErrorKind::UnauthorizedError,
            Self::Forbidden { .. } => ErrorKind::ForbiddenError,
            Self::NotFound { .. } => ErrorKind::NotFoundError,
            Self::Server { .. } => ErrorKind::ServerError,
            Self::Timeout { .. } => ErrorKind::TimeoutError,
            Self::Network { .. } => ErrorKind::NetworkError,
            Self::Parse { .. } => ErrorKind::ParseError,
            Self::Request { .. } | Self::Storage { .. } => ErrorKind::Other,
        }
    }

    /// Returns the human-readable message.
    pub fn message(&self) -> &str {
        match self {
            Self::Validation { message }
            | Self::Unauthorized { message }
            | Self::Forbidden { message }
            | Self::NotFound { message }
            | Self::Server { message, .. }
            | Self::Timeout { message }
            | Self::Network { message }
            | Self::Parse { message }
            | Self::Request { message }
            | Self::Storage { message } => message,
        }
    }

    /// Returns the HTTP status this error was classified from, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Validation { .. } => Some(400),
            Self::Unauthorized { .. } => Some(401),
            Self::Forbidden { .. } => Some(403),
            Self::NotFound { .. } => Some(404),
            Self::Server { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Check if this is an Unauthorized error
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    /// Check if this is a Timeout error
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Check if this is a Network error
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network { .. })
    }

    /// Check if this is a NotFound error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::parse(err.to_string())
    }
}

impl From<crate::storage::StorageError> for ApiError {
    fn from(err: crate::storage::StorageError) -> Self {
        Self::storage(err.to_string())
    }
}

/// A type alias for `Result<T, ApiError>`.
pub type Result<T> = std::result::Result<T, ApiError>;

//! Client error types

use shared::validation::{FieldErrors, ValidationError};
use thiserror::Error;

/// Client error type
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[source] reqwest::Error),

    /// Request exceeded the configured timeout
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Invalid response format
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Authentication required
    #[error("Authentication required")]
    Unauthorized,

    /// Permission denied
    #[error("Permission denied: {0}")]
    Forbidden(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Resource state conflict (e.g. already completed)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Server-side validation error, shown as one top-level form error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Request rejected by a client-side lifecycle guard
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ClientError::Timeout(e.to_string())
        } else {
            ClientError::Http(e)
        }
    }
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Form submission error: field-level problems found before sending, or the
/// single top-level error of the request itself
#[derive(Debug, Error)]
pub enum FormError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error(transparent)]
    Api(#[from] ClientError),
}

impl FormError {
    /// Per-field errors, when the form never left the client
    pub fn fields(&self) -> Option<&FieldErrors> {
        match self {
            FormError::Invalid(e) => Some(e.fields()),
            FormError::Api(_) => None,
        }
    }
}

pub type FormResult<T> = Result<T, FormError>;

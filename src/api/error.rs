//! Error types for the remote data client

use serde_json::Value;
use thiserror::Error;

use crate::api::models::ErrorBody;
use crate::core::form::FieldError;

/// Result type alias
pub type Result<T> = std::result::Result<T, ApiError>;

/// Remote data client errors
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Server returned {status}{}", suffix(.message))]
    Status {
        status: u16,
        message: Option<String>,
    },

    #[error("{message}")]
    Validation {
        status: u16,
        message: String,
        errors: Vec<FieldError>,
    },

    #[error("Unexpected response: {0}")]
    Decode(String),
}

fn suffix(message: &Option<String>) -> String {
    message
        .as_deref()
        .map(|m| format!(": {}", m))
        .unwrap_or_default()
}

impl ApiError {
    /// Classify a non-success response by its body
    pub fn from_response(status: u16, body: &Value) -> Self {
        let parsed = serde_json::from_value::<ErrorBody>(body.clone()).ok();
        match parsed {
            Some(ErrorBody {
                message: Some(message),
                errors,
            }) if !errors.is_empty() => ApiError::Validation {
                status,
                message,
                errors,
            },
            Some(ErrorBody {
                message: None,
                errors,
            }) if !errors.is_empty() => ApiError::Validation {
                status,
                message: "Validation failed".to_string(),
                errors,
            },
            Some(ErrorBody { message, .. }) => ApiError::Status { status, message },
            None => ApiError::Status {
                status,
                message: body.as_str().filter(|s| !s.is_empty()).map(str::to_string),
            },
        }
    }

    /// HTTP status, when the server answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } | ApiError::Validation { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// `message` from the response body, if the server sent one
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Status {
                message: Some(message),
                ..
            }
            | ApiError::Validation { message, .. } => Some(message),
            _ => None,
        }
    }

    /// Per-field problems reported by the server
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            ApiError::Validation { errors, .. } => errors,
            _ => &[],
        }
    }

    /// Text shown to the user: the server's message, else `fallback`
    pub fn user_message(&self, fallback: &str) -> String {
        self.server_message()
            .map(str::to_string)
            .unwrap_or_else(|| fallback.to_string())
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ApiError::Decode(e.to_string())
        } else {
            ApiError::Transport(e.to_string())
        }
    }
}

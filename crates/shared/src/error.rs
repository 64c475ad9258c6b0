use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Coarse failure classes surfaced to whoever renders notices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Transport,
    Rejected,
    Malformed,
    Unauthenticated,
    Validation,
}

impl ErrorCategory {
    pub fn title(self) -> &'static str {
        match self {
            ErrorCategory::Transport => "Network error",
            ErrorCategory::Rejected => "Request rejected",
            ErrorCategory::Malformed => "Unexpected response",
            ErrorCategory::Unauthenticated => "Not signed in",
            ErrorCategory::Validation => "Invalid input",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub category: ErrorCategory,
    pub message: String,
}

impl ApiError {
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
#[error("{category:?}: {message}")]
pub struct ApiException {
    pub category: ErrorCategory,
    pub message: String,
}

impl ApiException {
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
        }
    }
}

impl From<ApiException> for ApiError {
    fn from(value: ApiException) -> Self {
        Self {
            category: value.category,
            message: value.message,
        }
    }
}

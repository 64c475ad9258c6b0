use shared::error::{ApiError, ApiException, ErrorCategory};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{endpoint} answered with HTTP {status}")]
    HttpStatus {
        endpoint: &'static str,
        status: u16,
    },
    #[error("{message}")]
    Rejected { message: String },
    #[error("malformed payload from {endpoint}: {reason}")]
    Malformed {
        endpoint: &'static str,
        reason: String,
    },
    #[error("invalid api base url {url}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    #[error("not signed in")]
    NotSignedIn,
    #[error("{field} must not be empty")]
    Validation { field: &'static str },
}

impl GatewayError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            GatewayError::Transport { .. }
            | GatewayError::HttpStatus { .. }
            | GatewayError::InvalidBaseUrl { .. } => ErrorCategory::Transport,
            GatewayError::Rejected { .. } => ErrorCategory::Rejected,
            GatewayError::Malformed { .. } => ErrorCategory::Malformed,
            GatewayError::NotSignedIn => ErrorCategory::Unauthenticated,
            GatewayError::Validation { .. } => ErrorCategory::Validation,
        }
    }

    pub fn malformed(endpoint: &'static str, reason: impl ToString) -> Self {
        GatewayError::Malformed {
            endpoint,
            reason: reason.to_string(),
        }
    }

    pub fn to_api_error(&self) -> ApiError {
        ApiError::new(self.category(), self.to_string())
    }
}

impl From<ApiException> for GatewayError {
    fn from(value: ApiException) -> Self {
        match value.category {
            ErrorCategory::Unauthenticated => GatewayError::NotSignedIn,
            ErrorCategory::Malformed => GatewayError::Malformed {
                endpoint: "response",
                reason: value.message,
            },
            ErrorCategory::Rejected | ErrorCategory::Transport | ErrorCategory::Validation => {
                GatewayError::Rejected {
                    message: value.message,
                }
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to access session file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("session file {path} is corrupt: {source}")]
    Corrupt {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

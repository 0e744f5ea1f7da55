use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Classified error category, exposed to the store and the UI layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    Timeout,
    NetworkError,
    RateLimitExceeded,
    ServerError,
    ValidationError,
    ApiError,
    Cancelled,
    UnknownError,
}

impl ErrorKind {
    pub fn as_str(&self) -> &str {
        match self {
            ErrorKind::Timeout => "TIMEOUT",
            ErrorKind::NetworkError => "NETWORK_ERROR",
            ErrorKind::RateLimitExceeded => "RATE_LIMIT_EXCEEDED",
            ErrorKind::ServerError => "SERVER_ERROR",
            ErrorKind::ValidationError => "VALIDATION_ERROR",
            ErrorKind::ApiError => "API_ERROR",
            ErrorKind::Cancelled => "CANCELLED",
            ErrorKind::UnknownError => "UNKNOWN_ERROR",
        }
    }

    /// Whether an automatic retry is permitted for this kind.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ErrorKind::Timeout
                | ErrorKind::NetworkError
                | ErrorKind::RateLimitExceeded
                | ErrorKind::ServerError
        )
    }
}

/// Error types for planner backend operations
#[derive(Error, Debug)]
pub enum PlannerError {
    /// The attempt's deadline fired and aborted the in-flight call
    #[error("Request timed out")]
    Timeout,

    /// Network or connection error
    #[error("Network error: {source}")]
    Network {
        #[source]
        source: reqwest::Error,
    },

    /// Rate or usage limit exceeded (HTTP 429)
    #[error("Rate limit exceeded: {message}")]
    RateLimit {
        message: String,
        retry_after: Option<u64>,
    },

    /// Backend failure (HTTP 5xx)
    #[error("Server error (status {status}): {message}")]
    Server { status: u16, message: String },

    /// Invalid input, rejected before or by the backend (HTTP 400)
    #[error("Validation failed: {message}")]
    Validation { message: String },

    /// API error with status code (other non-2xx)
    #[error("API error (status {status}): {message}")]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
    },

    /// The user cancelled the operation; never produced by classification
    #[error("Operation cancelled")]
    Cancelled,

    /// Generic error for unexpected cases
    #[error("Unknown error: {message}")]
    Unknown { message: String },
}

impl PlannerError {
    /// Create a rate limit error
    pub fn rate_limit<S: Into<String>>(message: S, retry_after: Option<u64>) -> Self {
        Self::RateLimit {
            message: message.into(),
            retry_after,
        }
    }

    /// Create a server error
    pub fn server(status: u16, message: impl Into<String>) -> Self {
        Self::Server {
            status,
            message: message.into(),
        }
    }

    /// Create a validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create an API error
    pub fn api_error(status: u16, code: Option<String>, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            code,
            message: message.into(),
        }
    }

    /// Create an unknown error
    pub fn unknown<S: Into<String>>(message: S) -> Self {
        Self::Unknown {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            PlannerError::Timeout => ErrorKind::Timeout,
            PlannerError::Network { .. } => ErrorKind::NetworkError,
            PlannerError::RateLimit { .. } => ErrorKind::RateLimitExceeded,
            PlannerError::Server { .. } => ErrorKind::ServerError,
            PlannerError::Validation { .. } => ErrorKind::ValidationError,
            PlannerError::Api { .. } => ErrorKind::ApiError,
            PlannerError::Cancelled => ErrorKind::Cancelled,
            PlannerError::Unknown { .. } => ErrorKind::UnknownError,
        }
    }

    /// Whether an automatic retry is permitted for this error.
    pub fn is_transient(&self) -> bool {
        self.kind().is_transient()
    }
}

impl From<reqwest::Error> for PlannerError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            PlannerError::Timeout
        } else {
            PlannerError::Network { source: err }
        }
    }
}

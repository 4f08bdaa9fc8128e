//! Error taxonomy for the session layer.
//!
//! DESIGN
//! ======
//! `ApiError` mirrors how a failed call should be treated by the UI:
//! quota and payload-size failures are terminal and carry the backend's
//! human-readable message, auth failures surface only after the client's
//! single refresh attempt, and everything else passes through untouched.

use serde_json::Value;

/// Storage failure in a durable store or cookie jar.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Reading or writing the backing medium failed.
    #[error("store I/O failed: {0}")]
    Io(String),

    /// Persisted contents could not be (de)serialized.
    #[error("store encoding failed: {0}")]
    Encoding(String),

    /// The host environment has no storage available (e.g. no `window`).
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Error returned by [`crate::http::ApiClient`] and everything built on it.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ApiError {
    /// HTTP 402: a subscription quota was exhausted. Never retried.
    #[error("{message}")]
    QuotaExceeded { message: String, body: Option<Value> },

    /// HTTP 413: the upload exceeds the plan's size limit. Never retried.
    #[error("{message}")]
    PayloadTooLarge { message: String, body: Option<Value> },

    /// Any other non-success response, including a 401 that survived the
    /// refresh attempt.
    #[error("API response error: status {status}")]
    Status {
        status: u16,
        method: String,
        url: String,
        body: Option<Value>,
        message: Option<String>,
    },

    /// The request never produced a response.
    #[error("API request failed: {0}")]
    Transport(String),

    /// A success response body did not match the expected shape.
    #[error("API response parse failed: {0}")]
    Parse(String),

    /// Persisting credentials failed.
    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl ApiError {
    /// HTTP status carried by this error, if a response was received.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::QuotaExceeded { .. } => Some(402),
            Self::PayloadTooLarge { .. } => Some(413),
            Self::Status { status, .. } => Some(*status),
            Self::Transport(_) | Self::Parse(_) | Self::Storage(_) => None,
        }
    }

    /// Backend error payload, when the failure came with a JSON body.
    #[must_use]
    pub fn body(&self) -> Option<&Value> {
        match self {
            Self::QuotaExceeded { body, .. } | Self::PayloadTooLarge { body, .. } | Self::Status { body, .. } => {
                body.as_ref()
            }
            Self::Transport(_) | Self::Parse(_) | Self::Storage(_) => None,
        }
    }

    /// Human-readable message for UI display, preferring the backend's own.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Status { message: Some(message), .. } => message.clone(),
            other => other.to_string(),
        }
    }

    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }
}

/// Invalid configuration value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?}")]
    InvalidValue { var: &'static str, value: String },

    #[error("invalid API URL {0:?}")]
    InvalidUrl(String),
}

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;

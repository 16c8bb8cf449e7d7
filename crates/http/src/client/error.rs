//! Client error types

use crate::client::transport::ApiResponse;
use crate::types::ErrorBody;
use std::time::Duration;
use thiserror::Error;

/// Result type for client operations
pub type Result<T, E = ClientError> = std::result::Result<T, E>;

/// Client error types
#[derive(Debug, Error)]
pub enum ClientError {
    /// The server could not be reached
    #[error("Network error: {0}")]
    Network(String),

    /// Server returned a non-2xx status that was not recovered by a refresh
    #[error("Server error {status}: {body}")]
    Http { status: u16, body: String },

    /// Login was rejected with 429 or is still in its local cooldown
    #[error("Rate limited: {message}")]
    RateLimited {
        message: String,
        retry_after: Option<Duration>,
    },

    /// The access token expired and the session could not be refreshed
    #[error("Session expired: {0}")]
    SessionExpired(#[from] RefreshError),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// Request target is not an API path
    #[error("Invalid API path: {0}")]
    InvalidPath(String),
}

/// Failure of a `/refresh-token` call, shared with every request waiting on it
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("token refresh failed: {message}")]
pub struct RefreshError {
    /// Status of the refresh response, `None` if the server was unreachable
    pub status: Option<u16>,
    pub message: String,
}

impl RefreshError {
    pub(crate) fn from_client_error(error: &ClientError) -> Self {
        Self {
            status: error.status(),
            message: error.message(),
        }
    }

    pub(crate) fn abandoned() -> Self {
        Self {
            status: None,
            message: "refresh was abandoned before it completed".to_string(),
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}

impl ClientError {
    /// Create an error from a non-2xx response
    pub fn from_response(response: &ApiResponse) -> Self {
        Self::Http {
            status: response.status().as_u16(),
            body: response.text(),
        }
    }

    /// HTTP status associated with the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::RateLimited { .. } => Some(429),
            Self::SessionExpired(err) => err.status,
            _ => None,
        }
    }

    /// Whether the user has to authenticate again
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::SessionExpired(_) | Self::Http { status: 401, .. })
    }

    /// Human readable message, preferring the backend's `{"error": ...}` field
    pub fn message(&self) -> String {
        match self {
            Self::Http { body, .. } => serde_json::from_str::<ErrorBody>(body)
                .map(|b| b.error)
                .unwrap_or_else(|_| body.clone()),
            Self::RateLimited { message, .. } => message.clone(),
            Self::SessionExpired(err) => err.message.clone(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_extracts_backend_error_field() {
        let err = ClientError::Http {
            status: 401,
            body: r#"{"error":"Invalid credentials"}"#.to_string(),
        };
        assert_eq!(err.message(), "Invalid credentials");
        assert!(err.is_auth_failure());
    }

    #[test]
    fn test_message_falls_back_to_raw_body() {
        let err = ClientError::Http {
            status: 500,
            body: "upstream exploded".to_string(),
        };
        assert_eq!(err.message(), "upstream exploded");
        assert_eq!(err.status(), Some(500));
        assert!(!err.is_auth_failure());
    }

    #[test]
    fn test_refresh_error_keeps_status() {
        let err = ClientError::Http {
            status: 403,
            body: r#"{"error":"Refresh token revoked"}"#.to_string(),
        };
        let refresh = RefreshError::from_client_error(&err);
        assert_eq!(refresh.status, Some(403));
        assert_eq!(refresh.message, "Refresh token revoked");

        let wrapped = ClientError::from(refresh);
        assert!(wrapped.is_auth_failure());
        assert_eq!(wrapped.status(), Some(403));
    }
}

//! Error types for FinditBack
//!
//! This module defines the error types used throughout the client,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for FinditBack operations
///
/// Covers configuration loading, backend request failures, credential
/// storage and input validation.
#[derive(Error, Debug)]
pub enum FinditbackError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Backend returned a non-success status
    #[error("API error ({status}): {}", .message.as_deref().unwrap_or("no message"))]
    Api {
        /// HTTP status code
        status: u16,
        /// `message` field of the error body, when the backend sent one
        message: Option<String>,
    },

    /// Credential missing or rejected (HTTP 401)
    #[error("Authentication error: {}", .0.as_deref().unwrap_or("unauthorized"))]
    Authentication(Option<String>),

    /// Resource not found (HTTP 404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// User supplied input that cannot be sent
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Persisted login session errors
    #[error("Session error: {0}")]
    Session(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP transport errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Keyring/credential storage errors
    #[error("Keyring error: {0}")]
    Keyring(#[from] keyring::Error),
}

impl FinditbackError {
    /// The backend-provided message carried by this error, if any
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Api { message, .. } => message.as_deref(),
            Self::Authentication(message) => message.as_deref(),
            _ => None,
        }
    }
}

/// Result type alias for FinditBack operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;

/// Human-readable text for an operation failure.
///
/// Prefers the `message` the backend put in its error body and falls back
/// to the operation-specific `fallback` otherwise.
///
/// # Examples
///
/// ```
/// use finditback::error::{user_message, FinditbackError};
///
/// let err = anyhow::Error::from(FinditbackError::Api {
///     status: 400,
///     message: Some("Item not found".to_string()),
/// });
/// assert_eq!(user_message(&err, "Failed to initialize chat"), "Item not found");
///
/// let err = anyhow::anyhow!("connection reset");
/// assert_eq!(user_message(&err, "Failed to initialize chat"), "Failed to initialize chat");
/// ```
pub fn user_message(err: &anyhow::Error, fallback: &str) -> String {
    err.downcast_ref::<FinditbackError>()
        .and_then(FinditbackError::server_message)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or(fallback)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let error = FinditbackError::Config("invalid format".to_string());
        assert_eq!(error.to_string(), "Configuration error: invalid format");
    }

    #[test]
    fn test_api_error_display_with_message() {
        let error = FinditbackError::Api {
            status: 500,
            message: Some("database down".to_string()),
        };
        assert_eq!(error.to_string(), "API error (500): database down");
    }

    #[test]
    fn test_api_error_display_without_message() {
        let error = FinditbackError::Api {
            status: 502,
            message: None,
        };
        assert_eq!(error.to_string(), "API error (502): no message");
    }

    #[test]
    fn test_authentication_error_display() {
        let error = FinditbackError::Authentication(None);
        assert_eq!(error.to_string(), "Authentication error: unauthorized");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error: FinditbackError = io_error.into();
        assert!(matches!(error, FinditbackError::Io(_)));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_error = serde_json::from_str::<serde_json::Value>("{invalid json}").unwrap_err();
        let error: FinditbackError = json_error.into();
        assert!(matches!(error, FinditbackError::Serialization(_)));
    }

    #[test]
    fn test_user_message_prefers_server_message() {
        let err = anyhow::Error::from(FinditbackError::Authentication(Some(
            "Token expired".to_string(),
        )));
        assert_eq!(user_message(&err, "Failed to send message"), "Token expired");
    }

    #[test]
    fn test_user_message_ignores_blank_server_message() {
        let err = anyhow::Error::from(FinditbackError::Api {
            status: 400,
            message: Some("  ".to_string()),
        });
        assert_eq!(
            user_message(&err, "Failed to fetch messages"),
            "Failed to fetch messages"
        );
    }

    #[test]
    fn test_user_message_falls_back_for_transport_errors() {
        let err = anyhow::Error::from(FinditbackError::NotFound("chat t1".to_string()));
        assert_eq!(
            user_message(&err, "Failed to fetch messages"),
            "Failed to fetch messages"
        );
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<FinditbackError>();
    }
}

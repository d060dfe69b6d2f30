//! Error types for ChatBridge
//!
//! This module defines all error types used throughout the application,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for ChatBridge operations
///
/// Covers configuration loading, client-side persistence, request
/// validation at the proxy boundary, and upstream provider interactions.
#[derive(Error, Debug)]
pub enum ChatBridgeError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Inbound request failed validation; each entry describes one problem
    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// Inbound request was malformed or asked for something unsupported
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Sliding-window rate limit exceeded for a client address
    #[error("Rate limit exceeded: limit={limit}, retry in {reset_after_secs}s")]
    RateLimitExceeded {
        /// The configured number of requests per window
        limit: u32,
        /// Requests still available in the current window
        remaining: u32,
        /// Seconds until the oldest request leaves the window
        reset_after_secs: u64,
    },

    /// No server-side credential configured for the provider
    #[error("Missing credentials for provider: {0}")]
    MissingCredentials(String),

    /// The upstream provider rejected or failed the request
    #[error("Provider error ({status}): {message}")]
    Provider {
        /// HTTP status returned upstream, or 0 when the request never completed
        status: u16,
        /// Provider error text, passed through to the caller
        message: String,
    },

    /// Persisting a blob would exceed the storage backend quota
    #[error("Storage quota exceeded: {0}")]
    StorageQuota(String),

    /// Other storage backend errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// SQLite errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

impl ChatBridgeError {
    /// Returns true when the error is a storage quota failure
    ///
    /// Works through an `anyhow::Error` chain so callers holding the
    /// crate-level [`Result`] can branch on it.
    pub fn is_quota(err: &anyhow::Error) -> bool {
        matches!(
            err.downcast_ref::<ChatBridgeError>(),
            Some(ChatBridgeError::StorageQuota(_))
        )
    }
}

/// Result type alias for ChatBridge operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let error = ChatBridgeError::Config("invalid format".to_string());
        assert_eq!(error.to_string(), "Configuration error: invalid format");
    }

    #[test]
    fn test_validation_error_joins_details() {
        let error = ChatBridgeError::Validation(vec![
            "model is required".to_string(),
            "temperature out of range".to_string(),
        ]);
        assert_eq!(
            error.to_string(),
            "Validation failed: model is required; temperature out of range"
        );
    }

    #[test]
    fn test_rate_limit_exceeded_display() {
        let error = ChatBridgeError::RateLimitExceeded {
            limit: 10,
            remaining: 0,
            reset_after_secs: 42,
        };
        let s = error.to_string();
        assert!(s.contains("limit=10"));
        assert!(s.contains("42s"));
    }

    #[test]
    fn test_provider_error_display() {
        let error = ChatBridgeError::Provider {
            status: 401,
            message: "invalid api key".to_string(),
        };
        assert_eq!(error.to_string(), "Provider error (401): invalid api key");
    }

    #[test]
    fn test_missing_credentials_error_display() {
        let error = ChatBridgeError::MissingCredentials("anthropic".to_string());
        assert_eq!(
            error.to_string(),
            "Missing credentials for provider: anthropic"
        );
    }

    #[test]
    fn test_is_quota_detects_storage_quota() {
        let quota: anyhow::Error = ChatBridgeError::StorageQuota("full".to_string()).into();
        let other: anyhow::Error = ChatBridgeError::Storage("locked".to_string()).into();
        assert!(ChatBridgeError::is_quota(&quota));
        assert!(!ChatBridgeError::is_quota(&other));
        assert!(!ChatBridgeError::is_quota(&anyhow::anyhow!("plain")));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error: ChatBridgeError = io_error.into();
        assert!(matches!(error, ChatBridgeError::Io(_)));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_error = serde_json::from_str::<serde_json::Value>("{invalid json}").unwrap_err();
        let error: ChatBridgeError = json_error.into();
        assert!(matches!(error, ChatBridgeError::Serialization(_)));
    }

    #[test]
    fn test_yaml_error_conversion() {
        let yaml_error = serde_yaml::from_str::<serde_yaml::Value>("invalid: : yaml").unwrap_err();
        let error: ChatBridgeError = yaml_error.into();
        assert!(matches!(error, ChatBridgeError::Yaml(_)));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ChatBridgeError>();
    }
}

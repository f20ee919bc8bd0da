//! Record store error types.

use thiserror::Error;

/// Errors that can occur while talking to the record store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Authentication against the store failed.
    #[error("Auth failed: {0}")]
    Auth(String),

    /// Store configuration is incomplete or invalid.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The store answered with a non-success status.
    #[error("{message} (status {status})")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Message reported by the store.
        message: String,
    },

    /// Transport-level failure (connect, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(String),

    /// Failure injected by [`crate::MemoryStore`].
    #[error("{0}")]
    Injected(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Json(e.to_string())
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            StoreError::Json(e.to_string())
        } else {
            StoreError::Http(e.to_string())
        }
    }
}

/// Result type alias using StoreError.
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StoreError::Auth("invalid credentials".to_string());
        assert_eq!(err.to_string(), "Auth failed: invalid credentials");

        let err = StoreError::Api {
            status: 400,
            message: "Failed to create record.".to_string(),
        };
        assert_eq!(err.to_string(), "Failed to create record. (status 400)");
    }

    #[test]
    fn test_error_from_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let store_err: StoreError = json_err.into();
        assert!(matches!(store_err, StoreError::Json(_)));
    }
}

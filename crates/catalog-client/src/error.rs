//! Error types for the harvester.

use reqwest::StatusCode;

/// Errors that can occur while harvesting catalog metadata.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// HTTP transport error (connection, DNS, TLS, timeout, body read)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status returned by the upstream API
    #[error("HTTP {status} for {endpoint}: {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Endpoint path that was requested
        endpoint: String,
        /// Response body, or the canonical reason when the body is empty
        message: String,
    },

    /// Every attempt was answered with 429
    #[error("Max retries ({attempts}) exceeded for endpoint: {endpoint}")]
    MaxRetriesExceeded {
        /// Endpoint path that was requested
        endpoint: String,
        /// Number of attempts made
        attempts: u32,
    },

    /// Response body did not have the expected shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Qualified table name is not of the form `catalog.schema.table`
    #[error("Invalid table name '{0}': expected catalog.schema.table")]
    InvalidTableName(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ClientError {
    /// Returns true if this error is retryable.
    ///
    /// Only rate limiting is retried; every other failure is terminal for
    /// the fetch that produced it.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ClientError::Status { status, .. } if *status == StatusCode::TOO_MANY_REQUESTS.as_u16()
        )
    }
}

/// Result type for harvester operations.
pub type Result<T> = std::result::Result<T, ClientError>;

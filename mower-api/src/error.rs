//! Error types for mower-api

use thiserror::Error;

/// Result type for transport operations
pub type Result<T> = std::result::Result<T, ApiError>;

/// Errors that can occur while talking to the device
#[derive(Debug, Error)]
pub enum ApiError {
    /// Connection to the device or cloud could not be established
    #[error("device unreachable: {0}")]
    Unreachable(String),

    /// The request was sent but no response arrived in time
    #[error("request timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// The device answered with a malformed or unexpected payload
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The device rejected the request with a non-zero result code
    #[error("request rejected with code {0}")]
    Rejected(i32),

    /// Payload could not be encoded or decoded
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

//! Transport abstraction layer
//!
//! The engine only needs two single-shot request/response capabilities: fetch
//! a text resource and post a JSON body. Everything network specific lives
//! behind this trait.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Errors that can occur in the transport layer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid response body: {0}")]
    InvalidBody(String),

    #[error("Timeout: {0}")]
    Timeout(String),
}

/// Request/response capability used by the communicator.
///
/// Each call completes exactly once with either a value or an error.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    /// GET `url` and return the body as text.
    async fn fetch_text(&self, url: &str) -> Result<String, TransportError>;

    /// POST `body` as JSON to `url` and return the decoded JSON response.
    async fn post_json(&self, url: &str, body: Value) -> Result<Value, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_surfaces_body() {
        let err = TransportError::Status {
            status: 500,
            body: "Server Error".to_string(),
        };
        assert_eq!(err.to_string(), "Request failed with status 500: Server Error");
    }
}

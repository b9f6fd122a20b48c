// ABOUTME: Transport-level errors for control-plane requests.
// ABOUTME: Connection failures and timeouts; HTTP status codes are not errors here.

use std::time::Duration;

/// Errors raised before a status code is available.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("invalid base URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("failed to build request: {0}")]
    InvalidRequest(String),

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),
}

// ABOUTME: Portainer API error types with SNAFU pattern.
// ABOUTME: Separates transport failures from status, decode, and version-conflict errors.

use snafu::Snafu;

use crate::transport::TransportError;

/// Error from a typed Portainer API call.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ApiError {
    #[snafu(display("{endpoint}: {source}"))]
    Transport {
        endpoint: String,
        source: TransportError,
    },

    #[snafu(display("{endpoint}: unexpected status {status}: {message}"))]
    UnexpectedStatus {
        endpoint: String,
        status: u16,
        message: String,
    },

    #[snafu(display("{endpoint}: failed to decode response: {source}"))]
    Decode {
        endpoint: String,
        source: serde_json::Error,
    },

    #[snafu(display("{endpoint}: failed to encode request: {source}"))]
    Encode {
        endpoint: String,
        source: serde_json::Error,
    },

    #[snafu(display("{endpoint}: service version {version} is stale: {message}"))]
    VersionConflict {
        endpoint: String,
        version: u64,
        message: String,
    },
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// Connection failure or timeout; no response was received.
    Transport,
    /// Control plane answered with a non-2xx status.
    UnexpectedStatus,
    /// Response body did not match the expected shape.
    Decode,
    /// Request body could not be serialized.
    Encode,
    /// Optimistic-concurrency token was stale.
    VersionConflict,
}

impl ApiError {
    /// Returns the error kind for programmatic handling.
    pub fn kind(&self) -> ApiErrorKind {
        match self {
            ApiError::Transport { .. } => ApiErrorKind::Transport,
            ApiError::UnexpectedStatus { .. } => ApiErrorKind::UnexpectedStatus,
            ApiError::Decode { .. } => ApiErrorKind::Decode,
            ApiError::Encode { .. } => ApiErrorKind::Encode,
            ApiError::VersionConflict { .. } => ApiErrorKind::VersionConflict,
        }
    }

    /// HTTP status, when the control plane answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::UnexpectedStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether a poll loop may retry after this error. Transport failures and
    /// version conflicts abort; status and decode errors are transient.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind(),
            ApiErrorKind::UnexpectedStatus | ApiErrorKind::Decode
        )
    }
}

// ABOUTME: Error types for verification and rollout invocations.
// ABOUTME: Fatal conditions carry service, attempt, and last observation context.

use crate::api::ApiError;
use crate::types::{EnvironmentId, ParseImageRefError};

/// Errors that end a verification or rollout invocation.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The swarm probe failed, so the object model is unknown.
    #[error("cannot detect orchestration mode of environment {environment}: {source}")]
    Detection {
        environment: EnvironmentId,
        source: ApiError,
    },

    /// Control plane unreachable while polling.
    #[error("checking {service} failed on attempt {attempt}: {source}")]
    Unreachable {
        service: String,
        attempt: u32,
        source: ApiError,
    },

    /// Every attempt ran without the service converging.
    #[error(
        "{service} did not reach revision {revision} ({state}) after {attempts} attempt(s); last observation: {last_observation}"
    )]
    Exhausted {
        service: String,
        revision: String,
        state: String,
        attempts: u32,
        last_observation: String,
    },

    /// No swarm service carries the fully-qualified name.
    #[error("service {service} not found in environment {environment}")]
    ServiceNotFound {
        service: String,
        environment: EnvironmentId,
    },

    /// No stack with this name exists in the environment.
    #[error("stack {stack} not found in environment {environment}")]
    StackNotFound {
        stack: String,
        environment: EnvironmentId,
    },

    /// The running image has no repository to retag.
    #[error("service {service} runs unparseable image '{image}': {source}")]
    InvalidImage {
        service: String,
        image: String,
        source: ParseImageRefError,
    },

    /// The service changed between inspect and update.
    #[error("version conflict updating {service}: {source}")]
    VersionConflict { service: String, source: ApiError },

    /// A one-shot control plane call failed.
    #[error("{operation} failed: {source}")]
    Api { operation: String, source: ApiError },

    /// Nothing to verify or roll out.
    #[error("no services given")]
    NoServices,

    /// The cancellation token fired.
    #[error("operation cancelled")]
    Cancelled,
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineErrorKind {
    Detection,
    Unreachable,
    Exhausted,
    ServiceNotFound,
    StackNotFound,
    InvalidImage,
    VersionConflict,
    Api,
    NoServices,
    Cancelled,
}

impl EngineError {
    /// Returns the error kind for programmatic handling.
    pub fn kind(&self) -> EngineErrorKind {
        match self {
            EngineError::Detection { .. } => EngineErrorKind::Detection,
            EngineError::Unreachable { .. } => EngineErrorKind::Unreachable,
            EngineError::Exhausted { .. } => EngineErrorKind::Exhausted,
            EngineError::ServiceNotFound { .. } => EngineErrorKind::ServiceNotFound,
            EngineError::StackNotFound { .. } => EngineErrorKind::StackNotFound,
            EngineError::InvalidImage { .. } => EngineErrorKind::InvalidImage,
            EngineError::VersionConflict { .. } => EngineErrorKind::VersionConflict,
            EngineError::Api { .. } => EngineErrorKind::Api,
            EngineError::NoServices => EngineErrorKind::NoServices,
            EngineError::Cancelled => EngineErrorKind::Cancelled,
        }
    }

    /// Name of the service the failure belongs to, if any.
    pub fn service(&self) -> Option<&str> {
        match self {
            EngineError::Unreachable { service, .. }
            | EngineError::Exhausted { service, .. }
            | EngineError::ServiceNotFound { service, .. }
            | EngineError::InvalidImage { service, .. }
            | EngineError::VersionConflict { service, .. } => Some(service),
            _ => None,
        }
    }
}

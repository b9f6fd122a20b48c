// ABOUTME: Orchestration mode detection from a single swarm probe.
// ABOUTME: Swarm when the probe answers 200 with a cluster ID, standalone otherwise.

use serde::Serialize;
use std::fmt;

use super::{Clock, Engine, EngineError};
use crate::api::SwarmOps;
use crate::types::EnvironmentId;

/// Object model exposed by an environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OrchestrationMode {
    /// Docker Swarm: services with replica tasks.
    Swarm,
    /// Single Docker daemon: plain containers.
    Standalone,
}

impl fmt::Display for OrchestrationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrchestrationMode::Swarm => write!(f, "swarm"),
            OrchestrationMode::Standalone => write!(f, "standalone"),
        }
    }
}

impl<R: SwarmOps, C: Clock> Engine<R, C> {
    /// Probe `environment` once and classify it.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Detection` if the probe cannot be sent or a 200
    /// body does not decode, and `EngineError::Cancelled` if cancelled.
    pub async fn detect_mode(
        &self,
        environment: EnvironmentId,
    ) -> Result<OrchestrationMode, EngineError> {
        self.checkpoint()?;
        let info = self
            .api
            .inspect_swarm(environment)
            .await
            .map_err(|source| EngineError::Detection {
                environment,
                source,
            })?;

        let mode = match info {
            Some(info) if !info.id.trim().is_empty() => OrchestrationMode::Swarm,
            _ => OrchestrationMode::Standalone,
        };
        tracing::debug!(%environment, %mode, "orchestration mode detected");
        Ok(mode)
    }
}

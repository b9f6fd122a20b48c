// ABOUTME: Swarm operations for a Portainer environment.
// ABOUTME: Swarm probe, task and service listing, versioned service update, force update.

use super::sealed::Sealed;
use crate::api::ApiError;
use crate::api::filters::{ServiceFilters, TaskFilters};
use crate::api::models::{Service, ServiceSpec, SwarmInfo, Task};
use crate::types::{EnvironmentId, ServiceId};
use async_trait::async_trait;

/// Swarm cluster operations.
#[async_trait]
pub trait SwarmOps: Sealed + Send + Sync {
    /// Inspect the swarm. Returns `None` when the daemon answers with any
    /// non-200 status, which is how a node outside a swarm responds.
    async fn inspect_swarm(
        &self,
        environment: EnvironmentId,
    ) -> Result<Option<SwarmInfo>, ApiError>;

    /// List tasks matching the given filters.
    async fn list_tasks(
        &self,
        environment: EnvironmentId,
        filters: &TaskFilters,
    ) -> Result<Vec<Task>, ApiError>;

    /// List services matching the given filters.
    async fn list_services(
        &self,
        environment: EnvironmentId,
        filters: &ServiceFilters,
    ) -> Result<Vec<Service>, ApiError>;

    /// Get a service with its current spec and version.
    async fn inspect_service(
        &self,
        environment: EnvironmentId,
        id: &ServiceId,
    ) -> Result<Service, ApiError>;

    /// Replace a service spec. `version` must be the index just read;
    /// a stale index fails with `ApiError::VersionConflict`.
    /// Returns any warnings the daemon attached to the update.
    async fn update_service(
        &self,
        environment: EnvironmentId,
        id: &ServiceId,
        version: u64,
        spec: &ServiceSpec,
    ) -> Result<Vec<String>, ApiError>;

    /// Force-restart every task of a service, optionally re-pulling its image.
    async fn force_update_service(
        &self,
        environment: EnvironmentId,
        id: &ServiceId,
        pull_image: bool,
    ) -> Result<(), ApiError>;
}

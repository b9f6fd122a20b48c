// ABOUTME: Standalone container listing for a Portainer environment.
// ABOUTME: Used when the environment is a plain Docker daemon.

use super::sealed::Sealed;
use crate::api::ApiError;
use crate::api::models::Container;
use crate::types::EnvironmentId;
use async_trait::async_trait;

/// Container queries.
#[async_trait]
pub trait ContainerOps: Sealed + Send + Sync {
    /// List containers, including stopped ones when `all` is set.
    async fn list_containers(
        &self,
        environment: EnvironmentId,
        all: bool,
    ) -> Result<Vec<Container>, ApiError>;
}

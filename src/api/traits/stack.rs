// ABOUTME: Portainer stack operations.
// ABOUTME: List stacks, read stack file content, and redeploy with new environment.

use super::sealed::Sealed;
use crate::api::ApiError;
use crate::api::models::{Stack, StackFile, StackUpdate};
use crate::types::{EnvironmentId, StackId};
use async_trait::async_trait;

/// Stack definition operations.
#[async_trait]
pub trait StackOps: Sealed + Send + Sync {
    /// List stacks deployed to an environment.
    async fn list_stacks(&self, environment: EnvironmentId) -> Result<Vec<Stack>, ApiError>;

    /// Get the compose file content of a stack.
    async fn stack_file(&self, id: StackId) -> Result<StackFile, ApiError>;

    /// Redeploy a stack with new file content and environment.
    async fn update_stack(
        &self,
        id: StackId,
        environment: EnvironmentId,
        update: &StackUpdate,
    ) -> Result<(), ApiError>;
}

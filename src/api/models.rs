// ABOUTME: Typed payloads for the Docker and Portainer endpoints the engine uses.
// ABOUTME: Service specs keep unknown fields so updates round-trip them unchanged.

use crate::types::{ContainerId, EnvironmentId, NodeId, ServiceId, StackId, TaskId};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Docker reports some empty lists and maps as `null`.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// `GET /docker/swarm` body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SwarmInfo {
    #[serde(rename = "ID", default)]
    pub id: String,
}

/// Swarm task as returned by `GET /docker/tasks`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Task {
    #[serde(rename = "ID", default)]
    pub id: TaskId,
    #[serde(rename = "ServiceID", default)]
    pub service_id: ServiceId,
    #[serde(rename = "NodeID", default)]
    pub node_id: NodeId,
    #[serde(default)]
    pub desired_state: String,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub spec: TaskTemplate,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TaskStatus {
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub container_status: Option<TaskContainerStatus>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskContainerStatus {
    #[serde(rename = "ContainerID", default)]
    pub container_id: Option<ContainerId>,
}

/// Container as returned by `GET /docker/containers/json`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Container {
    #[serde(rename = "Id", default)]
    pub id: ContainerId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub names: Vec<String>,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub status: String,
}

impl Container {
    /// Primary name without Docker's leading slash.
    pub fn name(&self) -> &str {
        self.names
            .first()
            .map(|n| n.trim_start_matches('/'))
            .unwrap_or_default()
    }
}

/// Swarm service as returned by `GET /docker/services`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Service {
    #[serde(rename = "ID", default)]
    pub id: ServiceId,
    #[serde(default)]
    pub version: ObjectVersion,
    #[serde(default)]
    pub spec: ServiceSpec,
}

/// Optimistic-concurrency token echoed back on update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ObjectVersion {
    #[serde(default)]
    pub index: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServiceSpec {
    #[serde(default)]
    pub name: String,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub task_template: TaskTemplate,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TaskTemplate {
    #[serde(default)]
    pub container_spec: ContainerSpec,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerSpec {
    #[serde(default)]
    pub image: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `POST /docker/services/{id}/update` body.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServiceUpdateResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub warnings: Vec<String>,
}

/// Portainer's `PUT /docker/{env}/forceupdateservice` payload.
#[derive(Debug, Clone, Serialize)]
pub struct ForceUpdateRequest {
    #[serde(rename = "serviceID")]
    pub service_id: ServiceId,
    #[serde(rename = "pullImage")]
    pub pull_image: bool,
}

/// Portainer stack as returned by `GET /api/stacks`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Stack {
    #[serde(rename = "Id")]
    pub id: StackId,
    pub name: String,
    #[serde(rename = "EndpointId")]
    pub endpoint_id: EnvironmentId,
    #[serde(rename = "Type", default)]
    pub stack_type: u8,
    #[serde(default, deserialize_with = "null_as_default")]
    pub env: Vec<EnvVar>,
}

/// Stack environment variable as Portainer stores it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvVar {
    pub name: String,
    pub value: String,
}

impl EnvVar {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// `GET /api/stacks/{id}/file` body.
#[derive(Debug, Clone, Deserialize)]
pub struct StackFile {
    #[serde(rename = "StackFileContent")]
    pub content: String,
}

/// `PUT /api/stacks/{id}` payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StackUpdate {
    pub stack_file_content: String,
    pub env: Vec<EnvVar>,
    pub prune: bool,
    pub pull_image: bool,
}

/// Error body shared by Docker (`message`) and Portainer (`message`, `details`).
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
}

// ABOUTME: Portainer API client implementing the control-plane capability traits.
// ABOUTME: Builds endpoint paths, checks status codes, and decodes typed payloads.

use crate::api::error::{
    ApiError, DecodeSnafu, EncodeSnafu, TransportSnafu, UnexpectedStatusSnafu,
    VersionConflictSnafu,
};
use crate::api::filters::{ServiceFilters, TaskFilters, stack_filter_query};
use crate::api::models::{
    Container, ErrorBody, ForceUpdateRequest, Service, ServiceSpec, ServiceUpdateResponse, Stack,
    StackFile, StackUpdate, SwarmInfo, Task,
};
use crate::api::traits::sealed::Sealed;
use crate::api::traits::{ContainerOps, StackOps, SwarmOps};
use crate::transport::{ApiRequest, ApiResponse, Transport};
use crate::types::{EnvironmentId, ServiceId, StackId};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use snafu::ResultExt;

/// Longest raw body excerpt kept in an error message.
const MAX_ERROR_BODY: usize = 200;

/// Typed client over any [`Transport`].
pub struct PortainerClient<T> {
    transport: T,
}

impl<T: Transport> PortainerClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let endpoint = request.to_string();
        self.transport
            .send(request)
            .await
            .context(TransportSnafu { endpoint })
    }

    async fn get_json<D: DeserializeOwned>(&self, request: ApiRequest) -> Result<D, ApiError> {
        let endpoint = request.to_string();
        let response = self.send(request).await?;
        ensure_success(&endpoint, &response)?;
        serde_json::from_slice(&response.body).context(DecodeSnafu { endpoint })
    }
}

fn docker_path(environment: EnvironmentId, rest: &str) -> String {
    format!("/api/endpoints/{}/docker{}", environment, rest)
}

fn ensure_success(endpoint: &str, response: &ApiResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }

    UnexpectedStatusSnafu {
        endpoint,
        status: response.status,
        message: error_message(&response.body),
    }
    .fail()
}

/// Human-readable message from a Docker or Portainer error body.
fn error_message(body: &[u8]) -> String {
    if let Ok(parsed) = serde_json::from_slice::<ErrorBody>(body) {
        match (parsed.message, parsed.details) {
            (Some(message), Some(details)) if !details.is_empty() => {
                return format!("{}: {}", message, details);
            }
            (Some(message), _) => return message,
            (None, Some(details)) => return details,
            (None, None) => {}
        }
    }

    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if text.is_empty() {
        return "empty response body".to_string();
    }
    match text.char_indices().nth(MAX_ERROR_BODY) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

impl<T> Sealed for PortainerClient<T> {}

#[async_trait]
impl<T: Transport> SwarmOps for PortainerClient<T> {
    async fn inspect_swarm(
        &self,
        environment: EnvironmentId,
    ) -> Result<Option<SwarmInfo>, ApiError> {
        let request = ApiRequest::get(docker_path(environment, "/swarm"));
        let endpoint = request.to_string();
        let response = self.send(request).await?;

        if response.status != 200 {
            tracing::debug!(status = response.status, "swarm inspect declined");
            return Ok(None);
        }

        serde_json::from_slice(&response.body)
            .map(Some)
            .context(DecodeSnafu { endpoint })
    }

    async fn list_tasks(
        &self,
        environment: EnvironmentId,
        filters: &TaskFilters,
    ) -> Result<Vec<Task>, ApiError> {
        let request =
            ApiRequest::get(docker_path(environment, "/tasks")).query("filters", filters.to_query());
        self.get_json(request).await
    }

    async fn list_services(
        &self,
        environment: EnvironmentId,
        filters: &ServiceFilters,
    ) -> Result<Vec<Service>, ApiError> {
        let request = ApiRequest::get(docker_path(environment, "/services"))
            .query("filters", filters.to_query());
        self.get_json(request).await
    }

    async fn inspect_service(
        &self,
        environment: EnvironmentId,
        id: &ServiceId,
    ) -> Result<Service, ApiError> {
        let request = ApiRequest::get(docker_path(environment, &format!("/services/{}", id)));
        self.get_json(request).await
    }

    async fn update_service(
        &self,
        environment: EnvironmentId,
        id: &ServiceId,
        version: u64,
        spec: &ServiceSpec,
    ) -> Result<Vec<String>, ApiError> {
        let path = docker_path(environment, &format!("/services/{}/update", id));
        let request = ApiRequest::post(path.clone())
            .query("version", version.to_string())
            .json(spec)
            .context(EncodeSnafu {
                endpoint: path.as_str(),
            })?;
        let endpoint = request.to_string();
        let response = self.send(request).await?;

        if !response.is_success() {
            let message = error_message(&response.body);
            if response.status == 409 || message.contains("out of sequence") {
                return VersionConflictSnafu {
                    endpoint,
                    version,
                    message,
                }
                .fail();
            }
            return UnexpectedStatusSnafu {
                endpoint,
                status: response.status,
                message,
            }
            .fail();
        }

        if response.body.is_empty() {
            return Ok(Vec::new());
        }
        match serde_json::from_slice::<ServiceUpdateResponse>(&response.body) {
            Ok(parsed) => Ok(parsed.warnings),
            Err(e) => {
                tracing::debug!("ignoring undecodable service update body: {}", e);
                Ok(Vec::new())
            }
        }
    }

    async fn force_update_service(
        &self,
        environment: EnvironmentId,
        id: &ServiceId,
        pull_image: bool,
    ) -> Result<(), ApiError> {
        let path = format!("/api/docker/{}/forceupdateservice", environment);
        let body = ForceUpdateRequest {
            service_id: id.clone(),
            pull_image,
        };
        let request = ApiRequest::put(path.clone())
            .json(&body)
            .context(EncodeSnafu {
                endpoint: path.as_str(),
            })?;
        let endpoint = request.to_string();
        let response = self.send(request).await?;
        ensure_success(&endpoint, &response)
    }
}

#[async_trait]
impl<T: Transport> ContainerOps for PortainerClient<T> {
    async fn list_containers(
        &self,
        environment: EnvironmentId,
        all: bool,
    ) -> Result<Vec<Container>, ApiError> {
        let request = ApiRequest::get(docker_path(environment, "/containers/json"))
            .query("all", if all { "1" } else { "0" });
        self.get_json(request).await
    }
}

#[async_trait]
impl<T: Transport> StackOps for PortainerClient<T> {
    async fn list_stacks(&self, environment: EnvironmentId) -> Result<Vec<Stack>, ApiError> {
        let request = ApiRequest::get("/api/stacks").query("filters", stack_filter_query(environment));
        let stacks: Vec<Stack> = self.get_json(request).await?;
        // Older Portainer releases ignore the filter
        Ok(stacks
            .into_iter()
            .filter(|s| s.endpoint_id == environment)
            .collect())
    }

    async fn stack_file(&self, id: StackId) -> Result<StackFile, ApiError> {
        let request = ApiRequest::get(format!("/api/stacks/{}/file", id));
        self.get_json(request).await
    }

    async fn update_stack(
        &self,
        id: StackId,
        environment: EnvironmentId,
        update: &StackUpdate,
    ) -> Result<(), ApiError> {
        let path = format!("/api/stacks/{}", id);
        let request = ApiRequest::put(path.clone())
            .query("endpointId", environment.to_string())
            .json(update)
            .context(EncodeSnafu {
                endpoint: path.as_str(),
            })?;
        let endpoint = request.to_string();
        let response = self.send(request).await?;
        ensure_success(&endpoint, &response)
    }
}

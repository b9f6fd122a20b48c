// ABOUTME: Docker and Portainer list filters encoded as the JSON `filters` query value.
// ABOUTME: Task, service, and stack filters used by the resolver and rollout.

use crate::types::EnvironmentId;
use std::collections::BTreeMap;

/// Filters for `GET /docker/tasks`.
#[derive(Debug, Clone, Default)]
pub struct TaskFilters {
    /// Service name or ID.
    pub service: Option<String>,
    /// Desired state (`running`, `shutdown`, `accepted`).
    pub desired_state: Option<String>,
}

impl TaskFilters {
    /// Tasks of `service` whose desired state is `desired_state`.
    pub fn for_service(service: &str, desired_state: &str) -> Self {
        Self {
            service: Some(service.to_string()),
            desired_state: Some(desired_state.to_lowercase()),
        }
    }

    pub fn to_query(&self) -> String {
        let mut filters: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        if let Some(service) = self.service.as_deref() {
            filters.insert("service", vec![service]);
        }
        if let Some(state) = self.desired_state.as_deref() {
            filters.insert("desired-state", vec![state]);
        }
        encode(&filters)
    }
}

/// Filters for `GET /docker/services`. Docker matches `name` by prefix, so
/// callers still compare names exactly.
#[derive(Debug, Clone, Default)]
pub struct ServiceFilters {
    pub name: Option<String>,
}

impl ServiceFilters {
    pub fn by_name(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
        }
    }

    pub fn to_query(&self) -> String {
        let mut filters: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        if let Some(name) = self.name.as_deref() {
            filters.insert("name", vec![name]);
        }
        encode(&filters)
    }
}

/// Portainer's stack list filter.
pub fn stack_filter_query(environment: EnvironmentId) -> String {
    serde_json::json!({ "EndpointID": environment.get() }).to_string()
}

fn encode(filters: &BTreeMap<&str, Vec<&str>>) -> String {
    serde_json::to_string(filters).unwrap_or_else(|_| "{}".to_string())
}

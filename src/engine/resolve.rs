// ABOUTME: Resolves a logical service to its runtime targets.
// ABOUTME: Swarm lists filtered tasks; standalone matches container names client-side.

use std::collections::BTreeSet;
use std::fmt;

use super::{Clock, Engine, OrchestrationMode};
use crate::api::models::{Container, Task};
use crate::api::{ApiError, ContainerOps, SwarmOps, TaskFilters};
use crate::types::{
    ContainerId, EnvironmentId, NodeId, ServiceSpec, TaskId, image_tag, normalize_name,
};

/// Where a runtime target came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetOrigin {
    Task { id: TaskId, node_id: NodeId },
    Container { id: ContainerId, name: String },
}

/// A running (or not) instance of a service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeTarget {
    pub origin: TargetOrigin,
    pub image: String,
    pub state: String,
}

impl RuntimeTarget {
    /// Tag of the running image, if it has one.
    pub fn tag(&self) -> Option<String> {
        image_tag(&self.image)
    }
}

impl From<Task> for RuntimeTarget {
    fn from(task: Task) -> Self {
        Self {
            origin: TargetOrigin::Task {
                id: task.id,
                node_id: task.node_id,
            },
            image: task.spec.container_spec.image,
            state: task.status.state,
        }
    }
}

impl From<Container> for RuntimeTarget {
    fn from(container: Container) -> Self {
        let name = container.name().to_string();
        Self {
            origin: TargetOrigin::Container {
                id: container.id,
                name,
            },
            image: container.image,
            state: container.state,
        }
    }
}

impl fmt::Display for RuntimeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.origin {
            TargetOrigin::Task { id, node_id } => write!(
                f,
                "task {} on node {} runs {} ({})",
                id.short(),
                node_id.short(),
                self.image,
                self.state
            ),
            TargetOrigin::Container { name, .. } => {
                write!(f, "container {} runs {} ({})", name, self.image, self.state)
            }
        }
    }
}

/// Result of one resolution attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// One or more targets to compare.
    Resolved(Vec<RuntimeTarget>),
    /// Nothing carries the service's name yet.
    Unresolved,
    /// Several standalone containers claim the name.
    Ambiguous(Vec<String>),
}

/// Name of the service instance `name` belongs to, if any.
///
/// The qualified name must start a word (nothing alphanumeric before it) and
/// be followed by nothing or a `_<n>` replica suffix, so `eshop_web_1` and
/// `shop_webhook_1` are not instances of `shop_web`.
fn instance_of(name: &str, needle: &str) -> Option<String> {
    let name = normalize_name(name);
    name.match_indices(needle).find_map(|(start, _)| {
        let starts_word = !name[..start]
            .chars()
            .next_back()
            .is_some_and(|c| c.is_ascii_alphanumeric());
        let end = start + needle.len();
        let rest = &name[end..];
        let replica_suffix = rest.is_empty()
            || rest
                .strip_prefix('_')
                .is_some_and(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()));
        (starts_word && replica_suffix).then(|| name[..end].to_string())
    })
}

/// Resolve the containers of one service instance.
///
/// Replicas (`shop_web_1`, `shop_web_2`) resolve together and are all
/// compared. Containers of two different instances carrying the name, such
/// as `shop_web_1` and `other_shop_web_1`, are ambiguous.
pub fn resolve_container(containers: Vec<Container>, service: &ServiceSpec) -> Resolution {
    let needle = service.normalized();
    let candidates: Vec<(String, Container)> = containers
        .into_iter()
        .filter_map(|c| instance_of(c.name(), &needle).map(|instance| (instance, c)))
        .collect();

    let instances = candidates
        .iter()
        .map(|(instance, _)| instance.as_str())
        .collect::<BTreeSet<_>>()
        .len();
    match instances {
        0 => Resolution::Unresolved,
        1 => Resolution::Resolved(
            candidates
                .into_iter()
                .map(|(_, c)| RuntimeTarget::from(c))
                .collect(),
        ),
        _ => Resolution::Ambiguous(
            candidates
                .iter()
                .map(|(_, c)| c.name().to_string())
                .collect(),
        ),
    }
}

impl<R: SwarmOps + ContainerOps, C: Clock> Engine<R, C> {
    /// Fetch the runtime targets of `service` using the endpoints of `mode`.
    pub(crate) async fn resolve(
        &self,
        mode: OrchestrationMode,
        environment: EnvironmentId,
        service: &ServiceSpec,
        desired_state: &str,
    ) -> Result<Resolution, ApiError> {
        match mode {
            OrchestrationMode::Swarm => {
                let filters = TaskFilters::for_service(&service.qualified(), desired_state);
                let tasks = self.api.list_tasks(environment, &filters).await?;
                if tasks.is_empty() {
                    return Ok(Resolution::Unresolved);
                }
                Ok(Resolution::Resolved(
                    tasks.into_iter().map(RuntimeTarget::from).collect(),
                ))
            }
            OrchestrationMode::Standalone => {
                let containers = self.api.list_containers(environment, true).await?;
                Ok(resolve_container(containers, service))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ServiceName, StackName};

    fn container(name: &str, image: &str) -> Container {
        Container {
            id: ContainerId::new(format!("id-{}", name)),
            names: vec![format!("/{}", name)],
            image: image.to_string(),
            state: "running".to_string(),
            status: String::new(),
        }
    }

    fn spec(stack: &str, service: &str) -> ServiceSpec {
        ServiceSpec::new(
            StackName::new(stack).unwrap(),
            ServiceName::new(service).unwrap(),
        )
    }

    #[test]
    fn single_match_resolves() {
        let containers = vec![
            container("shop_web_1", "app:1.4.0"),
            container("shop_worker_1", "app:1.4.0"),
        ];

        let Resolution::Resolved(targets) = resolve_container(containers, &spec("shop", "web"))
        else {
            panic!("expected a resolved target");
        };
        assert_eq!(targets.len(), 1);
        assert_eq!(
            targets[0].origin,
            TargetOrigin::Container {
                id: ContainerId::new("id-shop_web_1"),
                name: "shop_web_1".to_string(),
            }
        );
    }

    #[test]
    fn compose_v2_hyphens_are_normalized() {
        let containers = vec![container("shop-web-1", "app:1.4.0")];
        assert!(matches!(
            resolve_container(containers, &spec("shop", "web")),
            Resolution::Resolved(_)
        ));
    }

    #[test]
    fn hyphenated_stack_matches_underscored_container() {
        let containers = vec![container("my_shop_web_1", "app:1.4.0")];
        assert!(matches!(
            resolve_container(containers, &spec("my-shop", "web")),
            Resolution::Resolved(_)
        ));
    }

    #[test]
    fn no_match_is_unresolved() {
        let containers = vec![container("shop_web_1", "app:1.4.0")];
        assert_eq!(
            resolve_container(containers, &spec("shop", "api")),
            Resolution::Unresolved
        );
    }

    #[test]
    fn replicas_resolve_together() {
        let containers = vec![
            container("shop_web_1", "app:1.4.0"),
            container("shop_web_2", "app:1.3.0"),
        ];
        let Resolution::Resolved(targets) = resolve_container(containers, &spec("shop", "web"))
        else {
            panic!("expected resolved replicas");
        };
        assert_eq!(targets.len(), 2);
    }

    #[test]
    fn unsuffixed_container_name_resolves() {
        let containers = vec![container("shop_web", "app:1.4.0")];
        assert!(matches!(
            resolve_container(containers, &spec("shop", "web")),
            Resolution::Resolved(targets) if targets.len() == 1
        ));
    }

    #[test]
    fn neighbour_project_is_not_a_match() {
        let containers = vec![
            container("shop_web_1", "app:1.4.0"),
            container("eshop_web_1", "other:9.9.9"),
        ];
        let Resolution::Resolved(targets) = resolve_container(containers, &spec("shop", "web"))
        else {
            panic!("expected a resolved target");
        };
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].image, "app:1.4.0");
    }

    #[test]
    fn prefix_sibling_service_is_not_a_match() {
        let containers = vec![
            container("shop_webhook_1", "hooks:0.1.0"),
            container("shop_web_1", "app:1.4.0"),
        ];
        let Resolution::Resolved(targets) = resolve_container(containers, &spec("shop", "web"))
        else {
            panic!("expected a resolved target");
        };
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].image, "app:1.4.0");
    }

    #[test]
    fn non_numeric_suffix_is_not_a_replica() {
        let containers = vec![container("shop_web_old", "app:1.3.0")];
        assert_eq!(
            resolve_container(containers, &spec("shop", "web")),
            Resolution::Unresolved
        );
    }

    #[test]
    fn two_instances_are_ambiguous() {
        let containers = vec![
            container("shop_web_1", "app:1.4.0"),
            container("legacy_shop_web_1", "app:1.3.0"),
        ];
        assert_eq!(
            resolve_container(containers, &spec("shop", "web")),
            Resolution::Ambiguous(vec![
                "shop_web_1".to_string(),
                "legacy_shop_web_1".to_string()
            ])
        );
    }

    #[test]
    fn target_display_names_the_container() {
        let target = RuntimeTarget::from(container("shop_web_1", "app:1.4.0"));
        assert_eq!(target.to_string(), "container shop_web_1 runs app:1.4.0 (running)");
    }
}

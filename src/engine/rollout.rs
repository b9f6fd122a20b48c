// ABOUTME: Rollout of a new revision to swarm services and the stack environment.
// ABOUTME: Each service update moves Inspected -> Submitted; stale versions are fatal.

use super::{
    Clock, Engine, EngineError, Failed, OrchestrationMode, RolloutOutcome, RolloutPlan,
    RolloutResult, ServiceAction, ServiceRollout,
};
use crate::api::models::{Service, ServiceSpec as SwarmServiceSpec};
use crate::api::{ApiErrorKind, ContainerOps, ServiceFilters, StackOps, SwarmOps};
use crate::transcript::Transcript;
use crate::types::{EnvironmentId, ImageRef, ServiceId, ServiceName, ServiceSpec, StackName};

/// Label Docker stack deploy uses to record a service's image.
pub const STACK_IMAGE_LABEL: &str = "com.docker.stack.image";

/// Copy of `spec` running `image`, with the stack image label kept in step.
/// Every other field is carried over untouched.
pub fn retag_spec(spec: &SwarmServiceSpec, image: &ImageRef) -> SwarmServiceSpec {
    let mut spec = spec.clone();
    spec.task_template.container_spec.image = image.to_string();
    spec.labels
        .insert(STACK_IMAGE_LABEL.to_string(), image.to_string());
    spec
}

// =============================================================================
// Service update states
// =============================================================================

/// Service read back with its version token and parsed image.
#[derive(Debug)]
pub struct Inspected {
    service: Service,
    current: ImageRef,
}

/// Update accepted by the control plane.
#[derive(Debug)]
pub struct Submitted {
    from: ImageRef,
    to: ImageRef,
}

/// One service's update, parameterized by how far it got.
#[derive(Debug)]
pub struct ServiceUpdate<S> {
    name: String,
    id: ServiceId,
    state: S,
}

impl<S> ServiceUpdate<S> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> &ServiceId {
        &self.id
    }
}

impl ServiceUpdate<Inspected> {
    /// Start from an inspected service.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::InvalidImage` if the running image does not parse.
    pub fn new(name: String, service: Service) -> Result<Self, EngineError> {
        let image = &service.spec.task_template.container_spec.image;
        let current = ImageRef::parse(image).map_err(|source| EngineError::InvalidImage {
            service: name.clone(),
            image: image.clone(),
            source,
        })?;

        Ok(Self {
            name,
            id: service.id.clone(),
            state: Inspected { service, current },
        })
    }

    pub fn current(&self) -> &ImageRef {
        &self.state.current
    }

    pub fn version(&self) -> u64 {
        self.state.service.version.index
    }

    /// Whether the running tag already equals `revision`.
    pub fn is_at(&self, revision: &str) -> bool {
        self.state.current.tag() == Some(revision)
    }

    /// Submit the retagged spec with the version token read at inspect time.
    ///
    /// Returns the submitted update and any warnings the daemon attached.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::VersionConflict` if the service changed since it
    /// was inspected, `EngineError::Api` for any other failure.
    pub async fn submit<R: SwarmOps>(
        self,
        api: &R,
        environment: EnvironmentId,
        revision: &str,
    ) -> Result<(ServiceUpdate<Submitted>, Vec<String>), EngineError> {
        let target = self.state.current.with_tag(revision);
        let spec = retag_spec(&self.state.service.spec, &target);
        let version = self.version();

        let warnings = api
            .update_service(environment, &self.id, version, &spec)
            .await
            .map_err(|source| match source.kind() {
                ApiErrorKind::VersionConflict => EngineError::VersionConflict {
                    service: self.name.clone(),
                    source,
                },
                _ => EngineError::Api {
                    operation: format!("updating service {}", self.name),
                    source,
                },
            })?;

        let submitted = ServiceUpdate {
            name: self.name,
            id: self.id,
            state: Submitted {
                from: self.state.current,
                to: target,
            },
        };
        Ok((submitted, warnings))
    }
}

impl ServiceUpdate<Submitted> {
    pub fn previous(&self) -> &ImageRef {
        &self.state.from
    }

    pub fn to(&self) -> &ImageRef {
        &self.state.to
    }

    pub fn into_action(self, force_restarted: bool) -> ServiceAction {
        ServiceAction::Updated {
            from: self.state.from.to_string(),
            to: self.state.to.to_string(),
            force_restarted,
        }
    }
}

// =============================================================================
// Engine entry point
// =============================================================================

impl<R: SwarmOps + ContainerOps + StackOps, C: Clock> Engine<R, C> {
    /// Roll `plan`'s revision out to `services` of `stack`.
    ///
    /// Swarm services are retagged one by one. Standalone environments only
    /// get the stack environment update. Services already at the revision are
    /// skipped without any mutating call.
    pub async fn rollout_revision(
        &self,
        environment: EnvironmentId,
        stack: &StackName,
        services: &[ServiceName],
        plan: &RolloutPlan,
    ) -> RolloutResult {
        let mut outcome = RolloutOutcome::default();
        match self
            .run_rollout(environment, stack, services, plan, &mut outcome)
            .await
        {
            Ok(()) => Ok(outcome),
            Err(error) => Err(Failed { outcome, error }),
        }
    }

    async fn run_rollout(
        &self,
        environment: EnvironmentId,
        stack: &StackName,
        services: &[ServiceName],
        plan: &RolloutPlan,
        outcome: &mut RolloutOutcome,
    ) -> Result<(), EngineError> {
        if services.is_empty() {
            return Err(EngineError::NoServices);
        }

        let mode = self.detect_mode(environment).await?;
        outcome.mode = Some(mode);
        outcome.transcript.record(format!(
            "rolling out revision {} to environment {} ({})",
            plan.new_revision(),
            environment,
            mode
        ));

        match mode {
            OrchestrationMode::Swarm => {
                for name in services {
                    let service = ServiceSpec::new(stack.clone(), name.clone());
                    let action = self
                        .roll_service(environment, &service, plan, &mut outcome.transcript)
                        .await?;
                    outcome.services.push(ServiceRollout {
                        service: service.qualified(),
                        action,
                    });
                }
            }
            OrchestrationMode::Standalone => {
                for name in services {
                    let service = ServiceSpec::new(stack.clone(), name.clone());
                    outcome.transcript.record(format!(
                        "{}: standalone containers are redeployed through the stack, service update not applicable",
                        service
                    ));
                    outcome.services.push(ServiceRollout {
                        service: service.qualified(),
                        action: ServiceAction::NotApplicable,
                    });
                }
                if !plan.updates_stack_env() {
                    outcome.transcript.warn(
                        "no stack environment variable to update; standalone rollout changed nothing",
                    );
                }
            }
        }

        if let Some(var) = plan.stack_env_var() {
            let action = self
                .update_stack_env(
                    environment,
                    stack,
                    var,
                    plan.new_revision(),
                    &mut outcome.transcript,
                )
                .await?;
            outcome.stack_env = Some(action);
        }

        Ok(())
    }

    async fn roll_service(
        &self,
        environment: EnvironmentId,
        service: &ServiceSpec,
        plan: &RolloutPlan,
        transcript: &mut Transcript,
    ) -> Result<ServiceAction, EngineError> {
        let name = service.qualified();

        self.checkpoint()?;
        let found = self
            .api
            .list_services(environment, &ServiceFilters::by_name(&name))
            .await
            .map_err(|source| EngineError::Api {
                operation: format!("looking up service {}", name),
                source,
            })?
            .into_iter()
            .find(|s| s.spec.name == name)
            .ok_or_else(|| EngineError::ServiceNotFound {
                service: name.clone(),
                environment,
            })?;

        self.checkpoint()?;
        let inspected = self
            .api
            .inspect_service(environment, &found.id)
            .await
            .map_err(|source| EngineError::Api {
                operation: format!("inspecting service {}", name),
                source,
            })?;
        let update = ServiceUpdate::new(name, inspected)?;

        if update.is_at(plan.new_revision()) {
            transcript.record(format!(
                "{}: already at revision {}, skipping",
                update.name(),
                plan.new_revision()
            ));
            return Ok(ServiceAction::AlreadyAtRevision);
        }

        transcript.record(format!(
            "{}: updating {} to revision {} (version {})",
            update.name(),
            update.current(),
            plan.new_revision(),
            update.version()
        ));
        self.checkpoint()?;
        let (submitted, warnings) = update
            .submit(&self.api, environment, plan.new_revision())
            .await?;
        for warning in warnings {
            transcript.warn(format!("{}: {}", submitted.name(), warning));
        }
        transcript.record(format!("{}: now {}", submitted.name(), submitted.to()));

        let mut force_restarted = false;
        if plan.forces_restart() {
            if !plan.force_restart_wait().is_zero() {
                transcript.record(format!(
                    "{}: waiting {} before force restart",
                    submitted.name(),
                    humantime::format_duration(plan.force_restart_wait())
                ));
                self.sleep(plan.force_restart_wait()).await?;
            }
            self.checkpoint()?;
            match self
                .api
                .force_update_service(environment, submitted.id(), true)
                .await
            {
                Ok(()) => {
                    transcript.record(format!("{}: force restart requested", submitted.name()));
                    force_restarted = true;
                }
                Err(e) => {
                    transcript.warn(format!("{}: force restart failed: {}", submitted.name(), e));
                }
            }
        }

        Ok(submitted.into_action(force_restarted))
    }
}

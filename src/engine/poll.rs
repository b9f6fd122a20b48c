// ABOUTME: Bounded poll loop that verifies services reached a revision.
// ABOUTME: Services run in order; the first exhausted service ends the run.

use std::fmt;

use super::matcher::{all_match, first_mismatch, matches};
use super::resolve::Resolution;
use super::{
    CheckOutcome, Clock, Engine, EngineError, Failed, OrchestrationMode, RevisionCheck,
    ServiceVerdict, VerifyResult,
};
use crate::api::{ContainerOps, SwarmOps};
use crate::types::{EnvironmentId, ServiceName, ServiceSpec, StackName};

/// Poll state of one service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollState {
    Pending,
    Checking { attempt: u32 },
    Satisfied { attempts: u32 },
    Exhausted { attempts: u32, last_observation: String },
}

impl PollState {
    /// Advance by one observation. Only `Pending` and `Checking` move.
    pub fn advance(self, observation: &Observation, max_retries: u32) -> PollState {
        match self {
            PollState::Pending => PollState::Checking { attempt: 1 },
            PollState::Checking { attempt } if observation.is_satisfied() => {
                PollState::Satisfied { attempts: attempt }
            }
            PollState::Checking { attempt } if attempt >= max_retries => PollState::Exhausted {
                attempts: attempt,
                last_observation: observation.to_string(),
            },
            PollState::Checking { attempt } => PollState::Checking {
                attempt: attempt + 1,
            },
            done => done,
        }
    }
}

/// What a single attempt saw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observation {
    Converged { targets: usize },
    Mismatch {
        matching: usize,
        total: usize,
        example: String,
    },
    Unresolved,
    Ambiguous(Vec<String>),
    Unavailable(String),
}

impl Observation {
    pub fn from_resolution(resolution: Resolution, check: &RevisionCheck) -> Self {
        match resolution {
            Resolution::Resolved(targets) if all_match(&targets, check) => {
                Observation::Converged {
                    targets: targets.len(),
                }
            }
            Resolution::Resolved(targets) => Observation::Mismatch {
                matching: targets.iter().filter(|t| matches(t, check)).count(),
                total: targets.len(),
                example: first_mismatch(&targets, check)
                    .map(|t| t.to_string())
                    .unwrap_or_default(),
            },
            Resolution::Unresolved => Observation::Unresolved,
            Resolution::Ambiguous(names) => Observation::Ambiguous(names),
        }
    }

    pub fn is_satisfied(&self) -> bool {
        matches!(self, Observation::Converged { .. })
    }
}

impl fmt::Display for Observation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Observation::Converged { targets } => {
                write!(f, "satisfied, {} target(s) match", targets)
            }
            Observation::Mismatch {
                matching,
                total,
                example,
            } => write!(f, "{}/{} target(s) match; {}", matching, total, example),
            Observation::Unresolved => write!(f, "no runtime target resolved"),
            Observation::Ambiguous(names) => write!(
                f,
                "ambiguous, {} containers match: {}",
                names.len(),
                names.join(", ")
            ),
            Observation::Unavailable(message) => write!(f, "control plane error: {}", message),
        }
    }
}

impl<R: SwarmOps + ContainerOps, C: Clock> Engine<R, C> {
    /// Verify that every service of `stack` runs `check`'s revision in its
    /// desired state.
    ///
    /// Services are checked in order. The run stops at the first service that
    /// exhausts its attempts; the returned `Failed` keeps the transcript.
    pub async fn verify_revision(
        &self,
        environment: EnvironmentId,
        stack: &StackName,
        services: &[ServiceName],
        check: &RevisionCheck,
    ) -> VerifyResult {
        let mut outcome = CheckOutcome::default();
        match self
            .run_verification(environment, stack, services, check, &mut outcome)
            .await
        {
            Ok(()) => Ok(outcome),
            Err(error) => Err(Failed { outcome, error }),
        }
    }

    async fn run_verification(
        &self,
        environment: EnvironmentId,
        stack: &StackName,
        services: &[ServiceName],
        check: &RevisionCheck,
        outcome: &mut CheckOutcome,
    ) -> Result<(), EngineError> {
        if services.is_empty() {
            return Err(EngineError::NoServices);
        }

        let mode = self.detect_mode(environment).await?;
        outcome.mode = Some(mode);
        outcome
            .transcript
            .record(format!("environment {} runs {}", environment, mode));

        if !check.initial_wait().is_zero() {
            outcome.transcript.record(format!(
                "waiting {} before the first check",
                humantime::format_duration(check.initial_wait())
            ));
            self.sleep(check.initial_wait()).await?;
        }

        for name in services {
            let service = ServiceSpec::new(stack.clone(), name.clone());
            self.poll_service(mode, environment, &service, check, outcome)
                .await?;
        }

        outcome.transcript.record(format!(
            "all {} service(s) at revision {}",
            services.len(),
            check.target_revision()
        ));
        Ok(())
    }

    async fn poll_service(
        &self,
        mode: OrchestrationMode,
        environment: EnvironmentId,
        service: &ServiceSpec,
        check: &RevisionCheck,
        outcome: &mut CheckOutcome,
    ) -> Result<(), EngineError> {
        let max = check.max_retries();
        let mut state = PollState::Pending;

        loop {
            state = match state {
                PollState::Pending => PollState::Checking { attempt: 1 },
                PollState::Checking { attempt } => {
                    self.checkpoint()?;
                    let observation = match self
                        .resolve(mode, environment, service, check.desired_state())
                        .await
                    {
                        Ok(resolution) => Observation::from_resolution(resolution, check),
                        Err(e) if e.is_retryable() => Observation::Unavailable(e.to_string()),
                        Err(source) => {
                            return Err(EngineError::Unreachable {
                                service: service.qualified(),
                                attempt,
                                source,
                            });
                        }
                    };

                    outcome.transcript.record(format!(
                        "{}: attempt {}/{}: {}",
                        service, attempt, max, observation
                    ));
                    let next = PollState::Checking { attempt }.advance(&observation, max);
                    if matches!(next, PollState::Checking { .. }) {
                        self.sleep(check.retry_interval()).await?;
                    }
                    next
                }
                PollState::Satisfied { attempts } => {
                    outcome.transcript.record(format!(
                        "{}: satisfied at revision {} ({})",
                        service,
                        check.target_revision(),
                        check.desired_state()
                    ));
                    outcome.verdicts.push(ServiceVerdict {
                        service: service.qualified(),
                        satisfied: true,
                        attempts,
                    });
                    return Ok(());
                }
                PollState::Exhausted {
                    attempts,
                    last_observation,
                } => {
                    outcome.transcript.record(format!(
                        "{}: not satisfied after {} attempt(s)",
                        service, attempts
                    ));
                    outcome.verdicts.push(ServiceVerdict {
                        service: service.qualified(),
                        satisfied: false,
                        attempts,
                    });
                    return Err(EngineError::Exhausted {
                        service: service.qualified(),
                        revision: check.target_revision().to_string(),
                        state: check.desired_state().to_string(),
                        attempts,
                        last_observation,
                    });
                }
            };
        }
    }
}

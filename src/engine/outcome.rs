// ABOUTME: Results of verification and rollout runs.
// ABOUTME: Failed carries the partial outcome alongside the error that ended the run.

use serde::Serialize;
use std::fmt;

use super::{EngineError, OrchestrationMode};
use crate::transcript::Transcript;

/// Per-service verification verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceVerdict {
    pub service: String,
    pub satisfied: bool,
    pub attempts: u32,
}

/// Everything a verification run produced.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CheckOutcome {
    pub mode: Option<OrchestrationMode>,
    pub transcript: Transcript,
    pub verdicts: Vec<ServiceVerdict>,
}

impl CheckOutcome {
    pub fn verdict(&self, service: &str) -> Option<&ServiceVerdict> {
        self.verdicts.iter().find(|v| v.service == service)
    }

    pub fn all_satisfied(&self) -> bool {
        self.verdicts.iter().all(|v| v.satisfied)
    }
}

/// What a rollout did to one service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ServiceAction {
    /// Image retagged; `force_restarted` when the optional restart succeeded.
    Updated {
        from: String,
        to: String,
        force_restarted: bool,
    },
    /// Already running the revision, nothing submitted.
    AlreadyAtRevision,
    /// Standalone environments have no service object to mutate.
    NotApplicable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceRollout {
    pub service: String,
    #[serde(flatten)]
    pub action: ServiceAction,
}

/// What a rollout did to the stack environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum StackEnvAction {
    Updated { previous: String },
    Appended,
    Unchanged,
}

/// Everything a rollout run produced.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RolloutOutcome {
    pub mode: Option<OrchestrationMode>,
    pub transcript: Transcript,
    pub services: Vec<ServiceRollout>,
    pub stack_env: Option<StackEnvAction>,
}

impl RolloutOutcome {
    pub fn action(&self, service: &str) -> Option<&ServiceAction> {
        self.services
            .iter()
            .find(|s| s.service == service)
            .map(|s| &s.action)
    }
}

/// A run that ended in an error, with whatever it recorded before.
#[derive(Debug)]
pub struct Failed<O> {
    pub outcome: O,
    pub error: EngineError,
}

impl<O> Failed<O> {
    pub fn into_parts(self) -> (O, EngineError) {
        (self.outcome, self.error)
    }
}

impl<O> fmt::Display for Failed<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.error, f)
    }
}

impl<O: fmt::Debug> std::error::Error for Failed<O> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

pub type VerifyResult = Result<CheckOutcome, Failed<CheckOutcome>>;
pub type RolloutResult = Result<RolloutOutcome, Failed<RolloutOutcome>>;

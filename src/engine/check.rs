// ABOUTME: Validated inputs for a verification run and a rollout run.
// ABOUTME: RevisionCheck and RolloutPlan are immutable once built.

use std::time::Duration;

/// Longest tag Docker accepts.
const MAX_REVISION_LEN: usize = 128;

pub const DEFAULT_DESIRED_STATE: &str = "running";
pub const DEFAULT_MAX_RETRIES: u32 = 10;
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(10);
pub const DEFAULT_FORCE_RESTART_WAIT: Duration = Duration::from_secs(5);

/// Invalid check or plan input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CheckError {
    #[error("revision cannot be empty")]
    EmptyRevision,

    #[error("revision '{0}' exceeds {MAX_REVISION_LEN} characters")]
    RevisionTooLong(String),

    #[error("revision '{revision}' is not a valid image tag: invalid character '{ch}'")]
    InvalidRevision { revision: String, ch: char },

    #[error("desired state cannot be empty")]
    EmptyDesiredState,

    #[error("max_retries must be at least 1")]
    ZeroRetries,

    #[error("stack environment variable name '{0}' is invalid")]
    InvalidEnvVar(String),
}

/// Validate a revision as a Docker tag: `[A-Za-z0-9_][A-Za-z0-9_.-]*`.
fn validate_revision(revision: &str) -> Result<String, CheckError> {
    let revision = revision.trim();
    if revision.is_empty() {
        return Err(CheckError::EmptyRevision);
    }
    if revision.len() > MAX_REVISION_LEN {
        return Err(CheckError::RevisionTooLong(revision.to_string()));
    }
    for (i, ch) in revision.chars().enumerate() {
        let ok = ch.is_ascii_alphanumeric() || ch == '_' || (i > 0 && (ch == '.' || ch == '-'));
        if !ok {
            return Err(CheckError::InvalidRevision {
                revision: revision.to_string(),
                ch,
            });
        }
    }
    Ok(revision.to_string())
}

/// What a verification run compares every runtime target against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevisionCheck {
    target_revision: String,
    desired_state: String,
    max_retries: u32,
    wait_before_first: Duration,
    wait_between_retries: Duration,
}

impl RevisionCheck {
    /// Build a check with no initial wait and the default retry interval.
    ///
    /// # Errors
    ///
    /// Returns `CheckError` if the revision is not a valid tag, the desired
    /// state is blank, or `max_retries` is zero.
    pub fn new(
        target_revision: &str,
        desired_state: &str,
        max_retries: u32,
    ) -> Result<Self, CheckError> {
        let target_revision = validate_revision(target_revision)?;
        let desired_state = desired_state.trim();
        if desired_state.is_empty() {
            return Err(CheckError::EmptyDesiredState);
        }
        if max_retries == 0 {
            return Err(CheckError::ZeroRetries);
        }

        Ok(Self {
            target_revision,
            desired_state: desired_state.to_string(),
            max_retries,
            wait_before_first: Duration::ZERO,
            wait_between_retries: DEFAULT_RETRY_INTERVAL,
        })
    }

    pub fn wait_before_first(mut self, wait: Duration) -> Self {
        self.wait_before_first = wait;
        self
    }

    pub fn wait_between_retries(mut self, wait: Duration) -> Self {
        self.wait_between_retries = wait;
        self
    }

    pub fn target_revision(&self) -> &str {
        &self.target_revision
    }

    pub fn desired_state(&self) -> &str {
        &self.desired_state
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn initial_wait(&self) -> Duration {
        self.wait_before_first
    }

    pub fn retry_interval(&self) -> Duration {
        self.wait_between_retries
    }
}

/// What a rollout run changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RolloutPlan {
    new_revision: String,
    stack_env_var: Option<String>,
    force_restart: bool,
    force_restart_wait: Duration,
}

impl RolloutPlan {
    /// A plan that only retags services.
    ///
    /// # Errors
    ///
    /// Returns `CheckError` if the revision is not a valid tag.
    pub fn new(new_revision: &str) -> Result<Self, CheckError> {
        Ok(Self {
            new_revision: validate_revision(new_revision)?,
            stack_env_var: None,
            force_restart: false,
            force_restart_wait: DEFAULT_FORCE_RESTART_WAIT,
        })
    }

    /// Also set `var` to the new revision in the stack's environment and
    /// redeploy the stack.
    ///
    /// # Errors
    ///
    /// Returns `CheckError::InvalidEnvVar` unless `var` matches
    /// `[A-Za-z_][A-Za-z0-9_]*`.
    pub fn update_stack_env(mut self, var: &str) -> Result<Self, CheckError> {
        let var = var.trim();
        let valid = var
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
            && var.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid {
            return Err(CheckError::InvalidEnvVar(var.to_string()));
        }
        self.stack_env_var = Some(var.to_string());
        Ok(self)
    }

    /// Force-restart each updated service after `wait`.
    pub fn force_restart(mut self, wait: Duration) -> Self {
        self.force_restart = true;
        self.force_restart_wait = wait;
        self
    }

    pub fn new_revision(&self) -> &str {
        &self.new_revision
    }

    pub fn stack_env_var(&self) -> Option<&str> {
        self.stack_env_var.as_deref()
    }

    pub fn updates_stack_env(&self) -> bool {
        self.stack_env_var.is_some()
    }

    pub fn forces_restart(&self) -> bool {
        self.force_restart
    }

    pub fn force_restart_wait(&self) -> Duration {
        self.force_restart_wait
    }
}

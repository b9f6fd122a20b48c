// ABOUTME: Revision verification and rollout engine over the Portainer API.
// ABOUTME: Engine ties the API client, clock, and cancellation token together.

mod check;
mod clock;
mod error;
pub mod matcher;
mod mode;
mod outcome;
mod poll;
pub mod resolve;
mod rollout;
mod stack_env;

pub use check::{
    CheckError, DEFAULT_DESIRED_STATE, DEFAULT_FORCE_RESTART_WAIT, DEFAULT_MAX_RETRIES,
    DEFAULT_RETRY_INTERVAL, RevisionCheck, RolloutPlan,
};
pub use clock::{Clock, TokioClock};
pub use error::{EngineError, EngineErrorKind};
pub use mode::OrchestrationMode;
pub use outcome::{
    CheckOutcome, Failed, RolloutOutcome, RolloutResult, ServiceAction, ServiceRollout,
    ServiceVerdict, StackEnvAction, VerifyResult,
};
pub use poll::{Observation, PollState};
pub use resolve::{Resolution, RuntimeTarget, TargetOrigin};
pub use rollout::{Inspected, STACK_IMAGE_LABEL, ServiceUpdate, Submitted, retag_spec};
pub use stack_env::upsert_env;

use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Runs verification and rollout against one control plane.
///
/// `R` is the API client (anything implementing the capability traits the
/// operation needs) and `C` the clock every wait goes through.
pub struct Engine<R, C = TokioClock> {
    api: R,
    clock: C,
    cancel: CancellationToken,
}

impl<R> Engine<R, TokioClock> {
    pub fn new(api: R) -> Self {
        Self::with_clock(api, TokioClock)
    }
}

impl<R, C> Engine<R, C> {
    pub fn with_clock(api: R, clock: C) -> Self {
        Self {
            api,
            clock,
            cancel: CancellationToken::new(),
        }
    }

    /// Stop at the next HTTP call or sleep once `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn api(&self) -> &R {
        &self.api
    }

    fn checkpoint(&self) -> Result<(), EngineError> {
        if self.cancel.is_cancelled() {
            return Err(EngineError::Cancelled);
        }
        Ok(())
    }
}

impl<R, C: Clock> Engine<R, C> {
    async fn sleep(&self, duration: Duration) -> Result<(), EngineError> {
        if duration.is_zero() {
            return self.checkpoint();
        }
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(EngineError::Cancelled),
            _ = self.clock.sleep(duration) => Ok(()),
        }
    }
}

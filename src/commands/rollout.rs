// ABOUTME: Rollout command implementation.
// ABOUTME: Retags services, updates the stack environment, and optionally verifies.

use super::connection::connect;
use super::verify::run_verification;
use rollcall::config::Config;
use rollcall::engine::{RolloutOutcome, ServiceAction, StackEnvAction};
use rollcall::error::Result;
use rollcall::output::Output;
use tokio_util::sync::CancellationToken;

/// Command-line switches layered over the `rollout` config section.
#[derive(Debug, Clone, Copy, Default)]
pub struct RolloutOptions {
    pub force_restart: bool,
    pub update_stack_env: bool,
    pub verify: bool,
}

pub async fn rollout(
    config: Config,
    revision: &str,
    options: RolloutOptions,
    cancel: CancellationToken,
    mut output: Output,
) -> Result<()> {
    output.start_timer();

    let mut settings = config.rollout.clone();
    settings.force_restart |= options.force_restart;
    settings.update_stack_env |= options.update_stack_env;
    let plan = settings.to_plan(revision)?;
    let services = config.select_services(&[])?;
    let engine = connect(&config, cancel, &output)?;

    output.progress(&format!(
        "Rolling out {} to {} service(s) of {}",
        revision,
        services.len(),
        config.stack
    ));

    let outcome = match engine
        .rollout_revision(config.environment, &config.stack, &services, &plan)
        .await
    {
        Ok(outcome) => outcome,
        Err(failed) => {
            output.transcript(&failed.outcome.transcript);
            output.report("rollout", &failed.outcome);
            return Err(failed.error.into());
        }
    };
    output.transcript(&outcome.transcript);
    output.report("rollout", &outcome);
    let warnings = outcome.transcript.warnings().count();
    if warnings > 0 {
        output.warning(&format!("rollout finished with {} warning(s)", warnings));
    }

    if options.verify {
        let check = config.check.to_check(revision)?;
        run_verification(&engine, &config, &services, &check, &output).await?;
    }

    output.success(&summary(&outcome, revision));
    Ok(())
}

fn summary(outcome: &RolloutOutcome, revision: &str) -> String {
    let updated = outcome
        .services
        .iter()
        .filter(|s| matches!(s.action, ServiceAction::Updated { .. }))
        .count();
    let skipped = outcome
        .services
        .iter()
        .filter(|s| s.action == ServiceAction::AlreadyAtRevision)
        .count();

    let mut message = format!(
        "Rolled out {}: {} updated, {} already current",
        revision, updated, skipped
    );
    match outcome.stack_env {
        Some(StackEnvAction::Unchanged) => message.push_str(", stack environment unchanged"),
        Some(_) => message.push_str(", stack redeployed"),
        None => {}
    }
    message
}

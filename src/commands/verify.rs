// ABOUTME: Verify command implementation.
// ABOUTME: Polls services until they run the revision or attempts run out.

use super::connection::connect;
use rollcall::api::{ContainerOps, SwarmOps};
use rollcall::config::Config;
use rollcall::engine::{Clock, Engine, RevisionCheck};
use rollcall::error::Result;
use rollcall::output::Output;
use rollcall::types::ServiceName;
use tokio_util::sync::CancellationToken;

/// Verify the configured (or selected) services run `revision`.
pub async fn verify(
    config: Config,
    revision: &str,
    services: &[String],
    cancel: CancellationToken,
    mut output: Output,
) -> Result<()> {
    output.start_timer();
    let services = config.select_services(services)?;
    let check = config.check.to_check(revision)?;
    let engine = connect(&config, cancel, &output)?;

    run_verification(&engine, &config, &services, &check, &output).await?;

    output.success(&format!(
        "{} service(s) of {} at revision {}",
        services.len(),
        config.stack,
        revision
    ));
    Ok(())
}

/// Run a verification and print its transcript whether or not it passed.
pub(super) async fn run_verification<R, C>(
    engine: &Engine<R, C>,
    config: &Config,
    services: &[ServiceName],
    check: &RevisionCheck,
    output: &Output,
) -> Result<()>
where
    R: SwarmOps + ContainerOps,
    C: Clock,
{
    output.progress(&format!(
        "Verifying {} service(s) of {} at revision {} ({}, up to {} attempt(s))",
        services.len(),
        config.stack,
        check.target_revision(),
        check.desired_state(),
        check.max_retries()
    ));

    match engine
        .verify_revision(config.environment, &config.stack, services, check)
        .await
    {
        Ok(outcome) => {
            output.transcript(&outcome.transcript);
            output.report("verify", &outcome);
            Ok(())
        }
        Err(failed) => {
            output.transcript(&failed.outcome.transcript);
            output.report("verify", &failed.outcome);
            Err(failed.error.into())
        }
    }
}

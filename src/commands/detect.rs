// ABOUTME: Detect command implementation.
// ABOUTME: Reports whether the environment runs Swarm or standalone Docker.

use super::connection::connect;
use rollcall::config::Config;
use rollcall::error::Result;
use rollcall::output::Output;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

#[derive(Serialize)]
struct Detection {
    environment: u64,
    mode: rollcall::engine::OrchestrationMode,
}

pub async fn detect(config: Config, cancel: CancellationToken, mut output: Output) -> Result<()> {
    output.start_timer();
    let engine = connect(&config, cancel, &output)?;

    let mode = engine.detect_mode(config.environment).await?;

    output.report(
        "detect",
        &Detection {
            environment: config.environment.get(),
            mode,
        },
    );
    output.success(&format!("Environment {} runs {}", config.environment, mode));
    Ok(())
}

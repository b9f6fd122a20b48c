// ABOUTME: Entry point for the rollcall CLI application.
// ABOUTME: Parses arguments and dispatches to appropriate command handlers.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use rollcall::config::{self, Config};
use rollcall::error::Result;
use rollcall::output::{Output, OutputMode};
use std::env;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Transcript lines are printed by Output; tracing repeats them only when verbose
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn,rollcall::transcript=off")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let mode = if cli.json {
        OutputMode::Json
    } else if cli.quiet {
        OutputMode::Quiet
    } else {
        OutputMode::Normal
    };

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, cancelling");
            ctrl_c.cancel();
        }
    });

    if let Err(e) = run(cli, mode, cancel).await {
        Output::new(mode).error(&e.to_string());
        std::process::exit(1);
    }
}

async fn run(cli: Cli, mode: OutputMode, cancel: CancellationToken) -> Result<()> {
    let output = Output::new(mode);
    match cli.command {
        Commands::Init { stack, force } => {
            let cwd = env::current_dir()?;
            config::init_config(&cwd, stack.as_deref(), force)?;
            output.success(&format!("Created {}", config::CONFIG_FILENAME));
            Ok(())
        }
        Commands::Detect { destination } => {
            let config = load_config(destination.as_deref())?;
            commands::detect(config, cancel, output).await
        }
        Commands::Verify {
            destination,
            revision,
            services,
        } => {
            let config = load_config(destination.as_deref())?;
            commands::verify(config, &revision, &services, cancel, output).await
        }
        Commands::Rollout {
            destination,
            revision,
            force_restart,
            update_stack_env,
            verify,
        } => {
            let config = load_config(destination.as_deref())?;
            let options = commands::RolloutOptions {
                force_restart,
                update_stack_env,
                verify,
            };
            commands::rollout(config, &revision, options, cancel, output).await
        }
    }
}

/// Discover the config in the working directory and apply a destination.
fn load_config(destination: Option<&str>) -> Result<Config> {
    let cwd = env::current_dir()?;
    let config = Config::discover(&cwd)?;

    match destination {
        Some(dest) => config.for_destination(dest),
        None => Ok(config),
    }
}

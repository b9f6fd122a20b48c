// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "rollcall")]
#[command(about = "Verify and roll out image revisions of Portainer-managed Docker stacks")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print only final results (for CI)
    #[arg(short, long, global = true, conflicts_with = "json")]
    pub quiet: bool,

    /// Emit JSON lines
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new rollcall.yml configuration file
    Init {
        /// Stack name to put in the template
        #[arg(long)]
        stack: Option<String>,

        /// Overwrite an existing configuration file
        #[arg(long)]
        force: bool,
    },

    /// Show whether the environment runs Swarm or standalone Docker
    Detect {
        /// Target destination (defined in config)
        #[arg(short, long)]
        destination: Option<String>,
    },

    /// Check that services run a revision in their desired state
    Verify {
        /// Target destination (defined in config)
        #[arg(short, long)]
        destination: Option<String>,

        /// Image tag every service must run
        #[arg(short, long)]
        revision: String,

        /// Only check these services (repeatable)
        #[arg(short, long = "service")]
        services: Vec<String>,
    },

    /// Retag services to a revision and optionally redeploy the stack
    Rollout {
        /// Target destination (defined in config)
        #[arg(short, long)]
        destination: Option<String>,

        /// Image tag to roll out
        #[arg(short, long)]
        revision: String,

        /// Force-restart each updated service
        #[arg(long)]
        force_restart: bool,

        /// Write the revision into the stack environment variable
        #[arg(long)]
        update_stack_env: bool,

        /// Verify the revision after rolling out
        #[arg(long)]
        verify: bool,
    },
}

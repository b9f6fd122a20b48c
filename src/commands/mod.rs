// ABOUTME: Command module aggregator for the rollcall CLI.
// ABOUTME: Re-exports detect, verify, and rollout command handlers.

mod connection;
mod detect;
mod rollout;
mod verify;

pub use detect::detect;
pub use rollout::{RolloutOptions, rollout};
pub use verify::verify;

// ABOUTME: Composable capability traits for the Portainer control plane.
// ABOUTME: Defines SwarmOps, ContainerOps, and StackOps.

mod container;
pub(crate) mod sealed;
mod stack;
mod swarm;

pub use container::ContainerOps;
pub use stack::StackOps;
pub use swarm::SwarmOps;

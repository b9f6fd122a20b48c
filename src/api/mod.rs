// ABOUTME: Typed access to the Portainer control plane.
// ABOUTME: Capability traits, payload models, filters, and the client over a Transport.

mod client;
mod error;
pub mod filters;
pub mod models;
mod traits;

pub use client::PortainerClient;
pub use error::{ApiError, ApiErrorKind};
pub use filters::{ServiceFilters, TaskFilters};
pub use traits::{ContainerOps, StackOps, SwarmOps};

// ABOUTME: Type-safe identifiers and validated domain types.
// ABOUTME: Uses phantom types to prevent ID confusion at compile time.

mod id;
mod image_ref;
mod service_name;

pub use id::{ContainerId, EnvironmentId, NodeId, ServiceId, StackId, TaskId};
pub use image_ref::{ImageRef, ParseImageRefError, image_tag};
pub use service_name::{NameError, ServiceName, ServiceSpec, StackName, normalize_name};

//! Release tree model layer
//!
//! Structure:
//! - `resource.rs` - declared records, live nodes and references
//! - `health.rs` - health classification
//! - `event.rs` - Kubernetes events surfaced for a single resource
//! - `logs.rs` - container log lines of a single pod

pub mod event;
pub mod health;
pub mod logs;
pub mod resource;

pub use event::{ResourceEvent, ResourceEventsResponse};
pub use health::{HealthInfo, HealthStatus};
pub use logs::{PodLogEntry, ResourcePodLogsResponse};
pub use resource::{
    PlaneCoordinates, ResourceNode, ResourceRecord, ResourceRef, ResourceTreeResponse,
};

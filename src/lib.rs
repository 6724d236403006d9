//! release-tree library
//!
//! Builds the live, health-annotated resource tree of the Release deployed for
//! a component in an environment, and lists Kubernetes events and pod logs for
//! resources in that tree. Control-plane records are read with kube-rs; data-plane objects
//! are read through the gateway's Kubernetes proxy.

pub mod config;
pub mod error;
pub mod gateway;
pub mod kube;
pub mod models;
pub mod object;
pub mod platform;
pub mod services;
pub mod tree;

// Re-export commonly used types for convenience
pub use error::TreeError;
pub use models::{
    HealthInfo, HealthStatus, PlaneCoordinates, PodLogEntry, ResourceEvent,
    ResourceEventsResponse, ResourceNode, ResourcePodLogsResponse, ResourceRecord,
    ResourceTreeResponse,
};
pub use services::{EventTarget, ReleaseTreeService};

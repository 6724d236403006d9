//! Errors surfaced by release tree lookups
//!
//! Only request-level failures live here. Failures scoped to a single declared
//! resource (`ResolutionError`, `FetchError`) are logged and skipped by the tree
//! builder and never reach the caller as a `TreeError`.

use crate::kube::fetch::FetchError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TreeError {
    #[error("not allowed to view component {component} in {namespace}/{project}")]
    Forbidden {
        namespace: String,
        project: String,
        component: String,
    },

    #[error("component {0} not found")]
    ComponentNotFound(String),

    #[error("no release found for component {component} in environment {environment}")]
    ReleaseNotFound {
        component: String,
        environment: String,
    },

    #[error("environment {0} not found")]
    EnvironmentNotFound(String),

    #[error("resource {kind}/{name} is not part of the release")]
    ResourceNotFound { kind: String, name: String },

    #[error("expected 1 release for component/environment, found {count}")]
    AmbiguousRelease { count: usize },

    #[error("environment {0} has no data plane reference")]
    DataPlaneMissing(String),

    #[error("unsupported data plane reference kind: {0}")]
    UnsupportedDataPlaneRef(String),

    #[error("{kind} {name} not found")]
    DataPlaneNotFound { kind: String, name: String },

    #[error("gateway client is not configured")]
    GatewayNotConfigured,

    #[error("authorization check failed: {0:#}")]
    Authorization(anyhow::Error),

    #[error("control plane lookup failed: {0:#}")]
    Store(anyhow::Error),

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

impl TreeError {
    /// True for the lookups that map to a "not found" answer
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            TreeError::ComponentNotFound(_)
                | TreeError::ReleaseNotFound { .. }
                | TreeError::EnvironmentNotFound(_)
                | TreeError::ResourceNotFound { .. }
                | TreeError::DataPlaneNotFound { .. }
        )
    }
}

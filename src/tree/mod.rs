//! Live resource tree construction
//!
//! Structure:
//! - `node.rs` - raw object to `ResourceNode`, with the completeness gate
//! - `health.rs` - per-kind health registry
//! - `sanitize.rs` - field stripping on node payloads
//! - `owners.rs` - bounded child discovery for Deployment, CronJob and Job
//!
//! `TreeBuilder` drives these for every declared resource of a release. A
//! resource that cannot be resolved, fetched or built is logged and skipped;
//! it never fails the whole tree.

pub mod health;
pub mod node;
mod owners;
pub mod sanitize;

pub use health::{HealthCheck, HealthCheckError, HealthRegistry};
pub use node::build_node;
pub use sanitize::sanitize;

use crate::kube::discovery::ResourceResolver;
use crate::kube::fetch::LiveFetcher;
use crate::kube::paths;
use crate::models::{PlaneCoordinates, ResourceNode, ResourceRecord};
use std::sync::Arc;

/// Builds flat, parent-linked node lists from declared resources
#[derive(Clone)]
pub struct TreeBuilder {
    resolver: Arc<dyn ResourceResolver>,
    fetcher: LiveFetcher,
    registry: Arc<HealthRegistry>,
}

impl TreeBuilder {
    pub fn new(
        resolver: Arc<dyn ResourceResolver>,
        fetcher: LiveFetcher,
        registry: Arc<HealthRegistry>,
    ) -> Self {
        Self {
            resolver,
            fetcher,
            registry,
        }
    }

    pub fn fetcher(&self) -> &LiveFetcher {
        &self.fetcher
    }

    /// Nodes for every declared resource, each followed by its children
    ///
    /// Records are processed one at a time in declaration order.
    pub async fn build(
        &self,
        plane: &PlaneCoordinates,
        records: &[ResourceRecord],
    ) -> Vec<ResourceNode> {
        let mut nodes = Vec::with_capacity(records.len());

        for record in records {
            let kind = record.kind.as_str();
            let name = record.name.as_str();

            let plural = match self
                .resolver
                .resolve_plural(&record.group, &record.version, kind)
                .await
            {
                Ok(plural) => plural,
                Err(e) => {
                    tracing::warn!(kind, name, error = %e, "Failed to resolve resource plural, skipping");
                    continue;
                }
            };

            let path = paths::get_path(
                &record.group,
                &record.version,
                &plural,
                &record.namespace,
                name,
            );
            let obj = match self.fetcher.get(plane, &path).await {
                Ok(obj) => obj,
                Err(e) => {
                    tracing::warn!(kind, name, error = %e, "Failed to fetch live resource, skipping");
                    continue;
                }
            };

            let Some(node) = build_node(&obj, None, record.health_status, &self.registry) else {
                tracing::warn!(kind, name, "Skipping resource node with missing required fields");
                continue;
            };
            nodes.push(node);

            let children = self.children(plane, record, &obj).await;
            tracing::debug!("{} {} has {} child nodes", kind, name, children.len());
            nodes.extend(children);
        }

        nodes
    }
}

//! Bounded owner-graph walk for workload kinds
//!
//! Kubernetes records ownership only on the child, so children are found by
//! listing a kind in the parent's namespace and keeping the items whose owner
//! references carry the parent's UID. Matching is by UID alone; UIDs are
//! treated as unique across the cluster.
//!
//! Only three declared kinds are expanded, at most two hops deep:
//! - Deployment -> ReplicaSet (hidden) -> Pod, Pods parented to the Deployment
//! - CronJob -> Job -> Pod
//! - Job -> Pod

use super::TreeBuilder;
use super::node::build_node;
use crate::kube::paths;
use crate::models::{PlaneCoordinates, ResourceNode, ResourceRecord, ResourceRef};
use crate::object::{ObjectExt, join_api_version};
use serde_json::Value;

/// Child lists always use this version within the owning group
const CHILD_VERSION: &str = "v1";

impl TreeBuilder {
    /// Live children of a declared resource, parented per the kind table
    ///
    /// Errors on any branch are logged and yield no children for that branch.
    pub(crate) async fn children(
        &self,
        plane: &PlaneCoordinates,
        record: &ResourceRecord,
        parent_obj: &Value,
    ) -> Vec<ResourceNode> {
        let parent_uid = parent_obj.uid().unwrap_or_default();
        let parent_ref = ResourceRef {
            group: record.group.clone(),
            version: record.version.clone(),
            kind: record.kind.clone(),
            namespace: record.namespace.clone(),
            name: record.name.clone(),
            uid: parent_uid.to_string(),
        };
        let namespace = record.namespace.as_str();

        let mut nodes = Vec::new();
        match record.kind.as_str() {
            "Deployment" => {
                let replica_sets = self
                    .owned(plane, "apps", "ReplicaSet", namespace, parent_uid)
                    .await;
                for rs in &replica_sets {
                    let rs_uid = rs.uid().unwrap_or_default();
                    let pods = self.owned(plane, "", "Pod", namespace, rs_uid).await;
                    nodes.extend(self.build_children(&pods, &parent_ref));
                }
            }
            "CronJob" => {
                let jobs = self
                    .owned(plane, "batch", "Job", namespace, parent_uid)
                    .await;
                for job in &jobs {
                    let Some(job_node) = build_node(job, Some(&parent_ref), None, &self.registry)
                    else {
                        continue;
                    };
                    let job_ref = ResourceRef {
                        group: "batch".to_string(),
                        version: CHILD_VERSION.to_string(),
                        kind: "Job".to_string(),
                        namespace: job.namespace().unwrap_or_default().to_string(),
                        name: job_node.name.clone(),
                        uid: job_node.uid.clone(),
                    };
                    nodes.push(job_node);

                    let pods = self
                        .owned(plane, "", "Pod", namespace, &job_ref.uid)
                        .await;
                    nodes.extend(self.build_children(&pods, &job_ref));
                }
            }
            "Job" => {
                let pods = self.owned(plane, "", "Pod", namespace, parent_uid).await;
                nodes.extend(self.build_children(&pods, &parent_ref));
            }
            _ => {}
        }
        nodes
    }

    fn build_children(&self, items: &[Value], parent: &ResourceRef) -> Vec<ResourceNode> {
        items
            .iter()
            .filter_map(|item| build_node(item, Some(parent), None, &self.registry))
            .collect()
    }

    /// Items of `kind` in `namespace` owned by `owner_uid`
    ///
    /// List responses omit per-item kind and apiVersion, so both are injected
    /// into every match.
    async fn owned(
        &self,
        plane: &PlaneCoordinates,
        group: &str,
        kind: &str,
        namespace: &str,
        owner_uid: &str,
    ) -> Vec<Value> {
        let plural = match self.resolver.resolve_plural(group, CHILD_VERSION, kind).await {
            Ok(plural) => plural,
            Err(e) => {
                tracing::warn!(kind, group, error = %e, "Failed to resolve child resource plural");
                return Vec::new();
            }
        };

        let path = paths::list_path(group, CHILD_VERSION, &plural, namespace);
        let items = match self.fetcher.list(plane, &path, &[]).await {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!(kind, namespace, error = %e, "Failed to fetch child resources");
                return Vec::new();
            }
        };

        let api_version = join_api_version(group, CHILD_VERSION);
        items
            .into_iter()
            .filter(|item| item.has_owner_uid(owner_uid))
            .map(|mut item| {
                if let Some(map) = item.as_object_mut() {
                    map.insert("kind".to_string(), Value::from(kind));
                    map.insert("apiVersion".to_string(), Value::from(api_version.as_str()));
                }
                item
            })
            .collect()
    }
}

//! Control-plane records and access
//!
//! Components, Releases, Environments and data planes live in the control-plane
//! cluster as `openchoreo.dev/v1alpha1` custom resources. The service reads
//! them through `ControlPlane`, and checks access through `Authorizer`.

pub mod authz;
mod store;

pub use authz::{
    AccessReviewAuthorizer, AllowAll, AuthzRequest, Authorizer, Decision, ResourceHierarchy,
};
pub use store::KubeControlPlane;

use crate::models::ResourceRecord;
use crate::object::ObjectExt;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;

/// API group of the platform's custom resources
pub const PLATFORM_GROUP: &str = "openchoreo.dev";
pub const PLATFORM_VERSION: &str = "v1alpha1";

pub const LABEL_NAMESPACE: &str = "openchoreo.dev/namespace";
pub const LABEL_PROJECT: &str = "openchoreo.dev/project";
pub const LABEL_COMPONENT: &str = "openchoreo.dev/component";
pub const LABEL_ENVIRONMENT: &str = "openchoreo.dev/environment";

pub const KIND_DATA_PLANE: &str = "DataPlane";
pub const KIND_CLUSTER_DATA_PLANE: &str = "ClusterDataPlane";

#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    pub namespace: String,
    pub name: String,
    /// Owning project from `spec.owner.projectName`
    pub project: String,
}

impl Component {
    pub fn from_object(obj: &Value) -> Result<Self> {
        Ok(Self {
            namespace: obj.namespace().unwrap_or_default().to_string(),
            name: obj.name().context("Component has no name")?.to_string(),
            project: obj
                .nested_str(&["spec", "owner", "projectName"])
                .unwrap_or_default()
                .to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Release {
    pub namespace: String,
    pub name: String,
    /// Resources recorded in `status.resources`, in declaration order
    pub resources: Vec<ResourceRecord>,
}

impl Release {
    /// Parse a Release, dropping malformed resource entries
    pub fn from_object(obj: &Value) -> Result<Self> {
        let name = obj.name().context("Release has no name")?.to_string();
        let entries = obj
            .get("status")
            .and_then(|s| s.get("resources"))
            .and_then(|r| r.as_array())
            .cloned()
            .unwrap_or_default();

        let mut resources = Vec::with_capacity(entries.len());
        for (idx, entry) in entries.into_iter().enumerate() {
            match serde_json::from_value::<ResourceRecord>(entry) {
                Ok(record) => resources.push(record),
                Err(e) => tracing::warn!("Ignoring resource entry {} of release {}: {}", idx, name, e),
            }
        }

        Ok(Self {
            namespace: obj.namespace().unwrap_or_default().to_string(),
            name,
            resources,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPlaneRef {
    pub kind: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Environment {
    pub namespace: String,
    pub name: String,
    pub data_plane_ref: Option<DataPlaneRef>,
}

impl Environment {
    pub fn from_object(obj: &Value) -> Result<Self> {
        let data_plane_ref = obj
            .get("spec")
            .and_then(|s| s.get("dataPlaneRef"))
            .filter(|r| r.is_object())
            .map(|r| DataPlaneRef {
                kind: r.nested_str(&["kind"]).unwrap_or_default().to_string(),
                name: r.nested_str(&["name"]).unwrap_or_default().to_string(),
            });

        Ok(Self {
            namespace: obj.namespace().unwrap_or_default().to_string(),
            name: obj.name().context("Environment has no name")?.to_string(),
            data_plane_ref,
        })
    }
}

/// A namespaced or cluster-scoped data plane
#[derive(Debug, Clone, PartialEq)]
pub struct DataPlane {
    /// Empty for a ClusterDataPlane
    pub namespace: String,
    pub name: String,
    /// `spec.planeID`, if set
    pub plane_id: Option<String>,
}

pub type ClusterDataPlane = DataPlane;

impl DataPlane {
    pub fn from_object(obj: &Value) -> Result<Self> {
        Ok(Self {
            namespace: obj.namespace().unwrap_or_default().to_string(),
            name: obj.name().context("data plane has no name")?.to_string(),
            plane_id: obj
                .nested_str_non_empty(&["spec", "planeID"])
                .map(str::to_string),
        })
    }

    /// Gateway plane ID: `spec.planeID`, falling back to the resource name
    pub fn effective_plane_id(&self) -> &str {
        self.plane_id.as_deref().unwrap_or(&self.name)
    }
}

/// Label set identifying the Release of one component in one environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseSelector {
    pub namespace: String,
    pub project: String,
    pub component: String,
    pub environment: String,
}

impl ReleaseSelector {
    pub fn labels(&self) -> [(&'static str, &str); 4] {
        [
            (LABEL_NAMESPACE, self.namespace.as_str()),
            (LABEL_PROJECT, self.project.as_str()),
            (LABEL_COMPONENT, self.component.as_str()),
            (LABEL_ENVIRONMENT, self.environment.as_str()),
        ]
    }

    /// Equality-based label selector string
    pub fn to_label_selector(&self) -> String {
        self.labels()
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Read access to control-plane records
///
/// Lookups return `Ok(None)` for a missing record; `Err` is reserved for
/// store failures.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ControlPlane: Send + Sync {
    async fn component(&self, namespace: &str, name: &str) -> Result<Option<Component>>;

    /// Releases in the selector's namespace carrying all of its labels
    async fn releases(&self, selector: &ReleaseSelector) -> Result<Vec<Release>>;

    async fn environment(&self, namespace: &str, name: &str) -> Result<Option<Environment>>;

    async fn data_plane(&self, namespace: &str, name: &str) -> Result<Option<DataPlane>>;

    async fn cluster_data_plane(&self, name: &str) -> Result<Option<ClusterDataPlane>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::HealthStatus;
    use serde_json::json;

    #[test]
    fn test_component_project() {
        let component = Component::from_object(&json!({
            "metadata": {"name": "web", "namespace": "acme"},
            "spec": {"owner": {"projectName": "shop"}}
        }))
        .unwrap();
        assert_eq!(component.project, "shop");
        assert_eq!(component.namespace, "acme");
    }

    #[test]
    fn test_release_resources_in_order() {
        let release = Release::from_object(&json!({
            "metadata": {"name": "web-dev", "namespace": "acme"},
            "status": {"resources": [
                {"id": "a", "group": "apps", "version": "v1", "kind": "Deployment", "namespace": "dp", "name": "web", "healthStatus": "Healthy"},
                {"id": "bad"},
                {"id": "b", "version": "v1", "kind": "Service", "namespace": "dp", "name": "web"}
            ]}
        }))
        .unwrap();
        let kinds: Vec<&str> = release.resources.iter().map(|r| r.kind.as_str()).collect();
        assert_eq!(kinds, vec!["Deployment", "Service"]);
        assert_eq!(release.resources[0].health_status, Some(HealthStatus::Healthy));
    }

    #[test]
    fn test_release_keeps_entries_with_unrecognized_health() {
        let release = Release::from_object(&json!({
            "metadata": {"name": "web-dev", "namespace": "acme"},
            "status": {"resources": [
                {"id": "a", "group": "apps", "version": "v1", "kind": "Deployment", "namespace": "dp", "name": "web", "healthStatus": ""},
                {"id": "b", "version": "v1", "kind": "Service", "namespace": "dp", "name": "web", "healthStatus": "Missing"}
            ]}
        }))
        .unwrap();
        assert_eq!(release.resources.len(), 2);
        assert_eq!(release.resources[0].health_status, None);
        assert_eq!(release.resources[1].health_status, Some(HealthStatus::Unknown));
    }

    #[test]
    fn test_release_without_status() {
        let release = Release::from_object(&json!({"metadata": {"name": "r"}})).unwrap();
        assert!(release.resources.is_empty());
    }

    #[test]
    fn test_environment_data_plane_ref() {
        let env = Environment::from_object(&json!({
            "metadata": {"name": "dev", "namespace": "acme"},
            "spec": {"dataPlaneRef": {"kind": "ClusterDataPlane", "name": "shared"}}
        }))
        .unwrap();
        assert_eq!(
            env.data_plane_ref,
            Some(DataPlaneRef {
                kind: "ClusterDataPlane".into(),
                name: "shared".into()
            })
        );

        let bare = Environment::from_object(&json!({"metadata": {"name": "dev"}, "spec": {}})).unwrap();
        assert_eq!(bare.data_plane_ref, None);
    }

    #[test]
    fn test_plane_id_falls_back_to_name() {
        let with_id = DataPlane::from_object(&json!({
            "metadata": {"name": "dp", "namespace": "acme"},
            "spec": {"planeID": "prod-cluster"}
        }))
        .unwrap();
        assert_eq!(with_id.effective_plane_id(), "prod-cluster");

        let without = DataPlane::from_object(&json!({
            "metadata": {"name": "dp"},
            "spec": {"planeID": ""}
        }))
        .unwrap();
        assert_eq!(without.effective_plane_id(), "dp");
    }

    #[test]
    fn test_release_label_selector() {
        let selector = ReleaseSelector {
            namespace: "acme".into(),
            project: "shop".into(),
            component: "web".into(),
            environment: "dev".into(),
        };
        assert_eq!(
            selector.to_label_selector(),
            "openchoreo.dev/namespace=acme,openchoreo.dev/project=shop,openchoreo.dev/component=web,openchoreo.dev/environment=dev"
        );
    }
}

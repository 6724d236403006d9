//! Declared records, live tree nodes and the coordinates used to reach them

use super::health::{HealthInfo, HealthStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Plane type used for every data-plane proxy call
pub const PLANE_TYPE_DATA_PLANE: &str = "dataplane";

/// Namespace placeholder used by the gateway for cluster-scoped plane resources
pub const CLUSTER_SCOPED_NAMESPACE: &str = "_cluster";

/// One resource recorded in a Release's status
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRecord {
    #[serde(default)]
    pub group: String,
    pub version: String,
    pub kind: String,
    #[serde(default)]
    pub namespace: String,
    pub name: String,
    /// Health last written by the release controller, if any
    #[serde(
        default,
        deserialize_with = "recorded_health",
        skip_serializing_if = "Option::is_none"
    )]
    pub health_status: Option<HealthStatus>,
}

/// Empty means not yet reported; a value this build does not know is `Unknown`
fn recorded_health<'de, D>(deserializer: D) -> Result<Option<HealthStatus>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(match raw.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(s) => Some(s.parse().unwrap_or(HealthStatus::Unknown)),
    })
}

impl ResourceRecord {
    pub fn new(group: &str, version: &str, kind: &str, namespace: &str, name: &str) -> Self {
        Self {
            group: group.to_string(),
            version: version.to_string(),
            kind: kind.to_string(),
            namespace: namespace.to_string(),
            name: name.to_string(),
            health_status: None,
        }
    }

    pub fn with_health(mut self, status: HealthStatus) -> Self {
        self.health_status = Some(status);
        self
    }
}

/// Identity of a node, used only to point a child at its parent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRef {
    pub group: String,
    pub version: String,
    pub kind: String,
    pub namespace: String,
    pub name: String,
    pub uid: String,
}

/// A live object in the release tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceNode {
    pub group: String,
    pub version: String,
    pub kind: String,
    pub namespace: String,
    pub name: String,
    pub uid: String,
    pub resource_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// At most one entry
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parent_refs: Vec<ResourceRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health: Option<HealthInfo>,
    /// Sanitized copy of the live object
    pub object: Value,
}

impl ResourceNode {
    /// Reference to this node, for parenting its children
    pub fn as_ref(&self) -> ResourceRef {
        ResourceRef {
            group: self.group.clone(),
            version: self.version.clone(),
            kind: self.kind.clone(),
            namespace: self.namespace.clone(),
            name: self.name.clone(),
            uid: self.uid.clone(),
        }
    }

    pub fn parent(&self) -> Option<&ResourceRef> {
        self.parent_refs.first()
    }
}

/// Response of a release tree lookup
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceTreeResponse {
    pub nodes: Vec<ResourceNode>,
}

/// Where a data-plane proxy call is routed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaneCoordinates {
    pub plane_type: String,
    pub plane_id: String,
    pub cr_namespace: String,
    pub cr_name: String,
}

impl PlaneCoordinates {
    pub fn data_plane(plane_id: &str, cr_namespace: &str, cr_name: &str) -> Self {
        Self {
            plane_type: PLANE_TYPE_DATA_PLANE.to_string(),
            plane_id: plane_id.to_string(),
            cr_namespace: cr_namespace.to_string(),
            cr_name: cr_name.to_string(),
        }
    }
}

//! Raw object to tree node conversion

use super::health::HealthRegistry;
use super::sanitize::sanitize;
use crate::models::{HealthInfo, HealthStatus, ResourceNode, ResourceRef};
use crate::object::ObjectExt;
use chrono::{DateTime, Utc};
use serde_json::Value;

/// Build a tree node from a raw live object
///
/// Returns `None` when version, kind, name or uid is missing. A cached health
/// status is used as-is and skips live evaluation.
pub fn build_node(
    raw: &Value,
    parent: Option<&ResourceRef>,
    cached_health: Option<HealthStatus>,
    registry: &HealthRegistry,
) -> Option<ResourceNode> {
    let group = raw.api_group();
    let version = raw.api_version();
    if version.is_empty() {
        return None;
    }
    let kind = raw.kind()?;
    let name = raw.name()?;
    let uid = raw.uid()?;

    let created_at = raw
        .nested_str(&["metadata", "creationTimestamp"])
        .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
        .map(|ts| ts.with_timezone(&Utc));

    let health = match cached_health {
        Some(status) => Some(HealthInfo::new(status)),
        None => registry.evaluate(group, kind, raw),
    };

    Some(ResourceNode {
        group: group.to_string(),
        version: version.to_string(),
        kind: kind.to_string(),
        namespace: raw.namespace().unwrap_or_default().to_string(),
        name: name.to_string(),
        uid: uid.to_string(),
        resource_version: raw
            .nested_str(&["metadata", "resourceVersion"])
            .unwrap_or_default()
            .to_string(),
        created_at,
        parent_refs: parent.cloned().into_iter().collect(),
        health,
        object: sanitize(raw, kind),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pod() -> Value {
        json!({
            "apiVersion": "v1",
            "kind": "Pod",
            "metadata": {
                "name": "web-abc",
                "namespace": "dp-ns",
                "uid": "pod-1",
                "resourceVersion": "42",
                "creationTimestamp": "2024-05-01T10:00:00Z"
            },
            "status": {"phase": "Pending"}
        })
    }

    #[test]
    fn test_builds_complete_node() {
        let node = build_node(&pod(), None, None, &HealthRegistry::with_defaults()).unwrap();
        assert_eq!(node.group, "");
        assert_eq!(node.version, "v1");
        assert_eq!(node.namespace, "dp-ns");
        assert_eq!(node.resource_version, "42");
        assert_eq!(
            node.created_at.map(|t| t.to_rfc3339()),
            Some("2024-05-01T10:00:00+00:00".to_string())
        );
        assert_eq!(node.health, Some(HealthInfo::new(HealthStatus::Progressing)));
        assert!(node.parent_refs.is_empty());
    }

    #[test]
    fn test_missing_required_fields_drop_node() {
        let registry = HealthRegistry::new();
        for key in ["apiVersion", "kind"] {
            let mut obj = pod();
            obj.as_object_mut().unwrap().remove(key);
            assert!(build_node(&obj, None, None, &registry).is_none(), "{key}");
        }
        for key in ["name", "uid"] {
            let mut obj = pod();
            obj["metadata"].as_object_mut().unwrap().remove(key);
            assert!(build_node(&obj, None, None, &registry).is_none(), "{key}");
        }
    }

    #[test]
    fn test_bad_timestamp_leaves_created_at_unset() {
        let mut obj = pod();
        obj["metadata"]["creationTimestamp"] = json!("yesterday");
        let node = build_node(&obj, None, None, &HealthRegistry::new()).unwrap();
        assert!(node.created_at.is_none());
    }

    #[test]
    fn test_cached_health_bypasses_registry() {
        let node = build_node(
            &pod(),
            None,
            Some(HealthStatus::Degraded),
            &HealthRegistry::with_defaults(),
        )
        .unwrap();
        assert_eq!(node.health, Some(HealthInfo::new(HealthStatus::Degraded)));
    }

    #[test]
    fn test_parent_is_recorded() {
        let parent = ResourceRef {
            group: "apps".into(),
            version: "v1".into(),
            kind: "Deployment".into(),
            namespace: "dp-ns".into(),
            name: "web".into(),
            uid: "dep-1".into(),
        };
        let node = build_node(&pod(), Some(&parent), None, &HealthRegistry::new()).unwrap();
        assert_eq!(node.parent(), Some(&parent));
        assert!(node.health.is_none());
    }
}

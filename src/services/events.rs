//! Kubernetes events for a single resource of a release

use super::release_tree::ReleaseTreeService;
use crate::error::TreeError;
use crate::kube::paths;
use crate::models::{ResourceEvent, ResourceEventsResponse, ResourceRecord};
use crate::object::ObjectExt;
use chrono::{DateTime, Utc};
use serde_json::Value;

/// Declared kinds whose children may be asked about directly
const CHILD_PARENT_KINDS: &[(&str, &[&str])] = &[
    ("Pod", &["Deployment", "Job", "CronJob"]),
    ("ReplicaSet", &["Deployment"]),
    ("Job", &["CronJob"]),
];

/// The resource whose events are requested
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventTarget {
    pub kind: String,
    pub name: String,
    /// Defaults to the namespace recorded in the release
    pub namespace: Option<String>,
    pub uid: Option<String>,
}

impl EventTarget {
    pub fn new(kind: &str, name: &str) -> Self {
        Self {
            kind: kind.to_string(),
            name: name.to_string(),
            ..Default::default()
        }
    }
}

impl ReleaseTreeService {
    /// Events recorded against one resource belonging to the release
    ///
    /// The resource must be declared in the release, or be a child kind of a
    /// declared parent. Unlike the tree, a failed fetch here is an error.
    pub async fn get_resource_events(
        &self,
        namespace: &str,
        project: &str,
        component: &str,
        environment: &str,
        target: &EventTarget,
    ) -> Result<ResourceEventsResponse, TreeError> {
        tracing::debug!(
            "Getting events for {} {} of {}/{}/{} in {}",
            target.kind,
            target.name,
            namespace,
            project,
            component,
            environment
        );

        let tree = self.check_access(namespace, project, component).await?;
        let resolved = self
            .resolve_release(namespace, project, component, environment)
            .await?;

        let recorded_ns = find_in_release(&resolved.release.resources, &target.kind, &target.name)
            .ok_or_else(|| TreeError::ResourceNotFound {
                kind: target.kind.clone(),
                name: target.name.clone(),
            })?;
        let resource_ns = target
            .namespace
            .clone()
            .filter(|ns| !ns.is_empty())
            .unwrap_or(recorded_ns);

        let selector = field_selector(target, &resource_ns);
        let path = paths::list_path("", "v1", "events", &resource_ns);

        let items = tree
            .fetcher()
            .list(&resolved.plane, &path, &[("fieldSelector", selector.as_str())])
            .await?;

        Ok(ResourceEventsResponse {
            events: items.iter().map(map_event).collect(),
        })
    }
}

/// Namespace to query for a resource of the release, if it belongs to it
///
/// Declared resources match by kind and name. Child kinds match when one of
/// their parent kinds is declared, and take that parent's namespace.
fn find_in_release(records: &[ResourceRecord], kind: &str, name: &str) -> Option<String> {
    if let Some(record) = records.iter().find(|r| r.kind == kind && r.name == name) {
        return Some(record.namespace.clone());
    }
    parent_namespace(records, kind)
}

/// Namespace of the first declared parent of a child kind
pub(crate) fn parent_namespace(records: &[ResourceRecord], child_kind: &str) -> Option<String> {
    let (_, parents) = CHILD_PARENT_KINDS
        .iter()
        .find(|(child, _)| *child == child_kind)?;
    records
        .iter()
        .find(|r| parents.contains(&r.kind.as_str()))
        .map(|r| r.namespace.clone())
}

fn field_selector(target: &EventTarget, namespace: &str) -> String {
    let mut selector = format!(
        "involvedObject.kind={},involvedObject.name={}",
        target.kind, target.name
    );
    if !namespace.is_empty() {
        selector.push_str(&format!(",involvedObject.namespace={}", namespace));
    }
    if let Some(uid) = target.uid.as_deref().filter(|u| !u.is_empty()) {
        selector.push_str(&format!(",involvedObject.uid={}", uid));
    }
    selector
}

fn parse_timestamp(item: &Value, key: &str) -> Option<DateTime<Utc>> {
    item.nested_str_non_empty(&[key])
        .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
        .map(|ts| ts.with_timezone(&Utc))
}

/// Convert a raw Event into its display form
fn map_event(item: &Value) -> ResourceEvent {
    let text = |key: &str| item.nested_str(&[key]).unwrap_or_default().to_string();

    let count = item
        .get("count")
        .and_then(Value::as_i64)
        .and_then(|c| i32::try_from(c).ok());

    // eventTime carries fractional seconds; RFC 3339 parsing accepts both forms
    let first_timestamp = if item.nested_str_non_empty(&["firstTimestamp"]).is_some() {
        parse_timestamp(item, "firstTimestamp")
    } else {
        parse_timestamp(item, "eventTime")
    };
    let last_timestamp = if item.nested_str_non_empty(&["lastTimestamp"]).is_some() {
        parse_timestamp(item, "lastTimestamp")
    } else {
        first_timestamp
    };

    let source = item
        .nested_str_non_empty(&["source", "component"])
        .or_else(|| item.nested_str(&["reportingComponent"]))
        .unwrap_or_default()
        .to_string();

    ResourceEvent {
        event_type: text("type"),
        reason: text("reason"),
        message: text("message"),
        count,
        first_timestamp,
        last_timestamp,
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn records() -> Vec<ResourceRecord> {
        vec![
            ResourceRecord::new("", "v1", "Service", "dp-svc", "web"),
            ResourceRecord::new("apps", "v1", "Deployment", "dp-app", "web"),
        ]
    }

    #[test]
    fn test_declared_resource_namespace() {
        assert_eq!(
            find_in_release(&records(), "Service", "web"),
            Some("dp-svc".to_string())
        );
        assert_eq!(find_in_release(&records(), "Service", "other"), None);
    }

    #[test]
    fn test_child_kind_takes_parent_namespace() {
        assert_eq!(
            find_in_release(&records(), "Pod", "web-abc"),
            Some("dp-app".to_string())
        );
        assert_eq!(
            find_in_release(&records(), "ReplicaSet", "web-123"),
            Some("dp-app".to_string())
        );
        // Jobs are only children of CronJobs
        assert_eq!(find_in_release(&records(), "Job", "migrate"), None);
    }

    #[test]
    fn test_field_selector() {
        let mut target = EventTarget::new("Pod", "web-abc");
        assert_eq!(
            field_selector(&target, ""),
            "involvedObject.kind=Pod,involvedObject.name=web-abc"
        );
        target.uid = Some("u-1".into());
        assert_eq!(
            field_selector(&target, "dp"),
            "involvedObject.kind=Pod,involvedObject.name=web-abc,involvedObject.namespace=dp,involvedObject.uid=u-1"
        );
    }

    #[test]
    fn test_map_event_core_v1() {
        let event = map_event(&json!({
            "type": "Warning",
            "reason": "BackOff",
            "message": "Back-off restarting failed container",
            "count": 7,
            "firstTimestamp": "2024-05-01T10:00:00Z",
            "lastTimestamp": "2024-05-01T10:05:00Z",
            "source": {"component": "kubelet"}
        }));
        assert_eq!(event.event_type, "Warning");
        assert_eq!(event.count, Some(7));
        assert_eq!(event.source, "kubelet");
        assert_eq!(
            event.last_timestamp.map(|t| t.to_rfc3339()),
            Some("2024-05-01T10:05:00+00:00".to_string())
        );
    }

    #[test]
    fn test_map_event_falls_back_to_event_time() {
        let event = map_event(&json!({
            "type": "Normal",
            "reason": "Scheduled",
            "message": "assigned",
            "eventTime": "2024-05-01T10:00:00.123456Z",
            "reportingComponent": "default-scheduler"
        }));
        assert!(event.count.is_none());
        assert!(event.first_timestamp.is_some());
        assert_eq!(event.last_timestamp, event.first_timestamp);
        assert_eq!(event.source, "default-scheduler");
    }

    #[test]
    fn test_map_event_count_out_of_range() {
        let event = map_event(&json!({"count": 3_000_000_000_i64}));
        assert!(event.count.is_none());

        let event = map_event(&json!({"count": 2.5}));
        assert!(event.count.is_none());

        let event = map_event(&json!({"count": -1}));
        assert_eq!(event.count, Some(-1));
    }

    #[test]
    fn test_map_event_sparse() {
        let event = map_event(&json!({"count": "many"}));
        assert_eq!(event.event_type, "");
        assert!(event.count.is_none());
        assert!(event.first_timestamp.is_none());
        assert!(event.last_timestamp.is_none());
        assert_eq!(event.source, "");
    }
}

//! Per-kind health evaluation
//!
//! Health checks are plain functions over the raw object, registered by
//! (group, kind). The registry is built once and handed to the tree builder,
//! so callers decide which kinds get live health.

use crate::models::{HealthInfo, HealthStatus};
use crate::object::ObjectExt;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum HealthCheckError {
    #[error("field {field} must be {expected}")]
    FieldType {
        field: String,
        expected: &'static str,
    },

    #[error("{0}")]
    Invalid(String),
}

/// A health check over a raw object
pub type HealthCheck = Arc<dyn Fn(&Value) -> Result<HealthStatus, HealthCheckError> + Send + Sync>;

/// Health checks keyed by (group, kind)
#[derive(Clone, Default)]
pub struct HealthRegistry {
    checks: HashMap<(String, String), HealthCheck>,
}

impl HealthRegistry {
    /// Empty registry: no kind gets live health
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in workload, storage and config checks
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("apps", "Deployment", deployment_health);
        registry.register("apps", "StatefulSet", stateful_set_health);
        registry.register("apps", "DaemonSet", daemon_set_health);
        registry.register("batch", "Job", job_health);
        registry.register("batch", "CronJob", cron_job_health);
        registry.register("", "Pod", pod_health);
        registry.register("", "PersistentVolumeClaim", pvc_health);
        for kind in ["Service", "ConfigMap", "Secret", "ServiceAccount"] {
            registry.register("", kind, always_healthy);
        }
        registry
    }

    pub fn register<F>(&mut self, group: &str, kind: &str, check: F)
    where
        F: Fn(&Value) -> Result<HealthStatus, HealthCheckError> + Send + Sync + 'static,
    {
        self.checks
            .insert((group.to_string(), kind.to_string()), Arc::new(check));
    }

    pub fn contains(&self, group: &str, kind: &str) -> bool {
        self.checks
            .contains_key(&(group.to_string(), kind.to_string()))
    }

    /// Live health of `obj`, or `None` when no check is registered for the kind
    ///
    /// A failing check yields `Unknown` with the error text as message.
    pub fn evaluate(&self, group: &str, kind: &str, obj: &Value) -> Option<HealthInfo> {
        let check = self.checks.get(&(group.to_string(), kind.to_string()))?;
        match check(obj) {
            Ok(status) => Some(HealthInfo::new(status)),
            Err(e) => {
                tracing::debug!("Health check for {}/{} failed: {}", group, kind, e);
                Some(HealthInfo::with_message(HealthStatus::Unknown, e.to_string()))
            }
        }
    }
}

impl std::fmt::Debug for HealthRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut keys: Vec<_> = self.checks.keys().collect();
        keys.sort();
        f.debug_struct("HealthRegistry").field("kinds", &keys).finish()
    }
}

fn lookup<'a>(obj: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut current = obj;
    for key in path {
        current = current.as_object()?.get(*key)?;
    }
    if current.is_null() { None } else { Some(current) }
}

fn int_field(obj: &Value, path: &[&str]) -> Result<Option<i64>, HealthCheckError> {
    match lookup(obj, path) {
        None => Ok(None),
        Some(v) => v.as_i64().map(Some).ok_or_else(|| HealthCheckError::FieldType {
            field: path.join("."),
            expected: "an integer",
        }),
    }
}

fn bool_field(obj: &Value, path: &[&str]) -> Result<bool, HealthCheckError> {
    match lookup(obj, path) {
        None => Ok(false),
        Some(v) => v.as_bool().ok_or_else(|| HealthCheckError::FieldType {
            field: path.join("."),
            expected: "a boolean",
        }),
    }
}

fn str_field<'a>(obj: &'a Value, path: &[&str]) -> Result<Option<&'a str>, HealthCheckError> {
    match lookup(obj, path) {
        None => Ok(None),
        Some(v) => v.as_str().map(Some).ok_or_else(|| HealthCheckError::FieldType {
            field: path.join("."),
            expected: "a string",
        }),
    }
}

/// `status.conditions[]` entries that are objects
fn conditions(obj: &Value) -> Vec<&Value> {
    obj.get("status")
        .and_then(|s| s.get("conditions"))
        .and_then(|c| c.as_array())
        .map(|c| c.iter().filter(|c| c.is_object()).collect())
        .unwrap_or_default()
}

fn find_condition<'a>(obj: &'a Value, condition_type: &str) -> Option<&'a Value> {
    conditions(obj)
        .into_iter()
        .find(|c| c.nested_str(&["type"]) == Some(condition_type))
}

fn condition_is_true(obj: &Value, condition_type: &str) -> bool {
    find_condition(obj, condition_type).and_then(|c| c.nested_str(&["status"])) == Some("True")
}

/// True when the controller has not yet observed the latest spec
fn generation_pending(obj: &Value) -> Result<bool, HealthCheckError> {
    let generation = int_field(obj, &["metadata", "generation"])?.unwrap_or(0);
    let observed = int_field(obj, &["status", "observedGeneration"])?.unwrap_or(0);
    Ok(observed < generation)
}

fn deployment_health(obj: &Value) -> Result<HealthStatus, HealthCheckError> {
    if bool_field(obj, &["spec", "paused"])? {
        return Ok(HealthStatus::Suspended);
    }

    let deadline_exceeded = find_condition(obj, "Progressing")
        .and_then(|c| c.nested_str(&["reason"]))
        == Some("ProgressDeadlineExceeded");
    if deadline_exceeded {
        return Ok(HealthStatus::Degraded);
    }

    if generation_pending(obj)? {
        return Ok(HealthStatus::Progressing);
    }

    let desired = int_field(obj, &["spec", "replicas"])?.unwrap_or(1);
    for field in ["updatedReplicas", "readyReplicas", "availableReplicas"] {
        if int_field(obj, &["status", field])?.unwrap_or(0) < desired {
            return Ok(HealthStatus::Progressing);
        }
    }

    Ok(HealthStatus::Healthy)
}

fn stateful_set_health(obj: &Value) -> Result<HealthStatus, HealthCheckError> {
    if generation_pending(obj)? {
        return Ok(HealthStatus::Progressing);
    }

    let desired = int_field(obj, &["spec", "replicas"])?.unwrap_or(1);
    for field in ["readyReplicas", "updatedReplicas"] {
        if int_field(obj, &["status", field])?.unwrap_or(0) < desired {
            return Ok(HealthStatus::Progressing);
        }
    }

    Ok(HealthStatus::Healthy)
}

fn daemon_set_health(obj: &Value) -> Result<HealthStatus, HealthCheckError> {
    if generation_pending(obj)? {
        return Ok(HealthStatus::Progressing);
    }

    let desired = int_field(obj, &["status", "desiredNumberScheduled"])?.unwrap_or(0);
    for field in ["numberReady", "updatedNumberScheduled"] {
        if int_field(obj, &["status", field])?.unwrap_or(0) < desired {
            return Ok(HealthStatus::Progressing);
        }
    }

    Ok(HealthStatus::Healthy)
}

fn job_health(obj: &Value) -> Result<HealthStatus, HealthCheckError> {
    if condition_is_true(obj, "Failed") {
        return Ok(HealthStatus::Degraded);
    }
    if condition_is_true(obj, "Complete") {
        return Ok(HealthStatus::Healthy);
    }
    if bool_field(obj, &["spec", "suspend"])? {
        return Ok(HealthStatus::Suspended);
    }
    Ok(HealthStatus::Progressing)
}

fn cron_job_health(obj: &Value) -> Result<HealthStatus, HealthCheckError> {
    if bool_field(obj, &["spec", "suspend"])? {
        Ok(HealthStatus::Suspended)
    } else {
        Ok(HealthStatus::Healthy)
    }
}

/// Waiting reasons that mean a container will not start on its own
const STUCK_WAITING_REASONS: &[&str] = &["CrashLoopBackOff", "ImagePullBackOff", "ErrImagePull"];

fn pod_health(obj: &Value) -> Result<HealthStatus, HealthCheckError> {
    match str_field(obj, &["status", "phase"])? {
        Some("Succeeded") => Ok(HealthStatus::Healthy),
        Some("Failed") => Ok(HealthStatus::Degraded),
        Some("Pending") => Ok(HealthStatus::Progressing),
        Some("Running") => {
            let stuck = obj
                .get("status")
                .and_then(|s| s.get("containerStatuses"))
                .and_then(|c| c.as_array())
                .map(|statuses| {
                    statuses.iter().any(|cs| {
                        cs.nested_str(&["state", "waiting", "reason"])
                            .map(|r| STUCK_WAITING_REASONS.contains(&r))
                            .unwrap_or(false)
                    })
                })
                .unwrap_or(false);

            if stuck {
                Ok(HealthStatus::Degraded)
            } else if condition_is_true(obj, "Ready") {
                Ok(HealthStatus::Healthy)
            } else {
                Ok(HealthStatus::Progressing)
            }
        }
        _ => Ok(HealthStatus::Unknown),
    }
}

fn pvc_health(obj: &Value) -> Result<HealthStatus, HealthCheckError> {
    match str_field(obj, &["status", "phase"])? {
        Some("Bound") => Ok(HealthStatus::Healthy),
        Some("Pending") => Ok(HealthStatus::Progressing),
        Some("Lost") => Ok(HealthStatus::Degraded),
        _ => Ok(HealthStatus::Unknown),
    }
}

fn always_healthy(_obj: &Value) -> Result<HealthStatus, HealthCheckError> {
    Ok(HealthStatus::Healthy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn eval(group: &str, kind: &str, obj: Value) -> Option<HealthInfo> {
        HealthRegistry::with_defaults().evaluate(group, kind, &obj)
    }

    fn status(group: &str, kind: &str, obj: Value) -> HealthStatus {
        eval(group, kind, obj).unwrap().status
    }

    #[test]
    fn test_unregistered_kind_has_no_health() {
        assert_eq!(eval("example.dev", "Widget", json!({})), None);
        assert_eq!(HealthRegistry::new().evaluate("apps", "Deployment", &json!({})), None);
    }

    #[test]
    fn test_group_is_part_of_key() {
        // A Deployment check must not fire for a same-named kind in another group
        assert_eq!(eval("example.dev", "Deployment", json!({})), None);
    }

    #[test]
    fn test_deployment_rolled_out() {
        let obj = json!({
            "metadata": {"generation": 2},
            "spec": {"replicas": 2},
            "status": {"observedGeneration": 2, "updatedReplicas": 2, "readyReplicas": 2, "availableReplicas": 2}
        });
        assert_eq!(status("apps", "Deployment", obj), HealthStatus::Healthy);
    }

    #[test]
    fn test_deployment_progressing_and_degraded() {
        let lagging = json!({
            "spec": {"replicas": 3},
            "status": {"updatedReplicas": 3, "readyReplicas": 1, "availableReplicas": 1}
        });
        assert_eq!(status("apps", "Deployment", lagging), HealthStatus::Progressing);

        let stale = json!({"metadata": {"generation": 5}, "status": {"observedGeneration": 4}});
        assert_eq!(status("apps", "Deployment", stale), HealthStatus::Progressing);

        let stuck = json!({
            "status": {"conditions": [{"type": "Progressing", "status": "False", "reason": "ProgressDeadlineExceeded"}]}
        });
        assert_eq!(status("apps", "Deployment", stuck), HealthStatus::Degraded);

        let paused = json!({"spec": {"paused": true}});
        assert_eq!(status("apps", "Deployment", paused), HealthStatus::Suspended);
    }

    #[test]
    fn test_failing_check_yields_unknown_with_message() {
        let obj = json!({"spec": {"replicas": "three"}});
        let health = eval("apps", "Deployment", obj).unwrap();
        assert_eq!(health.status, HealthStatus::Unknown);
        assert_eq!(health.message.as_deref(), Some("field spec.replicas must be an integer"));
    }

    #[test]
    fn test_custom_check_error_message() {
        let mut registry = HealthRegistry::new();
        registry.register("example.dev", "Widget", |_| {
            Err(HealthCheckError::Invalid("widget is broken".to_string()))
        });
        let health = registry.evaluate("example.dev", "Widget", &json!({})).unwrap();
        assert_eq!(
            health,
            HealthInfo::with_message(HealthStatus::Unknown, "widget is broken")
        );
    }

    #[test]
    fn test_job_states() {
        let failed = json!({"status": {"conditions": [{"type": "Failed", "status": "True"}]}});
        assert_eq!(status("batch", "Job", failed), HealthStatus::Degraded);

        let complete = json!({"status": {"conditions": [{"type": "Complete", "status": "True"}]}});
        assert_eq!(status("batch", "Job", complete), HealthStatus::Healthy);

        let suspended = json!({"spec": {"suspend": true}});
        assert_eq!(status("batch", "Job", suspended), HealthStatus::Suspended);

        assert_eq!(status("batch", "Job", json!({})), HealthStatus::Progressing);
    }

    #[test]
    fn test_cron_job() {
        assert_eq!(status("batch", "CronJob", json!({"spec": {"suspend": true}})), HealthStatus::Suspended);
        assert_eq!(status("batch", "CronJob", json!({"spec": {}})), HealthStatus::Healthy);
    }

    #[test]
    fn test_pod_phases() {
        assert_eq!(status("", "Pod", json!({"status": {"phase": "Succeeded"}})), HealthStatus::Healthy);
        assert_eq!(status("", "Pod", json!({"status": {"phase": "Failed"}})), HealthStatus::Degraded);
        assert_eq!(status("", "Pod", json!({"status": {"phase": "Pending"}})), HealthStatus::Progressing);
        assert_eq!(status("", "Pod", json!({})), HealthStatus::Unknown);
    }

    #[test]
    fn test_running_pod() {
        let ready = json!({
            "status": {"phase": "Running", "conditions": [{"type": "Ready", "status": "True"}]}
        });
        assert_eq!(status("", "Pod", ready), HealthStatus::Healthy);

        let not_ready = json!({
            "status": {"phase": "Running", "conditions": [{"type": "Ready", "status": "False"}]}
        });
        assert_eq!(status("", "Pod", not_ready), HealthStatus::Progressing);

        let crashing = json!({
            "status": {
                "phase": "Running",
                "conditions": [{"type": "Ready", "status": "True"}],
                "containerStatuses": [{"state": {"waiting": {"reason": "CrashLoopBackOff"}}}]
            }
        });
        assert_eq!(status("", "Pod", crashing), HealthStatus::Degraded);
    }

    #[test]
    fn test_stateful_set_and_daemon_set() {
        let sts = json!({"spec": {"replicas": 2}, "status": {"readyReplicas": 2, "updatedReplicas": 1}});
        assert_eq!(status("apps", "StatefulSet", sts), HealthStatus::Progressing);

        let ds = json!({"status": {"desiredNumberScheduled": 3, "numberReady": 3, "updatedNumberScheduled": 3}});
        assert_eq!(status("apps", "DaemonSet", ds), HealthStatus::Healthy);
    }

    #[test]
    fn test_pvc_and_config_kinds() {
        assert_eq!(status("", "PersistentVolumeClaim", json!({"status": {"phase": "Bound"}})), HealthStatus::Healthy);
        assert_eq!(status("", "PersistentVolumeClaim", json!({"status": {"phase": "Lost"}})), HealthStatus::Degraded);
        assert_eq!(status("", "ConfigMap", json!({})), HealthStatus::Healthy);
        assert_eq!(status("", "Secret", json!({})), HealthStatus::Healthy);
    }
}

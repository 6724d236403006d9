//! Kubernetes REST path construction
//!
//! Paths are relative (no leading `/`) because they are appended to the
//! gateway's `/k8s/` prefix.

/// `api/{version}` for the core group, `apis/{group}/{version}` otherwise
pub fn api_prefix(group: &str, version: &str) -> String {
    if group.is_empty() {
        format!("api/{}", version)
    } else {
        format!("apis/{}/{}", group, version)
    }
}

/// Path of a single named object. An empty namespace means cluster-scoped.
pub fn get_path(group: &str, version: &str, plural: &str, namespace: &str, name: &str) -> String {
    format!("{}/{}", list_path(group, version, plural, namespace), name)
}

/// Path of a collection. An empty namespace lists across the cluster.
pub fn list_path(group: &str, version: &str, plural: &str, namespace: &str) -> String {
    let prefix = api_prefix(group, version);
    if namespace.is_empty() {
        format!("{}/{}", prefix, plural)
    } else {
        format!("{}/namespaces/{}/{}", prefix, namespace, plural)
    }
}

/// Log subresource of a pod
pub fn pod_log_path(namespace: &str, pod: &str) -> String {
    format!("{}/log", get_path("", "v1", "pods", namespace, pod))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_group_paths() {
        assert_eq!(
            get_path("", "v1", "services", "dp-ns", "web"),
            "api/v1/namespaces/dp-ns/services/web"
        );
        assert_eq!(list_path("", "v1", "pods", "dp-ns"), "api/v1/namespaces/dp-ns/pods");
    }

    #[test]
    fn test_named_group_paths() {
        assert_eq!(
            get_path("apps", "v1", "deployments", "dp-ns", "web"),
            "apis/apps/v1/namespaces/dp-ns/deployments/web"
        );
        assert_eq!(
            list_path("batch", "v1", "jobs", "dp-ns"),
            "apis/batch/v1/namespaces/dp-ns/jobs"
        );
    }

    #[test]
    fn test_cluster_scoped_paths() {
        assert_eq!(
            get_path("rbac.authorization.k8s.io", "v1", "clusterroles", "", "view"),
            "apis/rbac.authorization.k8s.io/v1/clusterroles/view"
        );
        assert_eq!(list_path("", "v1", "namespaces", ""), "api/v1/namespaces");
    }

    #[test]
    fn test_pod_log_path() {
        assert_eq!(
            pod_log_path("dp-ns", "web-abc"),
            "api/v1/namespaces/dp-ns/pods/web-abc/log"
        );
    }
}

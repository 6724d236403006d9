//! Resource type resolution
//!
//! Maps a (group, version, kind) triple to the REST plural used in API paths.
//! Kinds come from a Release's recorded resources, so they are only known at
//! runtime and must be resolved against discovery metadata instead of being
//! pluralized by hand.

use async_trait::async_trait;
use kube::core::GroupVersionKind;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("no resource type registered for {kind} in {group}/{version}")]
    NotFound {
        group: String,
        version: String,
        kind: String,
    },

    #[error("discovery failed for {kind}: {source}")]
    Discovery {
        kind: String,
        #[source]
        source: kube::Error,
    },
}

/// Resolves REST plurals for runtime-known kinds
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ResourceResolver: Send + Sync {
    async fn resolve_plural(
        &self,
        group: &str,
        version: &str,
        kind: &str,
    ) -> Result<String, ResolutionError>;
}

/// Resolver backed by the API server's discovery endpoints
///
/// Each lookup queries discovery for the single group/version it needs, so
/// CRDs installed after startup resolve without a restart.
pub struct DiscoveryResolver {
    client: kube::Client,
}

impl DiscoveryResolver {
    pub fn new(client: kube::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ResourceResolver for DiscoveryResolver {
    async fn resolve_plural(
        &self,
        group: &str,
        version: &str,
        kind: &str,
    ) -> Result<String, ResolutionError> {
        let gvk = GroupVersionKind::gvk(group, version, kind);
        let (api_resource, _caps) = kube::discovery::pinned_kind(&self.client, &gvk)
            .await
            .map_err(|source| ResolutionError::Discovery {
                kind: kind.to_string(),
                source,
            })?;

        tracing::debug!(
            "Resolved {}/{} {} to plural {}",
            group,
            version,
            kind,
            api_resource.plural
        );
        Ok(api_resource.plural)
    }
}

/// Fixed (group, kind) -> plural table
///
/// Version is ignored: built-in kinds keep the same plural across versions.
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    plurals: HashMap<(String, String), String>,
}

/// Well-known built-in kinds as (group, kind, plural)
const BUILTIN_KINDS: &[(&str, &str, &str)] = &[
    ("", "Pod", "pods"),
    ("", "Service", "services"),
    ("", "ConfigMap", "configmaps"),
    ("", "Secret", "secrets"),
    ("", "ServiceAccount", "serviceaccounts"),
    ("", "PersistentVolumeClaim", "persistentvolumeclaims"),
    ("", "Namespace", "namespaces"),
    ("", "Event", "events"),
    ("apps", "Deployment", "deployments"),
    ("apps", "ReplicaSet", "replicasets"),
    ("apps", "StatefulSet", "statefulsets"),
    ("apps", "DaemonSet", "daemonsets"),
    ("batch", "Job", "jobs"),
    ("batch", "CronJob", "cronjobs"),
    ("networking.k8s.io", "Ingress", "ingresses"),
    ("networking.k8s.io", "NetworkPolicy", "networkpolicies"),
    ("autoscaling", "HorizontalPodAutoscaler", "horizontalpodautoscalers"),
    ("policy", "PodDisruptionBudget", "poddisruptionbudgets"),
    ("rbac.authorization.k8s.io", "Role", "roles"),
    ("rbac.authorization.k8s.io", "RoleBinding", "rolebindings"),
    ("rbac.authorization.k8s.io", "ClusterRole", "clusterroles"),
    ("rbac.authorization.k8s.io", "ClusterRoleBinding", "clusterrolebindings"),
    ("gateway.networking.k8s.io", "HTTPRoute", "httproutes"),
];

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table pre-filled with the core Kubernetes workload and config kinds
    pub fn with_builtins() -> Self {
        let mut resolver = Self::new();
        for (group, kind, plural) in BUILTIN_KINDS {
            resolver.register(group, kind, plural);
        }
        resolver
    }

    pub fn register(&mut self, group: &str, kind: &str, plural: &str) {
        self.plurals
            .insert((group.to_string(), kind.to_string()), plural.to_string());
    }
}

#[async_trait]
impl ResourceResolver for StaticResolver {
    async fn resolve_plural(
        &self,
        group: &str,
        version: &str,
        kind: &str,
    ) -> Result<String, ResolutionError> {
        self.plurals
            .get(&(group.to_string(), kind.to_string()))
            .cloned()
            .ok_or_else(|| ResolutionError::NotFound {
                group: group.to_string(),
                version: version.to_string(),
                kind: kind.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_resolver_builtins() {
        let resolver = StaticResolver::with_builtins();
        assert_eq!(
            resolver.resolve_plural("apps", "v1", "Deployment").await.unwrap(),
            "deployments"
        );
        assert_eq!(
            resolver.resolve_plural("", "v1", "Pod").await.unwrap(),
            "pods"
        );
        assert_eq!(
            resolver
                .resolve_plural("networking.k8s.io", "v1", "Ingress")
                .await
                .unwrap(),
            "ingresses"
        );
    }

    #[tokio::test]
    async fn test_static_resolver_group_must_match() {
        let resolver = StaticResolver::with_builtins();
        let err = resolver
            .resolve_plural("", "v1", "Deployment")
            .await
            .unwrap_err();
        assert!(matches!(err, ResolutionError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_static_resolver_custom_kind() {
        let mut resolver = StaticResolver::new();
        resolver.register("example.dev", "Widget", "widgets");
        assert_eq!(
            resolver
                .resolve_plural("example.dev", "v1alpha1", "Widget")
                .await
                .unwrap(),
            "widgets"
        );
    }
}

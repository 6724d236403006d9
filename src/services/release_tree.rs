//! Release resource tree service
//!
//! Resolves which Release and data plane a (namespace, project, component,
//! environment) tuple points at, then hands the Release's recorded resources
//! to the `TreeBuilder`. Plane coordinates are resolved on every call.

use crate::error::TreeError;
use crate::models::resource::CLUSTER_SCOPED_NAMESPACE;
use crate::models::{PlaneCoordinates, ResourceTreeResponse};
use crate::platform::{
    Authorizer, AuthzRequest, ControlPlane, Decision, Environment, KIND_CLUSTER_DATA_PLANE,
    KIND_DATA_PLANE, Release, ReleaseSelector,
};
use crate::tree::TreeBuilder;
use std::sync::Arc;

/// A Release together with the data plane it is deployed to
#[derive(Debug, Clone)]
pub struct ResolvedRelease {
    pub release: Release,
    pub plane: PlaneCoordinates,
}

/// Entry point for release tree and event lookups
pub struct ReleaseTreeService {
    authorizer: Arc<dyn Authorizer>,
    store: Arc<dyn ControlPlane>,
    tree: Option<TreeBuilder>,
}

impl ReleaseTreeService {
    /// `tree` is `None` when no gateway is configured; every lookup then fails
    /// with `GatewayNotConfigured` after the authorization check.
    pub fn new(
        authorizer: Arc<dyn Authorizer>,
        store: Arc<dyn ControlPlane>,
        tree: Option<TreeBuilder>,
    ) -> Self {
        Self {
            authorizer,
            store,
            tree,
        }
    }

    /// Live, health-annotated nodes of the Release deployed for `component`
    /// in `environment`
    pub async fn get_release_resource_tree(
        &self,
        namespace: &str,
        project: &str,
        component: &str,
        environment: &str,
    ) -> Result<ResourceTreeResponse, TreeError> {
        tracing::debug!(
            "Getting release resource tree for {}/{}/{} in {}",
            namespace,
            project,
            component,
            environment
        );

        let tree = self.check_access(namespace, project, component).await?;
        let resolved = self
            .resolve_release(namespace, project, component, environment)
            .await?;

        let nodes = tree
            .build(&resolved.plane, &resolved.release.resources)
            .await;
        tracing::debug!(
            "Release {} produced {} nodes from {} declared resources",
            resolved.release.name,
            nodes.len(),
            resolved.release.resources.len()
        );

        Ok(ResourceTreeResponse { nodes })
    }

    /// Authorization, then gateway availability
    pub(crate) async fn check_access(
        &self,
        namespace: &str,
        project: &str,
        component: &str,
    ) -> Result<&TreeBuilder, TreeError> {
        let request = AuthzRequest::view_component(namespace, project, component);
        let decision = self
            .authorizer
            .authorize(&request)
            .await
            .map_err(TreeError::Authorization)?;
        if decision == Decision::Deny {
            return Err(TreeError::Forbidden {
                namespace: namespace.to_string(),
                project: project.to_string(),
                component: component.to_string(),
            });
        }

        self.tree.as_ref().ok_or(TreeError::GatewayNotConfigured)
    }

    /// Component, its single Release in the environment, and the plane behind
    /// the environment. Fails before any data-plane traffic.
    pub async fn resolve_release(
        &self,
        namespace: &str,
        project: &str,
        component: &str,
        environment: &str,
    ) -> Result<ResolvedRelease, TreeError> {
        let found = self
            .store
            .component(namespace, component)
            .await
            .map_err(TreeError::Store)?;
        match found {
            Some(c) if c.project == project => {}
            Some(c) => {
                tracing::debug!(
                    "Component {} belongs to project {}, not {}",
                    component,
                    c.project,
                    project
                );
                return Err(TreeError::ComponentNotFound(component.to_string()));
            }
            None => return Err(TreeError::ComponentNotFound(component.to_string())),
        }

        let selector = ReleaseSelector {
            namespace: namespace.to_string(),
            project: project.to_string(),
            component: component.to_string(),
            environment: environment.to_string(),
        };
        let mut releases = self
            .store
            .releases(&selector)
            .await
            .map_err(TreeError::Store)?;
        let release = match releases.len() {
            0 => {
                return Err(TreeError::ReleaseNotFound {
                    component: component.to_string(),
                    environment: environment.to_string(),
                });
            }
            1 => releases.remove(0),
            count => {
                tracing::error!(
                    "Found {} releases for component {} in environment {}",
                    count,
                    component,
                    environment
                );
                return Err(TreeError::AmbiguousRelease { count });
            }
        };

        let env = self
            .store
            .environment(namespace, environment)
            .await
            .map_err(TreeError::Store)?
            .ok_or_else(|| TreeError::EnvironmentNotFound(environment.to_string()))?;

        let plane = self.resolve_plane(&env).await?;
        tracing::debug!(
            "Resolved plane {} ({}/{}) for environment {}",
            plane.plane_id,
            plane.cr_namespace,
            plane.cr_name,
            environment
        );

        Ok(ResolvedRelease { release, plane })
    }

    /// Gateway coordinates of the data plane an environment points at
    pub async fn resolve_plane(&self, env: &Environment) -> Result<PlaneCoordinates, TreeError> {
        let dp_ref = env
            .data_plane_ref
            .as_ref()
            .ok_or_else(|| TreeError::DataPlaneMissing(env.name.clone()))?;

        match dp_ref.kind.as_str() {
            KIND_DATA_PLANE => {
                let dp = self
                    .store
                    .data_plane(&env.namespace, &dp_ref.name)
                    .await
                    .map_err(TreeError::Store)?
                    .ok_or_else(|| TreeError::DataPlaneNotFound {
                        kind: KIND_DATA_PLANE.to_string(),
                        name: dp_ref.name.clone(),
                    })?;
                Ok(PlaneCoordinates::data_plane(
                    dp.effective_plane_id(),
                    &dp.namespace,
                    &dp.name,
                ))
            }
            KIND_CLUSTER_DATA_PLANE => {
                let cdp = self
                    .store
                    .cluster_data_plane(&dp_ref.name)
                    .await
                    .map_err(TreeError::Store)?
                    .ok_or_else(|| TreeError::DataPlaneNotFound {
                        kind: KIND_CLUSTER_DATA_PLANE.to_string(),
                        name: dp_ref.name.clone(),
                    })?;
                Ok(PlaneCoordinates::data_plane(
                    cdp.effective_plane_id(),
                    CLUSTER_SCOPED_NAMESPACE,
                    &cdp.name,
                ))
            }
            other => Err(TreeError::UnsupportedDataPlaneRef(other.to_string())),
        }
    }
}

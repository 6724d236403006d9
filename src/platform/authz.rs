//! Authorization seam
//!
//! `AllowAll` is used when authorization is disabled. `AccessReviewAuthorizer`
//! asks the control-plane API server whether the current identity may read the
//! Component.

use super::PLATFORM_GROUP;
use anyhow::{Context, Result};
use async_trait::async_trait;
use k8s_openapi::api::authorization::v1::{
    ResourceAttributes, SelfSubjectAccessReview, SelfSubjectAccessReviewSpec,
};
use kube::Api;
use kube::api::PostParams;

/// Action checked before reading any component data
pub const ACTION_VIEW_COMPONENT: &str = "component:view";
pub const RESOURCE_TYPE_COMPONENT: &str = "component";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceHierarchy {
    pub namespace: String,
    pub project: String,
    pub component: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthzRequest {
    pub action: String,
    pub resource_type: String,
    pub resource_id: String,
    pub hierarchy: ResourceHierarchy,
}

impl AuthzRequest {
    /// `component:view` on one component
    pub fn view_component(namespace: &str, project: &str, component: &str) -> Self {
        Self {
            action: ACTION_VIEW_COMPONENT.to_string(),
            resource_type: RESOURCE_TYPE_COMPONENT.to_string(),
            resource_id: component.to_string(),
            hierarchy: ResourceHierarchy {
                namespace: namespace.to_string(),
                project: project.to_string(),
                component: component.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

/// A policy decision point
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Authorizer: Send + Sync {
    async fn authorize(&self, request: &AuthzRequest) -> Result<Decision>;
}

/// Allows every request; used when authorization is disabled
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

#[async_trait]
impl Authorizer for AllowAll {
    async fn authorize(&self, request: &AuthzRequest) -> Result<Decision> {
        tracing::debug!(
            "Authorization disabled, allowing {} on {}",
            request.action,
            request.resource_id
        );
        Ok(Decision::Allow)
    }
}

/// Delegates to a `SelfSubjectAccessReview` on the control-plane cluster
///
/// `component:view` maps to `get` on `components.openchoreo.dev` in the
/// request namespace.
pub struct AccessReviewAuthorizer {
    client: kube::Client,
}

impl AccessReviewAuthorizer {
    pub fn new(client: kube::Client) -> Self {
        Self { client }
    }
}

/// Build the review for a request
pub fn access_review(request: &AuthzRequest) -> SelfSubjectAccessReview {
    let verb = match request.action.split_once(':') {
        Some((_, "view")) => "get",
        Some((_, other)) => other,
        None => request.action.as_str(),
    };

    SelfSubjectAccessReview {
        spec: SelfSubjectAccessReviewSpec {
            resource_attributes: Some(ResourceAttributes {
                group: Some(PLATFORM_GROUP.to_string()),
                resource: Some(format!("{}s", request.resource_type)),
                verb: Some(verb.to_string()),
                namespace: Some(request.hierarchy.namespace.clone()),
                name: Some(request.resource_id.clone()),
                ..Default::default()
            }),
            ..Default::default()
        },
        ..Default::default()
    }
}

#[async_trait]
impl Authorizer for AccessReviewAuthorizer {
    async fn authorize(&self, request: &AuthzRequest) -> Result<Decision> {
        let api: Api<SelfSubjectAccessReview> = Api::all(self.client.clone());
        let review = api
            .create(&PostParams::default(), &access_review(request))
            .await
            .with_context(|| {
                format!(
                    "Failed to review {} on {}/{}",
                    request.action, request.hierarchy.namespace, request.resource_id
                )
            })?;

        let allowed = review.status.map(|s| s.allowed).unwrap_or(false);
        tracing::debug!(
            "Access review for {} on {}: allowed={}",
            request.action,
            request.resource_id,
            allowed
        );
        Ok(if allowed { Decision::Allow } else { Decision::Deny })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_component_request() {
        let req = AuthzRequest::view_component("acme", "shop", "web");
        assert_eq!(req.action, "component:view");
        assert_eq!(req.resource_type, "component");
        assert_eq!(req.resource_id, "web");
        assert_eq!(req.hierarchy.project, "shop");
    }

    #[test]
    fn test_access_review_attributes() {
        let review = access_review(&AuthzRequest::view_component("acme", "shop", "web"));
        let attrs = review.spec.resource_attributes.unwrap();
        assert_eq!(attrs.group.as_deref(), Some("openchoreo.dev"));
        assert_eq!(attrs.resource.as_deref(), Some("components"));
        assert_eq!(attrs.verb.as_deref(), Some("get"));
        assert_eq!(attrs.namespace.as_deref(), Some("acme"));
        assert_eq!(attrs.name.as_deref(), Some("web"));
    }

    #[tokio::test]
    async fn test_allow_all() {
        let req = AuthzRequest::view_component("acme", "shop", "web");
        assert_eq!(AllowAll.authorize(&req).await.unwrap(), Decision::Allow);
    }
}

//! kube-rs backed control-plane store

use super::{
    ClusterDataPlane, Component, ControlPlane, DataPlane, Environment, PLATFORM_GROUP,
    PLATFORM_VERSION, Release, ReleaseSelector,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use kube::Api;
use kube::api::ListParams;
use kube::core::{ApiResource, DynamicObject, GroupVersionKind};
use serde_json::Value;

fn platform_resource(kind: &str, plural: &str) -> ApiResource {
    ApiResource::from_gvk_with_plural(
        &GroupVersionKind::gvk(PLATFORM_GROUP, PLATFORM_VERSION, kind),
        plural,
    )
}

/// Reads platform custom resources as dynamic objects
pub struct KubeControlPlane {
    client: kube::Client,
}

impl KubeControlPlane {
    pub fn new(client: kube::Client) -> Self {
        Self { client }
    }

    async fn get_namespaced(
        &self,
        kind: &str,
        plural: &str,
        namespace: &str,
        name: &str,
    ) -> Result<Option<Value>> {
        let resource = platform_resource(kind, plural);
        let api: Api<DynamicObject> = Api::namespaced_with(self.client.clone(), namespace, &resource);
        let obj = api
            .get_opt(name)
            .await
            .with_context(|| format!("Failed to get {} {}/{}", kind, namespace, name))?;
        obj.map(|o| serde_json::to_value(&o).context("Failed to serialize object to JSON"))
            .transpose()
    }
}

#[async_trait]
impl ControlPlane for KubeControlPlane {
    async fn component(&self, namespace: &str, name: &str) -> Result<Option<Component>> {
        self.get_namespaced("Component", "components", namespace, name)
            .await?
            .map(|obj| Component::from_object(&obj))
            .transpose()
    }

    async fn releases(&self, selector: &ReleaseSelector) -> Result<Vec<Release>> {
        let resource = platform_resource("Release", "releases");
        let api: Api<DynamicObject> =
            Api::namespaced_with(self.client.clone(), &selector.namespace, &resource);
        let label_selector = selector.to_label_selector();
        tracing::debug!("Listing releases with selector {}", label_selector);

        let list = api
            .list(&ListParams::default().labels(&label_selector))
            .await
            .with_context(|| format!("Failed to list releases in {}", selector.namespace))?;

        list.items
            .iter()
            .map(|o| {
                let obj = serde_json::to_value(o).context("Failed to serialize object to JSON")?;
                Release::from_object(&obj)
            })
            .collect()
    }

    async fn environment(&self, namespace: &str, name: &str) -> Result<Option<Environment>> {
        self.get_namespaced("Environment", "environments", namespace, name)
            .await?
            .map(|obj| Environment::from_object(&obj))
            .transpose()
    }

    async fn data_plane(&self, namespace: &str, name: &str) -> Result<Option<DataPlane>> {
        self.get_namespaced("DataPlane", "dataplanes", namespace, name)
            .await?
            .map(|obj| DataPlane::from_object(&obj))
            .transpose()
    }

    async fn cluster_data_plane(&self, name: &str) -> Result<Option<ClusterDataPlane>> {
        let resource = platform_resource("ClusterDataPlane", "clusterdataplanes");
        let api: Api<DynamicObject> = Api::all_with(self.client.clone(), &resource);
        let obj = api
            .get_opt(name)
            .await
            .with_context(|| format!("Failed to get ClusterDataPlane {}", name))?;
        match obj {
            Some(o) => {
                let value = serde_json::to_value(&o).context("Failed to serialize object to JSON")?;
                DataPlane::from_object(&value).map(Some)
            }
            None => Ok(None),
        }
    }
}

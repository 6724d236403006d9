//! HTTP gateway client

use super::{ProxyClient, ProxyRequest, ProxyResponse};
use crate::models::PlaneCoordinates;
use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use std::path::PathBuf;
use std::time::Duration;

/// Connection settings for the gateway
#[derive(Debug, Clone)]
pub struct GatewaySettings {
    pub base_url: String,
    pub timeout: Duration,
    /// PEM bundle trusted in addition to the system roots
    pub ca_file: Option<PathBuf>,
    pub insecure_skip_verify: bool,
}

impl GatewaySettings {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(10),
            ca_file: None,
            insecure_skip_verify: false,
        }
    }
}

/// `ProxyClient` that talks to the gateway's `/api/proxy` endpoint
pub struct GatewayClient {
    client: reqwest::Client,
    base_url: String,
}

impl GatewayClient {
    pub fn new(settings: &GatewaySettings) -> Result<Self> {
        if settings.base_url.trim().is_empty() {
            anyhow::bail!("gateway base URL is required");
        }
        url::Url::parse(&settings.base_url)
            .with_context(|| format!("Invalid gateway URL: {}", settings.base_url))?;

        let mut builder = reqwest::Client::builder().timeout(settings.timeout);

        if let Some(ca_file) = &settings.ca_file {
            let pem = std::fs::read(ca_file)
                .with_context(|| format!("Failed to read CA file {}", ca_file.display()))?;
            let cert = reqwest::Certificate::from_pem(&pem)
                .with_context(|| format!("Failed to parse CA certificate {}", ca_file.display()))?;
            builder = builder.add_root_certificate(cert);
        }

        if crate::kube::should_bypass_proxy(&settings.base_url) {
            tracing::debug!("Bypassing proxy for gateway {}", settings.base_url);
            builder = builder.no_proxy();
        }

        if settings.insecure_skip_verify {
            tracing::warn!("TLS verification disabled for gateway {}", settings.base_url);
            builder = builder.danger_accept_invalid_certs(true);
        }

        let client = builder.build().context("Failed to create HTTP client")?;

        tracing::debug!("Created gateway client for: {}", settings.base_url);

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Full proxy URL for a request, without the query string
    pub fn proxy_url(&self, plane: &PlaneCoordinates, path: &str) -> String {
        proxy_url(&self.base_url, plane, path)
    }
}

fn proxy_url(base_url: &str, plane: &PlaneCoordinates, path: &str) -> String {
    format!(
        "{}/api/proxy/{}/{}/{}/{}/k8s/{}",
        base_url.trim_end_matches('/'),
        plane.plane_type,
        plane.plane_id,
        plane.cr_namespace,
        plane.cr_name,
        path.trim_start_matches('/')
    )
}

#[async_trait]
impl ProxyClient for GatewayClient {
    async fn proxy(
        &self,
        plane: &PlaneCoordinates,
        request: &ProxyRequest,
    ) -> Result<ProxyResponse> {
        let url = self.proxy_url(plane, &request.path);
        tracing::debug!("Proxying request to: {}", url);

        let mut req = self.client.get(&url);
        if !request.query.is_empty() {
            req = req.query(&request.query);
        }

        let resp = req
            .send()
            .await
            .with_context(|| format!("Failed to reach gateway: {}", url))?;

        let status = resp.status().as_u16();
        let body = resp.bytes_stream().map_err(anyhow::Error::from).boxed();

        Ok(ProxyResponse { status, body })
    }
}

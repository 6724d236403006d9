//! Kubernetes access
//!
//! The control-plane client is created here. Data-plane reads never use it:
//! they go through the gateway (`paths` builds the proxied API paths, `fetch`
//! reads them, `discovery` maps kinds to plural resource names).
//!
//! Both the control-plane API server and the gateway honour the standard
//! `HTTP_PROXY` / `HTTPS_PROXY` / `NO_PROXY` variables. Internal hosts skip
//! the proxy on the client that talks to them; the environment is only read.

pub mod discovery;
pub mod fetch;
pub mod paths;

use anyhow::{Context, Result};
use kube::{Client, Config};
use url::Url;

/// Create the control-plane client
///
/// Uses the default kubeconfig loading strategy:
/// 1. In-cluster config (if running in a pod)
/// 2. KUBECONFIG environment variable
/// 3. ~/.kube/config
pub async fn create_client() -> Result<Client> {
    let mut config = Config::infer()
        .await
        .context("Failed to infer Kubernetes configuration")?;

    if config.proxy_url.is_some() && should_bypass_proxy(&config.cluster_url.to_string()) {
        tracing::debug!("Connecting to {} without proxy", config.cluster_url);
        config.proxy_url = None;
    }

    let client = Client::try_from(config).context("Failed to create Kubernetes client")?;
    Ok(client)
}

/// Whether requests to `url` should skip any configured proxy
///
/// True for internal hosts and for hosts NO_PROXY already covers.
pub fn should_bypass_proxy(url: &str) -> bool {
    let Some(host) = Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
    else {
        return false;
    };

    let no_proxy = std::env::var("NO_PROXY")
        .ok()
        .filter(|v| !v.is_empty())
        .or_else(|| std::env::var("no_proxy").ok())
        .unwrap_or_default();

    bypasses_proxy(&no_proxy, &host)
}

fn bypasses_proxy(no_proxy: &str, host: &str) -> bool {
    is_internal_host(host) || no_proxy_contains(no_proxy, host)
}

/// Check if a host looks like an internal/private domain
fn is_internal_host(host: &str) -> bool {
    if let Ok(ip) = host.trim_matches(['[', ']']).parse::<std::net::IpAddr>() {
        return match ip {
            std::net::IpAddr::V4(v4) => v4.is_private() || v4.is_loopback(),
            std::net::IpAddr::V6(v6) => v6.is_loopback(),
        };
    }

    if host == "localhost"
        || host.ends_with(".local")
        || host.ends_with(".internal")
        || host.ends_with(".svc")
    {
        return true;
    }

    // Corporate patterns like *.corp.*, api.int.example, staging.api.example
    let parts: Vec<&str> = host.split('.').collect();
    if parts.len() < 2 {
        return false;
    }
    let labels = &parts[..parts.len() - 1];
    labels.iter().any(|label| {
        matches!(*label, "corp" | "internal" | "int")
            || ["dev", "test", "staging", "qa", "uat", "internal"]
                .iter()
                .any(|prefix| label.starts_with(prefix))
    })
}

/// Check if NO_PROXY already covers the host
///
/// - Exact matches: "example.com" matches "example.com"
/// - Leading dot: ".example.com" matches "example.com" and its subdomains
/// - Plain domain: "example.com" matches its subdomains
fn no_proxy_contains(no_proxy: &str, host: &str) -> bool {
    no_proxy
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .any(|pattern| {
            if pattern == "*" {
                return true;
            }
            let domain = pattern.strip_prefix('.').unwrap_or(pattern);
            host == domain || host.ends_with(&format!(".{}", domain))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_internal_host_private_ips() {
        assert!(is_internal_host("10.0.0.1"));
        assert!(is_internal_host("172.16.0.1"));
        assert!(is_internal_host("192.168.1.1"));
        assert!(is_internal_host("localhost"));
        assert!(is_internal_host("127.0.0.1"));
        assert!(is_internal_host("[::1]"));
        assert!(!is_internal_host("172.32.0.1"));
        assert!(!is_internal_host("8.8.8.8"));
    }

    #[test]
    fn test_is_internal_host_patterns() {
        assert!(is_internal_host("gateway.local"));
        assert!(is_internal_host("cluster.internal"));
        assert!(is_internal_host("api.cluster.svc"));
        assert!(is_internal_host("dev.example.corp"));
        assert!(is_internal_host("devprod.example.com"));
        assert!(is_internal_host("staging.api.example"));
    }

    #[test]
    fn test_is_internal_host_public_domains() {
        assert!(!is_internal_host("example.com"));
        assert!(!is_internal_host("api.github.com"));
        assert!(!is_internal_host("kubernetes.io"));
    }

    #[test]
    fn test_no_proxy_contains() {
        assert!(no_proxy_contains("localhost, example.com", "example.com"));
        assert!(no_proxy_contains(".example.com", "example.com"));
        assert!(no_proxy_contains(".example.com", "api.sub.example.com"));
        assert!(no_proxy_contains("example.com", "sub.example.com"));
        assert!(no_proxy_contains("*", "anything.io"));
        assert!(!no_proxy_contains(".prod.example.com", "devprod.example.com"));
        assert!(!no_proxy_contains("", "example.com"));
    }

    #[test]
    fn test_bypasses_proxy() {
        assert!(bypasses_proxy("", "10.0.0.1"));
        assert!(bypasses_proxy("localhost", "devprod.example.com"));
        assert!(bypasses_proxy(".example.com", "api.example.com"));
        // Public hosts keep the proxy
        assert!(!bypasses_proxy("", "example.com"));
        assert!(!bypasses_proxy(".other.io", "api.github.com"));
    }

    #[test]
    fn test_should_bypass_proxy_reads_url_host() {
        assert!(should_bypass_proxy("https://10.1.2.3:6443"));
        assert!(should_bypass_proxy("http://gateway.openchoreo.svc:8443/base"));
        assert!(!should_bypass_proxy("not a url"));
    }
}

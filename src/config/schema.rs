//! Configuration schema definitions
//!
//! Defines the structure of configuration files using serde for serialization.

use crate::kube::fetch::DEFAULT_MAX_RESPONSE_BYTES;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Data-plane gateway connection
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Live fetch limits
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Authorization settings
    #[serde(default)]
    pub authz: AuthzConfig,

    /// Upper bound on a whole tree or events lookup
    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,

    /// Log filter used when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GatewayConfig {
    /// Base URL; lookups fail with "gateway not configured" when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Per-request timeout
    #[serde(default = "default_gateway_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Extra CA bundle (PEM)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_file: Option<PathBuf>,

    /// Skip TLS verification (development only)
    #[serde(default = "default_false")]
    pub insecure_skip_verify: bool,
}

/// Fetch configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FetchConfig {
    /// Hard cap on a single response body
    #[serde(default = "default_max_response_bytes")]
    pub max_response_bytes: usize,
}

/// Authorization configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AuthzConfig {
    /// Ask the control-plane API server before every lookup
    #[serde(default = "default_false")]
    pub enabled: bool,
}

// Default value functions
fn default_request_timeout_seconds() -> u64 {
    60
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_gateway_timeout_seconds() -> u64 {
    10
}

fn default_max_response_bytes() -> usize {
    DEFAULT_MAX_RESPONSE_BYTES
}

fn default_false() -> bool {
    false
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gateway: GatewayConfig::default(),
            fetch: FetchConfig::default(),
            authz: AuthzConfig::default(),
            request_timeout_seconds: default_request_timeout_seconds(),
            log_level: default_log_level(),
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            url: None,
            timeout_seconds: default_gateway_timeout_seconds(),
            ca_file: None,
            insecure_skip_verify: default_false(),
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_response_bytes: default_max_response_bytes(),
        }
    }
}

impl Default for AuthzConfig {
    fn default() -> Self {
        Self {
            enabled: default_false(),
        }
    }
}

//! Configuration system for release-tree
//!
//! Layered YAML configuration: built-in defaults, then the root config file,
//! then environment variable overrides.

pub mod loader;
pub mod paths;
pub mod schema;

pub use loader::ConfigLoader;
pub use schema::Config;

use anyhow::Context;

/// Keys accepted by `get_config_value` / `set_config_value`
pub const CONFIG_KEYS: &[&str] = &[
    "gateway.url",
    "gateway.timeoutSeconds",
    "gateway.caFile",
    "gateway.insecureSkipVerify",
    "fetch.maxResponseBytes",
    "authz.enabled",
    "requestTimeoutSeconds",
    "logLevel",
];

/// Get a configuration value by key (dot notation)
pub fn get_config_value(config: &schema::Config, key: &str) -> anyhow::Result<String> {
    match key {
        "gateway.url" => Ok(config.gateway.url.clone().unwrap_or_default()),
        "gateway.timeoutSeconds" => Ok(config.gateway.timeout_seconds.to_string()),
        "gateway.caFile" => Ok(config
            .gateway
            .ca_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default()),
        "gateway.insecureSkipVerify" => Ok(config.gateway.insecure_skip_verify.to_string()),
        "fetch.maxResponseBytes" => Ok(config.fetch.max_response_bytes.to_string()),
        "authz.enabled" => Ok(config.authz.enabled.to_string()),
        "requestTimeoutSeconds" => Ok(config.request_timeout_seconds.to_string()),
        "logLevel" => Ok(config.log_level.clone()),
        _ => Err(anyhow::anyhow!("Unknown configuration key: {}", key)),
    }
}

/// Set a configuration value by key (dot notation)
///
/// An empty value clears optional keys.
pub fn set_config_value(config: &mut schema::Config, key: &str, value: &str) -> anyhow::Result<()> {
    match key {
        "gateway.url" => {
            if value.is_empty() {
                config.gateway.url = None;
            } else {
                url::Url::parse(value).context("gateway.url must be a valid URL")?;
                config.gateway.url = Some(value.to_string());
            }
        }
        "gateway.timeoutSeconds" => {
            config.gateway.timeout_seconds = value
                .parse()
                .context("gateway.timeoutSeconds must be a number")?;
        }
        "gateway.caFile" => {
            if value.is_empty() {
                config.gateway.ca_file = None;
            } else {
                config.gateway.ca_file = Some(value.into());
            }
        }
        "gateway.insecureSkipVerify" => {
            config.gateway.insecure_skip_verify = value
                .parse()
                .context("gateway.insecureSkipVerify must be 'true' or 'false'")?;
        }
        "fetch.maxResponseBytes" => {
            config.fetch.max_response_bytes = value
                .parse()
                .context("fetch.maxResponseBytes must be a number")?;
        }
        "authz.enabled" => {
            config.authz.enabled = value
                .parse()
                .context("authz.enabled must be 'true' or 'false'")?;
        }
        "requestTimeoutSeconds" => {
            config.request_timeout_seconds = value
                .parse()
                .context("requestTimeoutSeconds must be a number")?;
        }
        "logLevel" => {
            config.log_level = value.to_string();
        }
        _ => return Err(anyhow::anyhow!("Unknown configuration key: {}", key)),
    }

    Ok(())
}

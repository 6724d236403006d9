//! Configuration loading and merging logic
//!
//! Handles loading configuration from multiple sources and merging them
//! according to precedence rules.

use super::{paths, schema::Config};
use anyhow::{Context, Result};
use std::path::Path;
use std::str::FromStr;

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with all layers merged
    ///
    /// Precedence order (highest to lowest):
    /// 1. Environment variable overrides
    /// 2. Root config file
    /// 3. Built-in defaults
    pub fn load() -> Result<Config> {
        let root_path = paths::root_config_path();
        let config = if root_path.exists() {
            Self::load_file(&root_path)?
        } else {
            tracing::debug!("No config file at {}, using defaults", root_path.display());
            Self::load_defaults()
        };

        Ok(Self::apply_env_overrides(config))
    }

    /// Load configuration from a file
    pub fn load_file(path: &Path) -> Result<Config> {
        if !path.exists() {
            return Err(anyhow::anyhow!("Config file not found: {}", path.display()));
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        // An empty file means "all defaults"
        if contents.trim().is_empty() {
            return Ok(Self::load_defaults());
        }

        let config: Config = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Validate the merged configuration
    ///
    /// Fails on invalid YAML, invalid value types, an unparsable gateway URL,
    /// a zero byte cap or timeout, and an unknown log level.
    pub fn validate() -> Result<Config> {
        let config = Self::load().context("Failed to load configuration")?;
        Self::check(&config)?;
        Ok(config)
    }

    /// Semantic checks on an already parsed configuration
    pub fn check(config: &Config) -> Result<()> {
        if let Some(url) = &config.gateway.url {
            url::Url::parse(url).with_context(|| format!("gateway.url is not a valid URL: {}", url))?;
        }
        if let Some(ca_file) = &config.gateway.ca_file {
            if !ca_file.exists() {
                anyhow::bail!("gateway.caFile does not exist: {}", ca_file.display());
            }
        }
        if config.gateway.timeout_seconds == 0 {
            anyhow::bail!("gateway.timeoutSeconds must be greater than 0");
        }
        if config.fetch.max_response_bytes == 0 {
            anyhow::bail!("fetch.maxResponseBytes must be greater than 0");
        }
        if config.request_timeout_seconds == 0 {
            anyhow::bail!("requestTimeoutSeconds must be greater than 0");
        }
        tracing::Level::from_str(&config.log_level).map_err(|_| {
            anyhow::anyhow!(
                "logLevel must be one of trace, debug, info, warn, error (got '{}')",
                config.log_level
            )
        })?;
        Ok(())
    }

    /// Load default configuration
    pub fn load_defaults() -> Config {
        Config::default()
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(config: Config) -> Config {
        Self::apply_overrides(config, |key| std::env::var(key).ok())
    }

    fn apply_overrides(mut config: Config, lookup: impl Fn(&str) -> Option<String>) -> Config {
        // RELEASE_TREE_GATEWAY_URL override
        if let Some(url) = lookup("RELEASE_TREE_GATEWAY_URL") {
            config.gateway.url = if url.is_empty() { None } else { Some(url) };
        }

        // RELEASE_TREE_MAX_RESPONSE_BYTES override
        if let Some(max) = lookup("RELEASE_TREE_MAX_RESPONSE_BYTES") {
            match max.parse::<usize>() {
                Ok(val) => config.fetch.max_response_bytes = val,
                Err(_) => tracing::warn!("Ignoring invalid RELEASE_TREE_MAX_RESPONSE_BYTES: {}", max),
            }
        }

        // RELEASE_TREE_LOG_LEVEL override
        if let Some(level) = lookup("RELEASE_TREE_LOG_LEVEL") {
            config.log_level = level;
        }

        config
    }

    /// Save configuration to a file
    pub fn save(config: &Config, path: &Path) -> Result<()> {
        // Ensure directory exists
        if let Some(parent) = path.parent() {
            paths::ensure_dir(parent)?;
        }

        let yaml =
            serde_yaml::to_string(config).context("Failed to serialize configuration to YAML")?;

        std::fs::write(path, yaml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Save root configuration
    pub fn save_root(config: &Config) -> Result<()> {
        Self::save(config, &paths::root_config_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_env_overrides() {
        let config = ConfigLoader::apply_overrides(
            Config::default(),
            env(&[
                ("RELEASE_TREE_GATEWAY_URL", "https://gw.example"),
                ("RELEASE_TREE_MAX_RESPONSE_BYTES", "2048"),
                ("RELEASE_TREE_LOG_LEVEL", "debug"),
            ]),
        );

        assert_eq!(config.gateway.url.as_deref(), Some("https://gw.example"));
        assert_eq!(config.fetch.max_response_bytes, 2048);
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_invalid_env_override_is_ignored() {
        let config = ConfigLoader::apply_overrides(
            Config::default(),
            env(&[("RELEASE_TREE_MAX_RESPONSE_BYTES", "lots")]),
        );
        assert_eq!(config.fetch.max_response_bytes, 10 * 1024 * 1024);
    }

    #[test]
    fn test_save_and_load_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join("config.yaml");

        let mut config = Config::default();
        config.gateway.url = Some("https://gw.example".to_string());
        config.authz.enabled = true;
        ConfigLoader::save(&config, &path).unwrap();

        let loaded = ConfigLoader::load_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_empty_file_gives_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.yaml");
        std::fs::write(&path, "\n").unwrap();
        assert_eq!(ConfigLoader::load_file(&path).unwrap(), Config::default());
    }

    #[test]
    fn test_load_file_rejects_bad_types() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.yaml");
        std::fs::write(&path, "fetch:\n  maxResponseBytes: big\n").unwrap();
        assert!(ConfigLoader::load_file(&path).is_err());
    }

    #[test]
    fn test_check() {
        assert!(ConfigLoader::check(&Config::default()).is_ok());

        let mut bad_url = Config::default();
        bad_url.gateway.url = Some("not a url".to_string());
        assert!(ConfigLoader::check(&bad_url).is_err());

        let mut zero_cap = Config::default();
        zero_cap.fetch.max_response_bytes = 0;
        assert!(ConfigLoader::check(&zero_cap).is_err());

        let mut bad_level = Config::default();
        bad_level.log_level = "loud".to_string();
        assert!(ConfigLoader::check(&bad_level).is_err());
    }
}

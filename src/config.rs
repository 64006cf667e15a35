//! Configuration management for the tracker
//!
//! Loads configuration from TOML files with environment variable substitution.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub tracker: TrackerConfig,
    pub store: StoreConfig,
    pub api: ApiConfig,
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrackerConfig {
    /// Interval between status polls for the tracked transaction
    pub poll_interval_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Base URL of the TransactionStore service
    pub base_url: String,
    /// Per-request timeout so a hung poll cannot pile up concurrent fetches
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub port: u16,
}

impl Settings {
    /// Load settings from configuration files
    pub fn load() -> Result<Self> {
        let config_path = env::var("OMNIGOVERN_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config/default.toml"));

        let config_str = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

        // Substitute environment variables
        let config_str = substitute_env_vars(&config_str);

        let settings: Settings =
            toml::from_str(&config_str).with_context(|| "Failed to parse configuration")?;

        settings.validate()?;

        Ok(settings)
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        if self.store.base_url.is_empty() {
            anyhow::bail!("Store base URL must be configured");
        }
        if !self.store.base_url.starts_with("http://") && !self.store.base_url.starts_with("https://")
        {
            anyhow::bail!("Store base URL must be an http(s) URL: {}", self.store.base_url);
        }
        if self.tracker.poll_interval_ms == 0 {
            anyhow::bail!("Poll interval must be non-zero");
        }
        if self.store.request_timeout_secs == 0 {
            anyhow::bail!("Request timeout must be non-zero");
        }

        Ok(())
    }
}

/// Substitute environment variables in the format ${VAR_NAME}
fn substitute_env_vars(input: &str) -> String {
    let mut result = input.to_string();
    let re = regex::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").unwrap();

    for cap in re.captures_iter(input) {
        let var_name = &cap[1];
        let var_value = env::var(var_name).unwrap_or_default();
        result = result.replace(&cap[0], &var_value);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_env_var_substitution() {
        env::set_var("TEST_STORE_VAR", "test_value");
        let input = "url = \"https://api.example.com/${TEST_STORE_VAR}/endpoint\"";
        let result = substitute_env_vars(input);
        assert_eq!(result, "url = \"https://api.example.com/test_value/endpoint\"");
    }

    #[test]
    fn test_parse_and_validate() {
        let toml = r#"
            [tracker]
            poll_interval_ms = 3000

            [store]
            base_url = "http://127.0.0.1:5000"
            request_timeout_secs = 10

            [api]
            host = "0.0.0.0"
            port = 8080

            [metrics]
            enabled = true
            port = 9090
        "#;
        let settings: Settings = toml::from_str(toml).unwrap();
        settings.validate().unwrap();
        assert_eq!(settings.tracker.poll_interval_ms, 3000);
        assert_eq!(settings.store.base_url, "http://127.0.0.1:5000");
    }

    #[test]
    fn test_rejects_zero_poll_interval() {
        let toml = r#"
            [tracker]
            poll_interval_ms = 0

            [store]
            base_url = "http://127.0.0.1:5000"
            request_timeout_secs = 10

            [api]
            host = "0.0.0.0"
            port = 8080

            [metrics]
            enabled = false
            port = 9090
        "#;
        let settings: Settings = toml::from_str(toml).unwrap();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
            [tracker]
            poll_interval_ms = 1500

            [store]
            base_url = "http://store.local:5000"
            request_timeout_secs = 5

            [api]
            host = "127.0.0.1"
            port = 8081

            [metrics]
            enabled = false
            port = 9091
        "#
        )
        .unwrap();

        env::set_var("OMNIGOVERN_CONFIG", file.path());
        let settings = Settings::load().unwrap();
        env::remove_var("OMNIGOVERN_CONFIG");

        assert_eq!(settings.tracker.poll_interval_ms, 1500);
        assert_eq!(settings.api.port, 8081);
        assert!(!settings.metrics.enabled);
    }
}

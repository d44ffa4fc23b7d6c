//! Configuration schema (stalewatch.toml)

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Default trailing window for query-log usage checks, in days
pub const DEFAULT_WINDOW_DAYS: u32 = 30;

/// Warehouse connection configuration for usage queries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarehouseConfig {
    /// Warehouse type (currently only "bigquery")
    #[serde(rename = "type")]
    pub warehouse_type: String,

    /// Fully qualified query-log table, e.g. "project.audit.query_logs"
    pub query_log_table: String,

    /// Connection settings (warehouse-specific)
    #[serde(flatten)]
    pub settings: HashMap<String, String>,
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self {
            warehouse_type: "bigquery".to_string(),
            query_log_table: String::new(),
            settings: HashMap::new(),
        }
    }
}

/// Retry policy for per-candidate usage queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum attempts per candidate (including the first)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Base delay before the first retry; doubles per attempt
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    500
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
        }
    }
}

impl RetryPolicy {
    /// Delay before the retry following `attempt` (1-based), exponential
    pub fn delay_ms(&self, attempt: u32) -> u64 {
        self.base_delay_ms.saturating_mul(1u64 << attempt.saturating_sub(1).min(16))
    }
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Repository ids whose artifacts participate in the scan
    #[serde(default)]
    pub repositories: Vec<String>,

    /// Trailing query-log window in days
    #[serde(default = "default_window_days")]
    pub window_days: u32,

    /// Root of the artifact store (directory or bucket prefix)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_root: Option<PathBuf>,

    /// Warehouse connection configuration (needed for `scan`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warehouse: Option<WarehouseConfig>,

    /// Retry policy for usage queries
    #[serde(default)]
    pub retry: RetryPolicy,
}

fn default_window_days() -> u32 {
    DEFAULT_WINDOW_DAYS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            repositories: Vec::new(),
            window_days: DEFAULT_WINDOW_DAYS,
            artifact_root: None,
            warehouse: None,
            retry: RetryPolicy::default(),
        }
    }
}

impl Config {
    /// Load config from TOML file
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(path.display().to_string(), e.to_string()))?;

        Self::from_toml(&contents)
    }

    /// Load config from TOML string
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

/// Config error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {0}: {1}")]
    IoError(String, String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.window_days, 30);
        assert_eq!(config.retry.max_attempts, 3);
        assert!(config.repositories.is_empty());
    }

    #[test]
    fn parse_full_config() {
        let toml = r#"
            repositories = ["alpha", "beta"]
            window_days = 14
            artifact_root = "/var/artifacts"

            [warehouse]
            type = "bigquery"
            query_log_table = "acme-prod.audit.query_logs"
            project = "acme-prod"

            [retry]
            max_attempts = 5
            base_delay_ms = 250
        "#;

        let config = Config::from_toml(toml).unwrap();
        assert_eq!(config.repositories, vec!["alpha", "beta"]);
        assert_eq!(config.window_days, 14);

        let warehouse = config.warehouse.unwrap();
        assert_eq!(warehouse.warehouse_type, "bigquery");
        assert_eq!(warehouse.query_log_table, "acme-prod.audit.query_logs");
        assert_eq!(warehouse.settings.get("project").unwrap(), "acme-prod");

        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.base_delay_ms, 250);
    }

    #[test]
    fn window_defaults_when_missing() {
        let config = Config::from_toml(r#"repositories = ["alpha"]"#).unwrap();
        assert_eq!(config.window_days, 30);
    }

    #[test]
    fn retry_backoff_doubles() {
        let retry = RetryPolicy::default();
        assert_eq!(retry.delay_ms(1), 500);
        assert_eq!(retry.delay_ms(2), 1000);
        assert_eq!(retry.delay_ms(3), 2000);
    }

    #[test]
    fn config_toml_roundtrip() {
        let config = Config {
            repositories: vec!["alpha".into()],
            ..Config::default()
        };
        let toml = toml::to_string(&config).unwrap();
        let parsed = Config::from_toml(&toml).unwrap();
        assert_eq!(config, parsed);
    }
}

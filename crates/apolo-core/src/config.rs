//! Application configuration
//!
//! This module provides centralized configuration management using the `config` crate.
//! Configuration can be loaded from environment variables and config files.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

/// Main application configuration
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub attributes: AttributesConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

/// HTTP server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Number of worker threads
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    2080
}

fn default_workers() -> usize {
    num_cpus::get()
}

fn default_timeout() -> u64 {
    30
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: default_workers(),
            timeout_secs: default_timeout(),
        }
    }
}

/// Settings shared by every subsystem
#[derive(Debug, Deserialize, Clone)]
pub struct GeneralConfig {
    /// Tenant used when an event carries none
    #[serde(default = "default_tenant")]
    pub default_tenant: String,

    /// IANA timezone for naive timestamps
    #[serde(default = "default_timezone")]
    pub default_timezone: String,

    /// Decimal places kept by `*valueExponent`
    #[serde(default = "default_rounding_decimals")]
    pub rounding_decimals: u32,
}

fn default_tenant() -> String {
    "cgrates.org".to_string()
}

fn default_timezone() -> String {
    "UTC".to_string()
}

fn default_rounding_decimals() -> u32 {
    5
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            default_tenant: default_tenant(),
            default_timezone: default_timezone(),
            rounding_decimals: default_rounding_decimals(),
        }
    }
}

/// Defaults for the attribute service call options
///
/// Every value can be overridden per call through `APIOpts`.
#[derive(Debug, Deserialize, Clone)]
pub struct AttributesConfig {
    /// Maximum number of passes per call
    #[serde(default = "default_process_runs")]
    pub process_runs: i64,

    /// How many times one profile may be applied per call (0 = unlimited)
    #[serde(default)]
    pub profile_runs: i64,

    /// Explicit profile IDs that bypass indexing
    #[serde(default)]
    pub profile_ids: Vec<String>,

    /// Skip profile filters when explicit IDs are used
    #[serde(default)]
    pub profile_ignore_filters: bool,
}

fn default_process_runs() -> i64 {
    1
}

impl Default for AttributesConfig {
    fn default() -> Self {
        Self {
            process_runs: default_process_runs(),
            profile_runs: 0,
            profile_ids: Vec::new(),
            profile_ignore_filters: false,
        }
    }
}

/// Profile storage backend
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Internal,
    Redis,
}

/// Profile storage configuration
#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    /// Which data DB holds attribute profiles
    #[serde(default)]
    pub backend: StoreBackend,

    /// Redis connection URL (redis backend only)
    #[serde(default = "default_redis_url")]
    pub redis_url: String,

    /// JSON file with profiles loaded at startup
    #[serde(default)]
    pub profiles_file: Option<String>,

    /// JSON file with named filters loaded at startup
    #[serde(default)]
    pub filters_file: Option<String>,

    /// Keep loaded profiles in the in-process cache
    #[serde(default = "default_cache_enabled")]
    pub cache_enabled: bool,
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}

fn default_cache_enabled() -> bool {
    true
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            redis_url: default_redis_url(),
            profiles_file: None,
            filters_file: None,
            cache_enabled: default_cache_enabled(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment and optional config file
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Start with default values
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 2080)?
            .set_default("server.workers", num_cpus::get() as i64)?
            .set_default("server.timeout_secs", 30)?
            .set_default("general.default_tenant", "cgrates.org")?
            .set_default("general.default_timezone", "UTC")?
            .set_default("general.rounding_decimals", 5)?
            .set_default("attributes.process_runs", 1)?
            .set_default("attributes.profile_runs", 0)?
            .set_default("attributes.profile_ignore_filters", false)?
            .set_default("store.backend", "internal")?
            .set_default("store.redis_url", "redis://127.0.0.1:6379")?
            .set_default("store.cache_enabled", true)?
            // Load config file if exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Load from environment variables with APOLO_ prefix
            .add_source(
                Environment::with_prefix("APOLO")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("attributes.profile_ids"),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name(path))
            .add_source(Environment::with_prefix("APOLO").separator("__"))
            .build()?;

        config.try_deserialize()
    }

    /// Get the server bind address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    #[test]
    fn test_default_attributes_config() {
        let config = AttributesConfig::default();
        assert_eq!(config.process_runs, 1);
        assert_eq!(config.profile_runs, 0);
        assert!(config.profile_ids.is_empty());
        assert!(!config.profile_ignore_filters);
    }

    #[test]
    fn test_default_general_config() {
        let config = GeneralConfig::default();
        assert_eq!(config.default_tenant, "cgrates.org");
        assert_eq!(config.default_timezone, "UTC");
        assert_eq!(config.rounding_decimals, 5);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: AppConfig = Config::builder()
            .add_source(File::from_str(
                r#"{"attributes": {"process_runs": 4}, "store": {"backend": "redis"}}"#,
                FileFormat::Json,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.attributes.process_runs, 4);
        assert_eq!(config.attributes.profile_runs, 0);
        assert_eq!(config.store.backend, StoreBackend::Redis);
        assert!(config.store.cache_enabled);
        assert_eq!(config.general.default_tenant, "cgrates.org");
        assert_eq!(config.server.port, 2080);
    }
}

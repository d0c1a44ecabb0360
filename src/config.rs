//! Configuration management for td-glance.
//!
//! Handles loading configuration from TOML files and environment variables,
//! with support for named Treasure Data connections.

use crate::engine::EngineKind;
use crate::error::{Result, TdError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Default Treasure Data API endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://api.treasuredata.com";

/// Default delay between two job status polls.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Job polling settings.
    #[serde(default)]
    pub polling: PollingConfig,

    /// Named connections.
    #[serde(default)]
    pub connections: HashMap<String, ConnectionConfig>,
}

/// Job polling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
}

fn default_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
        }
    }
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// What to hand back when a Hive query succeeds.
///
/// Hive results have always been dropped in favor of an empty result. Whether
/// that is intended is an open product question, so the old output stays the
/// default and `pass_through` opts into the real rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HiveResultPolicy {
    #[default]
    Discard,
    PassThrough,
}

/// Treasure Data connection settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConnectionConfig {
    /// API key (required).
    pub api_key: Option<String>,

    /// Target database (required).
    pub database: Option<String>,

    /// Query engine; defaults to Presto.
    #[serde(default)]
    pub engine: EngineKind,

    /// API endpoint override.
    pub endpoint: Option<String>,

    #[serde(default)]
    pub hive_results: HiveResultPolicy,
}

/// Connection settings given explicitly, e.g. on the command line.
///
/// `None` means "not given", so a default value can still override a file setting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionOverrides {
    pub api_key: Option<String>,
    pub database: Option<String>,
    pub engine: Option<EngineKind>,
    pub endpoint: Option<String>,
    pub hive_results: Option<HiveResultPolicy>,
}

impl ConnectionConfig {
    /// Creates a config with the two required settings.
    pub fn new(api_key: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            database: Some(database.into()),
            ..Default::default()
        }
    }

    pub fn with_engine(mut self, engine: EngineKind) -> Self {
        self.engine = engine;
        self
    }

    pub fn with_hive_results(mut self, policy: HiveResultPolicy) -> Self {
        self.hive_results = policy;
        self
    }

    /// Returns the API key or a configuration error.
    pub fn api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| TdError::config("api_key is required"))
    }

    /// Returns the target database or a configuration error.
    pub fn database(&self) -> Result<&str> {
        self.database
            .as_deref()
            .filter(|d| !d.is_empty())
            .ok_or_else(|| TdError::config("database is required"))
    }

    /// Returns the parsed API endpoint.
    pub fn endpoint_url(&self) -> Result<Url> {
        let raw = self.endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT);
        let url = Url::parse(raw)
            .map_err(|e| TdError::config(format!("Invalid endpoint '{raw}': {e}")))?;

        if url.scheme() != "https" && url.scheme() != "http" {
            return Err(TdError::config(format!(
                "Invalid endpoint scheme '{}'. Expected 'https' or 'http'",
                url.scheme()
            )));
        }
        if url.cannot_be_a_base() {
            return Err(TdError::config(format!("Invalid endpoint '{raw}'")));
        }

        Ok(url)
    }

    /// Checks that every required setting is present and well-formed.
    pub fn validate(&self) -> Result<()> {
        self.api_key()?;
        self.database()?;
        self.endpoint_url()?;
        Ok(())
    }

    /// Applies explicitly given settings over this config.
    pub fn merge(&mut self, overrides: &ConnectionOverrides) {
        if let Some(api_key) = &overrides.api_key {
            self.api_key = Some(api_key.clone());
        }
        if let Some(database) = &overrides.database {
            self.database = Some(database.clone());
        }
        if let Some(engine) = overrides.engine {
            self.engine = engine;
        }
        if let Some(endpoint) = &overrides.endpoint {
            self.endpoint = Some(endpoint.clone());
        }
        if let Some(policy) = overrides.hive_results {
            self.hive_results = policy;
        }
    }

    /// Applies environment variables (TD_API_KEY, etc.) as defaults.
    pub fn apply_env_defaults(&mut self) {
        if self.api_key.is_none() {
            self.api_key = std::env::var("TD_API_KEY").ok();
        }
        if self.database.is_none() {
            self.database = std::env::var("TD_DATABASE").ok();
        }
        if self.endpoint.is_none() {
            self.endpoint = std::env::var("TD_API_SERVER").ok();
        }
    }

    /// Returns a display-safe string (no api key) for UI purposes.
    pub fn display_string(&self) -> String {
        let database = self.database.as_deref().unwrap_or("unknown");
        let host = self
            .endpoint_url()
            .ok()
            .and_then(|u| u.host_str().map(String::from))
            .unwrap_or_else(|| "unknown".to_string());
        format!("{database} @ {host} ({})", self.engine)
    }
}

impl Config {
    /// Returns the default config file path for the current platform.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("td-glance")
            .join("config.toml")
    }

    /// Loads configuration from a TOML file. A missing file yields defaults.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| TdError::config(format!("Failed to read config file: {e}")))?;

        Self::parse_toml(&content, path)
    }

    fn parse_toml(content: &str, path: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|e| {
            TdError::config(format!(
                "Configuration error in {}:\n  {}",
                path.display(),
                e
            ))
        })
    }

    /// Gets a named connection, or the default connection if name is None.
    pub fn get_connection(&self, name: Option<&str>) -> Option<&ConnectionConfig> {
        let key = name.unwrap_or("default");
        self.connections.get(key)
    }
}

//! Application configuration
//!
//! Configuration is loaded from:
//! 1. Default values
//! 2. Config file (~/.config/soldcars/config.toml, or SOLDCARS_CONFIG)
//! 3. Environment variables
//!
//! Environment variables take precedence over config file values. The store
//! host list and replica-set name keep the variable names the deployment
//! already uses (`MONGODB_HOSTS`, `MONGODB_REPLSET`).

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

/// Environment variable prefix
const ENV_PREFIX: &str = "SOLDCARS";

/// Comma-delimited store host list
pub const HOSTS_ENV: &str = "MONGODB_HOSTS";

/// Replica-set name
pub const REPLSET_ENV: &str = "MONGODB_REPLSET";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Store hosts as `host[:port]`
    #[serde(default = "default_hosts")]
    pub hosts: Vec<String>,

    /// Replica-set name (optional for a standalone store)
    #[serde(default)]
    pub replica_set: Option<String>,

    /// Database holding the car collection
    #[serde(default = "default_database")]
    pub database: String,

    /// Car collection name
    #[serde(default = "default_collection")]
    pub collection: String,

    /// How long a durable write may wait for majority acknowledgment
    #[serde(default = "default_write_timeout_ms")]
    pub write_timeout_ms: u64,

    /// HTTP listen address
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Interval between replica-set status polls during bootstrap
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Bootstrap convergence budget per replica-set member
    #[serde(default = "default_member_timeout_secs")]
    pub member_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hosts: default_hosts(),
            replica_set: None,
            database: default_database(),
            collection: default_collection(),
            write_timeout_ms: default_write_timeout_ms(),
            listen: default_listen(),
            poll_interval_ms: default_poll_interval_ms(),
            member_timeout_secs: default_member_timeout_secs(),
        }
    }
}

/// Connection settings consumed by the store layer
#[derive(Debug, Clone, PartialEq)]
pub struct StoreSettings {
    pub hosts: Vec<String>,
    pub replica_set: Option<String>,
    pub database: String,
    pub collection: String,
    pub write_timeout: Duration,
}

/// Settings consumed by replica-set bootstrap
#[derive(Debug, Clone, PartialEq)]
pub struct BootstrapSettings {
    pub hosts: Vec<String>,
    pub replica_set: String,
    pub poll_interval: Duration,
    pub member_timeout: Duration,
}

impl Config {
    /// Load configuration from default location and environment
    ///
    /// Order of precedence (highest to lowest):
    /// 1. Environment variables (MONGODB_HOSTS, MONGODB_REPLSET, SOLDCARS_*)
    /// 2. Config file (~/.config/soldcars/config.toml or SOLDCARS_CONFIG)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::config_file_path())
    }

    /// Load configuration from a specific path
    ///
    /// Environment variables are still applied as overrides.
    /// If the file doesn't exist, defaults are used.
    pub fn load_from_path(path: &PathBuf) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML string (useful for testing)
    pub fn load_from_str(toml_content: &str) -> Result<Self> {
        let mut config: Config =
            toml::from_str(toml_content).context("Failed to parse config TOML")?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        // MONGODB_HOSTS
        if let Ok(val) = std::env::var(HOSTS_ENV) {
            self.hosts = parse_hosts(&val);
        }

        // MONGODB_REPLSET
        if let Ok(val) = std::env::var(REPLSET_ENV) {
            self.replica_set = if val.is_empty() { None } else { Some(val) };
        }

        // SOLDCARS_DATABASE
        if let Ok(val) = std::env::var(format!("{}_DATABASE", ENV_PREFIX)) {
            if !val.is_empty() {
                self.database = val;
            }
        }

        // SOLDCARS_LISTEN
        if let Ok(val) = std::env::var(format!("{}_LISTEN", ENV_PREFIX)) {
            if !val.is_empty() {
                self.listen = val;
            }
        }
    }

    /// Reject settings no component could work with
    pub fn validate(&self) -> Result<()> {
        if self.hosts.is_empty() {
            bail!(
                "No store hosts configured. Set {} or `hosts` in the config file.",
                HOSTS_ENV
            );
        }
        if self.write_timeout_ms == 0 {
            bail!("write_timeout_ms must be greater than zero");
        }
        if self.poll_interval_ms == 0 || self.member_timeout_secs == 0 {
            bail!("poll_interval_ms and member_timeout_secs must be greater than zero");
        }
        Ok(())
    }

    /// Settings for the connection registry and car store
    pub fn store_settings(&self) -> StoreSettings {
        StoreSettings {
            hosts: self.hosts.clone(),
            replica_set: self.replica_set.clone(),
            database: self.database.clone(),
            collection: self.collection.clone(),
            write_timeout: Duration::from_millis(self.write_timeout_ms),
        }
    }

    /// Settings for replica-set bootstrap
    ///
    /// Bootstrap always needs a set name, unlike plain connections.
    pub fn bootstrap_settings(&self) -> Result<BootstrapSettings> {
        let Some(ref replica_set) = self.replica_set else {
            bail!("No replica set configured. Set {} first.", REPLSET_ENV);
        };

        Ok(BootstrapSettings {
            hosts: self.hosts.clone(),
            replica_set: replica_set.clone(),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            member_timeout: Duration::from_secs(self.member_timeout_secs),
        })
    }

    /// Get the config file path
    ///
    /// Can be overridden with SOLDCARS_CONFIG environment variable
    pub fn config_file_path() -> PathBuf {
        if let Ok(path) = std::env::var(format!("{}_CONFIG", ENV_PREFIX)) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("soldcars")
            .join("config.toml")
    }
}

/// Split a comma-delimited host list, ignoring blanks
pub fn parse_hosts(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|host| !host.is_empty())
        .map(String::from)
        .collect()
}

fn default_hosts() -> Vec<String> {
    vec!["mongo:27017".to_string()]
}

fn default_database() -> String {
    "soldcars".to_string()
}

fn default_collection() -> String {
    "cars".to_string()
}

fn default_write_timeout_ms() -> u64 {
    10_000
}

fn default_listen() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_poll_interval_ms() -> u64 {
    1_000
}

fn default_member_timeout_secs() -> u64 {
    300
}

//! Configuration for the site schema migrator

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Prefix for environment overrides, e.g. `SITE_SCHEMA_DATABASE_URL`.
/// Nested keys use a double underscore: `SITE_SCHEMA_LOGGING__JSON`.
pub const ENV_PREFIX: &str = "SITE_SCHEMA_";

/// Migrator configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Database connection string (`postgres://...` or `sqlite://...`)
    #[serde(default = "default_database_url")]
    pub database_url: String,

    /// Time allowed to establish a connection
    #[serde(default = "default_connect_timeout", with = "humantime_serde")]
    pub connect_timeout: Duration,

    /// Pool size. Steps run one at a time, so a small pool is enough.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is not set
    #[serde(default = "default_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            connect_timeout: default_connect_timeout(),
            max_connections: default_max_connections(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            json: false,
        }
    }
}

impl Config {
    /// Load defaults, then the YAML file (if given), then the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = path {
            if !path.exists() {
                anyhow::bail!("config file {} does not exist", path.display());
            }
            figment = figment.merge(Yaml::file(path));
        }
        figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context("invalid site schema configuration")
    }

    pub fn connect_options(&self) -> sea_orm::ConnectOptions {
        let mut opts = sea_orm::ConnectOptions::new(self.database_url.clone());
        opts.max_connections(self.max_connections)
            .connect_timeout(self.connect_timeout)
            .sqlx_logging(false);
        opts
    }
}

fn default_database_url() -> String {
    "sqlite://site_schema.db?mode=rwc".to_string()
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_max_connections() -> u32 {
    5
}

fn default_level() -> String {
    "info".to_string()
}

//! Layered service settings.
//!
//! Sources, lowest precedence first: built-in defaults, an optional TOML
//! file, then `COINBOARD_*` environment variables using `__` as the section
//! separator (`COINBOARD_CACHE__TTL_SECS=120`).

use std::path::Path;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::market_data::adapters::coingecko::DEFAULT_BASE_URL;

pub const ENV_PREFIX: &str = "COINBOARD";
pub const DEFAULT_CONFIG_FILE: &str = "coinboard.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub upstream: UpstreamSettings,
    pub cache: CacheSettings,
    pub telemetry: TelemetrySettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamSettings {
    pub base_url: String,
    pub timeout_ms: u64,
    pub per_page: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    Sqlite,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    pub ttl_secs: u64,
    pub backend: StoreBackend,
    pub database_url: String,
}

impl CacheSettings {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelemetrySettings {
    pub log_filter: String,
    pub metrics_port: u16,
}

impl Settings {
    /// Load settings. A missing file is fine unless it was asked for explicitly.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(p) => File::from(p).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        Self::builder()?
            .add_source(file)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// Built-in defaults only.
    pub fn defaults() -> Result<Self, ConfigError> {
        Self::builder()?.build()?.try_deserialize()
    }

    fn builder() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Config::builder()
            .set_default("server.bind", "0.0.0.0")?
            .set_default("server.port", 5000_i64)?
            .set_default("upstream.base_url", DEFAULT_BASE_URL)?
            .set_default("upstream.timeout_ms", 10_000_i64)?
            .set_default("upstream.per_page", 25_i64)?
            .set_default("cache.ttl_secs", 300_i64)?
            .set_default("cache.backend", "memory")?
            .set_default("cache.database_url", "sqlite://coinboard.db?mode=rwc")?
            .set_default("telemetry.log_filter", "info,coinboard_rs=debug")?
            .set_default("telemetry.metrics_port", 9000_i64)
    }
}

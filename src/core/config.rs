//! Configuration parsing and validation.
//!
//! Configuration is loaded from TOML files, then optionally overridden by
//! the `ETCD_HOST`, `ETCD_PORT` and `ETCD_MOCK_CLIENT` environment variables
//! or CLI flags.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Backing store connection settings.
    #[serde(default)]
    pub etcd: EtcdConfig,

    /// Key layout settings.
    #[serde(default)]
    pub model: ModelConfig,

    /// Distributed lock defaults.
    #[serde(default)]
    pub lock: LockConfig,

    /// Telemetry configuration.
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Backing store connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EtcdConfig {
    /// Host name or IP of the etcd endpoint.
    #[serde(default = "default_etcd_host")]
    pub host: String,

    /// Port of the etcd endpoint.
    #[serde(default = "default_etcd_port")]
    pub port: u16,

    /// Use the in-process reference store instead of a network client.
    #[serde(default)]
    pub mock_client: bool,
}

impl Default for EtcdConfig {
    fn default() -> Self {
        Self {
            host: default_etcd_host(),
            port: default_etcd_port(),
            mock_client: false,
        }
    }
}

impl EtcdConfig {
    /// `host:port` endpoint string.
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Key layout settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Project-wide key prefix; model prefixes are `<base_prefix>/<TypeName>`.
    #[serde(default = "default_base_prefix")]
    pub base_prefix: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_prefix: default_base_prefix(),
        }
    }
}

impl ModelConfig {
    /// Model prefix for a type name under the configured base prefix.
    pub fn model_prefix(&self, type_name: &str) -> String {
        format!("{}/{}", self.base_prefix, type_name)
    }
}

/// Distributed lock defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockConfig {
    /// Lease TTL in seconds.
    #[serde(default = "default_lock_ttl_seconds")]
    pub default_ttl_seconds: u64,

    /// Acquisition poll interval in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            default_ttl_seconds: default_lock_ttl_seconds(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl LockConfig {
    /// Default lease TTL.
    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_seconds)
    }

    /// Acquisition poll interval.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Telemetry configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

// Default value functions

fn default_etcd_host() -> String {
    "localhost".to_string()
}

fn default_etcd_port() -> u16 {
    2379
}

fn default_base_prefix() -> String {
    "/etcd3_model".to_string()
}

fn default_lock_ttl_seconds() -> u64 {
    60
}

fn default_poll_interval_ms() -> u64 {
    100
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let config: Config =
            toml::from_str(&content).with_context(|| "failed to parse config file")?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).with_context(|| "failed to parse config")?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides, then re-validate.
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) -> Result<()> {
        if let Some(ref host) = overrides.etcd_host {
            self.etcd.host = host.clone();
        }
        if let Some(port) = overrides.etcd_port {
            self.etcd.port = port;
        }
        if let Some(mock) = overrides.mock_client {
            self.etcd.mock_client = mock;
        }
        if let Some(ref log_level) = overrides.log_level {
            self.telemetry.log_level = log_level.clone();
        }
        self.validate()
    }

    /// Validate configuration consistency.
    pub fn validate(&self) -> Result<()> {
        self.validate_etcd()?;
        self.validate_model()?;
        self.validate_lock()?;
        self.validate_telemetry()?;
        Ok(())
    }

    fn validate_etcd(&self) -> Result<()> {
        if self.etcd.host.trim().is_empty() {
            anyhow::bail!("etcd.host must not be empty");
        }
        if self.etcd.port == 0 {
            anyhow::bail!("etcd.port must be > 0");
        }
        Ok(())
    }

    fn validate_model(&self) -> Result<()> {
        let prefix = &self.model.base_prefix;
        if !prefix.starts_with('/') {
            anyhow::bail!("model.base_prefix must start with '/', got: {}", prefix);
        }
        if prefix.len() > 1 && prefix.ends_with('/') {
            anyhow::bail!("model.base_prefix must not end with '/', got: {}", prefix);
        }
        Ok(())
    }

    fn validate_lock(&self) -> Result<()> {
        if self.lock.default_ttl_seconds == 0 {
            anyhow::bail!("lock.default_ttl_seconds must be > 0");
        }
        if self.lock.poll_interval_ms == 0 {
            anyhow::bail!("lock.poll_interval_ms must be > 0");
        }
        Ok(())
    }

    fn validate_telemetry(&self) -> Result<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.telemetry.log_level.as_str()) {
            anyhow::bail!(
                "telemetry.log_level must be one of {:?}, got: {}",
                valid_levels,
                self.telemetry.log_level
            );
        }
        Ok(())
    }
}

/// Override options applied on top of a loaded configuration.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Override etcd host.
    pub etcd_host: Option<String>,
    /// Override etcd port.
    pub etcd_port: Option<u16>,
    /// Override reference-store selection.
    pub mock_client: Option<bool>,
    /// Override log level.
    pub log_level: Option<String>,
}

impl ConfigOverrides {
    /// Read overrides from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read overrides through an arbitrary variable lookup.
    ///
    /// `ETCD_MOCK_CLIENT` is true only for the case-insensitive value `yes`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let etcd_port = match lookup("ETCD_PORT") {
            Some(raw) => Some(
                raw.trim()
                    .parse::<u16>()
                    .with_context(|| format!("ETCD_PORT is not a valid port: {}", raw))?,
            ),
            None => None,
        };

        Ok(Self {
            etcd_host: lookup("ETCD_HOST"),
            etcd_port,
            mock_client: lookup("ETCD_MOCK_CLIENT").map(|v| v.trim().eq_ignore_ascii_case("yes")),
            log_level: None,
        })
    }
}

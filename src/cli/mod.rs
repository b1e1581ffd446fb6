//! Command-line interface.
//!
//! Unified CLI for inspecting configuration and exercising the model runtime
//! against the reference store.

pub mod commands;

use crate::core::config::{Config, ConfigOverrides};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::Path;

/// etcd-model - persistence and coordination for reconciliation controllers.
#[derive(Parser, Debug)]
#[command(name = "etcd-model")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path.
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Configuration operations.
    Config(commands::ConfigArgs),
    /// Run a reconciliation round trip against the reference store.
    Demo(commands::DemoArgs),
}

/// Load the effective configuration.
///
/// Starts from the file at `path` (or built-in defaults), then applies
/// environment overrides and finally `log_level`.
pub fn load_config(path: Option<&Path>, log_level: Option<&str>) -> Result<Config> {
    let mut config = match path {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("failed to load config from {:?}", path))?,
        None => Config::default(),
    };
    let mut overrides = ConfigOverrides::from_env()?;
    if let Some(level) = log_level {
        overrides.log_level = Some(level.to_string());
    }
    config.apply_overrides(&overrides)?;
    Ok(config)
}

/// Initialize tracing subscriber if the telemetry feature is enabled.
///
/// `RUST_LOG` takes precedence over `default_level`.
#[cfg(feature = "telemetry")]
pub fn init_tracing(default_level: &str) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .init();
}

#[cfg(not(feature = "telemetry"))]
pub fn init_tracing(_default_level: &str) {}

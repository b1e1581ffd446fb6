//! Config command implementation.

use crate::cli::load_config;
use crate::core::config::Config;
use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use std::path::{Path, PathBuf};

/// Configuration operations.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Validate configuration file.
    Validate {
        /// Config file path.
        #[arg(short, long, default_value = "config/etcd-model.toml")]
        config: PathBuf,
    },
    /// Print the effective configuration, with defaults and environment
    /// overrides applied.
    Show {
        /// Config file path; built-in defaults when omitted.
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Output format (toml, json).
        #[arg(long, default_value = "toml")]
        format: String,
    },
    /// Generate a configuration template.
    Generate {
        /// Output file path.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Run the config command.
pub fn run_config(args: ConfigArgs) -> Result<()> {
    match args.command {
        ConfigCommand::Validate { config } => validate_config(&config),
        ConfigCommand::Show { config, format } => show_config(config.as_deref(), &format),
        ConfigCommand::Generate { output } => generate_config(output.as_deref()),
    }
}

fn validate_config(path: &Path) -> Result<()> {
    if !path.exists() {
        anyhow::bail!("Config file not found: {:?}", path);
    }
    let config = Config::from_file(path)?;
    println!("✓ Config file is valid");

    if !config.etcd.mock_client {
        println!(
            "  ⚠ Warning: etcd.mock_client is off; no network transport is linked, {} will be unavailable",
            config.etcd.endpoint()
        );
    }
    if config.lock.poll_interval_ms > config.lock.default_ttl_seconds * 1000 {
        println!("  ⚠ Warning: lock.poll_interval_ms exceeds the lock TTL");
    }

    println!("✓ Configuration validation complete");
    Ok(())
}

fn show_config(path: Option<&Path>, format: &str) -> Result<()> {
    let config = load_config(path, None)?;
    let rendered = render_config(&config, format)?;
    println!("{}", rendered);
    Ok(())
}

/// Render a configuration as TOML (default) or JSON.
pub(crate) fn render_config(config: &Config, format: &str) -> Result<String> {
    match format {
        "json" => serde_json::to_string_pretty(config).context("failed to render config as JSON"),
        _ => toml::to_string_pretty(config).context("failed to render config as TOML"),
    }
}

fn generate_config(output: Option<&Path>) -> Result<()> {
    let template = config_template();
    match output {
        Some(path) => {
            std::fs::write(path, &template)
                .with_context(|| format!("failed to write {:?}", path))?;
            println!("Generated config template: {:?}", path);
        }
        None => println!("{}", template),
    }
    Ok(())
}

fn config_template() -> String {
    r#"# etcd-model configuration

[etcd]
host = "localhost"
port = 2379
# Use the in-process reference store instead of a network client.
mock_client = true

[model]
base_prefix = "/etcd3_model"

[lock]
default_ttl_seconds = 60
poll_interval_ms = 100

[telemetry]
log_level = "info"
"#
    .to_string()
}

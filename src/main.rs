//! etcd-model - unified CLI entrypoint.
//!
//! Usage:
//!   etcd-model config validate --config config/etcd-model.toml
//!   etcd-model config show [--config FILE] [--format json]
//!   etcd-model config generate [--output FILE]
//!   etcd-model demo [--objects N]

use anyhow::Result;
use clap::Parser;
use etcd_model::cli::commands::{run_config, run_demo};
use etcd_model::cli::{init_tracing, load_config, Cli, Commands};
use std::path::Path;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Config(args) => {
            init_tracing(cli.log_level.as_deref().unwrap_or("info"));
            run_config(args)
        }
        Commands::Demo(args) => {
            let config = load_config(
                cli.config.as_deref().map(Path::new),
                cli.log_level.as_deref(),
            )?;
            init_tracing(&config.telemetry.log_level);
            run_demo(args, &config).await.map(|_| ())
        }
    }
}

//! CLI command implementations.

mod config;
mod demo;

pub use config::{run_config, ConfigArgs, ConfigCommand};
pub use demo::{run_demo, DemoArgs, DemoSummary};

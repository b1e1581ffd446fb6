//! Core infrastructure.
//!
//! - [`config`] - Configuration parsing and validation
//! - [`error`] - Error types for the store contract and model layer
//! - [`time`] - Deadline and wait utilities

pub mod config;
pub mod error;
pub mod time;

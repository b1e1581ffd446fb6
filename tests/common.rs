//! Common test utilities.
//!
//! This module contains shared helpers for integration tests.
//! Import with `mod common;` in test files.

#![allow(dead_code)]

use etcd_model::model::{Attribute, ModelDef};
use etcd_model::store::MemoryStore;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tempfile::NamedTempFile;

/// Write a configuration file.
pub fn create_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(content.as_bytes())
        .expect("Failed to write config");
    file
}

/// Create a minimal valid configuration file using the reference store.
pub fn create_minimal_config() -> NamedTempFile {
    create_config(
        r#"
[etcd]
mock_client = true
"#,
    )
}

/// A reference store with a short lock poll interval.
pub fn memory_store() -> Arc<MemoryStore> {
    Arc::new(MemoryStore::with_poll_interval(Duration::from_millis(5)))
}

/// A model type named `name` under `/test`, with identity `id`.
pub fn named_model(store: &Arc<MemoryStore>, name: &str) -> Arc<ModelDef> {
    ModelDef::builder(name)
        .store(store.clone())
        .model_prefix(format!("/test/{}", name))
        .attribute(Attribute::identity("id"))
        .attribute(Attribute::field("stuff", ""))
        .build()
}

/// The `Stuff` model: `stuff` defaulting to `""` and a generated `id`.
pub fn stuff_model(store: &Arc<MemoryStore>) -> Arc<ModelDef> {
    named_model(store, "Stuff")
}

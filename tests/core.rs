//! Core infrastructure tests.

mod common;

use etcd_model::core::config::{Config, ConfigOverrides};
use etcd_model::core::error::{ModelError, SchemaErrorKind, StoreError};
use etcd_model::core::time::{Deadline, Wait};
use std::collections::HashMap;
use std::time::Duration;

// ============================================================================
// Config tests
// ============================================================================

#[test]
fn parse_minimal_config() {
    let file = common::create_minimal_config();
    let config = Config::from_file(file.path()).unwrap();

    assert!(config.etcd.mock_client);
    assert_eq!(config.etcd.endpoint(), "localhost:2379");
    assert_eq!(config.model.base_prefix, "/etcd3_model");
    assert_eq!(config.lock.default_ttl(), Duration::from_secs(60));
    assert_eq!(config.lock.poll_interval(), Duration::from_millis(100));
    assert_eq!(config.telemetry.log_level, "info");
}

#[test]
fn parse_full_config() {
    let file = common::create_config(
        r#"
[etcd]
host = "etcd.internal"
port = 2479
mock_client = false

[model]
base_prefix = "/networking"

[lock]
default_ttl_seconds = 15
poll_interval_ms = 20

[telemetry]
log_level = "debug"
"#,
    );
    let config = Config::from_file(file.path()).unwrap();

    assert_eq!(config.etcd.endpoint(), "etcd.internal:2479");
    assert_eq!(config.model.model_prefix("Router"), "/networking/Router");
    assert_eq!(config.lock.default_ttl(), Duration::from_secs(15));
    assert_eq!(config.lock.poll_interval(), Duration::from_millis(20));
}

#[test]
fn validate_base_prefix_shape() {
    let file = common::create_config(
        r#"
[model]
base_prefix = "relative"
"#,
    );
    let result = Config::from_file(file.path());
    assert!(result.unwrap_err().to_string().contains("base_prefix"));

    let result = Config::from_toml(
        r#"
[model]
base_prefix = "/trailing/"
"#,
    );
    assert!(result.is_err());
}

#[test]
fn validate_zero_values() {
    assert!(Config::from_toml("[etcd]\nport = 0\n").is_err());
    assert!(Config::from_toml("[lock]\ndefault_ttl_seconds = 0\n").is_err());
    assert!(Config::from_toml("[lock]\npoll_interval_ms = 0\n").is_err());
}

#[test]
fn validate_log_level() {
    let result = Config::from_toml("[telemetry]\nlog_level = \"loud\"\n");
    assert!(result.unwrap_err().to_string().contains("log_level"));
}

#[test]
fn missing_config_file() {
    let result = Config::from_file(std::path::Path::new("/nonexistent/etcd-model.toml"));
    assert!(result.is_err());
}

#[test]
fn overrides_apply_and_revalidate() {
    let mut config = Config::default();
    let vars: HashMap<&str, &str> = [
        ("ETCD_HOST", "10.0.0.5"),
        ("ETCD_PORT", "32379"),
        ("ETCD_MOCK_CLIENT", "YES"),
    ]
    .into_iter()
    .collect();
    let overrides =
        ConfigOverrides::from_lookup(|name| vars.get(name).map(|v| v.to_string())).unwrap();
    config.apply_overrides(&overrides).unwrap();

    assert_eq!(config.etcd.endpoint(), "10.0.0.5:32379");
    assert!(config.etcd.mock_client);

    let bad = ConfigOverrides {
        log_level: Some("chatty".to_string()),
        ..ConfigOverrides::default()
    };
    assert!(config.apply_overrides(&bad).is_err());
}

#[test]
fn mock_client_only_for_yes() {
    for value in ["no", "true", "1", ""] {
        let overrides =
            ConfigOverrides::from_lookup(|name| (name == "ETCD_MOCK_CLIENT").then(|| value.to_string()))
                .unwrap();
        assert_eq!(overrides.mock_client, Some(false), "value {:?}", value);
    }
}

// ============================================================================
// Error tests
// ============================================================================

#[test]
fn schema_error_kinds_are_distinct() {
    let missing = ModelError::schema("A", SchemaErrorKind::MissingIdentity);
    let duplicate = ModelError::schema("A", SchemaErrorKind::DuplicateIdentity);
    assert_ne!(missing.schema_kind(), duplicate.schema_kind());
    assert!(missing.is_definition_error());
    assert!(ModelError::configuration("no prefix").is_definition_error());
    assert!(!ModelError::InvalidMessage.is_definition_error());
}

#[test]
fn store_errors_pass_through() {
    let err: ModelError = StoreError::invalid_key("empty key").into();
    assert!(matches!(err, ModelError::Store(StoreError::InvalidKey { .. })));
    assert_eq!(err.to_string(), "invalid key: empty key");
}

// ============================================================================
// Time tests
// ============================================================================

#[test]
fn wait_policies() {
    assert!(Wait::from_timeout(None).give_up().is_none());

    let immediate = Wait::from_timeout(Some(Duration::ZERO)).give_up().unwrap();
    assert!(immediate.is_reached());

    let bounded = Wait::from_timeout(Some(Duration::from_secs(5)))
        .give_up()
        .unwrap();
    assert!(!bounded.is_reached());
    assert!(bounded.remaining() <= Duration::from_secs(5));
}

#[test]
fn deadline_expiry() {
    let deadline = Deadline::after(Duration::from_millis(10));
    assert!(!deadline.has_passed());
    std::thread::sleep(Duration::from_millis(30));
    assert!(deadline.has_passed());
    assert_eq!(deadline.remaining(), Duration::ZERO);
}

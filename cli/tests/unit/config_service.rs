//! Configuration use-cases over a YAML file store.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use ferry_cli::application::ports::ConfigStore;
use ferry_cli::application::services::config_service::{load_config, set_config_value};
use ferry_cli::domain::ConfigError;
use ferry_cli::domain::HostKeyPolicy;
use ferry_cli::infra::YamlConfigStore;
use tempfile::TempDir;

fn store(dir: &TempDir) -> YamlConfigStore {
    YamlConfigStore::at(dir.path().join("config.yaml"))
}

#[test]
fn load_without_file_returns_defaults() {
    let dir = TempDir::new().unwrap();
    let config = load_config(&store(&dir)).unwrap();
    assert_eq!(config.environment.image, "ubuntu:22.04");
    assert!(!dir.path().join("config.yaml").exists());
}

#[test]
fn set_value_persists_and_returns_updated_config() {
    let dir = TempDir::new().unwrap();
    let updated = set_config_value(&store(&dir), "ssh.host_key_policy", "strict").unwrap();
    assert_eq!(updated.ssh.host_key_policy, HostKeyPolicy::Strict);

    let reloaded = load_config(&store(&dir)).unwrap();
    assert_eq!(reloaded, updated);
}

#[test]
fn set_values_accumulate() {
    let dir = TempDir::new().unwrap();
    set_config_value(&store(&dir), "environment.engine", "podman").unwrap();
    set_config_value(&store(&dir), "timeouts.step_secs", "45").unwrap();
    let config = load_config(&store(&dir)).unwrap();
    assert_eq!(config.environment.engine, "podman");
    assert_eq!(config.timeouts.step_secs, 45);
}

#[test]
fn unknown_key_leaves_file_untouched() {
    let dir = TempDir::new().unwrap();
    let err = set_config_value(&store(&dir), "ssh.password", "x").unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ConfigError>(),
        Some(ConfigError::UnknownKey { .. })
    ));
    assert!(!store(&dir).path().unwrap().exists());
}

#[test]
fn invalid_value_is_rejected() {
    let dir = TempDir::new().unwrap();
    let err = set_config_value(&store(&dir), "environment.engine", "lxc").unwrap_err();
    assert!(err.to_string().contains("docker, podman"));
}

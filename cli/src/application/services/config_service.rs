//! Application service: configuration use-cases.

use anyhow::Result;

use crate::application::ports::ConfigStore;
use crate::domain::config::{FerryConfig, apply_config_value};

/// Load configuration.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_config(store: &impl ConfigStore) -> Result<FerryConfig> {
    store.load()
}

/// Validate `key`/`value`, update the stored configuration and return it.
///
/// The file is left untouched when validation fails.
///
/// # Errors
///
/// Returns `ConfigError` for an unknown key or invalid value, or an I/O
/// error if the file cannot be written.
pub fn set_config_value(store: &impl ConfigStore, key: &str, value: &str) -> Result<FerryConfig> {
    let mut config = store.load()?;
    apply_config_value(&mut config, key, value)?;
    store.save(&config)?;
    tracing::debug!(key, value, "configuration updated");
    Ok(config)
}

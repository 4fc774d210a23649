//! Validators for ferry configuration keys.
//!
//! Pure functions only: no I/O, no async, no filesystem access.

use anyhow::Result;

pub use ferry_common::FerryConfig;
use ferry_common::{HostKeyPolicy, SshLogLevel};

use crate::domain::error::ConfigError;

// ── Constants ────────────────────────────────────────────────────────────────

pub const VALID_CONFIG_KEYS: &[&str] = &[
    "environment.image",
    "environment.engine",
    "ssh.host_key_policy",
    "ssh.log_level",
    "timeouts.step_secs",
];
pub const VALID_ENGINES: &[&str] = &["docker", "podman"];

// ── Validators ───────────────────────────────────────────────────────────────

/// Validates a configuration key against the whitelist.
///
/// # Errors
///
/// Returns an error if the key is not in the allowed list.
pub fn validate_config_key(key: &str) -> Result<()> {
    if !VALID_CONFIG_KEYS.contains(&key) {
        return Err(ConfigError::UnknownKey {
            key: key.to_string(),
            valid: VALID_CONFIG_KEYS.join(", "),
        }
        .into());
    }
    Ok(())
}

/// Validates a configuration value for the given key.
///
/// # Errors
///
/// Returns an error if the value is not valid for the key.
pub fn validate_config_value(key: &str, value: &str) -> Result<()> {
    let invalid = |valid: String| -> anyhow::Error {
        ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            valid,
        }
        .into()
    };
    match key {
        "environment.image" if value.trim().is_empty() || value.contains(char::is_whitespace) => {
            Err(invalid("an image reference such as ubuntu:22.04".to_string()))
        }
        "environment.engine" if !VALID_ENGINES.contains(&value) => {
            Err(invalid(VALID_ENGINES.join(", ")))
        }
        "ssh.host_key_policy" if value.parse::<HostKeyPolicy>().is_err() => {
            Err(invalid(HostKeyPolicy::VALUES.join(", ")))
        }
        "ssh.log_level" if value.parse::<SshLogLevel>().is_err() => {
            Err(invalid(SshLogLevel::VALUES.join(", ")))
        }
        "timeouts.step_secs" if value.parse::<u64>().is_err() => {
            Err(invalid("a number of seconds, 0 for no limit".to_string()))
        }
        _ => Ok(()),
    }
}

/// Writes a validated value into `config`.
///
/// # Errors
///
/// Returns an error if the key or value fails validation.
pub fn apply_config_value(config: &mut FerryConfig, key: &str, value: &str) -> Result<()> {
    validate_config_key(key)?;
    validate_config_value(key, value)?;
    match key {
        "environment.image" => config.environment.image = value.to_string(),
        "environment.engine" => config.environment.engine = value.to_string(),
        "ssh.host_key_policy" => {
            config.ssh.host_key_policy = value.parse().map_err(anyhow::Error::msg)?;
        }
        "ssh.log_level" => config.ssh.log_level = value.parse().map_err(anyhow::Error::msg)?,
        "timeouts.step_secs" => config.timeouts.step_secs = value.parse()?,
        _ => anyhow::bail!("Unknown setting: {key}"),
    }
    Ok(())
}

/// Current value of `key` rendered as a string.
#[must_use]
pub fn config_value(config: &FerryConfig, key: &str) -> Option<String> {
    match key {
        "environment.image" => Some(config.environment.image.clone()),
        "environment.engine" => Some(config.environment.engine.clone()),
        "ssh.host_key_policy" => Some(config.ssh.host_key_policy.as_str().to_string()),
        "ssh.log_level" => Some(config.ssh.log_level.as_str().to_string()),
        "timeouts.step_secs" => Some(config.timeouts.step_secs.to_string()),
        _ => None,
    }
}

// ── Unit tests ───────────────────────────────────────────────────────────────

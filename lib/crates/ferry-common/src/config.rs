use serde::{Deserialize, Serialize};

use crate::types::{HostKeyPolicy, SshLogLevel};

/// Top-level configuration stored in `~/.ferry/config.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct FerryConfig {
    /// Execution environment settings.
    pub environment: EnvironmentConfig,
    /// SSH/SCP client settings.
    pub ssh: SshConfig,
    /// Process timeouts.
    pub timeouts: TimeoutConfig,
}

/// Execution environment configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EnvironmentConfig {
    /// Base image for every module (default: `ubuntu:22.04`)
    pub image: String,
    /// Container engine binary: `docker` (default) or `podman`
    pub engine: String,
}

/// SSH client configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct SshConfig {
    /// Host key checking policy (default: `accept-any`)
    pub host_key_policy: HostKeyPolicy,
    /// `-o LogLevel=` value (default: `error`)
    pub log_level: SshLogLevel,
}

/// Timeout configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Upper bound for each recipe step, in seconds. `0` (the default)
    /// lets remote commands run for as long as they take.
    pub step_secs: u64,
}

pub const DEFAULT_IMAGE: &str = "ubuntu:22.04";
pub const DEFAULT_ENGINE: &str = "docker";
pub const DEFAULT_STEP_SECS: u64 = 0;

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            image: DEFAULT_IMAGE.to_string(),
            engine: DEFAULT_ENGINE.to_string(),
        }
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            step_secs: DEFAULT_STEP_SECS,
        }
    }
}

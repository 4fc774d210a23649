use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default SSH port used when a caller does not supply one.
pub const DEFAULT_PORT: u16 = 22;

/// Errors raised while validating a [`Destination`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DestinationError {
    #[error("destination host must not be empty")]
    EmptyHost,

    #[error("port {0} is out of range (expected 1-65535)")]
    InvalidPort(u32),

    #[error("destination '{0}' must not contain whitespace or start with '-'")]
    InvalidHost(String),
}

/// Remote endpoint of an SSH/SCP connection: `user@host` plus port.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Destination {
    host: String,
    port: u16,
}

impl Destination {
    /// Validates and builds a destination.
    ///
    /// The host spec is taken verbatim (`admin@example.com`, `sshd`, ...).
    /// A leading `-` is refused so the value can never be read as a flag by
    /// `ssh` or `scp`.
    pub fn new(host: impl Into<String>, port: u32) -> Result<Self, DestinationError> {
        let host = host.into();
        if host.trim().is_empty() {
            return Err(DestinationError::EmptyHost);
        }
        if host.starts_with('-') || host.chars().any(char::is_whitespace) {
            return Err(DestinationError::InvalidHost(host));
        }
        let port = u16::try_from(port)
            .ok()
            .filter(|p| *p != 0)
            .ok_or(DestinationError::InvalidPort(port))?;
        Ok(Self { host, port })
    }

    /// Builds a destination on the default port.
    pub fn with_default_port(host: impl Into<String>) -> Result<Self, DestinationError> {
        Self::new(host, u32::from(DEFAULT_PORT))
    }

    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// `host:path`, the remote operand form understood by `scp`.
    #[must_use]
    pub fn remote_path(&self, path: &str) -> String {
        format!("{}:{path}", self.host)
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// How `ssh`/`scp` treat unknown host keys.
///
/// Remote targets are usually ephemeral infrastructure whose keys cannot be
/// known ahead of time, so the default accepts any key.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "kebab-case")]
pub enum HostKeyPolicy {
    #[default]
    AcceptAny,
    AcceptNew,
    Strict,
}

impl HostKeyPolicy {
    pub const VALUES: &'static [&'static str] = &["accept-any", "accept-new", "strict"];

    /// Value for `-o StrictHostKeyChecking=`.
    #[must_use]
    pub fn ssh_option(self) -> &'static str {
        match self {
            Self::AcceptAny => "no",
            Self::AcceptNew => "accept-new",
            Self::Strict => "yes",
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AcceptAny => "accept-any",
            Self::AcceptNew => "accept-new",
            Self::Strict => "strict",
        }
    }
}

impl FromStr for HostKeyPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "accept-any" => Ok(Self::AcceptAny),
            "accept-new" => Ok(Self::AcceptNew),
            "strict" => Ok(Self::Strict),
            other => Err(format!("unknown host key policy '{other}'")),
        }
    }
}

/// Verbosity passed to `-o LogLevel=`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SshLogLevel {
    Quiet,
    Fatal,
    #[default]
    Error,
    Info,
    Verbose,
    Debug,
}

impl SshLogLevel {
    pub const VALUES: &'static [&'static str] =
        &["quiet", "fatal", "error", "info", "verbose", "debug"];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Quiet => "quiet",
            Self::Fatal => "fatal",
            Self::Error => "error",
            Self::Info => "info",
            Self::Verbose => "verbose",
            Self::Debug => "debug",
        }
    }
}

impl FromStr for SshLogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "quiet" => Ok(Self::Quiet),
            "fatal" => Ok(Self::Fatal),
            "error" => Ok(Self::Error),
            "info" => Ok(Self::Info),
            "verbose" => Ok(Self::Verbose),
            "debug" => Ok(Self::Debug),
            other => Err(format!("unknown ssh log level '{other}'")),
        }
    }
}

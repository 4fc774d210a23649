//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, or `std::process`.
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator; callers recover them with `downcast_ref`.

use thiserror::Error;

pub use ferry_common::DestinationError;

// ── Credential errors ─────────────────────────────────────────────────────────

/// A secret could not be turned into usable credential material.
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("invalid secret '{reference}': {reason}")]
    Unresolvable { reference: String, reason: String },

    #[error("malformed credential '{reference}': {reason}")]
    Malformed { reference: String, reason: String },

    #[error("HTTP username must not be empty")]
    EmptyUsername,
}

// ── Transfer errors ───────────────────────────────────────────────────────────

/// The file or directory name needed for a transfer could not be derived.
#[derive(Debug, Error)]
#[error("cannot determine a file name from '{path}'")]
pub struct NameResolutionError {
    pub path: String,
}

// ── Execution errors ──────────────────────────────────────────────────────────

/// A step inside the execution environment exited non-zero.
///
/// Raised by environment providers. `program` is only the executable name,
/// never the full argument vector, so inline credentials stay out of logs.
#[derive(Debug, Error)]
#[error("{program} exited with code {exit_code}")]
pub struct StepFailed {
    pub program: String,
    pub exit_code: i32,
    pub stderr: String,
    /// Position of the failing step in the environment's step list.
    pub step: usize,
}

/// A process was killed after running longer than its time limit.
#[derive(Debug, Error)]
#[error("{program} timed out after {seconds}s")]
pub struct TimedOut {
    pub program: String,
    pub seconds: u64,
}

/// The remote operation (ssh command or scp transfer) exited non-zero.
#[derive(Debug, Error)]
#[error("remote {program} failed with exit code {exit_code}")]
pub struct RemoteExecutionError {
    pub program: String,
    pub exit_code: i32,
    pub stderr: String,
}

/// `git clone` exited non-zero.
///
/// `url` is always the credential-free form of the repository URL.
#[derive(Debug, Error)]
#[error("git clone of {url} failed with exit code {exit_code}")]
pub struct CloneError {
    pub url: String,
    pub exit_code: i32,
    pub stderr: String,
}

// ── Repository errors ─────────────────────────────────────────────────────────

/// Errors related to the private-git working copy.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("'{0}' is not a directory")]
    NotADirectory(String),

    #[error("repository URL '{0}' has no scheme or host")]
    InvalidUrl(String),

    #[error("git {operation} failed with exit code {exit_code}")]
    GitFailed {
        operation: &'static str,
        exit_code: i32,
        stderr: String,
    },
}

// ── Config errors ─────────────────────────────────────────────────────────────

/// Errors related to configuration key/value validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unknown setting: {key}\n\nValid settings: {valid}")]
    UnknownKey { key: String, valid: String },

    #[error("Invalid value for {key}: {value}\n\nValid values: {valid}")]
    InvalidValue {
        key: String,
        value: String,
        valid: String,
    },
}

/// Exit code and stderr carried by a failed remote or clone operation.
///
/// Used by the binary to pass the underlying tool's failure through
/// unmodified.
#[must_use]
pub fn passthrough(err: &anyhow::Error) -> Option<(i32, &str)> {
    if let Some(e) = err.downcast_ref::<RemoteExecutionError>() {
        return Some((e.exit_code, e.stderr.as_str()));
    }
    if let Some(e) = err.downcast_ref::<CloneError>() {
        return Some((e.exit_code, e.stderr.as_str()));
    }
    if let Some(RepositoryError::GitFailed {
        exit_code, stderr, ..
    }) = err.downcast_ref::<RepositoryError>()
    {
        return Some((*exit_code, stderr.as_str()));
    }
    None
}

/// Stable machine-readable code for `--json` error objects.
#[must_use]
pub fn error_code(err: &anyhow::Error) -> &'static str {
    if err.downcast_ref::<CredentialError>().is_some() {
        "CREDENTIAL"
    } else if err.downcast_ref::<NameResolutionError>().is_some() {
        "NAME_RESOLUTION"
    } else if err.downcast_ref::<RemoteExecutionError>().is_some() {
        "REMOTE_FAILED"
    } else if err.downcast_ref::<CloneError>().is_some() {
        "CLONE_FAILED"
    } else if err.downcast_ref::<RepositoryError>().is_some() {
        "REPOSITORY"
    } else if err.downcast_ref::<DestinationError>().is_some() {
        "DESTINATION"
    } else if err.downcast_ref::<ConfigError>().is_some() {
        "CONFIG"
    } else if err.downcast_ref::<TimedOut>().is_some() {
        "TIMEOUT"
    } else if err.downcast_ref::<StepFailed>().is_some() {
        "ENVIRONMENT"
    } else {
        "ERROR"
    }
}

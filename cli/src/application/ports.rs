//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain`: never from `crate::infra`,
//! `crate::commands`, or `crate::output`.

use std::path::PathBuf;
use std::process::Output;

use anyhow::Result;

use crate::domain::config::FerryConfig;
use crate::domain::{
    CredentialError, DirectoryArtifact, Environment, FileArtifact, Plaintext, SecretRef,
};

// ── Value Types ───────────────────────────────────────────────────────────────

/// Captured result of one step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepOutput {
    /// Argument vector with credentials replaced by `***`.
    pub argv: Vec<String>,
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

/// Outputs of every step of a realized environment, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub steps: Vec<StepOutput>,
}

impl RunReport {
    #[must_use]
    pub fn last(&self) -> Option<&StepOutput> {
        self.steps.last()
    }
}

// ── Command Runner Port ───────────────────────────────────────────────────────

/// Abstracts process execution so infrastructure can be swapped or mocked.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run a program and capture its output.
    ///
    /// Implementations should delegate to `run_with_timeout` using the
    /// instance's configured default timeout.
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output>;
    /// Run a program with a custom timeout override.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or exceeds `timeout`.
    /// On timeout, the child process must be killed (not left orphaned).
    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout: std::time::Duration,
    ) -> Result<Output>;
    /// Run a program and wait for it however long it takes.
    async fn run_to_completion(&self, program: &str, args: &[&str]) -> Result<Output>;
    /// Run a program with stdin piped from `stdin`.
    async fn run_with_stdin(&self, program: &str, args: &[&str], stdin: &[u8]) -> Result<Output>;
}

// ── Execution Environment Port ────────────────────────────────────────────────

/// Realizes [`Environment`] recipes in an isolated sandbox.
///
/// Each call starts from the recipe's base image, applies mounts and
/// environment variables, runs every step in order and stops at the first
/// non-zero exit, which is reported as [`crate::domain::StepFailed`].
#[allow(async_fn_in_trait)]
pub trait EnvironmentProvider {
    /// Run all steps of `env` to completion.
    async fn run(&self, env: &Environment) -> Result<RunReport>;
    /// Run all steps, then copy the file at `path` out of the sandbox.
    async fn read_file(&self, env: &Environment, path: &str) -> Result<FileArtifact>;
    /// Run all steps, then copy the directory at `path` out of the sandbox.
    async fn read_directory(&self, env: &Environment, path: &str) -> Result<DirectoryArtifact>;
}

// ── Secret Store Port ─────────────────────────────────────────────────────────

/// Turns secret references into plaintext at the point of use.
pub trait SecretStore {
    /// Resolve `secret`.
    ///
    /// # Errors
    ///
    /// Returns `CredentialError::Unresolvable` when the value is missing,
    /// unreadable or empty.
    fn resolve(&self, secret: &SecretRef) -> Result<Plaintext, CredentialError>;
}

/// Composite port handed to every module: a provider that can also resolve
/// the secrets its recipes reference.
pub trait Runtime: EnvironmentProvider + SecretStore {}

/// Blanket implementation: any type implementing both ports is a `Runtime`.
impl<T> Runtime for T where T: EnvironmentProvider + SecretStore {}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Abstracts progress reporting so services can emit events without
/// depending on the Presentation layer. Sync trait: no async needed.
pub trait ProgressReporter {
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
}

// ── Configuration Port ────────────────────────────────────────────────────────

/// Abstracts configuration persistence.
pub trait ConfigStore {
    /// Load the configuration, falling back to defaults when none exists.
    fn load(&self) -> Result<FerryConfig>;
    /// Persist the configuration.
    fn save(&self, config: &FerryConfig) -> Result<()>;
    /// Location of the configuration file.
    fn path(&self) -> Result<PathBuf>;
}

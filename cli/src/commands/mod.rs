//! Command implementations

pub mod config;
pub mod git;
pub mod scp;
pub mod ssh;
pub mod version;

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::connection::{Authenticated, Configured, Credential, Protocol};
use crate::application::ports::{Runtime, StepOutput};
use crate::domain::{Destination, SecretRef};
use crate::output::json::{ArtifactResult, CommandResult, to_pretty};

/// Exactly one SSH/SCP credential.
#[derive(Args, Debug)]
#[group(id = "auth", required = true, multiple = false)]
pub struct AuthArgs {
    /// Read the password from this environment variable
    #[arg(long, value_name = "VAR")]
    pub password_env: Option<String>,

    /// Read the password from this file
    #[arg(long, value_name = "PATH")]
    pub password_file: Option<PathBuf>,

    /// Read the private key from this environment variable
    #[arg(long, value_name = "VAR")]
    pub identity_env: Option<String>,

    /// Read the private key from this file
    #[arg(long, value_name = "PATH")]
    pub identity_file: Option<PathBuf>,
}

impl AuthArgs {
    /// The selected credential.
    ///
    /// # Errors
    ///
    /// Returns an error if no credential flag was given.
    pub fn credential(&self) -> Result<Credential> {
        if let Some(name) = &self.password_env {
            return Ok(Credential::Password(SecretRef::env(name)));
        }
        if let Some(path) = &self.password_file {
            return Ok(Credential::Password(SecretRef::file(path)));
        }
        if let Some(name) = &self.identity_env {
            return Ok(Credential::IdentityKey(SecretRef::env(name)));
        }
        if let Some(path) = &self.identity_file {
            return Ok(Credential::IdentityKey(SecretRef::file(path)));
        }
        anyhow::bail!("one of --password-env, --password-file, --identity-env or --identity-file is required")
    }
}

/// Destination and credential shared by `ssh` and `scp`.
#[derive(Args, Debug)]
pub struct RemoteArgs {
    /// Remote server, e.g. `admin@example.com`
    #[arg(value_name = "DEST")]
    pub destination: String,

    /// Remote port
    #[arg(short, long, default_value_t = 22)]
    pub port: u32,

    #[command(flatten)]
    pub auth: AuthArgs,
}

impl RemoteArgs {
    /// Validated destination.
    ///
    /// # Errors
    ///
    /// Returns `DestinationError` for an empty host or out-of-range port.
    pub fn destination(&self) -> Result<Destination> {
        Ok(Destination::new(self.destination.as_str(), self.port)?)
    }
}

/// Binds the credential selected in `auth` onto `configured`.
///
/// # Errors
///
/// Returns `CredentialError` if the secret cannot be resolved or is malformed.
pub fn authenticate<'r, R: Runtime, P: Protocol>(
    configured: &Configured<'r, R, P>,
    auth: &AuthArgs,
) -> Result<Authenticated<'r, R, P>> {
    match auth.credential()? {
        Credential::Password(secret) => configured.with_password(&secret),
        Credential::IdentityKey(secret) => configured.with_identity_file(&secret),
    }
}

/// Prints the output of a remote command: verbatim, or as a JSON object.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn render_command(
    app: &AppContext,
    operation: &str,
    destination: &str,
    output: &StepOutput,
) -> Result<()> {
    if app.is_json() {
        println!(
            "{}",
            to_pretty(&CommandResult::new(operation, destination, output))?
        );
    } else {
        app.output.passthrough(&output.stdout, &output.stderr);
    }
    Ok(())
}

/// Prints where an artifact was written.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn render_artifact(app: &AppContext, operation: &str, path: &std::path::Path) -> Result<()> {
    if app.is_json() {
        println!(
            "{}",
            to_pretty(&ArtifactResult {
                operation,
                path: path.display().to_string(),
            })?
        );
    } else {
        app.output.success(&format!("Wrote {}", path.display()));
    }
    Ok(())
}

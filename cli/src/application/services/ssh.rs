//! Run remote server commands over SSH.
//!
//! ```text
//! Ssh::new(&runtime)
//!     .config(Destination::new("admin@sshd", 8022)?, None)
//!     .with_identity_file(&SecretRef::file("id_ed25519"))?
//!     .command("echo hi")
//!     .await?;
//! ```

use anyhow::Result;

use crate::application::connection::{Authenticated, Completed, Configured, Remote, SshProtocol};
use crate::application::ports::Runtime;
use crate::domain::shell;

/// SSH module handle.
pub type Ssh<'r, R> = Remote<'r, R, SshProtocol>;
/// SSH connection awaiting a credential.
pub type SshConfig<'r, R> = Configured<'r, R, SshProtocol>;
/// SSH connection ready to run commands.
pub type SshCommander<'r, R> = Authenticated<'r, R, SshProtocol>;

impl<R: Runtime> Authenticated<'_, R, SshProtocol> {
    /// Runs `command` on the remote server.
    ///
    /// `command` is handed to `ssh` as a single argument and interpreted by
    /// the remote login shell.
    ///
    /// # Errors
    ///
    /// Returns `RemoteExecutionError` if the remote command exits non-zero.
    pub async fn command(&self, command: &str) -> Result<Completed> {
        let host = self.destination().host().to_string();
        let step = self.template().step([host, command.to_string()]);
        tracing::info!(destination = %self.destination(), "running remote command");
        tracing::debug!(argv = ?step.redacted(), "ssh step");
        let env = self.fresh_environment().with_step(step);
        self.execute(env).await
    }

    /// Runs an argument vector on the remote server, quoting each argument
    /// so the remote shell sees exactly these words.
    ///
    /// # Errors
    ///
    /// Returns `RemoteExecutionError` if the remote command exits non-zero.
    pub async fn command_args<S: AsRef<str>>(&self, args: &[S]) -> Result<Completed> {
        self.command(&shell::join(args)).await
    }
}

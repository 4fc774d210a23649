//! Copy files and directories to and from a remote server over SCP.

use anyhow::Result;

use crate::application::connection::{
    Authenticated, Completed, Configured, Remote, ScpProtocol, last_step, remote_failure,
};
use crate::application::ports::Runtime;
use crate::domain::{DirectoryArtifact, FileArtifact, NameResolutionError};

/// Sandbox path a directory is staged at before upload.
pub const SOURCE_DIR: &str = "/source-dir";
/// Sandbox path a directory is downloaded to.
pub const TARGET_DIR: &str = "/target-dir";

/// SCP module handle.
pub type Scp<'r, R> = Remote<'r, R, ScpProtocol>;
/// SCP connection awaiting a credential.
pub type ScpConfig<'r, R> = Configured<'r, R, ScpProtocol>;
/// SCP connection ready to copy.
pub type ScpCommander<'r, R> = Authenticated<'r, R, ScpProtocol>;

/// Remote target, defaulting to the login directory.
fn target_or_default(target: Option<&str>) -> &str {
    match target {
        Some(t) if !t.is_empty() => t,
        _ => ".",
    }
}

/// Last path segment of a remote path.
fn remote_basename(source: &str) -> Result<&str, NameResolutionError> {
    match source.rsplit('/').next() {
        Some(name) if !name.is_empty() && name != "." && name != ".." => Ok(name),
        _ => Err(NameResolutionError {
            path: source.to_string(),
        }),
    }
}

impl<R: Runtime> Authenticated<'_, R, ScpProtocol> {
    /// Copies a local file to `target` on the remote server (default `.`).
    ///
    /// # Errors
    ///
    /// Returns `NameResolutionError` if the file has no name and
    /// `RemoteExecutionError` if `scp` fails.
    pub async fn file_to_remote(
        &self,
        source: &FileArtifact,
        target: Option<&str>,
    ) -> Result<Completed> {
        let target = target_or_default(target);
        let name = source.name().ok_or_else(|| NameResolutionError {
            path: source.path().display().to_string(),
        })?;
        let remote = self.destination().remote_path(target);
        tracing::info!(file = name, %remote, "uploading file");
        let env = self
            .fresh_environment()
            .with_file(name, source.path(), None)
            .with_step(self.template().step([name.to_string(), remote]));
        self.execute(env).await
    }

    /// Copies a remote file into the sandbox and returns it.
    ///
    /// # Errors
    ///
    /// Returns `NameResolutionError` if `source` has no final segment and
    /// `RemoteExecutionError` if `scp` fails.
    pub async fn file_from_remote(&self, source: &str) -> Result<FileArtifact> {
        let name = remote_basename(source)?;
        tracing::info!(%source, "downloading file");
        let env = self.fresh_environment().with_step(
            self.template()
                .step([self.destination().remote_path(source), name.to_string()]),
        );
        let step = last_step(&env);
        self.runtime()
            .read_file(&env, name)
            .await
            .map_err(|e| remote_failure::<ScpProtocol>(e, step))
    }

    /// Copies a local directory to `target` on the remote server.
    ///
    /// If `target` already exists as a directory, the upload lands in
    /// `<target>/source-dir`.
    ///
    /// # Errors
    ///
    /// Returns `RemoteExecutionError` if `scp` fails.
    pub async fn directory_to_remote(
        &self,
        source: &DirectoryArtifact,
        target: &str,
    ) -> Result<Completed> {
        let remote = self.destination().remote_path(target_or_default(Some(target)));
        tracing::info!(dir = %source.path().display(), %remote, "uploading directory");
        let env = self
            .fresh_environment()
            .with_directory(SOURCE_DIR, source.path())
            .with_step(
                self.template()
                    .step(["-r".to_string(), SOURCE_DIR.to_string(), remote]),
            );
        self.execute(env).await
    }

    /// Copies a remote directory into the sandbox and returns it.
    ///
    /// # Errors
    ///
    /// Returns `RemoteExecutionError` if `scp` fails.
    pub async fn directory_from_remote(&self, source: &str) -> Result<DirectoryArtifact> {
        tracing::info!(%source, "downloading directory");
        let env = self.fresh_environment().with_step(self.template().step([
            "-r".to_string(),
            self.destination().remote_path(source),
            TARGET_DIR.to_string(),
        ]));
        let step = last_step(&env);
        self.runtime()
            .read_directory(&env, TARGET_DIR)
            .await
            .map_err(|e| remote_failure::<ScpProtocol>(e, step))
    }
}

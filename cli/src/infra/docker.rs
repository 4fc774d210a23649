//! Container-engine implementation of the `EnvironmentProvider` port.
//!
//! `DockerProvider<R, S>` realizes an [`Environment`] with the engine CLI
//! (`docker` or `podman`), routing every call through a `CommandRunner`:
//!
//! ```text
//! create ─▶ start ─▶ copy mounts in ─▶ exec steps ─▶ [cp out] ─▶ rm -f
//! ```
//!
//! The container is removed on every path, including failures.

use std::path::Path;
use std::process::Output;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::application::ports::{
    CommandRunner, EnvironmentProvider, RunReport, SecretStore, StepOutput,
};
use crate::domain::secret::{normalize_private_key, sha256_hex};
use crate::domain::{
    CredentialError, DirectoryArtifact, Environment, FileArtifact, Mount, Plaintext, SecretRef,
    Step, StepFailed,
};

/// Command that keeps a created container alive until it is removed.
const KEEPALIVE: &[&str] = &["sleep", "infinity"];

/// What to copy out of the sandbox once every step succeeded.
enum Extract<'a> {
    None,
    File(&'a str),
    Directory(&'a str),
}

enum Extracted {
    None,
    File(FileArtifact),
    Directory(DirectoryArtifact),
}

/// Environment provider backed by a container engine CLI.
///
/// Generic over `R: CommandRunner` so tests can inject a recording runner,
/// and over `S: SecretStore` so mounted secrets resolve through the same
/// store the connection stages use.
pub struct DockerProvider<R: CommandRunner, S: SecretStore> {
    runner: R,
    secrets: S,
    engine: String,
    /// Limit for each recipe step. `None` waits for the step to finish.
    step_timeout: Option<Duration>,
}

impl<R: CommandRunner, S: SecretStore> DockerProvider<R, S> {
    pub fn new(
        runner: R,
        secrets: S,
        engine: impl Into<String>,
        step_timeout: Option<Duration>,
    ) -> Self {
        Self {
            runner,
            secrets,
            engine: engine.into(),
            step_timeout,
        }
    }

    #[must_use]
    pub fn engine(&self) -> &str {
        &self.engine
    }

    async fn engine_call(&self, args: &[&str]) -> Result<Output> {
        self.runner.run(&self.engine, args).await
    }

    /// Runs an engine command and fails on a non-zero exit.
    async fn checked(&self, what: &str, args: &[&str]) -> Result<Output> {
        let output = self.engine_call(args).await?;
        if !output.status.success() {
            anyhow::bail!(
                "{} {what} failed: {}",
                self.engine,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(output)
    }

    async fn create(&self, env: &Environment) -> Result<String> {
        let mut args: Vec<String> = vec!["create".to_string()];
        if let Some(workdir) = env.workdir() {
            args.extend(["-w".to_string(), workdir.to_string()]);
        }
        for (key, value) in env.env_vars() {
            args.extend(["-e".to_string(), format!("{key}={value}")]);
        }
        for service in env.services() {
            args.extend([
                "--add-host".to_string(),
                format!("{}:{}", service.alias, service.address),
            ]);
        }
        if let Some(network) = env.network() {
            args.extend(["--network".to_string(), network.to_string()]);
        }
        args.push(env.image().to_string());
        args.extend(KEEPALIVE.iter().map(ToString::to_string));

        let refs: Vec<&str> = args.iter().map(String::as_str).collect();
        let output = self.checked("create", &refs).await?;
        let id = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if id.is_empty() {
            anyhow::bail!("{} create returned no container id", self.engine);
        }
        tracing::debug!(container = %id, image = env.image(), "container created");
        Ok(id)
    }

    async fn remove(&self, id: &str) {
        match self.engine_call(&["rm", "-f", id]).await {
            Ok(out) if out.status.success() => {
                tracing::debug!(container = %id, "container removed");
            }
            Ok(out) => tracing::warn!(
                container = %id,
                stderr = %String::from_utf8_lossy(&out.stderr).trim(),
                "failed to remove container"
            ),
            Err(e) => tracing::warn!(container = %id, error = %e, "failed to remove container"),
        }
    }

    async fn mkdir_parent(&self, id: &str, path: &str) -> Result<()> {
        if let Some(parent) = Path::new(path).parent().and_then(Path::to_str)
            && !parent.is_empty()
            && parent != "/"
        {
            self.checked("exec mkdir", &["exec", id, "mkdir", "-p", parent])
                .await?;
        }
        Ok(())
    }

    async fn chmod(&self, id: &str, path: &str, mode: u32) -> Result<()> {
        let mode = format!("{mode:o}");
        self.checked("exec chmod", &["exec", id, "chmod", &mode, path])
            .await
            .map(|_| ())
    }

    async fn copy_in(&self, id: &str, env: &Environment, mount: &Mount) -> Result<()> {
        let target = env.resolve(mount.path());
        match mount {
            Mount::File { source, mode, .. } => {
                self.mkdir_parent(id, &target).await?;
                let src = source.to_string_lossy();
                let dest = format!("{id}:{target}");
                self.checked("cp", &["cp", &src, &dest])
                    .await
                    .with_context(|| format!("cannot copy {} into sandbox", source.display()))?;
                if let Some(mode) = mode {
                    self.chmod(id, &target, *mode).await?;
                }
            }
            Mount::Directory { source, .. } => {
                self.checked("exec mkdir", &["exec", id, "mkdir", "-p", &target])
                    .await?;
                let src = format!("{}/.", source.display());
                let dest = format!("{id}:{target}");
                self.checked("cp", &["cp", &src, &dest])
                    .await
                    .with_context(|| format!("cannot copy {} into sandbox", source.display()))?;
            }
            Mount::Secret {
                secret,
                mode,
                private_key,
                ..
            } => {
                let value = self.secrets.resolve(secret)?;
                self.write_secret(id, &target, secret, &value, *mode, *private_key)
                    .await?;
            }
        }
        Ok(())
    }

    /// Streams a secret over stdin, restricts it to `mode` and checks that
    /// the bytes in the container match what was sent.
    async fn write_secret(
        &self,
        id: &str,
        target: &str,
        reference: &SecretRef,
        value: &Plaintext,
        mode: u32,
        private_key: bool,
    ) -> Result<()> {
        let bytes = if private_key {
            normalize_private_key(value.expose().as_bytes())
        } else {
            value.expose().as_bytes().to_vec()
        };
        self.mkdir_parent(id, target).await?;
        let output = self
            .runner
            .run_with_stdin(
                &self.engine,
                &["exec", "-i", id, "sh", "-c", "umask 077 && cat > \"$1\"", "sh", target],
                &bytes,
            )
            .await?;
        if !output.status.success() {
            anyhow::bail!(
                "cannot write {} into sandbox: {}",
                reference.describe(),
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        self.chmod(id, target, mode).await?;

        let digest = self
            .checked("exec sha256sum", &["exec", id, "sha256sum", target])
            .await?;
        let remote = String::from_utf8_lossy(&digest.stdout);
        let remote = remote.split_whitespace().next().unwrap_or_default();
        if remote != sha256_hex(&bytes) {
            return Err(CredentialError::Malformed {
                reference: reference.describe(),
                reason: format!("content at {target} differs from the resolved secret"),
            }
            .into());
        }
        tracing::debug!(secret = %reference.describe(), path = target, "secret mounted");
        Ok(())
    }

    async fn exec_step(&self, id: &str, index: usize, step: &Step) -> Result<StepOutput> {
        let mut args = vec!["exec", id];
        args.extend(step.argv().iter().map(String::as_str));
        tracing::debug!(step = index, argv = ?step.redacted(), "exec");
        let output = match self.step_timeout {
            Some(limit) => self.runner.run_with_timeout(&self.engine, &args, limit).await,
            None => self.runner.run_to_completion(&self.engine, &args).await,
        }
        .with_context(|| format!("step {index} ({})", step.program()))?;
        let exit_code = output.status.code().unwrap_or(-1);
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        if !output.status.success() {
            return Err(StepFailed {
                program: step.program().to_string(),
                exit_code,
                stderr,
                step: index,
            }
            .into());
        }
        Ok(StepOutput {
            argv: step.redacted(),
            exit_code,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr,
        })
    }

    async fn copy_out(&self, id: &str, env: &Environment, extract: &Extract<'_>) -> Result<Extracted> {
        let (path, is_dir) = match extract {
            Extract::None => return Ok(Extracted::None),
            Extract::File(path) => (*path, false),
            Extract::Directory(path) => (*path, true),
        };
        let source = env.resolve(path);
        let scratch = tempfile::Builder::new()
            .prefix("ferry-")
            .tempdir()
            .context("cannot create scratch directory")?;
        let name = Path::new(source.trim_end_matches('/'))
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("artifact")
            .to_string();
        let local = scratch.path().join(&name);
        let (src, what) = if is_dir {
            (format!("{id}:{}/.", source.trim_end_matches('/')), "directory")
        } else {
            (format!("{id}:{source}"), "file")
        };
        let dest = local.to_string_lossy().into_owned();
        self.checked("cp", &["cp", &src, &dest])
            .await
            .with_context(|| format!("cannot copy {what} {source} out of sandbox"))?;

        let guard = Arc::new(scratch);
        Ok(if is_dir {
            Extracted::Directory(DirectoryArtifact::with_guard(local, guard))
        } else {
            Extracted::File(FileArtifact::with_guard(local, guard))
        })
    }

    async fn drive(
        &self,
        id: &str,
        env: &Environment,
        extract: &Extract<'_>,
    ) -> Result<(RunReport, Extracted)> {
        self.checked("start", &["start", id]).await?;
        for mount in env.mounts() {
            self.copy_in(id, env, mount).await?;
        }
        let mut report = RunReport::default();
        for (index, step) in env.steps().iter().enumerate() {
            report.steps.push(self.exec_step(id, index, step).await?);
        }
        let extracted = self.copy_out(id, env, extract).await?;
        Ok((report, extracted))
    }

    async fn realize(&self, env: &Environment, extract: Extract<'_>) -> Result<(RunReport, Extracted)> {
        let id = self.create(env).await?;
        let result = self.drive(&id, env, &extract).await;
        self.remove(&id).await;
        result
    }
}

impl<R: CommandRunner, S: SecretStore> EnvironmentProvider for DockerProvider<R, S> {
    async fn run(&self, env: &Environment) -> Result<RunReport> {
        self.realize(env, Extract::None).await.map(|(report, _)| report)
    }

    async fn read_file(&self, env: &Environment, path: &str) -> Result<FileArtifact> {
        match self.realize(env, Extract::File(path)).await?.1 {
            Extracted::File(file) => Ok(file),
            _ => anyhow::bail!("no file extracted for {path}"),
        }
    }

    async fn read_directory(&self, env: &Environment, path: &str) -> Result<DirectoryArtifact> {
        match self.realize(env, Extract::Directory(path)).await?.1 {
            Extracted::Directory(dir) => Ok(dir),
            _ => anyhow::bail!("no directory extracted for {path}"),
        }
    }
}

impl<R: CommandRunner, S: SecretStore> SecretStore for DockerProvider<R, S> {
    fn resolve(&self, secret: &SecretRef) -> Result<Plaintext, CredentialError> {
        self.secrets.resolve(secret)
    }
}

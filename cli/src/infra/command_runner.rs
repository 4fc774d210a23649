//! Infrastructure implementation of the `CommandRunner` port.
//!
//! `TokioCommandRunner` drives the container engine CLI. Bounded invocations
//! kill a child that overruns its timeout rather than leaving it running in
//! the background.

use std::process::{Output, Stdio};
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::Child;

use crate::application::ports::CommandRunner;
use crate::domain::TimedOut;

/// Default timeout for engine bookkeeping commands (create, start, cp, rm).
/// `create` may pull the image first.
pub const DEFAULT_CMD_TIMEOUT: Duration = Duration::from_secs(600);

/// Production `CommandRunner` backed by `tokio::process`.
pub struct TokioCommandRunner {
    timeout: Duration,
}

impl TokioCommandRunner {
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for TokioCommandRunner {
    fn default() -> Self {
        Self::new(DEFAULT_CMD_TIMEOUT)
    }
}

fn spawn(program: &str, args: &[&str], stdin: bool) -> Result<Child> {
    tracing::trace!(program, ?args, "spawning");
    tokio::process::Command::new(program)
        .args(args)
        .stdin(if stdin { Stdio::piped() } else { Stdio::null() })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .with_context(|| format!("failed to spawn {program}"))
}

/// Waits for `child` while draining its pipes, killing it after `timeout`
/// when one is given.
async fn collect(mut child: Child, program: &str, timeout: Option<Duration>) -> Result<Output> {
    let mut stdout_handle = child.stdout.take();
    let mut stderr_handle = child.stderr.take();
    let deadline = async {
        match timeout {
            Some(limit) => tokio::time::sleep(limit).await,
            None => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        result = async {
            let (status, stdout, stderr) = tokio::join!(
                child.wait(),
                async {
                    let mut buf = Vec::new();
                    if let Some(ref mut h) = stdout_handle {
                        let _ = h.read_to_end(&mut buf).await;
                    }
                    buf
                },
                async {
                    let mut buf = Vec::new();
                    if let Some(ref mut h) = stderr_handle {
                        let _ = h.read_to_end(&mut buf).await;
                    }
                    buf
                },
            );
            Ok(Output {
                status: status.with_context(|| format!("waiting for {program}"))?,
                stdout,
                stderr,
            })
        } => result,
        () = deadline => {
            let _ = child.kill().await;
            Err(anyhow::Error::from(TimedOut {
                program: program.to_string(),
                seconds: timeout.map_or(0, |t| t.as_secs()),
            }))
        }
    }
}

impl CommandRunner for TokioCommandRunner {
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output> {
        self.run_with_timeout(program, args, self.timeout).await
    }

    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<Output> {
        let child = spawn(program, args, false)?;
        collect(child, program, Some(timeout)).await
    }

    async fn run_to_completion(&self, program: &str, args: &[&str]) -> Result<Output> {
        let child = spawn(program, args, false)?;
        collect(child, program, None).await
    }

    async fn run_with_stdin(&self, program: &str, args: &[&str], input: &[u8]) -> Result<Output> {
        let mut child = spawn(program, args, true)?;
        let stdin_handle = child.stdin.take();
        let input_owned = input.to_vec();
        // Closing stdin after the write signals EOF to the child.
        let stdin_task = tokio::spawn(async move {
            if let Some(mut stdin) = stdin_handle {
                let _ = stdin.write_all(&input_owned).await;
            }
        });
        let output = collect(child, program, Some(self.timeout)).await;
        let _ = stdin_task.await;
        output
    }
}

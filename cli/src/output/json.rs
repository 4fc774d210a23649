//! JSON output helpers.
//!
//! Every `--json` code path prints exactly one pretty-printed object on
//! stdout: a result object on success, an error object on failure.

use anyhow::{Context, Result};
use serde::Serialize;

use crate::application::ports::StepOutput;

/// Format a JSON error object.
///
/// Output (pretty-printed):
/// ```json
/// {
///   "error": true,
///   "message": "...",
///   "code": "...",
///   "exit_code": 1,
///   "stderr": "..."
/// }
/// ```
///
/// `stderr` is present only when the failing remote tool printed something,
/// and carries that output unmodified.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_error(
    message: &str,
    code: &str,
    exit_code: i32,
    stderr: Option<&str>,
) -> Result<String> {
    let mut obj = serde_json::json!({
        "error": true,
        "message": message,
        "code": code,
        "exit_code": exit_code,
    });
    if let Some(stderr) = stderr.filter(|s| !s.is_empty()) {
        obj["stderr"] = serde_json::Value::from(stderr);
    }
    serde_json::to_string_pretty(&obj).context("JSON serialization failed")
}

/// Result of an operation that ran a remote command.
#[derive(Debug, Serialize)]
pub struct CommandResult<'a> {
    pub operation: &'a str,
    pub destination: &'a str,
    /// Argument vector with credentials masked.
    pub argv: &'a [String],
    pub exit_code: i32,
    pub stdout: &'a str,
    pub stderr: &'a str,
}

impl<'a> CommandResult<'a> {
    #[must_use]
    pub fn new(operation: &'a str, destination: &'a str, output: &'a StepOutput) -> Self {
        Self {
            operation,
            destination,
            argv: &output.argv,
            exit_code: output.exit_code,
            stdout: &output.stdout,
            stderr: &output.stderr,
        }
    }
}

/// Result of an operation that produced a local artifact.
#[derive(Debug, Serialize)]
pub struct ArtifactResult<'a> {
    pub operation: &'a str,
    pub path: String,
}

/// Serialize `value` as pretty JSON.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn to_pretty<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("JSON serialization failed")
}

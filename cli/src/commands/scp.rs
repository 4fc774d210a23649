//! `ferry scp`: copy files and directories to and from a remote server.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::app::AppContext;
use crate::application::ports::ProgressReporter;
use crate::application::services::Scp;
use crate::commands::{RemoteArgs, authenticate, render_artifact, render_command};
use crate::domain::{DirectoryArtifact, FileArtifact};
use crate::infra::fs::{persist_directory, persist_file};

/// Arguments for `ferry scp`.
#[derive(Args, Debug)]
pub struct ScpArgs {
    #[command(flatten)]
    pub remote: RemoteArgs,

    #[command(subcommand)]
    pub operation: ScpOperation,
}

/// SCP operations.
#[derive(Subcommand, Debug)]
pub enum ScpOperation {
    /// Copy a local file to the remote server
    FileToRemote {
        /// Local file
        file: PathBuf,
        /// Remote target path (default: login directory)
        #[arg(long)]
        target: Option<String>,
    },
    /// Copy a remote file to the local machine
    FileFromRemote {
        /// Remote file path
        source: String,
        /// Local directory to write into
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
    /// Copy a local directory to the remote server
    DirToRemote {
        /// Local directory
        dir: PathBuf,
        /// Remote target path
        target: String,
    },
    /// Copy a remote directory to the local machine
    DirFromRemote {
        /// Remote directory path
        source: String,
        /// Local directory to write into
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
}

/// Local name for a downloaded directory: the last segment of `source`.
fn download_name(source: &str) -> &str {
    source
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty() && *s != "." && *s != "..")
        .unwrap_or("download")
}

/// Run the scp command.
///
/// # Errors
///
/// Returns the first error of the staged chain, the transfer, or writing
/// the downloaded artifact.
pub async fn run(app: &AppContext, args: ScpArgs) -> Result<()> {
    let runtime = app.runtime();
    let scp = Scp::with_options(&runtime, app.options());
    let base = app.bind_services(&scp.base_environment());
    let configured = scp.config(args.remote.destination()?, Some(base));
    let commander = authenticate(&configured, &args.remote.auth)?;
    let destination = commander.destination().to_string();
    let reporter = app.reporter();

    match args.operation {
        ScpOperation::FileToRemote { file, target } => {
            reporter.step(&format!("Uploading {} to {destination}", file.display()));
            let completed = commander
                .file_to_remote(&FileArtifact::new(file), target.as_deref())
                .await?;
            render_command(app, "file-to-remote", &destination, &completed.output)
        }
        ScpOperation::FileFromRemote { source, out } => {
            reporter.step(&format!("Downloading {source} from {destination}"));
            let file = commander.file_from_remote(&source).await?;
            let written = persist_file(&file, &out)?;
            render_artifact(app, "file-from-remote", &written)
        }
        ScpOperation::DirToRemote { dir, target } => {
            reporter.step(&format!("Uploading {} to {destination}", dir.display()));
            let completed = commander
                .directory_to_remote(&DirectoryArtifact::new(dir), &target)
                .await?;
            render_command(app, "dir-to-remote", &destination, &completed.output)
        }
        ScpOperation::DirFromRemote { source, out } => {
            reporter.step(&format!("Downloading {source} from {destination}"));
            let dir = commander.directory_from_remote(&source).await?;
            let written = persist_directory(&dir, &out.join(download_name(&source)))?;
            render_artifact(app, "dir-from-remote", &written)
        }
    }
}

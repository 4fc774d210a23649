//! `ferry ssh`: run a command on a remote server.

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::app::AppContext;
use crate::application::ports::ProgressReporter;
use crate::application::services::Ssh;
use crate::commands::{RemoteArgs, authenticate, render_command};

/// Arguments for `ferry ssh`.
#[derive(Args, Debug)]
pub struct SshArgs {
    #[command(flatten)]
    pub remote: RemoteArgs,

    #[command(subcommand)]
    pub operation: SshOperation,
}

/// SSH operations.
#[derive(Subcommand, Debug)]
pub enum SshOperation {
    /// Run a command on the remote server
    ///
    /// A single argument is passed to the remote shell as is; several
    /// arguments are quoted individually and joined.
    Command {
        #[arg(required = true, num_args = 1.., trailing_var_arg = true, allow_hyphen_values = true)]
        text: Vec<String>,
    },
}

/// Run the ssh command.
///
/// # Errors
///
/// Returns the first error of the staged chain or the remote command.
pub async fn run(app: &AppContext, args: SshArgs) -> Result<()> {
    let runtime = app.runtime();
    let ssh = Ssh::with_options(&runtime, app.options());
    let base = app.bind_services(&ssh.base_environment());
    let configured = ssh.config(args.remote.destination()?, Some(base));
    let commander = authenticate(&configured, &args.remote.auth)?;
    let destination = commander.destination().to_string();

    match args.operation {
        SshOperation::Command { text } => {
            app.reporter()
                .step(&format!("Running command on {destination}"));
            let completed = match text.as_slice() {
                [single] => commander.command(single).await?,
                words => commander.command_args(words).await?,
            };
            render_command(app, "ssh", &destination, &completed.output)
        }
    }
}

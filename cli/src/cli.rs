//! CLI argument parsing with clap derive

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::app::{AppContext, AppFlags, OutputFlags, OutputMode, Overrides};
use crate::commands;
use crate::domain::{HostKeyPolicy, ServiceBinding};

/// Run SSH, SCP and private-git operations inside disposable containers
#[derive(Parser, Debug)]
#[command(
    name = "ferry",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Log debug diagnostics to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Base image for the sandbox
    #[arg(long, global = true, value_name = "IMAGE")]
    pub image: Option<String>,

    /// Container engine binary
    #[arg(long, global = true, value_parser = ["docker", "podman"])]
    pub engine: Option<String>,

    /// Remote host key verification
    #[arg(long, global = true, value_enum)]
    pub host_key_policy: Option<HostKeyPolicy>,

    /// Make a network service reachable from the sandbox as ALIAS
    #[arg(long = "service", global = true, value_name = "ALIAS=ADDR", value_parser = parse_service)]
    pub services: Vec<ServiceBinding>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run commands on a remote server over SSH
    Ssh(commands::ssh::SshArgs),

    /// Copy files and directories over SCP
    Scp(commands::scp::ScpArgs),

    /// Clone, push and pull private git repositories
    Git(commands::git::GitArgs),

    /// Manage configuration
    #[command(subcommand)]
    Config(commands::config::ConfigCommand),

    /// Show version
    Version,
}

/// Parses `ALIAS=ADDR`.
///
/// # Errors
///
/// Returns a message when either side is empty or `=` is missing.
pub fn parse_service(raw: &str) -> Result<ServiceBinding, String> {
    match raw.split_once('=') {
        Some((alias, address)) if !alias.trim().is_empty() && !address.trim().is_empty() => {
            Ok(ServiceBinding {
                alias: alias.trim().to_string(),
                address: address.trim().to_string(),
            })
        }
        _ => Err(format!("expected ALIAS=ADDR, got '{raw}'")),
    }
}

impl Cli {
    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns the command's error unchanged so the caller can map it to an
    /// exit code.
    pub async fn run(self) -> Result<()> {
        let Cli {
            json,
            quiet,
            no_color,
            verbose: _,
            image,
            engine,
            host_key_policy,
            services,
            command,
        } = self;
        if matches!(command, Command::Version) {
            let mode = if json { OutputMode::Json } else { OutputMode::Human };
            return commands::version::run(mode);
        }
        let app = AppContext::new(AppFlags {
            output: OutputFlags {
                no_color,
                quiet,
                json,
            },
            overrides: Overrides {
                image,
                engine,
                host_key_policy,
                services,
            },
        })?;
        match command {
            Command::Ssh(args) => commands::ssh::run(&app, args).await,
            Command::Scp(args) => commands::scp::run(&app, args).await,
            Command::Git(args) => commands::git::run(&app, args).await,
            Command::Config(cmd) => commands::config::run(&app, cmd),
            Command::Version => Ok(()),
        }
    }
}

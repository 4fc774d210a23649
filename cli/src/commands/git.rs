//! `ferry git`: clone, push and pull private repositories.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{ArgGroup, Args, Subcommand};

use crate::app::{AppContext, AppRuntime};
use crate::application::ports::{ProgressReporter, Runtime};
use crate::application::services::{GitHttp, GitSsh, PrivateGit, Repo, RepoUrl};
use crate::commands::{render_artifact, render_command};
use crate::domain::{DirectoryArtifact, RepositoryError, SecretRef};
use crate::infra::fs::{persist_directory, replace_directory};

/// Exactly one repository credential: an SSH key, or a user with a password.
#[derive(Args, Debug)]
#[command(group(ArgGroup::new("git-auth").required(true).args(["ssh_key", "ssh_key_env", "user"])))]
#[command(group(ArgGroup::new("git-password").args(["password_env", "password_file"]).requires("user")))]
pub struct GitAuthArgs {
    /// Private key file for SSH access
    #[arg(long, value_name = "PATH")]
    pub ssh_key: Option<PathBuf>,

    /// Environment variable holding the private key
    #[arg(long, value_name = "VAR")]
    pub ssh_key_env: Option<String>,

    /// Username for HTTP access
    #[arg(long, value_name = "NAME", requires = "git-password")]
    pub user: Option<String>,

    /// Environment variable holding the HTTP password
    #[arg(long, value_name = "VAR")]
    pub password_env: Option<String>,

    /// File holding the HTTP password
    #[arg(long, value_name = "PATH")]
    pub password_file: Option<PathBuf>,
}

/// Arguments for `ferry git`.
#[derive(Args, Debug)]
pub struct GitArgs {
    #[command(flatten)]
    pub auth: GitAuthArgs,

    #[command(subcommand)]
    pub operation: GitOperation,
}

/// Git operations.
#[derive(Subcommand, Debug)]
pub enum GitOperation {
    /// Clone a repository
    Clone {
        /// Repository URL (ssh or http)
        url: String,
        /// Local directory for the checkout (default: repository name)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Push a local checkout
    Push {
        /// Local checkout
        dir: PathBuf,
        /// Commit author name set before pushing
        #[arg(long, requires = "user_email")]
        user_name: Option<String>,
        /// Commit author email set before pushing
        #[arg(long, requires = "user_name")]
        user_email: Option<String>,
    },
    /// Pull into a local checkout
    Pull {
        /// Local checkout
        dir: PathBuf,
        /// Where to write the updated checkout (default: in place)
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

/// Credential-bound git stage.
enum Access<'r, R> {
    Ssh(GitSsh<'r, R>),
    Http(GitHttp<'r, R>),
}

impl<'r, R: Runtime> Access<'r, R> {
    fn bind(git: &PrivateGit<'r, R>, auth: &GitAuthArgs) -> Result<Self> {
        if let Some(path) = &auth.ssh_key {
            return Ok(Self::Ssh(git.with_ssh_key(&SecretRef::file(path))?));
        }
        if let Some(name) = &auth.ssh_key_env {
            return Ok(Self::Ssh(git.with_ssh_key(&SecretRef::env(name))?));
        }
        let user = auth
            .user
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("one of --ssh-key, --ssh-key-env or --user is required"))?;
        let password = match (&auth.password_env, &auth.password_file) {
            (Some(name), _) => SecretRef::env(name),
            (None, Some(path)) => SecretRef::file(path),
            (None, None) => anyhow::bail!("--user requires --password-env or --password-file"),
        };
        Ok(Self::Http(git.with_user_password(user, password)?))
    }

    fn repo_url(&self, url: &str) -> Result<RepoUrl<'r, R>> {
        match self {
            Self::Ssh(ssh) => Ok(ssh.with_repo_url(url)),
            Self::Http(http) => http.with_repo_url(url),
        }
    }

    fn repo(&self, dir: &Path) -> Result<Repo<'r, R>> {
        if !dir.is_dir() {
            return Err(RepositoryError::NotADirectory(dir.display().to_string()).into());
        }
        let dir = DirectoryArtifact::new(dir);
        Ok(match self {
            Self::Ssh(ssh) => ssh.repo(dir),
            Self::Http(http) => http.repo(dir),
        })
    }
}

/// Default checkout directory: the last path segment without `.git`.
fn checkout_name(url: &str) -> &str {
    let last = url
        .trim_end_matches('/')
        .rsplit(['/', ':'])
        .next()
        .unwrap_or_default();
    let name = last.strip_suffix(".git").unwrap_or(last);
    if name.is_empty() { "repo" } else { name }
}

/// Run the git command.
///
/// # Errors
///
/// Returns the first error of the staged chain or of the git invocation.
pub async fn run(app: &AppContext, args: GitArgs) -> Result<()> {
    let runtime = app.runtime();
    let options = app.options();
    let base = app.bind_services(&PrivateGit::<AppRuntime>::base_environment(&options));
    let git = PrivateGit::new(&runtime, options, Some(base));
    let access = Access::bind(&git, &args.auth)?;
    let reporter = app.reporter();

    match args.operation {
        GitOperation::Clone { url, out } => {
            let repo_url = access.repo_url(&url)?;
            reporter.step(&format!("Cloning {}", repo_url.url()));
            let repo = repo_url.clone().await?;
            let dest = out.unwrap_or_else(|| PathBuf::from(checkout_name(&url)));
            let written = persist_directory(repo.directory(), &dest)?;
            render_artifact(app, "clone", &written)
        }
        GitOperation::Push {
            dir,
            user_name,
            user_email,
        } => {
            let mut repo = access.repo(&dir)?;
            if let (Some(name), Some(email)) = (&user_name, &user_email) {
                repo = repo.set_config(name, email);
            }
            reporter.step(&format!("Pushing {}", dir.display()));
            let completed = repo.push().await?;
            render_command(app, "push", &dir.display().to_string(), &completed.output)
        }
        GitOperation::Pull { dir, out } => {
            reporter.step(&format!("Pulling {}", dir.display()));
            let updated = access.repo(&dir)?.pull().await?;
            let written = replace_directory(&updated, out.as_deref().unwrap_or(&dir))?;
            render_artifact(app, "pull", &written)
        }
    }
}

//! Clone, push and pull private git repositories.
//!
//! ```text
//! PrivateGit ──with_ssh_key()──────────▶ GitSsh  ──with_repo_url()──▶ RepoUrl ──clone()──▶ Repo
//!            ──with_user_password()────▶ GitHttp ──with_repo_url()──▶ RepoUrl
//!            ──repo(dir)───────────────▶ Repo    (also from GitSsh / GitHttp)
//! ```
//!
//! The working copy always lives at [`WORK_DIR`] inside the sandbox.

use anyhow::Result;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

use crate::application::connection::{
    Completed, IDENTITY_KEY_PATH, Options, last_step, map_step_failure,
};
use crate::application::ports::Runtime;
use crate::domain::secret::validate_private_key;
use crate::domain::{
    CloneError, CredentialError, DirectoryArtifact, Environment, RepositoryError, SecretRef,
    Step, shell,
};

/// Fixed working directory of the repository inside the sandbox.
pub const WORK_DIR: &str = "/tmp/repo/";

/// Characters left unescaped in URL userinfo (RFC 3986 unreserved).
const USERINFO: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

// ── URL helpers ───────────────────────────────────────────────────────────────

/// A repository URL with credentials embedded, and the same URL without the
/// password.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthenticatedUrl {
    pub with_password: String,
    pub public: String,
}

impl std::fmt::Debug for AuthenticatedUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthenticatedUrl")
            .field("public", &self.public)
            .finish_non_exhaustive()
    }
}

/// Rewrites the authority of `url` to `user:password@host`.
///
/// An existing userinfo is replaced. When `username` is empty the user
/// already present in the URL is kept.
///
/// # Errors
///
/// Returns `RepositoryError::InvalidUrl` when `url` has no scheme or host.
pub fn embed_credentials(
    url: &str,
    username: &str,
    password: &str,
) -> Result<AuthenticatedUrl, RepositoryError> {
    let invalid = || RepositoryError::InvalidUrl(url.to_string());
    let (scheme, rest) = url.split_once("://").ok_or_else(invalid)?;
    if scheme.is_empty() {
        return Err(invalid());
    }
    let (authority, path) = rest.find('/').map_or((rest, ""), |i| rest.split_at(i));
    let (existing_user, host) = match authority.rsplit_once('@') {
        Some((userinfo, host)) => (userinfo.split(':').next().unwrap_or(""), host),
        None => ("", authority),
    };
    if host.is_empty() {
        return Err(invalid());
    }
    let user = if username.is_empty() {
        existing_user.to_string()
    } else {
        utf8_percent_encode(username, USERINFO).to_string()
    };
    let password = utf8_percent_encode(password, USERINFO).to_string();
    let public = if user.is_empty() {
        format!("{scheme}://{host}{path}")
    } else {
        format!("{scheme}://{user}@{host}{path}")
    };
    Ok(AuthenticatedUrl {
        with_password: format!("{scheme}://{user}:{password}@{host}{path}"),
        public,
    })
}

/// `GIT_SSH_COMMAND` value for key-based access.
fn git_ssh_command(options: &Options) -> String {
    let mut argv = vec![
        "ssh".to_string(),
        "-i".to_string(),
        IDENTITY_KEY_PATH.to_string(),
    ];
    argv.extend(options.ssh_options());
    shell::join(&argv)
}

// ── HTTP basic credentials ────────────────────────────────────────────────────

/// Username and password used for HTTP push/pull.
#[derive(Debug, Clone, PartialEq, Eq)]
struct HttpAuth {
    username: String,
    password: SecretRef,
}

impl HttpAuth {
    /// `git -c http.extraHeader=...` arguments carrying basic auth for one
    /// invocation only; nothing is written to the repository config.
    fn git_args<R: Runtime>(&self, runtime: &R) -> Result<Vec<String>> {
        let password = runtime.resolve(&self.password)?;
        let token = BASE64.encode(format!("{}:{}", self.username, password.expose()));
        Ok(vec![
            "-c".to_string(),
            format!("http.extraHeader=Authorization: Basic {token}"),
        ])
    }
}

// ── PrivateGit ────────────────────────────────────────────────────────────────

/// Private-git module handle.
pub struct PrivateGit<'r, R> {
    runtime: &'r R,
    options: Options,
    environment: Environment,
}

impl<'r, R: Runtime> PrivateGit<'r, R> {
    /// Module handle. `base` defaults to [`Self::base_environment`].
    pub fn new(runtime: &'r R, options: Options, base: Option<Environment>) -> Self {
        let environment = base.unwrap_or_else(|| Self::base_environment(&options));
        Self {
            runtime,
            options,
            environment,
        }
    }

    /// Base environment: git installed, working directory at [`WORK_DIR`],
    /// and `push.autoSetupRemote` enabled so first pushes of new branches
    /// need no upstream. Mounted checkouts are owned by the container user,
    /// so every directory is marked safe.
    #[must_use]
    pub fn base_environment(options: &Options) -> Environment {
        Environment::from_image(&options.image)
            .with_workdir(WORK_DIR)
            .with_packages(&["git", "openssh-client", "ca-certificates"])
            .with_cache_buster()
            .with_exec([
                "git",
                "config",
                "--global",
                "--add",
                "--bool",
                "push.autoSetupRemote",
                "true",
            ])
            .with_exec(["git", "config", "--global", "--add", "safe.directory", "*"])
    }

    #[must_use]
    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    /// Binds an existing repository checkout.
    #[must_use]
    pub fn repo(&self, directory: DirectoryArtifact) -> Repo<'r, R> {
        Repo::new(self.runtime, self.environment.clone(), directory, None)
    }

    /// Uses an SSH private key for repository access.
    ///
    /// # Errors
    ///
    /// Returns `CredentialError` if the key cannot be resolved or is not a
    /// PEM-armored private key.
    pub fn with_ssh_key(&self, key: &SecretRef) -> Result<GitSsh<'r, R>> {
        {
            let material = self.runtime.resolve(key)?;
            validate_private_key(key, &material)?;
        }
        tracing::debug!(secret = %key.describe(), "bound git ssh key");
        Ok(GitSsh {
            runtime: self.runtime,
            environment: self
                .environment
                .with_private_key(IDENTITY_KEY_PATH, key.clone())
                .with_env_var("GIT_SSH_COMMAND", git_ssh_command(&self.options)),
        })
    }

    /// Uses a username and password for HTTP(S) repository access.
    ///
    /// # Errors
    ///
    /// Returns `CredentialError::EmptyUsername` when `username` is empty;
    /// the same user authenticates clone, push and pull.
    pub fn with_user_password(
        &self,
        username: &str,
        password: SecretRef,
    ) -> Result<GitHttp<'r, R>, CredentialError> {
        if username.is_empty() {
            return Err(CredentialError::EmptyUsername);
        }
        Ok(GitHttp {
            runtime: self.runtime,
            environment: self.environment.clone(),
            auth: HttpAuth {
                username: username.to_string(),
                password,
            },
        })
    }
}

// ── GitSsh / GitHttp ──────────────────────────────────────────────────────────

/// Private git with SSH key access.
pub struct GitSsh<'r, R> {
    runtime: &'r R,
    environment: Environment,
}

impl<'r, R: Runtime> GitSsh<'r, R> {
    /// Sets the SSH URL of the repository (`git@host:owner/repo.git`).
    #[must_use]
    pub fn with_repo_url(&self, ssh_url: &str) -> RepoUrl<'r, R> {
        RepoUrl {
            runtime: self.runtime,
            environment: self.environment.clone(),
            url: ssh_url.to_string(),
            public_url: ssh_url.to_string(),
            http: None,
        }
    }

    #[must_use]
    pub fn repo(&self, directory: DirectoryArtifact) -> Repo<'r, R> {
        Repo::new(self.runtime, self.environment.clone(), directory, None)
    }

    #[must_use]
    pub fn environment(&self) -> &Environment {
        &self.environment
    }
}

/// Private git with username/password access.
pub struct GitHttp<'r, R> {
    runtime: &'r R,
    environment: Environment,
    auth: HttpAuth,
}

impl<'r, R: Runtime> GitHttp<'r, R> {
    /// Sets the web URL of the repository. The password is resolved here
    /// and embedded in the clone URL.
    ///
    /// # Errors
    ///
    /// Returns `CredentialError` if the password cannot be resolved and
    /// `RepositoryError::InvalidUrl` if the URL has no scheme or host.
    pub fn with_repo_url(&self, web_url: &str) -> Result<RepoUrl<'r, R>> {
        let password = self.runtime.resolve(&self.auth.password)?;
        let url = embed_credentials(web_url, &self.auth.username, password.expose())?;
        Ok(RepoUrl {
            runtime: self.runtime,
            environment: self.environment.clone(),
            url: url.with_password,
            public_url: url.public,
            http: Some(self.auth.clone()),
        })
    }

    #[must_use]
    pub fn repo(&self, directory: DirectoryArtifact) -> Repo<'r, R> {
        Repo::new(
            self.runtime,
            self.environment.clone(),
            directory,
            Some(self.auth.clone()),
        )
    }
}

// ── RepoUrl ───────────────────────────────────────────────────────────────────

/// Private git with the target repository URL set.
pub struct RepoUrl<'r, R> {
    runtime: &'r R,
    environment: Environment,
    url: String,
    public_url: String,
    http: Option<HttpAuth>,
}

impl<'r, R: Runtime> RepoUrl<'r, R> {
    /// Repository URL without credentials.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.public_url
    }

    /// Clones the repository into [`WORK_DIR`].
    ///
    /// `origin` is reset to the credential-free URL in the same run, so the
    /// password never reaches `.git/config`.
    ///
    /// # Errors
    ///
    /// Returns `CloneError` if `git clone` exits non-zero.
    #[allow(clippy::should_implement_trait)]
    pub async fn clone(&self) -> Result<Repo<'r, R>> {
        let mut clone = Step::new(["git", "clone", self.url.as_str(), "."]);
        if self.http.is_some() {
            clone = clone.with_sensitive(2);
        }
        let env = self.environment.with_cache_buster().with_step(clone);
        let clone_step = last_step(&env);
        let env = env.with_exec(["git", "remote", "set-url", "origin", self.public_url.as_str()]);
        let reset_step = last_step(&env);

        tracing::info!(url = %self.public_url, "cloning repository");
        let directory = self
            .runtime
            .read_directory(&env, WORK_DIR)
            .await
            .map_err(|e| {
                let e = map_step_failure(e, clone_step, |failed| {
                    CloneError {
                        url: self.public_url.clone(),
                        exit_code: failed.exit_code,
                        stderr: failed.stderr,
                    }
                    .into()
                });
                map_step_failure(e, reset_step, |failed| {
                    RepositoryError::GitFailed {
                        operation: "remote set-url",
                        exit_code: failed.exit_code,
                        stderr: failed.stderr,
                    }
                    .into()
                })
            })?;

        Ok(Repo {
            runtime: self.runtime,
            environment: self.environment.clone(),
            directory,
            origin: Some(self.public_url.clone()),
            http: self.http.clone(),
        })
    }
}

// ── Repo ──────────────────────────────────────────────────────────────────────

/// A checked-out repository plus the environment that operates on it.
pub struct Repo<'r, R> {
    runtime: &'r R,
    environment: Environment,
    directory: DirectoryArtifact,
    origin: Option<String>,
    http: Option<HttpAuth>,
}

impl<R> std::fmt::Debug for Repo<'_, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repo")
            .field("directory", &self.directory)
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}

impl<R> Clone for Repo<'_, R> {
    fn clone(&self) -> Self {
        Self {
            runtime: self.runtime,
            environment: self.environment.clone(),
            directory: self.directory.clone(),
            origin: self.origin.clone(),
            http: self.http.clone(),
        }
    }
}

impl<'r, R: Runtime> Repo<'r, R> {
    fn new(
        runtime: &'r R,
        environment: Environment,
        directory: DirectoryArtifact,
        http: Option<HttpAuth>,
    ) -> Self {
        Self {
            runtime,
            environment,
            directory,
            origin: None,
            http,
        }
    }

    /// Environment with the repository mounted at [`WORK_DIR`].
    #[must_use]
    pub fn environment(&self) -> Environment {
        self.environment.with_directory(WORK_DIR, self.directory.path())
    }

    /// The repository contents.
    #[must_use]
    pub fn directory(&self) -> &DirectoryArtifact {
        &self.directory
    }

    /// Credential-free URL the repository was cloned from, if known.
    #[must_use]
    pub fn origin(&self) -> Option<&str> {
        self.origin.as_deref()
    }

    /// Returns a repo whose environment sets the global git identity.
    #[must_use]
    pub fn set_config(&self, user_name: &str, user_email: &str) -> Self {
        let mut next = self.clone();
        next.environment = self
            .environment
            .with_exec(["git", "config", "--global", "user.name", user_name])
            .with_exec(["git", "config", "--global", "user.email", user_email]);
        next
    }

    fn git_step(&self, operation: &str) -> Result<Step> {
        let mut argv = vec!["git".to_string()];
        let mut sensitive = None;
        if let Some(auth) = &self.http {
            let args = auth.git_args(self.runtime)?;
            sensitive = Some(argv.len() + args.len() - 1);
            argv.extend(args);
        }
        argv.push(operation.to_string());
        let step = Step::new(argv);
        Ok(match sensitive {
            Some(i) => step.with_sensitive(i),
            None => step,
        })
    }

    fn git_failure(operation: &'static str, err: anyhow::Error, step: usize) -> anyhow::Error {
        map_step_failure(err, step, |failed| {
            RepositoryError::GitFailed {
                operation,
                exit_code: failed.exit_code,
                stderr: failed.stderr,
            }
            .into()
        })
    }

    /// Pushes the repository.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::GitFailed` if `git push` exits non-zero.
    pub async fn push(&self) -> Result<Completed> {
        let env = self
            .environment()
            .with_cache_buster()
            .with_step(self.git_step("push")?);
        let step = last_step(&env);
        tracing::info!(origin = ?self.origin, "pushing repository");
        let report = self
            .runtime
            .run(&env)
            .await
            .map_err(|e| Self::git_failure("push", e, step))?;
        Ok(Completed {
            environment: env,
            output: report.steps.into_iter().last().unwrap_or_default(),
        })
    }

    /// Pulls the repository and returns the updated working copy.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::GitFailed` if `git pull` exits non-zero.
    pub async fn pull(&self) -> Result<DirectoryArtifact> {
        let env = self
            .environment()
            .with_cache_buster()
            .with_step(self.git_step("pull")?);
        let step = last_step(&env);
        tracing::info!(origin = ?self.origin, "pulling repository");
        self.runtime
            .read_directory(&env, WORK_DIR)
            .await
            .map_err(|e| Self::git_failure("pull", e, step))
    }
}

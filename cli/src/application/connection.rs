//! Staged connection builder shared by the SSH and SCP modules.
//!
//! The stages are distinct types, so an operation can only be reached
//! through a successful credential binding:
//!
//! ```text
//! Remote ──config()──▶ Configured ──with_password() / with_identity_file()──▶ Authenticated
//! ```
//!
//! Every transition borrows the previous stage and returns a new value. A
//! `Configured` can therefore be reused to derive several `Authenticated`
//! connections, each with its own environment recipe.

use std::fmt;
use std::marker::PhantomData;

use anyhow::Result;

use crate::application::ports::{Runtime, StepOutput};
use crate::domain::config::FerryConfig;
use crate::domain::secret::validate_private_key;
use crate::domain::{
    Destination, Environment, HostKeyPolicy, SecretRef, SshLogLevel, Step, StepFailed, shell,
};

/// Where identity keys are mounted inside the sandbox.
pub const IDENTITY_KEY_PATH: &str = "/identity_key";

/// Packages every SSH/SCP base environment installs.
pub const CLIENT_PACKAGES: &[&str] = &["openssh-client", "sshpass"];

// ── Protocols ─────────────────────────────────────────────────────────────────

mod sealed {
    pub trait Sealed {}
}

/// Client tool a connection drives.
pub trait Protocol: sealed::Sealed {
    /// Executable name.
    const TOOL: &'static str;
    /// Flag that sets the port (`ssh -p`, `scp -P`).
    const PORT_FLAG: &'static str;
}

/// Marker for `ssh`.
pub struct SshProtocol;
/// Marker for `scp`.
pub struct ScpProtocol;

impl sealed::Sealed for SshProtocol {}
impl sealed::Sealed for ScpProtocol {}

impl Protocol for SshProtocol {
    const TOOL: &'static str = "ssh";
    const PORT_FLAG: &'static str = "-p";
}

impl Protocol for ScpProtocol {
    const TOOL: &'static str = "scp";
    const PORT_FLAG: &'static str = "-P";
}

// ── Options ───────────────────────────────────────────────────────────────────

/// Settings shared by every stage of a module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Base image for the default environment.
    pub image: String,
    pub host_key_policy: HostKeyPolicy,
    pub log_level: SshLogLevel,
}

impl Default for Options {
    fn default() -> Self {
        Self::from_config(&FerryConfig::default())
    }
}

impl Options {
    #[must_use]
    pub fn from_config(config: &FerryConfig) -> Self {
        Self {
            image: config.environment.image.clone(),
            host_key_policy: config.ssh.host_key_policy,
            log_level: config.ssh.log_level,
        }
    }

    /// `-o` options appended to every `ssh`/`scp` invocation.
    #[must_use]
    pub fn ssh_options(&self) -> Vec<String> {
        vec![
            "-o".to_string(),
            format!("StrictHostKeyChecking={}", self.host_key_policy.ssh_option()),
            "-o".to_string(),
            format!("LogLevel={}", self.log_level.as_str()),
        ]
    }
}

// ── Credential & command template ─────────────────────────────────────────────

/// Credential bound to a connection. Exactly one per `Authenticated`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    Password(SecretRef),
    IdentityKey(SecretRef),
}

/// Client invocation up to (and including) the port, plus the destination.
///
/// For `ssh`: `[sshpass -p <pw>] ssh [-i <key>] -o ... -p <port> <host>`.
/// For `scp` the host is attached to the remote operand instead.
#[derive(Clone, PartialEq, Eq)]
pub struct CommandTemplate {
    prefix: Vec<String>,
    sensitive: Vec<usize>,
    destination: Destination,
}

impl CommandTemplate {
    fn new<P: Protocol>(
        auth: Vec<String>,
        sensitive: Vec<usize>,
        options: &Options,
        destination: &Destination,
    ) -> Self {
        let mut prefix = auth;
        prefix.extend(options.ssh_options());
        prefix.push(P::PORT_FLAG.to_string());
        prefix.push(destination.port().to_string());
        Self {
            prefix,
            sensitive,
            destination: destination.clone(),
        }
    }

    fn password<P: Protocol>(
        password: &str,
        options: &Options,
        destination: &Destination,
    ) -> Self {
        let auth = vec![
            "sshpass".to_string(),
            "-p".to_string(),
            password.to_string(),
            P::TOOL.to_string(),
        ];
        Self::new::<P>(auth, vec![2], options, destination)
    }

    fn identity<P: Protocol>(key_path: &str, options: &Options, destination: &Destination) -> Self {
        let auth = vec![P::TOOL.to_string(), "-i".to_string(), key_path.to_string()];
        Self::new::<P>(auth, Vec::new(), options, destination)
    }

    /// Builds a step from the template prefix followed by `args`.
    pub fn step<S: Into<String>>(&self, args: impl IntoIterator<Item = S>) -> Step {
        let argv = self
            .prefix
            .iter()
            .cloned()
            .chain(args.into_iter().map(Into::into));
        self.sensitive
            .iter()
            .fold(Step::new(argv), |step, i| step.with_sensitive(*i))
    }

    #[must_use]
    pub fn destination(&self) -> &Destination {
        &self.destination
    }

    /// Full address: prefix followed by the destination host.
    #[must_use]
    pub fn argv(&self) -> Vec<String> {
        let mut argv = self.prefix.clone();
        argv.push(self.destination.host().to_string());
        argv
    }

    /// Shell-quoted address, credentials included.
    #[must_use]
    pub fn render(&self) -> String {
        shell::join(&self.argv())
    }

    /// Shell-quoted address with credentials masked, for logs.
    #[must_use]
    pub fn redacted(&self) -> String {
        let argv = self.argv();
        let masked: Vec<String> = argv
            .iter()
            .enumerate()
            .map(|(i, a)| {
                if self.sensitive.contains(&i) {
                    "***".to_string()
                } else {
                    a.clone()
                }
            })
            .collect();
        shell::join(&masked)
    }
}

impl fmt::Debug for CommandTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CommandTemplate").field(&self.redacted()).finish()
    }
}

// ── Stage 1: module handle ────────────────────────────────────────────────────

/// Unconfigured module handle for protocol `P`.
pub struct Remote<'r, R, P> {
    runtime: &'r R,
    options: Options,
    _protocol: PhantomData<P>,
}

impl<R, P> Clone for Remote<'_, R, P> {
    fn clone(&self) -> Self {
        Self {
            runtime: self.runtime,
            options: self.options.clone(),
            _protocol: PhantomData,
        }
    }
}

impl<'r, R: Runtime, P: Protocol> Remote<'r, R, P> {
    /// Module handle with default options.
    pub fn new(runtime: &'r R) -> Self {
        Self::with_options(runtime, Options::default())
    }

    pub fn with_options(runtime: &'r R, options: Options) -> Self {
        Self {
            runtime,
            options,
            _protocol: PhantomData,
        }
    }

    #[must_use]
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Base environment with the SSH client tools installed.
    ///
    /// Callers that need to reach a network service from the sandbox bind it
    /// onto this environment and pass the result to [`Self::config`].
    #[must_use]
    pub fn base_environment(&self) -> Environment {
        Environment::from_image(&self.options.image).with_packages(CLIENT_PACKAGES)
    }

    /// Sets the destination. `base` defaults to [`Self::base_environment`].
    #[must_use]
    pub fn config(&self, destination: Destination, base: Option<Environment>) -> Configured<'r, R, P> {
        Configured {
            runtime: self.runtime,
            options: self.options.clone(),
            environment: base.unwrap_or_else(|| self.base_environment()),
            destination,
            _protocol: PhantomData,
        }
    }
}

// ── Stage 2: destination set ──────────────────────────────────────────────────

/// Destination and environment chosen; awaiting a credential.
pub struct Configured<'r, R, P> {
    runtime: &'r R,
    options: Options,
    destination: Destination,
    environment: Environment,
    _protocol: PhantomData<P>,
}

impl<R, P> Clone for Configured<'_, R, P> {
    fn clone(&self) -> Self {
        Self {
            runtime: self.runtime,
            options: self.options.clone(),
            destination: self.destination.clone(),
            environment: self.environment.clone(),
            _protocol: PhantomData,
        }
    }
}

impl<'r, R: Runtime, P: Protocol> Configured<'r, R, P> {
    #[must_use]
    pub fn destination(&self) -> &Destination {
        &self.destination
    }

    #[must_use]
    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    /// Binds a password.
    ///
    /// The secret is resolved now and placed on the `sshpass` command line,
    /// where the environment provider can observe it. Prefer
    /// [`Self::with_identity_file`] when that matters.
    ///
    /// # Errors
    ///
    /// Returns `CredentialError` if the secret cannot be resolved.
    pub fn with_password(&self, secret: &SecretRef) -> Result<Authenticated<'r, R, P>> {
        let password = self.runtime.resolve(secret)?;
        tracing::debug!(
            destination = %self.destination,
            secret = %secret.describe(),
            tool = P::TOOL,
            "bound password credential"
        );
        let template =
            CommandTemplate::password::<P>(password.expose(), &self.options, &self.destination);
        Ok(Authenticated {
            runtime: self.runtime,
            destination: self.destination.clone(),
            credential: Credential::Password(secret.clone()),
            environment: self.environment.clone(),
            template,
            _protocol: PhantomData,
        })
    }

    /// Binds a private key, mounted at [`IDENTITY_KEY_PATH`] with mode 0600.
    ///
    /// The key is resolved once to check its armor and then dropped; the
    /// provider resolves it again when copying it into the sandbox. Key
    /// contents never appear in a command line.
    ///
    /// # Errors
    ///
    /// Returns `CredentialError` if the key cannot be resolved or is not a
    /// PEM-armored private key.
    pub fn with_identity_file(&self, key: &SecretRef) -> Result<Authenticated<'r, R, P>> {
        {
            let material = self.runtime.resolve(key)?;
            validate_private_key(key, &material)?;
        }
        tracing::debug!(
            destination = %self.destination,
            secret = %key.describe(),
            tool = P::TOOL,
            "bound identity key"
        );
        let template = CommandTemplate::identity::<P>(IDENTITY_KEY_PATH, &self.options, &self.destination);
        Ok(Authenticated {
            runtime: self.runtime,
            destination: self.destination.clone(),
            credential: Credential::IdentityKey(key.clone()),
            environment: self
                .environment
                .with_private_key(IDENTITY_KEY_PATH, key.clone()),
            template,
            _protocol: PhantomData,
        })
    }
}

// ── Stage 3: connection descriptor ────────────────────────────────────────────

/// Fully configured connection. Operations never modify it.
pub struct Authenticated<'r, R, P> {
    runtime: &'r R,
    destination: Destination,
    credential: Credential,
    environment: Environment,
    template: CommandTemplate,
    _protocol: PhantomData<P>,
}

impl<R, P> Clone for Authenticated<'_, R, P> {
    fn clone(&self) -> Self {
        Self {
            runtime: self.runtime,
            destination: self.destination.clone(),
            credential: self.credential.clone(),
            environment: self.environment.clone(),
            template: self.template.clone(),
            _protocol: PhantomData,
        }
    }
}

/// Result of an operation that ran a step: the environment including that
/// step, and what the step printed.
#[derive(Debug, Clone)]
pub struct Completed {
    pub environment: Environment,
    pub output: StepOutput,
}

impl<'r, R: Runtime, P: Protocol> Authenticated<'r, R, P> {
    /// Environment ready to launch the client tool.
    #[must_use]
    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    #[must_use]
    pub fn template(&self) -> &CommandTemplate {
        &self.template
    }

    #[must_use]
    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    #[must_use]
    pub fn destination(&self) -> &Destination {
        &self.destination
    }

    pub(crate) fn runtime(&self) -> &'r R {
        self.runtime
    }

    /// Recipe for a network operation: the connection environment with a
    /// fresh cache-busting marker.
    pub(crate) fn fresh_environment(&self) -> Environment {
        self.environment.with_cache_buster()
    }

    /// Runs `env`, whose last step is the remote operation.
    pub(crate) async fn execute(&self, env: Environment) -> Result<Completed> {
        let step = last_step(&env);
        let report = self
            .runtime
            .run(&env)
            .await
            .map_err(|e| remote_failure::<P>(e, step))?;
        let output = report.steps.into_iter().last().unwrap_or_default();
        Ok(Completed {
            environment: env,
            output,
        })
    }
}

pub(crate) fn last_step(env: &Environment) -> usize {
    env.steps().len().saturating_sub(1)
}

/// Converts a failure of step `step` into a typed error built by `convert`;
/// every other error passes through untouched.
pub(crate) fn map_step_failure(
    err: anyhow::Error,
    step: usize,
    convert: impl FnOnce(StepFailed) -> anyhow::Error,
) -> anyhow::Error {
    match err.downcast::<StepFailed>() {
        Ok(failed) if failed.step == step => convert(failed),
        Ok(failed) => failed.into(),
        Err(other) => other,
    }
}

pub(crate) fn remote_failure<P: Protocol>(err: anyhow::Error, step: usize) -> anyhow::Error {
    map_step_failure(err, step, |failed| {
        tracing::debug!(tool = P::TOOL, exit_code = failed.exit_code, "remote operation failed");
        crate::domain::RemoteExecutionError {
            program: P::TOOL.to_string(),
            exit_code: failed.exit_code,
            stderr: failed.stderr,
        }
        .into()
    })
}

//! Application context: unified state passed to every command handler.
//!
//! `AppContext` loads the configuration once, applies per-run flag
//! overrides and builds the environment runtime the modules run on.

use std::time::Duration;

use anyhow::Result;

use crate::application::connection::Options;
use crate::application::ports::ConfigStore;
use crate::domain::config::FerryConfig;
use crate::domain::{Environment, HostKeyPolicy, ServiceBinding};
use crate::infra::{
    CachingProvider, DockerProvider, EnvSecretStore, TokioCommandRunner, YamlConfigStore,
};
use crate::output::{OutputContext, TerminalReporter};

/// Runtime used by the binary: the engine adapter behind a result cache.
pub type AppRuntime = CachingProvider<DockerProvider<TokioCommandRunner, EnvSecretStore>>;

/// Output rendering mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable terminal output (default).
    Human,
    /// Machine-readable JSON output.
    Json,
}

/// Output rendering flags.
pub struct OutputFlags {
    /// Disable ANSI color output.
    pub no_color: bool,
    /// Suppress non-error output.
    pub quiet: bool,
    /// Enable JSON output mode.
    pub json: bool,
}

/// Per-run overrides of configuration values.
#[derive(Default)]
pub struct Overrides {
    pub image: Option<String>,
    pub engine: Option<String>,
    pub host_key_policy: Option<HostKeyPolicy>,
    /// Network services bound into every environment.
    pub services: Vec<ServiceBinding>,
}

/// Flags passed from the top-level CLI to `AppContext::new`.
pub struct AppFlags {
    pub output: OutputFlags,
    pub overrides: Overrides,
}

/// Unified application context passed to every command handler.
pub struct AppContext {
    /// Terminal output context (colors, quiet mode).
    pub output: OutputContext,
    /// Output rendering mode (human vs JSON).
    pub mode: OutputMode,
    pub config_store: YamlConfigStore,
    /// Effective configuration: the stored file with overrides applied.
    pub config: FerryConfig,
    services: Vec<ServiceBinding>,
}

impl AppContext {
    /// Construct an `AppContext` from top-level CLI flags.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but cannot be read.
    pub fn new(flags: AppFlags) -> Result<Self> {
        let config_store = YamlConfigStore::default();
        let mut config = config_store.load()?;
        let Overrides {
            image,
            engine,
            host_key_policy,
            services,
        } = flags.overrides;
        if let Some(image) = image {
            config.environment.image = image;
        }
        if let Some(engine) = engine {
            config.environment.engine = engine;
        }
        if let Some(policy) = host_key_policy {
            config.ssh.host_key_policy = policy;
        }

        let mode = if flags.output.json {
            OutputMode::Json
        } else {
            OutputMode::Human
        };

        Ok(Self {
            output: OutputContext::new(flags.output.no_color, flags.output.quiet),
            mode,
            config_store,
            config,
            services,
        })
    }

    /// Returns `true` when JSON output mode is active.
    #[must_use]
    pub fn is_json(&self) -> bool {
        self.mode == OutputMode::Json
    }

    /// Module options derived from the effective configuration.
    #[must_use]
    pub fn options(&self) -> Options {
        Options::from_config(&self.config)
    }

    /// Engine-backed runtime configured from the effective configuration.
    #[must_use]
    pub fn runtime(&self) -> AppRuntime {
        let step_secs = self.config.timeouts.step_secs;
        CachingProvider::new(DockerProvider::new(
            TokioCommandRunner::default(),
            EnvSecretStore::default(),
            self.config.environment.engine.clone(),
            (step_secs > 0).then(|| Duration::from_secs(step_secs)),
        ))
    }

    /// Binds the `--service` flags onto `env`.
    #[must_use]
    pub fn bind_services(&self, env: &Environment) -> Environment {
        self.services.iter().fold(env.clone(), |env, s| {
            env.with_service_binding(&s.alias, &s.address)
        })
    }

    /// Progress reporter writing to the terminal.
    #[must_use]
    pub fn reporter(&self) -> TerminalReporter<'_> {
        TerminalReporter::new(&self.output)
    }
}

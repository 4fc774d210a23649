//! Immutable execution-environment recipe.
//!
//! An [`Environment`] describes a sandbox: base image, working directory,
//! environment variables, mounts, bound network services and the ordered
//! commands to run. Every `with_*` method returns a new recipe and leaves the
//! receiver untouched, so a value can be shared between branches of a
//! pipeline. Nothing runs until an `EnvironmentProvider` realizes it.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;

use crate::domain::cache::{CACHE_BUSTER_VAR, fresh_marker};
use crate::domain::secret::{SecretRef, sha256_hex};

/// Permission bits applied to mounted secrets.
pub const SECRET_MODE: u32 = 0o600;

/// Something copied into the sandbox before any step runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Mount {
    /// Secret resolved by the provider and written with `mode`.
    Secret {
        path: String,
        secret: SecretRef,
        mode: u32,
        /// Normalize private-key line endings before writing.
        private_key: bool,
    },
    /// Host file.
    File {
        path: String,
        source: PathBuf,
        mode: Option<u32>,
    },
    /// Host directory, copied recursively.
    Directory { path: String, source: PathBuf },
}

impl Mount {
    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            Self::Secret { path, .. } | Self::File { path, .. } | Self::Directory { path, .. } => {
                path
            }
        }
    }
}

/// A network service reachable from inside the sandbox under `alias`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceBinding {
    pub alias: String,
    pub address: String,
}

/// One command run inside the sandbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Step {
    argv: Vec<String>,
    /// Indices of `argv` entries that carry credentials.
    sensitive: Vec<usize>,
}

impl Step {
    pub fn new<S: Into<String>>(argv: impl IntoIterator<Item = S>) -> Self {
        Self {
            argv: argv.into_iter().map(Into::into).collect(),
            sensitive: Vec::new(),
        }
    }

    /// Marks argument `index` as sensitive.
    #[must_use]
    pub fn with_sensitive(mut self, index: usize) -> Self {
        if index < self.argv.len() && !self.sensitive.contains(&index) {
            self.sensitive.push(index);
        }
        self
    }

    #[must_use]
    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    #[must_use]
    pub fn program(&self) -> &str {
        self.argv.first().map_or("", String::as_str)
    }

    /// Argument vector with sensitive entries replaced by `***`.
    #[must_use]
    pub fn redacted(&self) -> Vec<String> {
        self.argv
            .iter()
            .enumerate()
            .map(|(i, a)| {
                if self.sensitive.contains(&i) {
                    "***".to_string()
                } else {
                    a.clone()
                }
            })
            .collect()
    }
}

/// Immutable sandbox recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Environment {
    image: String,
    workdir: Option<String>,
    env: BTreeMap<String, String>,
    mounts: Vec<Mount>,
    services: Vec<ServiceBinding>,
    network: Option<String>,
    steps: Vec<Step>,
}

impl Environment {
    /// Starts a recipe from a base image reference.
    pub fn from_image(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            workdir: None,
            env: BTreeMap::new(),
            mounts: Vec::new(),
            services: Vec::new(),
            network: None,
            steps: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_workdir(&self, path: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.workdir = Some(path.into());
        next
    }

    /// Installs distribution packages with apt.
    #[must_use]
    pub fn with_packages(&self, packages: &[&str]) -> Self {
        let mut install = vec!["apt-get", "install", "-y", "--no-install-recommends"];
        install.extend_from_slice(packages);
        self.with_env_var("DEBIAN_FRONTEND", "noninteractive")
            .with_exec(["apt-get", "update"])
            .with_exec(install)
    }

    #[must_use]
    pub fn with_env_var(&self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.env.insert(key.into(), value.into());
        next
    }

    /// Sets [`CACHE_BUSTER_VAR`] to a value never produced before.
    #[must_use]
    pub fn with_cache_buster(&self) -> Self {
        self.with_env_var(CACHE_BUSTER_VAR, fresh_marker())
    }

    #[must_use]
    pub fn with_mounted_secret(&self, path: impl Into<String>, secret: SecretRef) -> Self {
        self.with_mount(Mount::Secret {
            path: path.into(),
            secret,
            mode: SECRET_MODE,
            private_key: false,
        })
    }

    /// Mounts an SSH private key; the provider normalizes its line endings
    /// and verifies the bytes that land in the sandbox.
    #[must_use]
    pub fn with_private_key(&self, path: impl Into<String>, secret: SecretRef) -> Self {
        self.with_mount(Mount::Secret {
            path: path.into(),
            secret,
            mode: SECRET_MODE,
            private_key: true,
        })
    }

    #[must_use]
    pub fn with_file(
        &self,
        path: impl Into<String>,
        source: impl Into<PathBuf>,
        mode: Option<u32>,
    ) -> Self {
        self.with_mount(Mount::File {
            path: path.into(),
            source: source.into(),
            mode,
        })
    }

    #[must_use]
    pub fn with_directory(&self, path: impl Into<String>, source: impl Into<PathBuf>) -> Self {
        self.with_mount(Mount::Directory {
            path: path.into(),
            source: source.into(),
        })
    }

    /// Later mounts at the same path replace earlier ones.
    fn with_mount(&self, mount: Mount) -> Self {
        let mut next = self.clone();
        next.mounts.retain(|m| m.path() != mount.path());
        next.mounts.push(mount);
        next
    }

    #[must_use]
    pub fn with_service_binding(
        &self,
        alias: impl Into<String>,
        address: impl Into<String>,
    ) -> Self {
        let mut next = self.clone();
        let alias = alias.into();
        next.services.retain(|s| s.alias != alias);
        next.services.push(ServiceBinding {
            alias,
            address: address.into(),
        });
        next
    }

    #[must_use]
    pub fn with_network(&self, name: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.network = Some(name.into());
        next
    }

    #[must_use]
    pub fn with_exec<S: Into<String>>(&self, argv: impl IntoIterator<Item = S>) -> Self {
        self.with_step(Step::new(argv))
    }

    #[must_use]
    pub fn with_step(&self, step: Step) -> Self {
        let mut next = self.clone();
        next.steps.push(step);
        next
    }

    // ── Accessors ────────────────────────────────────────────────────────────

    #[must_use]
    pub fn image(&self) -> &str {
        &self.image
    }

    #[must_use]
    pub fn workdir(&self) -> Option<&str> {
        self.workdir.as_deref()
    }

    #[must_use]
    pub fn env_vars(&self) -> &BTreeMap<String, String> {
        &self.env
    }

    #[must_use]
    pub fn env_var(&self, key: &str) -> Option<&str> {
        self.env.get(key).map(String::as_str)
    }

    #[must_use]
    pub fn mounts(&self) -> &[Mount] {
        &self.mounts
    }

    #[must_use]
    pub fn services(&self) -> &[ServiceBinding] {
        &self.services
    }

    #[must_use]
    pub fn network(&self) -> Option<&str> {
        self.network.as_deref()
    }

    #[must_use]
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Resolves `path` against the working directory (or `/`).
    #[must_use]
    pub fn resolve(&self, path: &str) -> String {
        if path.starts_with('/') {
            return path.to_string();
        }
        let base = self.workdir.as_deref().unwrap_or("/");
        let rel = path.strip_prefix("./").unwrap_or(path);
        if rel.is_empty() || rel == "." {
            return base.to_string();
        }
        format!("{}/{rel}", base.trim_end_matches('/'))
    }

    /// Content address of the recipe: SHA-256 over its canonical JSON form.
    /// Inline secrets contribute only their digest.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        let encoded = serde_json::to_vec(self).unwrap_or_default();
        sha256_hex(&encoded)
    }
}

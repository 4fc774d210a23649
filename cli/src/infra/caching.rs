//! Content-addressed memoization of realized environments.
//!
//! Two recipes with the same fingerprint produce the same result, so
//! `CachingProvider` replays stored results instead of running the sandbox
//! again. Recipes carrying a fresh `CACHE_BUSTER` marker never repeat a
//! fingerprint and therefore always run.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use anyhow::Result;

use crate::application::ports::{EnvironmentProvider, RunReport, SecretStore};
use crate::domain::cache::CACHE_BUSTER_VAR;
use crate::domain::{
    CredentialError, DirectoryArtifact, Environment, FileArtifact, Plaintext, SecretRef,
};

#[derive(Default)]
struct Memo {
    runs: HashMap<String, RunReport>,
    files: HashMap<(String, String), FileArtifact>,
    directories: HashMap<(String, String), DirectoryArtifact>,
}

/// Provider decorator that memoizes successful results by fingerprint.
/// Failures are never cached.
pub struct CachingProvider<P> {
    inner: P,
    memo: Mutex<Memo>,
}

impl<P> CachingProvider<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            memo: Mutex::new(Memo::default()),
        }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    fn with_memo<T>(&self, f: impl FnOnce(&mut Memo) -> T) -> T {
        let mut memo = self.memo.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut memo)
    }
}

fn log_miss(env: &Environment, fingerprint: &str) {
    if env.env_var(CACHE_BUSTER_VAR).is_some() {
        tracing::debug!(%fingerprint, "cache bypassed by marker");
    } else {
        tracing::debug!(%fingerprint, "cache miss");
    }
}

impl<P: EnvironmentProvider> EnvironmentProvider for CachingProvider<P> {
    async fn run(&self, env: &Environment) -> Result<RunReport> {
        let key = env.fingerprint();
        if let Some(hit) = self.with_memo(|m| m.runs.get(&key).cloned()) {
            tracing::debug!(fingerprint = %key, "cache hit");
            return Ok(hit);
        }
        log_miss(env, &key);
        let report = self.inner.run(env).await?;
        self.with_memo(|m| m.runs.insert(key, report.clone()));
        Ok(report)
    }

    async fn read_file(&self, env: &Environment, path: &str) -> Result<FileArtifact> {
        let key = (env.fingerprint(), path.to_string());
        if let Some(hit) = self.with_memo(|m| m.files.get(&key).cloned()) {
            tracing::debug!(fingerprint = %key.0, path, "cache hit");
            return Ok(hit);
        }
        log_miss(env, &key.0);
        let file = self.inner.read_file(env, path).await?;
        self.with_memo(|m| m.files.insert(key, file.clone()));
        Ok(file)
    }

    async fn read_directory(&self, env: &Environment, path: &str) -> Result<DirectoryArtifact> {
        let key = (env.fingerprint(), path.to_string());
        if let Some(hit) = self.with_memo(|m| m.directories.get(&key).cloned()) {
            tracing::debug!(fingerprint = %key.0, path, "cache hit");
            return Ok(hit);
        }
        log_miss(env, &key.0);
        let dir = self.inner.read_directory(env, path).await?;
        self.with_memo(|m| m.directories.insert(key, dir.clone()));
        Ok(dir)
    }
}

impl<P: SecretStore> SecretStore for CachingProvider<P> {
    fn resolve(&self, secret: &SecretRef) -> Result<Plaintext, CredentialError> {
        self.inner.resolve(secret)
    }
}

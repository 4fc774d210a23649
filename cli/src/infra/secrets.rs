//! Infrastructure implementation of the `SecretStore` port.

use std::sync::Arc;

use crate::application::ports::SecretStore;
use crate::domain::{CredentialError, Plaintext, SecretRef};

type Lookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Resolves secrets from process environment variables and host files.
///
/// The variable lookup is injectable so tests never touch the real
/// process environment.
#[derive(Clone)]
pub struct EnvSecretStore {
    lookup: Lookup,
}

impl Default for EnvSecretStore {
    fn default() -> Self {
        Self::with_lookup(|name| std::env::var(name).ok())
    }
}

impl EnvSecretStore {
    pub fn with_lookup(lookup: impl Fn(&str) -> Option<String> + Send + Sync + 'static) -> Self {
        Self {
            lookup: Arc::new(lookup),
        }
    }
}

/// Drops the single line ending editors and `echo` leave after a secret.
fn strip_line_ending(mut value: String) -> String {
    if value.ends_with('\n') {
        value.pop();
        if value.ends_with('\r') {
            value.pop();
        }
    }
    value
}

impl SecretStore for EnvSecretStore {
    fn resolve(&self, secret: &SecretRef) -> Result<Plaintext, CredentialError> {
        let unresolvable = |reason: String| CredentialError::Unresolvable {
            reference: secret.describe(),
            reason,
        };
        let value = match secret {
            SecretRef::Env { name } => Plaintext::new(
                (self.lookup)(name).ok_or_else(|| unresolvable("variable is not set".to_string()))?,
            ),
            SecretRef::File { path } => Plaintext::new(strip_line_ending(
                std::fs::read_to_string(path).map_err(|e| unresolvable(e.to_string()))?,
            )),
            SecretRef::Inline { value, .. } => value.clone(),
        };
        if value.is_empty() {
            return Err(unresolvable("value is empty".to_string()));
        }
        Ok(value)
    }
}

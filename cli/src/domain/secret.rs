//! Secret references and credential material.
//!
//! A [`SecretRef`] is an opaque handle; it only becomes [`Plaintext`] when a
//! `SecretStore` resolves it at the point of use.

use std::fmt;
use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::domain::error::CredentialError;

/// Handle to sensitive material (password or private key).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SecretRef {
    /// Value of an environment variable on the host.
    Env { name: String },
    /// Contents of a file on the host.
    File { path: PathBuf },
    /// Literal value handed over by the caller.
    Inline { name: String, value: Plaintext },
}

impl SecretRef {
    pub fn env(name: impl Into<String>) -> Self {
        Self::Env { name: name.into() }
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File { path: path.into() }
    }

    pub fn inline(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Inline {
            name: name.into(),
            value: Plaintext::new(value),
        }
    }

    /// Short, non-sensitive label for error messages and logs.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Env { name } => format!("env:{name}"),
            Self::File { path } => format!("file:{}", path.display()),
            Self::Inline { name, .. } => format!("inline:{name}"),
        }
    }
}

/// Resolved secret value. `Debug` never shows the content and serialization
/// only emits a digest.
#[derive(Clone, PartialEq, Eq)]
pub struct Plaintext(String);

impl Plaintext {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Plaintext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Plaintext(***)")
    }
}

impl Serialize for Plaintext {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("sha256:{}", sha256_hex(self.0.as_bytes())))
    }
}

/// Lowercase hex SHA-256 of `bytes`, matching `sha256sum` output.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest.iter().fold(String::with_capacity(64), |mut acc, b| {
        use fmt::Write as _;
        let _ = write!(acc, "{b:02x}");
        acc
    })
}

// ── Private keys ──────────────────────────────────────────────────────────────

static KEY_BEGIN: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"^-----BEGIN ((RSA|DSA|EC|OPENSSH|ENCRYPTED) )?PRIVATE KEY-----$").unwrap()
});

static KEY_END: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"^-----END ((RSA|DSA|EC|OPENSSH|ENCRYPTED) )?PRIVATE KEY-----$").unwrap()
});

/// Checks that `key` is a PEM-armored private key (traditional or OpenSSH).
///
/// # Errors
///
/// Returns `CredentialError::Malformed` when the armor lines are missing.
pub fn validate_private_key(reference: &SecretRef, key: &Plaintext) -> Result<(), CredentialError> {
    let malformed = |reason: &str| CredentialError::Malformed {
        reference: reference.describe(),
        reason: reason.to_string(),
    };
    let mut lines = key
        .expose()
        .lines()
        .map(|l| l.trim_end_matches('\r').trim())
        .filter(|l| !l.is_empty());
    let first = lines.next().ok_or_else(|| malformed("key is empty"))?;
    if !KEY_BEGIN.is_match(first) {
        return Err(malformed("missing '-----BEGIN ... PRIVATE KEY-----' header"));
    }
    let last = lines.last().ok_or_else(|| malformed("key has no body"))?;
    if !KEY_END.is_match(last) {
        return Err(malformed("missing '-----END ... PRIVATE KEY-----' footer"));
    }
    Ok(())
}

/// Normalizes line endings and guarantees exactly one trailing newline.
///
/// OpenSSH refuses keys whose final armor line is not newline-terminated,
/// and some secret mounts strip it.
#[must_use]
pub fn normalize_private_key(raw: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(raw.len() + 1);
    let mut iter = raw.iter().peekable();
    while let Some(&b) = iter.next() {
        if b == b'\r' && iter.peek() == Some(&&b'\n') {
            continue;
        }
        out.push(b);
    }
    while matches!(out.last(), Some(b'\n' | b'\r' | b' ' | b'\t')) {
        out.pop();
    }
    out.push(b'\n');
    out
}

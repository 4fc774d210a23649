//! File and directory artifacts produced or consumed by operations.
//!
//! Artifacts point at host paths. When a provider materializes one into a
//! scratch directory, the artifact holds a guard that keeps the directory
//! alive for as long as any clone of the artifact exists.

use std::any::Any;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

type Guard = Arc<dyn Any + Send + Sync>;

/// A single file on the host.
#[derive(Clone)]
pub struct FileArtifact {
    path: PathBuf,
    _guard: Option<Guard>,
}

impl FileArtifact {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _guard: None,
        }
    }

    /// Artifact whose backing storage lives as long as `guard`.
    pub fn with_guard(path: impl Into<PathBuf>, guard: Guard) -> Self {
        Self {
            path: path.into(),
            _guard: Some(guard),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Final path component, if it is valid UTF-8.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.path.file_name().and_then(|n| n.to_str())
    }
}

impl fmt::Debug for FileArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileArtifact")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// A directory tree on the host.
#[derive(Clone)]
pub struct DirectoryArtifact {
    path: PathBuf,
    _guard: Option<Guard>,
}

impl DirectoryArtifact {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _guard: None,
        }
    }

    pub fn with_guard(path: impl Into<PathBuf>, guard: Guard) -> Self {
        Self {
            path: path.into(),
            _guard: Some(guard),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl fmt::Debug for DirectoryArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectoryArtifact")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

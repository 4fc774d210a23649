//! Domain layer: pure business logic, types, and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod artifact;
pub mod cache;
pub mod config;
pub mod environment;
pub mod error;
pub mod secret;
pub mod shell;

pub use artifact::{DirectoryArtifact, FileArtifact};
pub use environment::{Environment, Mount, ServiceBinding, Step};
pub use error::{
    CloneError, ConfigError, CredentialError, DestinationError, NameResolutionError,
    RemoteExecutionError, RepositoryError, StepFailed, TimedOut,
};
pub use ferry_common::{Destination, HostKeyPolicy, SshLogLevel};
pub use secret::{Plaintext, SecretRef};

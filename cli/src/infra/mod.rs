//! Infrastructure layer: concrete implementations of application port traits.
//!
//! This module contains all I/O-performing code: process execution, the
//! container engine, secret lookup and configuration persistence.
//!
//! Imports from `crate::domain` and `crate::application::ports` are allowed.
//! Imports from `crate::commands` or `crate::output` are forbidden.

pub mod caching;
pub mod command_runner;
pub mod config;
pub mod docker;
pub mod fs;
pub mod secrets;

pub use caching::CachingProvider;
pub use command_runner::TokioCommandRunner;
pub use config::YamlConfigStore;
pub use docker::DockerProvider;
pub use secrets::EnvSecretStore;

//! Application layer: port trait definitions and use-case orchestration.
//!
//! This module depends only on `crate::domain`: never on `crate::infra`,
//! `crate::commands`, or `crate::output`.

pub mod connection;
pub mod ports;
pub mod services;

pub use connection::{
    Authenticated, CommandTemplate, Completed, Configured, Credential, Options, Protocol, Remote,
    ScpProtocol, SshProtocol,
};
pub use ports::{
    CommandRunner, ConfigStore, EnvironmentProvider, ProgressReporter, RunReport, Runtime,
    SecretStore, StepOutput,
};

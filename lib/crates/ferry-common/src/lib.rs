pub mod config;
pub mod types;

pub use config::{EnvironmentConfig, FerryConfig, SshConfig, TimeoutConfig};
pub use types::*;

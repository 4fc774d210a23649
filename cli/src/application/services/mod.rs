//! Application services: use-case orchestration.
//!
//! Each module builds environment recipes and hands them to the `Runtime`
//! port. Services import only from `crate::domain` and
//! `crate::application`: never from `crate::infra`, `crate::commands`,
//! or `crate::output`.

pub mod config_service;
pub mod git;
pub mod scp;
pub mod ssh;

pub use git::{GitHttp, GitSsh, PrivateGit, Repo, RepoUrl, WORK_DIR};
pub use scp::{Scp, ScpCommander, ScpConfig};
pub use ssh::{Ssh, SshCommander, SshConfig};

//! Ferry: stage SSH, SCP and private-git operations in disposable
//! containers.
//!
//! The library exposes every layer so integration tests and other tools can
//! drive the staged builders against their own `Runtime`.

#![cfg_attr(test, allow(clippy::expect_used))]

pub mod app;
pub mod application;
pub mod cli;
pub mod commands;
pub mod domain;
pub mod infra;
pub mod logging;
pub mod output;

//! Integration tests for ferry CLI
//!
//! These tests spawn the actual binary and test end-to-end behavior. None of
//! them reach a real container engine: cases either fail before a sandbox
//! would be created or run against a stand-in `docker` script.

mod cli_tests;
mod credential_errors;

//! Integration tests for the ferry command tree and argument parsing.

#![allow(clippy::expect_used)]

use assert_cmd::Command;
use predicates::prelude::*;

fn ferry() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("ferry"));
    cmd.env("NO_COLOR", "1");
    cmd
}

// --- Help and version tests ---

#[test]
fn test_cli_no_args_shows_help_and_exits_two() {
    ferry().assert().code(2).stderr(predicate::str::contains(
        "Run SSH, SCP and private-git operations inside disposable containers",
    ));
}

#[test]
fn test_cli_help_lists_modules() {
    ferry()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("ssh"))
        .stdout(predicate::str::contains("scp"))
        .stdout(predicate::str::contains("git"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_version_command_shows_version() {
    ferry()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("ferry 0.1.0"));
}

#[test]
fn test_version_command_json_outputs_valid_json() {
    let output = ferry()
        .args(["version", "--json"])
        .output()
        .expect("run ferry");
    assert!(output.status.success());
    let value: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout is JSON");
    assert_eq!(value["version"], "0.1.0");
}

// --- Argument validation ---

#[test]
fn test_ssh_requires_a_credential() {
    ferry()
        .args(["ssh", "admin@example.com", "command", "ls"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--password-env"));
}

#[test]
fn test_ssh_rejects_two_credentials() {
    ferry()
        .args([
            "ssh",
            "admin@example.com",
            "--password-env",
            "PW",
            "--identity-file",
            "/tmp/key",
            "command",
            "ls",
        ])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("cannot be used with"));
}

#[test]
fn test_ssh_command_requires_text() {
    ferry()
        .args(["ssh", "admin@example.com", "--password-env", "PW", "command"])
        .assert()
        .code(2);
}

#[test]
fn test_scp_help_lists_operations() {
    ferry()
        .args(["scp", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("file-to-remote"))
        .stdout(predicate::str::contains("file-from-remote"))
        .stdout(predicate::str::contains("dir-to-remote"))
        .stdout(predicate::str::contains("dir-from-remote"));
}

#[test]
fn test_git_user_requires_password_source() {
    ferry()
        .args(["git", "--user", "super", "clone", "http://gitea/super/test.git"])
        .assert()
        .code(2);
}

#[test]
fn test_git_requires_some_credential() {
    ferry()
        .args(["git", "clone", "http://gitea/super/test.git"])
        .assert()
        .code(2);
}

#[test]
fn test_engine_flag_rejects_unknown_engine() {
    ferry()
        .args(["--engine", "lxc", "version"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("podman"));
}

#[test]
fn test_service_flag_requires_alias_and_address() {
    ferry()
        .args(["--service", "sshd", "version"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("ALIAS=ADDR"));
}

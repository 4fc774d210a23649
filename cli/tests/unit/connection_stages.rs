//! Staged connection builder: credential binding and environment branching.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use ferry_cli::application::connection::{Credential, IDENTITY_KEY_PATH, Options};
use ferry_cli::application::services::{Scp, Ssh};
use ferry_cli::domain::{
    CredentialError, Destination, Environment, HostKeyPolicy, Mount, SecretRef,
};

use crate::mocks::{FakeRemote, key_ref, password_ref};

fn dest() -> Destination {
    Destination::new("admin@sshd", 8022).unwrap()
}

#[test]
fn base_environment_installs_client_tools() {
    let fake = FakeRemote::default();
    let env = Ssh::new(&fake).base_environment();
    let install = env.steps()[1].argv().join(" ");
    assert!(install.contains("openssh-client"));
    assert!(install.contains("sshpass"));
    assert_eq!(env.image(), "ubuntu:22.04");
}

#[test]
fn config_uses_caller_base_environment() {
    let fake = FakeRemote::default();
    let base = Environment::from_image("alpine:3.20").with_service_binding("sshd", "10.0.0.5");
    let configured = Ssh::new(&fake).config(dest(), Some(base.clone()));
    assert_eq!(configured.environment(), &base);
    assert_eq!(configured.destination().port(), 8022);
}

#[test]
fn unresolvable_password_stops_the_chain() {
    let fake = FakeRemote::default();
    let configured = Ssh::new(&fake).config(dest(), None);
    let err = configured
        .with_password(&SecretRef::env("FERRY_TEST_UNSET"))
        .err()
        .expect("binding must fail");
    assert!(matches!(
        err.downcast_ref::<CredentialError>(),
        Some(CredentialError::Unresolvable { .. })
    ));
    assert!(fake.seen().is_empty(), "no sandbox may run before a credential binds");
}

#[test]
fn malformed_identity_key_is_rejected() {
    let fake = FakeRemote::default();
    let configured = Scp::new(&fake).config(dest(), None);
    let err = configured
        .with_identity_file(&SecretRef::inline("key", "ssh-ed25519 AAAA public-key"))
        .err()
        .expect("binding must fail");
    assert!(matches!(
        err.downcast_ref::<CredentialError>(),
        Some(CredentialError::Malformed { .. })
    ));
}

#[test]
fn identity_key_is_mounted_private_and_never_on_the_command_line() {
    let fake = FakeRemote::default();
    let commander = Ssh::new(&fake)
        .config(dest(), None)
        .with_identity_file(&key_ref())
        .unwrap();
    let mount = commander
        .environment()
        .mounts()
        .iter()
        .find(|m| m.path() == IDENTITY_KEY_PATH)
        .expect("key mount");
    assert!(matches!(mount, Mount::Secret { mode: 0o600, private_key: true, .. }));
    assert!(!commander.template().render().contains("OPENSSH PRIVATE KEY"));
    assert!(matches!(commander.credential(), Credential::IdentityKey(_)));
}

#[test]
fn one_configured_stage_yields_independent_connections() {
    let fake = FakeRemote::default();
    let configured = Ssh::new(&fake).config(dest(), None);
    let by_key = configured.with_identity_file(&key_ref()).unwrap();
    let by_password = configured.with_password(&password_ref()).unwrap();

    assert_eq!(by_key.environment().mounts().len(), 1);
    assert!(by_password.environment().mounts().is_empty());
    assert!(configured.environment().mounts().is_empty());
    assert!(by_password.template().render().starts_with("sshpass -p s3cret ssh"));
    assert!(!by_password.template().redacted().contains("s3cret"));
}

#[test]
fn template_carries_port_and_options() {
    let fake = FakeRemote::default();
    let options = Options {
        host_key_policy: HostKeyPolicy::Strict,
        ..Options::default()
    };
    let commander = Scp::with_options(&fake, options)
        .config(dest(), None)
        .with_identity_file(&key_ref())
        .unwrap();
    assert_eq!(
        commander.template().render(),
        "scp -i /identity_key -o StrictHostKeyChecking=yes -o LogLevel=error -P 8022 admin@sshd"
    );
}

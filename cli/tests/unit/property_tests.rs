//! Property tests for value types and credential handling.

#![allow(clippy::unwrap_used)]

use ferry_cli::application::services::git::embed_credentials;
use ferry_cli::domain::{Destination, Environment, Step, shell};
use proptest::prelude::*;

proptest! {
    #[test]
    fn valid_ports_round_trip(port in 1u32..=65535) {
        let dest = Destination::new("admin@sshd", port).unwrap();
        prop_assert_eq!(u32::from(dest.port()), port);
    }

    #[test]
    fn out_of_range_ports_are_rejected(port in 65536u32..) {
        prop_assert!(Destination::new("admin@sshd", port).is_err());
    }

    #[test]
    fn quoting_is_identity_or_single_quoted(value in ".{0,40}") {
        let quoted = shell::quote(&value);
        prop_assert!(quoted == value || (quoted.starts_with('\'') && quoted.ends_with('\'')));
    }

    #[test]
    fn public_url_never_contains_password(
        user in "[a-z]{1,8}",
        password in "[A-Za-z0-9]{12,20}",
        repo in "[a-z]{1,10}",
    ) {
        let url = format!("https://gitea:3000/{user}/{repo}.git");
        let auth = embed_credentials(&url, &user, &password).unwrap();
        prop_assert!(!auth.public.contains(&password));
        prop_assert!(auth.with_password.contains(&password));
    }

    #[test]
    fn redaction_hides_every_sensitive_entry(secret in "[a-z]{6,12}", index in 0usize..4) {
        let mut argv = vec!["a".to_string(), "b".to_string(), "c".to_string(), "d".to_string()];
        argv[index] = secret.clone();
        let step = Step::new(argv).with_sensitive(index);
        prop_assert!(!step.redacted().contains(&secret));
    }

    #[test]
    fn fingerprint_distinguishes_step_arguments(a in "[a-z]{1,8}", b in "[a-z]{1,8}") {
        prop_assume!(a != b);
        let base = Environment::from_image("ubuntu:22.04");
        prop_assert_ne!(
            base.with_exec(["echo", a.as_str()]).fingerprint(),
            base.with_exec(["echo", b.as_str()]).fingerprint()
        );
    }
}

//! Content-addressed memoization of realized environments.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use ferry_cli::application::ports::EnvironmentProvider;
use ferry_cli::domain::Environment;
use ferry_cli::infra::CachingProvider;

use crate::mocks::FakeRemote;

fn recipe() -> Environment {
    Environment::from_image("ubuntu:22.04").with_exec(["echo", "cached"])
}

#[tokio::test]
async fn identical_recipe_runs_once() {
    let cache = CachingProvider::new(FakeRemote::default());
    let first = cache.run(&recipe()).await.unwrap();
    let second = cache.run(&recipe()).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(cache.inner().seen().len(), 1);
}

#[tokio::test]
async fn cache_buster_forces_a_fresh_run() {
    let cache = CachingProvider::new(FakeRemote::default());
    cache.run(&recipe().with_cache_buster()).await.unwrap();
    cache.run(&recipe().with_cache_buster()).await.unwrap();
    assert_eq!(cache.inner().seen().len(), 2);
}

#[tokio::test]
async fn same_busted_value_is_still_memoized() {
    let cache = CachingProvider::new(FakeRemote::default());
    let busted = recipe().with_cache_buster();
    cache.run(&busted).await.unwrap();
    cache.run(&busted).await.unwrap();
    assert_eq!(cache.inner().seen().len(), 1);
}

#[tokio::test]
async fn failures_are_not_cached() {
    let cache = CachingProvider::new(FakeRemote::default());
    let env = Environment::from_image("ubuntu:22.04")
        .with_exec(["scp", "-i", "/identity_key", "admin@sshd:missing", "/out"]);
    assert!(cache.run(&env).await.is_err());
    assert!(cache.run(&env).await.is_err());
    assert_eq!(cache.inner().seen().len(), 2);
}

#[tokio::test]
async fn artifacts_are_keyed_by_path() {
    let cache = CachingProvider::new(FakeRemote::default());
    let env = Environment::from_image("ubuntu:22.04").with_workdir("/tmp/repo/").with_exec([
        "git",
        "clone",
        "git@gitea:super/test.git",
        ".",
    ]);
    let a = cache.read_directory(&env, "/tmp/repo/").await.unwrap();
    let b = cache.read_directory(&env, "/tmp/repo/").await.unwrap();
    assert_eq!(a.path(), b.path());
    assert_eq!(cache.inner().seen().len(), 1);

    cache.read_file(&env, "README.md").await.unwrap();
    assert_eq!(cache.inner().seen().len(), 2);
}

//! SCP module: uploads and downloads against the fake remote.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::path::Path;

use ferry_cli::application::services::Scp;
use ferry_cli::application::services::scp::{SOURCE_DIR, TARGET_DIR};
use ferry_cli::domain::{
    DirectoryArtifact, Destination, FileArtifact, NameResolutionError, RemoteExecutionError,
};
use tempfile::TempDir;

use crate::mocks::{FakeRemote, key_ref, password_ref};

fn dest() -> Destination {
    Destination::new("admin@sshd", 2222).unwrap()
}

fn local_file(dir: &TempDir, name: &str, content: &str) -> FileArtifact {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    FileArtifact::new(path)
}

fn local_tree(dir: &TempDir) -> DirectoryArtifact {
    let root = dir.path().join("site");
    std::fs::create_dir_all(root.join("css")).unwrap();
    std::fs::write(root.join("index.html"), "<h1>hi</h1>").unwrap();
    std::fs::write(root.join("css").join("main.css"), "body{}").unwrap();
    DirectoryArtifact::new(root)
}

fn read(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap()
}

#[tokio::test]
async fn file_to_remote_defaults_to_login_directory() {
    let fake = FakeRemote::default();
    let dir = TempDir::new().unwrap();
    let commander = Scp::new(&fake)
        .config(dest(), None)
        .with_identity_file(&key_ref())
        .unwrap();
    commander
        .file_to_remote(&local_file(&dir, "a.txt", "alpha"), None)
        .await
        .unwrap();
    assert_eq!(fake.remote("a.txt").as_deref(), Some("alpha"));

    let step = fake.last_seen().steps().last().unwrap().argv().to_vec();
    assert_eq!(step[step.len() - 2], "a.txt");
    assert_eq!(step[step.len() - 1], "admin@sshd:.");
}

#[tokio::test]
async fn file_to_remote_into_existing_directory_keeps_name() {
    let fake = FakeRemote::default();
    fake.put_remote("uploads/.keep", "");
    let dir = TempDir::new().unwrap();
    let commander = Scp::new(&fake)
        .config(dest(), None)
        .with_password(&password_ref())
        .unwrap();
    commander
        .file_to_remote(&local_file(&dir, "b.txt", "beta"), Some("uploads"))
        .await
        .unwrap();
    assert_eq!(fake.remote("uploads/b.txt").as_deref(), Some("beta"));
}

#[tokio::test]
async fn file_without_name_is_a_name_resolution_error() {
    let fake = FakeRemote::default();
    let commander = Scp::new(&fake)
        .config(dest(), None)
        .with_identity_file(&key_ref())
        .unwrap();
    let err = commander
        .file_to_remote(&FileArtifact::new("/"), None)
        .await
        .unwrap_err();
    assert!(err.downcast_ref::<NameResolutionError>().is_some());
    assert!(fake.seen().is_empty());
}

#[tokio::test]
async fn uploaded_file_downloads_byte_for_byte() {
    let fake = FakeRemote::default();
    let dir = TempDir::new().unwrap();
    let commander = Scp::new(&fake)
        .config(dest(), None)
        .with_identity_file(&key_ref())
        .unwrap();
    let content = "line one\nline two\r\n\ttabbed";
    commander
        .file_to_remote(&local_file(&dir, "notes.txt", content), None)
        .await
        .unwrap();
    let back = commander.file_from_remote("notes.txt").await.unwrap();
    assert_eq!(read(back.path()), content);
    assert_eq!(back.name(), Some("notes.txt"));
}

#[tokio::test]
async fn missing_remote_file_is_a_remote_failure() {
    let fake = FakeRemote::default();
    let commander = Scp::new(&fake)
        .config(dest(), None)
        .with_identity_file(&key_ref())
        .unwrap();
    let err = commander.file_from_remote("/etc/nope").await.unwrap_err();
    let remote = err.downcast_ref::<RemoteExecutionError>().unwrap();
    assert_eq!(remote.program, "scp");
    assert_eq!(remote.exit_code, 1);
    assert!(remote.stderr.contains("No such file"));
}

#[tokio::test]
async fn file_from_remote_of_directory_path_fails_before_running() {
    let fake = FakeRemote::default();
    let commander = Scp::new(&fake)
        .config(dest(), None)
        .with_identity_file(&key_ref())
        .unwrap();
    let err = commander.file_from_remote("/var/log/").await.unwrap_err();
    assert!(err.downcast_ref::<NameResolutionError>().is_some());
    assert!(fake.seen().is_empty());
}

#[tokio::test]
async fn directory_to_new_remote_target_copies_contents() {
    let fake = FakeRemote::default();
    let dir = TempDir::new().unwrap();
    let commander = Scp::new(&fake)
        .config(dest(), None)
        .with_identity_file(&key_ref())
        .unwrap();
    commander
        .directory_to_remote(&local_tree(&dir), "www")
        .await
        .unwrap();
    assert_eq!(fake.remote("www/index.html").as_deref(), Some("<h1>hi</h1>"));
    assert_eq!(fake.remote("www/css/main.css").as_deref(), Some("body{}"));

    let env = fake.last_seen();
    assert!(env.mounts().iter().any(|m| m.path() == SOURCE_DIR));
    assert!(env.steps().last().unwrap().argv().contains(&"-r".to_string()));
}

#[tokio::test]
async fn directory_to_existing_remote_target_nests_source_dir() {
    let fake = FakeRemote::default();
    fake.put_remote("www/old.html", "old");
    let dir = TempDir::new().unwrap();
    let commander = Scp::new(&fake)
        .config(dest(), None)
        .with_identity_file(&key_ref())
        .unwrap();
    commander
        .directory_to_remote(&local_tree(&dir), "www")
        .await
        .unwrap();
    assert_eq!(
        fake.remote("www/source-dir/index.html").as_deref(),
        Some("<h1>hi</h1>")
    );
}

#[tokio::test]
async fn directory_from_remote_returns_tree() {
    let fake = FakeRemote::default();
    fake.put_remote("logs/app.log", "started");
    fake.put_remote("logs/archive/old.log", "stopped");
    let commander = Scp::new(&fake)
        .config(dest(), None)
        .with_password(&password_ref())
        .unwrap();
    let tree = commander.directory_from_remote("logs").await.unwrap();
    assert_eq!(read(&tree.path().join("app.log")), "started");
    assert_eq!(read(&tree.path().join("archive").join("old.log")), "stopped");

    let step = fake.last_seen().steps().last().unwrap().argv().to_vec();
    assert_eq!(step.last().map(String::as_str), Some(TARGET_DIR));
}

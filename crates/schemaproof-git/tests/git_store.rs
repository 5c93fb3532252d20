//! Runs against a throwaway repository; skipped when `git` is not installed.

use schemaproof_git::{CachedObjectStore, GitObjectStore, ObjectStore, ObjectStoreError};
use std::fs;
use std::path::Path;
use std::process::Command;

fn run_git(repo_root: &Path, args: &[&str]) {
    let output = Command::new("git")
        .arg("-C")
        .arg(repo_root)
        .args([
            "-c",
            "user.name=schemaproof",
            "-c",
            "user.email=schemaproof@example.invalid",
            "-c",
            "commit.gpgsign=false",
        ])
        .args(args)
        .output()
        .expect("git command should execute");
    if !output.status.success() {
        panic!(
            "git command failed with status {:?}\nstderr:\n{}",
            output.status.code(),
            String::from_utf8_lossy(&output.stderr),
        );
    }
}

fn init_repo() -> Option<tempfile::TempDir> {
    if !GitObjectStore::is_available() {
        eprintln!("git not installed; skipping");
        return None;
    }
    let dir = tempfile::tempdir().expect("temp dir should be created");
    run_git(dir.path(), &["init", "-q"]);
    fs::create_dir_all(dir.path().join("db")).unwrap();
    fs::write(dir.path().join("db/schema.sql"), "CREATE TABLE users (id bigint);\n").unwrap();
    run_git(dir.path(), &["add", "."]);
    run_git(dir.path(), &["commit", "-q", "-m", "initial schema"]);
    Some(dir)
}

#[test]
fn reads_file_at_head_and_reports_missing_paths() {
    let Some(dir) = init_repo() else { return };
    let store = GitObjectStore::discover(dir.path()).expect("repo should be discovered");
    let head = store.head_commit().expect("HEAD should resolve");
    assert_eq!(head.len(), 40);

    assert_eq!(
        store.file_at(&head, "db/schema.sql").unwrap(),
        Some("CREATE TABLE users (id bigint);\n".to_string())
    );
    assert_eq!(store.file_at(&head, "db/missing.sql").unwrap(), None);
}

#[test]
fn unknown_commit_is_an_error() {
    let Some(dir) = init_repo() else { return };
    let store = GitObjectStore::new(dir.path());
    let err = store
        .file_at("0000000000000000000000000000000000000000", "db/schema.sql")
        .unwrap_err();
    assert!(matches!(err, ObjectStoreError::CommandFailed { .. }));
    assert!(err.to_string().contains("unknown commit"), "{err}");
}

#[test]
fn unknown_commit_is_not_cached_as_missing() {
    let Some(dir) = init_repo() else { return };
    let store = CachedObjectStore::new(GitObjectStore::new(dir.path()));
    let unknown = "1234567890abcdef1234567890abcdef12345678";
    assert!(!store.inner().has_commit(unknown).unwrap());
    assert!(store.file_at(unknown, "db/schema.sql").is_err());
    assert!(store.file_at(unknown, "db/schema.sql").is_err());
    assert_eq!(store.entry_count(), 0);

    let head = store.inner().head_commit().unwrap();
    assert!(store.inner().has_commit(&head).unwrap());
}

#[test]
fn cached_store_serves_historical_content_after_edits() {
    let Some(dir) = init_repo() else { return };
    let store = CachedObjectStore::new(GitObjectStore::new(dir.path()));
    let head = store.inner().head_commit().unwrap();
    let before = store.file_at(&head, "db/schema.sql").unwrap();

    fs::write(dir.path().join("db/schema.sql"), "-- edited\n").unwrap();
    run_git(dir.path(), &["commit", "-q", "-am", "edit"]);

    assert_eq!(store.file_at(&head, "db/schema.sql").unwrap(), before);
    assert_eq!(store.entry_count(), 1);
}

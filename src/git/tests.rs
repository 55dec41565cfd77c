// ci-watch: CI job log watcher
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

use super::query::{REPO_URL, branch_name, parse_remote_slug, parse_repo_url};
use super::{GitMutation, GitQuery, LocalGit};
use crate::config::types::GitConfig;

fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("failed to create temp dir")
}

fn git(path: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(path)
        .output()
        .expect("git should run");
    assert!(
        output.status.success(),
        "git {args:?}: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Repository with one empty commit.
fn init_test_repo_with_commit(path: &Path) {
    git(path, &["init", "--quiet"]);
    git(path, &["config", "user.email", "test@example.com"]);
    git(path, &["config", "user.name", "Test"]);
    git(path, &["commit", "--allow-empty", "-m", "Initial commit", "--quiet"]);
}

/// Work repo plus a bare repo reachable as `<url_prefix>remote.git`.
fn repo_with_bare_remote() -> (TempDir, LocalGit) {
    let temp = temp_dir();
    let work = temp.path().join("work");
    let bare = temp.path().join("remote.git");
    std::fs::create_dir_all(&work).unwrap();
    std::fs::create_dir_all(&bare).unwrap();
    init_test_repo_with_commit(&work);
    git(&bare, &["init", "--bare", "--quiet"]);

    let config = GitConfig {
        remote_url_prefix: format!("{}/", temp.path().display()),
        ..GitConfig::default()
    };
    let local = LocalGit::new(&work, &config);
    (temp, local)
}

#[test]
fn test_branch_name() {
    assert_eq!(
        branch_name("ci/", "abc12345deadbeefcafe"),
        "ci/abc12345"
    );
    assert_eq!(branch_name("ci-watch-", "abc"), "ci-watch-abc");
}

#[test]
fn test_parse_repo_url() {
    assert!(REPO_URL.is_ok());
    for url in [
        "git@github.com:octo/widgets.git",
        "git@github.com:octo/widgets",
        "https://github.com/octo/widgets",
        "https://github.com/octo/widgets.git",
        "ssh://git@github.com/octo/widgets.git",
        "octo/widgets",
    ] {
        assert_eq!(parse_repo_url(url).as_deref(), Some("octo/widgets"), "{url}");
    }

    assert_eq!(parse_repo_url("github"), None);
    assert_eq!(parse_repo_url("/srv/git/widgets.git"), None);
    assert_eq!(parse_repo_url("https://gitlab.com/a/b/c.git"), None);
}

#[test]
fn test_parse_remote_slug() {
    let output = "\
* remote github
  Fetch URL: git@github.com:octo/widgets.git
  Push  URL: git@github.com:octo/widgets.git
  HEAD branch: (not queried)
";
    assert_eq!(parse_remote_slug(output).as_deref(), Some("octo/widgets"));
    assert_eq!(parse_remote_slug("* remote github\n  Fetch URL: github\n"), None);
}

#[tokio::test]
async fn test_head_hash_matches_rev_parse() {
    let temp = temp_dir();
    init_test_repo_with_commit(temp.path());

    let local = LocalGit::new(temp.path(), &GitConfig::default());
    let hash = local.head_hash().await.unwrap();
    assert_eq!(hash, git(temp.path(), &["rev-parse", "HEAD"]));
    assert_eq!(hash.len(), 40);
}

#[tokio::test]
async fn test_head_hash_outside_repo_fails() {
    let temp = temp_dir();
    let local = LocalGit::new(temp.path(), &GitConfig::default());
    // a temp dir may still sit inside some repository; only assert when not
    if gix::discover(temp.path()).is_err() {
        assert!(local.head_hash().await.is_err());
    }
}

#[tokio::test]
async fn test_remote_slug_from_configured_url() {
    let temp = temp_dir();
    init_test_repo_with_commit(temp.path());
    git(
        temp.path(),
        &["remote", "add", "github", "git@github.com:octo/widgets.git"],
    );

    let local = LocalGit::new(temp.path(), &GitConfig::default());
    assert_eq!(
        local.remote_slug().await.unwrap().as_deref(),
        Some("octo/widgets")
    );
}

#[tokio::test]
async fn test_ensure_remote_adds_missing_remote() {
    let (temp, local) = repo_with_bare_remote();
    let work = temp.path().join("work");

    local.ensure_remote("remote.git").await.unwrap();
    let url = git(&work, &["remote", "get-url", "github"]);
    assert_eq!(url, format!("{}/remote.git", temp.path().display()));

    // second call finds it and leaves it alone
    local.ensure_remote("other.git").await.unwrap();
    assert_eq!(git(&work, &["remote", "get-url", "github"]), url);
}

#[tokio::test]
async fn test_push_and_delete_branch() {
    let (temp, local) = repo_with_bare_remote();
    let bare = temp.path().join("remote.git");

    local.ensure_remote("remote.git").await.unwrap();
    local.push_branch("ci/abc12345").await.unwrap();
    let refs = git(&bare, &["for-each-ref", "--format=%(refname)"]);
    assert!(refs.contains("refs/heads/ci/abc12345"), "{refs}");

    local.delete_branch("ci/abc12345").await.unwrap();
    let refs = git(&bare, &["for-each-ref", "--format=%(refname)"]);
    assert!(!refs.contains("ci/abc12345"), "{refs}");
}

#[tokio::test]
async fn test_delete_missing_branch_is_an_error() {
    let (_temp, local) = repo_with_bare_remote();
    local.ensure_remote("remote.git").await.unwrap();

    let err = local.delete_branch("ci/nope").await.unwrap_err();
    assert!(err.to_string().contains("git push github :ci/nope"), "{err}");
}

// ci-watch: CI job log watcher
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use super::{exit_success, resolve_repo};
use crate::ci::JobState;
use crate::error::{GitError, WatchError, WatchResult};
use crate::git::GitQuery;

struct Remote(Option<&'static str>);

impl GitQuery for Remote {
    async fn head_hash(&self) -> WatchResult<String> {
        Ok("abc1234567890".to_string())
    }

    async fn remote_slug(&self) -> WatchResult<Option<String>> {
        Ok(self.0.map(str::to_string))
    }
}

struct Broken;

impl GitQuery for Broken {
    async fn head_hash(&self) -> WatchResult<String> {
        Err(GitError::CommandFailed {
            command: "git rev-parse HEAD".to_string(),
            message: "not a repository".to_string(),
        }
        .into())
    }

    async fn remote_slug(&self) -> WatchResult<Option<String>> {
        Err(GitError::CommandFailed {
            command: "git remote show -n github".to_string(),
            message: "not a repository".to_string(),
        }
        .into())
    }
}

#[tokio::test]
async fn test_configured_repo_wins() {
    let repo = resolve_repo(Some("cli/given"), &Remote(Some("from/remote")))
        .await
        .unwrap();
    assert_eq!(repo, "cli/given");
}

#[tokio::test]
async fn test_repo_from_remote() {
    let repo = resolve_repo(None, &Remote(Some("from/remote"))).await.unwrap();
    assert_eq!(repo, "from/remote");

    // an empty setting counts as unset
    let repo = resolve_repo(Some(""), &Remote(Some("from/remote")))
        .await
        .unwrap();
    assert_eq!(repo, "from/remote");
}

#[tokio::test]
async fn test_missing_repo_is_config_error() {
    let err = resolve_repo(None, &Remote(None)).await.unwrap_err();
    assert!(matches!(err, WatchError::Config(_)));
    insta::assert_snapshot!(err, @"config error: can't determine github repo name");

    let err = resolve_repo(None, &Broken).await.unwrap_err();
    assert!(matches!(err, WatchError::Config(_)));
}

#[test]
fn test_only_passed_succeeds() {
    assert!(exit_success(&JobState::Passed));
    assert!(!exit_success(&JobState::Failed));
    assert!(!exit_success(&JobState::Started));
    assert!(!exit_success(&JobState::Unknown));
    assert!(!exit_success(&JobState::Other("errored".to_string())));
}

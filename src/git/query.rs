// ci-watch: CI job log watcher
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Read-only git helpers.
//!
//! ```text
//! head_hash(path)          gix::discover --> head_id --> hex
//! branch_name(prefix, h)   "<prefix><h[..8]>"
//! parse_remote_slug(text)  "Fetch URL: git@host:user/repo.git" --> user/repo
//! ```

use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

use crate::error::{GitError, GixError, WatchResult};

/// Hash of the commit HEAD points to.
///
/// # Errors
///
/// Returns a `GitError` if no repository is found at `path` or HEAD is unborn.
pub fn head_hash(path: &Path) -> WatchResult<String> {
    let repo = gix::discover(path).map_err(|e| GitError::Gix(GixError::Discover(Box::new(e))))?;
    let id = repo
        .head_id()
        .map_err(|e| GitError::Gix(GixError::HeadId(Box::new(e))))?;
    Ok(id.to_string())
}

/// Provisional branch name for a commit.
#[must_use]
pub fn branch_name(prefix: &str, hash: &str) -> String {
    format!("{prefix}{}", hash.get(..8).unwrap_or(hash))
}

pub(super) static REPO_URL: LazyLock<Result<Regex, regex::Error>> = LazyLock::new(|| {
    Regex::new(r"^(?:[a-z+]+://[^/]+/|[^@/\s]+@[^:/\s]+:)?([^/:\s]+)/([^/\s]+?)(?:\.git)?/?$")
});

/// Extracts `user/repo` from a remote URL.
///
/// Accepts scp-like (`git@github.com:user/repo.git`), `https://` and `ssh://`
/// URLs, or a bare `user/repo`.
#[must_use]
pub fn parse_repo_url(url: &str) -> Option<String> {
    let captures = REPO_URL.as_ref().ok()?.captures(url.trim())?;
    Some(format!("{}/{}", captures.get(1)?.as_str(), captures.get(2)?.as_str()))
}

/// Extracts `user/repo` from `git remote show -n <remote>` output.
#[must_use]
pub fn parse_remote_slug(show_output: &str) -> Option<String> {
    show_output
        .lines()
        .filter_map(|line| line.trim().strip_prefix("Fetch URL:"))
        .find_map(parse_repo_url)
}

// ci-watch: CI job log watcher
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Git backend abstraction layer.
//!
//! ```text
//! GitQuery (read)     --> gix, or `git remote show -n`
//! GitMutation (write) --> git CLI through the process runner
//! ```

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use super::query;
use crate::config::types::GitConfig;
use crate::core::process::ProcessBuilder;
use crate::error::{GitError, WatchError, WatchResult};

/// Read-only repository queries.
pub trait GitQuery: Send + Sync {
    /// Full hash of the commit HEAD points to.
    fn head_hash(&self) -> impl Future<Output = WatchResult<String>> + Send;

    /// `user/repo` of the CI remote, if it exists and looks like one.
    fn remote_slug(&self) -> impl Future<Output = WatchResult<Option<String>>> + Send;
}

/// Operations that change local or remote repository state.
pub trait GitMutation: Send + Sync {
    /// Make sure the CI remote exists, adding it for `repo` if it does not.
    fn ensure_remote(&self, repo: &str) -> impl Future<Output = WatchResult<()>> + Send;

    /// Push HEAD to `branch` on the CI remote.
    fn push_branch(&self, branch: &str) -> impl Future<Output = WatchResult<()>> + Send;

    /// Delete `branch` from the CI remote.
    fn delete_branch(&self, branch: &str) -> impl Future<Output = WatchResult<()>> + Send;
}

/// The repository in a working directory, with one designated CI remote.
#[derive(Debug, Clone)]
pub struct LocalGit {
    cwd: PathBuf,
    remote: String,
    url_prefix: String,
    timeout: Option<Duration>,
}

impl LocalGit {
    #[must_use]
    pub fn new(cwd: impl AsRef<Path>, config: &GitConfig) -> Self {
        Self {
            cwd: cwd.as_ref().to_path_buf(),
            remote: config.remote.clone(),
            url_prefix: config.remote_url_prefix.clone(),
            timeout: config.timeout(),
        }
    }

    #[must_use]
    pub fn remote(&self) -> &str {
        &self.remote
    }

    /// Run git with prompts disabled. Captures output when `capture` is set,
    /// otherwise discards it.
    async fn git(&self, args: &[&str], capture: bool) -> WatchResult<String> {
        let builder = ProcessBuilder::which("git")?
            .args(args)
            .cwd(&self.cwd)
            .env("GCM_INTERACTIVE", "never")
            .env("GIT_TERMINAL_PROMPT", "0")
            .name("git")
            .timeout_opt(self.timeout);
        let builder = if capture {
            builder.capture_output()
        } else {
            builder.quiet()
        };

        match builder.run().await {
            Ok(output) => Ok(output.stdout().trim().to_string()),
            Err(WatchError::Process(e)) if !e.is_timeout() => Err(GitError::CommandFailed {
                command: format!("git {}", args.join(" ")),
                message: e.to_string(),
            }
            .into()),
            Err(e) => Err(e),
        }
    }
}

impl GitQuery for LocalGit {
    async fn head_hash(&self) -> WatchResult<String> {
        query::head_hash(&self.cwd)
    }

    async fn remote_slug(&self) -> WatchResult<Option<String>> {
        // -n: read the configured URL without contacting the remote
        let output = self.git(&["remote", "show", "-n", &self.remote], true).await?;
        Ok(query::parse_remote_slug(&output))
    }
}

impl GitMutation for LocalGit {
    async fn ensure_remote(&self, repo: &str) -> WatchResult<()> {
        if self.git(&["remote", "show", &self.remote], false).await.is_ok() {
            return Ok(());
        }
        let url = format!("{}{repo}", self.url_prefix);
        info!(remote = %self.remote, url = %url, "adding remote");
        self.git(&["remote", "add", &self.remote, &url], false).await?;
        Ok(())
    }

    async fn push_branch(&self, branch: &str) -> WatchResult<()> {
        let refspec = format!("HEAD:{branch}");
        debug!(remote = %self.remote, refspec = %refspec, "push");
        self.git(&["push", &self.remote, &refspec], false).await?;
        Ok(())
    }

    async fn delete_branch(&self, branch: &str) -> WatchResult<()> {
        let refspec = format!(":{branch}");
        debug!(remote = %self.remote, refspec = %refspec, "push");
        self.git(&["push", &self.remote, &refspec], false).await?;
        Ok(())
    }
}

// ci-watch: CI job log watcher
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Watch command: find or create the CI build for HEAD and follow one job.
//!
//! ```text
//! resolve_repo (arg > watch.repo > git remote)   no network before this
//!      |
//! head_hash --> branch <prefix><hash[..8]>
//!      |
//! get_build(wait=false) --err--> ensure_remote, push HEAD:branch,
//!      |                         get_build(wait=true)
//!      v
//! job_ids[job - 1] --> get_job
//!      |
//!      +-- passed/failed --> get_log(whole) --> last(1), add(1, body)
//!      +-- otherwise ------> subscribe(job-<id>) + LogTail::follow
//!      |                       catch-up: get_log(chunked)
//!      v
//! get_job (final state) --> cleanup: build finished? delete branch
//! ```
//!
//! Cleanup runs after every watch. When the watch failed or Ctrl-C cancelled
//! it, the branch is also deleted if this run pushed it.

#[cfg(test)]
mod tests;

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::ci::{Build, CiClient, JobState, LogBody};
use crate::config::Config;
use crate::error::{ConfigError, ProtocolError, Result, WatchError, WatchResult, bail_out};
use crate::git::query::branch_name;
use crate::git::{GitMutation, GitQuery, LocalGit};
use crate::net::AdmissionLimiter;
use crate::stream::{LogAssembly, LogFeed, LogTail, PollingFeed, TailOutcome};

/// Repository identifier: configured (or given) value, else the CI remote.
///
/// # Errors
///
/// Returns `ConfigError::MissingIdentifier` if neither yields a `user/repo`.
pub async fn resolve_repo<G: GitQuery>(configured: Option<&str>, git: &G) -> WatchResult<String> {
    if let Some(repo) = configured.filter(|r| !r.is_empty()) {
        return Ok(repo.to_string());
    }
    match git.remote_slug().await {
        Ok(Some(repo)) => return Ok(repo),
        Ok(None) => {}
        Err(e) => debug!(error = %e, "no repo name from git remote"),
    }
    Err(ConfigError::MissingIdentifier {
        what: "github repo name".to_string(),
    }
    .into())
}

/// Runs one watch against a CI client, a repository and a live log feed.
#[derive(Debug)]
pub struct Watcher<G, F> {
    client: CiClient,
    git: G,
    feed: F,
    branch_prefix: String,
    job: usize,
    grace: Duration,
    pushed: AtomicBool,
}

impl<G, F> Watcher<G, F>
where
    G: GitQuery + GitMutation,
    F: LogFeed,
{
    #[must_use]
    pub fn new(client: CiClient, git: G, feed: F, config: &Config) -> Self {
        Self {
            client,
            git,
            feed,
            branch_prefix: config.git.branch_prefix.clone(),
            job: config.watch.job,
            grace: config.watch.grace(),
            pushed: AtomicBool::new(false),
        }
    }

    /// Follows the job log of HEAD's build on `repo`, writing it to `out`.
    ///
    /// Returns the job's state after the log ended. Cancelling `cancel`
    /// aborts the watch. Cleanup is attempted either way.
    ///
    /// # Errors
    ///
    /// - Git errors resolving HEAD or pushing the branch.
    /// - Network errors once a request's budget is spent.
    /// - `ProtocolError::BadJobNumber` for a job outside the build.
    /// - `WatchError::Bailed` when cancelled.
    pub async fn run<W: Write>(
        &self,
        repo: &str,
        out: &mut W,
        cancel: &CancellationToken,
    ) -> WatchResult<JobState> {
        let hash = self.git.head_hash().await?;
        let branch = branch_name(&self.branch_prefix, &hash);
        info!(repo, branch = %branch, "watching");

        let result = tokio::select! {
            result = self.watch(repo, &branch, out) => result,
            () = cancel.cancelled() => {
                warn!("interrupted, cleaning up");
                Err(bail_out("interrupted"))
            }
        };

        self.cleanup(repo, &branch, result.is_err()).await;
        result
    }

    async fn watch<W: Write>(&self, repo: &str, branch: &str, out: &mut W) -> WatchResult<JobState> {
        let build = self.find_build(repo, branch).await?;
        let job_id = build.job_id(self.job).ok_or(ProtocolError::BadJobNumber {
            number: self.job,
            count: build.job_ids.len(),
        })?;

        let job = self.client.get_job(job_id).await?;
        debug!(job_id, state = %job.state, log_id = job.log_id, "job");

        let mut assembly = LogAssembly::new(out);
        if job.state.is_finished() {
            self.print_whole(&mut assembly, job.log_id).await?;
        } else {
            self.follow(&mut assembly, job_id, job.log_id).await?;
        }

        let job = self.client.get_job(job_id).await?;
        info!(job_id, state = %job.state, "job done");
        Ok(job.state)
    }

    async fn find_build(&self, repo: &str, branch: &str) -> WatchResult<Build> {
        match self.client.get_build(repo, branch, false).await {
            Ok(build) => return Ok(build),
            Err(e) => debug!(error = %e, "no build yet"),
        }

        info!(branch, "pushing provisional branch");
        self.git.ensure_remote(repo).await?;
        self.git.push_branch(branch).await?;
        self.pushed.store(true, Ordering::SeqCst);
        self.client.get_build(repo, branch, true).await
    }

    async fn print_whole<W: Write>(
        &self,
        assembly: &mut LogAssembly<W>,
        log_id: u64,
    ) -> WatchResult<()> {
        let LogBody::Buffered { body } = self.client.get_log(log_id, false).await? else {
            return Err(ProtocolError::UnexpectedShape(format!("log {log_id} is chunked")).into());
        };
        assembly.last(1);
        assembly.add(1, body)?;
        Ok(())
    }

    async fn follow<W: Write>(
        &self,
        assembly: &mut LogAssembly<W>,
        job_id: u64,
        log_id: u64,
    ) -> WatchResult<()> {
        let subscription = self.feed.subscribe(job_id).await?;
        let client = &self.client;
        let outcome = LogTail::new(self.grace)
            .follow(assembly, subscription, || async move {
                let LogBody::Chunked { parts } = client.get_log(log_id, true).await? else {
                    return Err(WatchError::from(ProtocolError::UnexpectedShape(format!(
                        "log {log_id} is not chunked"
                    ))));
                };
                Ok::<_, WatchError>(parts)
            })
            .await?;
        if outcome == TailOutcome::Unterminated {
            warn!(job_id, "log ended without a final chunk");
        }
        Ok(())
    }

    /// Deletes the provisional branch once the whole build has finished, or
    /// when a watch that pushed it was interrupted or failed. Failures are
    /// logged and ignored.
    async fn cleanup(&self, repo: &str, branch: &str, abandoned: bool) {
        let delete = match self.client.get_build(repo, branch, false).await {
            Ok(build) => build.state.is_finished(),
            Err(e) => {
                debug!(error = %e, "build lookup during cleanup failed");
                false
            }
        } || (abandoned && self.pushed.load(Ordering::SeqCst));

        if !delete {
            return;
        }
        debug!(branch, "deleting provisional branch");
        if let Err(e) = self.delete_branch(repo, branch).await {
            // maybe already deleted
            warn!(branch, error = %e, "failed to delete branch");
        }
    }

    async fn delete_branch(&self, repo: &str, branch: &str) -> WatchResult<()> {
        self.git.ensure_remote(repo).await?;
        self.git.delete_branch(branch).await
    }
}

/// Exit status for the job's final state: success only for `passed`.
#[must_use]
pub const fn exit_success(state: &JobState) -> bool {
    matches!(state, JobState::Passed)
}

/// Run the watch command against the real git repository and CI API.
///
/// # Errors
///
/// Returns an error if the repository cannot be identified or the watch
/// fails; see [`Watcher::run`].
pub async fn run_watch_command(config: &Config) -> Result<JobState> {
    let cwd = std::env::current_dir()?;
    let git = LocalGit::new(&cwd, &config.git);
    let repo = resolve_repo(config.watch.repo.as_deref(), &git).await?;

    let limiter = AdmissionLimiter::new(config.api.request_limit);
    let client = CiClient::new(&config.api, &config.watch, &repo, limiter);
    let feed = PollingFeed::new(client.clone(), config.watch.poll_interval());
    let watcher = Watcher::new(client, git, feed, config);

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            interrupt.cancel();
        }
    });

    let mut stdout = std::io::stdout();
    let state = watcher.run(&repo, &mut stdout, &cancel).await?;
    stdout.flush()?;
    Ok(state)
}

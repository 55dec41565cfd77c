// ci-watch: CI job log watcher
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! CI provider API client.
//!
//! ```text
//! CiClient (endpoint, media type, retry policy, build polling)
//!   get_build(repo, branch, wait) --> Build { state, job_ids }
//!   get_job(id)                   --> Job { state, log_id }
//!   get_log(log_id, chunked)      --> LogBody::Buffered | LogBody::Chunked
//!        |
//!        v
//!   net::RetryClient::request_json
//! ```
//!
//! Every call sends `User-Agent: ci-watch/<version> (<os> <arch>) <repo>` and
//! `Accept: <media type>`, with `; chunked=true` appended for chunked logs.

pub mod types;


use std::time::Duration;
use tracing::debug;

use crate::config::types::{ApiConfig, WatchConfig};
use crate::error::{ProtocolError, WatchResult};
use crate::net::{AdmissionLimiter, RequestConfig, RetryClient};

pub use types::{Build, Job, JobState, LogBody, LogPart};
use types::{BranchEnvelope, JobEnvelope, LogEnvelope};

/// `User-Agent` for API calls on behalf of `repo`.
#[must_use]
pub fn user_agent(repo: &str) -> String {
    format!(
        "{}/{} ({} {}) {repo}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS,
        std::env::consts::ARCH,
    )
}

/// Retry policy used while waiting for a build to appear.
#[derive(Debug, Clone, Copy)]
struct BuildPolling {
    retries: u32,
    delay: Duration,
    timeout: Duration,
}

/// Client for the CI provider's REST API.
#[derive(Debug, Clone)]
pub struct CiClient {
    http: RetryClient,
    endpoint: String,
    media_type: String,
    timeout: Duration,
    retries: u32,
    delay: Duration,
    polling: BuildPolling,
}

impl CiClient {
    /// Client for `repo`, sharing `limiter` with any other client.
    #[must_use]
    pub fn new(api: &ApiConfig, watch: &WatchConfig, repo: &str, limiter: AdmissionLimiter) -> Self {
        let http = RetryClient::new(&user_agent(repo)).with_limiter(limiter);
        Self::with_http(http, api, watch)
    }

    /// Client on top of an already configured [`RetryClient`].
    #[must_use]
    pub fn with_http(http: RetryClient, api: &ApiConfig, watch: &WatchConfig) -> Self {
        Self {
            http,
            endpoint: api.endpoint.trim_end_matches('/').to_string(),
            media_type: api.media_type.clone(),
            timeout: api.timeout(),
            retries: api.retries,
            delay: api.delay(),
            polling: BuildPolling {
                retries: watch.build_wait_retries,
                delay: watch.build_wait_delay(),
                timeout: watch.build_wait_timeout(),
            },
        }
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn request(&self, path: &str, chunked: bool) -> RequestConfig {
        let accept = if chunked {
            format!("{}; chunked=true", self.media_type)
        } else {
            self.media_type.clone()
        };
        RequestConfig::builder()
            .url(format!("{}{path}", self.endpoint))
            .timeout(self.timeout)
            .retries(self.retries)
            .delay(self.delay)
            .build()
            .header("Accept", accept)
    }

    /// Latest build on `branch`.
    ///
    /// Lookups use the build polling timeout. With `wait`, a missing build is
    /// retried with the polling budget and delay; without it, a single attempt
    /// is made.
    ///
    /// # Errors
    ///
    /// Returns the last network error once the budget is spent, or a
    /// `ProtocolError` for an unexpected body.
    pub async fn get_build(&self, repo: &str, branch: &str, wait: bool) -> WatchResult<Build> {
        let config = RequestConfig::builder()
            .url(format!("{}/repos/{repo}/branches/{branch}", self.endpoint))
            .timeout(self.polling.timeout)
            .retries(if wait { self.polling.retries } else { 0 })
            .delay(self.polling.delay)
            .build()
            .header("Accept", self.media_type.clone());

        debug!(repo, branch, wait, "get build");
        let envelope: BranchEnvelope = self.http.request_json(&config).await?;
        Ok(envelope.branch)
    }

    /// # Errors
    ///
    /// Returns the last network error once the budget is spent, or a
    /// `ProtocolError` for an unexpected body.
    pub async fn get_job(&self, job_id: u64) -> WatchResult<Job> {
        let config = self.request(&format!("/jobs/{job_id}"), false);
        let envelope: JobEnvelope = self.http.request_json(&config).await?;
        Ok(envelope.job)
    }

    /// Fetch a job log, whole or as the parts available so far.
    ///
    /// # Errors
    ///
    /// Returns the last network error once the budget is spent, or
    /// `ProtocolError::UnexpectedShape` if the body lacks `body`/`parts`.
    pub async fn get_log(&self, log_id: u64, chunked: bool) -> WatchResult<LogBody> {
        let config = self.request(&format!("/logs/{log_id}"), chunked);
        let envelope: LogEnvelope = self.http.request_json(&config).await?;
        let log = envelope.log;

        let body = if chunked {
            log.parts.map(|parts| LogBody::Chunked { parts })
        } else {
            log.body.map(|body| LogBody::Buffered { body })
        };
        body.ok_or_else(|| {
            ProtocolError::UnexpectedShape(format!(
                "log {log_id} has no {}",
                if chunked { "parts" } else { "body" }
            ))
            .into()
        })
    }
}

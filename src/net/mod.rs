// ci-watch: CI job log watcher
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Resilient HTTP requests.
//!
//! ```text
//! RetryClient::new(user_agent)
//!   .with_limiter(AdmissionLimiter)
//!   .with_observer(Arc<dyn RetryObserver>)
//!        |
//!        +-------------------+------------------+
//!        v                   v                  v
//!   request(cfg)      request_json::<T>()   stream(cfg)
//!        |                                      |
//!   limiter slot                          limiter slot
//!        |                                 one attempt
//!   attempt (timeout T)                    no retries
//!    200 --> HttpResponse                       |
//!    err/!200 --> budget left?           StreamingResponse
//!       yes: observer, sleep(delay),
//!            timeout *= 2, retry
//!       no:  Transport | BadStatus
//! ```

pub mod limiter;


use bon::Builder;
use futures_util::{Stream, StreamExt};
use reqwest::header::HeaderMap;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace, warn};

use crate::error::{NetworkError, ProtocolError, WatchResult};

pub use limiter::{AdmissionLimiter, AdmissionPermit};

/// One logical request: target, headers and retry policy.
#[derive(Debug, Clone, Builder)]
pub struct RequestConfig {
    #[builder(into)]
    url: String,
    #[builder(default)]
    headers: Vec<(String, String)>,
    /// Timeout of the first attempt; doubled on every retry.
    #[builder(default = RequestConfig::DEFAULT_TIMEOUT)]
    timeout: Duration,
    /// Number of re-attempts after the first one.
    #[builder(default = RequestConfig::DEFAULT_RETRIES)]
    retries: u32,
    /// Pause before each retry.
    #[builder(default = RequestConfig::DEFAULT_DELAY)]
    delay: Duration,
}

impl RequestConfig {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
    pub const DEFAULT_RETRIES: u32 = 3;
    pub const DEFAULT_DELAY: Duration = Duration::ZERO;

    /// Adds a header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    #[must_use]
    pub const fn retries(&self) -> u32 {
        self.retries
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    #[must_use]
    pub const fn delay(&self) -> Duration {
        self.delay
    }
}

/// Attempt state threaded through the retry loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestAttempt {
    number: u32,
    timeout: Duration,
    retries_left: u32,
}

impl RequestAttempt {
    /// The first attempt of a call.
    #[must_use]
    pub const fn first(config: &RequestConfig) -> Self {
        Self {
            number: 0,
            timeout: config.timeout,
            retries_left: config.retries,
        }
    }

    /// The following attempt, or `None` once the budget is spent.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        if self.retries_left == 0 {
            return None;
        }
        Some(Self {
            number: self.number + 1,
            timeout: self.timeout.saturating_mul(2),
            retries_left: self.retries_left - 1,
        })
    }

    /// 0 for the first attempt, n for the n-th retry.
    #[must_use]
    pub const fn number(&self) -> u32 {
        self.number
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    #[must_use]
    pub const fn retries_left(&self) -> u32 {
        self.retries_left
    }
}

/// Why an attempt is being retried.
#[derive(Debug)]
pub enum RetryCause {
    Transport(reqwest::Error),
    Status(u16),
}

impl fmt::Display for RetryCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(e) => write!(f, "{e}"),
            Self::Status(status) => write!(f, "status {status}"),
        }
    }
}

impl RetryCause {
    fn into_error(self, url: &str) -> NetworkError {
        match self {
            Self::Transport(source) => NetworkError::Transport {
                url: url.to_string(),
                source,
            },
            Self::Status(status) => NetworkError::BadStatus {
                status,
                url: url.to_string(),
            },
        }
    }
}

/// Sink for retry notifications. Observational only.
pub trait RetryObserver: Send + Sync {
    /// Called before the retry described by `attempt` is issued.
    fn on_retry(&self, url: &str, attempt: &RequestAttempt, cause: &RetryCause);
}

/// Default observer: one `warn!` per retry.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl RetryObserver for TracingObserver {
    fn on_retry(&self, url: &str, attempt: &RequestAttempt, cause: &RetryCause) {
        warn!(
            url,
            attempt = attempt.number(),
            timeout_ms = u64::try_from(attempt.timeout().as_millis()).unwrap_or(u64::MAX),
            cause = %cause,
            "retrying request"
        );
    }
}

/// A buffered 200 response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: String,
}

impl HttpResponse {
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }
}

/// A live response body handed back as soon as the headers arrived.
#[derive(Debug)]
pub struct StreamingResponse {
    url: String,
    response: reqwest::Response,
}

impl StreamingResponse {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.response.status()
    }

    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        self.response.headers()
    }

    /// Body chunks as they arrive.
    pub fn into_stream(self) -> impl Stream<Item = WatchResult<Vec<u8>>> + Send {
        let url = self.url;
        self.response.bytes_stream().map(move |chunk| {
            chunk.map(|bytes| bytes.to_vec()).map_err(|source| {
                NetworkError::Transport {
                    url: url.clone(),
                    source,
                }
                .into()
            })
        })
    }
}

/// HTTP client with retry, timeout escalation and admission control.
#[derive(Clone)]
pub struct RetryClient {
    client: Client,
    limiter: AdmissionLimiter,
    observer: Arc<dyn RetryObserver>,
}

impl fmt::Debug for RetryClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryClient")
            .field("limiter", &self.limiter)
            .finish_non_exhaustive()
    }
}

impl RetryClient {
    /// Client with the given `User-Agent`, no limit, and tracing retry logs.
    /// Falls back to a default client if custom configuration fails.
    #[must_use]
    pub fn new(user_agent: &str) -> Self {
        let client = Client::builder()
            .user_agent(user_agent)
            .pool_max_idle_per_host(0)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            limiter: AdmissionLimiter::unlimited(),
            observer: Arc::new(TracingObserver),
        }
    }

    /// Share an admission limiter with other clients.
    #[must_use]
    pub fn with_limiter(mut self, limiter: AdmissionLimiter) -> Self {
        self.limiter = limiter;
        self
    }

    /// Replace the retry observer.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn RetryObserver>) -> Self {
        self.observer = observer;
        self
    }

    #[must_use]
    pub const fn limiter(&self) -> &AdmissionLimiter {
        &self.limiter
    }

    /// Issue one logical GET, retrying transport errors and non-200 answers.
    ///
    /// # Errors
    ///
    /// Once the retry budget is spent, returns `NetworkError::Transport` with the
    /// last transport error or `NetworkError::BadStatus` with the last status.
    pub async fn request(&self, config: &RequestConfig) -> WatchResult<HttpResponse> {
        let _slot = self.limiter.acquire().await;
        let mut attempt = RequestAttempt::first(config);

        loop {
            let cause = match self.attempt(config, &attempt).await {
                Ok(response) => return Ok(response),
                Err(cause) => cause,
            };

            let Some(next) = attempt.next() else {
                debug!(url = config.url(), attempts = attempt.number() + 1, "retry budget exhausted");
                return Err(cause.into_error(config.url()).into());
            };

            self.observer.on_retry(config.url(), &next, &cause);
            if !config.delay().is_zero() {
                tokio::time::sleep(config.delay()).await;
            }
            attempt = next;
        }
    }

    /// Like [`request`](Self::request), then parses the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns the request error, or `ProtocolError::MalformedBody` (not retried)
    /// if the body does not deserialize into `T`.
    pub async fn request_json<T: DeserializeOwned>(&self, config: &RequestConfig) -> WatchResult<T> {
        let response = self.request(config).await?;
        serde_json::from_str(response.body()).map_err(|source| {
            ProtocolError::MalformedBody {
                url: config.url().to_string(),
                source,
            }
            .into()
        })
    }

    /// Connect once and hand back the live body; retries do not apply.
    ///
    /// # Errors
    ///
    /// Returns `NetworkError::TimedOut` if headers do not arrive within the
    /// configured timeout, `Transport` on connection failure, or `BadStatus`
    /// for anything but 200.
    pub async fn stream(&self, config: &RequestConfig) -> WatchResult<StreamingResponse> {
        let _slot = self.limiter.acquire().await;
        let url = config.url().to_string();

        let send = self.prepare(config).send();
        let response = tokio::time::timeout(config.timeout(), send)
            .await
            .map_err(|_| NetworkError::TimedOut {
                url: url.clone(),
                after_ms: u64::try_from(config.timeout().as_millis()).unwrap_or(u64::MAX),
            })?
            .map_err(|source| NetworkError::Transport {
                url: url.clone(),
                source,
            })?;

        if response.status() != StatusCode::OK {
            return Err(NetworkError::BadStatus {
                status: response.status().as_u16(),
                url,
            }
            .into());
        }

        trace!(url = %url, "streaming response");
        Ok(StreamingResponse { url, response })
    }

    fn prepare(&self, config: &RequestConfig) -> reqwest::RequestBuilder {
        let mut request = self.client.get(config.url());
        for (name, value) in &config.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        request
    }

    async fn attempt(
        &self,
        config: &RequestConfig,
        attempt: &RequestAttempt,
    ) -> Result<HttpResponse, RetryCause> {
        trace!(url = config.url(), attempt = attempt.number(), "GET");

        let response = self
            .prepare(config)
            .timeout(attempt.timeout())
            .send()
            .await
            .map_err(RetryCause::Transport)?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(RetryCause::Status(status.as_u16()));
        }

        let headers = response.headers().clone();
        let body = response.text().await.map_err(RetryCause::Transport)?;
        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

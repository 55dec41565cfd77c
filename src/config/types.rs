// ci-watch: CI job log watcher
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Configuration section types.
//!
//! ```text
//! Config: GlobalConfig, ApiConfig, WatchConfig, GitConfig
//! Durations are stored as integer ms/secs and exposed as `Duration`.
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::logging::LogLevel;
use crate::net::RequestConfig;

/// Global configuration options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GlobalConfig {
    /// Log level for stderr output (0-6).
    pub output_log_level: LogLevel,
    /// Log level for file output (0-6).
    pub file_log_level: LogLevel,
    /// Path to log file; empty disables file logging.
    pub log_file: Option<PathBuf>,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            output_log_level: LogLevel::WARN,
            file_log_level: LogLevel::DEBUG,
            log_file: None,
        }
    }
}

/// CI API client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ApiConfig {
    /// Base URL of the CI API.
    pub endpoint: String,
    /// Versioned media type sent in `Accept`.
    pub media_type: String,
    /// Per-attempt timeout of the first attempt, in milliseconds.
    pub timeout_ms: u64,
    /// Retry budget for ordinary API calls.
    pub retries: u32,
    /// Delay between retries, in milliseconds.
    pub delay_ms: u64,
    /// Max concurrent in-flight requests (0 = unlimited).
    pub request_limit: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.travis-ci.org".to_string(),
            media_type: "application/vnd.travis-ci.2+json".to_string(),
            timeout_ms: RequestConfig::DEFAULT_TIMEOUT.as_millis().try_into().unwrap_or(u64::MAX),
            retries: RequestConfig::DEFAULT_RETRIES,
            delay_ms: 0,
            request_limit: 0,
        }
    }
}

impl ApiConfig {
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    #[must_use]
    pub const fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

/// Job watching settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WatchConfig {
    /// Default `user/repo` when none is given on the command line.
    pub repo: Option<String>,
    /// 1-based job number to follow.
    pub job: usize,
    /// How long to wait for the trailing chunk after the final index is known.
    pub grace_ms: u64,
    /// Interval of the polling log feed.
    pub poll_interval_ms: u64,
    /// Retry budget while waiting for a freshly pushed build to show up.
    pub build_wait_retries: u32,
    /// Delay between build lookups while waiting.
    pub build_wait_delay_ms: u64,
    /// Per-attempt timeout while waiting for the build.
    pub build_wait_timeout_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            repo: None,
            job: 1,
            grace_ms: 10_000,
            poll_interval_ms: 2_000,
            // check every 5 seconds for up to 3 minutes
            build_wait_retries: 3 * 12,
            build_wait_delay_ms: 5_000,
            build_wait_timeout_ms: 30_000,
        }
    }
}

impl WatchConfig {
    #[must_use]
    pub const fn grace(&self) -> Duration {
        Duration::from_millis(self.grace_ms)
    }

    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    #[must_use]
    pub const fn build_wait_delay(&self) -> Duration {
        Duration::from_millis(self.build_wait_delay_ms)
    }

    #[must_use]
    pub const fn build_wait_timeout(&self) -> Duration {
        Duration::from_millis(self.build_wait_timeout_ms)
    }
}

/// Git remote and provisional branch settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GitConfig {
    /// Remote that CI builds from.
    pub remote: String,
    /// Prefix prepended to `user/repo` when the remote has to be added.
    pub remote_url_prefix: String,
    /// Prefix of the provisional branch name (followed by 8 hash chars).
    pub branch_prefix: String,
    /// Timeout for each git invocation, in milliseconds (0 = none).
    pub timeout_ms: u64,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            remote: "github".to_string(),
            remote_url_prefix: "git@github.com:".to_string(),
            branch_prefix: "ci/".to_string(),
            timeout_ms: 120_000,
        }
    }
}

impl GitConfig {
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        if self.timeout_ms == 0 {
            None
        } else {
            Some(Duration::from_millis(self.timeout_ms))
        }
    }
}

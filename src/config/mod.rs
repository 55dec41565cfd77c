// ci-watch: CI job log watcher
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Configuration management for ci-watch.
//!
//! # Configuration Hierarchy
//!
//! ```text
//! Priority (low → high)
//! 1. defaults
//! 2. ci-watch.toml (cwd, optional)
//! 3. --ini FILE (repeatable)
//! 4. CIWATCH_* env vars
//! 5. --set section.key=value
//! 6. CLI flags (--api, --job, REPO)
//! ```
//!
//! # Environment Variable Mapping
//!
//! ```text
//! CIWATCH_API__ENDPOINT=http://localhost  → api.endpoint
//! CIWATCH_WATCH__GRACE_MS=2000            → watch.grace_ms
//! CIWATCH_GIT__REMOTE=origin              → git.remote
//! ```

pub mod loader;
pub mod types;

#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{ConfigError, Result};

use loader::ConfigLoader;
use types::{ApiConfig, GitConfig, GlobalConfig, WatchConfig};

/// Complete application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Logging options.
    pub global: GlobalConfig,
    /// CI API client options.
    pub api: ApiConfig,
    /// Job watch options.
    pub watch: WatchConfig,
    /// Git remote options.
    pub git: GitConfig,
}

impl Config {
    /// Create a new configuration builder.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use ci_watch::config::Config;
    ///
    /// let config = Config::builder()
    ///     .add_toml_file_optional("ci-watch.toml")
    ///     .with_env_prefix("CIWATCH")
    ///     .build()?;
    /// # Ok::<(), anyhow::Error>(())
    /// ```
    #[must_use]
    pub fn builder() -> ConfigLoader {
        ConfigLoader::new()
    }

    /// Load configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the content is not valid TOML or does not match the
    /// `Config` structure.
    pub fn parse(content: &str) -> Result<Self> {
        Self::builder().add_toml_str(content).build()
    }

    /// Check values that deserialize fine but cannot work.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError::InvalidValue` naming the first offending key.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        let invalid = |section: &str, key: &str, message: &str| ConfigError::InvalidValue {
            section: section.to_string(),
            key: key.to_string(),
            message: message.to_string(),
        };

        if self.api.endpoint.is_empty() {
            return Err(invalid("api", "endpoint", "must not be empty"));
        }
        if self.api.timeout_ms == 0 {
            return Err(invalid("api", "timeout_ms", "must be greater than 0"));
        }
        if self.watch.job == 0 {
            return Err(invalid("watch", "job", "job numbers start at 1"));
        }
        if self.watch.poll_interval_ms == 0 {
            return Err(invalid("watch", "poll_interval_ms", "must be greater than 0"));
        }
        if self.git.remote.is_empty() {
            return Err(invalid("git", "remote", "must not be empty"));
        }
        Ok(())
    }

    /// Format configuration options for display, deterministically ordered.
    #[must_use]
    pub fn format_options(&self) -> Vec<String> {
        let mut options = BTreeMap::new();

        options.insert(
            "global.output_log_level",
            self.global.output_log_level.as_u8().to_string(),
        );
        options.insert(
            "global.file_log_level",
            self.global.file_log_level.as_u8().to_string(),
        );
        options.insert(
            "global.log_file",
            self.global
                .log_file
                .as_ref()
                .map_or_else(String::new, |p| p.display().to_string()),
        );

        options.insert("api.endpoint", self.api.endpoint.clone());
        options.insert("api.media_type", self.api.media_type.clone());
        options.insert("api.timeout_ms", self.api.timeout_ms.to_string());
        options.insert("api.retries", self.api.retries.to_string());
        options.insert("api.delay_ms", self.api.delay_ms.to_string());
        options.insert("api.request_limit", self.api.request_limit.to_string());

        options.insert("watch.repo", self.watch.repo.clone().unwrap_or_default());
        options.insert("watch.job", self.watch.job.to_string());
        options.insert("watch.grace_ms", self.watch.grace_ms.to_string());
        options.insert(
            "watch.poll_interval_ms",
            self.watch.poll_interval_ms.to_string(),
        );
        options.insert(
            "watch.build_wait_retries",
            self.watch.build_wait_retries.to_string(),
        );
        options.insert(
            "watch.build_wait_delay_ms",
            self.watch.build_wait_delay_ms.to_string(),
        );
        options.insert(
            "watch.build_wait_timeout_ms",
            self.watch.build_wait_timeout_ms.to_string(),
        );

        options.insert("git.remote", self.git.remote.clone());
        options.insert("git.remote_url_prefix", self.git.remote_url_prefix.clone());
        options.insert("git.branch_prefix", self.git.branch_prefix.clone());
        options.insert("git.timeout_ms", self.git.timeout_ms.to_string());

        let max_key_len = options.keys().map(|k| k.len()).max().unwrap_or(0);

        options
            .into_iter()
            .map(|(key, value)| format!("{key:<max_key_len$} = {value}"))
            .collect()
    }
}

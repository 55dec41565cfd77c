// ci-watch: CI job log watcher
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! CLI arguments for the `watch` command.
//!
//! ```text
//! ci-watch [REPO] [--job N] [--api URL]
//! REPO   → user/repo on the CI provider (else watch.repo, else the git remote)
//! --job  → 1-based job number within the build (watch.job)
//! --api  → CI API endpoint (api.endpoint)
//!
//! USAGE:
//! $ ci-watch
//! $ ci-watch someuser/project --job 2
//! ```

use clap::Args;

/// Arguments for the `watch` command.
#[derive(Debug, Clone, Default, Args)]
pub struct WatchArgs {
    /// Repository on the CI provider, as `user/repo`.
    #[arg(value_name = "REPO")]
    pub repo: Option<String>,

    /// Job number within the build, starting at 1.
    #[arg(short = 'j', long = "job", value_name = "N", value_parser = clap::value_parser!(u64).range(1..))]
    pub job: Option<u64>,

    /// CI API endpoint.
    #[arg(long = "api", value_name = "URL")]
    pub api: Option<String>,
}

impl WatchArgs {
    /// Converts the watch flags to configuration overrides.
    #[must_use]
    pub fn to_config_overrides(&self) -> Vec<String> {
        let mut overrides = Vec::new();
        if let Some(ref repo) = self.repo {
            overrides.push(format!("watch.repo={repo}"));
        }
        if let Some(job) = self.job {
            overrides.push(format!("watch.job={job}"));
        }
        if let Some(ref api) = self.api {
            overrides.push(format!("api.endpoint={api}"));
        }
        overrides
    }
}

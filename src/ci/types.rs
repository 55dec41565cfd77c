// ci-watch: CI job log watcher
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! CI API payloads.
//!
//! ```text
//! GET /repos/{repo}/branches/{branch}  {"branch": Build}
//! GET /jobs/{id}                       {"job": Job}
//! GET /logs/{id}                       {"log": {"body": ".."}}
//! GET /logs/{id}  (chunked=true)       {"log": {"parts": [LogPart, ..]}}
//! ```
//!
//! Only the fields the watcher needs are read; everything else is ignored.

use serde::Deserialize;
use std::fmt;

/// State of a build or job.
///
/// `passed` and `failed` are terminal; everything else means still running.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(from = "Option<String>")]
pub enum JobState {
    Passed,
    Failed,
    Started,
    #[default]
    Unknown,
    Other(String),
}

impl From<Option<String>> for JobState {
    fn from(state: Option<String>) -> Self {
        match state.as_deref() {
            Some("passed") => Self::Passed,
            Some("failed") => Self::Failed,
            Some("started") => Self::Started,
            None | Some("") => Self::Unknown,
            Some(other) => Self::Other(other.to_string()),
        }
    }
}

impl JobState {
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        matches!(self, Self::Passed | Self::Failed)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Started => "started",
            Self::Unknown => "unknown",
            Self::Other(state) => state,
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Latest build on a branch.
#[derive(Debug, Clone, Deserialize)]
pub struct Build {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub state: JobState,
    #[serde(default)]
    pub job_ids: Vec<u64>,
}

impl Build {
    /// Job id for a 1-based job number.
    #[must_use]
    pub fn job_id(&self, number: usize) -> Option<u64> {
        number
            .checked_sub(1)
            .and_then(|index| self.job_ids.get(index))
            .copied()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Job {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub state: JobState,
    pub log_id: u64,
}

/// One numbered piece of a job log, from the chunked fetch or the live feed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawPart")]
pub struct LogPart {
    pub number: u64,
    pub content: String,
    /// Set on the last part the provider sends.
    pub last: bool,
}

impl LogPart {
    #[must_use]
    pub fn new(number: u64, content: impl Into<String>) -> Self {
        Self {
            number,
            content: content.into(),
            last: false,
        }
    }

    #[must_use]
    pub const fn with_final(mut self, last: bool) -> Self {
        self.last = last;
        self
    }
}

/// Wire form: the text is under `_log` on live events and `content` in
/// fetched parts. `_log` wins when both are present.
#[derive(Deserialize)]
struct RawPart {
    number: u64,
    #[serde(default)]
    content: Option<String>,
    #[serde(default, rename = "_log")]
    log: Option<String>,
    #[serde(default, rename = "final")]
    last: Option<bool>,
}

impl From<RawPart> for LogPart {
    fn from(raw: RawPart) -> Self {
        Self {
            number: raw.number,
            content: raw.log.or(raw.content).unwrap_or_default(),
            last: raw.last.unwrap_or(false),
        }
    }
}

/// A fetched job log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogBody {
    /// Whole log of a finished job.
    Buffered { body: String },
    /// Parts available so far.
    Chunked { parts: Vec<LogPart> },
}

// --- response envelopes ---

#[derive(Deserialize)]
pub(super) struct BranchEnvelope {
    pub(super) branch: Build,
}

#[derive(Deserialize)]
pub(super) struct JobEnvelope {
    pub(super) job: Job,
}

#[derive(Deserialize)]
pub(super) struct LogEnvelope {
    pub(super) log: RawLog,
}

#[derive(Deserialize)]
pub(super) struct RawLog {
    #[serde(default)]
    pub(super) body: Option<String>,
    #[serde(default)]
    pub(super) parts: Option<Vec<LogPart>>,
}

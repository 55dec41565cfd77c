// ci-watch: CI job log watcher
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Error handling module.
//!
//! ```text
//!             WatchError (~24 bytes)
//!                     |
//!   +-------+-------+-------+-------+------+------+
//!   |       |       |       |       |      |      |
//!   v       v       v       v       v      v      v
//! Bail     Net    Proc   Proto    Cfg    Git     Io
//! Box<str> Box    Box     Box     Box    Box    Box
//!
//! Sub-errors (unboxed internally):
//!   Network   Transport, BadStatus, TimedOut
//!   Process   ExecutableNotFound, SpawnFailed, NonZeroExit,
//!             Timeout (exit subtype), WaitFailed
//!   Protocol  MalformedBody, UnexpectedShape, BadJobNumber, MissingChunks
//!   Config    ParseError, MissingIdentifier, InvalidValue
//!   Git       Gix, CommandFailed
//!
//! Retryable (contained by net::RetryClient): Transport, BadStatus.
//! All variants boxed => WatchError fits in 24 bytes.
//! ```

use thiserror::Error;

/// Convenience alias for `anyhow::Result`.
pub type Result<T> = anyhow::Result<T>;

/// Result type using [`WatchError`].
pub type WatchResult<T> = std::result::Result<T, WatchError>;

/// Top-level application error type.
///
/// All sub-errors are boxed to keep this enum at ~24 bytes on the stack.
#[derive(Debug, Error)]
pub enum WatchError {
    /// Fatal error that should terminate the application.
    #[error("fatal error: {0}")]
    Bailed(Box<str>),

    /// Network operation failed after the retry budget was spent.
    #[error("network error: {0}")]
    Network(#[from] Box<NetworkError>),

    /// Process execution error.
    #[error("process error: {0}")]
    Process(#[from] Box<ProcessError>),

    /// Remote payload did not have the expected shape.
    #[error("protocol error: {0}")]
    Protocol(#[from] Box<ProtocolError>),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(#[from] Box<ConfigError>),

    /// Git operation failed.
    #[error("git error: {0}")]
    Git(#[from] Box<GitError>),

    /// I/O error.
    #[error("io error: {0}")]
    Io(Box<std::io::Error>),
}

impl WatchError {
    /// Returns the process error if this is one.
    #[must_use]
    pub fn as_process(&self) -> Option<&ProcessError> {
        match self {
            Self::Process(e) => Some(e),
            _ => None,
        }
    }

    /// Returns the network error if this is one.
    #[must_use]
    pub fn as_network(&self) -> Option<&NetworkError> {
        match self {
            Self::Network(e) => Some(e),
            _ => None,
        }
    }
}

/// Create a fatal [`WatchError::Bailed`] that terminates the application.
pub fn bail_out(message: impl Into<String>) -> WatchError {
    WatchError::Bailed(message.into().into_boxed_str())
}

// --- From implementations for boxing ---

/// Macro to generate `From` implementations that box the source error.
macro_rules! impl_from_boxed {
    ($($error:ty => $variant:ident),+ $(,)?) => {
        $(
            impl From<$error> for WatchError {
                fn from(err: $error) -> Self {
                    WatchError::$variant(Box::new(err))
                }
            }
        )+
    };
}

impl_from_boxed! {
    NetworkError => Network,
    ProcessError => Process,
    ProtocolError => Protocol,
    ConfigError => Config,
    GitError => Git,
    std::io::Error => Io,
}

// --- Network Errors ---

/// Network operation errors.
///
/// `Transport` and `BadStatus` are retried by the request client; callers only
/// see them once the retry budget is exhausted.
#[derive(Debug, Error)]
pub enum NetworkError {
    /// Connection, timeout or body read failure.
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Server answered with something other than 200.
    #[error("bad status {status}: {url}")]
    BadStatus { status: u16, url: String },

    /// No response headers within the attempt deadline.
    #[error("no response from {url} within {after_ms} ms")]
    TimedOut { url: String, after_ms: u64 },
}

impl NetworkError {
    /// Status code carried by a `BadStatus` error.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::BadStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns true if the underlying transport error was a timeout.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Transport { source, .. } => source.is_timeout(),
            Self::TimedOut { .. } => true,
            _ => false,
        }
    }
}

// --- Process Errors ---

/// Process execution errors.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// Executable not found in PATH.
    #[error("executable not found: '{name}' (not in PATH)")]
    ExecutableNotFound { name: String },

    /// Failed to spawn process.
    #[error("failed to spawn process '{command}': {source}")]
    SpawnFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Process exited with non-zero status or was signalled from elsewhere.
    #[error("{command} exited with code {}", fmt_code(.code, .signal))]
    NonZeroExit {
        command: String,
        code: Option<i32>,
        signal: Option<i32>,
    },

    /// Process exited after the runner itself terminated it.
    #[error("{command} exceeded execution time of {timeout_ms} ms")]
    Timeout {
        command: String,
        timeout_ms: u64,
        signal: Option<i32>,
    },

    /// Failed while waiting on the process or reading its output.
    #[error("failed to wait for process '{command}': {source}")]
    WaitFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

#[allow(clippy::ref_option)]
fn fmt_code(code: &Option<i32>, signal: &Option<i32>) -> String {
    match (code, signal) {
        (Some(code), _) => code.to_string(),
        (None, Some(signal)) => format!("none (signal {signal})"),
        (None, None) => "none".to_string(),
    }
}

impl ProcessError {
    /// Returns true for the timeout subtype of exit failures.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Exit code, if the process exited normally.
    #[must_use]
    pub const fn code(&self) -> Option<i32> {
        match self {
            Self::NonZeroExit { code, .. } => *code,
            _ => None,
        }
    }

    /// Terminating signal, if any.
    #[must_use]
    pub const fn signal(&self) -> Option<i32> {
        match self {
            Self::NonZeroExit { signal, .. } | Self::Timeout { signal, .. } => *signal,
            _ => None,
        }
    }
}

// --- Protocol Errors ---

/// Malformed or unexpected payloads from the CI API or the log feed.
///
/// Never retried.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Body was not valid JSON for the expected type.
    #[error("malformed response from {url}: {source}")]
    MalformedBody {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// Body parsed but is missing data the caller needs.
    #[error("unexpected response: {0}")]
    UnexpectedShape(String),

    /// Job number is outside the build's job list.
    #[error("bad job number: {number} ({count} jobs)")]
    BadJobNumber { number: usize, count: usize },

    /// The log could not be completed because chunks are still missing.
    #[error("log incomplete: chunks {from}..{to} never arrived")]
    MissingChunks { from: u64, to: u64 },
}

// --- Config Errors ---

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to parse configuration sources.
    #[error("failed to parse config: {message}")]
    ParseError { message: String },

    /// A required identifier could not be determined.
    #[error("can't determine {what}")]
    MissingIdentifier { what: String },

    /// Invalid configuration value.
    #[error("invalid value for '{key}' in section '[{section}]': {message}")]
    InvalidValue {
        section: String,
        key: String,
        message: String,
    },
}

// --- Gix Errors ---

/// Wrapper for gix-specific errors.
#[derive(Debug, Error)]
pub enum GixError {
    /// Failed to discover repository from path.
    #[error("failed to discover repository: {0}")]
    Discover(#[from] Box<gix::discover::Error>),

    /// Failed to resolve HEAD to a commit.
    #[error("failed to resolve HEAD: {0}")]
    HeadId(#[from] Box<gix::reference::head_id::Error>),
}

// --- Git Errors ---

/// Git operation errors.
#[derive(Debug, Error)]
pub enum GitError {
    /// Git command execution failed.
    #[error("git command failed: {command} - {message}")]
    CommandFailed { command: String, message: String },

    /// Error from gix library.
    #[error("gix error: {0}")]
    Gix(#[from] GixError),
}

#[cfg(test)]
mod tests;

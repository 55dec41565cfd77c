// ci-watch: CI job log watcher
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Supervised process spawning.
//!
//! ```text
//! ProcessBuilder::new("git")
//!   .args() .cwd() .env() .timeout() .capture_output() / .quiet()
//!   .run()
//!       --> tokio::process::Command, spawn
//!           reader tasks for piped stdout/stderr
//!           KillTimer: T --> SIGTERM --> 2T --> SIGKILL
//!           wait, timer.cancel()
//!       --> Ok(ProcessOutput { code, signal, stdout, stderr })   exit 0
//!       --> ProcessError::Timeout      killed by us with TERM/KILL
//!       --> ProcessError::NonZeroExit  anything else
//! ```

pub mod builder;
mod io;
mod runner;
mod signal;
pub mod timer;

pub use builder::{ProcessBuilder, ProcessOutput, StreamFlags};
pub use timer::{KillStage, KillTimer};

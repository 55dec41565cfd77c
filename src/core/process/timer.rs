// ci-watch: CI job log watcher
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Escalating kill timer for one child process.
//!
//! ```text
//!            start(Some(T))                 start(None)
//!                 |                              |
//!                 v                              v
//!   Armed(now+T) --fire--> Terminating(+2T) --fire--> Killed
//!       |   SIGTERM              |     SIGKILL
//!       |                        |
//!       +--------cancel()--------+-----> Disarmed <-- Unarmed
//! ```
//!
//! The runner owns the timer and calls `cancel()` on every exit path, so a
//! process that exits early never leaves a pending deadline behind.

use std::time::Duration;
use tokio::process::Child;
use tokio::time::Instant;
use tracing::{debug, warn};

use super::signal;

/// Where a [`KillTimer`] is in its escalation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KillStage {
    /// No timeout configured.
    Unarmed,
    /// Waiting for the timeout; SIGTERM next.
    Armed,
    /// SIGTERM sent; SIGKILL at the next deadline.
    Terminating,
    /// SIGKILL sent.
    Killed,
    /// Cancelled before escalation finished.
    Disarmed,
}

/// Timer-owning kill state for a supervised process.
#[derive(Debug)]
pub struct KillTimer {
    timeout: Duration,
    stage: KillStage,
    deadline: Option<Instant>,
    killed: bool,
}

impl KillTimer {
    /// Arms the timer, or leaves it unarmed when `timeout` is `None`.
    #[must_use]
    pub fn start(timeout: Option<Duration>) -> Self {
        let deadline = timeout.and_then(|t| Instant::now().checked_add(t));
        Self {
            timeout: timeout.unwrap_or_default(),
            stage: if deadline.is_some() {
                KillStage::Armed
            } else {
                KillStage::Unarmed
            },
            deadline,
            killed: false,
        }
    }

    /// The next escalation point, if one is pending.
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    #[must_use]
    pub const fn stage(&self) -> KillStage {
        self.stage
    }

    /// Whether the runner itself started terminating the process.
    #[must_use]
    pub const fn killed(&self) -> bool {
        self.killed
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Escalates one step. Called when [`deadline`](Self::deadline) passes.
    pub fn fire(&mut self, child: &mut Child, name: &str) {
        match self.stage {
            KillStage::Armed => {
                warn!(process = %name, timeout = ?self.timeout, "timed out, sending SIGTERM");
                self.killed = true;
                match signal::terminate(child) {
                    Ok(()) => {
                        self.stage = KillStage::Terminating;
                        self.deadline = Instant::now().checked_add(self.timeout.saturating_mul(2));
                    }
                    Err(e) => {
                        debug!(process = %name, error = %e, "SIGTERM failed, killing");
                        self.force_kill(child, name);
                    }
                }
            }
            KillStage::Terminating => {
                warn!(process = %name, "still running after SIGTERM, sending SIGKILL");
                self.force_kill(child, name);
            }
            KillStage::Unarmed | KillStage::Killed | KillStage::Disarmed => {
                self.deadline = None;
            }
        }
    }

    /// Drops any pending deadline. Safe to call more than once.
    pub fn cancel(&mut self) {
        self.deadline = None;
        if matches!(self.stage, KillStage::Armed | KillStage::Terminating) {
            self.stage = KillStage::Disarmed;
        }
    }

    fn force_kill(&mut self, child: &mut Child, name: &str) {
        if let Err(e) = child.start_kill() {
            debug!(process = %name, error = %e, "kill failed");
        }
        self.stage = KillStage::Killed;
        self.deadline = None;
    }
}

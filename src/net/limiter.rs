// ci-watch: CI job log watcher
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Admission limiter for concurrent HTTP requests.
//!
//! ```text
//! AdmissionLimiter (Clone, shared)
//!   limit = 0        --> acquire() returns None immediately
//!   limit = n        --> Arc<Semaphore>(n), acquire() waits for a slot
//!   set_limit(m)     --> swap in a fresh Semaphore(m)
//!                        permits already handed out keep the old one alive
//! ```

use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::debug;

#[derive(Debug)]
struct Gate {
    limit: usize,
    semaphore: Arc<Semaphore>,
}

/// Caps the number of logical requests in flight across every client sharing it.
///
/// Constructed once at startup and handed to each [`RetryClient`](super::RetryClient);
/// tests build their own.
#[derive(Debug, Clone, Default)]
pub struct AdmissionLimiter {
    gate: Arc<RwLock<Option<Gate>>>,
}

/// Slot held for the duration of one logical request.
#[derive(Debug)]
pub struct AdmissionPermit {
    _permit: OwnedSemaphorePermit,
}

impl AdmissionLimiter {
    /// A limiter that admits everything.
    #[must_use]
    pub fn unlimited() -> Self {
        Self::default()
    }

    /// A limiter admitting at most `limit` requests at once (0 = unlimited).
    #[must_use]
    pub fn new(limit: usize) -> Self {
        let limiter = Self::default();
        limiter.set_limit(limit);
        limiter
    }

    /// Change the limit. Rebuilds the gate only if the value actually changed.
    pub fn set_limit(&self, limit: usize) {
        let mut gate = self.gate.write().unwrap_or_else(PoisonError::into_inner);
        if gate.as_ref().map_or(0, |g| g.limit) == limit {
            return;
        }
        debug!(limit, "request limit changed");
        *gate = (limit > 0).then(|| Gate {
            limit,
            semaphore: Arc::new(Semaphore::new(limit)),
        });
    }

    /// Current limit, `None` when unlimited.
    #[must_use]
    pub fn limit(&self) -> Option<usize> {
        self.gate
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|g| g.limit)
    }

    /// Free slots in the current gate, `None` when unlimited.
    #[must_use]
    pub fn available(&self) -> Option<usize> {
        self.gate
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|g| g.semaphore.available_permits())
    }

    /// Wait for a slot. Returns `None` when no limit is configured.
    pub async fn acquire(&self) -> Option<AdmissionPermit> {
        let semaphore = {
            let gate = self.gate.read().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(&gate.as_ref()?.semaphore)
        };
        // the semaphore is never closed
        semaphore
            .acquire_owned()
            .await
            .ok()
            .map(|permit| AdmissionPermit { _permit: permit })
    }
}

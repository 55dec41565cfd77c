// ci-watch: CI job log watcher
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Follow loop: one owner for the assembly, two producers.
//!
//! ```text
//!                 select! (single owner of LogAssembly)
//!   +---------------------+----------------------+-------------------+
//!   | subscription.recv() | catch-up fetch       | grace deadline    |
//!   |  Subscribed: start  |  (started once, on   |  seal(): empty    |
//!   |   the fetch         |   Subscribed)        |  placeholder at   |
//!   |  Chunk: apply       |  parts: apply each   |  final_index      |
//!   |  Finished: drain    |                      |                   |
//!   +---------------------+----------------------+-------------------+
//!
//! apply(part):  part.final --> last(number + 1);  add(number, content)
//!               final known and missing --> arm grace deadline
//!
//! done: complete, or feed drained/closed with the fetch settled (a pending
//!       grace deadline is cut short by seal())
//! ```

use futures_util::FutureExt;
use futures_util::future::{Fuse, FusedFuture};
use std::future::Future;
use std::io::Write;
use std::pin::pin;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

use super::assembly::LogAssembly;
use super::feed::{ChannelState, FeedEvent, Subscription};
use crate::ci::LogPart;
use crate::error::{ProtocolError, WatchResult};

/// How the follow loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TailOutcome {
    /// Every chunk up to the final index was written.
    Complete,
    /// The feed ended before a final chunk was ever announced.
    Unterminated,
}

/// Follows a live job log until it is complete or the feed is done.
#[derive(Debug)]
pub struct LogTail {
    grace: Duration,
    state: ChannelState,
    grace_at: Option<Instant>,
}

impl LogTail {
    #[must_use]
    pub const fn new(grace: Duration) -> Self {
        Self {
            grace,
            state: ChannelState::Subscribing,
            grace_at: None,
        }
    }

    /// Drives `assembly` from `subscription` and the catch-up fetch.
    ///
    /// `catch_up` is started once, when the subscription reports
    /// `Subscribed`, so no chunk falls between the fetch and the feed.
    ///
    /// # Errors
    ///
    /// - The catch-up fetch error, if it fails.
    /// - A sink write error.
    /// - `ProtocolError::MissingChunks` if the feed ended with a known final
    ///   index and interior chunks still missing.
    pub async fn follow<W, F, Fut>(
        mut self,
        assembly: &mut LogAssembly<W>,
        subscription: Subscription,
        catch_up: F,
    ) -> WatchResult<TailOutcome>
    where
        W: Write,
        F: FnOnce() -> Fut,
        Fut: Future<Output = WatchResult<Vec<LogPart>>>,
    {
        let mut catch_up = Some(catch_up);
        let mut fetch = pin!(Fuse::<Fut>::terminated());
        let mut fetching = false;

        loop {
            if assembly.is_complete() {
                debug!(channel = %subscription.channel(), "log complete");
                return Ok(TailOutcome::Complete);
            }
            if self.is_drained() && !fetching {
                return Self::finish(assembly);
            }

            tokio::select! {
                event = subscription.recv(), if self.state != ChannelState::Closed => {
                    let event = event.unwrap_or(FeedEvent::Unsubscribed);
                    let previous = self.state;
                    self.state = self.state.on(&event);
                    if previous != self.state {
                        debug!(channel = %subscription.channel(), state = ?self.state, "feed state");
                    }

                    match event {
                        FeedEvent::Subscribed => {
                            if let Some(start) = catch_up.take() {
                                fetch.set(start().fuse());
                                fetching = true;
                            }
                        }
                        FeedEvent::Chunk(part) if self.state.accepts_chunks() => {
                            self.apply(assembly, part)?;
                        }
                        FeedEvent::Chunk(_) | FeedEvent::Finished | FeedEvent::Unsubscribed => {}
                    }
                }
                parts = &mut fetch, if !fetch.is_terminated() => {
                    fetching = false;
                    let parts = parts?;
                    trace!(parts = parts.len(), "catch-up fetch done");
                    for part in parts {
                        self.apply(assembly, part)?;
                    }
                }
                () = expire(self.grace_at) => {
                    self.grace_at = None;
                    info!(final_index = ?assembly.final_index(), "final chunk did not arrive in time");
                    assembly.seal()?;
                }
            }
        }
    }

    fn is_drained(&self) -> bool {
        matches!(self.state, ChannelState::Draining | ChannelState::Closed)
    }

    fn apply<W: Write>(&mut self, assembly: &mut LogAssembly<W>, part: LogPart) -> WatchResult<()> {
        trace!(number = part.number, last = part.last, "chunk");
        if part.last {
            // the provider flags the part before the real end
            assembly.last(part.number + 1);
        }
        let complete = assembly.add(part.number, part.content)?;

        if !complete
            && self.grace_at.is_none()
            && let Some(final_index) = assembly.final_index()
            && !assembly.has(final_index)
        {
            debug!(final_index, grace = ?self.grace, "waiting for final chunk");
            self.grace_at = Instant::now().checked_add(self.grace);
        }
        Ok(())
    }

    fn finish<W: Write>(assembly: &mut LogAssembly<W>) -> WatchResult<TailOutcome> {
        let Some(final_index) = assembly.final_index() else {
            warn!(next = assembly.next(), "feed ended without a final chunk");
            return Ok(TailOutcome::Unterminated);
        };
        if assembly.seal()? {
            return Ok(TailOutcome::Complete);
        }
        Err(ProtocolError::MissingChunks {
            from: assembly.next(),
            to: final_index,
        }
        .into())
    }
}

async fn expire(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

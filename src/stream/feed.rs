// ci-watch: CI job log watcher
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Live log feed: subscription events and the transports producing them.
//!
//! ```text
//!               Subscribed          Finished           Unsubscribed
//! Subscribing ------------> Active ----------> Draining ------------> Closed
//!      |                      |                   |
//!      +------- Chunk --------+------ Chunk ------+   (applied, no transition)
//!      +------------------ Unsubscribed ----------------------------> Closed
//! ```
//!
//! A [`LogFeed`] hands out a [`Subscription`]: a `flume` receiver of
//! [`FeedEvent`]s plus a cancellation token. Dropping the subscription
//! unsubscribes.

use std::collections::BTreeSet;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::ci::{CiClient, LogBody, LogPart};
use crate::error::WatchResult;

/// Channel name of a job's live log.
#[must_use]
pub fn channel_name(job_id: u64) -> String {
    format!("job-{job_id}")
}

/// Something that happened on a subscribed channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedEvent {
    /// The subscription is live; chunks sent from now on will be delivered.
    Subscribed,
    Chunk(LogPart),
    /// The job finished.
    Finished,
    /// The transport closed the channel.
    Unsubscribed,
}

/// Lifecycle of a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Subscribing,
    Active,
    Draining,
    Closed,
}

impl ChannelState {
    /// State after `event`.
    #[must_use]
    pub const fn on(self, event: &FeedEvent) -> Self {
        match (self, event) {
            (Self::Closed, _) | (_, FeedEvent::Unsubscribed) => Self::Closed,
            (Self::Subscribing, FeedEvent::Subscribed) => Self::Active,
            (Self::Subscribing | Self::Active, FeedEvent::Finished) => Self::Draining,
            (state, _) => state,
        }
    }

    /// Whether chunk events are still expected to be applied.
    #[must_use]
    pub const fn accepts_chunks(self) -> bool {
        !matches!(self, Self::Closed)
    }
}

/// A live subscription. Dropping it cancels the transport side.
#[derive(Debug)]
pub struct Subscription {
    channel: String,
    events: flume::Receiver<FeedEvent>,
    cancel: CancellationToken,
}

impl Subscription {
    #[must_use]
    pub fn new(
        channel: impl Into<String>,
        events: flume::Receiver<FeedEvent>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            channel: channel.into(),
            events,
            cancel,
        }
    }

    #[must_use]
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Next event, or `None` once the transport side is gone.
    pub async fn recv(&self) -> Option<FeedEvent> {
        self.events.recv_async().await.ok()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        trace!(channel = %self.channel, "unsubscribe");
        self.cancel.cancel();
    }
}

/// Push/subscribe transport for live job logs.
pub trait LogFeed: Send + Sync {
    /// Subscribe to the live log of `job_id`.
    fn subscribe(&self, job_id: u64) -> impl Future<Output = WatchResult<Subscription>> + Send;
}

/// [`LogFeed`] that re-fetches the chunked log at a fixed interval.
///
/// Sends `Subscribed` at once, then every part not seen before as a
/// `Chunk`, and `Finished` after the poll that saw the job in a terminal
/// state. Poll errors are logged and retried on the next tick.
#[derive(Debug, Clone)]
pub struct PollingFeed {
    client: CiClient,
    interval: Duration,
}

impl PollingFeed {
    #[must_use]
    pub const fn new(client: CiClient, interval: Duration) -> Self {
        Self { client, interval }
    }
}

impl LogFeed for PollingFeed {
    async fn subscribe(&self, job_id: u64) -> WatchResult<Subscription> {
        let channel = channel_name(job_id);
        let (tx, rx) = flume::unbounded();
        let cancel = CancellationToken::new();

        let poller = Poller {
            client: self.client.clone(),
            interval: self.interval,
            job_id,
            tx,
            cancel: cancel.clone(),
        };
        tokio::spawn(poller.run());

        debug!(channel = %channel, interval = ?self.interval, "subscribed (polling)");
        Ok(Subscription::new(channel, rx, cancel))
    }
}

struct Poller {
    client: CiClient,
    interval: Duration,
    job_id: u64,
    tx: flume::Sender<FeedEvent>,
    cancel: CancellationToken,
}

impl Poller {
    async fn run(self) {
        let mut seen = BTreeSet::new();
        if self.tx.send(FeedEvent::Subscribed).is_err() {
            return;
        }

        loop {
            tokio::select! {
                () = self.cancel.cancelled() => return,
                () = tokio::time::sleep(self.interval) => {}
            }

            match self.poll(&mut seen).await {
                Ok(true) => {
                    let _ = self.tx.send(FeedEvent::Finished);
                    break;
                }
                Ok(false) => {}
                Err(PollError::Closed) => return,
                Err(PollError::Watch(e)) => {
                    warn!(job = self.job_id, error = %e, "log poll failed");
                }
            }
        }

        let _ = self.tx.send(FeedEvent::Unsubscribed);
    }

    /// One poll. Returns whether the job has finished.
    async fn poll(&self, seen: &mut BTreeSet<u64>) -> Result<bool, PollError> {
        // job state first: a finished job's log fetched afterwards is whole
        let job = self.client.get_job(self.job_id).await?;
        let LogBody::Chunked { parts } = self.client.get_log(job.log_id, true).await? else {
            return Ok(job.state.is_finished());
        };

        for part in parts {
            if seen.insert(part.number) {
                self.tx
                    .send(FeedEvent::Chunk(part))
                    .map_err(|_| PollError::Closed)?;
            }
        }
        Ok(job.state.is_finished())
    }
}

enum PollError {
    /// Subscriber went away.
    Closed,
    Watch(crate::error::WatchError),
}

impl From<crate::error::WatchError> for PollError {
    fn from(e: crate::error::WatchError) -> Self {
        Self::Watch(e)
    }
}

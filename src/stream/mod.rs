// ci-watch: CI job log watcher
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Ordered log reassembly from a bulk fetch racing a live feed.
//!
//! ```text
//!   ci::CiClient::get_log(chunked)      LogFeed::subscribe(job)
//!              |                               |
//!              v                               v
//!          Vec<LogPart>               Subscription (flume events)
//!               \                             /
//!                +------> tail::LogTail <----+
//!                              |
//!                              v
//!                   assembly::LogAssembly --> stdout
//! ```

pub mod assembly;
pub mod feed;
pub mod tail;


pub use assembly::LogAssembly;
pub use feed::{ChannelState, FeedEvent, LogFeed, PollingFeed, Subscription};
pub use tail::{LogTail, TailOutcome};

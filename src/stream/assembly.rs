// ci-watch: CI job log watcher
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Ordered reassembly of numbered log chunks.
//!
//! ```text
//! add(3,c)  add(1,a)        add(2,b)           last(3)
//!   |         |               |                  |
//!   v         v               v                  v
//! {3:c}    emit a, next=2   emit b, c, next=4   final=3, next>final
//!                                                --> complete, signal fires
//! ```
//!
//! Chunks are kept sparse until they can be written. A chunk is written
//! exactly once, in index order, and only after every lower index.

use std::collections::BTreeMap;
use std::io::{self, Write};
use tokio::sync::oneshot;
use tracing::{debug, trace, warn};

/// Reassembles a log from chunks arriving in any order and writes it to `W`.
#[derive(Debug)]
pub struct LogAssembly<W: Write> {
    /// Received but not yet written
    chunks: BTreeMap<u64, String>,
    /// Lowest index not yet written
    next: u64,
    final_index: Option<u64>,
    sink: W,
    signal: Option<oneshot::Sender<()>>,
    receiver: Option<oneshot::Receiver<()>>,
}

impl<W: Write> LogAssembly<W> {
    pub fn new(sink: W) -> Self {
        let (signal, receiver) = oneshot::channel();
        Self {
            chunks: BTreeMap::new(),
            next: 1,
            final_index: None,
            sink,
            signal: Some(signal),
            receiver: Some(receiver),
        }
    }

    /// Records chunk `index` and writes out everything that became contiguous.
    ///
    /// A chunk that was already written is ignored; a pending one is
    /// overwritten. Returns whether the log is complete.
    ///
    /// # Errors
    ///
    /// Returns the sink's write error.
    pub fn add(&mut self, index: u64, payload: impl Into<String>) -> io::Result<bool> {
        if index == 0 {
            warn!("ignoring log chunk 0");
            return Ok(self.is_complete());
        }
        if index < self.next {
            trace!(index, "duplicate chunk");
            return Ok(self.is_complete());
        }
        self.chunks.insert(index, payload.into());
        self.advance()?;
        Ok(self.check_complete())
    }

    /// Whether chunk `index` has been received (written or pending).
    #[must_use]
    pub fn has(&self, index: u64) -> bool {
        (1..self.next).contains(&index) || self.chunks.contains_key(&index)
    }

    /// Declares the index of the last chunk. Returns whether the log is complete.
    ///
    /// The first declaration wins; a later, different one is logged and ignored.
    pub fn last(&mut self, final_index: u64) -> bool {
        match self.final_index {
            None => {
                debug!(final_index, "final chunk declared");
                self.final_index = Some(final_index);
            }
            Some(current) if current != final_index => {
                warn!(current, ignored = final_index, "conflicting final chunk index");
            }
            Some(_) => {}
        }
        self.check_complete()
    }

    /// Fills in the trailing chunk with an empty placeholder if it never
    /// arrived. Returns whether the log is now complete.
    ///
    /// # Errors
    ///
    /// Returns the sink's write error.
    pub fn seal(&mut self) -> io::Result<bool> {
        let Some(final_index) = self.final_index else {
            return Ok(false);
        };
        if !self.has(final_index) {
            debug!(final_index, "final chunk missing, adding placeholder");
            return self.add(final_index, String::new());
        }
        Ok(self.is_complete())
    }

    #[must_use]
    pub const fn is_complete(&self) -> bool {
        match self.final_index {
            Some(final_index) => self.next > final_index,
            None => false,
        }
    }

    /// One-shot receiver that resolves when the log becomes complete.
    ///
    /// Only the first call gets the receiver.
    pub fn completion(&mut self) -> Option<oneshot::Receiver<()>> {
        self.receiver.take()
    }

    /// Lowest index not yet written.
    #[must_use]
    pub const fn next(&self) -> u64 {
        self.next
    }

    #[must_use]
    pub const fn final_index(&self) -> Option<u64> {
        self.final_index
    }

    /// Number of chunks received but not yet written.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.chunks.len()
    }

    pub fn into_inner(self) -> W {
        self.sink
    }

    fn advance(&mut self) -> io::Result<()> {
        let start = self.next;
        while let Some(payload) = self.chunks.remove(&self.next) {
            self.sink.write_all(payload.as_bytes())?;
            self.next += 1;
        }
        if self.next != start {
            self.sink.flush()?;
        }
        Ok(())
    }

    fn check_complete(&mut self) -> bool {
        let complete = self.is_complete();
        if complete && let Some(signal) = self.signal.take() {
            trace!(next = self.next, "log complete");
            // receiver may be gone
            let _ = signal.send(());
        }
        complete
    }
}

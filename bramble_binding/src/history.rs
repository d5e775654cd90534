// Copyright 2026 the Bramble Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bounded delivery log for debugging and inspection.

use std::collections::VecDeque;

use serde::Serialize;

use crate::identity::BindingToken;
use crate::types::ListenerOptions;

/// Default number of entries kept by [`EventLog`].
pub const DEFAULT_LOG_CAPACITY: usize = 100;

/// One recorded delivery.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventLogEntry {
    /// When the triggering event occurred, in host milliseconds.
    pub timestamp: u64,
    /// Event type that triggered the delivery.
    pub event_type: String,
    /// Identity of the element whose binding fired.
    pub target: BindingToken,
    /// Type of the action that was dispatched.
    pub action: String,
    /// Options of the binding that fired.
    pub options: ListenerOptions,
}

/// Fixed-capacity ring of recent deliveries, oldest evicted first.
///
/// Readers get a copy of the entries, never a live view, so inspection can
/// never be invalidated by later deliveries.
#[derive(Debug, Clone)]
pub struct EventLog {
    entries: VecDeque<EventLogEntry>,
    capacity: usize,
}

impl Default for EventLog {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_LOG_CAPACITY)
    }
}

impl EventLog {
    /// Creates a log keeping at most `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends an entry, evicting the oldest when full.
    pub fn push(&mut self, entry: EventLogEntry) {
        if self.capacity == 0 {
            return;
        }
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    /// A copy of the retained entries, oldest first.
    pub fn snapshot(&self) -> Vec<EventLogEntry> {
        self.entries.iter().cloned().collect()
    }

    /// Number of retained entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the log holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::TokenMint;

    fn entry(timestamp: u64, token: BindingToken) -> EventLogEntry {
        EventLogEntry {
            timestamp,
            event_type: "click".into(),
            target: token,
            action: "INCREMENT".into(),
            options: ListenerOptions::empty(),
        }
    }

    #[test]
    fn oldest_entries_are_evicted_at_capacity() {
        let mut mint: TokenMint<u32> = TokenMint::new();
        let token = mint.token_for(1);
        let mut log = EventLog::with_capacity(3);
        for t in 0..5 {
            log.push(entry(t, token));
        }
        let kept: Vec<u64> = log.snapshot().iter().map(|e| e.timestamp).collect();
        assert_eq!(kept, vec![2, 3, 4]);
        assert_eq!(log.len(), 3);
    }

    #[test]
    fn snapshot_is_a_copy() {
        let mut mint: TokenMint<u32> = TokenMint::new();
        let token = mint.token_for(1);
        let mut log = EventLog::with_capacity(2);
        log.push(entry(0, token));
        let mut snap = log.snapshot();
        snap.clear();
        assert_eq!(log.len(), 1);
    }
}

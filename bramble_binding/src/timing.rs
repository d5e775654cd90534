// Copyright 2026 the Bramble Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Timestamp-driven rate limiting gates.
//!
//! Both gates are pure state machines over caller-supplied millisecond
//! timestamps. Nothing here sleeps or schedules: a debounced delivery
//! matures when some later call observes a timestamp at or past the
//! deadline. The host drives that with whatever tick source it has.
//!
//! - [`DebounceGate`] is trailing-edge: every observation pushes the
//!   deadline out to `now + wait`, and the gate fires once when polled at
//!   or after the final deadline.
//! - [`ThrottleGate`] is leading-edge: the first admission opens a window
//!   of `wait` ms during which further admissions are refused.

/// Trailing-edge debounce.
///
/// # Example
///
/// ```rust
/// use bramble_binding::DebounceGate;
///
/// let mut gate = DebounceGate::new(100);
/// gate.observe(0);
/// gate.observe(10);
/// assert!(!gate.poll(109)); // deadline is 10 + 100
/// assert!(gate.poll(110));
/// assert!(!gate.poll(200)); // fired, nothing pending
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebounceGate {
    wait_ms: u64,
    deadline: Option<u64>,
}

impl DebounceGate {
    /// Creates a gate with the given quiet window.
    pub fn new(wait_ms: u64) -> Self {
        Self {
            wait_ms,
            deadline: None,
        }
    }

    /// Records an occurrence, resetting the deadline to `now + wait`.
    pub fn observe(&mut self, now_ms: u64) {
        self.deadline = Some(now_ms.saturating_add(self.wait_ms));
    }

    /// Returns `true` exactly once, when polled at or after a pending
    /// deadline. Clears the pending state on fire.
    pub fn poll(&mut self, now_ms: u64) -> bool {
        match self.deadline {
            Some(deadline) if now_ms >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// Whether an occurrence is waiting to fire.
    pub fn pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// The pending deadline, if any.
    pub fn deadline(&self) -> Option<u64> {
        self.deadline
    }
}

/// Leading-edge throttle.
///
/// # Example
///
/// ```rust
/// use bramble_binding::ThrottleGate;
///
/// let mut gate = ThrottleGate::new(100);
/// assert!(gate.admit(0));
/// assert!(!gate.admit(50));
/// assert!(gate.admit(100)); // window end is inclusive of re-arming
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrottleGate {
    wait_ms: u64,
    window_end: Option<u64>,
}

impl ThrottleGate {
    /// Creates a gate with the given window length.
    pub fn new(wait_ms: u64) -> Self {
        Self {
            wait_ms,
            window_end: None,
        }
    }

    /// Admits the occurrence if no window is open, opening a new window.
    /// Occurrences inside an open window are refused and dropped.
    pub fn admit(&mut self, now_ms: u64) -> bool {
        if let Some(end) = self.window_end
            && now_ms < end
        {
            return false;
        }
        self.window_end = Some(now_ms.saturating_add(self.wait_ms));
        true
    }
}

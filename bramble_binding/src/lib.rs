// Copyright 2026 the Bramble Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bramble Binding: per-element event bindings with deterministic timing.
//!
//! This crate keeps track of which declarative event handlers are attached
//! to which elements and turns incoming platform events into actions.
//!
//! - Register and unregister [`EventHandlerSpec`]s per element key.
//! - Deliver events with [`EventRegistry::handle_event`]; matching bindings
//!   resolve to [`ActionSpec`](bramble_action::ActionSpec)s and flow out
//!   through an [`EventSink`].
//! - Rate-limit per binding: trailing-edge debounce and leading-edge
//!   throttle, decided purely from event timestamps and an explicit
//!   [`EventRegistry::poll`] tick. No timers, no hidden clock.
//! - Inspect recent deliveries through a bounded [`EventLog`].
//!
//! The registry is platform-agnostic: elements are any `Copy + Eq + Hash`
//! key the host chooses, and events are [`Event`] values the host
//! constructs from whatever it observes. Listener flags that only the
//! platform can act on (`preventDefault`, `stopPropagation`) are reported
//! back through a [`Disposition`] instead of being swallowed.
//!
//! # Example
//!
//! ```rust
//! use bramble_action::ActionSpec;
//! use bramble_binding::{Event, EventHandlerSpec, EventRegistry};
//!
//! let mut registry: EventRegistry<u32> = EventRegistry::new();
//!
//! // Debounce a text input: only the last keystroke of a burst counts.
//! let mut spec = EventHandlerSpec::new("input", ActionSpec::new("QUERY_CHANGED"));
//! spec.debounce = Some(100);
//! registry.register_event(42, spec);
//!
//! let mut dispatched = Vec::new();
//! let mut sink = |action: ActionSpec, _: &Event| dispatched.push(action.action_type);
//!
//! registry.handle_event(&42, &Event::new("input", 0), &mut sink);
//! registry.handle_event(&42, &Event::new("input", 30), &mut sink);
//!
//! // Nothing fired yet; the quiet window ends 100ms after the last
//! // occurrence, so the burst collapses to a single action.
//! registry.poll(130, &mut sink);
//! assert_eq!(dispatched, ["QUERY_CHANGED"]);
//! ```

mod history;
mod identity;
mod registry;
mod timing;
mod types;

pub use history::{DEFAULT_LOG_CAPACITY, EventLog, EventLogEntry};
pub use identity::{BindingToken, TokenMint};
pub use registry::EventRegistry;
pub use timing::{DebounceGate, ThrottleGate};
pub use types::{
    Disposition, Event, EventHandlerSpec, EventSink, HandlerRef, ListenerOptions, Phase,
};

/// Log target for all diagnostics emitted by this crate.
pub const LOG_TARGET: &str = "bramble::binding";

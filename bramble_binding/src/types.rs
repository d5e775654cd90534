// Copyright 2026 the Bramble Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Declarative binding surface types and the dispatch seam.

use bitflags::bitflags;
use bramble_action::ActionSpec;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A platform event as fed in by the host.
///
/// The runtime never talks to a windowing system or a document model
/// directly. The host observes whatever platform it runs on and hands each
/// occurrence over as an `Event` with a monotonic millisecond timestamp.
/// All timing decisions (debounce, throttle) are made against that
/// timestamp, which keeps delivery fully deterministic and testable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Event type name, e.g. `"click"` or `"input"`.
    #[serde(rename = "type")]
    pub event_type: String,
    /// Milliseconds on the host's monotonic clock.
    #[serde(rename = "timestamp")]
    pub timestamp_ms: u64,
    /// Optional platform detail (key code, input value, pointer position).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

impl Event {
    /// Creates an event with no payload.
    pub fn new(event_type: impl Into<String>, timestamp_ms: u64) -> Self {
        Self {
            event_type: event_type.into(),
            timestamp_ms,
            payload: None,
        }
    }

    /// Attaches platform detail.
    #[must_use]
    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }
}

/// What a binding does when its event fires.
///
/// In the declarative wire format a handler is either a full action object
/// or a bare string. The bare string is shorthand for an action whose type
/// is the string itself, resolved at dispatch time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HandlerRef {
    /// A complete action description.
    Action(ActionSpec),
    /// A bare name, resolved per the shorthand rules.
    Name(String),
}

impl HandlerRef {
    /// Resolves this reference to a dispatchable action.
    ///
    /// `Name` resolves to an action whose type is the name itself; richer
    /// name resolution (call shorthand, function registries) happens in the
    /// host layer before a binding reaches a registry.
    pub fn resolve(&self) -> ActionSpec {
        match self {
            Self::Action(action) => action.clone(),
            Self::Name(name) => ActionSpec::new(name.clone()),
        }
    }
}

impl From<ActionSpec> for HandlerRef {
    fn from(action: ActionSpec) -> Self {
        Self::Action(action)
    }
}

impl From<&str> for HandlerRef {
    fn from(name: &str) -> Self {
        Self::Name(name.to_owned())
    }
}

/// One declarative event binding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventHandlerSpec {
    /// Event type this binding listens for.
    #[serde(rename = "event")]
    pub event_type: String,
    /// What to do when the event fires.
    pub handler: HandlerRef,
    /// Suppress the platform default for this event.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub prevent_default: bool,
    /// Stop the event from propagating further.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub stop_propagation: bool,
    /// Run during the capture phase instead of the bubble phase.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub capture: bool,
    /// Listener promises not to prevent the default.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub passive: bool,
    /// Remove the binding after its first delivery.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub once: bool,
    /// Trailing-edge debounce window in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debounce: Option<u64>,
    /// Leading-edge throttle window in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub throttle: Option<u64>,
}

impl EventHandlerSpec {
    /// Creates a plain binding with default options.
    pub fn new(event_type: impl Into<String>, handler: impl Into<HandlerRef>) -> Self {
        Self {
            event_type: event_type.into(),
            handler: handler.into(),
            prevent_default: false,
            stop_propagation: false,
            capture: false,
            passive: false,
            once: false,
            debounce: None,
            throttle: None,
        }
    }

    /// The listener options as a flag set.
    pub fn options(&self) -> ListenerOptions {
        let mut options = ListenerOptions::empty();
        options.set(ListenerOptions::CAPTURE, self.capture);
        options.set(ListenerOptions::PASSIVE, self.passive);
        options.set(ListenerOptions::ONCE, self.once);
        options
    }
}

bitflags! {
    /// Listener registration options.
    ///
    /// Two registrations of the same event type on the same element are
    /// considered duplicates only when their options match as well.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ListenerOptions: u8 {
        /// Deliver during the capture phase.
        const CAPTURE = 1 << 0;
        /// Listener will not prevent the platform default.
        const PASSIVE = 1 << 1;
        /// Remove after first delivery.
        const ONCE = 1 << 2;
    }
}

impl Serialize for ListenerOptions {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        bitflags::serde::serialize(self, serializer)
    }
}

impl<'de> Deserialize<'de> for ListenerOptions {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        bitflags::serde::deserialize(deserializer)
    }
}

/// Propagation phase a delivery is restricted to.
///
/// Plain per-element delivery runs both kinds of binding; a delegating
/// walker delivers each node twice, once per phase, so that every capture
/// binding on the path runs before any bubble binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Outermost to innermost; only `capture: true` bindings run.
    Capture,
    /// Innermost to outermost; only `capture: false` bindings run.
    Bubble,
}

/// Outcome of delivering one event, reported back to the host.
///
/// The runtime has no handle on the platform, so it cannot actually cancel
/// a default or halt native propagation. It records the requests here and
/// the host applies them to the real platform event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Disposition {
    /// A non-passive binding asked to suppress the platform default.
    pub default_prevented: bool,
    /// A binding asked to stop propagation.
    pub propagation_stopped: bool,
    /// Number of actions handed to the sink.
    pub dispatched: usize,
}

impl Disposition {
    /// Folds another disposition into this one.
    pub fn absorb(&mut self, other: Self) {
        self.default_prevented |= other.default_prevented;
        self.propagation_stopped |= other.propagation_stopped;
        self.dispatched += other.dispatched;
    }
}

/// Receiver for actions produced by event delivery.
///
/// This is the seam between event machinery and state machinery: the
/// registry and the delegation tree decide *which* actions fire, the sink
/// (typically a closure over a dispatcher) decides what happens to them.
pub trait EventSink {
    /// Accepts one action together with the event that produced it.
    fn dispatch(&mut self, action: ActionSpec, event: &Event);
}

impl<F: FnMut(ActionSpec, &Event)> EventSink for F {
    fn dispatch(&mut self, action: ActionSpec, event: &Event) {
        self(action, event);
    }
}

// Copyright 2026 the Bramble Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The per-element event binding registry.

use core::hash::Hash;

use hashbrown::HashMap;
use smallvec::SmallVec;
use tracing::{debug, warn};

use bramble_action::ActionSpec;

use crate::LOG_TARGET;
use crate::history::{EventLog, EventLogEntry};
use crate::identity::{BindingToken, TokenMint};
use crate::timing::{DebounceGate, ThrottleGate};
use crate::types::{Disposition, Event, EventHandlerSpec, EventSink, Phase};

/// One live registration and its rate-limiting state.
#[derive(Debug, Clone)]
struct Registration {
    spec: EventHandlerSpec,
    debounce: Option<DebounceGate>,
    throttle: Option<ThrottleGate>,
    /// Latest action held back by the debounce gate.
    pending: Option<PendingDispatch>,
    /// Set once the binding has actually dispatched, for `once` removal.
    fired: bool,
}

#[derive(Debug, Clone)]
struct PendingDispatch {
    action: ActionSpec,
    event: Event,
}

/// Most elements carry one or two bindings; keep those inline.
#[derive(Debug, Clone)]
struct ElementBindings {
    token: BindingToken,
    registrations: SmallVec<[Registration; 2]>,
}

/// Tracks which bindings exist on which elements and delivers events to
/// them.
///
/// `K` is the host's element key: any copyable, hashable identifier (a slot
/// index, a widget id, a node handle). The registry owns no callbacks; each
/// delivery resolves the matching bindings to actions and hands them to the
/// caller's [`EventSink`].
///
/// Debounce and throttle state lives inside the registration record, so
/// unregistering an element structurally cancels anything it had pending.
///
/// # Example
///
/// ```rust
/// use bramble_action::ActionSpec;
/// use bramble_binding::{Event, EventHandlerSpec, EventRegistry};
///
/// let mut registry: EventRegistry<u32> = EventRegistry::new();
/// registry.register_event(
///     7,
///     EventHandlerSpec::new("click", ActionSpec::new("ITEM_SELECTED")),
/// );
///
/// let mut seen = Vec::new();
/// registry.handle_event(&7, &Event::new("click", 0), &mut |action: ActionSpec, _: &Event| {
///     seen.push(action.action_type);
/// });
/// assert_eq!(seen, ["ITEM_SELECTED"]);
/// ```
#[derive(Debug)]
pub struct EventRegistry<K> {
    bindings: HashMap<K, ElementBindings>,
    tokens: TokenMint<K>,
    log: EventLog,
    debug: bool,
}

impl<K> Default for EventRegistry<K> {
    fn default() -> Self {
        Self {
            bindings: HashMap::new(),
            tokens: TokenMint::default(),
            log: EventLog::default(),
            debug: false,
        }
    }
}

impl<K: Copy + Eq + Hash> EventRegistry<K> {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables or disables per-delivery diagnostics.
    pub fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
    }

    /// Whether diagnostics are enabled.
    pub fn debug(&self) -> bool {
        self.debug
    }

    /// Records a binding on `element`.
    ///
    /// A second registration with the same event type and the same listener
    /// options on the same element is rejected with a warning until the
    /// element's bindings are unregistered. Returns whether the binding was
    /// accepted.
    pub fn register_event(&mut self, element: K, spec: EventHandlerSpec) -> bool {
        let token = self.tokens.token_for(element);
        let bindings = self
            .bindings
            .entry(element)
            .or_insert_with(|| ElementBindings {
                token,
                registrations: SmallVec::new(),
            });
        let duplicate = bindings.registrations.iter().any(|reg| {
            reg.spec.event_type == spec.event_type && reg.spec.options() == spec.options()
        });
        if duplicate {
            warn!(
                target: LOG_TARGET,
                element = token.get(),
                event_type = %spec.event_type,
                "duplicate registration for this element, type and options; ignored"
            );
            return false;
        }
        if self.debug {
            debug!(
                target: LOG_TARGET,
                element = token.get(),
                event_type = %spec.event_type,
                capture = spec.capture,
                once = spec.once,
                debounce = spec.debounce,
                throttle = spec.throttle,
                "event registered"
            );
        }
        bindings.registrations.push(Registration {
            debounce: spec.debounce.map(DebounceGate::new),
            throttle: spec.throttle.map(ThrottleGate::new),
            pending: None,
            fired: false,
            spec,
        });
        true
    }

    /// Removes every binding on `element`, including any pending debounced
    /// dispatch. Idempotent; the element's identity token is retained.
    pub fn unregister_events(&mut self, element: &K) {
        if let Some(bindings) = self.bindings.remove(element)
            && self.debug
        {
            debug!(
                target: LOG_TARGET,
                element = bindings.token.get(),
                count = bindings.registrations.len(),
                "events unregistered"
            );
        }
    }

    /// Drops every binding, token and log entry.
    pub fn clear(&mut self) {
        self.bindings.clear();
        self.tokens.clear();
        self.log.clear();
    }

    /// The distinct event types with at least one binding, sorted.
    pub fn bound_event_types(&self) -> Vec<String> {
        let mut types: Vec<String> = Vec::new();
        for bindings in self.bindings.values() {
            for reg in &bindings.registrations {
                if !types.contains(&reg.spec.event_type) {
                    types.push(reg.spec.event_type.clone());
                }
            }
        }
        types.sort_unstable();
        types
    }

    /// Whether `element` currently has any bindings.
    pub fn has_bindings(&self, element: &K) -> bool {
        self.bindings.contains_key(element)
    }

    /// The element's identity token, if it has ever registered.
    pub fn binding_token(&self, element: &K) -> Option<BindingToken> {
        self.tokens.get(element)
    }

    /// Delivers `event` to the bindings registered on `element`.
    ///
    /// Matching bindings run in registration order. `prevent_default` and
    /// `stop_propagation` describe how the platform event itself should be
    /// handled, so they are reported as soon as a binding matches, before
    /// any rate limiting. A `passive` binding never prevents the default.
    /// Throttled occurrences inside an open window are dropped; debounced
    /// occurrences are held back and fire from [`Self::poll`].
    pub fn handle_event(
        &mut self,
        element: &K,
        event: &Event,
        sink: &mut impl EventSink,
    ) -> Disposition {
        self.deliver(element, event, None, sink)
    }

    /// Like [`Self::handle_event`], restricted to one propagation phase.
    ///
    /// Capture delivers only `capture: true` bindings, bubble only the
    /// rest. Used by delegating walkers that visit a path twice.
    pub fn handle_event_in_phase(
        &mut self,
        element: &K,
        event: &Event,
        phase: Phase,
        sink: &mut impl EventSink,
    ) -> Disposition {
        self.deliver(element, event, Some(phase), sink)
    }

    fn deliver(
        &mut self,
        element: &K,
        event: &Event,
        phase: Option<Phase>,
        sink: &mut impl EventSink,
    ) -> Disposition {
        let mut disposition = Disposition::default();
        let Some(bindings) = self.bindings.get_mut(element) else {
            return disposition;
        };
        let token = bindings.token;
        for reg in &mut bindings.registrations {
            if reg.spec.event_type != event.event_type {
                continue;
            }
            let in_phase = match phase {
                None => true,
                Some(Phase::Capture) => reg.spec.capture,
                Some(Phase::Bubble) => !reg.spec.capture,
            };
            if !in_phase {
                continue;
            }
            if reg.spec.prevent_default {
                if reg.spec.passive {
                    warn!(
                        target: LOG_TARGET,
                        element = token.get(),
                        event_type = %event.event_type,
                        "passive binding cannot prevent the default; ignored"
                    );
                } else {
                    disposition.default_prevented = true;
                }
            }
            disposition.propagation_stopped |= reg.spec.stop_propagation;

            if let Some(gate) = &mut reg.throttle
                && !gate.admit(event.timestamp_ms)
            {
                if self.debug {
                    debug!(
                        target: LOG_TARGET,
                        element = token.get(),
                        event_type = %event.event_type,
                        "event dropped by throttle window"
                    );
                }
                continue;
            }

            let action = reg.spec.handler.resolve();
            // Flags on the action itself count once the binding produces it.
            disposition.default_prevented |= action.prevent_default && !reg.spec.passive;
            disposition.propagation_stopped |= action.stop_propagation;
            if let Some(gate) = &mut reg.debounce {
                gate.observe(event.timestamp_ms);
                reg.pending = Some(PendingDispatch {
                    action,
                    event: event.clone(),
                });
                if self.debug {
                    debug!(
                        target: LOG_TARGET,
                        element = token.get(),
                        event_type = %event.event_type,
                        deadline = gate.deadline(),
                        "event held by debounce"
                    );
                }
                continue;
            }

            self.log.push(EventLogEntry {
                timestamp: event.timestamp_ms,
                event_type: event.event_type.clone(),
                target: token,
                action: action.action_type.clone(),
                options: reg.spec.options(),
            });
            if self.debug {
                debug!(
                    target: LOG_TARGET,
                    element = token.get(),
                    event_type = %event.event_type,
                    action_type = %action.action_type,
                    "event dispatched"
                );
            }
            sink.dispatch(action, event);
            reg.fired = true;
            disposition.dispatched += 1;
        }
        bindings
            .registrations
            .retain(|reg| !(reg.spec.once && reg.fired));
        disposition
    }

    /// Fires every debounced dispatch whose deadline is at or before
    /// `now_ms`. Returns the number of dispatches that fired.
    pub fn poll(&mut self, now_ms: u64, sink: &mut impl EventSink) -> usize {
        let mut fired = 0;
        for bindings in self.bindings.values_mut() {
            let token = bindings.token;
            for reg in &mut bindings.registrations {
                let Some(gate) = &mut reg.debounce else {
                    continue;
                };
                if !gate.poll(now_ms) {
                    continue;
                }
                let Some(pending) = reg.pending.take() else {
                    continue;
                };
                self.log.push(EventLogEntry {
                    timestamp: pending.event.timestamp_ms,
                    event_type: pending.event.event_type.clone(),
                    target: token,
                    action: pending.action.action_type.clone(),
                    options: reg.spec.options(),
                });
                if self.debug {
                    debug!(
                        target: LOG_TARGET,
                        element = token.get(),
                        event_type = %pending.event.event_type,
                        action_type = %pending.action.action_type,
                        now = now_ms,
                        "debounced event dispatched"
                    );
                }
                sink.dispatch(pending.action, &pending.event);
                reg.fired = true;
                fired += 1;
            }
            bindings
                .registrations
                .retain(|reg| !(reg.spec.once && reg.fired));
        }
        fired
    }

    /// A copy of the recent delivery log, oldest first.
    pub fn event_history(&self) -> Vec<EventLogEntry> {
        self.log.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::HandlerRef;

    fn recorder() -> (
        std::rc::Rc<std::cell::RefCell<Vec<(String, u64)>>>,
        impl FnMut(ActionSpec, &Event),
    ) {
        let seen = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let sink_seen = seen.clone();
        let sink = move |action: ActionSpec, event: &Event| {
            sink_seen
                .borrow_mut()
                .push((action.action_type, event.timestamp_ms));
        };
        (seen, sink)
    }

    fn click_spec(action_type: &str) -> EventHandlerSpec {
        EventHandlerSpec::new("click", ActionSpec::new(action_type))
    }

    #[test]
    fn registered_binding_fires_and_unregister_silences_it() {
        let mut registry: EventRegistry<u32> = EventRegistry::new();
        let (seen, mut sink) = recorder();
        assert!(registry.register_event(1, click_spec("ITEM_SELECTED")));

        let d = registry.handle_event(&1, &Event::new("click", 0), &mut sink);
        assert_eq!(d.dispatched, 1);

        registry.unregister_events(&1);
        registry.unregister_events(&1); // idempotent
        let d = registry.handle_event(&1, &Event::new("click", 10), &mut sink);
        assert_eq!(d.dispatched, 0);
        assert_eq!(seen.borrow().len(), 1);
    }

    #[test]
    fn duplicate_registration_is_rejected_until_unregistered() {
        let mut registry: EventRegistry<u32> = EventRegistry::new();
        assert!(registry.register_event(1, click_spec("A")));
        assert!(!registry.register_event(1, click_spec("B")));

        // Different options are a different registration.
        let mut capture = click_spec("C");
        capture.capture = true;
        assert!(registry.register_event(1, capture));

        registry.unregister_events(&1);
        assert!(registry.register_event(1, click_spec("B")));
    }

    #[test]
    fn events_of_other_types_are_ignored() {
        let mut registry: EventRegistry<u32> = EventRegistry::new();
        let (seen, mut sink) = recorder();
        registry.register_event(1, click_spec("A"));
        let d = registry.handle_event(&1, &Event::new("keydown", 0), &mut sink);
        assert_eq!(d.dispatched, 0);
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn debounce_coalesces_a_burst_into_the_last_call() {
        let mut registry: EventRegistry<u32> = EventRegistry::new();
        let (seen, mut sink) = recorder();
        let mut spec = click_spec("SAVE");
        spec.debounce = Some(100);
        registry.register_event(1, spec);

        for t in [0, 10, 20] {
            let d = registry.handle_event(&1, &Event::new("click", t), &mut sink);
            assert_eq!(d.dispatched, 0);
        }
        assert_eq!(registry.poll(119, &mut sink), 0);
        assert_eq!(registry.poll(120, &mut sink), 1);
        assert_eq!(registry.poll(500, &mut sink), 0);
        assert_eq!(*seen.borrow(), vec![("SAVE".to_owned(), 20)]);
    }

    #[test]
    fn unregister_cancels_a_pending_debounce() {
        let mut registry: EventRegistry<u32> = EventRegistry::new();
        let (seen, mut sink) = recorder();
        let mut spec = click_spec("SAVE");
        spec.debounce = Some(100);
        registry.register_event(1, spec);

        registry.handle_event(&1, &Event::new("click", 0), &mut sink);
        registry.unregister_events(&1);
        assert_eq!(registry.poll(1_000, &mut sink), 0);
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn throttle_admits_the_leading_edge_only() {
        let mut registry: EventRegistry<u32> = EventRegistry::new();
        let (seen, mut sink) = recorder();
        let mut spec = EventHandlerSpec::new("scroll", ActionSpec::new("ON_SCROLL"));
        spec.throttle = Some(100);
        registry.register_event(1, spec);

        assert_eq!(
            registry
                .handle_event(&1, &Event::new("scroll", 0), &mut sink)
                .dispatched,
            1
        );
        assert_eq!(
            registry
                .handle_event(&1, &Event::new("scroll", 50), &mut sink)
                .dispatched,
            0
        );
        assert_eq!(
            registry
                .handle_event(&1, &Event::new("scroll", 120), &mut sink)
                .dispatched,
            1
        );
        assert_eq!(seen.borrow().len(), 2);
    }

    #[test]
    fn once_binding_is_removed_after_its_first_dispatch() {
        let mut registry: EventRegistry<u32> = EventRegistry::new();
        let (seen, mut sink) = recorder();
        let mut spec = click_spec("A");
        spec.once = true;
        registry.register_event(1, spec);

        registry.handle_event(&1, &Event::new("click", 0), &mut sink);
        registry.handle_event(&1, &Event::new("click", 10), &mut sink);
        assert_eq!(seen.borrow().len(), 1);

        // The slot is free again for an identical registration.
        let mut spec = click_spec("A");
        spec.once = true;
        assert!(registry.register_event(1, spec));
    }

    #[test]
    fn passive_binding_cannot_prevent_the_default() {
        let mut registry: EventRegistry<u32> = EventRegistry::new();
        let (_, mut sink) = recorder();
        let mut spec = EventHandlerSpec::new("wheel", ActionSpec::new("ON_WHEEL"));
        spec.prevent_default = true;
        spec.passive = true;
        registry.register_event(1, spec);

        let d = registry.handle_event(&1, &Event::new("wheel", 0), &mut sink);
        assert!(!d.default_prevented);
        assert_eq!(d.dispatched, 1);
    }

    #[test]
    fn flags_are_reported_through_the_disposition() {
        let mut registry: EventRegistry<u32> = EventRegistry::new();
        let (_, mut sink) = recorder();
        let mut spec = click_spec("A");
        spec.prevent_default = true;
        spec.stop_propagation = true;
        registry.register_event(1, spec);

        let d = registry.handle_event(&1, &Event::new("click", 0), &mut sink);
        assert!(d.default_prevented);
        assert!(d.propagation_stopped);
    }

    #[test]
    fn bare_name_handler_dispatches_an_action_of_that_type() {
        let mut registry: EventRegistry<u32> = EventRegistry::new();
        let (seen, mut sink) = recorder();
        registry.register_event(1, EventHandlerSpec::new("click", HandlerRef::from("CLOSE")));
        registry.handle_event(&1, &Event::new("click", 0), &mut sink);
        assert_eq!(seen.borrow()[0].0, "CLOSE");
    }

    #[test]
    fn history_records_deliveries_and_is_a_copy() {
        let mut registry: EventRegistry<u32> = EventRegistry::new();
        let (_, mut sink) = recorder();
        registry.register_event(1, click_spec("A"));
        registry.handle_event(&1, &Event::new("click", 5), &mut sink);

        let history = registry.event_history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].event_type, "click");
        assert_eq!(history[0].action, "A");
        assert_eq!(history[0].timestamp, 5);
        assert_eq!(Some(history[0].target), registry.binding_token(&1));

        let mut copy = registry.event_history();
        copy.clear();
        assert_eq!(registry.event_history().len(), 1);
    }

    #[test]
    fn phase_filter_splits_capture_and_bubble_bindings() {
        let mut registry: EventRegistry<u32> = EventRegistry::new();
        let (seen, mut sink) = recorder();
        let mut capture = click_spec("CAPTURED");
        capture.capture = true;
        registry.register_event(1, capture);
        registry.register_event(1, click_spec("BUBBLED"));

        let event = Event::new("click", 0);
        registry.handle_event_in_phase(&1, &event, Phase::Capture, &mut sink);
        registry.handle_event_in_phase(&1, &event, Phase::Bubble, &mut sink);
        let seen = seen.borrow();
        let types: Vec<&str> = seen.iter().map(|(t, _)| t.as_str()).collect();
        assert_eq!(types, ["CAPTURED", "BUBBLED"]);
    }

    #[test]
    fn bound_event_types_are_distinct_and_sorted() {
        let mut registry: EventRegistry<u32> = EventRegistry::new();
        registry.register_event(1, click_spec("A"));
        registry.register_event(2, click_spec("B"));
        registry.register_event(2, EventHandlerSpec::new("keydown", ActionSpec::new("KEY")));
        assert_eq!(registry.bound_event_types(), ["click", "keydown"]);

        registry.clear();
        assert!(registry.bound_event_types().is_empty());
    }

    #[test]
    fn action_level_flags_are_reported_on_dispatch() {
        let mut registry: EventRegistry<u32> = EventRegistry::new();
        let (_, mut sink) = recorder();
        let mut action = ActionSpec::new("SUBMIT");
        action.prevent_default = true;
        registry.register_event(1, EventHandlerSpec::new("click", action));
        let d = registry.handle_event(&1, &Event::new("click", 0), &mut sink);
        assert!(d.default_prevented);
    }

    #[test]
    fn token_survives_unregister_and_reregister() {
        let mut registry: EventRegistry<u32> = EventRegistry::new();
        registry.register_event(1, click_spec("A"));
        let before = registry.binding_token(&1);
        registry.unregister_events(&1);
        registry.register_event(1, click_spec("A"));
        assert_eq!(registry.binding_token(&1), before);
    }
}

// Copyright 2026 the Bramble Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Component lifecycle binding.

use core::hash::Hash;

use hashbrown::HashMap;
use serde_json::Value;
use tracing::warn;

use bramble_action::{ActionSpec, Dispatcher, State};
use bramble_binding::{
    Disposition, Event, EventHandlerSpec, EventLogEntry, EventRegistry, HandlerRef,
};
use bramble_delegate::DelegationTree;

use crate::LOG_TARGET;
use crate::names::NameRegistry;
use crate::shorthand::{self, Shorthand, ShorthandError};

/// How a binding wires its elements to the platform.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BindingStrategy {
    /// One platform listener per element and event type.
    Direct,
    /// One shared root listener per event type; propagation is walked by a
    /// [`DelegationTree`]. The default.
    #[default]
    Delegated,
}

/// The event machinery behind one binding.
#[derive(Debug)]
enum Engine<K> {
    Direct(EventRegistry<K>),
    Delegated(DelegationTree<K>),
}

/// A string handler resolved at bind time.
#[derive(Debug, Clone)]
enum Resolved {
    /// `dispatch:TYPE`: dispatch that type with the event as payload.
    DispatchEvent(String),
    /// Call a named handler with fixed arguments.
    Named { name: String, args: Vec<Value> },
}

/// Binds one component instance to the runtime.
///
/// A `HostBinding` owns the component's [`State`], an action
/// [`Dispatcher`], a [`NameRegistry`] for string handlers, and an event
/// engine chosen by [`BindingStrategy`]. The host feeds platform events in
/// through [`HostBinding::handle_event`] and ticks
/// [`HostBinding::poll`]; actions flow through the dispatcher and the
/// resulting state is stored back and reported through the `on_state`
/// callback.
///
/// # Example
///
/// ```rust
/// use bramble_action::ActionSpec;
/// use bramble_binding::{Event, EventHandlerSpec};
/// use bramble_host::HostBinding;
/// use serde_json::json;
///
/// let state = json!({ "count": 0 }).as_object().unwrap().clone();
/// let mut binding: HostBinding<u32> = HostBinding::new(state);
///
/// let spec = EventHandlerSpec::new(
///     "click",
///     ActionSpec::new("INCREMENT").with_payload(json!({ "key": "count" })),
/// );
/// binding.bind(1, vec![spec]).unwrap();
///
/// binding.handle_event(&1, &Event::new("click", 0));
/// assert_eq!(binding.state()["count"], json!(1));
/// ```
pub struct HostBinding<K> {
    dispatcher: Dispatcher,
    names: NameRegistry,
    engine: Engine<K>,
    state: State,
    resolutions: HashMap<String, Resolved>,
    on_state: Option<Box<dyn FnMut(&State)>>,
}

impl<K> core::fmt::Debug for HostBinding<K> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let strategy = match self.engine {
            Engine::Direct(_) => BindingStrategy::Direct,
            Engine::Delegated(_) => BindingStrategy::Delegated,
        };
        f.debug_struct("HostBinding")
            .field("strategy", &strategy)
            .field("state_keys", &self.state.len())
            .finish_non_exhaustive()
    }
}

impl<K: Copy + Eq + Hash> HostBinding<K> {
    /// Creates a binding with the default (delegated) strategy.
    pub fn new(state: State) -> Self {
        Self::with_strategy(state, BindingStrategy::default())
    }

    /// Creates a binding with an explicit strategy.
    pub fn with_strategy(state: State, strategy: BindingStrategy) -> Self {
        Self {
            dispatcher: Dispatcher::new(),
            names: NameRegistry::new(),
            engine: match strategy {
                BindingStrategy::Direct => Engine::Direct(EventRegistry::new()),
                BindingStrategy::Delegated => Engine::Delegated(DelegationTree::new()),
            },
            state,
            resolutions: HashMap::new(),
            on_state: None,
        }
    }

    /// Replaces the name registry string handlers resolve against.
    #[must_use]
    pub fn with_names(mut self, names: NameRegistry) -> Self {
        self.names = names;
        self
    }

    /// The active strategy.
    pub fn strategy(&self) -> BindingStrategy {
        match self.engine {
            Engine::Direct(_) => BindingStrategy::Direct,
            Engine::Delegated(_) => BindingStrategy::Delegated,
        }
    }

    /// Registers a callback run after every state change.
    pub fn on_state(&mut self, callback: impl FnMut(&State) + 'static) {
        self.on_state = Some(Box::new(callback));
    }

    /// The action dispatcher, for custom handlers and middleware.
    pub fn dispatcher_mut(&mut self) -> &mut Dispatcher {
        &mut self.dispatcher
    }

    /// The name registry, for registering named handlers.
    pub fn names_mut(&mut self) -> &mut NameRegistry {
        &mut self.names
    }

    /// Enables or disables diagnostics across dispatcher and engine.
    pub fn set_debug(&mut self, debug: bool) {
        self.dispatcher.set_debug(debug);
        match &mut self.engine {
            Engine::Direct(registry) => registry.set_debug(debug),
            Engine::Delegated(tree) => tree.set_debug(debug),
        }
    }

    /// Binds `element` with its declarative handlers, top-level.
    ///
    /// String handlers are parsed and resolved now; a malformed shorthand
    /// fails the whole bind. Returns the event types the host must install
    /// platform listeners for: on the shared root under the delegated
    /// strategy, on this element under the direct one.
    pub fn bind(
        &mut self,
        element: K,
        specs: Vec<EventHandlerSpec>,
    ) -> Result<Vec<String>, ShorthandError> {
        self.bind_inner(element, specs, None)
    }

    /// Binds `element` beneath `parent` in the delegation graph.
    ///
    /// Under the direct strategy the parent is irrelevant and ignored.
    pub fn bind_child(
        &mut self,
        element: K,
        specs: Vec<EventHandlerSpec>,
        parent: K,
    ) -> Result<Vec<String>, ShorthandError> {
        self.bind_inner(element, specs, Some(parent))
    }

    fn bind_inner(
        &mut self,
        element: K,
        specs: Vec<EventHandlerSpec>,
        parent: Option<K>,
    ) -> Result<Vec<String>, ShorthandError> {
        for spec in &specs {
            self.resolve_handler(&spec.handler)?;
        }
        match &mut self.engine {
            Engine::Direct(registry) => {
                let mut install = Vec::new();
                for spec in specs {
                    let event_type = spec.event_type.clone();
                    if registry.register_event(element, spec)
                        && !install.contains(&event_type)
                    {
                        install.push(event_type);
                    }
                }
                Ok(install)
            }
            Engine::Delegated(tree) => Ok(tree.register_element(element, specs, None, parent)),
        }
    }

    /// Records how a string handler behaves at dispatch time.
    fn resolve_handler(&mut self, handler: &HandlerRef) -> Result<(), ShorthandError> {
        let HandlerRef::Name(raw) = handler else {
            return Ok(());
        };
        if self.resolutions.contains_key(raw) {
            return Ok(());
        }
        match shorthand::parse(raw)? {
            Shorthand::Dispatch(action_type) => {
                self.resolutions
                    .insert(raw.clone(), Resolved::DispatchEvent(action_type));
            }
            Shorthand::Call { name, args } => {
                self.resolutions
                    .insert(raw.clone(), Resolved::Named { name, args });
            }
            Shorthand::Name(name) => {
                // A bare name only counts as a handler call if something is
                // registered under it; otherwise it stays an action type.
                if self.names.contains(&name) {
                    self.resolutions.insert(raw.clone(), Resolved::Named {
                        name,
                        args: Vec::new(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Removes every binding on `element`. Idempotent.
    pub fn unbind(&mut self, element: &K) {
        match &mut self.engine {
            Engine::Direct(registry) => registry.unregister_events(element),
            Engine::Delegated(tree) => tree.unregister_element(element),
        }
    }

    /// Feeds one platform event in at `target`.
    pub fn handle_event(&mut self, target: &K, event: &Event) -> Disposition {
        let mut produced: Vec<ActionSpec> = Vec::new();
        let disposition = {
            let mut sink = |action: ActionSpec, _: &Event| produced.push(action);
            match &mut self.engine {
                Engine::Direct(registry) => registry.handle_event(target, event, &mut sink),
                Engine::Delegated(tree) => tree.dispatch_event(event, target, &mut sink),
            }
        };
        for action in produced {
            self.apply(action, event);
        }
        disposition
    }

    /// Advances the clock, firing matured debounced dispatches.
    pub fn poll(&mut self, now_ms: u64) -> usize {
        let mut produced: Vec<(ActionSpec, Event)> = Vec::new();
        let fired = {
            let mut sink =
                |action: ActionSpec, event: &Event| produced.push((action, event.clone()));
            match &mut self.engine {
                Engine::Direct(registry) => registry.poll(now_ms, &mut sink),
                Engine::Delegated(tree) => tree.poll(now_ms, &mut sink),
            }
        };
        for (action, event) in produced {
            self.apply(action, &event);
        }
        fired
    }

    /// Routes one produced action: through a resolved string handler if
    /// the action type names one, through the dispatcher otherwise.
    fn apply(&mut self, action: ActionSpec, event: &Event) {
        let Some(resolved) = self.resolutions.get(&action.action_type).cloned() else {
            self.run_dispatch(&action);
            return;
        };
        match resolved {
            Resolved::DispatchEvent(action_type) => {
                let payload = serde_json::to_value(event).unwrap_or(Value::Null);
                let action = ActionSpec::new(action_type).with_payload(payload);
                self.run_dispatch(&action);
            }
            Resolved::Named { name, args } => match self.names.resolve_required(&name) {
                Ok(handler) => {
                    if let Err(err) = handler(&args, event) {
                        warn!(
                            target: LOG_TARGET,
                            handler = %name,
                            error = %err,
                            "named handler failed"
                        );
                    }
                }
                Err(err) => {
                    warn!(target: LOG_TARGET, error = %err, "skipping unresolvable handler");
                }
            },
        }
    }

    fn run_dispatch(&mut self, action: &ActionSpec) {
        let mut next = None;
        self.dispatcher
            .dispatch(&self.state, action, |state| next = Some(state));
        if let Some(state) = next {
            self.state = state;
            if let Some(callback) = &mut self.on_state {
                callback(&self.state);
            }
        }
    }

    /// The component's current state.
    pub fn state(&self) -> &State {
        &self.state
    }

    /// Recent deliveries, oldest first.
    pub fn event_history(&self) -> Vec<EventLogEntry> {
        match &self.engine {
            Engine::Direct(registry) => registry.event_history(),
            Engine::Delegated(tree) => tree.event_history(),
        }
    }

    /// Tears the component down: every element is unbound and any pending
    /// debounced dispatch dies. Returns the event types whose platform
    /// listeners the host should remove: from the shared root under the
    /// delegated strategy, from every bound element under the direct one.
    /// The final state stays readable.
    pub fn unmount(&mut self) -> Vec<String> {
        self.resolutions.clear();
        match &mut self.engine {
            Engine::Direct(registry) => {
                let types = registry.bound_event_types();
                registry.clear();
                types
            }
            Engine::Delegated(tree) => tree.clear(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::names::HandlerError;
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn state_of(value: Value) -> State {
        value.as_object().unwrap().clone()
    }

    fn increment(key: &str) -> EventHandlerSpec {
        EventHandlerSpec::new(
            "click",
            ActionSpec::new("INCREMENT").with_payload(json!({ "key": key })),
        )
    }

    #[test]
    fn click_to_increment_flows_end_to_end() {
        let mut binding: HostBinding<u32> = HostBinding::new(state_of(json!({ "count": 0 })));
        let install = binding.bind(1, vec![increment("count")]).unwrap();
        assert_eq!(install, vec!["click".to_owned()]);

        binding.handle_event(&1, &Event::new("click", 0));
        assert_eq!(binding.state()["count"], json!(1));
        assert_eq!(binding.event_history().len(), 1);
    }

    #[test]
    fn debounced_clicks_collapse_to_one_dispatch() {
        let mut binding: HostBinding<u32> = HostBinding::new(state_of(json!({ "count": 0 })));
        let mut spec = increment("count");
        spec.debounce = Some(100);
        binding.bind(1, vec![spec]).unwrap();

        for t in [0, 10, 20] {
            binding.handle_event(&1, &Event::new("click", t));
        }
        assert_eq!(binding.state()["count"], json!(0));
        assert_eq!(binding.poll(119), 0);
        assert_eq!(binding.poll(120), 1);
        assert_eq!(binding.state()["count"], json!(1));
        assert_eq!(binding.poll(1_000), 0);
        assert_eq!(binding.state()["count"], json!(1));
    }

    #[test]
    fn both_strategies_produce_the_same_state_change() {
        for strategy in [BindingStrategy::Direct, BindingStrategy::Delegated] {
            let mut binding: HostBinding<u32> =
                HostBinding::with_strategy(state_of(json!({ "count": 0 })), strategy);
            binding.bind(1, vec![increment("count")]).unwrap();
            binding.handle_event(&1, &Event::new("click", 0));
            assert_eq!(binding.state()["count"], json!(1), "strategy {strategy:?}");
        }
    }

    #[test]
    fn delegated_children_bubble_into_their_parent() {
        let mut binding: HostBinding<u32> = HostBinding::new(state_of(json!({ "count": 0 })));
        binding.bind(1, vec![increment("count")]).unwrap();
        binding.bind_child(2, Vec::new(), 1).unwrap();

        binding.handle_event(&2, &Event::new("click", 0));
        assert_eq!(binding.state()["count"], json!(1));
    }

    #[test]
    fn dispatch_shorthand_carries_the_event_as_payload() {
        let mut binding: HostBinding<u32> = HostBinding::new(State::new());
        let received = Rc::new(RefCell::new(None));
        let seen = received.clone();
        binding
            .dispatcher_mut()
            .register_handler("NOTE_TAKEN", move |state, action| {
                *seen.borrow_mut() = action.payload.clone();
                state
            });
        binding
            .bind(1, vec![EventHandlerSpec::new("click", "dispatch:NOTE_TAKEN")])
            .unwrap();

        let event = Event::new("click", 42).with_payload(json!({ "x": 7 }));
        binding.handle_event(&1, &event);
        let payload = received.borrow().clone().unwrap();
        assert_eq!(payload["type"], json!("click"));
        assert_eq!(payload["timestamp"], json!(42));
        assert_eq!(payload["payload"]["x"], json!(7));
    }

    #[test]
    fn call_shorthand_invokes_the_named_handler_with_args() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let seen = calls.clone();
        let mut names = NameRegistry::new();
        names.register("track", move |args, event| {
            seen.borrow_mut().push((args.to_vec(), event.timestamp_ms));
            Ok(())
        });

        let mut binding: HostBinding<u32> = HostBinding::new(State::new()).with_names(names);
        binding
            .bind(1, vec![EventHandlerSpec::new("click", "track('nav', 2)")])
            .unwrap();
        binding.handle_event(&1, &Event::new("click", 9));

        let calls = calls.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, vec![json!("nav"), json!(2)]);
        assert_eq!(calls[0].1, 9);
    }

    #[test]
    fn registered_bare_name_is_called_instead_of_dispatched() {
        let hits = Rc::new(RefCell::new(0));
        let seen = hits.clone();
        let mut names = NameRegistry::new();
        names.register("closeMenu", move |_, _| {
            *seen.borrow_mut() += 1;
            Ok(())
        });

        let mut binding: HostBinding<u32> =
            HostBinding::new(state_of(json!({ "open": true }))).with_names(names);
        binding
            .bind(1, vec![EventHandlerSpec::new("click", "closeMenu")])
            .unwrap();
        binding.handle_event(&1, &Event::new("click", 0));
        assert_eq!(*hits.borrow(), 1);
        // The handler ran instead of any state transition.
        assert_eq!(binding.state()["open"], json!(true));
    }

    #[test]
    fn unregistered_bare_name_falls_through_to_an_action_type() {
        let mut binding: HostBinding<u32> = HostBinding::new(state_of(json!({ "open": true })));
        binding
            .dispatcher_mut()
            .register_handler("closeMenu", |mut state, _| {
                state.insert("open".into(), json!(false));
                state
            });
        binding
            .bind(1, vec![EventHandlerSpec::new("click", "closeMenu")])
            .unwrap();
        binding.handle_event(&1, &Event::new("click", 0));
        assert_eq!(binding.state()["open"], json!(false));
    }

    #[test]
    fn failing_named_handler_is_contained() {
        let mut names = NameRegistry::new();
        names.register("explode", |_, _| Err(HandlerError::new("boom")));
        let mut binding: HostBinding<u32> =
            HostBinding::new(state_of(json!({ "count": 0 }))).with_names(names);
        binding
            .bind(1, vec![
                EventHandlerSpec::new("click", "explode()"),
                {
                    let mut second = increment("count");
                    second.capture = true;
                    second
                },
            ])
            .unwrap();

        binding.handle_event(&1, &Event::new("click", 0));
        assert_eq!(binding.state()["count"], json!(1));
    }

    #[test]
    fn malformed_shorthand_fails_the_bind() {
        let mut binding: HostBinding<u32> = HostBinding::new(State::new());
        let result = binding.bind(1, vec![EventHandlerSpec::new("click", "log(unclosed")]);
        assert!(matches!(result, Err(ShorthandError::UnterminatedCall(_))));
    }

    #[test]
    fn on_state_sees_every_change() {
        let observed = Rc::new(RefCell::new(Vec::new()));
        let seen = observed.clone();
        let mut binding: HostBinding<u32> = HostBinding::new(state_of(json!({ "count": 0 })));
        binding.on_state(move |state| {
            seen.borrow_mut().push(state["count"].clone());
        });
        binding.bind(1, vec![increment("count")]).unwrap();

        binding.handle_event(&1, &Event::new("click", 0));
        binding.handle_event(&1, &Event::new("click", 10));
        assert_eq!(*observed.borrow(), vec![json!(1), json!(2)]);
    }

    #[test]
    fn unbind_and_unmount_stop_delivery() {
        let mut binding: HostBinding<u32> = HostBinding::new(state_of(json!({ "count": 0 })));
        binding.bind(1, vec![increment("count")]).unwrap();
        binding.unbind(&1);
        binding.handle_event(&1, &Event::new("click", 0));
        assert_eq!(binding.state()["count"], json!(0));

        binding.bind(2, vec![increment("count")]).unwrap();
        let removed = binding.unmount();
        assert_eq!(removed, vec!["click".to_owned()]);
        binding.handle_event(&2, &Event::new("click", 0));
        assert_eq!(binding.state()["count"], json!(0));
    }

    #[test]
    fn debug_names_the_strategy() {
        let binding: HostBinding<u32> = HostBinding::new(State::new());
        assert!(format!("{binding:?}").contains("Delegated"));

        let binding: HostBinding<u32> =
            HostBinding::with_strategy(State::new(), BindingStrategy::Direct);
        assert!(format!("{binding:?}").contains("Direct"));
    }

    #[test]
    fn direct_strategy_reports_per_element_listener_types() {
        let mut binding: HostBinding<u32> =
            HostBinding::with_strategy(State::new(), BindingStrategy::Direct);
        let install = binding
            .bind(1, vec![
                increment("count"),
                EventHandlerSpec::new("keydown", "dispatch:KEY"),
            ])
            .unwrap();
        assert_eq!(install, vec!["click".to_owned(), "keydown".to_owned()]);
        // Teardown reports the same types so the host can remove them.
        assert_eq!(
            binding.unmount(),
            vec!["click".to_owned(), "keydown".to_owned()]
        );
        binding.handle_event(&1, &Event::new("click", 0));
        assert!(binding.event_history().is_empty());
    }
}

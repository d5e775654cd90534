// Copyright 2026 the Bramble Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dispatcher: handler table plus onion middleware chain.
//!
//! The chain is rebuilt on every dispatch from the current middleware list,
//! so middleware registered between dispatches participates in the next one.
//! Within a dispatch, middleware runs in registration order on the way in and
//! reverse order on the way out (nested-call semantics).

use hashbrown::HashMap;
use tracing::{debug, warn};

use crate::LOG_TARGET;
use crate::types::{ActionSpec, State};

/// A pure state-transition function for one action type.
pub type Handler = Box<dyn Fn(State, &ActionSpec) -> State>;

/// A wrapper around the next step of action processing.
///
/// A middleware may inspect or transform the incoming state and action,
/// decide whether to invoke `next`, and transform the outgoing state. Not
/// calling `next` substitutes the middleware's own result for the rest of
/// the chain.
///
/// Implemented for closures of the matching shape:
///
/// ```
/// use bramble_action::{ActionSpec, Dispatcher, State};
///
/// let mut dispatcher = Dispatcher::new();
/// dispatcher.register_middleware(
///     |state: State, action: &ActionSpec, next: &mut dyn FnMut(State, &ActionSpec) -> State| {
///         next(state, action)
///     },
/// );
/// ```
pub trait Middleware {
    /// Process `action`, delegating to `next` for the remainder of the chain.
    fn handle(
        &self,
        state: State,
        action: &ActionSpec,
        next: &mut dyn FnMut(State, &ActionSpec) -> State,
    ) -> State;
}

impl<F> Middleware for F
where
    F: Fn(State, &ActionSpec, &mut dyn FnMut(State, &ActionSpec) -> State) -> State,
{
    fn handle(
        &self,
        state: State,
        action: &ActionSpec,
        next: &mut dyn FnMut(State, &ActionSpec) -> State,
    ) -> State {
        self(state, action, next)
    }
}

/// Synchronous action dispatcher.
///
/// ## Usage
///
/// - [`Dispatcher::new`] pre-registers the built-in transition vocabulary
///   ([`crate::builtin`]); re-registering a type replaces it.
/// - An action type maps to at most one handler; the last registration wins.
/// - [`Dispatcher::dispatch`] never mutates in place: the handler receives an
///   owned copy of the state and the result goes to `set_state`.
pub struct Dispatcher {
    handlers: HashMap<String, Handler>,
    middleware: Vec<Box<dyn Middleware>>,
    debug: bool,
}

impl core::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("handlers", &self.handlers.len())
            .field("middleware", &self.middleware.len())
            .field("debug", &self.debug)
            .finish_non_exhaustive()
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    /// Create a dispatcher with the built-in handlers registered.
    pub fn new() -> Self {
        let mut dispatcher = Self {
            handlers: HashMap::new(),
            middleware: Vec::new(),
            debug: false,
        };
        crate::builtin::install(&mut dispatcher);
        dispatcher
    }

    /// Register (or replace) the handler for an action type.
    pub fn register_handler(
        &mut self,
        action_type: impl Into<String>,
        handler: impl Fn(State, &ActionSpec) -> State + 'static,
    ) {
        self.handlers.insert(action_type.into(), Box::new(handler));
    }

    /// Append a middleware to the chain.
    ///
    /// The first-registered middleware wraps outermost: its pre-logic runs
    /// first and its post-logic runs last.
    pub fn register_middleware(&mut self, middleware: impl Middleware + 'static) {
        self.middleware.push(Box::new(middleware));
    }

    /// Enable or disable debug telemetry for dispatches.
    pub fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
    }

    /// Whether debug telemetry is enabled.
    pub fn debug(&self) -> bool {
        self.debug
    }

    /// Whether a handler is registered for `action_type`.
    pub fn has_handler(&self, action_type: &str) -> bool {
        self.handlers.contains_key(action_type)
    }

    /// Resolve and run the transition for `action`, passing the result to
    /// `set_state`.
    ///
    /// Unknown action types emit one warning and return without calling
    /// `set_state`. Panics inside handlers or middleware propagate.
    pub fn dispatch(&self, state: &State, action: &ActionSpec, set_state: impl FnOnce(State)) {
        if self.debug {
            debug!(
                target: LOG_TARGET,
                action_type = %action.action_type,
                payload = ?action.payload,
                "dispatching action"
            );
        }
        let Some(handler) = self.handlers.get(&action.action_type) else {
            warn!(
                target: LOG_TARGET,
                action_type = %action.action_type,
                "no handler registered for action type"
            );
            return;
        };
        let next = run_chain(&self.middleware, state.clone(), action, handler);
        if self.debug {
            debug!(
                target: LOG_TARGET,
                action_type = %action.action_type,
                keys = next.len(),
                "state updated"
            );
        }
        set_state(next);
    }
}

/// Recursively nest the remaining middleware around the handler.
fn run_chain(
    middleware: &[Box<dyn Middleware>],
    state: State,
    action: &ActionSpec,
    handler: &Handler,
) -> State {
    match middleware.split_first() {
        None => handler(state, action),
        Some((head, rest)) => {
            head.handle(state, action, &mut |s, a| run_chain(rest, s, a, handler))
        }
    }
}

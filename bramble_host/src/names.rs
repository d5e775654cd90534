// Copyright 2026 the Bramble Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Named handler registries.
//!
//! Call and bare-name shorthand resolve against a [`NameRegistry`] that the
//! host injects into each binding. There is no ambient process-wide table:
//! a component that wants shared handlers takes a registry whose fallback
//! chain ends in the shared one, which keeps "component handlers first,
//! then application handlers" without hidden coupling.

use std::rc::Rc;

use hashbrown::HashMap;
use thiserror::Error;

use bramble_binding::Event;
use serde_json::Value;

use crate::shorthand::ShorthandError;

/// A fault raised by a named handler.
///
/// Handler faults are recoverable data: the binding logs them and carries
/// on, they never unwind through event delivery.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct HandlerError(String);

impl HandlerError {
    /// Creates an error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    /// The message the handler raised.
    pub fn message(&self) -> &str {
        &self.0
    }
}

/// Why a string handler could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// The handler string itself is malformed.
    #[error(transparent)]
    Shorthand(#[from] ShorthandError),
    /// No registry in the chain knows the name.
    #[error("no handler registered under `{0}`")]
    UnknownName(String),
}

/// A registered named handler.
pub type NamedHandler = Rc<dyn Fn(&[Value], &Event) -> Result<(), HandlerError>>;

/// Name → handler table with an optional fallback chain.
#[derive(Clone, Default)]
pub struct NameRegistry {
    entries: HashMap<String, NamedHandler>,
    fallback: Option<Rc<NameRegistry>>,
}

impl core::fmt::Debug for NameRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("NameRegistry")
            .field("entries", &self.entries.keys().collect::<Vec<_>>())
            .field("chained", &self.fallback.is_some())
            .finish()
    }
}

impl NameRegistry {
    /// Creates an empty registry with no fallback.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty registry that falls back to `fallback` for names
    /// it does not hold itself.
    pub fn with_fallback(fallback: Rc<Self>) -> Self {
        Self {
            entries: HashMap::new(),
            fallback: Some(fallback),
        }
    }

    /// Registers a handler under `name`, replacing any previous one here.
    /// Entries in this registry shadow same-named fallback entries.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        handler: impl Fn(&[Value], &Event) -> Result<(), HandlerError> + 'static,
    ) {
        self.entries.insert(name.into(), Rc::new(handler));
    }

    /// Looks up `name` here, then along the fallback chain.
    pub fn resolve(&self, name: &str) -> Option<NamedHandler> {
        if let Some(handler) = self.entries.get(name) {
            return Some(handler.clone());
        }
        self.fallback.as_ref()?.resolve(name)
    }

    /// Like [`Self::resolve`], with the miss as a typed error.
    pub fn resolve_required(&self, name: &str) -> Result<NamedHandler, ResolveError> {
        self.resolve(name)
            .ok_or_else(|| ResolveError::UnknownName(name.to_owned()))
    }

    /// Whether `name` resolves here or along the chain.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
            || self
                .fallback
                .as_ref()
                .is_some_and(|chain| chain.contains(name))
    }
}

// Copyright 2026 the Bramble Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Stable per-element identity tokens.
//!
//! Elements are identified by whatever key type the host uses. The registry
//! needs an opaque, copyable identity it can put in log entries and hand
//! across layer boundaries without carrying the host key type along, so it
//! mints a [`BindingToken`] per element on first contact and remembers it in
//! a side table. The token survives unregister/re-register cycles: identity
//! belongs to the element, not to any particular set of bindings.

use core::hash::Hash;
use core::num::NonZeroU64;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

/// Opaque identity of an element known to a registry.
///
/// Tokens are never reused within one [`TokenMint`] and never zero, so
/// `Option<BindingToken>` costs nothing extra.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BindingToken(NonZeroU64);

impl BindingToken {
    /// The raw token value, for display and logging.
    pub fn get(self) -> u64 {
        self.0.get()
    }
}

/// Mints and remembers [`BindingToken`]s for element keys.
#[derive(Debug, Clone)]
pub struct TokenMint<K> {
    tokens: HashMap<K, BindingToken>,
    next: u64,
}

impl<K> Default for TokenMint<K> {
    fn default() -> Self {
        Self {
            tokens: HashMap::new(),
            next: 1,
        }
    }
}

impl<K: Copy + Eq + Hash> TokenMint<K> {
    /// Creates an empty mint.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the element's token, minting one on first contact.
    pub fn token_for(&mut self, key: K) -> BindingToken {
        if let Some(token) = self.tokens.get(&key) {
            return *token;
        }
        // `next` starts at 1 and only grows.
        let raw = NonZeroU64::new(self.next).unwrap_or(NonZeroU64::MIN);
        self.next += 1;
        let token = BindingToken(raw);
        self.tokens.insert(key, token);
        token
    }

    /// Returns the token of an element that has been seen before.
    pub fn get(&self, key: &K) -> Option<BindingToken> {
        self.tokens.get(key).copied()
    }

    /// Forgets every token. Future mints start fresh values.
    pub fn clear(&mut self) {
        self.tokens.clear();
    }
}

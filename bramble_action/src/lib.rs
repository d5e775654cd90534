// Copyright 2026 the Bramble Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bramble Action: a declarative, serializable action dispatcher.
//!
//! ## Overview
//!
//! This crate turns serializable [`ActionSpec`] values (plain `type` +
//! `payload` data with no function references) into pure state transitions
//! over an opaque key→value [`State`] map.
//!
//! - Register a transition function per action type with
//!   [`Dispatcher::register_handler`]; the last registration for a type wins.
//! - Wrap dispatch in an onion of [`Middleware`]; the first-registered
//!   middleware is outermost, so its pre-logic runs first and its post-logic
//!   runs last.
//! - [`Dispatcher::dispatch`] resolves the handler, runs the chain, and hands
//!   the resulting state to a caller-supplied `set_state` callback. Dispatch
//!   on an unknown type is a logged no-op, never a fault.
//!
//! A standard vocabulary of transitions (`UPDATE_VALUE`, `TOGGLE`,
//! `INCREMENT`, …) is pre-registered on every new dispatcher; see
//! [`builtin`] for the exact semantics.
//!
//! ## Minimal example
//!
//! ```
//! use bramble_action::{ActionSpec, Dispatcher, State};
//! use serde_json::json;
//!
//! let dispatcher = Dispatcher::new();
//! let state: State = json!({ "count": 0 }).as_object().unwrap().clone();
//!
//! let action = ActionSpec::new("INCREMENT").with_payload(json!({ "key": "count" }));
//! let mut next = None;
//! dispatcher.dispatch(&state, &action, |s| next = Some(s));
//! assert_eq!(next.unwrap()["count"], json!(1));
//! ```
//!
//! ## Failure semantics
//!
//! Unknown action types emit a warning and leave state untouched (`set_state`
//! is not called). Panics raised inside a handler or middleware are *not*
//! caught: a broken transition function is a programming error and propagates
//! to the caller.

pub mod builtin;
mod dispatcher;
mod types;

pub use dispatcher::{Dispatcher, Handler, Middleware};
pub use types::{ActionSpec, State, is_truthy};

/// Target used for all diagnostics emitted by this crate.
pub const LOG_TARGET: &str = "bramble::action";

// Copyright 2026 the Bramble Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bramble Host: glue between declarative components and the runtime.
//!
//! The lower crates are deliberately narrow: `bramble_action` turns
//! actions into state, `bramble_binding` turns events into actions,
//! `bramble_delegate` routes events along an element graph. This crate
//! assembles them into a component lifecycle:
//!
//! - [`HostBinding`] owns one component's state, dispatcher and event
//!   engine, selected by [`BindingStrategy`] (delegated by default).
//! - The [`shorthand`] module parses string handlers: `"dispatch:TYPE"`,
//!   call forms like `"track('nav', 2)"`, and bare names.
//! - [`NameRegistry`] resolves those names. Registries are injected per
//!   binding and chain to shared fallbacks, so there is no process-wide
//!   handler table.
//!
//! # Example
//!
//! ```rust
//! use bramble_action::ActionSpec;
//! use bramble_binding::{Event, EventHandlerSpec};
//! use bramble_host::HostBinding;
//! use serde_json::json;
//!
//! let state = json!({ "count": 0 }).as_object().unwrap().clone();
//! let mut binding: HostBinding<u32> = HostBinding::new(state);
//!
//! // A debounced counter button: bursts collapse to one increment.
//! let mut spec = EventHandlerSpec::new(
//!     "click",
//!     ActionSpec::new("INCREMENT").with_payload(json!({ "key": "count" })),
//! );
//! spec.debounce = Some(100);
//! binding.bind(1, vec![spec]).unwrap();
//!
//! binding.handle_event(&1, &Event::new("click", 0));
//! binding.handle_event(&1, &Event::new("click", 30));
//! assert_eq!(binding.state()["count"], json!(0));
//!
//! binding.poll(130);
//! assert_eq!(binding.state()["count"], json!(1));
//! ```

mod binding;
mod names;
pub mod shorthand;

pub use binding::{BindingStrategy, HostBinding};
pub use names::{HandlerError, NameRegistry, NamedHandler, ResolveError};
pub use shorthand::{Shorthand, ShorthandError};

/// Log target for all diagnostics emitted by this crate.
pub const LOG_TARGET: &str = "bramble::host";

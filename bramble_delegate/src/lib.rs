// Copyright 2026 the Bramble Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bramble Delegate: event delegation over an explicit element graph.
//!
//! Attaching one platform listener per binding scales badly and leaks
//! easily. This crate implements the delegated alternative: the host
//! installs exactly one shared listener per event type at its root, and a
//! [`DelegationTree`] routes each occurrence along the target's ancestry
//! itself.
//!
//! - Track elements with [`DelegationTree::register_element`]; the return
//!   value says which root listeners to install.
//! - Untracking an element reparents its children, so a removed container
//!   never orphans the bindings beneath it.
//! - [`DelegationTree::dispatch_event`] walks capture outermost→innermost,
//!   then bubble innermost→outermost, with a cooperative [`Propagation`]
//!   stop token instead of event mutation.
//! - Ancestry comes from the tree's own edges or from any
//!   [`ParentLookup`], so untracked intermediate elements are simply
//!   skipped.
//!
//! # Example
//!
//! ```rust
//! use bramble_action::ActionSpec;
//! use bramble_binding::{Event, EventHandlerSpec};
//! use bramble_delegate::DelegationTree;
//!
//! let mut tree: DelegationTree<u32> = DelegationTree::new();
//! let install = tree.register_element(
//!     1,
//!     vec![EventHandlerSpec::new("click", ActionSpec::new("MENU_TOGGLED"))],
//!     None,
//!     None,
//! );
//! assert_eq!(install, vec!["click".to_owned()]);
//!
//! // A child with no bindings of its own still bubbles into the parent.
//! tree.register_element(2, Vec::new(), None, Some(1));
//!
//! let mut seen = Vec::new();
//! tree.dispatch_event(&Event::new("click", 0), &2, &mut |action: ActionSpec, _: &Event| {
//!     seen.push(action.action_type);
//! });
//! assert_eq!(seen, ["MENU_TOGGLED"]);
//! ```

mod dispatch;
mod tree;

pub use dispatch::{ParentLookup, Propagation};
pub use tree::DelegationTree;

/// Log target for all diagnostics emitted by this crate.
pub const LOG_TARGET: &str = "bramble::delegate";

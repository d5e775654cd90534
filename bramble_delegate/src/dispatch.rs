// Copyright 2026 the Bramble Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The capture/bubble propagation walk.

use core::hash::Hash;

use tracing::debug;

use bramble_binding::{Disposition, Event, EventSink, Phase};

use crate::LOG_TARGET;
use crate::tree::DelegationTree;

/// Ancestry source for propagation paths.
///
/// The walk follows real ancestry upward from the event target, keeping
/// only tracked elements, so delegation works even when the target itself
/// or intermediate elements are not registered.
pub trait ParentLookup<K> {
    /// The parent of `node`, or `None` at a root.
    fn parent_of(&self, node: &K) -> Option<K>;
}

/// The tree's own edges as an ancestry source.
impl<K: Copy + Eq + Hash> ParentLookup<K> for DelegationTree<K> {
    fn parent_of(&self, node: &K) -> Option<K> {
        self.parent(node)
    }
}

/// Cooperative propagation control.
///
/// The walk carries this token instead of mutating the event. Once a
/// binding on some node asks to stop, no later node is visited in either
/// phase; the remaining bindings on the stopping node itself still run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Propagation {
    stopped: bool,
}

impl Propagation {
    /// Requests that no further node be visited.
    pub fn stop(&mut self) {
        self.stopped = true;
    }

    /// Whether a stop has been requested.
    pub fn is_stopped(&self) -> bool {
        self.stopped
    }
}

impl<K: Copy + Eq + Hash> DelegationTree<K> {
    /// Routes `event` from `target` using the tree's own edges as
    /// ancestry.
    ///
    /// This is the common case where the event target is a tracked
    /// element. Use [`Self::dispatch_event_with`] when the platform knows
    /// about elements the tree does not.
    pub fn dispatch_event(
        &mut self,
        event: &Event,
        target: &K,
        sink: &mut impl EventSink,
    ) -> Disposition {
        let path = self.propagation_path(target, |tree, node| tree.parent(node));
        self.walk(event, &path, sink)
    }

    /// Routes `event` from `target`, deriving ancestry from `parents`.
    ///
    /// Ancestors unknown to the tree are skipped; everything tracked along
    /// the real ancestry still sees the event in the right order.
    pub fn dispatch_event_with(
        &mut self,
        event: &Event,
        target: &K,
        parents: &impl ParentLookup<K>,
        sink: &mut impl EventSink,
    ) -> Disposition {
        let path = self.propagation_path(target, |_, node| parents.parent_of(node));
        self.walk(event, &path, sink)
    }

    /// Collects the tracked elements on the target's ancestry, innermost
    /// first. Ancestry is assumed acyclic.
    fn propagation_path(&self, target: &K, parent_of: impl Fn(&Self, &K) -> Option<K>) -> Vec<K> {
        let mut path = Vec::new();
        let mut cursor = Some(*target);
        while let Some(node) = cursor {
            if self.contains(&node) {
                path.push(node);
            }
            cursor = parent_of(self, &node);
        }
        path
    }

    /// Capture phase outermost to innermost, then bubble phase innermost
    /// to outermost, honoring the stop token between nodes.
    fn walk(&mut self, event: &Event, path: &[K], sink: &mut impl EventSink) -> Disposition {
        let mut disposition = Disposition::default();
        if path.is_empty() || !self.routes(&event.event_type) {
            return disposition;
        }
        if self.debug() {
            debug!(
                target: LOG_TARGET,
                event_type = %event.event_type,
                path_len = path.len(),
                "routing event"
            );
        }
        let mut propagation = Propagation::default();
        for node in path.iter().rev() {
            if !self.node_listens(node, &event.event_type) {
                continue;
            }
            let step = self
                .registry
                .handle_event_in_phase(node, event, Phase::Capture, sink);
            disposition.absorb(step);
            if step.propagation_stopped {
                propagation.stop();
                break;
            }
        }
        if !propagation.is_stopped() {
            for node in path {
                if !self.node_listens(node, &event.event_type) {
                    continue;
                }
                let step = self
                    .registry
                    .handle_event_in_phase(node, event, Phase::Bubble, sink);
                disposition.absorb(step);
                if step.propagation_stopped {
                    propagation.stop();
                    break;
                }
            }
        }
        disposition
    }

    /// Fires matured debounced dispatches on every tracked element.
    pub fn poll(&mut self, now_ms: u64, sink: &mut impl EventSink) -> usize {
        self.registry.poll(now_ms, sink)
    }

    fn node_listens(&self, node: &K, event_type: &str) -> bool {
        self.nodes
            .get(node)
            .is_some_and(|n| n.listens.contains(event_type))
    }
}

// Copyright 2026 the Bramble Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The delegation graph and its listener accounting.

use core::hash::Hash;

use hashbrown::{HashMap, HashSet};
use tracing::{debug, warn};

use bramble_action::State;
use bramble_binding::{EventHandlerSpec, EventRegistry};

use crate::LOG_TARGET;

/// One tracked element.
#[derive(Debug, Clone)]
pub(crate) struct Node<K> {
    pub(crate) parent: Option<K>,
    pub(crate) children: Vec<K>,
    pub(crate) state: Option<State>,
    /// Event types this node has bindings for.
    pub(crate) listens: HashSet<String>,
}

/// An explicit parent/child graph of elements with delegated bindings.
///
/// Instead of attaching one platform listener per binding, the tree asks
/// the host to install exactly one shared root listener per event type and
/// routes every occurrence itself. The host learns which listeners to
/// install from the return value of [`DelegationTree::register_element`]
/// and which to tear down from [`DelegationTree::clear`].
///
/// Per-node bindings live in an embedded [`EventRegistry`], so delegated
/// bindings get the same debounce, throttle, `once` and history behavior
/// as direct ones. The propagation walk itself lives in
/// [`dispatch_event`](DelegationTree::dispatch_event).
#[derive(Debug)]
pub struct DelegationTree<K> {
    pub(crate) nodes: HashMap<K, Node<K>>,
    pub(crate) registry: EventRegistry<K>,
    root: Option<K>,
    installed: HashSet<String>,
    debug: bool,
}

impl<K> Default for DelegationTree<K> {
    fn default() -> Self {
        Self {
            nodes: HashMap::new(),
            registry: EventRegistry::default(),
            root: None,
            installed: HashSet::new(),
            debug: false,
        }
    }
}

impl<K: Copy + Eq + Hash> DelegationTree<K> {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables or disables diagnostics here and in the embedded registry.
    pub fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
        self.registry.set_debug(debug);
    }

    /// Whether diagnostics are enabled.
    pub fn debug(&self) -> bool {
        self.debug
    }

    /// Tracks `element` with its bindings, optional component state and
    /// optional parent.
    ///
    /// The first registered element becomes the root. A parent that is not
    /// tracked is ignored with a warning and the element joins the graph
    /// top-level. Re-registering an existing element replaces its bindings
    /// and state but keeps its edges.
    ///
    /// Returns the event types that now need a shared root listener and
    /// did not before. The host installs those on its platform root and
    /// feeds matching occurrences back through
    /// [`dispatch_event`](Self::dispatch_event).
    pub fn register_element(
        &mut self,
        element: K,
        handlers: Vec<EventHandlerSpec>,
        state: Option<State>,
        parent: Option<K>,
    ) -> Vec<String> {
        let parent = match parent {
            Some(p) if self.nodes.contains_key(&p) => Some(p),
            Some(_) => {
                warn!(
                    target: LOG_TARGET,
                    "parent is not a tracked element; registering top-level"
                );
                None
            }
            None => None,
        };

        if self.nodes.contains_key(&element) {
            // Replacement: drop the old bindings, keep the edges.
            self.registry.unregister_events(&element);
            if let Some(node) = self.nodes.get_mut(&element) {
                node.state = state;
                node.listens.clear();
            }
        } else {
            self.nodes.insert(
                element,
                Node {
                    parent,
                    children: Vec::new(),
                    state,
                    listens: HashSet::new(),
                },
            );
            if let Some(p) = parent
                && let Some(parent_node) = self.nodes.get_mut(&p)
            {
                parent_node.children.push(element);
            }
            if self.root.is_none() {
                self.root = Some(element);
            }
        }

        let mut newly_installed = Vec::new();
        for spec in handlers {
            let event_type = spec.event_type.clone();
            if !self.registry.register_event(element, spec) {
                continue;
            }
            if let Some(node) = self.nodes.get_mut(&element) {
                node.listens.insert(event_type.clone());
            }
            if self.installed.insert(event_type.clone()) {
                newly_installed.push(event_type);
            }
        }
        if self.debug {
            debug!(
                target: LOG_TARGET,
                new_listeners = newly_installed.len(),
                tracked = self.nodes.len(),
                "element registered"
            );
        }
        newly_installed
    }

    /// Stops tracking `element`.
    ///
    /// Its children are reparented to its former parent so the graph never
    /// holds an orphan, and a pending debounced dispatch dies with the
    /// bindings. Removing the root promotes one of its children (or any
    /// remaining top-level element) to root. Idempotent.
    pub fn unregister_element(&mut self, element: &K) {
        let Some(node) = self.nodes.remove(element) else {
            return;
        };
        self.registry.unregister_events(element);

        if let Some(p) = node.parent
            && let Some(parent_node) = self.nodes.get_mut(&p)
        {
            parent_node.children.retain(|c| c != element);
        }
        for child in &node.children {
            if let Some(child_node) = self.nodes.get_mut(child) {
                child_node.parent = node.parent;
            }
            if let Some(p) = node.parent
                && let Some(parent_node) = self.nodes.get_mut(&p)
            {
                parent_node.children.push(*child);
            }
        }
        if self.root == Some(*element) {
            self.root = node
                .children
                .first()
                .copied()
                .or_else(|| self.nodes.keys().next().copied());
        }
        if self.debug {
            debug!(
                target: LOG_TARGET,
                reparented = node.children.len(),
                tracked = self.nodes.len(),
                "element unregistered"
            );
        }
    }

    /// Drops every element and binding.
    ///
    /// Returns the event types whose shared root listeners the host should
    /// now uninstall.
    pub fn clear(&mut self) -> Vec<String> {
        self.nodes.clear();
        self.registry.clear();
        self.root = None;
        self.installed.drain().collect()
    }

    /// The current root element, if any.
    pub fn root(&self) -> Option<K> {
        self.root
    }

    /// Whether `element` is tracked.
    pub fn contains(&self, element: &K) -> bool {
        self.nodes.contains_key(element)
    }

    /// Number of tracked elements.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree tracks no elements.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The tracked parent of `element`.
    pub fn parent(&self, element: &K) -> Option<K> {
        self.nodes.get(element)?.parent
    }

    /// The tracked children of `element`, in registration order.
    pub fn children(&self, element: &K) -> &[K] {
        self.nodes
            .get(element)
            .map(|node| node.children.as_slice())
            .unwrap_or_default()
    }

    /// Event types with a shared root listener installed.
    pub fn installed_types(&self) -> impl Iterator<Item = &str> {
        self.installed.iter().map(String::as_str)
    }

    /// Whether occurrences of `event_type` are routed at all.
    pub fn routes(&self, event_type: &str) -> bool {
        self.installed.contains(event_type)
    }

    /// The component state stored with `element`, if any.
    pub fn state_of(&self, element: &K) -> Option<&State> {
        self.nodes.get(element)?.state.as_ref()
    }

    /// Replaces the component state stored with `element`.
    pub fn set_state(&mut self, element: &K, state: State) {
        if let Some(node) = self.nodes.get_mut(element) {
            node.state = Some(state);
        }
    }

    /// The embedded registry's delivery log, oldest first.
    pub fn event_history(&self) -> Vec<bramble_binding::EventLogEntry> {
        self.registry.event_history()
    }
}

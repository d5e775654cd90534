// Copyright 2026 the Bramble Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Declarative action types and state representation.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Opaque component state: a key→value mapping owned by the host.
///
/// The runtime never persists this; it only derives new states from old ones
/// via dispatched actions and hands the result back through `set_state`.
pub type State = serde_json::Map<String, Value>;

/// A serializable instruction describing one state transition.
///
/// Actions carry no executable code. The `type` selects a registered
/// transition function; `payload` parameterizes it. The two platform flags
/// (`preventDefault` / `stopPropagation` on the wire) are consumed by the
/// event layers before the action reaches the dispatcher.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActionSpec {
    /// Action type; resolves to at most one registered handler.
    #[serde(rename = "type")]
    pub action_type: String,
    /// Optional handler parameters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    /// Optional target hint for the consuming component.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    /// Suppress the platform default for the triggering event.
    #[serde(rename = "preventDefault", default)]
    pub prevent_default: bool,
    /// Stop further propagation of the triggering event.
    #[serde(rename = "stopPropagation", default)]
    pub stop_propagation: bool,
}

impl ActionSpec {
    /// Create an action of the given type with no payload.
    pub fn new(action_type: impl Into<String>) -> Self {
        Self {
            action_type: action_type.into(),
            payload: None,
            target: None,
            prevent_default: false,
            stop_propagation: false,
        }
    }

    /// Attach a payload.
    #[must_use]
    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Attach a target hint.
    #[must_use]
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Look up a field of the payload, if the payload is an object.
    pub fn payload_field(&self, field: &str) -> Option<&Value> {
        self.payload.as_ref()?.get(field)
    }

    /// The payload's `key` field as a string, the common addressing scheme
    /// of the built-in handlers.
    pub fn payload_key(&self) -> Option<&str> {
        self.payload_field("key")?.as_str()
    }
}

/// JSON truthiness: `null`, `false`, `0`, and `""` are false; everything
/// else (including empty arrays and objects) is true.
pub fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_) | Value::Object(_)) => true,
    }
}

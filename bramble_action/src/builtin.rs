// Copyright 2026 the Bramble Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Built-in transition vocabulary.
//!
//! Every [`Dispatcher`] starts with these handlers registered. All of them
//! address state through a `key` field on the payload:
//!
//! | type | payload | effect |
//! |---|---|---|
//! | `UPDATE_VALUE` | `{key, value}` | `state[key] = value` |
//! | `TOGGLE` | `{key}` | negate truthiness of `state[key]` |
//! | `INCREMENT` | `{key, amount?}` | add `amount` (default 1); missing key reads as 0 |
//! | `DECREMENT` | `{key, amount?}` | subtract `amount` (default 1); missing key reads as 0 |
//! | `ADD_TO_ARRAY` | `{key, value}` | append to array at `key` (default empty array) |
//! | `REMOVE_FROM_ARRAY` | `{key, value}` | drop elements equal to `value` |
//! | `SET_STATE` | object | shallow-merge payload into state |
//! | `RESET_STATE` | object? | replace state with payload (default `{}`) |
//!
//! A payload that does not fit the shape above (for example a missing `key`)
//! is a data error in the declarative description, not a programming error:
//! the state is returned unchanged and a warning names the offending action.

use serde_json::Value;
use tracing::warn;

use crate::LOG_TARGET;
use crate::dispatcher::Dispatcher;
use crate::types::{ActionSpec, State, is_truthy};

/// Register the built-in handlers on `dispatcher`.
pub(crate) fn install(dispatcher: &mut Dispatcher) {
    dispatcher.register_handler("UPDATE_VALUE", update_value);
    dispatcher.register_handler("TOGGLE", toggle);
    dispatcher.register_handler("INCREMENT", |state, action| adjust(state, action, 1));
    dispatcher.register_handler("DECREMENT", |state, action| adjust(state, action, -1));
    dispatcher.register_handler("ADD_TO_ARRAY", add_to_array);
    dispatcher.register_handler("REMOVE_FROM_ARRAY", remove_from_array);
    dispatcher.register_handler("SET_STATE", set_state);
    dispatcher.register_handler("RESET_STATE", reset_state);
}

fn missing_key(state: State, action: &ActionSpec) -> State {
    warn!(
        target: LOG_TARGET,
        action_type = %action.action_type,
        "payload is missing a string `key` field; state unchanged"
    );
    state
}

fn update_value(mut state: State, action: &ActionSpec) -> State {
    let Some(key) = action.payload_key() else {
        return missing_key(state, action);
    };
    let value = action.payload_field("value").cloned().unwrap_or(Value::Null);
    state.insert(key.to_owned(), value);
    state
}

fn toggle(mut state: State, action: &ActionSpec) -> State {
    let Some(key) = action.payload_key() else {
        return missing_key(state, action);
    };
    let flipped = !is_truthy(state.get(key));
    state.insert(key.to_owned(), Value::Bool(flipped));
    state
}

/// Shared body of `INCREMENT`/`DECREMENT`; `sign` is `1` or `-1`.
fn adjust(mut state: State, action: &ActionSpec, sign: i64) -> State {
    let Some(key) = action.payload_key() else {
        return missing_key(state, action);
    };
    let amount = action
        .payload_field("amount")
        .cloned()
        .unwrap_or_else(|| Value::from(1));
    let next = add_numbers(state.get(key), &amount, sign);
    state.insert(key.to_owned(), next);
    state
}

/// Add `sign * amount` to `current`, treating a missing or non-numeric
/// current value as 0. Integer representation is preserved when both
/// operands are integral and the sum does not overflow.
fn add_numbers(current: Option<&Value>, amount: &Value, sign: i64) -> Value {
    let current = match current {
        Some(Value::Number(n)) => n.clone(),
        _ => serde_json::Number::from(0),
    };
    let amount = match amount {
        Value::Number(n) => n.clone(),
        _ => serde_json::Number::from(0),
    };
    if let (Some(a), Some(b)) = (current.as_i64(), amount.as_i64())
        && let Some(sum) = b.checked_mul(sign).and_then(|delta| a.checked_add(delta))
    {
        return Value::from(sum);
    }
    let a = current.as_f64().unwrap_or(0.0);
    let b = amount.as_f64().unwrap_or(0.0);
    #[allow(clippy::cast_precision_loss, reason = "sign is plus or minus one")]
    let sign = sign as f64;
    Value::from(a + b * sign)
}

fn add_to_array(mut state: State, action: &ActionSpec) -> State {
    let Some(key) = action.payload_key() else {
        return missing_key(state, action);
    };
    let value = action.payload_field("value").cloned().unwrap_or(Value::Null);
    match state.get_mut(key) {
        Some(Value::Array(items)) => items.push(value),
        _ => {
            state.insert(key.to_owned(), Value::Array(vec![value]));
        }
    }
    state
}

fn remove_from_array(mut state: State, action: &ActionSpec) -> State {
    let Some(key) = action.payload_key() else {
        return missing_key(state, action);
    };
    let needle = action.payload_field("value").cloned().unwrap_or(Value::Null);
    if let Some(Value::Array(items)) = state.get_mut(key) {
        items.retain(|item| *item != needle);
    }
    state
}

fn set_state(mut state: State, action: &ActionSpec) -> State {
    match &action.payload {
        Some(Value::Object(updates)) => {
            for (key, value) in updates {
                state.insert(key.clone(), value.clone());
            }
            state
        }
        _ => {
            warn!(
                target: LOG_TARGET,
                action_type = %action.action_type,
                "SET_STATE payload must be an object; state unchanged"
            );
            state
        }
    }
}

fn reset_state(_state: State, action: &ActionSpec) -> State {
    match &action.payload {
        Some(Value::Object(replacement)) => replacement.clone(),
        None => State::new(),
        Some(_) => {
            warn!(
                target: LOG_TARGET,
                action_type = %action.action_type,
                "RESET_STATE payload must be an object; resetting to empty"
            );
            State::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn state_of(value: Value) -> State {
        value.as_object().unwrap().clone()
    }

    fn apply(state: Value, action_type: &str, payload: Value) -> State {
        let dispatcher = Dispatcher::new();
        let action = ActionSpec::new(action_type).with_payload(payload);
        let mut out = None;
        dispatcher.dispatch(&state_of(state), &action, |s| out = Some(s));
        out.expect("built-in handler should call set_state")
    }

    #[test]
    fn update_value_sets_the_addressed_key() {
        let next = apply(
            json!({ "name": "old" }),
            "UPDATE_VALUE",
            json!({ "key": "name", "value": "new" }),
        );
        assert_eq!(next, state_of(json!({ "name": "new" })));
    }

    #[test]
    fn toggle_negates_and_defaults_missing_keys_to_true() {
        let next = apply(json!({ "open": true }), "TOGGLE", json!({ "key": "open" }));
        assert_eq!(next["open"], json!(false));

        let next = apply(json!({}), "TOGGLE", json!({ "key": "open" }));
        assert_eq!(next["open"], json!(true));
    }

    #[test]
    fn increment_with_explicit_amount() {
        let next = apply(
            json!({ "count": 0 }),
            "INCREMENT",
            json!({ "key": "count", "amount": 5 }),
        );
        assert_eq!(next, state_of(json!({ "count": 5 })));
    }

    #[test]
    fn decrement_with_explicit_amount() {
        let next = apply(
            json!({ "count": 10 }),
            "DECREMENT",
            json!({ "key": "count", "amount": 3 }),
        );
        assert_eq!(next, state_of(json!({ "count": 7 })));
    }

    #[test]
    fn increment_defaults_amount_to_one_and_missing_key_to_zero() {
        let next = apply(json!({}), "INCREMENT", json!({ "key": "count" }));
        assert_eq!(next["count"], json!(1));

        let next = apply(json!({ "count": 41 }), "INCREMENT", json!({ "key": "count" }));
        assert_eq!(next["count"], json!(42));
    }

    #[test]
    fn increment_falls_back_to_float_arithmetic() {
        let next = apply(
            json!({ "ratio": 0.5 }),
            "INCREMENT",
            json!({ "key": "ratio", "amount": 0.25 }),
        );
        assert_eq!(next["ratio"], json!(0.75));
    }

    #[test]
    fn add_to_array_appends_and_creates_missing_arrays() {
        let next = apply(
            json!({ "items": ["a"] }),
            "ADD_TO_ARRAY",
            json!({ "key": "items", "value": "b" }),
        );
        assert_eq!(next["items"], json!(["a", "b"]));

        let next = apply(json!({}), "ADD_TO_ARRAY", json!({ "key": "items", "value": 1 }));
        assert_eq!(next["items"], json!([1]));
    }

    #[test]
    fn remove_from_array_filters_equal_values() {
        let next = apply(
            json!({ "items": ["a", "b", "c"] }),
            "REMOVE_FROM_ARRAY",
            json!({ "key": "items", "value": "b" }),
        );
        assert_eq!(next, state_of(json!({ "items": ["a", "c"] })));
    }

    #[test]
    fn remove_from_array_drops_every_match() {
        let next = apply(
            json!({ "items": [1, 2, 1, 3] }),
            "REMOVE_FROM_ARRAY",
            json!({ "key": "items", "value": 1 }),
        );
        assert_eq!(next["items"], json!([2, 3]));
    }

    #[test]
    fn set_state_shallow_merges() {
        let next = apply(
            json!({ "a": 1, "b": 2 }),
            "SET_STATE",
            json!({ "b": 20, "c": 30 }),
        );
        assert_eq!(next, state_of(json!({ "a": 1, "b": 20, "c": 30 })));
    }

    #[test]
    fn reset_state_replaces_entirely_and_defaults_to_empty() {
        let next = apply(json!({ "a": 1 }), "RESET_STATE", json!({ "fresh": true }));
        assert_eq!(next, state_of(json!({ "fresh": true })));

        let dispatcher = Dispatcher::new();
        let mut out = None;
        dispatcher.dispatch(
            &state_of(json!({ "a": 1 })),
            &ActionSpec::new("RESET_STATE"),
            |s| out = Some(s),
        );
        assert_eq!(out.unwrap(), State::new());
    }

    #[test]
    fn malformed_payload_leaves_state_unchanged() {
        let next = apply(json!({ "count": 2 }), "INCREMENT", json!({ "amount": 5 }));
        assert_eq!(next, state_of(json!({ "count": 2 })));
    }
}

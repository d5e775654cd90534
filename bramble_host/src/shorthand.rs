// Copyright 2026 the Bramble Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! String handler shorthand.
//!
//! Declarative handler maps may name their handlers as plain strings
//! instead of full action objects. Three forms are understood:
//!
//! | form | meaning |
//! |---|---|
//! | `"dispatch:SAVE"` | dispatch a `SAVE` action carrying the event as payload |
//! | `"logClick('nav', 2, true)"` | call the named handler with those arguments |
//! | `"closeMenu"` | bare name; a registered handler, else an action type |
//!
//! Call arguments are parsed as JSON literals where possible (numbers,
//! booleans, `null`, double-quoted strings, arrays, objects).
//! Single-quoted text and bare words are taken as strings.

use serde_json::Value;
use thiserror::Error;

/// A parsed string handler.
#[derive(Debug, Clone, PartialEq)]
pub enum Shorthand {
    /// `dispatch:TYPE`: a zero-config action of the given type.
    Dispatch(String),
    /// `name(args…)`: invoke a named handler with positional arguments.
    Call {
        /// Handler name to resolve.
        name: String,
        /// Positional arguments, parsed per the literal rules above.
        args: Vec<Value>,
    },
    /// A bare identifier.
    Name(String),
}

/// A string handler that cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShorthandError {
    /// The handler string is empty or whitespace.
    #[error("empty handler string")]
    Empty,
    /// `dispatch:` with nothing after the colon.
    #[error("`dispatch:` shorthand names no action type")]
    EmptyDispatchType,
    /// A call form with nothing before the parenthesis.
    #[error("call shorthand names no handler")]
    EmptyCallName,
    /// A call form without a closing parenthesis.
    #[error("call shorthand `{0}` is missing its closing parenthesis")]
    UnterminatedCall(String),
    /// A call form with an empty argument slot.
    #[error("call shorthand `{0}` has an empty argument")]
    EmptyArgument(String),
}

/// Parses one string handler.
pub fn parse(input: &str) -> Result<Shorthand, ShorthandError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ShorthandError::Empty);
    }
    if let Some(rest) = input.strip_prefix("dispatch:") {
        let action_type = rest.trim();
        if action_type.is_empty() {
            return Err(ShorthandError::EmptyDispatchType);
        }
        return Ok(Shorthand::Dispatch(action_type.to_owned()));
    }
    if let Some(open) = input.find('(') {
        let name = input[..open].trim();
        if name.is_empty() {
            return Err(ShorthandError::EmptyCallName);
        }
        let Some(body) = input[open + 1..].strip_suffix(')') else {
            return Err(ShorthandError::UnterminatedCall(input.to_owned()));
        };
        let args = parse_args(input, body)?;
        return Ok(Shorthand::Call {
            name: name.to_owned(),
            args,
        });
    }
    Ok(Shorthand::Name(input.to_owned()))
}

/// Splits `body` on top-level commas and parses each piece.
fn parse_args(whole: &str, body: &str) -> Result<Vec<Value>, ShorthandError> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }
    let mut args = Vec::new();
    let mut depth = 0_u32;
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (i, c) in body.char_indices() {
        match quote {
            Some(q) => {
                if c == q {
                    quote = None;
                }
            }
            None => match c {
                '"' | '\'' => quote = Some(c),
                '[' | '{' | '(' => depth += 1,
                ']' | '}' | ')' => depth = depth.saturating_sub(1),
                ',' if depth == 0 => {
                    args.push(parse_arg(whole, &body[start..i])?);
                    start = i + 1;
                }
                _ => {}
            },
        }
    }
    args.push(parse_arg(whole, &body[start..])?);
    Ok(args)
}

fn parse_arg(whole: &str, raw: &str) -> Result<Value, ShorthandError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ShorthandError::EmptyArgument(whole.to_owned()));
    }
    if raw.len() >= 2 && raw.starts_with('\'') && raw.ends_with('\'') {
        return Ok(Value::String(raw[1..raw.len() - 1].to_owned()));
    }
    // JSON literal if it is one, a plain string otherwise.
    Ok(serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_owned())))
}

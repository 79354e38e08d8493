//! Typed deck values and the token coercion rules.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Declared type of a schema item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ValueType {
    Int,
    Double,
    String,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Int => write!(f, "INT"),
            ValueType::Double => write!(f, "DOUBLE"),
            ValueType::String => write!(f, "STRING"),
        }
    }
}

/// A single coerced value inside a [`crate::DeckItem`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DeckValue {
    Int(i64),
    Double(f64),
    String(String),
}

impl DeckValue {
    pub fn value_type(&self) -> ValueType {
        match self {
            DeckValue::Int(_) => ValueType::Int,
            DeckValue::Double(_) => ValueType::Double,
            DeckValue::String(_) => ValueType::String,
        }
    }

    /// Placeholder stored for elements that have neither input nor a default.
    pub fn dummy(value_type: ValueType) -> Self {
        match value_type {
            ValueType::Int => DeckValue::Int(0),
            ValueType::Double => DeckValue::Double(0.0),
            ValueType::String => DeckValue::String(String::new()),
        }
    }

    /// Convert a JSON schema default into a value of the declared type.
    /// Integers are accepted for `DOUBLE` items; nothing else is converted.
    pub fn from_json(value: &serde_json::Value, value_type: ValueType) -> Option<Self> {
        match value_type {
            ValueType::Int => value.as_i64().map(DeckValue::Int),
            ValueType::Double => value.as_f64().map(DeckValue::Double),
            ValueType::String => value.as_str().map(|s| DeckValue::String(s.to_owned())),
        }
    }

    /// Coerce a raw token to `value_type`. Returns `None` when the token is
    /// not a valid literal of that type.
    pub fn coerce(token: &str, value_type: ValueType) -> Option<Self> {
        match value_type {
            ValueType::Int => parse_int(token).map(DeckValue::Int),
            ValueType::Double => parse_double(token).map(DeckValue::Double),
            ValueType::String => Some(DeckValue::String(unquote(token).to_owned())),
        }
    }
}

impl fmt::Display for DeckValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeckValue::Int(n) => write!(f, "{}", n),
            DeckValue::Double(x) => write!(f, "{}", x),
            DeckValue::String(s) => write!(f, "'{}'", s),
        }
    }
}

/// Extraction of a concrete Rust type from a [`DeckValue`].
pub trait FromDeckValue: Sized {
    const VALUE_TYPE: ValueType;

    fn from_deck_value(value: &DeckValue) -> Option<Self>;
}

impl FromDeckValue for i64 {
    const VALUE_TYPE: ValueType = ValueType::Int;

    fn from_deck_value(value: &DeckValue) -> Option<Self> {
        match value {
            DeckValue::Int(n) => Some(*n),
            _ => None,
        }
    }
}

impl FromDeckValue for i32 {
    const VALUE_TYPE: ValueType = ValueType::Int;

    fn from_deck_value(value: &DeckValue) -> Option<Self> {
        match value {
            DeckValue::Int(n) => i32::try_from(*n).ok(),
            _ => None,
        }
    }
}

impl FromDeckValue for f64 {
    const VALUE_TYPE: ValueType = ValueType::Double;

    fn from_deck_value(value: &DeckValue) -> Option<Self> {
        match value {
            DeckValue::Double(x) => Some(*x),
            _ => None,
        }
    }
}

impl FromDeckValue for String {
    const VALUE_TYPE: ValueType = ValueType::String;

    fn from_deck_value(value: &DeckValue) -> Option<Self> {
        match value {
            DeckValue::String(s) => Some(s.clone()),
            _ => None,
        }
    }
}

/// Integer literal: optional sign followed by decimal digits.
pub fn parse_int(token: &str) -> Option<i64> {
    let digits = token
        .strip_prefix(|c: char| c == '+' || c == '-')
        .unwrap_or(token);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    token.parse().ok()
}

/// Floating literal, accepting Fortran `D` exponents (`1.5D3`).
///
/// Rust's float parser also accepts `inf`/`nan`; deck input must be numeric,
/// so the token is restricted to digits, sign, point and exponent markers.
pub fn parse_double(token: &str) -> Option<f64> {
    let valid = token
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.' | b'e' | b'E' | b'd' | b'D'));
    if !valid || !token.bytes().any(|b| b.is_ascii_digit()) {
        return None;
    }
    let normalized: String = token
        .chars()
        .map(|c| if c == 'd' || c == 'D' { 'E' } else { c })
        .collect();
    normalized.parse().ok()
}

/// Strip one pair of matching surrounding quotes.
pub fn unquote(token: &str) -> &str {
    let bytes = token.as_bytes();
    if bytes.len() >= 2 {
        let first = bytes[0];
        let last = bytes[bytes.len() - 1];
        if (first == b'\'' || first == b'"') && first == last {
            return &token[1..token.len() - 1];
        }
    }
    token
}

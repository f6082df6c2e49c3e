//! Lexical value coercion
//!
//! Facet values, `fixed` and `default` are written as strings in XSD; in the
//! JSON Schema they must carry the JSON type of what they constrain.

use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::{Number, Value as JsonValue};

use crate::converters::JsonType;

/// Parse an XSD decimal/integer/float literal
pub fn parse_decimal(lexical: &str) -> Option<Decimal> {
    let trimmed = lexical.trim();
    if trimmed.is_empty() {
        return None;
    }
    Decimal::from_str(trimmed)
        .ok()
        .or_else(|| Decimal::from_scientific(trimmed).ok())
}

/// Convert a decimal to the narrowest JSON number
pub fn decimal_to_number(value: Decimal) -> Option<Number> {
    let value = value.normalize();
    if value.fract().is_zero() {
        if let Some(i) = value.to_i64() {
            return Some(Number::from(i));
        }
        if let Some(u) = value.to_u64() {
            return Some(Number::from(u));
        }
    }
    value.to_f64().and_then(Number::from_f64)
}

/// Read back a JSON number as a decimal
pub fn number_to_decimal(number: &Number) -> Option<Decimal> {
    if let Some(i) = number.as_i64() {
        return Some(Decimal::from(i));
    }
    if let Some(u) = number.as_u64() {
        return Some(Decimal::from(u));
    }
    number.as_f64().and_then(Decimal::from_f64_retain)
}

/// Parse a numeric literal straight to a JSON number
pub fn parse_number(lexical: &str) -> Option<Number> {
    parse_decimal(lexical).and_then(decimal_to_number)
}

/// Parse an XSD boolean literal
pub fn parse_boolean(lexical: &str) -> Option<bool> {
    match lexical.trim() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

/// Coerce a lexical value to the JSON type it constrains
///
/// With an unknown target, numeric strings become numbers and
/// `"true"`/`"false"` become booleans. Anything that does not parse stays a
/// string.
pub fn coerce(lexical: &str, target: Option<JsonType>) -> JsonValue {
    let coerced = match target {
        Some(JsonType::Integer) | Some(JsonType::Number) => parse_number(lexical).map(JsonValue::Number),
        Some(JsonType::Boolean) => parse_boolean(lexical).map(JsonValue::Bool),
        Some(_) => None,
        None => match lexical.trim() {
            "true" => Some(JsonValue::Bool(true)),
            "false" => Some(JsonValue::Bool(false)),
            trimmed if looks_numeric(trimmed) => parse_number(trimmed).map(JsonValue::Number),
            _ => None,
        },
    };
    coerced.unwrap_or_else(|| JsonValue::String(lexical.to_string()))
}

fn looks_numeric(s: &str) -> bool {
    let digits = s.strip_prefix(|c: char| c == '-' || c == '+').unwrap_or(s);
    !digits.is_empty()
        && digits.chars().any(|c| c.is_ascii_digit())
        && digits
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '-' | '+'))
}

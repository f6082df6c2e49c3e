//! Restriction facets
//!
//! Parses the facet children of an `xs:restriction` and applies them to the
//! JSON Schema of the restricted value. Facets without a JSON Schema
//! counterpart (`fractionDigits`, `whiteSpace`, assertions) are accepted and
//! dropped.

use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::converters::{JsonFragment, JsonType};
use crate::documents::Element;
use crate::mapping::values::{coerce, decimal_to_number, number_to_decimal, parse_number};

/// Largest `totalDigits` for which the integer bound is emitted
const MAX_BOUNDED_DIGITS: u32 = 18;

/// A constraining facet
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Facet {
    /// `xs:enumeration`
    Enumeration(String),
    /// `xs:pattern`
    Pattern(String),
    /// `xs:length`
    Length(u64),
    /// `xs:minLength`
    MinLength(u64),
    /// `xs:maxLength`
    MaxLength(u64),
    /// `xs:minInclusive`
    MinInclusive(String),
    /// `xs:maxInclusive`
    MaxInclusive(String),
    /// `xs:minExclusive`
    MinExclusive(String),
    /// `xs:maxExclusive`
    MaxExclusive(String),
    /// `xs:totalDigits`
    TotalDigits(u32),
    /// `xs:fractionDigits`
    FractionDigits(u32),
    /// `xs:whiteSpace`
    WhiteSpace(String),
}

impl Facet {
    /// Parse a facet element; `None` for non-facets and malformed values
    pub fn parse(element: &Element) -> Option<Facet> {
        let value = element.get_attribute("value");
        let name = element.local_name();

        let facet = match (name, value) {
            ("enumeration", Some(v)) => Facet::Enumeration(v.to_string()),
            ("pattern", Some(v)) => Facet::Pattern(v.to_string()),
            ("length", Some(v)) => Facet::Length(parse_count(name, v)?),
            ("minLength", Some(v)) => Facet::MinLength(parse_count(name, v)?),
            ("maxLength", Some(v)) => Facet::MaxLength(parse_count(name, v)?),
            ("minInclusive", Some(v)) => Facet::MinInclusive(v.trim().to_string()),
            ("maxInclusive", Some(v)) => Facet::MaxInclusive(v.trim().to_string()),
            ("minExclusive", Some(v)) => Facet::MinExclusive(v.trim().to_string()),
            ("maxExclusive", Some(v)) => Facet::MaxExclusive(v.trim().to_string()),
            ("totalDigits", Some(v)) => Facet::TotalDigits(parse_digits(name, v)?),
            ("fractionDigits", Some(v)) => Facet::FractionDigits(parse_digits(name, v)?),
            ("whiteSpace", Some(v)) => Facet::WhiteSpace(v.to_string()),
            ("annotation", _) | ("simpleType", _) | ("attribute", _)
            | ("attributeGroup", _) | ("anyAttribute", _) | ("sequence", _)
            | ("choice", _) | ("all", _) | ("group", _) => return None,
            (other, _) => {
                debug!(facet = other, "ignoring unsupported facet");
                return None;
            }
        };
        Some(facet)
    }

    /// Every facet child of a restriction, in document order
    pub fn collect(restriction: &Element) -> Vec<Facet> {
        restriction.xsd_children().filter_map(Facet::parse).collect()
    }
}

fn parse_count(facet: &str, value: &str) -> Option<u64> {
    match value.trim().parse::<u64>() {
        Ok(n) => Some(n),
        Err(_) => {
            warn!(facet, value, "ignoring facet with a non-numeric value");
            None
        }
    }
}

fn parse_digits(facet: &str, value: &str) -> Option<u32> {
    let count = parse_count(facet, value)?;
    match u32::try_from(count) {
        Ok(n) => Some(n),
        Err(_) => {
            warn!(facet, value, "ignoring facet with an out-of-range value");
            None
        }
    }
}

/// How facets are rendered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FacetOptions {
    /// Wrap patterns in `^(?:...)$` (XSD patterns match the whole value)
    pub anchor_patterns: bool,
}

/// Apply one restriction step's facets to `fragment`
///
/// `target` is the JSON type of the restricted value, when known; it decides
/// how values are coerced and which length keywords apply.
pub fn apply_facets(
    fragment: &mut JsonFragment,
    facets: &[Facet],
    target: Option<JsonType>,
    options: FacetOptions,
) {
    let mut enumeration = Vec::new();
    let mut patterns = Vec::new();

    for facet in facets {
        match facet {
            Facet::Enumeration(value) => enumeration.push(coerce(value, target)),
            Facet::Pattern(pattern) => patterns.push(pattern.as_str()),
            Facet::Length(n) => set_length(fragment, target, Some(*n), Some(*n)),
            Facet::MinLength(n) => set_length(fragment, target, Some(*n), None),
            Facet::MaxLength(n) => set_length(fragment, target, None, Some(*n)),
            Facet::MinInclusive(v) => {
                if let Some(n) = range_value("minInclusive", v, target) {
                    fragment.minimum = Some(n);
                }
            }
            Facet::MaxInclusive(v) => {
                if let Some(n) = range_value("maxInclusive", v, target) {
                    fragment.maximum = Some(n);
                }
            }
            Facet::MinExclusive(v) => {
                if let Some(n) = range_value("minExclusive", v, target) {
                    fragment.exclusive_minimum = Some(n);
                }
            }
            Facet::MaxExclusive(v) => {
                if let Some(n) = range_value("maxExclusive", v, target) {
                    fragment.exclusive_maximum = Some(n);
                }
            }
            Facet::TotalDigits(digits) => narrow_total_digits(fragment, *digits, target),
            Facet::FractionDigits(_) | Facet::WhiteSpace(_) => {}
        }
    }

    if !enumeration.is_empty() {
        fragment.enumeration = Some(enumeration);
    }
    if let Some(pattern) = combine_patterns(&patterns, options.anchor_patterns) {
        fragment.pattern = Some(pattern);
    }
}

/// Patterns of one restriction step are alternatives
pub fn combine_patterns(patterns: &[&str], anchor: bool) -> Option<String> {
    let combined = match patterns {
        [] => return None,
        [single] => single.to_string(),
        several => several
            .iter()
            .map(|p| format!("(?:{})", p))
            .collect::<Vec<_>>()
            .join("|"),
    };
    if anchor {
        Some(format!("^(?:{})$", combined))
    } else {
        Some(combined)
    }
}

fn set_length(fragment: &mut JsonFragment, target: Option<JsonType>, min: Option<u64>, max: Option<u64>) {
    match target {
        Some(JsonType::String) => {
            if min.is_some() {
                fragment.min_length = min;
            }
            if max.is_some() {
                fragment.max_length = max;
            }
        }
        Some(JsonType::Array) => {
            if min.is_some() {
                fragment.min_items = min;
            }
            if max.is_some() {
                fragment.max_items = max;
            }
        }
        other => debug!(json_type = ?other, "length facet does not apply"),
    }
}

fn range_value(facet: &str, value: &str, target: Option<JsonType>) -> Option<serde_json::Number> {
    if matches!(target, Some(t) if !t.is_numeric()) {
        debug!(facet, value, "range facet on a non-numeric type is dropped");
        return None;
    }
    let number = parse_number(value);
    if number.is_none() {
        debug!(facet, value, "range facet value is not a JSON number");
    }
    number
}

fn narrow_total_digits(fragment: &mut JsonFragment, digits: u32, target: Option<JsonType>) {
    if target != Some(JsonType::Integer) || digits == 0 || digits > MAX_BOUNDED_DIGITS {
        return;
    }
    let bound = Decimal::from(10_i64.pow(digits) - 1);

    let upper = fragment
        .maximum
        .as_ref()
        .and_then(number_to_decimal)
        .map_or(bound, |current| current.min(bound));
    let lower = fragment
        .minimum
        .as_ref()
        .and_then(number_to_decimal)
        .map_or(-bound, |current| current.max(-bound));

    fragment.maximum = decimal_to_number(upper);
    fragment.minimum = decimal_to_number(lower);
}

//! XSD built-in types
//!
//! The static table mapping each XSD built-in type name to its JSON Schema
//! rendition: a JSON type, an optional Draft-07 `format`, and the value range
//! of the bounded integer types.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::converters::{JsonFragment, JsonType};
use crate::mapping::values::parse_number;

/// One built-in type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuiltinType {
    /// Local name in the XSD namespace
    pub name: &'static str,
    /// JSON type of the values (None: anything)
    pub json_type: Option<JsonType>,
    /// Draft-07 format
    pub format: Option<&'static str>,
    /// Inclusive lower bound, as a literal
    pub minimum: Option<&'static str>,
    /// Inclusive upper bound, as a literal
    pub maximum: Option<&'static str>,
    /// Whitespace-separated list of strings (`IDREFS`, `NMTOKENS`, ...)
    pub list: bool,
}

impl BuiltinType {
    const fn new(name: &'static str, json_type: Option<JsonType>) -> Self {
        Self {
            name,
            json_type,
            format: None,
            minimum: None,
            maximum: None,
            list: false,
        }
    }

    const fn string(name: &'static str) -> Self {
        Self::new(name, Some(JsonType::String))
    }

    const fn formatted(name: &'static str, format: &'static str) -> Self {
        Self {
            format: Some(format),
            ..Self::string(name)
        }
    }

    const fn integer(name: &'static str, minimum: Option<&'static str>, maximum: Option<&'static str>) -> Self {
        Self {
            minimum,
            maximum,
            ..Self::new(name, Some(JsonType::Integer))
        }
    }

    const fn string_list(name: &'static str) -> Self {
        Self {
            list: true,
            ..Self::string(name)
        }
    }

    /// The JSON type of a value of this type, lists included
    pub fn value_type(&self) -> Option<JsonType> {
        if self.list {
            Some(JsonType::Array)
        } else {
            self.json_type
        }
    }

    /// The JSON Schema for a value of this type
    pub fn schema(&self) -> JsonFragment {
        let mut fragment = match self.json_type {
            Some(json_type) => JsonFragment::of_type(json_type),
            None => JsonFragment::any(),
        };
        fragment.format = self.format.map(str::to_string);
        fragment.minimum = self.minimum.and_then(parse_number);
        fragment.maximum = self.maximum.and_then(parse_number);

        if self.list {
            JsonFragment::array_of(fragment)
        } else {
            fragment
        }
    }
}

const BUILTIN_TYPES: &[BuiltinType] = &[
    // Anything
    BuiltinType::new("anyType", None),
    BuiltinType::new("anySimpleType", None),
    BuiltinType::new("anyAtomicType", None),
    // Numbers
    BuiltinType::new("decimal", Some(JsonType::Number)),
    BuiltinType::new("float", Some(JsonType::Number)),
    BuiltinType::new("double", Some(JsonType::Number)),
    BuiltinType::integer("integer", None, None),
    BuiltinType::integer("long", Some("-9223372036854775808"), Some("9223372036854775807")),
    BuiltinType::integer("int", Some("-2147483648"), Some("2147483647")),
    BuiltinType::integer("short", Some("-32768"), Some("32767")),
    BuiltinType::integer("byte", Some("-128"), Some("127")),
    BuiltinType::integer("nonNegativeInteger", Some("0"), None),
    BuiltinType::integer("positiveInteger", Some("1"), None),
    BuiltinType::integer("nonPositiveInteger", None, Some("0")),
    BuiltinType::integer("negativeInteger", None, Some("-1")),
    BuiltinType::integer("unsignedLong", Some("0"), Some("18446744073709551615")),
    BuiltinType::integer("unsignedInt", Some("0"), Some("4294967295")),
    BuiltinType::integer("unsignedShort", Some("0"), Some("65535")),
    BuiltinType::integer("unsignedByte", Some("0"), Some("255")),
    // Booleans
    BuiltinType::new("boolean", Some(JsonType::Boolean)),
    // Strings
    BuiltinType::string("string"),
    BuiltinType::string("normalizedString"),
    BuiltinType::string("token"),
    BuiltinType::string("language"),
    BuiltinType::string("Name"),
    BuiltinType::string("NCName"),
    BuiltinType::string("NMTOKEN"),
    BuiltinType::string("ID"),
    BuiltinType::string("IDREF"),
    BuiltinType::string("ENTITY"),
    BuiltinType::string("QName"),
    BuiltinType::string("NOTATION"),
    BuiltinType::string("base64Binary"),
    BuiltinType::string("hexBinary"),
    BuiltinType::formatted("anyURI", "uri-reference"),
    // Lists
    BuiltinType::string_list("IDREFS"),
    BuiltinType::string_list("ENTITIES"),
    BuiltinType::string_list("NMTOKENS"),
    // Dates and times
    BuiltinType::formatted("dateTime", "date-time"),
    BuiltinType::formatted("dateTimeStamp", "date-time"),
    BuiltinType::formatted("date", "date"),
    BuiltinType::formatted("time", "time"),
    BuiltinType::string("gYearMonth"),
    BuiltinType::string("gYear"),
    BuiltinType::string("gMonthDay"),
    BuiltinType::string("gDay"),
    BuiltinType::string("gMonth"),
    BuiltinType::string("duration"),
    BuiltinType::string("dayTimeDuration"),
    BuiltinType::string("yearMonthDuration"),
];

static BUILTINS: Lazy<HashMap<&'static str, &'static BuiltinType>> =
    Lazy::new(|| BUILTIN_TYPES.iter().map(|t| (t.name, t)).collect());

/// Look up a built-in type by local name
pub fn lookup(local_name: &str) -> Option<&'static BuiltinType> {
    BUILTINS.get(local_name).copied()
}

/// Whether `local_name` names a built-in type
pub fn is_builtin(local_name: &str) -> bool {
    BUILTINS.contains_key(local_name)
}

/// All built-in types
pub fn all() -> impl Iterator<Item = &'static BuiltinType> {
    BUILTIN_TYPES.iter()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_table_has_unique_names() {
        assert_eq!(BUILTINS.len(), BUILTIN_TYPES.len());
    }

    #[test]
    fn test_scalar_schemas() {
        assert_eq!(lookup("string").unwrap().schema().to_value(), json!({"type": "string"}));
        assert_eq!(
            lookup("dateTime").unwrap().schema().to_value(),
            json!({"type": "string", "format": "date-time"})
        );
        assert_eq!(lookup("decimal").unwrap().schema().to_value(), json!({"type": "number"}));
        assert_eq!(lookup("anyType").unwrap().schema().to_value(), json!({}));
    }

    #[test]
    fn test_bounded_integers() {
        assert_eq!(
            lookup("byte").unwrap().schema().to_value(),
            json!({"type": "integer", "minimum": -128, "maximum": 127})
        );
        assert_eq!(
            lookup("positiveInteger").unwrap().schema().to_value(),
            json!({"type": "integer", "minimum": 1})
        );
        assert_eq!(
            lookup("unsignedLong").unwrap().schema().to_value(),
            json!({"type": "integer", "minimum": 0, "maximum": 18446744073709551615u64})
        );
    }

    #[test]
    fn test_list_builtins() {
        let nmtokens = lookup("NMTOKENS").unwrap();
        assert_eq!(nmtokens.value_type(), Some(JsonType::Array));
        assert_eq!(
            nmtokens.schema().to_value(),
            json!({"type": "array", "items": {"type": "string"}})
        );
    }

    #[test]
    fn test_unknown_names() {
        assert!(lookup("strnig").is_none());
        assert!(!is_builtin("bookType"));
        assert!(all().any(|t| t.name == "gYear"));
    }
}

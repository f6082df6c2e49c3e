//! JSON Schema fragments
//!
//! [`JsonFragment`] is the output tree of the translator: one struct holding
//! every Draft-07 keyword the translator emits. Unset keywords are skipped on
//! serialization, so a default fragment serializes to `{}` (accept anything).

use indexmap::IndexMap;
use serde::ser::{SerializeSeq, Serializer};
use serde::Serialize;
use serde_json::{Number, Value as JsonValue};

/// Prefix of every internal definition reference
pub const DEFINITIONS_POINTER: &str = "#/definitions/";

/// JSON Schema primitive types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JsonType {
    /// `"string"`
    String,
    /// `"number"`
    Number,
    /// `"integer"`
    Integer,
    /// `"boolean"`
    Boolean,
    /// `"object"`
    Object,
    /// `"array"`
    Array,
    /// `"null"`
    Null,
}

impl JsonType {
    /// Whether values of this type are JSON numbers
    pub fn is_numeric(self) -> bool {
        matches!(self, JsonType::Number | JsonType::Integer)
    }
}

/// Coarse shape of a fragment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentKind {
    /// `{"$ref": ...}`
    Reference,
    /// Object with properties
    Object,
    /// Array with items
    Array,
    /// Scalar type with constraints
    Scalar,
    /// `oneOf`/`allOf` without a type of its own
    Composite,
    /// The empty schema
    Any,
}

/// A JSON Schema (sub)document
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct JsonFragment {
    /// `$ref`
    #[serde(rename = "$ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    /// `type` (one value, or an array when nullable)
    #[serde(
        rename = "type",
        skip_serializing_if = "Vec::is_empty",
        serialize_with = "serialize_types"
    )]
    pub types: Vec<JsonType>,
    /// `format`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// `description`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// `enum`
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enumeration: Option<Vec<JsonValue>>,
    /// `const`
    #[serde(rename = "const", skip_serializing_if = "Option::is_none")]
    pub constant: Option<JsonValue>,
    /// `default`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<JsonValue>,
    /// `pattern`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// `minLength`
    #[serde(rename = "minLength", skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,
    /// `maxLength`
    #[serde(rename = "maxLength", skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,
    /// `minimum`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<Number>,
    /// `maximum`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<Number>,
    /// `exclusiveMinimum`
    #[serde(rename = "exclusiveMinimum", skip_serializing_if = "Option::is_none")]
    pub exclusive_minimum: Option<Number>,
    /// `exclusiveMaximum`
    #[serde(rename = "exclusiveMaximum", skip_serializing_if = "Option::is_none")]
    pub exclusive_maximum: Option<Number>,
    /// `items`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<JsonFragment>>,
    /// `minItems`
    #[serde(rename = "minItems", skip_serializing_if = "Option::is_none")]
    pub min_items: Option<u64>,
    /// `maxItems`
    #[serde(rename = "maxItems", skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u64>,
    /// `properties`
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, JsonFragment>,
    /// `required`
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    /// `additionalProperties`
    #[serde(
        rename = "additionalProperties",
        skip_serializing_if = "Option::is_none"
    )]
    pub additional_properties: Option<bool>,
    /// `oneOf`
    #[serde(rename = "oneOf", skip_serializing_if = "Vec::is_empty")]
    pub one_of: Vec<JsonFragment>,
    /// `anyOf`
    #[serde(rename = "anyOf", skip_serializing_if = "Vec::is_empty")]
    pub any_of: Vec<JsonFragment>,
    /// `allOf`
    #[serde(rename = "allOf", skip_serializing_if = "Vec::is_empty")]
    pub all_of: Vec<JsonFragment>,
    /// `not`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not: Option<Box<JsonFragment>>,
    /// Set on the use of a global type or element; keywords attached to such
    /// a use wrap it instead of being merged into it
    #[serde(skip)]
    pub opaque: bool,
}

#[allow(clippy::ptr_arg)]
fn serialize_types<S: Serializer>(types: &Vec<JsonType>, serializer: S) -> Result<S::Ok, S::Error> {
    if let [single] = types.as_slice() {
        single.serialize(serializer)
    } else {
        let mut seq = serializer.serialize_seq(Some(types.len()))?;
        for json_type in types {
            seq.serialize_element(json_type)?;
        }
        seq.end()
    }
}

impl JsonFragment {
    /// The empty schema `{}`
    pub fn any() -> Self {
        Self::default()
    }

    /// `{"type": <json_type>}`
    pub fn of_type(json_type: JsonType) -> Self {
        Self {
            types: vec![json_type],
            ..Self::default()
        }
    }

    /// An object schema with nothing else
    pub fn object() -> Self {
        Self::of_type(JsonType::Object)
    }

    /// `{"$ref": "#/definitions/<name>"}`
    pub fn reference(definition: &str) -> Self {
        Self {
            reference: Some(format!("{}{}", DEFINITIONS_POINTER, definition)),
            opaque: true,
            ..Self::default()
        }
    }

    /// `{"type": "array", "items": <items>}`
    pub fn array_of(items: JsonFragment) -> Self {
        Self {
            types: vec![JsonType::Array],
            items: Some(Box::new(items)),
            ..Self::default()
        }
    }

    /// `{"oneOf": [...]}`
    pub fn one_of(options: Vec<JsonFragment>) -> Self {
        Self {
            one_of: options,
            ..Self::default()
        }
    }

    /// `{"anyOf": [...]}`
    pub fn any_of(options: Vec<JsonFragment>) -> Self {
        Self {
            any_of: options,
            ..Self::default()
        }
    }

    /// `{"not": <schema>}`
    pub fn not(schema: JsonFragment) -> Self {
        Self {
            not: Some(Box::new(schema)),
            ..Self::default()
        }
    }

    /// `{"required": [...]}` with nothing else
    pub fn requiring(names: Vec<String>) -> Self {
        Self {
            required: names,
            ..Self::default()
        }
    }

    /// `{"allOf": [...]}`
    pub fn all_of(parts: Vec<JsonFragment>) -> Self {
        Self {
            all_of: parts,
            ..Self::default()
        }
    }

    /// Mark this fragment as the use of a global declaration
    pub fn into_opaque(mut self) -> Self {
        self.opaque = true;
        self
    }

    /// Whether this is the empty schema
    pub fn is_any(&self) -> bool {
        let mut plain = self.clone();
        plain.opaque = false;
        plain == Self::default()
    }

    /// The single JSON type of this fragment, if it has exactly one
    pub fn single_type(&self) -> Option<JsonType> {
        match self.types.as_slice() {
            [single] => Some(*single),
            _ => None,
        }
    }

    /// Coarse shape of this fragment
    pub fn kind(&self) -> FragmentKind {
        if self.reference.is_some() {
            FragmentKind::Reference
        } else if self.types.contains(&JsonType::Object) {
            FragmentKind::Object
        } else if self.types.contains(&JsonType::Array) {
            FragmentKind::Array
        } else if !self.types.is_empty() {
            FragmentKind::Scalar
        } else if !self.one_of.is_empty()
            || !self.any_of.is_empty()
            || !self.all_of.is_empty()
            || self.not.is_some()
        {
            FragmentKind::Composite
        } else {
            FragmentKind::Any
        }
    }

    /// Wrap an opaque use so that keywords can be attached next to it
    fn open(self) -> Self {
        if self.opaque {
            Self::all_of(vec![self])
        } else {
            self
        }
    }

    /// Attach a `description`
    pub fn with_description(self, description: impl Into<String>) -> Self {
        let mut out = self.open();
        out.description = Some(description.into());
        out
    }

    /// Attach a `const`
    pub fn with_const(self, value: JsonValue) -> Self {
        let mut out = self.open();
        out.constant = Some(value);
        out
    }

    /// Attach a `default`
    pub fn with_default(self, value: JsonValue) -> Self {
        let mut out = self.open();
        out.default = Some(value);
        out
    }

    /// Also accept `null`
    ///
    /// A typed fragment gets `"null"` added to its `type` (and to its `enum`);
    /// references and composites are wrapped as `oneOf` with `{"type":"null"}`.
    /// The empty schema already accepts `null`.
    pub fn nullable(mut self) -> Self {
        if self.opaque || (self.types.is_empty() && !self.is_any()) {
            return Self::one_of(vec![self, Self::of_type(JsonType::Null)]);
        }
        if !self.types.is_empty() && !self.types.contains(&JsonType::Null) {
            self.types.push(JsonType::Null);
            if let Some(values) = &mut self.enumeration {
                if !values.contains(&JsonValue::Null) {
                    values.push(JsonValue::Null);
                }
            }
        }
        self
    }

    /// Serialize to a JSON value
    pub fn to_value(&self) -> JsonValue {
        serde_json::to_value(self).unwrap_or(JsonValue::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_empty_fragment_is_empty_schema() {
        assert_eq!(JsonFragment::any().to_value(), json!({}));
        assert_eq!(JsonFragment::any().kind(), FragmentKind::Any);
    }

    #[test]
    fn test_scalar_serialization() {
        let fragment = JsonFragment {
            max_length: Some(10),
            pattern: Some("[A-Z]+".to_string()),
            ..JsonFragment::of_type(JsonType::String)
        };
        assert_eq!(
            fragment.to_value(),
            json!({"type": "string", "maxLength": 10, "pattern": "[A-Z]+"})
        );
    }

    #[test]
    fn test_nullable_scalar_uses_type_array() {
        let fragment = JsonFragment {
            enumeration: Some(vec![json!("A")]),
            ..JsonFragment::of_type(JsonType::String)
        }
        .nullable();
        assert_eq!(
            fragment.to_value(),
            json!({"type": ["string", "null"], "enum": ["A", null]})
        );
    }

    #[test]
    fn test_opaque_use_is_wrapped() {
        let reference = JsonFragment::reference("T");
        assert_eq!(reference.kind(), FragmentKind::Reference);

        let described = reference.clone().with_description("doc");
        assert_eq!(
            described.to_value(),
            json!({"allOf": [{"$ref": "#/definitions/T"}], "description": "doc"})
        );

        assert_eq!(
            reference.nullable().to_value(),
            json!({"oneOf": [{"$ref": "#/definitions/T"}, {"type": "null"}]})
        );
    }

    #[test]
    fn test_any_stays_any_when_nullable() {
        assert_eq!(JsonFragment::any().nullable().to_value(), json!({}));
    }

    #[test]
    fn test_negated_alternatives() {
        let absent = JsonFragment::not(JsonFragment::any_of(vec![
            JsonFragment::requiring(vec!["a".to_string()]),
            JsonFragment::requiring(vec!["b".to_string()]),
        ]));
        assert_eq!(absent.kind(), FragmentKind::Composite);
        assert_eq!(
            absent.to_value(),
            json!({"not": {"anyOf": [{"required": ["a"]}, {"required": ["b"]}]}})
        );
    }
}

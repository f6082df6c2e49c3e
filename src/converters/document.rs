//! The output document

use std::io::Write;

use indexmap::IndexMap;
use serde_json::{Map, Value as JsonValue};

use crate::converters::elements::Particle;
use crate::converters::JsonFragment;
use crate::error::Result;

/// Draft-07 meta-schema URI
pub const DRAFT_07: &str = "http://json-schema.org/draft-07/schema#";

/// A complete JSON Schema document
#[derive(Debug, Clone, PartialEq)]
pub struct JsonSchemaDocument {
    /// `title`
    pub title: String,
    /// `$id`, when the main schema has a target namespace
    pub id: Option<String>,
    /// Names of the root elements, in declaration order
    pub roots: Vec<String>,
    /// The root schema, merged at top level
    pub root: JsonFragment,
    /// `definitions` (referenced mode only)
    pub definitions: IndexMap<String, JsonFragment>,
}

impl JsonSchemaDocument {
    /// Build the envelope around the root element schemas
    ///
    /// Each root becomes `{"type":"object","properties":{name: ...},
    /// "required":[name]}`; a single root is the document itself, several
    /// are alternatives.
    pub fn from_roots(
        roots: Vec<(String, JsonFragment)>,
        target_namespace: Option<&str>,
        definitions: IndexMap<String, JsonFragment>,
    ) -> Self {
        let names: Vec<String> = roots.iter().map(|(name, _)| name.clone()).collect();
        let mut options: Vec<JsonFragment> = roots
            .into_iter()
            .map(|(name, schema)| {
                Particle {
                    name,
                    schema,
                    required: true,
                }
                .into_option()
            })
            .collect();

        let (title, stem, root) = match (names.as_slice(), options.pop()) {
            ([single], Some(option)) => (format!("Schema for {}", single), single.as_str(), option),
            (_, last) => {
                options.extend(last);
                let title = format!("Root Schema for {}", target_namespace.unwrap_or("document"));
                let root = if options.is_empty() {
                    JsonFragment::any()
                } else {
                    JsonFragment::one_of(options)
                };
                (title, "document", root)
            }
        };
        let id = target_namespace.map(|namespace| format!("{}/{}.json", namespace, stem));

        Self {
            title,
            id,
            roots: names,
            root,
            definitions,
        }
    }

    /// The document as a JSON value
    pub fn to_value(&self) -> JsonValue {
        let mut map = Map::new();
        map.insert("$schema".to_string(), JsonValue::String(DRAFT_07.to_string()));
        map.insert("title".to_string(), JsonValue::String(self.title.clone()));
        if let Some(id) = &self.id {
            map.insert("$id".to_string(), JsonValue::String(id.clone()));
        }
        if let JsonValue::Object(root) = self.root.to_value() {
            map.extend(root);
        }
        if !self.definitions.is_empty() {
            let definitions = self
                .definitions
                .iter()
                .map(|(name, fragment)| (name.clone(), fragment.to_value()))
                .collect();
            map.insert("definitions".to_string(), JsonValue::Object(definitions));
        }
        JsonValue::Object(map)
    }

    /// Compact JSON text
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.to_value())?)
    }

    /// Indented JSON text
    pub fn to_string_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_value())?)
    }

    /// Write the document as JSON text
    pub fn write_to<W: Write>(&self, writer: W, pretty: bool) -> Result<()> {
        let value = self.to_value();
        if pretty {
            serde_json::to_writer_pretty(writer, &value)?;
        } else {
            serde_json::to_writer(writer, &value)?;
        }
        Ok(())
    }
}

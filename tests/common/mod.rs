//! Shared helpers for the integration tests

#![allow(dead_code)]

use std::path::PathBuf;

use serde_json::{Map, Value};
use xsdtojson::{
    convert, ConversionOptions, Location, MemoryReader, OutputMode, ResolverOptions, Result,
};

pub const XS: &str = "http://www.w3.org/2001/XMLSchema";

/// A schema document with the `xs` prefix and the `t` prefix bound to `urn:t`
pub fn schema(body: &str) -> String {
    format!(
        r#"<xs:schema xmlns:xs="{}" xmlns:t="urn:t" targetNamespace="urn:t">{}</xs:schema>"#,
        XS, body
    )
}

/// A schema document without a target namespace
pub fn plain_schema(body: &str) -> String {
    format!(r#"<xs:schema xmlns:xs="{}">{}</xs:schema>"#, XS, body)
}

/// Convert in-memory sources; the first one is the main schema
pub fn convert_sources(sources: &[(&str, String)], mode: OutputMode) -> Result<Value> {
    let mut reader = MemoryReader::new();
    for (location, content) in sources {
        reader.insert(&Location::parse(location), content.clone());
    }
    let main = Location::parse(sources[0].0);
    let options = ConversionOptions::default().with_mode(mode);
    let document = convert(&main, reader, ResolverOptions::default(), &options)?;
    Ok(document.to_value())
}

/// Convert a single schema body (see [`schema`])
pub fn convert_body(body: &str, mode: OutputMode) -> Result<Value> {
    convert_sources(&[("main.xsd", schema(body))], mode)
}

/// The `definitions` entry of a converted document
pub fn definition<'a>(document: &'a Value, name: &str) -> &'a Value {
    &document["definitions"][name]
}

/// Substitute every `$ref` by its definition and drop `definitions`
///
/// Only meaningful for acyclic documents.
pub fn dereference(document: &Value) -> Value {
    let definitions = document
        .get("definitions")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();
    let mut out = substitute(document, &definitions);
    if let Value::Object(map) = &mut out {
        map.remove("definitions");
    }
    out
}

fn substitute(value: &Value, definitions: &Map<String, Value>) -> Value {
    match value {
        Value::Object(map) => {
            if let Some(Value::String(pointer)) = map.get("$ref") {
                let name = pointer.trim_start_matches("#/definitions/");
                let target = definitions
                    .get(name)
                    .unwrap_or_else(|| panic!("dangling reference {}", pointer));
                return substitute(target, definitions);
            }
            Value::Object(
                map.iter()
                    .map(|(key, value)| (key.clone(), substitute(value, definitions)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.iter().map(|v| substitute(v, definitions)).collect()),
        other => other.clone(),
    }
}

/// Directory of the on-disk fixtures
pub fn fixtures_dir() -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path
}

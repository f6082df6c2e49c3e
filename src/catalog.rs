//! XML Catalog support for schema location resolution
//!
//! An OASIS XML catalog maps the identifiers written in `schemaLocation`
//! attributes (URNs, remote URLs) to locally readable locations, and maps
//! namespace names to the schema that defines them for `import`s without a
//! `schemaLocation`.
//!
//! XML Catalogs are defined by OASIS:
//! https://www.oasis-open.org/committees/entity/spec-2001-08-06.html
//!
//! # Supported Elements
//!
//! - `<catalog>` - Root element
//! - `<group>` - Grouping element (honours `xml:base`)
//! - `<system>` - Maps system identifiers to URIs
//! - `<uri>` - Maps URN names (and namespace names) to URIs
//! - `<rewriteSystem>` / `<rewriteURI>` - Prefix rewriting
//! - `<nextCatalog>` - Includes another catalog file
//!
//! # Example
//!
//! ```xml
//! <catalog xmlns="urn:oasis:names:tc:entity:xmlns:xml:catalog">
//!   <system systemId="urn:example:order.xsd" uri="xsd/order.xsd"/>
//!   <uri name="http://example.com/common" uri="xsd/common.xsd"/>
//!   <nextCatalog catalog="base/catalog.xml"/>
//! </catalog>
//! ```

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::documents::{Document, Element};
use crate::error::{Error, Result};
use crate::limits::Limits;
use crate::loaders::SourceReader;
use crate::locations::Location;
use crate::namespaces::XML_NAMESPACE;

/// Nesting bound for `nextCatalog` chains
const MAX_CATALOG_CHAIN: usize = 32;

/// XML Catalog for resolving schema locations
#[derive(Debug, Clone, Default)]
pub struct XmlCatalog {
    /// System ID to location mappings
    system_mappings: IndexMap<String, Location>,
    /// URI name to location mappings
    uri_mappings: IndexMap<String, Location>,
    /// Prefix rewrites (start string, replacement prefix, catalog location)
    rewrites: Vec<(String, String, Location)>,
}

impl XmlCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a catalog (and every catalog it chains to) through `reader`
    pub fn load<R: SourceReader>(location: &Location, reader: &R) -> Result<Self> {
        let mut catalog = Self::new();
        catalog.load_into(location, reader, 0)?;
        Ok(catalog)
    }

    /// Parse catalog XML held in memory, resolving relative URIs against `base`
    pub fn parse_str(xml: &str, base: &Location) -> Result<Self> {
        let mut catalog = Self::new();
        let doc = Document::from_string(xml)?;
        catalog.process_document(&doc, base, None::<&NoReader>, 0)?;
        Ok(catalog)
    }

    fn load_into<R: SourceReader>(
        &mut self,
        location: &Location,
        reader: &R,
        depth: usize,
    ) -> Result<()> {
        if depth > MAX_CATALOG_CHAIN {
            return Err(Error::LimitExceeded(format!(
                "nextCatalog chain deeper than {} at {}",
                MAX_CATALOG_CHAIN, location
            )));
        }

        let bytes = reader.read(location).map_err(|e| {
            Error::source_error(location.as_str(), format!("failed to read catalog: {}", e))
        })?;
        let doc = Document::parse(&bytes, &Limits::default()).map_err(|e| match e {
            Error::Xml(message) => Error::source_error(location.as_str(), message),
            other => other,
        })?;

        self.process_document(&doc, location, Some(reader), depth)
    }

    fn process_document<R: SourceReader>(
        &mut self,
        doc: &Document,
        base: &Location,
        reader: Option<&R>,
        depth: usize,
    ) -> Result<()> {
        let root = doc
            .root()
            .ok_or_else(|| Error::source_error(base.as_str(), "empty catalog document"))?;

        if root.local_name() != "catalog" {
            return Err(Error::source_error(
                base.as_str(),
                format!("expected catalog root element, got {}", root.local_name()),
            ));
        }

        self.process_children(root, base, "", reader, depth)
    }

    /// Process children of a catalog or group element
    ///
    /// `xml_base` is the directory prefix contributed by enclosing groups.
    fn process_children<R: SourceReader>(
        &mut self,
        parent: &Element,
        base: &Location,
        xml_base: &str,
        reader: Option<&R>,
        depth: usize,
    ) -> Result<()> {
        let entry = |uri: &str| base.join(&with_base(xml_base, uri));
        for child in &parent.children {
            match child.local_name() {
                "system" => {
                    if let (Some(id), Some(uri)) =
                        (child.get_attribute("systemId"), child.get_attribute("uri"))
                    {
                        self.system_mappings.insert(id.to_string(), entry(uri));
                    }
                }
                "uri" => {
                    if let (Some(name), Some(uri)) =
                        (child.get_attribute("name"), child.get_attribute("uri"))
                    {
                        self.uri_mappings.insert(name.to_string(), entry(uri));
                    }
                }
                "rewriteSystem" | "rewriteURI" => {
                    let start = child
                        .get_attribute("systemIdStartString")
                        .or_else(|| child.get_attribute("uriStartString"));
                    if let (Some(start), Some(prefix)) = (start, child.get_attribute("rewritePrefix"))
                    {
                        self.rewrites.push((
                            start.to_string(),
                            as_directory(&with_base(xml_base, prefix)),
                            base.clone(),
                        ));
                    }
                }
                "nextCatalog" => {
                    let (Some(next), Some(reader)) = (child.get_attribute("catalog"), reader)
                    else {
                        continue;
                    };
                    let next = entry(next);
                    if let Err(e) = self.load_into(&next, reader, depth + 1) {
                        warn!(catalog = %next, error = %e, "skipping unreadable nextCatalog");
                    }
                }
                "group" => {
                    let group_base = child
                        .attributes
                        .iter()
                        .find(|(qname, _)| {
                            qname.namespace.as_deref() == Some(XML_NAMESPACE)
                                && qname.local_name == "base"
                        })
                        .map(|(_, value)| value.as_str());
                    let group_base = match group_base {
                        Some(group_base) => as_directory(&with_base(xml_base, group_base)),
                        None => xml_base.to_string(),
                    };
                    self.process_children(child, base, &group_base, reader, depth)?;
                }
                other => debug!(element = other, "ignoring catalog entry"),
            }
        }

        Ok(())
    }

    /// Resolve a schema location using the catalog
    ///
    /// Tries system ID mappings, then URI name mappings, then the longest
    /// matching rewrite prefix.
    pub fn resolve(&self, location: &str) -> Option<Location> {
        if let Some(found) = self.system_mappings.get(location) {
            return Some(found.clone());
        }
        if let Some(found) = self.uri_mappings.get(location) {
            return Some(found.clone());
        }

        self.rewrites
            .iter()
            .filter(|(start, _, _)| location.starts_with(start.as_str()))
            .max_by_key(|(start, _, _)| start.len())
            .map(|(start, prefix, base)| {
                base.join(&format!("{}{}", prefix, &location[start.len()..]))
            })
    }

    /// The schema registered for a namespace name, if any
    pub fn resolve_namespace(&self, namespace: &str) -> Option<Location> {
        self.uri_mappings.get(namespace).cloned()
    }

    /// Check if this catalog is empty (has no mappings)
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the number of mappings
    pub fn len(&self) -> usize {
        self.system_mappings.len() + self.uri_mappings.len() + self.rewrites.len()
    }

    /// Merge another catalog into this one; existing entries win
    pub fn merge(&mut self, other: &XmlCatalog) {
        for (k, v) in &other.system_mappings {
            self.system_mappings.entry(k.clone()).or_insert_with(|| v.clone());
        }
        for (k, v) in &other.uri_mappings {
            self.uri_mappings.entry(k.clone()).or_insert_with(|| v.clone());
        }
        self.rewrites.extend(other.rewrites.iter().cloned());
    }
}

/// Prefix a relative reference with the enclosing `xml:base`
fn with_base(xml_base: &str, reference: &str) -> String {
    if xml_base.is_empty() || Location::is_absolute(reference) {
        reference.to_string()
    } else {
        format!("{}{}", xml_base, reference)
    }
}

fn as_directory(prefix: &str) -> String {
    if prefix.is_empty() || prefix.ends_with('/') {
        prefix.to_string()
    } else {
        format!("{}/", prefix)
    }
}

/// Placeholder reader for catalogs parsed from memory (no `nextCatalog`)
struct NoReader;

impl SourceReader for NoReader {
    fn read(&self, location: &Location) -> std::io::Result<Vec<u8>> {
        Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("no reader for {}", location),
        ))
    }
}

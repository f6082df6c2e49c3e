//! Source registry
//!
//! Loads schema documents by location through a [`SourceReader`], parses them
//! into [`SchemaDocument`]s and keeps exactly one copy of each document per
//! canonical location, so diamond-shaped include graphs load shared files
//! once.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::documents::{Document, Element};
use crate::error::{Error, Result};
use crate::limits::Limits;
use crate::loaders::SourceReader;
use crate::locations::Location;
use crate::namespaces::{NamespaceContext, QName};
use crate::symbols::SymbolKind;

/// Schema for the `xml:` namespace, served for `Location::Builtin("xml.xsd")`
const XML_XSD: &str = include_str!("schemas/xml.xsd");

/// Look up a schema shipped with the crate
pub fn builtin_source(name: &str) -> Option<&'static str> {
    match name {
        "xml.xsd" => Some(XML_XSD),
        _ => None,
    }
}

/// Index of a document in its registry, in load order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId(pub usize);

/// Kinds of composition directives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveKind {
    /// `xs:import` - another namespace
    Import,
    /// `xs:include` - same (or no) namespace
    Include,
    /// `xs:redefine` - loaded like an include
    Redefine,
}

impl DirectiveKind {
    fn from_tag(local_name: &str) -> Option<Self> {
        match local_name {
            "import" => Some(DirectiveKind::Import),
            "include" => Some(DirectiveKind::Include),
            "redefine" => Some(DirectiveKind::Redefine),
            _ => None,
        }
    }

    /// The XSD tag of the directive
    pub fn tag(self) -> &'static str {
        match self {
            DirectiveKind::Import => "import",
            DirectiveKind::Include => "include",
            DirectiveKind::Redefine => "redefine",
        }
    }

    /// Whether the target joins the includer's namespace
    pub fn is_include(self) -> bool {
        matches!(self, DirectiveKind::Include | DirectiveKind::Redefine)
    }
}

/// An import/include/redefine directive, in document order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    /// Directive kind
    pub kind: DirectiveKind,
    /// `namespace` attribute (imports only)
    pub namespace: Option<String>,
    /// `schemaLocation` attribute, as written
    pub schema_location: Option<String>,
}

/// One parsed schema file
#[derive(Debug, Clone)]
pub struct SchemaDocument {
    /// Location the document was loaded from
    pub location: Location,
    /// `targetNamespace` as written in the document
    pub declared_namespace: Option<String>,
    /// Effective target namespace (the includer's for chameleon includes)
    pub target_namespace: Option<String>,
    /// The `xs:schema` element
    pub root: Element,
    /// Composition directives, in document order
    pub directives: Vec<Directive>,
}

impl SchemaDocument {
    /// Parse a schema document from raw bytes
    pub fn parse(location: Location, bytes: &[u8], limits: &Limits) -> Result<Self> {
        let doc = Document::parse(bytes, limits).map_err(|e| match e {
            Error::Xml(message) => Error::source_error(location.as_str(), message),
            other => other,
        })?;
        let root = doc
            .into_root()
            .ok_or_else(|| Error::source_error(location.as_str(), "empty document"))?;

        if !root.is_xsd("schema") {
            return Err(Error::source_error(
                location.as_str(),
                format!("expected xs:schema root element, got {}", root.qname),
            ));
        }

        let declared_namespace = root
            .get_attribute("targetNamespace")
            .filter(|ns| !ns.is_empty())
            .map(str::to_string);

        let directives = root
            .xsd_children()
            .filter_map(|child| {
                DirectiveKind::from_tag(child.local_name()).map(|kind| Directive {
                    kind,
                    namespace: child.get_attribute("namespace").map(str::to_string),
                    schema_location: child
                        .get_attribute("schemaLocation")
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty()),
                })
            })
            .collect();

        Ok(Self {
            location,
            target_namespace: declared_namespace.clone(),
            declared_namespace,
            root,
            directives,
        })
    }

    /// Whether this document was pulled into another namespace by an include
    pub fn is_chameleon(&self) -> bool {
        self.declared_namespace.is_none() && self.target_namespace.is_some()
    }

    /// Namespace declarations on the schema element
    pub fn namespaces(&self) -> &NamespaceContext {
        &self.root.namespaces
    }

    /// Top-level declarations with their position among the root's children
    pub fn declarations(&self) -> impl Iterator<Item = (usize, SymbolKind, &Element)> {
        self.root
            .children
            .iter()
            .enumerate()
            .filter(|(_, child)| child.namespace() == self.root.namespace())
            .filter_map(|(position, child)| {
                SymbolKind::from_tag(child.local_name()).map(|kind| (position, kind, child))
            })
    }

    /// The top-level node at `position`
    pub fn node(&self, position: usize) -> Option<&Element> {
        self.root.children.get(position)
    }

    /// Resolve a QName-valued attribute found on `element`
    ///
    /// Unprefixed names in a chameleon document without a default namespace
    /// take the adopted target namespace.
    pub fn resolve_qname(&self, element: &Element, raw: &str) -> Option<QName> {
        let mut qname = element.resolve_qname(raw)?;
        if qname.namespace.is_none() && self.is_chameleon() && !raw.contains(':') {
            qname.namespace = self.target_namespace.clone();
        }
        Some(qname)
    }
}

/// Loaded documents keyed by canonical location
pub struct SourceRegistry<R> {
    reader: R,
    limits: Limits,
    documents: Vec<SchemaDocument>,
    by_location: HashMap<String, DocumentId>,
}

impl<R: SourceReader> SourceRegistry<R> {
    /// Create an empty registry reading through `reader`
    pub fn new(reader: R, limits: Limits) -> Self {
        Self {
            reader,
            limits,
            documents: Vec::new(),
            by_location: HashMap::new(),
        }
    }

    /// Load a document, failing when it cannot be read
    ///
    /// Loading a location that is already loaded returns the existing
    /// document.
    pub fn load(&mut self, location: &Location) -> Result<DocumentId> {
        match self.try_load(location)? {
            Some((id, _)) => Ok(id),
            None => Err(Error::source_error(
                location.as_str(),
                format!("cannot read {}", location),
            )),
        }
    }

    /// Load a document if it can be read
    ///
    /// Returns `Ok(None)` when the location is unreadable and an error when it
    /// is readable but malformed. The flag is true when the document was
    /// newly loaded by this call.
    pub fn try_load(&mut self, location: &Location) -> Result<Option<(DocumentId, bool)>> {
        let key = location.canonical_key();
        if let Some(&id) = self.by_location.get(&key) {
            debug!(location = %location, "already loaded");
            return Ok(Some((id, false)));
        }

        let bytes = match self.read(location) {
            Some(bytes) => bytes,
            None => return Ok(None),
        };

        self.limits.check_schema_documents(self.documents.len() + 1)?;
        let document = SchemaDocument::parse(location.clone(), &bytes, &self.limits)?;
        info!(
            location = %location,
            namespace = document.declared_namespace.as_deref().unwrap_or(""),
            "loaded schema document"
        );

        let id = DocumentId(self.documents.len());
        self.documents.push(document);
        self.by_location.insert(key, id);
        Ok(Some((id, true)))
    }

    fn read(&self, location: &Location) -> Option<Vec<u8>> {
        if let Location::Builtin(name) = location {
            return builtin_source(name).map(|s| s.as_bytes().to_vec());
        }
        match self.reader.read(location) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                debug!(location = %location, error = %e, "cannot read schema location");
                None
            }
        }
    }

    /// Whether a location is already loaded
    pub fn is_loaded(&self, location: &Location) -> bool {
        self.by_location.contains_key(&location.canonical_key())
    }

    /// Get a loaded document
    pub fn get(&self, id: DocumentId) -> &SchemaDocument {
        &self.documents[id.0]
    }

    /// Get a loaded document for update (namespace adoption)
    pub fn get_mut(&mut self, id: DocumentId) -> &mut SchemaDocument {
        &mut self.documents[id.0]
    }

    /// All loaded documents, in load order
    pub fn documents(&self) -> &[SchemaDocument] {
        &self.documents
    }

    /// Number of loaded documents
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Whether nothing is loaded
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// The resource limits in force
    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Give up the registry, keeping its documents
    pub fn into_documents(self) -> Vec<SchemaDocument> {
        self.documents
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::loaders::MemoryReader;

    const SCHEMA: &str = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
            targetNamespace="urn:a" xmlns:a="urn:a">
        <xs:import namespace="urn:b" schemaLocation="b.xsd"/>
        <xs:include schemaLocation=" common.xsd "/>
        <xs:element name="root" type="a:T"/>
        <xs:complexType name="T"/>
    </xs:schema>"#;

    #[test]
    fn test_parse_schema_document() {
        let doc = SchemaDocument::parse(
            Location::parse("a.xsd"),
            SCHEMA.as_bytes(),
            &Limits::default(),
        )
        .unwrap();

        assert_eq!(doc.target_namespace.as_deref(), Some("urn:a"));
        assert_eq!(doc.directives.len(), 2);
        assert_eq!(doc.directives[0].kind, DirectiveKind::Import);
        assert_eq!(doc.directives[0].namespace.as_deref(), Some("urn:b"));
        assert_eq!(doc.directives[1].schema_location.as_deref(), Some("common.xsd"));

        let kinds: Vec<_> = doc.declarations().map(|(_, kind, _)| kind).collect();
        assert_eq!(kinds, vec![SymbolKind::Element, SymbolKind::ComplexType]);
    }

    #[test]
    fn test_non_schema_root_is_a_source_error() {
        let err = SchemaDocument::parse(Location::parse("x.xml"), b"<root/>", &Limits::default())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Source);
        assert_eq!(err.location(), Some("x.xml"));
    }

    #[test]
    fn test_load_is_idempotent() {
        let reader = MemoryReader::new().with_source("dir/a.xsd", SCHEMA);
        let mut registry = SourceRegistry::new(reader, Limits::default());

        let first = registry.load(&Location::parse("dir/a.xsd")).unwrap();
        let again = registry
            .try_load(&Location::parse("dir/./x/../a.xsd"))
            .unwrap();

        assert_eq!(again, Some((first, false)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_unreadable_and_malformed_sources() {
        let reader = MemoryReader::new().with_source("bad.xsd", "<xs:schema");
        let mut registry = SourceRegistry::new(reader, Limits::default());

        assert!(registry.try_load(&Location::parse("missing.xsd")).unwrap().is_none());
        assert_eq!(
            registry.load(&Location::parse("missing.xsd")).unwrap_err().kind(),
            ErrorKind::Source
        );
        assert_eq!(
            registry.try_load(&Location::parse("bad.xsd")).unwrap_err().kind(),
            ErrorKind::Source
        );
    }

    #[test]
    fn test_builtin_xml_schema() {
        let mut registry = SourceRegistry::new(MemoryReader::new(), Limits::default());
        let id = registry.load(&Location::Builtin("xml.xsd".to_string())).unwrap();
        let doc = registry.get(id);
        assert_eq!(doc.target_namespace.as_deref(), Some(crate::namespaces::XML_NAMESPACE));
        assert!(doc.declarations().any(|(_, _, e)| e.get_attribute("name") == Some("lang")));
    }

    #[test]
    fn test_document_limit() {
        let reader = MemoryReader::new()
            .with_source("a.xsd", SCHEMA)
            .with_source("b.xsd", SCHEMA);
        let mut registry = SourceRegistry::new(reader, Limits::default().with_max_schema_documents(1));

        registry.load(&Location::parse("a.xsd")).unwrap();
        assert_eq!(
            registry.load(&Location::parse("b.xsd")).unwrap_err().kind(),
            ErrorKind::Resource
        );
    }
}

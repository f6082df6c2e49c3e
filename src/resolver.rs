//! Namespace/import resolver
//!
//! Walks the import/include/redefine directives of a main schema depth-first,
//! loads every reachable document through the [`SourceRegistry`] and merges
//! all top-level declarations into one [`SymbolTable`].
//!
//! A `schemaLocation` is tried, in order, through the XML catalog, relative
//! to the containing document and in every search path. An `import` whose
//! location is missing or unreadable falls back to the catalog's namespace
//! entries and then to the static [`NamespaceFallbacks`] table.

use std::path::PathBuf;

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::catalog::XmlCatalog;
use crate::documents::Element;
use crate::error::{Error, Result};
use crate::limits::Limits;
use crate::loaders::SourceReader;
use crate::locations::Location;
use crate::namespaces::{XML_NAMESPACE, XSD_NAMESPACE};
use crate::registry::{Directive, DirectiveKind, DocumentId, SchemaDocument, SourceRegistry};
use crate::symbols::{Declaration, SymbolKey, SymbolTable};

/// Static namespace → location table for imports without a usable location
#[derive(Debug, Clone)]
pub struct NamespaceFallbacks {
    entries: IndexMap<String, Location>,
}

impl Default for NamespaceFallbacks {
    fn default() -> Self {
        Self::empty().with(XML_NAMESPACE, Location::Builtin("xml.xsd".to_string()))
    }
}

impl NamespaceFallbacks {
    /// A table without any entry
    pub fn empty() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    /// Add (or replace) the location used for a namespace
    pub fn with(mut self, namespace: impl Into<String>, location: Location) -> Self {
        self.entries.insert(namespace.into(), location);
        self
    }

    /// The fallback location of a namespace
    pub fn get(&self, namespace: &str) -> Option<&Location> {
        self.entries.get(namespace)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Configuration of a resolution run
#[derive(Debug, Clone, Default)]
pub struct ResolverOptions {
    /// Resource limits
    pub limits: Limits,
    /// Directories tried after the containing document's directory
    pub search_paths: Vec<PathBuf>,
    /// Namespace fallback table
    pub fallbacks: NamespaceFallbacks,
    /// Optional XML catalog consulted before anything else
    pub catalog: Option<XmlCatalog>,
}

impl ResolverOptions {
    /// Default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the resource limits
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Add a search directory
    pub fn with_search_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.search_paths.push(path.into());
        self
    }

    /// Replace the namespace fallback table
    pub fn with_fallbacks(mut self, fallbacks: NamespaceFallbacks) -> Self {
        self.fallbacks = fallbacks;
        self
    }

    /// Use an XML catalog
    pub fn with_catalog(mut self, catalog: XmlCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }
}

/// Every document of a run plus the merged symbol table
#[derive(Debug)]
pub struct SchemaSet {
    documents: Vec<SchemaDocument>,
    symbols: SymbolTable,
    limits: Limits,
}

impl SchemaSet {
    /// The main schema document
    pub fn main_document(&self) -> &SchemaDocument {
        &self.documents[0]
    }

    /// A document by id
    pub fn document(&self, id: DocumentId) -> &SchemaDocument {
        &self.documents[id.0]
    }

    /// All documents, in load order
    pub fn documents(&self) -> &[SchemaDocument] {
        &self.documents
    }

    /// The merged symbol table
    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    /// The limits the set was loaded with
    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// The declaring node and document of a declaration
    pub fn declaration_node(&self, declaration: &Declaration) -> Option<(&SchemaDocument, &Element)> {
        let document = self.documents.get(declaration.document.0)?;
        let node = document.node(declaration.position)?;
        Some((document, node))
    }
}

/// Pending work: a loaded document whose directives are not yet followed
struct PendingDocument {
    id: DocumentId,
    depth: usize,
}

/// Loads a main schema with everything it references
pub struct ImportResolver<R> {
    registry: SourceRegistry<R>,
    options: ResolverOptions,
}

impl<R: SourceReader> ImportResolver<R> {
    /// Create a resolver reading through `reader`
    pub fn new(reader: R, options: ResolverOptions) -> Self {
        Self {
            registry: SourceRegistry::new(reader, options.limits.clone()),
            options,
        }
    }

    /// Load `main` and its transitive imports/includes into a [`SchemaSet`]
    pub fn resolve(mut self, main: &Location) -> Result<SchemaSet> {
        let root = self.registry.load(main)?;

        // Depth-first worklist; directives are pushed in reverse so that they
        // are followed in document order.
        let mut pending = vec![PendingDocument { id: root, depth: 0 }];

        while let Some(work) = pending.pop() {
            let directives = self.registry.get(work.id).directives.clone();
            let mut discovered = Vec::new();

            for directive in &directives {
                if let Some(id) = self.follow(work.id, directive)? {
                    discovered.push(id);
                }
            }

            for id in discovered.into_iter().rev() {
                self.options.limits.check_schema_depth(work.depth + 1)?;
                pending.push(PendingDocument {
                    id,
                    depth: work.depth + 1,
                });
            }
        }

        let mut symbols = SymbolTable::new();
        for (index, document) in self.registry.documents().iter().enumerate() {
            for (position, kind, node) in document.declarations() {
                let name = node.get_attribute("name").ok_or_else(|| {
                    Error::source_error(
                        document.location.as_str(),
                        format!("global {} without a name", kind),
                    )
                })?;
                symbols.insert(Declaration {
                    key: SymbolKey::new(document.target_namespace.as_deref(), kind, name),
                    document: DocumentId(index),
                    position,
                    location: document.location.clone(),
                })?;
            }
        }
        symbols.assign_definition_names();
        debug!(
            documents = self.registry.len(),
            declarations = symbols.len(),
            "symbol table built"
        );

        Ok(SchemaSet {
            documents: self.registry.into_documents(),
            symbols,
            limits: self.options.limits,
        })
    }

    /// Follow one directive of `referrer`; returns the newly loaded document
    fn follow(&mut self, referrer: DocumentId, directive: &Directive) -> Result<Option<DocumentId>> {
        let referrer_doc = self.registry.get(referrer);
        let referrer_location = referrer_doc.location.clone();
        let referrer_namespace = referrer_doc.target_namespace.clone();

        if directive.kind == DirectiveKind::Import
            && directive.namespace.as_deref() == Some(XSD_NAMESPACE)
        {
            debug!(referrer = %referrer_location, "skipping import of the XSD namespace");
            return Ok(None);
        }

        let mut loaded = None;
        if let Some(schema_location) = &directive.schema_location {
            for candidate in self.candidates(&referrer_location, schema_location) {
                if let Some(found) = self.registry.try_load(&candidate)? {
                    debug!(
                        directive = directive.kind.tag(),
                        target = %candidate,
                        referrer = %referrer_location,
                        "resolved schemaLocation"
                    );
                    loaded = Some(found);
                    break;
                }
            }
        }

        if loaded.is_none() && directive.kind == DirectiveKind::Import {
            if let Some(namespace) = &directive.namespace {
                let fallback = self
                    .options
                    .catalog
                    .as_ref()
                    .and_then(|catalog| catalog.resolve_namespace(namespace))
                    .or_else(|| self.options.fallbacks.get(namespace).cloned());
                if let Some(fallback) = fallback {
                    debug!(namespace = %namespace, target = %fallback, "using namespace fallback");
                    loaded = self.registry.try_load(&fallback)?;
                }
            }
        }

        let (id, newly_loaded) = match loaded {
            Some(found) => found,
            None if directive.kind == DirectiveKind::Import
                && directive.schema_location.is_none() =>
            {
                debug!(
                    namespace = directive.namespace.as_deref().unwrap_or(""),
                    referrer = %referrer_location,
                    "import without location or fallback, skipping"
                );
                return Ok(None);
            }
            None => {
                return Err(Error::UnresolvedImport {
                    directive: directive.kind.tag().to_string(),
                    target: directive
                        .schema_location
                        .clone()
                        .or_else(|| directive.namespace.clone())
                        .unwrap_or_default(),
                    referrer: referrer_location.to_string(),
                })
            }
        };

        self.check_namespace(id, directive, &referrer_location, referrer_namespace.as_deref())?;

        if directive.kind == DirectiveKind::Redefine {
            debug!(referrer = %referrer_location, "redefinitions are not applied");
        }

        Ok(newly_loaded.then_some(id))
    }

    /// Candidate locations for a schemaLocation, in resolution order
    fn candidates(&self, referrer: &Location, schema_location: &str) -> Vec<Location> {
        let mut candidates = Vec::new();
        if let Some(catalog) = &self.options.catalog {
            candidates.extend(catalog.resolve(schema_location));
        }
        candidates.push(referrer.join(schema_location));
        if !Location::is_absolute(schema_location) {
            for directory in &self.options.search_paths {
                candidates.push(Location::in_directory(directory, schema_location));
            }
        }
        candidates
    }

    /// Apply the namespace rules of the directive to the loaded document
    fn check_namespace(
        &mut self,
        id: DocumentId,
        directive: &Directive,
        referrer: &Location,
        referrer_namespace: Option<&str>,
    ) -> Result<()> {
        let document = self.registry.get_mut(id);
        if directive.kind.is_include() {
            match document.declared_namespace.as_deref() {
                None => {
                    if document.target_namespace.as_deref() != referrer_namespace {
                        if document.is_chameleon() {
                            warn!(
                                location = %document.location,
                                "document included into several namespaces keeps its first"
                            );
                        } else {
                            debug!(location = %document.location, "chameleon include");
                            document.target_namespace = referrer_namespace.map(str::to_string);
                        }
                    }
                }
                Some(declared) if Some(declared) != referrer_namespace => {
                    return Err(Error::source_error(
                        document.location.as_str(),
                        format!(
                            "included schema has targetNamespace '{}', expected '{}' (included from {})",
                            declared,
                            referrer_namespace.unwrap_or(""),
                            referrer
                        ),
                    ));
                }
                Some(_) => {}
            }
        } else if directive.namespace.as_deref() != document.declared_namespace.as_deref() {
            warn!(
                location = %document.location,
                expected = directive.namespace.as_deref().unwrap_or(""),
                found = document.declared_namespace.as_deref().unwrap_or(""),
                "imported schema namespace differs from the import"
            );
        }
        Ok(())
    }
}

/// Load `main` and everything it references
pub fn resolve<R: SourceReader>(
    main: &Location,
    reader: R,
    options: ResolverOptions,
) -> Result<SchemaSet> {
    ImportResolver::new(reader, options).resolve(main)
}

//! Structural translator
//!
//! [`JsonSchemaConverter`] walks the declarations of a resolved
//! [`SchemaSet`] and builds JSON Schema fragments bottom-up. Construct
//! handlers are split by area:
//!
//! - `elements`: element particles and attributes
//! - `content`: complex types, model groups and content derivations
//! - `simple`: simple types (restriction, list, union)
//!
//! This module owns global declaration uses: the ref/inline decision and
//! the cycle policy. In referenced mode a global already being expanded is
//! emitted as a `$ref` to its (still incomplete) definition; in inline mode
//! re-entering it is a [`Error::CyclicType`].

use tracing::{debug, trace};

use crate::converters::content::ObjectBuilder;
use crate::converters::context::{ConversionContext, ConversionOptions};
use crate::converters::document::JsonSchemaDocument;
use crate::converters::elements::Occurs;
use crate::converters::JsonFragment;
use crate::documents::Element;
use crate::error::{Error, Result};
use crate::mapping::builtins::{self, BuiltinType};
use crate::mapping::FacetOptions;
use crate::registry::SchemaDocument;
use crate::resolver::SchemaSet;
use crate::symbols::{Declaration, SymbolKey, SymbolKind};

/// What a `type`/`base`/`itemType` attribute points at
#[derive(Debug, Clone)]
pub(crate) enum TypeRef {
    /// An XSD built-in type
    Builtin(&'static BuiltinType),
    /// A global complexType or simpleType
    Global(SymbolKey),
}

/// Translates one schema set into one JSON Schema document
pub struct JsonSchemaConverter<'a> {
    pub(super) set: &'a SchemaSet,
    pub(super) options: &'a ConversionOptions,
    pub(super) context: ConversionContext,
    /// Occurrences contributed by the enclosing compositors
    pub(super) scale: Occurs,
}

impl<'a> JsonSchemaConverter<'a> {
    /// Create a converter for `set`
    pub fn new(set: &'a SchemaSet, options: &'a ConversionOptions) -> Self {
        Self {
            set,
            options,
            context: ConversionContext::new(options.mode),
            scale: Occurs::ONCE,
        }
    }

    /// Translate the root elements of the main document into a full document
    pub fn convert(mut self) -> Result<JsonSchemaDocument> {
        let set: &'a SchemaSet = self.set;
        let main = set.main_document();
        let mut roots = Vec::new();

        for element in main.root.xsd_children().filter(|c| c.local_name() == "element") {
            let Some(name) = element.get_attribute("name") else {
                continue;
            };
            let key = SymbolKey::new(main.target_namespace.as_deref(), SymbolKind::Element, name);
            let schema = self.use_global(&key)?;
            roots.push((name.to_string(), schema));
        }

        debug!(
            roots = roots.len(),
            definitions = self.context.definition_count(),
            "translated schema set"
        );

        let namespace = main.declared_namespace.clone();
        let definitions = self.context.into_definitions();
        Ok(JsonSchemaDocument::from_roots(roots, namespace.as_deref(), definitions))
    }

    /// Translate a single global declaration on its own
    ///
    /// The declaration is expanded in place. In referenced mode its own
    /// definition and the definitions it needs are left in this
    /// converter's context.
    pub fn translate(&mut self, key: &SymbolKey) -> Result<JsonFragment> {
        let declaration = self.declaration(key)?;
        self.context.enter(key.clone());
        let fragment = self.translate_declaration(declaration)?;
        self.context.leave(key);

        // Self references point at the definition of `key`
        if self.context.mode().is_referenced() && key.kind.has_definition() {
            let set: &'a SchemaSet = self.set;
            if let Some(name) = set.symbols().definition_name(key) {
                if !self.context.has_definition(name) {
                    self.context.insert_definition(name, fragment.clone());
                }
            }
        }
        Ok(fragment)
    }

    /// The definitions created so far, consuming the converter
    pub fn into_definitions(self) -> indexmap::IndexMap<String, JsonFragment> {
        self.context.into_definitions()
    }

    /// The use of a global type or element
    pub(super) fn use_global(&mut self, key: &SymbolKey) -> Result<JsonFragment> {
        let symbols = self.set.symbols();
        let name = symbols.definition_name(key).map(str::to_string);
        let referenced = self.context.mode().is_referenced();

        if self.context.is_in_progress(key) {
            return match name {
                Some(name) if referenced => {
                    trace!(%key, definition = %name, "breaking cycle with a reference");
                    Ok(JsonFragment::reference(&name))
                }
                _ => Err(self.context.cycle_error(key)),
            };
        }

        if let Some(name) = name.as_deref() {
            if referenced && self.context.has_definition(name) {
                return Ok(JsonFragment::reference(name));
            }
        }

        let declaration = self.declaration(key)?;
        self.context.enter(key.clone());
        let body = self.translate_declaration(declaration)?;
        self.context.leave(key);

        match name {
            Some(name) if referenced => {
                debug!(%key, definition = %name, "created definition");
                self.context.insert_definition(name.clone(), body);
                Ok(JsonFragment::reference(&name))
            }
            _ => Ok(body.into_opaque()),
        }
    }

    fn declaration(&self, key: &SymbolKey) -> Result<&'a Declaration> {
        let set: &'a SchemaSet = self.set;
        set.symbols().get(key).ok_or_else(|| Error::UnresolvedReference {
            qname: key.qname().to_string(),
            kind: key.kind,
            location: set.main_document().location.to_string(),
        })
    }

    fn translate_declaration(&mut self, declaration: &'a Declaration) -> Result<JsonFragment> {
        let (document, node) = self.node(declaration)?;
        match declaration.key.kind {
            SymbolKind::ComplexType => self.complex_type(document, node),
            SymbolKind::SimpleType => self.simple_type(document, node),
            SymbolKind::Element => self.element_body(document, node),
            SymbolKind::Attribute => self.attribute_value(document, node),
            SymbolKind::Group | SymbolKind::AttributeGroup => {
                let mut object = ObjectBuilder::default();
                if declaration.key.kind == SymbolKind::Group {
                    self.model_group_into(document, node, &mut object)?;
                } else {
                    self.attribute_group_body_into(document, node, &mut object)?;
                }
                Ok(object.finish())
            }
        }
    }

    /// The declaring document and node of a declaration
    pub(super) fn node(&self, declaration: &'a Declaration) -> Result<(&'a SchemaDocument, &'a Element)> {
        let set: &'a SchemaSet = self.set;
        set.declaration_node(declaration).ok_or_else(|| {
            Error::source_error(
                declaration.location.to_string(),
                format!("declaration of {} is missing from its document", declaration.key),
            )
        })
    }

    /// Resolve a `ref` attribute to a global declaration of `kind`
    pub(super) fn lookup_ref(
        &self,
        document: &'a SchemaDocument,
        element: &Element,
        raw: &str,
        kind: SymbolKind,
    ) -> Result<&'a Declaration> {
        let set: &'a SchemaSet = self.set;
        document
            .resolve_qname(element, raw)
            .and_then(|qname| set.symbols().lookup(&qname, kind))
            .ok_or_else(|| Error::UnresolvedReference {
                qname: raw.trim().to_string(),
                kind,
                location: document.location.to_string(),
            })
    }

    /// Resolve a type-valued attribute (`type`, `base`, `itemType`, ...)
    ///
    /// `kind` is the kind reported when nothing matches.
    pub(super) fn resolve_type(
        &self,
        document: &SchemaDocument,
        element: &Element,
        raw: &str,
        kind: SymbolKind,
    ) -> Result<TypeRef> {
        let raw = raw.trim();
        let unresolved = || Error::UnresolvedReference {
            qname: raw.to_string(),
            kind,
            location: document.location.to_string(),
        };
        let qname = document.resolve_qname(element, raw).ok_or_else(unresolved)?;

        if qname.is_xsd() {
            return builtins::lookup(&qname.local_name)
                .map(TypeRef::Builtin)
                .ok_or_else(|| Error::UnknownType {
                    qname: raw.to_string(),
                    location: document.location.to_string(),
                });
        }
        if let Some(declaration) = self.set.symbols().lookup_type(&qname) {
            return Ok(TypeRef::Global(declaration.key.clone()));
        }
        if !raw.contains(':') {
            if let Some(builtin) = builtins::lookup(raw) {
                debug!(qname = raw, "unprefixed name taken as a built-in type");
                return Ok(TypeRef::Builtin(builtin));
            }
        }
        Err(unresolved())
    }

    /// The schema for a value of the type named by `raw`
    pub(super) fn type_use(
        &mut self,
        document: &SchemaDocument,
        element: &Element,
        raw: &str,
        kind: SymbolKind,
    ) -> Result<JsonFragment> {
        match self.resolve_type(document, element, raw, kind)? {
            TypeRef::Builtin(builtin) => Ok(builtin.schema()),
            TypeRef::Global(key) => self.use_global(&key),
        }
    }

    /// Enter a merged declaration (group or attribute group)
    ///
    /// Merged declarations have no definition to point back to: re-entering
    /// one is a cycle in either mode unless a global type or element was
    /// entered since.
    pub(super) fn enter_merge(&mut self, key: &SymbolKey) -> Result<()> {
        if self.context.merge_would_cycle(key) {
            return Err(self.context.cycle_error(key));
        }
        self.context.enter(key.clone());
        Ok(())
    }

    /// Run `f` with `scale` as the occurrence of the enclosing compositors
    pub(super) fn with_scale<T>(
        &mut self,
        scale: Occurs,
        f: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        let outer = std::mem::replace(&mut self.scale, scale);
        let result = f(self);
        self.scale = outer;
        result
    }

    pub(super) fn descend(&mut self) -> Result<()> {
        self.context.descend(&self.options.limits)
    }

    pub(super) fn ascend(&mut self) {
        self.context.ascend();
    }

    pub(super) fn facet_options(&self) -> FacetOptions {
        FacetOptions {
            anchor_patterns: self.options.anchor_patterns,
        }
    }
}

/// First non-empty `annotation/documentation` text, trimmed
pub(super) fn description(element: &Element) -> Option<String> {
    element
        .xsd_children()
        .filter(|child| child.local_name() == "annotation")
        .flat_map(|annotation| annotation.xsd_children())
        .filter(|child| child.local_name() == "documentation")
        .map(|documentation| documentation.text_content().trim().to_string())
        .find(|text| !text.is_empty())
}

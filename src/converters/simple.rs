//! Simple types

use tracing::debug;

use crate::converters::translator::{description, JsonSchemaConverter, TypeRef};
use crate::converters::{JsonFragment, JsonType};
use crate::documents::Element;
use crate::error::Result;
use crate::mapping::{apply_facets, Facet};
use crate::registry::SchemaDocument;
use crate::resolver::SchemaSet;
use crate::symbols::{SymbolKey, SymbolKind};

impl<'a> JsonSchemaConverter<'a> {
    /// A simpleType declaration, global or anonymous
    pub(super) fn simple_type(
        &mut self,
        document: &'a SchemaDocument,
        simple: &'a Element,
    ) -> Result<JsonFragment> {
        self.descend()?;
        let fragment = if let Some(restriction) = simple.find_xsd_child("restriction") {
            self.restriction(document, restriction)?
        } else if let Some(list) = simple.find_xsd_child("list") {
            self.list(document, list)?
        } else if let Some(union) = simple.find_xsd_child("union") {
            self.union(document, union)?
        } else {
            debug!(location = %document.location, "simpleType without a derivation");
            JsonFragment::any()
        };
        self.ascend();

        Ok(match description(simple) {
            Some(text) => fragment.with_description(text),
            None => fragment,
        })
    }

    /// A restriction: the base schema narrowed by the facets
    ///
    /// A built-in base is narrowed in place. A user-defined base is kept
    /// behind `allOf` so that its own facets still apply.
    pub(super) fn restriction(
        &mut self,
        document: &'a SchemaDocument,
        restriction: &'a Element,
    ) -> Result<JsonFragment> {
        let facets = Facet::collect(restriction);

        let (base, target, builtin) = if let Some(raw) = restriction.get_attribute("base") {
            match self.resolve_type(document, restriction, raw, SymbolKind::SimpleType)? {
                TypeRef::Builtin(builtin) => (builtin.schema(), builtin.value_type(), true),
                TypeRef::Global(key) => {
                    let target = self.global_value_type(&key, 0);
                    (self.use_global(&key)?, target, false)
                }
            }
        } else if let Some(simple) = restriction.find_xsd_child("simpleType") {
            let target = self.simple_value_type(document, simple, 0);
            (self.simple_type(document, simple)?, target, false)
        } else {
            (JsonFragment::any(), None, true)
        };

        if facets.is_empty() {
            return Ok(base);
        }
        let mut fragment = if builtin {
            base
        } else {
            JsonFragment::all_of(vec![base])
        };
        apply_facets(&mut fragment, &facets, target, self.facet_options());
        Ok(fragment)
    }

    /// `{"type": "array", "items": <item type>}`
    fn list(&mut self, document: &'a SchemaDocument, list: &'a Element) -> Result<JsonFragment> {
        let items = if let Some(raw) = list.get_attribute("itemType") {
            self.type_use(document, list, raw, SymbolKind::SimpleType)?
        } else if let Some(simple) = list.find_xsd_child("simpleType") {
            self.simple_type(document, simple)?
        } else {
            JsonFragment::any()
        };
        Ok(JsonFragment::array_of(items))
    }

    /// `{"oneOf": [<member types>...]}`
    fn union(&mut self, document: &'a SchemaDocument, union: &'a Element) -> Result<JsonFragment> {
        let mut members = Vec::new();
        if let Some(member_types) = union.get_attribute("memberTypes") {
            for raw in member_types.split_whitespace() {
                members.push(self.type_use(document, union, raw, SymbolKind::SimpleType)?);
            }
        }
        for simple in union.xsd_children().filter(|c| c.local_name() == "simpleType") {
            members.push(self.simple_type(document, simple)?);
        }

        if members.is_empty() {
            debug!(location = %document.location, "union without member types");
            return Ok(JsonFragment::any());
        }
        Ok(JsonFragment::one_of(members))
    }

    /// JSON type of the values of the type named by `raw`
    ///
    /// Used to coerce facet and fixed/default values; `None` when unknown
    /// or mixed (unions).
    pub(super) fn named_value_type(
        &self,
        document: &'a SchemaDocument,
        element: &'a Element,
        raw: &str,
        hops: usize,
    ) -> Option<JsonType> {
        match self.resolve_type(document, element, raw, SymbolKind::SimpleType).ok()? {
            TypeRef::Builtin(builtin) => builtin.value_type(),
            TypeRef::Global(key) => self.global_value_type(&key, hops + 1),
        }
    }

    fn global_value_type(&self, key: &SymbolKey, hops: usize) -> Option<JsonType> {
        if hops > self.options.limits.max_translation_depth {
            return None;
        }
        let set: &'a SchemaSet = self.set;
        let declaration = set.symbols().get(key)?;
        let (document, node) = self.node(declaration).ok()?;
        match key.kind {
            SymbolKind::SimpleType => self.simple_value_type(document, node, hops + 1),
            SymbolKind::ComplexType => self.complex_value_type(document, node, hops + 1),
            _ => None,
        }
    }

    /// JSON type of the values of a simpleType declaration
    pub(super) fn simple_value_type(
        &self,
        document: &'a SchemaDocument,
        simple: &'a Element,
        hops: usize,
    ) -> Option<JsonType> {
        if hops > self.options.limits.max_translation_depth {
            return None;
        }
        if let Some(restriction) = simple.find_xsd_child("restriction") {
            match restriction.get_attribute("base") {
                Some(raw) => self.named_value_type(document, restriction, raw, hops),
                None => restriction
                    .find_xsd_child("simpleType")
                    .and_then(|inner| self.simple_value_type(document, inner, hops + 1)),
            }
        } else if simple.find_xsd_child("list").is_some() {
            Some(JsonType::Array)
        } else {
            None
        }
    }

    /// JSON type of the character value of a complexType, if it has
    /// simple content
    pub(super) fn complex_value_type(
        &self,
        document: &'a SchemaDocument,
        complex: &'a Element,
        hops: usize,
    ) -> Option<JsonType> {
        let Some(simple_content) = complex.find_xsd_child("simpleContent") else {
            return Some(JsonType::Object);
        };
        let derivation = simple_content
            .find_xsd_child("extension")
            .or_else(|| simple_content.find_xsd_child("restriction"))?;
        let raw = derivation.get_attribute("base")?;
        self.named_value_type(document, derivation, raw, hops)
    }
}

//! Elements and attributes

use tracing::{debug, warn};

use crate::converters::content::ObjectBuilder;
use crate::converters::translator::{description, JsonSchemaConverter};
use crate::converters::{JsonFragment, JsonType};
use crate::documents::Element;
use crate::error::Result;
use crate::mapping::coerce;
use crate::registry::SchemaDocument;
use crate::symbols::SymbolKind;

/// One named member of an object: an element or an attribute
#[derive(Debug, Clone)]
pub(crate) struct Particle {
    pub name: String,
    pub schema: JsonFragment,
    pub required: bool,
}

impl Particle {
    /// The particle as a choice option: a single-property object
    ///
    /// The property is always required; an optional element makes the
    /// whole choice optional instead.
    pub fn into_option(self) -> JsonFragment {
        let mut option = JsonFragment::object();
        option.required.push(self.name.clone());
        option.properties.insert(self.name, self.schema);
        option
    }
}

/// `minOccurs`/`maxOccurs` of a particle; a `None` max is unbounded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Occurs {
    pub min: u64,
    pub max: Option<u64>,
}

impl Occurs {
    /// Exactly once
    pub const ONCE: Occurs = Occurs {
        min: 1,
        max: Some(1),
    };

    /// The occurrence attributes of `element`
    pub fn of(element: &Element) -> Occurs {
        let min = match element.get_attribute("minOccurs").map(str::trim) {
            None => 1,
            Some(value) => value.parse().unwrap_or_else(|_| {
                warn!(min_occurs = value, "invalid minOccurs, using 1");
                1
            }),
        };
        let max = match element.get_attribute("maxOccurs").map(str::trim) {
            None => Some(1),
            Some("unbounded") => None,
            Some(value) => Some(value.parse().unwrap_or_else(|_| {
                warn!(max_occurs = value, "invalid maxOccurs, using 1");
                1
            })),
        };
        Occurs { min, max }
    }

    /// Occurrences of a particle repeated `outer` times
    pub fn times(self, outer: Occurs) -> Occurs {
        let max = match (self.max, outer.max) {
            (Some(0), _) | (_, Some(0)) => Some(0),
            (Some(a), Some(b)) => Some(a.saturating_mul(b)),
            _ => None,
        };
        Occurs {
            min: self.min.saturating_mul(outer.min),
            max,
        }
    }

    /// Whether the particle can not occur at all
    pub fn is_absent(self) -> bool {
        self.max == Some(0)
    }

    /// Whether the particle occurs at most once
    pub fn is_single(self) -> bool {
        self.max == Some(1)
    }
}

impl<'a> JsonSchemaConverter<'a> {
    /// A local element or element reference inside a content model
    ///
    /// `None` when the particle cannot occur (`maxOccurs="0"`).
    pub(super) fn element_particle(
        &mut self,
        document: &'a SchemaDocument,
        element: &'a Element,
    ) -> Result<Option<Particle>> {
        let own = Occurs::of(element);
        if own.is_absent() {
            debug!("skipping element with maxOccurs=0");
            return Ok(None);
        }
        let Occurs { min, max } = own.times(self.scale);

        let (name, body) = if let Some(raw) = element.get_attribute("ref") {
            let declaration = self.lookup_ref(document, element, raw, SymbolKind::Element)?;
            let key = declaration.key.clone();
            let body = self.use_global(&key)?;
            (key.local_name, body)
        } else if let Some(name) = element.get_attribute("name") {
            (name.to_string(), self.element_body(document, element)?)
        } else {
            warn!(location = %document.location, "skipping element without name or ref");
            return Ok(None);
        };

        let schema = match max {
            Some(1) => body,
            max => JsonFragment {
                min_items: Some(min),
                max_items: max,
                ..JsonFragment::array_of(body)
            },
        };

        Ok(Some(Particle {
            name,
            schema,
            required: min >= 1,
        }))
    }

    /// The value schema of an element declaration, global or local
    pub(super) fn element_body(
        &mut self,
        document: &'a SchemaDocument,
        element: &'a Element,
    ) -> Result<JsonFragment> {
        self.descend()?;
        let mut body = if let Some(raw) = element.get_attribute("type") {
            self.type_use(document, element, raw, SymbolKind::ComplexType)?
        } else if let Some(complex) = element.find_xsd_child("complexType") {
            self.complex_type(document, complex)?
        } else if let Some(simple) = element.find_xsd_child("simpleType") {
            self.simple_type(document, simple)?
        } else {
            JsonFragment::any()
        };
        self.ascend();

        if let Some(text) = description(element) {
            body = body.with_description(text);
        }
        body = self.value_constraints(element, body, || self.element_value_type(document, element));
        if element.get_attribute("nillable").map(str::trim) == Some("true") {
            body = body.nullable();
        }
        Ok(body)
    }

    /// Attach `fixed`/`default` of `element` as `const`/`default`
    fn value_constraints(
        &self,
        element: &Element,
        mut schema: JsonFragment,
        value_type: impl FnOnce() -> Option<JsonType>,
    ) -> JsonFragment {
        let fixed = element.get_attribute("fixed");
        let default = element.get_attribute("default");
        if fixed.is_none() && default.is_none() {
            return schema;
        }

        let target = value_type();
        if let Some(value) = fixed {
            schema = schema.with_const(coerce(value, target));
        }
        if let Some(value) = default {
            schema = schema.with_default(coerce(value, target));
        }
        schema
    }

    /// JSON type of an element's character content, when it has one
    fn element_value_type(&self, document: &'a SchemaDocument, element: &'a Element) -> Option<JsonType> {
        if let Some(raw) = element.get_attribute("type") {
            self.named_value_type(document, element, raw, 0)
        } else if let Some(simple) = element.find_xsd_child("simpleType") {
            self.simple_value_type(document, simple, 0)
        } else if let Some(complex) = element.find_xsd_child("complexType") {
            self.complex_value_type(document, complex, 0)
        } else {
            None
        }
    }

    /// JSON type of an attribute's value
    fn attribute_value_type(&self, document: &'a SchemaDocument, attribute: &'a Element) -> Option<JsonType> {
        if let Some(raw) = attribute.get_attribute("type") {
            self.named_value_type(document, attribute, raw, 0)
        } else if let Some(simple) = attribute.find_xsd_child("simpleType") {
            self.simple_value_type(document, simple, 0)
        } else {
            Some(JsonType::String)
        }
    }

    /// The value schema of an attribute declaration, global or local
    pub(super) fn attribute_value(
        &mut self,
        document: &'a SchemaDocument,
        attribute: &'a Element,
    ) -> Result<JsonFragment> {
        let mut schema = if let Some(raw) = attribute.get_attribute("type") {
            self.type_use(document, attribute, raw, SymbolKind::SimpleType)?
        } else if let Some(simple) = attribute.find_xsd_child("simpleType") {
            self.simple_type(document, simple)?
        } else {
            JsonFragment::of_type(JsonType::String)
        };

        if let Some(text) = description(attribute) {
            schema = schema.with_description(text);
        }
        Ok(self.value_constraints(attribute, schema, || {
            self.attribute_value_type(document, attribute)
        }))
    }

    /// Add an attribute use to `object`
    pub(super) fn attribute_into(
        &mut self,
        document: &'a SchemaDocument,
        attribute: &'a Element,
        object: &mut ObjectBuilder,
    ) -> Result<()> {
        let usage = attribute.get_attribute("use").map(str::trim).unwrap_or("optional");
        if usage == "prohibited" {
            debug!(attribute = ?attribute.get_attribute("name").or(attribute.get_attribute("ref")), "skipping prohibited attribute");
            return Ok(());
        }

        let (name, schema) = if let Some(raw) = attribute.get_attribute("ref") {
            let declaration = self.lookup_ref(document, attribute, raw, SymbolKind::Attribute)?;
            let (global_document, global) = self.node(declaration)?;
            let schema = self.attribute_value(global_document, global)?;
            let schema = self.value_constraints(attribute, schema, || {
                self.attribute_value_type(global_document, global)
            });
            (declaration.key.local_name.clone(), schema)
        } else if let Some(name) = attribute.get_attribute("name") {
            (name.to_string(), self.attribute_value(document, attribute)?)
        } else {
            warn!(location = %document.location, "skipping attribute without name or ref");
            return Ok(());
        };

        object.add(Particle {
            name: format!("{}{}", self.options.attribute_prefix, name),
            schema,
            required: usage == "required",
        });
        object.attributes += 1;
        Ok(())
    }

    /// Merge a referenced attribute group into `object`
    pub(super) fn attribute_group_into(
        &mut self,
        document: &'a SchemaDocument,
        reference: &'a Element,
        object: &mut ObjectBuilder,
    ) -> Result<()> {
        let Some(raw) = reference.get_attribute("ref") else {
            debug!("attribute group without ref inside a type");
            return Ok(());
        };
        let declaration = self.lookup_ref(document, reference, raw, SymbolKind::AttributeGroup)?;
        let (group_document, group) = self.node(declaration)?;

        self.enter_merge(&declaration.key)?;
        self.attribute_group_body_into(group_document, group, object)?;
        self.context.leave(&declaration.key);
        Ok(())
    }

    /// The attribute uses of an attribute group declaration
    pub(super) fn attribute_group_body_into(
        &mut self,
        document: &'a SchemaDocument,
        group: &'a Element,
        object: &mut ObjectBuilder,
    ) -> Result<()> {
        self.attributes_into(document, group, object)
    }

    /// Attribute uses, attribute group references and wildcards among
    /// the children of `parent`
    pub(super) fn attributes_into(
        &mut self,
        document: &'a SchemaDocument,
        parent: &'a Element,
        object: &mut ObjectBuilder,
    ) -> Result<()> {
        for child in parent.xsd_children() {
            match child.local_name() {
                "attribute" => self.attribute_into(document, child, object)?,
                "attributeGroup" => self.attribute_group_into(document, child, object)?,
                "anyAttribute" => object.open = true,
                _ => {}
            }
        }
        Ok(())
    }
}

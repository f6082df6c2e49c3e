//! Complex types and content models
//!
//! Sequences, `all` groups and model group references merge their
//! particles into the enclosing object. A choice becomes one `oneOf` or
//! `anyOf` composite; choices nested directly in choices are flattened.
//! Compositor occurrences carry down to the element particles.

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::converters::elements::{Occurs, Particle};
use crate::converters::translator::{description, JsonSchemaConverter, TypeRef};
use crate::converters::JsonFragment;
use crate::documents::Element;
use crate::error::Result;
use crate::registry::SchemaDocument;
use crate::symbols::{SymbolKey, SymbolKind};

/// Accumulates the members of one JSON object
#[derive(Debug, Default)]
pub(crate) struct ObjectBuilder {
    pub properties: IndexMap<String, JsonFragment>,
    pub required: Vec<String>,
    /// Composites from choices
    pub composites: Vec<JsonFragment>,
    /// Base type uses of extensions
    pub bases: Vec<JsonFragment>,
    /// Set by `any`/`anyAttribute`
    pub open: bool,
    /// Number of attribute uses added
    pub attributes: usize,
}

impl ObjectBuilder {
    /// Add a member; a repeated name replaces the earlier schema
    pub fn add(&mut self, particle: Particle) {
        if particle.required && !self.required.contains(&particle.name) {
            self.required.push(particle.name.clone());
        }
        self.properties.insert(particle.name, particle.schema);
    }

    /// Whether nothing was added
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty() && self.composites.is_empty() && self.bases.is_empty() && !self.open
    }

    /// The object schema
    ///
    /// A single choice puts its composite on the object itself; several go
    /// into `allOf` next to the extension bases.
    pub fn finish(mut self) -> JsonFragment {
        let mut fragment = JsonFragment::object();
        fragment.properties = self.properties;
        fragment.required = self.required;
        if self.open {
            fragment.additional_properties = Some(true);
        }
        if self.composites.len() == 1 {
            if let Some(choice) = self.composites.pop() {
                fragment.one_of = choice.one_of;
                fragment.any_of = choice.any_of;
            }
        }
        self.bases.append(&mut self.composites);
        fragment.all_of = self.bases;
        fragment
    }
}

impl<'a> JsonSchemaConverter<'a> {
    /// A complexType declaration, global or anonymous
    pub(super) fn complex_type(
        &mut self,
        document: &'a SchemaDocument,
        complex: &'a Element,
    ) -> Result<JsonFragment> {
        self.descend()?;
        let mut fragment = self.with_scale(Occurs::ONCE, |this| {
            match complex.find_xsd_child("simpleContent") {
                Some(simple_content) => this.simple_content(document, simple_content),
                None => {
                    let mut object = ObjectBuilder::default();
                    this.complex_content_into(document, complex, &mut object)?;
                    Ok(object.finish())
                }
            }
        })?;
        self.ascend();

        if let Some(text) = description(complex) {
            fragment = fragment.with_description(text);
        }
        Ok(fragment)
    }

    /// The content model and attributes among the children of `parent`
    fn complex_content_into(
        &mut self,
        document: &'a SchemaDocument,
        parent: &'a Element,
        object: &mut ObjectBuilder,
    ) -> Result<()> {
        for child in parent.xsd_children() {
            match child.local_name() {
                "sequence" | "all" => self.sequence_into(document, child, object)?,
                "choice" => {
                    if let Some(choice) = self.choice(document, child)? {
                        object.composites.push(choice);
                    }
                }
                "group" => self.group_into(document, child, object)?,
                "attribute" => self.attribute_into(document, child, object)?,
                "attributeGroup" => self.attribute_group_into(document, child, object)?,
                "anyAttribute" => object.open = true,
                "complexContent" => self.complex_derivation_into(document, child, object)?,
                "annotation" | "simpleContent" => {}
                other => debug!(construct = other, "ignoring complex type content"),
            }
        }
        Ok(())
    }

    /// `complexContent`: extension adds to the base, restriction restates
    fn complex_derivation_into(
        &mut self,
        document: &'a SchemaDocument,
        complex_content: &'a Element,
        object: &mut ObjectBuilder,
    ) -> Result<()> {
        if let Some(extension) = complex_content.find_xsd_child("extension") {
            if let Some(raw) = extension.get_attribute("base") {
                match self.resolve_type(document, extension, raw, SymbolKind::ComplexType)? {
                    TypeRef::Builtin(builtin) if builtin.json_type.is_none() => {}
                    TypeRef::Builtin(builtin) => object.bases.push(builtin.schema()),
                    TypeRef::Global(key) => {
                        let base = self.use_global(&key)?;
                        object.bases.push(base);
                    }
                }
            }
            self.complex_content_into(document, extension, object)
        } else if let Some(restriction) = complex_content.find_xsd_child("restriction") {
            if let Some(raw) = restriction.get_attribute("base") {
                self.resolve_type(document, restriction, raw, SymbolKind::ComplexType)?;
            }
            self.complex_content_into(document, restriction, object)
        } else {
            warn!(location = %document.location, "complexContent without extension or restriction");
            Ok(())
        }
    }

    /// Merge the particles of a sequence or `all` group into `object`
    ///
    /// An optional compositor makes its members optional; a repeated one
    /// turns them into arrays.
    pub(super) fn sequence_into(
        &mut self,
        document: &'a SchemaDocument,
        sequence: &'a Element,
        object: &mut ObjectBuilder,
    ) -> Result<()> {
        let own = Occurs::of(sequence);
        if own.is_absent() {
            debug!("skipping compositor with maxOccurs=0");
            return Ok(());
        }
        let scale = own.times(self.scale);
        self.with_scale(scale, |this| this.particles_into(document, sequence, object))
    }

    fn particles_into(
        &mut self,
        document: &'a SchemaDocument,
        sequence: &'a Element,
        object: &mut ObjectBuilder,
    ) -> Result<()> {
        self.descend()?;
        for child in sequence.xsd_children() {
            match child.local_name() {
                "element" => {
                    if let Some(particle) = self.element_particle(document, child)? {
                        object.add(particle);
                    }
                }
                "sequence" | "all" => self.sequence_into(document, child, object)?,
                "choice" => {
                    if let Some(choice) = self.choice(document, child)? {
                        object.composites.push(choice);
                    }
                }
                "group" => self.group_into(document, child, object)?,
                "any" => object.open = true,
                "annotation" => {}
                other => debug!(particle = other, "ignoring particle"),
            }
        }
        self.ascend();
        Ok(())
    }

    /// A choice as a composite over its options; `None` when it has none
    ///
    /// The options are exclusive (`oneOf`) unless the choice repeats or an
    /// option requires nothing; then `anyOf`. An optional choice also
    /// accepts objects holding none of the options.
    pub(super) fn choice(
        &mut self,
        document: &'a SchemaDocument,
        choice: &'a Element,
    ) -> Result<Option<JsonFragment>> {
        let own = Occurs::of(choice);
        if own.is_absent() {
            debug!("skipping choice with maxOccurs=0");
            return Ok(None);
        }
        let outer = own.times(self.scale);

        let mut options = ChoiceOptions::default();
        self.with_scale(option_scale(outer), |this| {
            this.choice_options_into(document, choice, &mut options)
        })?;
        if options.list.is_empty() {
            debug!("skipping empty choice");
            return Ok(None);
        }
        Ok(Some(options.finish(outer.min == 0, !outer.is_single())))
    }

    fn choice_options_into(
        &mut self,
        document: &'a SchemaDocument,
        choice: &'a Element,
        options: &mut ChoiceOptions,
    ) -> Result<()> {
        self.descend()?;
        for child in choice.xsd_children() {
            match child.local_name() {
                "element" => {
                    if let Some(particle) = self.element_particle(document, child)? {
                        options.optional |= !particle.required;
                        options.list.push(particle.into_option());
                    }
                }
                "sequence" | "all" => {
                    let mut object = ObjectBuilder::default();
                    self.sequence_into(document, child, &mut object)?;
                    options.list.push(object.finish());
                }
                "choice" => {
                    let own = Occurs::of(child);
                    if own.is_absent() {
                        continue;
                    }
                    options.optional |= own.min == 0;
                    let scale = option_scale(own.times(self.scale));
                    self.with_scale(scale, |this| this.choice_options_into(document, child, options))?;
                }
                "group" => {
                    let own = Occurs::of(child);
                    if own.is_absent() {
                        continue;
                    }
                    if let Some((group_document, compositor, key)) = self.group_content(document, child)? {
                        self.enter_merge(&key)?;
                        let scale = own.times(self.scale);
                        if compositor.local_name() == "choice" {
                            options.optional |= own.min == 0;
                            self.with_scale(option_scale(scale), |this| {
                                this.choice_options_into(group_document, compositor, options)
                            })?;
                        } else {
                            let mut object = ObjectBuilder::default();
                            self.with_scale(scale, |this| {
                                this.sequence_into(group_document, compositor, &mut object)
                            })?;
                            options.list.push(object.finish());
                        }
                        self.context.leave(&key);
                    }
                }
                "any" => options.list.push(JsonFragment {
                    additional_properties: Some(true),
                    ..JsonFragment::object()
                }),
                "annotation" => {}
                other => debug!(particle = other, "ignoring choice option"),
            }
        }
        self.ascend();
        Ok(())
    }

    /// Merge a model group reference into `object`
    pub(super) fn group_into(
        &mut self,
        document: &'a SchemaDocument,
        reference: &'a Element,
        object: &mut ObjectBuilder,
    ) -> Result<()> {
        let own = Occurs::of(reference);
        if own.is_absent() {
            debug!("skipping group with maxOccurs=0");
            return Ok(());
        }
        let Some((group_document, compositor, key)) = self.group_content(document, reference)? else {
            return Ok(());
        };
        self.enter_merge(&key)?;
        let scale = own.times(self.scale);
        self.with_scale(scale, |this| this.compositor_into(group_document, compositor, object))?;
        self.context.leave(&key);
        Ok(())
    }

    /// The content of a model group declaration
    pub(super) fn model_group_into(
        &mut self,
        document: &'a SchemaDocument,
        group: &'a Element,
        object: &mut ObjectBuilder,
    ) -> Result<()> {
        match compositor_of(group) {
            Some(compositor) => self.compositor_into(document, compositor, object),
            None => Ok(()),
        }
    }

    fn compositor_into(
        &mut self,
        document: &'a SchemaDocument,
        compositor: &'a Element,
        object: &mut ObjectBuilder,
    ) -> Result<()> {
        if compositor.local_name() == "choice" {
            if let Some(choice) = self.choice(document, compositor)? {
                object.composites.push(choice);
            }
            Ok(())
        } else {
            self.sequence_into(document, compositor, object)
        }
    }

    /// The compositor of a referenced model group, with its declaring
    /// document and key; `None` for an empty group
    fn group_content(
        &self,
        document: &'a SchemaDocument,
        reference: &'a Element,
    ) -> Result<Option<(&'a SchemaDocument, &'a Element, SymbolKey)>> {
        let Some(raw) = reference.get_attribute("ref") else {
            debug!("group without ref inside a content model");
            return Ok(None);
        };
        let declaration = self.lookup_ref(document, reference, raw, SymbolKind::Group)?;
        let (group_document, group) = self.node(declaration)?;
        Ok(compositor_of(group).map(|compositor| (group_document, compositor, declaration.key.clone())))
    }

    /// `simpleContent`: the character value, plus attributes as properties
    fn simple_content(
        &mut self,
        document: &'a SchemaDocument,
        simple_content: &'a Element,
    ) -> Result<JsonFragment> {
        let derivation = simple_content
            .find_xsd_child("extension")
            .or_else(|| simple_content.find_xsd_child("restriction"));
        let Some(derivation) = derivation else {
            warn!(location = %document.location, "simpleContent without extension or restriction");
            return Ok(JsonFragment::any());
        };

        let mut object = ObjectBuilder::default();
        self.attributes_into(document, derivation, &mut object)?;

        let base = match derivation.get_attribute("base") {
            Some(raw) => Some(self.resolve_type(document, derivation, raw, SymbolKind::SimpleType)?),
            None => None,
        };

        // Deriving from another simple-content complex type: its value and
        // attributes come through the base use
        if let Some(TypeRef::Global(key)) = &base {
            if key.kind == SymbolKind::ComplexType {
                let base_use = self.use_global(key)?;
                if object.is_empty() {
                    return Ok(base_use);
                }
                object.bases.push(base_use);
                return Ok(object.finish());
            }
        }

        let value = if derivation.local_name() == "restriction" {
            self.restriction(document, derivation)?
        } else {
            match base {
                Some(TypeRef::Builtin(builtin)) => builtin.schema(),
                Some(TypeRef::Global(key)) => self.use_global(&key)?,
                None => JsonFragment::any(),
            }
        };

        if object.attributes == 0 && !object.open {
            return Ok(value);
        }
        object.add(Particle {
            name: self.options.text_key.clone(),
            schema: value,
            required: true,
        });
        Ok(object.finish())
    }
}

/// The options of one choice, flattened over nested choices
#[derive(Debug, Default)]
struct ChoiceOptions {
    list: Vec<JsonFragment>,
    /// Set when some option may be left out entirely
    optional: bool,
}

impl ChoiceOptions {
    fn finish(mut self, optional: bool, repeated: bool) -> JsonFragment {
        let determinate = self.list.iter().all(|option| !option.required.is_empty());
        if (optional || self.optional) && determinate {
            let present = self
                .list
                .iter()
                .map(|option| JsonFragment::requiring(option.required.clone()))
                .collect();
            self.list.push(JsonFragment::not(JsonFragment::any_of(present)));
        }
        if repeated || !determinate {
            JsonFragment::any_of(self.list)
        } else {
            JsonFragment::one_of(self.list)
        }
    }
}

/// Occurrences inside the options of a choice occurring `outer` times
///
/// A chosen option is present at least once.
fn option_scale(outer: Occurs) -> Occurs {
    Occurs {
        min: 1,
        max: outer.max,
    }
}

/// The sequence, choice or all of a model group declaration
fn compositor_of(group: &Element) -> Option<&Element> {
    group
        .xsd_children()
        .find(|child| matches!(child.local_name(), "sequence" | "choice" | "all"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converters::JsonType;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn string_particle(name: &str, required: bool) -> Particle {
        Particle {
            name: name.to_string(),
            schema: JsonFragment::of_type(JsonType::String),
            required,
        }
    }

    #[test]
    fn test_builder_merges_repeated_names() {
        let mut object = ObjectBuilder::default();
        object.add(string_particle("a", true));
        object.add(string_particle("b", false));
        object.add(string_particle("a", true));
        assert_eq!(
            object.finish().to_value(),
            json!({
                "type": "object",
                "properties": {"a": {"type": "string"}, "b": {"type": "string"}},
                "required": ["a"]
            })
        );
    }

    #[test]
    fn test_builder_composites() {
        let choice = || JsonFragment::one_of(vec![JsonFragment::object()]);

        let mut single = ObjectBuilder::default();
        single.composites.push(choice());
        assert_eq!(
            single.finish().to_value(),
            json!({"type": "object", "oneOf": [{"type": "object"}]})
        );

        let mut several = ObjectBuilder::default();
        several.bases.push(JsonFragment::reference("base"));
        several.composites.push(choice());
        several.composites.push(choice());
        several.open = true;
        assert_eq!(
            several.finish().to_value(),
            json!({
                "type": "object",
                "additionalProperties": true,
                "allOf": [
                    {"$ref": "#/definitions/base"},
                    {"oneOf": [{"type": "object"}]},
                    {"oneOf": [{"type": "object"}]}
                ]
            })
        );
    }

    #[test]
    fn test_choice_options_finish() {
        let option = |name: &str| JsonFragment::requiring(vec![name.to_string()]);
        let options = |optional| ChoiceOptions {
            list: vec![option("a"), option("b")],
            optional,
        };

        assert_eq!(
            options(false).finish(false, false).to_value(),
            json!({"oneOf": [{"required": ["a"]}, {"required": ["b"]}]})
        );
        assert_eq!(
            options(true).finish(false, false).to_value(),
            json!({"oneOf": [
                {"required": ["a"]},
                {"required": ["b"]},
                {"not": {"anyOf": [{"required": ["a"]}, {"required": ["b"]}]}}
            ]})
        );
        assert_eq!(
            options(false).finish(true, true).to_value(),
            json!({"anyOf": [
                {"required": ["a"]},
                {"required": ["b"]},
                {"not": {"anyOf": [{"required": ["a"]}, {"required": ["b"]}]}}
            ]})
        );

        let open = ChoiceOptions {
            list: vec![option("a"), JsonFragment::object()],
            optional: true,
        };
        assert_eq!(
            open.finish(false, false).to_value(),
            json!({"anyOf": [{"required": ["a"]}, {"type": "object"}]})
        );
    }

    #[test]
    fn test_option_scale_keeps_repetition() {
        let outer = Occurs { min: 0, max: None };
        assert_eq!(option_scale(outer), Occurs { min: 1, max: None });
        assert_eq!(option_scale(Occurs::ONCE), Occurs::ONCE);
    }
}

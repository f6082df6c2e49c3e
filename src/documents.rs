//! Namespace-aware XML trees
//!
//! Schema files (and XML catalogs) are parsed with `quick-xml` into a small
//! owned tree. Every element records the namespace context in scope at that
//! element, so QName-valued attributes (`type`, `ref`, `base`, ...) can be
//! resolved long after parsing. Character data is kept lxml-style as `text`
//! (before the first child) and `tail` (after the element's end tag).

use indexmap::IndexMap;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{Error, Result};
use crate::limits::Limits;
use crate::namespaces::{NamespaceContext, QName, XSD_NAMESPACE};

/// XML Element in the document tree
#[derive(Debug, Clone)]
pub struct Element {
    /// Element qualified name
    pub qname: QName,
    /// Element attributes, in document order (namespace declarations excluded)
    pub attributes: IndexMap<QName, String>,
    /// Character data before the first child element
    pub text: Option<String>,
    /// Character data following this element's end tag, inside its parent
    pub tail: Option<String>,
    /// Child elements
    pub children: Vec<Element>,
    /// Namespace context in scope at this element
    pub namespaces: NamespaceContext,
}

impl Element {
    /// Create a new element
    pub fn new(qname: QName) -> Self {
        Self {
            qname,
            attributes: IndexMap::new(),
            text: None,
            tail: None,
            children: Vec::new(),
            namespaces: NamespaceContext::new(),
        }
    }

    /// Get the local name of the element
    pub fn local_name(&self) -> &str {
        &self.qname.local_name
    }

    /// Get the namespace of the element
    pub fn namespace(&self) -> Option<&str> {
        self.qname.namespace.as_deref()
    }

    /// Whether this is the XSD element `local_name`
    pub fn is_xsd(&self, local_name: &str) -> bool {
        self.namespace() == Some(XSD_NAMESPACE) && self.local_name() == local_name
    }

    /// Get an unqualified attribute value by name
    pub fn get_attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(qname, _)| qname.namespace.is_none() && qname.local_name == name)
            .map(|(_, value)| value.as_str())
    }

    /// Get an attribute value by qualified name
    pub fn get_attribute_qname(&self, qname: &QName) -> Option<&str> {
        self.attributes.get(qname).map(|s| s.as_str())
    }

    /// Add a child element
    pub fn add_child(&mut self, child: Element) {
        self.children.push(child);
    }

    /// Child elements in the XSD namespace
    pub fn xsd_children(&self) -> impl Iterator<Item = &Element> {
        self.children
            .iter()
            .filter(|child| child.namespace() == Some(XSD_NAMESPACE))
    }

    /// First XSD child with the given local name
    pub fn find_xsd_child(&self, local_name: &str) -> Option<&Element> {
        self.children.iter().find(|child| child.is_xsd(local_name))
    }

    /// Find child elements by local name
    pub fn find_children(&self, local_name: &str) -> Vec<&Element> {
        self.children
            .iter()
            .filter(|e| e.local_name() == local_name)
            .collect()
    }

    /// Resolve a QName-valued string in this element's namespace scope
    pub fn resolve_qname(&self, prefixed_name: &str) -> Option<QName> {
        self.namespaces.resolve(prefixed_name.trim())
    }

    /// All character data of this element and its descendants, in order
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        if let Some(text) = &self.text {
            out.push_str(text);
        }
        for child in &self.children {
            child.collect_text(out);
            if let Some(tail) = &child.tail {
                out.push_str(tail);
            }
        }
    }

    fn append_text(&mut self, text: &str) {
        match self.children.last_mut() {
            Some(last) => last.tail.get_or_insert_with(String::new).push_str(text),
            None => self.text.get_or_insert_with(String::new).push_str(text),
        }
    }
}

/// XML Document representation
#[derive(Debug, Default)]
pub struct Document {
    /// Root element of the document
    pub root: Option<Element>,
}

impl Document {
    /// Create a new empty document
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an XML document from a string
    pub fn from_string(xml: &str) -> Result<Self> {
        Self::parse(xml.as_bytes(), &Limits::default())
    }

    /// Parse an XML document from bytes
    pub fn parse(xml: &[u8], limits: &Limits) -> Result<Self> {
        limits.check_xml_size(xml.len())?;
        let xml = xml.strip_prefix(b"\xEF\xBB\xBF".as_slice()).unwrap_or(xml);

        let mut reader = Reader::from_reader(xml);
        reader.trim_text(false);

        let mut doc = Document::new();
        let mut element_stack: Vec<Element> = Vec::new();
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => {
                    limits.check_xml_depth(element_stack.len() + 1)?;
                    let element = Self::parse_element(&e, element_stack.last())?;
                    element_stack.push(element);
                }
                Ok(Event::End(_)) => {
                    if let Some(current) = element_stack.pop() {
                        Self::attach(&mut doc, &mut element_stack, current)?;
                    }
                }
                Ok(Event::Empty(e)) => {
                    limits.check_xml_depth(element_stack.len() + 1)?;
                    let element = Self::parse_element(&e, element_stack.last())?;
                    Self::attach(&mut doc, &mut element_stack, element)?;
                }
                Ok(Event::Text(e)) => {
                    let text = e
                        .unescape()
                        .map_err(|e| Error::Xml(format!("Failed to unescape text: {}", e)))?;
                    match element_stack.last_mut() {
                        Some(current) => current.append_text(&text),
                        None if text.trim().is_empty() => {}
                        None => {
                            return Err(Error::Xml(
                                "character data outside the root element".to_string(),
                            ))
                        }
                    }
                }
                Ok(Event::CData(e)) => {
                    if let Some(current) = element_stack.last_mut() {
                        let raw = e.into_inner();
                        current.append_text(&String::from_utf8_lossy(&raw));
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::Xml(format!(
                        "Error parsing XML at position {}: {}",
                        reader.buffer_position(),
                        e
                    )))
                }
                _ => {} // Ignore other events (comments, processing instructions, etc.)
            }
            buf.clear();
        }

        if !element_stack.is_empty() {
            return Err(Error::Xml(format!(
                "unexpected end of document: <{}> is not closed",
                element_stack
                    .last()
                    .map(|e| e.local_name().to_string())
                    .unwrap_or_default()
            )));
        }
        if doc.root.is_none() {
            return Err(Error::Xml("document has no root element".to_string()));
        }

        Ok(doc)
    }

    fn attach(doc: &mut Document, stack: &mut [Element], element: Element) -> Result<()> {
        if let Some(parent) = stack.last_mut() {
            parent.add_child(element);
        } else if doc.root.is_none() {
            doc.root = Some(element);
        } else {
            return Err(Error::Xml(format!(
                "second root element <{}>",
                element.local_name()
            )));
        }
        Ok(())
    }

    /// Parse element from BytesStart event, resolving names in the scope
    /// inherited from `parent`
    fn parse_element(start: &BytesStart, parent: Option<&Element>) -> Result<Element> {
        let name_bytes = start.name();
        let name = std::str::from_utf8(name_bytes.as_ref())
            .map_err(|e| Error::Xml(format!("Invalid element name: {}", e)))?
            .to_string();

        let mut namespaces = parent
            .map(|p| p.namespaces.clone())
            .unwrap_or_else(NamespaceContext::new);
        let mut raw_attributes = Vec::new();

        for attr_result in start.attributes() {
            let attr = attr_result
                .map_err(|e| Error::Xml(format!("Failed to parse attribute: {}", e)))?;

            let attr_name = std::str::from_utf8(attr.key.as_ref())
                .map_err(|e| Error::Xml(format!("Invalid attribute name: {}", e)))?
                .to_string();

            let attr_value = attr
                .unescape_value()
                .map_err(|e| Error::Xml(format!("Failed to unescape attribute value: {}", e)))?
                .to_string();

            // Handle namespace declarations
            if attr_name == "xmlns" {
                namespaces.set_default_namespace(&attr_value);
            } else if let Some(prefix) = attr_name.strip_prefix("xmlns:") {
                namespaces.add_prefix(prefix, &attr_value);
            } else {
                raw_attributes.push((attr_name, attr_value));
            }
        }

        let qname = namespaces
            .resolve(&name)
            .ok_or_else(|| Error::Xml(format!("Undeclared namespace prefix in <{}>", name)))?;

        let mut element = Element::new(qname);
        element.namespaces = namespaces;

        for (attr_name, attr_value) in raw_attributes {
            // Unprefixed attributes are in no namespace
            let attr_qname = match attr_name.split_once(':') {
                Some(_) => element.namespaces.resolve(&attr_name).ok_or_else(|| {
                    Error::Xml(format!("Undeclared namespace prefix in attribute {}", attr_name))
                })?,
                None => QName::local(attr_name),
            };
            element.attributes.insert(attr_qname, attr_value);
        }

        Ok(element)
    }

    /// Get the root element
    pub fn root(&self) -> Option<&Element> {
        self.root.as_ref()
    }

    /// Take ownership of the root element
    pub fn into_root(self) -> Option<Element> {
        self.root
    }
}

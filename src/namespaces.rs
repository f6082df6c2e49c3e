//! XML namespace handling
//!
//! This module provides qualified names (QNames), in-scope namespace prefix
//! mappings, and the well-known namespace constants used by schema documents.

use std::collections::BTreeMap;
use std::fmt;

/// XSD 1.0 namespace
pub const XSD_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";

/// XML namespace (bound to the `xml` prefix)
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// XML Schema instance namespace
pub const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// XML Namespace URI
pub type NamespaceUri = String;

/// Namespace prefix
pub type Prefix = String;

/// Qualified name (QName) - combination of namespace and local name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QName {
    /// Namespace URI (None for no namespace)
    pub namespace: Option<NamespaceUri>,
    /// Local name
    pub local_name: String,
}

impl QName {
    /// Create a new QName
    pub fn new(namespace: Option<impl Into<String>>, local_name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.map(|s| s.into()),
            local_name: local_name.into(),
        }
    }

    /// Create a QName without a namespace
    pub fn local(local_name: impl Into<String>) -> Self {
        Self {
            namespace: None,
            local_name: local_name.into(),
        }
    }

    /// Create a QName with a namespace
    pub fn namespaced(namespace: impl Into<String>, local_name: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            local_name: local_name.into(),
        }
    }

    /// Whether this name lives in the XSD namespace
    pub fn is_xsd(&self) -> bool {
        self.namespace.as_deref() == Some(XSD_NAMESPACE)
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{{{}}}{}", ns, self.local_name),
            None => f.write_str(&self.local_name),
        }
    }
}

/// Namespace context for resolving prefixes
///
/// Every element of a parsed document carries the full context in scope at
/// that element (its own declarations layered over its ancestors').
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamespaceContext {
    /// Mapping from prefix to namespace URI
    prefixes: BTreeMap<Prefix, NamespaceUri>,
    /// Default namespace (no prefix)
    default_namespace: Option<NamespaceUri>,
}

impl NamespaceContext {
    /// Create a new context with only the predeclared `xml` prefix
    pub fn new() -> Self {
        let mut ctx = Self::default();
        ctx.add_prefix("xml", XML_NAMESPACE);
        ctx
    }

    /// Add a namespace prefix mapping
    pub fn add_prefix(&mut self, prefix: impl Into<String>, namespace: impl Into<String>) {
        self.prefixes.insert(prefix.into(), namespace.into());
    }

    /// Set the default namespace; an empty URI undeclares it
    pub fn set_default_namespace(&mut self, namespace: impl Into<String>) {
        let namespace = namespace.into();
        self.default_namespace = if namespace.is_empty() {
            None
        } else {
            Some(namespace)
        };
    }

    /// Get the namespace for a prefix
    pub fn get_namespace(&self, prefix: &str) -> Option<&str> {
        self.prefixes.get(prefix).map(|s| s.as_str())
    }

    /// Get the default namespace
    pub fn get_default_namespace(&self) -> Option<&str> {
        self.default_namespace.as_deref()
    }

    /// Iterate over the prefix declarations in scope
    pub fn iter(&self) -> impl Iterator<Item = (&Prefix, &NamespaceUri)> {
        self.prefixes.iter()
    }

    /// Resolve a prefixed name to a QName
    ///
    /// Unprefixed names take the default namespace. Returns `None` when the
    /// prefix is not declared.
    pub fn resolve(&self, prefixed_name: &str) -> Option<QName> {
        if let Some((prefix, local)) = prefixed_name.split_once(':') {
            self.get_namespace(prefix)
                .map(|namespace| QName::namespaced(namespace, local))
        } else {
            Some(QName::new(self.default_namespace.clone(), prefixed_name))
        }
    }
}

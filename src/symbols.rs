//! Global symbol table
//!
//! Every top-level declaration of every loaded schema document is indexed by
//! its [`SymbolKey`] (namespace, kind, local name). The table is built once,
//! after loading has finished, and is read-only during translation.

use std::collections::HashSet;
use std::fmt;

use indexmap::IndexMap;

use crate::error::{Error, Result};
use crate::locations::Location;
use crate::names::definition_segment;
use crate::namespaces::QName;
use crate::registry::DocumentId;

/// The kinds of global declarations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SymbolKind {
    /// `xs:element`
    Element,
    /// `xs:attribute`
    Attribute,
    /// `xs:complexType`
    ComplexType,
    /// `xs:simpleType`
    SimpleType,
    /// `xs:group`
    Group,
    /// `xs:attributeGroup`
    AttributeGroup,
}

impl SymbolKind {
    /// All kinds, in declaration-tag order
    pub const ALL: [SymbolKind; 6] = [
        SymbolKind::Element,
        SymbolKind::Attribute,
        SymbolKind::ComplexType,
        SymbolKind::SimpleType,
        SymbolKind::Group,
        SymbolKind::AttributeGroup,
    ];

    /// The kind declared by a top-level XSD tag
    pub fn from_tag(local_name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.tag() == local_name)
    }

    /// The XSD tag declaring this kind
    pub fn tag(self) -> &'static str {
        match self {
            SymbolKind::Element => "element",
            SymbolKind::Attribute => "attribute",
            SymbolKind::ComplexType => "complexType",
            SymbolKind::SimpleType => "simpleType",
            SymbolKind::Group => "group",
            SymbolKind::AttributeGroup => "attributeGroup",
        }
    }

    /// Whether this kind lives in the shared type symbol space
    pub fn is_type(self) -> bool {
        matches!(self, SymbolKind::ComplexType | SymbolKind::SimpleType)
    }

    /// Whether declarations of this kind become output definitions
    pub fn has_definition(self) -> bool {
        matches!(
            self,
            SymbolKind::ComplexType | SymbolKind::SimpleType | SymbolKind::Element
        )
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Identity of a global declaration
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolKey {
    /// Target namespace of the declaring document (None = no namespace)
    pub namespace: Option<String>,
    /// Declaration kind
    pub kind: SymbolKind,
    /// Local name
    pub local_name: String,
}

impl SymbolKey {
    /// Create a new symbol key
    pub fn new(namespace: Option<&str>, kind: SymbolKind, local_name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.map(str::to_string),
            kind,
            local_name: local_name.into(),
        }
    }

    /// Key for a resolved QName
    pub fn from_qname(qname: &QName, kind: SymbolKind) -> Self {
        Self {
            namespace: qname.namespace.clone(),
            kind,
            local_name: qname.local_name.clone(),
        }
    }

    /// The qualified name of the declaration
    pub fn qname(&self) -> QName {
        QName::new(self.namespace.clone(), self.local_name.clone())
    }
}

impl fmt::Display for SymbolKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.qname())
    }
}

/// A global declaration: where it lives and what it is called
#[derive(Debug, Clone)]
pub struct Declaration {
    /// The symbol key
    pub key: SymbolKey,
    /// The document declaring it
    pub document: DocumentId,
    /// Position of the declaring node among the schema root's children
    pub position: usize,
    /// Location of the declaring document
    pub location: Location,
}

/// Flat index from symbol keys to declarations, in load order
#[derive(Debug, Default)]
pub struct SymbolTable {
    declarations: IndexMap<SymbolKey, Declaration>,
    definition_names: IndexMap<SymbolKey, String>,
}

impl SymbolTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a declaration, rejecting a second one with the same key
    ///
    /// complexType and simpleType share one symbol space, so a name declared
    /// once as each is also a duplicate.
    pub fn insert(&mut self, declaration: Declaration) -> Result<()> {
        let key = &declaration.key;
        let clash = if key.kind.is_type() {
            [SymbolKind::ComplexType, SymbolKind::SimpleType]
                .into_iter()
                .find_map(|kind| {
                    self.declarations.get(&SymbolKey {
                        kind,
                        ..key.clone()
                    })
                })
        } else {
            self.declarations.get(key)
        };

        if let Some(first) = clash {
            return Err(Error::DuplicateSymbol {
                key: key.clone(),
                first: first.location.to_string(),
                second: declaration.location.to_string(),
            });
        }

        self.declarations.insert(key.clone(), declaration);
        Ok(())
    }

    /// Look up a declaration by key
    pub fn get(&self, key: &SymbolKey) -> Option<&Declaration> {
        self.declarations.get(key)
    }

    /// Look up a declaration by qualified name and kind
    pub fn lookup(&self, qname: &QName, kind: SymbolKind) -> Option<&Declaration> {
        self.declarations.get(&SymbolKey::from_qname(qname, kind))
    }

    /// Look up a global type: complexType first, then simpleType
    pub fn lookup_type(&self, qname: &QName) -> Option<&Declaration> {
        self.lookup(qname, SymbolKind::ComplexType)
            .or_else(|| self.lookup(qname, SymbolKind::SimpleType))
    }

    /// Iterate over all declarations in load order
    pub fn iter(&self) -> impl Iterator<Item = &Declaration> {
        self.declarations.values()
    }

    /// Declarations of one kind, in load order
    pub fn declarations_of(&self, kind: SymbolKind) -> impl Iterator<Item = &Declaration> {
        self.declarations.values().filter(move |d| d.key.kind == kind)
    }

    /// Number of declarations
    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    /// Whether the table holds no declaration
    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    /// Assign the `definitions` names of every type and element
    ///
    /// Names are assigned over the whole table, types before elements, so they
    /// do not depend on translation order. A name already taken gets the kind
    /// appended, then a counter.
    pub fn assign_definition_names(&mut self) {
        let mut taken: HashSet<String> = HashSet::new();
        let mut names = IndexMap::new();

        let ordered = self
            .declarations
            .keys()
            .filter(|key| key.kind.is_type())
            .chain(
                self.declarations
                    .keys()
                    .filter(|key| key.kind == SymbolKind::Element),
            );

        for key in ordered {
            let base = definition_segment(&key.local_name);
            let mut name = base.clone();
            if taken.contains(&name) {
                name = format!("{}.{}", base, key.kind);
                let mut counter = 2;
                while taken.contains(&name) {
                    name = format!("{}.{}.{}", base, key.kind, counter);
                    counter += 1;
                }
            }
            taken.insert(name.clone());
            names.insert(key.clone(), name);
        }

        self.definition_names = names;
    }

    /// The `definitions` name assigned to a key
    pub fn definition_name(&self, key: &SymbolKey) -> Option<&str> {
        self.definition_names.get(key).map(|s| s.as_str())
    }
}

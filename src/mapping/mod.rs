//! Facet/type mapper
//!
//! Pure lookups from XSD vocabulary to JSON Schema vocabulary: the built-in
//! type table, restriction facets and the coercion of lexical values. Nothing
//! here consults the symbol table; user-defined types are resolved by the
//! translator in [`crate::converters`].

pub mod builtins;
pub mod facets;
pub mod values;

pub use builtins::BuiltinType;
pub use facets::{apply_facets, combine_patterns, Facet, FacetOptions};
pub use values::coerce;

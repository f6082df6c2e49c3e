//! # xsdtojson
//!
//! Translate XML Schema (XSD 1.0) documents into JSON Schema Draft-07.
//!
//! A conversion run has three phases:
//!
//! - Loading: the main schema and every document reachable through
//!   `import`/`include`/`redefine` are read once each ([`registry`])
//! - Resolution: all global declarations are merged into one symbol table
//!   keyed by namespace, kind and name ([`resolver`], [`symbols`])
//! - Translation: the root elements of the main schema are translated
//!   recursively into JSON Schema ([`converters`], [`mapping`])
//!
//! ## Example
//!
//! ```rust,no_run
//! use xsdtojson::{convert_file, ConversionOptions, OutputMode};
//!
//! let options = ConversionOptions::default().with_mode(OutputMode::Inline);
//! let document = convert_file("schemas/order.xsd", &options)?;
//! println!("{}", document.to_string_pretty()?);
//! # Ok::<(), xsdtojson::Error>(())
//! ```
//!
//! Sources do not have to come from the file system: any
//! [`SourceReader`](loaders::SourceReader) can serve them, e.g. a
//! [`MemoryReader`](loaders::MemoryReader) in tests.

#![warn(missing_docs)]
#![warn(clippy::all)]

// Foundation
pub mod error;
pub mod limits;

// Names and locations
pub mod locations;
pub mod names;
pub mod namespaces;

// Loading
pub mod catalog;
pub mod documents;
pub mod loaders;
pub mod registry;

// Resolution
pub mod resolver;
pub mod symbols;

// Translation
pub mod converters;
pub mod mapping;

use std::path::Path;

pub use converters::{
    convert, convert_schema_set, ConversionOptions, JsonFragment, JsonSchemaConverter,
    JsonSchemaDocument, OutputMode,
};
pub use error::{Error, ErrorKind, Result};
pub use limits::Limits;
pub use loaders::{FileReader, MemoryReader, SourceReader};
pub use locations::Location;
pub use resolver::{resolve, ImportResolver, ResolverOptions, SchemaSet};
pub use symbols::{SymbolKey, SymbolKind};

/// Version of the xsdtojson library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Convert the schema file at `path` with default resolver options
pub fn convert_file(path: impl AsRef<Path>, options: &ConversionOptions) -> Result<JsonSchemaDocument> {
    let resolver_options = ResolverOptions::default().with_limits(options.limits.clone());
    convert(
        &Location::from(path.as_ref()),
        FileReader::new(),
        resolver_options,
        options,
    )
}

//! Structural translator
//!
//! Converts a resolved [`SchemaSet`] into a JSON Schema Draft-07 document.
//!
//! Two output modes are supported:
//! - Referenced: every global type or element used is translated once into
//!   `definitions` and used through `$ref`; reference cycles are legal
//! - Inline: every use is expanded in place; a reference cycle is an error
//!
//! Both modes produce structurally equal schemas once the `$ref`s of the
//! referenced output are substituted by their definitions.

mod content;
mod context;
mod document;
mod elements;
mod fragment;
mod simple;
mod translator;

pub use context::{ConversionContext, ConversionOptions, OutputMode};
pub use document::{JsonSchemaDocument, DRAFT_07};
pub use fragment::{FragmentKind, JsonFragment, JsonType, DEFINITIONS_POINTER};
pub use translator::JsonSchemaConverter;

use tracing::info;

use crate::error::Result;
use crate::loaders::SourceReader;
use crate::locations::Location;
use crate::resolver::{ImportResolver, ResolverOptions, SchemaSet};

/// Translate a resolved schema set
pub fn convert_schema_set(set: &SchemaSet, options: &ConversionOptions) -> Result<JsonSchemaDocument> {
    JsonSchemaConverter::new(set, options).convert()
}

/// Load the schema at `main` with everything it imports and translate it
pub fn convert<R: SourceReader>(
    main: &Location,
    reader: R,
    resolver_options: ResolverOptions,
    options: &ConversionOptions,
) -> Result<JsonSchemaDocument> {
    let set = ImportResolver::new(reader, resolver_options).resolve(main)?;
    info!(
        main = %main,
        documents = set.documents().len(),
        symbols = set.symbols().len(),
        mode = ?options.mode,
        "converting schema set"
    );
    convert_schema_set(&set, options)
}

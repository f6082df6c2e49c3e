//! Error types for xsdtojson
//!
//! This module defines the error taxonomy of a conversion run. Every fatal
//! condition aborts the run and reaches the caller of the top-level
//! `resolve`/`convert` entry point; constructs that are recognized but not
//! translated never produce an error (they are logged and skipped).

use std::fmt;
use thiserror::Error;

use crate::symbols::{SymbolKey, SymbolKind};

/// Result type alias using xsdtojson Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for schema loading and translation
#[derive(Error, Debug)]
pub enum Error {
    /// A schema location could not be read or is not well-formed schema markup
    #[error("source error: {location}: {message}")]
    Source {
        /// Canonical location of the offending schema
        location: String,
        /// What went wrong
        message: String,
    },

    /// An import/include target could not be located
    #[error("unresolved {directive} of '{target}' referenced from {referrer}")]
    UnresolvedImport {
        /// `import`, `include` or `redefine`
        directive: String,
        /// The schemaLocation, or the namespace when no location was given
        target: String,
        /// Location of the document holding the directive
        referrer: String,
    },

    /// Two global declarations share the same symbol key
    #[error("duplicate declaration of {key} in {second} (first declared in {first})")]
    DuplicateSymbol {
        /// The colliding key
        key: SymbolKey,
        /// Location of the first declaration
        first: String,
        /// Location of the second declaration
        second: String,
    },

    /// A `ref` or `type` attribute names a symbol that was never declared
    #[error("unresolved {kind} reference '{qname}' in {location}")]
    UnresolvedReference {
        /// The QName exactly as written in the schema
        qname: String,
        /// The kind of symbol that was looked up
        kind: SymbolKind,
        /// Location of the referring document
        location: String,
    },

    /// A cyclic type graph was met while producing inline output
    #[error("cyclic definition of {key}: {path}")]
    CyclicType {
        /// The symbol that was re-entered
        key: SymbolKey,
        /// The expansion chain leading back to it
        path: String,
    },

    /// A built-in type name that is not known
    #[error("unknown built-in type '{qname}' in {location}")]
    UnknownType {
        /// The QName exactly as written in the schema
        qname: String,
        /// Location of the referring document
        location: String,
    },

    /// Limit exceeded error
    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    /// XML parsing error (wrapped into `Source` once the location is known)
    #[error("XML error: {0}")]
    Xml(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// The error taxonomy as a plain value, for collaborators that report errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// See [`Error::Source`]
    Source,
    /// See [`Error::UnresolvedImport`]
    UnresolvedImport,
    /// See [`Error::DuplicateSymbol`]
    DuplicateSymbol,
    /// See [`Error::UnresolvedReference`]
    UnresolvedReference,
    /// See [`Error::CyclicType`]
    CyclicType,
    /// See [`Error::UnknownType`]
    UnknownType,
    /// Resource limits, parser and I/O failures
    Resource,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Source => "SourceError",
            ErrorKind::UnresolvedImport => "UnresolvedImportError",
            ErrorKind::DuplicateSymbol => "DuplicateSymbolError",
            ErrorKind::UnresolvedReference => "UnresolvedReferenceError",
            ErrorKind::CyclicType => "CyclicTypeError",
            ErrorKind::UnknownType => "UnknownTypeError",
            ErrorKind::Resource => "ResourceError",
        };
        f.write_str(name)
    }
}

impl Error {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Source { .. } | Error::Xml(_) => ErrorKind::Source,
            Error::UnresolvedImport { .. } => ErrorKind::UnresolvedImport,
            Error::DuplicateSymbol { .. } => ErrorKind::DuplicateSymbol,
            Error::UnresolvedReference { .. } => ErrorKind::UnresolvedReference,
            Error::CyclicType { .. } => ErrorKind::CyclicType,
            Error::UnknownType { .. } => ErrorKind::UnknownType,
            Error::LimitExceeded(_) | Error::Io(_) | Error::Json(_) => ErrorKind::Resource,
        }
    }

    /// The offending symbol, when the error is about one
    pub fn symbol(&self) -> Option<&SymbolKey> {
        match self {
            Error::DuplicateSymbol { key, .. } | Error::CyclicType { key, .. } => Some(key),
            _ => None,
        }
    }

    /// The offending schema location, when the error is about one
    pub fn location(&self) -> Option<&str> {
        match self {
            Error::Source { location, .. }
            | Error::UnresolvedReference { location, .. }
            | Error::UnknownType { location, .. } => Some(location),
            Error::UnresolvedImport { referrer, .. } => Some(referrer),
            Error::DuplicateSymbol { second, .. } => Some(second),
            _ => None,
        }
    }

    /// Build a source error for a location
    pub fn source_error(location: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Source {
            location: location.into(),
            message: message.into(),
        }
    }
}

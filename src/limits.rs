//! Limits and constraints for schema loading and translation
//!
//! Loading a schema set and translating it are bounded by these limits so that
//! hostile or accidental inputs (huge files, endless import chains, absurdly
//! deep anonymous nesting) fail with [`Error::LimitExceeded`] instead of
//! exhausting memory or the stack.

use crate::error::{Error, Result};

/// Global limits configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Limits {
    /// Maximum element nesting depth within one schema file
    pub max_xml_depth: usize,

    /// Maximum schema file size in bytes
    pub max_xml_size: usize,

    /// Maximum number of schema documents in one run
    pub max_schema_documents: usize,

    /// Maximum import/include nesting depth
    pub max_schema_depth: usize,

    /// Maximum recursion depth of the structural translator
    pub max_translation_depth: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_xml_depth: 1000,
            max_xml_size: 100 * 1024 * 1024, // 100 MB
            max_schema_documents: 10000,
            max_schema_depth: 100,
            max_translation_depth: 512,
        }
    }
}

impl Limits {
    /// Create a new Limits with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Create strict limits (more restrictive)
    pub fn strict() -> Self {
        Self {
            max_xml_depth: 100,
            max_xml_size: 10 * 1024 * 1024, // 10 MB
            max_schema_documents: 500,
            max_schema_depth: 20,
            max_translation_depth: 128,
        }
    }

    /// Set the maximum translation depth
    pub fn with_max_translation_depth(mut self, depth: usize) -> Self {
        self.max_translation_depth = depth;
        self
    }

    /// Set the maximum number of schema documents
    pub fn with_max_schema_documents(mut self, count: usize) -> Self {
        self.max_schema_documents = count;
        self
    }

    /// Check if XML depth is within limits
    pub fn check_xml_depth(&self, depth: usize) -> Result<()> {
        if depth > self.max_xml_depth {
            Err(Error::LimitExceeded(format!(
                "XML depth {} exceeds maximum {}",
                depth, self.max_xml_depth
            )))
        } else {
            Ok(())
        }
    }

    /// Check if XML size is within limits
    pub fn check_xml_size(&self, size: usize) -> Result<()> {
        if size > self.max_xml_size {
            Err(Error::LimitExceeded(format!(
                "XML size {} bytes exceeds maximum {} bytes",
                size, self.max_xml_size
            )))
        } else {
            Ok(())
        }
    }

    /// Check if the number of loaded documents is within limits
    pub fn check_schema_documents(&self, count: usize) -> Result<()> {
        if count > self.max_schema_documents {
            Err(Error::LimitExceeded(format!(
                "Schema document count {} exceeds maximum {}",
                count, self.max_schema_documents
            )))
        } else {
            Ok(())
        }
    }

    /// Check if schema depth is within limits
    pub fn check_schema_depth(&self, depth: usize) -> Result<()> {
        if depth > self.max_schema_depth {
            Err(Error::LimitExceeded(format!(
                "Schema depth {} exceeds maximum {}",
                depth, self.max_schema_depth
            )))
        } else {
            Ok(())
        }
    }

    /// Check if translation depth is within limits
    pub fn check_translation_depth(&self, depth: usize) -> Result<()> {
        if depth > self.max_translation_depth {
            Err(Error::LimitExceeded(format!(
                "Translation depth {} exceeds maximum {}",
                depth, self.max_translation_depth
            )))
        } else {
            Ok(())
        }
    }
}

//! Conversion options and per-run state

use indexmap::IndexMap;

use crate::converters::JsonFragment;
use crate::error::{Error, Result};
use crate::limits::Limits;
use crate::symbols::SymbolKey;

/// How uses of global declarations are emitted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Translate each global once into `definitions`; uses emit `$ref`
    #[default]
    Referenced,
    /// Expand every use in place; no `definitions`
    Inline,
}

impl OutputMode {
    /// Whether definitions are shared through `$ref`
    pub fn is_referenced(self) -> bool {
        matches!(self, OutputMode::Referenced)
    }
}

/// Configuration for a conversion run
#[derive(Debug, Clone)]
pub struct ConversionOptions {
    /// Referenced or inline output
    pub mode: OutputMode,
    /// Prepended to the property name of every attribute
    pub attribute_prefix: String,
    /// Property carrying the character content of simple-content types
    pub text_key: String,
    /// Anchor `pattern` values as whole-value matches
    pub anchor_patterns: bool,
    /// Translation depth limit
    pub limits: Limits,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            mode: OutputMode::default(),
            attribute_prefix: String::new(),
            text_key: "$".to_string(),
            anchor_patterns: false,
            limits: Limits::default(),
        }
    }
}

impl ConversionOptions {
    /// Create options with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Inline-mode options
    pub fn inline() -> Self {
        Self::default().with_mode(OutputMode::Inline)
    }

    /// Set the output mode
    pub fn with_mode(mut self, mode: OutputMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the attribute prefix
    pub fn with_attribute_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.attribute_prefix = prefix.into();
        self
    }

    /// Set the text key
    pub fn with_text_key(mut self, key: impl Into<String>) -> Self {
        self.text_key = key.into();
        self
    }

    /// Set pattern anchoring
    pub fn with_anchor_patterns(mut self, anchor: bool) -> Self {
        self.anchor_patterns = anchor;
        self
    }

    /// Set the limits
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }
}

/// Mutable state of one conversion run
///
/// Holds the definitions created so far (referenced mode only) and the
/// declarations currently being expanded, in expansion order.
#[derive(Debug)]
pub struct ConversionContext {
    mode: OutputMode,
    definitions: IndexMap<String, JsonFragment>,
    in_progress: Vec<SymbolKey>,
    depth: usize,
}

impl ConversionContext {
    /// Fresh state for one run
    pub fn new(mode: OutputMode) -> Self {
        Self {
            mode,
            definitions: IndexMap::new(),
            in_progress: Vec::new(),
            depth: 0,
        }
    }

    /// The output mode of this run
    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    /// Whether `key` is currently being expanded
    pub fn is_in_progress(&self, key: &SymbolKey) -> bool {
        self.in_progress.contains(key)
    }

    /// Whether re-entering the merged declaration `key` would loop
    ///
    /// A group or attribute group may be expanded again below a global
    /// that becomes a definition: that global is where a referenced run
    /// cuts the recursion.
    pub fn merge_would_cycle(&self, key: &SymbolKey) -> bool {
        match self.in_progress.iter().rposition(|entered| entered == key) {
            Some(position) => !self.in_progress[position + 1..]
                .iter()
                .any(|entered| entered.kind.has_definition()),
            None => false,
        }
    }

    /// Start expanding `key`
    pub fn enter(&mut self, key: SymbolKey) {
        self.in_progress.push(key);
    }

    /// Finish the innermost expansion of `key`
    pub fn leave(&mut self, key: &SymbolKey) {
        if let Some(position) = self.in_progress.iter().rposition(|entered| entered == key) {
            self.in_progress.remove(position);
        }
    }

    /// The expansion chain from `key` back to itself, for error messages
    pub fn cycle_path(&self, key: &SymbolKey) -> String {
        let start = self
            .in_progress
            .iter()
            .rposition(|entered| entered == key)
            .unwrap_or(0);
        self.in_progress
            .iter()
            .skip(start)
            .chain(std::iter::once(key))
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" -> ")
    }

    /// The error for re-entering `key`
    pub fn cycle_error(&self, key: &SymbolKey) -> Error {
        Error::CyclicType {
            key: key.clone(),
            path: self.cycle_path(key),
        }
    }

    /// Whether a definition named `name` exists
    pub fn has_definition(&self, name: &str) -> bool {
        self.definitions.contains_key(name)
    }

    /// Record a finished definition
    pub fn insert_definition(&mut self, name: impl Into<String>, fragment: JsonFragment) {
        self.definitions.insert(name.into(), fragment);
    }

    /// Number of definitions created so far
    pub fn definition_count(&self) -> usize {
        self.definitions.len()
    }

    /// Take the definitions, ending the run
    pub fn into_definitions(self) -> IndexMap<String, JsonFragment> {
        self.definitions
    }

    /// One level deeper into the schema tree
    pub fn descend(&mut self, limits: &Limits) -> Result<()> {
        self.depth += 1;
        limits.check_translation_depth(self.depth)
    }

    /// One level back up
    pub fn ascend(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Current recursion depth
    pub fn depth(&self) -> usize {
        self.depth
    }
}

//! Resource location resolution
//!
//! This module handles schema locations (file paths, URLs and the built-in
//! schemas shipped with the crate), the resolution of a `schemaLocation`
//! relative to the document that mentions it, and the canonical identity used
//! to load every document exactly once.

use std::fmt;
use std::path::{Component, Path, PathBuf};
use url::Url;

/// Resource location - a file path, a URL, or a schema built into the crate
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Location {
    /// File system path
    Path(PathBuf),
    /// URL (http, https, urn, ...)
    Url(Url),
    /// Schema shipped with the crate, addressed by name
    Builtin(String),
}

impl Location {
    /// Create a location from a string (auto-detect type)
    pub fn parse(s: &str) -> Self {
        if let Some(url) = parse_absolute_url(s) {
            if url.scheme() == "file" {
                if let Ok(path) = url.to_file_path() {
                    return Location::Path(normalize_path(&path));
                }
            }
            return Location::Url(url);
        }
        Location::Path(normalize_path(Path::new(s)))
    }

    /// Resolve a location string relative to this location
    ///
    /// Absolute URLs and absolute paths are returned as they are; anything
    /// else is taken relative to the directory (or URL base) of `self`.
    pub fn join(&self, reference: &str) -> Location {
        if Location::is_absolute(reference) {
            return Location::parse(reference);
        }

        match self {
            Location::Path(path) => {
                let base = path.parent().unwrap_or_else(|| Path::new(""));
                Location::Path(normalize_path(&base.join(reference)))
            }
            Location::Url(url) => match url.join(reference) {
                Ok(joined) => Location::Url(joined),
                Err(_) => Location::parse(reference),
            },
            Location::Builtin(_) => Location::Builtin(reference.to_string()),
        }
    }

    /// Whether `reference` is an absolute URL or an absolute path
    pub fn is_absolute(reference: &str) -> bool {
        parse_absolute_url(reference).is_some() || Path::new(reference).is_absolute()
    }

    /// Resolve a location string against a search directory
    pub fn in_directory(directory: &Path, reference: &str) -> Location {
        Location::Path(normalize_path(&directory.join(reference)))
    }

    /// The identity used for deduplication
    ///
    /// Paths are lexically normalized and, on case-insensitive platforms,
    /// case-folded; URLs are compared in their serialized form.
    pub fn canonical_key(&self) -> String {
        match self {
            Location::Path(p) => {
                let key = normalize_path(p).to_string_lossy().replace('\\', "/");
                if cfg!(any(windows, target_os = "macos")) {
                    key.to_lowercase()
                } else {
                    key
                }
            }
            Location::Url(u) => u.to_string(),
            Location::Builtin(name) => format!("builtin:{}", name),
        }
    }

    /// Get the location as a string
    pub fn as_str(&self) -> String {
        match self {
            Location::Path(p) => p.to_string_lossy().to_string(),
            Location::Url(u) => u.to_string(),
            Location::Builtin(name) => format!("builtin:{}", name),
        }
    }

    /// Check if this is a remote location (URL)
    pub fn is_remote(&self) -> bool {
        matches!(self, Location::Url(_))
    }

    /// Check if this is a local file
    pub fn is_file(&self) -> bool {
        matches!(self, Location::Path(_))
    }

    /// The final path segment, used to name output files
    pub fn file_stem(&self) -> Option<String> {
        match self {
            Location::Path(p) => p.file_stem().map(|s| s.to_string_lossy().to_string()),
            Location::Url(u) => u
                .path_segments()
                .and_then(|mut segments| segments.next_back())
                .and_then(|last| Path::new(last).file_stem())
                .map(|s| s.to_string_lossy().to_string()),
            Location::Builtin(name) => Path::new(name)
                .file_stem()
                .map(|s| s.to_string_lossy().to_string()),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str())
    }
}

impl From<&Path> for Location {
    fn from(path: &Path) -> Self {
        Location::Path(normalize_path(path))
    }
}

impl From<PathBuf> for Location {
    fn from(path: PathBuf) -> Self {
        Location::Path(normalize_path(&path))
    }
}

/// Parse `s` as an absolute URL, refusing Windows drive letters (`C:\...`)
fn parse_absolute_url(s: &str) -> Option<Url> {
    let url = Url::parse(s).ok()?;
    if url.scheme().len() < 2 {
        return None;
    }
    Some(url)
}

/// Lexically normalize a path: drop `.` segments and fold `..` into its parent
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out: Vec<Component> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }
    out.iter().map(|c| c.as_os_str()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_from_url() {
        let loc = Location::parse("http://example.com/schema.xsd");
        assert!(matches!(loc, Location::Url(_)));
        assert!(loc.is_remote());
    }

    #[test]
    fn test_location_from_path() {
        let loc = Location::parse("/tmp/schema.xsd");
        assert!(matches!(loc, Location::Path(_)));
        assert!(loc.is_file());
    }

    #[test]
    fn test_join_relative_path() {
        let base = Location::parse("schemas/main/root.xsd");
        let joined = base.join("../common/types.xsd");
        assert_eq!(joined, Location::Path(PathBuf::from("schemas/common/types.xsd")));
    }

    #[test]
    fn test_join_url() {
        let base = Location::parse("http://example.com/xsd/root.xsd");
        let joined = base.join("types.xsd");
        assert_eq!(joined.as_str(), "http://example.com/xsd/types.xsd");

        let absolute = base.join("/srv/other.xsd");
        assert!(absolute.is_file());
    }

    #[test]
    fn test_canonical_key_dedups_equivalent_paths() {
        let a = Location::parse("dir/./sub/../d.xsd");
        let b = Location::parse("dir/d.xsd");
        assert_eq!(a.canonical_key(), b.canonical_key());
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(Location::parse("a/b/root.xsd").file_stem().as_deref(), Some("root"));
        assert_eq!(
            Location::parse("http://example.com/x/types.xsd").file_stem().as_deref(),
            Some("types")
        );
    }
}

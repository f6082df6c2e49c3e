//! Resource loading utilities
//!
//! The converter never touches the file system or the network on its own: the
//! bytes of every schema are obtained through a [`SourceReader`] supplied by
//! the caller. [`FileReader`] covers local files, [`MemoryReader`] serves
//! schemas held in memory (uploads, tests).

use std::collections::HashMap;
use std::fs;
use std::io;

use crate::locations::Location;

/// The byte-reading capability handed to the source registry
pub trait SourceReader {
    /// Read the raw bytes stored at `location`
    fn read(&self, location: &Location) -> io::Result<Vec<u8>>;
}

impl<R: SourceReader + ?Sized> SourceReader for &R {
    fn read(&self, location: &Location) -> io::Result<Vec<u8>> {
        (**self).read(location)
    }
}

impl<R: SourceReader + ?Sized> SourceReader for Box<R> {
    fn read(&self, location: &Location) -> io::Result<Vec<u8>> {
        (**self).read(location)
    }
}

/// Reads schemas from the local file system
#[derive(Debug, Default, Clone)]
pub struct FileReader {
    _private: (),
}

impl FileReader {
    /// Create a new file reader
    pub fn new() -> Self {
        Self::default()
    }
}

impl SourceReader for FileReader {
    fn read(&self, location: &Location) -> io::Result<Vec<u8>> {
        match location {
            Location::Path(path) => fs::read(path),
            Location::Url(url) if url.scheme() == "file" => {
                let path = url.to_file_path().map_err(|_| {
                    io::Error::new(io::ErrorKind::InvalidInput, format!("invalid file URL {}", url))
                })?;
                fs::read(path)
            }
            other => Err(io::Error::new(
                io::ErrorKind::Unsupported,
                format!("remote resources are not fetched: {}", other),
            )),
        }
    }
}

/// Serves schemas from memory, keyed by canonical location
#[derive(Debug, Default, Clone)]
pub struct MemoryReader {
    sources: HashMap<String, Vec<u8>>,
}

impl MemoryReader {
    /// Create an empty reader
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a source at a location string
    pub fn with_source(mut self, location: &str, content: impl Into<Vec<u8>>) -> Self {
        self.insert(&Location::parse(location), content);
        self
    }

    /// Register a source at a location
    pub fn insert(&mut self, location: &Location, content: impl Into<Vec<u8>>) {
        self.sources.insert(location.canonical_key(), content.into());
    }

    /// Number of registered sources
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Whether no source is registered
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl SourceReader for MemoryReader {
    fn read(&self, location: &Location) -> io::Result<Vec<u8>> {
        self.sources
            .get(&location.canonical_key())
            .cloned()
            .ok_or_else(|| {
                io::Error::new(io::ErrorKind::NotFound, format!("no source at {}", location))
            })
    }
}

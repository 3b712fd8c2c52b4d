//! In-memory store of fetched file contents.
//!
//! The cache is keyed by the file path exactly as the model requested it.
//! Each agent run owns one cache through its tool executor.

use std::collections::HashMap;
use tracing::debug;

/// A fetched file and its derived size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// Raw text body as returned by the remote.
    pub content: String,
    /// Length of the content in characters.
    pub size: usize,
}

impl CacheEntry {
    fn new(content: String) -> Self {
        let size = content.chars().count();
        Self { content, size }
    }
}

/// Mapping from file path to fetched content. Entries are never evicted.
#[derive(Debug, Default)]
pub struct ContentCache {
    entries: HashMap<String, CacheEntry>,
}

impl ContentCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store content under `path`, replacing any previous entry.
    ///
    /// Returns the character size of the stored content.
    pub fn insert(&mut self, path: impl Into<String>, content: String) -> usize {
        let path = path.into();
        let entry = CacheEntry::new(content);
        let size = entry.size;

        if self.entries.insert(path.clone(), entry).is_some() {
            debug!("Replaced cached content for {}", path);
        }

        size
    }

    pub fn get(&self, path: &str) -> Option<&CacheEntry> {
        self.entries.get(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

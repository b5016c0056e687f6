//! Offline connection source backed by JSON-LD files.
//!
//! Loads every `*.json` page in a directory and serves the merged timetable
//! as if it came from a live Linked Connections server. This is useful for
//! development and testing without network access.

use std::collections::HashSet;
use std::path::Path;

use tracing::{debug, info};

use super::error::SourceError;
use super::page::{Page, PageCursor};
use super::source::{ConnectionSource, MemorySource};
use super::wire::parse_connections;

/// Connection source that serves data from JSON-LD files.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    inner: MemorySource,
}

impl DirectorySource {
    /// Load all `*.json` pages from a directory.
    ///
    /// Connections appearing in more than one file are kept once.
    pub fn new(data_dir: impl AsRef<Path>, page_size: usize) -> Result<Self, SourceError> {
        let data_dir = data_dir.as_ref();
        let mut seen = HashSet::new();
        let mut connections = Vec::new();

        let entries = std::fs::read_dir(data_dir).map_err(|e| {
            SourceError::NotFound(format!(
                "failed to read data directory {}: {e}",
                data_dir.display()
            ))
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| {
                SourceError::Unavailable(format!("failed to read directory entry: {e}"))
            })?;
            let path = entry.path();
            if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("json") {
                paths.push(path);
            }
        }
        // Load order decides which copy of a duplicate wins
        paths.sort();

        for path in paths {
            let json = std::fs::read_to_string(&path).map_err(|e| {
                SourceError::Unavailable(format!("failed to read {}: {e}", path.display()))
            })?;

            let loaded = parse_connections(&json).map_err(|e| {
                SourceError::Malformed(format!("{}: {e}", path.display()))
            })?;
            debug!(path = %path.display(), connections = loaded.len(), "loaded page file");

            for connection in loaded {
                if seen.insert(connection.id.clone()) {
                    connections.push(connection);
                }
            }
        }

        info!(
            dir = %data_dir.display(),
            connections = connections.len(),
            "loaded offline timetable"
        );

        Ok(Self {
            inner: MemorySource::from_shared(connections, page_size),
        })
    }

    /// Total number of distinct connections loaded.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns true if no connections were loaded.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl ConnectionSource for DirectorySource {
    async fn next_page(&self, cursor: &PageCursor) -> Result<Option<Page>, SourceError> {
        Ok(self.inner.page(cursor))
    }
}

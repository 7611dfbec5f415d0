//! File discovery for batch runs over directories.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::validate::has_supported_extension;

/// Discovers image files in directories.
pub struct FileDiscovery {
    /// Skip files whose name already starts with this prefix
    skip_prefix: Option<String>,
}

/// Information about a discovered file.
#[derive(Debug, Clone)]
pub struct DiscoveredFile {
    /// Full path to the file
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
}

impl FileDiscovery {
    pub fn new() -> Self {
        Self { skip_prefix: None }
    }

    /// Ignore files named with `prefix`, so earlier outputs are not
    /// processed again.
    pub fn skipping_prefix(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        Self {
            skip_prefix: (!prefix.is_empty()).then_some(prefix),
        }
    }

    /// Discover all supported image files at a path.
    ///
    /// If path is a file, returns it if supported.
    /// If path is a directory, recursively finds all supported files.
    pub fn discover(&self, path: &Path) -> Vec<DiscoveredFile> {
        if path.is_file() {
            if self.is_supported(path) {
                if let Ok(meta) = std::fs::metadata(path) {
                    return vec![DiscoveredFile {
                        path: path.to_path_buf(),
                        size: meta.len(),
                    }];
                }
            }
            return vec![];
        }

        let mut files = Vec::new();

        for entry in WalkDir::new(path)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let entry_path = entry.path();
            if entry_path.is_file() && self.is_supported(entry_path) && !self.is_skipped(entry_path) {
                if let Ok(meta) = entry.metadata() {
                    files.push(DiscoveredFile {
                        path: entry_path.to_path_buf(),
                        size: meta.len(),
                    });
                }
            }
        }

        // Sort by path for deterministic ordering
        files.sort_by(|a, b| a.path.cmp(&b.path));
        files
    }

    fn is_supported(&self, path: &Path) -> bool {
        has_supported_extension(path)
    }

    fn is_skipped(&self, path: &Path) -> bool {
        match (&self.skip_prefix, path.file_name().and_then(|n| n.to_str())) {
            (Some(prefix), Some(name)) => name.starts_with(prefix.as_str()),
            _ => false,
        }
    }

    /// Get total size of all discovered files.
    pub fn total_size(files: &[DiscoveredFile]) -> u64 {
        files.iter().map(|f| f.size).sum()
    }
}

impl Default for FileDiscovery {
    fn default() -> Self {
        Self::new()
    }
}

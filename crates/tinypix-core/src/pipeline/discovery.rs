//! File discovery for finding images in a source directory.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::ScanConfig;
use crate::error::PipelineError;

/// Discovers image files in a directory.
pub struct FileDiscovery {
    config: ScanConfig,
    excluded: Vec<PathBuf>,
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
    /// Create a new file discovery instance.
    pub fn new(config: ScanConfig) -> Self {
        Self {
            config,
            excluded: Vec::new(),
        }
    }

    /// Never descend into `dir` (used for a target directory nested in the source).
    pub fn exclude(mut self, dir: &Path) -> Self {
        let dir = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
        self.excluded.push(dir);
        self
    }

    /// Discover all supported image files in `source`.
    ///
    /// Only the top level is listed unless `scan.recursive` is set.
    pub fn discover(&self, source: &Path) -> Result<Vec<DiscoveredFile>, PipelineError> {
        if !source.is_dir() {
            return Err(PipelineError::SourceNotDirectory(source.to_path_buf()));
        }
        let root = source
            .canonicalize()
            .unwrap_or_else(|_| source.to_path_buf());

        let mut walker = WalkDir::new(&root)
            .min_depth(1)
            .follow_links(self.config.follow_links);
        if !self.config.recursive {
            walker = walker.max_depth(1);
        }

        let mut files = Vec::new();
        for entry in walker
            .into_iter()
            .filter_entry(|e| !self.is_excluded(e.path()))
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Skipping unreadable entry: {e}");
                    continue;
                }
            };
            let entry_path = entry.path();
            if !entry_path.is_file() || !self.is_supported(entry_path) {
                continue;
            }
            if let Ok(meta) = entry.metadata() {
                files.push(DiscoveredFile {
                    path: entry_path.to_path_buf(),
                    size: meta.len(),
                });
            }
        }

        // Sort by path for deterministic ordering
        files.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(files)
    }

    fn is_excluded(&self, path: &Path) -> bool {
        self.excluded.iter().any(|dir| path == dir)
    }

    /// Check if a file has a supported extension.
    fn is_supported(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                self.config
                    .extensions
                    .iter()
                    .any(|known| known.eq_ignore_ascii_case(ext))
            })
            .unwrap_or(false)
    }

    /// Get total size of all discovered files.
    pub fn total_size(files: &[DiscoveredFile]) -> u64 {
        files.iter().map(|f| f.size).sum()
    }
}

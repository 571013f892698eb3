//! Sub-configuration structs with their defaults.

use serde::{Deserialize, Serialize};

/// Directory scanning settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Extensions treated as images (case-insensitive, no dot)
    pub extensions: Vec<String>,

    /// Descend into subdirectories
    pub recursive: bool,

    /// Follow symlinks while walking
    pub follow_links: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            extensions: vec![
                "png".to_string(),
                "jpg".to_string(),
                "jpeg".to_string(),
                "gif".to_string(),
                "bmp".to_string(),
                "heic".to_string(),
            ],
            recursive: false,
            follow_links: false,
        }
    }
}

/// Size predicate settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// An image is collected when width or height is below this many pixels
    pub max_size: u32,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self { max_size: 256 }
    }
}

/// Format conversion settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertConfig {
    /// Source extensions that are re-encoded instead of copied
    pub from: Vec<String>,

    /// Extension (and format) of converted files
    pub to: String,

    /// JPEG quality, 1-100
    pub jpeg_quality: u8,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            from: vec!["heic".to_string(), "heif".to_string()],
            to: "jpg".to_string(),
            jpeg_quality: 90,
        }
    }
}

impl ConvertConfig {
    /// Whether files with this extension get converted.
    pub fn converts(&self, ext: &str) -> bool {
        self.from.iter().any(|f| f.eq_ignore_ascii_case(ext))
    }
}

/// Worker pool settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Number of parallel workers; 0 means one per CPU
    pub workers: usize,
}

impl ProcessingConfig {
    /// Resolve `workers`, replacing 0 with the available parallelism.
    pub fn effective_workers(&self) -> usize {
        if self.workers > 0 {
            return self.workers;
        }
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4)
    }
}

/// Resource limits to protect against problematic inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum file size in megabytes
    pub max_file_size_mb: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: 100,
        }
    }
}

/// What to do when the destination file already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictPolicy {
    /// Replace the existing file
    #[default]
    Overwrite,
    /// Leave the existing file and skip the source
    Skip,
    /// Write under a new `name-N.ext`, unless the existing file is identical
    Rename,
}

impl std::fmt::Display for ConflictPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConflictPolicy::Overwrite => write!(f, "overwrite"),
            ConflictPolicy::Skip => write!(f, "skip"),
            ConflictPolicy::Rename => write!(f, "rename"),
        }
    }
}

/// Output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory small images are collected into (supports `~`)
    pub target_dir: String,

    /// Destination conflict handling
    pub on_conflict: ConflictPolicy,

    /// Pretty-print JSON reports
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            target_dir: "~/Downloads/small_files".to_string(),
            on_conflict: ConflictPolicy::Overwrite,
            pretty: true,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

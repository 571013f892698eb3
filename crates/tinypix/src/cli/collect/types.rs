//! CLI enum types for the collect command.

use clap::ValueEnum;
use tinypix_core::config::ConflictPolicy;

/// Report formats.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ReportFormat {
    /// One JSON document with outcomes and stats
    Json,
    /// One JSON object per file (newline-delimited)
    Jsonl,
}

impl std::fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportFormat::Json => write!(f, "json"),
            ReportFormat::Jsonl => write!(f, "jsonl"),
        }
    }
}

impl From<ReportFormat> for tinypix_core::OutputFormat {
    fn from(format: ReportFormat) -> Self {
        match format {
            ReportFormat::Json => tinypix_core::OutputFormat::Json,
            ReportFormat::Jsonl => tinypix_core::OutputFormat::JsonLines,
        }
    }
}

/// What to do when a destination file already exists.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OnConflict {
    /// Replace the existing file
    Overwrite,
    /// Keep the existing file
    Skip,
    /// Write as name-N.ext (identical copies are skipped)
    Rename,
}

impl From<OnConflict> for ConflictPolicy {
    fn from(value: OnConflict) -> Self {
        match value {
            OnConflict::Overwrite => ConflictPolicy::Overwrite,
            OnConflict::Skip => ConflictPolicy::Skip,
            OnConflict::Rename => ConflictPolicy::Rename,
        }
    }
}

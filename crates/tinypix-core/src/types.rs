//! Core data types produced by the collection pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// How a collected image reached the target directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Byte-for-byte copy with timestamps preserved
    Copied,
    /// Decoded and re-encoded into another format
    Converted,
}

/// A small image that was (or, in dry-run mode, would be) collected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectedImage {
    /// Path of the source file
    pub source: PathBuf,

    /// File name written to the target directory
    pub file_name: String,

    /// Full destination path
    pub destination: PathBuf,

    /// Image width in pixels
    pub width: u32,

    /// Image height in pixels
    pub height: u32,

    /// Detected source format ("png", "jpeg", "heic", ...)
    pub format: String,

    /// Source file size in bytes
    pub file_size: u64,

    pub action: Action,

    /// BLAKE3 hash of the written file; absent in dry-run mode
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<String>,
}

/// The result of running one file through the pipeline.
///
/// Internally tagged: `{"outcome":"collected",...}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum FileOutcome {
    /// Below the size threshold and written to the target directory
    Collected(CollectedImage),

    /// Both dimensions at or above the threshold
    Rejected {
        source: PathBuf,
        width: u32,
        height: u32,
    },

    /// Destination already present and left untouched
    Skipped {
        source: PathBuf,
        destination: PathBuf,
        reason: String,
    },

    /// Any error in validate, probe, or transfer
    Failed { source: PathBuf, error: String },
}

impl FileOutcome {
    /// Path of the source file this outcome is about.
    pub fn source(&self) -> &PathBuf {
        match self {
            FileOutcome::Collected(img) => &img.source,
            FileOutcome::Rejected { source, .. }
            | FileOutcome::Skipped { source, .. }
            | FileOutcome::Failed { source, .. } => source,
        }
    }

    pub fn is_collected(&self) -> bool {
        matches!(self, FileOutcome::Collected(_))
    }
}

/// Counters for a batch run.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProcessingStats {
    /// Files handed to the pool
    pub scanned: usize,

    /// Files collected (copied or converted)
    pub collected: usize,

    /// Of `collected`, how many were converted
    pub converted: usize,

    /// Files at or above the size threshold
    pub rejected: usize,

    /// Files whose destination already existed
    pub skipped: usize,

    /// Files that errored
    pub failed: usize,

    /// Total source bytes of collected files
    pub collected_bytes: u64,

    /// Processing rate in files per second
    pub files_per_second: f64,

    /// Total processing time in seconds
    pub total_seconds: f64,
}

impl ProcessingStats {
    /// Count one outcome.
    pub fn record(&mut self, outcome: &FileOutcome) {
        self.scanned += 1;
        match outcome {
            FileOutcome::Collected(img) => {
                self.collected += 1;
                self.collected_bytes += img.file_size;
                if img.action == Action::Converted {
                    self.converted += 1;
                }
            }
            FileOutcome::Rejected { .. } => self.rejected += 1,
            FileOutcome::Skipped { .. } => self.skipped += 1,
            FileOutcome::Failed { .. } => self.failed += 1,
        }
    }
}

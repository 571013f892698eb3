//! Error types for the tinypix collection pipeline.
//!
//! Errors are organized by stage so a failed file can be reported with the
//! path and the step that rejected it.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for tinypix operations.
#[derive(Error, Debug)]
pub enum TinypixError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Pipeline processing errors
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Pipeline errors, one variant per stage.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Source is missing or not a directory
    #[error("Not a directory: {0}")]
    SourceNotDirectory(PathBuf),

    /// Header could not be read
    #[error("Cannot read image header of {path}: {message}")]
    Probe { path: PathBuf, message: String },

    /// Full decode failed (conversion path)
    #[error("Decode error for {path}: {message}")]
    Decode { path: PathBuf, message: String },

    /// Writing the converted image failed
    #[error("Encode error for {path}: {message}")]
    Encode { path: PathBuf, message: String },

    /// Copying to the target directory failed
    #[error("Copy of {from} to {to} failed: {source}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File exceeds size limit
    #[error("File too large: {path} ({size_mb}MB > {max_mb}MB)")]
    FileTooLarge {
        path: PathBuf,
        size_mb: u64,
        max_mb: u64,
    },

    /// Unsupported image format
    #[error("Unsupported format for {path}: {format}")]
    UnsupportedFormat { path: PathBuf, format: String },

    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),
}

/// Convenience type alias for tinypix results.
pub type Result<T> = std::result::Result<T, TinypixError>;

/// Convenience type alias for pipeline-specific results.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

//! Cheap checks run before any decoder touches a file.

use std::io::Read;
use std::path::Path;

use crate::config::LimitsConfig;
use crate::error::PipelineError;

/// Container family recognized from a file's leading bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signature {
    Jpeg,
    Png,
    Gif,
    WebP,
    Bmp,
    Tiff,
    /// ISO-BMFF `ftyp` box: HEIC, HEIF or AVIF
    IsoBmff,
}

/// Validates files before probing.
pub struct Validator {
    limits: LimitsConfig,
}

impl Validator {
    /// Create a new validator with the given limits.
    pub fn new(limits: LimitsConfig) -> Self {
        Self { limits }
    }

    /// Check existence, size limit and magic bytes.
    ///
    /// Returns the recognized signature so callers can route HEIC files.
    pub fn validate(&self, path: &Path) -> Result<Signature, PipelineError> {
        let metadata = std::fs::metadata(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                PipelineError::FileNotFound(path.to_path_buf())
            } else {
                PipelineError::Probe {
                    path: path.to_path_buf(),
                    message: format!("Cannot read metadata: {e}"),
                }
            }
        })?;

        let max_bytes = self.limits.max_file_size_mb.saturating_mul(1024 * 1024);
        if metadata.len() > max_bytes {
            return Err(PipelineError::FileTooLarge {
                path: path.to_path_buf(),
                size_mb: metadata.len() / (1024 * 1024),
                max_mb: self.limits.max_file_size_mb,
            });
        }

        let header = Self::read_header(path)?;
        sniff(&header).ok_or_else(|| PipelineError::Probe {
            path: path.to_path_buf(),
            message: "Unrecognized image format (invalid magic bytes)".to_string(),
        })
    }

    fn read_header(path: &Path) -> Result<Vec<u8>, PipelineError> {
        let file = std::fs::File::open(path).map_err(|e| PipelineError::Probe {
            path: path.to_path_buf(),
            message: format!("Cannot open file: {e}"),
        })?;

        let mut header = Vec::with_capacity(12);
        file.take(12)
            .read_to_end(&mut header)
            .map_err(|e| PipelineError::Probe {
                path: path.to_path_buf(),
                message: format!("Cannot read header: {e}"),
            })?;

        if header.len() < 4 {
            return Err(PipelineError::Probe {
                path: path.to_path_buf(),
                message: "File too small to be a valid image".to_string(),
            });
        }
        Ok(header)
    }
}

/// Identify an image container from its first bytes (up to 12 are used).
pub fn sniff(header: &[u8]) -> Option<Signature> {
    match header {
        [0xFF, 0xD8, 0xFF, ..] => Some(Signature::Jpeg),
        [0x89, b'P', b'N', b'G', ..] => Some(Signature::Png),
        [b'G', b'I', b'F', b'8', ..] => Some(Signature::Gif),
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => Some(Signature::WebP),
        [b'B', b'M', ..] => Some(Signature::Bmp),
        [b'I', b'I', 0x2A, 0x00, ..] | [b'M', b'M', 0x00, 0x2A, ..] => Some(Signature::Tiff),
        [_, _, _, _, b'f', b't', b'y', b'p', ..] => Some(Signature::IsoBmff),
        _ => None,
    }
}

//! Header-only dimension probing.

use image::{ImageFormat, ImageReader};
use std::path::Path;

use crate::error::{PipelineError, PipelineResult};

use super::heic;
use super::validate::Signature;

/// Dimensions and format of an image, read without decoding pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbedImage {
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Lowercase format name ("png", "jpeg", "heic", ...)
    pub format: String,
    /// Needs libheif rather than the `image` crate to decode
    pub heif: bool,
}

/// Reads image headers.
pub struct ImageProbe;

impl ImageProbe {
    /// Probe `path`, routing ISO-BMFF containers to libheif.
    pub fn probe(path: &Path, signature: Signature) -> PipelineResult<ProbedImage> {
        if signature == Signature::IsoBmff {
            let (width, height) = heic::dimensions(path)?;
            return Ok(ProbedImage {
                width,
                height,
                format: "heic".to_string(),
                heif: true,
            });
        }
        Self::probe_raster(path)
    }

    fn probe_raster(path: &Path) -> PipelineResult<ProbedImage> {
        let probe_err = |message: String| PipelineError::Probe {
            path: path.to_path_buf(),
            message,
        };

        let reader = ImageReader::open(path)
            .and_then(|r| r.with_guessed_format())
            .map_err(|e| probe_err(e.to_string()))?;
        let format = match reader.format() {
            Some(f) => f,
            None => ImageFormat::from_path(path).map_err(|_| PipelineError::UnsupportedFormat {
                path: path.to_path_buf(),
                format: path
                    .extension()
                    .and_then(|e| e.to_str())
                    .unwrap_or("unknown")
                    .to_string(),
            })?,
        };

        // Stops after the header; no pixel data is decoded.
        let (width, height) = reader
            .into_dimensions()
            .map_err(|e| probe_err(e.to_string()))?;

        Ok(ProbedImage {
            width,
            height,
            format: format_to_string(format),
            heif: false,
        })
    }
}

/// Convert an ImageFormat to a string representation.
pub fn format_to_string(format: ImageFormat) -> String {
    match format {
        ImageFormat::Jpeg => "jpeg".to_string(),
        ImageFormat::Png => "png".to_string(),
        ImageFormat::WebP => "webp".to_string(),
        ImageFormat::Gif => "gif".to_string(),
        ImageFormat::Tiff => "tiff".to_string(),
        ImageFormat::Bmp => "bmp".to_string(),
        ImageFormat::Ico => "ico".to_string(),
        ImageFormat::Pnm => "pnm".to_string(),
        ImageFormat::Avif => "avif".to_string(),
        _ => "unknown".to_string(),
    }
}

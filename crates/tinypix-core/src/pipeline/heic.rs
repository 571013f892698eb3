//! HEIC/HEIF support through libheif.
//!
//! Compiled in with the `heic` feature. Without it every call reports
//! `PipelineError::UnsupportedFormat` so those files land in the failed
//! bucket with a readable message.

use image::DynamicImage;
use std::path::Path;

use crate::error::PipelineResult;

/// Whether this build can read HEIC files.
pub const SUPPORTED: bool = cfg!(feature = "heic");

#[cfg(feature = "heic")]
mod imp {
    use image::{DynamicImage, RgbImage};
    use libheif_rs::{ColorSpace, HeifContext, LibHeif, RgbChroma};
    use std::path::Path;

    use crate::error::{PipelineError, PipelineResult};

    fn open(path: &Path) -> PipelineResult<HeifContext<'static>> {
        let path_str = path.to_str().ok_or_else(|| PipelineError::Probe {
            path: path.to_path_buf(),
            message: "path is not valid UTF-8".to_string(),
        })?;
        HeifContext::read_from_file(path_str).map_err(|e| PipelineError::Probe {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    pub fn dimensions(path: &Path) -> PipelineResult<(u32, u32)> {
        let ctx = open(path)?;
        let handle = ctx
            .primary_image_handle()
            .map_err(|e| PipelineError::Probe {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        Ok((handle.width(), handle.height()))
    }

    pub fn decode(path: &Path) -> PipelineResult<DynamicImage> {
        let decode_err = |message: String| PipelineError::Decode {
            path: path.to_path_buf(),
            message,
        };

        let lib_heif = LibHeif::new();
        let ctx = open(path)?;
        let handle = ctx
            .primary_image_handle()
            .map_err(|e| decode_err(e.to_string()))?;
        let image = lib_heif
            .decode(&handle, ColorSpace::Rgb(RgbChroma::Rgb), None)
            .map_err(|e| decode_err(e.to_string()))?;

        let planes = image.planes();
        let plane = planes
            .interleaved
            .ok_or_else(|| decode_err("no interleaved RGB plane".to_string()))?;

        // Rows are padded to `stride`; repack them tightly.
        let row_bytes = plane.width as usize * 3;
        let mut pixels = Vec::with_capacity(row_bytes * plane.height as usize);
        for row in plane.data.chunks(plane.stride).take(plane.height as usize) {
            pixels.extend_from_slice(&row[..row_bytes]);
        }

        RgbImage::from_raw(plane.width, plane.height, pixels)
            .map(DynamicImage::ImageRgb8)
            .ok_or_else(|| decode_err("pixel buffer size mismatch".to_string()))
    }
}

#[cfg(not(feature = "heic"))]
mod imp {
    use image::DynamicImage;
    use std::path::Path;

    use crate::error::{PipelineError, PipelineResult};

    fn unsupported(path: &Path) -> PipelineError {
        PipelineError::UnsupportedFormat {
            path: path.to_path_buf(),
            format: "heic (rebuild with the `heic` feature)".to_string(),
        }
    }

    pub fn dimensions(path: &Path) -> PipelineResult<(u32, u32)> {
        Err(unsupported(path))
    }

    pub fn decode(path: &Path) -> PipelineResult<DynamicImage> {
        Err(unsupported(path))
    }
}

/// Read width and height from the HEIF container without decoding pixels.
pub fn dimensions(path: &Path) -> PipelineResult<(u32, u32)> {
    imp::dimensions(path)
}

/// Fully decode the primary image to 8-bit RGB.
pub fn decode(path: &Path) -> PipelineResult<DynamicImage> {
    imp::decode(path)
}

//! Writing small images into the target directory.
//!
//! Sources whose extension is listed in `convert.from` are decoded and
//! re-encoded as `convert.to`; everything else is copied with its
//! permissions and timestamps.
//!
//! Output is staged in a hidden file next to the destination and renamed
//! into place once complete, so a failure never touches an existing file.

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, ImageReader};
use std::fs::{File, FileTimes, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::config::{ConflictPolicy, ConvertConfig};
use crate::error::{PipelineError, PipelineResult};
use crate::types::Action;

use super::hash;
use super::heic;
use super::probe::ProbedImage;

/// Upper bound on `name-N` candidates tried under the rename policy.
const MAX_RENAME_ATTEMPTS: u32 = 10_000;

/// Where a source file should go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    /// Write to `destination`. `claimed` means an empty placeholder was
    /// created there to reserve the name.
    Write { destination: PathBuf, claimed: bool },
    /// Leave the target directory alone
    Skip { destination: PathBuf, reason: String },
}

/// Copies or converts files into one target directory.
pub struct Transfer {
    target_dir: PathBuf,
    convert: ConvertConfig,
    policy: ConflictPolicy,
}

impl Transfer {
    pub fn new(target_dir: PathBuf, convert: ConvertConfig, policy: ConflictPolicy) -> Self {
        Self {
            target_dir,
            convert,
            policy,
        }
    }

    pub fn target_dir(&self) -> &Path {
        &self.target_dir
    }

    pub fn policy(&self) -> ConflictPolicy {
        self.policy
    }

    /// Destination file name and the action that produces it.
    pub fn plan(&self, source: &Path) -> (String, Action) {
        let ext = source
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        let file_name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "unnamed".to_string());

        if self.convert.converts(ext) {
            let stem = source
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "unnamed".to_string());
            (format!("{stem}.{}", self.convert.to), Action::Converted)
        } else {
            (file_name, Action::Copied)
        }
    }

    /// Apply the conflict policy to `file_name`.
    ///
    /// Outside dry-run, `skip` and `rename` atomically create the chosen
    /// destination so concurrent workers never pick the same name.
    pub fn place(
        &self,
        source: &Path,
        file_name: &str,
        action: Action,
        dry_run: bool,
    ) -> PipelineResult<Placement> {
        let destination = self.target_dir.join(file_name);
        let claimed = !dry_run;
        match self.policy {
            ConflictPolicy::Overwrite => Ok(Placement::Write {
                destination,
                claimed: false,
            }),
            ConflictPolicy::Skip => {
                if self.claim(source, &destination, dry_run)? {
                    Ok(Placement::Write {
                        destination,
                        claimed,
                    })
                } else {
                    Ok(Placement::Skip {
                        destination,
                        reason: "destination exists".to_string(),
                    })
                }
            }
            ConflictPolicy::Rename => {
                for n in 0..=MAX_RENAME_ATTEMPTS {
                    let candidate = if n == 0 {
                        destination.clone()
                    } else {
                        self.target_dir.join(numbered(file_name, n))
                    };
                    if self.claim(source, &candidate, dry_run)? {
                        return Ok(Placement::Write {
                            destination: candidate,
                            claimed,
                        });
                    }
                    // An earlier run may have collected this file under any suffix
                    if action == Action::Copied
                        && hash::same_content(source, &candidate).unwrap_or(false)
                    {
                        return Ok(Placement::Skip {
                            destination: candidate,
                            reason: "identical file already collected".to_string(),
                        });
                    }
                }
                Err(PipelineError::Copy {
                    from: source.to_path_buf(),
                    to: destination,
                    source: io::Error::new(
                        io::ErrorKind::AlreadyExists,
                        "no free file name left",
                    ),
                })
            }
        }
    }

    /// Reserve `destination`; false when it already exists.
    fn claim(&self, source: &Path, destination: &Path, dry_run: bool) -> PipelineResult<bool> {
        if dry_run {
            return Ok(!destination.exists());
        }
        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(destination)
        {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(false),
            Err(e) => Err(PipelineError::Copy {
                from: source.to_path_buf(),
                to: destination.to_path_buf(),
                source: e,
            }),
        }
    }

    /// Write `source` to `destination` according to `action`.
    ///
    /// On failure the destination is left as it was, except that a
    /// placeholder from `place` (`claimed`) is removed to free the name.
    pub fn execute(
        &self,
        source: &Path,
        probed: &ProbedImage,
        destination: &Path,
        action: Action,
        claimed: bool,
    ) -> PipelineResult<()> {
        let result = self.write_staged(source, probed, destination, action);
        if result.is_err() && claimed {
            let _ = std::fs::remove_file(destination);
        }
        result
    }

    fn write_staged(
        &self,
        source: &Path,
        probed: &ProbedImage,
        destination: &Path,
        action: Action,
    ) -> PipelineResult<()> {
        let copy_err = |e: io::Error| PipelineError::Copy {
            from: source.to_path_buf(),
            to: destination.to_path_buf(),
            source: e,
        };

        let dir = destination.parent().unwrap_or(self.target_dir.as_path());
        // Deleted on drop unless persisted
        let mut staged = tempfile::Builder::new()
            .prefix(".tinypix-")
            .suffix(".part")
            .tempfile_in(dir)
            .map_err(copy_err)?;

        match action {
            Action::Copied => {
                copy_preserving_times(source, staged.as_file_mut()).map_err(copy_err)?
            }
            Action::Converted => {
                self.convert(source, probed, destination, staged.as_file_mut())?;
                // The staging file is created 0600; match the source instead
                let permissions = std::fs::metadata(source).map_err(copy_err)?.permissions();
                staged
                    .as_file()
                    .set_permissions(permissions)
                    .map_err(copy_err)?;
            }
        }

        staged.persist(destination).map_err(|e| copy_err(e.error))?;
        Ok(())
    }

    fn convert(
        &self,
        source: &Path,
        probed: &ProbedImage,
        destination: &Path,
        out: &mut File,
    ) -> PipelineResult<()> {
        let image = if probed.heif {
            heic::decode(source)?
        } else {
            decode_raster(source)?
        };

        let format = ImageFormat::from_extension(&self.convert.to).ok_or_else(|| {
            PipelineError::UnsupportedFormat {
                path: destination.to_path_buf(),
                format: self.convert.to.clone(),
            }
        })?;
        let encode_err = |message: String| PipelineError::Encode {
            path: destination.to_path_buf(),
            message,
        };

        let mut writer = BufWriter::new(out);
        match format {
            ImageFormat::Jpeg => {
                // JPEG has no alpha channel
                let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
                let encoder = JpegEncoder::new_with_quality(&mut writer, self.convert.jpeg_quality);
                rgb.write_with_encoder(encoder)
                    .map_err(|e| encode_err(e.to_string()))?;
            }
            other => image
                .write_to(&mut writer, other)
                .map_err(|e| encode_err(e.to_string()))?,
        }
        writer.flush().map_err(|e| encode_err(e.to_string()))
    }
}

fn decode_raster(path: &Path) -> PipelineResult<DynamicImage> {
    let decode_err = |message: String| PipelineError::Decode {
        path: path.to_path_buf(),
        message,
    };
    ImageReader::open(path)
        .and_then(|r| r.with_guessed_format())
        .map_err(|e| decode_err(e.to_string()))?
        .decode()
        .map_err(|e| decode_err(e.to_string()))
}

/// `photo.png` -> `photo-3.png`
fn numbered(file_name: &str, n: u32) -> String {
    let path = Path::new(file_name);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default();
    match path.extension() {
        Some(ext) => format!("{stem}-{n}.{}", ext.to_string_lossy()),
        None => format!("{stem}-{n}"),
    }
}

/// Copy contents into `to`, then carry over access/modification times and
/// permissions.
///
/// Permissions are applied last so a read-only source doesn't block setting
/// the times on the copy.
fn copy_preserving_times(from: &Path, to: &mut File) -> io::Result<()> {
    let mut src = File::open(from)?;
    let meta = src.metadata()?;
    io::copy(&mut src, to)?;

    let mut times = FileTimes::new();
    if let Ok(modified) = meta.modified() {
        times = times.set_modified(modified);
    }
    if let Ok(accessed) = meta.accessed() {
        times = times.set_accessed(accessed);
    }
    to.set_times(times)?;
    to.set_permissions(meta.permissions())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, RgbImage, RgbaImage};
    use std::time::{Duration, SystemTime};

    fn transfer(dir: &Path, policy: ConflictPolicy) -> Transfer {
        Transfer::new(dir.to_path_buf(), ConvertConfig::default(), policy)
    }

    fn raster(width: u32, height: u32, format: &str) -> ProbedImage {
        ProbedImage {
            width,
            height,
            format: format.to_string(),
            heif: false,
        }
    }

    #[test]
    fn test_plan_names() {
        let t = transfer(Path::new("/out"), ConflictPolicy::Overwrite);
        assert_eq!(
            t.plan(Path::new("/in/IMG_0001.HEIC")),
            ("IMG_0001.jpg".to_string(), Action::Converted)
        );
        assert_eq!(
            t.plan(Path::new("/in/icon.png")),
            ("icon.png".to_string(), Action::Copied)
        );
    }

    #[test]
    fn test_numbered() {
        assert_eq!(numbered("photo.png", 1), "photo-1.png");
        assert_eq!(numbered("archive.tar.gz", 2), "archive.tar-2.gz");
        assert_eq!(numbered("README", 3), "README-3");
    }

    #[test]
    fn test_copy_preserves_bytes_and_mtime() {
        let src_dir = tempfile::tempdir().unwrap();
        let out_dir = tempfile::tempdir().unwrap();
        let source = src_dir.path().join("icon.png");
        RgbImage::new(16, 16).save(&source).unwrap();

        let old = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000_000_000);
        File::options()
            .write(true)
            .open(&source)
            .unwrap()
            .set_modified(old)
            .unwrap();

        let t = transfer(out_dir.path(), ConflictPolicy::Overwrite);
        let dest = out_dir.path().join("icon.png");
        t.execute(&source, &raster(16, 16, "png"), &dest, Action::Copied, false)
            .unwrap();

        assert_eq!(std::fs::read(&source).unwrap(), std::fs::read(&dest).unwrap());
        let copied_mtime = std::fs::metadata(&dest).unwrap().modified().unwrap();
        assert_eq!(copied_mtime, old);
    }

    #[test]
    fn test_convert_to_jpeg_drops_alpha() {
        let src_dir = tempfile::tempdir().unwrap();
        let out_dir = tempfile::tempdir().unwrap();
        let source = src_dir.path().join("sprite.png");
        RgbaImage::new(40, 30).save(&source).unwrap();

        let convert = ConvertConfig {
            from: vec!["png".to_string()],
            ..ConvertConfig::default()
        };
        let t = Transfer::new(out_dir.path().to_path_buf(), convert, ConflictPolicy::Overwrite);
        let (name, action) = t.plan(&source);
        assert_eq!(name, "sprite.jpg");
        assert_eq!(action, Action::Converted);

        let dest = out_dir.path().join(&name);
        t.execute(&source, &raster(40, 30, "png"), &dest, action, false)
            .unwrap();

        let written = image::open(&dest).unwrap();
        assert_eq!(written.dimensions(), (40, 30));
        assert_eq!(
            ImageFormat::from_path(&dest).unwrap(),
            ImageFormat::Jpeg
        );
        assert!(!written.color().has_alpha());
    }

    #[test]
    fn test_failed_conversion_leaves_no_file() {
        let src_dir = tempfile::tempdir().unwrap();
        let out_dir = tempfile::tempdir().unwrap();
        let source = src_dir.path().join("broken.bmp");
        std::fs::write(&source, b"BM this is not a bitmap").unwrap();

        let convert = ConvertConfig {
            from: vec!["bmp".to_string()],
            ..ConvertConfig::default()
        };
        let t = Transfer::new(out_dir.path().to_path_buf(), convert, ConflictPolicy::Rename);
        let dest = out_dir.path().join("broken.jpg");
        // Simulate the placeholder a rename claim leaves behind
        File::create(&dest).unwrap();

        let err = t
            .execute(&source, &raster(1, 1, "bmp"), &dest, Action::Converted, true)
            .unwrap_err();
        assert!(matches!(err, PipelineError::Decode { .. }));
        assert!(!dest.exists());
        assert_eq!(std::fs::read_dir(out_dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_failed_conversion_keeps_existing_destination() {
        let src_dir = tempfile::tempdir().unwrap();
        let out_dir = tempfile::tempdir().unwrap();
        let source = src_dir.path().join("sprite.png");
        RgbImage::new(32, 32).save(&source).unwrap();
        // Keep the header, drop the pixel data
        let bytes = std::fs::read(&source).unwrap();
        std::fs::write(&source, &bytes[..40]).unwrap();

        let dest = out_dir.path().join("sprite.jpg");
        std::fs::write(&dest, b"collected earlier").unwrap();

        let convert = ConvertConfig {
            from: vec!["png".to_string()],
            ..ConvertConfig::default()
        };
        let t = Transfer::new(out_dir.path().to_path_buf(), convert, ConflictPolicy::Overwrite);
        let placement = t
            .place(&source, "sprite.jpg", Action::Converted, false)
            .unwrap();
        let (destination, claimed) = match placement {
            Placement::Write {
                destination,
                claimed,
            } => (destination, claimed),
            other => panic!("Expected Write, got {other:?}"),
        };
        assert!(!claimed);

        let err = t
            .execute(
                &source,
                &raster(32, 32, "png"),
                &destination,
                Action::Converted,
                claimed,
            )
            .unwrap_err();
        assert!(matches!(err, PipelineError::Decode { .. }));
        assert_eq!(std::fs::read(&dest).unwrap(), b"collected earlier");
        assert_eq!(std::fs::read_dir(out_dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_vanished_source_keeps_existing_destination() {
        let out_dir = tempfile::tempdir().unwrap();
        let dest = out_dir.path().join("icon.png");
        std::fs::write(&dest, b"collected earlier").unwrap();

        let t = transfer(out_dir.path(), ConflictPolicy::Overwrite);
        let err = t
            .execute(
                Path::new("/no/such/icon.png"),
                &raster(16, 16, "png"),
                &dest,
                Action::Copied,
                false,
            )
            .unwrap_err();
        assert!(matches!(err, PipelineError::Copy { .. }));
        assert_eq!(std::fs::read(&dest).unwrap(), b"collected earlier");
    }

    #[test]
    fn test_overwrite_replaces_existing_destination() {
        let src_dir = tempfile::tempdir().unwrap();
        let out_dir = tempfile::tempdir().unwrap();
        let source = src_dir.path().join("icon.png");
        RgbImage::new(8, 8).save(&source).unwrap();
        let dest = out_dir.path().join("icon.png");
        std::fs::write(&dest, b"stale").unwrap();

        let t = transfer(out_dir.path(), ConflictPolicy::Overwrite);
        t.execute(&source, &raster(8, 8, "png"), &dest, Action::Copied, false)
            .unwrap();
        assert_eq!(std::fs::read(&dest).unwrap(), std::fs::read(&source).unwrap());
        assert_eq!(std::fs::read_dir(out_dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_place_overwrite_ignores_existing() {
        let out_dir = tempfile::tempdir().unwrap();
        std::fs::write(out_dir.path().join("a.png"), b"old").unwrap();
        let t = transfer(out_dir.path(), ConflictPolicy::Overwrite);

        let placement = t
            .place(Path::new("/in/a.png"), "a.png", Action::Copied, false)
            .unwrap();
        assert_eq!(
            placement,
            Placement::Write {
                destination: out_dir.path().join("a.png"),
                claimed: false,
            }
        );
    }

    #[test]
    fn test_place_skip() {
        let out_dir = tempfile::tempdir().unwrap();
        std::fs::write(out_dir.path().join("a.png"), b"old").unwrap();
        let t = transfer(out_dir.path(), ConflictPolicy::Skip);

        let placement = t
            .place(Path::new("/in/a.png"), "a.png", Action::Copied, false)
            .unwrap();
        assert!(matches!(placement, Placement::Skip { .. }));

        let placement = t
            .place(Path::new("/in/b.png"), "b.png", Action::Copied, false)
            .unwrap();
        assert_eq!(
            placement,
            Placement::Write {
                destination: out_dir.path().join("b.png"),
                claimed: true,
            }
        );
        // The claim reserved the name
        assert!(out_dir.path().join("b.png").exists());
    }

    #[test]
    fn test_place_rename() {
        let src_dir = tempfile::tempdir().unwrap();
        let out_dir = tempfile::tempdir().unwrap();
        let source = src_dir.path().join("a.png");
        std::fs::write(&source, b"new contents").unwrap();
        std::fs::write(out_dir.path().join("a.png"), b"other").unwrap();
        std::fs::write(out_dir.path().join("a-1.png"), b"other too").unwrap();
        let t = transfer(out_dir.path(), ConflictPolicy::Rename);

        let placement = t.place(&source, "a.png", Action::Copied, false).unwrap();
        assert_eq!(
            placement,
            Placement::Write {
                destination: out_dir.path().join("a-2.png"),
                claimed: true,
            }
        );
    }

    #[test]
    fn test_place_rename_skips_identical_copy() {
        let src_dir = tempfile::tempdir().unwrap();
        let out_dir = tempfile::tempdir().unwrap();
        let source = src_dir.path().join("a.png");
        std::fs::write(&source, b"same").unwrap();
        std::fs::write(out_dir.path().join("a.png"), b"same").unwrap();
        let t = transfer(out_dir.path(), ConflictPolicy::Rename);

        let placement = t.place(&source, "a.png", Action::Copied, false).unwrap();
        assert!(matches!(placement, Placement::Skip { .. }));
    }

    #[test]
    fn test_place_rename_skips_identical_numbered_copy() {
        let src_dir = tempfile::tempdir().unwrap();
        let out_dir = tempfile::tempdir().unwrap();
        let source = src_dir.path().join("a.png");
        std::fs::write(&source, b"same").unwrap();
        std::fs::write(out_dir.path().join("a.png"), b"different").unwrap();
        std::fs::write(out_dir.path().join("a-1.png"), b"other").unwrap();
        std::fs::write(out_dir.path().join("a-2.png"), b"same").unwrap();
        let t = transfer(out_dir.path(), ConflictPolicy::Rename);

        let placement = t.place(&source, "a.png", Action::Copied, false).unwrap();
        assert_eq!(
            placement,
            Placement::Skip {
                destination: out_dir.path().join("a-2.png"),
                reason: "identical file already collected".to_string(),
            }
        );
        assert!(!out_dir.path().join("a-3.png").exists());
    }

    #[test]
    fn test_dry_run_place_creates_nothing() {
        let out_dir = tempfile::tempdir().unwrap();
        let t = transfer(out_dir.path(), ConflictPolicy::Rename);

        let placement = t
            .place(Path::new("/in/a.png"), "a.png", Action::Copied, true)
            .unwrap();
        assert_eq!(
            placement,
            Placement::Write {
                destination: out_dir.path().join("a.png"),
                claimed: false,
            }
        );
        assert!(!out_dir.path().join("a.png").exists());
    }
}

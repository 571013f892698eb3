//! Pipeline orchestration for a single file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::config::{Config, ConflictPolicy};
use crate::error::PipelineResult;
use crate::types::{CollectedImage, FileOutcome};

use super::discovery::DiscoveredFile;
use super::filter::SizeFilter;
use super::hash;
use super::probe::ImageProbe;
use super::transfer::{Placement, Transfer};
use super::validate::Validator;

/// Options for controlling processing behavior.
#[derive(Debug, Clone, Default)]
pub struct ProcessOptions {
    /// Probe and filter only; write nothing to the target directory
    pub dry_run: bool,
}

/// Runs validate → probe → filter → transfer for one file.
pub struct ImageProcessor {
    validator: Validator,
    filter: SizeFilter,
    transfer: Transfer,
}

impl ImageProcessor {
    /// Create a new image processor with the given configuration.
    pub fn new(config: &Config) -> Self {
        Self {
            validator: Validator::new(config.limits.clone()),
            filter: SizeFilter::new(config.filter.max_size),
            transfer: Transfer::new(
                config.target_dir(),
                config.convert.clone(),
                config.output.on_conflict,
            ),
        }
    }

    pub fn filter(&self) -> SizeFilter {
        self.filter
    }

    pub fn target_dir(&self) -> &Path {
        self.transfer.target_dir()
    }

    /// Destination names shared by more than one of `files`.
    ///
    /// Only reported under the overwrite policy, where the last file written
    /// replaces the others. `IMG.heic` and `IMG.jpg` both map to `IMG.jpg`.
    pub fn overwrite_collisions(&self, files: &[DiscoveredFile]) -> Vec<(String, Vec<PathBuf>)> {
        if self.transfer.policy() != ConflictPolicy::Overwrite {
            return Vec::new();
        }
        let mut by_name: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
        for file in files {
            let (name, _) = self.transfer.plan(&file.path);
            by_name.entry(name).or_default().push(file.path.clone());
        }
        by_name
            .into_iter()
            .filter(|(_, sources)| sources.len() > 1)
            .collect()
    }

    /// Process one file. Errors are folded into `FileOutcome::Failed`.
    pub fn process(&self, path: &Path, options: &ProcessOptions) -> FileOutcome {
        match self.try_process(path, options) {
            Ok(outcome) => outcome,
            Err(e) => FileOutcome::Failed {
                source: path.to_path_buf(),
                error: e.to_string(),
            },
        }
    }

    fn try_process(&self, path: &Path, options: &ProcessOptions) -> PipelineResult<FileOutcome> {
        let start = std::time::Instant::now();
        tracing::debug!("Processing: {:?}", path);

        let signature = self.validator.validate(path)?;
        let probed = ImageProbe::probe(path, signature)?;
        tracing::trace!("  Probe: {}x{} {}", probed.width, probed.height, probed.format);

        if !self.filter.is_small(probed.width, probed.height) {
            return Ok(FileOutcome::Rejected {
                source: path.to_path_buf(),
                width: probed.width,
                height: probed.height,
            });
        }

        let (file_name, action) = self.transfer.plan(path);
        let (destination, claimed) = match self
            .transfer
            .place(path, &file_name, action, options.dry_run)?
        {
            Placement::Write {
                destination,
                claimed,
            } => (destination, claimed),
            Placement::Skip {
                destination,
                reason,
            } => {
                tracing::debug!("Skipping {:?}: {}", path, reason);
                return Ok(FileOutcome::Skipped {
                    source: path.to_path_buf(),
                    destination,
                    reason,
                });
            }
        };

        let content_hash = if options.dry_run {
            None
        } else {
            self.transfer
                .execute(path, &probed, &destination, action, claimed)?;
            // The file is already written; a hash failure shouldn't fail it.
            hash::content_hash(&destination).ok()
        };

        let file_size = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
        let file_name = destination
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or(file_name);

        tracing::debug!(
            "Collected {:?} as {} in {:?} ({}x{})",
            path,
            file_name,
            start.elapsed(),
            probed.width,
            probed.height
        );

        Ok(FileOutcome::Collected(CollectedImage {
            source: path.to_path_buf(),
            file_name,
            destination,
            width: probed.width,
            height: probed.height,
            format: probed.format,
            file_size,
            action,
            content_hash,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Action;
    use image::RgbImage;

    fn config_for(target: &Path) -> Config {
        let mut config = Config::default();
        config.output.target_dir = target.to_string_lossy().into_owned();
        config
    }

    #[test]
    fn test_process_options_default() {
        let options = ProcessOptions::default();
        assert!(!options.dry_run);
    }

    #[test]
    fn test_small_image_is_copied() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let path = src.path().join("icon.png");
        RgbImage::new(32, 32).save(&path).unwrap();

        let processor = ImageProcessor::new(&config_for(out.path()));
        let outcome = processor.process(&path, &ProcessOptions::default());

        match outcome {
            FileOutcome::Collected(img) => {
                assert_eq!(img.file_name, "icon.png");
                assert_eq!(img.action, Action::Copied);
                assert_eq!((img.width, img.height), (32, 32));
                assert!(img.content_hash.is_some());
                assert!(out.path().join("icon.png").exists());
            }
            other => panic!("Expected Collected, got {other:?}"),
        }
    }

    #[test]
    fn test_large_image_is_rejected() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let path = src.path().join("photo.png");
        RgbImage::new(300, 300).save(&path).unwrap();

        let processor = ImageProcessor::new(&config_for(out.path()));
        let outcome = processor.process(&path, &ProcessOptions::default());

        assert!(matches!(
            outcome,
            FileOutcome::Rejected {
                width: 300,
                height: 300,
                ..
            }
        ));
        assert!(!out.path().join("photo.png").exists());
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let path = src.path().join("thin.png");
        RgbImage::new(1000, 10).save(&path).unwrap();

        let processor = ImageProcessor::new(&config_for(out.path()));
        let outcome = processor.process(&path, &ProcessOptions { dry_run: true });

        match outcome {
            FileOutcome::Collected(img) => assert!(img.content_hash.is_none()),
            other => panic!("Expected Collected, got {other:?}"),
        }
        assert!(!out.path().join("thin.png").exists());
    }

    #[test]
    fn test_rename_rerun_does_not_duplicate() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let path = src.path().join("a.png");
        RgbImage::new(16, 16).save(&path).unwrap();
        std::fs::write(out.path().join("a.png"), b"someone else's a.png").unwrap();

        let mut config = config_for(out.path());
        config.output.on_conflict = ConflictPolicy::Rename;
        let processor = ImageProcessor::new(&config);

        match processor.process(&path, &ProcessOptions::default()) {
            FileOutcome::Collected(img) => assert_eq!(img.file_name, "a-1.png"),
            other => panic!("Expected Collected, got {other:?}"),
        }
        match processor.process(&path, &ProcessOptions::default()) {
            FileOutcome::Skipped { destination, .. } => {
                assert_eq!(destination, out.path().join("a-1.png"))
            }
            other => panic!("Expected Skipped, got {other:?}"),
        }
        assert!(!out.path().join("a-2.png").exists());
    }

    #[test]
    fn test_failed_conversion_keeps_earlier_output() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let path = src.path().join("sprite.png");
        RgbImage::new(32, 32).save(&path).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        std::fs::write(&path, &bytes[..40]).unwrap();
        std::fs::write(out.path().join("sprite.jpg"), b"earlier sprite").unwrap();

        let mut config = config_for(out.path());
        config.convert.from = vec!["png".to_string()];
        let processor = ImageProcessor::new(&config);

        let outcome = processor.process(&path, &ProcessOptions::default());
        assert!(matches!(outcome, FileOutcome::Failed { .. }));
        assert_eq!(
            std::fs::read(out.path().join("sprite.jpg")).unwrap(),
            b"earlier sprite"
        );
    }

    #[test]
    fn test_overwrite_collisions() {
        let out = tempfile::tempdir().unwrap();
        let files: Vec<DiscoveredFile> = ["/in/IMG.heic", "/in/IMG.jpg", "/in/other.png"]
            .iter()
            .map(|p| DiscoveredFile {
                path: PathBuf::from(p),
                size: 0,
            })
            .collect();

        let processor = ImageProcessor::new(&config_for(out.path()));
        let collisions = processor.overwrite_collisions(&files);
        assert_eq!(collisions.len(), 1);
        assert_eq!(collisions[0].0, "IMG.jpg");
        assert_eq!(collisions[0].1.len(), 2);

        let mut config = config_for(out.path());
        config.output.on_conflict = ConflictPolicy::Rename;
        assert!(ImageProcessor::new(&config)
            .overwrite_collisions(&files)
            .is_empty());
    }

    #[test]
    fn test_corrupt_file_fails_without_panicking() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let path = src.path().join("fake.jpg");
        std::fs::write(&path, b"plain text pretending").unwrap();

        let processor = ImageProcessor::new(&config_for(out.path()));
        let outcome = processor.process(&path, &ProcessOptions::default());

        match outcome {
            FileOutcome::Failed { source, error } => {
                assert_eq!(source, path);
                assert!(error.contains("magic bytes"));
            }
            other => panic!("Expected Failed, got {other:?}"),
        }
    }
}

//! tinypix core - find small images and collect them in one place.
//!
//! tinypix scans a directory for images, reads each header to get the pixel
//! dimensions, and copies every image with a side shorter than a threshold
//! into a target directory. Formats listed for conversion (HEIC by default)
//! are re-encoded on the way.
//!
//! # Architecture
//!
//! ```text
//! Discover → Validate → Probe header → Size filter → Copy / Convert → Report
//! ```
//!
//! Files are processed independently on a bounded worker pool.
//!
//! # Usage
//!
//! ```rust,ignore
//! use tinypix_core::{Config, ProcessOptions, Tinypix};
//!
//! #[tokio::main]
//! async fn main() -> tinypix_core::Result<()> {
//!     let tinypix = Tinypix::new(Config::load()?);
//!     let report = tinypix
//!         .collect("./photos".as_ref(), ProcessOptions::default(), |_| {})
//!         .await?;
//!     println!("Collected {}", report.stats.collected);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod types;

use std::path::Path;

// Re-exports for convenient access
pub use config::Config;
pub use error::{ConfigError, PipelineError, PipelineResult, Result, TinypixError};
pub use output::{OutputFormat, OutputWriter};
pub use pipeline::{
    BatchReport, BatchRunner, DiscoveredFile, FileDiscovery, ImageProcessor, ProcessOptions,
};
pub use types::{Action, CollectedImage, FileOutcome, ProcessingStats};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Whether this build can read HEIC files.
pub const HEIC_SUPPORTED: bool = pipeline::heic::SUPPORTED;

/// Main entry point: discovery plus a batch run with one configuration.
pub struct Tinypix {
    config: Config,
}

impl Tinypix {
    /// Create a new instance with the given configuration.
    pub fn new(config: Config) -> Self {
        tracing::debug!("Initializing tinypix v{}", VERSION);
        Self { config }
    }

    /// Get a reference to the current configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Find candidate images in `source`, never descending into the target directory.
    pub fn discover(&self, source: &Path) -> Result<Vec<DiscoveredFile>> {
        let files = FileDiscovery::new(self.config.scan.clone())
            .exclude(&self.config.target_dir())
            .discover(source)?;
        Ok(files)
    }

    /// Discover and process every image in `source`.
    ///
    /// The target directory is created first unless `options.dry_run` is set.
    /// `on_result` sees each outcome as its worker finishes.
    pub async fn collect<F>(
        &self,
        source: &Path,
        options: ProcessOptions,
        on_result: F,
    ) -> Result<BatchReport>
    where
        F: Fn(&FileOutcome) + Send + Sync + 'static,
    {
        let files = self.discover(source)?;
        self.collect_files(files, options, on_result).await
    }

    /// Process an already discovered list of files.
    pub async fn collect_files<F>(
        &self,
        files: Vec<DiscoveredFile>,
        options: ProcessOptions,
        on_result: F,
    ) -> Result<BatchReport>
    where
        F: Fn(&FileOutcome) + Send + Sync + 'static,
    {
        if !options.dry_run {
            std::fs::create_dir_all(self.config.target_dir())?;
        }

        let workers = self.config.processing.effective_workers();
        tracing::debug!("Processing {} file(s) with {} worker(s)", files.len(), workers);

        let runner = BatchRunner::new(ImageProcessor::new(&self.config), workers, options);
        Ok(runner.run(files, on_result).await)
    }
}

//! The `tinypix collect` command.

mod setup;
mod summary;
pub mod types;

pub use types::{OnConflict, ReportFormat};

use clap::Args;
use std::path::PathBuf;
use tinypix_core::{Config, FileOutcome, ProcessOptions, Tinypix};

use setup::setup_config;
use summary::{create_progress_bar, print_listing, print_summary};

/// Arguments for the `collect` command.
///
/// Flags left unset fall back to the config file.
#[derive(Args, Debug)]
pub struct CollectArgs {
    /// Directory to scan for images
    #[arg(required = true)]
    pub source: PathBuf,

    /// Directory small images are copied into [default: ~/Downloads/small_files]
    #[arg(short, long, env = "TINYPIX_TARGET_DIR")]
    pub target_dir: Option<PathBuf>,

    /// Collect images whose width or height is below this many pixels [default: 256]
    #[arg(short, long)]
    pub max_size: Option<u32>,

    /// Number of worker threads [default: number of CPUs]
    #[arg(short = 'j', long)]
    pub threads: Option<usize>,

    /// Also scan subdirectories
    #[arg(short, long)]
    pub recursive: bool,

    /// Report what would be collected without writing anything
    #[arg(long)]
    pub dry_run: bool,

    /// What to do when a file with the same name is already in the target
    #[arg(long, value_enum)]
    pub on_conflict: Option<OnConflict>,

    /// Write a per-file report to this path
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Report format
    #[arg(short, long, value_enum, default_value = "json")]
    pub format: ReportFormat,
}

/// Manual Default impl for constructing CollectArgs outside of clap.
///
/// Values match the clap annotations above.
impl Default for CollectArgs {
    fn default() -> Self {
        Self {
            source: PathBuf::new(),
            target_dir: None,
            max_size: None,
            threads: None,
            recursive: false,
            dry_run: false,
            on_conflict: None,
            report: None,
            format: ReportFormat::Json,
        }
    }
}

/// Execute the collect command.
pub async fn execute(args: CollectArgs, config: Config) -> anyhow::Result<()> {
    let config = setup_config(&args, config)?;
    let max_size = config.filter.max_size;
    let target_dir = config.target_dir();
    let pretty = config.output.pretty;

    let tinypix = Tinypix::new(config);
    let files = tinypix.discover(&args.source)?;
    if files.is_empty() {
        tracing::warn!("No supported image files found in {:?}", args.source);
    } else {
        tracing::info!(
            "Found {} image(s), using {} worker(s)",
            files.len(),
            tinypix.config().processing.effective_workers()
        );
    }

    let progress = create_progress_bar(files.len() as u64);
    let bar = progress.clone();
    let options = ProcessOptions {
        dry_run: args.dry_run,
    };

    let report = tinypix
        .collect_files(files, options, move |outcome| {
            if let FileOutcome::Failed { source, error } = outcome {
                let name = source
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| source.display().to_string());
                bar.suspend(|| tracing::error!("Error processing {name}: {error}"));
            }
            bar.inc(1);
        })
        .await?;
    progress.finish_and_clear();

    if let Some(ref report_path) = args.report {
        let written =
            tinypix_core::output::write_report_file(report_path, &report, args.format.into(), pretty)?;
        tracing::info!("Report ({}, {written} record(s)) written to {:?}", args.format, report_path);
    }

    print_listing(&mut std::io::stdout().lock(), &report, max_size, &target_dir)?;
    print_summary(&report.stats);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    #[test]
    fn collect_args_defaults() {
        let args = CollectArgs::default();
        assert!(args.target_dir.is_none());
        assert!(args.max_size.is_none());
        assert!(args.threads.is_none());
        assert!(!args.recursive);
        assert!(!args.dry_run);
        assert!(args.report.is_none());
        assert!(matches!(args.format, ReportFormat::Json));
    }

    #[tokio::test]
    async fn execute_writes_report_and_copies() {
        let source = tempfile::tempdir().unwrap();
        let target = tempfile::tempdir().unwrap();
        let report_dir = tempfile::tempdir().unwrap();
        RgbImage::new(1, 1)
            .save(source.path().join("pixel.png"))
            .unwrap();

        let report_path = report_dir.path().join("report.jsonl");
        let args = CollectArgs {
            source: source.path().to_path_buf(),
            target_dir: Some(target.path().to_path_buf()),
            threads: Some(2),
            report: Some(report_path.clone()),
            format: ReportFormat::Jsonl,
            ..CollectArgs::default()
        };

        execute(args, Config::default()).await.unwrap();

        assert!(target.path().join("pixel.png").exists());
        let report = std::fs::read_to_string(&report_path).unwrap();
        assert_eq!(report.lines().count(), 1);
        assert!(report.contains("\"outcome\":\"collected\""));
    }
}

//! Bounded worker pool over a list of discovered files.
//!
//! Each file runs on tokio's blocking pool; a semaphore caps how many run at
//! once. Outcomes are handed to a callback as they complete, so a caller can
//! drive a progress bar, and are aggregated into a `BatchReport`.

use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;

use crate::types::{CollectedImage, FileOutcome, ProcessingStats};

use super::discovery::DiscoveredFile;
use super::processor::{ImageProcessor, ProcessOptions};

/// Aggregated result of a batch.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    /// Every outcome, sorted by source path
    pub outcomes: Vec<FileOutcome>,
    pub stats: ProcessingStats,
    pub dry_run: bool,
}

impl BatchReport {
    fn from_outcomes(mut outcomes: Vec<FileOutcome>, elapsed: Duration, dry_run: bool) -> Self {
        outcomes.sort_by(|a, b| a.source().cmp(b.source()));

        let mut stats = ProcessingStats::default();
        for outcome in &outcomes {
            stats.record(outcome);
        }
        stats.total_seconds = elapsed.as_secs_f64();
        if stats.total_seconds > 0.0 {
            stats.files_per_second = stats.scanned as f64 / stats.total_seconds;
        }

        Self {
            outcomes,
            stats,
            dry_run,
        }
    }

    /// Collected images, ordered by destination file name.
    pub fn collected(&self) -> Vec<&CollectedImage> {
        let mut collected: Vec<&CollectedImage> = self
            .outcomes
            .iter()
            .filter_map(|o| match o {
                FileOutcome::Collected(img) => Some(img),
                _ => None,
            })
            .collect();
        collected.sort_by(|a, b| a.file_name.cmp(&b.file_name));
        collected
    }

    /// `(source, width, height)` for every image at or above the threshold.
    pub fn rejected(&self) -> Vec<(&Path, u32, u32)> {
        self.outcomes
            .iter()
            .filter_map(|o| match o {
                FileOutcome::Rejected {
                    source,
                    width,
                    height,
                } => Some((source.as_path(), *width, *height)),
                _ => None,
            })
            .collect()
    }

    /// `(source, reason)` for every file left alone because of a conflict.
    pub fn skipped(&self) -> Vec<(&Path, &str)> {
        self.outcomes
            .iter()
            .filter_map(|o| match o {
                FileOutcome::Skipped { source, reason, .. } => {
                    Some((source.as_path(), reason.as_str()))
                }
                _ => None,
            })
            .collect()
    }

    /// Wall-clock time of the batch.
    pub fn elapsed(&self) -> Duration {
        Duration::try_from_secs_f64(self.stats.total_seconds).unwrap_or_default()
    }

    /// `(source, error)` for every failed file.
    pub fn failures(&self) -> Vec<(&Path, &str)> {
        self.outcomes
            .iter()
            .filter_map(|o| match o {
                FileOutcome::Failed { source, error } => Some((source.as_path(), error.as_str())),
                _ => None,
            })
            .collect()
    }
}

/// Runs an `ImageProcessor` over many files with bounded concurrency.
pub struct BatchRunner {
    processor: Arc<ImageProcessor>,
    workers: usize,
    options: ProcessOptions,
}

impl BatchRunner {
    pub fn new(processor: ImageProcessor, workers: usize, options: ProcessOptions) -> Self {
        Self {
            processor: Arc::new(processor),
            workers: workers.max(1),
            options,
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Process every file, calling `on_result` once per file in completion order.
    ///
    /// A task that panics is reported as `FileOutcome::Failed`; the rest of
    /// the batch carries on.
    pub async fn run<F>(&self, files: Vec<DiscoveredFile>, on_result: F) -> BatchReport
    where
        F: Fn(&FileOutcome) + Send + Sync + 'static,
    {
        for (name, sources) in self.processor.overwrite_collisions(&files) {
            tracing::warn!(
                "{} files would be written as {name}; only the last one is kept: {:?}",
                sources.len(),
                sources
            );
        }

        let processor = self.processor.clone();
        let options = self.options.clone();
        self.run_with(files, move |path| processor.process(path, &options), on_result)
            .await
    }

    /// Run `process` over every file on the bounded pool.
    async fn run_with<P, F>(
        &self,
        files: Vec<DiscoveredFile>,
        process: P,
        on_result: F,
    ) -> BatchReport
    where
        P: Fn(&Path) -> FileOutcome + Send + Sync + 'static,
        F: Fn(&FileOutcome) + Send + Sync + 'static,
    {
        let start = Instant::now();
        let process = Arc::new(process);
        let semaphore = Arc::new(Semaphore::new(self.workers));
        let on_result = Arc::new(on_result);
        let mut handles = Vec::with_capacity(files.len());

        for file in files {
            let permit = match semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    tracing::warn!("Worker semaphore closed unexpectedly, stopping batch");
                    break;
                }
            };

            let process = process.clone();
            let callback = on_result.clone();
            let path = file.path.clone();

            let handle = tokio::task::spawn_blocking(move || {
                let outcome = process(&file.path);
                drop(permit); // Free the slot before the callback runs
                callback(&outcome);
                outcome
            });
            handles.push((path, handle));
        }

        let mut outcomes = Vec::with_capacity(handles.len());
        for (path, handle) in handles {
            match handle.await {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    tracing::error!("Worker for {:?} panicked: {e}", path);
                    let outcome = FileOutcome::Failed {
                        source: path,
                        error: format!("worker panicked: {e}"),
                    };
                    on_result(&outcome);
                    outcomes.push(outcome);
                }
            }
        }

        BatchReport::from_outcomes(outcomes, start.elapsed(), self.options.dry_run)
    }
}

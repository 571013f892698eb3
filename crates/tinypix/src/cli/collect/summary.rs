//! Progress bar and end-of-run output.

use std::io::{self, Write};
use std::path::Path;
use tinypix_core::{BatchReport, ProcessingStats};

/// Create a progress bar for the batch.
pub fn create_progress_bar(total: u64) -> indicatif::ProgressBar {
    use indicatif::{ProgressBar, ProgressStyle};

    let pb = ProgressBar::new(total);
    if let Ok(style) = ProgressStyle::default_bar().template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
    ) {
        pb.set_style(style.progress_chars("##-"));
    }
    pb.set_message("Processing images");
    pb
}

/// Print the collected file names and totals.
///
/// This goes to stdout so the list can be piped.
pub fn print_listing<W: Write>(
    out: &mut W,
    report: &BatchReport,
    max_size: u32,
    target_dir: &Path,
) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "Files smaller than {max_size}x{max_size} pixels:")?;
    for image in report.collected() {
        writeln!(out, "{}", image.file_name)?;
    }
    writeln!(out)?;
    if report.dry_run {
        writeln!(out, "Dry run: small files would be copied to: {}", target_dir.display())?;
    } else {
        writeln!(out, "Small files have been copied to: {}", target_dir.display())?;
    }
    writeln!(out, "Total small files: {}", report.stats.collected)
}

/// Print a formatted summary table to stderr.
pub fn print_summary(stats: &ProcessingStats) {
    let mb_collected = stats.collected_bytes as f64 / 1_000_000.0;

    eprintln!();
    eprintln!("  ====================================");
    eprintln!("               Summary");
    eprintln!("  ====================================");
    eprintln!("    Collected:    {:>8}", stats.collected);
    if stats.converted > 0 {
        eprintln!("      converted:  {:>8}", stats.converted);
    }
    eprintln!("    Too large:    {:>8}", stats.rejected);
    if stats.skipped > 0 {
        eprintln!("    Skipped:      {:>8}", stats.skipped);
    }
    if stats.failed > 0 {
        eprintln!("    Failed:       {:>8}", stats.failed);
    }
    eprintln!("  ------------------------------------");
    eprintln!("    Scanned:      {:>8}", stats.scanned);
    eprintln!("    Collected MB: {:>8.1}", mb_collected);
    eprintln!("    Duration:     {:>7.1}s", stats.total_seconds);
    eprintln!("    Rate:         {:>7.1} files/sec", stats.files_per_second);
    eprintln!("  ====================================");
}

//! Report output in JSON and JSON Lines.
//!
//! A JSON report is the whole `BatchReport` (outcomes plus stats) as one
//! document. A JSONL report streams one outcome per line and leaves the
//! stats to the terminal summary.

use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::error::Result;
use crate::pipeline::BatchReport;

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Single JSON document
    Json,
    /// One JSON object per line (newline-delimited JSON)
    JsonLines,
}

/// A writer that serializes items to JSON or JSONL format.
pub struct OutputWriter<W: Write> {
    writer: W,
    format: OutputFormat,
    pretty: bool,
    items_written: usize,
}

impl<W: Write> OutputWriter<W> {
    /// Create a new output writer.
    ///
    /// `pretty` only affects the JSON format.
    pub fn new(writer: W, format: OutputFormat, pretty: bool) -> Self {
        Self {
            writer,
            format,
            pretty,
            items_written: 0,
        }
    }

    /// Write a single item followed by a newline.
    pub fn write<T: Serialize>(&mut self, item: &T) -> io::Result<()> {
        if self.pretty && self.format == OutputFormat::Json {
            serde_json::to_writer_pretty(&mut self.writer, item).map_err(io::Error::other)?;
        } else {
            // JSONL is never pretty-printed (one object per line)
            serde_json::to_writer(&mut self.writer, item).map_err(io::Error::other)?;
        }
        writeln!(self.writer)?;
        self.items_written += 1;
        Ok(())
    }

    /// Write a batch report in the configured format.
    pub fn write_report(&mut self, report: &BatchReport) -> io::Result<()> {
        match self.format {
            OutputFormat::Json => self.write(report),
            OutputFormat::JsonLines => {
                for outcome in &report.outcomes {
                    self.write(outcome)?;
                }
                Ok(())
            }
        }
    }

    /// Get the number of items written.
    pub fn items_written(&self) -> usize {
        self.items_written
    }

    /// Flush the underlying writer.
    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// Write `report` to a file at `path`.
pub fn write_report_file(
    path: &Path,
    report: &BatchReport,
    format: OutputFormat,
    pretty: bool,
) -> Result<usize> {
    let file = File::create(path)?;
    let mut writer = OutputWriter::new(BufWriter::new(file), format, pretty);
    writer.write_report(report)?;
    writer.flush()?;
    Ok(writer.items_written())
}

//! tinypix CLI - collect small images from a directory.
//!
//! Scans a directory, reads each image header, and copies every image whose
//! width or height is under a threshold into one target directory. HEIC
//! files are converted to JPEG on the way (with the `heic` feature).
//!
//! # Usage
//!
//! ```bash
//! # Collect images under 256px into ~/Downloads/small_files
//! tinypix collect ./photos
//!
//! # Custom threshold, target and worker count
//! tinypix collect ./photos --max-size 128 --target-dir ./icons --threads 8
//!
//! # See what would happen, and keep a report
//! tinypix collect ./photos --dry-run --report plan.json
//!
//! # View configuration
//! tinypix config show
//! ```

use clap::{Parser, Subcommand};

mod cli;
mod logging;

/// tinypix - collect images smaller than a pixel threshold.
#[derive(Parser, Debug)]
#[command(name = "tinypix")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Copy (or convert) small images into the target directory
    Collect(cli::collect::CollectArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so use eprintln for config warnings.
    let config = match tinypix_core::Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `tinypix config path`."
            );
            tinypix_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("tinypix v{}", tinypix_core::VERSION);

    match cli.command {
        Commands::Collect(args) => cli::collect::execute(args, config).await,
        Commands::Config(args) => cli::config::execute(args).await,
    }
}

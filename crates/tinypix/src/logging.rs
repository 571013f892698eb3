//! Logging setup on top of `tracing-subscriber`.
//!
//! Logs go to stderr; stdout carries the list of collected files so it can be
//! piped. `RUST_LOG` overrides everything below.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Pick the effective level from the config value and the `-v` flag.
///
/// Unknown config values fall back to `info`. `-v` raises the level to at
/// least `debug` but keeps `trace` if configured.
fn effective_level(configured: &str, verbose: bool) -> &'static str {
    let configured = configured.trim().to_ascii_lowercase();
    let level = LEVELS
        .iter()
        .copied()
        .find(|l| *l == configured)
        .unwrap_or("info");
    if verbose && level != "trace" {
        "debug"
    } else {
        level
    }
}

/// Install the global subscriber.
///
/// Third-party crates stay at `warn` unless `RUST_LOG` says otherwise.
pub fn init(level: &str, json_format: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("warn,tinypix={level},tinypix_core={level}"))
    });

    let registry = tracing_subscriber::registry().with(filter);
    if json_format {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr)
                    .with_ansi(true),
            )
            .init();
    }
}

/// Initialize logging from the `[logging]` config section.
///
/// CLI flags can only raise verbosity or switch to JSON, never turn them off.
pub fn init_from_config(config: &tinypix_core::Config, verbose: bool, json_logs: bool) {
    let level = effective_level(&config.logging.level, verbose);
    let json_format = json_logs || config.logging.format.eq_ignore_ascii_case("json");
    init(level, json_format);
}

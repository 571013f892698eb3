//! Apply CLI overrides to the loaded config and check the inputs.

use tinypix_core::Config;

use super::CollectArgs;

/// Merge CLI flags into `config` and validate the result.
pub fn setup_config(args: &CollectArgs, mut config: Config) -> anyhow::Result<Config> {
    if !args.source.is_dir() {
        anyhow::bail!(
            "Source directory does not exist: {:?}\n\n  Hint: pass a directory, not a single file.",
            args.source
        );
    }

    if let Some(ref target) = args.target_dir {
        config.output.target_dir = target.to_string_lossy().into_owned();
    }
    if let Some(max_size) = args.max_size {
        config.filter.max_size = max_size;
    }
    if let Some(threads) = args.threads {
        config.processing.workers = threads;
    }
    if args.recursive {
        config.scan.recursive = true;
    }
    if let Some(policy) = args.on_conflict {
        config.output.on_conflict = policy.into();
    }

    config.validate()?;

    if !tinypix_core::HEIC_SUPPORTED
        && config
            .scan
            .extensions
            .iter()
            .any(|ext| ext.eq_ignore_ascii_case("heic") || ext.eq_ignore_ascii_case("heif"))
    {
        tracing::warn!(
            "This build has no HEIC support; .heic files will be reported as failed. \
             Rebuild with `--features heic` to convert them."
        );
    }

    Ok(config)
}

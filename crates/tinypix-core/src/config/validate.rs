//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.filter.max_size == 0 {
            return Err(ConfigError::ValidationError(
                "filter.max_size must be > 0".into(),
            ));
        }
        if self.scan.extensions.is_empty() {
            return Err(ConfigError::ValidationError(
                "scan.extensions must not be empty".into(),
            ));
        }
        if self.limits.max_file_size_mb == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_file_size_mb must be > 0".into(),
            ));
        }
        if self.convert.jpeg_quality == 0 || self.convert.jpeg_quality > 100 {
            return Err(ConfigError::ValidationError(
                "convert.jpeg_quality must be between 1 and 100".into(),
            ));
        }
        if image::ImageFormat::from_extension(&self.convert.to).is_none() {
            return Err(ConfigError::ValidationError(format!(
                "convert.to: unknown image format '{}'",
                self.convert.to
            )));
        }
        if self.convert.from.iter().any(|f| f.eq_ignore_ascii_case(&self.convert.to)) {
            return Err(ConfigError::ValidationError(
                "convert.from must not contain the convert.to format".into(),
            ));
        }
        if self.output.target_dir.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "output.target_dir must not be empty".into(),
            ));
        }
        Ok(())
    }
}

//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

fn check_range(name: &str, value: f32, min: f32, max: f32) -> Result<(), ConfigError> {
    if value.is_nan() || value < min || value > max {
        return Err(ConfigError::ValidationError(format!(
            "{name} must be between {min:.1} and {max:.1}"
        )));
    }
    Ok(())
}

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range("processing.noise_level", self.processing.noise_level, 0.0, 1.0)?;
        check_range("watermark.opacity", self.watermark.opacity, 0.0, 1.0)?;
        check_range("watermark.opacity_min", self.watermark.opacity_min, 0.0, 1.0)?;
        check_range("watermark.size_factor", self.watermark.size_factor, 0.1, 1.0)?;
        check_range("logo.size_factor", self.logo.size_factor, 0.1, 1.0)?;

        if self.limits.max_file_size_mb == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_file_size_mb must be > 0".into(),
            ));
        }
        if self.limits.max_image_dimension == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_image_dimension must be > 0".into(),
            ));
        }
        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            return Err(ConfigError::ValidationError(
                "logging.format must be \"pretty\" or \"json\"".into(),
            ));
        }
        Ok(())
    }
}

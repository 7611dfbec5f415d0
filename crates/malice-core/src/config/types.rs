//! Sub-configuration structs with their defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::noise::{NoiseKind, NoiseOrder};
use crate::output::EncodeFormat;
use crate::overlay::{OutlineSpec, OverlaySource, OverlaySpec, Position};
use crate::pipeline::resize::ResizeTarget;

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Directory searched for watermark and logo assets
    pub asset_dir: PathBuf,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            asset_dir: PathBuf::from("~/.malice/assets"),
        }
    }
}

/// Pixel pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Downscale target applied before any noise
    pub resize: ResizeTarget,

    /// Noise kernels to run; order here does not matter
    pub noise_types: Vec<NoiseKind>,

    /// Shared intensity for every selected kernel, in [0, 1]
    pub noise_level: f32,

    /// Fixed canonical order or shuffled order-independent kernels
    pub noise_order: NoiseOrder,

    /// Finish with a low-level Gaussian pass after the overlays
    pub final_pass: bool,

    /// Seed for the run's random source; entropy when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            resize: ResizeTarget::None,
            noise_types: vec![NoiseKind::Gaussian, NoiseKind::Dct],
            noise_level: 0.5,
            noise_order: NoiseOrder::Fixed,
            final_pass: true,
            seed: None,
        }
    }
}

/// Watermark overlay settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatermarkConfig {
    pub enabled: bool,

    /// Asset name or path; the bundled default when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    pub opacity: f32,

    /// Floor applied to `opacity`
    pub opacity_min: f32,

    /// Invert the watermark's RGB before compositing
    pub invert: bool,

    /// Draw a color-matched outline around the watermark
    pub outline: bool,

    /// Watermark's longer edge as a fraction of the image's shorter edge
    pub size_factor: f32,

    /// `#rrggbb`, `rrggbb` or `r,g,b`; sampled from the image when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outline_color: Option<String>,
}

impl Default for WatermarkConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            path: None,
            opacity: 0.6,
            opacity_min: 0.0,
            invert: false,
            outline: true,
            size_factor: 0.5,
            outline_color: None,
        }
    }
}

impl WatermarkConfig {
    /// Overlay spec for a resolved asset.
    pub fn overlay_spec(&self, source: OverlaySource) -> OverlaySpec {
        OverlaySpec {
            opacity: self.opacity,
            opacity_min: self.opacity_min,
            invert: self.invert,
            size_factor: self.size_factor,
            outline: OutlineSpec {
                enabled: self.outline,
                color: self.outline_color.clone(),
            },
            ..OverlaySpec::watermark(source)
        }
    }
}

/// Logo overlay settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogoConfig {
    pub enabled: bool,

    /// Asset name or path; the bundled default when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    pub position: Position,

    /// Logo's longer edge as a fraction of the image's shorter edge
    pub size_factor: f32,

    /// Distance from the image edge in pixels
    pub margin: u32,
}

impl Default for LogoConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: None,
            position: Position::Random,
            size_factor: 0.2,
            margin: 24,
        }
    }
}

impl LogoConfig {
    pub fn overlay_spec(&self, source: OverlaySource) -> OverlaySpec {
        OverlaySpec {
            position: self.position,
            size_factor: self.size_factor,
            margin: self.margin,
            ..OverlaySpec::logo(source)
        }
    }
}

/// Output file settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Image container: "png", "webp" or "jpeg"
    pub format: EncodeFormat,

    /// Output directory; next to the input when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,

    /// Prepended to the input's file stem
    pub prefix: String,

    /// Pretty-print JSON run reports
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: EncodeFormat::Png,
            dir: None,
            prefix: "maliced-".to_string(),
            pretty: false,
        }
    }
}

/// Resource limits to protect against problematic inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum file size in megabytes
    pub max_file_size_mb: u64,

    /// Maximum image dimension (width or height)
    pub max_image_dimension: u32,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: 100,
            max_image_dimension: 10000,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

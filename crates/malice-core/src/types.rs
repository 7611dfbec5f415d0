//! Run reports for the malice pipeline.
//!
//! These types describe what a run did to an image, so any run can be
//! audited or replayed from its seed.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::metadata::FakeType;
use crate::noise::NoiseSpec;
use crate::output::EncodeFormat;
use crate::overlay::OverlayOutcome;

/// Width and height in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn pixels(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

/// What the pixel stages did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformReport {
    /// Size of the decoded input
    pub original: Dimensions,

    /// Size after resizing (equal to `original` when not resized)
    pub resized: Dimensions,

    /// Noise kernels in the order they ran
    pub noise_plan: Vec<NoiseSpec>,

    pub watermark: OverlayOutcome,

    pub logo: OverlayOutcome,

    /// Whether the closing Gaussian pass ran
    pub final_pass: bool,
}

/// How the metadata stage ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetadataStatus {
    /// A non-empty EXIF block was written
    Written,
    /// The file carries no EXIF block
    Stripped,
    /// Writing failed; the image itself was still saved
    Failed,
}

/// Result of the metadata stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataOutcome {
    pub status: MetadataStatus,

    /// Fabricated template that was applied
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<FakeType>,

    /// Whether the no-AI marker was added
    pub no_ai_flag: bool,

    /// Number of tags written, the comment included
    pub fields: usize,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// The complete report for one processed image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessReport {
    /// Source file
    pub input: PathBuf,

    /// Written file
    pub output: PathBuf,

    /// Output container
    pub format: EncodeFormat,

    /// Seed of the run's random source
    pub seed: u64,

    #[serde(flatten)]
    pub transform: TransformReport,

    pub metadata: MetadataOutcome,

    /// Wall time for the whole run
    pub duration_ms: u64,
}

/// Processing statistics for a batch run.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProcessingStats {
    /// Total images processed successfully
    pub succeeded: usize,

    /// Total images that failed
    pub failed: usize,

    /// Processing rate in images per second
    pub images_per_second: f64,

    /// Total processing time in seconds
    pub total_seconds: f64,
}

#[cfg(test)]
pub(crate) fn sample_report() -> ProcessReport {
    use crate::noise::NoiseKind;
    use crate::overlay::{Placement, Position};

    ProcessReport {
        input: PathBuf::from("/photos/cat.jpg"),
        output: PathBuf::from("/photos/maliced-cat.png"),
        format: EncodeFormat::Png,
        seed: 7,
        transform: TransformReport {
            original: Dimensions::new(2000, 1000),
            resized: Dimensions::new(707, 353),
            noise_plan: vec![NoiseSpec::new(NoiseKind::Gaussian, 0.5)],
            watermark: OverlayOutcome::Disabled,
            logo: OverlayOutcome::Applied(Placement {
                position: Position::TopLeft,
                x: 24,
                y: 24,
                width: 70,
                height: 30,
                outline_color: None,
            }),
            final_pass: true,
        },
        metadata: MetadataOutcome {
            status: MetadataStatus::Written,
            template: Some(FakeType::Paint),
            no_ai_flag: true,
            fields: 6,
            error: None,
        },
        duration_ms: 120,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_json_shape() {
        let json = serde_json::to_value(sample_report()).unwrap();
        // Transform fields are flattened into the top level.
        assert_eq!(json["original"]["width"], 2000);
        assert_eq!(json["noise_plan"][0]["kind"], "gaussian");
        assert_eq!(json["watermark"]["status"], "disabled");
        assert_eq!(json["logo"]["status"], "applied");
        assert_eq!(json["logo"]["position"], "top-left");
        assert_eq!(json["metadata"]["status"], "written");
        assert_eq!(json["metadata"]["template"], "paint");
        assert!(json["metadata"].get("error").is_none());
    }

    #[test]
    fn test_report_roundtrip() {
        let json = serde_json::to_string(&sample_report()).unwrap();
        let parsed: ProcessReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.transform, sample_report().transform);
        assert_eq!(parsed.seed, 7);
    }

    #[test]
    fn test_dimensions_pixels() {
        assert_eq!(Dimensions::new(70_000, 70_000).pixels(), 4_900_000_000);
    }
}

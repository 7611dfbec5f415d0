//! Pipeline orchestration - wires together all processing stages.
//!
//! Stage order is fixed: resize, noise plan, watermark, logo, final Gaussian
//! pass, encode, metadata. Only the noise plan's internal order may vary,
//! and it is resolved once before any kernel runs.

use std::path::{Path, PathBuf};
use std::time::Instant;

use image::{DynamicImage, GenericImageView};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::Config;
use crate::error::{PipelineError, Result};
use crate::metadata::{self, MetadataRecord};
use crate::noise::{apply_plan, resolve_plan, NoiseKind, NoiseSpec};
use crate::output::output_path;
use crate::overlay::{self, OverlayOutcome, OverlaySpec};
use crate::types::{Dimensions, MetadataOutcome, MetadataStatus, ProcessReport, TransformReport};

use super::assets::{AssetKind, AssetResolver, FsAssetResolver};
use super::decode::ImageDecoder;
use super::discovery::{DiscoveredFile, FileDiscovery};
use super::resize::resize;
use super::validate::Validator;

/// Level of the closing Gaussian pass (σ = 2).
const FINAL_PASS_LEVEL: f32 = 0.0;

/// The main image processor that orchestrates the full pipeline.
pub struct ImageProcessor {
    config: Config,
    decoder: ImageDecoder,
    validator: Validator,
    discovery: FileDiscovery,
    assets: Box<dyn AssetResolver>,
}

impl ImageProcessor {
    /// Create a processor with an explicit asset resolver.
    pub fn new(config: Config, assets: Box<dyn AssetResolver>) -> Self {
        Self {
            decoder: ImageDecoder::new(config.limits.clone()),
            validator: Validator::new(config.limits.clone()),
            discovery: FileDiscovery::skipping_prefix(config.output.prefix.clone()),
            assets,
            config,
        }
    }

    /// Create a processor that loads assets from the configured asset directory.
    pub fn with_fs_assets(config: Config) -> Self {
        let assets = FsAssetResolver::new(config.asset_dir());
        Self::new(config, Box::new(assets))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Where the output for `input` goes by default.
    pub fn output_path_for(&self, input: &Path) -> PathBuf {
        output_path(
            input,
            self.config.output_dir().as_deref(),
            &self.config.output.prefix,
            self.config.output.format,
        )
    }

    /// Discover all image files at a path.
    pub fn discover(&self, path: &Path) -> Vec<DiscoveredFile> {
        self.discovery.discover(path)
    }

    /// Process `input` into `output`, seeding from config or entropy.
    pub fn process(&self, input: &Path, output: &Path) -> Result<ProcessReport> {
        let seed = self.config.processing.seed.unwrap_or_else(rand::random);
        self.process_seeded(input, output, seed)
    }

    /// Process `input` into `output` with an explicit seed.
    ///
    /// The same seed, input and config always produce the same pixels.
    pub fn process_seeded(&self, input: &Path, output: &Path, seed: u64) -> Result<ProcessReport> {
        let start = Instant::now();
        tracing::info!(input = %input.display(), seed, "Processing image");

        self.validator.validate(input)?;
        let decoded = self.decoder.decode(input)?;
        tracing::debug!(
            format = ?decoded.format,
            width = decoded.width,
            height = decoded.height,
            "Decoded"
        );

        let policy = &self.config.metadata;
        let existing = if policy.remove {
            MetadataRecord::new()
        } else {
            metadata::read_record(input)
        };

        let mut rng = StdRng::seed_from_u64(seed);
        let (image, transform) = self.transform(decoded.image, &mut rng);

        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| PipelineError::Encode {
                path: output.to_path_buf(),
                message: format!("Cannot create output directory: {e}"),
            })?;
        }
        let format = self.config.output.format;
        format.encode(&image, output)?;

        let metadata = self.write_metadata(output, &existing, &mut rng);

        let duration_ms = start.elapsed().as_millis() as u64;
        tracing::info!(output = %output.display(), duration_ms, "Processed image");

        Ok(ProcessReport {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            format,
            seed,
            transform,
            metadata,
            duration_ms,
        })
    }

    /// The pure pixel path: resize, noise, overlays, final pass.
    pub fn transform<R: Rng + ?Sized>(&self, image: DynamicImage, rng: &mut R) -> (DynamicImage, TransformReport) {
        let processing = &self.config.processing;
        let (w, h) = image.dimensions();
        let original = Dimensions::new(w, h);

        let image = resize(image, processing.resize);
        let (w, h) = image.dimensions();
        let resized = Dimensions::new(w, h);

        let plan = resolve_plan(
            &processing.noise_types,
            processing.noise_level,
            processing.noise_order,
            rng,
        );
        tracing::debug!(
            plan = ?plan.iter().map(|s| s.kind.as_str()).collect::<Vec<_>>(),
            "Resolved noise plan"
        );
        let image = apply_plan(&plan, &image, rng);

        let (image, watermark) = self.overlay_stage(
            image,
            AssetKind::Watermark,
            self.config.watermark.enabled,
            self.config.watermark.path.as_deref(),
            |source| self.config.watermark.overlay_spec(source),
            rng,
        );
        let (image, logo) = self.overlay_stage(
            image,
            AssetKind::Logo,
            self.config.logo.enabled,
            self.config.logo.path.as_deref(),
            |source| self.config.logo.overlay_spec(source),
            rng,
        );

        let image = if processing.final_pass {
            apply_plan(&[NoiseSpec::new(NoiseKind::Gaussian, FINAL_PASS_LEVEL)], &image, rng)
        } else {
            image
        };

        (
            image,
            TransformReport {
                original,
                resized,
                noise_plan: plan,
                watermark,
                logo,
                final_pass: processing.final_pass,
            },
        )
    }

    fn overlay_stage<R: Rng + ?Sized>(
        &self,
        image: DynamicImage,
        kind: AssetKind,
        enabled: bool,
        requested: Option<&str>,
        spec: impl FnOnce(overlay::OverlaySource) -> OverlaySpec,
        rng: &mut R,
    ) -> (DynamicImage, OverlayOutcome) {
        if !enabled {
            return (image, OverlayOutcome::Disabled);
        }
        match self.assets.resolve(kind, requested) {
            Some(source) => overlay::composite(&image, &spec(source), rng),
            None => {
                let reason = format!("{kind:?} asset not found");
                tracing::warn!(asset = ?requested, "{reason}");
                (image, OverlayOutcome::Skipped { reason })
            }
        }
    }

    fn write_metadata<R: Rng + ?Sized>(
        &self,
        output: &Path,
        existing: &MetadataRecord,
        rng: &mut R,
    ) -> MetadataOutcome {
        let policy = &self.config.metadata;
        let decision = metadata::decide_detailed(existing, policy, rng);
        let record = &decision.record;
        let fields = record.primary.len()
            + record.capture.len()
            + record.location.len()
            + usize::from(record.comment.is_some());

        let (status, error) = match metadata::write_record(output, record) {
            Ok(()) if record.is_empty() => (MetadataStatus::Stripped, None),
            Ok(()) => (MetadataStatus::Written, None),
            Err(e) => {
                tracing::warn!(output = %output.display(), error = %e, "Metadata write failed");
                (MetadataStatus::Failed, Some(e.to_string()))
            }
        };

        MetadataOutcome {
            status,
            template: decision.template,
            no_ai_flag: policy.no_ai_flag,
            fields,
            error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::MetadataPolicy;
    use crate::noise::NoiseOrder;
    use crate::pipeline::assets::StaticAssets;
    use crate::pipeline::resize::ResizeTarget;
    use image::{Rgb, RgbImage, Rgba, RgbaImage};

    fn quiet_config() -> Config {
        let mut config = Config::default();
        config.processing.noise_types.clear();
        config.processing.final_pass = false;
        config.logo.enabled = false;
        config
    }

    fn gray(w: u32, h: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(w, h, Rgb([128, 128, 128])))
    }

    #[test]
    fn test_transform_identity_when_everything_off() {
        let processor = ImageProcessor::new(quiet_config(), Box::new(StaticAssets::default()));
        let mut rng = StdRng::seed_from_u64(0);
        let (out, report) = processor.transform(gray(20, 10), &mut rng);
        assert_eq!(out.to_rgb8(), gray(20, 10).to_rgb8());
        assert!(report.noise_plan.is_empty());
        assert_eq!(report.watermark, OverlayOutcome::Disabled);
        assert_eq!(report.logo, OverlayOutcome::Disabled);
        assert!(!report.final_pass);
    }

    #[test]
    fn test_transform_is_deterministic_per_seed() {
        let mut config = Config::default();
        config.processing.noise_types = NoiseKind::ALL.to_vec();
        config.processing.noise_order = NoiseOrder::Shuffled;
        let assets = StaticAssets {
            logo: Some(RgbaImage::from_pixel(10, 5, Rgba([255, 0, 0, 255]))),
            ..Default::default()
        };
        let processor = ImageProcessor::new(config, Box::new(assets));

        let run = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            processor.transform(gray(64, 48), &mut rng)
        };
        let (a, ra) = run(11);
        let (b, rb) = run(11);
        assert_eq!(a.to_rgb8(), b.to_rgb8());
        assert_eq!(ra, rb);
        assert_eq!(ra.noise_plan.len(), 6);
    }

    #[test]
    fn test_missing_asset_is_skipped_not_fatal() {
        let mut config = quiet_config();
        config.watermark.enabled = true;
        let processor = ImageProcessor::new(config, Box::new(StaticAssets::default()));
        let mut rng = StdRng::seed_from_u64(0);
        let (out, report) = processor.transform(gray(30, 30), &mut rng);
        assert!(matches!(report.watermark, OverlayOutcome::Skipped { .. }));
        assert_eq!(out.to_rgb8(), gray(30, 30).to_rgb8());
    }

    #[test]
    fn test_resize_recorded() {
        let mut config = quiet_config();
        config.processing.resize = ResizeTarget::Small;
        let processor = ImageProcessor::new(config, Box::new(StaticAssets::default()));
        let mut rng = StdRng::seed_from_u64(0);
        let (out, report) = processor.transform(gray(1000, 500), &mut rng);
        assert_eq!(report.original, Dimensions::new(1000, 500));
        assert!(report.resized.pixels() <= 250_000);
        assert_eq!((out.width(), out.height()), (report.resized.width, report.resized.height));
    }

    #[test]
    fn test_process_writes_output_and_report() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.png");
        gray(40, 30).save(&input).unwrap();

        let mut config = quiet_config();
        config.metadata = MetadataPolicy {
            fabricate: false,
            ..Default::default()
        };
        let processor = ImageProcessor::new(config, Box::new(StaticAssets::default()));
        let output = processor.output_path_for(&input);
        assert_eq!(output, dir.path().join("maliced-in.png"));

        let report = processor.process_seeded(&input, &output, 5).unwrap();
        assert_eq!(report.seed, 5);
        assert_eq!(report.metadata.status, MetadataStatus::Written);
        assert!(report.metadata.template.is_none());
        let record = metadata::read_record_strict(&output).unwrap();
        assert!(record.comment.unwrap().contains("no_ai_training"));
    }

    #[test]
    fn test_process_strips_metadata_when_nothing_to_write() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.png");
        gray(8, 8).save(&input).unwrap();

        let mut config = quiet_config();
        config.metadata = MetadataPolicy {
            remove: true,
            fabricate: false,
            no_ai_flag: false,
            ..Default::default()
        };
        let processor = ImageProcessor::new(config, Box::new(StaticAssets::default()));
        let output = dir.path().join("nested/out.png");
        let report = processor.process_seeded(&input, &output, 1).unwrap();
        assert_eq!(report.metadata.status, MetadataStatus::Stripped);
        assert_eq!(report.metadata.fields, 0);
        assert!(output.exists());
    }

    #[test]
    fn test_process_rejects_missing_input() {
        let processor = ImageProcessor::new(quiet_config(), Box::new(StaticAssets::default()));
        let err = processor
            .process(Path::new("/nope/in.png"), Path::new("/tmp/out.png"))
            .unwrap_err();
        assert!(err.to_string().contains("File not found"));
    }
}

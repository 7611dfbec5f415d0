//! Processor setup: input checks and CLI overrides on top of the config.

use malice_core::{Config, ImageProcessor, NoiseKind};

use super::ProcessArgs;

/// Validate input, apply flag overrides and build the processor.
pub fn setup_processor(args: &ProcessArgs, mut config: Config) -> anyhow::Result<ImageProcessor> {
    if !args.input.exists() {
        anyhow::bail!(
            "Input path does not exist: {:?}\n\n  Hint: Check the file path and try again.",
            args.input
        );
    }

    apply_overrides(&mut config, args);
    config.validate()?;

    tracing::debug!(
        noise = ?config.processing.noise_types,
        level = config.processing.noise_level,
        watermark = config.watermark.enabled,
        logo = config.logo.enabled,
        "Effective settings"
    );

    Ok(ImageProcessor::with_fs_assets(config))
}

/// Apply every flag the user set; unset flags keep the config value.
pub fn apply_overrides(config: &mut Config, args: &ProcessArgs) {
    let processing = &mut config.processing;
    if let Some(resize) = args.resize {
        processing.resize = resize.into();
    }
    if args.no_noise {
        processing.noise_types.clear();
    } else if !args.noise.is_empty() {
        processing.noise_types = args.noise.iter().map(|&n| NoiseKind::from(n)).collect();
    }
    if let Some(level) = args.level {
        processing.noise_level = level;
    }
    if let Some(order) = args.order {
        processing.noise_order = order.into();
    }
    if args.no_final_pass {
        processing.final_pass = false;
    }
    if args.seed.is_some() {
        processing.seed = args.seed;
    }

    let watermark = &mut config.watermark;
    if args.watermark || args.watermark_asset.is_some() {
        watermark.enabled = true;
    }
    if let Some(asset) = &args.watermark_asset {
        watermark.path = Some(asset.clone());
    }
    if let Some(opacity) = args.opacity {
        watermark.opacity = opacity;
    }
    if let Some(min) = args.opacity_min {
        watermark.opacity_min = min;
    }
    if args.invert {
        watermark.invert = true;
    }
    if args.no_outline {
        watermark.outline = false;
    }
    if let Some(color) = &args.outline_color {
        watermark.outline_color = Some(color.clone());
    }

    let logo = &mut config.logo;
    if args.no_logo {
        logo.enabled = false;
    }
    if let Some(asset) = &args.logo {
        logo.enabled = true;
        logo.path = Some(asset.clone());
    }
    if let Some(position) = args.logo_position {
        logo.position = position.into();
    }

    let metadata = &mut config.metadata;
    if args.keep_metadata {
        metadata.remove = false;
    }
    if args.no_fabricate {
        metadata.fabricate = false;
    }
    if let Some(template) = args.fake_type {
        metadata.fake_type = template.into();
    }
    if args.no_marker {
        metadata.no_ai_flag = false;
    }

    let output = &mut config.output;
    if let Some(format) = args.format {
        output.format = format.into();
    }
    if let Some(dir) = &args.out_dir {
        output.dir = Some(dir.clone());
    }
    if let Some(prefix) = &args.prefix {
        output.prefix = prefix.clone();
    }
}

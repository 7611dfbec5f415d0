//! The `malice process` command for perturbing images.

mod batch;
mod setup;
pub mod types;

pub use types::ReportFormat;
use types::{Anchor, ImageFormat, Noise, Order, Resize, Template};

use anyhow::Context;
use clap::Args;
use malice_core::output::save_reports;
use malice_core::{Config, ImageProcessor, ProcessReport};
use std::path::{Path, PathBuf};

use batch::process_batch;
use setup::setup_processor;

/// Arguments for the `process` command.
///
/// Every option left unset keeps the value from the config file.
#[derive(Args, Debug, Default)]
pub struct ProcessArgs {
    /// Image file or directory to process
    #[arg(required = true)]
    pub input: PathBuf,

    /// Output image path (single-file input only)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Directory for output images (defaults to next to each input)
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// Output file name prefix
    #[arg(long)]
    pub prefix: Option<String>,

    /// Output image format
    #[arg(short, long, value_enum)]
    pub format: Option<ImageFormat>,

    /// Downscale before adding noise
    #[arg(long, value_enum)]
    pub resize: Option<Resize>,

    /// Noise kernels to apply (comma-separated)
    #[arg(short, long, value_enum, value_delimiter = ',')]
    pub noise: Vec<Noise>,

    /// Apply no noise kernels
    #[arg(long, conflicts_with = "noise")]
    pub no_noise: bool,

    /// Noise intensity in [0, 1]
    #[arg(short, long)]
    pub level: Option<f32>,

    /// Noise kernel ordering
    #[arg(long, value_enum)]
    pub order: Option<Order>,

    /// Skip the closing low-level Gaussian pass
    #[arg(long)]
    pub no_final_pass: bool,

    /// Seed for reproducible runs; directories use seed + file index
    #[arg(long)]
    pub seed: Option<u64>,

    /// Enable the watermark
    #[arg(long)]
    pub watermark: bool,

    /// Watermark asset name or path (implies --watermark)
    #[arg(long)]
    pub watermark_asset: Option<String>,

    /// Watermark opacity in [0, 1]
    #[arg(long)]
    pub opacity: Option<f32>,

    /// Lower bound for the watermark opacity
    #[arg(long)]
    pub opacity_min: Option<f32>,

    /// Invert the watermark colors
    #[arg(long)]
    pub invert: bool,

    /// Draw the watermark without an outline
    #[arg(long)]
    pub no_outline: bool,

    /// Outline color as #rrggbb or r,g,b (sampled from the image when unset)
    #[arg(long)]
    pub outline_color: Option<String>,

    /// Logo asset name or path
    #[arg(long, conflicts_with = "no_logo")]
    pub logo: Option<String>,

    /// Disable the logo
    #[arg(long)]
    pub no_logo: bool,

    /// Logo anchor
    #[arg(long, value_enum)]
    pub logo_position: Option<Anchor>,

    /// Keep the input's metadata instead of removing it
    #[arg(long)]
    pub keep_metadata: bool,

    /// Do not fabricate metadata
    #[arg(long)]
    pub no_fabricate: bool,

    /// Fabricated metadata template
    #[arg(long, value_enum)]
    pub fake_type: Option<Template>,

    /// Do not embed the no-AI marker
    #[arg(long)]
    pub no_marker: bool,

    /// Write run reports to this file
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Run report format
    #[arg(long, value_enum, default_value = "json")]
    pub report_format: ReportFormat,
}

/// Execute the process command.
pub fn execute(args: ProcessArgs, config: Config) -> anyhow::Result<()> {
    let processor = setup_processor(&args, config)?;

    if args.input.is_file() {
        process_single(&processor, &args)
    } else {
        if args.output.is_some() {
            anyhow::bail!("--output names a single image; use --out-dir for directories");
        }
        process_batch(&processor, &args)
    }
}

/// Process one image and print its output path.
fn process_single(processor: &ImageProcessor, args: &ProcessArgs) -> anyhow::Result<()> {
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| processor.output_path_for(&args.input));

    let report = processor.process(&args.input, &output)?;
    tracing::info!(seed = report.seed, "Processed {:?} in {} ms", args.input, report.duration_ms);

    if let Some(path) = &args.report {
        write_reports(
            path,
            args.report_format,
            processor.config(),
            std::slice::from_ref(&report),
            false,
        )?;
    }

    println!("SUCCESS: {}", report.output.display());
    Ok(())
}

/// Write run reports to `path`.
///
/// A single-file run writes one JSON object; a batch writes an array (or
/// one line per report for JSONL).
pub(crate) fn write_reports(
    path: &Path,
    format: ReportFormat,
    config: &Config,
    reports: &[ProcessReport],
    batch: bool,
) -> anyhow::Result<()> {
    save_reports(path, format.into(), config.output.pretty, reports, batch)
        .with_context(|| format!("Failed to write report {:?}", path))?;
    tracing::info!("Report written to {:?}", path);
    Ok(())
}

//! malice core - image perturbation pipeline library.
//!
//! malice takes a photo or illustration and makes it less useful as
//! training data while keeping it acceptable to a human viewer: layered
//! noise, a watermark with a color-matched outline, a branding logo, and
//! rewritten EXIF metadata.
//!
//! # Architecture
//!
//! ```text
//! Validate → Decode → Resize → Noise plan → Watermark → Logo → Final pass
//!          → Encode → Metadata decide + rewrite → ProcessReport
//! ```
//!
//! Every stochastic stage draws from one seeded random source per run, so a
//! run is reproducible from the seed in its report.
//!
//! # Usage
//!
//! ```rust,no_run
//! use malice_core::{Config, ImageProcessor};
//! use std::path::Path;
//!
//! fn main() -> malice_core::Result<()> {
//!     let config = Config::load()?;
//!     let processor = ImageProcessor::with_fs_assets(config);
//!
//!     let input = Path::new("./image.jpg");
//!     let output = processor.output_path_for(input);
//!     let report = processor.process(input, &output)?;
//!     println!("Seed: {}", report.seed);
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod buffer;
pub mod config;
pub mod error;
pub mod metadata;
pub mod noise;
pub mod output;
pub mod overlay;
pub mod pipeline;
pub mod types;

// Re-exports for convenient access
pub use buffer::ImageBuffer;
pub use config::Config;
pub use error::{ConfigError, MaliceError, PipelineError, PipelineResult, Result};
pub use metadata::{MetadataPolicy, MetadataRecord};
pub use noise::{NoiseKind, NoiseOrder, NoiseSpec};
pub use output::{EncodeFormat, ReportFormat, ReportWriter};
pub use overlay::{OverlayOutcome, OverlaySource, OverlaySpec, Position};
pub use pipeline::{AssetResolver, FsAssetResolver, ImageProcessor, ResizeTarget};
pub use types::{ProcessReport, ProcessingStats};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

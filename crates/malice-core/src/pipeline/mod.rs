//! Image processing pipeline components.
//!
//! This module contains the stages around the pixel kernels:
//! - **validate**: Pre-processing validation
//! - **decode**: Load and decode JPEG, PNG and WebP input
//! - **resize**: Pixel-budget downscaling
//! - **assets**: Watermark and logo lookup
//! - **discovery**: Find image files in directories
//! - **processor**: Orchestrates the full pipeline

pub mod assets;
pub mod decode;
pub mod discovery;
pub mod processor;
pub mod resize;
pub mod validate;

// Re-exports for convenient access
pub use assets::{AssetKind, AssetResolver, FsAssetResolver, StaticAssets};
pub use decode::{DecodedImage, ImageDecoder};
pub use discovery::{DiscoveredFile, FileDiscovery};
pub use processor::ImageProcessor;
pub use resize::{resize, ResizeTarget};
pub use validate::Validator;

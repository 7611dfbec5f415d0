//! Locating watermark and logo images.
//!
//! The processor never touches the filesystem for assets directly; it asks an
//! [`AssetResolver`], so callers can swap in bundled or in-memory assets.

use std::path::{Path, PathBuf};

use image::RgbaImage;

use crate::overlay::OverlaySource;

/// Which overlay an asset is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Watermark,
    Logo,
}

impl AssetKind {
    /// File looked up in the asset directory when no name is configured.
    pub fn default_file_name(self) -> &'static str {
        match self {
            Self::Watermark => "watermark.png",
            Self::Logo => "logo.png",
        }
    }
}

/// Maps a configured asset name to overlay pixels.
pub trait AssetResolver {
    /// Resolve `requested` (or the default asset when `None`).
    ///
    /// Returns `None` when nothing usable exists; the overlay is then skipped.
    fn resolve(&self, kind: AssetKind, requested: Option<&str>) -> Option<OverlaySource>;
}

/// Resolves assets from absolute paths or an asset directory.
///
/// Lookup order: the requested path as given (with `~` expanded), then the
/// requested name inside `asset_dir`, then the kind's default file inside
/// `asset_dir`.
#[derive(Debug, Clone)]
pub struct FsAssetResolver {
    asset_dir: PathBuf,
}

impl FsAssetResolver {
    pub fn new(asset_dir: impl Into<PathBuf>) -> Self {
        Self {
            asset_dir: asset_dir.into(),
        }
    }

    pub fn asset_dir(&self) -> &Path {
        &self.asset_dir
    }

    fn find(&self, kind: AssetKind, requested: Option<&str>) -> Option<PathBuf> {
        if let Some(name) = requested.filter(|n| !n.trim().is_empty()) {
            let given = PathBuf::from(shellexpand::tilde(name).into_owned());
            if given.is_file() {
                return Some(given);
            }
            if given.is_relative() {
                let in_dir = self.asset_dir.join(&given);
                if in_dir.is_file() {
                    return Some(in_dir);
                }
            }
            tracing::debug!(asset = name, "Requested asset not found, trying default");
        }

        let fallback = self.asset_dir.join(kind.default_file_name());
        fallback.is_file().then_some(fallback)
    }
}

impl AssetResolver for FsAssetResolver {
    fn resolve(&self, kind: AssetKind, requested: Option<&str>) -> Option<OverlaySource> {
        self.find(kind, requested).map(OverlaySource::File)
    }
}

/// In-memory assets, for embedding callers and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticAssets {
    pub watermark: Option<RgbaImage>,
    pub logo: Option<RgbaImage>,
}

impl AssetResolver for StaticAssets {
    fn resolve(&self, kind: AssetKind, _requested: Option<&str>) -> Option<OverlaySource> {
        let image = match kind {
            AssetKind::Watermark => self.watermark.as_ref(),
            AssetKind::Logo => self.logo.as_ref(),
        };
        image.cloned().map(OverlaySource::Image)
    }
}

//! Pixel-count driven downscaling.

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};
use serde::{Deserialize, Serialize};

/// Target size class for the resize stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeTarget {
    /// Keep the original dimensions.
    #[default]
    #[serde(alias = "default")]
    None,
    /// At most 250 000 pixels (500×500 equivalent).
    Small,
    /// At most 589 824 pixels (768×768 equivalent).
    Medium,
}

impl ResizeTarget {
    /// Pixel budget for this target, `None` when resizing is disabled.
    pub fn pixel_budget(self) -> Option<u64> {
        match self {
            Self::None => None,
            Self::Small => Some(250_000),
            Self::Medium => Some(589_824),
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "none" | "default" => Some(Self::None),
            "small" => Some(Self::Small),
            "medium" => Some(Self::Medium),
            _ => None,
        }
    }
}

/// Dimensions that fit `width × height` into `budget` pixels.
///
/// Returns the input unchanged when it already fits. Each axis is floored
/// independently (never below 1) so the product never exceeds the budget.
pub fn target_dimensions(width: u32, height: u32, budget: u64) -> (u32, u32) {
    let pixels = u64::from(width) * u64::from(height);
    if pixels <= budget || pixels == 0 {
        return (width, height);
    }
    let scale = (budget as f64 / pixels as f64).sqrt();
    let w = ((f64::from(width) * scale).floor() as u32).max(1);
    let h = ((f64::from(height) * scale).floor() as u32).max(1);
    (w, h)
}

/// Downscale `image` to the target's pixel budget with a Lanczos3 filter.
///
/// Images already within budget are returned as-is; the stage never upscales.
pub fn resize(image: DynamicImage, target: ResizeTarget) -> DynamicImage {
    let Some(budget) = target.pixel_budget() else {
        return image;
    };
    let (width, height) = image.dimensions();
    let (w, h) = target_dimensions(width, height, budget);
    if (w, h) == (width, height) {
        return image;
    }
    tracing::debug!(from = ?(width, height), to = ?(w, h), "Resizing image");
    image.resize_exact(w, h, FilterType::Lanczos3)
}

//! CLI enum types for the process command and their core counterparts.

use clap::ValueEnum;
use malice_core::metadata::FakeType;
use malice_core::{
    EncodeFormat, NoiseKind, NoiseOrder, Position, ReportFormat as CoreReportFormat, ResizeTarget,
};

/// Run report formats.
#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum ReportFormat {
    /// Single JSON object or array
    #[default]
    Json,
    /// One JSON object per line (newline-delimited)
    Jsonl,
}

impl From<ReportFormat> for CoreReportFormat {
    fn from(f: ReportFormat) -> Self {
        match f {
            ReportFormat::Json => CoreReportFormat::Json,
            ReportFormat::Jsonl => CoreReportFormat::JsonLines,
        }
    }
}

/// Output image containers.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ImageFormat {
    /// Lossless PNG
    Png,
    /// Lossless WebP
    Webp,
    /// JPEG at quality 95
    #[value(alias = "jpg")]
    Jpeg,
}

impl From<ImageFormat> for EncodeFormat {
    fn from(f: ImageFormat) -> Self {
        match f {
            ImageFormat::Png => EncodeFormat::Png,
            ImageFormat::Webp => EncodeFormat::Webp,
            ImageFormat::Jpeg => EncodeFormat::Jpeg,
        }
    }
}

/// Resize targets.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum Resize {
    /// Keep the original size
    None,
    /// At most 250 000 pixels
    Small,
    /// At most 589 824 pixels
    Medium,
}

impl From<Resize> for ResizeTarget {
    fn from(r: Resize) -> Self {
        match r {
            Resize::None => ResizeTarget::None,
            Resize::Small => ResizeTarget::Small,
            Resize::Medium => ResizeTarget::Medium,
        }
    }
}

/// Noise kernels.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum Noise {
    Gaussian,
    Dct,
    Shot,
    Himalayan,
    Speckle,
    Mustard,
}

impl From<Noise> for NoiseKind {
    fn from(n: Noise) -> Self {
        match n {
            Noise::Gaussian => NoiseKind::Gaussian,
            Noise::Dct => NoiseKind::Dct,
            Noise::Shot => NoiseKind::Shot,
            Noise::Himalayan => NoiseKind::Himalayan,
            Noise::Speckle => NoiseKind::Speckle,
            Noise::Mustard => NoiseKind::Mustard,
        }
    }
}

/// Noise plan ordering.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum Order {
    /// Canonical order
    Fixed,
    /// Permute the order-independent kernels
    Shuffled,
}

impl From<Order> for NoiseOrder {
    fn from(o: Order) -> Self {
        match o {
            Order::Fixed => NoiseOrder::Fixed,
            Order::Shuffled => NoiseOrder::Shuffled,
        }
    }
}

/// Logo anchors.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum Anchor {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    /// A corner picked per run
    Random,
    Center,
}

impl From<Anchor> for Position {
    fn from(a: Anchor) -> Self {
        match a {
            Anchor::TopLeft => Position::TopLeft,
            Anchor::TopRight => Position::TopRight,
            Anchor::BottomLeft => Position::BottomLeft,
            Anchor::BottomRight => Position::BottomRight,
            Anchor::Random => Position::Random,
            Anchor::Center => Position::Center,
        }
    }
}

/// Fabricated metadata templates.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum Template {
    /// One of the templates below, picked per run
    Random,
    Paint,
    OldCamera,
    Screenshot,
}

impl From<Template> for FakeType {
    fn from(t: Template) -> Self {
        match t {
            Template::Random => FakeType::Random,
            Template::Paint => FakeType::Paint,
            Template::OldCamera => FakeType::OldCamera,
            Template::Screenshot => FakeType::Screenshot,
        }
    }
}

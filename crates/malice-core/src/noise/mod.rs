//! Stochastic pixel perturbation kernels.
//!
//! Every kernel is a pure function of `(buffer, level, rng)` returning a
//! buffer of the same shape. Kernels never clamp: the noise stage quantizes
//! once after the whole plan has run (see [`apply_plan`]).
//!
//! - **gaussian**: additive N(0, σ) noise
//! - **dct**: mid/high-frequency amplitude perturbation in the DCT domain
//! - **shot**: salt & pepper impulses
//! - **himalayan**: salt, pepper and pink impulses
//! - **speckle**: multiplicative N(1, σ) noise
//! - **mustard**: layered procedural texture (spots, blobs, strokes, blocks)

pub mod dct;
pub mod gaussian;
pub mod impulse;
pub mod mustard;
pub mod plan;
pub mod speckle;

pub use plan::{apply_plan, resolve_plan, NoiseOrder};

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::buffer::ImageBuffer;

/// The available noise kernels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoiseKind {
    Gaussian,
    Dct,
    Shot,
    Himalayan,
    Speckle,
    Mustard,
}

impl NoiseKind {
    /// All kinds in canonical application order.
    pub const ALL: [NoiseKind; 6] = [
        NoiseKind::Gaussian,
        NoiseKind::Dct,
        NoiseKind::Shot,
        NoiseKind::Himalayan,
        NoiseKind::Speckle,
        NoiseKind::Mustard,
    ];

    /// Parse a kind from its name (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "gaussian" => Some(Self::Gaussian),
            "dct" => Some(Self::Dct),
            "shot" => Some(Self::Shot),
            "himalayan" => Some(Self::Himalayan),
            "speckle" => Some(Self::Speckle),
            "mustard" => Some(Self::Mustard),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gaussian => "gaussian",
            Self::Dct => "dct",
            Self::Shot => "shot",
            Self::Himalayan => "himalayan",
            Self::Speckle => "speckle",
            Self::Mustard => "mustard",
        }
    }

    /// Whether the kernel may swap places with other order-independent
    /// kernels when the plan is shuffled.
    ///
    /// DCT works on the frequency content of the image as it stands and
    /// mustard paints an opaque-ish texture on top, so both keep their slot.
    pub fn is_order_independent(self) -> bool {
        matches!(
            self,
            Self::Gaussian | Self::Shot | Self::Himalayan | Self::Speckle
        )
    }

    /// Position in the canonical order.
    pub fn canonical_index(self) -> usize {
        Self::ALL.iter().position(|k| *k == self).unwrap_or(Self::ALL.len())
    }

    /// Run this kernel on `input` at the given level.
    pub fn apply<R: Rng + ?Sized>(self, input: &ImageBuffer, level: f32, rng: &mut R) -> ImageBuffer {
        let level = clamp_level(level);
        match self {
            Self::Gaussian => gaussian::apply(input, level, rng),
            Self::Dct => dct::apply(input, level, rng),
            Self::Shot => impulse::shot(input, level, rng),
            Self::Himalayan => impulse::himalayan(input, level, rng),
            Self::Speckle => speckle::apply(input, level, rng),
            Self::Mustard => mustard::apply(input, level, rng),
        }
    }
}

impl std::fmt::Display for NoiseKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A kernel paired with its normalized intensity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoiseSpec {
    pub kind: NoiseKind,
    pub level: f32,
}

impl NoiseSpec {
    /// Create a spec, clamping `level` into `[0, 1]`.
    pub fn new(kind: NoiseKind, level: f32) -> Self {
        Self {
            kind,
            level: clamp_level(level),
        }
    }

    pub fn apply<R: Rng + ?Sized>(&self, input: &ImageBuffer, rng: &mut R) -> ImageBuffer {
        self.kind.apply(input, self.level, rng)
    }
}

/// Clamp a level into `[0, 1]`; NaN maps to 0.
pub fn clamp_level(level: f32) -> f32 {
    if level.is_nan() {
        0.0
    } else {
        level.clamp(0.0, 1.0)
    }
}

//! Multiplicative speckle noise.

use ndarray::s;
use rand::Rng;
use rand_distr::StandardNormal;

use crate::buffer::ImageBuffer;

/// Relative deviation of the multiplier: 0.0 → 0.1%, 1.0 → 1.5%.
pub fn intensity(level: f32) -> f32 {
    0.001 + level * 0.014
}

/// Multiply every color sample by an independent N(1, intensity) draw.
pub fn apply<R: Rng + ?Sized>(input: &ImageBuffer, level: f32, rng: &mut R) -> ImageBuffer {
    let sigma = intensity(level);
    let mut out = input.clone();
    let colors = out.color_channels();
    out.samples_mut()
        .slice_mut(s![.., .., ..colors])
        .mapv_inplace(|v| v * (1.0 + sigma * rng.sample::<f32, _>(StandardNormal)));
    out
}

//! Additive Gaussian noise.

use ndarray::s;
use rand::Rng;
use rand_distr::StandardNormal;

use crate::buffer::ImageBuffer;

/// Standard deviation for a level: 0.0 → 2.0, 1.0 → 11.0.
pub fn std_dev(level: f32) -> f32 {
    2.0 + level * 9.0
}

/// Add i.i.d. zero-mean normal noise to every color sample.
pub fn apply<R: Rng + ?Sized>(input: &ImageBuffer, level: f32, rng: &mut R) -> ImageBuffer {
    let sigma = std_dev(level);
    let mut out = input.clone();
    let colors = out.color_channels();
    out.samples_mut()
        .slice_mut(s![.., .., ..colors])
        .mapv_inplace(|v| v + sigma * rng.sample::<f32, _>(StandardNormal));
    out
}

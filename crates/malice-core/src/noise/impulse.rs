//! Impulse noise: salt & pepper ("shot") and the pink-flecked variant
//! ("himalayan").
//!
//! Each impulse color gets its own Bernoulli mask over pixel positions. Masks
//! are painted in a fixed order, so where they overlap the later color wins:
//! pepper over salt, and pink over both.

use ndarray::{Array2, Array3};
use rand::Rng;

use crate::buffer::ImageBuffer;

const SALT: [f32; 3] = [255.0, 255.0, 255.0];
const PEPPER: [f32; 3] = [0.0, 0.0, 0.0];
pub const PINK: [f32; 3] = [255.0, 180.0, 190.0];

/// Total impulse density for shot noise: 0.0 → 0.01%, 1.0 → 0.15%.
pub fn shot_density(level: f32) -> f32 {
    0.0001 + level * 0.0014
}

/// Total impulse density for himalayan noise: 0.0 → 0.01%, 1.0 → 0.2%.
pub fn himalayan_density(level: f32) -> f32 {
    0.0001 + level * 0.0019
}

/// Salt & pepper: half the density goes to white impulses, half to black.
pub fn shot<R: Rng + ?Sized>(input: &ImageBuffer, level: f32, rng: &mut R) -> ImageBuffer {
    let p = f64::from(shot_density(level)) / 2.0;
    let (h, w) = (input.height(), input.width());
    let salt = mask(h, w, p, rng);
    let pepper = mask(h, w, p, rng);

    let mut out = input.clone();
    let colors = out.color_channels();
    paint(out.samples_mut(), &salt, SALT, colors);
    paint(out.samples_mut(), &pepper, PEPPER, colors);
    out
}

/// Salt, pepper and pink impulses, each at a third of the density.
pub fn himalayan<R: Rng + ?Sized>(input: &ImageBuffer, level: f32, rng: &mut R) -> ImageBuffer {
    let p = f64::from(himalayan_density(level)) / 3.0;
    let (h, w) = (input.height(), input.width());
    let salt = mask(h, w, p, rng);
    let pepper = mask(h, w, p, rng);
    let pink = mask(h, w, p, rng);

    let mut out = input.clone();
    let colors = out.color_channels();
    paint(out.samples_mut(), &salt, SALT, colors);
    paint(out.samples_mut(), &pepper, PEPPER, colors);
    paint(out.samples_mut(), &pink, PINK, colors);
    out
}

fn mask<R: Rng + ?Sized>(height: usize, width: usize, p: f64, rng: &mut R) -> Array2<bool> {
    Array2::from_shape_simple_fn((height, width), || rng.gen::<f64>() < p)
}

fn paint(samples: &mut Array3<f32>, mask: &Array2<bool>, color: [f32; 3], colors: usize) {
    for ((y, x), &hit) in mask.indexed_iter() {
        if hit {
            for (c, value) in color.iter().enumerate().take(colors) {
                samples[[y, x, c]] = *value;
            }
        }
    }
}

//! Frequency-domain amplitude perturbation.
//!
//! Each color plane goes through an orthonormal 2D DCT-II. A rectangle of
//! mid/high-frequency coefficients (everything at least `t` rows and columns
//! away from both edges of the coefficient grid) is scaled up or down, then
//! the plane is restored with the inverse transform (DCT-III).

use std::sync::Arc;

use ndarray::s;
use rand::Rng;
use rustdct::{Dct2, Dct3, DctPlanner, TransformType2And3};

use crate::buffer::ImageBuffer;

type Transform = Arc<dyn TransformType2And3<f32>>;

/// Scale factor for the perturbed band: 0.0 → 1.0, 1.0 → 5.0.
pub fn amplify_factor(level: f32) -> f32 {
    1.0 + level * 4.0
}

/// Width of the preserved border in coefficient space.
pub fn band_threshold(level: f32, height: usize, width: usize) -> usize {
    let short = height.min(width) as f32;
    ((1.0 - level * 0.5) * short / 3.0).floor() as usize
}

pub fn apply<R: Rng + ?Sized>(input: &ImageBuffer, level: f32, rng: &mut R) -> ImageBuffer {
    let (h, w) = (input.height(), input.width());
    let amplify = amplify_factor(level);
    let t = band_threshold(level, h, w);
    let band = (t > 0 && t < h.saturating_sub(t) && t < w.saturating_sub(t)).then_some(t);

    let mut out = input.clone();
    let colors = out.color_channels();
    let mut transforms: Option<(Transform, Transform)> = None;

    for c in 0..colors {
        // Drawn unconditionally so the stream does not depend on image size.
        let factor = if rng.gen_bool(0.5) {
            amplify
        } else {
            amplify.recip()
        };
        let Some(t) = band else { continue };
        if factor == 1.0 {
            continue;
        }

        let (rows, cols) = transforms.get_or_insert_with(|| {
            let mut planner = DctPlanner::new();
            (planner.plan_dct2(w), planner.plan_dct2(h))
        });

        let mut plane: Vec<f32> = out.samples().slice(s![.., .., c]).iter().copied().collect();
        forward_2d(&mut plane, h, w, &**rows, &**cols);
        for y in t..h - t {
            for v in &mut plane[y * w + t..y * w + (w - t)] {
                *v *= factor;
            }
        }
        inverse_2d(&mut plane, h, w, &**rows, &**cols);

        for (dst, v) in out
            .samples_mut()
            .slice_mut(s![.., .., c])
            .iter_mut()
            .zip(plane)
        {
            *dst = v;
        }
    }

    out
}

/// Orthonormal DCT-II over every row of a row-major `len`-wide plane.
fn rows_forward(plane: &mut [f32], len: usize, dct: &dyn TransformType2And3<f32>) {
    let dc_scale = (1.0 / len as f32).sqrt();
    let ac_scale = (2.0 / len as f32).sqrt();
    for row in plane.chunks_exact_mut(len) {
        dct.process_dct2(row);
        row[0] *= dc_scale;
        for v in &mut row[1..] {
            *v *= ac_scale;
        }
    }
}

/// Inverse of [`rows_forward`].
fn rows_inverse(plane: &mut [f32], len: usize, dct: &dyn TransformType2And3<f32>) {
    let scale = (2.0 / len as f32).sqrt();
    for row in plane.chunks_exact_mut(len) {
        row[0] *= std::f32::consts::SQRT_2;
        dct.process_dct3(row);
        for v in row.iter_mut() {
            *v *= scale;
        }
    }
}

fn transpose(src: &[f32], rows: usize, cols: usize) -> Vec<f32> {
    let mut out = vec![0.0; src.len()];
    for r in 0..rows {
        for c in 0..cols {
            out[c * rows + r] = src[r * cols + c];
        }
    }
    out
}

fn forward_2d(
    plane: &mut Vec<f32>,
    h: usize,
    w: usize,
    row_dct: &dyn TransformType2And3<f32>,
    col_dct: &dyn TransformType2And3<f32>,
) {
    rows_forward(plane, w, row_dct);
    let mut t = transpose(plane, h, w);
    rows_forward(&mut t, h, col_dct);
    *plane = transpose(&t, w, h);
}

fn inverse_2d(
    plane: &mut Vec<f32>,
    h: usize,
    w: usize,
    row_dct: &dyn TransformType2And3<f32>,
    col_dct: &dyn TransformType2And3<f32>,
) {
    let mut t = transpose(plane, h, w);
    rows_inverse(&mut t, h, col_dct);
    *plane = transpose(&t, w, h);
    rows_inverse(plane, w, row_dct);
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, Rgb, RgbImage};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn planner_pair(h: usize, w: usize) -> (Transform, Transform) {
        let mut planner = DctPlanner::new();
        (planner.plan_dct2(w), planner.plan_dct2(h))
    }

    fn gradient(w: u32, h: u32) -> ImageBuffer {
        ImageBuffer::from_image(&DynamicImage::ImageRgb8(RgbImage::from_fn(w, h, |x, y| {
            Rgb([(x * 7 % 256) as u8, (y * 11 % 256) as u8, ((x + y) * 3 % 256) as u8])
        })))
    }

    #[test]
    fn test_forward_inverse_round_trip() {
        let (h, w) = (9, 14);
        let original: Vec<f32> = (0..h * w).map(|i| ((i * 37) % 255) as f32).collect();
        let (rows, cols) = planner_pair(h, w);
        let mut plane = original.clone();
        forward_2d(&mut plane, h, w, &*rows, &*cols);
        inverse_2d(&mut plane, h, w, &*rows, &*cols);
        for (a, b) in plane.iter().zip(&original) {
            assert!((a - b).abs() < 1e-2, "{a} vs {b}");
        }
    }

    #[test]
    fn test_forward_is_orthonormal() {
        let (h, w) = (8, 8);
        let mut plane = vec![10.0f32; h * w];
        let (rows, cols) = planner_pair(h, w);
        forward_2d(&mut plane, h, w, &*rows, &*cols);
        // Constant plane: all energy in DC, equal to mean * sqrt(h * w).
        assert!((plane[0] - 80.0).abs() < 1e-3);
        assert!(plane[1..].iter().all(|v| v.abs() < 1e-3));
    }

    #[test]
    fn test_level_zero_is_identity() {
        let input = gradient(48, 40);
        let out = apply(&input, 0.0, &mut StdRng::seed_from_u64(1));
        for (a, b) in out.samples().iter().zip(input.samples().iter()) {
            assert!((a - b).abs() < 1e-3);
        }
    }

    #[test]
    fn test_tiny_image_is_untouched() {
        let input = gradient(2, 2);
        let out = apply(&input, 1.0, &mut StdRng::seed_from_u64(1));
        assert_eq!(out, input);
    }

    #[test]
    fn test_full_level_changes_pixels_but_keeps_mean() {
        let input = gradient(64, 48);
        let out = apply(&input, 1.0, &mut StdRng::seed_from_u64(8));
        assert_ne!(out, input);
        // DC is outside the band, so each channel mean is preserved.
        for c in 0..3 {
            let mean_in = input.samples().slice(s![.., .., c]).mean().unwrap_or(0.0);
            let mean_out = out.samples().slice(s![.., .., c]).mean().unwrap_or(0.0);
            assert!((mean_in - mean_out).abs() < 0.05, "channel {c}");
        }
    }

    #[test]
    fn test_threshold_mapping() {
        assert_eq!(band_threshold(0.0, 300, 600), 100);
        assert_eq!(band_threshold(1.0, 300, 600), 50);
        assert_eq!(band_threshold(1.0, 2, 2), 0);
    }
}

//! Mustard: a layered procedural texture painted over the image.
//!
//! Five passes run in order, each alpha-blending onto the running buffer:
//! fine spots, soft elliptical blobs, directional strokes, textured blocks
//! (level > 0.3) and a sparse fine-grain texture (level > 0.2).

use ndarray::{Array2, Array3};
use rand::Rng;
use rand_distr::StandardNormal;

use crate::buffer::{blend, ImageBuffer};

pub const MUSTARD: [i32; 3] = [250, 220, 60];
pub const NEAR_BLACK: [f32; 3] = [20.0, 20.0, 20.0];

/// Blend weight of the single-pixel spots.
pub const SPOT_ALPHA: f32 = 0.85;

/// Density of the fine mustard spots.
pub fn spot_density(level: f32) -> f32 {
    0.0001 + level * 0.0012
}

pub fn blob_count(level: f32) -> usize {
    (20.0 + level * 60.0) as usize
}

pub fn stroke_count(level: f32) -> usize {
    (10.0 + level * 20.0) as usize
}

pub fn apply<R: Rng + ?Sized>(input: &ImageBuffer, level: f32, rng: &mut R) -> ImageBuffer {
    let mut out = input.clone();
    if out.height() == 0 || out.width() == 0 {
        return out;
    }

    let samples = out.samples_mut();
    spots(samples, level, rng);
    blobs(samples, level, rng);
    strokes(samples, level, rng);
    if level > 0.3 {
        blocks(samples, level, rng);
    }
    if level > 0.2 {
        texture(samples, level, rng);
    }
    out
}

fn spots<R: Rng + ?Sized>(s: &mut Array3<f32>, level: f32, rng: &mut R) {
    let (h, w, _) = s.dim();
    let density = f64::from(spot_density(level));
    let mustard = Array2::from_shape_simple_fn((h, w), || rng.gen::<f64>() < density);
    let black = Array2::from_shape_simple_fn((h, w), || rng.gen::<f64>() < density * 0.4);

    let color = MUSTARD.map(|v| v as f32);
    for ((y, x), &hit) in mustard.indexed_iter() {
        if hit {
            blend_pixel(s, y, x, color, SPOT_ALPHA);
        }
    }
    for ((y, x), &hit) in black.indexed_iter() {
        if hit {
            blend_pixel(s, y, x, NEAR_BLACK, SPOT_ALPHA);
        }
    }
}

fn blobs<R: Rng + ?Sized>(s: &mut Array3<f32>, level: f32, rng: &mut R) {
    let (h, w, _) = s.dim();
    let max_radius = 3.max((9.0 * level) as i64 + 1);

    for _ in 0..blob_count(level) {
        let cx = rng.gen_range(0..w) as i64;
        let cy = rng.gen_range(0..h) as i64;
        let radius = rng.gen_range(2..max_radius) as f32;
        let [r, g, b] = jitter(rng, [40, 35, 25]);
        let sx: f32 = rng.gen_range(0.8..1.2);
        let sy: f32 = rng.gen_range(0.8..1.2);

        let ry = (radius * sy) as i64;
        let rx = (radius * sx) as i64;
        for dy in -ry..=ry {
            for dx in -rx..=rx {
                let fx = dx as f32 / sx;
                let fy = dy as f32 / sy;
                let d2 = fx * fx + fy * fy;
                if d2 > radius * radius {
                    continue;
                }
                let Some((y, x)) = in_bounds(cy + dy, cx + dx, h, w) else {
                    continue;
                };
                let r_var = rng.gen_range(-15..=15);
                let g_var = rng.gen_range(-15..=15);
                let alpha = 1.0 - (d2.sqrt() / radius).powf(1.7);
                let color = [channel(r + r_var), channel(g + g_var), b as f32];
                blend_pixel(s, y, x, color, alpha);
            }
        }
    }
}

fn strokes<R: Rng + ?Sized>(s: &mut Array3<f32>, level: f32, rng: &mut R) {
    let (h, w, _) = s.dim();
    let groups = 1.max((1.0 + level * 2.0) as usize);
    let angles: Vec<f32> = (0..groups).map(|_| rng.gen_range(-0.3..0.3)).collect();
    let length = (h.min(w) as f32 * (0.15 + level * 0.5)) as i64;
    let thickness = 1.max((1.0 + level * 3.0) as i64);
    let half = thickness / 2;
    let alpha = 0.6 + level * 0.3;

    for _ in 0..stroke_count(level) {
        let main = angles[rng.gen_range(0..angles.len())];
        let sx = rng.gen_range(0..w) as i64;
        let sy = rng.gen_range(0..h) as i64;
        let angle = main + rng.gen_range(0.3..0.8);
        let color = jitter(rng, [25, 25, 15]).map(|v| v as f32);
        let (sin, cos) = angle.sin_cos();

        for t in 0..length {
            let x = sx + (t as f32 * cos) as i64;
            let y = sy + (t as f32 * sin) as i64;
            if in_bounds(y, x, h, w).is_none() {
                continue;
            }
            for offset in (-thickness).div_euclid(2)..=half {
                let nx = (x as f32 - offset as f32 * sin) as i64;
                let ny = (y as f32 + offset as f32 * cos) as i64;
                if let Some((py, px)) = in_bounds(ny, nx, h, w) {
                    let edge = alpha * (1.0 - offset.abs() as f32 / (half + 1) as f32);
                    blend_pixel(s, py, px, color, edge);
                }
            }
        }
    }
}

fn blocks<R: Rng + ?Sized>(s: &mut Array3<f32>, level: f32, rng: &mut R) {
    let (h, w, _) = s.dim();
    let count = (5.0 + (level - 0.3) * 25.0) as usize;
    let max_side = 5.max((12.0 * level) as usize + 1);

    for _ in 0..count {
        let bw = rng.gen_range(4..max_side);
        let bh = rng.gen_range(4..max_side);
        if bw > w || bh > h {
            continue;
        }
        let bx = rng.gen_range(0..=w - bw);
        let by = rng.gen_range(0..=h - bh);
        let color = jitter(rng, [30, 30, 20]).map(|v| v as f32);
        let block_alpha = 0.4 + rng.gen::<f32>() * 0.3;

        for y in 0..bh {
            for x in 0..bw {
                let grain = 1.0 + 0.1 * rng.sample::<f32, _>(StandardNormal);
                let edge_x = x.min(bw - 1 - x) as f32 / (bw as f32 * 0.25);
                let edge_y = y.min(bh - 1 - y) as f32 / (bh as f32 * 0.25);
                let edge = edge_x.min(edge_y).min(1.0);
                let a = (block_alpha * edge * grain).clamp(0.0, 1.0);
                blend_pixel(s, by + y, bx + x, color, a);
            }
        }
    }
}

fn texture<R: Rng + ?Sized>(s: &mut Array3<f32>, level: f32, rng: &mut R) {
    let (h, w, _) = s.dim();
    let density = f64::from(0.001 + level * 0.009);
    let mask = Array2::from_shape_simple_fn((h, w), || rng.gen::<f64>() < density);
    let variants: [[f32; 3]; 5] =
        std::array::from_fn(|_| jitter(rng, [40, 40, 20]).map(|v| v as f32));

    for ((y, x), &hit) in mask.indexed_iter() {
        if hit {
            let color = variants[rng.gen_range(0..variants.len())];
            let alpha = 0.2 + rng.gen::<f32>() * 0.2;
            blend_pixel(s, y, x, color, alpha);
        }
    }
}

/// A mustard color with each channel shifted by up to `±spread`, clamped.
fn jitter<R: Rng + ?Sized>(rng: &mut R, spread: [i32; 3]) -> [i32; 3] {
    std::array::from_fn(|c| (MUSTARD[c] + rng.gen_range(-spread[c]..=spread[c])).clamp(0, 255))
}

fn channel(v: i32) -> f32 {
    v.clamp(0, 255) as f32
}

fn in_bounds(y: i64, x: i64, h: usize, w: usize) -> Option<(usize, usize)> {
    (y >= 0 && x >= 0 && (y as usize) < h && (x as usize) < w).then(|| (y as usize, x as usize))
}

fn blend_pixel(s: &mut Array3<f32>, y: usize, x: usize, color: [f32; 3], alpha: f32) {
    for (c, value) in color.iter().enumerate() {
        s[[y, x, c]] = blend(s[[y, x, c]], *value, alpha);
    }
}

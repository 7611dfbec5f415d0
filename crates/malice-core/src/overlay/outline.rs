//! Outline synthesis: a colored band hugging the overlay's alpha boundary.

use image::{imageops, Rgb, Rgba, RgbaImage};
use ndarray::{Array2, Zip};

use super::morphology::{dilate, erode};
use super::{alpha_over, OverlayError};

/// Fallback outline color when no base pixels fall under the ring.
pub const FALLBACK_COLOR: Rgb<u8> = Rgb([128, 128, 128]);

/// Feather radius for the ring before the overlay is drawn on top.
const RING_FEATHER_SIGMA: f32 = 1.0;

/// Outline width for a base image with the given shorter edge.
pub fn border_width(short_edge: u32) -> u32 {
    match short_edge {
        0..=512 => 5,
        513..=1024 => 10,
        _ => 15,
    }
}

/// Parse `#rrggbb`, `rrggbb` or `r,g,b`.
pub fn parse_color(spec: &str) -> Result<Rgb<u8>, OverlayError> {
    let s = spec.trim();
    let invalid = || OverlayError::InvalidColor(spec.to_string());

    if s.contains(',') {
        let parts: Vec<u8> = s
            .split(',')
            .map(|p| p.trim().parse::<u8>())
            .collect::<Result<_, _>>()
            .map_err(|_| invalid())?;
        return match parts.as_slice() {
            [r, g, b] => Ok(Rgb([*r, *g, *b])),
            _ => Err(invalid()),
        };
    }

    let hex = s.strip_prefix('#').unwrap_or(s);
    if hex.len() != 6 || !hex.is_ascii() {
        return Err(invalid());
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
    Ok(Rgb([channel(0)?, channel(2)?, channel(4)?]))
}

/// Alpha > 0 mask of an RGBA image, indexed `[row, column]`.
pub fn alpha_mask(image: &RgbaImage) -> Array2<bool> {
    let (w, h) = image.dimensions();
    Array2::from_shape_fn((h as usize, w as usize), |(y, x)| {
        image.get_pixel(x as u32, y as u32)[3] > 0
    })
}

/// Embed `mask` in a grid padded by `pad` unset cells on every side.
pub fn pad_mask(mask: &Array2<bool>, pad: usize) -> Array2<bool> {
    let (h, w) = mask.dim();
    let mut out = Array2::from_elem((h + 2 * pad, w + 2 * pad), false);
    out.slice_mut(ndarray::s![pad..pad + h, pad..pad + w]).assign(mask);
    out
}

/// Mean color of the base pixels under `ring`.
///
/// `origin` is where cell `[0, 0]` of the ring lands on the base; cells that
/// fall outside the base are ignored.
pub fn sample_ring_color(base: &RgbaImage, ring: &Array2<bool>, origin: (i64, i64)) -> Rgb<u8> {
    let (bw, bh) = (i64::from(base.width()), i64::from(base.height()));
    let mut sum = [0u64; 3];
    let mut n = 0u64;
    for ((y, x), &set) in ring.indexed_iter() {
        if !set {
            continue;
        }
        let (bx, by) = (origin.0 + x as i64, origin.1 + y as i64);
        if bx < 0 || by < 0 || bx >= bw || by >= bh {
            continue;
        }
        let p = base.get_pixel(bx as u32, by as u32);
        for c in 0..3 {
            sum[c] += u64::from(p[c]);
        }
        n += 1;
    }
    if n == 0 {
        return FALLBACK_COLOR;
    }
    Rgb(sum.map(|s| ((s + n / 2) / n) as u8))
}

/// Ring around `mask` used for color sampling: `dilate(mask, b) − mask`.
pub fn sampling_ring(padded: &Array2<bool>, border: usize) -> Array2<bool> {
    let grown = dilate(padded, border);
    Zip::from(&grown).and(padded).map_collect(|&g, &m| g && !m)
}

/// Band filled with the outline color: `dilate(mask, b) − erode(mask, 0.2·b)`.
///
/// The small erosion lets the band slip slightly under the overlay edge so
/// anti-aliased overlay pixels never show a gap.
pub fn outline_band(padded: &Array2<bool>, border: usize) -> Array2<bool> {
    let grown = dilate(padded, border);
    let shrink = (border as f32 * 0.2).round() as usize;
    let core = erode(padded, shrink);
    Zip::from(&grown).and(&core).map_collect(|&g, &c| g && !c)
}

/// Compose the outlined layer: a feathered band of `color` beneath `overlay`.
///
/// The result is `overlay` padded by `border` pixels on every side; the
/// overlay itself sits at `(border, border)`.
pub fn outlined_layer(
    overlay: &RgbaImage,
    padded_mask: &Array2<bool>,
    border: u32,
    color: Rgb<u8>,
    opacity: f32,
) -> RgbaImage {
    let band = outline_band(padded_mask, border as usize);
    let ring_alpha = (255.0 * opacity).round().clamp(0.0, 255.0) as u8;
    let (h, w) = band.dim();
    let ring = RgbaImage::from_fn(w as u32, h as u32, |x, y| {
        let a = if band[[y as usize, x as usize]] {
            ring_alpha
        } else {
            0
        };
        Rgba([color[0], color[1], color[2], a])
    });
    let mut layer = imageops::blur(&ring, RING_FEATHER_SIGMA);
    alpha_over(&mut layer, overlay, i64::from(border), i64::from(border));
    layer
}

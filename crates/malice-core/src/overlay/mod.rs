//! Watermark and logo compositing.
//!
//! An overlay is loaded as RGBA, optionally inverted, fitted to a fraction of
//! the base image's shorter edge, faded by its opacity, optionally wrapped in
//! an outline whose color is sampled from the base, and alpha-composited at
//! its anchor. The base's color type is restored afterwards.
//!
//! Overlay failures never abort a run: [`composite`] logs the error and hands
//! back the base image untouched.

pub mod morphology;
pub mod outline;
pub mod placement;

pub use placement::Position;

use std::path::PathBuf;

use image::imageops::{self, FilterType};
use image::{ColorType, DynamicImage, GenericImageView, ImageError, Rgba, RgbaImage};
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use outline::{alpha_mask, border_width, outlined_layer, pad_mask, parse_color, sample_ring_color, sampling_ring};
use placement::{fits, origin};

/// Feather applied to the finished overlay layer.
const LAYER_FEATHER_SIGMA: f32 = 0.5;

/// Errors raised while building an overlay. All of them are recoverable.
#[derive(Error, Debug)]
pub enum OverlayError {
    #[error("Cannot read overlay asset {path}: {source}")]
    Asset {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot decode overlay asset {path}: {message}")]
    Decode { path: PathBuf, message: String },

    #[error("Invalid outline color: {0:?}")]
    InvalidColor(String),

    #[error("Base image {base_width}x{base_height} too small for a {width}x{height} overlay with {margin}px margin")]
    TooSmall {
        base_width: u32,
        base_height: u32,
        width: u32,
        height: u32,
        margin: u32,
    },

    #[error("Overlay image is empty")]
    Empty,
}

/// Where overlay pixels come from.
#[derive(Debug, Clone)]
pub enum OverlaySource {
    File(PathBuf),
    Image(RgbaImage),
}

impl OverlaySource {
    fn load(&self) -> Result<RgbaImage, OverlayError> {
        match self {
            Self::File(path) => {
                let image = image::open(path).map_err(|e| match e {
                    ImageError::IoError(source) => OverlayError::Asset {
                        path: path.clone(),
                        source,
                    },
                    other => OverlayError::Decode {
                        path: path.clone(),
                        message: other.to_string(),
                    },
                })?;
                Ok(image.to_rgba8())
            }
            Self::Image(image) => Ok(image.clone()),
        }
    }
}

/// Outline settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlineSpec {
    pub enabled: bool,
    /// Explicit color; sampled from the base when absent.
    pub color: Option<String>,
}

/// Everything needed to place one overlay.
#[derive(Debug, Clone)]
pub struct OverlaySpec {
    pub source: OverlaySource,
    pub opacity: f32,
    /// Lower bound applied to `opacity`.
    pub opacity_min: f32,
    pub invert: bool,
    /// Fraction of the base's shorter edge given to the overlay's longer edge.
    pub size_factor: f32,
    pub position: Position,
    pub margin: u32,
    /// Skip instead of overflowing when overlay plus margins does not fit.
    pub skip_if_too_small: bool,
    pub outline: OutlineSpec,
}

impl OverlaySpec {
    /// Centered, semi-transparent, outlined.
    pub fn watermark(source: OverlaySource) -> Self {
        Self {
            source,
            opacity: 0.6,
            opacity_min: 0.0,
            invert: false,
            size_factor: 0.5,
            position: Position::Center,
            margin: 0,
            skip_if_too_small: false,
            outline: OutlineSpec {
                enabled: true,
                color: None,
            },
        }
    }

    /// Small opaque corner mark.
    pub fn logo(source: OverlaySource) -> Self {
        Self {
            source,
            opacity: 1.0,
            opacity_min: 0.0,
            invert: false,
            size_factor: 0.2,
            position: Position::Random,
            margin: 24,
            skip_if_too_small: true,
            outline: OutlineSpec::default(),
        }
    }

    /// Opacity after applying the floor, within `[0, 1]`.
    pub fn effective_opacity(&self) -> f32 {
        let floor = if self.opacity_min.is_nan() {
            0.0
        } else {
            self.opacity_min.clamp(0.0, 1.0)
        };
        let opacity = if self.opacity.is_nan() {
            floor
        } else {
            self.opacity
        };
        opacity.clamp(floor, 1.0)
    }
}

/// Where and how an overlay was placed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub position: Position,
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outline_color: Option<[u8; 3]>,
}

/// Result of an overlay stage, as recorded in the run report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OverlayOutcome {
    Applied(Placement),
    Skipped { reason: String },
    Disabled,
}

/// Composite `spec` over `base`, falling back to the unchanged base on error.
pub fn composite<R: Rng + ?Sized>(
    base: &DynamicImage,
    spec: &OverlaySpec,
    rng: &mut R,
) -> (DynamicImage, OverlayOutcome) {
    match try_composite(base, spec, rng) {
        Ok((image, placement)) => {
            debug!(?placement, "Overlay applied");
            (image, OverlayOutcome::Applied(placement))
        }
        Err(e) => {
            warn!(error = %e, "Overlay skipped");
            (
                base.clone(),
                OverlayOutcome::Skipped {
                    reason: e.to_string(),
                },
            )
        }
    }
}

/// Composite `spec` over `base`, surfacing any failure.
pub fn try_composite<R: Rng + ?Sized>(
    base: &DynamicImage,
    spec: &OverlaySpec,
    rng: &mut R,
) -> Result<(DynamicImage, Placement), OverlayError> {
    let mut overlay = spec.source.load()?;
    if overlay.width() == 0 || overlay.height() == 0 {
        return Err(OverlayError::Empty);
    }
    if spec.invert {
        invert_rgb(&mut overlay);
    }

    let (bw, bh) = base.dimensions();
    let short = bw.min(bh);
    let too_small = |(width, height): (u32, u32)| OverlayError::TooSmall {
        base_width: bw,
        base_height: bh,
        width,
        height,
        margin: spec.margin,
    };
    let (ow, oh) = fit_size(overlay.dimensions(), short, spec.size_factor).ok_or_else(|| too_small((0, 0)))?;
    let mut overlay = imageops::resize(&overlay, ow, oh, FilterType::Lanczos3);

    let position = spec.position.resolve(rng);
    if spec.skip_if_too_small && !fits((bw, bh), (ow, oh), spec.margin) {
        return Err(too_small((ow, oh)));
    }
    let (x, y) = origin(position, (bw, bh), (ow, oh), spec.margin);

    let opacity = spec.effective_opacity();
    let mask = alpha_mask(&overlay);
    scale_alpha(&mut overlay, opacity);

    let base_rgba = base.to_rgba8();
    let mut outline_color = None;
    let (layer, lx, ly) = if spec.outline.enabled {
        let border = border_width(short);
        let pad = i64::from(border);
        let padded = pad_mask(&mask, border as usize);
        let color = match &spec.outline.color {
            Some(c) => parse_color(c)?,
            None => sample_ring_color(
                &base_rgba,
                &sampling_ring(&padded, border as usize),
                (x - pad, y - pad),
            ),
        };
        outline_color = Some(color.0);
        (
            outlined_layer(&overlay, &padded, border, color, opacity),
            x - pad,
            y - pad,
        )
    } else {
        (overlay, x, y)
    };
    let layer = imageops::blur(&layer, LAYER_FEATHER_SIGMA);

    let mut canvas = RgbaImage::new(bw, bh);
    alpha_over(&mut canvas, &layer, lx, ly);
    let mut out = base_rgba;
    alpha_over(&mut out, &canvas, 0, 0);

    Ok((
        restore_color(out, base.color()),
        Placement {
            position,
            x,
            y,
            width: ow,
            height: oh,
            outline_color,
        },
    ))
}

/// Size of an overlay whose longer edge is `short_edge · size_factor`.
///
/// `None` when the target collapses to zero pixels.
pub fn fit_size(overlay: (u32, u32), short_edge: u32, size_factor: f32) -> Option<(u32, u32)> {
    let factor = if size_factor.is_nan() {
        1.0
    } else {
        size_factor.clamp(0.1, 1.0)
    };
    let longest = (f64::from(short_edge) * f64::from(factor)).floor() as u32;
    let (ow, oh) = overlay;
    if longest == 0 || ow == 0 || oh == 0 {
        return None;
    }
    let scaled = |num: u32, den: u32| {
        ((f64::from(longest) * f64::from(num) / f64::from(den)).floor() as u32).max(1)
    };
    Some(if ow >= oh {
        (longest, scaled(oh, ow))
    } else {
        (scaled(ow, oh), longest)
    })
}

fn invert_rgb(image: &mut RgbaImage) {
    for p in image.pixels_mut() {
        for c in 0..3 {
            p[c] = 255 - p[c];
        }
    }
}

fn scale_alpha(image: &mut RgbaImage, opacity: f32) {
    for p in image.pixels_mut() {
        p[3] = (f32::from(p[3]) * opacity).round().clamp(0.0, 255.0) as u8;
    }
}

/// Porter-Duff "over" of `src` onto `dst` at `(x, y)`, clipped to `dst`.
///
/// Fully transparent source pixels leave `dst` untouched and fully opaque
/// ones replace it exactly.
pub fn alpha_over(dst: &mut RgbaImage, src: &RgbaImage, x: i64, y: i64) {
    let (dw, dh) = (i64::from(dst.width()), i64::from(dst.height()));
    for (sx, sy, s) in src.enumerate_pixels() {
        let (tx, ty) = (x + i64::from(sx), y + i64::from(sy));
        if tx < 0 || ty < 0 || tx >= dw || ty >= dh {
            continue;
        }
        let sa = s[3];
        if sa == 0 {
            continue;
        }
        let d = dst.get_pixel_mut(tx as u32, ty as u32);
        if sa == 255 {
            *d = *s;
            continue;
        }
        *d = over(*s, *d);
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn over(s: Rgba<u8>, d: Rgba<u8>) -> Rgba<u8> {
    let sa = f32::from(s[3]) / 255.0;
    let da = f32::from(d[3]) / 255.0;
    let oa = sa + da * (1.0 - sa);
    let mut out = [0u8; 4];
    for c in 0..3 {
        let v = (f32::from(s[c]) * sa + f32::from(d[c]) * da * (1.0 - sa)) / oa;
        out[c] = v.round().clamp(0.0, 255.0) as u8;
    }
    out[3] = (oa * 255.0).round().clamp(0.0, 255.0) as u8;
    Rgba(out)
}

/// Convert a composited RGBA buffer back to the base's color type.
fn restore_color(image: RgbaImage, color: ColorType) -> DynamicImage {
    let rgba = DynamicImage::ImageRgba8(image);
    match color {
        ColorType::Rgba8 => rgba,
        ColorType::Rgb8 => rgba.to_rgb8().into(),
        ColorType::L8 => rgba.to_luma8().into(),
        ColorType::La8 => rgba.to_luma_alpha8().into(),
        ColorType::Rgb16 => rgba.to_rgb16().into(),
        ColorType::Rgba16 => rgba.to_rgba16().into(),
        ColorType::L16 => rgba.to_luma16().into(),
        ColorType::La16 => rgba.to_luma_alpha16().into(),
        ColorType::Rgb32F => rgba.to_rgb32f().into(),
        ColorType::Rgba32F => rgba.to_rgba32f().into(),
        _ => rgba,
    }
}

//! Floating-point sample buffer shared by the noise kernels.
//!
//! Layout is `[row, column, channel]` with 3 (RGB) or 4 (RGBA) channels.
//! Samples stay real-valued while kernels run; [`ImageBuffer::to_image`] is
//! the only place values are clamped to `[0, 255]` and quantized.

use image::{DynamicImage, Rgb, RgbImage, Rgba, RgbaImage};
use ndarray::Array3;

/// Number of color channels kernels operate on. A fourth channel is alpha.
pub const COLOR_CHANNELS: usize = 3;

/// Pixel samples of one image, indexed `[row, column, channel]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageBuffer {
    samples: Array3<f32>,
}

impl ImageBuffer {
    /// Copy an image into a float buffer.
    ///
    /// Images with an alpha channel become 4-channel buffers, everything else
    /// (luma, 16-bit, float) is converted to 8-bit RGB first.
    pub fn from_image(image: &DynamicImage) -> Self {
        if image.color().has_alpha() {
            let rgba = image.to_rgba8();
            let (w, h) = rgba.dimensions();
            let raw = rgba.as_raw();
            Self::from_raw(raw, h as usize, w as usize, 4)
        } else {
            let rgb = image.to_rgb8();
            let (w, h) = rgb.dimensions();
            let raw = rgb.as_raw();
            Self::from_raw(raw, h as usize, w as usize, 3)
        }
    }

    fn from_raw(raw: &[u8], height: usize, width: usize, channels: usize) -> Self {
        let samples = Array3::from_shape_fn((height, width, channels), |(y, x, c)| {
            f32::from(raw[(y * width + x) * channels + c])
        });
        Self { samples }
    }

    /// Wrap an existing sample array.
    pub fn from_samples(samples: Array3<f32>) -> Self {
        Self { samples }
    }

    /// Borrow the sample array.
    pub fn samples(&self) -> &Array3<f32> {
        &self.samples
    }

    /// Mutably borrow the sample array.
    pub fn samples_mut(&mut self) -> &mut Array3<f32> {
        &mut self.samples
    }

    /// Consume the buffer, returning the sample array.
    pub fn into_samples(self) -> Array3<f32> {
        self.samples
    }

    pub fn height(&self) -> usize {
        self.samples.dim().0
    }

    pub fn width(&self) -> usize {
        self.samples.dim().1
    }

    pub fn channels(&self) -> usize {
        self.samples.dim().2
    }

    /// Channels a kernel may modify (alpha is excluded).
    pub fn color_channels(&self) -> usize {
        self.channels().min(COLOR_CHANNELS)
    }

    /// Clamp to `[0, 255]`, round, and convert back to an 8-bit image.
    pub fn to_image(&self) -> DynamicImage {
        let s = &self.samples;
        let (h, w, c) = s.dim();
        let (w, h) = (w as u32, h as u32);
        if c >= 4 {
            DynamicImage::ImageRgba8(RgbaImage::from_fn(w, h, |x, y| {
                let (x, y) = (x as usize, y as usize);
                Rgba([
                    quantize(s[[y, x, 0]]),
                    quantize(s[[y, x, 1]]),
                    quantize(s[[y, x, 2]]),
                    quantize(s[[y, x, 3]]),
                ])
            }))
        } else {
            DynamicImage::ImageRgb8(RgbImage::from_fn(w, h, |x, y| {
                let (x, y) = (x as usize, y as usize);
                Rgb([
                    quantize(s[[y, x, 0]]),
                    quantize(s[[y, x, 1]]),
                    quantize(s[[y, x, 2]]),
                ])
            }))
        }
    }
}

/// Convert to the 8-bit layout every stage works in: RGBA8 when the image
/// has alpha, RGB8 otherwise. Matches what [`ImageBuffer::to_image`] returns.
pub fn to_working_depth(image: &DynamicImage) -> DynamicImage {
    match image {
        DynamicImage::ImageRgb8(_) | DynamicImage::ImageRgba8(_) => image.clone(),
        other if other.color().has_alpha() => DynamicImage::ImageRgba8(other.to_rgba8()),
        other => DynamicImage::ImageRgb8(other.to_rgb8()),
    }
}

/// Clamp a sample to the displayable range and round to the nearest level.
pub fn quantize(value: f32) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.clamp(0.0, 255.0).round() as u8
}

/// Linear blend of `color` over `sample` with weight `alpha`.
#[inline]
pub fn blend(sample: f32, color: f32, alpha: f32) -> f32 {
    (1.0 - alpha) * sample + alpha * color
}

//! Benchmarks for the malice pixel stages.
//!
//! Run with: cargo bench -p malice-core

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use image::{DynamicImage, Rgb, RgbImage, Rgba, RgbaImage};
use malice_core::noise::NoiseKind;
use malice_core::overlay::{composite, OverlaySource, OverlaySpec};
use malice_core::pipeline::{resize, ResizeTarget};
use malice_core::ImageBuffer;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn sample_image() -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(512, 512, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    }))
}

fn benchmark_kernels(c: &mut Criterion) {
    let buffer = ImageBuffer::from_image(&sample_image());

    for kind in NoiseKind::ALL {
        c.bench_function(&format!("noise_{kind}_512px"), |b| {
            let mut rng = StdRng::seed_from_u64(0);
            b.iter(|| kind.apply(black_box(&buffer), 0.5, &mut rng))
        });
    }
}

fn benchmark_watermark(c: &mut Criterion) {
    let base = sample_image();
    let mark = RgbaImage::from_fn(200, 80, |x, _| {
        Rgba([255, 255, 255, if x % 20 < 10 { 255 } else { 0 }])
    });
    let spec = OverlaySpec::watermark(OverlaySource::Image(mark));

    c.bench_function("watermark_outlined_512px", |b| {
        let mut rng = StdRng::seed_from_u64(0);
        b.iter(|| composite(black_box(&base), &spec, &mut rng))
    });
}

fn benchmark_resize(c: &mut Criterion) {
    let img = DynamicImage::new_rgb8(1920, 1080);

    c.bench_function("resize_small_1080p", |b| {
        b.iter(|| resize(black_box(img.clone()), ResizeTarget::Small))
    });
}

criterion_group!(benches, benchmark_kernels, benchmark_watermark, benchmark_resize);
criterion_main!(benches);

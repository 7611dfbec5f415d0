//! Resolving a set of requested kernels into an ordered plan and running it.

use image::DynamicImage;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{NoiseKind, NoiseSpec};
use crate::buffer::{to_working_depth, ImageBuffer};

/// How kernels are ordered within a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoiseOrder {
    /// Canonical order: gaussian, dct, shot, himalayan, speckle, mustard.
    #[default]
    Fixed,
    /// Order-independent kernels are permuted among their own slots;
    /// dct and mustard keep their canonical positions.
    Shuffled,
}

impl NoiseOrder {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "fixed" => Some(Self::Fixed),
            "shuffled" | "shuffle" => Some(Self::Shuffled),
            _ => None,
        }
    }
}

/// Build the ordered list of kernels for one run.
///
/// Duplicates are dropped and the selection is sorted canonically before
/// any shuffling, so the result does not depend on how `kinds` was listed.
pub fn resolve_plan<R: Rng + ?Sized>(
    kinds: &[NoiseKind],
    level: f32,
    order: NoiseOrder,
    rng: &mut R,
) -> Vec<NoiseSpec> {
    let mut selected: Vec<NoiseKind> = NoiseKind::ALL
        .into_iter()
        .filter(|k| kinds.contains(k))
        .collect();

    if order == NoiseOrder::Shuffled {
        let slots: Vec<usize> = selected
            .iter()
            .enumerate()
            .filter(|(_, k)| k.is_order_independent())
            .map(|(i, _)| i)
            .collect();
        let mut movable: Vec<NoiseKind> = slots.iter().map(|&i| selected[i]).collect();
        movable.shuffle(rng);
        for (slot, kind) in slots.into_iter().zip(movable) {
            selected[slot] = kind;
        }
    }

    selected
        .into_iter()
        .map(|kind| NoiseSpec::new(kind, level))
        .collect()
}

/// Run every kernel of `plan` in sequence, quantizing once at the end.
///
/// The result is always 8-bit RGB, or RGBA when the input had alpha, even
/// for an empty plan.
pub fn apply_plan<R: Rng + ?Sized>(plan: &[NoiseSpec], image: &DynamicImage, rng: &mut R) -> DynamicImage {
    if plan.is_empty() {
        return to_working_depth(image);
    }

    let mut buffer = ImageBuffer::from_image(image);
    for spec in plan {
        debug!(kind = %spec.kind, level = spec.level, "Applying noise kernel");
        buffer = spec.apply(&buffer, rng);
    }
    buffer.to_image()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn kinds(plan: &[NoiseSpec]) -> Vec<NoiseKind> {
        plan.iter().map(|s| s.kind).collect()
    }

    #[test]
    fn test_fixed_order_is_canonical() {
        let mut rng = StdRng::seed_from_u64(0);
        let plan = resolve_plan(
            &[NoiseKind::Mustard, NoiseKind::Shot, NoiseKind::Gaussian, NoiseKind::Dct],
            0.5,
            NoiseOrder::Fixed,
            &mut rng,
        );
        assert_eq!(
            kinds(&plan),
            vec![NoiseKind::Gaussian, NoiseKind::Dct, NoiseKind::Shot, NoiseKind::Mustard]
        );
        assert!(plan.iter().all(|s| s.level == 0.5));
    }

    #[test]
    fn test_duplicates_are_dropped() {
        let mut rng = StdRng::seed_from_u64(0);
        let plan = resolve_plan(
            &[NoiseKind::Shot, NoiseKind::Shot, NoiseKind::Gaussian],
            0.2,
            NoiseOrder::Fixed,
            &mut rng,
        );
        assert_eq!(kinds(&plan), vec![NoiseKind::Gaussian, NoiseKind::Shot]);
    }

    #[test]
    fn test_shuffle_keeps_dct_and_mustard_in_place() {
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let plan = resolve_plan(&NoiseKind::ALL, 0.5, NoiseOrder::Shuffled, &mut rng);
            let order = kinds(&plan);
            assert_eq!(order.len(), 6);
            assert_eq!(order[1], NoiseKind::Dct);
            assert_eq!(order[5], NoiseKind::Mustard);
            let mut sorted = order.clone();
            sorted.sort_by_key(|k| k.canonical_index());
            assert_eq!(sorted, NoiseKind::ALL.to_vec());
        }
    }

    #[test]
    fn test_shuffle_actually_permutes() {
        let distinct: std::collections::HashSet<Vec<NoiseKind>> = (0..50)
            .map(|seed| {
                let mut rng = StdRng::seed_from_u64(seed);
                kinds(&resolve_plan(&NoiseKind::ALL, 0.5, NoiseOrder::Shuffled, &mut rng))
            })
            .collect();
        assert!(distinct.len() > 1);
    }

    #[test]
    fn test_empty_plan_matches_noisy_plan_depth() {
        let deep = DynamicImage::ImageRgba16(image::ImageBuffer::from_pixel(
            6,
            4,
            image::Rgba([40000u16, 1000, 65535, 30000]),
        ));
        let mut rng = StdRng::seed_from_u64(4);
        let empty = apply_plan(&[], &deep, &mut rng);
        let noisy = apply_plan(&[NoiseSpec::new(NoiseKind::Gaussian, 0.0)], &deep, &mut rng);
        assert_eq!(empty.color(), image::ColorType::Rgba8);
        assert_eq!(empty.color(), noisy.color());
        assert_eq!(empty.to_rgba8().get_pixel(0, 0)[3], noisy.to_rgba8().get_pixel(0, 0)[3]);
    }

    #[test]
    fn test_empty_plan_is_identity() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 8, Rgb([1, 2, 3])));
        let out = apply_plan(&[], &img, &mut StdRng::seed_from_u64(0));
        assert_eq!(out, img);
    }

    #[test]
    fn test_plan_output_stays_in_range() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(32, 32, Rgb([250, 5, 128])));
        let mut rng = StdRng::seed_from_u64(9);
        let plan = resolve_plan(&NoiseKind::ALL, 1.0, NoiseOrder::Fixed, &mut rng);
        let out = apply_plan(&plan, &img, &mut rng);
        assert_eq!((out.width(), out.height()), (32, 32));
        assert!(out.as_rgb8().is_some());
    }

    #[test]
    fn test_order_parse() {
        assert_eq!(NoiseOrder::parse("Shuffled"), Some(NoiseOrder::Shuffled));
        assert_eq!(NoiseOrder::parse("fixed"), Some(NoiseOrder::Fixed));
        assert_eq!(NoiseOrder::parse("random"), None);
    }
}

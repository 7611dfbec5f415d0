//! Binary dilation and erosion with a square structuring element.
//!
//! A square element is separable, so each operation is a horizontal pass
//! followed by a vertical one. Each pass is a sliding-window count over a
//! prefix sum, which keeps the cost independent of the radius.

use ndarray::{Array2, Axis};

#[derive(Clone, Copy)]
enum Op {
    Dilate,
    Erode,
}

/// Grow `mask` by `radius` pixels in every direction (Chebyshev distance).
pub fn dilate(mask: &Array2<bool>, radius: usize) -> Array2<bool> {
    separable(mask, radius, Op::Dilate)
}

/// Shrink `mask` by `radius` pixels. Cells outside the grid count as unset,
/// so set cells within `radius` of the border are cleared.
pub fn erode(mask: &Array2<bool>, radius: usize) -> Array2<bool> {
    separable(mask, radius, Op::Erode)
}

fn separable(mask: &Array2<bool>, radius: usize, op: Op) -> Array2<bool> {
    if radius == 0 {
        return mask.clone();
    }
    let mut out = mask.clone();
    for axis in [Axis(1), Axis(0)] {
        let src = out.clone();
        for (mut dst, line) in out.lanes_mut(axis).into_iter().zip(src.lanes(axis)) {
            let line: Vec<bool> = line.iter().copied().collect();
            for (d, v) in dst.iter_mut().zip(filter_line(&line, radius, op)) {
                *d = v;
            }
        }
    }
    out
}

fn filter_line(line: &[bool], radius: usize, op: Op) -> Vec<bool> {
    let n = line.len();
    let mut prefix = vec![0usize; n + 1];
    for (i, &set) in line.iter().enumerate() {
        prefix[i + 1] = prefix[i] + usize::from(set);
    }
    let full = 2 * radius + 1;
    (0..n)
        .map(|i| {
            let lo = i.saturating_sub(radius);
            let hi = (i + radius + 1).min(n);
            let count = prefix[hi] - prefix[lo];
            match op {
                Op::Dilate => count > 0,
                Op::Erode => count == full,
            }
        })
        .collect()
}

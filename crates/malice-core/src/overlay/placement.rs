//! Where an overlay goes on the base image.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Anchor for an overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Position {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    /// One of the four corners, chosen uniformly per run.
    #[default]
    Random,
    Center,
}

impl Position {
    pub const CORNERS: [Position; 4] = [
        Position::TopLeft,
        Position::TopRight,
        Position::BottomLeft,
        Position::BottomRight,
    ];

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "top-left" => Some(Self::TopLeft),
            "top-right" => Some(Self::TopRight),
            "bottom-left" => Some(Self::BottomLeft),
            "bottom-right" => Some(Self::BottomRight),
            "random" => Some(Self::Random),
            "center" | "centre" => Some(Self::Center),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::TopLeft => "top-left",
            Self::TopRight => "top-right",
            Self::BottomLeft => "bottom-left",
            Self::BottomRight => "bottom-right",
            Self::Random => "random",
            Self::Center => "center",
        }
    }

    /// Replace `Random` with a concrete corner.
    pub fn resolve<R: Rng + ?Sized>(self, rng: &mut R) -> Self {
        match self {
            Self::Random => Self::CORNERS[rng.gen_range(0..Self::CORNERS.len())],
            other => other,
        }
    }
}

/// Whether an overlay of `overlay` size plus `margin` on every side fits.
pub fn fits(base: (u32, u32), overlay: (u32, u32), margin: u32) -> bool {
    u64::from(base.0) >= u64::from(overlay.0) + 2 * u64::from(margin)
        && u64::from(base.1) >= u64::from(overlay.1) + 2 * u64::from(margin)
}

/// Top-left paste coordinate for a resolved (non-random) position.
///
/// Coordinates may be negative when the overlay does not fit; callers that
/// must stay in bounds check [`fits`] first.
pub fn origin(position: Position, base: (u32, u32), overlay: (u32, u32), margin: u32) -> (i64, i64) {
    let (bw, bh) = (i64::from(base.0), i64::from(base.1));
    let (ow, oh) = (i64::from(overlay.0), i64::from(overlay.1));
    let m = i64::from(margin);
    match position {
        Position::TopLeft => (m, m),
        Position::TopRight => (bw - ow - m, m),
        Position::BottomLeft => (m, bh - oh - m),
        Position::BottomRight => (bw - ow - m, bh - oh - m),
        Position::Center | Position::Random => ((bw - ow).div_euclid(2), (bh - oh).div_euclid(2)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_corners_stay_inside_margin() {
        let base = (800, 600);
        let overlay = (120, 80);
        for corner in Position::CORNERS {
            let (x, y) = origin(corner, base, overlay, 24);
            assert!(x >= 24 && y >= 24, "{corner:?}");
            assert!(x + 120 <= 800 - 24, "{corner:?}");
            assert!(y + 80 <= 600 - 24, "{corner:?}");
        }
    }

    #[test]
    fn test_center() {
        assert_eq!(origin(Position::Center, (100, 50), (20, 10), 0), (40, 20));
    }

    #[test]
    fn test_fits() {
        assert!(fits((100, 100), (52, 52), 24));
        assert!(!fits((100, 100), (53, 52), 24));
    }

    #[test]
    fn test_random_resolves_to_corner() {
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..20 {
            let p = Position::Random.resolve(&mut rng);
            assert!(Position::CORNERS.contains(&p));
        }
        assert_eq!(Position::Center.resolve(&mut rng), Position::Center);
    }

    #[test]
    fn test_parse() {
        assert_eq!(Position::parse("bottom_right"), Some(Position::BottomRight));
        assert_eq!(Position::parse("Top-Left"), Some(Position::TopLeft));
        assert_eq!(Position::parse("middle"), None);
    }
}

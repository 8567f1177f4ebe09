use serde::{Deserialize, Serialize};
use std::ops::Sub;

/// A point in scene space. Distinct from a direction vector (`(f64, f64)`)
/// even though both are pairs of floats — keeps `distance(a, b)` and
/// `vector(a, b)` from being accidentally swapped at a call site.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pt2D {
    x: f64,
    y: f64,
}

impl Pt2D {
    pub fn new(x: f64, y: f64) -> Pt2D {
        Pt2D { x, y }
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    pub fn offset(&self, dx: f64, dy: f64) -> Pt2D {
        Pt2D::new(self.x + dx, self.y + dy)
    }
}

impl Sub for Pt2D {
    type Output = (f64, f64);

    fn sub(self, other: Pt2D) -> (f64, f64) {
        (self.x - other.x, self.y - other.y)
    }
}

pub fn distance(p1: Pt2D, p2: Pt2D) -> f64 {
    let (dx, dy) = p1 - p2;
    (dx * dx + dy * dy).sqrt()
}

pub fn magnitude(v: (f64, f64)) -> f64 {
    (v.0 * v.0 + v.1 * v.1).sqrt()
}

pub fn normalize(v: (f64, f64)) -> (f64, f64) {
    let magn = magnitude(v);
    if magn == 0.0 {
        (0.0, 0.0)
    } else {
        (v.0 / magn, v.1 / magn)
    }
}

/// The vector from `p1` to `p2`.
pub fn vector(p1: Pt2D, p2: Pt2D) -> (f64, f64) {
    (p2.x - p1.x, p2.y - p1.y)
}

/// Direction of `v` in degrees, `0..360`. `None` for the zero vector.
pub fn direction(v: (f64, f64)) -> Option<f64> {
    let magn = magnitude(v);
    if magn == 0.0 {
        return None;
    }
    let base = (v.0 / magn).acos().to_degrees();
    if v.1 >= 0.0 {
        Some(base)
    } else {
        Some(360.0 - base)
    }
}

/// Signed shortest angle from `v1` to `v2`, in `[-180, 180]`.
///
/// Panics if either vector is zero — every caller derives these from a
/// heading or a path segment, both of which are non-degenerate by
/// construction.
pub fn check_angle(v1: (f64, f64), v2: (f64, f64)) -> f64 {
    let dir1 = direction(v1).expect("check_angle: zero vector has no direction");
    let dir2 = direction(v2).expect("check_angle: zero vector has no direction");
    let delta = dir2 - dir1;
    if delta.abs() <= 180.0 {
        delta
    } else if delta > 0.0 {
        delta - 360.0
    } else {
        delta + 360.0
    }
}

/// `true` iff `target` lies within 90 degrees either side of `heading`,
/// measured from `from`. Position deltas and heading vectors live on
/// mirrored y axes, so the delta's y component is flipped before
/// comparison — this mirrors the reference radar exactly.
pub fn is_ahead(heading: (f64, f64), from: Pt2D, target: Pt2D) -> bool {
    let (dx, dy) = vector(from, target);
    let v_target = (dx, -dy);
    check_angle(heading, v_target).abs() <= 90.0
}

pub fn is_behind(heading: (f64, f64), from: Pt2D, target: Pt2D) -> bool {
    !is_ahead(heading, from, target)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_matches_cardinal_points() {
        assert_eq!(direction((1.0, 0.0)), Some(0.0));
        assert!((direction((0.0, 1.0)).unwrap() - 90.0).abs() < 1e-9);
        assert!((direction((-1.0, 0.0)).unwrap() - 180.0).abs() < 1e-9);
        assert!((direction((0.0, -1.0)).unwrap() - 270.0).abs() < 1e-9);
        assert_eq!(direction((0.0, 0.0)), None);
    }

    #[test]
    fn check_angle_is_signed_and_shortest() {
        assert!((check_angle((1.0, 0.0), (0.0, 1.0)) - 90.0).abs() < 1e-9);
        assert!((check_angle((0.0, 1.0), (1.0, 0.0)) - (-90.0)).abs() < 1e-9);
        assert!((check_angle((1.0, 0.0), (-1.0, 0.0)) - 180.0).abs() < 1e-9);
    }

    #[test]
    fn is_ahead_is_directional() {
        let from = Pt2D::new(0.0, 0.0);
        // Heading east; the flipped-y convention means a point with a
        // *smaller* y than `from` registers as "up" in heading-space.
        assert!(is_ahead((1.0, 0.0), from, Pt2D::new(10.0, 0.0)));
        assert!(is_behind((1.0, 0.0), from, Pt2D::new(-10.0, 0.0)));
    }
}

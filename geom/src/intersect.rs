use crate::pt2d::{check_angle, distance, vector, Pt2D};
use crate::consts::TILE_SIZE;

/// Result of scanning two polylines for a crossing.
pub struct Crossing {
    /// `true` iff the other route has right-of-way and we must yield.
    pub must_yield: bool,
    pub cross_point: Option<Pt2D>,
    /// Signed angle between the local direction vectors at the crossing,
    /// absent when the two paths were found to be locally identical
    /// (same lane, follow the leader instead of treating it as a cross).
    pub angle: Option<f64>,
}

impl Crossing {
    fn none() -> Crossing {
        Crossing {
            must_yield: false,
            cross_point: None,
            angle: None,
        }
    }
}

/// Scans `own` against `other` for a point where the two polylines come
/// within `TILE_SIZE / 10` of each other. `hint`, when given the last
/// known crossing point, lets the scan resume near there instead of
/// restarting from index zero — the crossing point tends to be stable
/// across many ticks even as both polylines' sampled windows slide.
pub fn intersects(own: &[Pt2D], other: &[Pt2D], hint: Option<Pt2D>) -> Crossing {
    let min_distance = TILE_SIZE / 10.0;
    let identical_distance = TILE_SIZE / 100.0;

    if own.len() < 8 || other.len() < 4 {
        return Crossing::none();
    }
    let limit_i = own.len() - 4;
    let limit_j = other.len() - 4;
    let scan_limit_i = own.len() - 8;

    let mut start_i = 0usize;
    let mut start_j = 0usize;

    if let Some(cross_location) = hint {
        while own[start_i] != cross_location {
            start_i += 1;
            if start_i == limit_i {
                start_i = 0;
                break;
            }
        }
        if start_i != 0 {
            let own_start = own[start_i];
            while distance(own_start, other[start_j]) > min_distance {
                start_j += 1;
                if start_j == limit_j {
                    start_j = 0;
                    break;
                }
            }
        }
    }

    for i in start_i..scan_limit_i {
        for j in start_j..limit_j {
            if distance(own[i], other[j]) < min_distance {
                let cross_point = own[i];
                if identical_paths(own, other, i, j, identical_distance) {
                    return Crossing {
                        must_yield: false,
                        cross_point: Some(cross_point),
                        angle: None,
                    };
                }
                let v_current = vector(own[i], own[i + 1]);
                let v_nearby = vector(other[j], other[j + 1]);
                let angle_between = check_angle(v_current, v_nearby);
                let must_yield = angle_between < 0.0 || angle_between.abs() > 150.0;
                return Crossing {
                    must_yield,
                    cross_point: Some(cross_point),
                    angle: Some(angle_between),
                };
            }
        }
    }
    Crossing::none()
}

fn identical_paths(own: &[Pt2D], other: &[Pt2D], i: usize, j: usize, idd: f64) -> bool {
    const OFFSETS: [(usize, usize); 8] = [
        (2, 1),
        (3, 1),
        (1, 2),
        (2, 2),
        (3, 2),
        (1, 3),
        (2, 3),
        (3, 3),
    ];
    OFFSETS
        .iter()
        .any(|(di, dj)| distance(own[i + di], other[j + dj]) <= idd)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(from: (f64, f64), to: (f64, f64), n: usize) -> Vec<Pt2D> {
        (0..=n)
            .map(|k| {
                let t = k as f64 / n as f64;
                Pt2D::new(from.0 + (to.0 - from.0) * t, from.1 + (to.1 - from.1) * t)
            })
            .collect()
    }

    #[test]
    fn perpendicular_routes_cross() {
        let own = line((-50.0, 0.0), (50.0, 0.0), 20);
        let other = line((0.0, -50.0), (0.0, 50.0), 20);
        let result = intersects(&own, &other, None);
        assert!(result.cross_point.is_some());
        assert!(result.angle.is_some());
    }

    #[test]
    fn identical_lanes_report_no_yield_and_no_angle() {
        let own = line((0.0, 0.0), (100.0, 0.0), 20);
        let other = own.clone();
        let result = intersects(&own, &other, None);
        assert!(!result.must_yield);
        assert!(result.angle.is_none());
        assert!(result.cross_point.is_some());
    }

    #[test]
    fn parallel_routes_never_cross() {
        let own = line((0.0, 0.0), (100.0, 0.0), 20);
        let other = line((0.0, 50.0), (100.0, 50.0), 20);
        let result = intersects(&own, &other, None);
        assert!(result.cross_point.is_none());
    }
}

//! Piecewise lookup tables keyed by the signed angle between two crossing
//! routes. The thresholds and the asymmetry between the positive and
//! negative branches are reproduced exactly from the reference
//! implementation; they are a contract, not a approximation to be
//! smoothed out.
use crate::consts::TILE_SIZE;

/// Distance a vehicle must stay back from an intersection point to have
/// no chance of blocking it, given the signed crossing angle `angle` and
/// its own `length`.
///
/// The negative-angle branch returns early inside its own `if`/`else`
/// arm in the reference implementation, which happens to make the
/// positive-angle default (`else => 5/12`) unreachable from the negative
/// side. That asymmetry is preserved here rather than unified.
pub fn yielding_distance(angle: f64, own_length: f64) -> f64 {
    let base = own_length / 2.0;
    let x = TILE_SIZE;
    if angle > 0.0 {
        let addition = if angle < 32.0 {
            0.70 * x
        } else if angle < 41.625 {
            5.0 / 16.0 * x
        } else if angle < 65.0 {
            x / 3.0
        } else if angle < 100.0 {
            x / 2.0
        } else if angle < 140.0 {
            8.0 / 21.0 * x
        } else {
            5.0 / 12.0 * x
        };
        base + addition
    } else {
        let angle = angle.abs();
        let addition = if angle < 32.0 {
            11.0 / 15.0 * x
        } else if angle < 41.625 {
            0.80 * x
        } else if angle < 65.0 {
            0.80 * x
        } else if angle < 95.0 {
            2.0 / 3.0 * x
        } else if angle < 111.0 {
            7.0 / 16.0 * x
        } else {
            3.0 / 5.0 * x
        };
        base + addition
    }
}

/// Minimum distance to an intersection point at which the vehicle's own
/// footprint would not yet overlap it, given the crossing `angle`, own
/// `own_length`, the other route owner's `target_width`, and whether the
/// crossing point lies `ahead` of or behind the vehicle.
pub fn blocking_distance(angle: f64, own_length: f64, target_width: f64, ahead: bool) -> f64 {
    let x = TILE_SIZE;
    let base = own_length / 2.0 + target_width / 2.0;
    let addition = if ahead {
        if angle > 0.0 {
            if angle < 32.0 {
                x / 1.7
            } else if angle < 41.625 {
                x / 20.0
            } else if angle < 65.0 {
                x / 15.0
            } else if angle < 95.0 {
                x / 15.0
            } else if angle < 111.0 {
                x / 5.0
            } else if angle < 140.0 {
                x / 10.0
            } else {
                x / 5.5
            }
        } else {
            let angle = angle.abs();
            if angle < 32.0 {
                x / 3.0
            } else if angle < 41.625 {
                x / 10.0
            } else if angle < 65.0 {
                x / 10.0
            } else if angle < 95.0 {
                x / 15.0
            } else if angle < 111.0 {
                x / 7.0
            } else if angle < 140.0 {
                x / 3.0
            } else {
                x / 5.5
            }
        }
    } else if angle > 0.0 {
        if angle < 32.0 {
            0.0
        } else if angle < 41.625 {
            x / 20.0
        } else if angle < 65.0 {
            0.0
        } else if angle < 95.0 {
            x / 5.0
        } else if angle < 111.0 {
            x / 7.0
        } else if angle < 140.0 {
            x / 3.5
        } else {
            x / 5.5
        }
    } else {
        let angle = angle.abs();
        if angle < 32.0 {
            x / 3.0
        } else if angle < 41.625 {
            x / 10.0
        } else if angle < 65.0 {
            x / 10.0
        } else if angle < 95.0 {
            x / 12.0
        } else if angle < 111.0 {
            x / 7.0
        } else if angle < 140.0 {
            x / 4.0
        } else {
            x / 6.0
        }
    };
    base + addition
}

/// The angle between two vehicles' own headings, folded into `0..90`, as
/// used by `collision_distance`. Rotations are absolute scene angles in
/// degrees.
pub fn relative_facing_angle(observer_rotation: f64, observed_rotation: f64) -> f64 {
    let mut org_dir = observed_rotation.abs();
    if org_dir > 180.0 {
        org_dir -= 180.0;
    }
    let mut targ_dir = observer_rotation.abs();
    if targ_dir > 180.0 {
        targ_dir -= 180.0;
    }
    let mut angle_between = (org_dir - targ_dir).abs();
    if angle_between > 90.0 {
        angle_between -= 90.0;
    }
    angle_between
}

/// Minimum safe center-to-center distance between two vehicles given the
/// folded facing angle between them (`relative_facing_angle`) and their
/// footprints.
///
/// The final `else` branch below adds `TILE_SIZE / 20` on top of the
/// blanket `+ TILE_SIZE / 20` every branch receives at the end — this
/// double addition on the widest-angle branch is carried over from the
/// reference implementation verbatim.
pub fn collision_distance(
    angle_between: f64,
    observer_length: f64,
    observer_width: f64,
    observed_length: f64,
    observed_width: f64,
) -> f64 {
    let view_angle = (observer_width / observer_length).atan().to_degrees();
    let dist = if angle_between <= view_angle {
        observer_length / 2.0 + observed_length / 2.0
    } else if angle_between <= 40.0 {
        observer_length / 2.0 + 0.85 * observed_length / 2.0
    } else if angle_between <= 60.0 {
        observer_length / 2.0 + 0.70 * observed_length / 2.0
    } else if angle_between <= 80.0 {
        observer_length / 2.0 + 0.65 * observed_length / 2.0
    } else {
        observer_length / 2.0 + observed_width / 2.0 + TILE_SIZE / 20.0
    };
    dist + TILE_SIZE / 20.0
}

/// Safe distance from `self_pos` to `crossing`, adjusted by crossing
/// `angle` and whether the crossing lies `ahead`.
pub fn distance_to_cross(base_distance: f64, angle: f64, ahead: bool) -> f64 {
    let x = TILE_SIZE;
    let angle = angle.abs();
    let addition = if angle < 32.0 {
        if ahead {
            -x / 3.5
        } else {
            0.0
        }
    } else if angle < 41.625 {
        if ahead {
            -x / 10.0
        } else {
            0.0
        }
    } else if angle < 140.0 {
        0.0
    } else {
        -x / 2.5
    };
    base_distance + addition
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yielding_distance_positive_and_negative_branches_differ() {
        let pos = yielding_distance(20.0, 400.0);
        let neg = yielding_distance(-20.0, 400.0);
        assert!((pos - (200.0 + 0.70 * TILE_SIZE)).abs() < 1e-9);
        assert!((neg - (200.0 + 11.0 / 15.0 * TILE_SIZE)).abs() < 1e-9);
        assert_ne!(pos, neg);
    }

    #[test]
    fn collision_distance_widest_branch_double_counts_the_margin() {
        // angle_between near 90 forces the final branch, which already
        // folds in one TILE_SIZE/20 before the blanket addition.
        let d = collision_distance(89.0, 500.0, 200.0, 500.0, 200.0);
        let expected = 500.0 / 2.0 + 200.0 / 2.0 + TILE_SIZE / 20.0 + TILE_SIZE / 20.0;
        assert!((d - expected).abs() < 1e-9);
    }
}

use crate::vehicle::VehicleKind;

/// Forces common to every vehicle kind, scaled by mode in
/// [`default_forces`].
pub const F_POSITIVE: f64 = 1500.0;
pub const F_NORMAL: f64 = 2000.0;
pub const F_NEGATIVE: f64 = 7000.0;

pub struct KindParams {
    pub mass: f64,
    pub width_factor: f64,
    pub length_ratio: f64,
    pub max_speed: f64,
    pub min_turn_radius: f64,
}

pub fn kind_params(kind: VehicleKind) -> KindParams {
    match kind {
        VehicleKind::Sedan => KindParams {
            mass: 1000.0,
            width_factor: 1.05,
            length_ratio: 1.85,
            max_speed: 50.0,
            min_turn_radius: 0.40,
        },
        VehicleKind::MiniVan => KindParams {
            mass: 1500.0,
            width_factor: 1.10,
            length_ratio: 1.85,
            max_speed: 42.0,
            min_turn_radius: 0.43,
        },
        VehicleKind::PickupTruck => KindParams {
            mass: 2000.0,
            width_factor: 1.15,
            length_ratio: 2.10,
            max_speed: 30.0,
            min_turn_radius: 0.50,
        },
    }
}

/// (offroad, turn, cruise) default speeds.
pub fn default_speeds(kind: VehicleKind, rushing: bool) -> (f64, f64, f64) {
    match (kind, rushing) {
        (VehicleKind::Sedan, false) => (4.4, 5.5, 6.0),
        (VehicleKind::Sedan, true) => (4.6, 5.8, 6.4),
        (VehicleKind::MiniVan, false) => (3.7, 4.0, 5.5),
        (VehicleKind::MiniVan, true) => (3.9, 4.3, 5.9),
        (VehicleKind::PickupTruck, false) => (3.5, 3.5, 4.5),
        (VehicleKind::PickupTruck, true) => (3.7, 3.8, 4.9),
    }
}

/// (accelerate, brake, steer) default forces, as fractions of the
/// common maxima above.
pub fn default_forces(rushing: bool) -> (f64, f64, f64) {
    if rushing {
        (0.666 * F_POSITIVE, 0.5 * F_NEGATIVE, 0.9 * F_NORMAL)
    } else {
        (0.333 * F_POSITIVE, 0.25 * F_NEGATIVE, 0.75 * F_NORMAL)
    }
}

/// Larger vehicles are held to a tighter path-following tolerance.
pub fn path_radius_coefficient(kind: VehicleKind) -> f64 {
    match kind {
        VehicleKind::Sedan => 0.30,
        VehicleKind::MiniVan => 0.28,
        VehicleKind::PickupTruck => 0.25,
    }
}

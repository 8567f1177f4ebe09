//! Pure geometry and vector math shared by `citymap` and `sim`. Nothing
//! in this crate owns simulation state or mutates anything it's handed.

pub mod clearance;
mod consts;
mod intersect;
mod pt2d;

pub use consts::{scale, PATH_RADIUS, TILE_SIZE, TIME_STEP_MS, VEHICLE_SIZE};
pub use intersect::{intersects, Crossing};
pub use pt2d::{
    check_angle, direction, distance, is_ahead, is_behind, magnitude, normalize, vector, Pt2D,
};

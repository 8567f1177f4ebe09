//! Vehicle kinematics, per-vehicle sensing, and the city-wide admission
//! and tick loop built on top of `citymap`'s layouts and routes.

pub mod controller;
pub mod params;
pub mod radar;
pub mod vehicle;

pub use controller::CityController;
pub use radar::Radar;
pub use vehicle::{Vehicle, VehicleId, VehicleKind};

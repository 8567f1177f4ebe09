/// Edge length of a single city block, in scene units. Every other spatial
/// constant in the engine is defined relative to this one.
pub const TILE_SIZE: f64 = 100.0;

/// Nominal lane-following tolerance; per-kind tolerances in `sim` scale this.
pub const PATH_RADIUS: f64 = 0.1875 * TILE_SIZE;

/// Nominal vehicle footprint edge, before per-kind width/length factors.
pub const VEHICLE_SIZE: f64 = 1.2 * PATH_RADIUS;

/// Simulation time step, milliseconds. Larger steps introduce visible
/// integration artifacts; this is a contract value, not a tunable.
pub const TIME_STEP_MS: f64 = 10.0;

/// `scale(x) = 0.01 * x * TIME_STEP_MS`, the conversion from a per-second
/// rate to a per-tick increment used throughout the kinematics layer.
pub fn scale(x: f64) -> f64 {
    0.01 * x * TIME_STEP_MS
}

use crate::vehicle::VehicleId;
use geom::Pt2D;
use std::collections::BTreeMap;

/// Sensing range: 1.75 tiles.
pub const RANGE: f64 = 1.75 * geom::TILE_SIZE;

/// A vehicle's view of its surroundings. Holds the ids of every other
/// currently alive vehicle (`targets`, kept in step by the controller on
/// admission and retirement) plus the subset within range as of the last
/// [`Radar::refresh`] call (`visible`). Never owns vehicle data itself —
/// callers resolve an id back to state through the tick's snapshot map.
#[derive(Clone, Debug, Default)]
pub struct Radar {
    location: Option<Pt2D>,
    rotation: f64,
    direction: (f64, f64),
    targets: Vec<VehicleId>,
    visible: Vec<VehicleId>,
}

impl Radar {
    pub fn new() -> Radar {
        Radar::default()
    }

    pub fn add_target(&mut self, id: VehicleId) {
        self.targets.push(id);
    }

    pub fn remove_target(&mut self, id: VehicleId) {
        self.targets.retain(|&t| t != id);
    }

    pub fn visible(&self) -> &[VehicleId] {
        &self.visible
    }

    pub fn heading(&self) -> (f64, f64) {
        self.direction
    }

    pub fn location(&self) -> Option<Pt2D> {
        self.location
    }

    /// Recomputes the pseudo-heading used for ahead/behind checks and the
    /// visible subset of `targets`, given every peer's position this tick.
    pub fn refresh(&mut self, position: Pt2D, rotation: f64, positions: &BTreeMap<VehicleId, Pt2D>) {
        self.location = Some(position);
        self.rotation = rotation;
        let rad = rotation.to_radians();
        self.direction = (10.0 * rad.cos(), 10.0 * rad.sin());

        self.visible = self
            .targets
            .iter()
            .copied()
            .filter(|id| {
                positions
                    .get(id)
                    .map(|&p| geom::distance(position, p) <= RANGE)
                    .unwrap_or(false)
            })
            .collect();
    }
}

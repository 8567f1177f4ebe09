use crate::vehicle::{Vehicle, VehicleId, VehicleKind, VehicleSnapshot};
use citymap::{BorderPoints, CityLayout, CityMapError, RoadGraph};
use rand::Rng;
use rand_xorshift::XorShiftRng;
use std::collections::BTreeMap;

/// How many times `spawn_vehicle` will redraw a goal before giving up
/// on this tick. The original engine retries unboundedly; this bound
/// keeps a single stuck tick from spinning forever when a layout has
/// genuinely unreachable exits.
const MAX_ADMISSION_RETRIES: u32 = 32;

/// Cool-down applied to an entry index once it's used, in milliseconds.
const ENTRY_COOLDOWN_MS: f64 = 5000.0;

/// Owns a generated layout and every vehicle driving across it. The
/// sole entry point for a renderer or test harness: construct one,
/// call `tick` on a fixed schedule, read `vehicles()` in between.
pub struct CityController {
    layout: CityLayout,
    graph: RoadGraph,
    borders: BorderPoints,
    vehicles: Vec<Vehicle>,
    available: Vec<usize>,
    cooldown: BTreeMap<usize, f64>,
    maximum: usize,
    rush_hour: bool,
    target_count: Option<usize>,
    next_id: VehicleId,
    rng: XorShiftRng,
}

impl CityController {
    pub fn new(n: usize, seed: u64) -> anyhow::Result<CityController> {
        let mut seed_bytes = [0u8; 16];
        seed_bytes[..8].copy_from_slice(&seed.to_le_bytes());
        let rng = <XorShiftRng as rand::SeedableRng>::from_seed(seed_bytes);
        Self::build(n, rng)
    }

    /// Generates a fresh layout against a forked scratch RNG, so the
    /// fill-retry count (which varies with `n` and luck) never perturbs
    /// `rng`'s own draw sequence for admission.
    fn build(n: usize, mut rng: XorShiftRng) -> anyhow::Result<CityController> {
        let mut layout_rng = util::fork_rng(&mut rng);
        let layout = CityLayout::generate(n, &mut layout_rng)?;
        let graph = RoadGraph::build(&layout);
        let borders = BorderPoints::build(&graph, layout.dimension());
        let maximum = capacity(n);
        let available = (0..borders.len()).collect();

        Ok(CityController {
            layout,
            graph,
            borders,
            vehicles: Vec::new(),
            available,
            cooldown: BTreeMap::new(),
            maximum,
            rush_hour: false,
            target_count: None,
            next_id: 0,
            rng,
        })
    }

    /// Drives every live vehicle one `TIME_STEP_MS` forward, retires
    /// anything that finished, ages cooldowns, and admits one new
    /// vehicle if capacity allows. Vehicles read only the frozen
    /// snapshot of last tick's peers, never each other's live state.
    pub fn tick(&mut self) {
        let peers = self.snapshot_peers();
        for vehicle in &mut self.vehicles {
            if !vehicle.is_done() {
                vehicle.drive(&peers);
            }
        }

        let done: Vec<VehicleId> = self
            .vehicles
            .iter()
            .filter(|v| v.is_done())
            .map(Vehicle::id)
            .collect();
        if !done.is_empty() {
            self.retire(&done);
        }

        self.decay_cooldowns();

        if self.vehicles.len() < self.usable_capacity() {
            self.spawn_vehicle();
        }
    }

    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    pub fn layout(&self) -> &CityLayout {
        &self.layout
    }

    /// Flips calm/rush mode and immediately re-parametrizes every live
    /// vehicle's default speed and force tables, not just future spawns.
    pub fn toggle_rush(&mut self) {
        self.rush_hour = !self.rush_hour;
        for vehicle in &mut self.vehicles {
            vehicle.set_rushing(self.rush_hour);
        }
    }

    /// Caps admission at `n`, in addition to the mode-derived capacity.
    pub fn set_target_count(&mut self, n: usize) {
        self.target_count = Some(n);
    }

    /// Clears every vehicle and cooldown, keeping the current layout.
    pub fn request_reset(&mut self) {
        self.vehicles.clear();
        self.cooldown.clear();
        self.available = (0..self.borders.len()).collect();
    }

    /// Regenerates the layout from scratch, preserving the current
    /// mode and target count.
    pub fn request_new_layout(&mut self, n: usize) -> anyhow::Result<()> {
        let rush_hour = self.rush_hour;
        let target_count = self.target_count;
        let rng = util::fork_rng(&mut self.rng);
        let mut replacement = Self::build(n, rng)?;
        replacement.rush_hour = rush_hour;
        replacement.target_count = target_count;
        *self = replacement;
        Ok(())
    }

    /// Removes a single vehicle outright, independent of the tick
    /// cycle's own retirement pass. Exposed for an outer shell to let a
    /// user pull a vehicle off the map directly.
    pub fn erase(&mut self, id: VehicleId) {
        self.retire(&[id]);
    }

    fn snapshot_peers(&self) -> BTreeMap<VehicleId, VehicleSnapshot> {
        self.vehicles.iter().map(|v| (v.id(), v.snapshot())).collect()
    }

    /// Removes every id in `ids` from the vehicle list, then drops them
    /// from every survivor's radar. Vehicles are driven first and
    /// collected into a batch before any removal happens, so a radar
    /// scan never sees a vehicle disappear mid-tick.
    fn retire(&mut self, ids: &[VehicleId]) {
        self.vehicles.retain(|v| !ids.contains(&v.id()));
        for vehicle in &mut self.vehicles {
            for &id in ids {
                vehicle.remove_radar_target(id);
            }
        }
        for &id in ids {
            log::debug!("vehicle {id} retired");
        }
    }

    fn decay_cooldowns(&mut self) {
        let mut expired = Vec::new();
        for (&index, remaining) in self.cooldown.iter_mut() {
            *remaining -= geom::TIME_STEP_MS;
            if *remaining <= 0.0 {
                expired.push(index);
            }
        }
        for index in expired {
            self.cooldown.remove(&index);
            self.available.push(index);
        }
    }

    fn usable_capacity(&self) -> usize {
        let cap = if self.rush_hour {
            self.maximum
        } else {
            self.maximum.saturating_sub(self.borders.len() / 4)
        };
        match self.target_count {
            Some(target) => cap.min(target),
            None => cap,
        }
    }

    /// Admits one vehicle: a random free entry, a goal drawn from the
    /// windowed angular preference, retried with a fully random goal
    /// until a path plans or the retry budget runs out.
    fn spawn_vehicle(&mut self) {
        if self.available.is_empty() {
            return;
        }

        let entry_count = self.borders.len();
        let slot = self.rng.gen_range(0..self.available.len());
        let index1 = self.available[slot];

        let mut index2 = windowed_goal_index(&mut self.rng, index1, entry_count);
        let mut path = None;
        for attempt in 0..MAX_ADMISSION_RETRIES {
            if index2 == index1 {
                index2 = self.rng.gen_range(0..entry_count);
                continue;
            }
            let entry = self.borders.entries()[index1];
            let goal = self.borders.exits()[index2];
            match citymap::plan(&self.graph, &self.layout, entry, goal) {
                Ok(p) => {
                    path = Some(p);
                    break;
                }
                Err(CityMapError::RouteUnreachable) => {
                    log::debug!(
                        "route from entry {index1} to exit {index2} unreachable on attempt {attempt}, retrying"
                    );
                    index2 = self.rng.gen_range(0..entry_count);
                }
                Err(other) => {
                    log::warn!("unexpected city map error during admission: {other}");
                    return;
                }
            }
        }

        let Some(path) = path else {
            log::warn!("spawn_vehicle exhausted its retry budget for entry {index1}");
            return;
        };

        let kind = random_kind(&mut self.rng);
        let id = self.next_id;
        self.next_id += 1;

        let mut vehicle = Vehicle::new(id, kind, self.rush_hour, path);
        for existing in &mut self.vehicles {
            existing.add_radar_target(id);
            vehicle.add_radar_target(existing.id());
        }

        let peers = self.snapshot_peers();
        vehicle.spawn(&peers);
        self.vehicles.push(vehicle);

        self.cooldown.insert(index1, ENTRY_COOLDOWN_MS);
        self.available.remove(slot);

        log::debug!("admitted vehicle {id} at entry {index1} toward exit {index2}");
    }
}

/// `maximum = 2N` (minus one dimension step and plus one back if `N`
/// is even), minus 2 more for the smallest layouts, which only have a
/// single entry per side.
fn capacity(n: usize) -> usize {
    let mut dim = n;
    let mut add = false;
    if dim % 2 == 0 {
        dim -= 1;
        add = true;
    }

    let mut maximum = 2 * dim;
    if add {
        maximum += 1;
    }
    if dim <= 5 {
        maximum -= 2;
    }
    maximum
}

/// An offset a quarter to three-quarters of the way around the border
/// from `index1`, wrapped into `0..entry_count`. Biases goal selection
/// away from the entry's own side without ruling out any exit outright.
fn windowed_goal_index(rng: &mut impl Rng, index1: usize, entry_count: usize) -> usize {
    let lo = (0.25 * entry_count as f64) as usize;
    let hi = ((0.75 * entry_count as f64) as usize).max(lo);
    let offset = rng.gen_range(lo..=hi);
    (index1 + offset) % entry_count
}

/// 20% pickup truck, 30% mini van, 50% sedan — unrelated to rush mode.
fn random_kind(rng: &mut impl Rng) -> VehicleKind {
    let roll = rng.gen_range(1..=10);
    if roll <= 2 {
        VehicleKind::PickupTruck
    } else if roll <= 5 {
        VehicleKind::MiniVan
    } else {
        VehicleKind::Sedan
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_3x3_layout_has_four_border_exits_and_the_documented_capacity() {
        let controller = CityController::new(3, 1).unwrap();
        assert_eq!(controller.borders.len(), 4);
        assert_eq!(controller.maximum, 4);
        assert_eq!(controller.usable_capacity(), 3);
    }

    #[test]
    fn rush_mode_uses_the_unreduced_capacity() {
        let mut controller = CityController::new(3, 2).unwrap();
        controller.toggle_rush();
        assert_eq!(controller.usable_capacity(), 4);
    }

    #[test]
    fn rejects_dimensions_outside_the_supported_range() {
        assert!(CityController::new(2, 1).is_err());
        assert!(CityController::new(10, 1).is_err());
    }

    #[test]
    fn reset_restores_every_entry_and_clears_the_fleet() {
        let mut controller = CityController::new(4, 3).unwrap();
        for _ in 0..50 {
            controller.tick();
        }
        assert!(!controller.vehicles.is_empty());
        controller.request_reset();
        assert!(controller.vehicles.is_empty());
        assert!(controller.cooldown.is_empty());
        assert_eq!(controller.available.len(), controller.borders.len());
    }

    #[test]
    fn an_admitted_entry_returns_to_available_after_five_seconds() {
        let mut controller = CityController::new(3, 4).unwrap();
        controller.spawn_vehicle();
        assert_eq!(controller.vehicles.len(), 1);
        assert_eq!(controller.available.len(), controller.borders.len() - 1);

        for _ in 0..499 {
            controller.decay_cooldowns();
        }
        assert_eq!(controller.available.len(), controller.borders.len() - 1);

        controller.decay_cooldowns();
        assert_eq!(controller.available.len(), controller.borders.len());
        assert!(controller.cooldown.is_empty());
    }

    #[test]
    fn erase_drops_the_vehicle_and_its_radar_entry_everywhere() {
        let mut controller = CityController::new(4, 5).unwrap();
        for _ in 0..5 {
            controller.tick();
        }
        let Some(first) = controller.vehicles.first().map(Vehicle::id) else {
            return;
        };
        controller.erase(first);
        assert!(controller.vehicles.iter().all(|v| v.id() != first));
    }
}

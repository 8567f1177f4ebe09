use crate::params;
use crate::radar::Radar;
use geom::Pt2D;
use serde::Serialize;
use std::collections::BTreeMap;

pub type VehicleId = u64;

const PAUSE_MS: u32 = 200;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum VehicleKind {
    Sedan,
    MiniVan,
    PickupTruck,
}

/// Tracks whether this vehicle has already deferred once to a vehicle
/// that is itself blocked on it. A fresh deferral buys the other side
/// one cycle to clear; if the jam persists the vehicle moves to
/// `Trying` and starts pushing through. `Committing` marks the tick on
/// which it actually did so, and lasts only until the next time it's
/// physically blocked, at which point it resets to `Polite`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum DeadlockState {
    Polite,
    Trying,
    Committing,
}

/// A lightweight view of one vehicle as it stood at the start of the
/// current tick, handed to every other vehicle being driven this tick.
/// Every vehicle reads last tick's state through this rather than a
/// live reference, so driving order within a tick can't change the
/// outcome.
#[derive(Clone, Debug)]
pub struct VehicleSnapshot {
    pub position: Pt2D,
    pub rotation: f64,
    pub speed: f64,
    pub length: f64,
    pub width: f64,
    pub heading: (f64, f64),
    pub relevant: Vec<Pt2D>,
    pub to_follow: Option<VehicleId>,
    pub blocking: Vec<VehicleId>,
    pub commited: bool,
}

#[derive(Serialize)]
struct VehicleDebug {
    id: VehicleId,
    kind: VehicleKind,
    position: Pt2D,
    rotation: f64,
    speed: f64,
    blocked: bool,
    yields: bool,
    slows: bool,
    commited: bool,
    rushing: bool,
    done: bool,
}

/// One car, van, or truck on the map. Everything a vehicle does each
/// tick happens through [`Vehicle::drive`], which updates its view of
/// the world (`update`), integrates its position (`run`), and then
/// applies whichever control law currently fits: `seek` when off path,
/// `regain_course` when on path but pointed the wrong way, or
/// `achieve_speed` when driving freely.
pub struct Vehicle {
    id: VehicleId,
    kind: VehicleKind,
    position: Pt2D,
    velocity: (f64, f64),
    rotation: f64,
    path: citymap::Path,
    radar: Radar,
    path_radius: f64,

    mass: f64,
    width: f64,
    length: f64,
    max_speed: f64,
    min_turn_radius: f64,
    default_speeds: (f64, f64, f64),
    default_forces: (f64, f64, f64),

    rushing: bool,
    slows: bool,
    yields: bool,
    blocked: bool,
    commited: bool,
    done: bool,
    deadlock: DeadlockState,

    to_follow: Option<(VehicleId, Pt2D)>,
    limit: Option<f64>,
    intersections: BTreeMap<VehicleId, (Pt2D, f64, Pt2D)>,
    yield_coords: BTreeMap<VehicleId, (Pt2D, f64, Pt2D)>,
    blocking: Vec<VehicleId>,
    to_ignore: Vec<VehicleId>,

    counter: u32,
    relevant: Vec<Pt2D>,
}

impl Vehicle {
    pub fn new(id: VehicleId, kind: VehicleKind, rushing: bool, path: citymap::Path) -> Vehicle {
        let p = params::kind_params(kind);
        let width = p.width_factor * geom::VEHICLE_SIZE;
        let length = width * p.length_ratio;

        Vehicle {
            id,
            kind,
            position: path.spawn_point(),
            velocity: (0.0, 0.0),
            rotation: path.spawn_rotation(),
            path,
            radar: Radar::new(),
            path_radius: params::path_radius_coefficient(kind) * geom::PATH_RADIUS,
            mass: p.mass,
            width,
            length,
            max_speed: p.max_speed,
            min_turn_radius: p.min_turn_radius,
            default_speeds: params::default_speeds(kind, rushing),
            default_forces: params::default_forces(rushing),
            rushing,
            slows: false,
            yields: false,
            blocked: false,
            commited: false,
            done: false,
            deadlock: DeadlockState::Polite,
            to_follow: None,
            limit: None,
            intersections: BTreeMap::new(),
            yield_coords: BTreeMap::new(),
            blocking: Vec::new(),
            to_ignore: Vec::new(),
            counter: 0,
            relevant: Vec::new(),
        }
    }

    /// Places the vehicle at its path's spawn point and runs one
    /// `update` so it has a sensible radar/relevant-coordinates state
    /// before the first `drive` call.
    pub fn spawn(&mut self, peers: &BTreeMap<VehicleId, VehicleSnapshot>) {
        let spawn_point = self.path.spawn_point();
        let rotation = self.path.spawn_rotation();
        self.position = spawn_point;
        self.rotation = rotation;
        self.velocity = (0.02 * rotation.to_radians().cos(), 0.02 * rotation.to_radians().sin());

        self.deadlock = DeadlockState::Polite;
        self.intersections.clear();
        self.yield_coords.clear();
        self.done = false;

        self.update(peers);
    }

    pub fn snapshot(&self) -> VehicleSnapshot {
        VehicleSnapshot {
            position: self.position,
            rotation: self.rotation,
            speed: self.speed(),
            length: self.length,
            width: self.width,
            heading: self.radar.heading(),
            relevant: self.relevant.clone(),
            to_follow: self.to_follow.map(|(id, _)| id),
            blocking: self.blocking.clone(),
            commited: self.commited,
        }
    }

    pub fn id(&self) -> VehicleId {
        self.id
    }

    pub fn kind(&self) -> VehicleKind {
        self.kind
    }

    pub fn position(&self) -> Pt2D {
        self.position
    }

    pub fn velocity(&self) -> (f64, f64) {
        self.velocity
    }

    pub fn speed(&self) -> f64 {
        geom::magnitude(self.velocity)
    }

    /// Heading in the engine's own convention: degrees counter-clockwise
    /// from the positive x-axis.
    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    /// Heading as the rendering scene expects it: clockwise growth,
    /// folded into `0..360`.
    pub fn scene_rotation(&self) -> f64 {
        (450.0 - self.rotation).rem_euclid(360.0)
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    pub fn path(&self) -> &citymap::Path {
        &self.path
    }

    pub fn radar(&self) -> &Radar {
        &self.radar
    }

    /// Called by the controller on admission/retirement to keep every
    /// live radar's target set in step with the vehicle list.
    pub fn add_radar_target(&mut self, id: VehicleId) {
        self.radar.add_target(id);
    }

    pub fn remove_radar_target(&mut self, id: VehicleId) {
        self.radar.remove_target(id);
    }

    pub fn relevant_coordinates(&self) -> &[Pt2D] {
        &self.relevant
    }

    pub fn is_blocked(&self) -> bool {
        self.blocked
    }

    pub fn is_blocking(&self, other: VehicleId) -> bool {
        self.blocking.contains(&other)
    }

    pub fn is_commited(&self) -> bool {
        self.commited
    }

    pub fn is_rushing(&self) -> bool {
        self.rushing
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Switches between rush-hour and casual speed/force tables. Unlike
    /// a plain toggle, the target mode is explicit so the controller
    /// can re-parametrize every live vehicle in one pass without caring
    /// what each one's previous mode was.
    pub fn set_rushing(&mut self, rushing: bool) {
        self.rushing = rushing;
        self.default_speeds = params::default_speeds(self.kind, rushing);
        self.default_forces = params::default_forces(rushing);
    }

    pub fn debug_json(&self) -> String {
        let debug = VehicleDebug {
            id: self.id,
            kind: self.kind,
            position: self.position,
            rotation: self.rotation,
            speed: self.speed(),
            blocked: self.blocked,
            yields: self.yields,
            slows: self.slows,
            commited: self.commited,
            rushing: self.rushing,
            done: self.done,
        };
        serde_json::to_string(&debug).unwrap_or_default()
    }

    /// The only method the controller calls each tick. Refreshes this
    /// vehicle's view of the world, integrates its position, and picks
    /// a control law.
    pub fn drive(&mut self, peers: &BTreeMap<VehicleId, VehicleSnapshot>) {
        self.update(peers);
        self.run();

        let (mut offroad, mut turn, mut cruise) = self.default_speeds;

        if self.yields || self.blocked {
            cruise = 0.0;
            turn = 0.0;
            offroad = 0.0;
        } else if self.slows {
            cruise /= 2.0;
            turn = 2.0 * turn / 3.0;
            offroad = 2.0 * offroad / 3.0;
        }

        if let Some(limit) = self.limit {
            cruise = cruise.min(limit);
            turn = turn.min(limit);
            offroad = offroad.min(limit);
        }

        if !self.on_path() {
            self.seek(offroad);
        } else if !self.on_course() {
            self.regain_course(turn, cruise);
        } else {
            self.achieve_speed(cruise);
        }
    }

    fn update(&mut self, peers: &BTreeMap<VehicleId, VehicleSnapshot>) {
        self.update_rotation();

        let positions: BTreeMap<VehicleId, Pt2D> =
            peers.iter().map(|(&id, s)| (id, s.position)).collect();
        self.radar.refresh(self.position, self.rotation, &positions);

        self.update_path_progress();
        self.set_relevant_coordinates();
        self.set_intersections(peers);

        self.limit = None;
        self.slows = false;
        self.yields = false;
        self.commited = false;
        self.blocked = false;
        self.blocking.clear();

        if let Some((leader, _)) = self.to_follow {
            if peers.contains_key(&leader) {
                self.set_limit(peers);
            }
        }
        if !self.intersections.is_empty() {
            self.update_blocking(peers);
        }
        if !self.rushing && !self.yield_coords.is_empty() {
            self.update_yielding();
        }
        if !self.blocked {
            self.solve_standstill(peers);
        }
        if self.blocked {
            self.deadlock = DeadlockState::Polite;
        }

        self.counter += geom::TIME_STEP_MS as u32;
    }

    fn run(&mut self) {
        let (vx, vy) = self.velocity;
        self.position = Pt2D::new(
            self.position.x() + geom::TILE_SIZE * geom::scale(vx) / 100.0,
            self.position.y() - geom::TILE_SIZE * geom::scale(vy) / 100.0,
        );
    }

    fn update_rotation(&mut self) {
        if self.speed() <= 0.01 {
            return;
        }
        if let Some(r) = geom::direction(self.velocity) {
            self.rotation = r;
        }
    }

    /// Coordinates of up to four path pieces starting at the vehicle's
    /// current piece index, concatenated in order.
    fn proximity(&self) -> Vec<Pt2D> {
        let pieces = self.path.pieces();
        let (index, _) = self.path.progress();
        let up_limit = self.path.last_index();
        let end = (index + 3).min(up_limit);

        let mut combined = Vec::new();
        for piece in &pieces[index..=end] {
            combined.extend_from_slice(piece);
        }
        combined
    }

    fn update_path_progress(&mut self) {
        let posi = self.position;
        let up_limit = self.path.last_index();
        let (index, sub_index) = self.path.progress();
        let mut nearby = self.proximity();

        if index + 1 == up_limit {
            let r = geom::TILE_SIZE / 2.0;
            if geom::distance(posi, self.path.goal_point()) <= r {
                self.done = true;
            }

            let mut sub_index = sub_index;
            let mut close = geom::distance(posi, nearby[sub_index]);
            let mut next = geom::distance(posi, nearby[sub_index + 1]);
            while next < close {
                self.path.advance(false);
                sub_index = self.path.progress().1;
                close = geom::distance(posi, nearby[sub_index]);
                next = geom::distance(posi, nearby[sub_index + 1]);
            }
            return;
        }

        let past = nearby[0];
        let future = *nearby.last().unwrap();
        let behind = geom::distance(posi, past);
        let ahead = geom::distance(posi, future);

        if ahead < behind {
            self.path.advance(true);
            nearby = self.proximity();
        }

        // sub_index is the pre-advance value on purpose: the freshly
        // advanced piece is checked against wherever the vehicle was
        // sitting in the old one.
        let mut sub_index = sub_index;
        let mut close = geom::distance(posi, nearby[sub_index]);
        let mut next = geom::distance(posi, nearby[sub_index + 1]);
        while next < close {
            self.path.advance(false);
            sub_index = self.path.progress().1;
            close = geom::distance(posi, nearby[sub_index]);
            next = geom::distance(posi, nearby[sub_index + 1]);
        }
    }

    fn set_relevant_coordinates(&mut self) {
        let mut relevant = self.proximity();
        let mut sub_index = self.path.progress().1;
        while sub_index >= citymap::path::SAMPLES / 2 {
            relevant.remove(0);
            sub_index -= 1;
        }
        self.relevant = relevant;
    }

    fn set_intersections(&mut self, peers: &BTreeMap<VehicleId, VehicleSnapshot>) {
        if self.counter % PAUSE_MS != 0 {
            return;
        }
        if self.counter >= 1000 {
            self.counter = 0;
            self.to_ignore.clear();
        }

        let own = self.relevant.clone();
        let visible = self.radar.visible().to_vec();
        let relevant_dist = geom::TILE_SIZE / 1.5;
        let mut checked = Vec::new();

        for id in visible {
            let Some(peer) = peers.get(&id) else { continue };
            let spotted_now = peer.position;

            let mut check = false;
            let mut cross_location = None;

            if self.to_ignore.contains(&id) {
                check = true;
            } else if self.to_follow.map(|(f, _)| f) == Some(id) {
                let (_, last_spotted) = self.to_follow.unwrap();
                if geom::distance(last_spotted, spotted_now) == 0.0 {
                    check = true;
                }
            } else if let Some(&(point, _, _)) = self.intersections.get(&id) {
                cross_location = Some(point);
            }

            if !check {
                let crossing = geom::intersects(&own, &peer.relevant, cross_location);

                if crossing.must_yield {
                    let point = crossing.cross_point.unwrap();
                    let angle = crossing.angle.unwrap();
                    match self.to_follow {
                        Some((f, _)) if f == id => {
                            // This vehicle and the one it's following are
                            // starting to go their own separate ways.
                            if geom::distance(peer.position, point) >= relevant_dist {
                                self.to_follow = None;
                            }
                        }
                        _ => {
                            if peer.to_follow != Some(self.id) {
                                if geom::is_ahead(self.radar.heading(), self.position, point) {
                                    self.yield_coords.insert(id, (point, angle, spotted_now));
                                    self.intersections.insert(id, (point, angle, spotted_now));
                                } else if geom::distance(self.position, peer.position) <= relevant_dist {
                                    self.intersections.insert(id, (point, angle, spotted_now));
                                    self.yield_coords.insert(id, (point, angle, spotted_now));
                                }
                            }
                        }
                    }
                } else if let Some(angle) = crossing.angle {
                    let point = crossing.cross_point.unwrap();
                    self.intersections.insert(id, (point, angle, spotted_now));
                } else if let Some(point) = crossing.cross_point {
                    if geom::is_ahead(self.radar.heading(), self.position, point) {
                        match self.to_follow {
                            None => self.to_follow = Some((id, spotted_now)),
                            Some((f, _)) if f == id => self.to_follow = Some((id, spotted_now)),
                            Some((f, _)) => {
                                let new_d = geom::distance(self.position, peer.position);
                                if let Some(old_peer) = peers.get(&f) {
                                    let org_d = geom::distance(self.position, old_peer.position);
                                    if new_d < org_d {
                                        self.to_follow = Some((id, peer.position));
                                    }
                                }
                            }
                        }
                    }
                } else {
                    self.to_ignore.push(id);
                }
            }
            checked.push(id);
        }

        if let Some((f, _)) = self.to_follow {
            if !checked.contains(&f) {
                self.to_follow = None;
            }
        }
    }

    fn set_limit(&mut self, peers: &BTreeMap<VehicleId, VehicleSnapshot>) {
        let x = geom::TILE_SIZE;
        let Some((leader_id, last_spotted)) = self.to_follow else {
            return;
        };
        let Some(leader) = peers.get(&leader_id) else {
            return;
        };

        let mut ahead = geom::distance(self.position, last_spotted);
        ahead -= self.length / 2.0 + leader.length / 2.0 + x / 50.0;
        let reference = leader.speed;

        if ahead <= x {
            if ahead <= 0.7 * x {
                if ahead <= 0.4 * x {
                    if ahead <= 0.2 * x {
                        if ahead <= 0.1 * x {
                            self.blocked = true;
                        } else {
                            self.limit = Some((0.7 * reference).max(2.5));
                        }
                    } else {
                        self.limit = Some((1.0 * reference).max(3.0));
                    }
                } else {
                    self.limit = Some((1.2 * reference).max(6.5));
                }
            } else {
                self.limit = Some((1.5 * reference).max(8.0));
            }
        }
    }

    fn update_blocking(&mut self, peers: &BTreeMap<VehicleId, VehicleSnapshot>) {
        let intersections = self.intersections.clone();

        for (&id, &(location, angle, _)) in &intersections {
            let Some(peer) = peers.get(&id) else { continue };
            let own_ahead = geom::is_ahead(self.radar.heading(), self.position, location);
            let blocking_dist = geom::clearance::blocking_distance(angle, self.length, peer.width, own_ahead);

            if geom::distance(self.position, location) <= blocking_dist && !peer.blocking.contains(&self.id) {
                self.blocking.push(id);
            }

            if peer.blocking.contains(&self.id) && own_ahead {
                let stop_dist = geom::clearance::yielding_distance(angle, self.length);
                if geom::distance(self.position, location) <= stop_dist {
                    self.yields = true;
                    let obsv_ahead = geom::is_ahead(peer.heading, peer.position, location);
                    let base = geom::distance(self.position, location);
                    let dist_to_cross = geom::clearance::distance_to_cross(base, angle, obsv_ahead);
                    let dist_to_trgt = geom::distance(self.position, peer.position);

                    if !self.blocking.contains(&id) {
                        let facing = geom::clearance::relative_facing_angle(self.rotation, peer.rotation);
                        let col_dist =
                            geom::clearance::collision_distance(facing, self.length, self.width, peer.length, peer.width);
                        if dist_to_cross.min(dist_to_trgt) <= col_dist {
                            self.blocked = true;
                        }
                    }
                }
            }

            if peer.commited
                && own_ahead
                && geom::distance(self.position, location) > self.length / 2.0
            {
                let stop_dist = geom::clearance::yielding_distance(angle, self.length);
                if geom::distance(self.position, location) <= stop_dist {
                    self.yields = true;
                }
            }
        }
    }

    fn update_yielding(&mut self) {
        let mut on_the_way = false;
        let yield_coords = self.yield_coords.clone();

        for (location, angle, _) in yield_coords.into_values() {
            if !geom::is_ahead(self.radar.heading(), self.position, location) {
                continue;
            }
            let dist = geom::distance(self.position, location);
            let stop_dist = geom::clearance::yielding_distance(angle, self.length);
            if dist <= 1.5 * stop_dist {
                self.slows = true;
                if dist <= stop_dist {
                    if dist <= stop_dist - geom::TILE_SIZE / 10.0 {
                        on_the_way = true;
                    } else {
                        self.yields = true;
                    }
                }
            }
        }

        if on_the_way && !self.yields {
            self.commited = true;
            self.deadlock = DeadlockState::Committing;
            self.slows = false;
            self.yields = false;
        }
    }

    fn solve_standstill(&mut self, peers: &BTreeMap<VehicleId, VehicleSnapshot>) {
        let visible = self.radar.visible().to_vec();
        let mut blocker_count = 0;

        for &id in &visible {
            let Some(peer) = peers.get(&id) else { continue };
            if self.blocking.contains(&id) {
                blocker_count += 1;
            }
            if peer.blocking.contains(&self.id) && self.deadlock == DeadlockState::Polite {
                self.deadlock = DeadlockState::Trying;
                return;
            }
        }

        if blocker_count == 0 {
            let mut vehicles_moving = 0;
            for &id in &visible {
                let Some(peer) = peers.get(&id) else { continue };
                if geom::is_ahead(self.radar.heading(), self.position, peer.position) {
                    vehicles_moving += 1;
                    if peer.speed == 0.0 {
                        vehicles_moving -= 1;
                    }
                }
            }
            if vehicles_moving > 0 {
                return;
            }
        }

        if self.yields {
            self.commited = true;
            self.deadlock = DeadlockState::Committing;
        }
        self.slows = false;
        self.yields = false;
    }

    fn on_path(&self) -> bool {
        self.relevant
            .iter()
            .any(|&p| geom::distance(self.position, p) <= self.path_radius)
    }

    fn on_course(&self) -> bool {
        let magnitude = 25.0;
        let (nx, ny) = geom::normalize(self.velocity);
        let headed = Pt2D::new(self.position.x() + magnitude * nx, self.position.y() - magnitude * ny);
        self.relevant.iter().any(|&p| geom::distance(p, headed) <= self.path_radius)
    }

    fn seek(&mut self, offroad_speed: f64) {
        let posi = self.position;
        let nearby = self.relevant.clone();
        self.achieve_speed(offroad_speed);

        let mut dist = f64::INFINITY;
        let mut closest = nearby[0];
        let mut i0 = 0usize;
        for (i, &point) in nearby.iter().enumerate() {
            let d = geom::distance(posi, point);
            if d < dist {
                dist = d;
                closest = point;
                i0 = i;
            }
        }

        let x = geom::PATH_RADIUS;
        let r = self.path_radius;
        let mut appro_angle = if dist > r + 3.0 * x {
            90.0
        } else if dist > r + 2.0 * x {
            75.0
        } else if dist > r + 1.5 * x {
            60.0
        } else if dist > r + x {
            40.0
        } else if dist > r + 0.5 * x {
            20.0
        } else if dist > r + 0.25 * x {
            10.0
        } else {
            5.0
        };

        let v_position = (posi.x() - closest.x(), -(posi.y() - closest.y()));
        let v_path = (nearby[i0 + 2].x() - closest.x(), -nearby[i0 + 2].y() + closest.y());
        let v_direction = (self.rotation.to_radians().cos(), self.rotation.to_radians().sin());
        let angle_between = geom::check_angle(v_path, v_direction);
        let f_steer = self.default_forces.2;

        if geom::check_angle(v_path, v_position) >= 0.0 {
            appro_angle = -appro_angle;
            if angle_between > appro_angle {
                if angle_between - 1.0 >= appro_angle {
                    self.steer_right(f_steer);
                }
            } else if angle_between < appro_angle && angle_between + 1.0 <= appro_angle {
                self.steer_left(f_steer);
            }
        } else if angle_between < appro_angle {
            if angle_between + 1.0 <= appro_angle {
                self.steer_left(f_steer);
            }
        } else if angle_between > appro_angle && angle_between - 1.0 >= appro_angle {
            self.steer_right(f_steer);
        }
    }

    fn regain_course(&mut self, turn_speed: f64, cruise_speed: f64) {
        let posi = self.position;
        let nearby = self.relevant.clone();

        let mut dist = f64::INFINITY;
        let mut i0 = 0usize;
        for (i, &point) in nearby.iter().enumerate() {
            let d = geom::distance(posi, point);
            if d < dist {
                dist = d;
                i0 = i;
            }
        }

        let lead = 4usize;
        let start = i0 + lead;
        let end = i0 + lead / 2;
        let v_path = (nearby[start].x() - nearby[end].x(), -nearby[start].y() + nearby[end].y());
        let v_direction = (self.rotation.to_radians().cos(), self.rotation.to_radians().sin());
        let angle_between = geom::check_angle(v_path, v_direction);

        if angle_between.abs() <= 5.0 {
            self.achieve_speed(cruise_speed);
        } else {
            self.achieve_speed(turn_speed);
        }

        let f_steer = self.default_forces.2;
        if angle_between > 0.0 {
            self.steer_right(f_steer);
        } else if angle_between < 0.0 {
            self.steer_left(f_steer);
        }
    }

    fn steer_left(&mut self, steer_force: f64) {
        if self.speed() == 0.0 {
            return;
        }
        let abs_speed = self.speed();
        let f = steer_force.min(params::F_NORMAL);
        let c_rotate_max = abs_speed / self.min_turn_radius;
        let c_rotate_des = 100.0 * f / (abs_speed * self.mass);
        let angle = self.rotation + geom::scale(c_rotate_max.min(c_rotate_des));

        let (vx0, vy0) = self.velocity;
        self.velocity = if vx0 >= 0.0 && vy0 >= 0.0 {
            let vx = abs_speed * angle.to_radians().cos();
            let vy = (abs_speed.powi(2) - vx.powi(2)).sqrt();
            (vx, vy)
        } else if vx0 < 0.0 && vy0 >= 0.0 {
            let vx = -abs_speed * (angle - 90.0).to_radians().sin();
            let vy = if angle <= 180.0 {
                (abs_speed.powi(2) - vx.powi(2)).sqrt()
            } else {
                -(abs_speed.powi(2) - vx.powi(2)).sqrt()
            };
            (vx, vy)
        } else if vx0 < 0.0 && vy0 < 0.0 {
            let vx = -abs_speed * (angle - 180.0).to_radians().cos();
            let vy = -(abs_speed.powi(2) - vx.powi(2)).sqrt();
            (vx, vy)
        } else {
            let vx = abs_speed * (angle - 270.0).to_radians().sin();
            let vy = if angle < 360.0 {
                -(abs_speed.powi(2) - vx.powi(2)).sqrt()
            } else {
                (abs_speed.powi(2) - vx.powi(2)).sqrt()
            };
            (vx, vy)
        };
    }

    fn steer_right(&mut self, steer_force: f64) {
        if self.speed() == 0.0 {
            return;
        }
        let abs_speed = self.speed();
        let f = steer_force.min(params::F_NORMAL);
        let c_rotate_max = abs_speed / self.min_turn_radius;
        let c_rotate_des = 100.0 * f / (abs_speed * self.mass);
        let angle = self.rotation - geom::scale(c_rotate_max.min(c_rotate_des));

        let (vx0, vy0) = self.velocity;
        self.velocity = if vx0 >= 0.0 && vy0 >= 0.0 {
            let vx = abs_speed * angle.to_radians().cos();
            let vy = if angle >= 0.0 {
                (abs_speed.powi(2) - vx.powi(2)).sqrt()
            } else {
                -(abs_speed.powi(2) - vx.powi(2)).sqrt()
            };
            (vx, vy)
        } else if vx0 < 0.0 && vy0 >= 0.0 {
            let vx = -abs_speed * (angle - 90.0).to_radians().sin();
            let vy = (abs_speed.powi(2) - vx.powi(2)).sqrt();
            (vx, vy)
        } else if vx0 < 0.0 && vy0 < 0.0 {
            let vx = -abs_speed * (angle - 180.0).to_radians().cos();
            let vy = if angle >= 180.0 {
                -(abs_speed.powi(2) - vx.powi(2)).sqrt()
            } else {
                (abs_speed.powi(2) - vx.powi(2)).sqrt()
            };
            (vx, vy)
        } else {
            let vx = abs_speed * (angle - 270.0).to_radians().sin();
            let vy = -(abs_speed.powi(2) - vx.powi(2)).sqrt();
            (vx, vy)
        };
    }

    fn achieve_speed(&mut self, desired_speed: f64) {
        if self.speed() == desired_speed {
            return;
        }

        let (mut f_accelerate, mut f_brake, _) = self.default_forces;

        if self.blocked && !self.blocking.is_empty() {
            if self.on_path() && self.on_course() {
                f_accelerate *= 1.5;
                f_brake *= 1.5;
            }
        } else if self.blocked {
            f_brake *= 1.5;
        } else if !self.blocking.is_empty() && self.on_path() && self.on_course() {
            f_accelerate *= 1.5;
        }

        let speed = self.speed();
        if speed > desired_speed {
            if speed - 0.01 >= desired_speed {
                self.decelerate(f_brake);
            } else {
                self.match_velocity(desired_speed);
            }
        } else if speed < desired_speed {
            if speed + 0.01 <= desired_speed {
                self.accelerate(f_accelerate);
            } else {
                self.match_velocity(desired_speed);
            }
        }
    }

    fn match_velocity(&mut self, desired_speed: f64) {
        let angle = self.rotation.to_radians();
        self.velocity = (desired_speed * angle.cos(), desired_speed * angle.sin());
    }

    fn accelerate(&mut self, force: f64) {
        if self.speed() == self.max_speed {
            return;
        }
        let angle = self.rotation.to_radians();
        if self.speed() == 0.0 {
            self.velocity = (0.01 * angle.cos(), 0.01 * angle.sin());
        }

        let f = force.min(params::F_POSITIVE);
        let acceleration = geom::scale(f / self.mass);
        let x_step = (acceleration * angle.cos()).abs();
        let y_step = (acceleration.powi(2) - x_step.powi(2)).sqrt();

        let x_max = (self.max_speed * angle.cos()).abs();
        let y_max = (self.max_speed * angle.sin()).abs();

        let (mut vx, mut vy) = self.velocity;
        if vx.abs() + x_step >= x_max {
            vx = if vx > 0.0 { x_max } else { -x_max };
            vy = if vy > 0.0 { y_max } else { -y_max };
        } else {
            vx = if vx > 0.0 { vx + x_step } else { vx - x_step };
            vy = if vy > 0.0 { vy + y_step } else { vy - y_step };
        }
        self.velocity = (vx, vy);
    }

    fn decelerate(&mut self, force: f64) {
        if self.speed() == 0.0 {
            return;
        }
        let f = force.min(params::F_NEGATIVE);
        let acceleration = geom::scale(f / self.mass);
        let angle = self.rotation.to_radians();
        let x_step = (acceleration * angle.cos()).abs();
        let y_step = (acceleration.powi(2) - x_step.powi(2)).sqrt();

        let (mut vx, mut vy) = self.velocity;
        if vx.abs() <= x_step {
            vx = 0.0;
        } else if vx > 0.0 {
            vx -= x_step;
        } else {
            vx += x_step;
        }

        if vy.abs() < y_step {
            vy = 0.0;
        } else if vy > 0.0 {
            vy -= y_step;
        } else {
            vy += y_step;
        }
        self.velocity = (vx, vy);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_xorshift::XorShiftRng;

    fn some_path(seed: u8) -> citymap::Path {
        let mut rng = XorShiftRng::from_seed([seed; 16]);
        let layout = citymap::CityLayout::generate(4, &mut rng).unwrap();
        let graph = citymap::RoadGraph::build(&layout);
        let borders = citymap::BorderPoints::build(&graph, layout.dimension());
        let entry = borders.entries()[0];
        borders
            .exits()
            .iter()
            .find_map(|&goal| citymap::plan(&graph, &layout, entry, goal).ok())
            .expect("at least one exit should be reachable")
    }

    fn test_vehicle(seed: u8) -> Vehicle {
        Vehicle::new(1, VehicleKind::Sedan, false, some_path(seed))
    }

    #[test]
    fn speed_matches_velocity_magnitude() {
        let mut v = test_vehicle(21);
        v.velocity = (3.0, 4.0);
        assert!((v.speed() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn accelerate_from_rest_picks_a_minimal_seed_velocity() {
        let mut v = test_vehicle(22);
        v.rotation = 0.0;
        v.velocity = (0.0, 0.0);
        v.accelerate(1000.0);
        assert!(v.speed() > 0.0);
    }

    #[test]
    fn decelerate_clamps_to_exactly_zero_instead_of_overshooting_negative() {
        let mut v = test_vehicle(23);
        v.rotation = 0.0;
        v.velocity = (0.005, 0.0);
        v.decelerate(7000.0);
        assert_eq!(v.velocity, (0.0, 0.0));
    }

    #[test]
    fn steer_left_and_right_preserve_speed_magnitude() {
        let mut v = test_vehicle(24);
        v.rotation = 45.0;
        v.velocity = (3.0, 3.0);
        let before = v.speed();
        v.steer_left(500.0);
        assert!((v.speed() - before).abs() < 1e-6);

        v.velocity = (3.0, 3.0);
        v.steer_right(500.0);
        assert!((v.speed() - before).abs() < 1e-6);
    }

    #[test]
    fn scene_rotation_folds_into_0_360() {
        let mut v = test_vehicle(25);
        v.rotation = 10.0;
        assert!((v.scene_rotation() - 80.0).abs() < 1e-9);
        v.rotation = 300.0;
        assert!((v.scene_rotation() - 150.0).abs() < 1e-9);
    }

    #[test]
    fn set_rushing_swaps_to_the_rush_hour_tables() {
        let mut v = test_vehicle(26);
        let calm = v.default_speeds;
        v.set_rushing(true);
        assert_ne!(v.default_speeds, calm);
        assert!(v.is_rushing());
    }

    #[test]
    fn steer_with_zero_speed_is_a_no_op() {
        let mut v = test_vehicle(27);
        v.velocity = (0.0, 0.0);
        v.steer_left(1000.0);
        assert_eq!(v.velocity, (0.0, 0.0));
    }

    #[test]
    fn a_vehicle_already_blocked_by_a_peer_does_not_also_claim_to_block_it() {
        let mut v = test_vehicle(28);
        v.radar.refresh(v.position, v.rotation, &BTreeMap::new());
        let peer_id = 2;
        v.intersections.insert(peer_id, (Pt2D::new(50.0, 50.0), -45.0, Pt2D::new(0.0, 0.0)));

        let mut peers = BTreeMap::new();
        peers.insert(
            peer_id,
            VehicleSnapshot {
                position: Pt2D::new(55.0, 55.0),
                rotation: 90.0,
                speed: 1.0,
                length: v.length,
                width: v.width,
                heading: (10.0, 0.0),
                relevant: Vec::new(),
                to_follow: None,
                blocking: vec![v.id],
                commited: false,
            },
        );

        v.update_blocking(&peers);
        assert!(!v.is_blocking(peer_id));
    }

    #[test]
    fn driving_alone_to_completion_ends_within_half_a_tile_of_the_goal() {
        let mut v = test_vehicle(29);
        let peers = BTreeMap::new();
        v.spawn(&peers);

        let mut ticks = 0;
        while !v.is_done() {
            v.drive(&peers);
            ticks += 1;
            assert!(ticks < 100_000, "vehicle never reached its goal");
        }

        assert!(geom::distance(v.position, v.path.goal_point()) <= geom::TILE_SIZE / 2.0);
    }

    #[test]
    fn path_progress_never_regresses_while_driving() {
        let mut v = test_vehicle(30);
        let peers = BTreeMap::new();
        v.spawn(&peers);

        let mut last = v.path.progress();
        for _ in 0..2000 {
            if v.is_done() {
                break;
            }
            v.drive(&peers);
            let now = v.path.progress();
            assert!(now >= last);
            last = now;
        }
    }
}

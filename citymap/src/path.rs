use crate::block::Direction;
use crate::error::CityMapError;
use crate::graph::{RoadGraph, VertexId};
use crate::layout::CityLayout;
use geom::{Pt2D, TILE_SIZE};

/// Sample count per straight or wide-curve piece; vehicles use this to
/// decide how many trailing points of the current piece are still
/// relevant.
pub const SAMPLES: usize = 20;
const TIGHT_SAMPLES: usize = 12;

/// A vehicle's route across the map: a sequence of pieces (straight
/// stretches and curves), each a short list of sampled points. The
/// first piece is the pre-spawn tail outside the border; the last two
/// are the post-exit tail. `progress`/`sub_progress` track how far a
/// vehicle has travelled along it — see [`Path::advance`].
#[derive(Clone, Debug)]
pub struct Path {
    pieces: Vec<Vec<Pt2D>>,
    spawn_point: Pt2D,
    spawn_rotation: f64,
    goal_point: Pt2D,
    progress: usize,
    sub_progress: usize,
}

impl Path {
    pub fn pieces(&self) -> &[Vec<Pt2D>] {
        &self.pieces
    }

    pub fn spawn_point(&self) -> Pt2D {
        self.spawn_point
    }

    /// Heading, in degrees, a vehicle should start with as it spawns.
    pub fn spawn_rotation(&self) -> f64 {
        self.spawn_rotation
    }

    pub fn goal_point(&self) -> Pt2D {
        self.goal_point
    }

    pub fn progress(&self) -> (usize, usize) {
        (self.progress, self.sub_progress)
    }

    /// Called once a vehicle has moved enough for the current point to
    /// become irrelevant. `next_piece` additionally advances past the
    /// whole current piece, e.g. when it's been fully traversed.
    pub fn advance(&mut self, next_piece: bool) {
        self.sub_progress += 1;
        if next_piece {
            self.progress += 1;
            self.sub_progress = 0;
        }
    }

    pub fn current_piece(&self) -> Option<&[Pt2D]> {
        self.pieces.get(self.progress).map(|v| v.as_slice())
    }

    pub fn last_index(&self) -> usize {
        self.pieces.len().saturating_sub(1)
    }
}

/// Builds the shortest-path route from `entry` to `goal`, including
/// the pre-spawn and post-exit tails. Returns
/// [`CityMapError::RouteUnreachable`] if no route exists; the caller
/// is expected to retry with a different `goal`, not treat this as a
/// fatal error.
pub fn plan(
    graph: &RoadGraph,
    layout: &CityLayout,
    entry: Pt2D,
    goal: Pt2D,
) -> Result<Path, CityMapError> {
    let n = layout.dimension();
    let source = vertex_for(entry, n);
    let target = vertex_for(goal, n);

    let mut path_vertices = graph
        .shortest_path(source, target)
        .ok_or(CityMapError::RouteUnreachable)?;

    let mut dire = std::collections::BTreeMap::new();
    for w in path_vertices.windows(2) {
        let (from, to) = (w[0], w[1]);
        let d = graph
            .direction_towards(from, to)
            .expect("adjacent path vertices must share an edge");
        dire.insert(from, d);
    }

    let mut pieces = Vec::new();
    let (spawn_point, spawn_rotation, mut previous_direction) = set_spawn(entry, &mut pieces);

    loop {
        let loc = path_vertices.remove(0);
        let Some(&direction) = dire.get(&loc) else {
            break;
        };
        previous_direction = set_piece(direction, previous_direction, loc, &mut pieces);

        let mut cur = step(loc, direction);
        while !path_vertices.contains(&cur) {
            let block = layout.block(cur.0, cur.1);
            let direction = Direction::ALL
                .into_iter()
                .find(|&d| block.has_side(d) && d != previous_direction)
                .expect("a through tile always has an onward direction");
            previous_direction = set_piece(direction, previous_direction, cur, &mut pieces);
            cur = step(cur, direction);
        }
    }

    let goal_point = set_final(goal, &mut pieces);

    Ok(Path {
        pieces,
        spawn_point,
        spawn_rotation,
        goal_point,
        progress: 0,
        sub_progress: 0,
    })
}

fn vertex_for(point: Pt2D, n: usize) -> VertexId {
    let upper = (n - 1) as isize;
    let mut si = (point.x() / TILE_SIZE) as isize;
    let mut sj = (point.y() / TILE_SIZE) as isize;
    if si > upper {
        si -= 1;
    }
    if sj > upper {
        sj -= 1;
    }
    (si.max(0) as usize, sj.max(0) as usize)
}

fn step(v: VertexId, dir: Direction) -> VertexId {
    let (di, dj) = dir.step();
    (
        (v.0 as isize + di) as usize,
        (v.1 as isize + dj) as usize,
    )
}

/// Picks the entry lane and lays down the first piece, the short line
/// a vehicle travels before it's even on the map. Returns the spawn
/// point, its initial rotation, and the direction the vehicle is
/// already travelling in when it reaches the border tile.
fn set_spawn(entry: Pt2D, pieces: &mut Vec<Vec<Pt2D>>) -> (Pt2D, f64, Direction) {
    let size = TILE_SIZE;
    let outside = size / 2.0;
    let (x, y) = (entry.x(), entry.y());

    if x == 0.0 {
        pieces.push(set_line(Pt2D::new(x - size, (y / size).floor() * size), (1, -1)));
        (Pt2D::new(x - outside, y), 0.0, Direction::Left)
    } else if y == 0.0 {
        pieces.push(set_line(Pt2D::new((x / size).floor() * size, y - size), (-1, -1)));
        (Pt2D::new(x, y - outside), 270.0, Direction::Up)
    } else if x > y {
        pieces.push(set_line(Pt2D::new(x, (y / size).floor() * size), (-1, 1)));
        (Pt2D::new(x + outside, y), 180.0, Direction::Right)
    } else {
        pieces.push(set_line(Pt2D::new((x / size).floor() * size, y), (1, 1)));
        (Pt2D::new(x, y + outside), 90.0, Direction::Down)
    }
}

/// Lays down the last two pieces, the tail a vehicle drives after
/// leaving the border, and returns the coordinates it's considered to
/// have reached its goal at.
fn set_final(goal: Pt2D, pieces: &mut Vec<Vec<Pt2D>>) -> Pt2D {
    let size = TILE_SIZE;
    let outside = size;
    let (x, y) = (goal.x(), goal.y());

    if x == 0.0 {
        let fy = (y / size).floor() * size;
        pieces.push(set_line(Pt2D::new(x, fy), (-1, 1)));
        pieces.push(set_line(Pt2D::new(x - size, fy), (-1, 1)));
        Pt2D::new(x - outside, y)
    } else if y == 0.0 {
        let fx = (x / size).floor() * size;
        pieces.push(set_line(Pt2D::new(fx, y), (1, 1)));
        pieces.push(set_line(Pt2D::new(fx, y - size), (1, 1)));
        Pt2D::new(x, y - outside)
    } else if x > y {
        let fy = (y / size).floor() * size;
        pieces.push(set_line(Pt2D::new(x - size, fy), (1, -1)));
        pieces.push(set_line(Pt2D::new(x, fy), (1, -1)));
        Pt2D::new(x + outside, y)
    } else {
        let fx = (x / size).floor() * size;
        pieces.push(set_line(Pt2D::new(fx, y - size), (-1, -1)));
        pieces.push(set_line(Pt2D::new(fx, y), (-1, -1)));
        Pt2D::new(x, y + outside)
    }
}

/// Picks the piece shape (straight, wide left curve, or tight right
/// curve) for the tile at `loc` and appends it, returning the
/// direction the vehicle leaves this tile facing.
fn set_piece(
    direction: Direction,
    previous_direction: Direction,
    loc: VertexId,
    pieces: &mut Vec<Vec<Pt2D>>,
) -> Direction {
    let mut sub = direction.index() as i32 - previous_direction.index() as i32;
    if sub.abs() == 3 {
        sub = -sub;
    }

    let attach = Pt2D::new(loc.0 as f64 * TILE_SIZE, loc.1 as f64 * TILE_SIZE);

    if sub.abs() == 2 {
        let ctuple = match direction {
            Direction::Right => (1, -1),
            Direction::Up => (1, 1),
            Direction::Left => (-1, 1),
            Direction::Down => (-1, -1),
        };
        pieces.push(set_line(attach, ctuple));
        previous_direction
    } else if sub > 0 {
        let (ctuple, next) = match direction {
            Direction::Right => ((1, -1), Direction::Left),
            Direction::Up => ((1, 1), Direction::Down),
            Direction::Left => ((-1, 1), Direction::Right),
            Direction::Down => ((-1, -1), Direction::Up),
        };
        pieces.push(set_curve_2(attach, ctuple));
        next
    } else {
        let (ctuple, next) = match direction {
            Direction::Right => ((1, 1), Direction::Left),
            Direction::Up => ((-1, 1), Direction::Down),
            Direction::Left => ((-1, -1), Direction::Right),
            Direction::Down => ((1, -1), Direction::Up),
        };
        pieces.push(set_curve_1(attach, ctuple));
        next
    }
}

fn set_line(attach_point: Pt2D, ctuple: (i32, i32)) -> Vec<Pt2D> {
    let size = TILE_SIZE;
    let (mut x0, mut y0) = (attach_point.x(), attach_point.y());
    let mut reverse = false;

    let (x_step, y_step) = match ctuple {
        (1, 1) => {
            x0 += 11.0 / 16.0 * size;
            reverse = true;
            (0.0, size / SAMPLES as f64)
        }
        (-1, 1) => {
            y0 += 5.0 / 16.0 * size;
            reverse = true;
            (size / SAMPLES as f64, 0.0)
        }
        (-1, -1) => {
            x0 += 5.0 / 16.0 * size;
            (0.0, size / SAMPLES as f64)
        }
        _ => {
            y0 += 11.0 / 16.0 * size;
            (size / SAMPLES as f64, 0.0)
        }
    };

    let mut points: Vec<Pt2D> = (0..SAMPLES)
        .map(|i| Pt2D::new(x0 + i as f64 * x_step, y0 + i as f64 * y_step))
        .collect();

    if reverse {
        match ctuple {
            (1, 1) => {
                points.push(Pt2D::new(x0, y0 + size));
                points.reverse();
                points.pop();
            }
            (-1, 1) => {
                points.push(Pt2D::new(x0 + size, y0));
                points.reverse();
                points.pop();
            }
            _ => unreachable!(),
        }
    }

    points
}

fn curve_origin(attach_point: Pt2D, ctuple: (i32, i32)) -> (f64, f64, f64) {
    let size = TILE_SIZE;
    let (mut x0, mut y0) = (attach_point.x(), attach_point.y());
    let angle = match ctuple {
        (1, 1) => {
            x0 += size;
            180.0
        }
        (-1, 1) => 270.0,
        (-1, -1) => {
            y0 += size;
            0.0
        }
        _ => {
            x0 += size;
            y0 += size;
            90.0
        }
    };
    (x0, y0, angle)
}

/// A quarter circle resembling a wide left turn.
fn set_curve_1(attach_point: Pt2D, ctuple: (i32, i32)) -> Vec<Pt2D> {
    let r = 11.0 / 16.0 * TILE_SIZE;
    let step = 90.0 / SAMPLES as f64;
    let (x0, y0, angle) = curve_origin(attach_point, ctuple);

    (0..SAMPLES)
        .map(|i| {
            let theta = (angle + i as f64 * step).to_radians();
            Pt2D::new(x0 + r * theta.cos(), y0 - r * theta.sin())
        })
        .collect()
}

/// A smaller-radius quarter circle resembling a strict right turn. An
/// extra sample at the curve's far end is added before reversing the
/// order, then dropped once it's done its job of closing the gap to
/// the previous piece — leaving it first in the final list instead.
fn set_curve_2(attach_point: Pt2D, ctuple: (i32, i32)) -> Vec<Pt2D> {
    let r = 5.0 / 16.0 * TILE_SIZE;
    let step = 90.0 / TIGHT_SAMPLES as f64;
    let (x0, y0, angle) = curve_origin(attach_point, ctuple);

    let mut points: Vec<Pt2D> = (0..TIGHT_SAMPLES)
        .map(|i| {
            let theta = (angle + i as f64 * step).to_radians();
            Pt2D::new(x0 + r * theta.cos(), y0 - r * theta.sin())
        })
        .collect();

    let cap = match ctuple {
        (1, 1) => Pt2D::new(x0, y0 + r),
        (-1, 1) => Pt2D::new(x0 + r, y0),
        (-1, -1) => Pt2D::new(x0, y0 - r),
        _ => Pt2D::new(x0 - r, y0),
    };
    points.push(cap);
    points.reverse();
    points.pop();
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::RoadGraph;
    use rand::SeedableRng;
    use rand_xorshift::XorShiftRng;

    #[test]
    fn set_line_produces_the_configured_sample_count() {
        for ctuple in [(1, 1), (-1, 1), (-1, -1), (1, -1)] {
            assert_eq!(set_line(Pt2D::new(0.0, 0.0), ctuple).len(), SAMPLES);
        }
    }

    #[test]
    fn set_curve_2_drops_one_sample_after_capping() {
        for ctuple in [(1, 1), (-1, 1), (-1, -1), (1, -1)] {
            assert_eq!(set_curve_2(Pt2D::new(0.0, 0.0), ctuple).len(), TIGHT_SAMPLES);
        }
    }

    #[test]
    fn a_generated_path_starts_and_ends_with_a_tail_piece() {
        let mut rng = XorShiftRng::from_seed([13u8; 16]);
        let layout = CityLayout::generate(4, &mut rng).unwrap();
        let graph = RoadGraph::build(&layout);
        let borders = crate::borders::BorderPoints::build(&graph, layout.dimension());
        let entry = borders.entries()[0];

        // An unreachable goal is expected occasionally; a caller retries
        // with a different one rather than treating it as fatal.
        let path = borders
            .exits()
            .iter()
            .find_map(|&goal| plan(&graph, &layout, entry, goal).ok())
            .expect("at least one exit should be reachable from the first entry");
        assert!(path.pieces().len() >= 3);
        assert_eq!(path.progress(), (0, 0));
    }

    #[test]
    fn a_planned_path_starts_and_ends_within_a_tile_of_its_entry_and_goal() {
        let mut rng = XorShiftRng::from_seed([14u8; 16]);
        let layout = CityLayout::generate(5, &mut rng).unwrap();
        let graph = RoadGraph::build(&layout);
        let borders = crate::borders::BorderPoints::build(&graph, layout.dimension());

        for &entry in borders.entries() {
            for &goal in borders.exits() {
                let Ok(path) = plan(&graph, &layout, entry, goal) else {
                    continue;
                };
                assert!(geom::distance(path.spawn_point(), entry) <= geom::TILE_SIZE);
                assert!(geom::distance(path.goal_point(), goal) <= geom::TILE_SIZE);
            }
        }
    }
}

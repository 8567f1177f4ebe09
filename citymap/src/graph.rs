use crate::block::Direction;
use crate::layout::CityLayout;
use std::collections::BTreeMap;

pub type VertexId = (usize, usize);

/// An outgoing connection from one vertex to another: how far apart
/// they are (in tile-walk steps) and which direction to leave the
/// source vertex in to reach it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Edge {
    pub to: VertexId,
    pub distance: u32,
    pub direction: Direction,
}

/// The road network distilled from a `CityLayout`: every intersection
/// and every border tile with road access becomes a vertex; edges are
/// the straight-or-curving stretches of road between directly
/// reachable vertices.
#[derive(Clone, Debug)]
pub struct RoadGraph {
    adjacency: BTreeMap<VertexId, Vec<Edge>>,
}

impl RoadGraph {
    pub fn build(layout: &CityLayout) -> RoadGraph {
        let n = layout.dimension();
        let blocks = layout.grid();

        let mut adjacency = BTreeMap::new();
        for i in 0..n {
            for j in 0..n {
                if is_vertex(blocks, n, i, j) {
                    adjacency.insert((i, j), Vec::new());
                }
            }
        }

        let vertices: Vec<VertexId> = adjacency.keys().copied().collect();
        for (i, j) in vertices {
            let mut found = Vec::new();
            walk(blocks, n, i, j, None, 0, None, &mut found);
            let entry = adjacency.get_mut(&(i, j)).unwrap();
            for edge in found {
                insert_edge(entry, edge);
            }
        }

        RoadGraph { adjacency }
    }

    pub fn vertices(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.adjacency.keys().copied()
    }

    pub fn edges(&self, v: VertexId) -> &[Edge] {
        self.adjacency.get(&v).map(|e| e.as_slice()).unwrap_or(&[])
    }

    /// Dijkstra's algorithm from `source`. Returns the vertex sequence
    /// to `target`, or `None` if it's unreachable. The graphs here are
    /// small (at most a few dozen vertices), so a plain O(V^2) scan for
    /// the next closest vertex is simpler and fast enough — no need for
    /// a binary heap.
    pub fn shortest_path(&self, source: VertexId, target: VertexId) -> Option<Vec<VertexId>> {
        let mut dist: BTreeMap<VertexId, u32> = BTreeMap::new();
        let mut prev: BTreeMap<VertexId, VertexId> = BTreeMap::new();
        let mut unvisited: Vec<VertexId> = self.vertices().collect();

        for v in &unvisited {
            dist.insert(*v, u32::MAX);
        }
        dist.insert(source, 0);

        while !unvisited.is_empty() {
            let (idx, &closest) = unvisited
                .iter()
                .enumerate()
                .min_by_key(|(_, v)| dist[v])?;
            if dist[&closest] == u32::MAX {
                break;
            }
            unvisited.swap_remove(idx);

            for edge in self.edges(closest) {
                if !unvisited.contains(&edge.to) {
                    continue;
                }
                let alt = dist[&closest].saturating_add(edge.distance);
                if alt < dist[&edge.to] {
                    dist.insert(edge.to, alt);
                    prev.insert(edge.to, closest);
                }
            }
        }

        if dist.get(&target).copied().unwrap_or(u32::MAX) == u32::MAX {
            return None;
        }

        let mut path = vec![target];
        let mut cur = target;
        while let Some(&p) = prev.get(&cur) {
            path.push(p);
            cur = p;
        }
        path.reverse();
        Some(path)
    }

    /// The outgoing direction from `from` that leads towards `to`,
    /// looked up from the already-built adjacency.
    pub fn direction_towards(&self, from: VertexId, to: VertexId) -> Option<Direction> {
        self.edges(from).iter().find(|e| e.to == to).map(|e| e.direction)
    }
}

fn is_vertex(blocks: &[Vec<crate::block::Block>], n: usize, i: usize, j: usize) -> bool {
    let b = blocks[i][j];
    if b.weight() > 2 {
        return true;
    }
    let on_border = i == 0 || i == n - 1 || j == 0 || j == n - 1;
    on_border && b.weight() >= 1
}

fn border_forbidden(i: usize, j: usize, n: usize) -> Option<Direction> {
    if i == 0 {
        Some(Direction::Left)
    } else if i == n - 1 {
        Some(Direction::Right)
    } else if j == 0 {
        Some(Direction::Up)
    } else if j == n - 1 {
        Some(Direction::Down)
    } else {
        None
    }
}

#[allow(clippy::too_many_arguments)]
fn walk(
    blocks: &[Vec<crate::block::Block>],
    n: usize,
    i: usize,
    j: usize,
    previous: Option<Direction>,
    counter: u32,
    original_direction: Option<Direction>,
    out: &mut Vec<Edge>,
) {
    let forbidden = border_forbidden(i, j, n);

    if previous.is_some() {
        if forbidden.is_some() {
            out.push(Edge {
                to: (i, j),
                distance: counter,
                direction: original_direction.expect("non-start call always has an origin"),
            });
            return;
        }
        if blocks[i][j].weight() > 2 {
            out.push(Edge {
                to: (i, j),
                distance: counter,
                direction: original_direction.expect("non-start call always has an origin"),
            });
            return;
        }
    }

    let counter = counter + 1;
    for dir in Direction::ALL {
        if !blocks[i][j].has_side(dir) {
            continue;
        }
        if Some(dir) == forbidden || Some(dir) == previous {
            continue;
        }
        let (di, dj) = dir.step();
        let ni = (i as isize + di) as usize;
        let nj = (j as isize + dj) as usize;
        let next_original = original_direction.or(Some(dir));
        walk(blocks, n, ni, nj, Some(dir.opposite()), counter, next_original, out);
    }
}

fn insert_edge(adjacency: &mut Vec<Edge>, new_edge: Edge) {
    if let Some(pos) = adjacency.iter().position(|e| e.to == new_edge.to) {
        let existing = adjacency[pos].distance;
        if new_edge.distance < existing {
            adjacency.remove(pos);
            adjacency.push(new_edge);
        } else if new_edge.distance == existing {
            adjacency.push(new_edge);
        }
        // else: the existing, shorter edge wins; drop the new one.
    } else {
        adjacency.push(new_edge);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_xorshift::XorShiftRng;

    #[test]
    fn every_vertex_has_at_least_one_edge_in_a_small_layout() {
        let mut rng = XorShiftRng::from_seed([3u8; 16]);
        let layout = CityLayout::generate(3, &mut rng).unwrap();
        let graph = RoadGraph::build(&layout);
        for v in graph.vertices() {
            assert!(!graph.edges(v).is_empty(), "vertex {v:?} is isolated");
        }
    }

    #[test]
    fn shortest_path_is_reflexive() {
        let mut rng = XorShiftRng::from_seed([5u8; 16]);
        let layout = CityLayout::generate(5, &mut rng).unwrap();
        let graph = RoadGraph::build(&layout);
        let v = graph.vertices().next().unwrap();
        assert_eq!(graph.shortest_path(v, v), Some(vec![v]));
    }

    #[test]
    fn unreachable_target_returns_none() {
        let mut rng = XorShiftRng::from_seed([7u8; 16]);
        let layout = CityLayout::generate(4, &mut rng).unwrap();
        let graph = RoadGraph::build(&layout);
        let fake = (9999, 9999);
        let v = graph.vertices().next().unwrap();
        assert_eq!(graph.shortest_path(v, fake), None);
    }
}

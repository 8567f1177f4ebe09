use crate::graph::{RoadGraph, VertexId};
use geom::{Pt2D, PATH_RADIUS, TILE_SIZE};

/// The points of entry and exit around the edge of the map, derived
/// from every border vertex in the road graph. Entry and exit points
/// sit `PATH_RADIUS` to either side of the tile's centerline so
/// incoming and outgoing traffic get separate lanes.
#[derive(Clone, Debug)]
pub struct BorderPoints {
    entries: Vec<Pt2D>,
    exits: Vec<Pt2D>,
}

impl BorderPoints {
    pub fn build(graph: &RoadGraph, n: usize) -> BorderPoints {
        let x = TILE_SIZE;
        let r = PATH_RADIUS;
        let limit = n;

        let mut entries = Vec::new();
        let mut exits = Vec::new();

        for (i, j) in border_vertices(graph, n) {
            let (i, j) = (i as f64, j as f64);
            if i as usize == 0 {
                entries.push(Pt2D::new(0.0, j * x + x / 2.0 + r));
                exits.push(Pt2D::new(0.0, j * x + x / 2.0 - r));
            } else if j as usize == 0 {
                entries.push(Pt2D::new(i * x + x / 2.0 - r, 0.0));
                exits.push(Pt2D::new(i * x + x / 2.0 + r, 0.0));
            } else if i as usize == limit - 1 {
                entries.push(Pt2D::new(limit as f64 * x, j * x + x / 2.0 - r));
                exits.push(Pt2D::new(limit as f64 * x, j * x + x / 2.0 + r));
            } else if j as usize == limit - 1 {
                entries.push(Pt2D::new(i * x + x / 2.0 + r, limit as f64 * x));
                exits.push(Pt2D::new(i * x + x / 2.0 - r, limit as f64 * x));
            }
        }

        BorderPoints { entries, exits }
    }

    pub fn entries(&self) -> &[Pt2D] {
        &self.entries
    }

    pub fn exits(&self) -> &[Pt2D] {
        &self.exits
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn border_vertices(graph: &RoadGraph, n: usize) -> Vec<VertexId> {
    graph
        .vertices()
        .filter(|&(i, j)| i == 0 || j == 0 || i == n - 1 || j == n - 1)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::CityLayout;
    use rand::SeedableRng;
    use rand_xorshift::XorShiftRng;

    #[test]
    fn entry_and_exit_counts_match_and_are_nonzero() {
        let mut rng = XorShiftRng::from_seed([9u8; 16]);
        let layout = CityLayout::generate(4, &mut rng).unwrap();
        let graph = RoadGraph::build(&layout);
        let borders = BorderPoints::build(&graph, layout.dimension());
        assert!(!borders.is_empty());
        assert_eq!(borders.entries().len(), borders.exits().len());
    }

    #[test]
    fn entry_and_exit_are_offset_on_opposite_sides_of_the_centerline() {
        let mut rng = XorShiftRng::from_seed([11u8; 16]);
        let layout = CityLayout::generate(4, &mut rng).unwrap();
        let graph = RoadGraph::build(&layout);
        let borders = BorderPoints::build(&graph, layout.dimension());
        for (e, x) in borders.entries().iter().zip(borders.exits()) {
            assert!(geom::distance(*e, *x) > 0.0);
        }
    }
}

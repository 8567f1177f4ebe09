use crate::block::{Block, Direction};
use crate::error::CityMapError;
use rand::Rng;

/// Smallest and largest supported grid dimension. Below 3 there's no
/// room for an interior cell; the hand-placed center templates only go
/// up to 9.
pub const MIN_DIMENSION: usize = 3;
pub const MAX_DIMENSION: usize = 9;

const MAX_RESTARTS: usize = 500;

/// An `n`-by-`n` grid of `Block`s, built by constrained randomized
/// tiling and guaranteed free of "dead loops" (a cycle between
/// intersections with no further intersection along it).
#[derive(Clone, Debug)]
pub struct CityLayout {
    n: usize,
    blocks: Vec<Vec<Block>>,
}

impl CityLayout {
    pub fn dimension(&self) -> usize {
        self.n
    }

    pub fn block(&self, i: usize, j: usize) -> Block {
        self.blocks[i][j]
    }

    pub fn is_on_edge(&self, i: usize, j: usize) -> bool {
        i == 0 || i == self.n - 1 || j == 0 || j == self.n - 1
    }

    pub(crate) fn grid(&self) -> &[Vec<Block>] {
        &self.blocks
    }

    /// Builds a new layout, retrying the fill and dead-loop check as
    /// many times as it takes (bounded; small grids virtually always
    /// converge in a handful of attempts).
    pub fn generate(n: usize, rng: &mut impl Rng) -> anyhow::Result<CityLayout> {
        anyhow::ensure!(
            (MIN_DIMENSION..=MAX_DIMENSION).contains(&n),
            "layout dimension must be between {} and {}, got {}",
            MIN_DIMENSION,
            MAX_DIMENSION,
            n
        );

        for attempt in 0..MAX_RESTARTS {
            match try_fill(n, rng) {
                None => {
                    log::debug!("layout fill failed on attempt {attempt}, retrying");
                }
                Some(blocks) => {
                    if has_dead_loop(&blocks, n) {
                        log::debug!("layout attempt {attempt} produced a dead loop, retrying");
                        continue;
                    }
                    if attempt > 50 {
                        log::warn!("layout generation needed {attempt} restarts for n={n}");
                    }
                    return Ok(CityLayout { n, blocks });
                }
            }
        }
        Err(CityMapError::LayoutInfeasible.into())
    }
}

/// One fill attempt: border, corner connectors, hand-placed center
/// template, then randomized interior cells. Returns `None` if the
/// randomized interior fill paints itself into a corner (no block
/// choice satisfies some cell's constraints).
fn try_fill(n: usize, rng: &mut impl Rng) -> Option<Vec<Vec<Block>>> {
    let mut grid: Vec<Vec<Option<Block>>> = vec![vec![None; n]; n];

    place_border(&mut grid, n);
    place_corner_connectors(&mut grid, n);
    place_center_template(&mut grid, n);

    for i in 1..n - 1 {
        for j in 1..n - 1 {
            if grid[i][j].is_some() {
                continue;
            }
            let right = check_adjacent(grid[i + 1][j], Direction::Left);
            let up = check_adjacent(grid[i][j - 1], Direction::Down);
            let left = check_adjacent(grid[i - 1][j], Direction::Right);
            let down = check_adjacent(grid[i][j + 1], Direction::Up);
            let chosen = find_suitable([right, up, left, down], rng)?;
            grid[i][j] = Some(chosen);
        }
    }

    Some(
        grid.into_iter()
            .map(|row| row.into_iter().map(|b| b.expect("every cell filled")).collect())
            .collect(),
    )
}

fn check_adjacent(neighbor: Option<Block>, side_towards_us: Direction) -> Option<bool> {
    neighbor.map(|b| b.has_side(side_towards_us))
}

fn find_suitable(conditions: [Option<bool>; 4], rng: &mut impl Rng) -> Option<Block> {
    let suitable: Vec<Block> = Block::ALL
        .into_iter()
        .filter(|b| {
            let sides = b.sides();
            Direction::ALL.iter().all(|d| match conditions[d.index()] {
                Some(want) => sides[d.index()] == want,
                None => true,
            })
        })
        .collect();
    if suitable.is_empty() {
        None
    } else {
        Some(suitable[rng.gen_range(0..suitable.len())])
    }
}

fn place_border(grid: &mut [Vec<Option<Block>>], n: usize) {
    use Block::{Lawn, StraightHorizontal, StraightVertical};

    for i in 0..n {
        for j in 0..n {
            if j == 0 {
                grid[i][j] = Some(if i % 2 == 1 { StraightVertical } else { Lawn });
                if i == n - 1 {
                    grid[i][j] = Some(Lawn);
                }
            } else if j == n - 1 && n % 2 == 1 {
                grid[i][j] = Some(if i % 2 == 1 { StraightVertical } else { Lawn });
                if i == 0 || i == n - 1 {
                    grid[i][j] = Some(Lawn);
                }
            } else if j == n - 1 {
                grid[i][j] = Some(if i % 2 == 0 { StraightVertical } else { Lawn });
                if i == 0 || i == n - 1 {
                    grid[i][j] = Some(Lawn);
                }
            }
        }
    }

    for i in 0..n {
        for j in 1..n - 1 {
            if i == 0 && n % 2 == 0 {
                grid[i][j] = Some(if j % 2 == 0 { StraightHorizontal } else { Lawn });
            } else if i == 0 && n % 2 == 1 {
                grid[i][j] = Some(if j % 2 == 1 { StraightHorizontal } else { Lawn });
            } else if i == n - 1 {
                grid[i][j] = Some(if j % 2 == 1 { StraightHorizontal } else { Lawn });
            }
        }
    }
}

fn place_corner_connectors(grid: &mut [Vec<Option<Block>>], n: usize) {
    use Block::{TDownRightUp, TLeftDownRight, TRightUpLeft, TUpLeftDown};

    if n < 6 {
        return;
    }
    if n % 2 == 1 {
        grid[1][1] = Some(TUpLeftDown);
        grid[n - 2][1] = Some(TRightUpLeft);
        grid[1][n - 2] = Some(TLeftDownRight);
        grid[n - 2][n - 2] = Some(TDownRightUp);
    } else {
        grid[1][2] = Some(TUpLeftDown);
        grid[n - 3][1] = Some(TRightUpLeft);
        grid[2][n - 2] = Some(TLeftDownRight);
        grid[n - 2][n - 3] = Some(TDownRightUp);
    }
}

/// Deterministic, hand-placed center tiles for each supported `n`. These
/// exist because a fully random fill in the densest part of the grid
/// produces ugly, overly-braided intersections; the reference engine
/// special-cases them instead of tuning the random search.
fn place_center_template(grid: &mut [Vec<Option<Block>>], n: usize) {
    use Block::*;

    let mut set = |i: usize, j: usize, b: Block| grid[i][j] = Some(b);

    match n {
        4 => {
            set(1, 1, StraightVertical);
            set(1, 2, TRightUpLeft);
            set(2, 1, CornerDownRight);
            set(2, 2, TUpLeftDown);
        }
        5 => {
            set(2, 2, TLeftDownRight);
            set(3, 2, CornerUpLeft);
            set(2, 3, CornerRightUp);
        }
        6 => {
            set(2, 2, CornerRightUp);
            set(2, 3, Lawn);
            set(3, 2, TLeftDownRight);
            set(3, 3, StraightVertical);
        }
        7 => {
            set(2, 2, TLeftDownRight);
            set(2, 4, FourWay);
            set(4, 2, FourWay);
            set(4, 4, TRightUpLeft);
            set(3, 2, StraightHorizontal);
            set(3, 4, StraightHorizontal);
            set(2, 3, StraightVertical);
            set(4, 3, StraightVertical);
            set(3, 3, Lawn);
            set(1, 4, CornerRightUp);
            set(4, 5, Lawn);
            set(3, 5, CornerLeftDown);
        }
        8 => {
            set(1, 1, CornerRightUp);
            set(1, 2, TLeftDownRight);
            set(2, 1, TLeftDownRight);
            set(2, 2, CornerUpLeft);
            set(5, 2, Lawn);
            set(2, 5, Lawn);
            set(3, 3, CornerDownRight);
            set(4, 3, FourWay);
            set(3, 4, CornerUpLeft);
            set(4, 4, StraightVertical);
            set(2, 4, StraightHorizontal);
            set(2, 3, Lawn);
            set(4, 2, StraightVertical);
            set(3, 2, Lawn);
            set(6, 4, StraightVertical);
        }
        9 => {
            set(3, 3, Lawn);
            set(4, 3, StraightVertical);
            set(5, 3, Lawn);
            set(3, 4, StraightHorizontal);
            set(4, 4, FourWay);
            set(5, 4, StraightHorizontal);
            set(3, 5, Lawn);
            set(4, 5, StraightVertical);
            set(5, 5, Lawn);
            set(2, 1, Lawn);
            set(7, 2, Lawn);
            set(1, 6, Lawn);
            set(6, 7, CornerUpLeft);
            set(7, 6, CornerLeftDown);
            set(7, 5, TRightUpLeft);
            set(7, 4, StraightVertical);
            set(2, 3, StraightVertical);
        }
        _ => {}
    }
}

fn has_dead_loop(blocks: &[Vec<Block>], n: usize) -> bool {
    let is_edge = |i: usize, j: usize| i == 0 || i == n - 1 || j == 0 || j == n - 1;
    let mut visited = vec![vec![false; n]; n];
    for (i, row) in visited.iter_mut().enumerate() {
        for (j, v) in row.iter_mut().enumerate() {
            *v = blocks[i][j].weight() == 0 || is_edge(i, j);
        }
    }

    let mut dead = false;
    for i in 1..n - 1 {
        for j in 1..n - 1 {
            if !visited[i][j] {
                dfs(blocks, n, &mut visited, i, j, None, None, &mut dead);
            }
        }
    }
    dead
}

fn dfs(
    blocks: &[Vec<Block>],
    n: usize,
    visited: &mut [Vec<bool>],
    i: usize,
    j: usize,
    loop_start: Option<(usize, usize)>,
    previous: Option<Direction>,
    dead: &mut bool,
) {
    visited[i][j] = true;
    let loop_start = if blocks[i][j].weight() > 2 {
        Some((i, j))
    } else {
        loop_start
    };

    for dir in Direction::ALL {
        if !blocks[i][j].has_side(dir) || Some(dir) == previous {
            continue;
        }
        let (di, dj) = dir.step();
        let ni = i as isize + di;
        let nj = j as isize + dj;
        if ni < 0 || nj < 0 || ni as usize >= n || nj as usize >= n {
            continue;
        }
        let (ni, nj) = (ni as usize, nj as usize);
        if visited[ni][nj] {
            if Some((ni, nj)) == loop_start {
                *dead = true;
            }
        } else {
            dfs(blocks, n, visited, ni, nj, loop_start, Some(dir.opposite()), dead);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_xorshift::XorShiftRng;

    #[test]
    fn generates_every_supported_dimension() {
        for n in MIN_DIMENSION..=MAX_DIMENSION {
            let mut rng = XorShiftRng::from_seed([n as u8; 16]);
            let layout = CityLayout::generate(n, &mut rng).unwrap();
            assert_eq!(layout.dimension(), n);
            assert!(!has_dead_loop(layout.grid(), n));
        }
    }

    #[test]
    fn rejects_dimensions_outside_the_supported_range() {
        let mut rng = XorShiftRng::from_seed([1u8; 16]);
        assert!(CityLayout::generate(2, &mut rng).is_err());
        assert!(CityLayout::generate(10, &mut rng).is_err());
    }

    #[test]
    fn every_road_side_is_matched_by_the_neighbors_opposing_side() {
        let mut rng = XorShiftRng::from_seed([7u8; 16]);
        let layout = CityLayout::generate(7, &mut rng).unwrap();
        let n = layout.dimension();
        for i in 0..n {
            for j in 0..n {
                for dir in Direction::ALL {
                    if !layout.block(i, j).has_side(dir) {
                        continue;
                    }
                    let (di, dj) = dir.step();
                    let ni = i as isize + di;
                    let nj = j as isize + dj;
                    assert!(ni >= 0 && ni < n as isize && nj >= 0 && nj < n as isize);
                    let neighbor = layout.block(ni as usize, nj as usize);
                    assert!(neighbor.has_side(dir.opposite()));
                }
            }
        }
    }

    #[test]
    fn border_tiles_never_point_off_the_grid() {
        let mut rng = XorShiftRng::from_seed([42u8; 16]);
        let layout = CityLayout::generate(6, &mut rng).unwrap();
        let n = layout.dimension();
        for i in 0..n {
            for j in 0..n {
                if i == 0 {
                    assert!(!layout.block(i, j).has_side(Direction::Left));
                }
                if i == n - 1 {
                    assert!(!layout.block(i, j).has_side(Direction::Right));
                }
                if j == 0 {
                    assert!(!layout.block(i, j).has_side(Direction::Up));
                }
                if j == n - 1 {
                    assert!(!layout.block(i, j).has_side(Direction::Down));
                }
            }
        }
    }
}

use serde::{Deserialize, Serialize};

/// Which side of a block a road bit refers to. Matches the layout
/// generator's own indexing: right, up, left, down.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Right = 0,
    Up = 1,
    Left = 2,
    Down = 3,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Right,
        Direction::Up,
        Direction::Left,
        Direction::Down,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(i: usize) -> Direction {
        Direction::ALL[i % 4]
    }

    /// The direction you'd be facing after entering a neighbor from this
    /// side — i.e. the side you just came in through, from the
    /// neighbor's point of view.
    pub fn opposite(self) -> Direction {
        match self {
            Direction::Right => Direction::Left,
            Direction::Up => Direction::Down,
            Direction::Left => Direction::Right,
            Direction::Down => Direction::Up,
        }
    }

    /// Offset applied to a grid index to step one tile in this direction.
    /// `i` grows to the right, `j` grows downward, matching the original
    /// layout's row/column convention.
    pub fn step(self) -> (isize, isize) {
        match self {
            Direction::Right => (1, 0),
            Direction::Up => (0, -1),
            Direction::Left => (-1, 0),
            Direction::Down => (0, 1),
        }
    }
}

/// A single city tile: which of its four sides has road access. There
/// are exactly 12 legal combinations — a lone bit set (a dead end) is
/// never produced by the generator and has no variant here.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Block {
    /// No road access on any side — a lawn tile.
    Lawn,
    StraightHorizontal,
    StraightVertical,
    CornerRightUp,
    CornerUpLeft,
    CornerLeftDown,
    CornerDownRight,
    TRightUpLeft,
    TUpLeftDown,
    TLeftDownRight,
    TDownRightUp,
    FourWay,
}

impl Block {
    /// All 12 legal variants, in the order the reference layout
    /// generator enumerates them.
    pub const ALL: [Block; 12] = [
        Block::Lawn,
        Block::StraightHorizontal,
        Block::StraightVertical,
        Block::CornerRightUp,
        Block::CornerUpLeft,
        Block::CornerLeftDown,
        Block::CornerDownRight,
        Block::TRightUpLeft,
        Block::TUpLeftDown,
        Block::TLeftDownRight,
        Block::TDownRightUp,
        Block::FourWay,
    ];

    /// The four road-access bits, indexed by `Direction::index()`.
    pub fn sides(self) -> [bool; 4] {
        match self {
            Block::Lawn => [false, false, false, false],
            Block::StraightHorizontal => [true, false, true, false],
            Block::StraightVertical => [false, true, false, true],
            Block::CornerRightUp => [true, true, false, false],
            Block::CornerUpLeft => [false, true, true, false],
            Block::CornerLeftDown => [false, false, true, true],
            Block::CornerDownRight => [true, false, false, true],
            Block::TRightUpLeft => [true, true, true, false],
            Block::TUpLeftDown => [false, true, true, true],
            Block::TLeftDownRight => [true, false, true, true],
            Block::TDownRightUp => [true, true, false, true],
            Block::FourWay => [true, true, true, true],
        }
    }

    pub fn has_side(self, dir: Direction) -> bool {
        self.sides()[dir.index()]
    }

    /// Number of sides with road access. Vertices in the road graph are
    /// exactly the tiles with weight greater than 2.
    pub fn weight(self) -> u8 {
        self.sides().iter().filter(|b| **b).count() as u8
    }

    pub fn from_sides(sides: [bool; 4]) -> Option<Block> {
        Block::ALL.into_iter().find(|b| b.sides() == sides)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_variant_round_trips_through_its_sides() {
        for b in Block::ALL {
            assert_eq!(Block::from_sides(b.sides()), Some(b));
        }
    }

    #[test]
    fn dead_end_combinations_are_not_legal_blocks() {
        assert_eq!(Block::from_sides([true, false, false, false]), None);
    }

    #[test]
    fn four_way_is_the_only_weight_four_block() {
        assert_eq!(
            Block::ALL.iter().filter(|b| b.weight() == 4).count(),
            1
        );
    }
}

//! The four lattice directions and their wall bits.

use super::cell::CellFlags;

/// A 4-connected lattice direction. North is `y - 1` (row 0 is the top row).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Direction {
    North = 0, // (x, y-1)
    East  = 1, // (x+1, y)
    South = 2, // (x, y+1)
    West  = 3, // (x-1, y)
}

impl Direction {
    /// Fixed enumeration order, also the tie-break order of every algorithm.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// The coordinate offset for this direction.
    #[inline]
    pub const fn offset(self) -> (i64, i64) {
        match self {
            Direction::North => (0, -1),
            Direction::East  => (1, 0),
            Direction::South => (0, 1),
            Direction::West  => (-1, 0),
        }
    }

    /// The opposite direction (the paired wall on the neighbour).
    #[inline]
    pub const fn reverse(self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::East  => Direction::West,
            Direction::South => Direction::North,
            Direction::West  => Direction::East,
        }
    }

    /// Quarter turn counter-clockwise.
    #[inline]
    pub const fn turn_left(self) -> Direction {
        Self::from_index(self.index() + 3)
    }

    /// Quarter turn clockwise.
    #[inline]
    pub const fn turn_right(self) -> Direction {
        Self::from_index(self.index() + 1)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Direction for an index, taken modulo 4.
    #[inline]
    pub const fn from_index(index: usize) -> Direction {
        match index & 3 {
            0 => Direction::North,
            1 => Direction::East,
            2 => Direction::South,
            _ => Direction::West,
        }
    }

    /// The wall flag guarding this side of a cell.
    #[inline]
    pub const fn wall(self) -> CellFlags {
        match self {
            Direction::North => CellFlags::NORTH,
            Direction::East  => CellFlags::EAST,
            Direction::South => CellFlags::SOUTH,
            Direction::West  => CellFlags::WEST,
        }
    }

    #[inline]
    pub const fn wall_bit(self) -> u8 {
        self.wall().bits()
    }

    /// Parse a single wall bit (`1`, `2`, `4` or `8`).
    pub const fn from_wall_bit(bit: u8) -> Option<Direction> {
        match bit {
            0x01 => Some(Direction::North),
            0x02 => Some(Direction::East),
            0x04 => Some(Direction::South),
            0x08 => Some(Direction::West),
            _ => None,
        }
    }
}

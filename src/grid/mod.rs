//! The lattice data model: cells, directions and dense scratch maps.

mod cell;
mod direction;
mod scratch;

pub(crate) use cell::open_raw;
pub use cell::{CellFlags, CellGrid, Neighbors, Pos};
pub use direction::Direction;
pub use scratch::{BitSet, DistanceMap, ParentMap};

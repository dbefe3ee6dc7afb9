//! Post-processing applied between generation and solving.

mod braid;
mod stats;

pub use braid::braid;
pub use stats::MazeStats;

use serde::Serialize;

use crate::grid::CellGrid;

/// Structural census of a carved grid, by wall count per cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MazeStats {
    /// Exactly three walls.
    pub dead_ends: usize,
    /// Exactly two walls.
    pub corridors: usize,
    /// One wall or none.
    pub junctions: usize,
    /// All four walls; unreachable from anywhere.
    pub sealed: usize,
    pub total: usize,
}

impl MazeStats {
    pub fn collect(grid: &CellGrid) -> Self {
        let mut stats = MazeStats {
            total: grid.len(),
            ..Default::default()
        };
        for idx in 0..grid.len() {
            match grid.walls_at(idx) {
                4 => stats.sealed += 1,
                3 => stats.dead_ends += 1,
                2 => stats.corridors += 1,
                _ => stats.junctions += 1,
            }
        }
        stats
    }

    pub fn dead_end_percent(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.dead_ends as f64 * 100.0 / self.total as f64
    }
}

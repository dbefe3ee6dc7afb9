use log::info;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::error::{MazeError, Result};
use crate::grid::{CellGrid, Direction};

/// Remove a fraction of the dead ends by knocking out one extra wall each.
///
/// Dead ends are collected once and shuffled; the first `round(factor * n)`
/// are processed in that order. A candidate whose wall count dropped below
/// three because a neighbour's carve already reached it is skipped. Returns
/// the number of carves made.
pub fn braid(grid: &mut CellGrid, factor: f64, seed: u64) -> Result<usize> {
    if !(0.0..=1.0).contains(&factor) {
        return Err(MazeError::InvalidBraidFactor(factor));
    }

    let mut dead_ends: Vec<u32> = (0..grid.len())
        .filter(|&idx| grid.walls_at(idx) == 3)
        .map(|idx| idx as u32)
        .collect();
    let found = dead_ends.len();
    let take = (factor * found as f64).round() as usize;
    if take == 0 {
        return Ok(0);
    }

    let mut rng = StdRng::seed_from_u64(seed);
    dead_ends.shuffle(&mut rng);

    let mut closed = [Direction::North; 4];
    let mut carved = 0;
    for &idx in &dead_ends[..take.min(found)] {
        let idx = idx as usize;
        if grid.walls_at(idx) != 3 {
            continue;
        }
        let mut n = 0;
        for dir in Direction::ALL {
            if grid.has_flag(idx, dir.wall()) && grid.neighbor_at(idx, dir).is_some() {
                closed[n] = dir;
                n += 1;
            }
        }
        if n == 0 {
            continue;
        }
        let dir = closed[rng.random_range(0..n)];
        if grid.carve_at(idx, dir) {
            carved += 1;
        }
    }

    info!("braid: factor {factor}, {found} dead ends, {carved} walls removed");
    Ok(carved)
}

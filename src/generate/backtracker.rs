//! Randomised depth-first carving with an explicit stack.

use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::Result;
use crate::grid::{CellFlags, CellGrid, Direction, Pos, open_raw};
use crate::step::{GenStatus, check_grid};

pub struct Backtracker {
    width: u32,
    height: u32,
    start: u32,
    quota: usize,
    seed: u64,
    rng: StdRng,
    stack: Vec<u32>,
    started: bool,
}

impl Backtracker {
    /// Validates `start` against `grid`; the grid itself is not touched
    /// until the first `step`.
    pub fn new(grid: &CellGrid, start: Pos, seed: u64, quota: usize) -> Result<Self> {
        let start = grid.index_of(start)? as u32;
        Ok(Self {
            width: grid.width(),
            height: grid.height(),
            start,
            quota: quota.max(1),
            seed,
            rng: StdRng::seed_from_u64(seed),
            stack: Vec::new(),
            started: false,
        })
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn step(&mut self, grid: &mut CellGrid) -> Result<GenStatus> {
        check_grid(grid, self.width, self.height)?;
        if !self.started {
            self.started = true;
            let start = self.start as usize;
            debug!("dfs: {}x{} from {}", self.width, self.height, grid.pos_of(start));
            grid.set_mark(start, CellFlags::CARVED);
            self.stack.push(self.start);
        }

        let mut candidates = [Direction::North; 4];
        for _ in 0..self.quota {
            let Some(&top) = self.stack.last() else {
                break;
            };
            let top = top as usize;
            let mut n = 0;
            for dir in Direction::ALL {
                if let Some(next) = grid.neighbor_at(top, dir) {
                    if !grid.has_flag(next, CellFlags::CARVED) {
                        candidates[n] = dir;
                        n += 1;
                    }
                }
            }
            if n == 0 {
                self.stack.pop();
                continue;
            }
            let dir = candidates[self.rng.random_range(0..n)];
            if let Some(next) = grid.neighbor_at(top, dir) {
                grid.carve_at(top, dir);
                grid.set_mark(next, CellFlags::CARVED);
                self.stack.push(next as u32);
            }
        }

        if self.stack.is_empty() {
            debug!("dfs: done");
            Ok(GenStatus::Done)
        } else {
            Ok(GenStatus::Running)
        }
    }
}

/// Carve a perfect maze inside one rectangular region of a raw row band.
///
/// `cells` is a band of whole rows `row_width` cells wide; the region spans
/// columns `x0..x0 + w` and every row of the band. Carving starts at the
/// region's top-left cell and never crosses the region boundary.
pub(crate) fn carve_region(
    cells: &mut [u8],
    row_width: usize,
    x0: usize,
    w: usize,
    rng: &mut StdRng,
) {
    let h = cells.len() / row_width;
    if w == 0 || h == 0 {
        return;
    }
    let at = |lx: usize, ly: usize| ly * row_width + x0 + lx;
    let carved = CellFlags::CARVED.bits();

    let mut stack: Vec<u32> = Vec::with_capacity(w * h);
    cells[at(0, 0)] |= carved;
    stack.push(0);

    let mut candidates = [(Direction::North, 0usize); 4];
    while let Some(&top) = stack.last() {
        let (lx, ly) = (top as usize % w, top as usize / w);
        let mut n = 0;
        for dir in Direction::ALL {
            let next = match dir {
                Direction::North if ly > 0 => (lx, ly - 1),
                Direction::South if ly + 1 < h => (lx, ly + 1),
                Direction::West if lx > 0 => (lx - 1, ly),
                Direction::East if lx + 1 < w => (lx + 1, ly),
                _ => continue,
            };
            if cells[at(next.0, next.1)] & carved == 0 {
                candidates[n] = (dir, next.1 * w + next.0);
                n += 1;
            }
        }
        if n == 0 {
            stack.pop();
            continue;
        }
        let (dir, next) = candidates[rng.random_range(0..n)];
        let (nx, ny) = (next % w, next / w);
        open_raw(cells, at(lx, ly), at(nx, ny), dir);
        cells[at(nx, ny)] |= carved;
        stack.push(next as u32);
    }
}

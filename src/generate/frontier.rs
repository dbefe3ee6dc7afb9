//! Randomised frontier growth (Prim-like).

use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::Result;
use crate::grid::{BitSet, CellFlags, CellGrid, Direction, Pos};
use crate::step::{GenStatus, check_grid};

pub struct Frontier {
    width: u32,
    height: u32,
    start: u32,
    quota: usize,
    seed: u64,
    rng: StdRng,
    /// Unvisited cells adjacent to the carved region.
    frontier: Vec<u32>,
    members: BitSet,
    started: bool,
}

impl Frontier {
    pub fn new(grid: &CellGrid, start: Pos, seed: u64, quota: usize) -> Result<Self> {
        let start = grid.index_of(start)? as u32;
        Ok(Self {
            width: grid.width(),
            height: grid.height(),
            start,
            quota: quota.max(1),
            seed,
            rng: StdRng::seed_from_u64(seed),
            frontier: Vec::new(),
            members: BitSet::new(grid.len()),
            started: false,
        })
    }

    fn visit(&mut self, grid: &mut CellGrid, idx: usize) {
        grid.set_mark(idx, CellFlags::CARVED);
        for dir in Direction::ALL {
            if let Some(next) = grid.neighbor_at(idx, dir) {
                if !grid.has_flag(next, CellFlags::CARVED) && !self.members.test_and_set(next) {
                    self.frontier.push(next as u32);
                }
            }
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn step(&mut self, grid: &mut CellGrid) -> Result<GenStatus> {
        check_grid(grid, self.width, self.height)?;
        if !self.started {
            self.started = true;
            debug!(
                "prim: {}x{} from {}",
                self.width,
                self.height,
                grid.pos_of(self.start as usize)
            );
            self.visit(grid, self.start as usize);
        }

        let mut carved = [Direction::North; 4];
        for _ in 0..self.quota {
            if self.frontier.is_empty() {
                break;
            }
            let pick = self.rng.random_range(0..self.frontier.len());
            let cell = self.frontier.swap_remove(pick) as usize;
            self.members.remove(cell);

            let mut n = 0;
            for dir in Direction::ALL {
                if let Some(next) = grid.neighbor_at(cell, dir) {
                    if grid.has_flag(next, CellFlags::CARVED) {
                        carved[n] = dir;
                        n += 1;
                    }
                }
            }
            // Every frontier cell was queued by a carved neighbour.
            debug_assert!(n > 0);
            if n > 0 {
                let dir = carved[self.rng.random_range(0..n)];
                grid.carve_at(cell, dir);
            }
            self.visit(grid, cell);
        }

        if self.frontier.is_empty() {
            debug!("prim: done");
            Ok(GenStatus::Done)
        } else {
            Ok(GenStatus::Running)
        }
    }
}

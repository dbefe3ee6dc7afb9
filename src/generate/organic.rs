//! Organic walker carver.
//!
//! A population of random walkers grows one spanning tree outward from a
//! seed cell. Each round, every live walker picks an uncarved neighbour on
//! the rayon pool, reading the grid as it stood when the round began; the
//! picks are then applied in walker order, so two walkers racing for one
//! cell resolve the same way on any thread count. A walker with no uncarved
//! neighbour dies. Dead walkers are revived on frontier cells (uncarved, next
//! to the carved region), each joined to the tree by a single passage.

use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use super::blocks::{mix_seed, splitmix64};
use crate::error::Result;
use crate::grid::{CellFlags, CellGrid, Direction, Pos};
use crate::step::{GenStatus, check_grid};

/// Rounds between revival passes while some walkers are still alive.
const RESPAWN_INTERVAL: u64 = 10;
const RESPAWN_SALT: u64 = 0x3c6e_f372_fe94_f82b;

const CARVED: u8 = CellFlags::CARVED.bits();

/// Index arithmetic over raw cell bytes, shareable with pool workers.
#[derive(Clone, Copy, Debug)]
struct Lattice {
    width: usize,
    height: usize,
}

impl Lattice {
    #[inline]
    fn neighbor(self, idx: usize, dir: Direction) -> Option<usize> {
        let x = idx % self.width;
        let y = idx / self.width;
        match dir {
            Direction::North => (y > 0).then(|| idx - self.width),
            Direction::East => (x + 1 < self.width).then(|| idx + 1),
            Direction::South => (y + 1 < self.height).then(|| idx + self.width),
            Direction::West => (x > 0).then(|| idx - 1),
        }
    }

    /// First neighbour, scanning N, E, S, W from a random rotation, whose
    /// carved bit equals `carved`.
    fn pick(
        self,
        cells: &[u8],
        idx: usize,
        carved: bool,
        rng: &mut StdRng,
    ) -> Option<(usize, Direction)> {
        let first = rng.random_range(0..4);
        (0..4).find_map(|k| {
            let dir = Direction::from_index(first + k);
            self.neighbor(idx, dir)
                .filter(|&n| (cells[n] & CARVED != 0) == carved)
                .map(|n| (n, dir))
        })
    }

    fn on_frontier(self, cells: &[u8], idx: usize) -> bool {
        cells[idx] & CARVED == 0
            && Direction::ALL.into_iter().any(|dir| {
                self.neighbor(idx, dir)
                    .is_some_and(|n| cells[n] & CARVED != 0)
            })
    }
}

struct Walker {
    cell: Option<u32>,
    rng: StdRng,
}

pub struct Organic {
    width: u32,
    height: u32,
    lattice: Lattice,
    start: usize,
    seed: u64,
    quota: usize,
    pool: rayon::ThreadPool,
    walkers: Vec<Walker>,
    rng: StdRng,
    carved: usize,
    round: u64,
    started: bool,
    done: bool,
}

impl Organic {
    pub fn new(
        grid: &CellGrid,
        start: Pos,
        seed: u64,
        walkers: usize,
        quota: usize,
        threads: usize,
    ) -> Result<Self> {
        let start = grid.index_of(start)?;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads.max(1))
            .build()?;
        let walkers = (0..walkers.max(1) as u64)
            .map(|i| Walker {
                cell: None,
                rng: StdRng::seed_from_u64(mix_seed(seed, i, 0)),
            })
            .collect();
        Ok(Self {
            width: grid.width(),
            height: grid.height(),
            lattice: Lattice {
                width: grid.width() as usize,
                height: grid.height() as usize,
            },
            start,
            seed,
            quota: quota.max(1),
            pool,
            walkers,
            rng: StdRng::seed_from_u64(splitmix64(seed ^ RESPAWN_SALT)),
            carved: 0,
            round: 0,
            started: false,
            done: false,
        })
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Run rounds until at least `quota` cells were carved or the grid is
    /// complete.
    pub fn step(&mut self, grid: &mut CellGrid) -> Result<GenStatus> {
        check_grid(grid, self.width, self.height)?;
        if self.done {
            return Ok(GenStatus::Done);
        }
        if !self.started {
            grid.set_mark(self.start, CellFlags::CARVED);
            self.carved = 1;
            self.walkers[0].cell = Some(self.start as u32);
            self.started = true;
            debug!(
                "organic: {} walkers from {} on {} threads",
                self.walkers.len(),
                grid.pos_of(self.start),
                self.threads()
            );
        }

        let total = grid.len();
        let mut budget = self.quota;
        while self.carved < total && budget > 0 {
            let carved = self.walk(grid) + self.respawn(grid);
            self.carved += carved;
            self.round += 1;
            budget = budget.saturating_sub(carved.max(1));
        }

        if self.carved < total {
            return Ok(GenStatus::Running);
        }
        info!(
            "organic: {}x{} done in {} rounds",
            self.width, self.height, self.round
        );
        self.done = true;
        Ok(GenStatus::Done)
    }

    /// One move per live walker. Returns the number of cells carved.
    fn walk(&mut self, grid: &mut CellGrid) -> usize {
        let lattice = self.lattice;
        let walkers = &mut self.walkers;
        let cells = grid.cells();
        let moves: Vec<Option<(usize, usize, Direction)>> = self.pool.install(|| {
            walkers
                .par_iter_mut()
                .map(|walker| {
                    let from = walker.cell? as usize;
                    match lattice.pick(cells, from, false, &mut walker.rng) {
                        Some((to, dir)) => Some((from, to, dir)),
                        None => {
                            walker.cell = None;
                            None
                        }
                    }
                })
                .collect()
        });

        let mut carved = 0;
        for (i, step) in moves.into_iter().enumerate() {
            let Some((from, to, dir)) = step else {
                continue;
            };
            // Taken by an earlier walker this round; retry next round.
            if grid.has_flag(to, CellFlags::CARVED) {
                continue;
            }
            grid.carve_at(from, dir);
            grid.set_mark(to, CellFlags::CARVED);
            self.walkers[i].cell = Some(to as u32);
            carved += 1;
        }
        carved
    }

    /// Revive dead walkers on frontier cells. Runs every `RESPAWN_INTERVAL`
    /// rounds, and on every round once the whole population is dead.
    fn respawn(&mut self, grid: &mut CellGrid) -> usize {
        let dead = self.walkers.iter().filter(|w| w.cell.is_none()).count();
        let alive = self.walkers.len() - dead;
        if dead == 0 || (alive > 0 && self.round % RESPAWN_INTERVAL != 0) {
            return 0;
        }

        let lattice = self.lattice;
        let cells = grid.cells();
        let frontier: Vec<u32> = self.pool.install(|| {
            cells
                .par_chunks(lattice.width)
                .enumerate()
                .flat_map_iter(|(y, row)| {
                    (0..row.len())
                        .map(move |x| y * lattice.width + x)
                        .filter(move |&idx| lattice.on_frontier(cells, idx))
                        .map(|idx| idx as u32)
                })
                .collect()
        });
        if frontier.is_empty() {
            return 0;
        }

        let mut revived = 0;
        for walker in self.walkers.iter_mut().filter(|w| w.cell.is_none()) {
            let cell = frontier[self.rng.random_range(0..frontier.len())] as usize;
            if grid.has_flag(cell, CellFlags::CARVED) {
                continue;
            }
            let Some((_, dir)) = lattice.pick(grid.cells(), cell, true, &mut self.rng) else {
                continue;
            };
            grid.carve_at(cell, dir);
            grid.set_mark(cell, CellFlags::CARVED);
            walker.cell = Some(cell as u32);
            revived += 1;
        }
        debug!(
            "organic: round {}, {} frontier cells, {} walkers revived",
            self.round,
            frontier.len(),
            revived
        );
        revived
    }
}

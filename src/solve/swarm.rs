use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::Progress;
use super::path::walk_parents;
use crate::grid::{CellFlags, CellGrid, Direction, ParentMap};

/// A fixed crowd of random walkers sharing one visited set. A walker with no
/// unvisited open neighbour dies; the run is `Stuck` once all are dead.
pub(crate) struct Swarm {
    start: usize,
    end: usize,
    walkers: Vec<Option<u32>>,
    /// Next walker to move; walkers take turns one move at a time.
    turn: usize,
    rng: StdRng,
    parents: ParentMap,
}

impl Swarm {
    pub(crate) fn new(
        grid: &mut CellGrid,
        start: usize,
        end: usize,
        walkers: usize,
        seed: u64,
    ) -> Self {
        grid.set_mark(start, CellFlags::SCANNED);
        Self {
            start,
            end,
            walkers: vec![Some(start as u32); walkers.max(1)],
            turn: 0,
            rng: StdRng::seed_from_u64(seed),
            parents: ParentMap::new(grid.len()),
        }
    }

    pub(crate) fn advance(&mut self, grid: &mut CellGrid, quota: usize) -> Progress {
        let mut options = [(Direction::North, 0usize); 4];
        for _ in 0..quota {
            if self.walkers.iter().all(Option::is_none) {
                return Progress::Stuck;
            }
            let slot = self.turn;
            self.turn = (self.turn + 1) % self.walkers.len();
            let Some(cur) = self.walkers[slot] else {
                continue;
            };
            let cur = cur as usize;

            let mut n = 0;
            for dir in Direction::ALL {
                if let Some(next) = grid.open_at(cur, dir) {
                    if !grid.has_flag(next, CellFlags::SCANNED) {
                        options[n] = (dir, next);
                        n += 1;
                    }
                }
            }
            if n == 0 {
                self.walkers[slot] = None;
                continue;
            }
            let (dir, next) = options[self.rng.random_range(0..n)];
            grid.set_mark(next, CellFlags::SCANNED);
            self.parents.set(next, dir.reverse());
            self.walkers[slot] = Some(next as u32);

            if next == self.end {
                return match walk_parents(grid, &self.parents, self.start, next) {
                    Some(path) => Progress::Found(path),
                    None => Progress::Stuck,
                };
            }
        }
        Progress::Running
    }
}

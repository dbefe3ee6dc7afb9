//! Dead-end filling by topological peeling.
//!
//! Leaves (one open passage, not an endpoint) are filled in rounds; filling
//! a leaf lowers its neighbour's degree, and a neighbour that drops to one
//! joins the next round. What survives is every cell on some simple path
//! between junctions or endpoints, reported in scanline order. On a perfect
//! maze that is exactly the solution corridor.
//!
//! Filled cells carry `SCAN_AUX`; the final connectivity check marks the
//! survivors it reaches with `SCANNED`.

use std::collections::VecDeque;

use log::trace;

use super::Progress;
use crate::grid::{CellFlags, CellGrid, Direction};

enum Phase {
    /// Computing degrees; the cursor is the next cell index.
    Degrees { cursor: usize },
    Peel,
    /// Collecting survivors; the cursor is the next cell index.
    Collect { cursor: usize },
    /// Checking that start reaches end through survivors.
    Verify { queue: VecDeque<u32> },
}

pub(crate) struct DeadEndFiller {
    start: usize,
    end: usize,
    degree: Vec<u8>,
    round: Vec<u32>,
    next_round: Vec<u32>,
    survivors: Vec<usize>,
    phase: Phase,
    rounds: usize,
}

impl DeadEndFiller {
    pub(crate) fn new(grid: &mut CellGrid, start: usize, end: usize) -> Self {
        Self {
            start,
            end,
            degree: vec![0; grid.len()],
            round: Vec::new(),
            next_round: Vec::new(),
            survivors: Vec::new(),
            phase: Phase::Degrees { cursor: 0 },
            rounds: 0,
        }
    }

    #[inline]
    fn is_endpoint(&self, idx: usize) -> bool {
        idx == self.start || idx == self.end
    }

    fn fill(&mut self, grid: &mut CellGrid, idx: usize) {
        grid.set_mark(idx, CellFlags::SCAN_AUX);
        self.next_round.push(idx as u32);
    }

    pub(crate) fn advance(&mut self, grid: &mut CellGrid, quota: usize) -> Progress {
        let mut budget = quota;
        while budget > 0 {
            match &mut self.phase {
                Phase::Degrees { cursor } => {
                    let from = *cursor;
                    let to = (from + budget).min(grid.len());
                    *cursor = to;
                    budget -= to - from;
                    for idx in from..to {
                        let degree = 4 - grid.walls_at(idx) as u8;
                        self.degree[idx] = degree;
                        if degree == 1 && !self.is_endpoint(idx) {
                            self.fill(grid, idx);
                        }
                    }
                    if to == grid.len() {
                        self.phase = Phase::Peel;
                    }
                }
                Phase::Peel => {
                    if self.round.is_empty() {
                        if self.next_round.is_empty() {
                            trace!("deadend: peeled in {} rounds", self.rounds);
                            self.phase = Phase::Collect { cursor: 0 };
                            continue;
                        }
                        std::mem::swap(&mut self.round, &mut self.next_round);
                        self.rounds += 1;
                    }
                    let Some(leaf) = self.round.pop() else {
                        continue;
                    };
                    budget -= 1;
                    let leaf = leaf as usize;
                    for dir in Direction::ALL {
                        let Some(n) = grid.open_at(leaf, dir) else {
                            continue;
                        };
                        if grid.has_flag(n, CellFlags::SCAN_AUX) {
                            continue;
                        }
                        self.degree[n] = self.degree[n].saturating_sub(1);
                        if self.degree[n] <= 1 && !self.is_endpoint(n) {
                            self.fill(grid, n);
                        }
                    }
                }
                Phase::Collect { cursor } => {
                    let from = *cursor;
                    let to = (from + budget).min(grid.len());
                    *cursor = to;
                    budget -= to - from;
                    for idx in from..to {
                        if !grid.has_flag(idx, CellFlags::SCAN_AUX) && grid.walls_at(idx) < 4 {
                            self.survivors.push(idx);
                        }
                    }
                    if to == grid.len() {
                        let ends_survive = [self.start, self.end]
                            .iter()
                            .all(|&e| self.survivors.binary_search(&e).is_ok());
                        if !ends_survive {
                            return Progress::Unreachable;
                        }
                        grid.set_mark(self.start, CellFlags::SCANNED);
                        self.phase = Phase::Verify {
                            queue: VecDeque::from([self.start as u32]),
                        };
                    }
                }
                Phase::Verify { queue } => {
                    let Some(cur) = queue.pop_front() else {
                        return Progress::Unreachable;
                    };
                    budget -= 1;
                    let cur = cur as usize;
                    if cur == self.end {
                        return Progress::Found(std::mem::take(&mut self.survivors));
                    }
                    for dir in Direction::ALL {
                        let Some(n) = grid.open_at(cur, dir) else {
                            continue;
                        };
                        if !grid.has_flag(n, CellFlags::SCAN_AUX | CellFlags::SCANNED) {
                            grid.set_mark(n, CellFlags::SCANNED);
                            queue.push_back(n as u32);
                        }
                    }
                }
            }
        }
        Progress::Running
    }
}

//! Uniform-cost search and A* over unit-cost passages.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use log::trace;

use super::Progress;
use super::path::walk_parents;
use crate::grid::{CellFlags, CellGrid, Direction, DistanceMap, ParentMap, Pos};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Heuristic {
    /// Uniform-cost search.
    Zero,
    /// A*; admissible and consistent on a 4-connected unit lattice.
    Manhattan,
}

impl Heuristic {
    #[inline]
    pub(crate) fn estimate(self, from: Pos, to: Pos) -> u32 {
        match self {
            Heuristic::Zero => 0,
            Heuristic::Manhattan => from.manhattan(to),
        }
    }
}

/// A heap entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Node {
    pub(crate) f: u32,
    pub(crate) g: u32,
    pub(crate) idx: u32,
}

impl Ord for Node {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap behavior; equal costs fall back to
        // the lower cell index so runs are reproducible.
        other
            .f
            .cmp(&self.f)
            .then_with(|| other.idx.cmp(&self.idx))
            .then_with(|| other.g.cmp(&self.g))
    }
}

impl PartialOrd for Node {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

pub(crate) struct BestFirst {
    start: usize,
    end: usize,
    goal: Pos,
    heuristic: Heuristic,
    open: BinaryHeap<Node>,
    dist: DistanceMap,
    parents: ParentMap,
    expanded: usize,
}

impl BestFirst {
    pub(crate) fn new(grid: &mut CellGrid, start: usize, end: usize, heuristic: Heuristic) -> Self {
        let goal = grid.pos_of(end);
        let mut dist = DistanceMap::new(grid.len());
        dist.set(start, 0);
        let mut open = BinaryHeap::new();
        open.push(Node {
            f: heuristic.estimate(grid.pos_of(start), goal),
            g: 0,
            idx: start as u32,
        });
        Self {
            start,
            end,
            goal,
            heuristic,
            open,
            dist,
            parents: ParentMap::new(grid.len()),
            expanded: 0,
        }
    }

    pub(crate) fn advance(&mut self, grid: &mut CellGrid, quota: usize) -> Progress {
        for _ in 0..quota {
            let Some(node) = self.open.pop() else {
                return Progress::Unreachable;
            };
            let cur = node.idx as usize;
            // Stale entry: a cheaper route was pushed after this one.
            if self.dist.get(cur).is_some_and(|d| node.g > d) {
                continue;
            }
            if grid.has_flag(cur, CellFlags::SCANNED) {
                continue;
            }
            grid.set_mark(cur, CellFlags::SCANNED);
            self.expanded += 1;

            if cur == self.end {
                trace!("best-first: goal popped after {} expansions", self.expanded);
                return match walk_parents(grid, &self.parents, self.start, cur) {
                    Some(path) => Progress::Found(path),
                    None => Progress::Unreachable,
                };
            }

            let g = node.g + 1;
            for dir in Direction::ALL {
                let Some(next) = grid.open_at(cur, dir) else {
                    continue;
                };
                if grid.has_flag(next, CellFlags::SCANNED) {
                    continue;
                }
                if self.dist.relax(next, g) {
                    self.parents.set(next, dir.reverse());
                    self.open.push(Node {
                        f: g + self.heuristic.estimate(grid.pos_of(next), self.goal),
                        g,
                        idx: next as u32,
                    });
                }
            }
        }
        Progress::Running
    }
}

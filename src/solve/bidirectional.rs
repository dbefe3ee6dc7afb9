//! Bidirectional A*: one search from each endpoint, expanded alternately,
//! stopping at the first cell either side finds already claimed by the other.
//!
//! The meeting rule does not prove optimality; on perfect mazes the path is
//! the unique one, on braided mazes it is usually but not always shortest.

use std::collections::BinaryHeap;

use log::trace;

use super::Progress;
use super::best_first::Node;
use super::path::walk_parents;
use crate::grid::{CellFlags, CellGrid, Direction, DistanceMap, ParentMap, Pos};

struct Side {
    root: usize,
    goal: Pos,
    mark: CellFlags,
    open: BinaryHeap<Node>,
    dist: DistanceMap,
    parents: ParentMap,
}

impl Side {
    fn new(grid: &mut CellGrid, root: usize, goal: usize, mark: CellFlags) -> Self {
        let goal = grid.pos_of(goal);
        let mut dist = DistanceMap::new(grid.len());
        dist.set(root, 0);
        let mut open = BinaryHeap::new();
        open.push(Node {
            f: grid.pos_of(root).manhattan(goal),
            g: 0,
            idx: root as u32,
        });
        grid.set_mark(root, mark);
        Self {
            root,
            goal,
            mark,
            open,
            dist,
            parents: ParentMap::new(grid.len()),
        }
    }

    /// Expand one node. `Err(())` when the heap is exhausted, `Ok(Some(m))`
    /// when cell `m` is claimed by both sides.
    fn expand(&mut self, grid: &mut CellGrid, other: CellFlags) -> Result<Option<usize>, ()> {
        loop {
            let node = self.open.pop().ok_or(())?;
            let cur = node.idx as usize;
            if self.dist.get(cur).is_some_and(|d| node.g > d) {
                continue;
            }
            if grid.has_flag(cur, other) {
                return Ok(Some(cur));
            }
            if !grid.has_flag(cur, self.mark) {
                grid.set_mark(cur, self.mark);
            }

            let g = node.g + 1;
            for dir in Direction::ALL {
                let Some(next) = grid.open_at(cur, dir) else {
                    continue;
                };
                if self.dist.relax(next, g) {
                    self.parents.set(next, dir.reverse());
                    self.open.push(Node {
                        f: g + grid.pos_of(next).manhattan(self.goal),
                        g,
                        idx: next as u32,
                    });
                }
                if grid.has_flag(next, other) && (next == self.root || self.parents.has_parent(next)) {
                    return Ok(Some(next));
                }
            }
            return Ok(None);
        }
    }
}

pub(crate) struct Bidirectional {
    forward: Side,
    backward: Side,
    forward_turn: bool,
}

impl Bidirectional {
    pub(crate) fn new(grid: &mut CellGrid, start: usize, end: usize) -> Self {
        Self {
            forward: Side::new(grid, start, end, CellFlags::SCANNED),
            backward: Side::new(grid, end, start, CellFlags::SCAN_AUX),
            forward_turn: true,
        }
    }

    pub(crate) fn advance(&mut self, grid: &mut CellGrid, quota: usize) -> Progress {
        for _ in 0..quota {
            let expanded = if self.forward_turn {
                self.forward.expand(grid, self.backward.mark)
            } else {
                self.backward.expand(grid, self.forward.mark)
            };
            self.forward_turn = !self.forward_turn;
            match expanded {
                Err(()) => return Progress::Unreachable,
                Ok(None) => {}
                Ok(Some(meet)) => return self.splice(grid, meet),
            }
        }
        Progress::Running
    }

    fn splice(&self, grid: &CellGrid, meet: usize) -> Progress {
        trace!("biastar: met at {}", grid.pos_of(meet));
        let head = walk_parents(grid, &self.forward.parents, self.forward.root, meet);
        let tail = walk_parents(grid, &self.backward.parents, self.backward.root, meet);
        match (head, tail) {
            (Some(mut path), Some(tail)) => {
                // `tail` runs end -> meet; append meet's successors toward end.
                path.extend(tail.into_iter().rev().skip(1));
                Progress::Found(path)
            }
            _ => Progress::Unreachable,
        }
    }
}

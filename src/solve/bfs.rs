use std::collections::VecDeque;

use super::Progress;
use super::path::walk_parents;
use crate::grid::{CellFlags, CellGrid, Direction, ParentMap};

/// Breadth-first search; the first time `end` is dequeued its parent chain
/// is a shortest path.
pub(crate) struct Bfs {
    start: usize,
    end: usize,
    queue: VecDeque<u32>,
    parents: ParentMap,
}

impl Bfs {
    pub(crate) fn new(grid: &mut CellGrid, start: usize, end: usize) -> Self {
        grid.set_mark(start, CellFlags::SCANNED);
        let mut queue = VecDeque::new();
        queue.push_back(start as u32);
        Self {
            start,
            end,
            queue,
            parents: ParentMap::new(grid.len()),
        }
    }

    pub(crate) fn advance(&mut self, grid: &mut CellGrid, quota: usize) -> Progress {
        for _ in 0..quota {
            let Some(cur) = self.queue.pop_front() else {
                return Progress::Unreachable;
            };
            let cur = cur as usize;
            if cur == self.end {
                return match walk_parents(grid, &self.parents, self.start, cur) {
                    Some(path) => Progress::Found(path),
                    None => Progress::Unreachable,
                };
            }
            for dir in Direction::ALL {
                let Some(next) = grid.open_at(cur, dir) else {
                    continue;
                };
                if !grid.has_flag(next, CellFlags::SCANNED) {
                    grid.set_mark(next, CellFlags::SCANNED);
                    self.parents.set(next, dir.reverse());
                    self.queue.push_back(next as u32);
                }
            }
        }
        Progress::Running
    }
}

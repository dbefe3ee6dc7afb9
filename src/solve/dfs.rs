use super::Progress;
use super::path::walk_parents;
use crate::grid::{CellFlags, CellGrid, Direction, ParentMap};

/// Depth-first reachability search. Memory is one parent byte per cell plus
/// the explicit stack; the path found is valid but not necessarily short.
pub(crate) struct DepthFirst {
    start: usize,
    end: usize,
    stack: Vec<u32>,
    parents: ParentMap,
}

impl DepthFirst {
    pub(crate) fn new(grid: &mut CellGrid, start: usize, end: usize) -> Self {
        grid.set_mark(start, CellFlags::SCANNED);
        Self {
            start,
            end,
            stack: vec![start as u32],
            parents: ParentMap::new(grid.len()),
        }
    }

    pub(crate) fn advance(&mut self, grid: &mut CellGrid, quota: usize) -> Progress {
        for _ in 0..quota {
            let Some(cur) = self.stack.pop() else {
                return Progress::Unreachable;
            };
            let cur = cur as usize;
            if cur == self.end {
                return match walk_parents(grid, &self.parents, self.start, cur) {
                    Some(path) => Progress::Found(path),
                    None => Progress::Unreachable,
                };
            }
            // Pushed in reverse so North is explored first.
            for dir in Direction::ALL.into_iter().rev() {
                let Some(next) = grid.open_at(cur, dir) else {
                    continue;
                };
                if !grid.has_flag(next, CellFlags::SCANNED) {
                    grid.set_mark(next, CellFlags::SCANNED);
                    self.parents.set(next, dir.reverse());
                    self.stack.push(next as u32);
                }
            }
        }
        Progress::Running
    }
}

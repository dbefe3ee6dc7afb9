use super::Progress;
use crate::grid::{CellFlags, CellGrid, Direction};

/// Trémaux-style exploration with two visit bits per cell: `SCANNED` for
/// "entered once", `SCAN_AUX` for "backed out of". The stack of entered,
/// not yet abandoned cells is the path once `end` is on top.
///
/// Only never-entered neighbours are advanced into. A cell entered once is
/// reached again solely by backing out to it, so the stack never repeats a
/// cell and every reachable `end` is found.
pub(crate) struct Tremaux {
    end: usize,
    stack: Vec<u32>,
}

impl Tremaux {
    pub(crate) fn new(grid: &mut CellGrid, start: usize, end: usize) -> Self {
        grid.set_mark(start, CellFlags::SCANNED);
        Self {
            end,
            stack: vec![start as u32],
        }
    }

    pub(crate) fn advance(&mut self, grid: &mut CellGrid, quota: usize) -> Progress {
        for _ in 0..quota {
            let Some(&top) = self.stack.last() else {
                return Progress::Unreachable;
            };
            let top = top as usize;
            if top == self.end {
                return Progress::Found(self.stack.iter().map(|&i| i as usize).collect());
            }
            let fresh = Direction::ALL.into_iter().find_map(|dir| {
                grid.open_at(top, dir)
                    .filter(|&n| !grid.has_flag(n, CellFlags::SCANNED))
            });
            match fresh {
                Some(next) => {
                    grid.set_mark(next, CellFlags::SCANNED);
                    self.stack.push(next as u32);
                }
                None => {
                    grid.set_mark(top, CellFlags::SCAN_AUX);
                    self.stack.pop();
                }
            }
        }
        Progress::Running
    }
}

#[cfg(test)]
mod tests {
    use super::Tremaux;
    use crate::grid::{CellGrid, Direction, Pos};
    use crate::solve::Progress;

    fn open_room(side: u32) -> CellGrid {
        let mut grid = CellGrid::new(side, side).unwrap();
        for y in 0..side {
            for x in 0..side {
                if x + 1 < side {
                    grid.carve(Pos::new(x, y), Direction::East).unwrap();
                }
                if y + 1 < side {
                    grid.carve(Pos::new(x, y), Direction::South).unwrap();
                }
            }
        }
        grid
    }

    #[test]
    fn looped_room_yields_a_path_without_repeats() {
        let mut grid = open_room(6);
        let start = grid.index_of(Pos::new(0, 0)).unwrap();
        let end = grid.index_of(Pos::new(2, 5)).unwrap();
        let mut tremaux = Tremaux::new(&mut grid, start, end);
        let Progress::Found(path) = tremaux.advance(&mut grid, usize::MAX) else {
            panic!("end not found");
        };
        assert_eq!(path.first(), Some(&start));
        assert_eq!(path.last(), Some(&end));
        let mut seen = path.clone();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), path.len());
    }

    #[test]
    fn walled_off_end_is_unreachable() {
        let mut far = CellGrid::new(3, 3).unwrap();
        for x in 0..2 {
            far.carve(Pos::new(x, 0), Direction::East).unwrap();
        }
        let start = far.index_of(Pos::new(0, 0)).unwrap();
        let end = far.index_of(Pos::new(2, 2)).unwrap();
        let mut tremaux = Tremaux::new(&mut far, start, end);
        assert!(matches!(
            tremaux.advance(&mut far, usize::MAX),
            Progress::Unreachable
        ));
    }
}

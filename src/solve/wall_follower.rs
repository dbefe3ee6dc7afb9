use super::Progress;
use crate::grid::{CellFlags, CellGrid, Direction, DistanceMap};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Hand {
    Left,
    Right,
}

impl Hand {
    /// Turn preference: wall side, straight, away from the wall, back.
    #[inline]
    fn preference(self, facing: Direction) -> [Direction; 4] {
        match self {
            Hand::Left => [
                facing.turn_left(),
                facing,
                facing.turn_right(),
                facing.reverse(),
            ],
            Hand::Right => [
                facing.turn_right(),
                facing,
                facing.turn_left(),
                facing.reverse(),
            ],
        }
    }
}

/// Keeps one hand on the wall. Complete on simply connected mazes; on mazes
/// with loops it may circle forever, which the move budget turns into
/// `Stuck`.
///
/// The reported path is the walk with loops erased: re-entering a cell
/// already on the trail cuts the trail back to that cell.
pub(crate) struct WallFollower {
    hand: Hand,
    end: usize,
    cur: usize,
    facing: Direction,
    moves: u64,
    budget: u64,
    trail: Vec<u32>,
    /// Position of each cell on `trail`, or unreached.
    trail_pos: DistanceMap,
}

impl WallFollower {
    pub(crate) fn new(grid: &mut CellGrid, start: usize, end: usize, hand: Hand) -> Self {
        grid.set_mark(start, CellFlags::SCANNED);
        let mut trail_pos = DistanceMap::new(grid.len());
        trail_pos.set(start, 0);
        Self {
            hand,
            end,
            cur: start,
            facing: Direction::East,
            moves: 0,
            budget: grid.len() as u64 * 4,
            trail: vec![start as u32],
            trail_pos,
        }
    }

    pub(crate) fn advance(&mut self, grid: &mut CellGrid, quota: usize) -> Progress {
        for _ in 0..quota {
            if self.cur == self.end {
                return Progress::Found(self.trail.iter().map(|&i| i as usize).collect());
            }
            if self.moves >= self.budget {
                return Progress::Stuck;
            }
            let next = self
                .hand
                .preference(self.facing)
                .into_iter()
                .find_map(|dir| grid.open_at(self.cur, dir).map(|n| (dir, n)));
            let Some((dir, next)) = next else {
                return Progress::Stuck;
            };
            self.moves += 1;
            self.facing = dir;
            self.cur = next;
            if !grid.has_flag(next, CellFlags::SCANNED) {
                grid.set_mark(next, CellFlags::SCANNED);
            }

            match self.trail_pos.get(next) {
                Some(pos) => {
                    for &cut in &self.trail[pos as usize + 1..] {
                        self.trail_pos.set_unreached(cut as usize);
                    }
                    self.trail.truncate(pos as usize + 1);
                }
                None => {
                    self.trail_pos.set(next, self.trail.len() as u32);
                    self.trail.push(next as u32);
                }
            }
        }
        Progress::Running
    }
}

//! The dense one-byte-per-cell lattice shared by every algorithm.
//!
//! Storage is a single row-major `Vec<u8>`:
//! - low nibble: wall bits (N/E/S/W), set = wall present
//! - `CARVED`: generation-visited
//! - `PATH`: cell is on the reported path
//! - `SCANNED` / `SCAN_AUX`: per-run solver scratch bits
//!
//! Wall symmetry is the one invariant every mutator keeps: a wall bit on a
//! cell is set iff the paired bit on the adjacent cell is set.

use std::fmt;

use bitflags::bitflags;

use super::direction::Direction;
use crate::error::{MazeError, Result};
use crate::persist::events::{Event, EventWriter};

bitflags! {
    /// Per-cell flag byte.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct CellFlags: u8 {
        const NORTH    = 0b0000_0001;
        const EAST     = 0b0000_0010;
        const SOUTH    = 0b0000_0100;
        const WEST     = 0b0000_1000;
        const CARVED   = 0b0001_0000;
        const PATH     = 0b0010_0000;
        const SCANNED  = 0b0100_0000;
        const SCAN_AUX = 0b1000_0000;

        const ALL_WALLS = Self::NORTH.bits() | Self::EAST.bits() | Self::SOUTH.bits() | Self::WEST.bits();
        const SOLVER_MARKS = Self::PATH.bits() | Self::SCANNED.bits() | Self::SCAN_AUX.bits();
    }
}

/// A lattice coordinate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pos {
    pub x: u32,
    pub y: u32,
}

impl Pos {
    #[inline]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Manhattan distance, the admissible heuristic on a unit-cost lattice.
    #[inline]
    pub fn manhattan(self, other: Pos) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

impl From<(u32, u32)> for Pos {
    fn from((x, y): (u32, u32)) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Lattice neighbours of one cell, optionally filtered by a direction mask.
///
/// Holds only copies of the grid dimensions so callers may mutate the grid
/// while iterating.
#[derive(Clone, Debug)]
pub struct Neighbors {
    origin: Pos,
    width: u32,
    height: u32,
    /// Bit `d` set = direction `d` still to be tried.
    pending: u8,
}

impl Iterator for Neighbors {
    type Item = (Pos, Direction);

    fn next(&mut self) -> Option<Self::Item> {
        while self.pending != 0 {
            let bit = self.pending.trailing_zeros() as usize;
            self.pending &= self.pending - 1;
            let dir = Direction::from_index(bit);
            if let Some(pos) = step_pos(self.origin, dir, self.width, self.height) {
                return Some((pos, dir));
            }
        }
        None
    }
}

#[inline]
fn step_pos(pos: Pos, dir: Direction, width: u32, height: u32) -> Option<Pos> {
    match dir {
        Direction::North => pos.y.checked_sub(1).map(|y| Pos::new(pos.x, y)),
        Direction::South => (pos.y + 1 < height).then(|| Pos::new(pos.x, pos.y + 1)),
        Direction::West => pos.x.checked_sub(1).map(|x| Pos::new(x, pos.y)),
        Direction::East => (pos.x + 1 < width).then(|| Pos::new(pos.x + 1, pos.y)),
    }
}

/// Clear the wall between `a` and its neighbour `b` (which lies in `dir`)
/// on a raw cell slice. Callers guarantee both indices are in the slice.
#[inline(always)]
pub(crate) fn open_raw(cells: &mut [u8], a: usize, b: usize, dir: Direction) {
    cells[a] &= !dir.wall_bit();
    cells[b] &= !dir.reverse().wall_bit();
}

pub struct CellGrid {
    width: u32,
    height: u32,
    cells: Vec<u8>,
    journal: Option<EventWriter>,
}

impl CellGrid {
    /// An all-walls grid.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let len = checked_len(width, height)?;
        Ok(Self {
            width,
            height,
            cells: vec![CellFlags::ALL_WALLS.bits(); len],
            journal: None,
        })
    }

    /// Adopt a raw cell payload, e.g. one read back from a maze file.
    pub fn from_cells(width: u32, height: u32, cells: Vec<u8>) -> Result<Self> {
        let len = checked_len(width, height)?;
        if cells.len() != len {
            return Err(MazeError::PayloadSize {
                expected: len,
                actual: cells.len(),
            });
        }
        Ok(Self {
            width,
            height,
            cells,
            journal: None,
        })
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of cells.
    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Always false; grids have at least one cell.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Raw row-major cell bytes.
    #[inline]
    pub fn cells(&self) -> &[u8] {
        &self.cells
    }

    pub fn into_cells(self) -> Vec<u8> {
        self.cells
    }

    #[inline]
    pub fn contains(&self, pos: Pos) -> bool {
        pos.x < self.width && pos.y < self.height
    }

    /// Row-major index of `pos`, failing fast when out of range.
    #[inline]
    pub fn index_of(&self, pos: Pos) -> Result<usize> {
        if self.contains(pos) {
            Ok(pos.y as usize * self.width as usize + pos.x as usize)
        } else {
            Err(MazeError::OutOfBounds {
                pos,
                width: self.width,
                height: self.height,
            })
        }
    }

    #[inline]
    pub fn pos_of(&self, idx: usize) -> Pos {
        debug_assert!(idx < self.cells.len());
        let w = self.width as usize;
        Pos::new((idx % w) as u32, (idx / w) as u32)
    }

    pub fn flags(&self, pos: Pos) -> Result<CellFlags> {
        Ok(self.flags_at(self.index_of(pos)?))
    }

    pub fn has_wall(&self, pos: Pos, dir: Direction) -> Result<bool> {
        Ok(self.flags(pos)?.contains(dir.wall()))
    }

    /// Number of wall bits set on a cell (0..=4).
    pub fn wall_count(&self, pos: Pos) -> Result<u32> {
        Ok(self.walls_at(self.index_of(pos)?))
    }

    /// Clear the wall toward `dir` and the neighbour's paired wall.
    ///
    /// Returns `Ok(false)` without touching anything when the neighbour lies
    /// outside the lattice.
    pub fn carve(&mut self, pos: Pos, dir: Direction) -> Result<bool> {
        let idx = self.index_of(pos)?;
        Ok(self.carve_at(idx, dir))
    }

    /// Restore the wall toward `dir` on both sides. No-op at the lattice edge.
    pub fn add_wall(&mut self, pos: Pos, dir: Direction) -> Result<bool> {
        let idx = self.index_of(pos)?;
        let Some(n) = self.neighbor_at(idx, dir) else {
            return Ok(false);
        };
        self.cells[idx] |= dir.wall_bit();
        self.cells[n] |= dir.reverse().wall_bit();
        Ok(true)
    }

    /// Lattice-adjacent cells, walls ignored. Edge cells simply yield fewer.
    pub fn neighbors(&self, pos: Pos) -> Result<Neighbors> {
        self.index_of(pos)?;
        Ok(Neighbors {
            origin: pos,
            width: self.width,
            height: self.height,
            pending: 0x0F,
        })
    }

    /// Adjacent cells reachable without crossing a wall.
    pub fn open_neighbors(&self, pos: Pos) -> Result<Neighbors> {
        let idx = self.index_of(pos)?;
        Ok(Neighbors {
            origin: pos,
            width: self.width,
            height: self.height,
            pending: !self.cells[idx] & CellFlags::ALL_WALLS.bits(),
        })
    }

    pub fn is_carved(&self, pos: Pos) -> Result<bool> {
        Ok(self.flags(pos)?.contains(CellFlags::CARVED))
    }

    pub fn mark_carved(&mut self, pos: Pos) -> Result<()> {
        let idx = self.index_of(pos)?;
        self.set_mark(idx, CellFlags::CARVED);
        Ok(())
    }

    pub fn is_path(&self, pos: Pos) -> Result<bool> {
        Ok(self.flags(pos)?.contains(CellFlags::PATH))
    }

    /// Clear `SCANNED`, `SCAN_AUX` and `PATH` everywhere.
    ///
    /// Solvers call this before their first quantum; scratch bits left by an
    /// earlier run would otherwise read as visited. Journals one unmark per
    /// cell that carried any of them.
    pub fn reset_solver_marks(&mut self) {
        let marks = CellFlags::SOLVER_MARKS.bits();
        if self.journal.is_some() {
            for idx in 0..self.cells.len() {
                if self.cells[idx] & marks != 0 {
                    let pos = self.pos_of(idx);
                    self.record(Event::Unmark(pos));
                }
            }
        }
        for cell in &mut self.cells {
            *cell &= !marks;
        }
    }

    /// Cells carrying the generation-visited bit.
    pub fn carved_count(&self) -> usize {
        self.cells
            .iter()
            .filter(|&&c| c & CellFlags::CARVED.bits() != 0)
            .count()
    }

    /// Open passages, each counted once (from its west or north end).
    pub fn open_edge_count(&self) -> usize {
        let w = self.width as usize;
        let mut edges = 0;
        for (idx, &cell) in self.cells.iter().enumerate() {
            if idx % w + 1 < w && cell & CellFlags::EAST.bits() == 0 {
                edges += 1;
            }
            if idx + w < self.cells.len() && cell & CellFlags::SOUTH.bits() == 0 {
                edges += 1;
            }
        }
        edges
    }

    /// Cells currently flagged `PATH`, in scanline order.
    pub fn path_cells(&self) -> Vec<Pos> {
        self.cells
            .iter()
            .enumerate()
            .filter(|&(_, &c)| c & CellFlags::PATH.bits() != 0)
            .map(|(idx, _)| self.pos_of(idx))
            .collect()
    }

    /// Start recording every flag mutation into `journal`.
    pub fn attach_journal(&mut self, journal: EventWriter) -> Result<()> {
        if journal.width() != self.width || journal.height() != self.height {
            return Err(MazeError::GridMismatch {
                width: journal.width(),
                height: journal.height(),
                actual_width: self.width,
                actual_height: self.height,
            });
        }
        self.journal = Some(journal);
        Ok(())
    }

    pub fn detach_journal(&mut self) -> Option<EventWriter> {
        self.journal.take()
    }

    #[inline]
    pub fn is_journaling(&self) -> bool {
        self.journal.is_some()
    }

    // ---- index-level access for the algorithms -------------------------

    #[inline(always)]
    pub(crate) fn flags_at(&self, idx: usize) -> CellFlags {
        CellFlags::from_bits_retain(self.cells[idx])
    }

    #[inline(always)]
    pub(crate) fn has_flag(&self, idx: usize, flag: CellFlags) -> bool {
        self.cells[idx] & flag.bits() != 0
    }

    #[inline(always)]
    pub(crate) fn walls_at(&self, idx: usize) -> u32 {
        (self.cells[idx] & CellFlags::ALL_WALLS.bits()).count_ones()
    }

    /// Lattice neighbour index, walls ignored.
    #[inline(always)]
    pub(crate) fn neighbor_at(&self, idx: usize, dir: Direction) -> Option<usize> {
        let w = self.width as usize;
        match dir {
            Direction::North => idx.checked_sub(w),
            Direction::South => {
                let n = idx + w;
                (n < self.cells.len()).then_some(n)
            }
            Direction::West => (idx % w != 0).then(|| idx - 1),
            Direction::East => (idx % w + 1 < w).then(|| idx + 1),
        }
    }

    /// Neighbour index when no wall separates the two cells.
    #[inline(always)]
    pub(crate) fn open_at(&self, idx: usize, dir: Direction) -> Option<usize> {
        if self.cells[idx] & dir.wall_bit() != 0 {
            return None;
        }
        self.neighbor_at(idx, dir)
    }

    #[inline]
    pub(crate) fn carve_at(&mut self, idx: usize, dir: Direction) -> bool {
        let Some(n) = self.neighbor_at(idx, dir) else {
            return false;
        };
        if self.journal.is_some() {
            let pos = self.pos_of(idx);
            self.record(Event::Carve(pos, dir));
        }
        open_raw(&mut self.cells, idx, n, dir);
        true
    }

    /// Set a non-wall flag, journaling it when a journal is attached.
    #[inline]
    pub(crate) fn set_mark(&mut self, idx: usize, flag: CellFlags) {
        debug_assert!(!flag.intersects(CellFlags::ALL_WALLS));
        self.cells[idx] |= flag.bits();
        if self.journal.is_some() {
            let pos = self.pos_of(idx);
            if flag.contains(CellFlags::CARVED) {
                self.record(Event::Visit(pos));
            }
            if flag.contains(CellFlags::SCANNED) {
                self.record(Event::Scan(pos));
            }
            if flag.contains(CellFlags::SCAN_AUX) {
                self.record(Event::ScanAux(pos));
            }
            if flag.contains(CellFlags::PATH) {
                self.record(Event::PathAdd(pos));
            }
        }
    }

    #[inline]
    pub(crate) fn clear_mark(&mut self, idx: usize, flag: CellFlags) {
        debug_assert!(!flag.intersects(CellFlags::ALL_WALLS));
        let had_path = self.cells[idx] & CellFlags::PATH.bits() != 0;
        self.cells[idx] &= !flag.bits();
        if had_path && flag.contains(CellFlags::PATH) && self.journal.is_some() {
            let pos = self.pos_of(idx);
            self.record(Event::PathRemove(pos));
        }
    }

    /// Clear every solver mark on one cell.
    pub(crate) fn unmark_at(&mut self, idx: usize) {
        let marks = CellFlags::SOLVER_MARKS.bits();
        if self.cells[idx] & marks == 0 {
            return;
        }
        self.cells[idx] &= !marks;
        if self.journal.is_some() {
            let pos = self.pos_of(idx);
            self.record(Event::Unmark(pos));
        }
    }

    /// Mutable raw bytes for the block carver's data-parallel pass.
    #[inline]
    pub(crate) fn raw_cells_mut(&mut self) -> &mut [u8] {
        &mut self.cells
    }

    /// Journal the current carve state as if it had been produced event by
    /// event: a visit per carved cell and a carve per open passage.
    pub(crate) fn journal_snapshot(&mut self) {
        if self.journal.is_none() {
            return;
        }
        for idx in 0..self.cells.len() {
            let cell = self.cells[idx];
            let pos = self.pos_of(idx);
            if cell & CellFlags::CARVED.bits() != 0 {
                self.record(Event::Visit(pos));
            }
            for dir in [Direction::East, Direction::South] {
                if cell & dir.wall_bit() == 0 && self.neighbor_at(idx, dir).is_some() {
                    self.record(Event::Carve(pos, dir));
                }
            }
        }
    }

    #[inline]
    fn record(&mut self, event: Event) {
        if let Some(journal) = self.journal.as_mut() {
            journal.record(event);
        }
    }
}

/// Clones cell state only; an attached journal stays with the original.
impl Clone for CellGrid {
    fn clone(&self) -> Self {
        Self {
            width: self.width,
            height: self.height,
            cells: self.cells.clone(),
            journal: None,
        }
    }
}

impl fmt::Debug for CellGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CellGrid")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("journaling", &self.journal.is_some())
            .finish_non_exhaustive()
    }
}

fn checked_len(width: u32, height: u32) -> Result<usize> {
    let cells = u64::from(width) * u64::from(height);
    if width == 0 || height == 0 || cells > u64::from(u32::MAX) {
        return Err(MazeError::InvalidDimensions { width, height });
    }
    Ok(cells as usize)
}

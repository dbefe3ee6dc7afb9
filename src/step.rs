//! Cooperative stepping shared by generators, solvers and replay.
//!
//! A stepper owns its algorithm state but borrows the grid only for the
//! duration of a single quantum, so a caller can interleave rendering or
//! cancellation between calls and always observe a valid grid.

use crate::error::{MazeError, Result};
use crate::grid::CellGrid;

/// Work units (cell expansions, carves, replayed events) per `step` call
/// unless configured otherwise.
pub const DEFAULT_STEP_QUOTA: usize = 1024;

/// Status values that know whether the stepper has finished.
pub trait Terminal {
    fn is_terminal(&self) -> bool;
}

pub trait Stepper {
    type Status: Copy + Terminal;

    /// Perform one bounded quantum of work.
    fn step(&mut self, grid: &mut CellGrid) -> Result<Self::Status>;

    /// Step until a terminal status is reached.
    fn run(&mut self, grid: &mut CellGrid) -> Result<Self::Status> {
        loop {
            let status = self.step(grid)?;
            if status.is_terminal() {
                return Ok(status);
            }
        }
    }
}

/// Generator progress.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GenStatus {
    Running,
    Done,
}

impl Terminal for GenStatus {
    fn is_terminal(&self) -> bool {
        matches!(self, GenStatus::Done)
    }
}

/// Reject a grid that does not match the dimensions a stepper was built for.
pub(crate) fn check_grid(grid: &CellGrid, width: u32, height: u32) -> Result<()> {
    if grid.width() != width || grid.height() != height {
        return Err(MazeError::GridMismatch {
            width,
            height,
            actual_width: grid.width(),
            actual_height: grid.height(),
        });
    }
    Ok(())
}

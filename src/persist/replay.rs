use std::io::Read;

use log::{debug, warn};

use super::events::{Event, EventReader};
use crate::error::{MazeError, Result};
use crate::grid::{CellFlags, CellGrid};
use crate::step::{DEFAULT_STEP_QUOTA, Stepper, Terminal, check_grid};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReplayStatus {
    Running,
    Done { applied: u64 },
    /// The log ended inside a record; everything before it was applied.
    Truncated { applied: u64 },
}

impl Terminal for ReplayStatus {
    fn is_terminal(&self) -> bool {
        !matches!(self, ReplayStatus::Running)
    }
}

/// Apply one journal event to `grid`.
pub fn apply(grid: &mut CellGrid, event: Event) -> Result<()> {
    let idx = grid.index_of(event.pos())?;
    match event {
        Event::Visit(_) => grid.set_mark(idx, CellFlags::CARVED),
        Event::Carve(_, dir) => {
            grid.carve_at(idx, dir);
        }
        Event::PathAdd(_) => grid.set_mark(idx, CellFlags::PATH),
        Event::PathRemove(_) => grid.clear_mark(idx, CellFlags::PATH),
        Event::Scan(_) => grid.set_mark(idx, CellFlags::SCANNED),
        Event::ScanAux(_) => grid.set_mark(idx, CellFlags::SCAN_AUX),
        Event::Unmark(_) => grid.unmark_at(idx),
    }
    Ok(())
}

/// Steps a journal back onto a grid, `quota` events at a time.
pub struct Replayer<R> {
    reader: EventReader<R>,
    quota: usize,
    applied: u64,
    status: ReplayStatus,
}

impl<R: Read> Replayer<R> {
    pub fn new(reader: EventReader<R>) -> Self {
        Self::with_quota(reader, DEFAULT_STEP_QUOTA)
    }

    pub fn with_quota(reader: EventReader<R>, quota: usize) -> Self {
        Self {
            reader,
            quota: quota.max(1),
            applied: 0,
            status: ReplayStatus::Running,
        }
    }

    /// An all-walls grid sized from the log header.
    pub fn blank_grid(&self) -> Result<CellGrid> {
        CellGrid::new(self.reader.width(), self.reader.height())
    }

    pub fn applied(&self) -> u64 {
        self.applied
    }
}

impl<R: Read> Stepper for Replayer<R> {
    type Status = ReplayStatus;

    fn step(&mut self, grid: &mut CellGrid) -> Result<ReplayStatus> {
        if self.status.is_terminal() {
            return Ok(self.status);
        }
        check_grid(grid, self.reader.width(), self.reader.height())?;
        for _ in 0..self.quota {
            match self.reader.next_event() {
                Ok(Some(event)) => {
                    apply(grid, event)?;
                    self.applied += 1;
                }
                Ok(None) => {
                    debug!("replay: {} events applied", self.applied);
                    self.status = ReplayStatus::Done {
                        applied: self.applied,
                    };
                    break;
                }
                Err(MazeError::TruncatedLog { .. }) => {
                    warn!("replay: log truncated after {} events", self.applied);
                    self.status = ReplayStatus::Truncated {
                        applied: self.applied,
                    };
                    break;
                }
                Err(e) => return Err(e),
            }
        }
        Ok(self.status)
    }
}

//! Path solvers.
//!
//! Every solver shares one state machine, `Idle -> Running -> {Solved |
//! Unreachable | Stuck}`, and one contract: the first `step` clears the
//! scratch bits left by earlier runs, each `step` does at most `quota` units
//! of work, and a solved run leaves `PATH` set on exactly the reported cells.

mod best_first;
mod bfs;
mod bidirectional;
mod dead_end;
mod dfs;
mod path;
mod swarm;
mod tremaux;
mod wall_follower;

use std::fmt;
use std::str::FromStr;

use log::{debug, info};

use self::best_first::{BestFirst, Heuristic};
use self::bfs::Bfs;
use self::bidirectional::Bidirectional;
use self::dead_end::DeadEndFiller;
use self::dfs::DepthFirst;
use self::swarm::Swarm;
use self::tremaux::Tremaux;
use self::wall_follower::{Hand, WallFollower};
use crate::error::{MazeError, Result};
use crate::grid::{CellFlags, CellGrid, Pos};
use crate::step::{DEFAULT_STEP_QUOTA, Stepper, Terminal, check_grid};

pub const DEFAULT_WALKERS: usize = 10;
pub const DEFAULT_SWARM_SEED: u64 = 0x5EED_1234_ABCD_EF01;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SolveStatus {
    Idle,
    Running,
    Solved,
    /// The search space was exhausted without reaching the end.
    Unreachable,
    /// A heuristic walker gave up; the end may still be reachable.
    Stuck,
}

impl Terminal for SolveStatus {
    fn is_terminal(&self) -> bool {
        matches!(
            self,
            SolveStatus::Solved | SolveStatus::Unreachable | SolveStatus::Stuck
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SolverKind {
    BreadthFirst,
    UniformCost,
    AStar,
    BidirectionalAStar,
    LeftHand,
    RightHand,
    Tremaux,
    DepthFirst,
    DeadEndFill,
    Swarm,
}

impl SolverKind {
    pub const ALL: [SolverKind; 10] = [
        SolverKind::BreadthFirst,
        SolverKind::UniformCost,
        SolverKind::AStar,
        SolverKind::BidirectionalAStar,
        SolverKind::LeftHand,
        SolverKind::RightHand,
        SolverKind::Tremaux,
        SolverKind::DepthFirst,
        SolverKind::DeadEndFill,
        SolverKind::Swarm,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            SolverKind::BreadthFirst => "bfs",
            SolverKind::UniformCost => "dijkstra",
            SolverKind::AStar => "astar",
            SolverKind::BidirectionalAStar => "biastar",
            SolverKind::LeftHand => "left",
            SolverKind::RightHand => "right",
            SolverKind::Tremaux => "tremaux",
            SolverKind::DepthFirst => "dfs",
            SolverKind::DeadEndFill => "deadend",
            SolverKind::Swarm => "swarm",
        }
    }

    /// Whether a solved path is guaranteed to be a shortest one.
    pub const fn is_shortest(self) -> bool {
        matches!(
            self,
            SolverKind::BreadthFirst | SolverKind::UniformCost | SolverKind::AStar
        )
    }
}

impl fmt::Display for SolverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SolverKind {
    type Err = MazeError;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.to_ascii_lowercase();
        if lower == "dfs_solve" {
            return Ok(SolverKind::DepthFirst);
        }
        SolverKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == lower)
            .ok_or_else(|| MazeError::UnknownAlgorithm(s.to_owned()))
    }
}

/// Configuration for a solver run.
#[derive(Clone, Debug, Default)]
pub struct SolverConfig {
    /// Work units per `step`. `None` means `DEFAULT_STEP_QUOTA`.
    pub quota: Option<usize>,
    /// Seed for the swarm walkers. `None` means `DEFAULT_SWARM_SEED`.
    pub seed: Option<u64>,
    /// Swarm walker count. `None` means `DEFAULT_WALKERS`.
    pub walkers: Option<usize>,
}

impl SolverConfig {
    pub fn quota(mut self, quota: usize) -> Self {
        self.quota = Some(quota.max(1));
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn walkers(mut self, walkers: usize) -> Self {
        self.walkers = Some(walkers.max(1));
        self
    }
}

/// Result of one bounded advance of a strategy.
pub(crate) enum Progress {
    Running,
    /// Ordered cell indices to report as the path.
    Found(Vec<usize>),
    Unreachable,
    Stuck,
}

enum Strategy {
    Bfs(Bfs),
    BestFirst(BestFirst),
    Bidirectional(Bidirectional),
    WallFollower(WallFollower),
    Tremaux(Tremaux),
    DepthFirst(DepthFirst),
    DeadEnd(DeadEndFiller),
    Swarm(Swarm),
}

impl Strategy {
    fn new(
        kind: SolverKind,
        grid: &mut CellGrid,
        start: usize,
        end: usize,
        config: &SolverConfig,
    ) -> Self {
        match kind {
            SolverKind::BreadthFirst => Strategy::Bfs(Bfs::new(grid, start, end)),
            SolverKind::UniformCost => {
                Strategy::BestFirst(BestFirst::new(grid, start, end, Heuristic::Zero))
            }
            SolverKind::AStar => {
                Strategy::BestFirst(BestFirst::new(grid, start, end, Heuristic::Manhattan))
            }
            SolverKind::BidirectionalAStar => {
                Strategy::Bidirectional(Bidirectional::new(grid, start, end))
            }
            SolverKind::LeftHand => {
                Strategy::WallFollower(WallFollower::new(grid, start, end, Hand::Left))
            }
            SolverKind::RightHand => {
                Strategy::WallFollower(WallFollower::new(grid, start, end, Hand::Right))
            }
            SolverKind::Tremaux => Strategy::Tremaux(Tremaux::new(grid, start, end)),
            SolverKind::DepthFirst => Strategy::DepthFirst(DepthFirst::new(grid, start, end)),
            SolverKind::DeadEndFill => Strategy::DeadEnd(DeadEndFiller::new(grid, start, end)),
            SolverKind::Swarm => Strategy::Swarm(Swarm::new(
                grid,
                start,
                end,
                config.walkers.unwrap_or(DEFAULT_WALKERS),
                config.seed.unwrap_or(DEFAULT_SWARM_SEED),
            )),
        }
    }

    fn advance(&mut self, grid: &mut CellGrid, quota: usize) -> Progress {
        match self {
            Strategy::Bfs(s) => s.advance(grid, quota),
            Strategy::BestFirst(s) => s.advance(grid, quota),
            Strategy::Bidirectional(s) => s.advance(grid, quota),
            Strategy::WallFollower(s) => s.advance(grid, quota),
            Strategy::Tremaux(s) => s.advance(grid, quota),
            Strategy::DepthFirst(s) => s.advance(grid, quota),
            Strategy::DeadEnd(s) => s.advance(grid, quota),
            Strategy::Swarm(s) => s.advance(grid, quota),
        }
    }
}

/// A steppable solver chosen once from a `SolverKind`.
pub struct Solver {
    kind: SolverKind,
    width: u32,
    height: u32,
    start: usize,
    end: usize,
    config: SolverConfig,
    quota: usize,
    status: SolveStatus,
    strategy: Option<Strategy>,
    path: Vec<Pos>,
    steps: u64,
}

impl Solver {
    /// Validates both endpoints; the grid is not touched until `step`.
    pub fn new(kind: SolverKind, grid: &CellGrid, start: Pos, end: Pos) -> Result<Self> {
        Self::with_config(kind, grid, start, end, SolverConfig::default())
    }

    pub fn with_config(
        kind: SolverKind,
        grid: &CellGrid,
        start: Pos,
        end: Pos,
        config: SolverConfig,
    ) -> Result<Self> {
        let start = grid.index_of(start)?;
        let end = grid.index_of(end)?;
        Ok(Self {
            kind,
            width: grid.width(),
            height: grid.height(),
            start,
            end,
            quota: config.quota.unwrap_or(DEFAULT_STEP_QUOTA).max(1),
            config,
            status: SolveStatus::Idle,
            strategy: None,
            path: Vec::new(),
            steps: 0,
        })
    }

    pub fn kind(&self) -> SolverKind {
        self.kind
    }

    pub fn status(&self) -> SolveStatus {
        self.status
    }

    /// The ordered path, start to end inclusive. Empty unless solved.
    pub fn path(&self) -> &[Pos] {
        &self.path
    }

    pub fn into_path(self) -> Vec<Pos> {
        self.path
    }

    /// Number of `step` calls that did work.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    fn finish(&mut self, grid: &mut CellGrid, progress: Progress) {
        match progress {
            Progress::Running => return,
            Progress::Found(cells) => {
                for &idx in &cells {
                    grid.set_mark(idx, CellFlags::PATH);
                }
                self.path = cells.into_iter().map(|idx| grid.pos_of(idx)).collect();
                self.status = SolveStatus::Solved;
            }
            Progress::Unreachable => self.status = SolveStatus::Unreachable,
            Progress::Stuck => self.status = SolveStatus::Stuck,
        }
        self.strategy = None;
        info!(
            "{}: {:?} after {} steps, path length {}",
            self.kind,
            self.status,
            self.steps,
            self.path.len()
        );
    }
}

impl Stepper for Solver {
    type Status = SolveStatus;

    fn step(&mut self, grid: &mut CellGrid) -> Result<SolveStatus> {
        check_grid(grid, self.width, self.height)?;
        if self.status.is_terminal() {
            return Ok(self.status);
        }
        self.steps += 1;

        if self.status == SolveStatus::Idle {
            grid.reset_solver_marks();
            self.status = SolveStatus::Running;
            debug!(
                "{}: {} -> {}",
                self.kind,
                grid.pos_of(self.start),
                grid.pos_of(self.end)
            );
            if self.start == self.end {
                self.finish(grid, Progress::Found(vec![self.start]));
                return Ok(self.status);
            }
            self.strategy = Some(Strategy::new(
                self.kind,
                grid,
                self.start,
                self.end,
                &self.config,
            ));
        }

        let progress = match self.strategy.as_mut() {
            Some(strategy) => strategy.advance(grid, self.quota),
            None => Progress::Stuck,
        };
        self.finish(grid, progress);
        Ok(self.status)
    }
}

/// Run `kind` from `start` to `end` to completion and return the path.
pub fn solve(kind: SolverKind, grid: &mut CellGrid, start: Pos, end: Pos) -> Result<Vec<Pos>> {
    let mut solver = Solver::new(kind, grid, start, end)?;
    solver.run(grid)?;
    Ok(solver.into_path())
}

#[cfg(test)]
mod tests {
    use super::{SolveStatus, Solver, SolverConfig, SolverKind, solve};
    use crate::grid::{CellFlags, CellGrid, Direction, Pos};
    use crate::step::Stepper;

    fn corridor() -> CellGrid {
        // Boustrophedon through a 3x3 grid.
        let mut grid = CellGrid::new(3, 3).unwrap();
        let moves = [
            (0, 0, Direction::East),
            (1, 0, Direction::East),
            (2, 0, Direction::South),
            (2, 1, Direction::West),
            (1, 1, Direction::West),
            (0, 1, Direction::South),
            (0, 2, Direction::East),
            (1, 2, Direction::East),
        ];
        for (x, y, dir) in moves {
            grid.carve(Pos::new(x, y), dir).unwrap();
        }
        grid
    }

    #[test]
    fn kind_names_round_trip() {
        for kind in SolverKind::ALL {
            assert_eq!(kind.as_str().parse::<SolverKind>().unwrap(), kind);
        }
        assert_eq!("dfs_solve".parse::<SolverKind>().unwrap(), SolverKind::DepthFirst);
        assert!("flood".parse::<SolverKind>().is_err());
    }

    #[test]
    fn single_path_corridor_is_found_by_every_solver() {
        for kind in SolverKind::ALL {
            let mut grid = corridor();
            let path = solve(kind, &mut grid, Pos::new(0, 0), Pos::new(2, 2)).unwrap();
            assert_eq!(path.len(), 9, "{kind}");
            assert_eq!(path[0], Pos::new(0, 0), "{kind}");
            assert_eq!(grid.path_cells().len(), 9, "{kind}");
        }
    }

    #[test]
    fn start_equals_end_is_solved_immediately() {
        let mut grid = CellGrid::new(3, 3).unwrap();
        for kind in SolverKind::ALL {
            let path = solve(kind, &mut grid, Pos::new(1, 1), Pos::new(1, 1)).unwrap();
            assert_eq!(path, vec![Pos::new(1, 1)]);
        }
    }

    #[test]
    fn first_step_clears_stale_marks() {
        let mut grid = corridor();
        solve(SolverKind::BreadthFirst, &mut grid, Pos::new(0, 0), Pos::new(2, 2)).unwrap();
        let mut solver =
            Solver::new(SolverKind::Tremaux, &grid, Pos::new(0, 0), Pos::new(1, 0)).unwrap();
        solver.run(&mut grid).unwrap();
        assert_eq!(solver.path(), &[Pos::new(0, 0), Pos::new(1, 0)]);
        assert!(!grid.is_path(Pos::new(2, 2)).unwrap());
    }

    #[test]
    fn tiny_quota_spreads_work_over_steps() {
        let mut grid = corridor();
        let config = SolverConfig::default().quota(1);
        let mut solver = Solver::with_config(
            SolverKind::BreadthFirst,
            &grid,
            Pos::new(0, 0),
            Pos::new(2, 2),
            config,
        )
        .unwrap();
        assert_eq!(solver.status(), SolveStatus::Idle);
        assert_eq!(solver.step(&mut grid).unwrap(), SolveStatus::Running);
        assert!(solver.path().is_empty());
        assert_eq!(solver.run(&mut grid).unwrap(), SolveStatus::Solved);
        assert!(solver.steps() >= 9);
        assert!(grid.flags(Pos::new(1, 1)).unwrap().contains(CellFlags::PATH));
    }

    #[test]
    fn out_of_range_endpoints_are_rejected() {
        let grid = CellGrid::new(3, 3).unwrap();
        assert!(Solver::new(SolverKind::AStar, &grid, Pos::new(3, 0), Pos::new(0, 0)).is_err());
        assert!(Solver::new(SolverKind::AStar, &grid, Pos::new(0, 0), Pos::new(0, 3)).is_err());
    }
}

//! Dense-lattice maze generation and solving.

pub mod error;
pub mod generate;
pub mod grid;
pub mod persist;
pub mod post;
pub mod solve;
pub mod step;

pub use error::{MazeError, Result};
pub use generate::{Generator, GeneratorConfig, GeneratorKind, generate};
pub use grid::{CellFlags, CellGrid, Direction, Pos};
pub use post::{MazeStats, braid};
pub use solve::{SolveStatus, Solver, SolverConfig, SolverKind, solve};
pub use step::{DEFAULT_STEP_QUOTA, GenStatus, Stepper, Terminal};

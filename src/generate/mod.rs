//! Maze generators.
//!
//! All generators start from an all-walls grid and leave every cell carved.
//! `dfs`, `prim` and `organic` produce perfect mazes; `fractal` trades
//! perfection for a parallel interior pass.

mod backtracker;
mod blocks;
mod config;
mod frontier;
mod organic;

use std::fmt;
use std::str::FromStr;

use log::info;

pub use backtracker::Backtracker;
pub use blocks::BlockCarver;
pub use config::{
    DEFAULT_BLOCK_SIZE, DEFAULT_ORGANIC_WALKERS, DEFAULT_STITCH_DENSITY, GeneratorConfig,
    THREADS_ENV,
};
pub use frontier::Frontier;
pub use organic::Organic;

use crate::error::{MazeError, Result};
use crate::grid::{CellGrid, Pos};
use crate::step::{GenStatus, Stepper};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GeneratorKind {
    /// Randomised depth-first backtracking.
    Backtracker,
    /// Randomised frontier growth.
    Frontier,
    /// Hierarchical block-parallel carver.
    Blocks,
    /// Parallel random walkers with frontier respawn.
    Organic,
}

impl GeneratorKind {
    pub const ALL: [GeneratorKind; 4] = [
        GeneratorKind::Backtracker,
        GeneratorKind::Frontier,
        GeneratorKind::Blocks,
        GeneratorKind::Organic,
    ];

    /// Short name used on the command line and in maze-file metadata.
    pub const fn as_str(self) -> &'static str {
        match self {
            GeneratorKind::Backtracker => "dfs",
            GeneratorKind::Frontier => "prim",
            GeneratorKind::Blocks => "fractal",
            GeneratorKind::Organic => "organic",
        }
    }
}

impl fmt::Display for GeneratorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GeneratorKind {
    type Err = MazeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "dfs" | "backtracker" => Ok(GeneratorKind::Backtracker),
            "prim" | "frontier" => Ok(GeneratorKind::Frontier),
            "fractal" | "blocks" => Ok(GeneratorKind::Blocks),
            "organic" | "walkers" => Ok(GeneratorKind::Organic),
            _ => Err(MazeError::UnknownAlgorithm(s.to_owned())),
        }
    }
}

/// A generator chosen once from a `GeneratorKind`.
pub enum Generator {
    Backtracker(Backtracker),
    Frontier(Frontier),
    Blocks(BlockCarver),
    Organic(Organic),
}

impl Generator {
    /// Build a generator for `grid`. Coordinates and knobs are validated
    /// here; the grid is not touched until the first `step`.
    pub fn new(kind: GeneratorKind, grid: &CellGrid, config: &GeneratorConfig) -> Result<Self> {
        let seed = config.resolve_seed();
        let start = config.resolve_start();
        grid.index_of(start)?;
        let quota = config.resolve_quota();
        Ok(match kind {
            GeneratorKind::Backtracker => {
                Generator::Backtracker(Backtracker::new(grid, start, seed, quota)?)
            }
            GeneratorKind::Frontier => Generator::Frontier(Frontier::new(grid, start, seed, quota)?),
            GeneratorKind::Blocks => Generator::Blocks(BlockCarver::new(
                grid,
                seed,
                config.resolve_block_size(),
                config.resolve_stitch_density(),
                config.resolve_thread_count(),
            )?),
            GeneratorKind::Organic => Generator::Organic(Organic::new(
                grid,
                config
                    .start
                    .unwrap_or(Pos::new(grid.width() / 2, grid.height() / 2)),
                seed,
                config.resolve_walkers(),
                quota,
                config.resolve_thread_count(),
            )?),
        })
    }

    /// The seed in use, drawn at construction when the config left it unset.
    pub fn seed(&self) -> u64 {
        match self {
            Generator::Backtracker(g) => g.seed(),
            Generator::Frontier(g) => g.seed(),
            Generator::Blocks(g) => g.seed(),
            Generator::Organic(g) => g.seed(),
        }
    }

    pub fn kind(&self) -> GeneratorKind {
        match self {
            Generator::Backtracker(_) => GeneratorKind::Backtracker,
            Generator::Frontier(_) => GeneratorKind::Frontier,
            Generator::Blocks(_) => GeneratorKind::Blocks,
            Generator::Organic(_) => GeneratorKind::Organic,
        }
    }
}

impl Stepper for Generator {
    type Status = GenStatus;

    fn step(&mut self, grid: &mut CellGrid) -> Result<GenStatus> {
        match self {
            Generator::Backtracker(g) => g.step(grid),
            Generator::Frontier(g) => g.step(grid),
            Generator::Blocks(g) => g.step(grid),
            Generator::Organic(g) => g.step(grid),
        }
    }
}

/// Carve a fresh `width x height` maze to completion.
///
/// Returns the grid and the seed that produced it, which matters when the
/// config left the seed unset.
pub fn generate(
    kind: GeneratorKind,
    width: u32,
    height: u32,
    config: &GeneratorConfig,
) -> Result<(CellGrid, u64)> {
    let mut grid = CellGrid::new(width, height)?;
    let mut generator = Generator::new(kind, &grid, config)?;
    let seed = generator.seed();
    info!("generating {width}x{height} with {kind}, seed {seed}");
    generator.run(&mut grid)?;
    Ok((grid, seed))
}

#[cfg(test)]
mod tests {
    use super::{GeneratorConfig, GeneratorKind, generate};
    use crate::grid::Pos;

    #[test]
    fn kind_names_round_trip() {
        for kind in GeneratorKind::ALL {
            assert_eq!(kind.as_str().parse::<GeneratorKind>().unwrap(), kind);
        }
        assert!("kruskal".parse::<GeneratorKind>().is_err());
    }

    #[test]
    fn unset_seed_is_reported() {
        let config = GeneratorConfig::default();
        let (grid, seed) = generate(GeneratorKind::Backtracker, 6, 6, &config).unwrap();
        let (again, _) =
            generate(GeneratorKind::Backtracker, 6, 6, &config.clone().seed(seed)).unwrap();
        assert_eq!(grid.cells(), again.cells());
    }

    #[test]
    fn out_of_range_start_is_an_error_for_every_kind() {
        let config = GeneratorConfig::default().seed(1).start(Pos::new(9, 0));
        for kind in GeneratorKind::ALL {
            assert!(generate(kind, 4, 4, &config).is_err());
        }
    }
}

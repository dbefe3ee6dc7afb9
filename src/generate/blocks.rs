//! Hierarchical block-parallel carver.
//!
//! The lattice is tiled into `block_size` squares (ragged at the right and
//! bottom edges). A perfect maze over the block lattice decides which blocks
//! are joined; every block interior is then carved independently on the
//! rayon pool, one row band per task; finally each open block edge is
//! stitched by opening some of the cell pairs along the shared boundary.
//!
//! Each block and each edge draws from its own RNG, seeded from the run seed
//! and its coordinates, so the output does not depend on the thread count.

use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use super::backtracker::{Backtracker, carve_region};
use crate::error::{MazeError, Result};
use crate::grid::{CellGrid, Direction, Pos};
use crate::step::{GenStatus, check_grid};

const BLOCK_GRAPH_SALT: u64 = 0x6a09_e667_f3bc_c908;
const STITCH_SALT: u64 = 0xbb67_ae85_84ca_a73b;

#[inline]
pub(super) fn splitmix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9e37_79b9_7f4a_7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

#[inline]
pub(super) fn mix_seed(seed: u64, a: u64, b: u64) -> u64 {
    splitmix64(splitmix64(seed ^ a.rotate_left(32)) ^ b)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    BlockGraph,
    Interiors,
    Stitch,
    Done,
}

/// An open edge of the block graph: block `(bx, by)` joined to its east or
/// south neighbour.
#[derive(Clone, Copy, Debug)]
struct BlockEdge {
    bx: u32,
    by: u32,
    dir: Direction,
}

#[derive(Clone, Copy, Debug)]
struct Tiling {
    width: u32,
    height: u32,
    block_size: u32,
}

impl Tiling {
    /// Boundary cell pairs of one block edge, as (cell on the near side,
    /// direction across the boundary).
    fn boundary_pairs(self, edge: BlockEdge) -> Vec<(usize, Direction)> {
        let bs = self.block_size;
        let w = self.width as usize;
        match edge.dir {
            Direction::East => {
                let x = (edge.bx + 1) * bs - 1;
                let y0 = edge.by * bs;
                let y1 = (y0 + bs).min(self.height);
                (y0..y1)
                    .map(|y| (y as usize * w + x as usize, Direction::East))
                    .collect()
            }
            _ => {
                let y = (edge.by + 1) * bs - 1;
                let x0 = edge.bx * bs;
                let x1 = (x0 + bs).min(self.width);
                (x0..x1)
                    .map(|x| (y as usize * w + x as usize, Direction::South))
                    .collect()
            }
        }
    }
}

pub struct BlockCarver {
    width: u32,
    height: u32,
    block_size: u32,
    blocks_x: u32,
    blocks_y: u32,
    density: f64,
    seed: u64,
    pool: rayon::ThreadPool,
    phase: Phase,
    block_graph: Option<CellGrid>,
}

impl BlockCarver {
    pub fn new(
        grid: &CellGrid,
        seed: u64,
        block_size: u32,
        density: f64,
        threads: usize,
    ) -> Result<Self> {
        if block_size == 0 {
            return Err(MazeError::InvalidBlockSize);
        }
        if !(0.0..=1.0).contains(&density) {
            return Err(MazeError::InvalidStitchDensity(density));
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads.max(1))
            .build()?;
        Ok(Self {
            width: grid.width(),
            height: grid.height(),
            block_size,
            blocks_x: grid.width().div_ceil(block_size),
            blocks_y: grid.height().div_ceil(block_size),
            density,
            seed,
            pool,
            phase: Phase::BlockGraph,
            block_graph: None,
        })
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    pub fn step(&mut self, grid: &mut CellGrid) -> Result<GenStatus> {
        check_grid(grid, self.width, self.height)?;
        match self.phase {
            Phase::BlockGraph => {
                self.carve_block_graph()?;
                self.phase = Phase::Interiors;
            }
            Phase::Interiors => {
                self.carve_interiors(grid);
                self.phase = Phase::Stitch;
            }
            Phase::Stitch => {
                let opened = self.stitch(grid);
                info!(
                    "fractal: {}x{} done, {} stitch openings",
                    self.width, self.height, opened
                );
                self.block_graph = None;
                self.phase = Phase::Done;
            }
            Phase::Done => {}
        }
        Ok(if self.phase == Phase::Done {
            GenStatus::Done
        } else {
            GenStatus::Running
        })
    }

    fn carve_block_graph(&mut self) -> Result<()> {
        debug!(
            "fractal: {}x{} blocks of {} on {} threads",
            self.blocks_x,
            self.blocks_y,
            self.block_size,
            self.threads()
        );
        let mut graph = CellGrid::new(self.blocks_x, self.blocks_y)?;
        let mut dfs = Backtracker::new(
            &graph,
            Pos::new(0, 0),
            splitmix64(self.seed ^ BLOCK_GRAPH_SALT),
            usize::MAX,
        )?;
        while dfs.step(&mut graph)? == GenStatus::Running {}
        self.block_graph = Some(graph);
        Ok(())
    }

    fn carve_interiors(&mut self, grid: &mut CellGrid) {
        let row_width = self.width as usize;
        let bs = self.block_size as usize;
        let blocks_x = self.blocks_x as usize;
        let seed = self.seed;
        let cells = grid.raw_cells_mut();

        self.pool.install(|| {
            cells
                .par_chunks_mut(row_width * bs)
                .enumerate()
                .for_each(|(by, band)| {
                    for bx in 0..blocks_x {
                        let x0 = bx * bs;
                        let w = bs.min(row_width - x0);
                        let mut rng = StdRng::seed_from_u64(mix_seed(seed, bx as u64, by as u64));
                        carve_region(band, row_width, x0, w, &mut rng);
                    }
                });
        });
        debug!("fractal: interiors carved");

        // The parallel pass bypasses the per-carve journal hook.
        grid.journal_snapshot();
    }

    fn open_edges(&self) -> Vec<BlockEdge> {
        let Some(graph) = self.block_graph.as_ref() else {
            return Vec::new();
        };
        let mut edges = Vec::new();
        for idx in 0..graph.len() {
            let pos = graph.pos_of(idx);
            for dir in [Direction::East, Direction::South] {
                if graph.open_at(idx, dir).is_some() {
                    edges.push(BlockEdge {
                        bx: pos.x,
                        by: pos.y,
                        dir,
                    });
                }
            }
        }
        edges
    }

    fn stitch(&mut self, grid: &mut CellGrid) -> usize {
        let edges = self.open_edges();
        let density = self.density;
        let seed = self.seed ^ STITCH_SALT;
        let tiling = Tiling {
            width: self.width,
            height: self.height,
            block_size: self.block_size,
        };

        let openings: Vec<Vec<(usize, Direction)>> = self.pool.install(|| {
            edges
                .par_iter()
                .map(|&edge| {
                    let pairs = tiling.boundary_pairs(edge);
                    let mut rng = StdRng::seed_from_u64(mix_seed(
                        seed,
                        (u64::from(edge.bx) << 1) | (edge.dir == Direction::South) as u64,
                        u64::from(edge.by),
                    ));
                    let mut chosen: Vec<_> = pairs
                        .iter()
                        .copied()
                        .filter(|_| rng.random_bool(density))
                        .collect();
                    if chosen.is_empty() && !pairs.is_empty() {
                        chosen.push(pairs[rng.random_range(0..pairs.len())]);
                    }
                    chosen
                })
                .collect()
        });

        let mut opened = 0;
        for (idx, dir) in openings.into_iter().flatten() {
            if grid.carve_at(idx, dir) {
                opened += 1;
            }
        }
        opened
    }
}

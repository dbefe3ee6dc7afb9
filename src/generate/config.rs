use std::sync::OnceLock;

use log::debug;

use crate::grid::Pos;
use crate::step::DEFAULT_STEP_QUOTA;

pub const DEFAULT_BLOCK_SIZE: u32 = 32;
pub const DEFAULT_STITCH_DENSITY: f64 = 0.45;
pub const DEFAULT_ORGANIC_WALKERS: usize = 256;

/// Overrides the carver pools' size when no thread count is set.
pub const THREADS_ENV: &str = "TURBOMAZE_THREADS";

static PHYSICAL_CORES: OnceLock<usize> = OnceLock::new();

#[inline]
fn physical_core_count() -> usize {
    *PHYSICAL_CORES.get_or_init(|| num_cpus::get_physical().max(1))
}

fn env_thread_count() -> Option<usize> {
    let raw = std::env::var(THREADS_ENV).ok()?;
    match raw.trim().parse::<usize>() {
        Ok(n) if n > 0 => Some(n),
        _ => {
            debug!("ignoring {THREADS_ENV}={raw:?}");
            None
        }
    }
}

/// Configuration for a generator run.
///
/// Use `GeneratorConfig::default()` for a random seed and the default knobs,
/// or customise individual fields via the builder methods.
#[derive(Clone, Debug, Default)]
pub struct GeneratorConfig {
    /// RNG seed. `None` draws one from the OS; the drawn seed is reported by
    /// `Generator::seed` so the run can be reproduced.
    pub seed: Option<u64>,
    /// First cell carved. `None` means (0, 0), or the centre cell for the
    /// organic carver.
    pub start: Option<Pos>,
    /// Work units per `step`. `None` means `DEFAULT_STEP_QUOTA`.
    pub quota: Option<usize>,
    /// Side length of a block for the block carver.
    pub block_size: Option<u32>,
    /// Probability that a boundary cell pair on an open block edge is opened.
    pub stitch_density: Option<f64>,
    /// Walker population of the organic carver.
    pub walkers: Option<usize>,
    /// Threads for the block and organic carvers' parallel passes.
    /// `None` means `TURBOMAZE_THREADS`, then physical cores.
    pub thread_count: Option<usize>,
    /// Hard upper bound on threads regardless of auto-detection.
    pub max_threads: Option<usize>,
}

impl GeneratorConfig {
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn start(mut self, start: Pos) -> Self {
        self.start = Some(start);
        self
    }

    pub fn quota(mut self, quota: usize) -> Self {
        self.quota = Some(quota.max(1));
        self
    }

    pub fn block_size(mut self, size: u32) -> Self {
        self.block_size = Some(size);
        self
    }

    pub fn stitch_density(mut self, density: f64) -> Self {
        self.stitch_density = Some(density);
        self
    }

    pub fn walkers(mut self, n: usize) -> Self {
        self.walkers = Some(n.max(1));
        self
    }

    /// Set an explicit thread count for the carver pools.
    pub fn thread_count(mut self, n: usize) -> Self {
        self.thread_count = Some(n.max(1));
        self
    }

    /// Set a hard upper bound on threads.
    pub fn max_threads(mut self, n: usize) -> Self {
        self.max_threads = Some(n.max(1));
        self
    }

    pub(crate) fn resolve_seed(&self) -> u64 {
        self.seed.unwrap_or_else(rand::random)
    }

    pub(crate) fn resolve_quota(&self) -> usize {
        self.quota.unwrap_or(DEFAULT_STEP_QUOTA).max(1)
    }

    pub(crate) fn resolve_start(&self) -> Pos {
        self.start.unwrap_or_default()
    }

    pub(crate) fn resolve_block_size(&self) -> u32 {
        self.block_size.unwrap_or(DEFAULT_BLOCK_SIZE)
    }

    pub(crate) fn resolve_stitch_density(&self) -> f64 {
        self.stitch_density.unwrap_or(DEFAULT_STITCH_DENSITY)
    }

    pub(crate) fn resolve_walkers(&self) -> usize {
        self.walkers.unwrap_or(DEFAULT_ORGANIC_WALKERS).max(1)
    }

    /// Resolve the pool size, falling back to the environment and then to
    /// auto-detect.
    pub(crate) fn resolve_thread_count(&self) -> usize {
        let mut threads = self
            .thread_count
            .or_else(env_thread_count)
            .unwrap_or_else(physical_core_count);
        if let Some(cap) = self.max_threads {
            threads = threads.min(cap);
        }
        threads.max(1)
    }
}

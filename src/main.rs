#[cfg(feature = "mimalloc-global")]
#[global_allocator]
static GLOBAL_ALLOCATOR: mimalloc::MiMalloc = mimalloc::MiMalloc;

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use log::info;
use turbo_maze::persist::{self, EventReader, EventWriter, MazeMetadata, Replayer, SaveOptions};
use turbo_maze::{
    CellGrid, Generator, GeneratorConfig, GeneratorKind, MazeStats, Pos, Solver, SolverConfig,
    SolverKind, Stepper, braid,
};

#[derive(Parser)]
#[command(name = "turbo-maze", about = "Generate, solve and replay lattice mazes")]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Carve a new maze and save it
    Generate {
        #[arg(long, default_value_t = 64)]
        width: u32,
        #[arg(long, default_value_t = 64)]
        height: u32,
        /// dfs, prim, fractal or organic
        #[arg(long, default_value = "dfs")]
        algo: GeneratorKind,
        /// Random when omitted; the chosen seed is logged and saved
        #[arg(long)]
        seed: Option<u64>,
        /// Fraction of dead ends to remove, 0.0 to 1.0
        #[arg(long)]
        braid: Option<f64>,
        /// Block side for the fractal carver
        #[arg(long)]
        block_size: Option<u32>,
        /// Walker population for the organic carver
        #[arg(long)]
        walkers: Option<usize>,
        #[arg(long)]
        threads: Option<usize>,
        #[arg(short, long, default_value = "maze.bin")]
        output: PathBuf,
        #[arg(long)]
        compress: bool,
        /// Store only the metadata needed to regenerate
        #[arg(long)]
        seed_only: bool,
        /// Journal every carve to this event log
        #[arg(long)]
        log: Option<PathBuf>,
    },
    /// Solve a saved maze
    Solve {
        input: PathBuf,
        #[arg(long, default_value = "bfs")]
        algo: SolverKind,
        /// Start cell as x,y (default top-left)
        #[arg(long, value_parser = parse_pos)]
        start: Option<Pos>,
        /// End cell as x,y (default bottom-right)
        #[arg(long, value_parser = parse_pos)]
        end: Option<Pos>,
        /// Seed for the swarm solver
        #[arg(long)]
        seed: Option<u64>,
        /// Save the grid with its path bits set
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Journal every scan and path mark to this event log
        #[arg(long)]
        log: Option<PathBuf>,
    },
    /// Rebuild a grid from an event log
    Replay {
        log: PathBuf,
        /// Maze file to replay onto instead of an all-walls grid
        #[arg(long)]
        base: Option<PathBuf>,
        #[arg(short, long, default_value = "replay.bin")]
        output: PathBuf,
    },
    /// Print structural statistics of a saved maze as JSON
    Stats { input: PathBuf },
}

fn parse_pos(s: &str) -> Result<Pos, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected x,y, got {s:?}"))?;
    let x = x.trim().parse().map_err(|e| format!("bad x in {s:?}: {e}"))?;
    let y = y.trim().parse().map_err(|e| format!("bad y in {s:?}: {e}"))?;
    Ok(Pos::new(x, y))
}

fn attach_log(grid: &mut CellGrid, path: Option<&Path>) -> anyhow::Result<()> {
    if let Some(path) = path {
        let writer = EventWriter::create(path, grid.width(), grid.height())
            .with_context(|| format!("opening event log {}", path.display()))?;
        grid.attach_journal(writer)?;
    }
    Ok(())
}

fn finish_log(grid: &mut CellGrid) -> anyhow::Result<()> {
    if let Some(writer) = grid.detach_journal() {
        let events = writer.finish()?;
        info!("event log: {events} events");
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn cmd_generate(
    width: u32,
    height: u32,
    algo: GeneratorKind,
    seed: Option<u64>,
    braid_factor: Option<f64>,
    block_size: Option<u32>,
    walkers: Option<usize>,
    threads: Option<usize>,
    output: &Path,
    options: SaveOptions,
    log: Option<&Path>,
) -> anyhow::Result<()> {
    let mut config = GeneratorConfig::default();
    if let Some(seed) = seed {
        config = config.seed(seed);
    }
    if let Some(size) = block_size {
        config = config.block_size(size);
    }
    if let Some(walkers) = walkers {
        config = config.walkers(walkers);
    }
    if let Some(threads) = threads {
        config = config.thread_count(threads);
    }

    let mut grid = CellGrid::new(width, height)?;
    attach_log(&mut grid, log)?;
    let mut generator = Generator::new(algo, &grid, &config)?;
    let seed = generator.seed();

    let start = Instant::now();
    generator.run(&mut grid)?;
    let mut metadata = MazeMetadata::generated(algo, seed);
    match (algo, block_size, walkers) {
        (GeneratorKind::Blocks, Some(size), _) => {
            metadata = metadata.with_extra("block_size", size);
        }
        (GeneratorKind::Organic, _, Some(walkers)) => {
            metadata = metadata.with_extra("walkers", walkers);
        }
        _ => {}
    }
    if let Some(factor) = braid_factor {
        braid(&mut grid, factor, seed)?;
        metadata = metadata.with_braid(factor);
    }
    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
    finish_log(&mut grid)?;

    println!("{width}x{height} {algo} seed={seed} in {elapsed_ms:.1} ms");
    persist::save(output, &grid, &metadata, options)
        .with_context(|| format!("saving {}", output.display()))?;
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn cmd_solve(
    input: &Path,
    algo: SolverKind,
    start: Option<Pos>,
    end: Option<Pos>,
    seed: Option<u64>,
    output: Option<&Path>,
    log: Option<&Path>,
) -> anyhow::Result<()> {
    let loaded = persist::load(input).with_context(|| format!("loading {}", input.display()))?;
    let metadata = loaded.metadata.clone();
    let mut grid = loaded.into_grid()?;

    let start = start.unwrap_or_default();
    let end = end.unwrap_or(Pos::new(grid.width() - 1, grid.height() - 1));
    let mut config = SolverConfig::default();
    if let Some(seed) = seed {
        config = config.seed(seed);
    }

    attach_log(&mut grid, log)?;
    let mut solver = Solver::with_config(algo, &grid, start, end, config)?;
    let clock = Instant::now();
    let status = solver.run(&mut grid)?;
    let elapsed_ms = clock.elapsed().as_secs_f64() * 1000.0;
    finish_log(&mut grid)?;

    println!(
        "{algo}: {status:?}, path length {} in {elapsed_ms:.1} ms",
        solver.path().len()
    );
    if let Some(output) = output {
        persist::save(output, &grid, &metadata, SaveOptions::default())?;
    }
    Ok(())
}

fn cmd_replay(log: &Path, base: Option<&Path>, output: &Path) -> anyhow::Result<()> {
    let reader =
        EventReader::open(log).with_context(|| format!("opening event log {}", log.display()))?;
    let mut replayer = Replayer::new(reader);
    let (mut grid, metadata) = match base {
        Some(base) => {
            let loaded = persist::load(base)?;
            let metadata = loaded.metadata.clone();
            (loaded.into_grid()?, metadata)
        }
        None => (replayer.blank_grid()?, MazeMetadata::default()),
    };
    let status = replayer.run(&mut grid)?;
    println!("replay: {status:?}");
    persist::save(output, &grid, &metadata, SaveOptions::default())?;
    Ok(())
}

fn cmd_stats(input: &Path) -> anyhow::Result<()> {
    let grid = persist::load(input)?.into_grid()?;
    let stats = MazeStats::collect(&grid);
    println!("{}", serde_json::to_string_pretty(&stats)?);
    println!("dead ends: {:.2}%", stats.dead_end_percent());
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    match cli.command {
        Cmd::Generate {
            width,
            height,
            algo,
            seed,
            braid,
            block_size,
            walkers,
            threads,
            output,
            compress,
            seed_only,
            log,
        } => {
            if width == 0 || height == 0 {
                bail!("width and height must be at least 1");
            }
            cmd_generate(
                width,
                height,
                algo,
                seed,
                braid,
                block_size,
                walkers,
                threads,
                &output,
                SaveOptions {
                    compress,
                    seed_only,
                },
                log.as_deref(),
            )
        }
        Cmd::Solve {
            input,
            algo,
            start,
            end,
            seed,
            output,
            log,
        } => cmd_solve(
            &input,
            algo,
            start,
            end,
            seed,
            output.as_deref(),
            log.as_deref(),
        ),
        Cmd::Replay { log, base, output } => cmd_replay(&log, base.as_deref(), &output),
        Cmd::Stats { input } => cmd_stats(&input),
    }
}

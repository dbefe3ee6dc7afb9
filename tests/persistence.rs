use std::fs;

use turbo_maze::persist::{
    self, EventReader, EventWriter, LoadedMaze, MazeMetadata, ReplayStatus, Replayer, SaveOptions,
};
use turbo_maze::{
    CellGrid, Generator, GeneratorConfig, GeneratorKind, MazeError, Pos, SolverKind, Stepper,
    braid, generate, solve,
};

fn sample(kind: GeneratorKind, seed: u64) -> (CellGrid, MazeMetadata) {
    let config = GeneratorConfig::default().seed(seed).block_size(16);
    let (grid, seed) = generate(kind, 70, 45, &config).unwrap();
    let metadata = MazeMetadata::generated(kind, seed).with_extra("block_size", 16);
    (grid, metadata)
}

fn save_load(grid: &CellGrid, metadata: &MazeMetadata, options: SaveOptions) -> LoadedMaze {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("maze.bin");
    persist::save(&path, grid, metadata, options).unwrap();
    persist::load(&path).unwrap()
}

#[test_log::test]
fn raw_and_compressed_round_trips_are_identical() {
    let (grid, metadata) = sample(GeneratorKind::Frontier, 31);
    for compress in [false, true] {
        let options = SaveOptions {
            compress,
            seed_only: false,
        };
        let loaded = save_load(&grid, &metadata, options);
        assert!(!loaded.is_seed_only());
        assert_eq!(loaded.metadata, metadata);
        let stored = loaded.grid.as_ref().unwrap();
        assert_eq!(stored.cells(), grid.cells(), "compress={compress}");
    }
}

#[test]
fn compression_shrinks_the_file() {
    let (grid, metadata) = sample(GeneratorKind::Backtracker, 4);
    let dir = tempfile::tempdir().unwrap();
    let raw = dir.path().join("raw.bin");
    let packed = dir.path().join("packed.bin");
    persist::save(&raw, &grid, &metadata, SaveOptions::default()).unwrap();
    persist::save(
        &packed,
        &grid,
        &metadata,
        SaveOptions {
            compress: true,
            seed_only: false,
        },
    )
    .unwrap();
    assert!(fs::metadata(&packed).unwrap().len() < fs::metadata(&raw).unwrap().len());
}

#[test]
fn seed_only_files_regenerate_the_same_maze() {
    for kind in GeneratorKind::ALL {
        let (mut grid, metadata) = sample(kind, 77);
        braid(&mut grid, 0.4, 77).unwrap();
        let metadata = metadata.with_braid(0.4);

        let loaded = save_load(
            &grid,
            &metadata,
            SaveOptions {
                compress: false,
                seed_only: true,
            },
        );
        assert!(loaded.is_seed_only());
        assert_eq!((loaded.width, loaded.height), (70, 45));
        assert_eq!(loaded.into_grid().unwrap().cells(), grid.cells(), "{kind}");
    }
}

#[test]
fn foreign_files_are_rejected_without_partial_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("not_a_maze.bin");
    fs::write(&path, b"PNG\x00\x01\x02\x03").unwrap();
    assert!(matches!(
        persist::load(&path),
        Err(MazeError::BadMagic { .. })
    ));

    fs::write(&path, b"MA").unwrap();
    assert!(matches!(
        persist::load(&path),
        Err(MazeError::BadMagic { .. })
    ));
}

#[test]
fn truncated_payload_is_an_error() {
    let (grid, metadata) = sample(GeneratorKind::Backtracker, 2);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cut.bin");
    persist::save(&path, &grid, &metadata, SaveOptions::default()).unwrap();
    let mut bytes = fs::read(&path).unwrap();
    bytes.truncate(bytes.len() - 100);
    fs::write(&path, bytes).unwrap();
    assert!(persist::load(&path).is_err());
}

#[test_log::test]
fn generation_log_replays_to_the_same_grid() {
    let dir = tempfile::tempdir().unwrap();
    for kind in GeneratorKind::ALL {
        let log = dir.path().join(format!("{kind}.log"));
        let mut grid = CellGrid::new(40, 30).unwrap();
        grid.attach_journal(EventWriter::create(&log, 40, 30).unwrap())
            .unwrap();
        let config = GeneratorConfig::default().seed(12).block_size(8);
        Generator::new(kind, &grid, &config)
            .unwrap()
            .run(&mut grid)
            .unwrap();
        let events = grid.detach_journal().unwrap().finish().unwrap();
        assert!(events >= 40 * 30);

        let mut replayer = Replayer::with_quota(EventReader::open(&log).unwrap(), 100);
        let mut replayed = replayer.blank_grid().unwrap();
        let status = replayer.run(&mut replayed).unwrap();
        assert_eq!(status, ReplayStatus::Done { applied: events });
        assert_eq!(replayed.cells(), grid.cells(), "{kind}");
    }
}

/// Journal `kinds` run back to back on `grid`, then replay the log onto
/// `base` and return the replayed grid.
fn journal_and_replay(
    grid: &mut CellGrid,
    base: &CellGrid,
    kinds: &[SolverKind],
    log: &std::path::Path,
) -> CellGrid {
    grid.attach_journal(EventWriter::create(log, grid.width(), grid.height()).unwrap())
        .unwrap();
    for &kind in kinds {
        solve(kind, grid, Pos::new(0, 0), Pos::new(69, 44)).unwrap();
    }
    grid.detach_journal().unwrap().finish().unwrap();

    let mut replayed = base.clone();
    let mut replayer = Replayer::new(EventReader::open(log).unwrap());
    replayer.run(&mut replayed).unwrap();
    replayed
}

#[test]
fn solver_logs_replay_to_identical_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let (mut base, _) = sample(GeneratorKind::Backtracker, 8);
    braid(&mut base, 0.5, 8).unwrap();
    for kind in SolverKind::ALL {
        let mut grid = base.clone();
        let log = dir.path().join(format!("{kind}.log"));
        let replayed = journal_and_replay(&mut grid, &base, &[kind], &log);
        assert_eq!(replayed.cells(), grid.cells(), "{kind}");
    }
}

#[test]
fn back_to_back_solver_runs_replay_to_identical_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let (base, _) = sample(GeneratorKind::Frontier, 9);
    for pair in [
        [SolverKind::BreadthFirst, SolverKind::DepthFirst],
        [SolverKind::BidirectionalAStar, SolverKind::Tremaux],
        [SolverKind::DeadEndFill, SolverKind::AStar],
    ] {
        let mut grid = base.clone();
        let log = dir.path().join(format!("{}-{}.log", pair[0], pair[1]));
        let replayed = journal_and_replay(&mut grid, &base, &pair, &log);
        assert_eq!(replayed.cells(), grid.cells(), "{} then {}", pair[0], pair[1]);
        assert!(!replayed.path_cells().is_empty());
    }
}

#[test]
fn truncated_log_reports_events_applied() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("cut.log");
    let mut grid = CellGrid::new(10, 10).unwrap();
    grid.attach_journal(EventWriter::create(&log, 10, 10).unwrap())
        .unwrap();
    let config = GeneratorConfig::default().seed(1);
    Generator::new(GeneratorKind::Backtracker, &grid, &config)
        .unwrap()
        .run(&mut grid)
        .unwrap();
    let events = grid.detach_journal().unwrap().finish().unwrap();

    // Cut into the final record.
    let mut bytes = fs::read(&log).unwrap();
    bytes.truncate(bytes.len() - 3);
    fs::write(&log, bytes).unwrap();

    let mut replayer = Replayer::new(EventReader::open(&log).unwrap());
    let mut replayed = replayer.blank_grid().unwrap();
    let status = replayer.run(&mut replayed).unwrap();
    assert_eq!(
        status,
        ReplayStatus::Truncated {
            applied: events - 1
        }
    );
}

#[test]
fn oversize_grids_cannot_be_journaled() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        EventWriter::create(dir.path().join("big.log"), 65_537, 1),
        Err(MazeError::CoordinateOverflow { .. })
    ));
    assert!(EventWriter::create(dir.path().join("edge.log"), 65_536, 1).is_ok());
}

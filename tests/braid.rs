use turbo_maze::{CellGrid, GeneratorConfig, GeneratorKind, MazeError, MazeStats, braid, generate};

fn perfect(seed: u64) -> CellGrid {
    generate(GeneratorKind::Backtracker, 50, 40, &GeneratorConfig::default().seed(seed))
        .unwrap()
        .0
}

#[test]
fn full_braid_leaves_no_dead_ends() {
    for seed in 0..4 {
        let mut grid = perfect(seed);
        let before = MazeStats::collect(&grid);
        assert!(before.dead_ends > 0);

        let carved = braid(&mut grid, 1.0, seed).unwrap();
        let after = MazeStats::collect(&grid);
        assert_eq!(after.dead_ends, 0, "seed {seed}");
        assert!(carved > 0 && carved <= before.dead_ends);
        assert_eq!(grid.open_edge_count(), 50 * 40 - 1 + carved);
    }
}

#[test]
fn zero_factor_is_a_no_op() {
    let mut grid = perfect(9);
    let before = grid.cells().to_vec();
    assert_eq!(braid(&mut grid, 0.0, 9).unwrap(), 0);
    assert_eq!(grid.cells(), &before[..]);
}

#[test]
fn partial_braid_removes_roughly_its_share() {
    let mut grid = perfect(3);
    let before = MazeStats::collect(&grid).dead_ends;
    let carved = braid(&mut grid, 0.5, 3).unwrap();
    let after = MazeStats::collect(&grid).dead_ends;

    let target = (before as f64 * 0.5).round() as usize;
    assert!(carved <= target);
    // Each carve clears at least one dead end, sometimes two.
    assert!(after <= before - carved);
    assert!(after >= before - 2 * carved);
}

#[test]
fn braid_is_deterministic_for_a_seed() {
    let mut a = perfect(5);
    let mut b = perfect(5);
    braid(&mut a, 0.7, 123).unwrap();
    braid(&mut b, 0.7, 123).unwrap();
    assert_eq!(a.cells(), b.cells());
}

#[test]
fn invalid_factor_is_an_error() {
    let mut grid = perfect(1);
    assert!(matches!(
        braid(&mut grid, 1.01, 0),
        Err(MazeError::InvalidBraidFactor(_))
    ));
}

#[test]
fn stats_of_a_perfect_maze_cover_every_cell() {
    let grid = perfect(2);
    let stats = MazeStats::collect(&grid);
    assert_eq!(stats.sealed, 0);
    assert_eq!(
        stats.dead_ends + stats.corridors + stats.junctions,
        stats.total
    );
    assert!(stats.dead_end_percent() > 0.0 && stats.dead_end_percent() < 100.0);

    let json = serde_json::to_value(stats).unwrap();
    assert_eq!(json["total"], 2000);
}

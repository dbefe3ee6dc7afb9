use std::collections::{HashSet, VecDeque};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use turbo_maze::{
    CellGrid, GenStatus, Generator, GeneratorConfig, GeneratorKind, Pos, Stepper,
    generate,
};

/// Cells reachable from (0, 0), via a plain flood over coordinate pairs.
fn reachable(grid: &CellGrid) -> HashSet<(u32, u32)> {
    let mut seen = HashSet::new();
    let mut queue = VecDeque::from([(0u32, 0u32)]);
    seen.insert((0, 0));
    while let Some((x, y)) = queue.pop_front() {
        for (n, _) in grid.open_neighbors(Pos::new(x, y)).unwrap() {
            if seen.insert((n.x, n.y)) {
                queue.push_back((n.x, n.y));
            }
        }
    }
    seen
}

fn seeded(seed: u64) -> GeneratorConfig {
    GeneratorConfig::default().seed(seed)
}

#[test]
fn perfect_generators_build_spanning_trees() {
    let mut rng = StdRng::seed_from_u64(0xC0FFEE);
    for kind in [
        GeneratorKind::Backtracker,
        GeneratorKind::Frontier,
        GeneratorKind::Organic,
    ] {
        for _ in 0..6 {
            let w = rng.random_range(1..40);
            let h = rng.random_range(1..40);
            let (grid, _) = generate(kind, w, h, &seeded(rng.random())).unwrap();
            let cells = (w * h) as usize;
            assert_eq!(grid.carved_count(), cells, "{kind} {w}x{h}");
            assert_eq!(grid.open_edge_count(), cells - 1, "{kind} {w}x{h}");
            assert_eq!(reachable(&grid).len(), cells, "{kind} {w}x{h}");
        }
    }
}

#[test]
fn block_carver_covers_and_connects_every_cell() {
    for (w, h, block) in [(64, 64, 16), (100, 37, 32), (5, 90, 4), (1, 1, 32)] {
        let config = seeded(17).block_size(block).thread_count(3);
        let (grid, _) = generate(GeneratorKind::Blocks, w, h, &config).unwrap();
        let cells = (w * h) as usize;
        assert_eq!(grid.carved_count(), cells, "{w}x{h}/{block}");
        assert_eq!(reachable(&grid).len(), cells, "{w}x{h}/{block}");
        assert!(grid.open_edge_count() >= cells - 1);
    }
}

#[test]
fn same_seed_same_bytes() {
    for kind in GeneratorKind::ALL {
        let config = seeded(0xDEAD_BEEF).block_size(8);
        let (a, _) = generate(kind, 45, 31, &config).unwrap();
        let (b, _) = generate(kind, 45, 31, &config).unwrap();
        assert_eq!(a.cells(), b.cells(), "{kind}");

        let (c, _) = generate(kind, 45, 31, &seeded(0xDEAD_BEF0).block_size(8)).unwrap();
        assert_ne!(a.cells(), c.cells(), "{kind}");
    }
}

#[test]
fn block_carver_deterministic_across_thread_counts() {
    let reference = {
        let config = seeded(99).block_size(16).thread_count(1);
        generate(GeneratorKind::Blocks, 200, 150, &config).unwrap().0
    };
    for threads in [2, 3, 8] {
        let config = seeded(99).block_size(16).thread_count(threads);
        let (grid, _) = generate(GeneratorKind::Blocks, 200, 150, &config).unwrap();
        assert_eq!(grid.cells(), reference.cells(), "threads={threads}");
    }
}

#[test]
fn organic_carver_deterministic_across_thread_counts() {
    let reference = {
        let config = seeded(41).walkers(64).thread_count(1);
        generate(GeneratorKind::Organic, 120, 90, &config).unwrap().0
    };
    assert_eq!(reference.carved_count(), 120 * 90);
    assert_eq!(reference.open_edge_count(), 120 * 90 - 1);
    assert_eq!(reachable(&reference).len(), 120 * 90);
    for threads in [2, 4, 7] {
        let config = seeded(41).walkers(64).thread_count(threads);
        let (grid, _) = generate(GeneratorKind::Organic, 120, 90, &config).unwrap();
        assert_eq!(grid.cells(), reference.cells(), "threads={threads}");
    }
}

#[test]
fn organic_carver_grows_from_the_centre_by_default() {
    let config = seeded(2).quota(1).walkers(1);
    let mut grid = CellGrid::new(9, 7).unwrap();
    let mut generator = Generator::new(GeneratorKind::Organic, &grid, &config).unwrap();
    assert_eq!(generator.step(&mut grid).unwrap(), GenStatus::Running);
    assert!(grid.is_carved(Pos::new(4, 3)).unwrap());
    assert_eq!(grid.carved_count(), 2);
}

#[test]
fn stepping_with_a_small_quota_matches_a_single_run() {
    let config = seeded(5).quota(3).walkers(8);
    for kind in [
        GeneratorKind::Backtracker,
        GeneratorKind::Frontier,
        GeneratorKind::Organic,
    ] {
        let mut stepped = CellGrid::new(20, 20).unwrap();
        let mut generator = Generator::new(kind, &stepped, &config).unwrap();
        let mut steps = 0;
        while generator.step(&mut stepped).unwrap() == GenStatus::Running {
            steps += 1;
        }
        assert!(steps > 20, "{kind} took {steps} steps");

        let (whole, _) = generate(kind, 20, 20, &seeded(5).walkers(8)).unwrap();
        assert_eq!(stepped.cells(), whole.cells(), "{kind}");
    }
}

#[test]
fn custom_start_cell_is_honoured() {
    let config = seeded(3).start(Pos::new(7, 2)).quota(1);
    let mut grid = CellGrid::new(10, 5).unwrap();
    let mut generator = Generator::new(GeneratorKind::Backtracker, &grid, &config).unwrap();
    generator.step(&mut grid).unwrap();
    assert!(grid.is_carved(Pos::new(7, 2)).unwrap());
    let opened = grid.open_neighbors(Pos::new(7, 2)).unwrap().count();
    assert_eq!(opened, 1);
}

#[test]
fn generator_rejects_a_grid_of_another_size() {
    let grid = CellGrid::new(8, 8).unwrap();
    let mut generator = Generator::new(GeneratorKind::Frontier, &grid, &seeded(1)).unwrap();
    let mut other = CellGrid::new(9, 8).unwrap();
    assert!(generator.step(&mut other).is_err());
}

#[test]
fn every_carved_passage_joins_lattice_neighbours() {
    let (grid, _) = generate(GeneratorKind::Blocks, 33, 33, &seeded(8).block_size(5)).unwrap();
    for y in 0..33 {
        for x in 0..33 {
            for (n, dir) in grid.open_neighbors(Pos::new(x, y)).unwrap() {
                assert!(!grid.has_wall(n, dir.reverse()).unwrap());
            }
        }
    }
}

use std::time::Instant;

use turbo_maze::{GeneratorConfig, GeneratorKind, Pos, SolverKind, generate, solve};

const SEED: u64 = 0x5EED_1234_ABCD_EF01;

fn bench_generate(kind: GeneratorKind, side: u32) -> (f64, turbo_maze::CellGrid) {
    let config = GeneratorConfig::default().seed(SEED);
    let start = Instant::now();
    let (grid, _) = generate(kind, side, side, &config).expect("generation failed");
    (start.elapsed().as_secs_f64() * 1000.0, grid)
}

fn bench_solve(kind: SolverKind, grid: &mut turbo_maze::CellGrid) -> (f64, usize) {
    let end = Pos::new(grid.width() - 1, grid.height() - 1);
    let start = Instant::now();
    let path = solve(kind, grid, Pos::new(0, 0), end).expect("solve failed");
    (start.elapsed().as_secs_f64() * 1000.0, path.len())
}

fn main() {
    let sides: &[u32] = &[
        256,  // 64K cells
        1024, // 1M cells
        2048, // 4M cells
        4096, // 16M cells
    ];
    let solvers = [SolverKind::BreadthFirst, SolverKind::UniformCost, SolverKind::AStar];

    println!(
        "{:<10} {:>10} {:>12} {:>10} {:>12} {:>10}",
        "Grid", "Generator", "Gen(ms)", "Solver", "Solve(ms)", "Path"
    );
    println!("{}", "-".repeat(70));

    for &side in sides {
        for kind in GeneratorKind::ALL {
            let (gen_ms, mut grid) = bench_generate(kind, side);
            for solver in solvers {
                let (solve_ms, path_len) = bench_solve(solver, &mut grid);
                println!(
                    "{:<10} {:>10} {:>12.1} {:>10} {:>12.1} {:>10}",
                    format!("{}x{}", side, side),
                    kind.as_str(),
                    gen_ms,
                    solver.as_str(),
                    solve_ms,
                    path_len
                );
            }
        }
    }
}

use criterion::{criterion_group, criterion_main, Criterion};
use grid_util::point::Point;
use rand::{rngs::StdRng, SeedableRng};
use std::hint::black_box;
use stepwise_pathfinding::{
    run_search, Algorithm, CancelToken, Grid, RunConfig, COLS, DEFAULT_WALL_DENSITY, ROWS,
};

const N_GRIDS: usize = 32;

fn random_grids() -> Vec<Grid> {
    let mut rng = StdRng::seed_from_u64(0);
    (0..N_GRIDS)
        .map(|_| {
            let mut grid = Grid::new(
                COLS,
                ROWS,
                Point::new(0, 0),
                Point::new(COLS as i32 - 1, ROWS as i32 - 1),
            );
            grid.randomize_walls(&mut rng, DEFAULT_WALL_DENSITY);
            grid
        })
        .collect()
}

fn session_bench(c: &mut Criterion) {
    let config = RunConfig::instant();
    let cancel = CancelToken::new();
    for algorithm in Algorithm::ALL {
        let mut grids = random_grids();
        c.bench_function(format!("{ROWS}x{COLS} random walls, {algorithm}").as_str(), |b| {
            b.iter(|| {
                for grid in grids.iter_mut() {
                    black_box(run_search(grid, algorithm, &config, &cancel, |_| {}).ok());
                }
            })
        });
    }
}

fn open_grid_bench(c: &mut Criterion) {
    let config = RunConfig::instant();
    let cancel = CancelToken::new();
    for algorithm in Algorithm::ALL {
        let mut grid = Grid::default();
        c.bench_function(format!("open default grid, {algorithm}").as_str(), |b| {
            b.iter(|| black_box(run_search(&mut grid, algorithm, &config, &cancel, |_| {}).ok()))
        });
    }
}

criterion_group!(benches, session_bench, open_grid_bench);
criterion_main!(benches);

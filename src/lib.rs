//! # stepwise_pathfinding
//!
//! Shortest-path search on a small editable 4-connected grid, run one frontier node at a
//! time so every step can be drawn. Three interchangeable engines are provided:
//! breadth-first search, Dijkstra's algorithm and A* with the
//! [Manhattan distance](https://en.wikipedia.org/wiki/Taxicab_geometry) as heuristic.
//! All edges have unit cost.
//!
//! A [Stepper](stepper::Stepper) drives one engine at a caller-chosen cadence and replays
//! the found path afterwards, while a [RunController](controller::RunController) holds the
//! per-session state: the grid, the selected algorithm, the speed and the guard that keeps
//! edits and concurrent runs out while a search is active.
pub mod controller;
pub mod error;
pub mod grid;
pub mod solver;
pub mod stepper;

pub use controller::{RunController, RunPoll};
pub use error::{GridStateError, ParseAlgorithmError, RunError};
pub use grid::{Cell, Grid, Role};
pub use solver::{Algorithm, StepOutcome, StepSolver};
pub use stepper::{run_search, CancelToken, RunConfig, RunResult, RunStats, Stepper, Tick};

pub use grid_util::point::Point;
use std::time::Duration;

/// Rows of the session grid.
pub const ROWS: usize = 20;
/// Columns of the session grid.
pub const COLS: usize = 20;
/// Default start cell as (row, column).
pub const DEFAULT_START: (usize, usize) = (10, 5);
/// Default end cell as (row, column).
pub const DEFAULT_END: (usize, usize) = (10, 15);

/// Stand-in for an infinite cost. Cost additions saturate at this value.
pub const INFINITE_COST: u32 = u32::MAX;

/// Delay between two search steps at speed 1.
pub const SEARCH_STEP_DELAY: Duration = Duration::from_millis(150);
/// Delay between two path animation steps at speed 1.
pub const PATH_STEP_DELAY: Duration = Duration::from_millis(100);
/// Speed multiplier of a new session.
pub const DEFAULT_SPEED: f32 = 5.0;
/// Fraction of cells walled by [Grid::randomize_walls] in the default session.
pub const DEFAULT_WALL_DENSITY: f64 = 0.2;

/// Manhattan distance between two points. Admissible and consistent on a 4-connected
/// unit-cost grid.
#[inline]
pub fn heuristic(a: Point, b: Point) -> u32 {
    a.x.abs_diff(b.x).saturating_add(a.y.abs_diff(b.y))
}

/// Follows the `came_from` chain back from `end` and returns the cells from the one after
/// the start up to and including `end`. Stops early if the chain breaks, which only
/// happens when `end` was never reached.
pub fn reconstruct_path(grid: &Grid, end: Point) -> Vec<Point> {
    let Some(end_ix) = grid.index_of(end) else {
        return Vec::new();
    };
    let mut path = std::iter::successors(Some(end_ix), |&ix| grid.cell_at(ix).came_from)
        .take(grid.cells().len())
        .take_while(|&ix| !grid.cell_at(ix).is_start())
        .map(|ix| grid.cell_at(ix).pos())
        .collect::<Vec<Point>>();
    path.reverse();
    path
}

/// Number of cells flagged as visited. Endpoints are never flagged and so never counted.
pub fn visited_count(grid: &Grid) -> usize {
    grid.cells().iter().filter(|c| c.visited).count()
}

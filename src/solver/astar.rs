use fxhash::{FxBuildHasher, FxHashSet};
use grid_util::point::Point;
use indexmap::IndexSet;
use itertools::Itertools;
use log::trace;

use crate::{grid::Grid, heuristic, solver::Algorithm, solver::StepOutcome, solver::StepSolver};

type FxIndexSet<K> = IndexSet<K, FxBuildHasher>;

/// A* with the Manhattan distance as heuristic. The open set keeps insertion order and the
/// lowest `f_score` is found by a linear scan, first minimum winning. Closed cells are keyed
/// by position.
#[derive(Clone, Debug, Default)]
pub struct AstarSolver {
    open: FxIndexSet<usize>,
    closed: FxHashSet<Point>,
}

impl AstarSolver {
    pub fn new() -> AstarSolver {
        AstarSolver::default()
    }
}

impl StepSolver for AstarSolver {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Astar
    }

    fn initialize(&mut self, grid: &mut Grid, start: Point, end: Point) {
        self.open.clear();
        self.closed.clear();
        let start_ix = grid.get_ix_point(&start);
        let cell = grid.cell_at_mut(start_ix);
        cell.g_score = 0;
        cell.f_score = heuristic(start, end);
        self.open.insert(start_ix);
    }

    fn step(&mut self, grid: &mut Grid, end: Point) -> StepOutcome {
        let Some(position) = self
            .open
            .iter()
            .position_min_by_key(|&&ix| grid.cell_at(ix).f_score)
        else {
            return StepOutcome::Exhausted;
        };
        let Some(current) = self.open.shift_remove_index(position) else {
            return StepOutcome::Exhausted;
        };
        let pos = grid.cell_at(current).pos();
        self.closed.insert(pos);
        trace!("A* expanding {} with f = {}", pos, grid.cell_at(current).f_score);
        if pos == end {
            return StepOutcome::Found;
        }
        grid.mark_visited(current);
        let tentative_g = grid.cell_at(current).g_score.saturating_add(1);
        for n in grid.neighbors(pos) {
            let n_ix = grid.get_ix_point(&n);
            if self.closed.contains(&n) || grid.cell_at(n_ix).is_wall {
                continue;
            }
            if !self.open.contains(&n_ix) {
                self.open.insert(n_ix);
            } else if tentative_g >= grid.cell_at(n_ix).g_score {
                continue;
            }
            let cell = grid.cell_at_mut(n_ix);
            cell.came_from = Some(current);
            cell.g_score = tentative_g;
            cell.f_score = tentative_g.saturating_add(heuristic(n, end));
        }
        if self.open.is_empty() {
            StepOutcome::Exhausted
        } else {
            StepOutcome::Continue
        }
    }
}

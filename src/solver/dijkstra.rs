use fxhash::FxBuildHasher;
use grid_util::point::Point;
use indexmap::IndexSet;
use itertools::Itertools;
use log::trace;

use crate::{grid::Grid, solver::Algorithm, solver::StepOutcome, solver::StepSolver, INFINITE_COST};

type FxIndexSet<K> = IndexSet<K, FxBuildHasher>;

/// Dijkstra's algorithm over the full set of unfinalized cells. The minimum is found with a
/// linear scan in insertion order, so ties go to the cell that entered the set first.
#[derive(Clone, Debug, Default)]
pub struct DijkstraSolver {
    unvisited: FxIndexSet<usize>,
}

impl DijkstraSolver {
    pub fn new() -> DijkstraSolver {
        DijkstraSolver::default()
    }
}

impl StepSolver for DijkstraSolver {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Dijkstra
    }

    fn initialize(&mut self, grid: &mut Grid, start: Point, _end: Point) {
        let start_ix = grid.get_ix_point(&start);
        self.unvisited = (0..grid.cells().len()).collect();
        for ix in 0..grid.cells().len() {
            grid.cell_at_mut(ix).distance = if ix == start_ix { 0 } else { INFINITE_COST };
        }
    }

    fn step(&mut self, grid: &mut Grid, end: Point) -> StepOutcome {
        let Some(position) = self
            .unvisited
            .iter()
            .position_min_by_key(|&&ix| grid.cell_at(ix).distance)
        else {
            return StepOutcome::Exhausted;
        };
        let Some(current) = self.unvisited.shift_remove_index(position) else {
            return StepOutcome::Exhausted;
        };
        let distance = grid.cell_at(current).distance;
        if distance == INFINITE_COST {
            // Everything left is unreachable.
            return StepOutcome::Exhausted;
        }
        let pos = grid.cell_at(current).pos();
        trace!("Dijkstra expanding {} at distance {}", pos, distance);
        if pos == end {
            return StepOutcome::Found;
        }
        grid.mark_visited(current);
        let new_distance = distance.saturating_add(1);
        for n in grid.neighbors(pos) {
            let n_ix = grid.get_ix_point(&n);
            let cell = grid.cell_at_mut(n_ix);
            if cell.is_wall {
                continue;
            }
            if new_distance < cell.distance {
                cell.distance = new_distance;
                cell.came_from = Some(current);
            }
        }
        if self.unvisited.is_empty() {
            StepOutcome::Exhausted
        } else {
            StepOutcome::Continue
        }
    }
}

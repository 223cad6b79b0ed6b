use fxhash::FxHashSet;
use grid_util::point::Point;
use log::trace;
use std::collections::VecDeque;

use crate::{grid::Grid, solver::Algorithm, solver::StepOutcome, solver::StepSolver};

/// Breadth-first search over a FIFO queue. A cell is marked as seen when it is enqueued, so
/// it is discovered at most once and its `came_from` is never overwritten.
#[derive(Clone, Debug, Default)]
pub struct BfsSolver {
    queue: VecDeque<usize>,
    seen: FxHashSet<usize>,
}

impl BfsSolver {
    pub fn new() -> BfsSolver {
        BfsSolver::default()
    }
}

impl StepSolver for BfsSolver {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Bfs
    }

    fn initialize(&mut self, grid: &mut Grid, start: Point, _end: Point) {
        self.queue.clear();
        self.seen.clear();
        let start_ix = grid.get_ix_point(&start);
        grid.cell_at_mut(start_ix).distance = 0;
        self.queue.push_back(start_ix);
        self.seen.insert(start_ix);
    }

    fn step(&mut self, grid: &mut Grid, end: Point) -> StepOutcome {
        let Some(current) = self.queue.pop_front() else {
            return StepOutcome::Exhausted;
        };
        let pos = grid.cell_at(current).pos();
        trace!("BFS expanding {}", pos);
        if pos == end {
            return StepOutcome::Found;
        }
        grid.mark_visited(current);
        let distance = grid.cell_at(current).distance.saturating_add(1);
        for n in grid.neighbors(pos) {
            let n_ix = grid.get_ix_point(&n);
            if self.seen.contains(&n_ix) || grid.cell_at(n_ix).is_wall {
                continue;
            }
            let cell = grid.cell_at_mut(n_ix);
            cell.came_from = Some(current);
            cell.distance = distance;
            self.seen.insert(n_ix);
            self.queue.push_back(n_ix);
        }
        if self.queue.is_empty() {
            StepOutcome::Exhausted
        } else {
            StepOutcome::Continue
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::tests::solve;
    use crate::{reconstruct_path, visited_count};

    #[test]
    fn expands_in_queue_order() {
        // |S..|
        // |...|
        let mut grid = Grid::new(3, 2, Point::new(0, 0), Point::new(2, 1));
        grid.reset_transient();
        let mut solver = BfsSolver::new();
        solver.initialize(&mut grid, Point::new(0, 0), Point::new(2, 1));
        assert_eq!(solver.step(&mut grid, Point::new(2, 1)), StepOutcome::Continue);
        // Down is discovered before right.
        let queued = solver
            .queue
            .iter()
            .map(|&ix| grid.cell_at(ix).pos())
            .collect::<Vec<_>>();
        assert_eq!(queued, vec![Point::new(0, 1), Point::new(1, 0)]);
        assert_eq!(visited_count(&grid), 0);
        assert_eq!(solver.step(&mut grid, Point::new(2, 1)), StepOutcome::Continue);
        assert!(grid.cell(Point::new(0, 1)).unwrap().visited);
    }

    #[test]
    fn finds_shortest_path() {
        let mut grid = Grid::new(4, 4, Point::new(0, 0), Point::new(3, 3));
        grid.set_wall(Point::new(1, 0), true);
        grid.set_wall(Point::new(1, 1), true);
        let (outcome, _) = solve(&mut BfsSolver::new(), &mut grid);
        assert_eq!(outcome, StepOutcome::Found);
        assert_eq!(reconstruct_path(&grid, Point::new(3, 3)).len(), 6);
        assert_eq!(grid.cell(Point::new(3, 3)).unwrap().distance, 6);
    }

    #[test]
    fn walled_in_end_is_exhausted() {
        // |S..|
        // |.#.|
        // |#E#|
        let mut grid = Grid::new(3, 3, Point::new(0, 0), Point::new(1, 2));
        for p in [Point::new(1, 1), Point::new(0, 2), Point::new(2, 2)] {
            grid.set_wall(p, true);
        }
        let (outcome, steps) = solve(&mut BfsSolver::new(), &mut grid);
        assert_eq!(outcome, StepOutcome::Exhausted);
        assert_eq!(steps, 5);
        assert_eq!(visited_count(&grid), 4);
    }
}

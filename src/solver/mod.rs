use crate::error::ParseAlgorithmError;
use crate::grid::Grid;
use core::fmt;
use grid_util::point::Point;
use std::str::FromStr;

pub mod astar;
pub mod bfs;
pub mod dijkstra;

use astar::AstarSolver;
use bfs::BfsSolver;
use dijkstra::DijkstraSolver;

/// Result of a single [StepSolver::step] call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    Continue,
    Found,
    Exhausted,
}

impl StepOutcome {
    pub fn is_terminal(self) -> bool {
        self != StepOutcome::Continue
    }
}

/// A search that can be advanced one frontier node at a time.
///
/// [initialize](Self::initialize) expects a grid whose transient state was just reset and
/// seeds the start cell. Each [step](Self::step) expands exactly one frontier node and marks
/// at most one cell as visited. Once a terminal outcome is returned the solver must be
/// initialized again before reuse.
pub trait StepSolver {
    fn algorithm(&self) -> Algorithm;
    fn initialize(&mut self, grid: &mut Grid, start: Point, end: Point);
    fn step(&mut self, grid: &mut Grid, end: Point) -> StepOutcome;
}

/// The available search algorithms.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Algorithm {
    #[default]
    Astar,
    Dijkstra,
    Bfs,
}

impl Algorithm {
    pub const ALL: [Algorithm; 3] = [Algorithm::Astar, Algorithm::Dijkstra, Algorithm::Bfs];

    /// Identifier used by [FromStr].
    pub fn id(self) -> &'static str {
        match self {
            Algorithm::Astar => "astar",
            Algorithm::Dijkstra => "dijkstra",
            Algorithm::Bfs => "bfs",
        }
    }

    /// A fresh, uninitialized solver for this algorithm.
    pub fn solver(self) -> Box<dyn StepSolver + Send> {
        match self {
            Algorithm::Astar => Box::new(AstarSolver::new()),
            Algorithm::Dijkstra => Box::new(DijkstraSolver::new()),
            Algorithm::Bfs => Box::new(BfsSolver::new()),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Algorithm::Astar => "A*",
            Algorithm::Dijkstra => "Dijkstra",
            Algorithm::Bfs => "BFS",
        })
    }
}

impl FromStr for Algorithm {
    type Err = ParseAlgorithmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Algorithm::ALL
            .into_iter()
            .find(|a| a.id().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseAlgorithmError(s.to_owned()))
    }
}

//! Typed errors.
//!
//! Only pre-flight failures are errors. A search that exhausts its frontier is a
//! normal outcome and is reported through [`crate::stepper::RunResult::found`].

use core::fmt;
use grid_util::point::Point;

/// Ways in which a [`Grid`](crate::grid::Grid) can violate the start/end invariant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridStateError {
    MissingStart,
    MissingEnd,
    /// Holds the number of cells carrying the start role.
    DuplicateStart(usize),
    /// Holds the number of cells carrying the end role.
    DuplicateEnd(usize),
    StartOnWall(Point),
    EndOnWall(Point),
}

impl fmt::Display for GridStateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingStart => write!(f, "grid has no start cell"),
            Self::MissingEnd => write!(f, "grid has no end cell"),
            Self::DuplicateStart(n) => write!(f, "grid has {n} start cells"),
            Self::DuplicateEnd(n) => write!(f, "grid has {n} end cells"),
            Self::StartOnWall(p) => write!(f, "start cell {p} is a wall"),
            Self::EndOnWall(p) => write!(f, "end cell {p} is a wall"),
        }
    }
}

impl std::error::Error for GridStateError {}

/// Reasons a run could not be started or did not complete.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RunError {
    /// The grid broke the start/end invariant; no engine was initialised.
    InvalidGridState(GridStateError),
    /// Another run has not resolved yet.
    RunInProgress,
    /// Speed factors must be finite and strictly positive.
    InvalidSpeed(f32),
    /// The run was abandoned through its [`CancelToken`](crate::stepper::CancelToken).
    Cancelled,
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidGridState(e) => write!(f, "invalid grid state: {e}"),
            Self::RunInProgress => write!(f, "a run is already in progress"),
            Self::InvalidSpeed(s) => write!(f, "invalid speed factor {s}"),
            Self::Cancelled => write!(f, "run was cancelled"),
        }
    }
}

impl std::error::Error for RunError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidGridState(e) => Some(e),
            _ => None,
        }
    }
}

impl From<GridStateError> for RunError {
    fn from(e: GridStateError) -> Self {
        Self::InvalidGridState(e)
    }
}

/// Returned when an algorithm identifier is not one of `astar`, `dijkstra` or `bfs`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseAlgorithmError(pub String);

impl fmt::Display for ParseAlgorithmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown algorithm '{}'", self.0)
    }
}

impl std::error::Error for ParseAlgorithmError {}

//! Drives a [StepSolver] one step per tick and replays the found path.
//!
//! The [Stepper] never sleeps itself: every [tick](Stepper::tick) returns the delay the caller
//! should wait before the next one, so the redraw callback and any event handling can run in
//! between. [run_search] is the blocking driver built on top of it.

use crate::error::RunError;
use crate::grid::Grid;
use crate::solver::{Algorithm, StepOutcome, StepSolver};
use crate::{reconstruct_path, visited_count, DEFAULT_SPEED, PATH_STEP_DELAY, SEARCH_STEP_DELAY};
use core::fmt;
use grid_util::point::Point;
use log::{info, trace, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Cadence of a run. Delays are divided by `speed`, so larger is faster.
#[derive(Clone, Debug, PartialEq)]
pub struct RunConfig {
    pub speed: f32,
    pub search_step_delay: Duration,
    pub path_step_delay: Duration,
}

impl Default for RunConfig {
    fn default() -> RunConfig {
        RunConfig {
            speed: DEFAULT_SPEED,
            search_step_delay: SEARCH_STEP_DELAY,
            path_step_delay: PATH_STEP_DELAY,
        }
    }
}

impl RunConfig {
    pub fn new(speed: f32) -> RunConfig {
        RunConfig {
            speed,
            ..RunConfig::default()
        }
    }

    /// No delays at all; every tick returns [Duration::ZERO].
    pub fn instant() -> RunConfig {
        RunConfig {
            speed: 1.0,
            search_step_delay: Duration::ZERO,
            path_step_delay: Duration::ZERO,
        }
    }

    pub fn validate(&self) -> Result<(), RunError> {
        if self.speed.is_finite() && self.speed > 0.0 {
            Ok(())
        } else {
            Err(RunError::InvalidSpeed(self.speed))
        }
    }

    pub fn search_delay(&self) -> Duration {
        scale_delay(self.search_step_delay, self.speed)
    }

    pub fn path_delay(&self) -> Duration {
        scale_delay(self.path_step_delay, self.speed)
    }
}

fn scale_delay(base: Duration, speed: f32) -> Duration {
    // Float to int casts saturate, so tiny speeds clamp instead of overflowing.
    Duration::from_nanos((base.as_nanos() as f64 / f64::from(speed)).round() as u64)
}

/// A cooperative-cancellation token backed by an [AtomicBool]. Clones share the flag.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> CancelToken {
        CancelToken::default()
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }
}

/// Everything a finished run reports. `elapsed` covers the search only, not the path
/// animation. When `found` is false the path is empty.
#[derive(Clone, Debug, PartialEq)]
pub struct RunResult {
    pub algorithm: Algorithm,
    pub found: bool,
    pub path: Vec<Point>,
    pub visited_count: usize,
    pub elapsed: Duration,
    /// Number of engine steps, excluding path animation.
    pub steps: usize,
}

impl RunResult {
    pub fn path_length(&self) -> usize {
        self.path.len()
    }

    /// Statistics for display, or [None] if no path was found.
    pub fn stats(&self) -> Option<RunStats> {
        self.found.then(|| RunStats {
            algorithm: self.algorithm,
            elapsed: self.elapsed,
            path_length: self.path.len(),
            visited_count: self.visited_count,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunStats {
    pub algorithm: Algorithm,
    pub elapsed: Duration,
    pub path_length: usize,
    pub visited_count: usize,
}

impl fmt::Display for RunStats {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}: path length {}, {} visited, {} ms",
            self.algorithm,
            self.path_length,
            self.visited_count,
            self.elapsed.as_millis()
        )
    }
}

/// What the caller should do after a [Stepper::tick].
#[derive(Clone, Debug, PartialEq)]
pub enum Tick {
    /// Tick again after the given delay.
    Pending(Duration),
    Ready(RunResult),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Searching,
    Animating,
    Done,
}

/// State of one run: the engine, the clock and the path being replayed.
pub struct Stepper {
    solver: Box<dyn StepSolver + Send>,
    end: Point,
    phase: Phase,
    started: Instant,
    elapsed: Duration,
    steps: usize,
    found: bool,
    visited_count: usize,
    path: Vec<Point>,
    next_path_ix: usize,
}

impl fmt::Debug for Stepper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stepper")
            .field("algorithm", &self.solver.algorithm())
            .field("phase", &self.phase)
            .field("steps", &self.steps)
            .finish()
    }
}

impl Stepper {
    /// Validates the grid, resets its transient state and initializes the engine for
    /// `algorithm`. Fails before touching the grid if the start/end invariant is broken.
    pub fn new(grid: &mut Grid, algorithm: Algorithm) -> Result<Stepper, RunError> {
        Stepper::with_solver(grid, algorithm.solver())
    }

    pub fn with_solver(
        grid: &mut Grid,
        mut solver: Box<dyn StepSolver + Send>,
    ) -> Result<Stepper, RunError> {
        let (start, end) = grid.validate().map_err(|e| {
            warn!("Rejecting run on invalid grid: {}", e);
            RunError::from(e)
        })?;
        grid.reset_transient();
        solver.initialize(grid, start, end);
        info!("Starting {} from {} to {}", solver.algorithm(), start, end);
        Ok(Stepper {
            solver,
            end,
            phase: Phase::Searching,
            started: Instant::now(),
            elapsed: Duration::ZERO,
            steps: 0,
            found: false,
            visited_count: 0,
            path: Vec::new(),
            next_path_ix: 0,
        })
    }

    pub fn algorithm(&self) -> Algorithm {
        self.solver.algorithm()
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Whether the search itself has terminated. Path animation may still be pending.
    pub fn search_finished(&self) -> bool {
        self.phase != Phase::Searching
    }

    /// Performs one engine step or marks one path cell, then calls `redraw`. Ticking a
    /// finished stepper returns the same result again without redrawing.
    pub fn tick<F>(&mut self, grid: &mut Grid, config: &RunConfig, redraw: &mut F) -> Tick
    where
        F: FnMut(&Grid),
    {
        match self.phase {
            Phase::Searching => {
                let outcome = self.solver.step(grid, self.end);
                self.steps += 1;
                trace!("Step {}: {:?}", self.steps, outcome);
                redraw(grid);
                match outcome {
                    StepOutcome::Continue => Tick::Pending(config.search_delay()),
                    StepOutcome::Found => {
                        self.finish_search(grid, true);
                        self.path = reconstruct_path(grid, self.end);
                        if self.path.is_empty() {
                            self.phase = Phase::Done;
                            Tick::Ready(self.result())
                        } else {
                            self.phase = Phase::Animating;
                            Tick::Pending(config.path_delay())
                        }
                    }
                    StepOutcome::Exhausted => {
                        self.finish_search(grid, false);
                        self.phase = Phase::Done;
                        Tick::Ready(self.result())
                    }
                }
            }
            Phase::Animating => {
                if let Some(ix) = self
                    .path
                    .get(self.next_path_ix)
                    .and_then(|p| grid.index_of(*p))
                {
                    grid.cell_at_mut(ix).on_path = true;
                }
                self.next_path_ix += 1;
                redraw(grid);
                if self.next_path_ix < self.path.len() {
                    Tick::Pending(config.path_delay())
                } else {
                    self.phase = Phase::Done;
                    Tick::Ready(self.result())
                }
            }
            Phase::Done => Tick::Ready(self.result()),
        }
    }

    fn finish_search(&mut self, grid: &Grid, found: bool) {
        self.elapsed = self.started.elapsed();
        self.found = found;
        self.visited_count = visited_count(grid);
        if found {
            info!(
                "{} found the end after {} steps, {} cells visited in {:?}",
                self.solver.algorithm(),
                self.steps,
                self.visited_count,
                self.elapsed
            );
        } else {
            info!(
                "{} exhausted the frontier after {} steps: no path found",
                self.solver.algorithm(),
                self.steps
            );
        }
    }

    fn result(&self) -> RunResult {
        RunResult {
            algorithm: self.solver.algorithm(),
            found: self.found,
            path: self.path.clone(),
            visited_count: self.visited_count,
            elapsed: self.elapsed,
            steps: self.steps,
        }
    }
}

/// Runs `algorithm` on `grid` to completion on the calling thread, sleeping between ticks
/// according to `config` and calling `redraw` after every step. Checks `cancel` before each
/// tick.
pub fn run_search<F>(
    grid: &mut Grid,
    algorithm: Algorithm,
    config: &RunConfig,
    cancel: &CancelToken,
    mut redraw: F,
) -> Result<RunResult, RunError>
where
    F: FnMut(&Grid),
{
    config.validate()?;
    let mut stepper = Stepper::new(grid, algorithm)?;
    loop {
        if cancel.is_cancelled() {
            warn!("{} run cancelled after {} steps", algorithm, stepper.steps());
            return Err(RunError::Cancelled);
        }
        match stepper.tick(grid, config, &mut redraw) {
            Tick::Pending(delay) => {
                if !delay.is_zero() {
                    thread::sleep(delay);
                }
            }
            Tick::Ready(result) => return Ok(result),
        }
    }
}

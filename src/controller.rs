use crate::error::RunError;
use crate::grid::Grid;
use crate::solver::Algorithm;
use crate::stepper::{CancelToken, RunConfig, RunResult, RunStats, Stepper, Tick};
use grid_util::point::Point;
use log::{debug, info, warn};
use rand::Rng;
use std::thread;
use std::time::Duration;

/// Result of [RunController::tick].
#[derive(Clone, Debug, PartialEq)]
pub enum RunPoll {
    /// No run is active.
    Idle,
    /// Tick again after the given delay.
    Pending(Duration),
    Finished(RunResult),
    /// The active run was abandoned; the grid keeps whatever the engine had marked so far.
    Cancelled,
}

/// One editing and visualisation session over a single [Grid].
///
/// While a run is in progress every editing operation is refused and returns `false`, and
/// [start_run](Self::start_run) fails with [RunError::RunInProgress]. The speed is read on
/// every tick, so changing it mid-run changes the cadence of the remaining steps.
#[derive(Debug)]
pub struct RunController {
    grid: Grid,
    algorithm: Algorithm,
    config: RunConfig,
    active: Option<Stepper>,
    cancel: CancelToken,
    last_stats: Option<RunStats>,
    home: Option<(Point, Point)>,
}

impl Default for RunController {
    fn default() -> RunController {
        RunController::new(Grid::default())
    }
}

impl RunController {
    /// Wraps `grid`. Its current start and end positions are restored by [reset](Self::reset).
    pub fn new(grid: Grid) -> RunController {
        let home = grid.validate().ok();
        RunController {
            grid,
            algorithm: Algorithm::default(),
            config: RunConfig::default(),
            active: None,
            cancel: CancelToken::new(),
            last_stats: None,
            home,
        }
    }
    pub fn with_config(mut self, config: RunConfig) -> RunController {
        self.config = config;
        self
    }
    pub fn grid(&self) -> &Grid {
        &self.grid
    }
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }
    /// Selects the algorithm for the next run. An active run keeps its engine.
    pub fn set_algorithm(&mut self, algorithm: Algorithm) {
        self.algorithm = algorithm;
    }
    pub fn config(&self) -> &RunConfig {
        &self.config
    }
    pub fn set_speed(&mut self, speed: f32) -> Result<(), RunError> {
        RunConfig { speed, ..self.config.clone() }.validate()?;
        self.config.speed = speed;
        Ok(())
    }
    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }
    /// Statistics of the last run that found a path.
    pub fn last_stats(&self) -> Option<&RunStats> {
        self.last_stats.as_ref()
    }
    /// Token that abandons the active run. A fresh token is issued by every
    /// [start_run](Self::start_run), so fetch it afterwards.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    fn edit<F>(&mut self, op: &str, f: F) -> bool
    where
        F: FnOnce(&mut Grid) -> bool,
    {
        if self.is_running() {
            debug!("Ignoring {} while a run is in progress", op);
            return false;
        }
        let changed = f(&mut self.grid);
        self.grid.update();
        changed
    }

    pub fn toggle_wall(&mut self, p: Point) -> bool {
        self.edit("wall toggle", |grid| grid.toggle_wall(p))
    }
    pub fn move_start(&mut self, p: Point) -> bool {
        self.edit("start move", |grid| grid.move_start(p))
    }
    pub fn move_end(&mut self, p: Point) -> bool {
        self.edit("end move", |grid| grid.move_end(p))
    }
    pub fn clear_walls(&mut self) -> bool {
        self.edit("wall clearing", |grid| {
            grid.clear_walls();
            true
        })
    }
    pub fn randomize_walls<R: Rng>(&mut self, rng: &mut R, density: f64) -> bool {
        self.edit("wall generation", |grid| {
            grid.randomize_walls(rng, density);
            true
        })
    }
    /// Clears the visited and path marks of the previous run along with its statistics.
    pub fn clear_path(&mut self) -> bool {
        let cleared = self.edit("path clearing", |grid| {
            grid.clear_path();
            true
        });
        if cleared {
            self.last_stats = None;
        }
        cleared
    }
    /// Restores an empty grid with the start and end positions the session began with.
    pub fn reset(&mut self) -> bool {
        let home = self.home;
        let reset = self.edit("grid reset", |grid| {
            match home {
                Some((start, end)) => *grid = Grid::new(grid.width(), grid.height(), start, end),
                None => {
                    grid.clear_walls();
                    grid.reset_transient();
                }
            }
            true
        });
        if reset {
            self.last_stats = None;
        }
        reset
    }

    /// Starts a run of the selected algorithm. Fails if a run is already active, the speed
    /// is invalid or the grid breaks the start/end invariant.
    pub fn start_run(&mut self) -> Result<(), RunError> {
        if self.is_running() {
            debug!("Rejecting run request: a run is already in progress");
            return Err(RunError::RunInProgress);
        }
        self.config.validate()?;
        let stepper = Stepper::new(&mut self.grid, self.algorithm)?;
        self.cancel = CancelToken::new();
        self.last_stats = None;
        self.active = Some(stepper);
        Ok(())
    }

    /// Advances the active run by one tick, calling `redraw` after the step.
    pub fn tick<F>(&mut self, redraw: &mut F) -> RunPoll
    where
        F: FnMut(&Grid),
    {
        let Some(stepper) = self.active.as_mut() else {
            return RunPoll::Idle;
        };
        if self.cancel.is_cancelled() {
            warn!("{} run cancelled after {} steps", stepper.algorithm(), stepper.steps());
            self.active = None;
            return RunPoll::Cancelled;
        }
        match stepper.tick(&mut self.grid, &self.config, redraw) {
            Tick::Pending(delay) => RunPoll::Pending(delay),
            Tick::Ready(result) => {
                self.active = None;
                self.last_stats = result.stats();
                match &self.last_stats {
                    Some(stats) => info!("{}", stats),
                    None => info!("No path found with {}", result.algorithm),
                }
                RunPoll::Finished(result)
            }
        }
    }

    /// Starts a run and drives it to completion on the calling thread.
    pub fn run<F>(&mut self, mut redraw: F) -> Result<RunResult, RunError>
    where
        F: FnMut(&Grid),
    {
        self.start_run()?;
        loop {
            match self.tick(&mut redraw) {
                RunPoll::Pending(delay) => {
                    if !delay.is_zero() {
                        thread::sleep(delay);
                    }
                }
                RunPoll::Finished(result) => return Ok(result),
                RunPoll::Idle | RunPoll::Cancelled => return Err(RunError::Cancelled),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn instant_controller() -> RunController {
        RunController::default().with_config(RunConfig::instant())
    }

    #[test]
    fn edits_are_refused_while_running() {
        let mut controller = instant_controller();
        controller.start_run().unwrap();
        assert!(controller.is_running());
        assert!(!controller.toggle_wall(Point::new(0, 0)));
        assert!(!controller.move_start(Point::new(0, 0)));
        assert!(!controller.clear_path());
        assert!(!controller.grid().cell(Point::new(0, 0)).unwrap().is_wall);
        assert_eq!(controller.start_run(), Err(RunError::RunInProgress));
    }

    #[test]
    fn run_records_stats_and_releases_guard() {
        let mut controller = instant_controller();
        controller.set_algorithm(Algorithm::Bfs);
        let result = controller.run(|_| {}).unwrap();
        assert!(result.found);
        assert_eq!(result.path_length(), 10);
        assert!(!controller.is_running());
        let stats = controller.last_stats().unwrap();
        assert_eq!(stats.algorithm, Algorithm::Bfs);
        assert_eq!(stats.path_length, 10);
        assert!(controller.toggle_wall(Point::new(0, 0)));
        assert!(controller.clear_path());
        assert!(controller.last_stats().is_none());
    }

    #[test]
    fn cancellation_releases_guard() {
        let mut controller = instant_controller();
        controller.start_run().unwrap();
        let mut noop = |_: &Grid| {};
        assert_eq!(controller.tick(&mut noop), RunPoll::Pending(Duration::ZERO));
        controller.cancel_token().cancel();
        assert_eq!(controller.tick(&mut noop), RunPoll::Cancelled);
        assert!(!controller.is_running());
        assert_eq!(controller.tick(&mut noop), RunPoll::Idle);
        assert!(controller.start_run().is_ok());
    }

    #[test]
    fn speed_must_be_positive() {
        let mut controller = instant_controller();
        assert_eq!(controller.set_speed(0.0), Err(RunError::InvalidSpeed(0.0)));
        assert!(controller.set_speed(10.0).is_ok());
        assert_eq!(controller.config().speed, 10.0);
    }

    #[test]
    fn speed_change_applies_to_active_run() {
        let mut controller = RunController::default();
        controller.start_run().unwrap();
        let mut noop = |_: &Grid| {};
        assert_eq!(
            controller.tick(&mut noop),
            RunPoll::Pending(Duration::from_millis(30))
        );
        controller.set_speed(10.0).unwrap();
        assert_eq!(
            controller.tick(&mut noop),
            RunPoll::Pending(Duration::from_millis(15))
        );
        assert!(controller.is_running());
    }

    #[test]
    fn components_follow_wall_edits() {
        // |S.E|
        let grid = Grid::new(3, 1, Point::new(0, 0), Point::new(2, 0));
        let (start, end) = (Point::new(0, 0), Point::new(2, 0));
        let mut controller = RunController::new(grid).with_config(RunConfig::instant());
        assert!(controller.toggle_wall(Point::new(1, 0)));
        assert!(!controller.grid().components_dirty);
        assert!(!controller.grid().reachable(&start, &end));
        assert!(!controller.run(|_| {}).unwrap().found);

        assert!(controller.toggle_wall(Point::new(1, 0)));
        assert!(controller.grid().reachable(&start, &end));

        let mut rng = StdRng::seed_from_u64(3);
        assert!(controller.randomize_walls(&mut rng, 1.0));
        assert!(!controller.grid().reachable(&start, &end));
        assert!(controller.clear_walls());
        assert!(controller.grid().reachable(&start, &end));
    }

    #[test]
    fn reset_restores_home_positions() {
        let mut controller = instant_controller();
        let mut rng = StdRng::seed_from_u64(7);
        assert!(controller.randomize_walls(&mut rng, 0.2));
        let free = controller
            .grid()
            .cells()
            .iter()
            .find(|c| !c.is_wall && !c.is_endpoint())
            .map(|c| c.pos())
            .unwrap();
        assert!(controller.move_end(free));
        assert!(controller.reset());
        let grid = controller.grid();
        assert!(grid.cells().iter().all(|c| !c.is_wall));
        assert_eq!(grid.validate(), Ok((Point::new(5, 10), Point::new(15, 10))));
    }

    #[test]
    fn invalid_grid_does_not_lock_session() {
        let mut controller =
            RunController::new(Grid::new(5, 5, Point::new(0, 0), Point::new(0, 0)));
        assert!(matches!(
            controller.start_run(),
            Err(RunError::InvalidGridState(_))
        ));
        assert!(!controller.is_running());
    }
}

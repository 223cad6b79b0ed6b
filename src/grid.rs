use crate::error::GridStateError;
use crate::{COLS, DEFAULT_END, DEFAULT_START, INFINITE_COST, ROWS};
use core::fmt;
use grid_util::point::Point;
use itertools::{iproduct, Itertools};
use log::debug;
use petgraph::unionfind::UnionFind;
use rand::Rng;
use smallvec::SmallVec;

/// The endpoint role of a cell. Walls are tracked separately in [Cell::is_wall].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Role {
    #[default]
    Normal,
    Start,
    End,
}

/// A single grid cell. The position is fixed at construction; `role` and `is_wall` are
/// edited between runs while the remaining fields are search-transient and cleared by
/// [Grid::reset_transient].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cell {
    pos: Point,
    pub role: Role,
    pub is_wall: bool,
    pub visited: bool,
    pub on_path: bool,
    /// Index of the discovering cell in the grid's cell storage.
    pub came_from: Option<usize>,
    pub distance: u32,
    pub g_score: u32,
    pub f_score: u32,
}

impl Cell {
    fn new(pos: Point) -> Cell {
        Cell {
            pos,
            role: Role::Normal,
            is_wall: false,
            visited: false,
            on_path: false,
            came_from: None,
            distance: INFINITE_COST,
            g_score: INFINITE_COST,
            f_score: INFINITE_COST,
        }
    }
    pub fn pos(&self) -> Point {
        self.pos
    }
    pub fn row(&self) -> usize {
        self.pos.y as usize
    }
    pub fn col(&self) -> usize {
        self.pos.x as usize
    }
    pub fn is_start(&self) -> bool {
        self.role == Role::Start
    }
    pub fn is_end(&self) -> bool {
        self.role == Role::End
    }
    pub fn is_endpoint(&self) -> bool {
        self.role != Role::Normal
    }
    fn reset_transient(&mut self) {
        self.visited = false;
        self.on_path = false;
        self.came_from = None;
        self.distance = INFINITE_COST;
        self.g_score = INFINITE_COST;
        self.f_score = INFINITE_COST;
    }
}

/// [Grid] owns every [Cell] in row-major order. Points use `x` for the column and `y` for
/// the row. Next to the cells it maintains a [UnionFind] over open cells so that
/// reachability can be queried without running a search.
#[derive(Clone, Debug)]
pub struct Grid {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
    pub components: UnionFind<usize>,
    pub components_dirty: bool,
}

impl Default for Grid {
    /// The 20x20 session grid with the start and end cells on the middle row.
    fn default() -> Grid {
        let (start_row, start_col) = DEFAULT_START;
        let (end_row, end_col) = DEFAULT_END;
        Grid::new(
            COLS,
            ROWS,
            Point::new(start_col as i32, start_row as i32),
            Point::new(end_col as i32, end_row as i32),
        )
    }
}

impl Grid {
    /// Creates an empty grid with all cells open. If `start` equals `end` the end role
    /// wins and the grid fails [validation](Self::validate).
    pub fn new(width: usize, height: usize, start: Point, end: Point) -> Grid {
        let cells = iproduct!(0..height, 0..width)
            .map(|(y, x)| Cell::new(Point::new(x as i32, y as i32)))
            .collect();
        let mut grid = Grid {
            width,
            height,
            cells,
            components: UnionFind::new(width * height),
            components_dirty: false,
        };
        grid.set_role(start, Role::Start);
        grid.set_role(end, Role::End);
        grid.generate_components();
        grid
    }
    pub fn width(&self) -> usize {
        self.width
    }
    pub fn height(&self) -> usize {
        self.height
    }
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }
    pub fn in_bounds(&self, p: Point) -> bool {
        p.x >= 0 && p.y >= 0 && (p.x as usize) < self.width && (p.y as usize) < self.height
    }
    pub fn index_of(&self, p: Point) -> Option<usize> {
        self.in_bounds(p).then(|| p.y as usize * self.width + p.x as usize)
    }
    pub(crate) fn get_ix_point(&self, p: &Point) -> usize {
        debug_assert!(self.in_bounds(*p));
        p.y as usize * self.width + p.x as usize
    }
    pub fn cell(&self, p: Point) -> Option<&Cell> {
        self.index_of(p).map(|ix| &self.cells[ix])
    }
    pub fn cell_at(&self, ix: usize) -> &Cell {
        &self.cells[ix]
    }
    pub(crate) fn cell_at_mut(&mut self, ix: usize) -> &mut Cell {
        &mut self.cells[ix]
    }

    /// Position of the first cell with the start role, if any.
    pub fn start(&self) -> Option<Point> {
        self.find_role(Role::Start)
    }
    /// Position of the first cell with the end role, if any.
    pub fn end(&self) -> Option<Point> {
        self.find_role(Role::End)
    }
    fn find_role(&self, role: Role) -> Option<Point> {
        self.cells.iter().find(|c| c.role == role).map(Cell::pos)
    }

    /// Checks that exactly one start and one end exist and that neither is a wall.
    /// Returns their positions.
    pub fn validate(&self) -> Result<(Point, Point), GridStateError> {
        let starts = self.cells.iter().filter(|c| c.is_start()).collect::<Vec<_>>();
        let ends = self.cells.iter().filter(|c| c.is_end()).collect::<Vec<_>>();
        let start = match starts.as_slice() {
            [] => return Err(GridStateError::MissingStart),
            [start] => *start,
            _ => return Err(GridStateError::DuplicateStart(starts.len())),
        };
        let end = match ends.as_slice() {
            [] => return Err(GridStateError::MissingEnd),
            [end] => *end,
            _ => return Err(GridStateError::DuplicateEnd(ends.len())),
        };
        if start.is_wall {
            return Err(GridStateError::StartOnWall(start.pos));
        }
        if end.is_wall {
            return Err(GridStateError::EndOnWall(end.pos));
        }
        Ok((start.pos, end.pos))
    }

    /// Clears every search-transient field. Roles and walls are left untouched.
    pub fn reset_transient(&mut self) {
        self.cells.iter_mut().for_each(Cell::reset_transient);
    }

    /// The in-bounds orthogonal neighbours of `p` in the order up, down, left, right.
    /// Walls are not filtered.
    pub fn neighbors(&self, p: Point) -> SmallVec<[Point; 4]> {
        [
            p.y.checked_sub(1).map(|y| Point::new(p.x, y)),
            p.y.checked_add(1).map(|y| Point::new(p.x, y)),
            p.x.checked_sub(1).map(|x| Point::new(x, p.y)),
            p.x.checked_add(1).map(|x| Point::new(x, p.y)),
        ]
        .into_iter()
        .flatten()
        .filter(|n| self.in_bounds(*n))
        .collect()
    }

    /// Flags a cell as explored. Endpoints are never flagged.
    pub(crate) fn mark_visited(&mut self, ix: usize) {
        let cell = &mut self.cells[ix];
        if !cell.is_endpoint() {
            cell.visited = true;
        }
    }

    /// Assigns a role without any checks. Editing code should prefer
    /// [move_start](Self::move_start) and [move_end](Self::move_end).
    pub fn set_role(&mut self, p: Point, role: Role) {
        if let Some(ix) = self.index_of(p) {
            self.cells[ix].role = role;
        }
    }

    /// Updates the wall flag of a position. Joins newly connected components and flags the
    /// components as dirty if they are (potentially) broken apart.
    pub fn set_wall(&mut self, p: Point, blocked: bool) {
        let Some(ix) = self.index_of(p) else {
            return;
        };
        if self.cells[ix].is_wall != blocked && blocked {
            self.components_dirty = true;
        } else if !blocked {
            for n in self.neighbors(p) {
                let n_ix = self.get_ix_point(&n);
                if !self.cells[n_ix].is_wall {
                    self.components.union(ix, n_ix);
                }
            }
        }
        self.cells[ix].is_wall = blocked;
    }

    /// Flips the wall flag of a non-endpoint cell. Returns whether anything changed.
    pub fn toggle_wall(&mut self, p: Point) -> bool {
        match self.cell(p) {
            Some(cell) if !cell.is_endpoint() => {
                let blocked = !cell.is_wall;
                self.set_wall(p, blocked);
                true
            }
            _ => false,
        }
    }

    /// Moves the start role to `to` unless `to` is a wall or the end cell.
    pub fn move_start(&mut self, to: Point) -> bool {
        self.move_endpoint(Role::Start, to)
    }

    /// Moves the end role to `to` unless `to` is a wall or the start cell.
    pub fn move_end(&mut self, to: Point) -> bool {
        self.move_endpoint(Role::End, to)
    }

    fn move_endpoint(&mut self, role: Role, to: Point) -> bool {
        let Some(to_ix) = self.index_of(to) else {
            return false;
        };
        let target = &self.cells[to_ix];
        if target.is_wall || target.is_endpoint() {
            debug!("Refusing to move {:?} onto {}", role, to);
            return false;
        }
        for cell in self.cells.iter_mut().filter(|c| c.role == role) {
            cell.role = Role::Normal;
        }
        self.cells[to_ix].role = role;
        true
    }

    /// Removes every wall.
    pub fn clear_walls(&mut self) {
        for cell in self.cells.iter_mut() {
            cell.is_wall = false;
        }
        self.generate_components();
    }

    /// Clears all walls, then walls each non-endpoint cell with probability `density`.
    pub fn randomize_walls<R: Rng>(&mut self, rng: &mut R, density: f64) {
        let density = if density.is_nan() { 0.0 } else { density.clamp(0.0, 1.0) };
        for cell in self.cells.iter_mut() {
            cell.is_wall = !cell.is_endpoint() && rng.gen_bool(density);
        }
        self.generate_components();
    }

    /// Clears the result of a previous run. Equivalent to [reset_transient](Self::reset_transient).
    pub fn clear_path(&mut self) {
        self.reset_transient();
    }

    /// Checks if start and goal are on the same connected component.
    pub fn reachable(&self, start: &Point, goal: &Point) -> bool {
        debug_assert!(!self.components_dirty, "components must be regenerated first");
        if self.in_bounds(*start) && self.in_bounds(*goal) {
            let start_ix = self.get_ix_point(start);
            let goal_ix = self.get_ix_point(goal);
            self.components.equiv(start_ix, goal_ix)
        } else {
            false
        }
    }

    /// Regenerates the components if they are marked as dirty.
    pub fn update(&mut self) {
        if self.components_dirty {
            self.generate_components();
        }
    }

    /// Generates a new [UnionFind] structure and links up open orthogonal neighbours.
    pub fn generate_components(&mut self) {
        self.components = UnionFind::new(self.width * self.height);
        self.components_dirty = false;
        for (y, x) in iproduct!(0..self.height as i32, 0..self.width as i32) {
            let point = Point::new(x, y);
            let parent_ix = self.get_ix_point(&point);
            if self.cells[parent_ix].is_wall {
                continue;
            }
            for p in [Point::new(x + 1, y), Point::new(x, y + 1)] {
                if let Some(ix) = self.index_of(p) {
                    if !self.cells[ix].is_wall {
                        self.components.union(parent_ix, ix);
                    }
                }
            }
        }
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for row in self.cells.chunks(self.width.max(1)) {
            let line = row
                .iter()
                .map(|c| match c.role {
                    Role::Start => 'S',
                    Role::End => 'E',
                    Role::Normal if c.is_wall => '#',
                    Role::Normal if c.on_path => '*',
                    Role::Normal if c.visited => 'o',
                    Role::Normal => '.',
                })
                .join("");
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn small_grid() -> Grid {
        Grid::new(3, 3, Point::new(0, 0), Point::new(2, 2))
    }

    #[test]
    fn neighbours_are_ordered_and_bounded() {
        let grid = small_grid();
        let centre = grid.neighbors(Point::new(1, 1));
        assert_eq!(
            centre.as_slice(),
            &[
                Point::new(1, 0),
                Point::new(1, 2),
                Point::new(0, 1),
                Point::new(2, 1)
            ]
        );
        let corner = grid.neighbors(Point::new(0, 0));
        assert_eq!(corner.as_slice(), &[Point::new(0, 1), Point::new(1, 0)]);
    }

    #[test]
    fn neighbours_of_extreme_points_are_empty() {
        let grid = small_grid();
        assert!(grid.neighbors(Point::new(i32::MIN, i32::MIN)).is_empty());
        assert!(grid.neighbors(Point::new(i32::MAX, i32::MAX)).is_empty());
    }

    #[test]
    fn full_density_walls_spare_endpoints() {
        let mut grid = Grid::new(4, 4, Point::new(1, 1), Point::new(3, 2));
        let mut rng = rand::rngs::StdRng::seed_from_u64(11);
        grid.randomize_walls(&mut rng, 1.0);
        assert!(grid.cells().iter().all(|c| c.is_wall != c.is_endpoint()));
        assert_eq!(grid.validate(), Ok((Point::new(1, 1), Point::new(3, 2))));
        assert!(!grid.reachable(&Point::new(1, 1), &Point::new(3, 2)));
    }

    #[test]
    fn reset_is_idempotent() {
        let mut grid = small_grid();
        grid.set_wall(Point::new(1, 1), true);
        let ix = grid.get_ix_point(&Point::new(1, 0));
        grid.mark_visited(ix);
        grid.cell_at_mut(ix).came_from = Some(0);
        grid.cell_at_mut(ix).distance = 1;
        grid.reset_transient();
        let once = grid.cells().to_vec();
        grid.reset_transient();
        assert_eq!(once, grid.cells());
        assert!(grid.cell(Point::new(1, 1)).unwrap().is_wall);
        assert!(!grid.cell(Point::new(1, 0)).unwrap().visited);
        assert_eq!(grid.cell(Point::new(1, 0)).unwrap().distance, INFINITE_COST);
    }

    #[test]
    fn endpoints_are_never_marked_visited() {
        let mut grid = small_grid();
        grid.mark_visited(0);
        assert!(!grid.cell_at(0).visited);
    }

    #[test]
    fn toggle_wall_skips_endpoints() {
        let mut grid = small_grid();
        assert!(!grid.toggle_wall(Point::new(0, 0)));
        assert!(grid.toggle_wall(Point::new(1, 0)));
        assert!(grid.cell(Point::new(1, 0)).unwrap().is_wall);
        assert!(grid.toggle_wall(Point::new(1, 0)));
        assert!(!grid.cell(Point::new(1, 0)).unwrap().is_wall);
    }

    #[test]
    fn moving_endpoints_respects_walls_and_roles() {
        let mut grid = small_grid();
        grid.set_wall(Point::new(1, 0), true);
        assert!(!grid.move_start(Point::new(1, 0)));
        assert!(!grid.move_start(Point::new(2, 2)));
        assert!(!grid.move_end(Point::new(0, 0)));
        assert_eq!(grid.start(), Some(Point::new(0, 0)));
        assert!(grid.move_start(Point::new(0, 2)));
        assert_eq!(grid.start(), Some(Point::new(0, 2)));
        assert!(grid.validate().is_ok());
    }

    #[test]
    fn validation_reports_broken_invariants() {
        let same = Grid::new(3, 3, Point::new(0, 0), Point::new(0, 0));
        assert_eq!(same.validate(), Err(GridStateError::MissingStart));

        let mut grid = small_grid();
        grid.set_role(Point::new(1, 1), Role::End);
        assert_eq!(grid.validate(), Err(GridStateError::DuplicateEnd(2)));

        let mut grid = small_grid();
        grid.set_wall(Point::new(0, 0), true);
        assert_eq!(
            grid.validate(),
            Err(GridStateError::StartOnWall(Point::new(0, 0)))
        );
    }

    /// Tests whether points are correctly mapped to different connected components
    #[test]
    fn test_component_generation() {
        // |S#.|
        // |.#.|
        // |.#E|
        let mut grid = small_grid();
        for y in 0..3 {
            grid.set_wall(Point::new(1, y), true);
        }
        grid.update();
        assert!(!grid.reachable(&Point::new(0, 0), &Point::new(2, 2)));
        assert!(grid.reachable(&Point::new(0, 0), &Point::new(0, 2)));
        grid.set_wall(Point::new(1, 2), false);
        assert!(grid.reachable(&Point::new(0, 0), &Point::new(2, 2)));
    }

    #[test]
    fn default_grid_matches_session_layout() {
        let grid = Grid::default();
        assert_eq!(grid.width(), COLS);
        assert_eq!(grid.height(), ROWS);
        assert_eq!(grid.validate(), Ok((Point::new(5, 10), Point::new(15, 10))));
    }

    #[test]
    fn display_draws_roles_and_walls() {
        let mut grid = small_grid();
        grid.set_wall(Point::new(1, 1), true);
        assert_eq!(grid.to_string(), "S..\n.#.\n..E\n");
    }
}

// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of nod and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Cost-aware 4-connected shortest-path search over a [`Grid`].
//!
//! The frontier is a min-heap keyed by `(running cost + heuristic, insertion sequence)`, so equal
//! priorities pop in insertion order and identical inputs always yield identical paths. Search
//! bookkeeping lives on the grid cells and is invalidated per search through the grid's
//! generation stamp instead of being cleared.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::error;

use super::grid::{Cell, Grid, Occupancy, Step};
use crate::model::{CellPoint, Point};

pub const DEFAULT_RECONSTRUCT_LIMIT: usize = 1000;

/// Weights applied by the planner and by [`PathPlanner::default_cost`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostModel {
    pub step_cost: u32,
    pub turn_penalty: u32,
    pub connection_cost: u32,
}

impl Default for CostModel {
    fn default() -> Self {
        Self { step_cost: 1, turn_penalty: 4, connection_cost: 2 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanError {
    NoPath,
    /// The goal cell itself is a hard blocker.
    Blocked,
    ReconstructionOverflow { limit: usize },
}

impl fmt::Display for PlanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoPath => f.write_str("no path between the endpoints"),
            Self::Blocked => f.write_str("goal cell is blocked"),
            Self::ReconstructionOverflow { limit } => {
                write!(f, "path reconstruction exceeded {limit} steps")
            }
        }
    }
}

impl std::error::Error for PlanError {}

type FrontierEntry = Reverse<(u32, u32, u32, u32)>;

#[derive(Debug, Clone)]
pub struct PathPlanner {
    costs: CostModel,
    reconstruct_limit: usize,
    // (estimated total, insertion sequence, running cost, cell index)
    frontier: BinaryHeap<FrontierEntry>,
}

impl Default for PathPlanner {
    fn default() -> Self {
        Self::new(CostModel::default(), DEFAULT_RECONSTRUCT_LIMIT)
    }
}

impl PathPlanner {
    pub fn new(costs: CostModel, reconstruct_limit: usize) -> Self {
        Self { costs, reconstruct_limit, frontier: BinaryHeap::new() }
    }

    pub fn costs(&self) -> CostModel {
        self.costs
    }

    /// Effective cap on reconstructed path length: never below the grid's cell count.
    pub fn reconstruct_limit(&self, grid: &Grid) -> usize {
        self.reconstruct_limit.max(grid.len())
    }

    /// The standard per-cell cost: `connection_cost` for cells already used by a connection,
    /// zero otherwise.
    pub fn default_cost(costs: CostModel) -> impl Fn(&Cell) -> i32 {
        let connection_cost = i32::try_from(costs.connection_cost).unwrap_or(i32::MAX);
        move |cell: &Cell| match cell.occupancy() {
            Occupancy::Connection => connection_cost,
            _ => 0,
        }
    }

    pub fn plan_default(
        &mut self,
        grid: &mut Grid,
        start: Point,
        goal: Point,
    ) -> Result<Vec<Point>, PlanError> {
        let cost_fn = Self::default_cost(self.costs);
        self.plan(grid, start, goal, cost_fn)
    }

    /// Finds a route from `start` to `goal` (world points) as a list of cell centers.
    ///
    /// Endpoints outside the grid are clipped onto it along the start-goal segment. `cost_fn`
    /// adds a per-cell cost on entering a cell; a negative value rejects the cell.
    pub fn plan<F>(
        &mut self,
        grid: &mut Grid,
        start: Point,
        goal: Point,
        cost_fn: F,
    ) -> Result<Vec<Point>, PlanError>
    where
        F: Fn(&Cell) -> i32,
    {
        let generation = grid.begin_search();
        self.frontier.clear();

        let (start, goal) = grid
            .clip_segment_to_bounds(grid.cell_at(start), grid.cell_at(goal))
            .ok_or(PlanError::NoPath)?;
        if start == goal {
            return Ok(vec![grid.position_at(start, true)]);
        }
        if grid.occupancy_at(goal).is_blocking() {
            return Err(PlanError::Blocked);
        }
        let (Some(start_idx), Some(goal_idx)) = (grid.cell_index(start), grid.cell_index(goal))
        else {
            return Err(PlanError::NoPath);
        };

        let step_cost = self.costs.step_cost;
        let turn_penalty = self.costs.turn_penalty;
        let heuristic = |cell: CellPoint| cell.manhattan(goal).saturating_mul(step_cost);

        let seed = grid.cell_mut_at_index(start_idx);
        seed.generation = generation;
        seed.came_from = -1;
        seed.running_cost = 0;
        seed.heading = None;

        let mut tie_seq = 0u32;
        self.frontier.push(Reverse((heuristic(start), tie_seq, 0, start_idx as u32)));

        while let Some(Reverse((_estimate, _tie, cost, idx))) = self.frontier.pop() {
            let idx = idx as usize;
            let (current, heading) = {
                let cell = &grid.cells()[idx];
                if cell.generation != generation || cell.running_cost != cost {
                    // Superseded by a cheaper entry.
                    continue;
                }
                (cell.position(), cell.heading)
            };

            if idx == goal_idx {
                return self.reconstruct(grid, start_idx, goal_idx);
            }

            for (dcol, drow) in neighbor_deltas_towards(current, goal) {
                let next = current.offset(dcol, drow);
                let Some(next_idx) = grid.cell_index(next) else {
                    continue;
                };

                let cell = &grid.cells()[next_idx];
                if cell.occupancy().is_blocking() {
                    continue;
                }
                let Ok(extra) = u32::try_from(cost_fn(cell)) else {
                    continue;
                };

                let step = Step::from_delta(dcol, drow);
                let turn = match heading {
                    Some(previous) if Some(previous) != step => turn_penalty,
                    _ => 0,
                };
                let next_cost =
                    cost.saturating_add(step_cost).saturating_add(extra).saturating_add(turn);
                if cell.generation == generation && cell.running_cost <= next_cost {
                    continue;
                }

                let cell = grid.cell_mut_at_index(next_idx);
                cell.generation = generation;
                cell.came_from = idx as i32;
                cell.running_cost = next_cost;
                cell.heading = step;

                tie_seq = tie_seq.wrapping_add(1);
                let estimate = next_cost.saturating_add(heuristic(next));
                self.frontier.push(Reverse((estimate, tie_seq, next_cost, next_idx as u32)));
            }
        }

        Err(PlanError::NoPath)
    }

    fn reconstruct(
        &self,
        grid: &Grid,
        start_idx: usize,
        goal_idx: usize,
    ) -> Result<Vec<Point>, PlanError> {
        let limit = self.reconstruct_limit(grid);
        let mut path = Vec::new();
        let mut cursor = goal_idx;
        loop {
            let cell = &grid.cells()[cursor];
            path.push(grid.position_at(cell.position(), true));
            if cursor == start_idx {
                break;
            }
            if path.len() > limit {
                error!(limit, "path reconstruction exceeded its step limit");
                return Err(PlanError::ReconstructionOverflow { limit });
            }
            let Ok(previous) = usize::try_from(cell.came_from) else {
                return Err(PlanError::NoPath);
            };
            cursor = previous;
        }
        path.reverse();
        Ok(path)
    }
}

/// Expansion order: the axes that close the distance to `goal` first (horizontal before
/// vertical), then the remaining directions in a fixed order.
fn neighbor_deltas_towards(current: CellPoint, goal: CellPoint) -> [(i32, i32); 4] {
    let primary_x = match goal.col.cmp(&current.col) {
        std::cmp::Ordering::Greater => Some((1, 0)),
        std::cmp::Ordering::Less => Some((-1, 0)),
        std::cmp::Ordering::Equal => None,
    };
    let primary_y = match goal.row.cmp(&current.row) {
        std::cmp::Ordering::Greater => Some((0, 1)),
        std::cmp::Ordering::Less => Some((0, -1)),
        std::cmp::Ordering::Equal => None,
    };

    let mut out = [(0, 0); 4];
    let mut idx = 0usize;
    for delta in [primary_x, primary_y].into_iter().flatten() {
        out[idx] = delta;
        idx += 1;
    }
    for delta in [(0, 1), (0, -1), (1, 0), (-1, 0)] {
        if primary_x == Some(delta) || primary_y == Some(delta) {
            continue;
        }
        out[idx] = delta;
        idx += 1;
    }

    debug_assert_eq!(idx, 4);
    out
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};

    use super::{neighbor_deltas_towards, CostModel, PathPlanner, PlanError};
    use crate::model::{CellPoint, Point, Rect};
    use crate::route::grid::{Grid, Occupancy};

    #[fixture]
    fn grid() -> Grid {
        Grid::with_bounds(24.0, Rect::new(0.0, 0.0, 240.0, 240.0)).expect("grid")
    }

    fn center(grid: &Grid, col: i32, row: i32) -> Point {
        grid.position_at(CellPoint::new(col, row), true)
    }

    fn cells_of(grid: &Grid, path: &[Point]) -> Vec<CellPoint> {
        path.iter().map(|p| grid.cell_at(*p)).collect()
    }

    fn bends(cells: &[CellPoint]) -> usize {
        cells
            .windows(3)
            .filter(|w| {
                (w[1].col - w[0].col, w[1].row - w[0].row)
                    != (w[2].col - w[1].col, w[2].row - w[1].row)
            })
            .count()
    }

    fn assert_unit_steps(cells: &[CellPoint]) {
        for pair in cells.windows(2) {
            assert_eq!(pair[0].manhattan(pair[1]), 1, "non-unit step {} -> {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn neighbor_order_prefers_goal_axes() {
        let at = CellPoint::new(5, 5);
        assert_eq!(
            neighbor_deltas_towards(at, CellPoint::new(9, 1)),
            [(1, 0), (0, -1), (0, 1), (-1, 0)]
        );
        assert_eq!(
            neighbor_deltas_towards(at, CellPoint::new(5, 9)),
            [(0, 1), (0, -1), (1, 0), (-1, 0)]
        );
    }

    #[rstest]
    fn same_cell_yields_single_point(mut grid: Grid) {
        let mut planner = PathPlanner::default();
        let path = planner
            .plan_default(&mut grid, Point::new(50.0, 50.0), Point::new(60.0, 70.0))
            .unwrap();
        assert_eq!(path, vec![center(&grid, 2, 2)]);
    }

    #[rstest]
    fn straight_run_on_empty_grid(mut grid: Grid) {
        let mut planner = PathPlanner::default();
        let (start, goal) = (center(&grid, 1, 4), center(&grid, 8, 4));
        let path = planner.plan_default(&mut grid, start, goal).unwrap();
        let cells = cells_of(&grid, &path);
        assert_eq!(cells.len(), 8);
        assert_eq!(bends(&cells), 0);
        assert_unit_steps(&cells);
    }

    #[rstest]
    fn turn_penalty_keeps_diagonal_route_to_one_bend(mut grid: Grid) {
        let mut planner = PathPlanner::default();
        let (start, goal) = (center(&grid, 0, 0), center(&grid, 5, 5));
        let path = planner.plan_default(&mut grid, start, goal).unwrap();
        let cells = cells_of(&grid, &path);
        assert_eq!(cells.first(), Some(&CellPoint::new(0, 0)));
        assert_eq!(cells.last(), Some(&CellPoint::new(5, 5)));
        assert_eq!(cells.len(), 11);
        assert_eq!(bends(&cells), 1);
        assert_unit_steps(&cells);
    }

    #[rstest]
    fn detours_around_node_block(mut grid: Grid) {
        grid.set_occupancy(Rect::new(72.0, 72.0, 71.0, 71.0), Occupancy::Node);
        let mut planner = PathPlanner::default();
        let start = center(&grid, 2, 4);
        let goal = center(&grid, 7, 4);

        let path = planner.plan_default(&mut grid, start, goal).unwrap();
        assert_eq!(path.first(), Some(&start));
        assert_eq!(path.last(), Some(&goal));

        let cells = cells_of(&grid, &path);
        assert_unit_steps(&cells);
        assert!(cells.len() > 6, "expected a detour, got {cells:?}");
        for cell in &cells {
            assert_ne!(grid.occupancy_at(*cell), Occupancy::Node, "path enters node at {cell}");
        }
    }

    #[rstest]
    fn plan_is_deterministic(mut grid: Grid) {
        grid.set_occupancy(Rect::new(72.0, 48.0, 23.0, 140.0), Occupancy::Node);
        grid.set_occupancy(Rect::new(144.0, 0.0, 23.0, 140.0), Occupancy::Connection);
        let mut planner = PathPlanner::default();
        let (start, goal) = (center(&grid, 0, 4), center(&grid, 9, 4));
        let a = planner.plan_default(&mut grid, start, goal);
        let b = planner.plan_default(&mut grid, start, goal);
        assert!(a.is_ok());
        assert_eq!(a, b);
    }

    #[rstest]
    fn walled_goal_has_no_path(mut grid: Grid) {
        for (col, row) in [(6, 5), (8, 5), (7, 4), (7, 6)] {
            grid.set_cell_occupancy(CellPoint::new(col, row), Occupancy::Node);
        }
        let mut planner = PathPlanner::default();
        let (start, goal) = (center(&grid, 1, 1), center(&grid, 7, 5));
        let result = planner.plan_default(&mut grid, start, goal);
        assert_eq!(result, Err(PlanError::NoPath));
    }

    #[rstest]
    fn blocked_goal_is_reported(mut grid: Grid) {
        grid.set_cell_occupancy(CellPoint::new(7, 5), Occupancy::Node);
        let mut planner = PathPlanner::default();
        let (start, goal) = (center(&grid, 1, 1), center(&grid, 7, 5));
        let result = planner.plan_default(&mut grid, start, goal);
        assert_eq!(result, Err(PlanError::Blocked));
    }

    #[rstest]
    fn negative_cost_rejects_cells(mut grid: Grid) {
        let mut planner = PathPlanner::default();
        let (start, goal) = (center(&grid, 0, 0), center(&grid, 9, 0));
        let path = planner
            .plan(&mut grid, start, goal, |cell| {
                if cell.row() == 0 && (1..9).contains(&cell.col()) {
                    -1
                } else {
                    0
                }
            })
            .unwrap();
        let cells = cells_of(&grid, &path);
        assert!(cells[1..cells.len() - 1].iter().all(|c| c.row != 0 || c.col == 0 || c.col == 9));
        assert_unit_steps(&cells);
    }

    #[rstest]
    fn connection_cells_cost_extra(mut grid: Grid) {
        // A vertical connection in column 4, open at row 9 only.
        grid.set_occupancy(Rect::new(96.0, 0.0, 23.0, 215.0), Occupancy::Connection);
        let costs = CostModel { connection_cost: 100, ..CostModel::default() };
        let mut planner = PathPlanner::new(costs, 1000);
        let (start, goal) = (center(&grid, 1, 4), center(&grid, 8, 4));
        let path = planner.plan_default(&mut grid, start, goal).unwrap();
        let cells = cells_of(&grid, &path);
        assert!(cells.contains(&CellPoint::new(4, 9)), "expected the detour via row 9: {cells:?}");

        let mut cheap = PathPlanner::default();
        let path = cheap.plan_default(&mut grid, start, goal).unwrap();
        assert_eq!(bends(&cells_of(&grid, &path)), 0);
    }

    #[rstest]
    fn out_of_range_endpoints_are_clipped(mut grid: Grid) {
        let mut planner = PathPlanner::default();
        let path = planner
            .plan_default(&mut grid, Point::new(-200.0, 108.0), Point::new(100.0, 108.0))
            .unwrap();
        assert_eq!(grid.cell_at(path[0]), CellPoint::new(0, 4));
        assert_eq!(grid.cell_at(*path.last().unwrap()), CellPoint::new(4, 4));
    }

    #[rstest]
    fn endpoints_outside_and_missing_grid_yield_no_path(mut grid: Grid) {
        let mut planner = PathPlanner::default();
        let result =
            planner.plan_default(&mut grid, Point::new(-500.0, -10.0), Point::new(-10.0, -500.0));
        assert_eq!(result, Err(PlanError::NoPath));

        let mut empty = Grid::new(24.0).unwrap();
        let result =
            planner.plan_default(&mut empty, Point::new(0.0, 0.0), Point::new(100.0, 0.0));
        assert_eq!(result, Err(PlanError::NoPath));
    }

    #[rstest]
    fn reconstruction_cycle_overflows(mut grid: Grid) {
        let mut planner = PathPlanner::new(CostModel::default(), 4);
        let (start, goal) = (center(&grid, 0, 0), center(&grid, 3, 0));
        planner.plan_default(&mut grid, start, goal).unwrap();

        // Point two visited cells at each other.
        let a = grid.cell_index(CellPoint::new(1, 0)).unwrap();
        let b = grid.cell_index(CellPoint::new(2, 0)).unwrap();
        grid.cell_mut_at_index(a).came_from = b as i32;
        grid.cell_mut_at_index(b).came_from = a as i32;

        let start = grid.cell_index(CellPoint::new(0, 0)).unwrap();
        let goal = grid.cell_index(CellPoint::new(3, 0)).unwrap();
        assert_eq!(
            planner.reconstruct(&grid, start, goal),
            Err(PlanError::ReconstructionOverflow { limit: 100 })
        );
    }
}

// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of nod and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Uniform occupancy grid overlaid on the canvas.
//!
//! Cells are stored row-major (`index = col + row * columns`). Besides its occupancy, every cell
//! carries the transient bookkeeping of the path search. Those fields are only meaningful while
//! the cell's `generation` stamp equals the grid's current search generation; they are never
//! bulk-cleared except when the generation counter wraps around.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::{CellPoint, Point, Rect};

pub const DEFAULT_CELL_SIZE: f64 = 24.0;

/// Upper bound on the cell count of one grid; larger bounds are rejected.
pub const MAX_GRID_CELLS: usize = 1 << 22;

/// Slack for float error when a rect edge lands exactly on a cell boundary.
const EDGE_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Occupancy {
    #[default]
    Empty,
    /// Outside the grid, or explicitly walled off.
    Solid,
    Connection,
    Node,
}

impl Occupancy {
    /// Hard blockers are never entered by the path search.
    pub fn is_blocking(self) -> bool {
        matches!(self, Self::Solid | Self::Node)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Solid => "solid",
            Self::Connection => "connection",
            Self::Node => "node",
        }
    }
}

/// One orthogonal step between neighboring cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    Right,
    Left,
    Down,
    Up,
}

impl Step {
    pub fn from_delta(dcol: i32, drow: i32) -> Option<Self> {
        match (dcol, drow) {
            (1, 0) => Some(Self::Right),
            (-1, 0) => Some(Self::Left),
            (0, 1) => Some(Self::Down),
            (0, -1) => Some(Self::Up),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    col: i32,
    row: i32,
    occupancy: Occupancy,
    pub(crate) generation: u32,
    pub(crate) came_from: i32,
    pub(crate) running_cost: u32,
    pub(crate) heading: Option<Step>,
}

impl Cell {
    fn new(col: i32, row: i32) -> Self {
        Self {
            col,
            row,
            occupancy: Occupancy::Empty,
            generation: 0,
            came_from: -1,
            running_cost: 0,
            heading: None,
        }
    }

    pub fn col(&self) -> i32 {
        self.col
    }

    pub fn row(&self) -> i32 {
        self.row
    }

    pub fn position(&self) -> CellPoint {
        CellPoint::new(self.col, self.row)
    }

    pub fn occupancy(&self) -> Occupancy {
        self.occupancy
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GridError {
    InvalidBounds { bounds: Rect },
    TooManyCells { bounds: Rect, cells: usize },
    InvalidCellSize { cell_size: f64 },
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidBounds { bounds } => write!(f, "invalid grid bounds {bounds}"),
            Self::TooManyCells { bounds, cells } => write!(
                f,
                "grid bounds {bounds} need {cells} cells (limit {MAX_GRID_CELLS})"
            ),
            Self::InvalidCellSize { cell_size } => {
                write!(f, "cell size must be positive and finite (got {cell_size})")
            }
        }
    }
}

impl std::error::Error for GridError {}

#[derive(Debug, Clone)]
pub struct Grid {
    origin: Point,
    cell_size: f64,
    bounds: Rect,
    columns: usize,
    rows: usize,
    cells: Vec<Cell>,
    generation: u32,
}

impl Grid {
    /// An empty (0x0) grid. Every lookup reports `Solid` until bounds are set.
    pub fn new(cell_size: f64) -> Result<Self, GridError> {
        if !(cell_size.is_finite() && cell_size > 0.0) {
            return Err(GridError::InvalidCellSize { cell_size });
        }
        Ok(Self {
            origin: Point::ORIGIN,
            cell_size,
            bounds: Rect::default(),
            columns: 0,
            rows: 0,
            cells: Vec::new(),
            generation: 0,
        })
    }

    pub fn with_bounds(cell_size: f64, bounds: Rect) -> Result<Self, GridError> {
        let mut grid = Self::new(cell_size)?;
        grid.set_bounds(bounds)?;
        Ok(grid)
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    pub fn origin(&self) -> Point {
        self.origin
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// The bounds last passed to [`Grid::set_bounds`].
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// The world rectangle covered by whole cells (may exceed `bounds` by less than a cell).
    pub fn world_bounds(&self) -> Rect {
        Rect::new(
            self.origin.x,
            self.origin.y,
            self.columns as f64 * self.cell_size,
            self.rows as f64 * self.cell_size,
        )
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Resizes the grid to cover `bounds`.
    ///
    /// Returns `Ok(false)` when the bounds are unchanged. On change all cells are reallocated
    /// with `Empty` occupancy; the caller is expected to re-mark occupancy afterwards.
    pub fn set_bounds(&mut self, bounds: Rect) -> Result<bool, GridError> {
        if bounds.is_empty() || !bounds.width.is_finite() || !bounds.height.is_finite() {
            debug!(%bounds, "ignoring degenerate grid bounds");
            return Err(GridError::InvalidBounds { bounds });
        }
        if bounds == self.bounds {
            return Ok(false);
        }

        let columns = (bounds.width / self.cell_size).ceil() as usize;
        let rows = (bounds.height / self.cell_size).ceil() as usize;
        let len = columns.saturating_mul(rows);
        if len > MAX_GRID_CELLS {
            return Err(GridError::TooManyCells { bounds, cells: len });
        }

        self.origin = bounds.top_left();
        self.bounds = bounds;
        self.columns = columns;
        self.rows = rows;
        self.cells.clear();
        self.cells.reserve(len);
        for row in 0..rows {
            for col in 0..columns {
                self.cells.push(Cell::new(col as i32, row as i32));
            }
        }

        debug!(%bounds, columns, rows, "grid rebuilt");
        Ok(true)
    }

    /// Maps a world point to its cell. Not bounds-checked.
    pub fn cell_at(&self, point: Point) -> CellPoint {
        let col = ((point.x - self.origin.x) / self.cell_size).floor();
        let row = ((point.y - self.origin.y) / self.cell_size).floor();
        CellPoint::new(col as i32, row as i32)
    }

    pub fn cell_index(&self, cell: CellPoint) -> Option<usize> {
        if cell.col < 0 || cell.row < 0 {
            return None;
        }
        let (col, row) = (cell.col as usize, cell.row as usize);
        if col >= self.columns || row >= self.rows {
            return None;
        }
        Some(col + row * self.columns)
    }

    pub fn cell(&self, cell: CellPoint) -> Option<&Cell> {
        self.cell_index(cell).map(|idx| &self.cells[idx])
    }

    /// Out-of-range coordinates report `Solid`.
    pub fn occupancy_at(&self, cell: CellPoint) -> Occupancy {
        self.cell(cell).map_or(Occupancy::Solid, Cell::occupancy)
    }

    /// Sets one cell. Out-of-range coordinates are ignored.
    pub fn set_cell_occupancy(&mut self, cell: CellPoint, occupancy: Occupancy) {
        if let Some(idx) = self.cell_index(cell) {
            self.cells[idx].occupancy = occupancy;
        }
    }

    pub fn set_occupancy_at(&mut self, point: Point, occupancy: Occupancy) {
        self.set_cell_occupancy(self.cell_at(point), occupancy);
    }

    /// Marks every cell touched by `rect`, both corners inclusive, clipped to the grid.
    ///
    /// Empty rectangles write nothing.
    pub fn set_occupancy(&mut self, rect: Rect, occupancy: Occupancy) {
        if rect.is_empty() || self.cells.is_empty() {
            return;
        }
        let c0 = self.cell_at(rect.top_left());
        let c1 = self.cell_at(rect.bottom_right());
        self.fill_cells(c0, c1, occupancy);
    }

    /// Marks every cell overlapping the interior of `rect`, clipped to the grid.
    ///
    /// Edges are half-open: a rect ending exactly on a cell boundary leaves the next cell alone,
    /// at any cell size.
    pub fn set_occupancy_covering(&mut self, rect: Rect, occupancy: Occupancy) {
        if rect.is_empty() || self.cells.is_empty() {
            return;
        }
        let c0 = self.cell_at(rect.top_left());
        let last = |edge: f64, origin: f64| {
            ((edge - origin) / self.cell_size - EDGE_EPSILON).ceil() as i32 - 1
        };
        let c1 = CellPoint::new(
            last(rect.right(), self.origin.x).max(c0.col),
            last(rect.bottom(), self.origin.y).max(c0.row),
        );
        self.fill_cells(c0, c1, occupancy);
    }

    /// Fills the inclusive cell range `c0..=c1`, clipped to the grid.
    fn fill_cells(&mut self, c0: CellPoint, c1: CellPoint, occupancy: Occupancy) {
        let col0 = c0.col.max(0);
        let row0 = c0.row.max(0);
        let col1 = c1.col.min(self.columns as i32 - 1);
        let row1 = c1.row.min(self.rows as i32 - 1);
        if col0 > col1 || row0 > row1 {
            return;
        }

        for row in row0..=row1 {
            let base = row as usize * self.columns;
            for col in col0..=col1 {
                self.cells[base + col as usize].occupancy = occupancy;
            }
        }
    }

    /// Resets the cells under `rect` to `Empty`.
    pub fn reset(&mut self, rect: Rect) {
        self.set_occupancy(rect, Occupancy::Empty);
    }

    pub fn clear_occupancy(&mut self) {
        for cell in &mut self.cells {
            cell.occupancy = Occupancy::Empty;
        }
    }

    /// World position of a cell: its center, or its top-left corner.
    pub fn position_at(&self, cell: CellPoint, centered: bool) -> Point {
        let half = if centered { self.cell_size / 2.0 } else { 0.0 };
        Point::new(
            self.origin.x + cell.col as f64 * self.cell_size + half,
            self.origin.y + cell.row as f64 * self.cell_size + half,
        )
    }

    pub fn snap_at(&self, point: Point, centered: bool) -> Point {
        self.position_at(self.cell_at(point), centered)
    }

    /// Snaps both corners of `rect` to the top-left corners of their cells.
    pub fn snap_rect(&self, rect: Rect) -> Rect {
        Rect::from_corners(
            self.snap_at(rect.top_left(), false),
            self.snap_at(rect.bottom_right(), false),
        )
    }

    /// Smallest cell-aligned rectangle containing `rect`.
    pub fn snap_rect_outward(&self, rect: Rect) -> Rect {
        let top_left = self.snap_at(rect.top_left(), false);
        let corner = rect.bottom_right();
        let mut bottom_right = self.snap_at(corner, false);
        if bottom_right.x < corner.x {
            bottom_right.x += self.cell_size;
        }
        if bottom_right.y < corner.y {
            bottom_right.y += self.cell_size;
        }
        Rect::from_corners(top_left, bottom_right)
    }

    /// Clips the cell-space segment `p1 -> p2` to `[0, columns) x [0, rows)`.
    ///
    /// Returns `None` when the segment misses the grid entirely (or the grid has no cells).
    pub fn clip_segment_to_bounds(
        &self,
        p1: CellPoint,
        p2: CellPoint,
    ) -> Option<(CellPoint, CellPoint)> {
        if self.cells.is_empty() {
            return None;
        }
        let max_col = (self.columns - 1) as f64;
        let max_row = (self.rows - 1) as f64;

        let (x0, y0) = (p1.col as f64, p1.row as f64);
        let (dx, dy) = ((p2.col - p1.col) as f64, (p2.row - p1.row) as f64);

        // Liang-Barsky against the closed box of valid cell coordinates.
        let mut t0 = 0.0_f64;
        let mut t1 = 1.0_f64;
        for (p, q) in [(-dx, x0), (dx, max_col - x0), (-dy, y0), (dy, max_row - y0)] {
            if p == 0.0 {
                if q < 0.0 {
                    return None;
                }
                continue;
            }
            let r = q / p;
            if p < 0.0 {
                if r > t1 {
                    return None;
                }
                t0 = t0.max(r);
            } else {
                if r < t0 {
                    return None;
                }
                t1 = t1.min(r);
            }
        }

        let at = |t: f64| {
            let col = (x0 + t * dx).round().clamp(0.0, max_col) as i32;
            let row = (y0 + t * dy).round().clamp(0.0, max_row) as i32;
            CellPoint::new(col, row)
        };
        Some((at(t0), at(t1)))
    }

    pub fn occupied_count(&self, occupancy: Occupancy) -> usize {
        self.cells.iter().filter(|cell| cell.occupancy == occupancy).count()
    }

    /// Starts a new search and returns its generation stamp.
    pub(crate) fn begin_search(&mut self) -> u32 {
        self.generation = self.generation.wrapping_add(1);
        if self.generation == 0 {
            for cell in &mut self.cells {
                cell.generation = 0;
            }
            self.generation = 1;
        }
        self.generation
    }

    pub(crate) fn cell_mut_at_index(&mut self, idx: usize) -> &mut Cell {
        &mut self.cells[idx]
    }

    #[cfg(test)]
    pub(crate) fn force_generation(&mut self, generation: u32) {
        self.generation = generation;
    }

    #[cfg(test)]
    pub(crate) fn generation(&self) -> u32 {
        self.generation
    }
}

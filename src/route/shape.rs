// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of nod and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use serde::{Deserialize, Serialize};

use super::grid::{Grid, Occupancy};
use super::planner::{PathPlanner, PlanError};
use crate::model::{CellPoint, Point, Rect};
use crate::render::Painter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteMode {
    /// A single straight segment between the anchors.
    Direct,
    #[default]
    Planned,
}

/// What a planned route falls back to when the planner finds nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoPathFallback {
    #[default]
    Direct,
    /// Keep the previous raw path, or go direct if there is none.
    KeepPrevious,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CurveSegment {
    Line { from: Point, to: Point },
    Quad { from: Point, ctrl: Point, to: Point },
}

impl CurveSegment {
    pub fn end(&self) -> Point {
        match self {
            Self::Line { to, .. } | Self::Quad { to, .. } => *to,
        }
    }

    fn points(&self) -> impl Iterator<Item = Point> {
        let pts = match *self {
            Self::Line { from, to } => [Some(from), Some(to), None],
            Self::Quad { from, ctrl, to } => [Some(from), Some(ctrl), Some(to)],
        };
        pts.into_iter().flatten()
    }

    fn translated(&self, offset: Point) -> Self {
        match *self {
            Self::Line { from, to } => Self::Line { from: from + offset, to: to + offset },
            Self::Quad { from, ctrl, to } => {
                Self::Quad { from: from + offset, ctrl: ctrl + offset, to: to + offset }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    Planned,
    Direct,
    FellBack(PlanError),
}

/// Presentable geometry of one connection.
///
/// `curve` and `bounds` are local to `origin`, the minimum corner of the raw path.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConnectionShape {
    raw_path: Vec<Point>,
    curve: Vec<CurveSegment>,
    bounds: Rect,
    origin: Point,
    corner_radius: f64,
}

impl ConnectionShape {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raw_path(&self) -> &[Point] {
        &self.raw_path
    }

    pub fn curve(&self) -> &[CurveSegment] {
        &self.curve
    }

    pub fn origin(&self) -> Point {
        self.origin
    }

    /// Bounds of the curve in local space.
    pub fn bounding_rect(&self) -> Rect {
        self.bounds
    }

    /// Bounds of the curve positioned on the canvas.
    pub fn scene_rect(&self) -> Rect {
        self.bounds.translated(self.origin)
    }

    /// Recomputes the raw path between two anchors and rebuilds the curve.
    pub fn update_route(
        &mut self,
        grid: &mut Grid,
        planner: &mut PathPlanner,
        start: Point,
        end: Point,
        mode: RouteMode,
        fallback: NoPathFallback,
    ) -> RouteOutcome {
        let outcome = match mode {
            RouteMode::Direct => {
                self.raw_path = vec![start, end];
                RouteOutcome::Direct
            }
            RouteMode::Planned => match planner.plan_default(grid, start, end) {
                Ok(path) => {
                    self.raw_path = path;
                    RouteOutcome::Planned
                }
                Err(err) => {
                    let keep = fallback == NoPathFallback::KeepPrevious
                        && self.raw_path.len() >= 2;
                    if !keep {
                        self.raw_path = vec![start, end];
                    }
                    RouteOutcome::FellBack(err)
                }
            },
        };
        self.rebuild_curve(grid.cell_size());
        outcome
    }

    pub fn set_raw_path(&mut self, path: Vec<Point>, cell_size: f64) {
        self.raw_path = path;
        self.rebuild_curve(cell_size);
    }

    /// Rebuilds `curve` and `bounds` from `raw_path`, rounding every corner with a quadratic
    /// segment of radius `cell_size / 2`.
    pub fn rebuild_curve(&mut self, cell_size: f64) {
        self.curve.clear();
        self.corner_radius = cell_size / 2.0;
        if self.raw_path.len() < 2 {
            self.bounds = Rect::default();
            self.origin = self.raw_path.first().copied().unwrap_or_default();
            return;
        }

        let origin = self.raw_path.iter().copied().fold(self.raw_path[0], Point::min);
        let local = collapse_collinear(&self.raw_path)
            .into_iter()
            .map(|p| p - origin)
            .collect::<Vec<_>>();
        let radius = self.corner_radius;

        let mut cursor = local[0];
        for triple in local.windows(3) {
            let (prev, corner, next) = (triple[0], triple[1], triple[2]);
            let d1 = (corner - prev).normalized();
            let d2 = (next - corner).normalized();
            if d1.dot(d2) < 1.0 - 1e-9 {
                let enter = corner - d1 * radius;
                let leave = corner + d2 * radius;
                self.curve.push(CurveSegment::Line { from: cursor, to: enter });
                self.curve.push(CurveSegment::Quad { from: enter, ctrl: corner, to: leave });
                cursor = leave;
            } else {
                self.curve.push(CurveSegment::Line { from: cursor, to: corner });
                cursor = corner;
            }
        }
        if let Some(last) = local.last() {
            self.curve.push(CurveSegment::Line { from: cursor, to: *last });
        }

        let mut min = local[0];
        let mut max = local[0];
        for p in self.curve.iter().flat_map(CurveSegment::points) {
            min = min.min(p);
            max = max.max(p);
        }
        self.origin = origin;
        self.bounds = Rect::from_corners(min, max);
    }

    /// Cells covered by the raw path: for each consecutive pair, the straight run along the
    /// dominant axis.
    pub fn covered_cells(&self, grid: &Grid) -> Vec<CellPoint> {
        let mut out = Vec::new();
        for pair in self.raw_path.windows(2) {
            let a = grid.cell_at(pair[0]);
            let b = grid.cell_at(pair[1]);
            if a.col.abs_diff(b.col) > a.row.abs_diff(b.row) {
                let (lo, hi) = (a.col.min(b.col), a.col.max(b.col));
                out.extend((lo..=hi).map(|col| CellPoint::new(col, a.row)));
            } else {
                let (lo, hi) = (a.row.min(b.row), a.row.max(b.row));
                out.extend((lo..=hi).map(|row| CellPoint::new(a.col, row)));
            }
        }
        out
    }

    /// Marks the covered cells as `Connection`. Node and solid cells are left alone.
    pub fn write_occupancy(&self, grid: &mut Grid) {
        for cell in self.covered_cells(grid) {
            if grid.occupancy_at(cell) == Occupancy::Empty {
                grid.set_cell_occupancy(cell, Occupancy::Connection);
            }
        }
    }

    /// Returns the covered `Connection` cells to `Empty`.
    pub fn clear_occupancy(&self, grid: &mut Grid) {
        for cell in self.covered_cells(grid) {
            if grid.occupancy_at(cell) == Occupancy::Connection {
                grid.set_cell_occupancy(cell, Occupancy::Empty);
            }
        }
    }

    /// Strokes the curve in canvas coordinates.
    pub fn draw(&self, painter: &mut dyn Painter) {
        for segment in &self.curve {
            match segment.translated(self.origin) {
                CurveSegment::Line { from, to } => painter.line(from, to),
                CurveSegment::Quad { from, ctrl, to } => painter.quad(from, ctrl, to),
            }
        }
    }
}

fn collapse_collinear(path: &[Point]) -> Vec<Point> {
    let mut out: Vec<Point> = Vec::with_capacity(path.len());
    for &p in path {
        if out.last() == Some(&p) {
            continue;
        }
        if out.len() >= 2 {
            let a = out[out.len() - 2];
            let b = out[out.len() - 1];
            let d1 = (b - a).normalized();
            let d2 = (p - b).normalized();
            if (d1.dot(d2) - 1.0).abs() <= 1e-9 {
                out.pop();
            }
        }
        out.push(p);
    }
    out
}

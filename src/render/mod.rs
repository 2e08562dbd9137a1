// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of nod and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Text presentation of scenes and grids.
//!
//! Shapes and node visuals draw through the [`Painter`] trait in world coordinates.
//! [`CellPainter`] rasterizes those calls onto a [`Canvas`], one text row per grid row and
//! `x_scale` text columns per grid column.

mod canvas;
pub mod overlay;
pub mod scene;
pub mod text;

pub use canvas::{Canvas, CanvasError};
pub use overlay::{draw_grid_overlay, occupancy_color};
pub use scene::{render_scene_canvas, render_scene_unicode, SceneRenderError, SCENE_X_SCALE};
pub use text::grid_to_text;

use crate::model::{Point, Rect};
use text::truncate_with_ellipsis;

/// Drawing surface for connection shapes and node visuals.
pub trait Painter {
    fn line(&mut self, from: Point, to: Point);
    /// Quadratic segment; `ctrl` is the corner it rounds.
    fn quad(&mut self, from: Point, ctrl: Point, to: Point);
    fn rect(&mut self, rect: Rect);
    fn text(&mut self, at: Point, text: &str);
    /// Caption on the top edge of `rect`, shortened to fit between its borders.
    fn label(&mut self, rect: Rect, text: &str);
}

/// Rasterizes world-space drawing onto a [`Canvas`].
#[derive(Debug)]
pub struct CellPainter<'a> {
    canvas: &'a mut Canvas,
    origin: Point,
    cell_size: f64,
    x_scale: usize,
}

impl<'a> CellPainter<'a> {
    pub fn new(canvas: &'a mut Canvas, origin: Point, cell_size: f64, x_scale: usize) -> Self {
        Self { canvas, origin, cell_size, x_scale: x_scale.max(1) }
    }

    /// Text position of a world point.
    pub fn to_cell(&self, point: Point) -> (i64, i64) {
        let gx = (point.x - self.origin.x) / self.cell_size;
        let gy = (point.y - self.origin.y) / self.cell_size;
        ((gx * self.x_scale as f64).floor() as i64, gy.floor() as i64)
    }

    fn grid_cell(&self, point: Point) -> (i64, i64) {
        let gx = (point.x - self.origin.x) / self.cell_size;
        let gy = (point.y - self.origin.y) / self.cell_size;
        (gx.floor() as i64, gy.floor() as i64)
    }
}

impl Painter for CellPainter<'_> {
    fn line(&mut self, from: Point, to: Point) {
        let (x0, y0) = self.to_cell(from);
        let (x1, y1) = self.to_cell(to);
        // Off-axis lines are drawn as an L, horizontal leg first.
        if x0 != x1 {
            self.canvas.hline(x0, x1, y0);
        }
        if y0 != y1 || x0 == x1 {
            self.canvas.vline(x1, y0, y1);
        }
    }

    fn quad(&mut self, from: Point, ctrl: Point, to: Point) {
        self.line(from, ctrl);
        self.line(ctrl, to);
    }

    fn rect(&mut self, rect: Rect) {
        if rect.is_empty() {
            return;
        }
        let scale = self.x_scale as i64;
        let (x0, y0) = self.to_cell(rect.top_left());
        // Last text column of the last covered cell.
        let (col1, y1) = self.grid_cell(Point::new(rect.right() - 0.5, rect.bottom() - 0.5));
        self.canvas.outline(x0, y0, col1 * scale + scale - 1, y1);
    }

    fn text(&mut self, at: Point, text: &str) {
        let (x, y) = self.to_cell(at);
        self.canvas.put_str(x, y, text);
    }

    fn label(&mut self, rect: Rect, text: &str) {
        if rect.is_empty() {
            return;
        }
        let scale = self.x_scale as i64;
        let (x0, y0) = self.to_cell(rect.top_left());
        let (col1, _) = self.grid_cell(Point::new(rect.right() - 0.5, rect.top()));
        let inner = (col1 * scale + scale - 1) - x0 - 1;
        let room = usize::try_from(inner).unwrap_or(0);
        self.canvas.put_str(x0 + 1, y0, &truncate_with_ellipsis(text, room));
    }
}

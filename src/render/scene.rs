// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of nod and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt;

use super::{Canvas, CanvasError, CellPainter};
use crate::route::Scene;

/// Text columns per grid column; keeps cells roughly square in a terminal.
pub const SCENE_X_SCALE: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SceneRenderError {
    Canvas(CanvasError),
}

impl fmt::Display for SceneRenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Canvas(err) => write!(f, "scene canvas error: {err}"),
        }
    }
}

impl std::error::Error for SceneRenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Canvas(err) => Some(err),
        }
    }
}

impl From<CanvasError> for SceneRenderError {
    fn from(value: CanvasError) -> Self {
        Self::Canvas(value)
    }
}

/// Draws the scene onto a canvas covering its grid: routes first, then nodes on top.
pub fn render_scene_canvas(scene: &Scene) -> Result<Canvas, SceneRenderError> {
    let grid = scene.grid();
    let width = grid
        .columns()
        .checked_mul(SCENE_X_SCALE)
        .ok_or(CanvasError::AreaOverflow { width: grid.columns(), height: grid.rows() })?;
    let mut canvas = Canvas::new(width, grid.rows())?;
    let cell_size = grid.cell_size();

    let mut painter = CellPainter::new(&mut canvas, grid.origin(), cell_size, SCENE_X_SCALE);
    for shape in scene.shapes().values() {
        shape.draw(&mut painter);
    }
    if let Some(drag) = scene.drag() {
        drag.shape().draw(&mut painter);
    }
    for node in scene.graph().nodes().values() {
        scene.visual().draw(node, &mut painter, cell_size);
    }
    Ok(canvas)
}

/// Renders the scene as Unicode box-drawing text.
pub fn render_scene_unicode(scene: &Scene) -> Result<String, SceneRenderError> {
    Ok(render_scene_canvas(scene)?.to_string_trimmed())
}

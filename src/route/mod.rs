// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of nod and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Orthogonal connection routing over a uniform occupancy grid.

pub mod grid;
pub mod planner;
pub mod scene;
pub mod shape;


pub use grid::{Cell, Grid, GridError, Occupancy, Step, DEFAULT_CELL_SIZE, MAX_GRID_CELLS};
pub use planner::{CostModel, PathPlanner, PlanError, DEFAULT_RECONSTRUCT_LIMIT};
pub use scene::{ConnectionDrag, PassReport, Scene, SceneError, UpdateError};
pub use shape::{ConnectionShape, CurveSegment, NoPathFallback, RouteMode, RouteOutcome};

// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of nod and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! nod: node-graph canvas with grid-based orthogonal connection routing.
//!
//! [`model`] holds the graph, [`route`] owns the occupancy grid, the path planner and the
//! [`route::Scene`] that keeps every connection routed. [`render`] and [`tui`] present it.

pub mod config;
pub mod document;
pub mod layout;
pub mod model;
pub mod render;
pub mod route;
pub mod tui;

// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of nod and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Grid occupancy debug overlay for the terminal viewer.

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Color;

use crate::route::grid::{Grid, Occupancy};

/// Debug palette: free cells stay transparent.
pub fn occupancy_color(occupancy: Occupancy) -> Option<Color> {
    match occupancy {
        Occupancy::Empty => None,
        Occupancy::Solid => Some(Color::Black),
        Occupancy::Connection => Some(Color::Blue),
        Occupancy::Node => Some(Color::Green),
    }
}

/// Tints the background of `area` by cell occupancy.
///
/// Grid cell `(col, row)` covers buffer cells `area.x + (col - scroll.0) * x_scale ..` on row
/// `area.y + row - scroll.1`; anything outside `area` is skipped.
pub fn draw_grid_overlay(
    grid: &Grid,
    buf: &mut Buffer,
    area: Rect,
    scroll: (u16, u16),
    x_scale: u16,
) {
    let x_scale = x_scale.max(1);
    let visible = area.intersection(buf.area);
    for cell in grid.cells() {
        let Some(color) = occupancy_color(cell.occupancy()) else {
            continue;
        };
        let (Ok(col), Ok(row)) = (u16::try_from(cell.col()), u16::try_from(cell.row())) else {
            continue;
        };
        let Some(row) = row.checked_sub(scroll.1) else {
            continue;
        };
        let Some(col) = col.checked_sub(scroll.0) else {
            continue;
        };

        let y = area.y.saturating_add(row);
        for dx in 0..x_scale {
            let x = area.x.saturating_add(col.saturating_mul(x_scale)).saturating_add(dx);
            if x >= visible.right() || y >= visible.bottom() || x < visible.x || y < visible.y {
                continue;
            }
            buf.get_mut(x, y).set_bg(color);
        }
    }
}

// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of nod and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use crate::model::CellPoint;
use crate::route::grid::{Grid, Occupancy};

pub fn occupancy_char(occupancy: Occupancy) -> char {
    match occupancy {
        Occupancy::Empty => '.',
        Occupancy::Solid => '#',
        Occupancy::Connection => '+',
        Occupancy::Node => 'N',
    }
}

/// One character per cell, one line per row.
pub fn grid_to_text(grid: &Grid) -> String {
    let mut out = String::with_capacity(grid.len() + grid.rows());
    for row in 0..grid.rows() {
        if row > 0 {
            out.push('\n');
        }
        for col in 0..grid.columns() {
            let cell = CellPoint::new(col as i32, row as i32);
            out.push(occupancy_char(grid.occupancy_at(cell)));
        }
    }
    out
}

pub(crate) fn truncate_with_ellipsis(text: &str, max_len: usize) -> String {
    if max_len == 0 {
        return String::new();
    }
    if text.chars().count() <= max_len {
        return text.to_owned();
    }
    let mut out = text.chars().take(max_len - 1).collect::<String>();
    out.push('…');
    out
}

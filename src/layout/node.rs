// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of nod and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::{Direction, Node, Point, PortId, Rect, Size};
use crate::render::Painter;
use crate::route::grid::{Grid, Occupancy};

pub const PORT_MARKER_INPUT: &str = "○";
pub const PORT_MARKER_OUTPUT: &str = "●";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeStyle {
    /// Height of the caption band above the first port row.
    pub header_height: f64,
    pub port_radius: f64,
    pub min_width: f64,
}

impl Default for NodeStyle {
    fn default() -> Self {
        Self { header_height: 24.0, port_radius: 7.0, min_width: 96.0 }
    }
}

/// Geometry and drawing of one node kind.
///
/// All rectangles and points are in world coordinates. `cell_size` is the routing grid's cell
/// edge; port rows are laid out one cell apart so anchors land on cell centers.
pub trait NodeVisual: fmt::Debug {
    /// Size used when the node carries no explicit size.
    fn preferred_size(&self, node: &Node, cell_size: f64) -> Size;

    fn port_rect(&self, node: &Node, port: &PortId, cell_size: f64) -> Option<Rect>;

    fn draw(&self, node: &Node, painter: &mut dyn Painter, cell_size: f64);

    fn rect(&self, node: &Node, cell_size: f64) -> Rect {
        let size = node.size().unwrap_or_else(|| self.preferred_size(node, cell_size));
        Rect::from_origin_size(node.position(), size)
    }

    /// Where connections attach.
    fn port_anchor(&self, node: &Node, port: &PortId, cell_size: f64) -> Option<Point> {
        self.port_rect(node, port, cell_size).map(|rect| rect.center())
    }

    /// The port whose cell-sized hit area contains `point`.
    fn port_at(&self, node: &Node, point: Point, cell_size: f64) -> Option<PortId> {
        let half = cell_size / 2.0;
        node.ports().iter().find_map(|port| {
            let anchor = self.port_anchor(node, port.id(), cell_size)?;
            let hit = Rect::new(anchor.x - half, anchor.y - half, cell_size, cell_size);
            hit.contains_point(point).then(|| port.id().clone())
        })
    }

    /// Marks the node footprint as `Node` and punches an `Empty` doorway at each port anchor.
    fn write_occupancy(&self, node: &Node, grid: &mut Grid) {
        let cell_size = grid.cell_size();
        grid.set_occupancy_covering(self.rect(node, cell_size), Occupancy::Node);
        for port in node.ports() {
            if let Some(anchor) = self.port_anchor(node, port.id(), cell_size) {
                grid.set_occupancy_at(anchor, Occupancy::Empty);
            }
        }
    }
}

/// Box with a caption band; inputs on the left edge, outputs on the right, one cell apart.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DefaultNodeVisual {
    style: NodeStyle,
}

impl DefaultNodeVisual {
    pub fn new(style: NodeStyle) -> Self {
        Self { style }
    }

    pub fn style(&self) -> &NodeStyle {
        &self.style
    }
}

fn snap_up(value: f64, cell_size: f64) -> f64 {
    (value / cell_size).ceil().max(1.0) * cell_size
}

impl NodeVisual for DefaultNodeVisual {
    fn preferred_size(&self, node: &Node, cell_size: f64) -> Size {
        let rows = node.port_count(Direction::Input).max(node.port_count(Direction::Output));
        let height = self.style.header_height + rows as f64 * cell_size;
        Size::new(snap_up(self.style.min_width, cell_size), snap_up(height, cell_size))
    }

    fn port_rect(&self, node: &Node, port: &PortId, cell_size: f64) -> Option<Rect> {
        let (direction, index) = node.port_index(port)?;
        let rect = self.rect(node, cell_size);
        let half = cell_size / 2.0;
        let diameter = self.style.port_radius * 2.0;

        let cy = rect.top() + self.style.header_height + cell_size * index as f64 + half;
        let cx = match direction {
            Direction::Input => rect.left() + half,
            Direction::Output => rect.right() - half,
        };
        Some(Rect::new(cx - diameter / 2.0, cy - diameter / 2.0, diameter, diameter))
    }

    fn draw(&self, node: &Node, painter: &mut dyn Painter, cell_size: f64) {
        let rect = self.rect(node, cell_size);
        painter.rect(rect);
        painter.label(rect, node.label());

        for port in node.ports() {
            let Some(anchor) = self.port_anchor(node, port.id(), cell_size) else {
                continue;
            };
            // Markers sit on the border the port belongs to.
            let (x, marker) = match port.direction() {
                Direction::Input => (rect.left(), PORT_MARKER_INPUT),
                Direction::Output => (rect.right() - 0.5, PORT_MARKER_OUTPUT),
            };
            painter.text(Point::new(x, anchor.y), marker);
        }
    }
}

// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of nod and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

#![allow(dead_code)]

// Shared deterministic benchmark fixtures (no RNG).

use nod::model::{Direction, Endpoint, Node, NodeGraph, NodeId, Point, Port, PortId, Rect};

fn node_id(value: &str) -> NodeId {
    NodeId::new(value).expect("node id")
}

fn port_id(value: &str) -> PortId {
    PortId::new(value).expect("port id")
}

pub mod plan {
    use nod::route::{Grid, Occupancy, DEFAULT_CELL_SIZE};

    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Case {
        /// Corner to corner across an empty grid.
        Open,
        /// Vertical walls with alternating gaps at the top and bottom.
        Serpentine,
        /// A field of connection cells the route pays to cross.
        Congested,
    }

    impl Case {
        pub const fn id(self) -> &'static str {
            match self {
                Self::Open => "open_64",
                Self::Serpentine => "serpentine_64",
                Self::Congested => "congested_64",
            }
        }
    }

    pub struct Fixture {
        pub grid: Grid,
        pub start: Point,
        pub goal: Point,
    }

    pub fn fixture(case: Case) -> Fixture {
        const SIDE: usize = 64;
        let cs = DEFAULT_CELL_SIZE;
        let extent = SIDE as f64 * cs;
        let mut grid =
            Grid::with_bounds(cs, Rect::new(0.0, 0.0, extent, extent)).expect("bench grid");

        match case {
            Case::Open => {}
            Case::Serpentine => {
                for (idx, col) in (4..SIDE - 2).step_by(6).enumerate() {
                    let (y, height) =
                        if idx % 2 == 0 { (0.0, extent - 2.0 * cs) } else { (2.0 * cs, extent) };
                    let wall = Rect::new(col as f64 * cs, y, cs, height);
                    grid.set_occupancy(wall, Occupancy::Node);
                }
            }
            Case::Congested => {
                for row in (2..SIDE - 2).step_by(3) {
                    let band = Rect::new(0.0, row as f64 * cs, extent, cs);
                    grid.set_occupancy(band, Occupancy::Connection);
                }
            }
        }

        let half = cs / 2.0;
        Fixture {
            grid,
            start: Point::new(half, half),
            goal: Point::new(extent - half, extent - half),
        }
    }
}

pub mod scene {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PatchParams {
        pub columns: usize,
        pub rows: usize,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Case {
        Small,
        Medium,
        Large,
    }

    impl Case {
        pub const fn id(self) -> &'static str {
            match self {
                Self::Small => "small",
                Self::Medium => "medium",
                Self::Large => "large",
            }
        }

        pub const fn params(self) -> PatchParams {
            match self {
                Self::Small => PatchParams { columns: 3, rows: 3 },
                Self::Medium => PatchParams { columns: 6, rows: 5 },
                Self::Large => PatchParams { columns: 10, rows: 8 },
            }
        }
    }

    /// Columns of two-in/two-out nodes; every node feeds the two nearest nodes of the next
    /// column, so routes cross between columns.
    pub fn fixture(case: Case) -> NodeGraph {
        let PatchParams { columns, rows } = case.params();
        let mut graph = NodeGraph::new();
        let id_of = |col: usize, row: usize| format!("n{col}_{row}");

        for col in 0..columns {
            for row in 0..rows {
                let at = Point::new(24.0 + col as f64 * 216.0, 24.0 + row as f64 * 120.0);
                let mut node = Node::new(id_of(col, row)).with_position(at);
                for port in ["in0", "in1"] {
                    node.push_port(Port::new(port_id(port), port, Direction::Input)).expect("input");
                }
                for port in ["out0", "out1"] {
                    node.push_port(Port::new(port_id(port), port, Direction::Output)).expect("output");
                }
                graph.add_node(node_id(&id_of(col, row)), node).expect("add node");
            }
        }

        for col in 0..columns.saturating_sub(1) {
            for row in 0..rows {
                let targets = [(row, "out0", "in0"), ((row + 1) % rows, "out1", "in1")];
                for (target_row, out, input) in targets {
                    let from = Endpoint::new(node_id(&id_of(col, row)), port_id(out));
                    let to = Endpoint::new(node_id(&id_of(col + 1, target_row)), port_id(input));
                    graph.connect(from, to).expect("connect");
                }
            }
        }
        graph
    }

    /// The node moved back and forth by the update benchmark.
    pub fn moving_node(case: Case) -> NodeId {
        let PatchParams { columns, rows } = case.params();
        node_id(&format!("n{}_{}", columns / 2, rows / 2))
    }
}

// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of nod and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use super::geometry::{Point, Size};
use super::graph::{Direction, Endpoint, Node, NodeGraph, Port};
use super::ids::{NodeId, PortId};

pub(crate) fn nid(value: &str) -> NodeId {
    NodeId::new(value).expect("node id")
}

pub(crate) fn pid(value: &str) -> PortId {
    PortId::new(value).expect("port id")
}

pub(crate) fn endpoint(node: &str, port: &str) -> Endpoint {
    Endpoint::new(nid(node), pid(port))
}

/// A node with `inputs` input ports (`in0`, `in1`, ..) and `outputs` output ports.
pub(crate) fn node_with_ports(label: &str, at: Point, inputs: usize, outputs: usize) -> Node {
    let mut node = Node::new(label).with_position(at);
    for idx in 0..inputs {
        let name = format!("in{idx}");
        node.push_port(Port::new(pid(&name), name.as_str(), Direction::Input)).expect("input");
    }
    for idx in 0..outputs {
        let name = format!("out{idx}");
        node.push_port(Port::new(pid(&name), name.as_str(), Direction::Output)).expect("output");
    }
    node
}

/// Two nodes side by side on one row, `a.out0 -> b.in0`.
pub(crate) fn graph_pair() -> NodeGraph {
    let mut graph = NodeGraph::new();
    graph
        .add_node(nid("a"), node_with_ports("Source", Point::new(48.0, 48.0), 0, 1))
        .expect("add a");
    graph
        .add_node(nid("b"), node_with_ports("Sink", Point::new(288.0, 48.0), 1, 0))
        .expect("add b");
    graph.connect(endpoint("a", "out0"), endpoint("b", "in0")).expect("connect");
    graph
}

/// Source and sink on the same row with a tall node between them.
pub(crate) fn graph_with_obstacle() -> NodeGraph {
    let mut graph = graph_pair();
    graph
        .add_node(
            nid("wall"),
            node_with_ports("Wall", Point::new(168.0, 24.0), 0, 0)
                .with_size(Size::new(48.0, 144.0)),
        )
        .expect("add wall");
    graph
}

/// A small dataflow: two sources feeding a mixer feeding an output.
pub(crate) fn graph_diamond() -> NodeGraph {
    let mut graph = NodeGraph::new();
    graph
        .add_node(nid("src1"), node_with_ports("Noise", Point::new(24.0, 24.0), 0, 1))
        .expect("add src1");
    graph
        .add_node(nid("src2"), node_with_ports("Sine", Point::new(24.0, 168.0), 0, 1))
        .expect("add src2");
    graph
        .add_node(nid("mix"), node_with_ports("Mix", Point::new(216.0, 96.0), 2, 1))
        .expect("add mix");
    graph
        .add_node(nid("out"), node_with_ports("Output", Point::new(408.0, 96.0), 1, 0))
        .expect("add out");
    graph.connect(endpoint("src1", "out0"), endpoint("mix", "in0")).expect("src1->mix");
    graph.connect(endpoint("src2", "out0"), endpoint("mix", "in1")).expect("src2->mix");
    graph.connect(endpoint("mix", "out0"), endpoint("out", "in0")).expect("mix->out");
    graph
}

// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of nod and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use smol_str::SmolStr;

use super::geometry::{Point, Size};
use super::ids::{ConnectionId, IdError, NodeId, PortId};

/// Extra role-keyed values carried through load/save untouched.
pub type RoleData = BTreeMap<SmolStr, serde_json::Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Input,
    Output,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Output => "output",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Port {
    id: PortId,
    name: SmolStr,
    direction: Direction,
    extra: RoleData,
}

impl Port {
    pub fn new(id: PortId, name: impl Into<SmolStr>, direction: Direction) -> Self {
        Self { id, name: name.into(), direction, extra: RoleData::new() }
    }

    pub fn id(&self) -> &PortId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn extra(&self) -> &RoleData {
        &self.extra
    }

    pub fn extra_mut(&mut self) -> &mut RoleData {
        &mut self.extra
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    label: SmolStr,
    position: Point,
    size: Option<Size>,
    ports: SmallVec<[Port; 4]>,
    extra: RoleData,
}

impl Node {
    pub fn new(label: impl Into<SmolStr>) -> Self {
        Self {
            label: label.into(),
            position: Point::ORIGIN,
            size: None,
            ports: SmallVec::new(),
            extra: RoleData::new(),
        }
    }

    pub fn with_position(mut self, position: Point) -> Self {
        self.position = position;
        self
    }

    pub fn with_size(mut self, size: Size) -> Self {
        self.size = Some(size);
        self
    }

    /// Appends a port. Port ids are unique per node across both directions.
    pub fn push_port(&mut self, port: Port) -> Result<(), GraphError> {
        if self.port(&port.id).is_some() {
            return Err(GraphError::DuplicatePort { port: port.id });
        }
        self.ports.push(port);
        Ok(())
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn set_label(&mut self, label: impl Into<SmolStr>) {
        self.label = label.into();
    }

    /// Top-left corner in world coordinates.
    pub fn position(&self) -> Point {
        self.position
    }

    pub fn set_position(&mut self, position: Point) {
        self.position = position;
    }

    /// Explicit size, if one was stored. Node visuals compute a size otherwise.
    pub fn size(&self) -> Option<Size> {
        self.size
    }

    pub fn set_size(&mut self, size: Option<Size>) {
        self.size = size;
    }

    pub fn ports(&self) -> &[Port] {
        &self.ports
    }

    pub fn port(&self, id: &PortId) -> Option<&Port> {
        self.ports.iter().find(|port| &port.id == id)
    }

    /// Ports of one direction, in declaration order, paired with their index in that direction.
    pub fn ports_in(&self, direction: Direction) -> impl Iterator<Item = (usize, &Port)> {
        self.ports.iter().filter(move |port| port.direction == direction).enumerate()
    }

    /// Index of the port among the ports sharing its direction.
    pub fn port_index(&self, id: &PortId) -> Option<(Direction, usize)> {
        let port = self.port(id)?;
        let direction = port.direction;
        self.ports_in(direction)
            .find(|(_, candidate)| &candidate.id == id)
            .map(|(idx, _)| (direction, idx))
    }

    pub fn port_count(&self, direction: Direction) -> usize {
        self.ports.iter().filter(|port| port.direction == direction).count()
    }

    pub fn extra(&self) -> &RoleData {
        &self.extra
    }

    pub fn extra_mut(&mut self) -> &mut RoleData {
        &mut self.extra
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Endpoint {
    pub node: NodeId,
    pub port: PortId,
}

impl Endpoint {
    pub fn new(node: NodeId, port: PortId) -> Self {
        Self { node, port }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.node, self.port)
    }
}

/// A directed link from an output port to an input port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    from: Endpoint,
    to: Endpoint,
}

impl Connection {
    pub fn from(&self) -> &Endpoint {
        &self.from
    }

    pub fn to(&self) -> &Endpoint {
        &self.to
    }

    pub fn contains_node(&self, node: &NodeId) -> bool {
        &self.from.node == node || &self.to.node == node
    }

    pub fn contains(&self, node: &NodeId, port: &PortId) -> bool {
        (&self.from.node == node && &self.from.port == port)
            || (&self.to.node == node && &self.to.port == port)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    DuplicateNode { node: NodeId },
    UnknownNode { node: NodeId },
    DuplicatePort { port: PortId },
    UnknownPort { endpoint: Endpoint },
    UnknownConnection { connection: ConnectionId },
    SelfConnection { endpoint: Endpoint },
    DirectionMismatch { from: Endpoint, to: Endpoint, direction: Direction },
    InputOccupied { endpoint: Endpoint, existing: ConnectionId },
    DuplicateConnection { connection: ConnectionId },
    InvalidId(IdError),
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateNode { node } => write!(f, "node {node} already exists"),
            Self::UnknownNode { node } => write!(f, "unknown node {node}"),
            Self::DuplicatePort { port } => write!(f, "port {port} is declared more than once"),
            Self::UnknownPort { endpoint } => write!(f, "unknown port {endpoint}"),
            Self::UnknownConnection { connection } => write!(f, "unknown connection {connection}"),
            Self::SelfConnection { endpoint } => {
                write!(f, "cannot connect port {endpoint} to itself")
            }
            Self::DirectionMismatch { from, to, direction } => write!(
                f,
                "cannot connect {from} to {to}: both ports are {}",
                direction.as_str()
            ),
            Self::InputOccupied { endpoint, existing } => {
                write!(f, "input {endpoint} is already driven by connection {existing}")
            }
            Self::DuplicateConnection { connection } => {
                write!(f, "connection {connection} already exists")
            }
            Self::InvalidId(err) => write!(f, "invalid id: {err}"),
        }
    }
}

impl std::error::Error for GraphError {}

/// Nodes and connections keyed by stable ids.
///
/// Cross-references are ids, never pointers: a connection names its endpoints, and lookups go
/// through the graph.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NodeGraph {
    nodes: BTreeMap<NodeId, Node>,
    connections: BTreeMap<ConnectionId, Connection>,
}

impl NodeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nodes(&self) -> &BTreeMap<NodeId, Node> {
        &self.nodes
    }

    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn node_mut(&mut self, id: &NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    pub fn add_node(&mut self, id: NodeId, node: Node) -> Result<(), GraphError> {
        if self.nodes.contains_key(&id) {
            return Err(GraphError::DuplicateNode { node: id });
        }
        self.nodes.insert(id, node);
        Ok(())
    }

    /// Removes the node and every connection touching it.
    pub fn remove_node(&mut self, id: &NodeId) -> Result<(Node, Vec<ConnectionId>), GraphError> {
        let node =
            self.nodes.remove(id).ok_or_else(|| GraphError::UnknownNode { node: id.clone() })?;
        let dropped = self
            .connections
            .iter()
            .filter_map(|(cid, c)| c.contains_node(id).then(|| cid.clone()))
            .collect::<Vec<_>>();
        for cid in &dropped {
            self.connections.remove(cid);
        }
        Ok((node, dropped))
    }

    pub fn connections(&self) -> &BTreeMap<ConnectionId, Connection> {
        &self.connections
    }

    pub fn connection(&self, id: &ConnectionId) -> Option<&Connection> {
        self.connections.get(id)
    }

    /// Connections touching `node`, in id order.
    pub fn connections_of<'a>(
        &'a self,
        node: &'a NodeId,
    ) -> impl Iterator<Item = (&'a ConnectionId, &'a Connection)> + 'a {
        self.connections.iter().filter(move |(_, c)| c.contains_node(node))
    }

    /// The first connection (in id order) terminating at `node.port`.
    pub fn connection_at(
        &self,
        node: &NodeId,
        port: &PortId,
    ) -> Option<(&ConnectionId, &Connection)> {
        self.connections.iter().find(|(_, c)| c.contains(node, port))
    }

    pub fn port(&self, endpoint: &Endpoint) -> Option<&Port> {
        self.nodes.get(&endpoint.node)?.port(&endpoint.port)
    }

    /// Connects two ports and returns the id of the new connection.
    ///
    /// The endpoints may be given in either order; the stored connection always runs from the
    /// output port to the input port. An input port accepts a single connection.
    pub fn connect(&mut self, a: Endpoint, b: Endpoint) -> Result<ConnectionId, GraphError> {
        let dir_a = self.endpoint_direction(&a)?;
        let dir_b = self.endpoint_direction(&b)?;

        if a == b {
            return Err(GraphError::SelfConnection { endpoint: a });
        }
        if dir_a == dir_b {
            return Err(GraphError::DirectionMismatch { from: a, to: b, direction: dir_a });
        }

        let (from, to) = if dir_a == Direction::Output { (a, b) } else { (b, a) };
        let id = connection_id_for(&from, &to)?;
        if self.connections.contains_key(&id) {
            return Err(GraphError::DuplicateConnection { connection: id });
        }
        if let Some((existing, _)) = self.connection_at(&to.node, &to.port) {
            return Err(GraphError::InputOccupied { endpoint: to, existing: existing.clone() });
        }

        self.connections.insert(id.clone(), Connection { from, to });
        Ok(id)
    }

    pub fn disconnect(&mut self, id: &ConnectionId) -> Result<Connection, GraphError> {
        self.connections
            .remove(id)
            .ok_or_else(|| GraphError::UnknownConnection { connection: id.clone() })
    }

    fn endpoint_direction(&self, endpoint: &Endpoint) -> Result<Direction, GraphError> {
        let node = self
            .nodes
            .get(&endpoint.node)
            .ok_or_else(|| GraphError::UnknownNode { node: endpoint.node.clone() })?;
        node.port(&endpoint.port)
            .map(Port::direction)
            .ok_or_else(|| GraphError::UnknownPort { endpoint: endpoint.clone() })
    }
}

fn connection_id_for(from: &Endpoint, to: &Endpoint) -> Result<ConnectionId, GraphError> {
    ConnectionId::new(format!("{from}->{to}")).map_err(GraphError::InvalidId)
}

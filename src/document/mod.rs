// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of nod and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! JSON persistence for node graphs.
//!
//! ```json
//! { "version": 1,
//!   "nodes": [ { "id": "a", "data": { "name": "Source", "position": [0, 0] },
//!                "in": [], "out": [ { "id": "out0", "data": { "name": "y" } } ] } ],
//!   "connections": [ { "node1": "a", "port1": "out0", "node2": "b", "port2": "in0" } ] }
//! ```
//!
//! Node and port `data` maps are keyed by role. `name`, `position` and `size` map onto the
//! model; every other role is carried through as an opaque JSON value.

use std::fmt;
use std::fs;
use std::io::{self, Write as _};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::model::{
    Direction, Endpoint, GraphError, Id, IdError, Node, NodeGraph, NodeId, Point, Port, PortId,
    RoleData, Size,
};

#[cfg(test)]
mod tests;

pub const DOCUMENT_VERSION: u32 = 1;

const ROLE_NAME: &str = "name";
const ROLE_POSITION: &str = "position";
const ROLE_SIZE: &str = "size";

#[derive(Debug)]
pub enum DocumentError {
    Io { path: PathBuf, source: io::Error },
    Json { path: Option<PathBuf>, source: serde_json::Error },
    UnsupportedVersion { found: u32 },
    InvalidId { value: String, source: IdError },
    InvalidRole { owner: String, role: &'static str, source: serde_json::Error },
    Graph(GraphError),
}

impl fmt::Display for DocumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "io error at {path:?}: {source}"),
            Self::Json { path: Some(path), source } => {
                write!(f, "invalid document {path:?}: {source}")
            }
            Self::Json { path: None, source } => write!(f, "invalid document: {source}"),
            Self::UnsupportedVersion { found } => write!(
                f,
                "unsupported document version {found} (expected {DOCUMENT_VERSION})"
            ),
            Self::InvalidId { value, source } => write!(f, "invalid id {value:?}: {source}"),
            Self::InvalidRole { owner, role, source } => {
                write!(f, "invalid {role} on {owner}: {source}")
            }
            Self::Graph(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for DocumentError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Json { source, .. } => Some(source),
            Self::InvalidId { source, .. } => Some(source),
            Self::InvalidRole { source, .. } => Some(source),
            Self::Graph(err) => Some(err),
            Self::UnsupportedVersion { .. } => None,
        }
    }
}

impl From<GraphError> for DocumentError {
    fn from(value: GraphError) -> Self {
        Self::Graph(value)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct DocumentJson {
    version: u32,
    #[serde(default)]
    nodes: Vec<NodeJson>,
    #[serde(default)]
    connections: Vec<ConnectionJson>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct NodeJson {
    id: String,
    #[serde(default)]
    data: RoleData,
    #[serde(default, rename = "in")]
    inputs: Vec<PortJson>,
    #[serde(default, rename = "out")]
    outputs: Vec<PortJson>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PortJson {
    id: String,
    #[serde(default)]
    data: RoleData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConnectionJson {
    #[serde(alias = "n1")]
    node1: String,
    #[serde(alias = "p1")]
    port1: String,
    #[serde(alias = "n2")]
    node2: String,
    #[serde(alias = "p2")]
    port2: String,
}

pub fn from_json_str(raw: &str) -> Result<NodeGraph, DocumentError> {
    let doc: DocumentJson =
        serde_json::from_str(raw).map_err(|source| DocumentError::Json { path: None, source })?;
    graph_from_json(doc)
}

/// Pretty-printed document; nodes and connections in id order.
pub fn to_json_string(graph: &NodeGraph) -> Result<String, DocumentError> {
    let doc = graph_to_json(graph)?;
    serde_json::to_string_pretty(&doc).map_err(|source| DocumentError::Json { path: None, source })
}

pub fn load(path: &Path) -> Result<NodeGraph, DocumentError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| DocumentError::Io { path: path.to_path_buf(), source })?;
    let doc: DocumentJson = serde_json::from_str(&raw)
        .map_err(|source| DocumentError::Json { path: Some(path.to_path_buf()), source })?;
    graph_from_json(doc)
}

/// Writes the document next to `path` under a temporary name, then renames it into place.
pub fn save(path: &Path, graph: &NodeGraph) -> Result<(), DocumentError> {
    let mut text = to_json_string(graph)?;
    text.push('\n');
    write_atomic(path, text.as_bytes())
}

fn graph_from_json(doc: DocumentJson) -> Result<NodeGraph, DocumentError> {
    if doc.version != DOCUMENT_VERSION {
        return Err(DocumentError::UnsupportedVersion { found: doc.version });
    }

    let mut graph = NodeGraph::new();
    for node_json in doc.nodes {
        let id: NodeId = parse_id(&node_json.id)?;
        let mut node = node_from_roles(&node_json.id, node_json.data)?;
        for (direction, ports) in
            [(Direction::Input, node_json.inputs), (Direction::Output, node_json.outputs)]
        {
            for port_json in ports {
                let owner = format!("{}.{}", node_json.id, port_json.id);
                let port_id: PortId = parse_id(&port_json.id)?;
                node.push_port(port_from_roles(&owner, port_id, direction, port_json.data)?)?;
            }
        }
        graph.add_node(id, node)?;
    }

    for conn in doc.connections {
        let a = Endpoint::new(parse_id(&conn.node1)?, parse_id(&conn.port1)?);
        let b = Endpoint::new(parse_id(&conn.node2)?, parse_id(&conn.port2)?);
        graph.connect(a, b)?;
    }
    Ok(graph)
}

fn graph_to_json(graph: &NodeGraph) -> Result<DocumentJson, DocumentError> {
    let mut nodes = Vec::with_capacity(graph.nodes().len());
    for (id, node) in graph.nodes() {
        let mut data = node.extra().clone();
        data.insert(ROLE_NAME.into(), node.label().into());
        let position = to_role_value(id.as_str(), ROLE_POSITION, node.position())?;
        data.insert(ROLE_POSITION.into(), position);
        if let Some(size) = node.size() {
            data.insert(ROLE_SIZE.into(), to_role_value(id.as_str(), ROLE_SIZE, size)?);
        }

        let ports_of = |direction| {
            node.ports_in(direction)
                .map(|(_, port)| {
                    let mut data = port.extra().clone();
                    data.insert(ROLE_NAME.into(), port.name().into());
                    PortJson { id: port.id().to_string(), data }
                })
                .collect::<Vec<_>>()
        };
        nodes.push(NodeJson {
            id: id.to_string(),
            data,
            inputs: ports_of(Direction::Input),
            outputs: ports_of(Direction::Output),
        });
    }

    let connections = graph
        .connections()
        .values()
        .map(|conn| ConnectionJson {
            node1: conn.from().node.to_string(),
            port1: conn.from().port.to_string(),
            node2: conn.to().node.to_string(),
            port2: conn.to().port.to_string(),
        })
        .collect();

    Ok(DocumentJson { version: DOCUMENT_VERSION, nodes, connections })
}

fn node_from_roles(owner: &str, mut data: RoleData) -> Result<Node, DocumentError> {
    let label = match data.remove(ROLE_NAME) {
        Some(value) => from_role_value::<String>(owner, ROLE_NAME, value)?,
        None => owner.to_owned(),
    };
    let mut node = Node::new(label);
    if let Some(value) = data.remove(ROLE_POSITION) {
        node.set_position(from_role_value::<Point>(owner, ROLE_POSITION, value)?);
    }
    if let Some(value) = data.remove(ROLE_SIZE) {
        node.set_size(Some(from_role_value::<Size>(owner, ROLE_SIZE, value)?));
    }
    *node.extra_mut() = data;
    Ok(node)
}

fn port_from_roles(
    owner: &str,
    id: PortId,
    direction: Direction,
    mut data: RoleData,
) -> Result<Port, DocumentError> {
    let name = match data.remove(ROLE_NAME) {
        Some(value) => SmolStr::new(from_role_value::<String>(owner, ROLE_NAME, value)?),
        None => SmolStr::new(id.as_str()),
    };
    let mut port = Port::new(id, name, direction);
    *port.extra_mut() = data;
    Ok(port)
}

fn parse_id<T>(value: &str) -> Result<Id<T>, DocumentError> {
    Id::new(value)
        .map_err(|source| DocumentError::InvalidId { value: value.to_owned(), source })
}

fn from_role_value<T: serde::de::DeserializeOwned>(
    owner: &str,
    role: &'static str,
    value: serde_json::Value,
) -> Result<T, DocumentError> {
    serde_json::from_value(value).map_err(|source| DocumentError::InvalidRole {
        owner: owner.to_owned(),
        role,
        source,
    })
}

fn to_role_value<T: Serialize>(
    owner: &str,
    role: &'static str,
    value: T,
) -> Result<serde_json::Value, DocumentError> {
    serde_json::to_value(value).map_err(|source| DocumentError::InvalidRole {
        owner: owner.to_owned(),
        role,
        source,
    })
}

fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), DocumentError> {
    let io_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source| DocumentError::Io { path, source }
    };

    let Some(file_name) = path.file_name() else {
        return Err(DocumentError::Io {
            path: path.to_path_buf(),
            source: io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"),
        });
    };
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_nanos();
    let tmp_path = parent.join(format!(".nod.tmp.{}.{}", file_name.to_string_lossy(), nanos));

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&tmp_path)
        .map_err(io_err(&tmp_path))?;
    file.write_all(contents).map_err(io_err(&tmp_path))?;
    file.sync_all().map_err(io_err(&tmp_path))?;
    drop(file);

    if let Err(source) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(DocumentError::Io { path: path.to_path_buf(), source });
    }
    Ok(())
}

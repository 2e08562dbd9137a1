// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of nod and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Graph data model: typed ids, geometry, nodes, ports and connections.

#[cfg(test)]
pub(crate) mod fixtures;
pub mod geometry;
pub mod graph;
pub mod ids;

pub use geometry::{CellPoint, Point, Rect, Size};
pub use graph::{Connection, Direction, Endpoint, GraphError, Node, NodeGraph, Port, RoleData};
pub use ids::{ConnectionId, ConnectionIdTag, Id, IdError, NodeId, NodeIdTag, PortId, PortIdTag};

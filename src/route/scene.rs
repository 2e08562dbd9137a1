// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of nod and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! The canvas: a node graph, its routing grid and the presentable shape of every connection.
//!
//! A routing pass rebuilds occupancy (nodes first, then one connection at a time in id order,
//! each route becoming an obstacle for the next), then resizes the grid to the content and
//! repeats while the bounds keep moving, up to `max_rebuild_passes` rebuilds.

use std::collections::BTreeMap;
use std::fmt;

use tracing::{debug, warn};

use super::grid::{Grid, GridError};
use super::planner::{PathPlanner, PlanError};
use super::shape::{ConnectionShape, NoPathFallback, RouteMode, RouteOutcome};
use crate::config::NodConfig;
use crate::layout::{DefaultNodeVisual, NodeVisual};
use crate::model::{
    ConnectionId, Endpoint, GraphError, Node, NodeGraph, NodeId, Point, Rect, Size,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateError {
    /// An update was requested while a pass was already running.
    Reentrant,
}

impl fmt::Display for UpdateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reentrant => f.write_str("routing pass already in progress"),
        }
    }
}

impl std::error::Error for UpdateError {}

#[derive(Debug, Clone, PartialEq)]
pub enum SceneError {
    Graph(GraphError),
    Grid(GridError),
    Update(UpdateError),
    UnknownNode { node: NodeId },
}

impl fmt::Display for SceneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Graph(err) => write!(f, "{err}"),
            Self::Grid(err) => write!(f, "{err}"),
            Self::Update(err) => write!(f, "{err}"),
            Self::UnknownNode { node } => write!(f, "unknown node: {node}"),
        }
    }
}

impl std::error::Error for SceneError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Graph(err) => Some(err),
            Self::Grid(err) => Some(err),
            Self::Update(err) => Some(err),
            Self::UnknownNode { .. } => None,
        }
    }
}

impl From<GraphError> for SceneError {
    fn from(value: GraphError) -> Self {
        Self::Graph(value)
    }
}

impl From<GridError> for SceneError {
    fn from(value: GridError) -> Self {
        Self::Grid(value)
    }
}

impl From<UpdateError> for SceneError {
    fn from(value: UpdateError) -> Self {
        Self::Update(value)
    }
}

/// Summary of one `update`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassReport {
    pub nodes: usize,
    pub connections: usize,
    /// Connections whose planned route failed and were drawn with the fallback.
    pub failed: Vec<(ConnectionId, PlanError)>,
    pub rebuilds: usize,
}

/// An in-progress interactive connection from a port to the cursor.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionDrag {
    from: Endpoint,
    start: Point,
    cursor: Point,
    shape: ConnectionShape,
}

impl ConnectionDrag {
    pub fn from(&self) -> &Endpoint {
        &self.from
    }

    pub fn start(&self) -> Point {
        self.start
    }

    pub fn cursor(&self) -> Point {
        self.cursor
    }

    pub fn shape(&self) -> &ConnectionShape {
        &self.shape
    }
}

#[derive(Debug)]
pub struct Scene {
    graph: NodeGraph,
    grid: Grid,
    planner: PathPlanner,
    shapes: BTreeMap<ConnectionId, ConnectionShape>,
    visual: Box<dyn NodeVisual>,
    config: NodConfig,
    in_pass: bool,
    drag: Option<ConnectionDrag>,
    last_pass: PassReport,
}

impl Scene {
    pub fn new(graph: NodeGraph, config: NodConfig) -> Result<Self, SceneError> {
        let visual = Box::new(DefaultNodeVisual::new(config.node_style));
        Self::with_visual(graph, config, visual)
    }

    /// Builds the scene, sizes and snaps every node, and runs the first routing pass.
    pub fn with_visual(
        mut graph: NodeGraph,
        config: NodConfig,
        visual: Box<dyn NodeVisual>,
    ) -> Result<Self, SceneError> {
        let grid = Grid::new(config.cell_size)?;
        let ids = graph.nodes().keys().cloned().collect::<Vec<_>>();
        for id in &ids {
            if let Some(node) = graph.node_mut(id) {
                prepare_node(node, visual.as_ref(), &grid);
            }
        }

        let mut scene = Self {
            graph,
            grid,
            planner: PathPlanner::new(config.costs, config.reconstruct_limit),
            shapes: BTreeMap::new(),
            visual,
            config,
            in_pass: false,
            drag: None,
            last_pass: PassReport::default(),
        };
        scene.update()?;
        Ok(scene)
    }

    pub fn graph(&self) -> &NodeGraph {
        &self.graph
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn config(&self) -> &NodConfig {
        &self.config
    }

    pub fn visual(&self) -> &dyn NodeVisual {
        self.visual.as_ref()
    }

    pub fn shapes(&self) -> &BTreeMap<ConnectionId, ConnectionShape> {
        &self.shapes
    }

    pub fn shape(&self, id: &ConnectionId) -> Option<&ConnectionShape> {
        self.shapes.get(id)
    }

    pub fn drag(&self) -> Option<&ConnectionDrag> {
        self.drag.as_ref()
    }

    pub fn last_pass(&self) -> &PassReport {
        &self.last_pass
    }

    pub fn node_rect(&self, id: &NodeId) -> Option<Rect> {
        let node = self.graph.node(id)?;
        Some(self.visual.rect(node, self.grid.cell_size()))
    }

    pub fn port_anchor(&self, endpoint: &Endpoint) -> Option<Point> {
        endpoint_anchor(&self.graph, self.visual.as_ref(), self.grid.cell_size(), endpoint)
    }

    /// Topmost node under `point`; later ids draw above earlier ones.
    pub fn node_at(&self, point: Point) -> Option<&NodeId> {
        let cell_size = self.grid.cell_size();
        self.graph
            .nodes()
            .iter()
            .rev()
            .find(|(_, node)| self.visual.rect(node, cell_size).contains_point(point))
            .map(|(id, _)| id)
    }

    pub fn port_at(&self, point: Point) -> Option<Endpoint> {
        let cell_size = self.grid.cell_size();
        self.graph.nodes().iter().rev().find_map(|(id, node)| {
            let port = self.visual.port_at(node, point, cell_size)?;
            Some(Endpoint::new(id.clone(), port))
        })
    }

    /// Union of node rectangles grown by one cell, plus every routed connection, snapped
    /// outward to whole cells.
    pub fn content_bounds(&self) -> Rect {
        let cell_size = self.grid.cell_size();
        let nodes = self
            .graph
            .nodes()
            .values()
            .fold(Rect::default(), |acc, node| acc.united(&self.visual.rect(node, cell_size)));
        if nodes.is_empty() {
            return Rect::default();
        }
        let framed = nodes.adjusted(-cell_size, -cell_size, cell_size, cell_size);
        let content =
            self.shapes.values().fold(framed, |acc, shape| acc.united(&shape.scene_rect()));
        self.grid.snap_rect_outward(content)
    }

    /// Full pass: clears all occupancy and reroutes every connection.
    pub fn update(&mut self) -> Result<PassReport, UpdateError> {
        self.guarded_update(None)
    }

    /// Pass that resets only `damage` before remarking nodes and rerouting connections.
    ///
    /// `damage` must cover every cell whose node occupancy changed since the last pass.
    pub fn update_damaged(&mut self, damage: Rect) -> Result<PassReport, UpdateError> {
        self.guarded_update(Some(damage))
    }

    fn guarded_update(&mut self, damage: Option<Rect>) -> Result<PassReport, UpdateError> {
        if self.in_pass {
            warn!("routing pass requested while another is running");
            return Err(UpdateError::Reentrant);
        }
        self.in_pass = true;
        let report = self.run_passes(damage);
        self.in_pass = false;
        self.last_pass = report.clone();
        Ok(report)
    }

    fn run_passes(&mut self, damage: Option<Rect>) -> PassReport {
        let mut report = self.route_pass(damage);
        let mut rebuilds = 0;
        loop {
            let bounds = self.content_bounds();
            if bounds.is_empty() || bounds == self.grid.bounds() {
                break;
            }
            if rebuilds >= self.config.max_rebuild_passes {
                warn!(rebuilds, %bounds, "grid rebuild limit reached; keeping current bounds");
                break;
            }
            match self.grid.set_bounds(bounds) {
                Ok(true) => {
                    rebuilds += 1;
                    report = self.route_pass(None);
                }
                Ok(false) => break,
                Err(err) => {
                    warn!(%err, "content bounds rejected; keeping current grid");
                    break;
                }
            }
        }
        report.rebuilds = rebuilds;
        debug!(
            nodes = report.nodes,
            connections = report.connections,
            failed = report.failed.len(),
            rebuilds,
            "routing pass finished"
        );
        report
    }

    fn route_pass(&mut self, damage: Option<Rect>) -> PassReport {
        match damage {
            Some(rect) => {
                for shape in self.shapes.values() {
                    shape.clear_occupancy(&mut self.grid);
                }
                self.grid.reset(rect);
            }
            None => self.grid.clear_occupancy(),
        }
        for node in self.graph.nodes().values() {
            self.visual.write_occupancy(node, &mut self.grid);
        }

        self.shapes.retain(|id, _| self.graph.connection(id).is_some());

        let cell_size = self.grid.cell_size();
        let mut report = PassReport { nodes: self.graph.nodes().len(), ..PassReport::default() };
        for (id, connection) in self.graph.connections() {
            let anchors = (
                endpoint_anchor(&self.graph, self.visual.as_ref(), cell_size, connection.from()),
                endpoint_anchor(&self.graph, self.visual.as_ref(), cell_size, connection.to()),
            );
            let (Some(start), Some(end)) = anchors else {
                debug!(connection = %id, "connection endpoint has no anchor; skipped");
                continue;
            };
            let start = self.grid.snap_at(start, true);
            let end = self.grid.snap_at(end, true);

            let shape = self.shapes.entry(id.clone()).or_default();
            let outcome = shape.update_route(
                &mut self.grid,
                &mut self.planner,
                start,
                end,
                self.config.route_mode,
                self.config.no_path_fallback,
            );
            if let RouteOutcome::FellBack(err) = outcome {
                debug!(connection = %id, %err, "planned route failed; using fallback");
                report.failed.push((id.clone(), err));
            }
            shape.write_occupancy(&mut self.grid);
            report.connections += 1;
        }
        report
    }

    pub fn add_node(&mut self, id: NodeId, mut node: Node) -> Result<PassReport, SceneError> {
        prepare_node(&mut node, self.visual.as_ref(), &self.grid);
        self.graph.add_node(id, node)?;
        Ok(self.update()?)
    }

    /// Removes the node with its connections and their shapes.
    pub fn remove_node(&mut self, id: &NodeId) -> Result<Node, SceneError> {
        let (node, dropped) = self.graph.remove_node(id)?;
        for connection in &dropped {
            self.shapes.remove(connection);
        }
        if self.drag.as_ref().is_some_and(|drag| &drag.from.node == id) {
            self.drag = None;
        }
        self.update()?;
        Ok(node)
    }

    /// Moves a node so its top-left corner snaps to the grid corner under `to`.
    pub fn move_node(&mut self, id: &NodeId, to: Point) -> Result<PassReport, SceneError> {
        let cell_size = self.grid.cell_size();
        let snapped = self.grid.snap_at(to, false);
        let node =
            self.graph.node_mut(id).ok_or_else(|| SceneError::UnknownNode { node: id.clone() })?;
        let before = self.visual.rect(node, cell_size);
        node.set_position(snapped);
        let after = self.visual.rect(node, cell_size);
        Ok(self.update_damaged(before.united(&after))?)
    }

    /// Moves a node by whole cells.
    pub fn nudge_node(
        &mut self,
        id: &NodeId,
        dcol: i32,
        drow: i32,
    ) -> Result<PassReport, SceneError> {
        let cell_size = self.grid.cell_size();
        let position = self
            .graph
            .node(id)
            .map(Node::position)
            .ok_or_else(|| SceneError::UnknownNode { node: id.clone() })?;
        let to = position + Point::new(f64::from(dcol) * cell_size, f64::from(drow) * cell_size);
        self.move_node(id, to)
    }

    /// Sets an explicit size, rounded up to whole cells.
    pub fn resize_node(&mut self, id: &NodeId, size: Size) -> Result<PassReport, SceneError> {
        let cell_size = self.grid.cell_size();
        let node =
            self.graph.node_mut(id).ok_or_else(|| SceneError::UnknownNode { node: id.clone() })?;
        let before = self.visual.rect(node, cell_size);
        node.set_size(Some(snap_size_up(size, cell_size)));
        let after = self.visual.rect(node, cell_size);
        Ok(self.update_damaged(before.united(&after))?)
    }

    pub fn connect(&mut self, a: Endpoint, b: Endpoint) -> Result<ConnectionId, SceneError> {
        let id = self.graph.connect(a, b)?;
        self.update()?;
        Ok(id)
    }

    pub fn disconnect(&mut self, id: &ConnectionId) -> Result<(), SceneError> {
        self.graph.disconnect(id)?;
        self.shapes.remove(id);
        self.update()?;
        Ok(())
    }

    pub fn set_route_mode(&mut self, mode: RouteMode) -> Result<PassReport, SceneError> {
        self.config.route_mode = mode;
        Ok(self.update()?)
    }

    pub fn set_no_path_fallback(
        &mut self,
        fallback: NoPathFallback,
    ) -> Result<PassReport, SceneError> {
        self.config.no_path_fallback = fallback;
        Ok(self.update()?)
    }

    /// Starts a connection drag from the port at `from`.
    pub fn begin_connection_drag(&mut self, from: Endpoint) -> Result<(), SceneError> {
        let anchor = self
            .port_anchor(&from)
            .ok_or_else(|| GraphError::UnknownPort { endpoint: from.clone() })?;
        let start = self.grid.snap_at(anchor, true);
        let mut shape = ConnectionShape::new();
        shape.set_raw_path(vec![start, start], self.grid.cell_size());
        self.drag = Some(ConnectionDrag { from, start, cursor: start, shape });
        Ok(())
    }

    /// Reroutes the transient connection to the cell under `cursor`.
    ///
    /// The transient route does not write occupancy.
    pub fn update_connection_drag(&mut self, cursor: Point) -> Option<&ConnectionShape> {
        let drag = self.drag.as_mut()?;
        let target = self.grid.snap_at(cursor, true);
        drag.cursor = target;
        let outcome = drag.shape.update_route(
            &mut self.grid,
            &mut self.planner,
            drag.start,
            target,
            self.config.route_mode,
            NoPathFallback::Direct,
        );
        if let RouteOutcome::FellBack(err) = outcome {
            debug!(%err, "drag route fell back to a direct segment");
        }
        Some(&drag.shape)
    }

    /// Ends the drag; connects when a port of another node lies under `cursor`.
    pub fn end_connection_drag(
        &mut self,
        cursor: Point,
    ) -> Result<Option<ConnectionId>, SceneError> {
        let Some(drag) = self.drag.take() else {
            return Ok(None);
        };
        let Some(target) = self.port_at(cursor) else {
            return Ok(None);
        };
        if target.node == drag.from.node {
            return Ok(None);
        }
        self.connect(drag.from, target).map(Some)
    }

    pub fn cancel_connection_drag(&mut self) {
        self.drag = None;
    }
}

fn endpoint_anchor(
    graph: &NodeGraph,
    visual: &dyn NodeVisual,
    cell_size: f64,
    endpoint: &Endpoint,
) -> Option<Point> {
    let node = graph.node(&endpoint.node)?;
    visual.port_anchor(node, &endpoint.port, cell_size)
}

fn prepare_node(node: &mut Node, visual: &dyn NodeVisual, grid: &Grid) {
    let cell_size = grid.cell_size();
    let size = node.size().unwrap_or_else(|| visual.preferred_size(node, cell_size));
    node.set_size(Some(snap_size_up(size, cell_size)));
    node.set_position(grid.snap_at(node.position(), false));
}

fn snap_size_up(size: Size, cell_size: f64) -> Size {
    let up = |value: f64| (value / cell_size).ceil().max(1.0) * cell_size;
    Size::new(up(size.width), up(size.height))
}

#[cfg(test)]
mod tests {
    use super::{Scene, SceneError, UpdateError};
    use crate::config::NodConfig;
    use crate::model::fixtures::{endpoint, graph_pair, nid, node_with_ports};
    use crate::model::{GraphError, Point, Rect, Size};

    fn pair_scene() -> Scene {
        Scene::new(graph_pair(), NodConfig::default()).expect("scene")
    }

    #[test]
    fn nested_update_is_rejected() {
        let mut scene = pair_scene();
        scene.in_pass = true;
        assert_eq!(scene.update(), Err(UpdateError::Reentrant));
        scene.in_pass = false;
        assert!(scene.update().is_ok());
    }

    #[test]
    fn construction_sizes_nodes_and_fits_the_grid() {
        let scene = pair_scene();
        assert_eq!(scene.node_rect(&nid("a")), Some(Rect::new(48.0, 48.0, 96.0, 48.0)));
        assert_eq!(scene.node_rect(&nid("b")), Some(Rect::new(288.0, 48.0, 96.0, 48.0)));
        assert_eq!(scene.grid().bounds(), Rect::new(24.0, 24.0, 384.0, 96.0));
        // The first pass runs on an empty grid and rebuilds once.
        assert_eq!(scene.last_pass().rebuilds, 1);
        assert!(scene.last_pass().failed.is_empty());
    }

    #[test]
    fn off_lattice_nodes_are_snapped_on_add() {
        let mut scene = pair_scene();
        let node = node_with_ports("Late", Point::new(100.0, 130.0), 1, 0)
            .with_size(Size::new(50.0, 30.0));
        scene.add_node(nid("c"), node).expect("add");
        assert_eq!(scene.node_rect(&nid("c")), Some(Rect::new(96.0, 120.0, 72.0, 48.0)));
    }

    #[test]
    fn hit_tests_find_nodes_and_ports() {
        let scene = pair_scene();
        assert_eq!(scene.node_at(Point::new(60.0, 60.0)), Some(&nid("a")));
        assert_eq!(scene.node_at(Point::new(200.0, 60.0)), None);
        assert_eq!(scene.port_at(Point::new(301.0, 80.0)), Some(endpoint("b", "in0")));
        assert_eq!(scene.port_anchor(&endpoint("a", "out0")), Some(Point::new(132.0, 84.0)));
    }

    #[test]
    fn move_of_unknown_node_is_an_error() {
        let mut scene = pair_scene();
        let err = scene.move_node(&nid("ghost"), Point::ORIGIN).unwrap_err();
        assert_eq!(err, SceneError::UnknownNode { node: nid("ghost") });
    }

    #[test]
    fn drag_to_another_port_connects() {
        let mut scene = pair_scene();
        let existing = scene.graph().connections().keys().next().cloned().expect("connection");
        scene.disconnect(&existing).expect("disconnect");
        assert!(scene.shapes().is_empty());

        scene.begin_connection_drag(endpoint("a", "out0")).expect("begin");
        let shape = scene.update_connection_drag(Point::new(250.0, 84.0)).expect("drag shape");
        assert_eq!(shape.raw_path().first(), Some(&Point::new(132.0, 84.0)));
        assert_eq!(shape.raw_path().last(), Some(&Point::new(252.0, 84.0)));

        let id = scene.end_connection_drag(Point::new(300.0, 84.0)).expect("end");
        assert_eq!(id.as_ref().map(|id| id.as_str()), Some("a.out0->b.in0"));
        assert!(scene.drag().is_none());
        assert_eq!(scene.shapes().len(), 1);
    }

    #[test]
    fn drag_released_over_empty_canvas_connects_nothing() {
        let mut scene = pair_scene();
        scene.begin_connection_drag(endpoint("a", "out0")).expect("begin");
        assert_eq!(scene.end_connection_drag(Point::new(200.0, 30.0)), Ok(None));
        assert!(scene.drag().is_none());
    }

    #[test]
    fn drag_from_unknown_port_fails() {
        let mut scene = pair_scene();
        let err = scene.begin_connection_drag(endpoint("a", "nope")).unwrap_err();
        assert!(matches!(err, SceneError::Graph(GraphError::UnknownPort { .. })));
    }
}

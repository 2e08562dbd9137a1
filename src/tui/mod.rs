// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of nod and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Terminal viewer: shows the routed scene and drives the editing operations from the keyboard.

use std::error::Error;
use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction as LayoutDirection, Layout, Rect as TermRect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::{Frame, Terminal};

use crate::document;
use crate::model::{Direction, Endpoint, GraphError, NodeGraph, NodeId, Point, Size};
use crate::render::overlay::draw_grid_overlay;
use crate::render::{render_scene_canvas, SCENE_X_SCALE};
use crate::route::{RouteMode, Scene};


const FOOTER_KEY_COLOR: Color = Color::Cyan;
const FOOTER_LABEL_COLOR: Color = Color::Gray;
const SELECTED_NODE_COLOR: Color = Color::Yellow;
const TOAST_TTL: Duration = Duration::from_secs(2);

/// Runs the viewer until the user quits. `path` enables saving with `w`.
pub fn run(scene: Scene, path: Option<PathBuf>) -> Result<(), Box<dyn Error>> {
    let mut terminal = TerminalSession::new()?;
    let mut app = App::new(scene, path);

    while !app.should_quit {
        terminal.draw(|frame| draw(frame, &mut app))?;

        if event::poll(Duration::from_millis(250))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => app.handle_key(key),
                _ => {}
            }
        }
    }

    Ok(())
}

/// A small patch: two sources into a mixer, a filter and an output, with a free-standing
/// note node the routes have to go around.
pub fn demo_graph() -> Result<NodeGraph, GraphError> {
    use crate::model::{Node, Port, PortId};

    fn port_id(id: &str) -> Result<PortId, GraphError> {
        PortId::new(id).map_err(GraphError::InvalidId)
    }
    fn node(
        label: &str,
        at: Point,
        inputs: &[&str],
        outputs: &[&str],
    ) -> Result<Node, GraphError> {
        let mut node = Node::new(label).with_position(at);
        for (ids, direction) in [(inputs, Direction::Input), (outputs, Direction::Output)] {
            for id in ids {
                node.push_port(Port::new(port_id(id)?, *id, direction))?;
            }
        }
        Ok(node)
    }

    let mut graph = NodeGraph::new();
    let nodes = [
        ("osc", node("Osc", Point::new(24.0, 24.0), &["freq"], &["out"])?),
        ("lfo", node("LFO", Point::new(24.0, 192.0), &[], &["out"])?),
        ("mix", node("Mix", Point::new(264.0, 72.0), &["a", "b"], &["sum"])?),
        ("filter", node("Filter", Point::new(456.0, 96.0), &["in", "cutoff"], &["out"])?),
        ("dac", node("Out", Point::new(648.0, 96.0), &["left"], &[])?),
        (
            "note",
            node("Note", Point::new(168.0, 144.0), &[], &[])?.with_size(Size::new(48.0, 96.0)),
        ),
    ];
    for (id, node) in nodes {
        graph.add_node(NodeId::new(id).map_err(GraphError::InvalidId)?, node)?;
    }
    let links = [
        ("osc", "out", "mix", "a"),
        ("lfo", "out", "mix", "b"),
        ("mix", "sum", "filter", "in"),
        ("lfo", "out", "filter", "cutoff"),
        ("filter", "out", "dac", "left"),
    ];
    for (n1, p1, n2, p2) in links {
        let a = Endpoint::new(NodeId::new(n1).map_err(GraphError::InvalidId)?, port_id(p1)?);
        let b = Endpoint::new(NodeId::new(n2).map_err(GraphError::InvalidId)?, port_id(p2)?);
        graph.connect(a, b)?;
    }
    Ok(graph)
}

struct Toast {
    message: String,
    expires_at: Instant,
}

struct App {
    scene: Scene,
    path: Option<PathBuf>,
    selected: Option<NodeId>,
    show_grid: bool,
    /// Scroll offset in grid cells: `(columns, rows)`.
    scroll: (u16, u16),
    toast: Option<Toast>,
    should_quit: bool,
}

impl App {
    fn new(scene: Scene, path: Option<PathBuf>) -> Self {
        let selected = scene.graph().nodes().keys().next().cloned();
        Self {
            scene,
            path,
            selected,
            show_grid: false,
            scroll: (0, 0),
            toast: None,
            should_quit: false,
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::SHIFT) {
            let scrolled = match key.code {
                KeyCode::Left => Some((-1, 0)),
                KeyCode::Right => Some((1, 0)),
                KeyCode::Up => Some((0, -1)),
                KeyCode::Down => Some((0, 1)),
                _ => None,
            };
            if let Some((dx, dy)) = scrolled {
                self.scroll_by(dx, dy);
                return;
            }
        }
        if self.handle_key_code(key.code) {
            self.should_quit = true;
        }
    }

    /// Returns `true` when the viewer should quit.
    fn handle_key_code(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') => return true,
            KeyCode::Tab => self.select_step(true),
            KeyCode::BackTab => self.select_step(false),
            KeyCode::Left => self.nudge_selected(-1, 0),
            KeyCode::Right => self.nudge_selected(1, 0),
            KeyCode::Up => self.nudge_selected(0, -1),
            KeyCode::Down => self.nudge_selected(0, 1),
            KeyCode::Char('c') => self.connect_step(),
            KeyCode::Char('x') => self.disconnect_selected(),
            KeyCode::Esc => {
                if self.scene.drag().is_some() {
                    self.scene.cancel_connection_drag();
                    self.set_toast("Connection cancelled");
                }
            }
            KeyCode::Char('g') => self.show_grid = !self.show_grid,
            KeyCode::Char('d') => self.toggle_route_mode(),
            KeyCode::Char('w') => self.save(),
            _ => {}
        }
        false
    }

    fn set_toast(&mut self, message: impl Into<String>) {
        self.toast = Some(Toast { message: message.into(), expires_at: Instant::now() + TOAST_TTL });
    }

    fn expire_toast(&mut self) {
        if self.toast.as_ref().is_some_and(|toast| Instant::now() >= toast.expires_at) {
            self.toast = None;
        }
    }

    fn scroll_by(&mut self, dx: i32, dy: i32) {
        let shift = |value: u16, delta: i32| {
            u16::try_from((i32::from(value) + delta).max(0)).unwrap_or(u16::MAX)
        };
        self.scroll = (shift(self.scroll.0, dx), shift(self.scroll.1, dy));
    }

    fn select_step(&mut self, forward: bool) {
        let ids = self.scene.graph().nodes().keys().cloned().collect::<Vec<_>>();
        if ids.is_empty() {
            self.selected = None;
            return;
        }
        let current = self.selected.as_ref().and_then(|id| ids.iter().position(|other| other == id));
        let next = match (current, forward) {
            (None, true) => 0,
            (None, false) => ids.len() - 1,
            (Some(idx), true) => (idx + 1) % ids.len(),
            (Some(idx), false) => (idx + ids.len() - 1) % ids.len(),
        };
        self.selected = Some(ids[next].clone());

        if self.scene.drag().is_some() {
            if let Some(target) = self.drag_target() {
                self.scene.update_connection_drag(target);
            }
        }
    }

    fn nudge_selected(&mut self, dcol: i32, drow: i32) {
        let Some(id) = self.selected.clone() else {
            return;
        };
        match self.scene.nudge_node(&id, dcol, drow) {
            Ok(report) if !report.failed.is_empty() => {
                self.set_toast(format!("{} route(s) without a path", report.failed.len()));
            }
            Ok(_) => {}
            Err(err) => self.set_toast(format!("Move failed: {err}")),
        }
    }

    /// First press starts a connection at the selected node's first output; the second press
    /// ends it at the selected node's first free input.
    fn connect_step(&mut self) {
        let Some(id) = self.selected.clone() else {
            self.set_toast("Nothing selected");
            return;
        };

        if self.scene.drag().is_none() {
            let Some(from) = self.first_port(&id, Direction::Output, false) else {
                self.set_toast(format!("{id} has no output port"));
                return;
            };
            match self.scene.begin_connection_drag(from) {
                Ok(()) => self.set_toast(format!("Connecting from {id}: Tab to a target, c to link")),
                Err(err) => self.set_toast(format!("Cannot connect: {err}")),
            }
            return;
        }

        let Some(target) = self.drag_target() else {
            self.scene.cancel_connection_drag();
            self.set_toast(format!("{id} has no free input port"));
            return;
        };
        self.scene.update_connection_drag(target);
        match self.scene.end_connection_drag(target) {
            Ok(Some(connection)) => self.set_toast(format!("Connected {connection}")),
            Ok(None) => self.set_toast("Nothing connected"),
            Err(err) => self.set_toast(format!("Cannot connect: {err}")),
        }
    }

    fn drag_target(&self) -> Option<Point> {
        let id = self.selected.as_ref()?;
        let endpoint = self.first_port(id, Direction::Input, true)?;
        self.scene.port_anchor(&endpoint)
    }

    fn first_port(&self, id: &NodeId, direction: Direction, free: bool) -> Option<Endpoint> {
        let graph = self.scene.graph();
        graph
            .node(id)?
            .ports_in(direction)
            .map(|(_, port)| port.id())
            .find(|port| !free || graph.connection_at(id, port).is_none())
            .map(|port| Endpoint::new(id.clone(), port.clone()))
    }

    fn disconnect_selected(&mut self) {
        let Some(id) = self.selected.clone() else {
            return;
        };
        let ids = self
            .scene
            .graph()
            .connections_of(&id)
            .map(|(connection, _)| connection.clone())
            .collect::<Vec<_>>();
        for connection in &ids {
            if let Err(err) = self.scene.disconnect(connection) {
                self.set_toast(format!("Disconnect failed: {err}"));
                return;
            }
        }
        self.set_toast(format!("Removed {} connection(s)", ids.len()));
    }

    fn toggle_route_mode(&mut self) {
        let mode = match self.scene.config().route_mode {
            RouteMode::Planned => RouteMode::Direct,
            RouteMode::Direct => RouteMode::Planned,
        };
        match self.scene.set_route_mode(mode) {
            Ok(_) => self.set_toast(format!("Routing: {}", route_mode_label(mode))),
            Err(err) => self.set_toast(format!("Routing change failed: {err}")),
        }
    }

    fn save(&mut self) {
        let Some(path) = self.path.clone() else {
            self.set_toast("No file to save to");
            return;
        };
        match document::save(&path, self.scene.graph()) {
            Ok(()) => self.set_toast(format!("Saved {}", path.display())),
            Err(err) => self.set_toast(format!("Save failed: {err}")),
        }
    }

    fn title(&self) -> String {
        let name = self
            .path
            .as_ref()
            .and_then(|path| path.file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "untitled".to_owned());
        format!(" nod: {name} [{}] ", route_mode_label(self.scene.config().route_mode))
    }

    /// Status line on the right: routed and failed counts of the last pass.
    fn pass_summary(&self) -> String {
        let report = self.scene.last_pass();
        let routed = report.connections.saturating_sub(report.failed.len());
        if report.failed.is_empty() {
            format!("{routed} routed")
        } else {
            format!("{routed} routed, {} without path", report.failed.len())
        }
    }

    /// Terminal cells covered by the selected node, relative to the canvas origin.
    fn selected_span(&self) -> Option<(u16, u16, u16, u16)> {
        let rect = self.scene.node_rect(self.selected.as_ref()?)?;
        let grid = self.scene.grid();
        let half = grid.cell_size() / 2.0;
        let top_left = grid.cell_at(rect.top_left());
        let bottom_right = grid.cell_at(Point::new(rect.right() - half, rect.bottom() - half));
        let scale = SCENE_X_SCALE as i32;
        let x0 = u16::try_from(top_left.col * scale).ok()?;
        let x1 = u16::try_from(bottom_right.col * scale + scale - 1).ok()?;
        let y0 = u16::try_from(top_left.row).ok()?;
        let y1 = u16::try_from(bottom_right.row).ok()?;
        Some((x0, y0, x1, y1))
    }
}

fn route_mode_label(mode: RouteMode) -> &'static str {
    match mode {
        RouteMode::Planned => "planned",
        RouteMode::Direct => "direct",
    }
}

fn footer_help_line(app: &App) -> Line<'static> {
    if let Some(toast) = &app.toast {
        return Line::from(Span::raw(toast.message.clone()));
    }

    let keys: &[(&str, &str)] = if app.scene.drag().is_some() {
        &[("Tab", "target"), ("c", "link"), ("Esc", "cancel")]
    } else {
        &[
            ("Tab", "select"),
            ("←↑↓→", "move"),
            ("S-←↑↓→", "scroll"),
            ("c", "connect"),
            ("x", "disconnect"),
            ("d", "direct"),
            ("g", "grid"),
            ("w", "save"),
            ("q", "quit"),
        ]
    };
    let mut spans = Vec::with_capacity(keys.len() * 2 + 1);
    for (key, label) in keys {
        spans.push(Span::styled(format!("{key} "), Style::default().fg(FOOTER_KEY_COLOR)));
        spans.push(Span::styled(format!("{label}  "), Style::default().fg(FOOTER_LABEL_COLOR)));
    }
    spans.push(Span::raw(app.pass_summary()));
    Line::from(spans)
}

fn scene_text(scene: &Scene) -> Text<'static> {
    match render_scene_canvas(scene) {
        Ok(canvas) => {
            let rendered = canvas.to_string_trimmed();
            Text::from(rendered.lines().map(|line| Line::from(line.to_owned())).collect::<Vec<_>>())
        }
        Err(err) => Text::from(format!("render failed: {err}")),
    }
}

fn draw(frame: &mut Frame<'_>, app: &mut App) {
    app.expire_toast();

    let area = frame.size();
    let layout = Layout::default()
        .direction(LayoutDirection::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(area);
    let main_area = layout[0];
    let footer_area = layout[1];

    let block = Block::default().borders(Borders::ALL).title(app.title());
    let inner = block.inner(main_area);
    let x_scale = SCENE_X_SCALE as u16;
    let scroll_x = app.scroll.0.saturating_mul(x_scale);
    let paragraph = Paragraph::new(scene_text(&app.scene))
        .block(block)
        .scroll((app.scroll.1, scroll_x));
    frame.render_widget(paragraph, main_area);

    if let Some(span) = app.selected_span() {
        highlight_span(frame, inner, span, (scroll_x, app.scroll.1));
    }
    if app.show_grid {
        draw_grid_overlay(app.scene.grid(), frame.buffer_mut(), inner, app.scroll, x_scale);
    }

    frame.render_widget(Paragraph::new(footer_help_line(app)), footer_area);
}

fn highlight_span(
    frame: &mut Frame<'_>,
    area: TermRect,
    (x0, y0, x1, y1): (u16, u16, u16, u16),
    (scroll_x, scroll_y): (u16, u16),
) {
    let buf = frame.buffer_mut();
    let visible = area.intersection(buf.area);
    for y in y0..=y1 {
        let Some(row) = y.checked_sub(scroll_y) else {
            continue;
        };
        for x in x0..=x1 {
            let Some(col) = x.checked_sub(scroll_x) else {
                continue;
            };
            let (tx, ty) = (area.x.saturating_add(col), area.y.saturating_add(row));
            if tx < visible.x || ty < visible.y || tx >= visible.right() || ty >= visible.bottom() {
                continue;
            }
            buf.get_mut(tx, ty).set_fg(SELECTED_NODE_COLOR);
        }
    }
}

struct TerminalSession {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
}

impl TerminalSession {
    fn new() -> Result<Self, Box<dyn Error>> {
        enable_raw_mode()?;

        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen).map_err(|err| {
            teardown_terminal();
            err
        })?;

        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).map_err(|err| {
            teardown_terminal();
            err
        })?;
        terminal.clear().map_err(|err| {
            teardown_terminal();
            err
        })?;

        Ok(Self { terminal })
    }

    fn draw(&mut self, draw_fn: impl FnOnce(&mut Frame<'_>)) -> io::Result<()> {
        self.terminal.draw(draw_fn)?;
        Ok(())
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        let _ = self.terminal.show_cursor();
        teardown_terminal();
    }
}

fn teardown_terminal() {
    let _ = disable_raw_mode();
    let mut stdout = io::stdout();
    let _ = execute!(stdout, LeaveAlternateScreen);
}

//! Pointer and keyboard interaction state machine
//!
//! The controller turns raw pointer-down/move/up and key events into graph
//! mutations. It is driven synchronously by the host: every call completes
//! its transition before returning, and the graph is structurally valid
//! between calls.
//!
//! ```text
//! Idle ──down on body──────────▶ Dragging ──up──▶ Idle
//! Idle ──down on output/input──▶ Connecting ──up──▶ Idle (commit or discard)
//! any  ──Escape────────────────▶ Idle (in-progress change undone)
//! ```

use crate::config::EditorConfig;
use crate::error::{ConnectionRejection, GraphError};
use crate::geometry::HitTarget;
use crate::graph::Graph;
use crate::types::{Anchor, Connection, NodeId, PendingConnection, Point};

/// Current interaction
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum InteractionState {
    #[default]
    Idle,
    /// A node follows the pointer
    Dragging {
        node: NodeId,
        /// Pointer position relative to the node's top-left corner
        grab_offset: Point,
        /// Position before the drag started, restored on cancel
        origin: Point,
    },
    /// A half-formed connection follows the pointer
    Connecting {
        pending: PendingConnection,
        /// Connection lifted off an occupied input to start this drag
        detached: Option<Connection>,
    },
}

/// Keys the controller reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Escape,
    Delete,
    Space,
}

/// What a single event did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing changed
    Ignored,
    /// The selection was cleared
    Deselected,
    DragStarted(NodeId),
    Moved(NodeId),
    DragEnded(NodeId),
    ConnectionStarted(Anchor),
    /// The free end of the pending connection moved
    Tracking,
    Connected(Connection),
    /// The graph refused the connection; any lifted wire was put back
    Rejected(ConnectionRejection),
    /// The pending connection was dropped over nothing usable
    Discarded,
    Cancelled,
    Deleted(NodeId),
}

/// Drives a [`Graph`] from pointer and key events
#[derive(Debug, Clone, Default)]
pub struct InteractionController {
    state: InteractionState,
    selected: Option<NodeId>,
    /// Grid spacing to snap dropped nodes to, when enabled
    snap: Option<i32>,
}

impl InteractionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: &EditorConfig) -> Self {
        Self {
            snap: config.snap_to_grid.then_some(config.grid_spacing),
            ..Self::default()
        }
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == InteractionState::Idle
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn select(&mut self, node: Option<NodeId>) {
        self.selected = node;
    }

    /// The connection being dragged, if any
    pub fn pending(&self) -> Option<&PendingConnection> {
        match &self.state {
            InteractionState::Connecting { pending, .. } => Some(pending),
            _ => None,
        }
    }

    /// End points of the wire being dragged, output side first
    pub fn preview_wire(&self, graph: &Graph) -> Option<(Point, Point)> {
        let pending = self.pending()?;
        match pending.anchor()? {
            Anchor::Output(node) => Some((graph.output_anchor(&node)?, pending.free_endpoint)),
            Anchor::Input(port) => Some((pending.free_endpoint, graph.input_anchor(&port)?)),
        }
    }

    // =========================================================================
    // Pointer events
    // =========================================================================

    /// Pointer pressed over `target`
    pub fn pointer_down(&mut self, graph: &mut Graph, point: Point, target: HitTarget) -> Outcome {
        if !self.is_idle() {
            return Outcome::Ignored;
        }

        match target {
            HitTarget::Empty => {
                if self.selected.take().is_some() {
                    Outcome::Deselected
                } else {
                    Outcome::Ignored
                }
            }
            HitTarget::NodeBody(id) => {
                let Some(node) = graph.node(&id) else {
                    return Outcome::Ignored;
                };
                let origin = node.position;
                log::debug!("Dragging '{}'", id);
                self.selected = Some(id.clone());
                self.state = InteractionState::Dragging {
                    node: id.clone(),
                    grab_offset: point - origin,
                    origin,
                };
                Outcome::DragStarted(id)
            }
            HitTarget::OutputPort(id) => {
                if !graph.contains_node(&id) {
                    return Outcome::Ignored;
                }
                self.selected = Some(id.clone());
                self.start_connecting(PendingConnection::from_output(id, point), None)
            }
            HitTarget::InputPort(port) => {
                if !graph.contains_node(&port.node) {
                    return Outcome::Ignored;
                }
                self.selected = Some(port.node.clone());
                match graph.disconnect_port(&port) {
                    // grabbing an attached wire keeps its source end
                    Some(existing) => {
                        log::debug!("Lifted {} off {}", existing, port);
                        let pending = PendingConnection::from_output(existing.source.clone(), point);
                        self.start_connecting(pending, Some(existing))
                    }
                    None => self.start_connecting(PendingConnection::from_input(port, point), None),
                }
            }
        }
    }

    fn start_connecting(&mut self, pending: PendingConnection, detached: Option<Connection>) -> Outcome {
        let Some(anchor) = pending.anchor() else {
            return Outcome::Ignored;
        };
        self.state = InteractionState::Connecting { pending, detached };
        Outcome::ConnectionStarted(anchor)
    }

    /// Pointer moved to `point`
    pub fn pointer_move(&mut self, graph: &mut Graph, point: Point) -> Outcome {
        match &mut self.state {
            InteractionState::Idle => Outcome::Ignored,
            InteractionState::Dragging {
                node, grab_offset, ..
            } => {
                let node = node.clone();
                let position = point - *grab_offset;
                match graph.move_node(&node, position) {
                    Ok(()) => Outcome::Moved(node),
                    Err(err) => {
                        // node vanished under the drag
                        log::warn!("Drag aborted: {}", err);
                        self.state = InteractionState::Idle;
                        Outcome::Cancelled
                    }
                }
            }
            InteractionState::Connecting { pending, .. } => {
                pending.follow(point);
                Outcome::Tracking
            }
        }
    }

    /// Pointer released over `target`
    pub fn pointer_up(&mut self, graph: &mut Graph, point: Point, target: HitTarget) -> Outcome {
        match std::mem::take(&mut self.state) {
            InteractionState::Idle => Outcome::Ignored,
            InteractionState::Dragging {
                node, grab_offset, ..
            } => {
                let mut position = point - grab_offset;
                if let Some(spacing) = self.snap {
                    position = position.snapped(spacing);
                }
                if let Err(err) = graph.move_node(&node, position) {
                    log::warn!("Drop of '{}' ignored: {}", node, err);
                }
                Outcome::DragEnded(node)
            }
            InteractionState::Connecting { pending, detached } => {
                finish_connecting(graph, pending, detached, target)
            }
        }
    }

    /// Hit-test `point` against `graph` and press there
    pub fn pointer_down_at(&mut self, graph: &mut Graph, point: Point) -> Outcome {
        let target = graph.hit_test(point);
        self.pointer_down(graph, point, target)
    }

    /// Hit-test `point` against `graph` and release there
    pub fn pointer_up_at(&mut self, graph: &mut Graph, point: Point) -> Outcome {
        let target = graph.hit_test(point);
        self.pointer_up(graph, point, target)
    }

    // =========================================================================
    // Keyboard
    // =========================================================================

    pub fn key(&mut self, graph: &mut Graph, key: Key) -> Outcome {
        match key {
            Key::Escape => self.cancel(graph),
            Key::Space => {
                if self.is_idle() && self.selected.take().is_some() {
                    Outcome::Deselected
                } else {
                    Outcome::Ignored
                }
            }
            Key::Delete => {
                if !self.is_idle() {
                    return Outcome::Ignored;
                }
                let Some(id) = self.selected.take() else {
                    return Outcome::Ignored;
                };
                match graph.remove_node(&id) {
                    Ok(_) => Outcome::Deleted(id),
                    Err(err) => {
                        log::warn!("Delete ignored: {}", err);
                        Outcome::Ignored
                    }
                }
            }
        }
    }

    /// Abandon the current interaction, undoing its effect on the graph
    pub fn cancel(&mut self, graph: &mut Graph) -> Outcome {
        match std::mem::take(&mut self.state) {
            InteractionState::Idle => Outcome::Ignored,
            InteractionState::Dragging { node, origin, .. } => {
                if let Err(err) = graph.move_node(&node, origin) {
                    log::warn!("Could not restore '{}': {}", node, err);
                }
                log::debug!("Drag of '{}' cancelled", node);
                Outcome::Cancelled
            }
            InteractionState::Connecting { detached, .. } => {
                restore(graph, detached);
                log::debug!("Connection drag cancelled");
                Outcome::Cancelled
            }
        }
    }
}

/// Complete a dragged connection over `target`, or drop it
fn finish_connecting(
    graph: &mut Graph,
    mut pending: PendingConnection,
    detached: Option<Connection>,
    target: HitTarget,
) -> Outcome {
    match (pending.anchor(), target) {
        (Some(Anchor::Output(_)), HitTarget::InputPort(port)) => pending.target = Some(port),
        (Some(Anchor::Input(_)), HitTarget::OutputPort(node)) => pending.source = Some(node),
        _ => {
            if let Some(lifted) = &detached {
                log::debug!("Dropped {} over nothing, removing it", lifted);
            }
            return Outcome::Discarded;
        }
    }

    match graph.commit(pending) {
        Ok(connection) => Outcome::Connected(connection),
        Err(GraphError::InvalidConnection(rejection)) => {
            restore(graph, detached);
            Outcome::Rejected(rejection)
        }
        Err(err) => {
            log::warn!("Connection discarded: {}", err);
            restore(graph, detached);
            Outcome::Discarded
        }
    }
}

/// Put a lifted connection back where it came from
fn restore(graph: &mut Graph, detached: Option<Connection>) {
    if let Some(connection) = detached {
        if let Err(err) = graph.restore_connection(connection) {
            log::warn!("Could not restore connection: {}", err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::tests::{init_logging, test_catalog};
    use crate::types::PortRef;

    const READ_OUT: Point = Point::new(180, 45);
    const WRITE_IN: Point = Point::new(390, 45);

    /// Read 0 at (90, 30) and Write 0 at (390, 30)
    fn setup() -> (Graph, InteractionController) {
        init_logging();
        let catalog = test_catalog();
        let mut graph = Graph::new();
        graph
            .instantiate(&catalog, "Read", Some(Point::new(90, 30)))
            .unwrap();
        graph
            .instantiate(&catalog, "Write", Some(Point::new(390, 30)))
            .unwrap();
        (graph, InteractionController::new())
    }

    #[test]
    fn test_drag_output_to_free_input() {
        let (mut graph, mut ctl) = setup();

        let outcome = ctl.pointer_down_at(&mut graph, READ_OUT);
        assert_eq!(outcome, Outcome::ConnectionStarted(Anchor::Output("Read 0".to_string())));
        assert_eq!(ctl.pointer_move(&mut graph, Point::new(300, 60)), Outcome::Tracking);
        assert_eq!(ctl.preview_wire(&graph), Some((READ_OUT, Point::new(300, 60))));

        let outcome = ctl.pointer_up_at(&mut graph, WRITE_IN);
        assert_eq!(outcome, Outcome::Connected(Connection::new("Read 0", "Write 0", 0)));
        assert!(!graph.is_port_free("Write 0", 0));
        assert!(ctl.is_idle());
    }

    #[test]
    fn test_drop_on_occupied_port_is_rejected() {
        let (mut graph, mut ctl) = setup();
        let catalog = test_catalog();
        let other = graph
            .instantiate(&catalog, "Read", Some(Point::new(90, 200)))
            .unwrap();
        graph
            .add_connection(Connection::new("Read 0", "Write 0", 0))
            .unwrap();

        let other_out = graph.output_anchor(&other).unwrap();
        ctl.pointer_down_at(&mut graph, other_out);
        let outcome = ctl.pointer_up_at(&mut graph, WRITE_IN);
        assert!(matches!(
            outcome,
            Outcome::Rejected(ConnectionRejection::PortOccupied { .. })
        ));
        assert_eq!(graph.connection_count(), 1);
        assert_eq!(graph.connections()[0].source, "Read 0");
        assert!(ctl.is_idle());
    }

    #[test]
    fn test_drop_over_empty_space_discards() {
        let (mut graph, mut ctl) = setup();
        ctl.pointer_down_at(&mut graph, READ_OUT);
        assert_eq!(ctl.pointer_up_at(&mut graph, Point::new(600, 600)), Outcome::Discarded);
        assert_eq!(graph.connection_count(), 0);
        assert!(ctl.is_idle());
    }

    #[test]
    fn test_drag_node_body() {
        let (mut graph, mut ctl) = setup();
        let start = Point::new(100, 40);
        assert_eq!(
            ctl.pointer_down_at(&mut graph, start),
            Outcome::DragStarted("Read 0".to_string())
        );
        assert_eq!(
            ctl.state(),
            &InteractionState::Dragging {
                node: "Read 0".to_string(),
                grab_offset: Point::new(10, 10),
                origin: Point::new(90, 30),
            }
        );

        ctl.pointer_move(&mut graph, Point::new(120, 70));
        assert_eq!(graph.node("Read 0").unwrap().position, Point::new(110, 60));
        let outcome = ctl.pointer_up(&mut graph, Point::new(125, 75), HitTarget::Empty);
        assert_eq!(outcome, Outcome::DragEnded("Read 0".to_string()));
        assert_eq!(graph.node("Read 0").unwrap().position, Point::new(115, 65));
        assert_eq!(graph.connection_count(), 0);
        assert_eq!(ctl.selected(), Some("Read 0"));
    }

    #[test]
    fn test_drop_snaps_to_grid() {
        let (mut graph, _) = setup();
        let config = EditorConfig {
            snap_to_grid: true,
            ..EditorConfig::default()
        };
        let mut ctl = InteractionController::with_config(&config);
        ctl.pointer_down_at(&mut graph, Point::new(100, 40));
        ctl.pointer_up(&mut graph, Point::new(113, 48), HitTarget::Empty);
        // (103, 38) rounds to (105, 45)
        assert_eq!(graph.node("Read 0").unwrap().position, Point::new(105, 45));
    }

    #[test]
    fn test_escape_restores_drag_origin() {
        let (mut graph, mut ctl) = setup();
        ctl.pointer_down_at(&mut graph, Point::new(100, 40));
        ctl.pointer_move(&mut graph, Point::new(300, 300));
        assert_eq!(ctl.key(&mut graph, Key::Escape), Outcome::Cancelled);
        assert_eq!(graph.node("Read 0").unwrap().position, Point::new(90, 30));
        assert!(ctl.is_idle());
        assert_eq!(ctl.cancel(&mut graph), Outcome::Ignored);
    }

    #[test]
    fn test_regrab_moves_existing_wire() {
        let (mut graph, mut ctl) = setup();
        let catalog = test_catalog();
        let subset = graph
            .instantiate(&catalog, "Subset", Some(Point::new(240, 150)))
            .unwrap();
        graph
            .add_connection(Connection::new("Read 0", "Write 0", 0))
            .unwrap();

        let outcome = ctl.pointer_down_at(&mut graph, WRITE_IN);
        assert_eq!(outcome, Outcome::ConnectionStarted(Anchor::Output("Read 0".to_string())));
        assert!(graph.is_port_free("Write 0", 0));

        let subset_in = graph.input_anchor(&PortRef::new(&subset, 0)).unwrap();
        let outcome = ctl.pointer_up_at(&mut graph, subset_in);
        assert_eq!(outcome, Outcome::Connected(Connection::new("Read 0", &subset, 0)));
        assert_eq!(graph.connection_count(), 1);
    }

    #[test]
    fn test_regrab_then_cancel_restores_wire() {
        let (mut graph, mut ctl) = setup();
        let original = Connection::new("Read 0", "Write 0", 0);
        graph.add_connection(original.clone()).unwrap();

        ctl.pointer_down_at(&mut graph, WRITE_IN);
        assert_eq!(graph.connection_count(), 0);
        assert_eq!(ctl.cancel(&mut graph), Outcome::Cancelled);
        assert_eq!(graph.connections(), &[original]);
    }

    #[test]
    fn test_cancel_restores_wire_past_variadic_gap() {
        let (mut graph, mut ctl) = setup();
        let catalog = test_catalog();
        let mosaic = graph
            .instantiate(&catalog, "Mosaic", Some(Point::new(240, 150)))
            .unwrap();
        let r1 = graph
            .instantiate(&catalog, "Read", Some(Point::new(90, 200)))
            .unwrap();
        let r2 = graph
            .instantiate(&catalog, "Read", Some(Point::new(90, 300)))
            .unwrap();
        for (port, read) in ["Read 0", r1.as_str(), r2.as_str()].into_iter().enumerate() {
            graph.add_connection(Connection::new(read, &mosaic, port)).unwrap();
        }
        graph.remove_node(&r1).unwrap();
        assert_eq!(graph.input_count(&mosaic), 4);

        // lifting the top wire shrinks the node below the lifted port
        let port_2 = graph.input_anchor(&PortRef::new(&mosaic, 2)).unwrap();
        ctl.pointer_down_at(&mut graph, port_2);
        assert_eq!(graph.input_count(&mosaic), 2);

        assert_eq!(ctl.cancel(&mut graph), Outcome::Cancelled);
        assert_eq!(graph.connection_at(&mosaic, 2), Some(&Connection::new(&r2, &mosaic, 2)));
        assert_eq!(graph.input_count(&mosaic), 4);
    }

    #[test]
    fn test_regrab_dropped_on_empty_space_removes_wire() {
        let (mut graph, mut ctl) = setup();
        graph
            .add_connection(Connection::new("Read 0", "Write 0", 0))
            .unwrap();
        ctl.pointer_down_at(&mut graph, WRITE_IN);
        assert_eq!(ctl.pointer_up_at(&mut graph, Point::new(600, 600)), Outcome::Discarded);
        assert_eq!(graph.connection_count(), 0);
    }

    #[test]
    fn test_drag_from_free_input_to_output() {
        let (mut graph, mut ctl) = setup();
        let outcome = ctl.pointer_down_at(&mut graph, WRITE_IN);
        assert_eq!(
            outcome,
            Outcome::ConnectionStarted(Anchor::Input(PortRef::new("Write 0", 0)))
        );
        ctl.pointer_move(&mut graph, Point::new(250, 45));
        assert_eq!(ctl.preview_wire(&graph), Some((Point::new(250, 45), WRITE_IN)));

        let outcome = ctl.pointer_up_at(&mut graph, READ_OUT);
        assert_eq!(outcome, Outcome::Connected(Connection::new("Read 0", "Write 0", 0)));
    }

    #[test]
    fn test_self_loop_is_rejected() {
        let (mut graph, mut ctl) = setup();
        let catalog = test_catalog();
        let subset = graph
            .instantiate(&catalog, "Subset", Some(Point::new(240, 150)))
            .unwrap();
        let subset_out = graph.output_anchor(&subset).unwrap();
        let subset_in = graph.input_anchor(&PortRef::new(&subset, 0)).unwrap();
        ctl.pointer_down_at(&mut graph, subset_out);
        let outcome = ctl.pointer_up_at(&mut graph, subset_in);
        assert_eq!(outcome, Outcome::Rejected(ConnectionRejection::SelfLoop(subset)));
        assert_eq!(graph.connection_count(), 0);
    }

    #[test]
    fn test_delete_selected_node() {
        let (mut graph, mut ctl) = setup();
        graph
            .add_connection(Connection::new("Read 0", "Write 0", 0))
            .unwrap();
        ctl.pointer_down_at(&mut graph, Point::new(400, 50));
        ctl.pointer_up_at(&mut graph, Point::new(400, 50));

        assert_eq!(ctl.key(&mut graph, Key::Delete), Outcome::Deleted("Write 0".to_string()));
        assert!(!graph.contains_node("Write 0"));
        assert_eq!(graph.connection_count(), 0);
        assert_eq!(ctl.key(&mut graph, Key::Delete), Outcome::Ignored);
    }

    #[test]
    fn test_space_and_empty_click_deselect() {
        let (mut graph, mut ctl) = setup();
        ctl.select(Some("Read 0".to_string()));
        assert_eq!(ctl.key(&mut graph, Key::Space), Outcome::Deselected);
        assert_eq!(ctl.selected(), None);

        ctl.select(Some("Read 0".to_string()));
        assert_eq!(ctl.pointer_down_at(&mut graph, Point::new(700, 700)), Outcome::Deselected);
        assert_eq!(ctl.pointer_down_at(&mut graph, Point::new(700, 700)), Outcome::Ignored);
    }

    #[test]
    fn test_events_outside_interaction_are_ignored() {
        let (mut graph, mut ctl) = setup();
        assert_eq!(ctl.pointer_move(&mut graph, Point::new(5, 5)), Outcome::Ignored);
        assert_eq!(ctl.pointer_up(&mut graph, Point::new(5, 5), HitTarget::Empty), Outcome::Ignored);

        ctl.pointer_down_at(&mut graph, Point::new(100, 40));
        // a second press while dragging changes nothing
        assert_eq!(ctl.pointer_down_at(&mut graph, READ_OUT), Outcome::Ignored);
    }
}

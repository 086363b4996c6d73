//! The editable node graph
//!
//! `Graph` owns every placed node and every fully formed connection, and is
//! the only place where structural rules are enforced:
//!
//! - input ports are exclusive, outputs fan out freely
//! - no self-loops and no cycles
//! - a target port index must exist on the target node
//! - deleting a node first removes every connection touching it
//!
//! The graph is confined to one thread. Listeners are notified synchronously
//! after each change has been applied.

use std::collections::{HashSet, VecDeque};
use std::rc::Rc;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::config::{EditorConfig, LayoutConfig};
use crate::descriptor::OperatorDescriptor;
use crate::error::{ConnectionRejection, GraphError, Result};
use crate::events::{EventSink, GraphEvent};
use crate::geometry::{HitTarget, NodePart, NodeShape};
use crate::ids::IdAllocator;
use crate::registry::OperatorCatalog;
use crate::resolver::ConfigurationResolver;
use crate::topology;
use crate::types::{
    Configuration, Connection, GraphNode, NodeId, PendingConnection, Point, PortRef, Rect,
};

/// A graph of operator nodes joined by connections
pub struct Graph {
    /// Nodes in insertion order; later nodes are drawn on top
    nodes: IndexMap<NodeId, GraphNode>,
    connections: Vec<Connection>,
    layout: LayoutConfig,
    default_position: Point,
    listeners: Vec<Rc<dyn EventSink>>,
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Graph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Graph")
            .field("nodes", &self.nodes.keys().collect::<Vec<_>>())
            .field("connections", &self.connections)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Graph {
    /// Create an empty graph with the default layout
    pub fn new() -> Self {
        Self::with_config(&EditorConfig::default())
    }

    /// Create an empty graph using the layout from `config`
    pub fn with_config(config: &EditorConfig) -> Self {
        Self {
            nodes: IndexMap::new(),
            connections: Vec::new(),
            layout: config.layout.clone(),
            default_position: config.default_node_position,
            listeners: Vec::new(),
        }
    }

    /// Register a listener for graph events
    pub fn subscribe(&mut self, sink: Rc<dyn EventSink>) {
        self.listeners.push(sink);
    }

    fn emit(&self, event: GraphEvent) {
        for listener in &self.listeners {
            listener.send(&event);
        }
    }

    pub fn layout(&self) -> &LayoutConfig {
        &self.layout
    }

    // =========================================================================
    // Nodes
    // =========================================================================

    /// Place a new node for `descriptor`
    ///
    /// The id is allocated from the operator alias. Without a position the
    /// node goes to the configured default position.
    pub fn add_node(&mut self, descriptor: Arc<OperatorDescriptor>, position: Option<Point>) -> NodeId {
        let id = IdAllocator::allocate(&descriptor.alias, self.nodes.keys().map(String::as_str));
        self.insert_node(id.clone(), descriptor, position.unwrap_or(self.default_position));
        id
    }

    /// Place a new node for the operator `alias` looked up in `catalog`
    pub fn instantiate(
        &mut self,
        catalog: &dyn OperatorCatalog,
        alias: &str,
        position: Option<Point>,
    ) -> Result<NodeId> {
        let descriptor = catalog
            .descriptor(alias)
            .ok_or_else(|| GraphError::UnknownOperator(alias.to_string()))?;
        Ok(self.add_node(descriptor, position))
    }

    /// Insert a node under a caller-chosen id (used when loading documents)
    pub(crate) fn insert_node(&mut self, id: NodeId, descriptor: Arc<OperatorDescriptor>, position: Point) {
        let operator = descriptor.alias.clone();
        let node = GraphNode::new(id.clone(), descriptor, position, self.layout.default_width);
        self.nodes.insert(id.clone(), node);
        log::info!("Created node '{}' at ({}, {})", id, position.x, position.y);
        self.emit(GraphEvent::NodeAdded {
            node_id: id,
            operator,
        });
    }

    /// Delete a node together with every connection touching it
    ///
    /// Listeners see one `ConnectionRemoved` per connection, then `NodeRemoved`.
    /// Returns the removed connections.
    pub fn remove_node(&mut self, id: &str) -> Result<Vec<Connection>> {
        if !self.nodes.contains_key(id) {
            return Err(GraphError::UnknownNode(id.to_string()));
        }

        let (removed, kept): (Vec<Connection>, Vec<Connection>) = std::mem::take(&mut self.connections)
            .into_iter()
            .partition(|c| c.touches(id));
        self.connections = kept;
        for connection in &removed {
            log::debug!("Disconnected {} while deleting '{}'", connection, id);
            self.emit(GraphEvent::ConnectionRemoved {
                connection: connection.clone(),
            });
        }

        self.nodes.shift_remove(id);
        log::info!("Deleted node '{}'", id);
        self.emit(GraphEvent::NodeRemoved {
            node_id: id.to_string(),
        });
        Ok(removed)
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.get(id)
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Nodes in drawing order (bottom first)
    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.nodes.values()
    }

    pub fn node_ids(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes whose operator takes no inputs
    pub fn sources(&self) -> impl Iterator<Item = &GraphNode> {
        self.nodes.values().filter(|n| n.is_source())
    }

    /// Nodes whose operator produces no output
    pub fn sinks(&self) -> impl Iterator<Item = &GraphNode> {
        self.nodes.values().filter(|n| n.is_sink())
    }

    pub(crate) fn node_mut(&mut self, id: &str) -> Result<&mut GraphNode> {
        self.nodes
            .get_mut(id)
            .ok_or_else(|| GraphError::UnknownNode(id.to_string()))
    }

    /// Move a node's top-left corner to `position`
    pub fn move_node(&mut self, id: &str, position: Point) -> Result<()> {
        let node = self.node_mut(id)?;
        if node.position == position {
            return Ok(());
        }
        node.position = position;
        self.emit(GraphEvent::NodeMoved {
            node_id: id.to_string(),
            position,
        });
        Ok(())
    }

    /// Record the body width measured by the renderer
    pub fn set_node_width(&mut self, id: &str, width: i32) -> Result<()> {
        let min_width = self.layout.min_width;
        self.node_mut(id)?.width = width.max(min_width);
        Ok(())
    }

    /// Resolve `raw` through `resolver` and store the result on the node
    pub fn configure(
        &mut self,
        id: &str,
        raw: &Configuration,
        resolver: &dyn ConfigurationResolver,
    ) -> Result<()> {
        let node = self.node_mut(id)?;
        let resolved = resolver.resolve(node.descriptor(), raw)?;
        node.configuration = resolved;
        log::debug!("Configured node '{}'", id);
        self.emit(GraphEvent::NodeConfigured {
            node_id: id.to_string(),
        });
        Ok(())
    }

    /// Remove every node and connection
    pub fn clear(&mut self) {
        let ids: Vec<NodeId> = self.nodes.keys().cloned().collect();
        for id in ids {
            // ids were just read from the map
            let _ = self.remove_node(&id);
        }
    }

    // =========================================================================
    // Connections
    // =========================================================================

    /// All fully formed connections
    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Connections leaving `node`'s output
    pub fn connections_from<'a>(&'a self, node: &'a str) -> impl Iterator<Item = &'a Connection> + 'a {
        self.connections.iter().filter(move |c| c.source == node)
    }

    /// Connections arriving at input `port` of `node` (at most one)
    pub fn connections_to<'a>(&'a self, node: &'a str, port: usize) -> impl Iterator<Item = &'a Connection> + 'a {
        self.connections
            .iter()
            .filter(move |c| c.target == node && c.target_port == port)
    }

    /// Every connection arriving at `node`, ordered by port
    pub fn incoming(&self, node: &str) -> Vec<&Connection> {
        let mut incoming: Vec<&Connection> =
            self.connections.iter().filter(|c| c.target == node).collect();
        incoming.sort_by_key(|c| c.target_port);
        incoming
    }

    /// The connection occupying input `port` of `node`
    pub fn connection_at(&self, node: &str, port: usize) -> Option<&Connection> {
        self.connections
            .iter()
            .find(|c| c.target == node && c.target_port == port)
    }

    /// True iff no connection targets `(node, port)`
    pub fn is_port_free(&self, node: &str, port: usize) -> bool {
        self.connection_at(node, port).is_none()
    }

    /// Number of input ports `node` currently shows
    ///
    /// Variadic operators always offer one free port past the highest
    /// occupied one.
    pub fn input_count(&self, node: &str) -> usize {
        let Some(n) = self.nodes.get(node) else {
            return 0;
        };
        let descriptor = n.descriptor();
        if !descriptor.variadic_inputs {
            return descriptor.min_inputs;
        }
        let occupied = self
            .connections
            .iter()
            .filter(|c| c.target == node)
            .map(|c| c.target_port + 1)
            .max()
            .unwrap_or(0);
        descriptor.min_inputs.max(occupied + 1)
    }

    /// Check a connection against every structural rule without adding it
    pub fn check_connection(&self, connection: &Connection) -> std::result::Result<(), ConnectionRejection> {
        self.check_rules(connection, false)
    }

    /// With `grow_variadic` a variadic target accepts any port index, so a
    /// stored connection past a gap can be re-added before the ports below it.
    fn check_rules(
        &self,
        connection: &Connection,
        grow_variadic: bool,
    ) -> std::result::Result<(), ConnectionRejection> {
        let Connection {
            source,
            target,
            target_port,
        } = connection;

        let source_node = self
            .nodes
            .get(source)
            .ok_or_else(|| ConnectionRejection::UnknownNode(source.clone()))?;
        let target_node = self
            .nodes
            .get(target)
            .ok_or_else(|| ConnectionRejection::UnknownNode(target.clone()))?;
        if source == target {
            return Err(ConnectionRejection::SelfLoop(source.clone()));
        }
        if !source_node.descriptor().has_output {
            return Err(ConnectionRejection::NoOutput(source.clone()));
        }
        let count = self.input_count(target);
        let growable = grow_variadic && target_node.descriptor().variadic_inputs;
        if !growable && *target_port >= count {
            return Err(ConnectionRejection::PortOutOfRange {
                node: target.clone(),
                port: *target_port,
                count,
            });
        }
        if !self.is_port_free(target, *target_port) {
            return Err(ConnectionRejection::PortOccupied {
                node: target.clone(),
                port: *target_port,
            });
        }
        if self
            .connections
            .iter()
            .any(|c| c.source == *source && c.target == *target)
        {
            return Err(ConnectionRejection::DuplicateSource {
                upstream: source.clone(),
                downstream: target.clone(),
            });
        }
        if self.reaches(target, source) {
            return Err(ConnectionRejection::WouldCreateCycle {
                upstream: source.clone(),
                downstream: target.clone(),
            });
        }
        Ok(())
    }

    /// Commit a fully formed connection
    pub fn add_connection(&mut self, connection: Connection) -> Result<()> {
        self.insert_connection(connection, false)
    }

    /// Re-add a connection that existed before, such as a lifted wire or a
    /// stored one
    ///
    /// Every rule still applies except the port range of a variadic target,
    /// which grows to fit the restored port.
    pub fn restore_connection(&mut self, connection: Connection) -> Result<()> {
        self.insert_connection(connection, true)
    }

    fn insert_connection(&mut self, connection: Connection, grow_variadic: bool) -> Result<()> {
        if let Err(rejection) = self.check_rules(&connection, grow_variadic) {
            log::warn!("Rejected connection {}: {}", connection, rejection);
            return Err(rejection.into());
        }
        log::debug!("Connected {}", connection);
        self.connections.push(connection.clone());
        self.emit(GraphEvent::ConnectionAdded { connection });
        Ok(())
    }

    /// Commit a dragged connection once both of its ends are attached
    pub fn commit(&mut self, pending: PendingConnection) -> Result<Connection> {
        let connection = pending.into_connection()?;
        self.add_connection(connection.clone())?;
        Ok(connection)
    }

    /// Remove a specific connection; returns whether it was present
    pub fn remove_connection(&mut self, connection: &Connection) -> bool {
        let Some(index) = self.connections.iter().position(|c| c == connection) else {
            return false;
        };
        let removed = self.connections.remove(index);
        log::debug!("Disconnected {}", removed);
        self.emit(GraphEvent::ConnectionRemoved { connection: removed });
        true
    }

    /// Remove whatever occupies `port`
    pub fn disconnect_port(&mut self, port: &PortRef) -> Option<Connection> {
        let connection = self.connection_at(&port.node, port.port)?.clone();
        self.remove_connection(&connection);
        Some(connection)
    }

    /// Whether `to` can be reached from `from` along connections
    pub fn reaches(&self, from: &str, to: &str) -> bool {
        if from == to {
            return true;
        }
        let mut visited: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<&str> = VecDeque::from([from]);
        while let Some(current) = queue.pop_front() {
            if !visited.insert(current) {
                continue;
            }
            for c in self.connections_from(current) {
                if c.target == to {
                    return true;
                }
                queue.push_back(&c.target);
            }
        }
        false
    }

    /// Minimum hop count from `from` to `to`, or -1 when unreachable
    pub fn distance(&self, from: &str, to: &str) -> i32 {
        topology::distance(self, from, to)
    }

    // =========================================================================
    // Geometry
    // =========================================================================

    /// Pixel geometry of a node
    pub fn shape(&self, id: &str) -> Option<NodeShape> {
        let node = self.nodes.get(id)?;
        Some(NodeShape::new(
            node.position,
            node.width,
            self.input_count(id),
            node.descriptor().has_output,
            &self.layout,
        ))
    }

    /// Repaint rectangle of a node
    pub fn bounding_box(&self, id: &str) -> Option<Rect> {
        self.shape(id)
            .map(|s| s.bounding_box(self.layout.bounds_margin))
    }

    pub fn input_anchor(&self, port: &PortRef) -> Option<Point> {
        let shape = self.shape(&port.node)?;
        (port.port < shape.input_count).then(|| shape.input_anchor(port.port))
    }

    pub fn output_anchor(&self, id: &str) -> Option<Point> {
        self.shape(id)?.output_anchor()
    }

    /// Wire end points for every connection, source anchor first
    pub fn connection_segments(&self) -> Vec<(Connection, Point, Point)> {
        self.connections
            .iter()
            .filter_map(|c| {
                let start = self.output_anchor(&c.source)?;
                let end = self.input_anchor(&c.target_ref())?;
                Some((c.clone(), start, end))
            })
            .collect()
    }

    /// Find what lies under `point`, checking the topmost node first
    pub fn hit_test(&self, point: Point) -> HitTarget {
        for id in self.nodes.keys().rev() {
            let Some(shape) = self.shape(id) else {
                continue;
            };
            match shape.part_at(point) {
                Some(NodePart::Input(port)) => return HitTarget::InputPort(PortRef::new(id.clone(), port)),
                Some(NodePart::Output) => return HitTarget::OutputPort(id.clone()),
                Some(NodePart::Body) => return HitTarget::NodeBody(id.clone()),
                None => {}
            }
        }
        HitTarget::Empty
    }
}

//! Core types for editable graphs
//!
//! These types define the placed nodes, the connections between them,
//! and the integer pixel-space geometry the editor works in.

use std::fmt;
use std::ops::{Add, Sub};
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::descriptor::OperatorDescriptor;
use crate::error::ConnectionRejection;

/// Unique identifier for a node (e.g. "Read 0")
pub type NodeId = String;

/// Ordered mapping of parameter name to value
pub type Configuration = IndexMap<String, serde_json::Value>;

/// A point in pixel space
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Round both coordinates to the nearest multiple of `spacing`
    pub fn snapped(self, spacing: i32) -> Self {
        if spacing <= 1 {
            return self;
        }
        let snap = |v: i32| {
            let half = spacing / 2;
            if v >= 0 {
                (v + half) / spacing * spacing
            } else {
                -((-v + half) / spacing * spacing)
            }
        };
        Self::new(snap(self.x), snap(self.y))
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}

/// An axis-aligned rectangle in pixel space
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Inclusive containment test
    pub fn contains(&self, p: Point) -> bool {
        let dx = p.x - self.x;
        let dy = p.y - self.y;
        dx >= 0 && dy >= 0 && dx <= self.width && dy <= self.height
    }

    /// Grow the rectangle by `margin` on every side
    pub fn inflate(&self, margin: i32) -> Rect {
        Rect::new(
            self.x - margin,
            self.y - margin,
            self.width + 2 * margin,
            self.height + 2 * margin,
        )
    }

    /// Smallest rectangle covering both
    pub fn union(&self, other: &Rect) -> Rect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = (self.x + self.width).max(other.x + other.width);
        let bottom = (self.y + self.height).max(other.y + other.height);
        Rect::new(x, y, right - x, bottom - y)
    }
}

/// A specific input port on a node
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortRef {
    pub node: NodeId,
    pub port: usize,
}

impl PortRef {
    pub fn new(node: impl Into<NodeId>, port: usize) -> Self {
        Self {
            node: node.into(),
            port,
        }
    }
}

impl fmt::Display for PortRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.node, self.port)
    }
}

/// A placed instance of an operator
#[derive(Debug, Clone)]
pub struct GraphNode {
    id: NodeId,
    operator: String,
    /// Top-left corner of the node body
    pub position: Point,
    /// Body width as last reported by the renderer
    pub(crate) width: i32,
    pub(crate) configuration: Configuration,
    descriptor: Arc<OperatorDescriptor>,
}

impl GraphNode {
    pub(crate) fn new(
        id: NodeId,
        descriptor: Arc<OperatorDescriptor>,
        position: Point,
        width: i32,
    ) -> Self {
        Self {
            id,
            operator: descriptor.alias.clone(),
            position,
            width,
            configuration: descriptor.default_configuration(),
            descriptor,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Alias of the operator this node instantiates
    pub fn operator(&self) -> &str {
        &self.operator
    }

    pub fn descriptor(&self) -> &OperatorDescriptor {
        &self.descriptor
    }

    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    /// True when the operator takes no inputs
    pub fn is_source(&self) -> bool {
        !self.descriptor.has_inputs()
    }

    /// True when the operator produces no output
    pub fn is_sink(&self) -> bool {
        !self.descriptor.has_output
    }
}

/// A fully formed edge from a node's output to another node's input port
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub source: NodeId,
    pub target: NodeId,
    pub target_port: usize,
}

impl Connection {
    pub fn new(source: impl Into<NodeId>, target: impl Into<NodeId>, target_port: usize) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            target_port,
        }
    }

    /// Whether either endpoint is `node`
    pub fn touches(&self, node: &str) -> bool {
        self.source == node || self.target == node
    }

    pub fn target_ref(&self) -> PortRef {
        PortRef::new(self.target.clone(), self.target_port)
    }
}

impl fmt::Display for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}[{}]", self.source, self.target, self.target_port)
    }
}

/// The end of a half-formed connection that is attached to a node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Anchor {
    Output(NodeId),
    Input(PortRef),
}

/// A connection being dragged, with one end following the pointer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingConnection {
    pub source: Option<NodeId>,
    pub target: Option<PortRef>,
    /// Where the free end currently is; meaningless once both ends are set
    pub free_endpoint: Point,
}

impl PendingConnection {
    /// Start a connection from a node's output
    pub fn from_output(node: impl Into<NodeId>, pointer: Point) -> Self {
        Self {
            source: Some(node.into()),
            target: None,
            free_endpoint: pointer,
        }
    }

    /// Start a connection backwards from an input port
    pub fn from_input(port: PortRef, pointer: Point) -> Self {
        Self {
            source: None,
            target: Some(port),
            free_endpoint: pointer,
        }
    }

    /// The attached end, if exactly one end is attached
    pub fn anchor(&self) -> Option<Anchor> {
        match (&self.source, &self.target) {
            (Some(source), None) => Some(Anchor::Output(source.clone())),
            (None, Some(target)) => Some(Anchor::Input(target.clone())),
            _ => None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.source.is_some() && self.target.is_some()
    }

    /// Move the free end
    pub fn follow(&mut self, pointer: Point) {
        self.free_endpoint = pointer;
    }

    /// Convert into a fully formed connection
    pub fn into_connection(self) -> Result<Connection, ConnectionRejection> {
        match (self.source, self.target) {
            (Some(source), Some(target)) => Ok(Connection {
                source,
                target: target.node,
                target_port: target.port,
            }),
            _ => Err(ConnectionRejection::Incomplete),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_arithmetic() {
        let p = Point::new(10, 20) - Point::new(3, 4);
        assert_eq!(p, Point::new(7, 16));
        assert_eq!(p + Point::new(3, 4), Point::new(10, 20));
    }

    #[test]
    fn test_point_snapping() {
        assert_eq!(Point::new(22, 8).snapped(15), Point::new(15, 15));
        assert_eq!(Point::new(23, -8).snapped(15), Point::new(30, -15));
        assert_eq!(Point::new(7, 7).snapped(1), Point::new(7, 7));
    }

    #[test]
    fn test_rect_contains_and_inflate() {
        let r = Rect::new(0, 0, 90, 30);
        assert!(r.contains(Point::new(90, 30)));
        assert!(!r.contains(Point::new(91, 0)));
        assert_eq!(r.inflate(8), Rect::new(-8, -8, 106, 46));
        assert_eq!(
            r.union(&Rect::new(100, 10, 10, 40)),
            Rect::new(0, 0, 110, 50)
        );
    }

    #[test]
    fn test_pending_connection_completion() {
        let mut pending = PendingConnection::from_output("Read 0", Point::new(5, 5));
        assert_eq!(pending.anchor(), Some(Anchor::Output("Read 0".to_string())));
        assert!(!pending.is_complete());
        assert_eq!(
            pending.clone().into_connection(),
            Err(ConnectionRejection::Incomplete)
        );

        pending.target = Some(PortRef::new("Write 0", 0));
        assert!(pending.is_complete());
        assert_eq!(pending.anchor(), None);
        assert_eq!(
            pending.into_connection(),
            Ok(Connection::new("Read 0", "Write 0", 0))
        );
    }

    #[test]
    fn test_connection_serialization() {
        let c = Connection::new("Read 0", "Write 0", 0);
        let json = serde_json::to_string(&c).unwrap();
        assert!(json.contains("targetPort")); // camelCase
        assert!(c.touches("Write 0"));
        assert!(!c.touches("Subset 0"));
    }
}

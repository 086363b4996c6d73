//! Node and port geometry for rendering and hit-testing
//!
//! A node body is a rectangle whose top-left corner is the node position.
//! Input ports sit on the left edge, one every `port_spacing` pixels starting
//! one spacing below the top; the single output port sits on the right edge
//! level with the first input.

use crate::config::LayoutConfig;
use crate::types::{NodeId, Point, PortRef, Rect};

/// What lies under a pointer position
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HitTarget {
    /// No node or port
    Empty,
    /// The body of a node, away from its ports
    NodeBody(NodeId),
    /// A node's output port
    OutputPort(NodeId),
    /// A specific input port
    InputPort(PortRef),
}

impl HitTarget {
    /// The node that was hit, if any
    pub fn node(&self) -> Option<&str> {
        match self {
            HitTarget::Empty => None,
            HitTarget::NodeBody(id) | HitTarget::OutputPort(id) => Some(id),
            HitTarget::InputPort(port) => Some(&port.node),
        }
    }
}

/// Part of a single node under a point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodePart {
    Body,
    Output,
    Input(usize),
}

/// Resolved pixel geometry of one node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeShape {
    pub rect: Rect,
    pub input_count: usize,
    pub has_output: bool,
    port_spacing: i32,
    port_half_size: i32,
}

impl NodeShape {
    pub fn new(position: Point, width: i32, input_count: usize, has_output: bool, layout: &LayoutConfig) -> Self {
        let ports_height = layout.port_spacing * (input_count as i32 + 1);
        Self {
            rect: Rect::new(
                position.x,
                position.y,
                width.max(layout.min_width),
                ports_height.max(layout.min_height),
            ),
            input_count,
            has_output,
            port_spacing: layout.port_spacing,
            port_half_size: layout.port_half_size(),
        }
    }

    /// Anchor point where a wire meets input `index`
    pub fn input_anchor(&self, index: usize) -> Point {
        Point::new(
            self.rect.x,
            self.rect.y + self.port_spacing * (index as i32 + 1),
        )
    }

    /// Anchor point where wires leave the output, if the node has one
    pub fn output_anchor(&self) -> Option<Point> {
        self.has_output.then(|| {
            Point::new(self.rect.x + self.rect.width, self.rect.y + self.port_spacing)
        })
    }

    /// Index of the input port under `p`
    pub fn input_at(&self, p: Point) -> Option<usize> {
        let dx = p.x - self.rect.x;
        let dy = p.y - self.rect.y;
        if dx.abs() > self.port_half_size || dy <= 0 || self.port_spacing <= 0 {
            return None;
        }
        let slot = (dy + self.port_spacing / 2) / self.port_spacing;
        if slot < 1 || slot as usize > self.input_count {
            return None;
        }
        if (dy - slot * self.port_spacing).abs() <= self.port_half_size {
            Some(slot as usize - 1)
        } else {
            None
        }
    }

    /// Whether `p` is over the output port
    pub fn is_over_output(&self, p: Point) -> bool {
        match self.output_anchor() {
            Some(anchor) => {
                (p.x - anchor.x).abs() <= self.port_half_size
                    && (p.y - anchor.y).abs() <= self.port_half_size
            }
            None => false,
        }
    }

    /// Classify `p` against this node; ports win over the body
    pub fn part_at(&self, p: Point) -> Option<NodePart> {
        if let Some(index) = self.input_at(p) {
            return Some(NodePart::Input(index));
        }
        if self.is_over_output(p) {
            return Some(NodePart::Output);
        }
        self.rect.contains(p).then_some(NodePart::Body)
    }

    pub fn contains(&self, p: Point) -> bool {
        self.part_at(p).is_some()
    }

    /// Area to repaint for this node
    pub fn bounding_box(&self, margin: i32) -> Rect {
        self.rect.inflate(margin)
    }
}
